//! 属性解析器
//!
//! 按顺序尝试一组命名的查找策略，在对象中定位属性值。新的模型结构通过追加策略支持。
//! 找不到属性时返回 [`Resolved::Missing`]，这不是错误。

use crate::object::ModelObject;
use serde_json::{Map, Value};

/// 属性解析结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolved<'a> {
    Found(&'a Value),
    Missing,
}

impl<'a> Resolved<'a> {
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    pub fn value(&self) -> Option<&'a Value> {
        match self {
            Self::Found(value) => Some(value),
            Self::Missing => None,
        }
    }
}

/// 查找函数：在属性容器中按名称查找
pub type LookupFn = for<'a> fn(&'a Map<String, Value>, &str) -> Option<&'a Value>;

/// 命名的查找策略
#[derive(Clone, Copy)]
pub struct LookupStrategy {
    pub name: &'static str,
    pub lookup: LookupFn,
}

impl LookupStrategy {
    pub const fn new(name: &'static str, lookup: LookupFn) -> Self {
        Self { name, lookup }
    }
}

impl std::fmt::Debug for LookupStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("LookupStrategy").field(&self.name).finish()
    }
}

/// 精确匹配顶层字段
fn direct<'a>(fields: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    fields.get(name)
}

/// 忽略大小写匹配顶层字段（含非 ASCII 名称，如 "Höhe"）
fn direct_case_insensitive<'a>(fields: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    let wanted = name.to_lowercase();
    fields
        .iter()
        .find(|(key, _)| key.to_lowercase() == wanted)
        .map(|(_, value)| value)
}

/// 旧版模型以 `@` 前缀保存动态成员
fn legacy_prefixed<'a>(fields: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    fields.get(&format!("@{}", name))
}

fn parameters(fields: &Map<String, Value>) -> Option<&Map<String, Value>> {
    fields
        .get("parameters")
        .or_else(|| fields.get("@parameters"))
        .and_then(Value::as_object)
}

/// `parameters` 集合中以属性名为键的条目；对象条目取其 `value`
fn parameters_key<'a>(fields: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    match parameters(fields)?.get(name)? {
        Value::Object(entry) => entry.get("value"),
        scalar => Some(scalar),
    }
}

/// `parameters` 集合中 `name` 等于属性名的条目，取其 `value`
fn parameters_named<'a>(fields: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    parameters(fields)?
        .values()
        .filter_map(Value::as_object)
        .find(|entry| entry.get("name").and_then(Value::as_str) == Some(name))
        .and_then(|entry| entry.get("value"))
}

/// 点号路径，如 "properties.Dimensions.Area" 或 "items.0.name"
fn dotted_path<'a>(fields: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    if !name.contains('.') {
        return None;
    }

    let mut parts = name.split('.');
    let mut current = fields.get(parts.next()?)?;

    for part in parts {
        current = match current {
            Value::Object(map) => map.get(part)?,
            Value::Array(arr) => arr.get(part.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }

    Some(current)
}

/// 默认策略顺序
pub const DEFAULT_STRATEGIES: [LookupStrategy; 6] = [
    LookupStrategy::new("direct", direct),
    LookupStrategy::new("direct_case_insensitive", direct_case_insensitive),
    LookupStrategy::new("legacy_prefixed", legacy_prefixed),
    LookupStrategy::new("parameters_key", parameters_key),
    LookupStrategy::new("parameters_named", parameters_named),
    LookupStrategy::new("dotted_path", dotted_path),
];

/// 属性解析器
#[derive(Debug, Clone)]
pub struct PropertyResolver {
    strategies: Vec<LookupStrategy>,
}

impl PropertyResolver {
    pub fn new() -> Self {
        Self::with_strategies(DEFAULT_STRATEGIES.to_vec())
    }

    pub fn with_strategies(strategies: Vec<LookupStrategy>) -> Self {
        Self { strategies }
    }

    /// 追加一个策略（优先级最低）
    pub fn push(mut self, strategy: LookupStrategy) -> Self {
        self.strategies.push(strategy);
        self
    }

    pub fn strategies(&self) -> &[LookupStrategy] {
        &self.strategies
    }

    /// 解析属性值
    pub fn resolve<'a, O>(&self, object: &'a O, name: &str) -> Resolved<'a>
    where
        O: ModelObject + ?Sized,
    {
        match self.resolve_with_source(object, name) {
            Some((_, value)) => Resolved::Found(value),
            None => Resolved::Missing,
        }
    }

    /// 解析属性值，并返回命中的策略名称
    ///
    /// 某个策略找到 `null` 时继续尝试后续策略；只有全部策略都没有非空值时才返回该 `null`。
    pub fn resolve_with_source<'a, O>(
        &self,
        object: &'a O,
        name: &str,
    ) -> Option<(&'static str, &'a Value)>
    where
        O: ModelObject + ?Sized,
    {
        let fields = object.fields()?;
        let mut null_hit = None;

        for strategy in &self.strategies {
            match (strategy.lookup)(fields, name) {
                Some(value @ Value::Null) => {
                    null_hit.get_or_insert((strategy.name, value));
                }
                Some(value) => return Some((strategy.name, value)),
                None => {}
            }
        }

        null_hit
    }
}

impl Default for PropertyResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::JsonObject;
    use serde_json::json;

    fn resolve<'a>(object: &'a JsonObject<'a>, name: &str) -> Option<&'a Value> {
        PropertyResolver::new().resolve(object, name).value()
    }

    #[test]
    fn test_direct_before_case_insensitive() {
        let value = json!({"id": "a", "Height": 1, "height": 2});
        let object = JsonObject::new(&value).unwrap();
        assert_eq!(resolve(&object, "height"), Some(&json!(2)));
        assert_eq!(resolve(&object, "Height"), Some(&json!(1)));
        assert_eq!(resolve(&object, "HEIGHT"), Some(&json!(1)));
    }

    #[test]
    fn test_case_insensitive_non_ascii_names() {
        let value = json!({"id": "a", "Höhe": 2400});
        let object = JsonObject::new(&value).unwrap();
        assert_eq!(resolve(&object, "HÖHE"), Some(&json!(2400)));
        assert_eq!(resolve(&object, "höhe"), Some(&json!(2400)));
    }

    #[test]
    fn test_legacy_prefixed_member() {
        let value = json!({"id": "a", "@category": "Walls"});
        let object = JsonObject::new(&value).unwrap();
        assert_eq!(resolve(&object, "category"), Some(&json!("Walls")));
    }

    #[test]
    fn test_parameters_by_key_and_by_name() {
        let value = json!({
            "id": "a",
            "parameters": {
                "WALL_HEIGHT": {"name": "Unconnected Height", "value": 3000},
                "Mark": "W-01",
                "abc-123": {"name": "SPECKLE_Classification", "value": "Ss_20"}
            }
        });
        let object = JsonObject::new(&value).unwrap();
        assert_eq!(resolve(&object, "WALL_HEIGHT"), Some(&json!(3000)));
        assert_eq!(resolve(&object, "Unconnected Height"), Some(&json!(3000)));
        assert_eq!(resolve(&object, "Mark"), Some(&json!("W-01")));
        assert_eq!(resolve(&object, "SPECKLE_Classification"), Some(&json!("Ss_20")));
        assert_eq!(resolve(&object, "Missing"), None);
    }

    #[test]
    fn test_dotted_path() {
        let value = json!({
            "id": "a",
            "properties": {"Dimensions": {"Area": 12.5}},
            "layers": [{"name": "A-WALL"}]
        });
        let object = JsonObject::new(&value).unwrap();
        assert_eq!(resolve(&object, "properties.Dimensions.Area"), Some(&json!(12.5)));
        assert_eq!(resolve(&object, "layers.0.name"), Some(&json!("A-WALL")));
        assert_eq!(resolve(&object, "layers.7.name"), None);
    }

    #[test]
    fn test_null_falls_through_to_parameters() {
        let value = json!({
            "id": "a",
            "height": null,
            "parameters": {"height": {"value": 900}}
        });
        let object = JsonObject::new(&value).unwrap();
        let resolver = PropertyResolver::new();
        assert_eq!(
            resolver.resolve_with_source(&object, "height"),
            Some(("parameters_key", &json!(900)))
        );
    }

    #[test]
    fn test_null_only_counts_as_present() {
        let value = json!({"id": "a", "comment": null});
        let object = JsonObject::new(&value).unwrap();
        let resolved = PropertyResolver::new().resolve(&object, "comment");
        assert_eq!(resolved, Resolved::Found(&Value::Null));
    }

    #[test]
    fn test_malformed_object_is_missing() {
        let value = json!("not an object");
        let object = JsonObject::with_id("x", &value);
        assert!(PropertyResolver::new().resolve(&object, "anything").is_missing());
    }

    #[test]
    fn test_custom_strategy_list() {
        fn always_answer<'a>(fields: &'a Map<String, Value>, _name: &str) -> Option<&'a Value> {
            fields.get("fallback")
        }

        let value = json!({"id": "a", "fallback": 42});
        let object = JsonObject::new(&value).unwrap();

        let strict = PropertyResolver::with_strategies(vec![DEFAULT_STRATEGIES[0]]);
        assert!(strict.resolve(&object, "nothing").is_missing());

        let extended = strict.push(LookupStrategy::new("fallback", always_answer));
        assert_eq!(extended.resolve(&object, "nothing").value(), Some(&json!(42)));
        assert_eq!(extended.strategies().len(), 2);
    }
}

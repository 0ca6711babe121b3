//! 模型对象
//!
//! 引擎只要求对象提供稳定 ID 和属性容器；JSON 模型通过 [`JsonObject`] 适配，
//! [`flatten`] 将模型树展开为扁平的对象列表。

use serde_json::{Map, Value};
use std::collections::HashSet;

/// 被校验的模型对象
pub trait ModelObject {
    /// 稳定的对象 ID
    fn id(&self) -> &str;

    /// 对象的属性容器；无法识别的对象返回 `None`
    fn fields(&self) -> Option<&Map<String, Value>>;
}

impl<T: ModelObject + ?Sized> ModelObject for &T {
    fn id(&self) -> &str {
        (**self).id()
    }

    fn fields(&self) -> Option<&Map<String, Value>> {
        (**self).fields()
    }
}

/// 借用 JSON 节点的模型对象
#[derive(Debug, Clone, Copy)]
pub struct JsonObject<'a> {
    id: &'a str,
    value: &'a Value,
}

impl<'a> JsonObject<'a> {
    /// 从带字符串 `id` 字段的 JSON 对象创建
    pub fn new(value: &'a Value) -> Option<Self> {
        let id = value.get("id")?.as_str()?;
        Some(Self { id, value })
    }

    /// 使用外部给定的 ID 包装任意 JSON 值
    pub fn with_id(id: &'a str, value: &'a Value) -> Self {
        Self { id, value }
    }

    /// 对象 ID，生命周期跟随模型而非句柄
    pub fn id(&self) -> &'a str {
        self.id
    }
}

impl ModelObject for JsonObject<'_> {
    fn id(&self) -> &str {
        self.id
    }

    fn fields(&self) -> Option<&Map<String, Value>> {
        self.value.as_object()
    }
}

/// 展开时不进入的键：显示几何与参数集合不是独立的模型对象
const SKIPPED_KEYS: [&str; 4] = ["displayValue", "@displayValue", "parameters", "@parameters"];

/// 深度优先展开模型树，返回所有带字符串 `id` 的对象（包括根对象）
///
/// 同一 ID 被多处引用时只保留第一次出现的对象。
pub fn flatten(root: &Value) -> Vec<JsonObject<'_>> {
    let mut walk = Walk::default();
    walk.collect(root);
    walk.objects
}

#[derive(Default)]
struct Walk<'a> {
    objects: Vec<JsonObject<'a>>,
    seen: HashSet<&'a str>,
}

impl<'a> Walk<'a> {
    fn collect(&mut self, value: &'a Value) {
        match value {
            Value::Object(map) => {
                if let Some(object) = JsonObject::new(value) {
                    if self.seen.insert(object.id()) {
                        self.objects.push(object);
                    }
                }
                for (key, child) in map {
                    if SKIPPED_KEYS.contains(&key.as_str()) {
                        continue;
                    }
                    self.collect(child);
                }
            }
            Value::Array(items) => {
                for item in items {
                    self.collect(item);
                }
            }
            _ => {}
        }
    }
}

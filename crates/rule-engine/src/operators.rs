//! 谓词定义
//!
//! 规则表中的谓词名称在解析阶段被识别为 [`PredicateKind`]，
//! 再与操作数一起编译成 [`Predicate`]，评估阶段不再处理字符串分派。

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 谓词种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredicateKind {
    // 通用比较
    Equals,
    NotEquals,

    // 数值比较
    GreaterThan,
    LessThan,
    GreaterThanOrEqual,
    LessThanOrEqual,
    InRange,

    // 字符串匹配
    Matches,
    InList,

    // 存在性检查
    Exists,
    NotExists,

    // 布尔检查
    IsTrue,
    IsFalse,
}

impl PredicateKind {
    pub const ALL: [PredicateKind; 13] = [
        Self::Equals,
        Self::NotEquals,
        Self::GreaterThan,
        Self::LessThan,
        Self::GreaterThanOrEqual,
        Self::LessThanOrEqual,
        Self::InRange,
        Self::Matches,
        Self::InList,
        Self::Exists,
        Self::NotExists,
        Self::IsTrue,
        Self::IsFalse,
    ];

    /// 规则表中使用的规范名称
    pub fn name(&self) -> &'static str {
        match self {
            Self::Equals => "equals",
            Self::NotEquals => "not equals",
            Self::GreaterThan => "greater than",
            Self::LessThan => "less than",
            Self::GreaterThanOrEqual => "greater than or equal",
            Self::LessThanOrEqual => "less than or equal",
            Self::InRange => "in range",
            Self::Matches => "matches",
            Self::InList => "in list",
            Self::Exists => "exists",
            Self::NotExists => "not exists",
            Self::IsTrue => "is true",
            Self::IsFalse => "is false",
        }
    }

    /// 按名称查找谓词
    ///
    /// 忽略大小写，`_` 与 `-` 视为空格，连续空白合并；同时接受符号别名。
    pub fn lookup(name: &str) -> Option<Self> {
        let normalized = name
            .trim()
            .to_lowercase()
            .replace(['_', '-'], " ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");

        let kind = match normalized.as_str() {
            "equals" | "equal" | "equal to" | "is equal to" | "=" | "==" => Self::Equals,
            "not equals" | "not equal" | "not equal to" | "!=" | "<>" => Self::NotEquals,
            "greater than" | "is greater than" | ">" => Self::GreaterThan,
            "less than" | "is less than" | "<" => Self::LessThan,
            "greater than or equal" | "greater than or equal to" | ">=" => {
                Self::GreaterThanOrEqual
            }
            "less than or equal" | "less than or equal to" | "<=" => Self::LessThanOrEqual,
            "in range" | "between" => Self::InRange,
            "matches" | "match" | "like" | "is like" => Self::Matches,
            "in list" | "in" | "one of" => Self::InList,
            "exists" | "exist" | "has property" => Self::Exists,
            "not exists" | "not exist" | "does not exist" => Self::NotExists,
            "is true" | "true" => Self::IsTrue,
            "is false" | "false" => Self::IsFalse,
            _ => return None,
        };

        Some(kind)
    }

    /// 是否需要操作数
    pub fn requires_value(&self) -> bool {
        !matches!(
            self,
            Self::Exists | Self::NotExists | Self::IsTrue | Self::IsFalse
        )
    }
}

impl fmt::Display for PredicateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// 解析为数值，拒绝 NaN 与无穷
pub(crate) fn parse_number(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

/// 字符串操作数，预先尝试数值化
#[derive(Debug, Clone, PartialEq)]
pub struct Operand {
    pub raw: String,
    pub number: Option<f64>,
}

impl Operand {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into().trim().to_string();
        let number = parse_number(&raw);
        Self { raw, number }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

/// 匹配模式：不含通配符时为忽略大小写的精确匹配，`*` 与 `?` 为通配符
#[derive(Debug, Clone)]
pub struct Pattern {
    raw: String,
    lowered: String,
    wildcard: Option<Regex>,
}

impl Pattern {
    pub fn new(raw: &str) -> Result<Self, regex::Error> {
        let raw = raw.trim().to_string();
        let wildcard = if raw.contains(['*', '?']) {
            let mut source = String::from("(?is)^");
            for c in raw.chars() {
                match c {
                    '*' => source.push_str(".*"),
                    '?' => source.push('.'),
                    other => source.push_str(&regex::escape(&other.to_string())),
                }
            }
            source.push('$');
            Some(Regex::new(&source)?)
        } else {
            None
        };

        Ok(Self {
            lowered: raw.to_lowercase(),
            raw,
            wildcard,
        })
    }

    pub fn is_match(&self, text: &str) -> bool {
        let text = text.trim();
        match &self.wildcard {
            Some(regex) => regex.is_match(text),
            None => text.to_lowercase() == self.lowered,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

/// 编译后的谓词
#[derive(Debug, Clone)]
pub enum Predicate {
    Equals(Operand),
    NotEquals(Operand),
    GreaterThan(f64),
    LessThan(f64),
    GreaterThanOrEqual(f64),
    LessThanOrEqual(f64),
    InRange { min: f64, max: f64 },
    Matches(Pattern),
    InList(Vec<Operand>),
    Exists,
    NotExists,
    IsTrue,
    IsFalse,
}

impl Predicate {
    /// 将谓词种类与原始操作数编译为谓词，失败时返回原因描述
    pub fn compile(kind: PredicateKind, value: &str) -> Result<Self, String> {
        let predicate = match kind {
            PredicateKind::Equals => Self::Equals(Operand::new(value)),
            PredicateKind::NotEquals => Self::NotEquals(Operand::new(value)),
            PredicateKind::GreaterThan => Self::GreaterThan(Self::number(value)?),
            PredicateKind::LessThan => Self::LessThan(Self::number(value)?),
            PredicateKind::GreaterThanOrEqual => Self::GreaterThanOrEqual(Self::number(value)?),
            PredicateKind::LessThanOrEqual => Self::LessThanOrEqual(Self::number(value)?),
            PredicateKind::InRange => {
                let bounds: Vec<&str> = value.split(',').map(str::trim).collect();
                if bounds.len() != 2 {
                    return Err("需要 'min,max' 两个数值".to_string());
                }
                let min = Self::number(bounds[0])?;
                let max = Self::number(bounds[1])?;
                if min > max {
                    return Err(format!("下限 {} 大于上限 {}", min, max));
                }
                Self::InRange { min, max }
            }
            PredicateKind::Matches => {
                Self::Matches(Pattern::new(value).map_err(|e| format!("无效的匹配模式: {}", e))?)
            }
            PredicateKind::InList => {
                let items: Vec<Operand> = value
                    .split(',')
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(Operand::new)
                    .collect();
                if items.is_empty() {
                    return Err("列表不能为空".to_string());
                }
                Self::InList(items)
            }
            PredicateKind::Exists => Self::Exists,
            PredicateKind::NotExists => Self::NotExists,
            PredicateKind::IsTrue => Self::IsTrue,
            PredicateKind::IsFalse => Self::IsFalse,
        };

        Ok(predicate)
    }

    fn number(value: &str) -> Result<f64, String> {
        parse_number(value).ok_or_else(|| "需要数值".to_string())
    }

    pub fn kind(&self) -> PredicateKind {
        match self {
            Self::Equals(_) => PredicateKind::Equals,
            Self::NotEquals(_) => PredicateKind::NotEquals,
            Self::GreaterThan(_) => PredicateKind::GreaterThan,
            Self::LessThan(_) => PredicateKind::LessThan,
            Self::GreaterThanOrEqual(_) => PredicateKind::GreaterThanOrEqual,
            Self::LessThanOrEqual(_) => PredicateKind::LessThanOrEqual,
            Self::InRange { .. } => PredicateKind::InRange,
            Self::Matches(_) => PredicateKind::Matches,
            Self::InList(_) => PredicateKind::InList,
            Self::Exists => PredicateKind::Exists,
            Self::NotExists => PredicateKind::NotExists,
            Self::IsTrue => PredicateKind::IsTrue,
            Self::IsFalse => PredicateKind::IsFalse,
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = self.kind();
        match self {
            Self::Equals(op) | Self::NotEquals(op) => write!(f, "{} {}", kind, op),
            Self::GreaterThan(n)
            | Self::LessThan(n)
            | Self::GreaterThanOrEqual(n)
            | Self::LessThanOrEqual(n) => write!(f, "{} {}", kind, n),
            Self::InRange { min, max } => write!(f, "{} {}, {}", kind, min, max),
            Self::Matches(pattern) => write!(f, "{} {}", kind, pattern.as_str()),
            Self::InList(items) => {
                let items: Vec<&str> = items.iter().map(|op| op.raw.as_str()).collect();
                write!(f, "{} {}", kind, items.join(", "))
            }
            Self::Exists | Self::NotExists | Self::IsTrue | Self::IsFalse => {
                write!(f, "{}", kind)
            }
        }
    }
}

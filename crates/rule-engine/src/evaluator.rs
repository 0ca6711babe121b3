//! 谓词评估器
//!
//! 将编译后的谓词作用于解析出的属性值。数据问题（缺失、非数值）一律得到 `false`，
//! 不会中断评估。

use crate::operators::{Operand, Predicate, parse_number};
use crate::resolver::Resolved;
use serde_json::Value;
use std::borrow::Cow;

/// 谓词评估器
pub struct PredicateEvaluator;

impl PredicateEvaluator {
    /// 评估谓词
    ///
    /// # Arguments
    /// * `resolved` - 属性解析结果
    /// * `predicate` - 编译后的谓词
    pub fn evaluate(resolved: Resolved<'_>, predicate: &Predicate) -> bool {
        // 属性缺失时只有 not exists 成立
        let value = match resolved {
            Resolved::Found(v) => v,
            Resolved::Missing => return matches!(predicate, Predicate::NotExists),
        };

        match predicate {
            Predicate::Exists => true,
            Predicate::NotExists => false,
            Predicate::Equals(op) => Self::eq(value, op),
            Predicate::NotEquals(op) => !Self::eq(value, op),
            Predicate::GreaterThan(n) => Self::compare(value, |v| v > *n),
            Predicate::LessThan(n) => Self::compare(value, |v| v < *n),
            Predicate::GreaterThanOrEqual(n) => Self::compare(value, |v| v >= *n),
            Predicate::LessThanOrEqual(n) => Self::compare(value, |v| v <= *n),
            Predicate::InRange { min, max } => Self::compare(value, |v| v >= *min && v <= *max),
            Predicate::Matches(pattern) => pattern.is_match(&Self::as_text(value)),
            Predicate::InList(items) => items.iter().any(|op| Self::eq(value, op)),
            Predicate::IsTrue => Self::as_bool(value) == Some(true),
            Predicate::IsFalse => Self::as_bool(value) == Some(false),
        }
    }

    /// 相等比较：两边都能数值化时按数值比较，否则按忽略大小写的字符串比较
    fn eq(value: &Value, op: &Operand) -> bool {
        // 数值统一转为浮点数，避免 100 与 100.0 比较失败；容差按数量级缩放
        if let (Some(f1), Some(f2)) = (Self::as_f64(value), op.number) {
            return (f1 - f2).abs() <= f64::EPSILON * f1.abs().max(f2.abs());
        }

        Self::as_text(value).trim().to_lowercase() == op.raw.to_lowercase()
    }

    /// 数值比较，值无法数值化时返回 false
    fn compare<F>(value: &Value, cmp: F) -> bool
    where
        F: Fn(f64) -> bool,
    {
        Self::as_f64(value).is_some_and(cmp)
    }

    /// 尝试将 Value 转换为 f64
    fn as_f64(value: &Value) -> Option<f64> {
        match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => parse_number(s),
            _ => None,
        }
    }

    fn as_bool(value: &Value) -> Option<bool> {
        match value {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => match n.as_f64() {
                Some(f) if f == 1.0 => Some(true),
                Some(f) if f == 0.0 => Some(false),
                _ => None,
            },
            Value::String(s) => match s.trim().to_lowercase().as_str() {
                "true" | "yes" | "1" => Some(true),
                "false" | "no" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// 值的字符串形式，null 视为空字符串
    fn as_text(value: &Value) -> Cow<'_, str> {
        match value {
            Value::Null => Cow::Borrowed(""),
            Value::String(s) => Cow::Borrowed(s.as_str()),
            other => Cow::Owned(other.to_string()),
        }
    }
}

//! 规则引擎领域模型

use crate::operators::Predicate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// 规则编号（同一编号的行组成一条规则，编号不要求连续）
pub type RuleId = u32;

/// 解析后的规则集合，按规则编号排序
pub type RuleSet = BTreeMap<RuleId, Rule>;

/// 评估结果集合，按规则编号排序
pub type Outcomes = BTreeMap<RuleId, EvaluationOutcome>;

/// 规则表中的一行（所有字段均为原始字符串，由解析器负责类型化）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleRow {
    pub rule_number: String,
    pub logic: String,
    pub property_name: String,
    pub predicate: String,
    pub value: String,
    pub message: String,
    pub severity: String,
    /// 在表格中的行号（从 1 开始，表头为第 1 行）；代码构造的行为 None
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
}

impl RuleRow {
    pub fn new(
        rule_number: impl Into<String>,
        logic: impl Into<String>,
        property_name: impl Into<String>,
        predicate: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            rule_number: rule_number.into(),
            logic: logic.into(),
            property_name: property_name.into(),
            predicate: predicate.into(),
            value: value.into(),
            ..Default::default()
        }
    }

    /// 设置失败提示与严重级别
    pub fn report(mut self, message: impl Into<String>, severity: impl Into<String>) -> Self {
        self.message = message.into();
        self.severity = severity.into();
        self
    }

    /// 记录该行在表格中的行号
    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }
}

/// 行的逻辑关键字
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Logic {
    /// 筛选候选对象
    Where,
    /// 判定候选对象
    And,
}

impl FromStr for Logic {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "WHERE" => Ok(Self::Where),
            "AND" => Ok(Self::And),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Logic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Where => write!(f, "WHERE"),
            Self::And => write!(f, "AND"),
        }
    }
}

/// 失败条件的严重级别，排序为 Error < Warning < Info
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    pub const ALL: [Severity; 3] = [Severity::Error, Severity::Warning, Severity::Info];
}

impl FromStr for Severity {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "warning" => Ok(Self::Warning),
            "info" => Ok(Self::Info),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => write!(f, "Error"),
            Self::Warning => write!(f, "Warning"),
            Self::Info => write!(f, "Info"),
        }
    }
}

/// 类型化的子句：属性名 + 已编译的谓词
#[derive(Debug, Clone)]
pub struct Clause {
    /// 来源行号（从 1 开始）
    pub row: usize,
    pub property: String,
    pub predicate: Predicate,
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.property, self.predicate)
    }
}

/// 判定子句：失败时携带自己的提示与严重级别
#[derive(Debug, Clone)]
pub struct Condition {
    pub clause: Clause,
    pub message: String,
    pub severity: Severity,
}

/// 规则定义
#[derive(Debug, Clone)]
pub struct Rule {
    pub id: RuleId,
    /// WHERE 子句，全部成立的对象才是候选对象
    pub filters: Vec<Clause>,
    /// AND 子句，按行顺序判定候选对象
    pub conditions: Vec<Condition>,
}

impl Rule {
    pub fn new(id: RuleId) -> Self {
        Self {
            id,
            filters: Vec::new(),
            conditions: Vec::new(),
        }
    }

    /// 没有判定子句的规则会让所有候选对象直接通过
    pub fn is_degenerate(&self) -> bool {
        self.conditions.is_empty()
    }
}

/// 未通过判定的对象
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedEntry {
    pub object_id: String,
    /// 触发失败的子句所在行
    pub row: usize,
    /// 触发失败的子句文本，如 "height greater than 1200"
    pub clause: String,
    pub message: String,
    pub severity: Severity,
}

/// 单条规则的评估结果
///
/// 每个候选对象恰好出现在 `passed` 或 `failed` 之一，被 WHERE 排除的对象不出现。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationOutcome {
    pub rule_id: RuleId,
    pub passed: Vec<String>,
    pub failed: Vec<FailedEntry>,
    /// 规则没有判定子句
    pub degenerate: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub evaluation_trace: Vec<String>,
}

impl EvaluationOutcome {
    pub fn new(rule_id: RuleId, degenerate: bool) -> Self {
        Self {
            rule_id,
            passed: Vec::new(),
            failed: Vec::new(),
            degenerate,
            evaluation_trace: Vec::new(),
        }
    }

    /// 候选对象数量
    pub fn candidates(&self) -> usize {
        self.passed.len() + self.failed.len()
    }
}

//! 规则引擎错误类型

use crate::models::RuleId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuleError {
    /// 规则表中的某一行无法解析，`row` 为从 1 开始的表格行号
    #[error("规则行 #{row} 无效: {reason}")]
    MalformedRule { row: usize, reason: MalformedReason },

    #[error("规则表缺少必需的列: {0}")]
    MissingColumn(String),

    #[error("规则表为空")]
    EmptyTable,

    #[error("读取规则表失败: {0}")]
    Io(#[from] std::io::Error),

    #[error("获取规则表失败: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON 序列化错误: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl RuleError {
    pub(crate) fn malformed(row: usize, reason: MalformedReason) -> Self {
        Self::MalformedRule { row, reason }
    }

    /// 出错的规则行索引（仅配置错误携带）
    pub fn row(&self) -> Option<usize> {
        match self {
            Self::MalformedRule { row, .. } => Some(*row),
            _ => None,
        }
    }

    /// 是否为规则表配置错误
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedRule { .. } | Self::MissingColumn(_) | Self::EmptyTable
        )
    }
}

/// 规则行无效的具体原因
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedReason {
    #[error("未知的逻辑关键字 '{0}'，应为 WHERE 或 AND")]
    UnknownLogic(String),

    #[error("未知的谓词 '{0}'")]
    UnknownPredicate(String),

    #[error("缺少必填字段 '{0}'")]
    MissingField(&'static str),

    #[error("无效的严重级别 '{0}'，应为 Error、Warning 或 Info")]
    InvalidSeverity(String),

    #[error("无效的规则编号 '{0}'")]
    InvalidRuleNumber(String),

    #[error("规则 {rule} 的 WHERE 子句出现在 AND 子句之后")]
    WhereAfterAnd { rule: RuleId },

    #[error("谓词 '{predicate}' 的值 '{value}' 无效: {detail}")]
    InvalidOperand {
        predicate: String,
        value: String,
        detail: String,
    },
}

pub type Result<T> = std::result::Result<T, RuleError>;

//! 模型规则检查引擎
//!
//! 将可编辑的表格规则应用到模型对象集合上，提供：
//! - TSV 规则表读取与解析（WHERE 筛选 + AND 判定）
//! - 多策略的属性解析
//! - 短路求值的规则执行
//! - 按严重级别分组的校验报告

pub mod compiler;
pub mod error;
pub mod evaluator;
pub mod executor;
pub mod models;
pub mod object;
pub mod operators;
pub mod report;
pub mod resolver;
pub mod source;

pub use compiler::RuleParser;
pub use error::{MalformedReason, Result, RuleError};
pub use evaluator::PredicateEvaluator;
pub use executor::RuleExecutor;
pub use models::{
    Clause, Condition, EvaluationOutcome, FailedEntry, Logic, Outcomes, Rule, RuleId, RuleRow,
    RuleSet, Severity,
};
pub use object::{JsonObject, ModelObject, flatten};
pub use operators::{Operand, Pattern, Predicate, PredicateKind};
pub use report::{Annotation, DegenerateRule, Report, ReportEntry, RunStatus, aggregate};
pub use resolver::{LookupStrategy, PropertyResolver, Resolved};
pub use source::{fetch_table, parse_table, read_table};

/// 解析规则表并对对象集合执行校验，返回汇总报告
///
/// 规则表无效时在评估前返回配置错误。
pub fn check<O: ModelObject>(rows: &[RuleRow], objects: &[O]) -> Result<Report> {
    let rules = RuleParser::new().parse(rows)?;
    let outcomes = RuleExecutor::new().evaluate(&rules, objects);
    Ok(aggregate(&outcomes))
}

//! 指标描述
//!
//! 规则引擎通过 `metrics` 宏记录指标，这里统一注册名称与 HELP 文本。

/// 规则评估次数
pub const RULES_EVALUATED_TOTAL: &str = "rulecheck_rules_evaluated_total";
/// 未通过的对象数
pub const OBJECTS_FAILED_TOTAL: &str = "rulecheck_objects_failed_total";
/// 通过的对象数
pub const OBJECTS_PASSED_TOTAL: &str = "rulecheck_objects_passed_total";
/// 退化规则数
pub const DEGENERATE_RULES_TOTAL: &str = "rulecheck_degenerate_rules_total";
/// 单次评估耗时
pub const EVALUATION_DURATION_SECONDS: &str = "rulecheck_evaluation_duration_seconds";

/// 注册通用指标描述
pub fn describe() {
    metrics::describe_counter!(RULES_EVALUATED_TOTAL, "Total number of rules evaluated");
    metrics::describe_counter!(
        OBJECTS_FAILED_TOTAL,
        "Total number of candidate objects that failed a rule"
    );
    metrics::describe_counter!(
        OBJECTS_PASSED_TOTAL,
        "Total number of candidate objects that passed a rule"
    );
    metrics::describe_counter!(
        DEGENERATE_RULES_TOTAL,
        "Total number of rules without condition clauses"
    );
    metrics::describe_histogram!(
        EVALUATION_DURATION_SECONDS,
        "Rule table evaluation duration in seconds"
    );
}

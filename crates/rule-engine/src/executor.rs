//! 规则执行器
//!
//! 对每条规则：先用 WHERE 子句筛选候选对象，再按行顺序用 AND 子句判定候选对象，
//! 遇到第一个不成立的 AND 子句即判定失败（短路求值）。

use crate::evaluator::PredicateEvaluator;
use crate::models::{Clause, Condition, EvaluationOutcome, FailedEntry, Outcomes, Rule, RuleSet};
use crate::object::ModelObject;
use crate::resolver::{PropertyResolver, Resolved};
use rulecheck_shared::observability::metrics as names;
use std::collections::HashSet;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// 规则执行器
pub struct RuleExecutor {
    resolver: PropertyResolver,
    /// 是否记录详细评估追踪
    trace_enabled: bool,
}

impl RuleExecutor {
    pub fn new() -> Self {
        Self {
            resolver: PropertyResolver::new(),
            trace_enabled: false,
        }
    }

    /// 使用自定义属性解析器
    pub fn with_resolver(mut self, resolver: PropertyResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// 启用评估追踪
    pub fn with_trace(mut self) -> Self {
        self.trace_enabled = true;
        self
    }

    /// 对对象集合评估所有规则
    ///
    /// 规则之间互不依赖，结果按规则编号存放。
    #[instrument(skip_all, fields(rules = rules.len(), objects = objects.len()))]
    pub fn evaluate<O: ModelObject>(&self, rules: &RuleSet, objects: &[O]) -> Outcomes {
        let start = Instant::now();

        let outcomes: Outcomes = rules
            .values()
            .map(|rule| (rule.id, self.evaluate_rule(rule, objects)))
            .collect();

        let elapsed = start.elapsed();
        metrics::histogram!(names::EVALUATION_DURATION_SECONDS).record(elapsed.as_secs_f64());
        info!(
            rules = outcomes.len(),
            objects = objects.len(),
            evaluation_ms = elapsed.as_millis() as u64,
            "规则评估完成"
        );

        outcomes
    }

    /// 评估单条规则
    ///
    /// 同一 ID 的对象只评估第一次出现的那个。
    pub fn evaluate_rule<O: ModelObject>(&self, rule: &Rule, objects: &[O]) -> EvaluationOutcome {
        let mut outcome = EvaluationOutcome::new(rule.id, rule.is_degenerate());
        let mut seen = HashSet::new();

        for object in objects {
            if !seen.insert(object.id()) {
                debug!(rule_id = rule.id, object_id = object.id(), "跳过重复的对象 ID");
                continue;
            }

            if !self.is_candidate(rule, object, &mut outcome) {
                continue;
            }

            match self.first_failing_condition(rule, object, &mut outcome) {
                Some(condition) => outcome.failed.push(FailedEntry {
                    object_id: object.id().to_string(),
                    row: condition.clause.row,
                    clause: condition.clause.to_string(),
                    message: condition.message.clone(),
                    severity: condition.severity,
                }),
                None => outcome.passed.push(object.id().to_string()),
            }
        }

        metrics::counter!(names::RULES_EVALUATED_TOTAL).increment(1);
        metrics::counter!(names::OBJECTS_PASSED_TOTAL).increment(outcome.passed.len() as u64);
        metrics::counter!(names::OBJECTS_FAILED_TOTAL).increment(outcome.failed.len() as u64);

        if outcome.degenerate {
            metrics::counter!(names::DEGENERATE_RULES_TOTAL).increment(1);
            warn!(
                rule_id = rule.id,
                candidates = outcome.candidates(),
                "规则没有判定子句，所有候选对象直接通过"
            );
        } else {
            debug!(
                rule_id = rule.id,
                passed = outcome.passed.len(),
                failed = outcome.failed.len(),
                "规则评估完成"
            );
        }

        outcome
    }

    /// 所有 WHERE 子句都成立的对象才是候选对象
    fn is_candidate<O: ModelObject>(
        &self,
        rule: &Rule,
        object: &O,
        outcome: &mut EvaluationOutcome,
    ) -> bool {
        for clause in &rule.filters {
            if !self.check(clause, object, outcome, "WHERE") {
                return false;
            }
        }
        true
    }

    /// 按行顺序判定，返回第一个不成立的 AND 子句
    fn first_failing_condition<'r, O: ModelObject>(
        &self,
        rule: &'r Rule,
        object: &O,
        outcome: &mut EvaluationOutcome,
    ) -> Option<&'r Condition> {
        rule.conditions
            .iter()
            .find(|condition| !self.check(&condition.clause, object, outcome, "AND"))
    }

    fn check<O: ModelObject>(
        &self,
        clause: &Clause,
        object: &O,
        outcome: &mut EvaluationOutcome,
        logic: &str,
    ) -> bool {
        let source = self.resolver.resolve_with_source(object, &clause.property);
        let resolved = match source {
            Some((_, value)) => Resolved::Found(value),
            None => Resolved::Missing,
        };

        let matched = PredicateEvaluator::evaluate(resolved, &clause.predicate);

        if self.trace_enabled {
            let found = match source {
                Some((strategy, value)) => format!("{} (via {})", value, strategy),
                None => "<missing>".to_string(),
            };
            outcome.evaluation_trace.push(format!(
                "{} row {}: {} {} => {} {}",
                object.id(),
                clause.row,
                logic,
                clause,
                found,
                if matched { "MATCHED" } else { "NOT_MATCHED" }
            ));
        }

        matched
    }
}

impl Default for RuleExecutor {
    fn default() -> Self {
        Self::new()
    }
}

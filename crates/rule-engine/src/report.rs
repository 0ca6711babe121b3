//! 结果汇总
//!
//! 将每条规则的评估结果按严重级别分组，生成供报告与模型批注使用的结构。
//! 汇总是纯函数，不修改输入，对同一组结果重复调用得到相同的报告。

use crate::models::{Outcomes, RuleId, Severity};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::instrument;

/// 报告中的一条失败记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub object_id: String,
    pub rule_id: RuleId,
    /// 触发失败的规则行
    pub row: usize,
    pub message: String,
}

/// 没有判定子句的规则，作为配置警告单独列出
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DegenerateRule {
    pub rule_id: RuleId,
    /// 被直接放行的候选对象数量
    pub candidates: usize,
    pub message: String,
}

/// 按（严重级别, 规则, 提示）聚合的对象批注
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub severity: Severity,
    pub rule_id: RuleId,
    pub category: String,
    pub message: String,
    pub object_ids: Vec<String>,
}

/// 运行状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Succeeded,
    Failed,
}

/// 校验报告
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// 严重级别 -> 失败记录（按规则编号、对象顺序排列）
    pub issues: BTreeMap<Severity, Vec<ReportEntry>>,
    /// 规则编号 -> 通过的对象
    pub passed: BTreeMap<RuleId, Vec<String>>,
    pub degenerate_rules: Vec<DegenerateRule>,
    pub rules_evaluated: usize,
}

/// 汇总评估结果
#[instrument(skip_all, fields(rules = outcomes.len()))]
pub fn aggregate(outcomes: &Outcomes) -> Report {
    let mut issues: BTreeMap<Severity, Vec<ReportEntry>> = BTreeMap::new();
    let mut passed = BTreeMap::new();
    let mut degenerate_rules = Vec::new();

    for (rule_id, outcome) in outcomes {
        for failure in &outcome.failed {
            issues.entry(failure.severity).or_default().push(ReportEntry {
                object_id: failure.object_id.clone(),
                rule_id: *rule_id,
                row: failure.row,
                message: failure.message.clone(),
            });
        }

        passed.insert(*rule_id, outcome.passed.clone());

        if outcome.degenerate {
            degenerate_rules.push(DegenerateRule {
                rule_id: *rule_id,
                candidates: outcome.candidates(),
                message: format!(
                    "Rule {} has no AND conditions; its {} candidate object(s) pass without being checked",
                    rule_id,
                    outcome.candidates()
                ),
            });
        }
    }

    Report {
        issues,
        passed,
        degenerate_rules,
        rules_evaluated: outcomes.len(),
    }
}

impl Report {
    /// 某一严重级别的失败记录
    pub fn entries(&self, severity: Severity) -> &[ReportEntry] {
        self.issues.get(&severity).map(Vec::as_slice).unwrap_or(&[])
    }

    /// 失败记录总数
    pub fn failed_count(&self) -> usize {
        self.issues.values().map(Vec::len).sum()
    }

    /// 通过记录总数
    pub fn passed_count(&self) -> usize {
        self.passed.values().map(Vec::len).sum()
    }

    /// 参与校验（通过或失败）的记录数
    pub fn validated_count(&self) -> usize {
        self.passed_count() + self.failed_count()
    }

    /// 存在 Error 级别失败时运行失败，只有 Warning/Info 仍视为成功
    pub fn status(&self) -> RunStatus {
        if self.entries(Severity::Error).is_empty() {
            RunStatus::Succeeded
        } else {
            RunStatus::Failed
        }
    }

    /// 运行摘要
    pub fn summary(&self, total_objects: usize) -> String {
        let mut summary = format!(
            "Applied {} rules to {} objects out of {} total objects",
            self.rules_evaluated,
            self.validated_count(),
            total_objects
        );

        let counts: Vec<String> = Severity::ALL
            .iter()
            .map(|severity| (severity, self.entries(*severity).len()))
            .filter(|(_, count)| *count > 0)
            .map(|(severity, count)| format!("{} {}", count, severity))
            .collect();

        if counts.is_empty() {
            summary.push_str("; all checks passed");
        } else {
            summary.push_str(&format!("; issues: {}", counts.join(", ")));
        }

        if !self.degenerate_rules.is_empty() {
            summary.push_str(&format!(
                "; {} rule(s) without conditions",
                self.degenerate_rules.len()
            ));
        }

        summary
    }

    /// 按（严重级别, 规则, 提示）聚合对象 ID，供模型批注使用
    pub fn annotations(&self) -> Vec<Annotation> {
        let mut groups: BTreeMap<(Severity, RuleId, &str), Vec<String>> = BTreeMap::new();

        for (severity, entries) in &self.issues {
            for entry in entries {
                groups
                    .entry((*severity, entry.rule_id, entry.message.as_str()))
                    .or_default()
                    .push(entry.object_id.clone());
            }
        }

        groups
            .into_iter()
            .map(|((severity, rule_id, message), object_ids)| Annotation {
                severity,
                rule_id,
                category: format!("Rule {}", rule_id),
                message: message.to_string(),
                object_ids,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EvaluationOutcome, FailedEntry};

    fn failed(object_id: &str, row: usize, message: &str, severity: Severity) -> FailedEntry {
        FailedEntry {
            object_id: object_id.to_string(),
            row,
            clause: "height greater than 1200".to_string(),
            message: message.to_string(),
            severity,
        }
    }

    fn sample_outcomes() -> Outcomes {
        let mut wall = EvaluationOutcome::new(1, false);
        wall.passed.push("wall-1".to_string());
        wall.failed.push(failed("wall-2", 1, "too low", Severity::Error));
        wall.failed.push(failed("wall-3", 1, "too low", Severity::Error));
        wall.failed.push(failed("wall-4", 2, "no mark", Severity::Info));

        let mut classification = EvaluationOutcome::new(2, false);
        classification
            .failed
            .push(failed("door-1", 3, "unclassified", Severity::Warning));

        let mut loose = EvaluationOutcome::new(3, true);
        loose.passed.push("wall-1".to_string());
        loose.passed.push("wall-2".to_string());

        [(1, wall), (2, classification), (3, loose)].into_iter().collect()
    }

    #[test]
    fn test_groups_failures_by_severity() {
        let report = aggregate(&sample_outcomes());

        assert_eq!(report.entries(Severity::Error).len(), 2);
        assert_eq!(report.entries(Severity::Warning).len(), 1);
        assert_eq!(report.entries(Severity::Info).len(), 1);
        assert_eq!(report.entries(Severity::Warning)[0].object_id, "door-1");
        assert_eq!(report.entries(Severity::Warning)[0].rule_id, 2);
        assert_eq!(report.failed_count(), 4);
        assert_eq!(report.passed_count(), 3);
        assert_eq!(report.rules_evaluated, 3);
    }

    #[test]
    fn test_passed_kept_per_rule() {
        let report = aggregate(&sample_outcomes());
        assert_eq!(report.passed[&1], vec!["wall-1"]);
        assert!(report.passed[&2].is_empty());
    }

    #[test]
    fn test_degenerate_rules_listed() {
        let report = aggregate(&sample_outcomes());
        assert_eq!(report.degenerate_rules.len(), 1);
        assert_eq!(report.degenerate_rules[0].rule_id, 3);
        assert_eq!(report.degenerate_rules[0].candidates, 2);
    }

    #[test]
    fn test_aggregate_is_idempotent() {
        let outcomes = sample_outcomes();
        let before = outcomes.clone();
        let first = aggregate(&outcomes);
        let second = aggregate(&outcomes);
        assert_eq!(first, second);
        assert_eq!(outcomes, before);
    }

    #[test]
    fn test_status() {
        assert_eq!(aggregate(&sample_outcomes()).status(), RunStatus::Failed);

        let mut outcomes = sample_outcomes();
        outcomes.remove(&1);
        assert_eq!(aggregate(&outcomes).status(), RunStatus::Succeeded);

        assert_eq!(aggregate(&Outcomes::new()).status(), RunStatus::Succeeded);
    }

    #[test]
    fn test_annotations_group_objects() {
        let annotations = aggregate(&sample_outcomes()).annotations();

        assert_eq!(annotations.len(), 3);
        assert_eq!(annotations[0].severity, Severity::Error);
        assert_eq!(annotations[0].category, "Rule 1");
        assert_eq!(annotations[0].object_ids, vec!["wall-2", "wall-3"]);
        assert_eq!(annotations[1].severity, Severity::Warning);
        assert_eq!(annotations[2].message, "no mark");
    }

    #[test]
    fn test_summary() {
        let report = aggregate(&sample_outcomes());
        let summary = report.summary(10);
        assert!(summary.starts_with("Applied 3 rules to 7 objects out of 10 total objects"));
        assert!(summary.contains("2 Error, 1 Warning, 1 Info"));
        assert!(summary.contains("1 rule(s) without conditions"));

        let empty = aggregate(&Outcomes::new()).summary(0);
        assert!(empty.ends_with("all checks passed"));
    }

    #[test]
    fn test_report_serializes_severity_keys() {
        let json = serde_json::to_value(aggregate(&sample_outcomes())).unwrap();
        assert_eq!(json["issues"]["Error"][0]["object_id"], "wall-2");
        assert_eq!(json["passed"]["1"][0], "wall-1");
    }
}

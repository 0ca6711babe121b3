//! 规则解析器
//!
//! 将规则表的扁平行按规则编号分组，并编译成类型化的 WHERE/AND 子句。
//! 解析是全有或全无的：任何一行无效都会让整张表解析失败，并指出出错的行。

use crate::error::{MalformedReason, Result, RuleError};
use crate::models::{Clause, Condition, Logic, Rule, RuleId, RuleRow, RuleSet, Severity};
use crate::operators::{Predicate, PredicateKind};
use tracing::{debug, instrument, warn};

/// 单行解析结果
struct ParsedRow {
    rule_id: RuleId,
    logic: Logic,
    clause: Clause,
    message: String,
    severity: Option<Severity>,
}

/// 规则解析器
pub struct RuleParser;

impl RuleParser {
    pub fn new() -> Self {
        Self
    }

    /// 解析规则表
    ///
    /// 同一规则编号的行保持表中顺序；WHERE 必须出现在该规则所有 AND 之前。
    #[instrument(skip(self, rows), fields(rows = rows.len()))]
    pub fn parse(&self, rows: &[RuleRow]) -> Result<RuleSet> {
        let mut rules = RuleSet::new();

        for (index, row) in rows.iter().enumerate() {
            // 报告给表格编辑者的行号：优先用表格中的行号，否则为切片中的第几行
            let line = row.line.unwrap_or(index + 1);
            let parsed = self.parse_row(line, row)?;
            let rule = rules
                .entry(parsed.rule_id)
                .or_insert_with(|| Rule::new(parsed.rule_id));

            match parsed.logic {
                Logic::Where => {
                    if !rule.conditions.is_empty() {
                        return Err(RuleError::malformed(
                            line,
                            MalformedReason::WhereAfterAnd {
                                rule: parsed.rule_id,
                            },
                        ));
                    }
                    rule.filters.push(parsed.clause);
                }
                Logic::And => {
                    // AND 行的严重级别在 parse_row 中已校验为必填
                    let severity = parsed.severity.unwrap_or(Severity::Error);
                    rule.conditions.push(Condition {
                        clause: parsed.clause,
                        message: parsed.message,
                        severity,
                    });
                }
            }
        }

        for rule in rules.values() {
            if rule.is_degenerate() {
                warn!(rule_id = rule.id, filters = rule.filters.len(), "规则没有 AND 判定子句");
            }
        }

        debug!(rules = rules.len(), "规则表解析完成");
        Ok(rules)
    }

    /// 解析并校验单行
    fn parse_row(&self, line: usize, row: &RuleRow) -> Result<ParsedRow> {
        let fail = |reason| RuleError::malformed(line, reason);

        let rule_number = Self::required(&row.rule_number, "rule number").map_err(fail)?;
        let rule_id = Self::parse_rule_number(rule_number).map_err(fail)?;

        let logic_text = Self::required(&row.logic, "logic").map_err(fail)?;
        let logic: Logic = logic_text
            .parse()
            .map_err(|_| fail(MalformedReason::UnknownLogic(logic_text.to_string())))?;

        let property = Self::required(&row.property_name, "property name").map_err(fail)?;

        let predicate_name = Self::required(&row.predicate, "predicate").map_err(fail)?;
        let kind = PredicateKind::lookup(predicate_name)
            .ok_or_else(|| fail(MalformedReason::UnknownPredicate(predicate_name.to_string())))?;

        let value = row.value.trim();
        if kind.requires_value() && value.is_empty() {
            return Err(fail(MalformedReason::MissingField("value")));
        }

        let predicate = Predicate::compile(kind, value).map_err(|detail| {
            fail(MalformedReason::InvalidOperand {
                predicate: kind.to_string(),
                value: value.to_string(),
                detail,
            })
        })?;

        // WHERE 行可以省略严重级别，但填写了就必须有效
        let severity_text = row.severity.trim();
        let severity = if severity_text.is_empty() {
            None
        } else {
            Some(
                severity_text
                    .parse::<Severity>()
                    .map_err(|_| fail(MalformedReason::InvalidSeverity(severity_text.to_string())))?,
            )
        };

        let message = row.message.trim();
        if logic == Logic::And {
            if severity.is_none() {
                return Err(fail(MalformedReason::MissingField("severity")));
            }
            if message.is_empty() {
                return Err(fail(MalformedReason::MissingField("message")));
            }
        }

        Ok(ParsedRow {
            rule_id,
            logic,
            clause: Clause {
                row: line,
                property: property.to_string(),
                predicate,
            },
            message: message.to_string(),
            severity,
        })
    }

    fn required<'a>(
        value: &'a str,
        field: &'static str,
    ) -> std::result::Result<&'a str, MalformedReason> {
        let value = value.trim();
        if value.is_empty() {
            Err(MalformedReason::MissingField(field))
        } else {
            Ok(value)
        }
    }

    /// 规则编号允许写成 "3" 或表格导出的 "3.0"
    fn parse_rule_number(text: &str) -> std::result::Result<RuleId, MalformedReason> {
        if let Ok(id) = text.parse::<RuleId>() {
            return Ok(id);
        }

        match text.parse::<f64>() {
            Ok(f) if f.fract() == 0.0 && f >= 0.0 && f <= RuleId::MAX as f64 => Ok(f as RuleId),
            _ => Err(MalformedReason::InvalidRuleNumber(text.to_string())),
        }
    }
}

impl Default for RuleParser {
    fn default() -> Self {
        Self::new()
    }
}

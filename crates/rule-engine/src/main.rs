//! 模型规则检查命令行
//!
//! 读取规则表与模型 JSON，执行校验并将报告以 JSON 输出到 stdout。
//! 退出码：0 成功，1 存在 Error 级别问题，2 规则表无效。

use anyhow::{Context, Result};
use chrono::Utc;
use rule_engine::{
    RuleExecutor, RuleParser, RuleRow, RunStatus, aggregate, fetch_table, flatten, read_table,
};
use rulecheck_shared::config::AppConfig;
use rulecheck_shared::observability;
use serde_json::json;
use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;

const SERVICE_NAME: &str = "rulecheck";

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // 统一加载配置：config/ 目录 + RULECHECK__ 前缀环境变量
    let config = AppConfig::load(SERVICE_NAME).unwrap_or_else(|e| {
        eprintln!("Failed to load config, using defaults: {}", e);
        AppConfig {
            service_name: SERVICE_NAME.to_string(),
            ..AppConfig::default()
        }
    });

    let _guard = observability::init(&config.service_name, &config.observability)?;

    let run_id = Uuid::now_v7();
    run(&config, run_id)
        .instrument(info_span!("rule_check", %run_id))
        .await
}

async fn run(config: &AppConfig, run_id: Uuid) -> Result<ExitCode> {
    let started_at = Utc::now();
    info!(%started_at, environment = %config.environment, "Starting rule check...");

    let rows = load_rows(config).await?;

    // 规则表无效时不做任何评估
    let rules = match RuleParser::new().parse(&rows) {
        Ok(rules) => rules,
        Err(e) => {
            error!(row = ?e.row(), error = %e, "规则表无效，未执行校验");
            return Ok(ExitCode::from(2));
        }
    };

    let model_text = tokio::fs::read_to_string(&config.model.path)
        .await
        .with_context(|| format!("Failed to read model file {}", config.model.path))?;
    let model: serde_json::Value =
        serde_json::from_str(&model_text).context("Model file is not valid JSON")?;
    let objects = flatten(&model);
    info!(objects = objects.len(), "模型已展开");

    let outcomes = RuleExecutor::new().evaluate(&rules, &objects);
    let report = aggregate(&outcomes);

    for rule in &report.degenerate_rules {
        warn!(rule_id = rule.rule_id, "{}", rule.message);
    }

    let summary = report.summary(objects.len());
    let status = report.status();

    let output = json!({
        "run_id": run_id.to_string(),
        "started_at": started_at.to_rfc3339(),
        "status": status,
        "summary": summary,
        "report": report,
        "annotations": report.annotations(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);

    match status {
        RunStatus::Succeeded => {
            info!(%summary, "Rule check succeeded");
            Ok(ExitCode::SUCCESS)
        }
        RunStatus::Failed => {
            warn!(%summary, "Rule check failed");
            Ok(ExitCode::FAILURE)
        }
    }
}

/// 读取规则表，URL 优先于本地路径
async fn load_rows(config: &AppConfig) -> Result<Vec<RuleRow>> {
    let rows = if let Some(url) = &config.rules.url {
        fetch_table(url, Duration::from_secs(config.rules.timeout_seconds)).await
    } else if let Some(path) = &config.rules.path {
        read_table(Path::new(path)).await
    } else {
        anyhow::bail!("No rule table configured: set rules.url or rules.path");
    };

    rows.context("Failed to read rules from spreadsheet")
}

//! 配置管理模块
//!
//! 支持多格式配置文件加载，环境变量覆盖，以及类型安全的配置访问。

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// 规则表来源配置
///
/// `url` 与 `path` 同时存在时优先使用 `url`。
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// 发布为 TSV 的在线表格地址
    pub url: Option<String>,
    /// 本地 TSV 文件路径
    pub path: Option<String>,
    pub timeout_seconds: u64,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            url: None,
            path: None,
            timeout_seconds: 30,
        }
    }
}

/// 模型数据配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// 模型 JSON 文件路径
    pub path: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: "model.json".to_string(),
        }
    }
}

/// 可观测性配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub log_level: String,
    /// 日志输出格式：json（结构化）或 pretty（人类可读）
    pub log_format: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
        }
    }
}

impl ObservabilityConfig {
    pub fn json_logs(&self) -> bool {
        self.log_format.eq_ignore_ascii_case("json")
    }
}

/// 应用配置
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub service_name: String,
    pub environment: String,
    pub rules: RulesConfig,
    pub model: ModelConfig,
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// 从配置文件和环境变量加载配置
    ///
    /// 加载顺序（后加载的会覆盖先加载的同名配置项）：
    /// 1. config/default.toml（默认配置）
    /// 2. config/{environment}.toml（环境特定配置）
    /// 3. config/{service_name}.toml（服务特定配置）
    /// 4. 环境变量（RULECHECK 前缀，如 RULECHECK__RULES__URL -> rules.url）
    pub fn load(service_name: &str) -> Result<Self, ConfigError> {
        let env = std::env::var("RULECHECK_ENV").unwrap_or_else(|_| "development".to_string());

        let config_dir = std::env::var("CONFIG_DIR").unwrap_or_else(|_| "config".to_string());

        Self::load_from(service_name, &env, Path::new(&config_dir))
    }

    /// 从指定目录加载配置，环境名由调用方给出
    pub fn load_from(service_name: &str, env: &str, config_dir: &Path) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .set_default("service_name", service_name)?
            .set_default("environment", env)?
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            .add_source(File::from(config_dir.join(format!("{}.toml", env))).required(false))
            .add_source(
                File::from(config_dir.join(format!("{}.toml", service_name))).required(false),
            )
            // 双下划线分隔层级，字段名自身可以包含下划线
            .add_source(
                Environment::with_prefix("RULECHECK")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.rules.timeout_seconds, 30);
        assert_eq!(config.model.path, "model.json");
        assert!(!config.observability.json_logs());
    }

    #[test]
    fn test_load_without_files_uses_defaults() {
        let dir = std::env::temp_dir().join(format!("rulecheck-config-empty-{}", std::process::id()));
        let config = AppConfig::load_from("rulecheck", "test", &dir).unwrap();

        assert_eq!(config.service_name, "rulecheck");
        assert_eq!(config.environment, "test");
        assert!(config.rules.url.is_none());
        assert_eq!(config.observability.log_level, "info");
    }

    #[test]
    fn test_service_file_overrides_default_file() {
        let dir = std::env::temp_dir().join(format!("rulecheck-config-layers-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("default.toml"),
            "[rules]\npath = \"rules.tsv\"\ntimeout_seconds = 5\n",
        )
        .unwrap();
        fs::write(
            dir.join("rulecheck.toml"),
            "[rules]\ntimeout_seconds = 12\n[observability]\nlog_format = \"json\"\n",
        )
        .unwrap();

        let config = AppConfig::load_from("rulecheck", "test", &dir).unwrap();

        assert_eq!(config.rules.path.as_deref(), Some("rules.tsv"));
        assert_eq!(config.rules.timeout_seconds, 12);
        assert!(config.observability.json_logs());

        fs::remove_dir_all(&dir).unwrap();
    }
}

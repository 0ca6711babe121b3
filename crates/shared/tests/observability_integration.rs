//! 可观测性模块集成测试
//!
//! 测试指标描述、日志过滤器与初始化流程。

// ============================================================================
// 指标测试
// ============================================================================

mod metrics_tests {
    use rulecheck_shared::observability::metrics::{
        DEGENERATE_RULES_TOTAL, EVALUATION_DURATION_SECONDS, OBJECTS_FAILED_TOTAL,
        OBJECTS_PASSED_TOTAL, RULES_EVALUATED_TOTAL, describe,
    };
    use std::collections::HashSet;

    const ALL: [&str; 5] = [
        RULES_EVALUATED_TOTAL,
        OBJECTS_FAILED_TOTAL,
        OBJECTS_PASSED_TOTAL,
        DEGENERATE_RULES_TOTAL,
        EVALUATION_DURATION_SECONDS,
    ];

    #[test]
    fn test_metric_names_are_prefixed_and_unique() {
        let unique: HashSet<&str> = ALL.iter().copied().collect();
        assert_eq!(unique.len(), ALL.len());
        assert!(ALL.iter().all(|name| name.starts_with("rulecheck_")));
        assert!(EVALUATION_DURATION_SECONDS.ends_with("_seconds"));
    }

    #[test]
    fn test_describe_without_recorder() {
        // 未安装 recorder 时描述与记录都是空操作
        describe();
        describe();
        metrics::counter!(RULES_EVALUATED_TOTAL).increment(1);
        metrics::histogram!(EVALUATION_DURATION_SECONDS).record(0.01);
    }
}

// ============================================================================
// 日志测试
// ============================================================================

mod tracing_tests {
    use rulecheck_shared::config::ObservabilityConfig;
    use rulecheck_shared::observability::{self, ObservabilityGuard, tracing::env_filter};

    #[test]
    fn test_env_filter_from_config() {
        let config = ObservabilityConfig {
            log_level: "rule_engine=debug,warn".to_string(),
            ..Default::default()
        };
        let _ = env_filter(&config);
    }

    #[test]
    fn test_json_logs_flag() {
        let mut config = ObservabilityConfig::default();
        assert!(!config.json_logs());

        config.log_format = "json".to_string();
        assert!(config.json_logs());
    }

    #[test]
    fn test_empty_guard_drop() {
        let guard = ObservabilityGuard::empty();
        drop(guard);
    }

    #[test]
    fn test_init_only_once() {
        let config = ObservabilityConfig::default();

        let guard = observability::init("rulecheck-test", &config);
        assert!(guard.is_ok());

        // 全局订阅器已设置，再次初始化应返回错误而不是 panic
        assert!(observability::init("rulecheck-test", &config).is_err());
    }
}

//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::AppConfig;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 环境变量前缀
const ENV_PREFIX: &str = "RESEARCH_MONITOR";

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `RESEARCH_MONITOR_`，层级分隔符 `__`）
/// 2. 配置文件（config.toml 或 config.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `RESEARCH_MONITOR_API__BASE_URL=http://backend:8000`
/// - `RESEARCH_MONITOR_API__AUTH_TOKEN=...`
/// - `RESEARCH_MONITOR_MONITOR__POLL_INTERVAL_MS=2000`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 默认值（最低优先级）
    builder = builder
        .set_default("api.base_url", "http://localhost:8000")?
        .set_default("api.timeout_secs", 30)?
        .set_default("api.list_path", "/api/research/results/")?
        .set_default("api.delete_path", "/api/research/results/delete/")?
        .set_default("api.notifications_path", "/api/notifications/")?
        .set_default("monitor.page_size", 10)?
        .set_default("monitor.poll_interval_ms", 4000)?
        .set_default("monitor.progress_tick_ms", 500)?
        .set_default("monitor.search_debounce_ms", 300)?
        .set_default("monitor.expected_duration_ms", 10_000)?
        .set_default("monitor.progress_cap", 95.0)?
        .set_default("monitor.notification_category", "research")?
        .set_default("monitor.discard_stale_responses", true)?
        .set_default("log.level", "info")?;

    // 2. 配置文件
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 环境变量（最高优先级）
    // 例如: RESEARCH_MONITOR_API__BASE_URL=http://backend:8000
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
pub fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.api.base_url.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "API base URL cannot be empty".to_string(),
        ));
    }

    if config.monitor.page_size == 0 {
        return Err(ConfigError::ValidationError(
            "Page size cannot be 0".to_string(),
        ));
    }

    let intervals = [
        ("poll_interval_ms", config.monitor.poll_interval_ms),
        ("progress_tick_ms", config.monitor.progress_tick_ms),
        ("expected_duration_ms", config.monitor.expected_duration_ms),
    ];
    if let Some((name, _)) = intervals.iter().find(|(_, value)| *value == 0) {
        return Err(ConfigError::ValidationError(format!(
            "monitor.{} cannot be 0",
            name
        )));
    }

    let cap = config.monitor.progress_cap;
    if !(cap > 0.0 && cap <= 100.0) {
        return Err(ConfigError::ValidationError(format!(
            "Progress cap must be in (0, 100], got {}",
            cap
        )));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Research Monitor Configuration ===");
    tracing::info!("API Base URL: {}", config.api.base_url);
    tracing::info!("API Timeout: {}s", config.api.timeout_secs);
    tracing::info!("API Auth: {}", if config.api.auth_token.is_some() { "bearer" } else { "none" });
    tracing::info!("Page Size: {}", config.monitor.page_size);
    tracing::info!("Poll Interval: {}ms", config.monitor.poll_interval_ms);
    tracing::info!("Progress Tick: {}ms", config.monitor.progress_tick_ms);
    tracing::info!("Search Debounce: {}ms", config.monitor.search_debounce_ms);
    tracing::info!("Notification Category: {}", config.monitor.notification_category);
    tracing::info!("Discard Stale Responses: {}", config.monitor.discard_stale_responses);
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("======================================");
}

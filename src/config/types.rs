//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::time::Duration;

use crate::domain::ExponentialCurve;
use crate::infrastructure::adapters::HttpResearchClientConfig;
use crate::infrastructure::monitor::ResearchMonitorConfig;

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 后端 API 配置
    #[serde(default)]
    pub api: ApiConfig,

    /// 监控器配置
    #[serde(default)]
    pub monitor: MonitorConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 后端 API 配置
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// 后端基础 URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// 请求超时时间（秒）
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Bearer 令牌，未设置时不发送 Authorization 头
    #[serde(default)]
    pub auth_token: Option<String>,

    #[serde(default = "default_list_path")]
    pub list_path: String,

    #[serde(default = "default_delete_path")]
    pub delete_path: String,

    #[serde(default = "default_notifications_path")]
    pub notifications_path: String,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_list_path() -> String {
    "/api/research/results/".to_string()
}

fn default_delete_path() -> String {
    "/api/research/results/delete/".to_string()
}

fn default_notifications_path() -> String {
    "/api/notifications/".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            auth_token: None,
            list_path: default_list_path(),
            delete_path: default_delete_path(),
            notifications_path: default_notifications_path(),
        }
    }
}

impl ApiConfig {
    pub fn client_config(&self) -> HttpResearchClientConfig {
        HttpResearchClientConfig {
            base_url: self.base_url.clone(),
            timeout_secs: self.timeout_secs,
            auth_token: self.auth_token.clone(),
            list_path: self.list_path.clone(),
            delete_path: self.delete_path.clone(),
            notifications_path: self.notifications_path.clone(),
        }
    }
}

/// 监控器配置
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorConfig {
    /// 每页条数
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// 完成通知轮询周期（毫秒）
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// 进度重算周期（毫秒）
    #[serde(default = "default_progress_tick")]
    pub progress_tick_ms: u64,

    /// 搜索防抖（毫秒）
    #[serde(default = "default_search_debounce")]
    pub search_debounce_ms: u64,

    /// 预期生成耗时（毫秒），决定进度曲线的陡峭程度
    #[serde(default = "default_expected_duration")]
    pub expected_duration_ms: u64,

    /// 进度上限（百分比）
    #[serde(default = "default_progress_cap")]
    pub progress_cap: f64,

    /// 通知类别
    #[serde(default = "default_notification_category")]
    pub notification_category: String,

    /// 是否丢弃过期的列表响应
    #[serde(default = "default_discard_stale")]
    pub discard_stale_responses: bool,
}

fn default_page_size() -> u32 {
    10
}

fn default_poll_interval() -> u64 {
    4000
}

fn default_progress_tick() -> u64 {
    500
}

fn default_search_debounce() -> u64 {
    300
}

fn default_expected_duration() -> u64 {
    10_000
}

fn default_progress_cap() -> f64 {
    95.0
}

fn default_notification_category() -> String {
    "research".to_string()
}

fn default_discard_stale() -> bool {
    true
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            poll_interval_ms: default_poll_interval(),
            progress_tick_ms: default_progress_tick(),
            search_debounce_ms: default_search_debounce(),
            expected_duration_ms: default_expected_duration(),
            progress_cap: default_progress_cap(),
            notification_category: default_notification_category(),
            discard_stale_responses: default_discard_stale(),
        }
    }
}

impl MonitorConfig {
    pub fn monitor_config(&self) -> ResearchMonitorConfig {
        ResearchMonitorConfig {
            page_size: self.page_size,
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            progress_tick: Duration::from_millis(self.progress_tick_ms),
            search_debounce: Duration::from_millis(self.search_debounce_ms),
            notification_category: self.notification_category.clone(),
            discard_stale_responses: self.discard_stale_responses,
        }
    }

    pub fn progress_curve(&self) -> ExponentialCurve {
        ExponentialCurve::new(
            Duration::from_millis(self.expected_duration_ms),
            self.progress_cap,
        )
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

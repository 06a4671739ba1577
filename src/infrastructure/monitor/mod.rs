//! Monitor Layer - 研究结果监控器
//!
//! 组合应用层控制组件、Research API 端口和事件发布器

mod research_monitor;

pub use research_monitor::{FetchOutcome, MonitorSnapshot, ResearchMonitor, ResearchMonitorConfig};

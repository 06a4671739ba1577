//! Research Monitor - 研究结果异步生成监控
//!
//! 架构设计: Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Research Context: 研究任务、结果页、状态与联系人类型
//! - Progress: 基于耗时的进度估算曲线
//!
//! 应用层 (application/):
//! - Ports: ResearchApiPort（列表、删除、通知）
//! - Monitor: 过滤分页、选择、完成轮询、进度计时、删除状态机
//!
//! 基础设施层 (infrastructure/):
//! - Adapters: HTTP 客户端（reqwest）与内存 Fake 实现
//! - Events: 监控器事件广播
//! - Monitor: ResearchMonitor 编排上述组件

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};

//! Infrastructure Layer - 基础设施层
//!
//! 提供端口的具体实现和监控器编排

pub mod adapters;
pub mod events;
pub mod monitor;

pub use adapters::{FakeResearchApi, HttpResearchClient, HttpResearchClientConfig};
pub use events::{EventPublisher, MonitorEvent, ToastLevel};
pub use monitor::{FetchOutcome, MonitorSnapshot, ResearchMonitor, ResearchMonitorConfig};

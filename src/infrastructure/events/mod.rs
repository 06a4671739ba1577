//! Events Layer - 监控器事件推送

mod publisher;

pub use publisher::{EventPublisher, MonitorEvent, ToastLevel};

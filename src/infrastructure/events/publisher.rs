//! Event Publisher Implementation
//!
//! 监控器状态变更事件推送，渲染层订阅后自行展示

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::application::monitor::{CompletionOutcome, TaskProgress};
use crate::domain::TaskId;

const CHANNEL_CAPACITY: usize = 256;

/// 提示级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToastLevel {
    Success,
    Error,
}

/// 监控器事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum MonitorEvent {
    /// 结果页被整体替换
    PageReplaced {
        page: u32,
        total_count: u64,
        task_ids: Vec<TaskId>,
        processing: usize,
        dropped_selection: Vec<TaskId>,
    },
    /// 估算进度刷新
    ProgressUpdated { progress: Vec<TaskProgress> },
    /// 完成通知轮询启停
    PollingStateChanged { active: bool },
    /// 检测到完成信号
    CompletionDetected {
        outcome: CompletionOutcome,
        notification_type: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        token: Option<String>,
    },
    /// 删除状态机变化
    DeletionStateChanged {
        state: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        prompt: Option<String>,
    },
    /// 用户提示
    Toast { level: ToastLevel, message: String },
    /// 列表拉取失败
    FetchFailed { error: String },
}

/// 事件发布器
pub struct EventPublisher {
    channel: broadcast::Sender<MonitorEvent>,
}

impl EventPublisher {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { channel: tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MonitorEvent> {
        self.channel.subscribe()
    }

    pub fn publish_toast(&self, level: ToastLevel, message: impl Into<String>) {
        self.publish(MonitorEvent::Toast {
            level,
            message: message.into(),
        });
    }

    pub fn publish_progress(&self, progress: Vec<TaskProgress>) {
        self.publish(MonitorEvent::ProgressUpdated { progress });
    }

    pub fn publish_polling(&self, active: bool) {
        self.publish(MonitorEvent::PollingStateChanged { active });
    }

    pub fn publish_deletion_state(&self, state: &str, prompt: Option<String>) {
        self.publish(MonitorEvent::DeletionStateChanged {
            state: state.to_string(),
            prompt,
        });
    }

    pub fn publish_fetch_failed(&self, error: &str) {
        self.publish(MonitorEvent::FetchFailed {
            error: error.to_string(),
        });
    }

    pub fn publish(&self, event: MonitorEvent) {
        if let Err(e) = self.channel.send(event) {
            tracing::debug!(error = %e, "Failed to publish monitor event (no receivers)");
        }
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscriber_receives_events() {
        let publisher = EventPublisher::new();
        let mut rx = publisher.subscribe();

        publisher.publish_toast(ToastLevel::Success, "Deleted 2 items");
        publisher.publish_polling(true);

        assert_eq!(
            rx.recv().await.unwrap(),
            MonitorEvent::Toast {
                level: ToastLevel::Success,
                message: "Deleted 2 items".to_string(),
            }
        );
        assert_eq!(
            rx.recv().await.unwrap(),
            MonitorEvent::PollingStateChanged { active: true }
        );
    }

    #[test]
    fn test_publish_without_subscribers_is_ignored() {
        let publisher = EventPublisher::new();
        publisher.publish_fetch_failed("boom");
    }

    #[test]
    fn test_event_wire_format() {
        let json = serde_json::to_value(MonitorEvent::PollingStateChanged { active: false }).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "event": "PollingStateChanged", "data": { "active": false } })
        );
    }
}

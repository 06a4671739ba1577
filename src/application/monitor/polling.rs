//! Polling Scheduler - 完成通知轮询
//!
//! 状态机 Idle → Active → Idle：当前页出现处理中任务时启动轮询，
//! 处理中任务清零时停止。通知只说明"有任务结束了"，不说明是哪个，
//! 匹配到后由监控器整页重新拉取。

use std::collections::HashSet;
use std::future::Future;
use std::ops::ControlFlow;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::timer::RepeatingTimer;
use crate::application::ports::Notification;

const SUCCESS_SUFFIX: &str = "_complete_success";
const FAILED_SUFFIX: &str = "_complete_failed";

/// 完成结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionOutcome {
    Success,
    Failed,
}

impl CompletionOutcome {
    /// 按通知类型后缀识别完成信号，其它类型返回 None
    pub fn classify(notification_type: &str) -> Option<Self> {
        if notification_type.ends_with(SUCCESS_SUFFIX) {
            Some(Self::Success)
        } else if notification_type.ends_with(FAILED_SUFFIX) {
            Some(Self::Failed)
        } else {
            None
        }
    }
}

/// 匹配到的完成信号
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionSignal {
    pub outcome: CompletionOutcome,
    pub notification_type: String,
    pub token: Option<String>,
    pub message: Option<String>,
}

impl CompletionSignal {
    /// 完成提示文案，通知自带文案时优先使用
    pub fn toast_message(&self) -> String {
        if let Some(message) = self.message.as_deref().filter(|m| !m.trim().is_empty()) {
            return message.to_string();
        }
        match self.outcome {
            CompletionOutcome::Success => "Research completed successfully".to_string(),
            CompletionOutcome::Failed => "Research generation failed".to_string(),
        }
    }
}

/// 通知匹配器
///
/// 有跟踪的关联令牌时只匹配这些令牌，匹配后释放；没有令牌时任何完成信号都算匹配。
/// 带 id 的通知只处理一次；已处理 id 只保留最近一次拉取中仍出现的部分。
#[derive(Debug, Default)]
pub struct CompletionMatcher {
    tokens: HashSet<String>,
    seen: HashSet<i64>,
}

impl CompletionMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track_token(&mut self, token: impl Into<String>) {
        self.tokens.insert(token.into());
    }

    pub fn tracked_tokens(&self) -> usize {
        self.tokens.len()
    }

    pub fn scan(&mut self, entries: &[Notification]) -> Vec<CompletionSignal> {
        let mut signals = Vec::new();

        for entry in entries {
            let Some(outcome) = CompletionOutcome::classify(&entry.notification_type) else {
                continue;
            };
            if let Some(id) = entry.id {
                if self.seen.contains(&id) {
                    continue;
                }
            }

            let token = entry.token().map(str::to_string);
            if !self.tokens.is_empty() {
                match token.as_deref() {
                    Some(t) if self.tokens.remove(t) => {}
                    _ => continue,
                }
            }

            if let Some(id) = entry.id {
                self.seen.insert(id);
            }
            signals.push(CompletionSignal {
                outcome,
                notification_type: entry.notification_type.clone(),
                token,
                message: entry.message.clone(),
            });
        }

        let present: HashSet<i64> = entries.iter().filter_map(|e| e.id).collect();
        self.seen.retain(|id| present.contains(id));

        signals
    }
}

/// 轮询状态切换
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollTransition {
    Started,
    Stopped,
    Unchanged,
}

#[derive(Debug)]
pub struct PollingScheduler {
    timer: RepeatingTimer,
    matcher: CompletionMatcher,
}

impl PollingScheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            timer: RepeatingTimer::new("notification-poll", interval),
            matcher: CompletionMatcher::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.timer.is_active()
    }

    /// 累计启动次数
    pub fn starts(&self) -> u64 {
        self.timer.starts()
    }

    pub fn matcher_mut(&mut self) -> &mut CompletionMatcher {
        &mut self.matcher
    }

    /// 根据处理中任务数切换状态
    pub fn sync<F, Fut>(&mut self, processing: usize, on_tick: F) -> PollTransition
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ControlFlow<()>> + Send + 'static,
    {
        if processing > 0 {
            if self.timer.start(on_tick) {
                tracing::info!(processing = processing, "Completion polling started");
                return PollTransition::Started;
            }
        } else if self.timer.stop() {
            tracing::info!("Completion polling stopped");
            return PollTransition::Stopped;
        }
        PollTransition::Unchanged
    }

    /// 无条件停止（销毁时调用）
    pub fn stop(&mut self) -> bool {
        self.timer.stop()
    }
}

//! Progress Ticker - 处理中任务的进度刷新
//!
//! 只要当前页存在处理中任务就按固定周期重算估算进度，处理中任务清零立即停止

use std::future::Future;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::timer::RepeatingTimer;
use crate::domain::progress::elapsed_between;
use crate::domain::{ProgressCurve, ResultPage, TaskId};

/// 单个任务的估算进度
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TaskProgress {
    pub id: TaskId,
    pub percent: f64,
}

pub struct ProgressTicker {
    timer: RepeatingTimer,
    curve: Arc<dyn ProgressCurve>,
    ticks: u64,
}

impl ProgressTicker {
    pub fn new(period: Duration, curve: Arc<dyn ProgressCurve>) -> Self {
        Self {
            timer: RepeatingTimer::new("progress", period),
            curve,
            ticks: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.timer.is_active()
    }

    /// 已执行的重算次数（不含页面替换时的即时计算）
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn record_tick(&mut self) {
        self.ticks += 1;
    }

    /// 为页面中所有处理中任务计算进度
    pub fn compute(&self, page: &ResultPage, now: DateTime<Utc>) -> Vec<TaskProgress> {
        page.tasks
            .iter()
            .filter(|t| t.is_processing())
            .map(|t| TaskProgress {
                id: t.id,
                percent: self.curve.percent(elapsed_between(t.created_at, now)),
            })
            .collect()
    }

    /// 根据处理中任务数启动或停止，返回是否发生切换
    pub fn sync<F, Fut>(&mut self, processing: usize, on_tick: F) -> bool
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ControlFlow<()>> + Send + 'static,
    {
        if processing > 0 {
            self.timer.start(on_tick)
        } else {
            self.timer.stop()
        }
    }

    pub fn stop(&mut self) -> bool {
        self.timer.stop()
    }
}

impl std::fmt::Debug for ProgressTicker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressTicker")
            .field("timer", &self.timer)
            .field("ticks", &self.ticks)
            .finish()
    }
}

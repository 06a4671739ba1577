//! Repeating Timer - 可取消的周期定时器
//!
//! 每次 start 分配新的取消令牌，任意时刻最多只有一个存活的定时任务。
//! 同一个定时器的 tick 串行执行，不会重叠。

use std::future::Future;
use std::ops::ControlFlow;
use std::time::Duration;

use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// interval_at 不接受零周期
const MIN_PERIOD: Duration = Duration::from_millis(1);

pub struct RepeatingTimer {
    name: &'static str,
    period: Duration,
    live: Option<CancellationToken>,
    /// 累计分配过的句柄数
    starts: u64,
}

impl RepeatingTimer {
    pub fn new(name: &'static str, period: Duration) -> Self {
        Self {
            name,
            period: period.max(MIN_PERIOD),
            live: None,
            starts: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.live.is_some()
    }

    pub fn starts(&self) -> u64 {
        self.starts
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// 启动定时器，已启动时不做任何事
    ///
    /// 第一次 tick 在一个周期之后触发；回调返回 `Break` 时定时器自行结束。
    /// 必须在 tokio runtime 内调用。
    pub fn start<F, Fut>(&mut self, mut on_tick: F) -> bool
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ControlFlow<()>> + Send + 'static,
    {
        if self.live.is_some() {
            return false;
        }

        let token = CancellationToken::new();
        let cancel = token.clone();
        let name = self.name;
        let period = self.period;
        self.live = Some(token);
        self.starts += 1;

        tokio::spawn(async move {
            tracing::debug!(timer = name, period_ms = period.as_millis() as u64, "Timer started");
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        if cancel.is_cancelled() {
                            break;
                        }
                        if on_tick().await.is_break() {
                            break;
                        }
                    }
                }
            }
            tracing::debug!(timer = name, "Timer stopped");
        });

        true
    }

    /// 停止定时器，未启动时不做任何事
    pub fn stop(&mut self) -> bool {
        match self.live.take() {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }
}

impl Drop for RepeatingTimer {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for RepeatingTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepeatingTimer")
            .field("name", &self.name)
            .field("period", &self.period)
            .field("active", &self.is_active())
            .field("starts", &self.starts)
            .finish()
    }
}

//! Progress Estimation - 进度估算
//!
//! 服务端不返回进度百分比，处理中的任务按已耗时估算一个展示用进度。
//! 曲线封顶在 95%，最后一段留给真实的 completed/failed 状态切换。

use chrono::{DateTime, Utc};
use std::time::Duration;

/// 默认预期耗时
pub const EXPECTED_DURATION: Duration = Duration::from_millis(10_000);

/// 默认封顶百分比
pub const PROGRESS_CAP: f64 = 95.0;

/// 进度曲线
///
/// 纯函数：相同的耗时总是得到相同的百分比
pub trait ProgressCurve: Send + Sync {
    /// 根据已耗时返回 0..=cap 的百分比
    fn percent(&self, elapsed: Duration) -> f64;
}

/// 指数趋近曲线
///
/// `percent = min(cap, (1 - e^(-elapsed / (expected * 0.5))) * 100)`
#[derive(Debug, Clone, Copy)]
pub struct ExponentialCurve {
    pub expected_duration: Duration,
    pub cap: f64,
}

impl ExponentialCurve {
    pub fn new(expected_duration: Duration, cap: f64) -> Self {
        Self {
            expected_duration,
            cap,
        }
    }
}

impl Default for ExponentialCurve {
    fn default() -> Self {
        Self::new(EXPECTED_DURATION, PROGRESS_CAP)
    }
}

impl ProgressCurve for ExponentialCurve {
    fn percent(&self, elapsed: Duration) -> f64 {
        let time_constant = self.expected_duration.as_secs_f64() * 0.5;
        if time_constant <= 0.0 {
            return self.cap;
        }
        let raw = (1.0 - (-elapsed.as_secs_f64() / time_constant).exp()) * 100.0;
        raw.min(self.cap)
    }
}

/// 计算两个时间点之间的耗时，时钟回拨时按 0 处理
pub fn elapsed_between(created_at: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    (now - created_at).to_std().unwrap_or(Duration::ZERO)
}

/// 默认曲线下的进度估算
pub fn estimate(created_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    ExponentialCurve::default().percent(elapsed_between(created_at, now))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_starts_at_zero() {
        let now = Utc::now();
        assert_eq!(estimate(now, now), 0.0);
    }

    #[test]
    fn test_estimate_bounded_and_monotonic() {
        let curve = ExponentialCurve::default();
        let mut previous = -1.0;
        for ms in (0..120_000).step_by(250) {
            let value = curve.percent(Duration::from_millis(ms));
            assert!((0.0..=PROGRESS_CAP).contains(&value), "{value} out of range");
            assert!(value >= previous);
            previous = value;
        }
    }

    #[test]
    fn test_estimate_strictly_increasing_below_cap() {
        let curve = ExponentialCurve::default();
        // 约 15 秒时触及封顶（1 - e^-3 ≈ 0.95）
        let mut previous = curve.percent(Duration::ZERO);
        for ms in (100..14_000).step_by(100) {
            let value = curve.percent(Duration::from_millis(ms));
            assert!(value > previous, "not increasing at {ms}ms");
            assert!(value < PROGRESS_CAP);
            previous = value;
        }
    }

    #[test]
    fn test_estimate_never_reaches_hundred() {
        let curve = ExponentialCurve::default();
        assert_eq!(curve.percent(Duration::from_secs(3600)), PROGRESS_CAP);
    }

    #[test]
    fn test_half_expected_duration_is_about_63_percent() {
        let curve = ExponentialCurve::default();
        let value = curve.percent(Duration::from_millis(5_000));
        assert!((value - 63.212).abs() < 0.01);
    }

    #[test]
    fn test_clock_skew_treated_as_zero() {
        let now = Utc::now();
        let future = now + chrono::Duration::seconds(5);
        assert_eq!(estimate(future, now), 0.0);
    }

    #[test]
    fn test_custom_curve_is_pluggable() {
        struct Linear;
        impl ProgressCurve for Linear {
            fn percent(&self, elapsed: Duration) -> f64 {
                (elapsed.as_secs_f64() * 10.0).min(90.0)
            }
        }
        let curve: Box<dyn ProgressCurve> = Box::new(Linear);
        assert_eq!(curve.percent(Duration::from_secs(2)), 20.0);
    }
}

//! Domain Layer - 领域层
//!
//! 包含:
//! - Research Context: 研究任务、结果页、研究对象
//! - Progress: 无服务端进度时的进度估算曲线

pub mod progress;
pub mod research;

pub use progress::{estimate, ExponentialCurve, ProgressCurve};
pub use research::{
    ContactType, DetailTarget, ResearchTask, ResultPage, TaskId, TaskInvariantError, TaskStatus,
};

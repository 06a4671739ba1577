//! Research Monitor Components - 研究任务监控的各个控制组件
//!
//! - filter: 过滤与分页，生成列表查询参数
//! - selection: 当前页勾选集合
//! - timer: 可取消的周期定时器
//! - polling: 完成通知轮询状态机
//! - progress_ticker: 估算进度刷新
//! - deletion: 三分支删除状态机

mod deletion;
mod filter;
mod polling;
mod progress_ticker;
mod selection;
mod timer;

pub use deletion::{
    outcome_message, DeleteIntent, DeletionController, DeletionError, DeletionOutcome,
    DeletionState,
};
pub use filter::FilterPaginationController;
pub use polling::{
    CompletionMatcher, CompletionOutcome, CompletionSignal, PollTransition, PollingScheduler,
};
pub use progress_ticker::{ProgressTicker, TaskProgress};
pub use selection::SelectionManager;
pub use timer::RepeatingTimer;

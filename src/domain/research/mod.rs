//! Research Context - 研究任务上下文
//!
//! 任务由服务端创建，本地只通过拉取列表观察，从不本地修改

mod entities;
mod errors;
mod value_objects;

pub use entities::{ResearchTask, ResultPage};
pub use errors::TaskInvariantError;
pub use value_objects::{ContactType, DetailTarget, TaskId, TaskStatus};

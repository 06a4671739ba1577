//! Research Context - Errors

use thiserror::Error;

use super::{TaskId, TaskStatus};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TaskInvariantError {
    #[error("task {id} is {status} but has no completed_at")]
    MissingCompletedAt { id: TaskId, status: TaskStatus },

    #[error("task {id} is {status} but carries completed_at")]
    UnexpectedCompletedAt { id: TaskId, status: TaskStatus },

    #[error("task {id} carries an error message but is {status}")]
    UnexpectedErrorMessage { id: TaskId, status: TaskStatus },

    #[error("task {id} carries a result summary but is {status}")]
    UnexpectedResultSummary { id: TaskId, status: TaskStatus },
}

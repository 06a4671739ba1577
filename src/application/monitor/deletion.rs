//! Deletion - 确认后执行的三分支删除状态机
//!
//! Idle → Confirming(intent) → InFlight(intent) → Idle
//!
//! 只有成功响应会改变本地状态；失败时原样透出服务端文案并回到 Idle。

use serde::Serialize;
use thiserror::Error;

use crate::application::ports::{DeleteRequest, DeleteResponse, ResearchApiError};
use crate::domain::TaskId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeletionError {
    #[error("No research results selected")]
    NothingSelected,

    #[error("A delete request is already in progress")]
    Busy,

    #[error("No pending delete to confirm")]
    NoPendingIntent,
}

/// 删除意图
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeleteIntent {
    Single { id: TaskId, label: String },
    /// ids 在确认时按当时的勾选集合刷新
    Bulk { ids: Vec<TaskId> },
    All,
}

impl DeleteIntent {
    pub fn kind(&self) -> &'static str {
        match self {
            DeleteIntent::Single { .. } => "single",
            DeleteIntent::Bulk { .. } => "bulk",
            DeleteIntent::All => "all",
        }
    }

    /// 确认面板文案
    pub fn prompt(&self) -> String {
        match self {
            DeleteIntent::Single { label, .. } => format!(
                "Are you sure you want to delete the research for \"{}\"? This action cannot be undone.",
                label
            ),
            DeleteIntent::Bulk { ids } => format!(
                "Are you sure you want to delete {} selected research result(s)? This action cannot be undone.",
                ids.len()
            ),
            DeleteIntent::All => {
                "Are you sure you want to delete ALL research results? This action cannot be undone."
                    .to_string()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DeletionState {
    #[default]
    Idle,
    Confirming(DeleteIntent),
    InFlight(DeleteIntent),
}

impl DeletionState {
    pub fn name(&self) -> &'static str {
        match self {
            DeletionState::Idle => "idle",
            DeletionState::Confirming(_) => "confirming",
            DeletionState::InFlight(_) => "in_flight",
        }
    }
}

/// 删除完成后展示的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionOutcome {
    pub message: String,
    pub not_found_ids: Vec<TaskId>,
}

const DEFAULT_SUCCESS_MESSAGE: &str = "Research deleted successfully";
const DEFAULT_FAILURE_MESSAGE: &str = "Failed to delete research";

/// 组装最终提示：服务端文案 + 未找到数量注记
pub fn outcome_message(message: &str, not_found: &[TaskId]) -> String {
    if not_found.is_empty() {
        message.to_string()
    } else {
        format!(
            "{}. Note: {} item(s) were not found.",
            message,
            not_found.len()
        )
    }
}

#[derive(Debug, Default)]
pub struct DeletionController {
    state: DeletionState,
}

impl DeletionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DeletionState {
        &self.state
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(self.state, DeletionState::InFlight(_))
    }

    /// 当前确认面板文案
    pub fn prompt(&self) -> Option<String> {
        match &self.state {
            DeletionState::Confirming(intent) => Some(intent.prompt()),
            _ => None,
        }
    }

    pub fn request_single(
        &mut self,
        id: TaskId,
        label: impl Into<String>,
    ) -> Result<(), DeletionError> {
        self.enter_confirming(DeleteIntent::Single {
            id,
            label: label.into(),
        })
    }

    pub fn request_bulk(&mut self, selected: &[TaskId]) -> Result<(), DeletionError> {
        if self.is_in_flight() {
            return Err(DeletionError::Busy);
        }
        if selected.is_empty() {
            return Err(DeletionError::NothingSelected);
        }
        self.enter_confirming(DeleteIntent::Bulk {
            ids: selected.to_vec(),
        })
    }

    pub fn request_all(&mut self) -> Result<(), DeletionError> {
        self.enter_confirming(DeleteIntent::All)
    }

    /// 取消确认，无副作用；返回是否有意图被取消
    pub fn cancel(&mut self) -> bool {
        if let DeletionState::Confirming(intent) = &self.state {
            tracing::debug!(kind = intent.kind(), "Delete cancelled");
            self.state = DeletionState::Idle;
            return true;
        }
        false
    }

    /// 用户确认：进入 InFlight 并生成唯一一次的请求体
    ///
    /// bulk 以确认时的勾选集合为准，为空时回到 Idle 并拒绝
    pub fn begin(&mut self, selected: &[TaskId]) -> Result<DeleteRequest, DeletionError> {
        let intent = match &self.state {
            DeletionState::Idle => return Err(DeletionError::NoPendingIntent),
            DeletionState::InFlight(_) => return Err(DeletionError::Busy),
            DeletionState::Confirming(intent) => intent.clone(),
        };

        let (intent, request) = match intent {
            DeleteIntent::Single { id, label } => (
                DeleteIntent::Single { id, label },
                DeleteRequest::Single { research_id: id },
            ),
            DeleteIntent::Bulk { .. } => {
                if selected.is_empty() {
                    self.state = DeletionState::Idle;
                    return Err(DeletionError::NothingSelected);
                }
                let ids = selected.to_vec();
                (
                    DeleteIntent::Bulk { ids: ids.clone() },
                    DeleteRequest::Bulk { research_ids: ids },
                )
            }
            DeleteIntent::All => (DeleteIntent::All, DeleteRequest::all()),
        };

        tracing::debug!(kind = request.kind(), "Delete confirmed");
        self.state = DeletionState::InFlight(intent);
        Ok(request)
    }

    /// 处理删除结果并回到 Idle
    pub fn complete(
        &mut self,
        result: Result<DeleteResponse, ResearchApiError>,
    ) -> Result<DeletionOutcome, ResearchApiError> {
        self.state = DeletionState::Idle;

        let response = result?;
        if !response.success {
            let message = response
                .error
                .or(response.message)
                .unwrap_or_else(|| DEFAULT_FAILURE_MESSAGE.to_string());
            return Err(ResearchApiError::Rejected(message));
        }

        let not_found_ids = response.not_found_ids.unwrap_or_default();
        let base = response
            .message
            .unwrap_or_else(|| DEFAULT_SUCCESS_MESSAGE.to_string());
        Ok(DeletionOutcome {
            message: outcome_message(&base, &not_found_ids),
            not_found_ids,
        })
    }

    fn enter_confirming(&mut self, intent: DeleteIntent) -> Result<(), DeletionError> {
        if self.is_in_flight() {
            return Err(DeletionError::Busy);
        }
        tracing::debug!(kind = intent.kind(), "Delete requested");
        self.state = DeletionState::Confirming(intent);
        Ok(())
    }
}

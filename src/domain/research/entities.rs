//! Research Context - Entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ContactType, DetailTarget, TaskId, TaskInvariantError, TaskStatus};

/// 研究任务
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchTask {
    pub id: TaskId,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    /// 仅 failed 时存在
    #[serde(default)]
    pub error_message: Option<String>,
    /// 仅 completed 时存在
    #[serde(default)]
    pub result_summary: Option<String>,
    #[serde(default)]
    pub contact_type: Option<ContactType>,
    #[serde(default)]
    pub contact_id: Option<i64>,
    #[serde(default)]
    pub contact_name: Option<String>,
}

impl ResearchTask {
    /// 新建一个处理中的任务（主要用于测试和假数据）
    pub fn processing(id: impl Into<TaskId>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            status: TaskStatus::Processing,
            created_at,
            completed_at: None,
            error_message: None,
            result_summary: None,
            contact_type: None,
            contact_id: None,
            contact_name: None,
        }
    }

    pub fn with_contact(
        mut self,
        contact_type: ContactType,
        contact_id: i64,
        contact_name: impl Into<String>,
    ) -> Self {
        self.contact_type = Some(contact_type);
        self.contact_id = Some(contact_id);
        self.contact_name = Some(contact_name.into());
        self
    }

    /// 标记完成（服务端行为，假数据使用）
    pub fn complete(&mut self, summary: impl Into<String>, at: DateTime<Utc>) {
        self.status = TaskStatus::Completed;
        self.completed_at = Some(at);
        self.result_summary = Some(summary.into());
        self.error_message = None;
    }

    /// 标记失败（服务端行为，假数据使用）
    pub fn fail(&mut self, error: impl Into<String>, at: DateTime<Utc>) {
        self.status = TaskStatus::Failed;
        self.completed_at = Some(at);
        self.error_message = Some(error.into());
        self.result_summary = None;
    }

    pub fn is_processing(&self) -> bool {
        self.status == TaskStatus::Processing
    }

    /// 确认面板中展示的名称
    pub fn label(&self) -> String {
        self.contact_name
            .clone()
            .unwrap_or_else(|| format!("Research #{}", self.id))
    }

    pub fn detail_target(&self) -> Option<DetailTarget> {
        Some(DetailTarget {
            contact_type: self.contact_type?,
            contact_id: self.contact_id?,
        })
    }

    /// 校验 completed_at 与状态的一致性
    pub fn check_invariants(&self) -> Result<(), TaskInvariantError> {
        match (self.status.is_terminal(), self.completed_at.is_some()) {
            (true, false) => {
                return Err(TaskInvariantError::MissingCompletedAt {
                    id: self.id,
                    status: self.status,
                })
            }
            (false, true) => {
                return Err(TaskInvariantError::UnexpectedCompletedAt {
                    id: self.id,
                    status: self.status,
                })
            }
            _ => {}
        }

        if self.error_message.is_some() && self.status != TaskStatus::Failed {
            return Err(TaskInvariantError::UnexpectedErrorMessage {
                id: self.id,
                status: self.status,
            });
        }

        if self.result_summary.is_some() && self.status != TaskStatus::Completed {
            return Err(TaskInvariantError::UnexpectedResultSummary {
                id: self.id,
                status: self.status,
            });
        }

        Ok(())
    }
}

/// 当前结果页
///
/// 每次成功拉取后整体替换，不做局部修补
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResultPage {
    pub tasks: Vec<ResearchTask>,
    pub page: u32,
    pub page_size: u32,
    pub total_count: u64,
    pub total_pages: Option<u32>,
}

impl ResultPage {
    pub fn ids(&self) -> Vec<TaskId> {
        self.tasks.iter().map(|t| t.id).collect()
    }

    pub fn processing_count(&self) -> usize {
        self.tasks.iter().filter(|t| t.is_processing()).count()
    }

    pub fn find(&self, id: TaskId) -> Option<&ResearchTask> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }
}

//! Research API Port - 研究结果后端接口抽象
//!
//! 定义列表、删除、通知三个接口，具体实现在 infrastructure/adapters 层

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{ContactType, ResultPage, TaskId, TaskStatus};

/// 列表排序（固定按创建时间倒序）
pub const ORDERING_NEWEST_FIRST: &str = "-created_at";

/// Research API 错误
///
/// Display 直接输出服务端文案，用于原样展示给用户
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResearchApiError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    /// 服务端返回非 2xx
    #[error("{message}")]
    ServiceError { status: u16, message: String },

    /// 服务端返回 `success: false`
    #[error("{0}")]
    Rejected(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// 列表查询参数
///
/// 空过滤条件不序列化，而不是发送空字符串
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListQuery {
    pub page: u32,
    pub page_size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_type: Option<ContactType>,
    pub ordering: &'static str,
}

/// 删除请求体，三种形态互斥
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DeleteRequest {
    Single { research_id: TaskId },
    Bulk { research_ids: Vec<TaskId> },
    All { delete_all: bool },
}

impl DeleteRequest {
    pub fn all() -> Self {
        Self::All { delete_all: true }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            DeleteRequest::Single { .. } => "single",
            DeleteRequest::Bulk { .. } => "bulk",
            DeleteRequest::All { .. } => "all",
        }
    }
}

/// 删除响应
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_found_ids: Option<Vec<TaskId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// 通知附带的元数据
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NotificationMetadata {
    #[serde(default)]
    pub token: Option<String>,
}

/// 通知条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(default)]
    pub id: Option<i64>,
    pub notification_type: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub metadata: Option<NotificationMetadata>,
}

impl Notification {
    pub fn new(notification_type: impl Into<String>) -> Self {
        Self {
            id: None,
            notification_type: notification_type.into(),
            message: None,
            metadata: None,
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.metadata = Some(NotificationMetadata {
            token: Some(token.into()),
        });
        self
    }

    pub fn token(&self) -> Option<&str> {
        self.metadata.as_ref().and_then(|m| m.token.as_deref())
    }
}

/// Research API Port
///
/// 研究生成流水线对外暴露的三个接口
#[async_trait]
pub trait ResearchApiPort: Send + Sync {
    /// 拉取一页研究结果
    async fn list(&self, query: &ListQuery) -> Result<ResultPage, ResearchApiError>;

    /// 删除研究结果
    async fn delete(&self, request: &DeleteRequest) -> Result<DeleteResponse, ResearchApiError>;

    /// 拉取指定类别的通知
    async fn notifications(&self, category: &str) -> Result<Vec<Notification>, ResearchApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_delete_request_shapes() {
        assert_eq!(
            serde_json::to_value(DeleteRequest::Single {
                research_id: TaskId::new(4)
            })
            .unwrap(),
            json!({ "research_id": 4 })
        );
        assert_eq!(
            serde_json::to_value(DeleteRequest::Bulk {
                research_ids: vec![TaskId::new(3), TaskId::new(4)]
            })
            .unwrap(),
            json!({ "research_ids": [3, 4] })
        );
        assert_eq!(
            serde_json::to_value(DeleteRequest::all()).unwrap(),
            json!({ "delete_all": true })
        );
    }

    #[test]
    fn test_list_query_omits_empty_filters() {
        let query = ListQuery {
            page: 2,
            page_size: 10,
            search: None,
            status: Some(TaskStatus::Failed),
            contact_type: None,
            ordering: ORDERING_NEWEST_FIRST,
        };
        assert_eq!(
            serde_json::to_value(&query).unwrap(),
            json!({ "page": 2, "page_size": 10, "status": "failed", "ordering": "-created_at" })
        );
    }

    #[test]
    fn test_service_error_displays_server_text_verbatim() {
        let err = ResearchApiError::ServiceError {
            status: 400,
            message: "No research results selected".to_string(),
        };
        assert_eq!(err.to_string(), "No research results selected");
        assert_eq!(
            ResearchApiError::Rejected("Permission denied".into()).to_string(),
            "Permission denied"
        );
    }

    #[test]
    fn test_notification_token() {
        let n = Notification::new("research_complete_success").with_token("abc");
        assert_eq!(n.token(), Some("abc"));
        assert_eq!(Notification::new("x").token(), None);
    }
}

//! 应用层错误定义
//!
//! 监控器各操作的统一错误类型

use thiserror::Error;

use crate::application::monitor::DeletionError;
use crate::application::ports::ResearchApiError;

/// 应用层错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 验证错误（本地拒绝，不发请求）
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// 状态无效
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// 后端接口错误，文案原样透出
    #[error(transparent)]
    Api(#[from] ResearchApiError),

    /// 监控器已销毁
    #[error("Monitor disposed")]
    Disposed,
}

impl ApplicationError {
    /// 创建验证错误
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }
}

impl From<DeletionError> for ApplicationError {
    fn from(err: DeletionError) -> Self {
        match err {
            DeletionError::NothingSelected => Self::ValidationError(err.to_string()),
            DeletionError::Busy | DeletionError::NoPendingIntent => {
                Self::InvalidState(err.to_string())
            }
        }
    }
}

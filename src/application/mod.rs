//! 应用层 - 控制逻辑
//!
//! 包含：
//! - ports: 六边形架构端口定义（ResearchApiPort）
//! - monitor: 过滤分页、勾选、轮询、进度、删除等控制组件
//! - error: 应用层错误定义

pub mod error;
pub mod monitor;
pub mod ports;

pub use error::ApplicationError;

pub use monitor::{
    DeleteIntent, DeletionController, DeletionError, DeletionState, FilterPaginationController,
    PollingScheduler, ProgressTicker, SelectionManager, TaskProgress,
};

pub use ports::{
    DeleteRequest, DeleteResponse, ListQuery, Notification, ResearchApiError, ResearchApiPort,
};

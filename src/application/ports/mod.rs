//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod research_api;

pub use research_api::{
    DeleteRequest, DeleteResponse, ListQuery, Notification, NotificationMetadata,
    ResearchApiError, ResearchApiPort, ORDERING_NEWEST_FIRST,
};

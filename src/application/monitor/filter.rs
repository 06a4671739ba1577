//! Filter & Pagination - 过滤与分页状态
//!
//! 修改任一过滤条件都会把页码重置为 1，旧的分页窗口在新条件下没有意义

use crate::application::ports::{ListQuery, ORDERING_NEWEST_FIRST};
use crate::domain::{ContactType, TaskStatus};

/// 过滤与分页控制器
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterPaginationController {
    search: String,
    status_filter: Option<TaskStatus>,
    type_filter: Option<ContactType>,
    page: u32,
    page_size: u32,
}

impl FilterPaginationController {
    pub fn new(page_size: u32) -> Self {
        Self {
            search: String::new(),
            status_filter: None,
            type_filter: None,
            page: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.search = search.into();
        self.page = 1;
    }

    /// pending 不是合法的列表过滤条件，调用方需先校验
    pub fn set_status_filter(&mut self, status: Option<TaskStatus>) {
        self.status_filter = status;
        self.page = 1;
    }

    pub fn set_type_filter(&mut self, contact_type: Option<ContactType>) {
        self.type_filter = contact_type;
        self.page = 1;
    }

    /// 页码从 1 开始
    pub fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// 生成规范化的列表查询参数
    pub fn query(&self) -> ListQuery {
        let search = self.search.trim();
        ListQuery {
            page: self.page,
            page_size: self.page_size,
            search: (!search.is_empty()).then(|| search.to_string()),
            status: self.status_filter,
            contact_type: self.type_filter,
            ordering: ORDERING_NEWEST_FIRST,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_query() {
        let controller = FilterPaginationController::new(10);
        let query = controller.query();
        assert_eq!(query.page, 1);
        assert_eq!(query.page_size, 10);
        assert_eq!(query.search, None);
        assert_eq!(query.status, None);
        assert_eq!(query.contact_type, None);
        assert_eq!(query.ordering, "-created_at");
    }

    #[test]
    fn test_status_filter_resets_page() {
        let mut controller = FilterPaginationController::new(10);
        controller.set_page(4);
        assert_eq!(controller.page(), 4);

        controller.set_status_filter(Some(TaskStatus::Completed));
        let query = controller.query();
        assert_eq!(query.page, 1);
        assert_eq!(query.status, Some(TaskStatus::Completed));
    }

    #[test]
    fn test_search_and_type_reset_page() {
        let mut controller = FilterPaginationController::new(10);
        controller.set_page(3);
        controller.set_search("acme");
        assert_eq!(controller.page(), 1);

        controller.set_page(2);
        controller.set_type_filter(Some(ContactType::Company));
        assert_eq!(controller.page(), 1);
        assert_eq!(controller.query().contact_type, Some(ContactType::Company));
    }

    #[test]
    fn test_set_page_keeps_filters() {
        let mut controller = FilterPaginationController::new(25);
        controller.set_search("acme");
        controller.set_page(5);
        let query = controller.query();
        assert_eq!(query.page, 5);
        assert_eq!(query.search.as_deref(), Some("acme"));
    }

    #[test]
    fn test_blank_search_is_omitted_and_trimmed() {
        let mut controller = FilterPaginationController::new(10);
        controller.set_search("   ");
        assert_eq!(controller.query().search, None);

        controller.set_search("  globex ");
        assert_eq!(controller.query().search.as_deref(), Some("globex"));
    }

    #[test]
    fn test_page_zero_clamped() {
        let mut controller = FilterPaginationController::new(0);
        controller.set_page(0);
        assert_eq!(controller.page(), 1);
        assert_eq!(controller.page_size(), 1);
    }
}

//! Fake Research API - 内存实现的研究结果后端
//!
//! 用于测试和离线演示：按查询参数过滤分页，支持脚本化删除响应、
//! 逐次请求延迟和调用计数

use async_trait::async_trait;
use chrono::Utc;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::application::ports::{
    DeleteRequest, DeleteResponse, ListQuery, Notification, ResearchApiError, ResearchApiPort,
};
use crate::domain::{ResearchTask, ResultPage, TaskId};

#[derive(Default)]
struct FakeState {
    tasks: Vec<ResearchTask>,
    notifications: Vec<Notification>,
    list_delays: VecDeque<Duration>,
    list_errors: VecDeque<ResearchApiError>,
    delete_responses: VecDeque<Result<DeleteResponse, ResearchApiError>>,
    queries: Vec<ListQuery>,
    deletes: Vec<DeleteRequest>,
    notification_calls: usize,
}

/// Fake Research API
#[derive(Default)]
pub struct FakeResearchApi {
    state: Mutex<FakeState>,
}

impl FakeResearchApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tasks(tasks: Vec<ResearchTask>) -> Self {
        let api = Self::new();
        api.lock().tasks = tasks;
        api
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn insert_task(&self, task: ResearchTask) {
        self.lock().tasks.push(task);
    }

    pub fn remove_task(&self, id: TaskId) -> bool {
        let mut state = self.lock();
        let before = state.tasks.len();
        state.tasks.retain(|t| t.id != id);
        state.tasks.len() != before
    }

    /// 模拟后端生成完成
    pub fn complete_task(&self, id: TaskId, summary: &str) -> bool {
        let mut state = self.lock();
        match state.tasks.iter_mut().find(|t| t.id == id) {
            Some(task) => {
                task.complete(summary, Utc::now());
                true
            }
            None => false,
        }
    }

    /// 模拟后端生成失败
    pub fn fail_task(&self, id: TaskId, error: &str) -> bool {
        let mut state = self.lock();
        match state.tasks.iter_mut().find(|t| t.id == id) {
            Some(task) => {
                task.fail(error, Utc::now());
                true
            }
            None => false,
        }
    }

    pub fn push_notification(&self, notification: Notification) {
        self.lock().notifications.push(notification);
    }

    /// 为下一次列表请求设置延迟（按调用顺序消费）
    pub fn push_list_delay(&self, delay: Duration) {
        self.lock().list_delays.push_back(delay);
    }

    pub fn fail_next_list(&self, error: ResearchApiError) {
        self.lock().list_errors.push_back(error);
    }

    /// 为下一次删除请求指定响应（不修改数据）
    pub fn push_delete_response(&self, response: Result<DeleteResponse, ResearchApiError>) {
        self.lock().delete_responses.push_back(response);
    }

    pub fn list_calls(&self) -> usize {
        self.lock().queries.len()
    }

    pub fn delete_calls(&self) -> usize {
        self.lock().deletes.len()
    }

    pub fn notification_calls(&self) -> usize {
        self.lock().notification_calls
    }

    pub fn last_query(&self) -> Option<ListQuery> {
        self.lock().queries.last().cloned()
    }

    pub fn last_delete(&self) -> Option<DeleteRequest> {
        self.lock().deletes.last().cloned()
    }

    fn build_page(tasks: &[ResearchTask], query: &ListQuery) -> ResultPage {
        let search = query.search.as_deref().map(str::to_lowercase);
        let mut matched: Vec<ResearchTask> = tasks
            .iter()
            .filter(|t| query.status.map_or(true, |s| t.status == s))
            .filter(|t| query.contact_type.map_or(true, |c| t.contact_type == Some(c)))
            .filter(|t| match &search {
                Some(needle) => [&t.contact_name, &t.result_summary]
                    .iter()
                    .filter_map(|field| field.as_deref())
                    .any(|text| text.to_lowercase().contains(needle.as_str())),
                None => true,
            })
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let page_size = query.page_size.max(1);
        let total_count = matched.len() as u64;
        let total_pages = (total_count as u32).div_ceil(page_size);
        let start = ((query.page.max(1) - 1) * page_size) as usize;
        let tasks = matched
            .into_iter()
            .skip(start)
            .take(page_size as usize)
            .collect();

        ResultPage {
            tasks,
            page: query.page,
            page_size,
            total_count,
            total_pages: Some(total_pages),
        }
    }

    fn apply_delete(
        tasks: &mut Vec<ResearchTask>,
        request: &DeleteRequest,
    ) -> Result<DeleteResponse, ResearchApiError> {
        match request {
            DeleteRequest::Single { research_id } => {
                let before = tasks.len();
                tasks.retain(|t| t.id != *research_id);
                if tasks.len() == before {
                    return Err(ResearchApiError::ServiceError {
                        status: 404,
                        message: "Research not found".to_string(),
                    });
                }
                Ok(DeleteResponse {
                    success: true,
                    message: Some("Research deleted successfully".to_string()),
                    ..Default::default()
                })
            }
            DeleteRequest::Bulk { research_ids } => {
                let not_found: Vec<TaskId> = research_ids
                    .iter()
                    .filter(|id| !tasks.iter().any(|t| t.id == **id))
                    .copied()
                    .collect();
                tasks.retain(|t| !research_ids.contains(&t.id));
                let deleted = research_ids.len() - not_found.len();
                Ok(DeleteResponse {
                    success: true,
                    message: Some(format!("Deleted {} research result(s)", deleted)),
                    not_found_ids: (!not_found.is_empty()).then_some(not_found),
                    error: None,
                })
            }
            DeleteRequest::All { .. } => {
                let deleted = tasks.len();
                tasks.clear();
                Ok(DeleteResponse {
                    success: true,
                    message: Some(format!("Deleted {} research result(s)", deleted)),
                    ..Default::default()
                })
            }
        }
    }
}

#[async_trait]
impl ResearchApiPort for FakeResearchApi {
    async fn list(&self, query: &ListQuery) -> Result<ResultPage, ResearchApiError> {
        // 在延迟之前取快照，模拟慢响应携带旧数据
        let (delay, result) = {
            let mut state = self.lock();
            state.queries.push(query.clone());
            let delay = state.list_delays.pop_front();
            let result = match state.list_errors.pop_front() {
                Some(err) => Err(err),
                None => Ok(Self::build_page(&state.tasks, query)),
            };
            (delay, result)
        };

        tracing::debug!(page = query.page, delay = ?delay, "FakeResearchApi: list");
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        result
    }

    async fn delete(&self, request: &DeleteRequest) -> Result<DeleteResponse, ResearchApiError> {
        let mut state = self.lock();
        state.deletes.push(request.clone());
        tracing::debug!(kind = request.kind(), "FakeResearchApi: delete");

        if let Some(scripted) = state.delete_responses.pop_front() {
            return scripted;
        }
        Self::apply_delete(&mut state.tasks, request)
    }

    async fn notifications(&self, category: &str) -> Result<Vec<Notification>, ResearchApiError> {
        let mut state = self.lock();
        state.notification_calls += 1;
        Ok(state
            .notifications
            .iter()
            .filter(|n| n.notification_type.starts_with(category))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::ORDERING_NEWEST_FIRST;
    use crate::domain::{ContactType, TaskStatus};

    fn query(page: u32, page_size: u32) -> ListQuery {
        ListQuery {
            page,
            page_size,
            search: None,
            status: None,
            contact_type: None,
            ordering: ORDERING_NEWEST_FIRST,
        }
    }

    fn seeded() -> FakeResearchApi {
        let now = Utc::now();
        let tasks = (1..=5)
            .map(|i| {
                let mut task = ResearchTask::processing(i, now - chrono::Duration::minutes(i))
                    .with_contact(
                        if i % 2 == 0 {
                            ContactType::Company
                        } else {
                            ContactType::Emaillist
                        },
                        100 + i,
                        format!("Contact {}", i),
                    );
                if i > 2 {
                    task.complete(format!("Summary {}", i), now);
                }
                task
            })
            .collect();
        FakeResearchApi::with_tasks(tasks)
    }

    #[tokio::test]
    async fn test_list_paginates_newest_first() {
        let api = seeded();
        let page = api.list(&query(2, 2)).await.unwrap();
        assert_eq!(page.ids(), vec![TaskId::new(3), TaskId::new(4)]);
        assert_eq!(page.total_count, 5);
        assert_eq!(page.total_pages, Some(3));
    }

    #[tokio::test]
    async fn test_list_filters() {
        let api = seeded();
        let mut q = query(1, 10);
        q.status = Some(TaskStatus::Processing);
        assert_eq!(
            api.list(&q).await.unwrap().ids(),
            vec![TaskId::new(1), TaskId::new(2)]
        );

        let mut q = query(1, 10);
        q.contact_type = Some(ContactType::Company);
        q.search = Some("contact 4".into());
        assert_eq!(api.list(&q).await.unwrap().ids(), vec![TaskId::new(4)]);
        assert_eq!(api.list_calls(), 2);
    }

    #[tokio::test]
    async fn test_bulk_delete_reports_missing_ids() {
        let api = seeded();
        let response = api
            .delete(&DeleteRequest::Bulk {
                research_ids: vec![TaskId::new(1), TaskId::new(42)],
            })
            .await
            .unwrap();
        assert_eq!(response.not_found_ids, Some(vec![TaskId::new(42)]));
        assert_eq!(response.message.as_deref(), Some("Deleted 1 research result(s)"));
        assert_eq!(api.list(&query(1, 10)).await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_single_delete_missing_is_error() {
        let api = seeded();
        let err = api
            .delete(&DeleteRequest::Single {
                research_id: TaskId::new(77),
            })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Research not found");
    }

    #[tokio::test]
    async fn test_notifications_scoped_by_category() {
        let api = FakeResearchApi::new();
        api.push_notification(Notification::new("research_complete_success"));
        api.push_notification(Notification::new("campaign_sent"));
        let entries = api.notifications("research").await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(api.notification_calls(), 1);
    }
}

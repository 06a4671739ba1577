//! Research Monitor - 研究结果视图的控制核心
//!
//! 组合过滤分页、勾选、进度估算、完成轮询、删除状态机，负责它们之间的联动：
//! 列表拉取 → 勾选裁剪 + 进度重算 → 轮询/进度定时器启停 → 完成信号触发重新拉取。
//!
//! 每次成功拉取整体替换结果页。列表请求带递增序号，只应用最后发出的那次请求的响应。

use std::ops::ControlFlow;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::application::error::ApplicationError;
use crate::application::monitor::{
    CompletionOutcome, DeletionController, DeletionError, DeletionOutcome, DeletionState,
    FilterPaginationController, PollTransition, PollingScheduler, ProgressTicker,
    SelectionManager, TaskProgress,
};
use crate::application::ports::{ListQuery, ResearchApiPort};
use crate::domain::{ContactType, DetailTarget, ProgressCurve, ResultPage, TaskId, TaskStatus};
use crate::infrastructure::events::{EventPublisher, MonitorEvent, ToastLevel};

/// 监控器配置
#[derive(Debug, Clone)]
pub struct ResearchMonitorConfig {
    pub page_size: u32,
    /// 完成通知轮询周期
    pub poll_interval: Duration,
    /// 进度重算周期
    pub progress_tick: Duration,
    /// 过滤条件变更后的防抖延迟
    pub search_debounce: Duration,
    /// 通知类别
    pub notification_category: String,
    /// 丢弃非最新请求的列表响应
    pub discard_stale_responses: bool,
}

impl Default for ResearchMonitorConfig {
    fn default() -> Self {
        Self {
            page_size: 10,
            poll_interval: Duration::from_millis(4_000),
            progress_tick: Duration::from_millis(500),
            search_debounce: Duration::from_millis(300),
            notification_category: "research".to_string(),
            discard_stale_responses: true,
        }
    }
}

/// 列表拉取结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// 结果页已替换
    Applied,
    /// 已有更新的请求发出，本次响应被丢弃
    Superseded,
    /// 监控器已销毁
    Disposed,
}

/// 监控器状态快照
#[derive(Debug, Clone)]
pub struct MonitorSnapshot {
    pub page: ResultPage,
    pub query: ListQuery,
    pub selected: Vec<TaskId>,
    pub all_selected: bool,
    pub progress: Vec<TaskProgress>,
    pub polling_active: bool,
    pub poll_starts: u64,
    pub progress_active: bool,
    pub progress_ticks: u64,
    pub deletion: DeletionState,
    pub disposed: bool,
}

struct MonitorState {
    filter: FilterPaginationController,
    page: ResultPage,
    selection: SelectionManager,
    deletion: DeletionController,
    poller: PollingScheduler,
    ticker: ProgressTicker,
    progress: Vec<TaskProgress>,
    debounce: Option<CancellationToken>,
    disposed: bool,
}

struct MonitorInner {
    config: ResearchMonitorConfig,
    api: Arc<dyn ResearchApiPort>,
    events: Arc<EventPublisher>,
    state: Mutex<MonitorState>,
    /// 最后发出的列表请求序号
    fetch_seq: AtomicU64,
}

/// 研究结果监控器
///
/// 句柄可廉价克隆；定时任务只持有弱引用，最后一个句柄释放后随之结束
#[derive(Clone)]
pub struct ResearchMonitor {
    inner: Arc<MonitorInner>,
}

impl ResearchMonitor {
    pub fn new(
        config: ResearchMonitorConfig,
        api: Arc<dyn ResearchApiPort>,
        events: Arc<EventPublisher>,
        curve: Arc<dyn ProgressCurve>,
    ) -> Self {
        let state = MonitorState {
            filter: FilterPaginationController::new(config.page_size),
            page: ResultPage::default(),
            selection: SelectionManager::new(),
            deletion: DeletionController::new(),
            poller: PollingScheduler::new(config.poll_interval),
            ticker: ProgressTicker::new(config.progress_tick, curve),
            progress: Vec::new(),
            debounce: None,
            disposed: false,
        };

        Self {
            inner: Arc::new(MonitorInner {
                config,
                api,
                events,
                state: Mutex::new(state),
                fetch_seq: AtomicU64::new(0),
            }),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MonitorEvent> {
        self.inner.events.subscribe()
    }

    /// 立即重新拉取（手动刷新），不经过防抖
    pub async fn refresh(&self) -> Result<FetchOutcome, ApplicationError> {
        self.inner.fetch().await
    }

    pub fn set_search(&self, search: impl Into<String>) {
        let search = search.into();
        self.inner.mutate_filter(move |f| f.set_search(search));
    }

    pub fn set_status_filter(&self, status: Option<TaskStatus>) -> Result<(), ApplicationError> {
        if let Some(status) = status.filter(|s| !s.is_filterable()) {
            return Err(ApplicationError::validation(format!(
                "Unsupported status filter: {}",
                status
            )));
        }
        self.inner.mutate_filter(move |f| f.set_status_filter(status));
        Ok(())
    }

    pub fn set_type_filter(&self, contact_type: Option<ContactType>) {
        self.inner
            .mutate_filter(move |f| f.set_type_filter(contact_type));
    }

    pub fn set_page(&self, page: u32) {
        self.inner.mutate_filter(move |f| f.set_page(page));
    }

    /// 返回切换后是否选中
    pub fn toggle(&self, id: TaskId) -> bool {
        self.inner.lock().selection.toggle(id)
    }

    pub fn toggle_all(&self) {
        self.inner.lock().selection.toggle_all();
    }

    pub fn all_selected(&self) -> bool {
        self.inner.lock().selection.all_selected()
    }

    pub fn selected_ids(&self) -> Vec<TaskId> {
        self.inner.lock().selection.selected_ids()
    }

    /// 请求删除单个任务，返回确认文案
    pub fn request_single(
        &self,
        id: TaskId,
        label: impl Into<String>,
    ) -> Result<String, ApplicationError> {
        let label = label.into();
        self.inner
            .request_delete(move |state| state.deletion.request_single(id, label))
    }

    /// 请求删除当前勾选的任务，返回确认文案
    pub fn request_bulk(&self) -> Result<String, ApplicationError> {
        self.inner.request_delete(|state| {
            let selected = state.selection.selected_ids();
            state.deletion.request_bulk(&selected)
        })
    }

    /// 请求删除全部任务，返回确认文案
    pub fn request_all(&self) -> Result<String, ApplicationError> {
        self.inner.request_delete(|state| state.deletion.request_all())
    }

    /// 取消待确认的删除
    pub fn cancel_delete(&self) -> bool {
        let cancelled = self.inner.lock().deletion.cancel();
        if cancelled {
            self.inner.events.publish_deletion_state("idle", None);
        }
        cancelled
    }

    /// 确认删除：发出唯一一次删除请求，成功后清空勾选并强制重新拉取
    pub async fn confirm_delete(&self) -> Result<DeletionOutcome, ApplicationError> {
        self.inner.confirm_delete().await
    }

    /// 跟踪一个完成通知的关联令牌
    pub fn track_token(&self, token: impl Into<String>) {
        self.inner.lock().poller.matcher_mut().track_token(token);
    }

    /// 计算任务研究对象的详情页目标
    pub fn detail_target(&self, id: TaskId) -> Option<DetailTarget> {
        self.inner.lock().page.find(id)?.detail_target()
    }

    pub fn progress_of(&self, id: TaskId) -> Option<f64> {
        self.inner
            .lock()
            .progress
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.percent)
    }

    pub fn snapshot(&self) -> MonitorSnapshot {
        let state = self.inner.lock();
        MonitorSnapshot {
            page: state.page.clone(),
            query: state.filter.query(),
            selected: state.selection.selected_ids(),
            all_selected: state.selection.all_selected(),
            progress: state.progress.clone(),
            polling_active: state.poller.is_active(),
            poll_starts: state.poller.starts(),
            progress_active: state.ticker.is_active(),
            progress_ticks: state.ticker.ticks(),
            deletion: state.deletion.state().clone(),
            disposed: state.disposed,
        }
    }

    /// 销毁：无条件清除所有定时器，之后到达的响应不再生效
    pub fn dispose(&self) {
        self.inner.dispose();
    }
}

impl MonitorInner {
    fn lock(&self) -> MutexGuard<'_, MonitorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn fetch(self: &Arc<Self>) -> Result<FetchOutcome, ApplicationError> {
        let (seq, query) = {
            let state = self.lock();
            if state.disposed {
                return Ok(FetchOutcome::Disposed);
            }
            let seq = self.fetch_seq.fetch_add(1, Ordering::SeqCst) + 1;
            (seq, state.filter.query())
        };

        tracing::debug!(
            seq = seq,
            page = query.page,
            search = ?query.search,
            status = ?query.status,
            contact_type = ?query.contact_type,
            "Fetching research results"
        );

        let result = self.api.list(&query).await;

        let mut guard = self.lock();
        if guard.disposed {
            tracing::debug!(seq = seq, "Monitor disposed, dropping list response");
            return Ok(FetchOutcome::Disposed);
        }
        let latest = self.fetch_seq.load(Ordering::SeqCst);
        if self.config.discard_stale_responses && seq != latest {
            tracing::debug!(seq = seq, latest = latest, "Discarding superseded list response");
            return Ok(FetchOutcome::Superseded);
        }

        match result {
            Ok(page) => {
                self.apply_page(&mut *guard, page);
                Ok(FetchOutcome::Applied)
            }
            Err(e) => {
                tracing::warn!(seq = seq, error = %e, "Failed to fetch research results");
                self.events.publish_fetch_failed(&e.to_string());
                Err(e.into())
            }
        }
    }

    /// 整体替换结果页，并按处理中任务数同步两个定时器
    fn apply_page(self: &Arc<Self>, state: &mut MonitorState, page: ResultPage) {
        for task in &page.tasks {
            if let Err(e) = task.check_invariants() {
                tracing::warn!(task_id = %task.id, error = %e, "Server returned inconsistent task");
            }
        }

        let dropped = state.selection.reconcile(page.ids());
        let processing = page.processing_count();
        state.progress = state.ticker.compute(&page, Utc::now());

        tracing::debug!(
            page = page.page,
            tasks = page.len(),
            total = page.total_count,
            processing = processing,
            dropped_selection = dropped.len(),
            "Result page replaced"
        );

        self.events.publish(MonitorEvent::PageReplaced {
            page: page.page,
            total_count: page.total_count,
            task_ids: page.ids(),
            processing,
            dropped_selection: dropped,
        });
        state.page = page;

        if !state.progress.is_empty() {
            self.events.publish_progress(state.progress.clone());
        }
        self.sync_timers(state, processing);
    }

    fn sync_timers(self: &Arc<Self>, state: &mut MonitorState, processing: usize) {
        let weak = Arc::downgrade(self);
        let transition = state.poller.sync(processing, move || {
            let weak = weak.clone();
            async move {
                match weak.upgrade() {
                    Some(inner) => {
                        inner.poll_once().await;
                        ControlFlow::Continue(())
                    }
                    None => ControlFlow::Break(()),
                }
            }
        });
        match transition {
            PollTransition::Started => self.events.publish_polling(true),
            PollTransition::Stopped => self.events.publish_polling(false),
            PollTransition::Unchanged => {}
        }

        let weak = Arc::downgrade(self);
        let switched = state.ticker.sync(processing, move || {
            let weak = weak.clone();
            async move {
                match weak.upgrade() {
                    Some(inner) => {
                        inner.tick_progress();
                        ControlFlow::Continue(())
                    }
                    None => ControlFlow::Break(()),
                }
            }
        });
        if switched {
            tracing::debug!(active = processing > 0, "Progress ticker switched");
        }
    }

    fn tick_progress(&self) {
        let mut guard = self.lock();
        let state = &mut *guard;
        if state.disposed || !state.ticker.is_active() {
            return;
        }
        let progress = state.ticker.compute(&state.page, Utc::now());
        state.ticker.record_tick();
        state.progress = progress.clone();
        self.events.publish_progress(progress);
    }

    async fn poll_once(self: &Arc<Self>) {
        let entries = match self
            .api
            .notifications(&self.config.notification_category)
            .await
        {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to poll notifications");
                return;
            }
        };

        let signals = {
            let mut state = self.lock();
            if state.disposed || !state.poller.is_active() {
                return;
            }
            state.poller.matcher_mut().scan(&entries)
        };
        if signals.is_empty() {
            return;
        }

        for signal in &signals {
            tracing::info!(
                notification_type = %signal.notification_type,
                token = ?signal.token,
                "Research completion detected"
            );
            self.events.publish(MonitorEvent::CompletionDetected {
                outcome: signal.outcome,
                notification_type: signal.notification_type.clone(),
                token: signal.token.clone(),
            });
            let level = match signal.outcome {
                CompletionOutcome::Success => ToastLevel::Success,
                CompletionOutcome::Failed => ToastLevel::Error,
            };
            self.events.publish_toast(level, signal.toast_message());
        }

        if let Err(e) = self.fetch().await {
            tracing::warn!(error = %e, "Refetch after completion failed");
        }
    }

    /// 修改过滤条件并安排一次防抖拉取，连续修改只会触发最后一次
    fn mutate_filter(self: &Arc<Self>, mutate: impl FnOnce(&mut FilterPaginationController)) {
        let mut state = self.lock();
        if state.disposed {
            tracing::debug!("Monitor disposed, ignoring filter change");
            return;
        }
        mutate(&mut state.filter);

        if let Some(previous) = state.debounce.take() {
            previous.cancel();
        }
        let token = CancellationToken::new();
        state.debounce = Some(token.clone());

        let weak: Weak<Self> = Arc::downgrade(self);
        let delay = self.config.search_debounce;
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    if let Some(inner) = weak.upgrade() {
                        if let Err(e) = inner.fetch().await {
                            tracing::debug!(error = %e, "Debounced fetch failed");
                        }
                    }
                }
            }
        });
    }

    fn request_delete(
        &self,
        request: impl FnOnce(&mut MonitorState) -> Result<(), DeletionError>,
    ) -> Result<String, ApplicationError> {
        let mut state = self.lock();
        if state.disposed {
            return Err(ApplicationError::Disposed);
        }
        request(&mut *state)?;
        let prompt = state.deletion.prompt().unwrap_or_default();
        self.events
            .publish_deletion_state(state.deletion.state().name(), Some(prompt.clone()));
        Ok(prompt)
    }

    async fn confirm_delete(self: &Arc<Self>) -> Result<DeletionOutcome, ApplicationError> {
        let request = {
            let mut guard = self.lock();
            let state = &mut *guard;
            if state.disposed {
                return Err(ApplicationError::Disposed);
            }
            let selected = state.selection.selected_ids();
            let before = state.deletion.state().name();
            let request = state.deletion.begin(&selected);
            let after = state.deletion.state().name();
            if after != before {
                self.events.publish_deletion_state(after, None);
            }
            request?
        };

        tracing::info!(kind = request.kind(), "Sending delete request");
        let result = self.api.delete(&request).await;

        let outcome = {
            let mut state = self.lock();
            let outcome = state.deletion.complete(result);
            if state.disposed {
                tracing::debug!("Monitor disposed, delete finished silently");
                return outcome.map_err(Into::into);
            }
            self.events.publish_deletion_state("idle", None);

            match outcome {
                Ok(outcome) => {
                    state.selection.clear();
                    outcome
                }
                Err(e) => {
                    tracing::warn!(kind = request.kind(), error = %e, "Delete failed");
                    self.events.publish_toast(ToastLevel::Error, e.to_string());
                    return Err(e.into());
                }
            }
        };

        tracing::info!(
            kind = request.kind(),
            not_found = outcome.not_found_ids.len(),
            "Delete completed"
        );
        self.events
            .publish_toast(ToastLevel::Success, outcome.message.clone());

        if let Err(e) = self.fetch().await {
            tracing::warn!(error = %e, "Refetch after delete failed");
        }
        Ok(outcome)
    }

    fn dispose(&self) {
        let mut state = self.lock();
        if let Some(token) = state.debounce.take() {
            token.cancel();
        }
        let poll_stopped = state.poller.stop();
        let ticker_stopped = state.ticker.stop();
        if !state.disposed {
            state.disposed = true;
            tracing::info!(
                poll_stopped = poll_stopped,
                ticker_stopped = ticker_stopped,
                "Research monitor disposed"
            );
        }
    }
}

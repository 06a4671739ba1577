//! Selection - 当前页内的勾选集合
//!
//! 勾选只针对"当前看得见的"任务，结果页替换后不可见的 id 立即丢弃

use std::collections::BTreeSet;

use crate::domain::TaskId;

#[derive(Debug, Clone, Default)]
pub struct SelectionManager {
    selected: BTreeSet<TaskId>,
    visible: Vec<TaskId>,
}

impl SelectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// 切换单个任务的勾选状态，不在当前页的 id 被忽略
    ///
    /// 返回切换后是否处于选中状态
    pub fn toggle(&mut self, id: TaskId) -> bool {
        if !self.visible.contains(&id) {
            tracing::debug!(task_id = %id, "Ignoring toggle for task not on page");
            return false;
        }
        if self.selected.remove(&id) {
            false
        } else {
            self.selected.insert(id);
            true
        }
    }

    /// 全选当前页；若已全选则清空
    pub fn toggle_all(&mut self) {
        if self.all_selected() {
            self.selected.clear();
        } else {
            self.selected = self.visible.iter().copied().collect();
        }
    }

    /// 结果页替换后与可见 id 取交集
    ///
    /// 返回被丢弃的 id
    pub fn reconcile(&mut self, visible: Vec<TaskId>) -> Vec<TaskId> {
        let dropped: Vec<TaskId> = self
            .selected
            .iter()
            .filter(|id| !visible.contains(id))
            .copied()
            .collect();
        for id in &dropped {
            self.selected.remove(id);
        }
        self.visible = visible;
        dropped
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    pub fn all_selected(&self) -> bool {
        !self.visible.is_empty() && self.selected.len() == self.visible.len()
    }

    pub fn is_selected(&self, id: TaskId) -> bool {
        self.selected.contains(&id)
    }

    /// 已勾选的 id（升序）
    pub fn selected_ids(&self) -> Vec<TaskId> {
        self.selected.iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(range: std::ops::RangeInclusive<i64>) -> Vec<TaskId> {
        range.map(TaskId::new).collect()
    }

    #[test]
    fn test_toggle_all_on_full_page() {
        let mut selection = SelectionManager::new();
        selection.reconcile(ids(1..=10));

        selection.toggle_all();
        assert_eq!(selection.len(), 10);
        assert!(selection.all_selected());

        selection.toggle_all();
        assert_eq!(selection.len(), 0);
        assert!(!selection.all_selected());
    }

    #[test]
    fn test_toggle_all_with_partial_selection_selects_everything() {
        let mut selection = SelectionManager::new();
        selection.reconcile(ids(1..=4));
        selection.toggle(TaskId::new(2));

        selection.toggle_all();
        assert_eq!(selection.selected_ids(), ids(1..=4));
    }

    #[test]
    fn test_toggle_all_on_empty_page_is_noop() {
        let mut selection = SelectionManager::new();
        selection.toggle_all();
        assert!(selection.is_empty());
        assert!(!selection.all_selected());
    }

    #[test]
    fn test_toggle_flips_membership() {
        let mut selection = SelectionManager::new();
        selection.reconcile(ids(1..=3));

        assert!(selection.toggle(TaskId::new(2)));
        assert!(selection.is_selected(TaskId::new(2)));
        assert!(!selection.toggle(TaskId::new(2)));
        assert!(selection.is_empty());
    }

    #[test]
    fn test_toggle_ignores_invisible_id() {
        let mut selection = SelectionManager::new();
        selection.reconcile(ids(1..=3));
        assert!(!selection.toggle(TaskId::new(42)));
        assert!(selection.is_empty());
    }

    #[test]
    fn test_reconcile_drops_stale_ids_only() {
        let mut selection = SelectionManager::new();
        selection.reconcile(ids(5..=8));
        selection.toggle(TaskId::new(6));
        selection.toggle(TaskId::new(7));

        let dropped = selection.reconcile(vec![TaskId::new(5), TaskId::new(6), TaskId::new(9)]);
        assert_eq!(dropped, vec![TaskId::new(7)]);
        assert_eq!(selection.selected_ids(), vec![TaskId::new(6)]);
        assert!(!selection.all_selected());
    }
}

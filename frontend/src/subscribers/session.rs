use crate::dataflow::Subscriber;
use crate::error::ViewError;
use crate::platform::SessionStore;
use log::debug;
use shared::{StoredView, ViewPatch, ViewState};
use std::rc::Rc;

/// Keeps the range and grouping of the current view in session storage.
pub struct SessionPersister {
    storage: Rc<dyn SessionStore>,
    key: String,
    tracked: ViewPatch,
}

impl SessionPersister {
    /// Tracking starts from `initial` so the first write is always complete.
    pub fn new(storage: Rc<dyn SessionStore>, key: impl Into<String>, initial: &ViewState) -> Self {
        Self {
            storage,
            key: key.into(),
            tracked: initial.into(),
        }
    }
}

impl Subscriber for SessionPersister {
    fn name(&self) -> &'static str {
        "session_persist"
    }

    fn on_change(&mut self, patch: &ViewPatch) -> Result<(), ViewError> {
        self.tracked.merge(patch);
        let json = serde_json::to_string(&StoredView::from_patch(&self.tracked))?;
        debug!("session_persist: {} = {}", self.key, json);
        self.storage.set(&self.key, &json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::memory::MemoryStore;
    use shared::Range;

    fn initial() -> ViewState {
        ViewState {
            metric: "downloads".into(),
            range: Range::shorthand("30 days"),
            group: "day".into(),
        }
    }

    #[test]
    fn test_writes_range_and_group_only() {
        let storage = Rc::new(MemoryStore::new());
        let mut persister = SessionPersister::new(storage.clone(), "stats_view", &initial());

        persister.on_change(&initial().into()).unwrap();

        assert_eq!(
            storage.item("stats_view").as_deref(),
            Some(r#"{"range":"30 days","group":"day"}"#)
        );
    }

    #[test]
    fn test_partial_patch_merges_into_tracked_view() {
        let storage = Rc::new(MemoryStore::new());
        let mut persister = SessionPersister::new(storage.clone(), "stats_view", &initial());

        persister.on_change(&ViewPatch::default().with_group("week")).unwrap();
        persister
            .on_change(&ViewPatch::default().with_metric("usage"))
            .unwrap();

        assert_eq!(
            storage.item("stats_view").as_deref(),
            Some(r#"{"range":"30 days","group":"week"}"#)
        );
        assert_eq!(storage.writes(), 2);
    }
}

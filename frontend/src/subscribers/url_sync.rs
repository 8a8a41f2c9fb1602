use crate::dataflow::Subscriber;
use crate::error::ViewError;
use crate::platform::HistoryApi;
use log::debug;
use shared::{ViewPatch, view_query};
use std::rc::Rc;

/// Mirrors the range of each incoming patch into the address bar.
///
/// Works on the patch alone; patches without a range leave the URL as is.
pub struct UrlSynchronizer {
    history: Rc<dyn HistoryApi>,
    include_spans: bool,
}

impl UrlSynchronizer {
    pub fn new(history: Rc<dyn HistoryApi>, include_spans: bool) -> Self {
        Self { history, include_spans }
    }
}

impl Subscriber for UrlSynchronizer {
    fn name(&self) -> &'static str {
        "url_sync"
    }

    fn on_change(&mut self, patch: &ViewPatch) -> Result<(), ViewError> {
        let query = view_query(patch, self.include_spans).to_query_string();
        if query.is_empty() {
            return Ok(());
        }
        debug!("url_sync: ?{}", query);
        self.history.replace_query(patch, &format!("?{query}"))
    }
}

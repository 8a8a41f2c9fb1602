use crate::dataflow::Subscriber;
use crate::error::ViewError;
use crate::platform::{Clock, PageDom};
use log::debug;
use shared::{ViewPatch, export_href};
use std::rc::Rc;

/// Points the "Export as CSV" link at the file for the current view.
pub struct ExportLinkUpdater {
    dom: Rc<dyn PageDom>,
    clock: Rc<dyn Clock>,
    link_id: String,
    base_url: String,
    granularity: String,
    tracked: ViewPatch,
}

impl ExportLinkUpdater {
    pub fn new(
        dom: Rc<dyn PageDom>,
        clock: Rc<dyn Clock>,
        link_id: impl Into<String>,
        base_url: impl Into<String>,
        granularity: impl Into<String>,
    ) -> Self {
        Self {
            dom,
            clock,
            link_id: link_id.into(),
            base_url: base_url.into(),
            granularity: granularity.into(),
            tracked: ViewPatch::default(),
        }
    }
}

impl Subscriber for ExportLinkUpdater {
    fn name(&self) -> &'static str {
        "export_link"
    }

    fn on_change(&mut self, patch: &ViewPatch) -> Result<(), ViewError> {
        self.tracked.merge(patch);
        let (Some(metric), Some(range)) = (&self.tracked.metric, &self.tracked.range) else {
            debug!("export_link: view incomplete, link left unchanged");
            return Ok(());
        };

        let span = range.normalize(self.clock.today())?;
        let href = export_href(&self.base_url, metric, &self.granularity, &span);
        debug!("export_link: {}", href);
        self.dom.set_attribute_by_id(&self.link_id, "href", &href)
    }
}

//! View state controller
//!
//! Builds the initial view from page attributes and session storage, wires
//! the built-in subscribers onto a [`ChangeViewBus`] and fires the first
//! `changeview`.
//!
//! Registration order is fixed: URL sync, session persistence, export link.
//! Subscribers gated by [`Capabilities`] are simply never registered when
//! the browser lacks support.

use crate::dataflow::{ChangeViewBus, Subscriber};
use crate::error::ViewError;
use crate::platform::{Capabilities, PageDom, Platform, SessionStore};
use crate::subscribers::{ExportLinkUpdater, SessionPersister, UrlSynchronizer};
use futures::channel::mpsc::UnboundedReceiver;
use log::{debug, info, warn};
use shared::{Range, StoredView, ViewConfig, ViewPatch, ViewState};

pub struct ViewStateController {
    config: ViewConfig,
    platform: Platform,
    bus: ChangeViewBus,
    initial: ViewState,
    started: bool,
}

impl ViewStateController {
    pub fn new(config: ViewConfig, platform: Platform) -> Result<Self, ViewError> {
        let mut initial = default_view(&config, platform.dom.as_ref())?;
        if platform.capabilities.supports_persistence {
            restore_view(&config, platform.storage.as_ref(), &mut initial);
        }
        info!(
            "stats view: metric '{}', range '{}', group '{}'",
            initial.metric, initial.range, initial.group
        );

        let mut controller = Self {
            bus: ChangeViewBus::new(),
            config,
            platform,
            initial,
            started: false,
        };
        controller.register_subscribers();
        Ok(controller)
    }

    fn register_subscribers(&mut self) {
        let Capabilities {
            supports_url_sync,
            supports_persistence,
        } = self.platform.capabilities;

        if supports_url_sync {
            self.bus.subscribe(UrlSynchronizer::new(
                self.platform.history.clone(),
                self.config.url_sync_spans,
            ));
        } else {
            debug!("url_sync disabled: history replacement unsupported");
        }

        if supports_persistence {
            self.bus.subscribe(SessionPersister::new(
                self.platform.storage.clone(),
                self.config.storage_key.clone(),
                &self.initial,
            ));
        } else {
            debug!("session_persist disabled: session storage unavailable");
        }

        match self
            .platform
            .dom
            .attribute(&self.config.primary_selector, &self.config.base_url_attribute)
        {
            Some(base_url) => self.bus.subscribe(ExportLinkUpdater::new(
                self.platform.dom.clone(),
                self.platform.clock.clone(),
                self.config.export_link_id.clone(),
                base_url,
                self.config.export_granularity.clone(),
            )),
            None => warn!(
                "export_link disabled: no {} on {}",
                self.config.base_url_attribute, self.config.primary_selector
            ),
        }
    }

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    /// View resolved at construction, before any broadcast.
    pub fn initial_view(&self) -> &ViewState {
        &self.initial
    }

    pub fn subscriber_names(&self) -> Vec<&'static str> {
        self.bus.subscriber_names()
    }

    /// Register an additional subscriber after the built-in ones.
    pub fn subscribe(&mut self, subscriber: impl Subscriber + 'static) {
        self.bus.subscribe(subscriber);
    }

    pub fn observe(&mut self) -> UnboundedReceiver<ViewPatch> {
        self.bus.observe()
    }

    /// Bind the notes modal, fire the initial `changeview`, enhance CSV tables.
    ///
    /// Runs once; later calls are ignored.
    pub fn start(&mut self) {
        if self.started {
            warn!("stats view already started");
            return;
        }
        self.started = true;

        if let Err(error) = self.platform.dom.bind_modal(&self.config.modal) {
            warn!("notes modal not bound: {}", error);
        }

        let initial = ViewPatch::from(&self.initial);
        self.broadcast(&initial);

        match self.platform.dom.enhance_csv_tables(&self.config.csv_table_selector) {
            Ok(count) => debug!("enhanced {} csv tables", count),
            Err(error) => warn!("csv tables not enhanced: {}", error),
        }
    }

    /// Dispatch a view change to every subscriber. Returns the failure count.
    pub fn broadcast(&mut self, patch: &ViewPatch) -> usize {
        self.bus.broadcast(patch)
    }
}

/// Page defaults: metric and range from the primary element, fixed grouping.
pub fn default_view(config: &ViewConfig, dom: &dyn PageDom) -> Result<ViewState, ViewError> {
    let metric = dom
        .attribute(&config.primary_selector, &config.report_attribute)
        .ok_or_else(|| ViewError::MissingAttribute {
            selector: config.primary_selector.clone(),
            attribute: config.report_attribute.clone(),
        })?;
    let range = dom
        .attribute(&config.primary_selector, &config.range_attribute)
        .filter(|range| !range.trim().is_empty())
        .unwrap_or_else(|| config.default_range.clone());

    Ok(ViewState {
        metric,
        range: Range::Shorthand(range),
        group: config.default_group.clone(),
    })
}

/// Overlay range and grouping saved earlier in the session.
///
/// Unreadable or malformed entries are logged and ignored.
pub fn restore_view(config: &ViewConfig, storage: &dyn SessionStore, view: &mut ViewState) {
    let stored = match storage.get(&config.storage_key) {
        Ok(Some(stored)) => stored,
        Ok(None) => return,
        Err(error) => {
            warn!("session view unreadable: {}", error);
            return;
        }
    };
    match serde_json::from_str::<StoredView>(&stored) {
        Ok(stored) => {
            debug!("restoring session view {:?}", stored);
            stored.overlay(view);
        }
        Err(error) => warn!("ignoring malformed session view '{}': {}", stored, error),
    }
}

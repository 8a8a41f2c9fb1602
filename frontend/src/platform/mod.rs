//! Platform abstraction layer
//!
//! The controller only talks to the page through these traits. The browser
//! implementation lives in [`web`]; [`memory`] backs tests and host builds.

use crate::error::ViewError;
use chrono::NaiveDate;
use shared::{ModalConfig, ViewPatch};
use std::rc::Rc;

pub mod memory;

#[cfg(target_arch = "wasm32")]
pub mod web;

/// Read and mutate page markup.
pub trait PageDom {
    /// Attribute `name` of the first element matching `selector`.
    fn attribute(&self, selector: &str, name: &str) -> Option<String>;

    fn set_attribute_by_id(&self, id: &str, name: &str, value: &str) -> Result<(), ViewError>;

    /// Make the modal trigger open its panel.
    fn bind_modal(&self, modal: &ModalConfig) -> Result<(), ViewError>;

    /// Enhance every table matching `selector` and return how many were newly
    /// enhanced. Tables enhanced by an earlier call are left alone.
    fn enhance_csv_tables(&self, selector: &str) -> Result<usize, ViewError>;
}

pub trait SessionStore {
    fn get(&self, key: &str) -> Result<Option<String>, ViewError>;

    fn set(&self, key: &str, value: &str) -> Result<(), ViewError>;
}

pub trait HistoryApi {
    /// Replace the current history entry's query string (no reload, no new
    /// entry), keeping the document title. `state` becomes the entry state.
    fn replace_query(&self, state: &ViewPatch, query: &str) -> Result<(), ViewError>;
}

pub trait Clock {
    fn today(&self) -> NaiveDate;
}

/// Local calendar date of the running system.
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        chrono::Local::now().date_naive()
    }
}

/// Features that depend on browser support, probed once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub supports_url_sync: bool,
    pub supports_persistence: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            supports_url_sync: true,
            supports_persistence: true,
        }
    }
}

/// Everything the controller needs from its environment.
#[derive(Clone)]
pub struct Platform {
    pub dom: Rc<dyn PageDom>,
    pub storage: Rc<dyn SessionStore>,
    pub history: Rc<dyn HistoryApi>,
    pub clock: Rc<dyn Clock>,
    pub capabilities: Capabilities,
}

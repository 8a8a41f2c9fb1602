//! In-memory page, storage and history
//!
//! Records every effect so callers can inspect what the controller did.

use super::{Capabilities, Clock, HistoryApi, PageDom, Platform, SessionStore};
use crate::error::ViewError;
use chrono::NaiveDate;
use shared::{ModalConfig, ViewPatch};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Default)]
pub struct MemoryDom {
    // (selector, attribute) -> value
    selected: RefCell<HashMap<(String, String), String>>,
    // (id, attribute) -> value
    by_id: RefCell<HashMap<(String, String), String>>,
    ids: RefCell<Vec<String>>,
    modals: RefCell<Vec<ModalConfig>>,
    tables: RefCell<HashMap<String, usize>>,
    enhanced_tables: Cell<usize>,
}

impl MemoryDom {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attribute(self, selector: &str, name: &str, value: &str) -> Self {
        self.selected
            .borrow_mut()
            .insert((selector.to_string(), name.to_string()), value.to_string());
        self
    }

    pub fn with_element(self, id: &str) -> Self {
        self.ids.borrow_mut().push(id.to_string());
        self
    }

    pub fn with_tables(self, selector: &str, count: usize) -> Self {
        self.tables.borrow_mut().insert(selector.to_string(), count);
        self
    }

    pub fn element_attribute(&self, id: &str, name: &str) -> Option<String> {
        self.by_id
            .borrow()
            .get(&(id.to_string(), name.to_string()))
            .cloned()
    }

    pub fn bound_modals(&self) -> Vec<ModalConfig> {
        self.modals.borrow().clone()
    }

    pub fn enhanced_tables(&self) -> usize {
        self.enhanced_tables.get()
    }

    fn has_element(&self, id: &str) -> bool {
        self.ids.borrow().iter().any(|known| known == id)
    }
}

impl PageDom for MemoryDom {
    fn attribute(&self, selector: &str, name: &str) -> Option<String> {
        self.selected
            .borrow()
            .get(&(selector.to_string(), name.to_string()))
            .cloned()
    }

    fn set_attribute_by_id(&self, id: &str, name: &str, value: &str) -> Result<(), ViewError> {
        if !self.has_element(id) {
            return Err(ViewError::MissingElement(format!("#{id}")));
        }
        self.by_id
            .borrow_mut()
            .insert((id.to_string(), name.to_string()), value.to_string());
        Ok(())
    }

    fn bind_modal(&self, modal: &ModalConfig) -> Result<(), ViewError> {
        for id in [&modal.panel_id, &modal.trigger_id] {
            if !self.has_element(id) {
                return Err(ViewError::MissingElement(format!("#{id}")));
            }
        }
        self.modals.borrow_mut().push(modal.clone());
        Ok(())
    }

    fn enhance_csv_tables(&self, selector: &str) -> Result<usize, ViewError> {
        // Tables already enhanced stay bound to their first handlers.
        let count = self.tables.borrow_mut().remove(selector).unwrap_or(0);
        self.enhanced_tables.set(self.enhanced_tables.get() + count);
        Ok(count)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    items: RefCell<HashMap<String, String>>,
    writes: Cell<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_item(self, key: &str, value: &str) -> Self {
        self.items.borrow_mut().insert(key.to_string(), value.to_string());
        self
    }

    pub fn item(&self, key: &str) -> Option<String> {
        self.items.borrow().get(key).cloned()
    }

    pub fn writes(&self) -> usize {
        self.writes.get()
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, ViewError> {
        Ok(self.item(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ViewError> {
        self.items.borrow_mut().insert(key.to_string(), value.to_string());
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryHistory {
    entries: RefCell<Vec<(String, ViewPatch)>>,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Query of the current entry, `None` until the first replacement.
    pub fn current_query(&self) -> Option<String> {
        self.entries.borrow().last().map(|(query, _)| query.clone())
    }

    pub fn current_state(&self) -> Option<ViewPatch> {
        self.entries.borrow().last().map(|(_, state)| state.clone())
    }

    pub fn replacements(&self) -> usize {
        self.entries.borrow().len()
    }
}

impl HistoryApi for MemoryHistory {
    fn replace_query(&self, state: &ViewPatch, query: &str) -> Result<(), ViewError> {
        self.entries
            .borrow_mut()
            .push((query.to_string(), state.clone()));
        Ok(())
    }
}

pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// Handles to every in-memory piece, kept so they can be inspected after
/// being handed to a controller.
pub struct MemoryPlatform {
    pub dom: Rc<MemoryDom>,
    pub storage: Rc<MemoryStore>,
    pub history: Rc<MemoryHistory>,
    pub clock: Rc<FixedClock>,
    pub capabilities: Capabilities,
}

impl MemoryPlatform {
    pub fn new(dom: MemoryDom, storage: MemoryStore, today: NaiveDate) -> Self {
        Self {
            dom: Rc::new(dom),
            storage: Rc::new(storage),
            history: Rc::new(MemoryHistory::new()),
            clock: Rc::new(FixedClock(today)),
            capabilities: Capabilities::default(),
        }
    }

    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn platform(&self) -> Platform {
        Platform {
            dom: self.dom.clone(),
            storage: self.storage.clone(),
            history: self.history.clone(),
            clock: self.clock.clone(),
            capabilities: self.capabilities,
        }
    }
}

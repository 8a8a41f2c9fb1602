//! Browser platform implementation on `web-sys`.

use super::{Capabilities, HistoryApi, PageDom, Platform, SessionStore, SystemClock};
use crate::csv_table::{SortDirection, sorted_order};
use crate::error::ViewError;
use shared::{ModalConfig, ViewPatch};
use std::cell::Cell;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    Document, Element, Event, HtmlElement, HtmlTableElement, HtmlTableRowElement,
    HtmlTableSectionElement, KeyboardEvent, Storage, Window,
};

const STORAGE_PROBE_KEY: &str = "__stats_view_probe__";

pub(crate) fn js_error(value: JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}

fn dom_error(value: JsValue) -> ViewError {
    ViewError::Dom(js_error(value))
}

pub fn window() -> Result<Window, ViewError> {
    web_sys::window().ok_or_else(|| ViewError::Dom("no global window".to_string()))
}

fn document(window: &Window) -> Result<Document, ViewError> {
    window
        .document()
        .ok_or_else(|| ViewError::Dom("window has no document".to_string()))
}

/// Probe browser support and assemble the platform.
pub fn probe() -> Result<Platform, ViewError> {
    let window = window()?;
    let document = document(&window)?;

    let history = window.history().ok();
    let supports_url_sync = history.as_ref().is_some_and(|history| {
        js_sys::Reflect::has(history, &JsValue::from_str("replaceState")).unwrap_or(false)
    });

    let storage = window.session_storage().ok().flatten().filter(storage_works);
    let supports_persistence = storage.is_some();

    Ok(Platform {
        dom: Rc::new(WebDom::new(document.clone())),
        storage: Rc::new(WebSessionStore { storage }),
        history: Rc::new(WebHistory { history, document }),
        clock: Rc::new(SystemClock),
        capabilities: Capabilities {
            supports_url_sync,
            supports_persistence,
        },
    })
}

// Session storage can exist and still refuse writes (private browsing, quota).
fn storage_works(storage: &Storage) -> bool {
    storage.set_item(STORAGE_PROBE_KEY, STORAGE_PROBE_KEY).is_ok()
        && storage.remove_item(STORAGE_PROBE_KEY).is_ok()
}

// ===== SESSION STORAGE =====

pub struct WebSessionStore {
    storage: Option<Storage>,
}

impl WebSessionStore {
    fn storage(&self) -> Result<&Storage, ViewError> {
        self.storage
            .as_ref()
            .ok_or_else(|| ViewError::Storage("session storage unavailable".to_string()))
    }
}

impl SessionStore for WebSessionStore {
    fn get(&self, key: &str) -> Result<Option<String>, ViewError> {
        self.storage()?
            .get_item(key)
            .map_err(|error| ViewError::Storage(js_error(error)))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ViewError> {
        self.storage()?
            .set_item(key, value)
            .map_err(|error| ViewError::Storage(js_error(error)))
    }
}

// ===== HISTORY =====

pub struct WebHistory {
    history: Option<web_sys::History>,
    document: Document,
}

impl HistoryApi for WebHistory {
    fn replace_query(&self, state: &ViewPatch, query: &str) -> Result<(), ViewError> {
        let history = self
            .history
            .as_ref()
            .ok_or_else(|| ViewError::History("history unavailable".to_string()))?;
        let state = serde_wasm_bindgen::to_value(state)
            .map_err(|error| ViewError::History(error.to_string()))?;
        history
            .replace_state_with_url(&state, &self.document.title(), Some(query))
            .map_err(|error| ViewError::History(js_error(error)))
    }
}

// ===== DOM =====

pub struct WebDom {
    document: Document,
}

impl WebDom {
    pub fn new(document: Document) -> Self {
        Self { document }
    }

    fn element_by_id(&self, id: &str) -> Result<Element, ViewError> {
        self.document
            .get_element_by_id(id)
            .ok_or_else(|| ViewError::MissingElement(format!("#{id}")))
    }
}

impl PageDom for WebDom {
    fn attribute(&self, selector: &str, name: &str) -> Option<String> {
        self.document
            .query_selector(selector)
            .ok()
            .flatten()?
            .get_attribute(name)
    }

    fn set_attribute_by_id(&self, id: &str, name: &str, value: &str) -> Result<(), ViewError> {
        self.element_by_id(id)?
            .set_attribute(name, value)
            .map_err(dom_error)
    }

    fn bind_modal(&self, modal: &ModalConfig) -> Result<(), ViewError> {
        let panel: HtmlElement = self
            .element_by_id(&modal.panel_id)?
            .dyn_into()
            .map_err(|_| ViewError::Dom(format!("#{} is not an HTML element", modal.panel_id)))?;
        let trigger = self.element_by_id(&modal.trigger_id)?;

        let style = panel.style();
        let width = modal.width;
        for (property, value) in [
            ("display", "none".to_string()),
            ("position", "fixed".to_string()),
            ("top", "10%".to_string()),
            ("left", "50%".to_string()),
            ("width", format!("{width}px")),
            ("margin-left", format!("-{}px", width / 2)),
            ("z-index", "1000".to_string()),
        ] {
            style.set_property(property, &value).map_err(dom_error)?;
        }

        let open = Rc::new(Cell::new(false));

        let on_click = {
            let panel = panel.clone();
            let open = open.clone();
            Closure::<dyn FnMut(Event)>::new(move |event: Event| {
                event.prevent_default();
                set_modal_open(&panel, &open, !open.get());
            })
        };
        trigger
            .add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())
            .map_err(dom_error)?;
        on_click.forget();

        let on_key = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
            let escape = event
                .dyn_ref::<KeyboardEvent>()
                .is_some_and(|key| key.key() == "Escape");
            if escape && open.get() {
                set_modal_open(&panel, &open, false);
            }
        });
        self.document
            .add_event_listener_with_callback("keydown", on_key.as_ref().unchecked_ref())
            .map_err(dom_error)?;
        on_key.forget();

        Ok(())
    }

    fn enhance_csv_tables(&self, selector: &str) -> Result<usize, ViewError> {
        let nodes = self.document.query_selector_all(selector).map_err(dom_error)?;
        let mut enhanced = 0;
        for index in 0..nodes.length() {
            let Some(element) = nodes.item(index).and_then(|node| node.dyn_into::<Element>().ok())
            else {
                continue;
            };
            // The class may sit on the table itself or on a wrapper around it.
            let table = match element.clone().dyn_into::<HtmlTableElement>() {
                Ok(table) => Some(table),
                Err(_) => element
                    .query_selector("table")
                    .map_err(dom_error)?
                    .and_then(|inner| inner.dyn_into::<HtmlTableElement>().ok()),
            };
            if let Some(table) = table
                && enhance_table(&table)?
            {
                enhanced += 1;
            }
        }
        Ok(enhanced)
    }
}

fn set_modal_open(panel: &HtmlElement, open: &Cell<bool>, visible: bool) {
    let display = if visible { "block" } else { "none" };
    if panel.style().set_property("display", display).is_ok() {
        open.set(visible);
    }
}

// ===== CSV TABLES =====

/// Bind sort handlers to the header cells. `false` when already enhanced
/// or there is no header row.
fn enhance_table(table: &HtmlTableElement) -> Result<bool, ViewError> {
    if table.get_attribute("data-enhanced").as_deref() == Some("true") {
        return Ok(false);
    }
    let Some(head_row) = table
        .t_head()
        .and_then(|head| head.rows().item(0))
        .and_then(|row| row.dyn_into::<HtmlTableRowElement>().ok())
    else {
        return Ok(false);
    };

    let headers = head_row.cells();
    for column in 0..headers.length() {
        let Some(header) = headers.item(column) else {
            continue;
        };
        let direction = Rc::new(Cell::new(SortDirection::Descending));
        let on_click = {
            let table = table.clone();
            let header = header.clone();
            Closure::<dyn FnMut(Event)>::new(move |_event: Event| {
                let next = direction.get().toggled();
                direction.set(next);
                if sort_table(&table, column, next).is_ok() {
                    let _ = header.set_attribute("aria-sort", next.as_attribute());
                }
            })
        };
        header
            .add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())
            .map_err(dom_error)?;
        on_click.forget();
    }

    table
        .set_attribute("data-enhanced", "true")
        .map_err(dom_error)?;
    Ok(true)
}

fn sort_table(table: &HtmlTableElement, column: u32, direction: SortDirection) -> Result<(), JsValue> {
    let Some(body) = table
        .t_bodies()
        .item(0)
        .and_then(|body| body.dyn_into::<HtmlTableSectionElement>().ok())
    else {
        return Ok(());
    };

    let rows = body.rows();
    let mut collected: Vec<HtmlTableRowElement> = Vec::new();
    let mut keys: Vec<String> = Vec::new();
    for index in 0..rows.length() {
        if let Some(row) = rows
            .item(index)
            .and_then(|row| row.dyn_into::<HtmlTableRowElement>().ok())
        {
            let key = row
                .cells()
                .item(column)
                .and_then(|cell| cell.text_content())
                .unwrap_or_default();
            keys.push(key);
            collected.push(row);
        }
    }

    for index in sorted_order(&keys, direction) {
        body.append_child(&collected[index])?;
    }
    Ok(())
}

//! Browser entry point
//!
//! The controller lives in a thread-local for the lifetime of the page.
//! Page scripts drive it by dispatching `changeview` on `window`; broadcasts
//! that start in Rust (the initial view, [`broadcast_view`]) are echoed back
//! to `window` so those scripts see them too.

use crate::controller::ViewStateController;
use crate::dataflow::Subscriber;
use crate::error::ViewError;
use crate::logging;
use crate::platform::Platform;
use crate::platform::web::{self, js_error};
use log::{debug, error, warn};
use shared::{CHANGE_VIEW_EVENT, ViewConfig, ViewPatch};
use std::cell::{Cell, RefCell};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{CustomEvent, CustomEventInit, Event, Window};

thread_local! {
    static CONTROLLER: RefCell<Option<ViewStateController>> = const { RefCell::new(None) };
    // Set while a window-originated event is being dispatched to the bus.
    static FROM_WINDOW: Cell<bool> = const { Cell::new(false) };
    static LISTENING: Cell<bool> = const { Cell::new(false) };
}

fn to_js(error: ViewError) -> JsValue {
    JsValue::from_str(&error.to_string())
}

#[cfg_attr(not(test), wasm_bindgen(start))]
pub fn start() -> Result<(), JsValue> {
    let platform = web::probe().map_err(to_js)?;
    let config = page_config(&platform);
    mount(config, platform)
}

/// Install logging and the window bridge, then start a controller for `platform`.
///
/// A later mount replaces the running controller; the window listener is
/// only ever added once.
fn mount(config: ViewConfig, platform: Platform) -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    logging::init(&config.log_level);

    let window = web::window().map_err(to_js)?;
    let mut controller = ViewStateController::new(config, platform).map_err(|error| {
        error!("stats view not started: {}", error);
        to_js(error)
    })?;
    controller.subscribe(WindowEcho { window: window.clone() });

    if !LISTENING.with(Cell::get) {
        install_listener(&window)?;
        LISTENING.with(|flag| flag.set(true));
    }
    CONTROLLER.with(|cell| *cell.borrow_mut() = Some(controller));
    with_controller(|controller| controller.start());
    Ok(())
}

/// Broadcast a view change from script without going through a DOM event.
/// Returns the number of subscribers that failed.
#[wasm_bindgen]
pub fn broadcast_view(detail: JsValue) -> Result<u32, JsValue> {
    let patch = patch_from_js(&detail).map_err(to_js)?;
    with_controller(|controller| controller.broadcast(&patch) as u32)
        .ok_or_else(|| JsValue::from_str("stats view is not running"))
}

fn page_config(platform: &Platform) -> ViewConfig {
    let defaults = ViewConfig::default();
    let Some(json) = platform
        .dom
        .attribute(&defaults.primary_selector, &defaults.config_attribute)
    else {
        return defaults;
    };
    ViewConfig::from_json(&json).unwrap_or_else(|error| {
        // Logging is not installed yet.
        web_sys::console::warn_1(&JsValue::from_str(&format!(
            "ignoring invalid {}: {}",
            defaults.config_attribute, error
        )));
        defaults
    })
}

/// `None` while the controller is missing or already mid-dispatch.
fn with_controller<T>(f: impl FnOnce(&mut ViewStateController) -> T) -> Option<T> {
    CONTROLLER.with(|cell| match cell.try_borrow_mut() {
        Ok(mut guard) => guard.as_mut().map(f),
        Err(_) => {
            debug!("changeview dispatched during another broadcast, ignored");
            None
        }
    })
}

// Goes through JSON so `Date` values arrive as ISO strings.
fn patch_from_js(detail: &JsValue) -> Result<ViewPatch, ViewError> {
    if detail.is_undefined() || detail.is_null() {
        return Ok(ViewPatch::default());
    }
    let json = js_sys::JSON::stringify(detail)
        .map_err(|error| ViewError::Dom(js_error(error)))?
        .as_string()
        .unwrap_or_default();
    Ok(serde_json::from_str(&json)?)
}

fn install_listener(window: &Window) -> Result<(), JsValue> {
    let on_change = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
        let Some(event) = event.dyn_ref::<CustomEvent>() else {
            return;
        };
        let patch = match patch_from_js(&event.detail()) {
            Ok(patch) => patch,
            Err(error) => {
                warn!("ignoring changeview payload: {}", error);
                return;
            }
        };
        FROM_WINDOW.with(|flag| flag.set(true));
        with_controller(|controller| controller.broadcast(&patch));
        FROM_WINDOW.with(|flag| flag.set(false));
    });
    window.add_event_listener_with_callback(CHANGE_VIEW_EVENT, on_change.as_ref().unchecked_ref())?;
    on_change.forget();
    Ok(())
}

/// Re-dispatches Rust-originated broadcasts as `changeview` on `window`.
struct WindowEcho {
    window: Window,
}

impl Subscriber for WindowEcho {
    fn name(&self) -> &'static str {
        "window_echo"
    }

    fn on_change(&mut self, patch: &ViewPatch) -> Result<(), ViewError> {
        if FROM_WINDOW.with(Cell::get) {
            return Ok(());
        }
        let json = serde_json::to_string(patch)?;
        let detail = js_sys::JSON::parse(&json).map_err(|error| ViewError::Dom(js_error(error)))?;
        let event = change_event(&detail).map_err(|error| ViewError::Dom(js_error(error)))?;
        self.window
            .dispatch_event(&event)
            .map(|_| ())
            .map_err(|error| ViewError::Dom(js_error(error)))
    }
}

fn change_event(detail: &JsValue) -> Result<CustomEvent, JsValue> {
    let init = CustomEventInit::new();
    init.set_detail(detail);
    CustomEvent::new_with_event_init_dict(CHANGE_VIEW_EVENT, &init)
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::*;
    use crate::dataflow::FnSubscriber;
    use std::rc::Rc;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    const STATS_PAGE: &str = r#"
        <div class="primary" data-report="downloads" data-base_url="/stats/export"></div>
        <a id="export_data" href="#">CSV</a>
        <a id="stats-note-link" href="#">Notes</a>
        <div id="stats-note">About these numbers</div>
    "#;

    fn mount_stats_page() -> Window {
        let window = web::window().unwrap();
        if let Ok(Some(storage)) = window.session_storage() {
            storage.clear().unwrap();
        }
        let body = window.document().unwrap().body().unwrap();
        body.set_inner_html(STATS_PAGE);

        let platform = web::probe().unwrap();
        mount(ViewConfig::default(), platform).unwrap();
        window
    }

    fn count_subscriber(count: &Rc<Cell<u32>>) -> impl Subscriber + 'static {
        let count = count.clone();
        FnSubscriber::new("counter", move |_patch| {
            count.set(count.get() + 1);
            Ok(())
        })
    }

    // Counts `changeview` events reaching `window` until dropped.
    struct EventCounter {
        window: Window,
        count: Rc<Cell<u32>>,
        listener: Closure<dyn FnMut(Event)>,
    }

    impl EventCounter {
        fn attach(window: &Window) -> Self {
            let count = Rc::new(Cell::new(0));
            let listener = {
                let count = count.clone();
                Closure::<dyn FnMut(Event)>::new(move |_event: Event| count.set(count.get() + 1))
            };
            window
                .add_event_listener_with_callback(CHANGE_VIEW_EVENT, listener.as_ref().unchecked_ref())
                .unwrap();
            Self {
                window: window.clone(),
                count,
                listener,
            }
        }
    }

    impl Drop for EventCounter {
        fn drop(&mut self) {
            let _ = self.window.remove_event_listener_with_callback(
                CHANGE_VIEW_EVENT,
                self.listener.as_ref().unchecked_ref(),
            );
        }
    }

    fn export_href(window: &Window) -> Option<String> {
        window
            .document()
            .unwrap()
            .get_element_by_id("export_data")
            .unwrap()
            .get_attribute("href")
    }

    #[wasm_bindgen_test]
    fn test_rust_broadcast_echoes_once_to_window() {
        let window = mount_stats_page();
        let seen = Rc::new(Cell::new(0));
        with_controller(|controller| controller.subscribe(count_subscriber(&seen))).unwrap();
        let events = EventCounter::attach(&window);

        let detail = js_sys::JSON::parse(r#"{"group":"week"}"#).unwrap();
        assert_eq!(broadcast_view(detail).unwrap(), 0);

        // The echo reaches page scripts but is not fed back into the bus.
        assert_eq!(events.count.get(), 1);
        assert_eq!(seen.get(), 1);
    }

    #[wasm_bindgen_test]
    fn test_window_change_updates_export_link() {
        let window = mount_stats_page();
        let seen = Rc::new(Cell::new(0));
        with_controller(|controller| controller.subscribe(count_subscriber(&seen))).unwrap();
        let events = EventCounter::attach(&window);

        let detail =
            js_sys::JSON::parse(r#"{"range":{"start":"2026-01-01","end":"2026-01-31"}}"#).unwrap();
        window.dispatch_event(&change_event(&detail).unwrap()).unwrap();

        assert_eq!(
            export_href(&window).as_deref(),
            Some("/stats/export-downloads-day-20260101-20260131.csv")
        );
        assert_eq!(seen.get(), 1);
        // Only the page's own event, no echo.
        assert_eq!(events.count.get(), 1);
    }

    #[wasm_bindgen_test]
    fn test_initial_view_reaches_page() {
        let window = mount_stats_page();
        let href = export_href(&window).unwrap();
        assert!(href.starts_with("/stats/export-downloads-day-"), "{href}");
        assert_eq!(window.location().search().unwrap(), "?last=30");
    }

    #[wasm_bindgen_test]
    fn test_patch_from_js_reads_dates_as_local_days() {
        let detail = js_sys::Object::new();
        let range = js_sys::Object::new();
        let start = js_sys::Date::new_with_year_month_day(2026, 9, 1);
        let end = js_sys::Date::new_with_year_month_day(2026, 9, 14);
        js_sys::Reflect::set(&range, &"start".into(), &start).unwrap();
        js_sys::Reflect::set(&range, &"end".into(), &end).unwrap();
        js_sys::Reflect::set(&detail, &"range".into(), &range).unwrap();

        let patch = patch_from_js(&detail).unwrap();
        let expected = shared::Range::span(
            chrono::NaiveDate::from_ymd_opt(2026, 10, 1).unwrap(),
            chrono::NaiveDate::from_ymd_opt(2026, 10, 14).unwrap(),
        );
        assert_eq!(patch.range, Some(expected));
        assert!(patch_from_js(&JsValue::UNDEFINED).unwrap().is_empty());
    }
}

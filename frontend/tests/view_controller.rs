#![cfg(not(target_arch = "wasm32"))]

use chrono::NaiveDate;
use futures::StreamExt;
use shared::{Range, ViewConfig, ViewPatch};
use stats_view::platform::memory::{MemoryDom, MemoryPlatform, MemoryStore};
use stats_view::{Capabilities, ViewStateController};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 14).unwrap()
}

fn stats_page(range: Option<&str>) -> MemoryDom {
    let dom = MemoryDom::new()
        .with_attribute(".primary", "data-report", "downloads")
        .with_attribute(".primary", "data-base_url", "/stats/export")
        .with_element("export_data")
        .with_element("stats-note")
        .with_element("stats-note-link")
        .with_tables(".csv-table", 2);
    match range {
        Some(range) => dom.with_attribute(".primary", "data-range", range),
        None => dom,
    }
}

fn controller(memory: &MemoryPlatform) -> ViewStateController {
    ViewStateController::new(ViewConfig::default(), memory.platform()).unwrap()
}

#[test]
fn test_initial_broadcast_updates_every_output() {
    init_logging();
    let memory = MemoryPlatform::new(stats_page(Some("7 days")), MemoryStore::new(), today());
    let mut controller = controller(&memory);
    controller.start();

    assert_eq!(
        memory.dom.element_attribute("export_data", "href").as_deref(),
        Some("/stats/export-downloads-day-20261007-20261014.csv")
    );
    assert_eq!(memory.history.current_query().as_deref(), Some("?last=7"));
    assert_eq!(
        memory.storage.item("stats_view").as_deref(),
        Some(r#"{"range":"7 days","group":"day"}"#)
    );
}

#[test]
fn test_defaults_without_range_or_session() {
    let memory = MemoryPlatform::new(stats_page(None), MemoryStore::new(), today());
    let controller = controller(&memory);

    let view = controller.initial_view();
    assert_eq!(view.metric, "downloads");
    assert_eq!(view.range, Range::shorthand("30 days"));
    assert_eq!(view.group, "day");
}

#[test]
fn test_session_overrides_range_and_group_but_not_metric() {
    let storage = MemoryStore::new()
        .with_item("stats_view", r#"{"range":"90 days","group":"week","metric":"usage"}"#);
    let memory = MemoryPlatform::new(stats_page(Some("30 days")), storage, today());
    let controller = controller(&memory);

    let view = controller.initial_view();
    assert_eq!(view.metric, "downloads");
    assert_eq!(view.range, Range::shorthand("90 days"));
    assert_eq!(view.group, "week");
}

#[test]
fn test_stored_view_survives_next_load() {
    let memory = MemoryPlatform::new(stats_page(None), MemoryStore::new(), today());
    let mut first = controller(&memory);
    first.start();
    first.broadcast(
        &ViewPatch::default()
            .with_range(Range::shorthand("365 days"))
            .with_group("month"),
    );

    let stored = memory.storage.item("stats_view").unwrap();
    let next = MemoryPlatform::new(
        stats_page(None),
        MemoryStore::new().with_item("stats_view", &stored),
        today(),
    );
    let second = controller(&next);

    assert_eq!(second.initial_view().range, Range::shorthand("365 days"));
    assert_eq!(second.initial_view().group, "month");
    assert_eq!(second.initial_view().metric, "downloads");
}

#[test]
fn test_repeated_broadcast_is_idempotent() {
    let memory = MemoryPlatform::new(stats_page(Some("7 days")), MemoryStore::new(), today());
    let mut controller = controller(&memory);
    controller.start();

    let patch = ViewPatch::from(controller.initial_view());
    controller.broadcast(&patch);
    let snapshot = (
        memory.history.current_query(),
        memory.storage.item("stats_view"),
        memory.dom.element_attribute("export_data", "href"),
    );
    controller.broadcast(&patch);

    assert_eq!(
        snapshot,
        (
            memory.history.current_query(),
            memory.storage.item("stats_view"),
            memory.dom.element_attribute("export_data", "href"),
        )
    );
}

#[test]
fn test_partial_change_keeps_metric_in_export_link() {
    let memory = MemoryPlatform::new(stats_page(None), MemoryStore::new(), today());
    let mut controller = controller(&memory);
    controller.start();

    let failures = controller.broadcast(&ViewPatch::default().with_range(Range::span(
        NaiveDate::from_ymd_opt(2026, 6, 1).unwrap(),
        NaiveDate::from_ymd_opt(2026, 6, 30).unwrap(),
    )));

    assert_eq!(failures, 0);
    assert_eq!(
        memory.dom.element_attribute("export_data", "href").as_deref(),
        Some("/stats/export-downloads-day-20260601-20260630.csv")
    );
    // The span is not mirrored into the URL, so the last shorthand stays.
    assert_eq!(memory.history.current_query().as_deref(), Some("?last=30"));
    assert_eq!(
        memory.storage.item("stats_view").as_deref(),
        Some(r#"{"range":{"start":"2026-06-01","end":"2026-06-30"},"group":"day"}"#)
    );
}

#[test]
fn test_missing_capabilities_disable_subscribers() {
    let memory = MemoryPlatform::new(
        stats_page(Some("7 days")),
        MemoryStore::new().with_item("stats_view", r#"{"range":"90 days","group":"week"}"#),
        today(),
    )
    .with_capabilities(Capabilities {
        supports_url_sync: false,
        supports_persistence: false,
    });
    let mut controller = controller(&memory);
    assert_eq!(controller.subscriber_names(), vec!["export_link"]);
    // Storage is not consulted either.
    assert_eq!(controller.initial_view().range, Range::shorthand("7 days"));

    controller.start();

    assert_eq!(memory.history.replacements(), 0);
    assert_eq!(memory.storage.writes(), 0);
    assert!(memory.dom.element_attribute("export_data", "href").is_some());
}

#[test]
fn test_start_binds_modal_and_tables_once() {
    let memory = MemoryPlatform::new(stats_page(None), MemoryStore::new(), today());
    let mut controller = controller(&memory);
    assert_eq!(
        controller.subscriber_names(),
        vec!["url_sync", "session_persist", "export_link"]
    );

    controller.start();
    controller.start();

    let modals = memory.dom.bound_modals();
    assert_eq!(modals.len(), 1);
    assert_eq!(modals[0].trigger_id, "stats-note-link");
    assert_eq!(modals[0].panel_id, "stats-note");
    assert_eq!(modals[0].width, 520);
    assert_eq!(memory.dom.enhanced_tables(), 2);
    assert_eq!(memory.history.replacements(), 1);
}

#[test]
fn test_missing_base_url_skips_export_link() {
    let dom = MemoryDom::new()
        .with_attribute(".primary", "data-report", "downloads")
        .with_element("export_data");
    let memory = MemoryPlatform::new(dom, MemoryStore::new(), today());
    let mut controller = controller(&memory);
    controller.start();

    assert_eq!(controller.subscriber_names(), vec!["url_sync", "session_persist"]);
    assert_eq!(memory.dom.element_attribute("export_data", "href"), None);
}

#[test]
fn test_missing_report_fails_construction() {
    let memory = MemoryPlatform::new(MemoryDom::new(), MemoryStore::new(), today());
    assert!(ViewStateController::new(ViewConfig::default(), memory.platform()).is_err());
}

#[tokio::test]
async fn test_observers_see_initial_and_later_views() {
    let memory = MemoryPlatform::new(stats_page(None), MemoryStore::new(), today());
    let mut controller = controller(&memory);
    let mut changes = controller.observe();

    controller.start();
    controller.broadcast(&ViewPatch::default().with_group("week"));

    let initial = changes.next().await.unwrap();
    assert_eq!(initial.metric.as_deref(), Some("downloads"));
    let later = changes.next().await.unwrap();
    assert_eq!(later, ViewPatch::default().with_group("week"));
}

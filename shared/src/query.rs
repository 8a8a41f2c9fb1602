//! URL formatting: the `?last=N` query mirrored into the address bar and the
//! CSV export link.

use crate::range::{DateSpan, Range, pretty};
use crate::view::ViewPatch;
use indexmap::IndexMap;

/// Ordered query parameters, serialized in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    params: IndexMap<String, String>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.params.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn to_query_string(&self) -> String {
        self.params
            .iter()
            .map(|(key, value)| format!("{}={}", urlencoding::encode(key), urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Query parameters describing the range of an incoming patch.
///
/// A shorthand contributes `last=<leading token>`. Structured spans only
/// contribute `start`/`end` when `include_spans` is set.
pub fn view_query(patch: &ViewPatch, include_spans: bool) -> QueryParams {
    let mut params = QueryParams::new();
    match &patch.range {
        Some(range @ Range::Shorthand(_)) => {
            if let Some(token) = range.shorthand_token() {
                params.insert("last", token);
            }
        }
        Some(Range::Span(span)) if include_spans => {
            params.insert("start", span.pretty_start(""));
            params.insert("end", span.pretty_end(""));
        }
        Some(Range::Span(_)) | None => {}
    }
    params
}

/// `<base_url>-<metric>-<granularity>-<start>-<end>.csv`
pub fn export_href(base_url: &str, metric: &str, granularity: &str, span: &DateSpan) -> String {
    format!(
        "{base_url}-{metric}-{granularity}-{}-{}.csv",
        pretty(span.start, ""),
        pretty(span.end, ""),
    )
}

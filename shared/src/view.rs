use crate::range::Range;
use serde::{Deserialize, Serialize};

/// Fully resolved view: which report, over which range, grouped how.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    pub metric: String,
    pub range: Range,
    pub group: String,
}

/// Partial view carried by a `changeview` broadcast.
///
/// Absent fields mean "unchanged", never "cleared".
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<Range>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

impl ViewPatch {
    pub fn with_metric(mut self, metric: impl Into<String>) -> Self {
        self.metric = Some(metric.into());
        self
    }

    pub fn with_range(mut self, range: Range) -> Self {
        self.range = Some(range);
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.metric.is_none() && self.range.is_none() && self.group.is_none()
    }

    /// Overlay every field `update` sets onto `self`.
    pub fn merge(&mut self, update: &ViewPatch) {
        if let Some(metric) = &update.metric {
            self.metric = Some(metric.clone());
        }
        if let Some(range) = &update.range {
            self.range = Some(range.clone());
        }
        if let Some(group) = &update.group {
            self.group = Some(group.clone());
        }
    }

    /// The full view, once every field has been seen.
    pub fn resolved(&self) -> Option<ViewState> {
        Some(ViewState {
            metric: self.metric.clone()?,
            range: self.range.clone()?,
            group: self.group.clone()?,
        })
    }
}

impl From<ViewState> for ViewPatch {
    fn from(view: ViewState) -> Self {
        Self {
            metric: Some(view.metric),
            range: Some(view.range),
            group: Some(view.group),
        }
    }
}

impl From<&ViewState> for ViewPatch {
    fn from(view: &ViewState) -> Self {
        view.clone().into()
    }
}

/// The slice of a view mirrored into session storage. The metric is always
/// re-derived from the page, so it is never stored.
///
/// Fields are read independently: an unreadable `range` does not cost the
/// stored `group`, and vice versa.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(from = "RawStoredView")]
pub struct StoredView {
    pub range: Option<Range>,
    pub group: Option<String>,
}

#[derive(Deserialize)]
struct RawStoredView {
    #[serde(default)]
    range: Option<serde_json::Value>,
    #[serde(default)]
    group: Option<serde_json::Value>,
}

impl From<RawStoredView> for StoredView {
    fn from(raw: RawStoredView) -> Self {
        Self {
            range: raw.range.and_then(|value| Range::deserialize(value).ok()),
            group: raw
                .group
                .and_then(|value| value.as_str().map(str::to_string)),
        }
    }
}

impl StoredView {
    pub fn from_patch(patch: &ViewPatch) -> Self {
        Self {
            range: patch.range.clone(),
            group: patch.group.clone(),
        }
    }

    /// Copy stored fields onto `view`. Missing or blank values keep the default.
    pub fn overlay(self, view: &mut ViewState) {
        if let Some(range) = self.range.filter(|range| !range.is_blank()) {
            view.range = range;
        }
        if let Some(group) = self.group.filter(|group| !group.trim().is_empty()) {
            view.group = group;
        }
    }
}

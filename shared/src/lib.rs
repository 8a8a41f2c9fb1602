//! Types shared by the stats view controller and anything else on the page
//! that speaks the `changeview` protocol.

pub mod config;
pub mod query;
pub mod range;
pub mod view;

// ===== RE-EXPORTS =====

pub use config::{ModalConfig, ViewConfig};
pub use query::{QueryParams, export_href, view_query};
pub use range::{DateSpan, Range, RangeError, RangeUnit, parse_shorthand, pretty};
pub use view::{StoredView, ViewPatch, ViewState};

/// Name of the window event views are broadcast on.
pub const CHANGE_VIEW_EVENT: &str = "changeview";

//! Stats page view controller
//!
//! Keeps the current stats view (metric, range, grouping) in step with the
//! address bar, session storage and the CSV export link, and shares every
//! change with the rest of the page through `changeview`.

pub mod controller;
pub mod csv_table;
pub mod dataflow;
pub mod error;
pub mod logging;
pub mod platform;
pub mod subscribers;

#[cfg(target_arch = "wasm32")]
mod app;

#[cfg(target_arch = "wasm32")]
pub use app::{broadcast_view, start};
pub use controller::ViewStateController;
pub use error::ViewError;
pub use platform::{Capabilities, Platform};

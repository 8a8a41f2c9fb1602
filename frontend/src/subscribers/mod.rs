//! Built-in `changeview` subscribers, in the order the controller registers
//! them.

mod export_link;
mod session;
mod url_sync;

pub use export_link::ExportLinkUpdater;
pub use session::SessionPersister;
pub use url_sync::UrlSynchronizer;

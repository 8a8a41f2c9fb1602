//! Event plumbing for view changes
//!
//! - **[`ChangeViewBus`]** - ordered, synchronous `changeview` dispatch
//! - **[`Relay`]** - fan-out streams for observers outside the bus

pub mod bus;
pub mod relay;

pub use bus::{ChangeViewBus, FnSubscriber, Subscriber};
pub use relay::Relay;

//! In-process `changeview` channel.
//!
//! Subscribers are called synchronously, in registration order, for every
//! broadcast. Observers (see [`ChangeViewBus::observe`]) get a copy of each
//! patch through a [`Relay`] stream afterwards.

use crate::dataflow::Relay;
use crate::error::ViewError;
use futures::channel::mpsc::UnboundedReceiver;
use log::{debug, warn};
use shared::ViewPatch;

/// A synchronous `changeview` handler.
///
/// Each subscriber owns whatever view state it accumulates; nothing is shared
/// between subscribers.
pub trait Subscriber {
    fn name(&self) -> &'static str;

    fn on_change(&mut self, patch: &ViewPatch) -> Result<(), ViewError>;
}

/// Subscriber backed by a closure.
pub struct FnSubscriber<F> {
    name: &'static str,
    handler: F,
}

impl<F> FnSubscriber<F>
where
    F: FnMut(&ViewPatch) -> Result<(), ViewError>,
{
    pub fn new(name: &'static str, handler: F) -> Self {
        Self { name, handler }
    }
}

impl<F> Subscriber for FnSubscriber<F>
where
    F: FnMut(&ViewPatch) -> Result<(), ViewError>,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn on_change(&mut self, patch: &ViewPatch) -> Result<(), ViewError> {
        (self.handler)(patch)
    }
}

#[derive(Default)]
pub struct ChangeViewBus {
    subscribers: Vec<Box<dyn Subscriber>>,
    view_changed_relay: Relay<ViewPatch>,
}

impl ChangeViewBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, subscriber: impl Subscriber + 'static) {
        debug!("changeview: subscribed '{}'", subscriber.name());
        self.subscribers.push(Box::new(subscriber));
    }

    pub fn subscriber_names(&self) -> Vec<&'static str> {
        self.subscribers.iter().map(|subscriber| subscriber.name()).collect()
    }

    /// Stream of every patch broadcast from now on.
    pub fn observe(&mut self) -> UnboundedReceiver<ViewPatch> {
        self.view_changed_relay.observe()
    }

    /// Run every subscriber on `patch`, then notify observers.
    ///
    /// A failing subscriber is logged and skipped; the rest still run.
    /// Returns the number of subscribers that failed.
    pub fn broadcast(&mut self, patch: &ViewPatch) -> usize {
        let mut failures = 0;
        for subscriber in &mut self.subscribers {
            if let Err(error) = subscriber.on_change(patch) {
                warn!("changeview: subscriber '{}' failed: {}", subscriber.name(), error);
                failures += 1;
            }
        }
        self.view_changed_relay.send(patch.clone());
        failures
    }
}

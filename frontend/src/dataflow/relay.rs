//! Fan-out event relay
//!
//! A Relay hands every sent value to each of its observers through
//! unbounded channels. Observers are plain `UnboundedReceiver` streams, so
//! anything that can `.next().await` can follow broadcasts without the
//! sender knowing about it.

use futures::channel::mpsc::{UnboundedReceiver, UnboundedSender, unbounded};

/// Type-safe fan-out relay.
///
/// # Examples
///
/// ```rust
/// use futures::StreamExt;
/// use stats_view::dataflow::Relay;
///
/// let mut view_changed_relay = Relay::<String>::new();
/// let mut stream = view_changed_relay.observe();
///
/// view_changed_relay.send("downloads".to_string());
/// # futures::executor::block_on(async {
/// assert_eq!(stream.next().await.as_deref(), Some("downloads"));
/// # });
/// ```
#[derive(Debug)]
pub struct Relay<T>
where
    T: Clone + Send + Sync + 'static,
{
    observers: Vec<UnboundedSender<T>>,
}

impl<T> Relay<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self { observers: Vec::new() }
    }

    /// Register a new observer stream.
    pub fn observe(&mut self) -> UnboundedReceiver<T> {
        let (sender, receiver) = unbounded();
        self.observers.push(sender);
        receiver
    }

    /// Number of observers still listening (as of the last send).
    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Send a value to every observer.
    ///
    /// Observers whose receiver has been dropped are pruned. Returns how many
    /// observers received the value.
    pub fn send(&mut self, value: T) -> usize {
        self.observers
            .retain(|observer| observer.unbounded_send(value.clone()).is_ok());
        self.observers.len()
    }
}

impl<T> Default for Relay<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

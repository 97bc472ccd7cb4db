//! In-process event bus.

use std::collections::HashMap;
use std::fmt;
use std::sync::{PoisonError, RwLock};

use slash::{EventBus, EventName, Listener, ListenerOptions};

struct Registered<P> {
    listener: Listener<P>,
    once: bool,
}

/// Event bus that delivers payloads to listeners in registration order
pub struct LocalEventBus<P> {
    listeners: RwLock<HashMap<EventName, Vec<Registered<P>>>>,
}

impl<P> Default for LocalEventBus<P> {
    fn default() -> Self {
        Self {
            listeners: RwLock::new(HashMap::new()),
        }
    }
}

impl<P: Clone + Send + 'static> LocalEventBus<P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `payload` to every listener of `event`.
    ///
    /// `once` listeners are removed before delivery. Listener errors are
    /// logged and do not stop delivery to the others. Returns the number of
    /// listeners invoked.
    pub async fn emit(&self, event: EventName, payload: P) -> usize {
        let listeners: Vec<Listener<P>> = {
            let mut map = self.listeners.write().unwrap_or_else(PoisonError::into_inner);
            match map.get_mut(&event) {
                Some(entries) => {
                    let snapshot = entries.iter().map(|entry| entry.listener.clone()).collect();
                    entries.retain(|entry| !entry.once);
                    snapshot
                }
                None => Vec::new(),
            }
        };

        for listener in &listeners {
            if let Err(err) = listener(payload.clone()).await {
                let error = format!("{:#}", err);
                tracing::error!(event = %event, error = %error, "Event listener failed");
            }
        }

        tracing::trace!(event = %event, listeners = listeners.len(), "Event emitted");
        listeners.len()
    }

    /// Listeners currently registered for `event`
    pub fn listener_count(&self, event: EventName) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&event)
            .map_or(0, Vec::len)
    }
}

impl<P> EventBus<P> for LocalEventBus<P> {
    fn register(&self, event: EventName, listener: Listener<P>, options: ListenerOptions) {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(event)
            .or_default()
            .push(Registered {
                listener,
                once: options.once,
            });
    }
}

impl<P> fmt::Debug for LocalEventBus<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let listeners = self.listeners.read().unwrap_or_else(PoisonError::into_inner);
        let counts: HashMap<&str, usize> = listeners
            .iter()
            .map(|(event, entries)| (event.as_str(), entries.len()))
            .collect();
        f.debug_struct("LocalEventBus")
            .field("listeners", &counts)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slash::EventBinding;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting(counter: &Arc<AtomicUsize>, event: EventName, once: bool) -> EventBinding<u32> {
        let counter = counter.clone();
        EventBinding::from_fn(event, once, move |amount: u32| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(amount as usize, Ordering::SeqCst);
                Ok(())
            }
        })
    }

    fn register(bus: &LocalEventBus<u32>, binding: EventBinding<u32>) {
        let options = binding.options();
        bus.register(binding.event, binding.listener, options);
    }

    #[tokio::test]
    async fn test_once_listener_fires_once() {
        let bus = LocalEventBus::new();
        let counter = Arc::new(AtomicUsize::new(0));
        register(&bus, counting(&counter, EventName::Ready, true));
        register(&bus, counting(&counter, EventName::Ready, false));

        assert_eq!(bus.emit(EventName::Ready, 1).await, 2);
        assert_eq!(bus.emit(EventName::Ready, 1).await, 1);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
        assert_eq!(bus.listener_count(EventName::Ready), 1);
    }

    #[tokio::test]
    async fn test_failing_listener_does_not_stop_delivery() {
        let bus = LocalEventBus::new();
        let counter = Arc::new(AtomicUsize::new(0));
        register(
            &bus,
            EventBinding::from_fn(EventName::MessageCreate, false, |_: u32| async {
                Err(anyhow::anyhow!("listener broke"))
            }),
        );
        register(&bus, counting(&counter, EventName::MessageCreate, false));

        assert_eq!(bus.emit(EventName::MessageCreate, 5).await, 2);
        assert_eq!(counter.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_unbound_event_reaches_nobody() {
        let bus: LocalEventBus<u32> = LocalEventBus::new();
        assert_eq!(bus.emit(EventName::TypingStart, 1).await, 0);
    }
}

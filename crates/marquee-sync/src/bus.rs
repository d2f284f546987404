//! # Event Bus
//!
//! Synchronous fan-out of state deltas to the presentation layer.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Event Bus (one per stream)                      │
//! │                                                                         │
//! │   SyncEngine ──notify(payload)──► EventBus<E>                           │
//! │                                      │                                  │
//! │                                      ├──► listener 1 (source, payload)  │
//! │                                      ├──► listener 2 (source, payload)  │
//! │                                      └──► listener N (source, payload)  │
//! │                                                                         │
//! │   • Listeners run in registration order, on the notifying task.        │
//! │   • There is no unregistration.                                        │
//! │   • A panicking listener propagates to the notifier; the listeners     │
//! │     after it are not called.                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The listener list is snapshotted before dispatch, so a listener may
//! register further listeners without deadlocking. Those only see later
//! notifications.

use std::fmt;
use std::sync::{Arc, Mutex};

use uuid::Uuid;

/// The four independent event streams published by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stream {
    Reviews,
    Search,
    Catalog,
    Gatekeeper,
}

impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stream::Reviews => write!(f, "reviews"),
            Stream::Search => write!(f, "search"),
            Stream::Catalog => write!(f, "catalog"),
            Stream::Gatekeeper => write!(f, "gatekeeper"),
        }
    }
}

/// Identifies who published a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventSource {
    /// Instance id of the publishing engine.
    pub engine_id: Uuid,

    /// Stream the notification was published on.
    pub stream: Stream,
}

/// A registered listener.
pub type Listener<E> = Arc<dyn Fn(&EventSource, &E) + Send + Sync>;

/// Registry of listeners for one stream.
pub struct EventBus<E> {
    source: EventSource,
    listeners: Mutex<Vec<Listener<E>>>,
}

impl<E> EventBus<E> {
    pub fn new(source: EventSource) -> Self {
        EventBus {
            source,
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// Appends a listener.
    pub fn register<F>(&self, listener: F)
    where
        F: Fn(&EventSource, &E) + Send + Sync + 'static,
    {
        self.listeners
            .lock()
            .expect("Listener mutex poisoned")
            .push(Arc::new(listener));
    }

    /// Invokes every registered listener, in order, with the payload.
    pub fn notify(&self, payload: &E) {
        let snapshot: Vec<Listener<E>> = self
            .listeners
            .lock()
            .expect("Listener mutex poisoned")
            .clone();

        for listener in &snapshot {
            listener(&self.source, payload);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().expect("Listener mutex poisoned").len()
    }

    pub fn source(&self) -> EventSource {
        self.source
    }
}

impl<E> fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("source", &self.source)
            .field("listeners", &self.listener_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{catch_unwind, AssertUnwindSafe};

    fn bus() -> EventBus<String> {
        EventBus::new(EventSource {
            engine_id: Uuid::new_v4(),
            stream: Stream::Reviews,
        })
    }

    #[test]
    fn test_listeners_run_in_registration_order() {
        let bus = bus();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for tag in ["first", "second", "third"] {
            let seen = seen.clone();
            bus.register(move |_, payload: &String| {
                seen.lock().unwrap().push(format!("{}:{}", tag, payload));
            });
        }

        bus.notify(&"x".to_string());
        assert_eq!(
            *seen.lock().unwrap(),
            vec!["first:x", "second:x", "third:x"]
        );
    }

    #[test]
    fn test_listener_receives_source() {
        let bus = bus();
        let expected = bus.source();
        let seen = Arc::new(Mutex::new(None));

        let sink = seen.clone();
        bus.register(move |source, _| {
            *sink.lock().unwrap() = Some(*source);
        });

        bus.notify(&String::new());
        assert_eq!(*seen.lock().unwrap(), Some(expected));
    }

    #[test]
    fn test_notify_without_listeners() {
        let bus = bus();
        bus.notify(&"ignored".to_string());
        assert_eq!(bus.listener_count(), 0);
    }

    #[test]
    fn test_listener_may_register_during_notify() {
        let bus = Arc::new(bus());
        let calls = Arc::new(Mutex::new(0usize));

        let inner_bus = bus.clone();
        let inner_calls = calls.clone();
        bus.register(move |_, _| {
            let counter = inner_calls.clone();
            inner_bus.register(move |_, _| *counter.lock().unwrap() += 1);
        });

        // The listener added mid-dispatch is not part of this snapshot.
        bus.notify(&"one".to_string());
        assert_eq!(*calls.lock().unwrap(), 0);
        assert_eq!(bus.listener_count(), 2);

        bus.notify(&"two".to_string());
        assert_eq!(*calls.lock().unwrap(), 1);
    }

    #[test]
    fn test_nested_notify_completes_before_outer_resumes() {
        let bus = Arc::new(bus());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let nested = Arc::new(Mutex::new(false));

        let inner_bus = bus.clone();
        let first = seen.clone();
        bus.register(move |_, payload: &String| {
            first.lock().unwrap().push(format!("L1:{}", payload));
            let fire = !std::mem::replace(&mut *nested.lock().unwrap(), true);
            if fire {
                inner_bus.notify(&"inner".to_string());
            }
        });
        let second = seen.clone();
        bus.register(move |_, payload: &String| {
            second.lock().unwrap().push(format!("L2:{}", payload));
        });

        bus.notify(&"outer".to_string());
        assert_eq!(
            *seen.lock().unwrap(),
            vec!["L1:outer", "L1:inner", "L2:inner", "L2:outer"]
        );
    }

    #[test]
    fn test_panicking_listener_stops_dispatch() {
        let bus = bus();
        let later_called = Arc::new(Mutex::new(false));

        bus.register(|_, _| panic!("listener failure"));
        let flag = later_called.clone();
        bus.register(move |_, _| *flag.lock().unwrap() = true);

        let result = catch_unwind(AssertUnwindSafe(|| bus.notify(&"boom".to_string())));
        assert!(result.is_err());
        assert!(!*later_called.lock().unwrap());

        // The registry itself is still usable.
        assert_eq!(bus.listener_count(), 2);
    }
}

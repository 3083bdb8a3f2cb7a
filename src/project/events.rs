//! Change notifications from the [`ProjectIndexer`](super::ProjectIndexer).
//!
//! Listeners are plain callbacks registered with
//! [`subscribe`](super::ProjectIndexer::subscribe). Each registration returns
//! a [`Subscription`] handle; the listener stays registered until
//! [`Subscription::unsubscribe`] is called or the indexer is dropped.

use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use parking_lot::Mutex;
use smol_str::SmolStr;

use crate::hir::SemanticModel;
use crate::syntax::ParseError;

/// Something that changed in the index.
#[derive(Clone, Debug)]
pub enum IndexEvent {
    /// A new model was committed for `uri`.
    Indexed {
        uri: SmolStr,
        version: u64,
        model: Arc<SemanticModel>,
    },
    /// `uri` failed to parse. The previous model, if any, is still current.
    Failed {
        uri: SmolStr,
        version: u64,
        error: ParseError,
    },
    Removed { uri: SmolStr },
    Cleared,
}

impl IndexEvent {
    pub fn uri(&self) -> Option<&str> {
        match self {
            Self::Indexed { uri, .. } | Self::Failed { uri, .. } | Self::Removed { uri } => Some(uri),
            Self::Cleared => None,
        }
    }
}

type Listener = Arc<dyn Fn(&IndexEvent) + Send + Sync>;

#[derive(Default)]
pub(crate) struct Listeners {
    inner: Mutex<ListenerTable>,
}

#[derive(Default)]
struct ListenerTable {
    next_id: u64,
    entries: IndexMap<u64, Listener>,
}

impl Listeners {
    pub(crate) fn register(self: &Arc<Self>, listener: Listener) -> Subscription {
        let mut table = self.inner.lock();
        let id = table.next_id;
        table.next_id += 1;
        table.entries.insert(id, listener);
        Subscription {
            id,
            listeners: Arc::downgrade(self),
        }
    }

    fn remove(&self, id: u64) -> bool {
        self.inner.lock().entries.shift_remove(&id).is_some()
    }

    pub(crate) fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Deliver `events` in order to every listener.
    ///
    /// The table lock is released before any callback runs, so a listener
    /// may subscribe or unsubscribe without deadlocking.
    pub(crate) fn emit(&self, events: &[IndexEvent]) {
        if events.is_empty() {
            return;
        }
        let listeners: Vec<Listener> = self.inner.lock().entries.values().cloned().collect();
        for event in events {
            for listener in &listeners {
                listener(event);
            }
        }
    }
}

/// Handle returned by [`ProjectIndexer::subscribe`](super::ProjectIndexer::subscribe).
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    listeners: Weak<Listeners>,
}

impl Subscription {
    /// Stop receiving events. Returns `false` if the listener was already
    /// gone.
    pub fn unsubscribe(self) -> bool {
        self.listeners
            .upgrade()
            .is_some_and(|listeners| listeners.remove(self.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_emit_and_unsubscribe() {
        let listeners = Arc::new(Listeners::default());
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = seen.clone();
        let sub = listeners.register(Arc::new(move |_: &IndexEvent| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        listeners.emit(&[IndexEvent::Cleared, IndexEvent::Cleared]);
        assert_eq!(seen.load(Ordering::SeqCst), 2);

        assert!(sub.unsubscribe());
        listeners.emit(&[IndexEvent::Cleared]);
        assert_eq!(seen.load(Ordering::SeqCst), 2);
        assert_eq!(listeners.len(), 0);
    }

    #[test]
    fn test_unsubscribe_after_drop() {
        let listeners = Arc::new(Listeners::default());
        let sub = listeners.register(Arc::new(|_: &IndexEvent| {}));
        drop(listeners);
        assert!(!sub.unsubscribe());
    }

    #[test]
    fn test_event_uri() {
        let event = IndexEvent::Removed { uri: "file:///a.ts".into() };
        assert_eq!(event.uri(), Some("file:///a.ts"));
        assert_eq!(IndexEvent::Cleared.uri(), None);
    }
}

//! Explicit observer registration with tokens.
//!
//! [`Subscribers`] replaces ad-hoc event emitters: listeners are delivered
//! events in registration order and every registration returns a
//! [`Subscription`] that removes the listener when unsubscribed or dropped.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

type Listener<E> = Arc<dyn Fn(&E) + Send + Sync>;

struct Listeners<E: ?Sized> {
    next_id: u64,
    entries: Vec<(u64, Listener<E>)>,
}

struct Registry<E: ?Sized> {
    listeners: Mutex<Listeners<E>>,
}

impl<E: ?Sized> Registry<E> {
    fn lock(&self) -> MutexGuard<'_, Listeners<E>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

trait Detach: Send + Sync {
    fn detach(&self, id: u64);
}

impl<E: ?Sized + 'static> Detach for Registry<E> {
    fn detach(&self, id: u64) {
        self.lock().entries.retain(|(entry, _)| *entry != id);
    }
}

/// Ordered set of listeners for events of type `E`.
pub struct Subscribers<E: ?Sized> {
    registry: Arc<Registry<E>>,
}

impl<E: ?Sized + 'static> Subscribers<E> {
    /// Creates an empty listener set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Registry {
                listeners: Mutex::new(Listeners {
                    next_id: 0,
                    entries: Vec::new(),
                }),
            }),
        }
    }

    /// Registers `listener` and returns the token that removes it.
    #[must_use = "dropping the subscription removes the listener"]
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let mut listeners = self.registry.lock();
        let id = listeners.next_id;
        listeners.next_id += 1;
        listeners.entries.push((id, Arc::new(listener)));
        drop(listeners);

        let registry: Arc<dyn Detach> = Arc::clone(&self.registry) as Arc<dyn Detach>;
        Subscription {
            id,
            registry: Some(Arc::downgrade(&registry)),
        }
    }

    /// Delivers `event` to every listener in registration order.
    ///
    /// Listeners are snapshotted first, so a listener may subscribe or
    /// unsubscribe while the event is delivered; changes apply to the next
    /// emission.
    pub fn emit(&self, event: &E) {
        let snapshot: Vec<Listener<E>> = self
            .registry
            .lock()
            .entries
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in snapshot {
            listener(event);
        }
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.registry.lock().entries.len()
    }

    /// Returns `true` when no listener is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<E: ?Sized + 'static> Default for Subscribers<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: ?Sized> fmt::Debug for Subscribers<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.registry.lock().entries.len();
        f.debug_struct("Subscribers")
            .field("listeners", &count)
            .finish()
    }
}

/// Token returned by [`Subscribers::subscribe`].
///
/// The listener is removed by [`Subscription::unsubscribe`] or when the token
/// is dropped.
pub struct Subscription {
    id: u64,
    registry: Option<Weak<dyn Detach>>,
}

impl Subscription {
    /// Removes the listener.
    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(registry) = self.registry.take().and_then(|weak| weak.upgrade()) {
            registry.detach(self.id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.registry.is_some())
            .finish()
    }
}

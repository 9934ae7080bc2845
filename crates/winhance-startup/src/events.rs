//! Publish/subscribe channel used for theme and language change
//! notifications.
//!
//! Handlers are held by the channel until the [`Subscription`] returned from
//! [`EventChannel::subscribe`] is dropped or explicitly unsubscribed.

use std::sync::{
    Arc, RwLock, Weak,
    atomic::{AtomicU64, Ordering},
};

type Handler<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Subscribers<T> {
    next_id: AtomicU64,
    handlers: RwLock<Vec<(u64, Handler<T>)>>,
}

/// A multi-subscriber event channel carrying values of type `T`.
pub struct EventChannel<T> {
    inner: Arc<Subscribers<T>>,
}

impl<T> Clone for EventChannel<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> Default for EventChannel<T> {
    fn default() -> Self {
        Self {
            inner: Arc::new(Subscribers {
                next_id: AtomicU64::new(0),
                handlers: RwLock::new(Vec::new()),
            }),
        }
    }
}

impl<T: 'static> EventChannel<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` and returns the token that removes it again.
    pub fn subscribe(&self, handler: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut handlers) = self.inner.handlers.write() {
            handlers.push((id, Arc::new(handler)));
        }

        let weak: Weak<Subscribers<T>> = Arc::downgrade(&self.inner);
        Subscription {
            unsubscribe: Some(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    if let Ok(mut handlers) = inner.handlers.write() {
                        handlers.retain(|(handler_id, _)| *handler_id != id);
                    }
                }
            })),
        }
    }

    /// Delivers `value` to every current subscriber. Handlers run on the
    /// publishing thread, outside the subscriber lock.
    pub fn publish(&self, value: &T) {
        let handlers: Vec<Handler<T>> = match self.inner.handlers.read() {
            Ok(handlers) => handlers.iter().map(|(_, handler)| handler.clone()).collect(),
            Err(_) => return,
        };
        for handler in handlers {
            handler(value);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner
            .handlers
            .read()
            .map(|handlers| handlers.len())
            .unwrap_or(0)
    }
}

/// Unsubscribe token. Dropping it removes the handler.
#[must_use = "dropping a subscription immediately unsubscribes the handler"]
pub struct Subscription {
    unsubscribe: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub fn unsubscribe(mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("Subscription")
            .field("active", &self.unsubscribe.is_some())
            .finish()
    }
}

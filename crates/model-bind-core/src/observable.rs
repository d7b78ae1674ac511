//! Single-threaded observable values with RAII subscriptions.
//!
//! An [`Observable`] is the consumer-side trigger cell: writing a value that
//! compares equal to the current one is a no-op, anything else bumps the
//! version and notifies subscribers in registration order.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

pub struct Observable<T> {
    inner: Rc<RefCell<Inner<T>>>,
}

struct Inner<T> {
    value: T,
    version: u64,
    next_id: u64,
    subscribers: Vec<Entry<T>>,
}

struct Entry<T> {
    id: u64,
    callback: Weak<dyn Fn(&T)>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Observable {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Clone + PartialEq + 'static> Observable<T> {
    pub fn new(value: T) -> Self {
        Observable {
            inner: Rc::new(RefCell::new(Inner {
                value,
                version: 0,
                next_id: 1,
                subscribers: Vec::new(),
            })),
        }
    }

    /// Clone of the current value.
    pub fn get(&self) -> T {
        self.inner.borrow().value.clone()
    }

    /// Borrows the current value without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.borrow().value)
    }

    /// Counts real changes. Stable across equal-value writes.
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    /// Replaces the value and notifies subscribers, unless the new value
    /// compares equal to the current one.
    pub fn set(&self, value: T) {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.value == value {
                return;
            }
            inner.value = value;
            inner.version = inner.version.saturating_add(1);
        }
        self.notify();
    }

    /// Registers `callback` for every subsequent real change. The callback
    /// lives exactly as long as the returned [`Subscription`].
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        let callback: Rc<dyn Fn(&T)> = Rc::new(callback);
        let id = {
            let mut inner = self.inner.borrow_mut();
            let id = inner.next_id;
            inner.next_id = inner.next_id.saturating_add(1);
            inner.subscribers.push(Entry {
                id,
                callback: Rc::downgrade(&callback),
            });
            id
        };
        let weak_inner = Rc::downgrade(&self.inner);
        Subscription {
            detach: Some(Box::new(move || {
                drop(callback);
                if let Some(inner) = weak_inner.upgrade() {
                    inner.borrow_mut().subscribers.retain(|entry| entry.id != id);
                }
            })),
        }
    }

    /// Live subscriber count.
    pub fn subscriber_count(&self) -> usize {
        self.inner
            .borrow()
            .subscribers
            .iter()
            .filter(|entry| entry.callback.strong_count() > 0)
            .count()
    }

    fn notify(&self) {
        // Snapshot under the borrow, run callbacks after releasing it, so a
        // callback may freely read or write this observable.
        let (snapshot, callbacks) = {
            let mut inner = self.inner.borrow_mut();
            inner
                .subscribers
                .retain(|entry| entry.callback.strong_count() > 0);
            let callbacks: Vec<Rc<dyn Fn(&T)>> = inner
                .subscribers
                .iter()
                .filter_map(|entry| entry.callback.upgrade())
                .collect();
            (inner.value.clone(), callbacks)
        };
        for callback in callbacks {
            callback(&snapshot);
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Observable")
            .field("value", &inner.value)
            .field("version", &inner.version)
            .finish()
    }
}

/// Keeps one subscriber callback alive; dropping it detaches the callback.
pub struct Subscription {
    detach: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Detaches immediately. Equivalent to dropping the subscription.
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish()
    }
}

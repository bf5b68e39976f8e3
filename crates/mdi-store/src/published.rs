#![forbid(unsafe_code)]

//! Published snapshots of store state.
//!
//! # Design
//!
//! [`Published<T>`] holds the last value a store handed to its renderers,
//! in shared reference-counted storage (`Rc<RefCell<..>>`). A store publishes
//! by passing its current revision along with the value; if the revision
//! has not moved since the last publish, nothing happens. Otherwise the
//! version is bumped and live subscribers are notified in registration
//! order.
//!
//! Comparing revisions instead of values keeps `T` free of a `PartialEq`
//! bound, so tab payloads do not need to be comparable.
//!
//! # Invariants
//!
//! 1. `version` increments by exactly 1 per accepted publish.
//! 2. A publish with an already-seen revision is a no-op.
//! 3. Subscribers are notified in registration order.
//! 4. Dropping a [`Subscription`] stops further notifications; the dead
//!    entry is pruned lazily on the next publish.
//!
//! # Failure Modes
//!
//! - **Re-entrant access**: the borrow is released before callbacks run, so
//!   a callback may read the value or trigger a nested publish. Subscribers
//!   of the nested publish run before the outer notification loop resumes.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

type CallbackRc<T> = Rc<dyn Fn(&T)>;
type CallbackWeak<T> = Weak<dyn Fn(&T)>;

struct PublishedInner<T> {
    value: Rc<T>,
    version: u64,
    revision: u64,
    subscribers: Vec<CallbackWeak<T>>,
}

/// Last published value of a store, with change notification.
///
/// Cloning creates a new handle to the same value and subscribers.
pub struct Published<T> {
    inner: Rc<RefCell<PublishedInner<T>>>,
}

impl<T> Clone for Published<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Published<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Published")
            .field("value", &inner.value)
            .field("version", &inner.version)
            .field("revision", &inner.revision)
            .field("subscriber_count", &inner.subscribers.len())
            .finish()
    }
}

impl<T: 'static> Published<T> {
    /// Start at `value`, published for `revision`, version 0.
    #[must_use]
    pub fn new(value: T, revision: u64) -> Self {
        Self {
            inner: Rc::new(RefCell::new(PublishedInner {
                value: Rc::new(value),
                version: 0,
                revision,
                subscribers: Vec::new(),
            })),
        }
    }

    /// Shared pointer to the current value.
    #[must_use]
    pub fn get(&self) -> Rc<T> {
        Rc::clone(&self.inner.borrow().value)
    }

    /// Access the current value by reference.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let value = self.get();
        f(&value)
    }

    /// Number of accepted publishes.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    /// Store revision the current value was taken at.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.inner.borrow().revision
    }

    /// Registered subscribers, including dead ones not yet pruned.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().subscribers.len()
    }

    /// Call `callback` with every newly published value.
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        let strong: CallbackRc<T> = Rc::new(callback);
        self.inner
            .borrow_mut()
            .subscribers
            .push(Rc::downgrade(&strong));
        Subscription {
            _guard: Box::new(strong),
        }
    }

    /// Publish `value` taken at `revision`. Returns `false` when the
    /// revision was already published.
    pub(crate) fn publish(&self, revision: u64, value: impl FnOnce() -> T) -> bool {
        let (value, callbacks) = {
            let mut inner = self.inner.borrow_mut();
            if inner.revision == revision {
                return false;
            }
            inner.value = Rc::new(value());
            inner.revision = revision;
            inner.version += 1;
            inner.subscribers.retain(|w| w.strong_count() > 0);
            let callbacks: Vec<CallbackRc<T>> =
                inner.subscribers.iter().filter_map(Weak::upgrade).collect();
            (Rc::clone(&inner.value), callbacks)
        };
        for cb in &callbacks {
            cb(&value);
        }
        true
    }
}

/// RAII guard for a [`Published`] subscriber. Dropping it unsubscribes.
pub struct Subscription {
    _guard: Box<dyn Any>,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

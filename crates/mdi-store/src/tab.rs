#![forbid(unsafe_code)]

//! Tabs and the observer lists attached to them.
//!
//! A [`Tab`] is the serializable part: a key and an opaque payload. The
//! callbacks a caller attaches when opening a tab travel in a
//! [`TabObservable`] and are split off into the observer side-table on
//! open; they never become part of [`TabState`](crate::TabState).

use std::fmt;
use std::rc::Rc;

use crate::key::TabKey;

/// Callback fired with the new payload after a tab is updated.
pub type UpdateCallback<T> = Rc<dyn Fn(&T)>;

/// Callback fired with the final payload when a tab is closed. The flag is
/// the `remove` argument given to `close_tab`.
pub type CloseCallback<T> = Rc<dyn Fn(&T, bool)>;

/// A single open document.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "state-persistence",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct Tab<T> {
    pub key: TabKey,
    pub data: T,
}

impl<T> Tab<T> {
    #[must_use]
    pub fn new(key: impl Into<TabKey>, data: T) -> Self {
        Self {
            key: key.into(),
            data,
        }
    }
}

/// Update and close callbacks registered for one key.
///
/// Lists only grow by concatenation; callbacks fire in registration order.
pub struct Observers<T> {
    pub(crate) on_update: Vec<UpdateCallback<T>>,
    pub(crate) on_close: Vec<CloseCallback<T>>,
}

impl<T> Default for Observers<T> {
    fn default() -> Self {
        Self {
            on_update: Vec::new(),
            on_close: Vec::new(),
        }
    }
}

impl<T> fmt::Debug for Observers<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observers")
            .field("on_update", &self.on_update.len())
            .field("on_close", &self.on_close.len())
            .finish()
    }
}

impl<T> Observers<T> {
    /// Append `other`'s callbacks after ours.
    pub(crate) fn merge(&mut self, other: Observers<T>) {
        self.on_update.extend(other.on_update);
        self.on_close.extend(other.on_close);
    }

    #[must_use]
    pub fn counts(&self) -> ObserverCounts {
        ObserverCounts {
            on_update: self.on_update.len(),
            on_close: self.on_close.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.on_update.is_empty() && self.on_close.is_empty()
    }
}

/// Number of callbacks registered for a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ObserverCounts {
    pub on_update: usize,
    pub on_close: usize,
}

/// A tab to open, together with the observers to attach to it.
///
/// ```ignore
/// let item = TabObservable::new("item/1", session)
///     .on_update(|s: &Session| refresh_title(s))
///     .on_close(|s: &Session, removed| if removed { purge(s) });
/// store.open_tab(item)?;
/// ```
pub struct TabObservable<T> {
    key: TabKey,
    data: T,
    observers: Observers<T>,
}

impl<T> TabObservable<T> {
    #[must_use]
    pub fn new(key: impl Into<TabKey>, data: T) -> Self {
        Self {
            key: key.into(),
            data,
            observers: Observers::default(),
        }
    }

    /// Register a callback for updates to this tab.
    #[must_use]
    pub fn on_update(mut self, callback: impl Fn(&T) + 'static) -> Self {
        self.observers.on_update.push(Rc::new(callback));
        self
    }

    /// Register a callback for the close of this tab.
    #[must_use]
    pub fn on_close(mut self, callback: impl Fn(&T, bool) + 'static) -> Self {
        self.observers.on_close.push(Rc::new(callback));
        self
    }

    #[must_use]
    pub fn key(&self) -> &TabKey {
        &self.key
    }

    #[must_use]
    pub fn data(&self) -> &T {
        &self.data
    }

    #[must_use]
    pub fn observer_counts(&self) -> ObserverCounts {
        self.observers.counts()
    }

    pub(crate) fn into_parts(self) -> (TabKey, T, Observers<T>) {
        (self.key, self.data, self.observers)
    }
}

impl<T: fmt::Debug> fmt::Debug for TabObservable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TabObservable")
            .field("key", &self.key)
            .field("data", &self.data)
            .field("observers", &self.observers)
            .finish()
    }
}

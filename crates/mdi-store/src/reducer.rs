#![forbid(unsafe_code)]

//! Pure transition logic shared by every strategy.
//!
//! [`apply`] takes one [`TabAction`], checks it against the current state,
//! then mutates the state and the observer side-table together. It returns
//! the observer notification the transition produced; firing it is left to
//! the caller, after every borrow on state and registry has been released,
//! so callbacks are free to call back into the store.
//!
//! # Invariants
//!
//! - All-or-nothing: an action that fails leaves state and registry exactly
//!   as they were. Every check happens before the first mutation.
//! - State keys and registry keys are the same set after every action.
//! - At most one notification per action; callbacks are captured in
//!   registration order.

use std::fmt;

use crate::error::{Result, TabError};
use crate::key::TabKey;
use crate::registry::ObserverRegistry;
use crate::state::TabState;
use crate::tab::{CloseCallback, Observers, Tab, TabObservable, UpdateCallback};

/// One intent against the tab store.
pub enum TabAction<T> {
    SetActive(TabKey),
    Open(TabObservable<T>),
    Update {
        key: TabKey,
        data: T,
        new_key: Option<TabKey>,
    },
    UpdateActive {
        data: T,
        new_key: Option<TabKey>,
    },
    Close {
        key: TabKey,
        remove: bool,
    },
    CloseActive {
        remove: bool,
    },
    Reset,
    Restore(TabState<T>),
}

impl<T> TabAction<T> {
    /// Stable name used in log events.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::SetActive(_) => "set_active",
            Self::Open(_) => "open",
            Self::Update { .. } => "update",
            Self::UpdateActive { .. } => "update_active",
            Self::Close { .. } => "close",
            Self::CloseActive { .. } => "close_active",
            Self::Reset => "reset",
            Self::Restore(_) => "restore",
        }
    }
}

impl<T> fmt::Debug for TabAction<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SetActive(key) => f.debug_tuple("SetActive").field(key).finish(),
            Self::Open(item) => f.debug_tuple("Open").field(item.key()).finish(),
            Self::Update { key, new_key, .. } => f
                .debug_struct("Update")
                .field("key", key)
                .field("new_key", new_key)
                .finish_non_exhaustive(),
            Self::UpdateActive { new_key, .. } => f
                .debug_struct("UpdateActive")
                .field("new_key", new_key)
                .finish_non_exhaustive(),
            Self::Close { key, remove } => f
                .debug_struct("Close")
                .field("key", key)
                .field("remove", remove)
                .finish(),
            Self::CloseActive { remove } => f
                .debug_struct("CloseActive")
                .field("remove", remove)
                .finish(),
            Self::Reset => f.write_str("Reset"),
            Self::Restore(state) => f.debug_tuple("Restore").field(&state.len()).finish(),
        }
    }
}

/// Observer calls owed by a completed transition.
pub(crate) enum Notification<T> {
    Updated {
        data: T,
        callbacks: Vec<UpdateCallback<T>>,
    },
    Closed {
        data: T,
        removed: bool,
        callbacks: Vec<CloseCallback<T>>,
    },
}

impl<T> Notification<T> {
    /// Run the callbacks in registration order.
    pub(crate) fn fire(self) {
        match self {
            Self::Updated { data, callbacks } => {
                for cb in &callbacks {
                    cb(&data);
                }
            }
            Self::Closed {
                data,
                removed,
                callbacks,
            } => {
                for cb in &callbacks {
                    cb(&data, removed);
                }
            }
        }
    }
}

/// Apply `action` to `state` and `registry`.
///
/// # Errors
///
/// - [`TabError::InvalidKey`] for `SetActive` on a key that is not open.
/// - [`TabError::NotFound`] for `Update` on a missing key, or `UpdateActive`
///   whose active key does not resolve.
/// - [`TabError::KeyConflict`] when a rename targets another open tab.
/// - [`TabError::CorruptSnapshot`] when `Restore` gets an invalid state.
pub(crate) fn apply<T: Clone>(
    state: &mut TabState<T>,
    registry: &mut ObserverRegistry<T>,
    action: TabAction<T>,
) -> Result<Option<Notification<T>>> {
    match action {
        TabAction::SetActive(key) => {
            set_active(state, key)?;
            Ok(None)
        }
        TabAction::Open(item) => {
            open(state, registry, item);
            Ok(None)
        }
        TabAction::Update { key, data, new_key } => {
            update(state, registry, key, data, new_key).map(Some)
        }
        TabAction::UpdateActive { data, new_key } => {
            let Some(key) = state.active_key.clone() else {
                tracing::debug!(message = "tabs.update.skipped", reason = "no_active_tab");
                return Ok(None);
            };
            update(state, registry, key, data, new_key).map(Some)
        }
        TabAction::Close { key, remove } => Ok(close(state, registry, &key, remove)),
        TabAction::CloseActive { remove } => {
            let Some(key) = state.active_key.clone() else {
                tracing::debug!(message = "tabs.close.skipped", reason = "no_active_tab");
                return Ok(None);
            };
            Ok(close(state, registry, &key, remove))
        }
        TabAction::Reset => {
            let dropped = state.len();
            state.clear();
            registry.clear();
            tracing::debug!(message = "tabs.reset", dropped);
            Ok(None)
        }
        TabAction::Restore(snapshot) => {
            snapshot.validate()?;
            registry.clear();
            for key in snapshot.keys() {
                registry.register(key.clone(), Observers::default());
            }
            tracing::debug!(
                message = "tabs.restore",
                count = snapshot.len(),
                active = snapshot.active_key().map(TabKey::as_str)
            );
            *state = snapshot;
            Ok(None)
        }
    }
}

fn set_active<T>(state: &mut TabState<T>, key: TabKey) -> Result<()> {
    if !state.contains(&key) {
        return Err(TabError::InvalidKey { key });
    }
    let from = state.active_key.replace(key);
    tracing::debug!(
        message = "tabs.switch",
        from = from.as_deref(),
        to = state.active_key.as_deref()
    );
    Ok(())
}

fn open<T>(state: &mut TabState<T>, registry: &mut ObserverRegistry<T>, item: TabObservable<T>) {
    let (key, data, observers) = item.into_parts();
    let existed = state.contains(&key);
    if !existed {
        state.items.push(Tab {
            key: key.clone(),
            data,
        });
    }
    let counts = observers.counts();
    registry.register(key.clone(), observers);
    tracing::debug!(
        message = "tabs.open",
        key = key.as_str(),
        existed,
        on_update = counts.on_update,
        on_close = counts.on_close
    );
    state.active_key = Some(key);
}

fn update<T: Clone>(
    state: &mut TabState<T>,
    registry: &mut ObserverRegistry<T>,
    key: TabKey,
    data: T,
    new_key: Option<TabKey>,
) -> Result<Notification<T>> {
    let Some(index) = state.position(&key) else {
        return Err(TabError::NotFound { key });
    };
    let rename = match new_key {
        Some(to) if to != key => {
            if state.contains(&to) {
                return Err(TabError::KeyConflict { from: key, to });
            }
            Some(to)
        }
        _ => None,
    };

    // Captured before the rename: the callbacks registered under `key`.
    let callbacks = registry.update_callbacks(&key);
    state.items[index].data = data.clone();

    if let Some(to) = rename {
        state.items[index].key = to.clone();
        if state.is_active(&key) {
            state.active_key = Some(to.clone());
        }
        registry.rename(&key, to.clone());
        tracing::debug!(message = "tabs.rename", from = key.as_str(), to = to.as_str());
    }
    tracing::debug!(
        message = "tabs.update",
        key = state.items[index].key.as_str(),
        observers = callbacks.len()
    );
    Ok(Notification::Updated { data, callbacks })
}

fn close<T>(
    state: &mut TabState<T>,
    registry: &mut ObserverRegistry<T>,
    key: &str,
    remove: bool,
) -> Option<Notification<T>> {
    let Some(index) = state.position(key) else {
        tracing::debug!(message = "tabs.close.skipped", key, reason = "not_open");
        return None;
    };
    let tab = state.items.remove(index);
    if state.is_active(key) {
        // Always the last remaining tab, not the neighbour of the closed one.
        state.active_key = state.items.last().map(|t| t.key.clone());
    }
    let callbacks = registry.take_close_callbacks(key);
    tracing::debug!(
        message = "tabs.close",
        key,
        remove,
        next_active = state.active_key.as_deref(),
        observers = callbacks.len()
    );
    Some(Notification::Closed {
        data: tab.data,
        removed: remove,
        callbacks,
    })
}

#![forbid(unsafe_code)]

//! The tab store handle handed to UI collaborators.
//!
//! [`TabStore<T, S>`] is a cheap, cloneable handle: every clone reaches the
//! same state, the same observer side-table and the same strategy. Menu
//! code, entity editors and the tab bar each hold a clone and talk to it
//! through the operations below (or through [`TabContext`] when they should
//! not care about the strategy).
//!
//! # Invariants
//!
//! 1. Keys in `items()` are unique and `active_key()` is one of them.
//! 2. Reopening an open key never replaces its data.
//! 3. Closing the active tab activates the last remaining tab.
//! 4. Observers of a tab fire after the transition that concerns them,
//!    in registration order; close observers fire exactly once.
//! 5. After `reset()` no previously registered observer ever fires.
//!
//! # Example
//!
//! ```ignore
//! let store = LocalTabStore::<Session>::new();
//! let key = EntityRef::new("item", "1").tab_key();
//! if !store.contains(&key) {
//!     store.open_tab(TabObservable::new(key.clone(), Session::load(..)))?;
//! }
//! store.update_active_tab(saved, Some(EntityRef::new("item", "2").tab_key()))?;
//! store.close_active_tab(false)?;
//! ```

use std::fmt;
use std::rc::Rc;

use crate::config::TabStoreConfig;
use crate::engine::StoreCore;
use crate::error::Result;
use crate::key::TabKey;
use crate::published::Published;
use crate::reducer::TabAction;
use crate::state::TabState;
use crate::strategy::{Dispatch, Local, TabStrategy};
use crate::tab::{ObserverCounts, Tab, TabObservable};

/// Store backed by synchronous local mutation.
pub type LocalTabStore<T> = TabStore<T, Local>;

/// Store backed by queued dispatch through a serial reducer.
pub type DispatchTabStore<T> = TabStore<T, Dispatch<T>>;

struct StoreInner<T, S> {
    core: StoreCore<T>,
    strategy: S,
}

/// Shared handle to an MDI tab store.
pub struct TabStore<T, S = Local> {
    inner: Rc<StoreInner<T, S>>,
}

impl<T, S> Clone for TabStore<T, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug + Clone + 'static, S: TabStrategy<T> + fmt::Debug> fmt::Debug
    for TabStore<T, S>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.core.state();
        f.debug_struct("TabStore")
            .field("label", &self.inner.core.config().label)
            .field("strategy", &self.inner.strategy)
            .field("revision", &self.inner.core.revision())
            .field("state", &*state)
            .finish()
    }
}

impl<T: Clone + 'static, S: TabStrategy<T>> Default for TabStore<T, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + 'static, S: TabStrategy<T>> TabStore<T, S> {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(TabStoreConfig::default())
    }

    #[must_use]
    pub fn with_config(config: TabStoreConfig) -> Self {
        let strategy = S::from_config(&config);
        tracing::debug!(
            message = "tabs.store.created",
            store = config.label.as_str(),
            strategy = S::NAME
        );
        Self {
            inner: Rc::new(StoreInner {
                core: StoreCore::new(config),
                strategy,
            }),
        }
    }

    fn submit(&self, action: TabAction<T>) -> Result<()> {
        self.inner.strategy.submit(&self.inner.core, action)
    }

    // ── Operations ──────────────────────────────────────────────────────

    /// Focus an open tab.
    ///
    /// # Errors
    ///
    /// [`TabError::InvalidKey`](crate::TabError::InvalidKey) if `key` is not open.
    pub fn set_active_key(&self, key: impl Into<TabKey>) -> Result<()> {
        self.submit(TabAction::SetActive(key.into()))
    }

    /// Open `item` (or focus it if already open, merging its observers).
    ///
    /// # Errors
    ///
    /// Only the dispatch strategy fails here, on queue overflow.
    pub fn open_tab(&self, item: TabObservable<T>) -> Result<()> {
        self.submit(TabAction::Open(item))
    }

    /// Replace the data of `key`, optionally renaming it in place.
    ///
    /// # Errors
    ///
    /// [`TabError::NotFound`](crate::TabError::NotFound) if `key` is not
    /// open; [`TabError::KeyConflict`](crate::TabError::KeyConflict) if
    /// `new_key` belongs to another open tab.
    pub fn update_tab(
        &self,
        key: impl Into<TabKey>,
        data: T,
        new_key: Option<TabKey>,
    ) -> Result<()> {
        self.submit(TabAction::Update {
            key: key.into(),
            data,
            new_key,
        })
    }

    /// [`update_tab`](Self::update_tab) on the active tab. No-op when no
    /// tab is active.
    ///
    /// # Errors
    ///
    /// As for `update_tab`.
    pub fn update_active_tab(&self, data: T, new_key: Option<TabKey>) -> Result<()> {
        self.submit(TabAction::UpdateActive { data, new_key })
    }

    /// Close `key`. No-op if it is not open.
    ///
    /// # Errors
    ///
    /// Only the dispatch strategy fails here, on queue overflow.
    pub fn close_tab(&self, key: impl Into<TabKey>, remove: bool) -> Result<()> {
        self.submit(TabAction::Close {
            key: key.into(),
            remove,
        })
    }

    /// Close the active tab. No-op when no tab is active.
    ///
    /// # Errors
    ///
    /// Only the dispatch strategy fails here, on queue overflow.
    pub fn close_active_tab(&self, remove: bool) -> Result<()> {
        self.submit(TabAction::CloseActive { remove })
    }

    /// Drop every tab and every observer (session teardown). No close
    /// observer fires.
    ///
    /// # Errors
    ///
    /// Only the dispatch strategy fails here, on queue overflow.
    pub fn reset(&self) -> Result<()> {
        self.submit(TabAction::Reset)
    }

    /// Replace the whole state with `snapshot`. Observers are cleared; the
    /// snapshot never carries any.
    ///
    /// # Errors
    ///
    /// [`TabError::CorruptSnapshot`](crate::TabError::CorruptSnapshot) if the
    /// snapshot breaks the state invariants.
    pub fn restore(&self, snapshot: TabState<T>) -> Result<()> {
        self.submit(TabAction::Restore(snapshot))
    }

    // ── Reads ───────────────────────────────────────────────────────────

    #[must_use]
    pub fn items(&self) -> Vec<Tab<T>> {
        self.inner.core.state().to_items()
    }

    #[must_use]
    pub fn active_key(&self) -> Option<TabKey> {
        self.inner.core.state().active_key().cloned()
    }

    #[must_use]
    pub fn active_tab(&self) -> Option<Tab<T>> {
        self.inner.core.state().active_tab().cloned()
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<Tab<T>> {
        self.inner.core.state().get(key).cloned()
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.inner.core.state().contains(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.core.state().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.core.state().is_empty()
    }

    /// Copy of the canonical state.
    #[must_use]
    pub fn snapshot(&self) -> TabState<T> {
        self.inner.core.state().clone()
    }

    /// Callbacks registered for `key`, if the key is open.
    #[must_use]
    pub fn observer_counts(&self, key: &str) -> Option<ObserverCounts> {
        self.inner.core.observer_counts(key)
    }

    /// Number of intents applied since creation.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.inner.core.revision()
    }

    #[must_use]
    pub fn config(&self) -> &TabStoreConfig {
        self.inner.core.config()
    }

    #[must_use]
    pub fn strategy(&self) -> &S {
        &self.inner.strategy
    }

    // ── Publishing ──────────────────────────────────────────────────────

    /// The snapshot renderers read. Lags the canonical state under the
    /// dispatch strategy until the next publish tick.
    #[must_use]
    pub fn published(&self) -> Published<TabState<T>> {
        self.inner.core.published().clone()
    }

    /// Publish tick: copy the canonical state to [`published`](Self::published)
    /// if it changed. Returns whether a new snapshot went out.
    pub fn publish(&self) -> bool {
        self.inner.core.publish()
    }
}

impl<T: Clone + 'static> TabStore<T, Dispatch<T>> {
    /// Errors of intents that were queued by observers and applied later.
    pub fn take_deferred_errors(&self) -> Vec<crate::TabError> {
        self.inner.strategy.take_deferred_errors()
    }
}

/// Strategy-independent view of a tab store for UI collaborators.
pub trait TabContext<T> {
    fn items(&self) -> Vec<Tab<T>>;
    fn active_key(&self) -> Option<TabKey>;
    fn set_active_key(&self, key: &str) -> Result<()>;
    fn open_tab(&self, item: TabObservable<T>) -> Result<()>;
    fn update_tab(&self, key: &str, data: T, new_key: Option<TabKey>) -> Result<()>;
    fn update_active_tab(&self, data: T, new_key: Option<TabKey>) -> Result<()>;
    fn close_tab(&self, key: &str, remove: bool) -> Result<()>;
    fn close_active_tab(&self, remove: bool) -> Result<()>;
    fn reset(&self) -> Result<()>;
}

impl<T: Clone + 'static, S: TabStrategy<T>> TabContext<T> for TabStore<T, S> {
    fn items(&self) -> Vec<Tab<T>> {
        TabStore::items(self)
    }

    fn active_key(&self) -> Option<TabKey> {
        TabStore::active_key(self)
    }

    fn set_active_key(&self, key: &str) -> Result<()> {
        TabStore::set_active_key(self, key)
    }

    fn open_tab(&self, item: TabObservable<T>) -> Result<()> {
        TabStore::open_tab(self, item)
    }

    fn update_tab(&self, key: &str, data: T, new_key: Option<TabKey>) -> Result<()> {
        TabStore::update_tab(self, key, data, new_key)
    }

    fn update_active_tab(&self, data: T, new_key: Option<TabKey>) -> Result<()> {
        TabStore::update_active_tab(self, data, new_key)
    }

    fn close_tab(&self, key: &str, remove: bool) -> Result<()> {
        TabStore::close_tab(self, key, remove)
    }

    fn close_active_tab(&self, remove: bool) -> Result<()> {
        TabStore::close_active_tab(self, remove)
    }

    fn reset(&self) -> Result<()> {
        TabStore::reset(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TabError;
    use std::cell::RefCell;

    #[derive(Debug, Clone, PartialEq)]
    struct Doc {
        n: u32,
    }

    fn doc(n: u32) -> Doc {
        Doc { n }
    }

    fn keys<S: TabStrategy<Doc>>(store: &TabStore<Doc, S>) -> Vec<String> {
        store
            .items()
            .into_iter()
            .map(|t| t.key.into_string())
            .collect()
    }

    #[test]
    fn clones_share_state() {
        let a = LocalTabStore::<Doc>::new();
        let b = a.clone();
        a.open_tab(TabObservable::new("x", doc(1))).unwrap();
        assert!(b.contains("x"));
        assert_eq!(b.active_key().as_deref(), Some("x"));
    }

    #[test]
    fn reopen_scenario_keeps_first_data() {
        let store = LocalTabStore::<Doc>::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        store
            .open_tab(TabObservable::new("x", doc(1)).on_update(move |d| s.borrow_mut().push(d.n)))
            .unwrap();
        store.open_tab(TabObservable::new("x", doc(99))).unwrap();
        assert_eq!(store.get("x").map(|t| t.data.n), Some(1));
        assert_eq!(store.active_key().as_deref(), Some("x"));
        assert_eq!(
            store.observer_counts("x"),
            Some(ObserverCounts {
                on_update: 1,
                on_close: 0
            })
        );
    }

    #[test]
    fn close_scenario_activates_remaining() {
        let store = LocalTabStore::<Doc>::new();
        store.open_tab(TabObservable::new("item/1", doc(1))).unwrap();
        store.open_tab(TabObservable::new("item/2", doc(2))).unwrap();
        store.set_active_key("item/1").unwrap();
        store.close_tab("item/1", false).unwrap();
        assert_eq!(keys(&store), vec!["item/2"]);
        assert_eq!(store.active_key().as_deref(), Some("item/2"));
    }

    #[test]
    fn local_published_tracks_every_change() {
        let store = LocalTabStore::<Doc>::new();
        store.open_tab(TabObservable::new("a", doc(1))).unwrap();
        assert_eq!(store.published().get().len(), 1);
        assert!(!store.publish());
    }

    #[test]
    fn dispatch_published_lags_until_publish() {
        let store = DispatchTabStore::<Doc>::new();
        store.open_tab(TabObservable::new("a", doc(1))).unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.published().get().is_empty());
        assert!(store.publish());
        assert_eq!(store.published().get().len(), 1);
    }

    #[test]
    fn dispatch_auto_publish_after_drain() {
        let store =
            DispatchTabStore::<Doc>::with_config(TabStoreConfig::new().auto_publish(true));
        store.open_tab(TabObservable::new("a", doc(1))).unwrap();
        assert_eq!(store.published().get().len(), 1);
    }

    #[test]
    fn context_trait_is_object_safe() {
        let store = LocalTabStore::<Doc>::new();
        let ctx: &dyn TabContext<Doc> = &store;
        ctx.open_tab(TabObservable::new("a", doc(1))).unwrap();
        ctx.update_active_tab(doc(2), None).unwrap();
        assert_eq!(ctx.items()[0].data, doc(2));
        let err = ctx.set_active_key("nope").unwrap_err();
        assert!(matches!(err, TabError::InvalidKey { .. }));
    }

    #[test]
    fn revision_counts_applied_intents_only() {
        let store = LocalTabStore::<Doc>::new();
        store.open_tab(TabObservable::new("a", doc(1))).unwrap();
        let _ = store.set_active_key("missing");
        assert_eq!(store.revision(), 1);
    }

    #[test]
    fn debug_output_names_strategy() {
        let store = DispatchTabStore::<Doc>::with_config(TabStoreConfig::new().label("editors"));
        let dbg = format!("{store:?}");
        assert!(dbg.contains("editors"));
        assert!(dbg.contains("Dispatch"));
    }
}

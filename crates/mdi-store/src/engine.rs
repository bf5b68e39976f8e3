#![forbid(unsafe_code)]

//! Canonical state, side-table and publish point shared by every strategy.
//!
//! [`StoreCore::apply_now`] is the only path from an intent to a state
//! change: it borrows state and registry, runs the reducer, releases both
//! borrows, then fires the resulting observer callbacks. Strategies decide
//! *when* to call it, never *how* a transition works.

use std::cell::{Cell, Ref, RefCell};

use crate::config::TabStoreConfig;
use crate::error::Result;
use crate::published::Published;
use crate::reducer::{self, TabAction};
use crate::registry::SharedRegistry;
use crate::state::TabState;
use crate::tab::ObserverCounts;

pub struct StoreCore<T> {
    state: RefCell<TabState<T>>,
    registry: SharedRegistry<T>,
    /// Count of successfully applied intents.
    revision: Cell<u64>,
    published: Published<TabState<T>>,
    config: TabStoreConfig,
}

impl<T: Clone + 'static> StoreCore<T> {
    pub(crate) fn new(config: TabStoreConfig) -> Self {
        Self {
            state: RefCell::new(TabState::new()),
            registry: SharedRegistry::new(),
            revision: Cell::new(0),
            published: Published::new(TabState::new(), 0),
            config,
        }
    }

    /// Apply one intent immediately and fire its observers.
    ///
    /// # Errors
    ///
    /// Propagates the reducer's error; state and registry are unchanged.
    pub fn apply_now(&self, action: TabAction<T>) -> Result<()> {
        let name = action.name();
        let outcome = {
            let _span = tracing::debug_span!(
                "tabs.apply",
                store = self.config.label.as_str(),
                action = name
            )
            .entered();
            let mut state = self.state.borrow_mut();
            let mut registry = self.registry.borrow_mut();
            reducer::apply(&mut state, &mut registry, action)
        };
        match outcome {
            Ok(notification) => {
                self.revision.set(self.revision.get() + 1);
                #[cfg(debug_assertions)]
                self.debug_check_consistency();
                if let Some(notification) = notification {
                    notification.fire();
                }
                Ok(())
            }
            Err(err) => {
                tracing::warn!(
                    message = "tabs.rejected",
                    store = self.config.label.as_str(),
                    action = name,
                    kind = err.kind(),
                    error = %err
                );
                Err(err)
            }
        }
    }

    /// Copy the canonical state into the published snapshot if it moved.
    pub fn publish(&self) -> bool {
        let revision = self.revision.get();
        let published = self
            .published
            .publish(revision, || self.state.borrow().clone());
        if published {
            tracing::trace!(
                message = "tabs.publish",
                store = self.config.label.as_str(),
                revision
            );
        }
        published
    }

    #[must_use]
    pub fn config(&self) -> &TabStoreConfig {
        &self.config
    }

    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision.get()
    }

    pub(crate) fn state(&self) -> Ref<'_, TabState<T>> {
        self.state.borrow()
    }

    pub(crate) fn published(&self) -> &Published<TabState<T>> {
        &self.published
    }

    pub(crate) fn observer_counts(&self, key: &str) -> Option<ObserverCounts> {
        self.registry.with(|r| r.counts(key))
    }

    #[cfg(debug_assertions)]
    fn debug_check_consistency(&self) {
        let state = self.state.borrow();
        self.registry.with(|registry| {
            debug_assert_eq!(
                state.len(),
                registry.len(),
                "state and observer registry disagree on tab count"
            );
            debug_assert!(
                registry.keys().all(|key| state.contains(key)),
                "observer registry holds a key with no tab"
            );
        });
        debug_assert!(state.validate().is_ok(), "tab state invariants broken");
    }
}

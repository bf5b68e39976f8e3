#![forbid(unsafe_code)]

//! Scheduling strategies: when an intent reaches the reducer.
//!
//! Both strategies run the same transition ([`StoreCore::apply_now`]); they
//! differ only in ordering and in when renderers see the result.
//!
//! | Strategy     | Applies intent            | Re-entrant intents      | Published snapshot        |
//! |--------------|---------------------------|-------------------------|---------------------------|
//! | [`Local`]    | immediately               | applied immediately     | after every intent        |
//! | [`Dispatch`] | via FIFO queue, drained serially | queued behind current | on `publish()` or end of drain if `auto_publish` |
//!
//! "Re-entrant" means an intent issued from inside an observer callback
//! while another intent is being applied.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;

use crate::config::TabStoreConfig;
use crate::engine::StoreCore;
use crate::error::{Result, TabError};
use crate::reducer::TabAction;

/// Decides when intents are applied to a [`StoreCore`].
pub trait TabStrategy<T>: 'static {
    /// Short name for logs.
    const NAME: &'static str;

    fn from_config(config: &TabStoreConfig) -> Self;

    /// Submit one intent.
    ///
    /// # Errors
    ///
    /// Returns the error of `action` when it is applied before this call
    /// returns. Intents applied later are reported by the strategy itself.
    fn submit(&self, core: &StoreCore<T>, action: TabAction<T>) -> Result<()>;
}

/// Synchronous local mutation.
///
/// Each intent is applied before `submit` returns, and the published
/// snapshot follows immediately, so readers never observe lag.
#[derive(Debug, Default, Clone, Copy)]
pub struct Local;

impl<T: Clone + 'static> TabStrategy<T> for Local {
    const NAME: &'static str = "local";

    fn from_config(_config: &TabStoreConfig) -> Self {
        Self
    }

    fn submit(&self, core: &StoreCore<T>, action: TabAction<T>) -> Result<()> {
        core.apply_now(action)?;
        core.publish();
        Ok(())
    }
}

/// Queued dispatch through a single serial reducer.
///
/// # Invariants
///
/// 1. Intents are applied strictly in submission order.
/// 2. The queue is empty whenever no drain is in progress, so the first
///    intent of a drain is always the caller's own and its result is the
///    one `submit` returns.
/// 3. An intent submitted during a drain is applied after every intent
///    already queued; its error, if any, lands in the deferred list.
/// 4. With `auto_publish`, intents submitted by snapshot subscribers are
///    drained before `submit` returns.
///
/// # Failure Modes
///
/// - **Observer loop**: callbacks that keep submitting intents fill the
///   queue until `max_queue_depth`, after which `submit` fails with
///   [`TabError::QueueOverflow`].
/// - **Panicking observer**: the drain guard clears the queue and the
///   draining flag while unwinding, so the store stays usable.
pub struct Dispatch<T> {
    queue: RefCell<VecDeque<TabAction<T>>>,
    draining: Cell<bool>,
    deferred: RefCell<Vec<TabError>>,
    max_depth: usize,
    auto_publish: bool,
}

impl<T> fmt::Debug for Dispatch<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatch")
            .field("pending", &self.queue.borrow().len())
            .field("draining", &self.draining.get())
            .field("deferred_errors", &self.deferred.borrow().len())
            .field("max_depth", &self.max_depth)
            .field("auto_publish", &self.auto_publish)
            .finish()
    }
}

impl<T> Dispatch<T> {
    /// Intents waiting behind the one being applied.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    #[must_use]
    pub fn is_draining(&self) -> bool {
        self.draining.get()
    }

    /// Errors from intents applied after their `submit` had returned.
    ///
    /// Only the newest `max_queue_depth` errors are retained.
    pub fn take_deferred_errors(&self) -> Vec<TabError> {
        std::mem::take(&mut *self.deferred.borrow_mut())
    }

    /// Keep at most `max_depth` deferred errors, dropping the oldest.
    fn defer(&self, err: TabError) {
        let mut deferred = self.deferred.borrow_mut();
        if deferred.len() >= self.max_depth {
            deferred.remove(0);
        }
        deferred.push(err);
    }

    fn enqueue(&self, action: TabAction<T>) -> Result<()> {
        let mut queue = self.queue.borrow_mut();
        if queue.len() >= self.max_depth {
            return Err(TabError::QueueOverflow { depth: queue.len() });
        }
        queue.push_back(action);
        Ok(())
    }

    fn next(&self) -> Option<TabAction<T>> {
        self.queue.borrow_mut().pop_front()
    }
}

/// Resets the drain state even if an observer panics mid-drain.
struct DrainGuard<'a, T> {
    dispatch: &'a Dispatch<T>,
}

impl<T> Drop for DrainGuard<'_, T> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.dispatch.queue.borrow_mut().clear();
        }
        self.dispatch.draining.set(false);
    }
}

impl<T: Clone + 'static> TabStrategy<T> for Dispatch<T> {
    const NAME: &'static str = "dispatch";

    fn from_config(config: &TabStoreConfig) -> Self {
        Self {
            queue: RefCell::new(VecDeque::new()),
            draining: Cell::new(false),
            deferred: RefCell::new(Vec::new()),
            max_depth: config.max_queue_depth.max(1),
            auto_publish: config.auto_publish,
        }
    }

    fn submit(&self, core: &StoreCore<T>, action: TabAction<T>) -> Result<()> {
        let name = action.name();
        if self.draining.get() {
            self.enqueue(action)?;
            tracing::debug!(
                message = "tabs.dispatch.queued",
                store = core.config().label.as_str(),
                action = name,
                pending = self.pending()
            );
            return Ok(());
        }

        self.draining.set(true);
        let _guard = DrainGuard { dispatch: self };
        let first = core.apply_now(action);

        let mut applied = 1usize;
        loop {
            while let Some(next) = self.next() {
                let next_name = next.name();
                applied += 1;
                if let Err(err) = core.apply_now(next) {
                    tracing::warn!(
                        message = "tabs.dispatch.deferred_error",
                        store = core.config().label.as_str(),
                        action = next_name,
                        error = %err
                    );
                    self.defer(err);
                }
            }
            if !self.auto_publish {
                break;
            }
            // Subscribers may submit while the drain is still open.
            core.publish();
            if self.pending() == 0 {
                break;
            }
        }
        tracing::debug!(
            message = "tabs.dispatch.drained",
            store = core.config().label.as_str(),
            action = name,
            applied
        );
        first
    }
}

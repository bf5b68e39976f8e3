#![forbid(unsafe_code)]

//! MDI tab store: open, focus, update, rename and close document tabs,
//! with per-tab observers kept outside the serializable state.
//!
//! - [`TabStore`]: the handle UI code holds, generic over a scheduling
//!   [`TabStrategy`] ([`Local`] or [`Dispatch`]).
//! - [`TabState`]: the serializable `{items, active_key}` part.
//! - [`ObserverRegistry`]: the side-table of update/close callbacks.
//! - [`EntityRef`]: the deterministic entity-to-key derivation.

pub mod config;
mod engine;
pub mod error;
pub mod key;
pub mod published;
pub mod reducer;
pub mod registry;
pub mod state;
pub mod store;
pub mod strategy;
pub mod tab;

pub use config::TabStoreConfig;
pub use engine::StoreCore;
pub use error::{Result, TabError};
pub use key::{EntityRef, TabKey, ViewMode};
pub use published::{Published, Subscription};
pub use reducer::TabAction;
pub use registry::{ObserverRegistry, SharedRegistry};
pub use state::TabState;
pub use store::{DispatchTabStore, LocalTabStore, TabContext, TabStore};
pub use strategy::{Dispatch, Local, TabStrategy};
pub use tab::{CloseCallback, ObserverCounts, Observers, Tab, TabObservable, UpdateCallback};

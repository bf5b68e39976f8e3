#![forbid(unsafe_code)]

//! MDI public facade crate.
//!
//! This crate provides the stable, ergonomic surface area for users.

pub use mdi_store as store;

/// Everything a UI module needs to hold and drive a tab store.
pub mod prelude {
    pub use mdi_store::{
        Dispatch, DispatchTabStore, EntityRef, Local, LocalTabStore, Tab, TabContext, TabError,
        TabKey, TabObservable, TabState, TabStore, TabStoreConfig, ViewMode,
    };
}

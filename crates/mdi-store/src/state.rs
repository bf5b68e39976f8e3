#![forbid(unsafe_code)]

//! Serializable tab state: the ordered items and the active key.
//!
//! # Invariants
//!
//! 1. Keys in `items` are unique.
//! 2. `active_key`, if set, is the key of some element of `items`.
//! 3. Order is insertion order; a rename keeps the tab's position.
//!
//! The reducer maintains these on every transition. Snapshots coming from
//! outside (deserialized JSON, `restore`) are checked with
//! [`TabState::validate`].

use ahash::AHashSet;

use crate::error::{Result, TabError};
use crate::key::TabKey;
use crate::tab::Tab;

/// Ordered open tabs plus the focused one.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "state-persistence",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct TabState<T> {
    pub(crate) items: Vec<Tab<T>>,
    #[cfg_attr(
        feature = "state-persistence",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub(crate) active_key: Option<TabKey>,
}

impl<T> Default for TabState<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            active_key: None,
        }
    }
}

impl<T> TabState<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a state from parts, checking the invariants.
    ///
    /// # Errors
    ///
    /// Returns [`TabError::CorruptSnapshot`] on duplicate keys or a dangling
    /// active key.
    pub fn from_parts(items: Vec<Tab<T>>, active_key: Option<TabKey>) -> Result<Self> {
        let state = Self { items, active_key };
        state.validate()?;
        Ok(state)
    }

    #[must_use]
    pub fn items(&self) -> &[Tab<T>] {
        &self.items
    }

    #[must_use]
    pub fn active_key(&self) -> Option<&TabKey> {
        self.active_key.as_ref()
    }

    #[must_use]
    pub fn active_tab(&self) -> Option<&Tab<T>> {
        self.active_key.as_deref().and_then(|key| self.get(key))
    }

    #[must_use]
    pub fn position(&self, key: &str) -> Option<usize> {
        self.items.iter().position(|tab| tab.key == *key)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Tab<T>> {
        self.items.iter().find(|tab| tab.key == *key)
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    #[must_use]
    pub fn is_active(&self, key: &str) -> bool {
        self.active_key.as_deref() == Some(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &TabKey> {
        self.items.iter().map(|tab| &tab.key)
    }

    /// Check the state invariants.
    ///
    /// # Errors
    ///
    /// Returns [`TabError::CorruptSnapshot`] naming the first violation.
    pub fn validate(&self) -> Result<()> {
        let mut seen = AHashSet::with_capacity(self.items.len());
        for tab in &self.items {
            if !seen.insert(tab.key.as_str()) {
                return Err(TabError::corrupt(format!("duplicate key {}", tab.key)));
            }
        }
        if let Some(active) = &self.active_key
            && !seen.contains(active.as_str())
        {
            return Err(TabError::corrupt(format!(
                "active key {active} has no tab"
            )));
        }
        Ok(())
    }

    pub(crate) fn clear(&mut self) {
        self.items.clear();
        self.active_key = None;
    }
}

impl<T: Clone> TabState<T> {
    /// Copy of the items, in order.
    #[must_use]
    pub fn to_items(&self) -> Vec<Tab<T>> {
        self.items.clone()
    }
}

#[cfg(feature = "state-persistence")]
impl<T> TabState<T>
where
    T: serde::Serialize + serde::de::DeserializeOwned,
{
    /// Serialize as JSON (`{"items":[{"key":..,"data":..}],"activeKey":..}`).
    ///
    /// # Errors
    ///
    /// Returns [`TabError::Json`] if the payload fails to serialize.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse and validate a JSON snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`TabError::Json`] on malformed input and
    /// [`TabError::CorruptSnapshot`] if the invariants do not hold.
    pub fn from_json(json: &str) -> Result<Self> {
        let state: Self = serde_json::from_str(json)?;
        state.validate()?;
        Ok(state)
    }
}

#![forbid(unsafe_code)]

//! Tab keys and the entity-to-key derivation contract.
//!
//! The store never invents keys. Callers derive them from the identity of
//! whatever a tab shows, and use the same derivation both to open a tab and
//! to ask whether it is already open. [`EntityRef::tab_key`] is the
//! derivation used by entity editors.

use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;

/// Opaque identifier of a tab, unique within one store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(
    feature = "state-persistence",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct TabKey(String);

impl TabKey {
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for TabKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TabKey {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for TabKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&TabKey> for TabKey {
    fn from(value: &TabKey) -> Self {
        value.clone()
    }
}

impl AsRef<str> for TabKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Deref for TabKey {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

// Lets side-table and state lookups take `&str` without allocating.
impl Borrow<str> for TabKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for TabKey {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for TabKey {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// How an entity is presented inside its tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ViewMode {
    /// Editable form. The default mode, omitted from derived keys.
    #[default]
    Edit,
    /// Read-only view.
    View,
    /// Change history of the entity.
    History,
}

impl ViewMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Edit => "edit",
            Self::View => "view",
            Self::History => "history",
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Semantic identity of an entity editing session.
///
/// `id == None` stands for a record that has not been saved yet. Once the
/// record is saved the caller renames the tab (`update_tab` with a new key)
/// to the key derived from the assigned id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityRef {
    pub entity_type: String,
    pub id: Option<String>,
    pub mode: ViewMode,
}

impl EntityRef {
    #[must_use]
    pub fn new(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            id: Some(id.into()),
            mode: ViewMode::Edit,
        }
    }

    /// Reference to a record that does not exist yet.
    #[must_use]
    pub fn unsaved(entity_type: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            id: None,
            mode: ViewMode::Edit,
        }
    }

    #[must_use]
    pub fn mode(mut self, mode: ViewMode) -> Self {
        self.mode = mode;
        self
    }

    /// Deterministic key: `type/id` for edit mode, `type/id/mode` otherwise.
    /// Unsaved records use `new` in place of the id.
    #[must_use]
    pub fn tab_key(&self) -> TabKey {
        let id = self.id.as_deref().unwrap_or("new");
        match self.mode {
            ViewMode::Edit => TabKey(format!("{}/{}", self.entity_type, id)),
            mode => TabKey(format!("{}/{}/{}", self.entity_type, id, mode)),
        }
    }
}

impl From<&EntityRef> for TabKey {
    fn from(value: &EntityRef) -> Self {
        value.tab_key()
    }
}

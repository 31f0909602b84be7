//! Plain record types owned by the tag, type, and status registries.
//!
//! These are data-only; the registries themselves (interning, uniqueness,
//! persistence) live in the storage crate, which is the component that
//! actually owns the tables these records are rows of.

use crate::enums::BaseKind;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Status {
    pub id: i64,
    pub name: String,
    pub is_closed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TypeInfo {
    pub name: String,
    pub base_kind: BaseKind,
    pub description: Option<String>,
}

/// Built-in types that must exist at startup.
pub const BUILTIN_TYPES: &[(&str, BaseKind)] = &[
    ("sessions", BaseKind::Sessions),
    ("dailies", BaseKind::Documents),
];

/// Conventional default types created alongside the built-ins, so a fresh
/// data root is immediately usable without a `create_type` call.
pub const DEFAULT_TYPES: &[(&str, BaseKind)] = &[
    ("issues", BaseKind::Tasks),
    ("plans", BaseKind::Tasks),
    ("docs", BaseKind::Documents),
    ("knowledge", BaseKind::Documents),
];

/// Names that can never be registered as a new type because they are
/// reserved by the engine itself.
pub const RESERVED_TYPE_NAMES: &[&str] = &["current_state"];

/// Default status set loaded on initialization. `Status` rows are
/// addressable by name but immutable at the public surface thereafter.
pub const DEFAULT_STATUSES: &[(&str, bool)] = &[
    ("Open", false),
    ("In Progress", false),
    ("On Hold", false),
    ("Closed", true),
];

//! Fixed, closed enumerations used throughout the item model.
//!
//! Unlike a workflow `status`, which is a registered, addressable value
//! (see [`crate::registry::Status`]), `BaseKind` and `Priority` are part of
//! the wire contract itself and never grow at runtime, so they are plain
//! Rust enums with hand-written string conversions rather than an
//! extensible string-backed representation.

use std::fmt;

/// The base kind of a registered [`crate::registry::TypeInfo`], determining
/// which fields an item of that type carries and the shape of its id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaseKind {
    Tasks,
    Documents,
    Sessions,
}

impl BaseKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BaseKind::Tasks => "tasks",
            BaseKind::Documents => "documents",
            BaseKind::Sessions => "sessions",
        }
    }
}

impl fmt::Display for BaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BaseKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tasks" => Ok(BaseKind::Tasks),
            "documents" => Ok(BaseKind::Documents),
            "sessions" => Ok(BaseKind::Sessions),
            other => Err(format!("invalid base kind: {other}")),
        }
    }
}

/// Priority of a `tasks`-kind item. Required for tasks, forbidden otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            other => Err(format!("invalid priority: {other}")),
        }
    }
}

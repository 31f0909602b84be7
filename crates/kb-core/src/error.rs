//! The fault taxonomy.
//!
//! Every fallible operation in the engine returns a [`Fault`]. Backend
//! errors (SQLite, filesystem, front-matter parsing) are normalized into
//! one of these six kinds at the boundary where they occur; callers match
//! on kind, not on the underlying backend error type.

use std::fmt;

#[derive(Debug, thiserror::Error)]
pub enum Fault {
    /// Malformed input, invalid reference syntax, invalid priority/status/
    /// date, or a missing required field for the item's base kind.
    #[error("validation failed: {message}")]
    Validation { message: String },

    /// Unknown type, status, tag, or item id.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Duplicate daily date, duplicate tag creation, change-type across
    /// base kinds, or deletion of a non-empty type.
    #[error("conflict: {message}")]
    Conflict { message: String },

    /// Filesystem or index I/O failure. `retryable` marks transient
    /// conditions (lock contention, timeout) the repository may retry.
    #[error("storage error: {message}")]
    Storage { message: String, retryable: bool },

    /// A file parses structurally but violates an invariant (missing
    /// required front-matter key, a tasks-kind item missing status/priority, etc).
    #[error("corrupt item {type_name}-{id}: {reason}")]
    CorruptItem {
        type_name: String,
        id: String,
        reason: String,
    },

    /// Everything else. Always logged with context before being returned.
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl Fault {
    /// Every constructor here logs before returning, so a post-hoc log
    /// review accounts for a fault even when the caller discards it.
    pub fn validation(message: impl Into<String>) -> Self {
        let message = message.into();
        tracing::warn!(fault = "validation", %message, "validation fault");
        Fault::Validation { message }
    }

    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        let entity = entity.into();
        let id = id.into();
        tracing::warn!(fault = "not_found", %entity, %id, "not found fault");
        Fault::NotFound { entity, id }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        let message = message.into();
        tracing::warn!(fault = "conflict", %message, "conflict fault");
        Fault::Conflict { message }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        let message = message.into();
        tracing::warn!(fault = "storage", %message, retryable = false, "storage fault");
        Fault::Storage { message, retryable: false }
    }

    pub fn storage_retryable(message: impl Into<String>) -> Self {
        let message = message.into();
        tracing::warn!(fault = "storage", %message, retryable = true, "storage fault");
        Fault::Storage { message, retryable: true }
    }

    pub fn corrupt_item(
        type_name: impl Into<String>,
        id: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        let type_name = type_name.into();
        let id = id.into();
        let reason = reason.into();
        tracing::warn!(fault = "corrupt_item", %type_name, %id, %reason, "corrupt item fault");
        Fault::CorruptItem { type_name, id, reason }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        let message = message.into();
        tracing::error!(fault = "internal", %message, "internal fault");
        Fault::Internal { message }
    }

    /// Stable taxonomy name, distinct from the Rust variant name, for
    /// callers that need a wire-stable identifier.
    pub fn code(&self) -> FaultCode {
        match self {
            Fault::Validation { .. } => FaultCode::Validation,
            Fault::NotFound { .. } => FaultCode::NotFound,
            Fault::Conflict { .. } => FaultCode::Conflict,
            Fault::Storage { .. } => FaultCode::Storage,
            Fault::CorruptItem { .. } => FaultCode::CorruptItem,
            Fault::Internal { .. } => FaultCode::Internal,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Fault::Storage { retryable: true, .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Fault::NotFound { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultCode {
    Validation,
    NotFound,
    Conflict,
    Storage,
    CorruptItem,
    Internal,
}

impl FaultCode {
    pub fn as_str(self) -> &'static str {
        match self {
            FaultCode::Validation => "validation",
            FaultCode::NotFound => "not_found",
            FaultCode::Conflict => "conflict",
            FaultCode::Storage => "storage",
            FaultCode::CorruptItem => "corrupt_item",
            FaultCode::Internal => "internal",
        }
    }
}

impl fmt::Display for FaultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type Result<T> = std::result::Result<T, Fault>;

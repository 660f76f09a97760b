//! Error types for AgentLab bytecode operations

use thiserror::Error;

/// A name that is not a member of the enum it was looked up in.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("'{member}' is not a member of {enum_name}")]
pub struct UnknownMember {
    pub enum_name: &'static str,
    pub member: String,
}

/// Failures reported by a [`crate::CompilerResolver`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Unknown behaviour graph: {name}")]
    UnknownGraph { name: String },

    #[error("Unknown global object: {name}")]
    UnknownGlobalObject { name: String },

    #[error("Unknown object slot: {name}")]
    UnknownObjectSlot { name: String },

    #[error("Resolved id {id} for '{name}' does not fit in {width}")]
    OutOfRange {
        name: String,
        id: i64,
        width: &'static str,
    },
}

/// Result type for resolver calls.
pub type ResolveResult<T> = Result<T, ResolveError>;

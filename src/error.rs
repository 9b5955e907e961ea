//! Generation failures callers need to tell apart.
//!
//! Everything else (I/O, malformed descriptors) travels as plain
//! `anyhow::Error` with context; these variants ride inside it and can be
//! recovered with `downcast_ref::<GenError>()`.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenError {
    /// Missing substitution for a whole operation: the table has no
    /// signature for it, so none of its argument-list placeholders can be
    /// filled. Single unfilled placeholders are [`GenError::MissingSubstitution`].
    #[error("missing substitution: no fop signature known for operation '{operation}'")]
    UnknownOperation { operation: String },

    /// A template placeholder had nothing to substitute it with.
    #[error("missing substitution for placeholder @{placeholder}@ while expanding '{operation}'")]
    MissingSubstitution {
        operation: String,
        placeholder: String,
    },

    /// A second generation marker was found; only one block is emitted per file.
    #[error("duplicate generation marker on line {line} (first marker on line {first})")]
    DuplicateMarker { first: usize, line: usize },
}

//! Typed errors for the compiler core.
//!
//! Every fallible operation in the pipeline returns [`CompileError`]
//! rather than panicking, so a library caller can match on failure
//! kind instead of parsing a message. The binary front-end wraps these
//! in [`anyhow`] when it needs to attach file-level context.

use crate::textloc::Textloc;

pub type Result<T> = std::result::Result<T, CompileError>;

/// The five failure shapes the pipeline can produce.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    /// A function application, relative-note resolution, or chord
    /// lookup failed against the source text. Carries the location so
    /// diagnostics can point back at the offending expression.
    #[error("{message} at {textloc:?}")]
    Semantic { message: String, textloc: Textloc },

    /// A pass produced a tree shape that violates a documented
    /// invariant of a later pass (e.g. a RELNOTE surviving past the
    /// relative pass). Reaching this is a bug in the pipeline itself,
    /// not bad input.
    #[error("invariant violation: {message}")]
    Invariant { message: String },

    /// A bounded resource was exhausted: the id counter, the event
    /// stream's capacity, or the 16-channel allocator.
    #[error("resource exhausted: {message}")]
    ResourceExhausted { message: String },

    /// Writing the serialized event stream to its sink failed for a
    /// reason other than a transient interruption.
    #[error("I/O error writing event stream: {0}")]
    Io(#[from] std::io::Error),
}

impl CompileError {
    pub fn semantic(message: impl Into<String>, textloc: Textloc) -> Self {
        CompileError::Semantic {
            message: message.into(),
            textloc,
        }
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        CompileError::Invariant {
            message: message.into(),
        }
    }

    pub fn resource_exhausted(message: impl Into<String>) -> Self {
        CompileError::ResourceExhausted {
            message: message.into(),
        }
    }
}

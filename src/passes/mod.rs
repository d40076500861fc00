//! The ordered rewrite passes that turn a freshly parsed expression
//! tree into a flat, absolute-time stream of notes.
//!
//! Each pass consumes the tree produced by the previous one and
//! either rewrites nodes in place or returns a new tree; `compiler`
//! threads them together in the fixed order the data model requires.

pub mod flatten;
pub mod functions;
pub mod join;
pub mod relative;

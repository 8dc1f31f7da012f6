//! Internal error type for programmer-error conditions.
//!
//! Nothing a well-formed client or a malformed HLASM source file can trigger
//! should ever reach this type: malformed input becomes a [`crate::Diagnostic`]
//! instead. `CoreError` exists for invariant violations inside this crate
//! itself (a dangling frame-tree node id, a corrupt cache key) that indicate
//! a bug rather than bad input.

use thiserror::Error;

/// Errors raised when an internal invariant of `hlasm-core` is violated.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A `NodeId` was used with a tree that did not allocate it.
    #[error("processing frame node {0:?} does not belong to this tree")]
    DanglingFrameNode(crate::frame_tree::NodeId),
    /// A resource location could not be parsed as a known URI scheme.
    #[error("unrecognized resource location: {0}")]
    BadResourceLocation(String),
    /// An external function was registered twice under the same name.
    #[error("external function {0:?} is already registered")]
    DuplicateExternalFunction(String),
}

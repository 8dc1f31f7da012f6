//! `hlasm-core` - source location tracking, processing-frame tree, conditional
//! assembly expression evaluation, and the macro/copy member cache.
//!
//! This is the semantic heart of the language server: it owns everything
//! that needs to survive across edits to a single open-code file (the macro
//! cache) and everything that is reconstructed once per parse (the
//! processing-frame tree, the CA expression evaluator's live variable
//! state).
//!
//! # Modules
//!
//! - [`location`]: `FileManager`, virtual-file handling for `hlasm://` and
//!   `hlasm-external://` URIs, open/change/close tracking.
//! - [`library`]: a directory-backed macro/copy-member library with a lazy,
//!   refreshable file listing.
//! - [`frame_tree`]: the interned processing-frame tree (macro/copy call
//!   stack).
//! - [`ident_storage`]: the open-code identifier interning table that backs
//!   macro cache keys.
//! - [`external_fn`]: the `SETAF`/`SETCF` external function registry.
//! - [`ca`]: CA expression value model and evaluator.
//! - [`macro_cache`]: the macro/copy member definition cache, keyed by
//!   context fingerprint.
//! - [`diagnostics`]: diagnostic severities and well-known error codes.
//! - [`error`]: the crate's internal error type.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]

pub mod ca;
pub mod diagnostics;
pub mod error;
pub mod external_fn;
pub mod frame_tree;
pub mod ident_storage;
pub mod library;
pub mod location;
pub mod macro_cache;

pub use diagnostics::{Diagnostic, Severity};
pub use error::CoreError;
pub use external_fn::{ArgumentBundle, ExternalFunction, ExternalFunctionRegistry, Message};
pub use frame_tree::{ProcessingFrame, ProcessingFrameTree, ProcessingType};
pub use ident_storage::IdStorage;
pub use library::Library;
pub use location::{FileManager, ResourceLocation};
pub use macro_cache::{MacroCache, MacroCacheKey};

//! Resource locations and the in-memory file manager.
//!
//! Grounded in `examples/original_source/parser_library/src/workspace_manager_impl.h`'s
//! `ws_path_match`: HLASM resources are addressed by one of three URI
//! families --
//!
//! - `file:` / `untitled:` - ordinary client-owned documents.
//! - `hlasm://<workspace-id>/<member>` - a virtual member belonging to a
//!   particular workspace (used for macros/copy members the workspace
//!   synthesizes rather than reads from disk).
//! - `hlasm-external://<base16-host>/<member>` - a virtual member addressed
//!   by a base16-encoded "host" segment, used for content a preprocessor
//!   (Endevor `-INC`, `++INCLUDE`) pulls in without a real file URI.

use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::Arc;

/// A parsed resource location, the URI-shaped identifier every diagnostic,
/// processing frame, and open document refers to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceLocation(Arc<str>);

impl ResourceLocation {
    /// Wraps a raw URI string without validating its scheme.
    #[must_use]
    pub fn new(uri: impl Into<Arc<str>>) -> Self {
        Self(uri.into())
    }

    /// The raw URI text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The URI scheme, if any (text before the first `:`).
    #[must_use]
    pub fn scheme(&self) -> Option<&str> {
        self.0.split_once(':').map(|(scheme, _)| scheme)
    }

    /// `true` for `hlasm://` or `hlasm-external://` virtual resources.
    #[must_use]
    pub fn is_virtual(&self) -> bool {
        matches!(self.scheme(), Some("hlasm") | Some("hlasm-external"))
    }

    /// Splits an `hlasm://<id>/<member>` URI into its workspace id and member path.
    #[must_use]
    pub fn hlasm_id_and_member(&self) -> Option<(&str, &str)> {
        let rest = self.0.strip_prefix("hlasm://")?;
        rest.split_once('/')
    }

    /// Splits an `hlasm-external://<base16-host>/<member>` URI into its host and member path.
    #[must_use]
    pub fn hlasm_external_host_and_member(&self) -> Option<(&str, &str)> {
        let rest = self.0.strip_prefix("hlasm-external://")?;
        rest.split_once('/')
    }
}

impl fmt::Display for ResourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceLocation {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ResourceLocation {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// How a `did_change_file` edit relates to the file's current content, used
/// by the macro cache to decide whether cached definitions survive the edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentState {
    /// The new text differs from the old text.
    Changed,
    /// The new text is byte-for-byte identical to the old text (e.g. a
    /// save-without-edit, or an edit that was undone before the debounce
    /// fired).
    Identical,
}

/// A single tracked document: its text, LSP version, and whether it is
/// client-owned (open in an editor) or loaded from disk/cache on demand.
#[derive(Debug, Clone)]
pub struct File {
    text: Arc<str>,
    version: Option<i32>,
}

impl File {
    /// Creates a client-owned file at a given LSP version.
    #[must_use]
    pub fn opened(text: impl Into<Arc<str>>, version: i32) -> Self {
        Self {
            text: text.into(),
            version: Some(version),
        }
    }

    /// Creates a file with no associated LSP version (loaded from disk, or a
    /// virtual/external member).
    #[must_use]
    pub fn unversioned(text: impl Into<Arc<str>>) -> Self {
        Self {
            text: text.into(),
            version: None,
        }
    }

    /// The current text content.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The LSP version, if this file is client-owned.
    #[must_use]
    pub fn version(&self) -> Option<i32> {
        self.version
    }
}

/// The result of a single `did_open`/`did_change` mutation, reported back so
/// the caller can decide whether re-parsing is needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileUpdateResult {
    /// Whether the file's content actually changed.
    pub content: ContentState,
}

/// The workspace-wide registry of tracked files.
///
/// Mirrors the teacher's document map in `state::ServerState`, generalized
/// to also serve virtual and external resources, which never go through
/// `textDocument/didOpen` but are still addressed by [`ResourceLocation`].
#[derive(Debug, Default)]
pub struct FileManager {
    files: FxHashMap<ResourceLocation, File>,
}

impl FileManager {
    /// Creates an empty file manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a freshly opened client document.
    pub fn did_open_file(&mut self, loc: ResourceLocation, version: i32, text: String) -> FileUpdateResult {
        let content = match self.files.get(&loc) {
            Some(existing) if existing.text() == text => ContentState::Identical,
            _ => ContentState::Changed,
        };
        self.files.insert(loc, File::opened(text, version));
        FileUpdateResult { content }
    }

    /// Applies a full-document replace to an already-open file.
    pub fn did_change_file(&mut self, loc: ResourceLocation, version: i32, text: String) -> FileUpdateResult {
        let content = match self.files.get(&loc) {
            Some(existing) if existing.text() == text => ContentState::Identical,
            _ => ContentState::Changed,
        };
        self.files.insert(loc, File::opened(text, version));
        FileUpdateResult { content }
    }

    /// Removes a client-owned file from the open set. The entry is dropped
    /// entirely rather than demoted to a disk-backed file: a subsequent read
    /// goes through [`Library`](crate::library::Library) again.
    pub fn did_close_file(&mut self, loc: &ResourceLocation) {
        self.files.remove(loc);
    }

    /// Renames a tracked file, preserving its content and version.
    pub fn rename_file(&mut self, from: &ResourceLocation, to: ResourceLocation) {
        if let Some(file) = self.files.remove(from) {
            self.files.insert(to, file);
        }
    }

    /// Inserts or replaces disk-backed or virtual/external content that did
    /// not go through the `did_open`/`did_change` client protocol.
    pub fn put_virtual_file(&mut self, loc: ResourceLocation, text: String) {
        self.files.insert(loc, File::unversioned(text));
    }

    /// Looks up a tracked file's content.
    #[must_use]
    pub fn get_file(&self, loc: &ResourceLocation) -> Option<&File> {
        self.files.get(loc)
    }

    /// `true` if a resource is currently client-owned (has a version).
    #[must_use]
    pub fn is_open(&self, loc: &ResourceLocation) -> bool {
        self.files.get(loc).is_some_and(|f| f.version().is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hlasm_uri_splits_id_and_member() {
        let loc = ResourceLocation::new("hlasm://ws1/MYMACRO");
        assert_eq!(loc.hlasm_id_and_member(), Some(("ws1", "MYMACRO")));
        assert!(loc.is_virtual());
    }

    #[test]
    fn hlasm_external_uri_splits_host_and_member() {
        let loc = ResourceLocation::new("hlasm-external://612e6263/MYMACRO");
        assert_eq!(loc.hlasm_external_host_and_member(), Some(("612e6263", "MYMACRO")));
    }

    #[test]
    fn file_scheme_is_not_virtual() {
        let loc = ResourceLocation::new("file:///tmp/a.hlasm");
        assert!(!loc.is_virtual());
        assert_eq!(loc.scheme(), Some("file"));
    }

    #[test]
    fn did_change_reports_identical_content() {
        let mut fm = FileManager::new();
        let loc = ResourceLocation::new("file:///a.hlasm");
        fm.did_open_file(loc.clone(), 1, "MAC".to_string());
        let result = fm.did_change_file(loc, 2, "MAC".to_string());
        assert_eq!(result.content, ContentState::Identical);
    }

    #[test]
    fn did_change_reports_changed_content() {
        let mut fm = FileManager::new();
        let loc = ResourceLocation::new("file:///a.hlasm");
        fm.did_open_file(loc.clone(), 1, "MAC".to_string());
        let result = fm.did_change_file(loc, 2, "MAC2".to_string());
        assert_eq!(result.content, ContentState::Changed);
    }

    #[test]
    fn close_then_get_returns_none() {
        let mut fm = FileManager::new();
        let loc = ResourceLocation::new("file:///a.hlasm");
        fm.did_open_file(loc.clone(), 1, "MAC".to_string());
        fm.did_close_file(&loc);
        assert!(fm.get_file(&loc).is_none());
    }
}

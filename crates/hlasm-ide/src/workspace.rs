//! The workspace: per-resource parse state, diagnostics, and opcode
//! suggestions.
//!
//! Grounded in `examples/original_source/parser_library/src/workspace_manager_impl.h`'s
//! `opened_workspace`/`workspace` split: a workspace owns a [`FileManager`],
//! a [`MacroCache`], and a set of [`Library`] instances, and re-derives its
//! [`index::SymbolIndex`] for a resource whenever that resource's text
//! changes.

use hlasm_core::diagnostics::{codes, Severity};
use hlasm_core::location::{ContentState, FileUpdateResult, ResourceLocation};
use hlasm_core::{Diagnostic, FileManager, Library, MacroCache};
use hlasm_syntax::{Position, Range};
use rustc_hash::FxHashMap;

use crate::index::{OccurrenceRole, SymbolIndex};

/// A workspace: the open files it tracks, their derived indices, and shared
/// caching state.
pub struct Workspace {
    files: FileManager,
    indices: FxHashMap<ResourceLocation, SymbolIndex>,
    libraries: Vec<Library>,
    macro_cache: MacroCache,
}

impl Workspace {
    /// Creates an empty workspace with no libraries configured.
    #[must_use]
    pub fn new() -> Self {
        Self {
            files: FileManager::new(),
            indices: FxHashMap::default(),
            libraries: Vec::new(),
            macro_cache: MacroCache::new(),
        }
    }

    /// Registers a macro/copy member library, in search order.
    pub fn add_library(&mut self, library: Library) {
        self.libraries.push(library);
    }

    /// The configured libraries, in search order.
    #[must_use]
    pub fn libraries(&self) -> &[Library] {
        &self.libraries
    }

    /// The configured libraries, mutably, for invalidating their cached file
    /// listings on `workspace/didChangeWatchedFiles`.
    pub fn libraries_mut(&mut self) -> &mut [Library] {
        &mut self.libraries
    }

    /// The workspace's macro/copy member cache.
    #[must_use]
    pub fn macro_cache(&self) -> &MacroCache {
        &self.macro_cache
    }

    /// The workspace's macro/copy member cache, mutably.
    pub fn macro_cache_mut(&mut self) -> &mut MacroCache {
        &mut self.macro_cache
    }

    /// Registers a newly opened document and (re-)parses it.
    pub fn did_open_file(&mut self, loc: ResourceLocation, version: i32, text: String) -> Vec<Diagnostic> {
        let result = self.files.did_open_file(loc.clone(), version, text);
        self.parse_file(&loc, result)
    }

    /// Applies a full-document replace and re-parses if the content changed.
    pub fn did_change_file(&mut self, loc: ResourceLocation, version: i32, text: String) -> Vec<Diagnostic> {
        let result = self.files.did_change_file(loc.clone(), version, text);
        self.parse_file(&loc, result)
    }

    /// Removes a document from the open set and drops its derived index.
    pub fn did_close_file(&mut self, loc: &ResourceLocation) {
        self.files.did_close_file(loc);
        self.indices.remove(loc);
    }

    /// Re-derives `loc`'s symbol index, unless `result` reports the content
    /// did not actually change (an identical re-save is a no-op).
    fn parse_file(&mut self, loc: &ResourceLocation, result: FileUpdateResult) -> Vec<Diagnostic> {
        if result.content == ContentState::Identical && self.indices.contains_key(loc) {
            return Vec::new();
        }
        let Some(file) = self.files.get_file(loc) else {
            return Vec::new();
        };
        let index = SymbolIndex::build(file.text());
        let diagnostics = self.diagnose(loc, &index);
        self.indices.insert(loc.clone(), index);
        diagnostics
    }

    fn diagnose(&self, loc: &ResourceLocation, index: &SymbolIndex) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        for occ in index.occurrences() {
            if occ.role != OccurrenceRole::Reference {
                continue;
            }
            if index.definition(&occ.name).is_some() {
                continue;
            }
            use crate::index::SymbolKind;
            if occ.kind == SymbolKind::MacroOrCopyRef && !self.member_is_known(&occ.name) {
                let range = Range::new(occ.position, Position::new(occ.position.line, occ.position.column + occ.len));
                let mut message = format!("unresolved macro or copy member {}", occ.name);
                if let Some(suggestion) = self.suggest_member_name(&occ.name) {
                    message.push_str(&format!(", did you mean {suggestion}?"));
                }
                diagnostics.push(Diagnostic::new(loc.clone(), range, Severity::Error, codes::E083, message));
            }
        }
        diagnostics
    }

    fn member_is_known(&self, name: &str) -> bool {
        self.libraries
            .iter()
            .filter_map(Library::cached_files)
            .any(|files| files.contains_key(name))
    }

    /// Resolves a macro/copy member or Endevor `-INC`/`++INCLUDE` operand
    /// name to its own resource, for cross-file goto-definition. The
    /// resource is the library's root joined with the member's cached
    /// relative path (bare, when the root is empty); only libraries whose
    /// listing has already been refreshed are consulted, matching
    /// [`Workspace::member_is_known`].
    #[must_use]
    pub fn resolve_member(&self, name: &str) -> Option<ResourceLocation> {
        for library in &self.libraries {
            let Some(files) = library.cached_files() else {
                continue;
            };
            let Some((_, path)) = files.iter().find(|(member, _)| member.eq_ignore_ascii_case(name)) else {
                continue;
            };
            let root = library.root().trim_end_matches('/');
            let resource = if root.is_empty() { path.clone() } else { format!("{root}/{path}") };
            return Some(ResourceLocation::new(resource));
        }
        None
    }

    /// Suggests the closest known macro/copy member name to `name` by edit
    /// distance, for `did you mean` diagnostics and quick fixes. Only
    /// libraries that have already been refreshed are consulted; this crate
    /// performs no filesystem I/O of its own.
    #[must_use]
    pub fn suggest_member_name(&self, name: &str) -> Option<String> {
        self.libraries
            .iter()
            .filter_map(Library::cached_files)
            .flat_map(|files| files.keys())
            .min_by_key(|candidate| levenshtein(name, candidate))
            .filter(|candidate| levenshtein(name, candidate) <= 3)
            .cloned()
    }

    /// The derived index for a resource, if it has been parsed.
    #[must_use]
    pub fn index(&self, loc: &ResourceLocation) -> Option<&SymbolIndex> {
        self.indices.get(loc)
    }

    /// The file manager backing this workspace.
    #[must_use]
    pub fn files(&self) -> &FileManager {
        &self.files
    }
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}

/// Classic Levenshtein edit distance, used for opcode/member-name suggestions.
#[must_use]
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut row: Vec<usize> = (0..=b.len()).collect();
    for (i, ca) in a.iter().enumerate() {
        let mut prev = row[0];
        row[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let temp = row[j + 1];
            row[j + 1] = if ca == cb {
                prev
            } else {
                1 + prev.min(row[j]).min(row[j + 1])
            };
            prev = temp;
        }
    }
    row[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use hlasm_core::library::LibraryOptions;

    #[test]
    fn levenshtein_identical_is_zero() {
        assert_eq!(levenshtein("MYMACRO", "MYMACRO"), 0);
    }

    #[test]
    fn levenshtein_single_typo() {
        assert_eq!(levenshtein("MYMACRO", "MYMACR0"), 1);
    }

    #[test]
    fn open_then_close_drops_index() {
        let mut ws = Workspace::new();
        let loc = ResourceLocation::new("file:///a.hlasm");
        ws.did_open_file(loc.clone(), 1, "MYLABEL DS F\n".to_string());
        assert!(ws.index(&loc).is_some());
        ws.did_close_file(&loc);
        assert!(ws.index(&loc).is_none());
    }

    #[test]
    fn unresolved_copy_member_is_flagged() {
        let mut ws = Workspace::new();
        let loc = ResourceLocation::new("file:///a.hlasm");
        let diags = ws.did_open_file(loc, 1, "         COPY  MISSING\n".to_string());
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, "E083");
    }

    #[test]
    fn resolve_member_joins_library_root_and_cached_relative_path() {
        let mut ws = Workspace::new();
        let mut lib = Library::new("/libs", LibraryOptions::default());
        lib.load_files(|_root, _opts| vec![("MYMACRO".to_string(), "MYMACRO.hlasm".to_string())]);
        ws.add_library(lib);

        assert_eq!(ws.resolve_member("MYMACRO"), Some(ResourceLocation::new("/libs/MYMACRO.hlasm")));
        assert_eq!(ws.resolve_member("NOPE"), None);
    }

    #[test]
    fn resolve_member_is_case_insensitive() {
        let mut ws = Workspace::new();
        let mut lib = Library::new("/libs", LibraryOptions::default());
        lib.load_files(|_root, _opts| vec![("MYMACRO".to_string(), "MYMACRO.hlasm".to_string())]);
        ws.add_library(lib);

        assert_eq!(ws.resolve_member("mymacro"), Some(ResourceLocation::new("/libs/MYMACRO.hlasm")));
    }
}

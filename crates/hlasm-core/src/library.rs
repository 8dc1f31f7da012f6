//! Directory-backed macro/copy member libraries.
//!
//! Grounded in `examples/original_source/parser_library/src/workspaces/library_local.h`:
//! a library is a directory plus a set of accepted file extensions, and it
//! lazily lists its files on first access rather than eagerly walking the
//! directory tree at construction time. The listing is cached until
//! [`Library::refresh`] invalidates it, mirroring `library_local`'s
//! atomic/shared `files_collection_t`.

use rustc_hash::FxHashMap;

/// Options controlling how a [`Library`] discovers member files.
///
/// Equivalent to `library_local_options`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LibraryOptions {
    /// File extensions considered part of this library, e.g. `["hlasm", "asm"]`.
    pub extensions: Vec<String>,
    /// `true` if a library with no matching files should be silently skipped
    /// rather than producing a configuration diagnostic.
    pub optional: bool,
}

/// A single macro/copy-member source directory.
///
/// The member listing (`name -> relative path`) is populated lazily by
/// [`Library::list_files`] and invalidated by [`Library::refresh`]; callers
/// supply the actual directory walk through a closure so this crate stays
/// free of filesystem I/O (the LSP-facing crate owns that concern, matching
/// the teacher's split between `trust-hir`'s pure data model and the LSP
/// crate's `tokio::fs` usage).
#[derive(Debug)]
pub struct Library {
    root: String,
    options: LibraryOptions,
    files: Option<FxHashMap<String, String>>,
}

impl Library {
    /// Creates a library rooted at `root` with the given discovery options.
    #[must_use]
    pub fn new(root: impl Into<String>, options: LibraryOptions) -> Self {
        Self {
            root: root.into(),
            options,
            files: None,
        }
    }

    /// The library's root directory.
    #[must_use]
    pub fn root(&self) -> &str {
        &self.root
    }

    /// The library's discovery options.
    #[must_use]
    pub fn options(&self) -> &LibraryOptions {
        &self.options
    }

    /// Drops the cached file listing so the next [`Library::list_files`] or
    /// [`Library::has_file`] call re-derives it.
    pub fn refresh(&mut self) {
        self.files = None;
    }

    /// `true` once a file listing has been loaded.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.files.is_some()
    }

    /// The cached file listing, if one has already been loaded; unlike
    /// [`Library::list_files`] this never triggers a directory walk, so
    /// callers with no access to filesystem I/O (like `hlasm-ide`) can still
    /// consult an already-refreshed library.
    #[must_use]
    pub fn cached_files(&self) -> Option<&FxHashMap<String, String>> {
        self.files.as_ref()
    }

    /// Loads the file listing if not already cached, using `load` to walk
    /// the directory (name -> relative path pairs, already extension-filtered).
    pub fn load_files(&mut self, load: impl FnOnce(&str, &LibraryOptions) -> Vec<(String, String)>) {
        if self.files.is_none() {
            let entries = load(&self.root, &self.options);
            self.files = Some(entries.into_iter().collect());
        }
    }

    /// The cached file listing, loading it first if necessary.
    pub fn list_files(
        &mut self,
        load: impl FnOnce(&str, &LibraryOptions) -> Vec<(String, String)>,
    ) -> &FxHashMap<String, String> {
        self.load_files(load);
        self.files.as_ref().expect("load_files always populates the cache")
    }

    /// `true` if `name` (case as supplied) resolves to a member in this
    /// library, loading the listing first if necessary. Returns the member's
    /// relative path when found.
    pub fn has_file(
        &mut self,
        name: &str,
        load: impl FnOnce(&str, &LibraryOptions) -> Vec<(String, String)>,
    ) -> Option<String> {
        self.list_files(load).get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stub_load(_root: &str, _opts: &LibraryOptions) -> Vec<(String, String)> {
        vec![
            ("MYMACRO".to_string(), "MYMACRO.hlasm".to_string()),
            ("MYCOPY".to_string(), "MYCOPY.cpy".to_string()),
        ]
    }

    #[test]
    fn has_file_loads_lazily() {
        let mut lib = Library::new("/libs", LibraryOptions::default());
        assert!(!lib.is_loaded());
        assert_eq!(lib.has_file("MYMACRO", stub_load), Some("MYMACRO.hlasm".to_string()));
        assert!(lib.is_loaded());
        assert_eq!(lib.has_file("NOPE", stub_load), None);
    }

    #[test]
    fn refresh_invalidates_cache() {
        let mut lib = Library::new("/libs", LibraryOptions::default());
        lib.load_files(stub_load);
        assert!(lib.is_loaded());
        lib.refresh();
        assert!(!lib.is_loaded());
    }
}

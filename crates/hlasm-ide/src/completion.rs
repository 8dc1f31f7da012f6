//! Code completion.

use hlasm_core::location::ResourceLocation;
use rustc_hash::FxHashSet;
use smol_str::SmolStr;

use crate::workspace::Workspace;

/// What a completion candidate represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionKind {
    /// An ordinary symbol (label) defined somewhere in the file.
    Symbol,
    /// A macro or copy member name known to a configured library.
    Member,
}

/// A single completion candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionItem {
    /// The candidate's display/insertion text.
    pub label: SmolStr,
    /// What this candidate is.
    pub kind: CompletionKind,
}

/// Completes `prefix` against the symbols defined in `loc` and the members
/// known to the workspace's configured libraries.
#[must_use]
pub fn complete(workspace: &Workspace, loc: &ResourceLocation, prefix: &str) -> Vec<CompletionItem> {
    let prefix_upper = prefix.to_ascii_uppercase();
    let mut seen = FxHashSet::default();
    let mut items = Vec::new();

    if let Some(index) = workspace.index(loc) {
        for name in index.defined_names() {
            if name.starts_with(&prefix_upper) && seen.insert(name.clone()) {
                items.push(CompletionItem {
                    label: name.clone(),
                    kind: CompletionKind::Symbol,
                });
            }
        }
    }

    for library in workspace.libraries() {
        let Some(files) = library.cached_files() else {
            continue;
        };
        for name in files.keys() {
            let upper = SmolStr::from(name.to_ascii_uppercase());
            if upper.starts_with(&prefix_upper) && seen.insert(upper.clone()) {
                items.push(CompletionItem {
                    label: upper,
                    kind: CompletionKind::Member,
                });
            }
        }
    }

    items
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completes_symbols_by_prefix() {
        let mut ws = Workspace::new();
        let loc = ResourceLocation::new("file:///a.hlasm");
        ws.did_open_file(loc.clone(), 1, "MYLABEL  DS    F\nOTHER    DS    F\n".to_string());
        let items = complete(&ws, &loc, "MY");
        assert_eq!(items, vec![CompletionItem { label: "MYLABEL".into(), kind: CompletionKind::Symbol }]);
    }
}

//! Document symbols (`textDocument/documentSymbol`).

use hlasm_core::location::ResourceLocation;
use hlasm_syntax::{Position, Range};
use smol_str::SmolStr;

use crate::index::OccurrenceRole;
use crate::workspace::Workspace;

/// A single flat document symbol entry.
///
/// HLASM's label field does not nest symbols the way a block-structured
/// language would, so this is a flat list rather than a tree, matching how
/// the original assembler's outline view presents ordinary symbols.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSymbol {
    /// The symbol's name.
    pub name: SmolStr,
    /// Its defining range.
    pub range: Range,
}

/// Lists every symbol defined in `loc`, in source order.
#[must_use]
pub fn document_symbols(workspace: &Workspace, loc: &ResourceLocation) -> Vec<DocumentSymbol> {
    let Some(index) = workspace.index(loc) else {
        return Vec::new();
    };
    index
        .occurrences()
        .iter()
        .filter(|occ| occ.role == OccurrenceRole::Definition)
        .map(|occ| DocumentSymbol {
            name: occ.name.clone(),
            range: Range::new(occ.position, Position::new(occ.position.line, occ.position.column + occ.len)),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_defined_symbols_in_source_order() {
        let mut ws = Workspace::new();
        let loc = ResourceLocation::new("file:///a.hlasm");
        ws.did_open_file(loc.clone(), 1, "FIRST  DS F\nSECOND DS F\n".to_string());
        let symbols = document_symbols(&ws, &loc);
        assert_eq!(symbols.iter().map(|s| s.name.as_str()).collect::<Vec<_>>(), vec!["FIRST", "SECOND"]);
    }
}

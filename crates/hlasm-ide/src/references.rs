//! Find references.

use hlasm_core::location::ResourceLocation;
use hlasm_syntax::{Position, Range};

use crate::util::{name_at_position, preprocessor_directive_at_position};
use crate::workspace::Workspace;

/// A single reference location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// The resource containing the reference.
    pub resource: ResourceLocation,
    /// The range of the reference within that resource.
    pub range: Range,
}

/// Finds every occurrence of the name at `position`, within `loc` only
/// (resolving a reference to a macro/copy member's own definition site is
/// `goto_definition`'s job; this crate does not walk into a member's file to
/// find further references inside it, see `DESIGN.md`).
///
/// A position on an Endevor preprocessor `-INC`/`++INCLUDE` mnemonic itself
/// (rather than its member operand) returns every such directive site in the
/// file, matching `lsp_context_preprocessor_test.cpp`'s `refs` case.
///
/// `include_declaration` controls whether the defining occurrence itself is
/// included in the result, matching `textDocument/references`'s
/// `context.includeDeclaration`.
#[must_use]
pub fn find_references(workspace: &Workspace, loc: &ResourceLocation, position: Position, include_declaration: bool) -> Vec<Reference> {
    let Some(file) = workspace.files().get_file(loc) else {
        return Vec::new();
    };
    let Some(index) = workspace.index(loc) else {
        return Vec::new();
    };

    let lookup_name = if let Some(marker) = preprocessor_directive_at_position(file.text(), position) {
        marker.to_string()
    } else {
        let Some((name, _)) = name_at_position(file.text(), position) else {
            return Vec::new();
        };
        name.strip_prefix('&').unwrap_or(&name).to_string()
    };

    index
        .references(&lookup_name)
        .filter(|occ| include_declaration || occ.role != crate::index::OccurrenceRole::Definition)
        .map(|occ| Reference {
            resource: loc.clone(),
            range: Range::new(occ.position, Position::new(occ.position.line, occ.position.column + occ.len)),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_all_references_excluding_declaration_by_default() {
        let mut ws = Workspace::new();
        let loc = ResourceLocation::new("file:///a.hlasm");
        ws.did_open_file(
            loc.clone(),
            1,
            "MYLABEL  DS    F\n         BR     MYLABEL\n         BR     MYLABEL\n".to_string(),
        );
        let refs = find_references(&ws, &loc, Position::new(0, 0), false);
        assert_eq!(refs.len(), 2);
    }

    #[test]
    fn include_declaration_adds_the_definition() {
        let mut ws = Workspace::new();
        let loc = ResourceLocation::new("file:///a.hlasm");
        ws.did_open_file(loc.clone(), 1, "MYLABEL  DS    F\n         BR     MYLABEL\n".to_string());
        let refs = find_references(&ws, &loc, Position::new(0, 0), true);
        assert_eq!(refs.len(), 2);
    }

    fn endevor_preprocessor_source() -> &'static str {
        "-INC  MEMBER blabla\n++INCLUDE  MEMBER blabla\n-INC  MEMBER2\n"
    }

    #[test]
    fn cursor_on_an_include_mnemonic_finds_every_directive_site() {
        let mut ws = Workspace::new();
        let loc = ResourceLocation::new("file:///a.hlasm");
        ws.did_open_file(loc.clone(), 1, endevor_preprocessor_source().to_string());

        for pos in [Position::new(0, 1), Position::new(1, 5), Position::new(2, 2)] {
            let refs = find_references(&ws, &loc, pos, false);
            let positions: Vec<_> = refs.iter().map(|r| r.range.start).collect();
            assert_eq!(positions, vec![Position::new(0, 0), Position::new(1, 0), Position::new(2, 0)], "cursor at {pos:?}");
        }
    }

    #[test]
    fn cursor_on_a_member_operand_finds_only_that_members_sites() {
        let mut ws = Workspace::new();
        let loc = ResourceLocation::new("file:///a.hlasm");
        ws.did_open_file(loc.clone(), 1, endevor_preprocessor_source().to_string());

        let member = find_references(&ws, &loc, Position::new(0, 8), false);
        let positions: Vec<_> = member.iter().map(|r| r.range.start).collect();
        assert_eq!(positions, vec![Position::new(0, 6), Position::new(1, 11)]);

        let member2 = find_references(&ws, &loc, Position::new(2, 8), false);
        let positions2: Vec<_> = member2.iter().map(|r| r.range.start).collect();
        assert_eq!(positions2, vec![Position::new(2, 6)]);
    }

    #[test]
    fn cursor_on_the_trailing_operand_finds_nothing() {
        let mut ws = Workspace::new();
        let loc = ResourceLocation::new("file:///a.hlasm");
        ws.did_open_file(loc.clone(), 1, endevor_preprocessor_source().to_string());

        assert!(find_references(&ws, &loc, Position::new(0, 15), false).is_empty());
    }
}

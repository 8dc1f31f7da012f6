//! Go to definition.

use hlasm_core::location::ResourceLocation;
use hlasm_syntax::{Position, Range};

use crate::util::name_at_position;
use crate::workspace::Workspace;

#[cfg(test)]
use hlasm_core::library::LibraryOptions;
#[cfg(test)]
use hlasm_core::Library;

/// Result of a go-to-definition request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinitionResult {
    /// The resource containing the definition.
    pub resource: ResourceLocation,
    /// The range of the definition within that resource.
    pub range: Range,
}

/// Finds the definition of the name at `position` within `loc`.
///
/// Ordinary symbols and variable symbols resolve within the same file. A
/// macro/copy member or Endevor preprocessor `-INC`/`++INCLUDE` operand that
/// is not defined in `loc` resolves to position `(0, 0)` of the member's own
/// resource, via [`Workspace::resolve_member`], matching
/// `lsp_context_preprocessor_test.cpp`'s `go_to` case ("jump from source to
/// included file"). A position on the directive mnemonic itself, or on a name
/// no library knows, yields no jump.
#[must_use]
pub fn goto_definition(workspace: &Workspace, loc: &ResourceLocation, position: Position) -> Option<DefinitionResult> {
    let file = workspace.files().get_file(loc)?;
    let (name, _) = name_at_position(file.text(), position)?;
    let lookup_name = name.strip_prefix('&').unwrap_or(&name);

    let index = workspace.index(loc)?;
    if let Some(def) = index.definition(lookup_name) {
        return Some(DefinitionResult {
            resource: loc.clone(),
            range: Range::new(def.position, Position::new(def.position.line, def.position.column + def.len)),
        });
    }

    let member = workspace.resolve_member(lookup_name)?;
    Some(DefinitionResult {
        resource: member,
        range: Range::at(Position::new(0, 0)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_a_label_reference_in_the_same_file() {
        let mut ws = Workspace::new();
        let loc = ResourceLocation::new("file:///a.hlasm");
        ws.did_open_file(loc.clone(), 1, "MYLABEL  DS    F\n         BR     MYLABEL\n".to_string());
        let def = goto_definition(&ws, &loc, Position::new(1, 17)).expect("definition");
        assert_eq!(def.range.start, Position::new(0, 0));
    }

    fn workspace_with_endevor_libraries() -> (Workspace, ResourceLocation) {
        let mut ws = Workspace::new();
        let mut lib = Library::new("", LibraryOptions::default());
        lib.load_files(|_root, _opts| {
            vec![("MEMBER".to_string(), "MEMBER".to_string()), ("MEMBER2".to_string(), "MEMBER2".to_string())]
        });
        ws.add_library(lib);

        let loc = ResourceLocation::new("file:///a.hlasm");
        ws.did_open_file(loc.clone(), 1, "-INC  MEMBER blabla\n++INCLUDE  MEMBER blabla\n-INC  MEMBER2\n".to_string());
        (ws, loc)
    }

    #[test]
    fn member_operand_jumps_to_the_top_of_the_members_own_resource() {
        let (ws, loc) = workspace_with_endevor_libraries();

        let def = goto_definition(&ws, &loc, Position::new(0, 8)).expect("definition");
        assert_eq!(def.resource, ResourceLocation::new("MEMBER"));
        assert_eq!(def.range, Range::at(Position::new(0, 0)));

        let def2 = goto_definition(&ws, &loc, Position::new(1, 14)).expect("definition");
        assert_eq!(def2.resource, ResourceLocation::new("MEMBER"));

        let def3 = goto_definition(&ws, &loc, Position::new(2, 8)).expect("definition");
        assert_eq!(def3.resource, ResourceLocation::new("MEMBER2"));
    }

    #[test]
    fn directive_mnemonic_and_unknown_operand_yield_no_jump() {
        let (ws, loc) = workspace_with_endevor_libraries();

        assert!(goto_definition(&ws, &loc, Position::new(0, 1)).is_none());
        assert!(goto_definition(&ws, &loc, Position::new(0, 15)).is_none());
    }
}

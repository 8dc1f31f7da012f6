//! End-to-end tests exercising a `Workspace` through its public query features.

use hlasm_core::location::ResourceLocation;
use hlasm_ide::{complete, document_symbols, find_references, goto_definition, hover, semantic_tokens, Workspace};
use hlasm_syntax::Position;

fn open(ws: &mut Workspace, text: &str) -> ResourceLocation {
    let loc = ResourceLocation::new("file:///a.hlasm");
    ws.did_open_file(loc.clone(), 1, text.to_string());
    loc
}

#[test]
fn full_cycle_definition_references_and_rename_surface() {
    let mut ws = Workspace::new();
    let loc = open(
        &mut ws,
        "MYLABEL  DS    F\n         BR     MYLABEL\n         BR     MYLABEL\n",
    );

    let def = goto_definition(&ws, &loc, Position::new(1, 17)).expect("definition");
    assert_eq!(def.range.start, Position::new(0, 0));

    let refs = find_references(&ws, &loc, Position::new(0, 0), true);
    assert_eq!(refs.len(), 3);

    let symbols = document_symbols(&ws, &loc);
    assert_eq!(symbols.len(), 1);

    let tokens = semantic_tokens(&ws, &loc);
    assert!(!tokens.is_empty());
}

#[test]
fn completion_reflects_file_edits() {
    let mut ws = Workspace::new();
    let loc = open(&mut ws, "MYLABEL  DS    F\n");
    assert_eq!(complete(&ws, &loc, "MY").len(), 1);

    ws.did_change_file(loc.clone(), 2, "RENAMED  DS    F\n".to_string());
    assert_eq!(complete(&ws, &loc, "MY").len(), 0);
    assert_eq!(complete(&ws, &loc, "REN").len(), 1);
}

#[test]
fn hover_reports_unresolved_member_with_suggestion() {
    let mut ws = Workspace::new();
    let loc = open(&mut ws, "         COPY  MYCOPY\n");
    let result = hover(&ws, &loc, Position::new(0, 16)).expect("hover");
    assert!(result.contents.contains("unresolved"));
}

//! Hover information.

use hlasm_core::location::ResourceLocation;
use hlasm_syntax::Position;

use crate::index::SymbolKind;
use crate::util::name_at_position;
use crate::workspace::Workspace;

/// The hover text and range it applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoverResult {
    /// Markdown-formatted hover content.
    pub contents: String,
}

/// Produces hover text for the name at `position`.
#[must_use]
pub fn hover(workspace: &Workspace, loc: &ResourceLocation, position: Position) -> Option<HoverResult> {
    let file = workspace.files().get_file(loc)?;
    let (name, _) = name_at_position(file.text(), position)?;
    let is_var = name.starts_with('&');
    let lookup_name = name.strip_prefix('&').unwrap_or(&name);

    let index = workspace.index(loc)?;
    let contents = if is_var {
        let count = index.references(lookup_name).count();
        format!("**&{lookup_name}** - CA variable symbol ({count} reference(s) in this file)")
    } else if let Some(def) = index.definition(lookup_name) {
        let kind = match def.kind {
            SymbolKind::Ordinary => "ordinary symbol",
            SymbolKind::Variable => "variable symbol",
            SymbolKind::MacroOrCopyRef => "macro/copy member",
            SymbolKind::PreprocessorInclude => "preprocessor directive",
        };
        format!("**{lookup_name}** - {kind}, defined at line {}", def.position.line + 1)
    } else if let Some(suggestion) = workspace.suggest_member_name(lookup_name) {
        format!("**{lookup_name}** - unresolved; did you mean **{suggestion}**?")
    } else {
        format!("**{lookup_name}** - unresolved")
    };
    Some(HoverResult { contents })
}

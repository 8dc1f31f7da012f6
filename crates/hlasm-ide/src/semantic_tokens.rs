//! Semantic tokens.

use hlasm_core::location::ResourceLocation;
use hlasm_syntax::{Position, Range};

use crate::index::SymbolKind as IndexSymbolKind;
use crate::workspace::Workspace;

/// The highlight class a token belongs to, mapped to the LSP semantic token
/// legend by the LSP crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemanticTokenType {
    /// A label definition.
    Label,
    /// A CA variable symbol.
    Variable,
    /// A macro/copy member name.
    Macro,
    /// A preprocessor directive mnemonic (`-INC`, `++INCLUDE`).
    Keyword,
}

/// A single semantic token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemanticToken {
    /// The token's range.
    pub range: Range,
    /// Its highlight class.
    pub token_type: SemanticTokenType,
}

/// Computes semantic tokens for every occurrence the index recorded in `loc`.
#[must_use]
pub fn semantic_tokens(workspace: &Workspace, loc: &ResourceLocation) -> Vec<SemanticToken> {
    let Some(index) = workspace.index(loc) else {
        return Vec::new();
    };
    index
        .occurrences()
        .iter()
        .map(|occ| SemanticToken {
            range: Range::new(occ.position, Position::new(occ.position.line, occ.position.column + occ.len)),
            token_type: match occ.kind {
                IndexSymbolKind::Ordinary => SemanticTokenType::Label,
                IndexSymbolKind::Variable => SemanticTokenType::Variable,
                IndexSymbolKind::MacroOrCopyRef => SemanticTokenType::Macro,
                IndexSymbolKind::PreprocessorInclude => SemanticTokenType::Keyword,
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_label_and_variable() {
        let mut ws = Workspace::new();
        let loc = ResourceLocation::new("file:///a.hlasm");
        ws.did_open_file(loc.clone(), 1, "MYLABEL  AIF (&X EQ 1).SKIP\n".to_string());
        let tokens = semantic_tokens(&ws, &loc);
        assert!(tokens.iter().any(|t| t.token_type == SemanticTokenType::Label));
        assert!(tokens.iter().any(|t| t.token_type == SemanticTokenType::Variable));
    }

    #[test]
    fn tokenizes_preprocessor_directive_as_keyword() {
        let mut ws = Workspace::new();
        let loc = ResourceLocation::new("file:///a.hlasm");
        ws.did_open_file(loc.clone(), 1, "-INC  MEMBER blabla\n".to_string());
        let tokens = semantic_tokens(&ws, &loc);
        assert!(tokens.iter().any(|t| t.token_type == SemanticTokenType::Keyword));
        assert!(tokens.iter().any(|t| t.token_type == SemanticTokenType::Macro));
    }
}

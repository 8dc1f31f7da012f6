//! Conversions between `hlasm-ide`'s pure domain types and the wire
//! `lsp_types` shapes.

use hlasm_core::location::ResourceLocation;
use hlasm_ide::{CompletionItem, CompletionKind, DefinitionResult, DocumentSymbol as HDocumentSymbol, Reference, SemanticToken, SemanticTokenType};
use hlasm_syntax::{Position as HPosition, Range as HRange};
use tower_lsp::lsp_types;

/// Parses a `file:`/`untitled:`/virtual URI out of an `lsp_types::Url`.
#[must_use]
pub fn location_from_uri(uri: &lsp_types::Url) -> ResourceLocation {
    ResourceLocation::new(uri.as_str())
}

/// Renders a [`ResourceLocation`] back into an `lsp_types::Url`, falling back
/// to a synthetic `hlasm://` URI if the stored string isn't one (virtual
/// members created internally rather than by the client).
#[must_use]
pub fn uri_from_location(loc: &ResourceLocation) -> lsp_types::Url {
    lsp_types::Url::parse(loc.as_str()).unwrap_or_else(|_| {
        lsp_types::Url::parse(&format!("hlasm://invalid/{}", loc.as_str())).expect("fallback URI is well-formed")
    })
}

#[must_use]
pub fn position(p: HPosition) -> lsp_types::Position {
    lsp_types::Position::new(p.line, p.column)
}

#[must_use]
pub fn from_lsp_position(p: lsp_types::Position) -> HPosition {
    HPosition::new(p.line, p.character)
}

#[must_use]
pub fn range(r: HRange) -> lsp_types::Range {
    lsp_types::Range::new(position(r.start), position(r.end))
}

#[must_use]
pub fn location(loc: &ResourceLocation, r: HRange) -> lsp_types::Location {
    lsp_types::Location::new(uri_from_location(loc), range(r))
}

#[must_use]
pub fn goto_definition_response(result: DefinitionResult) -> lsp_types::GotoDefinitionResponse {
    lsp_types::GotoDefinitionResponse::Scalar(location(&result.resource, result.range))
}

#[must_use]
pub fn reference_locations(refs: Vec<Reference>) -> Vec<lsp_types::Location> {
    refs.into_iter().map(|r| location(&r.resource, r.range)).collect()
}

#[must_use]
pub fn hover(contents: String, value_range: Option<HRange>) -> lsp_types::Hover {
    lsp_types::Hover {
        contents: lsp_types::HoverContents::Markup(lsp_types::MarkupContent {
            kind: lsp_types::MarkupKind::Markdown,
            value: contents,
        }),
        range: value_range.map(range),
    }
}

#[must_use]
pub fn completion_items(items: Vec<CompletionItem>) -> Vec<lsp_types::CompletionItem> {
    items
        .into_iter()
        .map(|item| lsp_types::CompletionItem {
            label: item.label.to_string(),
            kind: Some(match item.kind {
                CompletionKind::Symbol => lsp_types::CompletionItemKind::VARIABLE,
                CompletionKind::Member => lsp_types::CompletionItemKind::MODULE,
            }),
            ..Default::default()
        })
        .collect()
}

#[must_use]
pub fn document_symbols(loc: &ResourceLocation, symbols: Vec<HDocumentSymbol>) -> Vec<lsp_types::SymbolInformation> {
    #[allow(deprecated)]
    symbols
        .into_iter()
        .map(|sym| lsp_types::SymbolInformation {
            name: sym.name.to_string(),
            kind: lsp_types::SymbolKind::VARIABLE,
            tags: None,
            deprecated: None,
            location: location(loc, sym.range),
            container_name: None,
        })
        .collect()
}

/// The fixed semantic-token legend this server publishes during
/// `initialize`, in the same order [`token_type_index`] encodes.
#[must_use]
pub fn semantic_token_legend() -> lsp_types::SemanticTokensLegend {
    lsp_types::SemanticTokensLegend {
        token_types: vec![
            lsp_types::SemanticTokenType::FUNCTION,
            lsp_types::SemanticTokenType::VARIABLE,
            lsp_types::SemanticTokenType::NAMESPACE,
            lsp_types::SemanticTokenType::KEYWORD,
        ],
        token_modifiers: vec![],
    }
}

fn token_type_index(kind: SemanticTokenType) -> u32 {
    match kind {
        SemanticTokenType::Label => 0,
        SemanticTokenType::Variable => 1,
        SemanticTokenType::Macro => 2,
        SemanticTokenType::Keyword => 3,
    }
}

/// Encodes semantic tokens into the LSP delta-encoded `data` array.
/// Assumes tokens are already in source order (as `hlasm-ide` produces them).
#[must_use]
pub fn semantic_tokens_data(tokens: Vec<SemanticToken>) -> Vec<lsp_types::SemanticToken> {
    let mut out = Vec::with_capacity(tokens.len());
    let mut prev_line = 0u32;
    let mut prev_start = 0u32;
    for tok in tokens {
        let start = tok.range.start;
        let delta_line = start.line - prev_line;
        let delta_start = if delta_line == 0 { start.column - prev_start } else { start.column };
        let length = tok.range.end.column.saturating_sub(tok.range.start.column).max(1);
        out.push(lsp_types::SemanticToken {
            delta_line,
            delta_start,
            length,
            token_type: token_type_index(tok.token_type),
            token_modifiers_bitset: 0,
        });
        prev_line = start.line;
        prev_start = start.column;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn semantic_tokens_delta_encode_within_a_line() {
        let tokens = vec![
            SemanticToken { range: HRange::new(HPosition::new(0, 0), HPosition::new(0, 4)), token_type: SemanticTokenType::Label },
            SemanticToken { range: HRange::new(HPosition::new(0, 10), HPosition::new(0, 13)), token_type: SemanticTokenType::Macro },
        ];
        let data = semantic_tokens_data(tokens);
        assert_eq!(data[0].delta_line, 0);
        assert_eq!(data[0].delta_start, 0);
        assert_eq!(data[1].delta_line, 0);
        assert_eq!(data[1].delta_start, 10);
    }

    #[test]
    fn semantic_tokens_delta_resets_start_on_new_line() {
        let tokens = vec![
            SemanticToken { range: HRange::new(HPosition::new(0, 5), HPosition::new(0, 8)), token_type: SemanticTokenType::Variable },
            SemanticToken { range: HRange::new(HPosition::new(1, 2), HPosition::new(1, 5)), token_type: SemanticTokenType::Variable },
        ];
        let data = semantic_tokens_data(tokens);
        assert_eq!(data[1].delta_line, 1);
        assert_eq!(data[1].delta_start, 2);
    }
}

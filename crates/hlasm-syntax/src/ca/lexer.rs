//! Tokenizer for conditional-assembly expression operands.

use logos::Logos;
use text_size::{TextRange, TextSize};

/// All token kinds that can appear inside a CA expression operand.
///
/// Keyword-like comparison/logical operators (`EQ`, `NE`, `AND`, ...) lex as
/// plain `Ident`s; the parser in [`super::ast`] recognizes them by text so
/// that ordinary symbol names are never shadowed by a fixed keyword list.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[logos(skip r"[ \t]+")]
pub enum CaToken {
    /// `&NAME`, the variable-symbol sigil plus the trailing identifier.
    #[regex(r"&[A-Za-z_#$@][A-Za-z0-9_#$@]*")]
    Var,
    /// An ordinary identifier: function name, attribute name, or bare symbol.
    #[regex(r"[A-Za-z_#$@][A-Za-z0-9_#$@]*")]
    Ident,
    /// A decimal integer literal.
    #[regex(r"[0-9]+")]
    Int,
    /// A quoted character string; `''` inside the quotes is an escaped quote.
    #[regex(r"'([^']|'')*'")]
    Str,
    /// `(`
    #[token("(")]
    LParen,
    /// `)`
    #[token(")")]
    RParen,
    /// `,`
    #[token(",")]
    Comma,
    /// `.` used to disambiguate adjacent concatenation operands.
    #[token(".")]
    Dot,
    /// `+`
    #[token("+")]
    Plus,
    /// `-`
    #[token("-")]
    Minus,
    /// `*`
    #[token("*")]
    Star,
    /// `/`
    #[token("/")]
    Slash,
    /// `=`
    #[token("=")]
    Eq,
    /// `<`
    #[token("<")]
    Lt,
    /// `>`
    #[token(">")]
    Gt,
    /// `¬` (logical NOT prefix, HLASM's traditional character).
    #[token("¬")]
    Not,
    /// Lexer could not classify the input; error-tolerant like the HLASM
    /// statement lexer this crate otherwise leaves out of scope.
    Error,
}

/// A lexed token with its byte range in the operand text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    /// The token kind.
    pub kind: CaToken,
    /// The byte range of the token within the operand text.
    pub range: TextRange,
}

/// Tokenizes a CA expression operand into a flat token vector.
///
/// Trivia (whitespace) is dropped; unrecognized bytes become `CaToken::Error`
/// tokens so the parser can report a diagnostic rather than panic.
#[must_use]
pub fn lex(source: &str) -> Vec<Token> {
    let mut lexer = CaToken::lexer(source);
    let mut out = Vec::new();
    while let Some(result) = lexer.next() {
        let span = lexer.span();
        let kind = result.unwrap_or(CaToken::Error);
        out.push(Token {
            kind,
            range: TextRange::new(TextSize::from(span.start as u32), TextSize::from(span.end as u32)),
        });
    }
    out
}

//! Conditional-assembly (CA) expression lexer and term tree.
//!
//! Grounded in `trust-syntax::lexer` (a `logos`-backed lexer with a
//! pending-token queue for multi-token lookahead) and in
//! `examples/original_source/parser_library/src/expressions/conditional_assembly/terms/ca_string.h`
//! for the substring/duplication-factor surface that the term tree has to
//! represent.

pub mod ast;
pub mod lexer;

pub use ast::{BinOp, Expr, SetValue};
pub use lexer::{lex, CaToken, Token};

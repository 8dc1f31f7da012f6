//! Term tree for conditional-assembly expressions.
//!
//! Grounded in the term hierarchy under
//! `examples/original_source/parser_library/src/expressions/conditional_assembly/terms/`:
//! arithmetic/character/logical terms share a common shape (unary/binary
//! operators over scalar and sequence operands, a function-call term, and a
//! character-specific substring/duplication-factor term). This module
//! collapses that hierarchy into a single `Expr` tree; which of arithmetic,
//! logical, or character semantics applies to a given node is decided during
//! evaluation ([`crate`]'s sibling `hlasm-core::ca` crate), not by the parser.

use smol_str::SmolStr;
use text_size::TextRange;

/// A resolved CA value: exactly one of HLASM's three SETx variable kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetValue {
    /// A SETA (arithmetic) value.
    Arithmetic(i32),
    /// A SETB (boolean) value; HLASM represents this as 0/1.
    Boolean(bool),
    /// A SETC (character) value.
    Character(SmolStr),
}

/// Binary operators recognized by CA expressions, spanning the arithmetic,
/// character-concatenation, and logical/relational term families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `.` or juxtaposition, character concatenation.
    Concat,
    /// `EQ` / `=`
    Eq,
    /// `NE`
    Ne,
    /// `LT` / `<`
    Lt,
    /// `LE`
    Le,
    /// `GT` / `>`
    Gt,
    /// `GE`
    Ge,
    /// `AND`
    And,
    /// `OR`
    Or,
    /// `XOR`
    Xor,
}

impl BinOp {
    /// Maps a CA keyword or symbolic operator spelling to a `BinOp`, case-insensitively.
    #[must_use]
    pub fn from_keyword(text: &str) -> Option<Self> {
        Some(match_ascii_uppercase(text)?)
    }
}

fn match_ascii_uppercase(text: &str) -> Option<BinOp> {
    let mut buf = [0u8; 8];
    let bytes = text.as_bytes();
    if bytes.len() > buf.len() {
        return None;
    }
    for (dst, src) in buf.iter_mut().zip(bytes) {
        *dst = src.to_ascii_uppercase();
    }
    match &buf[..bytes.len()] {
        b"EQ" => Some(BinOp::Eq),
        b"NE" => Some(BinOp::Ne),
        b"LT" => Some(BinOp::Lt),
        b"LE" => Some(BinOp::Le),
        b"GT" => Some(BinOp::Gt),
        b"GE" => Some(BinOp::Ge),
        b"AND" => Some(BinOp::And),
        b"OR" => Some(BinOp::Or),
        b"XOR" => Some(BinOp::Xor),
        _ => None,
    }
}

/// A conditional-assembly expression term.
///
/// `range` on each variant's payload refers to the byte range within the
/// operand text that was lexed by [`super::lexer::lex`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// An integer literal, e.g. `42`.
    IntLit {
        /// Literal value.
        value: i32,
        /// Source span.
        range: TextRange,
    },
    /// A quoted character literal, with doubled quotes already un-escaped.
    StrLit {
        /// Literal text, quotes stripped.
        value: SmolStr,
        /// Source span.
        range: TextRange,
    },
    /// A variable symbol reference, e.g. `&X` or `&ARR(1)`.
    Var {
        /// Variable name, without the leading `&`.
        name: SmolStr,
        /// Subscript expression for array-valued variable symbols, if present.
        subscript: Option<Box<Expr>>,
        /// Source span of the whole reference, including subscript.
        range: TextRange,
    },
    /// A prefix `NOT` / `¬`.
    Not {
        /// Operand.
        operand: Box<Expr>,
        /// Source span.
        range: TextRange,
    },
    /// Unary minus, e.g. `-X`.
    Neg {
        /// Operand.
        operand: Box<Expr>,
        /// Source span.
        range: TextRange,
    },
    /// A binary operator application.
    Binary {
        /// Operator.
        op: BinOp,
        /// Left operand.
        lhs: Box<Expr>,
        /// Right operand.
        rhs: Box<Expr>,
        /// Source span.
        range: TextRange,
    },
    /// A function call, either a built-in attribute/SETx function or a
    /// registered external function (see `hlasm-core::external_fn`).
    Call {
        /// Function name.
        name: SmolStr,
        /// Argument expressions.
        args: Vec<Expr>,
        /// Source span.
        range: TextRange,
    },
    /// A character substring expression, `expr(start,length)`, per
    /// `ca_string.h`'s substring term.
    Substring {
        /// The string expression being sliced.
        base: Box<Expr>,
        /// Start position expression (1-based, per HLASM convention).
        start: Box<Expr>,
        /// Length expression.
        length: Box<Expr>,
        /// Source span.
        range: TextRange,
    },
    /// A duplication factor, `n(expr)`, repeating a character value `n` times.
    DupFactor {
        /// Repeat-count expression.
        count: Box<Expr>,
        /// The value expression being repeated.
        value: Box<Expr>,
        /// Source span.
        range: TextRange,
    },
    /// Adjacent character terms joined by concatenation without an explicit operator.
    Concat {
        /// The joined terms, in order.
        parts: Vec<Expr>,
        /// Source span.
        range: TextRange,
    },
}

impl Expr {
    /// The source span covering this expression.
    #[must_use]
    pub fn range(&self) -> TextRange {
        match self {
            Expr::IntLit { range, .. }
            | Expr::StrLit { range, .. }
            | Expr::Var { range, .. }
            | Expr::Not { range, .. }
            | Expr::Neg { range, .. }
            | Expr::Binary { range, .. }
            | Expr::Call { range, .. }
            | Expr::Substring { range, .. }
            | Expr::DupFactor { range, .. }
            | Expr::Concat { range, .. } => *range,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binop_keyword_is_case_insensitive() {
        assert_eq!(BinOp::from_keyword("eq"), Some(BinOp::Eq));
        assert_eq!(BinOp::from_keyword("AND"), Some(BinOp::And));
        assert_eq!(BinOp::from_keyword("frobnicate"), None);
    }

    #[test]
    fn expr_range_reports_outermost_span() {
        let e = Expr::Neg {
            operand: Box::new(Expr::IntLit {
                value: 1,
                range: TextRange::new(1.into(), 2.into()),
            }),
            range: TextRange::new(0.into(), 2.into()),
        };
        assert_eq!(e.range(), TextRange::new(0.into(), 2.into()));
    }
}

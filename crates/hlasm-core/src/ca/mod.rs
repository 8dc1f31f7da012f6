//! Conditional-assembly (CA) expression evaluation.
//!
//! The term tree itself lives in `hlasm-syntax::ca`; this module gives those
//! terms semantics: a value model ([`values`]), undefined-symbol collection
//! for `AIF`/`SETx` operand validation ([`solver`]), and the evaluator
//! ([`eval`]) that walks a term tree against a variable environment and the
//! external function registry to produce a [`hlasm_syntax::ca::SetValue`].

pub mod eval;
pub mod solver;
pub mod values;

pub use eval::{eval, CaDiagnostic, EvalContext, EvalError};
pub use solver::undefined_variables;
pub use values::Environment;

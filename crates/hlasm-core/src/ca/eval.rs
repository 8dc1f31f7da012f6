//! CA expression evaluation.
//!
//! Grounded in `ca_string::evaluate`/`duplicate` and the sibling arithmetic/
//! logical term `evaluate` overrides referenced from
//! `examples/original_source/parser_library/src/expressions/conditional_assembly/terms/ca_string.h`:
//! a duplication factor repeats its operand's character value `n` times and
//! must reject, rather than silently shrink, any repeat that would exceed
//! `MAX_STR_SIZE` (4064 characters, the assembler's SETC length limit); a
//! substring's start/length are 1-based, an out-of-range start yields an
//! empty result and an overlong length is clamped, per
//! `external_functions_test.cpp`'s `message` case for how a dispatched
//! external function's message becomes a diagnostic.

use std::cell::RefCell;

use hlasm_syntax::ca::{BinOp, Expr, SetValue};
use smol_str::SmolStr;
use text_size::TextRange;

use crate::diagnostics::{codes, Severity};
use crate::external_fn::{ArgumentBundle, ExternalCallError, ExternalFunctionRegistry, Message};

use super::values::Environment;

/// The maximum length of a SETC character value, matching `ca_string::MAX_STR_SIZE`.
pub const MAX_STR_SIZE: usize = 4064;

/// A diagnostic raised during evaluation, not yet anchored to a
/// [`crate::location::ResourceLocation`] — the caller knows which resource
/// and version the expression being evaluated belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaDiagnostic {
    /// Diagnostic code, e.g. `"EXT"` or `"W019"`.
    pub code: &'static str,
    /// Severity.
    pub severity: Severity,
    /// Message text.
    pub message: String,
    /// Byte range within the operand text this diagnostic applies to.
    pub range: TextRange,
}

/// Everything the evaluator needs besides the expression itself.
pub struct EvalContext<'a> {
    /// The current variable environment.
    pub env: &'a Environment,
    /// The external function registry (`SETAF`/`SETCF` targets).
    pub externals: &'a ExternalFunctionRegistry,
    /// Diagnostics accumulated while evaluating (external-function messages,
    /// truncation warnings). Shared rather than exclusive so `eval` itself
    /// keeps taking `&EvalContext`.
    pub diagnostics: &'a RefCell<Vec<CaDiagnostic>>,
}

/// Evaluation failures, each tagged with the HLASM diagnostic code the
/// caller should report it under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    /// Referenced a variable that is not declared.
    UndefinedVariable {
        /// Variable name.
        name: SmolStr,
        /// Diagnostic code (`E010`).
        code: &'static str,
    },
    /// A subscript resolved to something other than an array element.
    BadSubscript,
    /// A duplication factor's repeat count times its operand's length would
    /// exceed [`MAX_STR_SIZE`].
    DuplicationOverflow {
        /// Diagnostic code (`CE011`).
        code: &'static str,
    },
    /// An operand's runtime kind did not match what the operator expects
    /// (e.g. a character value used where arithmetic was required).
    TypeMismatch,
    /// Division by zero in an arithmetic expression.
    DivideByZero,
    /// An external function call failed to dispatch.
    ExternalCall(ExternalCallError),
}

/// Evaluates a CA expression term tree to a [`SetValue`].
pub fn eval(expr: &Expr, ctx: &EvalContext<'_>) -> Result<SetValue, EvalError> {
    match expr {
        Expr::IntLit { value, .. } => Ok(SetValue::Arithmetic(*value)),
        Expr::StrLit { value, .. } => Ok(SetValue::Character(value.clone())),
        Expr::Var { name, subscript, .. } => eval_var(name, subscript.as_deref(), ctx),
        Expr::Not { operand, .. } => {
            let v = as_bool(eval(operand, ctx)?)?;
            Ok(SetValue::Boolean(!v))
        }
        Expr::Neg { operand, .. } => {
            let v = as_int(eval(operand, ctx)?)?;
            Ok(SetValue::Arithmetic(-v))
        }
        Expr::Binary { op, lhs, rhs, range } => eval_binary(*op, eval(lhs, ctx)?, eval(rhs, ctx)?, *range, ctx),
        Expr::Call { name, args, range } => eval_call(name, args, *range, ctx),
        Expr::Substring { base, start, length, .. } => eval_substring(base, start, length, ctx),
        Expr::DupFactor { count, value, .. } => eval_dup_factor(count, value, ctx),
        Expr::Concat { parts, range } => {
            let mut out = String::new();
            for part in parts {
                out.push_str(&as_string(eval(part, ctx)?)?);
            }
            Ok(SetValue::Character(truncate(ctx, *range, out).into()))
        }
    }
}

fn eval_var(name: &str, subscript: Option<&Expr>, ctx: &EvalContext<'_>) -> Result<SetValue, EvalError> {
    if let Some(sub) = subscript {
        let index = as_int(eval(sub, ctx)?)? as usize;
        ctx.env
            .get_indexed(name, index)
            .cloned()
            .ok_or(EvalError::BadSubscript)
    } else {
        ctx.env.get_scalar(name).cloned().ok_or_else(|| EvalError::UndefinedVariable {
            name: name.into(),
            code: codes::E010,
        })
    }
}

fn eval_binary(op: BinOp, lhs: SetValue, rhs: SetValue, range: TextRange, ctx: &EvalContext<'_>) -> Result<SetValue, EvalError> {
    match op {
        BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div => {
            let a = as_int(lhs)?;
            let b = as_int(rhs)?;
            let result = match op {
                BinOp::Add => a.checked_add(b),
                BinOp::Sub => a.checked_sub(b),
                BinOp::Mul => a.checked_mul(b),
                BinOp::Div => {
                    if b == 0 {
                        return Err(EvalError::DivideByZero);
                    }
                    Some(a / b)
                }
                _ => unreachable!(),
            };
            Ok(SetValue::Arithmetic(result.unwrap_or(0)))
        }
        BinOp::Concat => {
            let mut s = as_string(lhs)?;
            s.push_str(&as_string(rhs)?);
            Ok(SetValue::Character(truncate(ctx, range, s).into()))
        }
        BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => eval_relational(op, lhs, rhs),
        BinOp::And | BinOp::Or | BinOp::Xor => {
            let a = as_bool(lhs)?;
            let b = as_bool(rhs)?;
            let result = match op {
                BinOp::And => a && b,
                BinOp::Or => a || b,
                BinOp::Xor => a != b,
                _ => unreachable!(),
            };
            Ok(SetValue::Boolean(result))
        }
    }
}

fn eval_relational(op: BinOp, lhs: SetValue, rhs: SetValue) -> Result<SetValue, EvalError> {
    use std::cmp::Ordering;
    let ordering = match (&lhs, &rhs) {
        (SetValue::Arithmetic(a), SetValue::Arithmetic(b)) => a.cmp(b),
        (SetValue::Character(a), SetValue::Character(b)) => a.cmp(b),
        (SetValue::Boolean(a), SetValue::Boolean(b)) => a.cmp(b),
        _ => return Err(EvalError::TypeMismatch),
    };
    let result = match op {
        BinOp::Eq => ordering == Ordering::Equal,
        BinOp::Ne => ordering != Ordering::Equal,
        BinOp::Lt => ordering == Ordering::Less,
        BinOp::Le => ordering != Ordering::Greater,
        BinOp::Gt => ordering == Ordering::Greater,
        BinOp::Ge => ordering != Ordering::Less,
        _ => unreachable!(),
    };
    Ok(SetValue::Boolean(result))
}

fn eval_call(name: &str, args: &[Expr], range: TextRange, ctx: &EvalContext<'_>) -> Result<SetValue, EvalError> {
    let values: Vec<SetValue> = args.iter().map(|a| eval(a, ctx)).collect::<Result<_, _>>()?;
    if values.iter().all(|v| matches!(v, SetValue::Arithmetic(_))) {
        let args: Vec<i32> = values
            .into_iter()
            .map(|v| match v {
                SetValue::Arithmetic(n) => n,
                _ => unreachable!(),
            })
            .collect();
        let mut bundle = ArgumentBundle::Arithmetic { args, result: 0 };
        let message = dispatch_external(name, ctx, &mut bundle)?;
        report_external_message(ctx, name, range, message);
        match bundle {
            ArgumentBundle::Arithmetic { result, .. } => Ok(SetValue::Arithmetic(result)),
            ArgumentBundle::Character { .. } => unreachable!(),
        }
    } else {
        let args: Vec<String> = values.into_iter().map(|v| as_string(v)).collect::<Result<_, _>>()?;
        let mut bundle = ArgumentBundle::Character { args, result: String::new() };
        let message = dispatch_external(name, ctx, &mut bundle)?;
        report_external_message(ctx, name, range, message);
        match bundle {
            ArgumentBundle::Character { result, .. } => Ok(SetValue::Character(truncate(ctx, range, result).into())),
            ArgumentBundle::Arithmetic { .. } => unreachable!(),
        }
    }
}

fn dispatch_external(name: &str, ctx: &EvalContext<'_>, bundle: &mut ArgumentBundle) -> Result<Option<Message>, EvalError> {
    ctx.externals.call(name, bundle).map_err(EvalError::ExternalCall)
}

/// Reports a dispatched external function's message as a diagnostic, per
/// spec §4.4 step 4: text prefixed with the function name, severity exactly
/// as the callee set it.
fn report_external_message(ctx: &EvalContext<'_>, name: &str, range: TextRange, message: Option<Message>) {
    let Some(message) = message else {
        return;
    };
    ctx.diagnostics.borrow_mut().push(CaDiagnostic {
        code: codes::EXT,
        severity: message.severity,
        message: format!("External function {name}: {}", message.text),
        range,
    });
}

fn eval_substring(base: &Expr, start: &Expr, length: &Expr, ctx: &EvalContext<'_>) -> Result<SetValue, EvalError> {
    let base = as_string(eval(base, ctx)?)?;
    let start = as_int(eval(start, ctx)?)?;
    let length = as_int(eval(length, ctx)?)?;
    let chars: Vec<char> = base.chars().collect();
    if start < 1 || length < 0 || (start as usize) > chars.len() {
        return Ok(SetValue::Character(SmolStr::default()));
    }
    let start = start as usize;
    let available = chars.len() - (start - 1);
    let length = (length as usize).min(available);
    let slice: String = chars[start - 1..start - 1 + length].iter().collect();
    Ok(SetValue::Character(slice.into()))
}

fn eval_dup_factor(count: &Expr, value: &Expr, ctx: &EvalContext<'_>) -> Result<SetValue, EvalError> {
    let count = as_int(eval(count, ctx)?)?;
    let value = as_string(eval(value, ctx)?)?;
    if count <= 0 {
        return Ok(SetValue::Character(SmolStr::default()));
    }
    let count = count as usize;
    if count.saturating_mul(value.len()) > MAX_STR_SIZE {
        return Err(EvalError::DuplicationOverflow { code: codes::CE011 });
    }
    Ok(SetValue::Character(value.repeat(count).into()))
}

/// Truncates `s` to [`MAX_STR_SIZE`], reporting `W019` if it had to.
fn truncate(ctx: &EvalContext<'_>, range: TextRange, mut s: String) -> String {
    if s.len() > MAX_STR_SIZE {
        s.truncate(MAX_STR_SIZE);
        ctx.diagnostics.borrow_mut().push(CaDiagnostic {
            code: codes::W019,
            severity: Severity::Warning,
            message: format!("character result truncated to {MAX_STR_SIZE} characters"),
            range,
        });
    }
    s
}

fn as_int(v: SetValue) -> Result<i32, EvalError> {
    match v {
        SetValue::Arithmetic(n) => Ok(n),
        _ => Err(EvalError::TypeMismatch),
    }
}

fn as_bool(v: SetValue) -> Result<bool, EvalError> {
    match v {
        SetValue::Boolean(b) => Ok(b),
        _ => Err(EvalError::TypeMismatch),
    }
}

fn as_string(v: SetValue) -> Result<String, EvalError> {
    match v {
        SetValue::Character(s) => Ok(s.to_string()),
        _ => Err(EvalError::TypeMismatch),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external_fn::{Arity, ExternalFunction, ExternalFunctionRegistry, ExternalFunctionType};

    fn r() -> TextRange {
        TextRange::new(0.into(), 0.into())
    }

    fn int_lit(n: i32) -> Expr {
        Expr::IntLit { value: n, range: r() }
    }

    fn str_lit(s: &str) -> Expr {
        Expr::StrLit { value: s.into(), range: r() }
    }

    struct Fixture {
        env: Environment,
        externals: ExternalFunctionRegistry,
        diagnostics: RefCell<Vec<CaDiagnostic>>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                env: Environment::new(),
                externals: ExternalFunctionRegistry::new(),
                diagnostics: RefCell::new(Vec::new()),
            }
        }

        fn ctx(&self) -> EvalContext<'_> {
            EvalContext {
                env: &self.env,
                externals: &self.externals,
                diagnostics: &self.diagnostics,
            }
        }
    }

    #[test]
    fn arithmetic_add() {
        let fx = Fixture::new();
        let expr = Expr::Binary {
            op: BinOp::Add,
            lhs: Box::new(int_lit(2)),
            rhs: Box::new(int_lit(3)),
            range: r(),
        };
        assert_eq!(eval(&expr, &fx.ctx()), Ok(SetValue::Arithmetic(5)));
    }

    #[test]
    fn division_by_zero_is_an_error() {
        let fx = Fixture::new();
        let expr = Expr::Binary {
            op: BinOp::Div,
            lhs: Box::new(int_lit(1)),
            rhs: Box::new(int_lit(0)),
            range: r(),
        };
        assert_eq!(eval(&expr, &fx.ctx()), Err(EvalError::DivideByZero));
    }

    #[test]
    fn concat_joins_characters() {
        let fx = Fixture::new();
        let expr = Expr::Binary {
            op: BinOp::Concat,
            lhs: Box::new(str_lit("AB")),
            rhs: Box::new(str_lit("CD")),
            range: r(),
        };
        assert_eq!(eval(&expr, &fx.ctx()), Ok(SetValue::Character("ABCD".into())));
        assert!(fx.diagnostics.borrow().is_empty());
    }

    #[test]
    fn concat_truncation_emits_w019() {
        let fx = Fixture::new();
        let expr = Expr::Binary {
            op: BinOp::Concat,
            lhs: Box::new(str_lit(&"A".repeat(MAX_STR_SIZE))),
            rhs: Box::new(str_lit("BB")),
            range: r(),
        };
        let SetValue::Character(result) = eval(&expr, &fx.ctx()).unwrap() else {
            panic!("expected character result");
        };
        assert_eq!(result.len(), MAX_STR_SIZE);
        let diags = fx.diagnostics.borrow();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, codes::W019);
        assert_eq!(diags[0].severity, Severity::Warning);
    }

    #[test]
    fn substring_extracts_slice() {
        let fx = Fixture::new();
        let expr = Expr::Substring {
            base: Box::new(str_lit("ABCDEF")),
            start: Box::new(int_lit(2)),
            length: Box::new(int_lit(3)),
            range: r(),
        };
        assert_eq!(eval(&expr, &fx.ctx()), Ok(SetValue::Character("BCD".into())));
    }

    #[test]
    fn substring_length_past_end_clamps_instead_of_erroring() {
        let fx = Fixture::new();
        let expr = Expr::Substring {
            base: Box::new(str_lit("AB")),
            start: Box::new(int_lit(1)),
            length: Box::new(int_lit(10)),
            range: r(),
        };
        assert_eq!(eval(&expr, &fx.ctx()), Ok(SetValue::Character("AB".into())));
    }

    #[test]
    fn substring_start_past_end_is_empty() {
        let fx = Fixture::new();
        let expr = Expr::Substring {
            base: Box::new(str_lit("AB")),
            start: Box::new(int_lit(5)),
            length: Box::new(int_lit(1)),
            range: r(),
        };
        assert_eq!(eval(&expr, &fx.ctx()), Ok(SetValue::Character("".into())));
    }

    #[test]
    fn dup_factor_repeats_value() {
        let fx = Fixture::new();
        let expr = Expr::DupFactor {
            count: Box::new(int_lit(3)),
            value: Box::new(str_lit("AB")),
            range: r(),
        };
        assert_eq!(eval(&expr, &fx.ctx()), Ok(SetValue::Character("ABABAB".into())));
    }

    #[test]
    fn dup_factor_overflow_is_ce011_without_allocating() {
        let fx = Fixture::new();
        let expr = Expr::DupFactor {
            count: Box::new(int_lit(10_000)),
            value: Box::new(str_lit("A")),
            range: r(),
        };
        assert_eq!(
            eval(&expr, &fx.ctx()),
            Err(EvalError::DuplicationOverflow { code: codes::CE011 })
        );
    }

    #[test]
    fn undefined_variable_is_e010() {
        let fx = Fixture::new();
        let expr = Expr::Var {
            name: "X".into(),
            subscript: None,
            range: r(),
        };
        assert_eq!(
            eval(&expr, &fx.ctx()),
            Err(EvalError::UndefinedVariable {
                name: "X".into(),
                code: codes::E010
            })
        );
    }

    #[test]
    fn external_function_message_becomes_a_prefixed_diagnostic() {
        let mut fx = Fixture::new();
        fx.externals
            .register(
                "MSG",
                ExternalFunction::new(ExternalFunctionType::Arithmetic, Arity::exact(2), |bundle| {
                    if let ArgumentBundle::Arithmetic { result, .. } = bundle {
                        *result = 0;
                    }
                    Some(Message { severity: Severity::Info, text: "EXTERNAL".to_string() })
                }),
            )
            .unwrap();
        let expr = Expr::Call {
            name: "MSG".into(),
            args: vec![int_lit(1), int_lit(2)],
            range: r(),
        };
        let result = eval(&expr, &fx.ctx());
        assert_eq!(result, Ok(SetValue::Arithmetic(0)));
        let diags = fx.diagnostics.borrow();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, codes::EXT);
        assert_eq!(diags[0].severity, Severity::Info);
        assert_eq!(diags[0].message, "External function MSG: EXTERNAL");
    }
}

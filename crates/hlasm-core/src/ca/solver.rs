//! Undefined-attribute collection.
//!
//! Grounded in `ca_expression::get_undefined_attributed_symbols`: before
//! evaluating, `AIF`/`SETx` operands are walked to find variable references
//! that have not been declared, so the caller can decide whether to treat
//! the statement as conditionally skippable (e.g. inside a macro prototype,
//! where `&VAR` may be a not-yet-bound parameter) or emit a diagnostic.

use hlasm_syntax::ca::Expr;
use smol_str::SmolStr;

use super::values::Environment;

/// Collects the names of every variable symbol referenced in `expr` that is
/// not currently declared in `env`, in depth-first order, without
/// duplicates.
#[must_use]
pub fn undefined_variables(expr: &Expr, env: &Environment) -> Vec<SmolStr> {
    let mut out = Vec::new();
    collect(expr, env, &mut out);
    out
}

fn collect(expr: &Expr, env: &Environment, out: &mut Vec<SmolStr>) {
    match expr {
        Expr::IntLit { .. } | Expr::StrLit { .. } => {}
        Expr::Var { name, subscript, .. } => {
            if !env.is_declared(name) && !out.contains(name) {
                out.push(name.clone());
            }
            if let Some(sub) = subscript {
                collect(sub, env, out);
            }
        }
        Expr::Not { operand, .. } | Expr::Neg { operand, .. } => collect(operand, env, out),
        Expr::Binary { lhs, rhs, .. } => {
            collect(lhs, env, out);
            collect(rhs, env, out);
        }
        Expr::Call { args, .. } => {
            for arg in args {
                collect(arg, env, out);
            }
        }
        Expr::Substring { base, start, length, .. } => {
            collect(base, env, out);
            collect(start, env, out);
            collect(length, env, out);
        }
        Expr::DupFactor { count, value, .. } => {
            collect(count, env, out);
            collect(value, env, out);
        }
        Expr::Concat { parts, .. } => {
            for part in parts {
                collect(part, env, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ca::values::SetValueKind;
    use hlasm_syntax::ca::Expr;
    use text_size::TextRange;

    fn var(name: &str) -> Expr {
        Expr::Var {
            name: name.into(),
            subscript: None,
            range: TextRange::new(0.into(), 0.into()),
        }
    }

    #[test]
    fn finds_single_undefined_var() {
        let env = Environment::new();
        let undefined = undefined_variables(&var("X"), &env);
        assert_eq!(undefined, vec![SmolStr::from("X")]);
    }

    #[test]
    fn declared_var_is_not_undefined() {
        let mut env = Environment::new();
        env.declare_scalar("X", SetValueKind::Arithmetic);
        let undefined = undefined_variables(&var("X"), &env);
        assert!(undefined.is_empty());
    }

    #[test]
    fn dedups_repeated_references() {
        let env = Environment::new();
        let expr = Expr::Binary {
            op: hlasm_syntax::ca::BinOp::Add,
            lhs: Box::new(var("X")),
            rhs: Box::new(var("X")),
            range: TextRange::new(0.into(), 0.into()),
        };
        let undefined = undefined_variables(&expr, &env);
        assert_eq!(undefined, vec![SmolStr::from("X")]);
    }
}

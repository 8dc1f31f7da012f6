//! The `SETAF`/`SETCF` external function registry.
//!
//! Grounded in `examples/original_source/parser_library/include/external_functions.h`:
//! an external function is a named callback that mutates an argument bundle
//! in place (arithmetic: `i32` args and an `i32` result, or character:
//! `String` args and a `String` result) and may additionally attach a
//! severity-tagged message, matching `external_function_args`'s `message()`
//! accessor.

use rustc_hash::FxHashMap;
use std::rc::Rc;

use crate::diagnostics::{codes, Severity};

/// The argument/result bundle passed to an external function call.
///
/// Equivalent to `external_function_args`: exactly one of the two shapes is
/// active for a given call, decided by how the function was registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgumentBundle {
    /// A SETA-typed (arithmetic) call.
    Arithmetic {
        /// Argument values.
        args: Vec<i32>,
        /// The call's result, written by the function body.
        result: i32,
    },
    /// A SETC-typed (character) call.
    Character {
        /// Argument values.
        args: Vec<String>,
        /// The call's result, written by the function body.
        result: String,
    },
}

impl ArgumentBundle {
    /// The discriminant matching this bundle's shape, for arity/type checks.
    #[must_use]
    pub fn kind(&self) -> ExternalFunctionType {
        match self {
            ArgumentBundle::Arithmetic { .. } => ExternalFunctionType::Arithmetic,
            ArgumentBundle::Character { .. } => ExternalFunctionType::Character,
        }
    }

    /// The argument count, regardless of shape.
    #[must_use]
    pub fn arg_count(&self) -> usize {
        match self {
            ArgumentBundle::Arithmetic { args, .. } => args.len(),
            ArgumentBundle::Character { args, .. } => args.len(),
        }
    }
}

/// Which SETx family an external function operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExternalFunctionType {
    /// SETA-typed.
    Arithmetic,
    /// SETC-typed.
    Character,
}

/// A severity-tagged message an external function attaches to its result,
/// e.g. a deprecation notice or an out-of-range warning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Message severity.
    pub severity: Severity,
    /// Message text.
    pub text: String,
}

/// An external function's expected arity, used to produce `E022` without
/// invoking the body when the call site passes the wrong argument count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arity {
    /// Minimum accepted argument count.
    pub min: usize,
    /// Maximum accepted argument count.
    pub max: usize,
}

impl Arity {
    /// An external function taking exactly `n` arguments.
    #[must_use]
    pub fn exact(n: usize) -> Self {
        Self { min: n, max: n }
    }

    #[must_use]
    fn accepts(self, count: usize) -> bool {
        (self.min..=self.max).contains(&count)
    }
}

type Body = Rc<dyn Fn(&mut ArgumentBundle) -> Option<Message>>;

/// A registered external function: its expected type/arity and its body.
#[derive(Clone)]
pub struct ExternalFunction {
    kind: ExternalFunctionType,
    arity: Arity,
    body: Body,
}

impl std::fmt::Debug for ExternalFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExternalFunction")
            .field("kind", &self.kind)
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}

impl ExternalFunction {
    /// Defines a new external function.
    pub fn new(kind: ExternalFunctionType, arity: Arity, body: impl Fn(&mut ArgumentBundle) -> Option<Message> + 'static) -> Self {
        Self {
            kind,
            arity,
            body: Rc::new(body),
        }
    }
}

/// A call that could not be dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExternalCallError {
    /// No function is registered under this name.
    UnknownFunction {
        /// The code this error should be reported under (`E083`).
        code: &'static str,
    },
    /// The call site's argument bundle does not match the function's
    /// declared type or arity.
    ArgumentMismatch {
        /// The code this error should be reported under (`E022`).
        code: &'static str,
    },
}

/// The set of external functions available to `SETAF`/`SETCF` statements in
/// a given assembly, keyed case-insensitively.
///
/// Equivalent to `external_functions_list`, generalized into a lookup map
/// since the registry is populated once and then queried by name many times.
#[derive(Debug, Default)]
pub struct ExternalFunctionRegistry {
    functions: FxHashMap<String, (String, ExternalFunction)>,
}

impl ExternalFunctionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a function under `name`. Names are matched case-insensitively;
    /// registering a name that collides (case-insensitively) with an existing
    /// entry is a [`crate::CoreError::DuplicateExternalFunction`].
    pub fn register(&mut self, name: impl Into<String>, function: ExternalFunction) -> Result<(), crate::CoreError> {
        let name = name.into();
        let key = name.to_ascii_uppercase();
        if self.functions.contains_key(&key) {
            return Err(crate::CoreError::DuplicateExternalFunction(name));
        }
        self.functions.insert(key, (name, function));
        Ok(())
    }

    /// `true` if a function is registered under `name`, case-insensitively.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(&name.to_ascii_uppercase())
    }

    /// Invokes the function registered under `name` against `bundle`.
    pub fn call(&self, name: &str, bundle: &mut ArgumentBundle) -> Result<Option<Message>, ExternalCallError> {
        let Some((_, function)) = self.functions.get(&name.to_ascii_uppercase()) else {
            return Err(ExternalCallError::UnknownFunction { code: codes::E083 });
        };
        if function.kind != bundle.kind() || !function.arity.accepts(bundle.arg_count()) {
            return Err(ExternalCallError::ArgumentMismatch { code: codes::E022 });
        }
        Ok((function.body)(bundle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_function_is_e083() {
        let registry = ExternalFunctionRegistry::new();
        let mut bundle = ArgumentBundle::Arithmetic { args: vec![1], result: 0 };
        let err = registry.call("NOPE", &mut bundle).unwrap_err();
        assert_eq!(err, ExternalCallError::UnknownFunction { code: codes::E083 });
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut registry = ExternalFunctionRegistry::new();
        let f = ExternalFunction::new(ExternalFunctionType::Arithmetic, Arity::exact(1), |_| None);
        registry.register("ADD1", f.clone()).unwrap();
        let err = registry.register("add1", f).unwrap_err();
        assert!(matches!(err, crate::CoreError::DuplicateExternalFunction(_)));
    }

    #[test]
    fn wrong_arity_is_e022() {
        let mut registry = ExternalFunctionRegistry::new();
        let f = ExternalFunction::new(ExternalFunctionType::Arithmetic, Arity::exact(1), |_| None);
        registry.register("ADD1", f).unwrap();
        let mut bundle = ArgumentBundle::Arithmetic { args: vec![1, 2], result: 0 };
        let err = registry.call("ADD1", &mut bundle).unwrap_err();
        assert_eq!(err, ExternalCallError::ArgumentMismatch { code: codes::E022 });
    }

    #[test]
    fn case_insensitive_call_runs_body() {
        let mut registry = ExternalFunctionRegistry::new();
        let f = ExternalFunction::new(ExternalFunctionType::Arithmetic, Arity::exact(1), |bundle| {
            if let ArgumentBundle::Arithmetic { args, result } = bundle {
                *result = args[0] + 1;
            }
            None
        });
        registry.register("ADD1", f).unwrap();
        let mut bundle = ArgumentBundle::Arithmetic { args: vec![41], result: 0 };
        registry.call("add1", &mut bundle).unwrap();
        assert_eq!(bundle, ArgumentBundle::Arithmetic { args: vec![41], result: 42 });
    }
}

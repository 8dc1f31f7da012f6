//! The CA variable environment: SETA/SETB/SETC storage.

use hlasm_syntax::ca::SetValue;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

/// A single SET variable's storage: either a scalar value or an array of
/// them (HLASM's subscripted `&VAR(n)` symbols), always of one fixed SETx kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VarStorage {
    /// A single, unsubscripted value.
    Scalar(SetValue),
    /// An array, accessed with a 1-based subscript.
    Array(Vec<SetValue>),
}

impl VarStorage {
    /// The default value for a freshly declared variable of this kind:
    /// SETA defaults to 0, SETB to false, SETC to the empty string.
    #[must_use]
    pub fn default_of_kind(kind: SetValueKind) -> SetValue {
        match kind {
            SetValueKind::Arithmetic => SetValue::Arithmetic(0),
            SetValueKind::Boolean => SetValue::Boolean(false),
            SetValueKind::Character => SetValue::Character(SmolStr::default()),
        }
    }
}

/// Which of the three SETx families a value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetValueKind {
    /// SETA.
    Arithmetic,
    /// SETB.
    Boolean,
    /// SETC.
    Character,
}

impl SetValue {
    /// This value's SETx kind.
    #[must_use]
    pub fn kind(&self) -> SetValueKind {
        match self {
            SetValue::Arithmetic(_) => SetValueKind::Arithmetic,
            SetValue::Boolean(_) => SetValueKind::Boolean,
            SetValue::Character(_) => SetValueKind::Character,
        }
    }
}

/// The live variable environment a CA expression is evaluated against: all
/// currently declared SET symbols, global or local.
#[derive(Debug, Default)]
pub struct Environment {
    vars: FxHashMap<SmolStr, VarStorage>,
}

impl Environment {
    /// Creates an empty environment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a scalar variable with its default value.
    pub fn declare_scalar(&mut self, name: impl Into<SmolStr>, kind: SetValueKind) {
        self.vars
            .insert(name.into(), VarStorage::Scalar(VarStorage::default_of_kind(kind)));
    }

    /// Declares an array variable of `len` elements, each defaulted.
    pub fn declare_array(&mut self, name: impl Into<SmolStr>, kind: SetValueKind, len: usize) {
        let values = std::iter::repeat_with(|| VarStorage::default_of_kind(kind)).take(len).collect();
        self.vars.insert(name.into(), VarStorage::Array(values));
    }

    /// Sets a scalar variable's value, declaring it if not already present.
    pub fn set_scalar(&mut self, name: impl Into<SmolStr>, value: SetValue) {
        self.vars.insert(name.into(), VarStorage::Scalar(value));
    }

    /// Sets an element of an array variable by its 1-based subscript.
    ///
    /// Returns `false` if the variable is not an array or the subscript is
    /// out of bounds.
    pub fn set_indexed(&mut self, name: &str, index: usize, value: SetValue) -> bool {
        match self.vars.get_mut(name) {
            Some(VarStorage::Array(values)) if index >= 1 && index <= values.len() => {
                values[index - 1] = value;
                true
            }
            _ => false,
        }
    }

    /// Reads a scalar variable's current value.
    #[must_use]
    pub fn get_scalar(&self, name: &str) -> Option<&SetValue> {
        match self.vars.get(name) {
            Some(VarStorage::Scalar(value)) => Some(value),
            _ => None,
        }
    }

    /// Reads an array variable's element by its 1-based subscript.
    #[must_use]
    pub fn get_indexed(&self, name: &str, index: usize) -> Option<&SetValue> {
        match self.vars.get(name) {
            Some(VarStorage::Array(values)) if index >= 1 && index <= values.len() => Some(&values[index - 1]),
            _ => None,
        }
    }

    /// `true` if `name` has been declared (scalar or array).
    #[must_use]
    pub fn is_declared(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    /// The declared kind of a variable, if declared.
    #[must_use]
    pub fn kind_of(&self, name: &str) -> Option<SetValueKind> {
        match self.vars.get(name)? {
            VarStorage::Scalar(v) => Some(v.kind()),
            VarStorage::Array(values) => values.first().map(SetValue::kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_round_trips() {
        let mut env = Environment::new();
        env.declare_scalar("X", SetValueKind::Arithmetic);
        assert_eq!(env.get_scalar("X"), Some(&SetValue::Arithmetic(0)));
        env.set_scalar("X", SetValue::Arithmetic(5));
        assert_eq!(env.get_scalar("X"), Some(&SetValue::Arithmetic(5)));
    }

    #[test]
    fn array_subscript_bounds() {
        let mut env = Environment::new();
        env.declare_array("ARR", SetValueKind::Character, 3);
        assert!(env.set_indexed("ARR", 2, SetValue::Character("hi".into())));
        assert!(!env.set_indexed("ARR", 4, SetValue::Character("no".into())));
        assert_eq!(env.get_indexed("ARR", 2), Some(&SetValue::Character("hi".into())));
        assert_eq!(env.get_indexed("ARR", 4), None);
    }
}

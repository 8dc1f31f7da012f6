//! Diagnostics and well-known HLASM error codes.
//!
//! Codes follow the assembler's own `E`/`W`/`CE`/`S` numbering so that users
//! familiar with the mainframe assembler's listings recognize them (e.g.
//! `E049` is reused from the original diagnostic catalogue, not invented
//! here).

use hlasm_syntax::Range;
use smol_str::SmolStr;

use crate::location::ResourceLocation;

/// Diagnostic severity, matching LSP's four levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Blocks correct assembly.
    Error,
    /// Worth fixing but not fatal.
    Warning,
    /// Informational.
    Info,
    /// Purely advisory.
    Hint,
}

/// A single diagnostic message attached to a range within a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// The resource the diagnostic applies to.
    pub resource: ResourceLocation,
    /// The range within the resource.
    pub range: Range,
    /// Severity.
    pub severity: Severity,
    /// The diagnostic code, e.g. `"E049"`.
    pub code: SmolStr,
    /// Human-readable message text.
    pub message: String,
}

impl Diagnostic {
    /// Builds a diagnostic, interning the code as a [`SmolStr`].
    #[must_use]
    pub fn new(
        resource: ResourceLocation,
        range: Range,
        severity: Severity,
        code: impl Into<SmolStr>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            resource,
            range,
            severity,
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Well-known diagnostic codes referenced by the CA expression evaluator and
/// external function registry.
pub mod codes {
    /// Unknown or duplicate external function name at `SETAF`/`SETCF` call site.
    pub const E083: &str = "E083";
    /// Wrong argument count or type for an external function call.
    pub const E022: &str = "E022";
    /// A character result was truncated to the SETC length limit.
    pub const W019: &str = "W019";
    /// A duplication factor's repeat count times its operand's length
    /// exceeded the SETC length limit.
    pub const CE011: &str = "CE011";
    /// Undefined SET symbol referenced before assignment.
    pub const E010: &str = "E010";
    /// An external function call set a `message`, reported as a diagnostic.
    pub const EXT: &str = "EXT";
}

#[cfg(test)]
mod tests {
    use super::*;
    use hlasm_syntax::Position;

    #[test]
    fn diagnostic_carries_code_and_range() {
        let d = Diagnostic::new(
            ResourceLocation::new("file:///a.hlasm"),
            Range::at(Position::new(3, 0)),
            Severity::Error,
            codes::E083,
            "unknown external function FOO",
        );
        assert_eq!(d.code, "E083");
        assert_eq!(d.severity, Severity::Error);
    }
}

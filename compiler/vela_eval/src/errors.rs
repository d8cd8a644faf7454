//! Errors raised while turning an expression tree into closures.

use vela_ir::Name;

/// Compilation error.
///
/// Compilation is structural: it fails only for trees that could never be
/// evaluated, never because of the values they will later see.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CompileError {
    /// The tree references a parameter that is not the lambda's own.
    #[error("variable '{name}' of type '{ty}' referenced from scope '', but it is not defined")]
    UnboundParameter { name: Name, ty: Name },

    /// A call supplies the wrong number of arguments.
    #[error("method '{method}' expects {expected} argument(s), got {got}")]
    ArityMismatch {
        method: Name,
        expected: usize,
        got: usize,
    },

    /// A conditional test or logical operand is not statically `bool`.
    #[error("expression '{expression}' must be of type 'bool', found '{found}'")]
    NotBoolean { expression: String, found: Name },
}

//! Errors raised while naming or describing model expressions.
//!
//! Compiling an accessor never fails: unsupported shapes are reported as
//! `None`. These errors come from the paths that must evaluate part of an
//! expression (indexer arguments) or that only accept a few shapes (metadata).

use vela_eval::CompileError;
use vela_ir::{EvalError, Name};

/// Error produced by expression text and metadata resolution.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ExpressionError {
    /// The index argument does not compile without the model, typically
    /// because it reads the lambda's parameter.
    #[error(
        "the expression compiler was unable to evaluate the indexer expression '{expression}' \
         because it references the model parameter '{parameter}' which is unavailable"
    )]
    InvalidIndexerExpression {
        /// Text of the index argument.
        expression: String,
        /// Name of the lambda's parameter.
        parameter: Name,
        #[source]
        source: CompileError,
    },

    /// The index argument compiled on its own but failed when evaluated.
    #[error("the expression compiler was unable to evaluate the indexer expression '{expression}'")]
    IndexerEvaluation {
        expression: String,
        #[source]
        source: EvalError,
    },

    #[error(
        "templates can be used only with field access, property access, single-dimension \
         array index, or single-parameter custom indexer expressions"
    )]
    TemplateLimitations,

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Eval(#[from] EvalError),
}

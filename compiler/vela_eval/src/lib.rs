//! Vela Eval - closure compiler for expression trees.
//!
//! Turns a [`Lambda`](vela_ir::Lambda) into a `Send + Sync` closure. This is the
//! "compile the expression directly" path: the accessor compiler uses it both
//! for trees it has rewritten and as the uncached fallback for shapes it does
//! not recognize.
//!
//! # Architecture
//!
//! - `compile`: tree to closure tree, one closure per node
//! - `evaluate_binary`: direct enum dispatch for strict binary operators
//! - `ensure_sufficient_stack`: stack growth around recursive compilation

mod compile;
mod errors;
mod operators;
mod stack;

pub use compile::{compile, compile_null_tolerant, CompiledFn};
pub use errors::CompileError;
pub use operators::evaluate_binary;
pub use stack::ensure_sufficient_stack;

// Re-export runtime error types for convenience
pub use vela_ir::{EvalError, EvalResult};

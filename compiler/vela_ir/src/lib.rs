//! Vela IR - expression trees and the runtime model they read.
//!
//! This crate contains the data structures shared by the evaluator and the
//! accessor compiler:
//! - `Name`: interned identifiers
//! - `Type`, `Member`, `Method`: the runtime type model (getters replace reflection)
//! - `Value`, `Record`: runtime values
//! - `Expr`, `Lambda`, `Parameter`: immutable expression trees
//! - `EvalError`: runtime failures raised by getters and evaluation
//!
//! # Design Philosophy
//!
//! - **Intern names**: member identity is `(declaring type, member)` as two `Name`s
//! - **Share sub-trees**: nodes are `Arc`s so rewrites reuse what they keep
//! - **Immutable inputs**: nothing in this workspace mutates a tree after it is built

mod errors;
mod expr;
pub mod interner;
mod name;
mod types;
mod value;

pub use errors::{EvalError, EvalResult};
pub use expr::{BinaryOp, Expr, ExprKind, ExprRef, Lambda, Parameter, ParameterDef};
pub use name::{Name, SYNTHESIZED_MARKER};
pub use types::{
    Getter, Invoker, Member, MemberInfo, MemberKey, MemberKind, Method, MethodInfo, PropertyDecl,
    Type, TypeBuilder, TypeDef, TypeKind,
};
pub use value::{Record, Value};

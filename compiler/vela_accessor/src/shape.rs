//! Shape classification of accessor lambdas.
//!
//! The classifier looks at a lambda's body once and names the pattern it
//! matches. Rules are tried in a fixed order; later rules rely on earlier ones
//! having excluded the simpler shapes (a member on a constant is a captured
//! local before it is ever considered as a chain).

use vela_ir::{Expr, ExprKind, ExprRef, Lambda, Member, Method, Value};

/// Recognized shape of an accessor lambda, with the data the rewriter needs.
#[derive(Clone, Debug)]
pub enum Shape<'a> {
    /// `m => m`.
    Identity,
    /// `m => <constant>`.
    Constant(&'a Value),
    /// `m => closure.Local`: a member read from a captured constant.
    CapturedConstant { member: &'a Member, value: &'a Value },
    /// `m => Type.Member`.
    StaticMember(&'a Member),
    /// `m => m.Member`.
    SimpleMember(&'a Member),
    /// `m => m.A.B...`: a member reached from the parameter through at least
    /// one other member access. `terminal` is the outermost member.
    ChainedMember { terminal: &'a Member },
    /// `m => x.get_Item(i)` where `get_Item` is the getter of the target
    /// type's default indexer property.
    SingleArgumentIndexer(&'a Method),
    /// `m => xs[i]` over a single-dimensional array.
    ArrayIndex,
    /// Anything else.
    Unsupported,
}

impl Shape<'_> {
    /// Short name used in logs.
    pub fn label(&self) -> &'static str {
        match self {
            Shape::Identity => "identity",
            Shape::Constant(_) => "constant",
            Shape::CapturedConstant { .. } => "captured-constant",
            Shape::StaticMember(_) => "static-member",
            Shape::SimpleMember(_) => "simple-member",
            Shape::ChainedMember { .. } => "chained-member",
            Shape::SingleArgumentIndexer(_) => "indexer",
            Shape::ArrayIndex => "array-index",
            Shape::Unsupported => "unsupported",
        }
    }

    /// Whether accessors of this shape may be stored in the accessor cache.
    pub fn is_cacheable(&self) -> bool {
        !matches!(
            self,
            Shape::Constant(_)
                | Shape::SingleArgumentIndexer(_)
                | Shape::ArrayIndex
                | Shape::Unsupported
        )
    }
}

/// Classify `lambda` by the shape of its body.
pub fn classify(lambda: &Lambda) -> Shape<'_> {
    let body = lambda.body();
    let parameter = lambda.parameter();

    match body.kind() {
        ExprKind::Parameter(p) if p == parameter => Shape::Identity,
        ExprKind::Constant(value) => Shape::Constant(value),
        ExprKind::Member { target, member } => match target.as_deref().map(Expr::kind) {
            Some(ExprKind::Constant(value)) => Shape::CapturedConstant { member, value },
            None => Shape::StaticMember(member),
            Some(ExprKind::Parameter(p)) if p == parameter => Shape::SimpleMember(member),
            Some(ExprKind::Member { .. }) if is_chained_member(body, lambda) => {
                Shape::ChainedMember { terminal: member }
            }
            Some(_) => Shape::Unsupported,
        },
        ExprKind::Call {
            target: Some(_),
            method,
            args,
        } if is_single_argument_indexer(method, args) => Shape::SingleArgumentIndexer(method),
        ExprKind::ArrayIndex { .. } => Shape::ArrayIndex,
        _ => Shape::Unsupported,
    }
}

/// Whether `expr` is a run of instance member accesses ending at the lambda's
/// own parameter.
pub fn is_chained_member(expr: &ExprRef, lambda: &Lambda) -> bool {
    let mut current = expr;
    loop {
        match current.kind() {
            ExprKind::Member {
                target: Some(target),
                ..
            } => current = target,
            ExprKind::Parameter(p) => return p == lambda.parameter(),
            _ => return false,
        }
    }
}

/// Whether a call to `method` with `args` is a read through the declaring
/// type's default indexer: exactly one argument, and the method is the getter
/// of the property named by the type's default member.
pub fn is_single_argument_indexer(method: &Method, args: &[ExprRef]) -> bool {
    args.len() == 1 && method.declaring_type().indexer_getter() == Some(method.name())
}

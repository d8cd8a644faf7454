//! Null-safe rewriting.
//!
//! `m => m.Address.City` fails when `Address` is null. The rewriter turns it
//! into
//!
//! ```text
//! m => (m === null || m.Address === null) ? (object)null : (object)m.Address.City
//! ```
//!
//! Tests are ordered from the parameter outward so `||` stops before a member
//! of a null value is read, and the whole chain needs one compiled closure.

use std::sync::Arc;

use vela_ir::{Expr, ExprKind, ExprRef, Lambda, Member, Parameter, Type};

/// Null test for `expr`, if its static type admits null.
///
/// Reference types compare by identity with null; nullable value types use
/// lifted `==`. Plain value types can never be null and get no test.
fn null_test(expr: &ExprRef) -> Option<ExprRef> {
    let ty = expr.ty();
    if !ty.can_be_null() {
        return None;
    }
    let null = Expr::null(ty);
    Some(if ty.is_nullable() {
        Expr::equal(expr, &null)
    } else {
        Expr::reference_equal(expr, &null)
    })
}

/// `(object)expr` for value types; reference types are already `object`
/// compatible.
fn boxed(expr: &ExprRef) -> ExprRef {
    if expr.ty().is_value_type() {
        Expr::convert(expr, &Type::object())
    } else {
        Arc::clone(expr)
    }
}

/// Rewrite a simple or chained member lambda so any null on the way to the
/// terminal member yields null.
///
/// Every target between the body and the parameter is tested, the parameter
/// included.
pub fn null_safe(lambda: &Lambda) -> Lambda {
    let body = lambda.body();
    let mut combined: Option<ExprRef> = None;
    let mut current = body;
    while let ExprKind::Member {
        target: Some(target),
        ..
    } = current.kind()
    {
        if let Some(test) = null_test(target) {
            // Inner targets go first.
            combined = Some(match combined {
                Some(outer) => Expr::or_else(&test, &outer),
                None => test,
            });
        }
        current = target;
    }

    let tail = boxed(body);
    let rewritten = match combined {
        Some(test) => Expr::condition(&test, &Expr::null(&Type::object()), &tail),
        None => tail,
    };
    Lambda::with_return_type(lambda.parameter().clone(), rewritten, &Type::object())
}

/// `m => (object)Type.Member` for a static member.
pub fn static_access(lambda: &Lambda) -> Lambda {
    Lambda::with_return_type(
        lambda.parameter().clone(),
        boxed(lambda.body()),
        &Type::object(),
    )
}

/// `capturedLocal => (object)((DeclaringType)capturedLocal).Member`.
///
/// The projection reads `member` from whatever value it is given, so one
/// compiled projection serves every captured instance; the captured value is
/// supplied when the accessor runs.
pub fn captured_projection(member: &Member) -> Lambda {
    let captured = Parameter::new("capturedLocal", &Type::object());
    let cast = Expr::convert(&Expr::parameter(&captured), member.declaring_type());
    let body = boxed(&Expr::member(&cast, member));
    Lambda::with_return_type(captured, body, &Type::object())
}

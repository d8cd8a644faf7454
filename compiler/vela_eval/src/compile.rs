//! Closure compilation of expression trees.
//!
//! Each node becomes a boxed closure that evaluates its children and then
//! itself; the lambda's parameter node returns the argument. All name and type
//! resolution happens here, once, so evaluating a compiled tree only calls
//! closures and the getters captured in members.

use std::sync::Arc;

use vela_ir::{
    BinaryOp, EvalError, EvalResult, Expr, ExprKind, Lambda, Name, Parameter, Type, Value,
};

use crate::errors::CompileError;
use crate::operators::evaluate_binary;
use crate::stack::ensure_sufficient_stack;

/// Compiled node: evaluates against the lambda argument.
type Node = Box<dyn Fn(&Value) -> EvalResult + Send + Sync>;

/// Compiled single-parameter function.
pub type CompiledFn = Arc<dyn Fn(&Value) -> EvalResult + Send + Sync>;

/// Compile `lambda` into a callable closure.
///
/// The returned function evaluates the tree exactly as written: reading a
/// member of a null value fails with [`EvalError::NullReference`].
pub fn compile(lambda: &Lambda) -> Result<CompiledFn, CompileError> {
    tracing::trace!(expression = %lambda, "compiling expression");
    let node = compile_expr(lambda.body(), lambda.parameter())?;
    Ok(Arc::from(node))
}

/// Compile `lambda`, treating a null dereference anywhere in it as a null
/// result. This is the fallback for shapes the null-safe rewrite does not
/// cover; every other evaluation error still propagates.
pub fn compile_null_tolerant(lambda: &Lambda) -> Result<CompiledFn, CompileError> {
    let node = compile_expr(lambda.body(), lambda.parameter())?;
    let accessor: CompiledFn = Arc::new(move |arg: &Value| -> EvalResult {
        match node(arg) {
            Err(err) if err.is_null_reference() => {
                tracing::trace!(%err, "null dereference in fallback accessor");
                Ok(Value::Null)
            }
            other => other,
        }
    });
    Ok(accessor)
}

fn compile_expr(expr: &Expr, parameter: &Parameter) -> Result<Node, CompileError> {
    ensure_sufficient_stack(|| compile_node(expr, parameter))
}

fn compile_node(expr: &Expr, parameter: &Parameter) -> Result<Node, CompileError> {
    match expr.kind() {
        ExprKind::Parameter(p) => {
            if p == parameter {
                Ok(Box::new(|arg: &Value| -> EvalResult { Ok(arg.clone()) }))
            } else {
                Err(CompileError::UnboundParameter {
                    name: p.name(),
                    ty: p.ty().name(),
                })
            }
        }

        ExprKind::Constant(value) => {
            let value = value.clone();
            Ok(Box::new(move |_: &Value| -> EvalResult { Ok(value.clone()) }))
        }

        ExprKind::Member {
            target: Some(target),
            member,
        } => {
            let target = compile_expr(target, parameter)?;
            let member = member.clone();
            Ok(Box::new(move |arg: &Value| -> EvalResult {
                let instance = target(arg)?;
                if instance.is_null() && !member.is_static() {
                    return Err(EvalError::NullReference {
                        member: member.name(),
                    });
                }
                member.get(&instance)
            }))
        }

        ExprKind::Member {
            target: None,
            member,
        } => {
            let member = member.clone();
            Ok(Box::new(move |_: &Value| -> EvalResult { member.get(&Value::Null) }))
        }

        ExprKind::Call {
            target,
            method,
            args,
        } => {
            if args.len() != method.parameters().len() {
                return Err(CompileError::ArityMismatch {
                    method: method.name(),
                    expected: method.parameters().len(),
                    got: args.len(),
                });
            }
            let target = target
                .as_ref()
                .map(|t| compile_expr(t, parameter))
                .transpose()?;
            let args = args
                .iter()
                .map(|a| compile_expr(a, parameter))
                .collect::<Result<Vec<_>, _>>()?;
            let method = method.clone();
            Ok(Box::new(move |arg: &Value| -> EvalResult {
                let instance = match &target {
                    Some(target) => {
                        let instance = target(arg)?;
                        if instance.is_null() {
                            return Err(EvalError::NullReference {
                                member: method.name(),
                            });
                        }
                        instance
                    }
                    None => Value::Null,
                };
                let values = args.iter().map(|a| a(arg)).collect::<Result<Vec<_>, _>>()?;
                method.invoke(&instance, &values)
            }))
        }

        ExprKind::ArrayIndex { array, index } => {
            let array = compile_expr(array, parameter)?;
            let index = compile_expr(index, parameter)?;
            Ok(Box::new(move |arg: &Value| -> EvalResult {
                let items = array(arg)?;
                let position = index(arg)?;
                index_list(&items, &position)
            }))
        }

        ExprKind::Convert { operand } => {
            let operand = compile_expr(operand, parameter)?;
            let target = expr.ty().clone();
            if target.is_object() {
                return Ok(operand);
            }
            Ok(Box::new(move |arg: &Value| -> EvalResult {
                let value = operand(arg)?;
                if target.accepts(&value) {
                    Ok(value)
                } else {
                    Err(EvalError::InvalidCast {
                        from: value.type_name(),
                        to: target.name(),
                    })
                }
            }))
        }

        ExprKind::Binary { op, left, right } => {
            if matches!(op, BinaryOp::AndAlso | BinaryOp::OrElse) {
                require_bool(left)?;
                require_bool(right)?;
            }
            let op = *op;
            let left = compile_expr(left, parameter)?;
            let right = compile_expr(right, parameter)?;
            let node: Node = match op {
                BinaryOp::OrElse => Box::new(move |arg: &Value| -> EvalResult {
                    if truthy(&left(arg)?)? {
                        return Ok(Value::Bool(true));
                    }
                    Ok(Value::Bool(truthy(&right(arg)?)?))
                }),
                BinaryOp::AndAlso => Box::new(move |arg: &Value| -> EvalResult {
                    if !truthy(&left(arg)?)? {
                        return Ok(Value::Bool(false));
                    }
                    Ok(Value::Bool(truthy(&right(arg)?)?))
                }),
                _ => Box::new(move |arg: &Value| -> EvalResult {
                    evaluate_binary(&left(arg)?, &right(arg)?, op)
                }),
            };
            Ok(node)
        }

        ExprKind::Conditional {
            test,
            if_true,
            if_false,
        } => {
            require_bool(test)?;
            let test = compile_expr(test, parameter)?;
            let if_true = compile_expr(if_true, parameter)?;
            let if_false = compile_expr(if_false, parameter)?;
            Ok(Box::new(move |arg: &Value| -> EvalResult {
                if truthy(&test(arg)?)? {
                    if_true(arg)
                } else {
                    if_false(arg)
                }
            }))
        }
    }
}

fn require_bool(expr: &Expr) -> Result<(), CompileError> {
    let ty = expr.ty();
    let bool_ty = Type::bool();
    if *ty == bool_ty || ty.underlying() == Some(&bool_ty) {
        Ok(())
    } else {
        Err(CompileError::NotBoolean {
            expression: expr.to_string(),
            found: ty.name(),
        })
    }
}

fn truthy(value: &Value) -> Result<bool, EvalError> {
    match value {
        Value::Bool(b) => Ok(*b),
        // Lifted `bool?`: null is not true.
        Value::Null => Ok(false),
        other => Err(EvalError::TypeMismatch {
            expected: "bool",
            found: other.type_name(),
        }),
    }
}

fn index_list(items: &Value, position: &Value) -> EvalResult {
    let items = match items {
        Value::List(items) => items,
        Value::Null => {
            return Err(EvalError::NullReference {
                member: Name::intern("[]"),
            })
        }
        other => {
            return Err(EvalError::TypeMismatch {
                expected: "list",
                found: other.type_name(),
            })
        }
    };
    let Value::Int(index) = position else {
        return Err(EvalError::TypeMismatch {
            expected: "int",
            found: position.type_name(),
        });
    };
    usize::try_from(*index)
        .ok()
        .and_then(|i| items.get(i))
        .cloned()
        .ok_or(EvalError::IndexOutOfRange {
            index: *index,
            len: items.len(),
        })
}

//! Immutable expression trees.
//!
//! A [`Lambda`] is a single-parameter function `model => body` over typed
//! nodes. Sub-trees are shared through [`ExprRef`], so rewriting a tree only
//! allocates the nodes that change. Every node records its static type; the
//! accessor compiler decides null checks and boxing from those types alone.

use std::fmt;
use std::sync::Arc;

use crate::{Member, Method, Name, Type, Value};

/// Shared pointer to an expression node.
pub type ExprRef = Arc<Expr>;

/// Binary operators.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    /// Value equality (`==`), lifted over nullable operands.
    Equal,
    NotEqual,
    /// Reference identity; `null` only equals `null`.
    ReferenceEqual,
    /// Short-circuit `&&`.
    AndAlso,
    /// Short-circuit `||`.
    OrElse,
    Add,
    Subtract,
    Multiply,
}

impl BinaryOp {
    /// Whether the operator produces a `bool`.
    pub fn is_predicate(self) -> bool {
        matches!(
            self,
            BinaryOp::Equal
                | BinaryOp::NotEqual
                | BinaryOp::ReferenceEqual
                | BinaryOp::AndAlso
                | BinaryOp::OrElse
        )
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::ReferenceEqual => "===",
            BinaryOp::AndAlso => "&&",
            BinaryOp::OrElse => "||",
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
        }
    }
}

/// Expression node kinds.
#[derive(Clone, Debug)]
pub enum ExprKind {
    /// Reference to a lambda parameter.
    Parameter(Parameter),
    /// Literal value, including closure objects captured by value.
    Constant(Value),
    /// Field or property read. `target` is `None` for static members.
    Member {
        target: Option<ExprRef>,
        member: Member,
    },
    /// Method call. `target` is `None` for static methods.
    Call {
        target: Option<ExprRef>,
        method: Method,
        args: Vec<ExprRef>,
    },
    /// Single-dimensional array index `array[index]`.
    ArrayIndex { array: ExprRef, index: ExprRef },
    /// Conversion to the node's static type (boxing when that is `object`).
    Convert { operand: ExprRef },
    Binary {
        op: BinaryOp,
        left: ExprRef,
        right: ExprRef,
    },
    /// `test ? if_true : if_false`.
    Conditional {
        test: ExprRef,
        if_true: ExprRef,
        if_false: ExprRef,
    },
}

/// Expression node: a kind plus its static type.
#[derive(Clone, Debug)]
pub struct Expr {
    kind: ExprKind,
    ty: Type,
}

impl Expr {
    fn make(kind: ExprKind, ty: Type) -> ExprRef {
        Arc::new(Expr { kind, ty })
    }

    pub fn parameter(parameter: &Parameter) -> ExprRef {
        Self::make(ExprKind::Parameter(parameter.clone()), parameter.ty().clone())
    }

    pub fn constant(value: Value, ty: &Type) -> ExprRef {
        Self::make(ExprKind::Constant(value), ty.clone())
    }

    /// Typed null literal.
    pub fn null(ty: &Type) -> ExprRef {
        Self::constant(Value::Null, ty)
    }

    pub fn member(target: &ExprRef, member: &Member) -> ExprRef {
        Self::make(
            ExprKind::Member {
                target: Some(Arc::clone(target)),
                member: member.clone(),
            },
            member.member_type().clone(),
        )
    }

    pub fn static_member(member: &Member) -> ExprRef {
        Self::make(
            ExprKind::Member {
                target: None,
                member: member.clone(),
            },
            member.member_type().clone(),
        )
    }

    pub fn call(target: &ExprRef, method: &Method, args: Vec<ExprRef>) -> ExprRef {
        Self::make(
            ExprKind::Call {
                target: Some(Arc::clone(target)),
                method: method.clone(),
                args,
            },
            method.return_type().clone(),
        )
    }

    pub fn static_call(method: &Method, args: Vec<ExprRef>) -> ExprRef {
        Self::make(
            ExprKind::Call {
                target: None,
                method: method.clone(),
                args,
            },
            method.return_type().clone(),
        )
    }

    /// `array[index]`; typed as the array's element type.
    pub fn array_index(array: &ExprRef, index: &ExprRef) -> ExprRef {
        let ty = array.ty.element_type().cloned().unwrap_or_else(Type::object);
        Self::make(
            ExprKind::ArrayIndex {
                array: Arc::clone(array),
                index: Arc::clone(index),
            },
            ty,
        )
    }

    pub fn convert(operand: &ExprRef, ty: &Type) -> ExprRef {
        Self::make(
            ExprKind::Convert {
                operand: Arc::clone(operand),
            },
            ty.clone(),
        )
    }

    pub fn binary(op: BinaryOp, left: &ExprRef, right: &ExprRef) -> ExprRef {
        let ty = if op.is_predicate() {
            Type::bool()
        } else {
            left.ty.clone()
        };
        Self::make(
            ExprKind::Binary {
                op,
                left: Arc::clone(left),
                right: Arc::clone(right),
            },
            ty,
        )
    }

    pub fn equal(left: &ExprRef, right: &ExprRef) -> ExprRef {
        Self::binary(BinaryOp::Equal, left, right)
    }

    pub fn reference_equal(left: &ExprRef, right: &ExprRef) -> ExprRef {
        Self::binary(BinaryOp::ReferenceEqual, left, right)
    }

    pub fn or_else(left: &ExprRef, right: &ExprRef) -> ExprRef {
        Self::binary(BinaryOp::OrElse, left, right)
    }

    /// `test ? if_true : if_false`, typed as `if_true`.
    pub fn condition(test: &ExprRef, if_true: &ExprRef, if_false: &ExprRef) -> ExprRef {
        Self::make(
            ExprKind::Conditional {
                test: Arc::clone(test),
                if_true: Arc::clone(if_true),
                if_false: Arc::clone(if_false),
            },
            if_true.ty.clone(),
        )
    }

    #[inline]
    pub fn kind(&self) -> &ExprKind {
        &self.kind
    }

    #[inline]
    pub fn ty(&self) -> &Type {
        &self.ty
    }

    /// Whether this node is a reference to exactly `parameter`.
    pub fn is_parameter(&self, parameter: &Parameter) -> bool {
        matches!(&self.kind, ExprKind::Parameter(p) if p == parameter)
    }

    /// `(target, member)` if this node is a member access.
    pub fn as_member(&self) -> Option<(Option<&ExprRef>, &Member)> {
        match &self.kind {
            ExprKind::Member { target, member } => Some((target.as_ref(), member)),
            _ => None,
        }
    }
}

pub struct ParameterDef {
    name: Name,
    ty: Type,
}

/// Lambda parameter. Parameters compare by identity: two parameters with the
/// same name and type are still different parameters.
#[derive(Clone)]
pub struct Parameter(Arc<ParameterDef>);

impl Parameter {
    pub fn new(name: &str, ty: &Type) -> Self {
        Parameter(Arc::new(ParameterDef {
            name: Name::intern(name),
            ty: ty.clone(),
        }))
    }

    #[inline]
    pub fn name(&self) -> Name {
        self.0.name
    }

    #[inline]
    pub fn ty(&self) -> &Type {
        &self.0.ty
    }
}

impl PartialEq for Parameter {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Parameter {}

impl fmt::Debug for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Parameter({}: {})", self.0.name, self.0.ty)
    }
}

/// Typed single-parameter lambda, `Func<TModel, TResult>`.
#[derive(Clone, Debug)]
pub struct Lambda {
    parameter: Parameter,
    body: ExprRef,
    return_type: Type,
}

impl Lambda {
    /// Lambda whose result type is the body's static type.
    pub fn new(parameter: Parameter, body: ExprRef) -> Self {
        let return_type = body.ty.clone();
        Lambda {
            parameter,
            body,
            return_type,
        }
    }

    /// Lambda with an explicit declared result type.
    pub fn with_return_type(parameter: Parameter, body: ExprRef, return_type: &Type) -> Self {
        Lambda {
            parameter,
            body,
            return_type: return_type.clone(),
        }
    }

    #[inline]
    pub fn parameter(&self) -> &Parameter {
        &self.parameter
    }

    #[inline]
    pub fn body(&self) -> &ExprRef {
        &self.body
    }

    /// The parameter's type.
    #[inline]
    pub fn model_type(&self) -> &Type {
        self.parameter.ty()
    }

    #[inline]
    pub fn return_type(&self) -> &Type {
        &self.return_type
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ExprKind::Parameter(p) => write!(f, "{}", p.name()),
            ExprKind::Constant(Value::Str(s)) => write!(f, "{s:?}"),
            ExprKind::Constant(Value::Record(r)) => write!(f, "value({})", r.ty()),
            ExprKind::Constant(value) => write!(f, "{value}"),
            ExprKind::Member {
                target: Some(target),
                member,
            } => write!(f, "{target}.{}", member.name()),
            ExprKind::Member {
                target: None,
                member,
            } => write!(f, "{}.{}", member.declaring_type(), member.name()),
            ExprKind::Call {
                target,
                method,
                args,
            } => {
                match target {
                    Some(target) => write!(f, "{target}.{}(", method.name())?,
                    None => write!(f, "{}.{}(", method.declaring_type(), method.name())?,
                }
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(")")
            }
            ExprKind::ArrayIndex { array, index } => write!(f, "{array}[{index}]"),
            ExprKind::Convert { operand } => write!(f, "Convert({operand}, {})", self.ty),
            ExprKind::Binary { op, left, right } => {
                write!(f, "({left} {} {right})", op.symbol())
            }
            ExprKind::Conditional {
                test,
                if_true,
                if_false,
            } => write!(f, "IIF({test}, {if_true}, {if_false})"),
        }
    }
}

impl fmt::Display for Lambda {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} => {}", self.parameter.name(), self.body)
    }
}

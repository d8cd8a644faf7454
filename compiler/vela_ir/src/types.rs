//! Runtime type model.
//!
//! Rust has no runtime reflection, so the model types that expressions read are
//! described explicitly: a [`Type`] carries its name, whether it can hold null,
//! and the indexer metadata needed to recognize `items[i]` calls. A [`Member`]
//! pairs a (declaring type, name) with a getter closure resolved when the
//! member is defined, standing in for reflective property access.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, LazyLock};

use crate::{EvalError, EvalResult, Name, Value};

/// How values of a type relate to null.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// Heap object; the null reference is a valid value.
    Reference,
    /// Plain value; can never be null.
    Value,
    /// Value type wrapped to admit null (`int?`).
    Nullable,
}

/// A property declared on a type, by name only.
///
/// Used to find the indexer: the type's default member names a property, and
/// that property's getter is the method an indexer call invokes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PropertyDecl {
    pub name: Name,
    pub getter: Option<Name>,
}

/// Immutable type definition. Use [`Type`] handles to refer to it.
pub struct TypeDef {
    name: Name,
    kind: TypeKind,
    default_member: Option<Name>,
    properties: Vec<PropertyDecl>,
    element: Option<Type>,
    underlying: Option<Type>,
}

/// Shared handle to a type definition. Types compare and hash by name.
#[derive(Clone)]
pub struct Type(Arc<TypeDef>);

static OBJECT: LazyLock<Type> = LazyLock::new(|| Type::reference("object"));
static BOOL: LazyLock<Type> = LazyLock::new(|| Type::value("bool"));
static INT: LazyLock<Type> = LazyLock::new(|| Type::value("int"));
static FLOAT: LazyLock<Type> = LazyLock::new(|| Type::value("float"));
static STRING: LazyLock<Type> = LazyLock::new(|| Type::reference("string"));

impl Type {
    /// Start describing a new type.
    pub fn builder(name: &str, kind: TypeKind) -> TypeBuilder {
        TypeBuilder {
            def: TypeDef {
                name: Name::intern(name),
                kind,
                default_member: None,
                properties: Vec::new(),
                element: None,
                underlying: None,
            },
        }
    }

    /// A reference type without indexer metadata.
    pub fn reference(name: &str) -> Self {
        Self::builder(name, TypeKind::Reference).build()
    }

    /// A non-nullable value type.
    pub fn value(name: &str) -> Self {
        Self::builder(name, TypeKind::Value).build()
    }

    pub fn object() -> Self {
        OBJECT.clone()
    }

    pub fn bool() -> Self {
        BOOL.clone()
    }

    pub fn int() -> Self {
        INT.clone()
    }

    pub fn float() -> Self {
        FLOAT.clone()
    }

    pub fn string() -> Self {
        STRING.clone()
    }

    /// `T?` for a value type `T`. Reference and nullable types are returned
    /// unchanged since they already admit null.
    pub fn nullable(&self) -> Self {
        if self.kind() != TypeKind::Value {
            return self.clone();
        }
        let mut builder = Self::builder(&format!("{}?", self.name()), TypeKind::Nullable);
        builder.def.underlying = Some(self.clone());
        builder.build()
    }

    /// `T[]`, a single-dimensional array of `self`.
    pub fn array_of(&self) -> Self {
        Self::builder(&format!("{}[]", self.name()), TypeKind::Reference)
            .element(self)
            .build()
    }

    #[inline]
    pub fn name(&self) -> Name {
        self.0.name
    }

    #[inline]
    pub fn kind(&self) -> TypeKind {
        self.0.kind
    }

    /// Whether a value of this static type may be null at runtime.
    #[inline]
    pub fn can_be_null(&self) -> bool {
        self.0.kind != TypeKind::Value
    }

    #[inline]
    pub fn is_value_type(&self) -> bool {
        matches!(self.0.kind, TypeKind::Value | TypeKind::Nullable)
    }

    #[inline]
    pub fn is_nullable(&self) -> bool {
        self.0.kind == TypeKind::Nullable
    }

    pub fn is_object(&self) -> bool {
        *self == *OBJECT
    }

    pub fn default_member(&self) -> Option<Name> {
        self.0.default_member
    }

    pub fn properties(&self) -> &[PropertyDecl] {
        &self.0.properties
    }

    /// Element type for arrays.
    pub fn element_type(&self) -> Option<&Type> {
        self.0.element.as_ref()
    }

    /// Underlying value type for nullable types.
    pub fn underlying(&self) -> Option<&Type> {
        self.0.underlying.as_ref()
    }

    /// Name of the getter method of the default (indexer) property, if any.
    pub fn indexer_getter(&self) -> Option<Name> {
        let default_member = self.0.default_member?;
        self.0
            .properties
            .iter()
            .find(|p| p.name == default_member)
            .and_then(|p| p.getter)
    }

    /// Whether `value` may be stored in a location of this static type.
    pub fn accepts(&self, value: &Value) -> bool {
        if self.is_object() {
            return true;
        }
        match (self.0.kind, value) {
            (TypeKind::Value, Value::Null) => false,
            (TypeKind::Reference | TypeKind::Nullable, Value::Null) => true,
            (TypeKind::Nullable, v) => self.underlying().is_some_and(|u| u.accepts(v)),
            (_, Value::Bool(_)) => *self == *BOOL,
            (_, Value::Int(_)) => *self == *INT,
            (_, Value::Float(_)) => *self == *FLOAT,
            (_, Value::Str(_)) => *self == *STRING,
            (_, Value::List(_)) => self.element_type().is_some(),
            (_, Value::Record(record)) => record.ty() == self,
        }
    }
}

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0.name == other.0.name
    }
}

impl Eq for Type {}

impl Hash for Type {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.name.hash(state);
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Type({})", self.0.name)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0.name, f)
    }
}

/// Builder for [`Type`].
pub struct TypeBuilder {
    def: TypeDef,
}

impl TypeBuilder {
    /// Declare a property by name, with an optional getter method name.
    #[must_use]
    pub fn property(mut self, name: &str, getter: Option<&str>) -> Self {
        self.def.properties.push(PropertyDecl {
            name: Name::intern(name),
            getter: getter.map(Name::intern),
        });
        self
    }

    /// Declare an indexer property `name` whose getter is `getter` and make it
    /// the type's default member.
    #[must_use]
    pub fn indexer(mut self, name: &str, getter: &str) -> Self {
        self.def.default_member = Some(Name::intern(name));
        self.property(name, Some(getter))
    }

    /// Element type, for array-like types.
    #[must_use]
    pub fn element(mut self, element: &Type) -> Self {
        self.def.element = Some(element.clone());
        self
    }

    pub fn build(self) -> Type {
        Type(Arc::new(self.def))
    }
}

/// Field or property.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MemberKind {
    Field,
    Property,
}

/// Getter resolved when a member is defined. Static members ignore the target.
pub type Getter = Arc<dyn Fn(&Value) -> EvalResult + Send + Sync>;

/// Invoker for methods: `(target, arguments)`.
pub type Invoker = Arc<dyn Fn(&Value, &[Value]) -> EvalResult + Send + Sync>;

/// Identity of a member, detached from any member handle.
///
/// Two members with the same declaring type name and member name are the same
/// member. `synthesized` is derived from the name, so it never disagrees for
/// equal keys.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct MemberKey {
    pub declaring_type: Name,
    pub member: Name,
    pub synthesized: bool,
}

impl fmt::Display for MemberKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.declaring_type, self.member)
    }
}

pub struct MemberInfo {
    declaring_type: Type,
    name: Name,
    member_type: Type,
    kind: MemberKind,
    is_static: bool,
    synthesized: bool,
    getter: Getter,
}

/// Shared handle to a field or property.
#[derive(Clone)]
pub struct Member(Arc<MemberInfo>);

impl Member {
    /// Member with a custom getter.
    pub fn with_getter(
        declaring_type: &Type,
        name: &str,
        member_type: &Type,
        kind: MemberKind,
        getter: impl Fn(&Value) -> EvalResult + Send + Sync + 'static,
    ) -> Self {
        let name = Name::intern(name);
        Member(Arc::new(MemberInfo {
            declaring_type: declaring_type.clone(),
            name,
            member_type: member_type.clone(),
            kind,
            is_static: false,
            synthesized: name.is_synthesized(),
            getter: Arc::new(getter),
        }))
    }

    /// Instance field stored in a [`Record`](crate::Record) under its own name.
    pub fn field(declaring_type: &Type, name: &str, member_type: &Type) -> Self {
        Self::record_slot(declaring_type, name, member_type, MemberKind::Field)
    }

    /// Instance property stored in a [`Record`](crate::Record) under its own name.
    pub fn property(declaring_type: &Type, name: &str, member_type: &Type) -> Self {
        Self::record_slot(declaring_type, name, member_type, MemberKind::Property)
    }

    /// Static member; `getter` is called without a target.
    pub fn static_member(
        declaring_type: &Type,
        name: &str,
        member_type: &Type,
        getter: impl Fn() -> EvalResult + Send + Sync + 'static,
    ) -> Self {
        let name = Name::intern(name);
        Member(Arc::new(MemberInfo {
            declaring_type: declaring_type.clone(),
            name,
            member_type: member_type.clone(),
            kind: MemberKind::Property,
            is_static: true,
            synthesized: name.is_synthesized(),
            getter: Arc::new(move |_| getter()),
        }))
    }

    fn record_slot(
        declaring_type: &Type,
        name: &str,
        member_type: &Type,
        kind: MemberKind,
    ) -> Self {
        let field = Name::intern(name);
        let type_name = declaring_type.name();
        Self::with_getter(declaring_type, name, member_type, kind, move |target| {
            match target {
                Value::Null => Err(EvalError::NullReference { member: field }),
                Value::Record(record) => record
                    .get(field)
                    .cloned()
                    .ok_or(EvalError::MissingField { type_name, field }),
                other => Err(EvalError::TypeMismatch {
                    expected: "record",
                    found: other.type_name(),
                }),
            }
        })
    }

    #[inline]
    pub fn name(&self) -> Name {
        self.0.name
    }

    #[inline]
    pub fn declaring_type(&self) -> &Type {
        &self.0.declaring_type
    }

    #[inline]
    pub fn member_type(&self) -> &Type {
        &self.0.member_type
    }

    pub fn kind(&self) -> MemberKind {
        self.0.kind
    }

    pub fn is_static(&self) -> bool {
        self.0.is_static
    }

    /// Whether the member was generated by a compiler (closure field,
    /// transparent identifier) rather than declared in source.
    pub fn is_synthesized(&self) -> bool {
        self.0.synthesized
    }

    pub fn key(&self) -> MemberKey {
        MemberKey {
            declaring_type: self.0.declaring_type.name(),
            member: self.0.name,
            synthesized: self.0.synthesized,
        }
    }

    /// Read the member from `target` (ignored for static members).
    #[inline]
    pub fn get(&self, target: &Value) -> EvalResult {
        (self.0.getter)(target)
    }
}

impl PartialEq for Member {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.key() == other.key()
    }
}

impl Eq for Member {}

impl fmt::Debug for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Member({})", self.key())
    }
}

pub struct MethodInfo {
    declaring_type: Type,
    name: Name,
    return_type: Type,
    parameters: Vec<Type>,
    invoker: Invoker,
}

/// Shared handle to an instance method.
#[derive(Clone)]
pub struct Method(Arc<MethodInfo>);

impl Method {
    pub fn new(
        declaring_type: &Type,
        name: &str,
        return_type: &Type,
        parameters: Vec<Type>,
        invoker: impl Fn(&Value, &[Value]) -> EvalResult + Send + Sync + 'static,
    ) -> Self {
        Method(Arc::new(MethodInfo {
            declaring_type: declaring_type.clone(),
            name: Name::intern(name),
            return_type: return_type.clone(),
            parameters,
            invoker: Arc::new(invoker),
        }))
    }

    #[inline]
    pub fn name(&self) -> Name {
        self.0.name
    }

    #[inline]
    pub fn declaring_type(&self) -> &Type {
        &self.0.declaring_type
    }

    #[inline]
    pub fn return_type(&self) -> &Type {
        &self.0.return_type
    }

    pub fn parameters(&self) -> &[Type] {
        &self.0.parameters
    }

    pub fn invoke(&self, target: &Value, args: &[Value]) -> EvalResult {
        (self.0.invoker)(target, args)
    }
}

impl PartialEq for Method {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
            || (self.0.declaring_type == other.0.declaring_type && self.0.name == other.0.name)
    }
}

impl Eq for Method {}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Method({}::{})", self.0.declaring_type, self.0.name)
    }
}

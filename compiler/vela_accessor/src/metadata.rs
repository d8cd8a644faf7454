//! Model metadata and model explorers.
//!
//! Metadata describes a model type or one property of a container type; the
//! accessor compiler itself never reads it. [`metadata_for_lambda`] pairs the
//! metadata a lambda denotes with a lazily evaluated model value.

use std::sync::{Arc, OnceLock};

use dashmap::DashMap;
use rustc_hash::{FxBuildHasher, FxHashMap};
use vela_ir::{EvalResult, ExprKind, Lambda, Member, MemberKind, Name, Type, Value};

use crate::errors::ExpressionError;
use crate::shape::is_single_argument_indexer;
use crate::{Accessor, AccessorCompiler};

/// Metadata for a model type, or for a property of a container type.
#[derive(Debug)]
pub struct ModelMetadata {
    model_type: Type,
    container_type: Option<Type>,
    property_name: Option<Name>,
    display_name: Option<Arc<str>>,
    properties: FxHashMap<Name, Arc<ModelMetadata>>,
}

impl ModelMetadata {
    /// Metadata for `model_type` with no properties.
    pub fn for_type(model_type: &Type) -> Self {
        ModelMetadata {
            model_type: model_type.clone(),
            container_type: None,
            property_name: None,
            display_name: None,
            properties: FxHashMap::default(),
        }
    }

    pub fn model_type(&self) -> &Type {
        &self.model_type
    }

    /// Declaring type, for property metadata.
    pub fn container_type(&self) -> Option<&Type> {
        self.container_type.as_ref()
    }

    pub fn property_name(&self) -> Option<Name> {
        self.property_name
    }

    /// Display name if one was registered, else the property name.
    pub fn display_name(&self) -> Option<&str> {
        self.display_name
            .as_deref()
            .or_else(|| self.property_name.map(Name::as_str))
    }

    pub fn property(&self, name: Name) -> Option<Arc<ModelMetadata>> {
        self.properties.get(&name).cloned()
    }

    pub fn properties(&self) -> impl Iterator<Item = &Arc<ModelMetadata>> {
        self.properties.values()
    }
}

/// Source of model metadata.
pub trait ModelMetadataProvider: Send + Sync {
    fn metadata_for_type(&self, model_type: &Type) -> Arc<ModelMetadata>;

    fn metadata_for_property(&self, container: &Type, name: Name) -> Option<Arc<ModelMetadata>> {
        self.metadata_for_type(container).property(name)
    }
}

#[derive(Clone)]
struct PropertyRegistration {
    member: Member,
    display_name: Option<Arc<str>>,
}

/// Metadata provider built from registered properties.
///
/// Types with no registrations get metadata with no properties. Built
/// metadata is cached per type; registering a property drops the cached
/// metadata of its declaring type.
///
/// Lock order is registrations, then built metadata, on both paths.
#[derive(Default)]
pub struct DefaultModelMetadataProvider {
    registrations: DashMap<Name, Vec<PropertyRegistration>, FxBuildHasher>,
    built: DashMap<Name, Arc<ModelMetadata>, FxBuildHasher>,
}

impl DefaultModelMetadataProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `member` as a property of its declaring type.
    pub fn register_property(&self, member: &Member, display_name: Option<&str>) {
        let container = member.declaring_type().name();
        let registration = PropertyRegistration {
            member: member.clone(),
            display_name: display_name.map(Arc::from),
        };
        let mut properties = self.registrations.entry(container).or_default();
        properties.retain(|p| p.member.name() != member.name());
        properties.push(registration);
        // Invalidate while the registration shard is still locked; builds
        // hold the same lock, so none can store metadata older than this.
        self.built.remove(&container);
    }

    fn build(model_type: &Type, registrations: &[PropertyRegistration]) -> ModelMetadata {
        let mut metadata = ModelMetadata::for_type(model_type);
        for registration in registrations {
            let member = &registration.member;
            let property = ModelMetadata {
                model_type: member.member_type().clone(),
                container_type: Some(model_type.clone()),
                property_name: Some(member.name()),
                display_name: registration.display_name.clone(),
                properties: FxHashMap::default(),
            };
            metadata.properties.insert(member.name(), Arc::new(property));
        }
        metadata
    }
}

impl ModelMetadataProvider for DefaultModelMetadataProvider {
    fn metadata_for_type(&self, model_type: &Type) -> Arc<ModelMetadata> {
        if let Some(found) = self.built.get(&model_type.name()) {
            return Arc::clone(found.value());
        }
        let registrations = self.registrations.entry(model_type.name()).or_default();
        let metadata = Arc::new(Self::build(model_type, &registrations));
        let stored = Arc::clone(self.built.entry(model_type.name()).or_insert(metadata).value());
        drop(registrations);
        stored
    }
}

struct ExplorerState {
    metadata: Arc<ModelMetadata>,
    /// Explorer of the value the model is read from, and the accessor that
    /// reads it. `None` for root explorers.
    source: Option<(ModelExplorer, Accessor)>,
    model: OnceLock<EvalResult>,
}

/// Metadata paired with a model value that is computed on first use.
#[derive(Clone)]
pub struct ModelExplorer(Arc<ExplorerState>);

impl ModelExplorer {
    /// Explorer for a model value that is already known.
    pub fn for_model(metadata: Arc<ModelMetadata>, model: Value) -> Self {
        ModelExplorer(Arc::new(ExplorerState {
            metadata,
            source: None,
            model: OnceLock::from(Ok(model)),
        }))
    }

    /// Explorer whose model is `accessor(container.model())`. Neither model
    /// is evaluated until [`model`](Self::model) is called.
    pub fn for_expression(
        metadata: Arc<ModelMetadata>,
        container: ModelExplorer,
        accessor: Accessor,
    ) -> Self {
        ModelExplorer(Arc::new(ExplorerState {
            metadata,
            source: Some((container, accessor)),
            model: OnceLock::new(),
        }))
    }

    pub fn metadata(&self) -> &Arc<ModelMetadata> {
        &self.0.metadata
    }

    /// The model value; evaluated once and then reused. A container that
    /// fails to evaluate fails this model too.
    pub fn model(&self) -> EvalResult {
        let state = &self.0;
        state
            .model
            .get_or_init(|| match &state.source {
                Some((container, accessor)) => accessor(&container.model()?),
                None => Ok(Value::Null),
            })
            .clone()
    }

    /// The explorer the model is read from, `None` for root explorers.
    pub fn container(&self) -> Option<&ModelExplorer> {
        self.0.source.as_ref().map(|(container, _)| container)
    }
}

/// Resolve the metadata and model that `lambda` denotes, relative to
/// `container` (the explorer for the lambda's parameter).
///
/// Only the shapes templates can name are accepted: the model itself, a field
/// or property access, a single-dimension array index, or a single-argument
/// indexer.
pub fn metadata_for_lambda(
    lambda: &Lambda,
    container: &ModelExplorer,
    provider: &dyn ModelMetadataProvider,
    compiler: &AccessorCompiler,
) -> Result<ModelExplorer, ExpressionError> {
    let property = match lambda.body().kind() {
        ExprKind::Parameter(_) => return Ok(container.clone()),
        ExprKind::ArrayIndex { .. } => None,
        ExprKind::Call { method, args, .. } if is_single_argument_indexer(method, args) => None,
        ExprKind::Member { target, member } => {
            // `m => Model` read through a captured view: the model itself.
            if member.name().as_str() == "Model"
                && member.member_type() == lambda.model_type()
                && target
                    .as_ref()
                    .is_some_and(|t| matches!(t.kind(), ExprKind::Constant(_)))
            {
                return Ok(container.clone());
            }
            // Fields carry no property metadata.
            target
                .as_ref()
                .filter(|_| member.kind() == MemberKind::Property)
                .map(|target| (target.ty().clone(), member.name()))
        }
        _ => return Err(ExpressionError::TemplateLimitations),
    };

    let metadata = property
        .and_then(|(container_type, name)| provider.metadata_for_property(&container_type, name))
        .unwrap_or_else(|| provider.metadata_for_type(lambda.return_type()));
    let accessor = compiler.compile_or_fallback(lambda)?;
    tracing::trace!(
        expression = %lambda,
        model_type = %metadata.model_type(),
        "resolved metadata for expression"
    );
    Ok(ModelExplorer::for_expression(
        metadata,
        container.clone(),
        accessor,
    ))
}

//! Model expressions: a lambda's field name plus its metadata and model.

use std::sync::Arc;

use vela_ir::{EvalResult, Lambda, Type, Value};

use crate::errors::ExpressionError;
use crate::metadata::{metadata_for_lambda, ModelExplorer, ModelMetadata, ModelMetadataProvider};
use crate::text::{expression_text, ExpressionTextCache};
use crate::AccessorCompiler;

/// What a view needs to render a field: its name and its model.
#[derive(Clone)]
pub struct ModelExpression {
    name: String,
    explorer: ModelExplorer,
}

impl ModelExpression {
    pub fn new(name: String, explorer: ModelExplorer) -> Self {
        ModelExpression { name, explorer }
    }

    /// Field name, e.g. `Address.City`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn explorer(&self) -> &ModelExplorer {
        &self.explorer
    }

    pub fn metadata(&self) -> &Arc<ModelMetadata> {
        self.explorer.metadata()
    }

    pub fn model(&self) -> EvalResult {
        self.explorer.model()
    }
}

/// Creates [`ModelExpression`]s, sharing one text cache and one accessor
/// compiler between all of them.
pub struct ModelExpressionProvider {
    metadata: Arc<dyn ModelMetadataProvider>,
    compiler: AccessorCompiler,
    text_cache: ExpressionTextCache,
}

impl ModelExpressionProvider {
    pub fn new(metadata: Arc<dyn ModelMetadataProvider>, compiler: AccessorCompiler) -> Self {
        ModelExpressionProvider {
            metadata,
            compiler,
            text_cache: ExpressionTextCache::new(),
        }
    }

    /// Field name of `lambda`, through the provider's text cache.
    pub fn expression_text(&self, lambda: &Lambda) -> Result<String, ExpressionError> {
        expression_text(lambda, Some(&self.text_cache))
    }

    /// Model expression for `lambda` evaluated against the explorer of its
    /// parameter.
    pub fn create_model_expression(
        &self,
        container: &ModelExplorer,
        lambda: &Lambda,
    ) -> Result<ModelExpression, ExpressionError> {
        let name = self.expression_text(lambda)?;
        let explorer =
            metadata_for_lambda(lambda, container, self.metadata.as_ref(), &self.compiler)?;
        Ok(ModelExpression::new(name, explorer))
    }

    /// Model expression for `lambda` over a root model of type `model_type`.
    pub fn create_for_model(
        &self,
        model_type: &Type,
        model: Value,
        lambda: &Lambda,
    ) -> Result<ModelExpression, ExpressionError> {
        let root = ModelExplorer::for_model(self.metadata.metadata_for_type(model_type), model);
        self.create_model_expression(&root, lambda)
    }

    pub fn compiler(&self) -> &AccessorCompiler {
        &self.compiler
    }

    pub fn text_cache(&self) -> &ExpressionTextCache {
        &self.text_cache
    }
}

//! The accessor compiler service.
//!
//! Routes a lambda by shape, rewrites it for null safety, and stores the
//! compiled result in its [`AccessorCache`]. The service is a cheap handle;
//! clones share one cache, so an application creates one and passes it to
//! every consumer, while tests create their own.

use std::sync::Arc;

use vela_eval::CompileError;
use vela_ir::{EvalResult, Lambda, Value};

use crate::cache::{AccessorCache, CacheSlot, CacheStats, PartitionKey};
use crate::config::{AccessorOptions, CacheMode};
use crate::key::MemberChainKey;
use crate::rewrite;
use crate::shape::{classify, Shape};
use crate::Accessor;

struct Shared {
    cache: AccessorCache,
    options: AccessorOptions,
}

/// Cached, null-safe accessor compiler.
#[derive(Clone)]
pub struct AccessorCompiler {
    shared: Arc<Shared>,
}

/// Builder for [`AccessorCompiler`].
#[derive(Clone, Debug, Default)]
pub struct AccessorCompilerBuilder {
    options: AccessorOptions,
}

impl AccessorCompilerBuilder {
    #[must_use]
    pub fn options(mut self, options: AccessorOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn caching(mut self, caching: CacheMode) -> Self {
        self.options.caching = caching;
        self
    }

    pub fn build(self) -> AccessorCompiler {
        AccessorCompiler {
            shared: Arc::new(Shared {
                cache: AccessorCache::new(),
                options: self.options,
            }),
        }
    }
}

impl Default for AccessorCompiler {
    fn default() -> Self {
        Self::new()
    }
}

impl AccessorCompiler {
    /// Compiler with caching enabled.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Compiler configured from the environment (see [`CacheMode::from_env`]).
    pub fn from_env() -> Self {
        Self::builder().options(AccessorOptions::from_env()).build()
    }

    pub fn builder() -> AccessorCompilerBuilder {
        AccessorCompilerBuilder::default()
    }

    pub fn options(&self) -> AccessorOptions {
        self.shared.options
    }

    pub fn cache(&self) -> &AccessorCache {
        &self.shared.cache
    }

    pub fn stats(&self) -> CacheStats {
        self.shared.cache.stats()
    }

    /// Compile `lambda` into a null-safe accessor, reusing a cached one when
    /// an equivalent lambda was compiled before.
    ///
    /// Returns `None` for shapes that are not compiled here (indexers, array
    /// indexing, anything unrecognized); callers fall back to
    /// [`compile_or_fallback`](Self::compile_or_fallback) or their own path.
    #[tracing::instrument(level = "trace", skip_all, fields(expression = %lambda))]
    pub fn compile(&self, lambda: &Lambda) -> Option<Accessor> {
        let partition = PartitionKey {
            model_type: lambda.model_type().name(),
            result_type: lambda.return_type().name(),
        };
        let shape = classify(lambda);
        tracing::trace!(shape = shape.label(), "classified accessor");

        match shape {
            Shape::Identity => self.cached(partition, CacheSlot::Identity, || Some(identity())),

            Shape::Constant(value) => {
                let value = value.clone();
                let accessor: Accessor =
                    Arc::new(move |_: &Value| -> EvalResult { Ok(value.clone()) });
                Some(accessor)
            }

            Shape::CapturedConstant { member, value } => {
                let projection = self.cached(
                    partition,
                    CacheSlot::CapturedConstant(member.key()),
                    || compile_rewritten(&rewrite::captured_projection(member)),
                )?;
                let captured = value.clone();
                let accessor: Accessor =
                    Arc::new(move |_: &Value| -> EvalResult { projection(&captured) });
                Some(accessor)
            }

            Shape::StaticMember(member) => {
                self.cached(partition, CacheSlot::StaticMember(member.key()), || {
                    compile_rewritten(&rewrite::static_access(lambda))
                })
            }

            Shape::SimpleMember(member) => {
                self.cached(partition, CacheSlot::SimpleMember(member.key()), || {
                    compile_rewritten(&rewrite::null_safe(lambda))
                })
            }

            Shape::ChainedMember { .. } => {
                let key = MemberChainKey::from_chain(lambda.model_type(), lambda.body())?;
                self.cached(partition, CacheSlot::ChainedMember(key), || {
                    compile_rewritten(&rewrite::null_safe(lambda))
                })
            }

            Shape::SingleArgumentIndexer(_) | Shape::ArrayIndex | Shape::Unsupported => None,
        }
    }

    /// Like [`compile`](Self::compile), but falls back to compiling the lambda
    /// as written when its shape is not supported. The fallback turns a null
    /// dereference anywhere in the expression into a null result; it is never
    /// cached.
    pub fn compile_or_fallback(&self, lambda: &Lambda) -> Result<Accessor, CompileError> {
        if let Some(accessor) = self.compile(lambda) {
            return Ok(accessor);
        }
        tracing::debug!(expression = %lambda, "no cached accessor; compiling directly");
        vela_eval::compile_null_tolerant(lambda)
    }

    fn cached(
        &self,
        partition: PartitionKey,
        slot: CacheSlot,
        compile: impl FnOnce() -> Option<Accessor>,
    ) -> Option<Accessor> {
        match self.shared.options.caching {
            CacheMode::Enabled => self.shared.cache.get_or_compile(partition, slot, compile),
            CacheMode::Disabled => compile(),
        }
    }
}

fn identity() -> Accessor {
    Arc::new(|model: &Value| -> EvalResult { Ok(model.clone()) })
}

fn compile_rewritten(lambda: &Lambda) -> Option<Accessor> {
    match vela_eval::compile(lambda) {
        Ok(accessor) => Some(accessor),
        Err(err) => {
            tracing::debug!(%err, expression = %lambda, "rewritten accessor did not compile");
            None
        }
    }
}

#[cfg(test)]
mod tests;

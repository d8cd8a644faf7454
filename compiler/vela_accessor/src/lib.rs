//! Vela Accessor - cached, null-safe accessors for model expressions.
//!
//! Given a lambda such as `m => m.Address.City`, the [`AccessorCompiler`]
//! classifies its shape, rewrites member chains so a null anywhere on the way
//! yields null, compiles the result, and caches it under a structural key so
//! that every lambda reading the same members shares one accessor.
//!
//! # Architecture
//!
//! - `shape`: classification of lambda bodies
//! - `rewrite`: null-safe rewriting and projections
//! - `key`: detached structural keys for member chains
//! - `cache`: concurrent, partitioned accessor cache
//! - `compiler`: the `AccessorCompiler` service tying the above together
//! - `text`: dotted/bracketed field names with their own structural cache
//! - `metadata`, `provider`: model metadata and model expressions for views
//!
//! # Tracing
//!
//! Set `RUST_LOG=vela_accessor=trace` and call [`init_tracing`] to see shape
//! decisions, cache misses and fallbacks.

mod cache;
mod compiler;
mod config;
mod errors;
mod key;
mod metadata;
mod provider;
mod rewrite;
mod shape;
mod text;

#[cfg(test)]
#[allow(dead_code, reason = "shared fixture; not every test reads every member")]
mod test_helpers;

use std::sync::Once;

pub use cache::{
    AccessorCache, CacheCategory, CacheSlot, CacheStats, CategoryStats, PartitionKey,
};
pub use compiler::{AccessorCompiler, AccessorCompilerBuilder};
pub use config::{AccessorOptions, CacheMode, CACHE_ENV_VAR};
pub use errors::ExpressionError;
pub use key::MemberChainKey;
pub use metadata::{
    metadata_for_lambda, DefaultModelMetadataProvider, ModelExplorer, ModelMetadata,
    ModelMetadataProvider,
};
pub use provider::{ModelExpression, ModelExpressionProvider};
pub use rewrite::{captured_projection, null_safe, static_access};
pub use shape::{classify, is_chained_member, is_single_argument_indexer, Shape};
pub use text::{expression_text, text_for_name, ExpressionTextCache};

/// Compiled accessor: model in, boxed value out.
pub type Accessor = vela_eval::CompiledFn;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing.
///
/// Call once at startup. Only takes effect if `RUST_LOG` is set, so it is
/// free when logging is not wanted.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}

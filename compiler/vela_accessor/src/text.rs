//! Expression text: the dotted and bracketed field name an accessor lambda
//! denotes, such as `Orders[3].Total` for `m => m.Orders[3].Total`.
//!
//! Names are built from the terminal node inward. Index arguments are
//! evaluated on the spot and spliced in as text; a name containing an index
//! depends on runtime values and is never cached.

use std::sync::Arc;

use dashmap::DashMap;
use rustc_hash::FxBuildHasher;
use smallvec::SmallVec;
use vela_ir::{Expr, ExprKind, ExprRef, Lambda, Name, Parameter, Type, Value};

use crate::errors::ExpressionError;
use crate::shape::is_single_argument_indexer;

/// Leading segment dropped from names that read a view's own model property.
const MODEL_SEGMENT: &str = "model";

/// Structural key of a lambda for the text cache.
///
/// Only pure member chains are keyed. Member names are compared from the
/// terminal inward; a synthesized member ends the chain without contributing
/// its name, so lambdas that differ only in their closure fields share an
/// entry.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct TextKey {
    model_type: Name,
    return_type: Name,
    members: SmallVec<[Name; 4]>,
    end: ChainEnd,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
enum ChainEnd {
    Parameter,
    Synthesized,
}

impl TextKey {
    fn new(lambda: &Lambda) -> Option<Self> {
        let mut members = SmallVec::new();
        let mut current = strip_root_convert(lambda.body());
        let end = loop {
            match current.kind() {
                ExprKind::Member {
                    target: Some(target),
                    member,
                } => {
                    if member.is_synthesized() {
                        break ChainEnd::Synthesized;
                    }
                    members.push(member.name());
                    current = target;
                }
                ExprKind::Parameter(p) if p == lambda.parameter() => break ChainEnd::Parameter,
                _ => return None,
            }
        };
        Some(TextKey {
            model_type: lambda.model_type().name(),
            return_type: lambda.return_type().name(),
            members,
            end,
        })
    }
}

/// Caller-owned cache of expression text, shareable between call sites.
#[derive(Default)]
pub struct ExpressionTextCache {
    entries: DashMap<TextKey, Arc<str>, FxBuildHasher>,
}

impl ExpressionTextCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Text for a string expression: the name itself, except that `model` alone
/// names the model and yields `""` like `m => m` does.
pub fn text_for_name(expression: &str) -> &str {
    if expression.eq_ignore_ascii_case(MODEL_SEGMENT) {
        ""
    } else {
        expression
    }
}

/// Text of the member path `lambda` reads.
///
/// `m => m` yields `""`. Walking stops at a synthesized member or at any node
/// that is not a member access, indexer call or array index, so
/// `m => closure.model.Name` yields `Name`.
pub fn expression_text(
    lambda: &Lambda,
    cache: Option<&ExpressionTextCache>,
) -> Result<String, ExpressionError> {
    let key = cache.and_then(|_| TextKey::new(lambda));
    if let (Some(cache), Some(key)) = (cache, key.as_ref()) {
        if let Some(text) = cache.entries.get(key) {
            return Ok(text.value().to_string());
        }
    }

    let (text, contains_indexers) = build_text(lambda)?;

    if let (Some(cache), Some(key)) = (cache, key) {
        if !contains_indexers {
            cache.entries.entry(key).or_insert_with(|| Arc::from(text.as_str()));
        }
    }
    Ok(text)
}

fn strip_root_convert(body: &ExprRef) -> &ExprRef {
    match body.kind() {
        ExprKind::Convert { operand } => operand,
        _ => body,
    }
}

/// Segments are collected terminal first and reversed at the end.
fn build_text(lambda: &Lambda) -> Result<(String, bool), ExpressionError> {
    let mut segments: Vec<String> = Vec::new();
    let mut contains_indexers = false;
    // Whether the innermost segment collected so far is a member named
    // `model` not reached through the parameter.
    let mut last_is_model = false;
    let mut part = Some(strip_root_convert(lambda.body()));

    while let Some(expr) = part {
        part = match expr.kind() {
            ExprKind::Call {
                target: Some(target),
                method,
                args,
            } if is_single_argument_indexer(method, args) => {
                segments.push(index_segment(lambda, &args[0])?);
                contains_indexers = true;
                last_is_model = false;
                Some(target)
            }
            ExprKind::ArrayIndex { array, index } => {
                segments.push(index_segment(lambda, index)?);
                contains_indexers = true;
                last_is_model = false;
                Some(array)
            }
            ExprKind::Member { target, member } => {
                let name = member.name();
                if member.is_synthesized() {
                    None
                } else {
                    last_is_model = name.as_str().eq_ignore_ascii_case(MODEL_SEGMENT);
                    segments.push(format!(".{name}"));
                    target.as_ref()
                }
            }
            ExprKind::Parameter(_) => {
                last_is_model = false;
                None
            }
            _ => None,
        };
    }

    if last_is_model {
        segments.pop();
    }
    let mut text: String = segments.iter().rev().map(String::as_str).collect();
    if text.starts_with('.') {
        text.remove(0);
    }
    Ok((text, contains_indexers))
}

/// Evaluate an index argument without the model and format it as `[value]`.
fn index_segment(lambda: &Lambda, index: &ExprRef) -> Result<String, ExpressionError> {
    let unbound = Parameter::new("", &Type::object());
    let converted = Expr::convert(index, &Type::object());
    let index_lambda = Lambda::new(unbound, converted);

    let compiled = vela_eval::compile(&index_lambda).map_err(|source| {
        ExpressionError::InvalidIndexerExpression {
            expression: index.to_string(),
            parameter: lambda.parameter().name(),
            source,
        }
    })?;
    let value = compiled(&Value::Null).map_err(|source| ExpressionError::IndexerEvaluation {
        expression: index.to_string(),
        source,
    })?;
    tracing::trace!(index = %index, %value, "evaluated indexer argument");

    Ok(match value {
        Value::Null => "[]".to_owned(),
        value => format!("[{value}]"),
    })
}

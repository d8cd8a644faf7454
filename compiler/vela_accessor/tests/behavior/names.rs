//! Expression text and model expressions as a view would use them.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use vela_accessor::{
    expression_text, AccessorCompiler, DefaultModelMetadataProvider, ExpressionError,
    ExpressionTextCache, ModelExpressionProvider,
};
use vela_ir::{Expr, Lambda, Value};

use crate::fixture::Shop;

#[test]
fn indexed_path_text() {
    let shop = Shop::new();
    assert_eq!(
        expression_text(&shop.order_total(3), None).as_deref(),
        Ok("Orders[3].Total")
    );
}

#[test]
fn identity_text_is_empty() {
    let shop = Shop::new();
    let p = shop.param();
    assert_eq!(
        expression_text(&Lambda::new(p.clone(), Expr::parameter(&p)), None).as_deref(),
        Ok("")
    );
}

#[test]
fn shared_text_cache() {
    let shop = Shop::new();
    let cache = ExpressionTextCache::new();
    for _ in 0..3 {
        let lambda = shop.path(&[&shop.address_member, &shop.street_member, &shop.number]);
        assert_eq!(
            expression_text(&lambda, Some(&cache)).as_deref(),
            Ok("Address.Street.Number")
        );
    }
    assert_eq!(cache.len(), 1);
}

#[test]
fn model_expression_for_nested_property() {
    let shop = Shop::new();
    let metadata = Arc::new(DefaultModelMetadataProvider::new());
    metadata.register_property(&shop.street_name, Some("Street name"));
    let provider = ModelExpressionProvider::new(metadata, AccessorCompiler::new());

    let lambda = shop.path(&[&shop.address_member, &shop.street_member, &shop.street_name]);
    let model = shop.customer_value(shop.address_value("Rome", shop.street_value("Via Appia", 1)));
    let expression = provider
        .create_for_model(&shop.customer, model, &lambda)
        .unwrap();

    assert_eq!(expression.name(), "Address.Street.Name");
    assert_eq!(expression.metadata().display_name(), Some("Street name"));
    assert_eq!(expression.model(), Ok(Value::from("Via Appia")));
}

#[test]
fn model_expression_rejects_computed_values() {
    let shop = Shop::new();
    let provider = ModelExpressionProvider::new(
        Arc::new(DefaultModelMetadataProvider::new()),
        AccessorCompiler::new(),
    );
    let p = shop.param();
    let name = Expr::member(&Expr::parameter(&p), &shop.name);
    let shouted = Lambda::new(p, Expr::binary(vela_ir::BinaryOp::Add, &name, &name));

    let result = provider.create_for_model(&shop.customer, Value::Null, &shouted);
    assert!(matches!(result.err(), Some(ExpressionError::TemplateLimitations)));
}

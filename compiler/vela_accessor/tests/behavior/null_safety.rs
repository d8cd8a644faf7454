//! Null at any link of a member chain yields null, never an error.

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use vela_accessor::AccessorCompiler;
use vela_ir::Value;

use crate::fixture::{Nodes, Shop};

#[test]
fn end_to_end_city() {
    let shop = Shop::new();
    let compiler = AccessorCompiler::new();
    let city = compiler
        .compile(&shop.path(&[&shop.address_member, &shop.city]))
        .expect("member chains compile");

    let seattle = shop.customer_value(shop.address_value("Seattle", Value::Null));
    assert_eq!(city(&seattle), Ok(Value::from("Seattle")));
    assert_eq!(city(&shop.customer_value(Value::Null)), Ok(Value::Null));
}

#[test]
fn every_link_of_a_three_hop_chain() {
    let shop = Shop::new();
    let compiler = AccessorCompiler::new();
    let number = compiler
        .compile(&shop.path(&[&shop.address_member, &shop.street_member, &shop.number]))
        .expect("member chains compile");

    let full = shop.customer_value(shop.address_value("Oslo", shop.street_value("Main", 12)));
    assert_eq!(number(&full), Ok(Value::Int(12)));

    let no_street = shop.customer_value(shop.address_value("Oslo", Value::Null));
    let no_address = shop.customer_value(Value::Null);
    for model in [no_street, no_address, Value::Null] {
        assert_eq!(number(&model), Ok(Value::Null));
    }
}

#[test]
fn nullable_terminal_passes_through() {
    let shop = Shop::new();
    let compiler = AccessorCompiler::new();
    let rating = compiler
        .compile(&shop.path(&[&shop.rating]))
        .expect("simple members compile");

    assert_eq!(rating(&shop.customer_value(Value::Null)), Ok(Value::Int(5)));
    assert_eq!(rating(&Value::Null), Ok(Value::Null));
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        ..ProptestConfig::default()
    })]

    /// For any chain depth and any single null link, the accessor returns
    /// null; with no null link it returns the leaf.
    #[test]
    fn prop_null_at_any_link(
        (depth, null_at) in (1usize..8).prop_flat_map(|depth| {
            (Just(depth), proptest::option::of(0..=depth))
        }),
        leaf in any::<i64>(),
    ) {
        let nodes = Nodes::new();
        let compiler = AccessorCompiler::new();
        let accessor = compiler.compile(&nodes.chain(depth)).expect("chains compile");

        let expected = if null_at.is_some() { Value::Null } else { Value::Int(leaf) };
        prop_assert_eq!(accessor(&nodes.value(depth, leaf, null_at)), Ok(expected));
    }

    /// Compiling again, cached or not, behaves the same.
    #[test]
    fn prop_recompile_is_idempotent(depth in 1usize..6, leaf in any::<i64>()) {
        let nodes = Nodes::new();
        let compiler = AccessorCompiler::new();
        let first = compiler.compile(&nodes.chain(depth)).expect("chains compile");
        let second = compiler.compile(&nodes.chain(depth)).expect("chains compile");
        let uncached = AccessorCompiler::builder()
            .caching(vela_accessor::CacheMode::Disabled)
            .build()
            .compile(&nodes.chain(depth))
            .expect("chains compile");

        let model = nodes.value(depth, leaf, None);
        prop_assert_eq!(first(&model), second(&model));
        prop_assert_eq!(first(&model), uncached(&model));
    }
}

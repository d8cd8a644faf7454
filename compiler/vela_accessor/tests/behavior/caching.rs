//! Structural caching: equal member paths share one accessor, different paths
//! never collide, and runtime-dependent shapes are never cached.

use std::sync::Arc;
use std::thread;

use pretty_assertions::assert_eq;
use vela_accessor::{AccessorCompiler, CacheCategory, MemberChainKey};
use vela_ir::{Expr, Lambda, Member, Name, Parameter, Type, Value};

use crate::fixture::Shop;

#[test]
fn same_path_from_different_lambdas_shares_accessor() {
    let shop = Shop::new();
    let compiler = AccessorCompiler::new();
    // Two call sites: separate parameters, nodes and member handles.
    let first = compiler.compile(&shop.path(&[&shop.name])).unwrap();
    let other_site = Shop::new();
    let second = compiler.compile(&other_site.path(&[&other_site.name])).unwrap();

    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn sibling_chains_do_not_collide() {
    let shop = Shop::new();
    let compiler = AccessorCompiler::new();
    let city = compiler
        .compile(&shop.path(&[&shop.address_member, &shop.city]))
        .unwrap();
    let street = compiler
        .compile(&shop.path(&[&shop.address_member, &shop.street_member]))
        .unwrap();

    assert!(!Arc::ptr_eq(&city, &street));
    let model = shop.customer_value(shop.address_value("Lima", shop.street_value("Sol", 3)));
    assert_eq!(city(&model), Ok(Value::from("Lima")));
    assert!(street(&model).is_ok_and(|v| v.as_record().is_some()));
    assert_eq!(compiler.cache().len(), 2);
}

#[test]
fn same_member_names_on_other_model_type_do_not_collide() {
    let shop = Shop::new();
    let compiler = AccessorCompiler::new();
    let vip = Type::reference("Vip");
    let vip_address = Member::property(&vip, "Address", &shop.address);
    let p = Parameter::new("v", &vip);
    let vip_city = Lambda::new(
        p.clone(),
        Expr::member(&Expr::member(&Expr::parameter(&p), &vip_address), &shop.city),
    );

    let customer_city = compiler
        .compile(&shop.path(&[&shop.address_member, &shop.city]))
        .unwrap();
    let vip_city = compiler.compile(&vip_city).unwrap();

    assert!(!Arc::ptr_eq(&customer_city, &vip_city));
    assert_eq!(compiler.cache().partition_count(), 2);
}

#[test]
fn synthesized_members_share_keys_across_closure_types() {
    let person = Name::intern("Person");
    let city = Member::property(&Type::reference("Address"), "City", &Type::string()).key();
    let object = Type::object();
    let first = Member::field(&Type::reference("<>c__DisplayClass1"), "CS$<>8__locals", &object);
    let second = Member::field(&Type::reference("<>c__DisplayClass7"), "<>4__this", &object);

    let a = MemberChainKey::new(person, [city, first.key()]);
    let b = MemberChainKey::new(person, [city, second.key()]);
    assert_eq!(a, b);

    let plain = Member::field(&Type::reference("DisplayClass"), "locals", &object);
    assert_ne!(a, MemberChainKey::new(person, [city, plain.key()]));
}

#[test]
fn indexer_results_are_never_stale() {
    let shop = Shop::new();
    let compiler = AccessorCompiler::new();
    let model = shop.customer_value(Value::Null);

    for (index, total) in [(0, 10), (2, 30), (1, 20)] {
        let lambda = shop.order_total(index);
        assert!(compiler.compile(&lambda).is_none());
        let accessor = compiler.compile_or_fallback(&lambda).unwrap();
        assert_eq!(accessor(&model), Ok(Value::Int(total)));
    }
    assert!(compiler.cache().is_empty());
}

#[test]
fn captured_index_is_read_per_lambda() {
    let shop = Shop::new();
    let compiler = AccessorCompiler::new();
    let closure = Type::reference("DisplayClass");
    let i = Member::field(&closure, "i", &Type::int());
    let model = shop.customer_value(Value::Null);

    for (index, score) in [(0, 3), (1, 4)] {
        let p = shop.param();
        let locals = Value::record(&closure, [("i", Value::Int(index))]);
        let captured = Expr::constant(locals, &closure);
        let scores = Expr::member(&Expr::parameter(&p), &shop.scores);
        let lambda = Lambda::new(p, Expr::array_index(&scores, &Expr::member(&captured, &i)));

        let accessor = compiler.compile_or_fallback(&lambda).unwrap();
        assert_eq!(accessor(&model), Ok(Value::Int(score)));
    }
}

#[test]
fn concurrent_requests_share_one_accessor() {
    let compiler = AccessorCompiler::new();
    let accessors: Vec<_> = thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let compiler = compiler.clone();
                s.spawn(move || {
                    let shop = Shop::new();
                    let path = [&shop.address_member, &shop.street_member, &shop.street_name];
                    compiler.compile(&shop.path(&path)).unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert!(accessors.iter().all(|a| Arc::ptr_eq(a, &accessors[0])));
    let stats = compiler.stats().category(CacheCategory::ChainedMember);
    assert_eq!(stats.hits + stats.misses, 8);
    assert_eq!(compiler.cache().len(), 1);
}

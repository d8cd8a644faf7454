use super::*;
use crate::cache::{CacheCategory, CategoryStats};
use crate::test_helpers::{model, Model};
use pretty_assertions::assert_eq;
use vela_ir::{EvalError, Expr, Member, Type};

fn compile(compiler: &AccessorCompiler, lambda: &Lambda) -> Accessor {
    compiler
        .compile(lambda)
        .unwrap_or_else(|| panic!("{lambda} should compile"))
}

#[test]
fn test_end_to_end_chain() {
    let m = model();
    let compiler = AccessorCompiler::new();
    let city = compile(&compiler, &m.path(&[&m.address_member, &m.city]));

    assert_eq!(
        city(&m.person_value(m.address_value("Seattle"))),
        Ok(Value::from("Seattle"))
    );
    assert_eq!(city(&m.person_value(Value::Null)), Ok(Value::Null));
}

#[test]
fn test_identity_is_shared() {
    let m = model();
    let compiler = AccessorCompiler::new();
    let p1 = m.param();
    let p2 = m.param();
    let a = compile(&compiler, &Lambda::new(p1.clone(), Expr::parameter(&p1)));
    let b = compile(&compiler, &Lambda::new(p2.clone(), Expr::parameter(&p2)));

    assert!(Arc::ptr_eq(&a, &b));
    let person = m.person_value(Value::Null);
    assert!(a(&person).is_ok_and(|v| v.same_instance(&person)));
}

#[test]
fn test_simple_member_shared_across_instances() {
    let m = model();
    let compiler = AccessorCompiler::new();
    let a = compile(&compiler, &m.path(&[&m.name]));
    // A separately built member handle for the same property.
    let name = Member::property(&m.person, "Name", &Type::string());
    let b = compile(&compiler, &m.path(&[&name]));

    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(
        compiler.stats().category(CacheCategory::SimpleMember),
        CategoryStats { hits: 1, misses: 1 }
    );
}

#[test]
fn test_value_result_is_boxed() {
    let m = model();
    let compiler = AccessorCompiler::new();
    let age = compile(&compiler, &m.path(&[&m.age]));
    let zip = compile(&compiler, &m.path(&[&m.address_member, &m.zip]));

    assert_eq!(age(&m.person_value(Value::Null)), Ok(Value::Int(36)));
    assert_eq!(age(&Value::Null), Ok(Value::Null));
    assert_eq!(
        zip(&m.person_value(m.address_value("Seattle"))),
        Ok(Value::Int(98101))
    );
    assert_eq!(zip(&m.person_value(Value::Null)), Ok(Value::Null));
}

#[test]
fn test_constant_is_not_cached() {
    let m = model();
    let compiler = AccessorCompiler::new();
    let lambda = Lambda::new(m.param(), Expr::constant(Value::from("fixed"), &Type::string()));
    let accessor = compile(&compiler, &lambda);

    assert_eq!(accessor(&Value::Null), Ok(Value::from("fixed")));
    assert!(compiler.cache().is_empty());
}

#[test]
fn test_captured_constant_shares_projection() {
    let m = model();
    let compiler = AccessorCompiler::new();
    let closure = Type::reference("DisplayClass");
    let local = Member::field(&closure, "limit", &Type::int());
    let lambda_for = |n: i64| {
        let captured = Value::record(&closure, [("limit", Value::Int(n))]);
        Lambda::new(m.param(), Expr::member(&Expr::constant(captured, &closure), &local))
    };

    let five = compile(&compiler, &lambda_for(5));
    let nine = compile(&compiler, &lambda_for(9));

    // Each accessor carries its own captured value over one projection.
    assert_eq!(five(&Value::Null), Ok(Value::Int(5)));
    assert_eq!(nine(&Value::Null), Ok(Value::Int(9)));
    assert_eq!(
        compiler.stats().category(CacheCategory::CapturedConstant),
        CategoryStats { hits: 1, misses: 1 }
    );
    assert_eq!(compiler.cache().len(), 1);
}

#[test]
fn test_static_member_cached_by_member() {
    let m = model();
    let compiler = AccessorCompiler::new();
    let max = Member::static_member(&m.person, "MaxAge", &Type::int(), || Ok(Value::Int(150)));
    let a = compile(&compiler, &Lambda::new(m.param(), Expr::static_member(&max)));
    let b = compile(&compiler, &Lambda::new(m.param(), Expr::static_member(&max)));

    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(a(&Value::Null), Ok(Value::Int(150)));
}

#[test]
fn test_indexers_are_not_compiled() {
    let m = model();
    let compiler = AccessorCompiler::new();
    let p = m.param();
    let orders = Expr::member(&Expr::parameter(&p), &m.orders);
    let item = Lambda::new(p, Expr::call(&orders, &m.get_item, vec![Model::int(1)]));

    assert!(compiler.compile(&item).is_none());
    assert!(compiler.cache().is_empty());

    let fallback = compiler
        .compile_or_fallback(&item)
        .unwrap_or_else(|e| panic!("{e}"));
    assert_eq!(
        fallback(&m.person_value(Value::Null)),
        Ok(Value::from("order-1"))
    );
    assert_eq!(fallback(&Value::Null), Ok(Value::Null));
}

#[test]
fn test_fallback_keeps_non_null_errors() {
    let m = model();
    let compiler = AccessorCompiler::new();
    let p = m.param();
    let tags = Expr::member(&Expr::parameter(&p), &m.tags);
    let tag = Lambda::new(p, Expr::array_index(&tags, &Model::int(5)));
    let accessor = compiler
        .compile_or_fallback(&tag)
        .unwrap_or_else(|e| panic!("{e}"));

    assert_eq!(
        accessor(&m.person_value(Value::Null)),
        Err(EvalError::IndexOutOfRange { index: 5, len: 2 })
    );
}

#[test]
fn test_caching_disabled() {
    let m = model();
    let compiler = AccessorCompiler::builder()
        .caching(CacheMode::Disabled)
        .build();
    let a = compile(&compiler, &m.path(&[&m.name]));
    let b = compile(&compiler, &m.path(&[&m.name]));

    assert!(!Arc::ptr_eq(&a, &b));
    assert_eq!(a(&m.person_value(Value::Null)), b(&m.person_value(Value::Null)));
    assert!(compiler.cache().is_empty());
    assert_eq!(compiler.options().caching, CacheMode::Disabled);
}

#[test]
fn test_clones_share_cache() {
    let m = model();
    let compiler = AccessorCompiler::default();
    let clone = compiler.clone();
    let a = compile(&compiler, &m.path(&[&m.address_member, &m.geo_member, &m.lat]));
    let b = clone.compile(&m.path(&[&m.address_member, &m.geo_member, &m.lat]));

    assert!(b.is_some_and(|b| Arc::ptr_eq(&a, &b)));
}

//! Shared model used by the unit tests.
//!
//! `Person { Name, Age, Nickname: string?, Score: int?, Address: Address,
//! Orders: OrderList, Tags: string[] }`, `Address { City, Zip: int, Geo: Geo }`
//! and `Geo { Lat: float }`.

use vela_ir::{
    EvalError, Expr, ExprRef, Lambda, Member, Method, Parameter, Type, TypeKind, Value,
};

pub(crate) struct Model {
    pub person: Type,
    pub address: Type,
    pub geo: Type,
    pub order_list: Type,
    pub name: Member,
    pub age: Member,
    pub score: Member,
    pub address_member: Member,
    pub orders: Member,
    pub tags: Member,
    pub city: Member,
    pub zip: Member,
    pub geo_member: Member,
    pub lat: Member,
    pub get_item: Method,
}

pub(crate) fn model() -> Model {
    let person = Type::reference("Person");
    let address = Type::reference("Address");
    let geo = Type::reference("Geo");
    let order_list = Type::builder("OrderList", TypeKind::Reference)
        .property("Count", None)
        .indexer("Item", "get_Item")
        .build();
    let get_item = Method::new(
        &order_list,
        "get_Item",
        &Type::string(),
        vec![Type::int()],
        |target, args| match (target, args) {
            (Value::Record(_), [Value::Int(i)]) => Ok(Value::string(format!("order-{i}"))),
            _ => Err(EvalError::new("bad indexer call")),
        },
    );
    Model {
        name: Member::property(&person, "Name", &Type::string()),
        age: Member::property(&person, "Age", &Type::int()),
        score: Member::property(&person, "Score", &Type::int().nullable()),
        address_member: Member::property(&person, "Address", &address),
        orders: Member::property(&person, "Orders", &order_list),
        tags: Member::property(&person, "Tags", &Type::string().array_of()),
        city: Member::property(&address, "City", &Type::string()),
        zip: Member::property(&address, "Zip", &Type::int()),
        geo_member: Member::property(&address, "Geo", &geo),
        lat: Member::property(&geo, "Lat", &Type::float()),
        get_item,
        person,
        address,
        geo,
        order_list,
    }
}

impl Model {
    pub fn param(&self) -> Parameter {
        Parameter::new("m", &self.person)
    }

    /// `m => m.<path...>` over instance members.
    pub fn path(&self, members: &[&Member]) -> Lambda {
        let p = self.param();
        let mut body = Expr::parameter(&p);
        for member in members {
            body = Expr::member(&body, member);
        }
        Lambda::new(p, body)
    }

    pub fn int(n: i64) -> ExprRef {
        Expr::constant(Value::Int(n), &Type::int())
    }

    pub fn address_value(&self, city: &str) -> Value {
        Value::record(
            &self.address,
            [
                ("City", Value::from(city)),
                ("Zip", Value::Int(98101)),
                ("Geo", Value::record(&self.geo, [("Lat", Value::Float(47.6))])),
            ],
        )
    }

    pub fn person_value(&self, address: Value) -> Value {
        Value::record(
            &self.person,
            [
                ("Name", Value::from("Ada")),
                ("Age", Value::Int(36)),
                ("Score", Value::Null),
                ("Address", address),
                ("Orders", Value::record(&self.order_list, [("Count", Value::Int(2))])),
                ("Tags", Value::list([Value::from("a"), Value::from("b")])),
            ],
        )
    }
}

//! Models shared by the behavior tests.

#![allow(dead_code, reason = "each test module uses a different part")]

use vela_ir::{EvalError, Expr, Lambda, Member, Method, Parameter, Type, TypeKind, Value};

/// `Customer { Name, Rating: int?, Address, Orders: OrderList, Scores: int[] }`,
/// `Address { City, Street }`, `Street { Name, Number: int }`,
/// `OrderList` with an `Item` indexer returning `Order { Total: int }`.
pub struct Shop {
    pub customer: Type,
    pub address: Type,
    pub street: Type,
    pub order: Type,
    pub order_list: Type,
    pub name: Member,
    pub rating: Member,
    pub address_member: Member,
    pub orders: Member,
    pub scores: Member,
    pub city: Member,
    pub street_member: Member,
    pub street_name: Member,
    pub number: Member,
    pub total: Member,
    pub get_item: Method,
}

impl Shop {
    pub fn new() -> Self {
        let customer = Type::reference("Customer");
        let address = Type::reference("Address");
        let street = Type::reference("Street");
        let order = Type::reference("Order");
        let order_list = Type::builder("OrderList", TypeKind::Reference)
            .indexer("Item", "get_Item")
            .build();
        let items = vela_ir::Name::intern("Items");
        let get_item = Method::new(
            &order_list,
            "get_Item",
            &order,
            vec![Type::int()],
            move |target, args| {
                let (Some(list), [Value::Int(i)]) = (target.as_record(), args) else {
                    return Err(EvalError::new("bad indexer call"));
                };
                match list.get(items) {
                    Some(Value::List(orders)) => usize::try_from(*i)
                        .ok()
                        .and_then(|i| orders.get(i))
                        .cloned()
                        .ok_or(EvalError::IndexOutOfRange {
                            index: *i,
                            len: orders.len(),
                        }),
                    _ => Err(EvalError::new("order list without items")),
                }
            },
        );
        Shop {
            name: Member::property(&customer, "Name", &Type::string()),
            rating: Member::property(&customer, "Rating", &Type::int().nullable()),
            address_member: Member::property(&customer, "Address", &address),
            orders: Member::property(&customer, "Orders", &order_list),
            scores: Member::property(&customer, "Scores", &Type::int().array_of()),
            city: Member::property(&address, "City", &Type::string()),
            street_member: Member::property(&address, "Street", &street),
            street_name: Member::property(&street, "Name", &Type::string()),
            number: Member::property(&street, "Number", &Type::int()),
            total: Member::property(&order, "Total", &Type::int()),
            get_item,
            customer,
            address,
            street,
            order,
            order_list,
        }
    }

    pub fn param(&self) -> Parameter {
        Parameter::new("m", &self.customer)
    }

    /// `m => m.<members...>`, built fresh on every call.
    pub fn path(&self, members: &[&Member]) -> Lambda {
        let p = self.param();
        let mut body = Expr::parameter(&p);
        for member in members {
            body = Expr::member(&body, member);
        }
        Lambda::new(p, body)
    }

    /// `m => m.Orders[index].Total`.
    pub fn order_total(&self, index: i64) -> Lambda {
        let p = self.param();
        let orders = Expr::member(&Expr::parameter(&p), &self.orders);
        let item = Expr::call(
            &orders,
            &self.get_item,
            vec![Expr::constant(Value::Int(index), &Type::int())],
        );
        Lambda::new(p, Expr::member(&item, &self.total))
    }

    pub fn street_value(&self, name: &str, number: i64) -> Value {
        Value::record(
            &self.street,
            [("Name", Value::from(name)), ("Number", Value::Int(number))],
        )
    }

    pub fn address_value(&self, city: &str, street: Value) -> Value {
        Value::record(
            &self.address,
            [("City", Value::from(city)), ("Street", street)],
        )
    }

    pub fn customer_value(&self, address: Value) -> Value {
        let orders = [10, 20, 30]
            .map(|total| Value::record(&self.order, [("Total", Value::Int(total))]));
        Value::record(
            &self.customer,
            [
                ("Name", Value::from("Grace")),
                ("Rating", Value::Int(5)),
                ("Address", address),
                (
                    "Orders",
                    Value::record(&self.order_list, [("Items", Value::list(orders))]),
                ),
                ("Scores", Value::list([Value::Int(3), Value::Int(4)])),
            ],
        )
    }
}

/// Self-referential `Node { Next: Node, Value: int }` for chains of any depth.
pub struct Nodes {
    pub node: Type,
    pub next: Member,
    pub value: Member,
}

impl Nodes {
    pub fn new() -> Self {
        let node = Type::reference("Node");
        Nodes {
            next: Member::property(&node, "Next", &node),
            value: Member::property(&node, "Value", &Type::int()),
            node,
        }
    }

    /// `n => n.Next ... .Next.Value` with `depth` `Next` hops.
    pub fn chain(&self, depth: usize) -> Lambda {
        let p = Parameter::new("n", &self.node);
        let mut body = Expr::parameter(&p);
        for _ in 0..depth {
            body = Expr::member(&body, &self.next);
        }
        Lambda::new(p, Expr::member(&body, &self.value))
    }

    /// A list of `depth + 1` nodes whose last node holds `leaf`. If `null_at`
    /// is `Some(k)`, the node `k` hops from the root is null instead.
    pub fn value(&self, depth: usize, leaf: i64, null_at: Option<usize>) -> Value {
        let mut current = if null_at == Some(depth) {
            Value::Null
        } else {
            Value::record(&self.node, [("Value", Value::Int(leaf)), ("Next", Value::Null)])
        };
        for hop in (0..depth).rev() {
            current = if null_at == Some(hop) {
                Value::Null
            } else {
                Value::record(&self.node, [("Value", Value::Int(-1)), ("Next", current)])
            };
        }
        current
    }
}

//! The built-in sample relations: employees, departments, phones, and one
//! contractor.

use crate::execution::Environment;
use crate::types::{Relation, Tuple, Value};

fn tuple<const N: usize>(pairs: [(&str, Value); N]) -> Tuple {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_owned(), v))
        .collect()
}

/// Bind `E`, `D`, `Phone`, and `ContractorPay`.
pub fn load_sample_data(env: &mut Environment) {
    let employees = [
        (1, "Alice", 80000, 10, "engineer"),
        (2, "Bob", 60000, 10, "manager"),
        (3, "Carol", 55000, 20, "engineer"),
        (4, "Dave", 90000, 10, "engineer"),
        (5, "Eve", 45000, 20, "engineer"),
    ];
    env.bind(
        "E",
        Relation::infer(employees.into_iter().map(|(id, name, salary, dept, role)| {
            tuple([
                ("emp_id", Value::Integer(id)),
                ("name", Value::from(name)),
                ("salary", Value::Integer(salary)),
                ("dept_id", Value::Integer(dept)),
                ("role", Value::from(role)),
            ])
        }))
        .expect("sample data conforms"),
    );

    env.bind(
        "D",
        Relation::infer([
            tuple([
                ("dept_id", Value::Integer(10)),
                ("dept_name", Value::from("Engineering")),
            ]),
            tuple([
                ("dept_id", Value::Integer(20)),
                ("dept_name", Value::from("Sales")),
            ]),
        ])
        .expect("sample data conforms"),
    );

    env.bind(
        "Phone",
        Relation::infer([
            tuple([
                ("emp_id", Value::Integer(1)),
                ("phone", Value::from("555-1234")),
            ]),
            tuple([
                ("emp_id", Value::Integer(3)),
                ("phone", Value::from("555-5678")),
            ]),
            tuple([
                ("emp_id", Value::Integer(3)),
                ("phone", Value::from("555-9999")),
            ]),
        ])
        .expect("sample data conforms"),
    );

    env.bind(
        "ContractorPay",
        Relation::infer([tuple([
            ("name", Value::from("Frank")),
            ("pay", Value::Integer(70000)),
        ])])
        .expect("sample data conforms"),
    );
}

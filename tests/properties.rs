//! Algebraic laws the operators must satisfy.

mod common;

use common::*;
use relish::parsing::ast::RelExpr;
use relish::{evaluate, Error, Output};
use std::collections::HashSet;

#[test]
fn operators_never_produce_duplicates() {
    let env = sample_env();
    let queries = [
        "E # dept_id",
        "E #! [emp_id name salary]",
        "E ? salary > 0",
        "E ?! salary > 0",
        "E * D",
        "E | E",
        "E & E",
        "E - (E ? dept_id = 10)",
        "E / role [n: #.]",
        "E /: dept_id > team",
        "E + flag: true",
        "E @ name > who",
        "E *: Phone > phones <: phones",
    ];
    for query in queries {
        let rel = eval_rel(&env, query);
        let set: HashSet<_> = rel.iter().cloned().collect();
        assert_eq!(set.len(), rel.len(), "duplicates from {:?}", query);
    }
}

#[test]
fn result_schemas_are_data_independent() {
    let mut env = sample_env();
    // An empty relation with E's schema produces the same result schemas as
    // E itself.
    let none = eval_rel(&env, "E ? salary < 0");
    assert!(none.is_empty());
    env.bind("None", none);

    for (full, empty) in [
        ("E # [name salary]", "None # [name salary]"),
        ("E + double: salary * 2", "None + double: salary * 2"),
        ("E / dept_id [n: #.]", "None / dept_id [n: #.]"),
        ("E /: dept_id > team", "None /: dept_id > team"),
        ("E @ name > who", "None @ name > who"),
    ] {
        assert_eq!(
            eval_rel(&env, full).schema(),
            eval_rel(&env, empty).schema(),
            "schema mismatch between {:?} and {:?}",
            full,
            empty
        );
    }
}

#[test]
fn every_tuple_conforms_to_its_relation_schema() {
    let env = sample_env();
    for query in ["E * D", "E *: Phone > phones", "E / dept_id [n: #.]"] {
        let rel = eval_rel(&env, query);
        for tuple in rel.iter() {
            assert_eq!(&tuple.attributes(), rel.schema(), "from {:?}", query);
        }
    }
}

#[test]
fn projection_is_idempotent() {
    let env = sample_env();
    assert_eq!(
        eval_rel(&env, "E # [name salary] # [name salary]"),
        eval_rel(&env, "E # [name salary]")
    );
}

#[test]
fn filters_commute_and_fuse() {
    let env = sample_env();
    let a = eval_rel(&env, "E ? dept_id = 10 ? salary > 70000");
    let b = eval_rel(&env, "E ? salary > 70000 ? dept_id = 10");
    let c = eval_rel(&env, "E ? (dept_id = 10 & salary > 70000)");
    assert_eq!(a, b);
    assert_eq!(a, c);
}

#[test]
fn join_on_identical_schemas_is_intersection() {
    let mut env = sample_env();
    let half = eval_rel(&env, "E ? dept_id = 10");
    env.bind("F", half);
    assert_eq!(eval_rel(&env, "E * F"), eval_rel(&env, "E & F"));
}

#[test]
fn nest_join_preserves_left_cardinality() {
    let env = sample_env();
    let left = eval_rel(&env, "E");
    let nested = eval_rel(&env, "E *: Phone > phones");
    assert_eq!(nested.len(), left.len());
}

#[test]
fn unnest_inverts_nest_join_on_matches() {
    let env = sample_env();
    assert_eq!(
        eval_rel(&env, "E *: Phone > phones <: phones"),
        eval_rel(&env, "E * Phone")
    );
}

#[test]
fn the_type_boundary_is_enforced_both_ways() {
    let env = sample_env();
    // Relational operators reject ordered input.
    for query in [
        "E $ salary # name",
        "E $ salary ? salary > 0",
        "E $ salary * D",
        "E $ salary /. [n: #.]",
    ] {
        let err = relish::compile_and_eval(query, &env).unwrap_err();
        assert!(matches!(err, Error::Boundary(_)), "{:?}: {:?}", query, err);
    }

    // Take rejects relational input. The parser already refuses `E ^ 3`, so
    // drive the executor directly.
    assert!(matches!(
        relish::compile_and_eval("E ^ 3", &env).unwrap_err(),
        Error::Parse { .. }
    ));
    let take = RelExpr::Take {
        source: Box::new(RelExpr::Name("E".into())),
        count: 3,
    };
    assert!(matches!(
        evaluate(&take, &env).unwrap_err(),
        Error::Boundary(_)
    ));
}

#[test]
fn set_operations_check_schemas() {
    let env = sample_env();
    for query in ["E | D", "E - D", "E & D"] {
        let err = relish::compile_and_eval(query, &env).unwrap_err();
        assert!(matches!(err, Error::Schema(_)), "{:?}: {:?}", query, err);
    }
}

#[test]
fn summarize_is_well_formed() {
    let env = sample_env();
    let grouped = eval_rel(&env, "E / dept_id [n: #. top: >. salary]");
    let expected_schema: Vec<String> = ["dept_id", "n", "top"]
        .into_iter()
        .map(String::from)
        .collect();
    assert_eq!(
        grouped.schema().iter().cloned().collect::<Vec<_>>(),
        expected_schema
    );

    // One output tuple per distinct key value.
    let distinct_keys = eval_rel(&env, "E # dept_id").len();
    assert_eq!(grouped.len(), distinct_keys);

    // Summarize over an empty input has no groups at all.
    let empty = eval_rel(&env, "E ? salary < 0 / dept_id [n: #.]");
    assert!(empty.is_empty());
    assert_eq!(empty.schema().len(), 2);

    // Summarize-all yields at most one tuple, even on empty input.
    assert_eq!(eval_rel(&env, "E /. [n: #.]").len(), 1);
    let all_empty = eval_rel(&env, "E ? salary < 0 /. [n: #. total: +. salary]");
    assert_eq!(all_empty.len(), 1);
    let only = all_empty.iter().next().unwrap();
    assert_eq!(only.get("n"), Some(&int(0)));
    assert_eq!(only.get("total"), Some(&int(0)));
}

#[test]
fn min_max_over_an_empty_input_is_a_domain_error() {
    let env = sample_env();
    let err = relish::compile_and_eval("E ? salary < 0 /. [top: >. salary]", &env).unwrap_err();
    assert!(matches!(err, Error::Domain(_)));
}

#[test]
fn sort_ties_preserve_canonical_order() {
    let env = sample_env();
    // All employees share no duplicate roles per dept; sort by a constant-ish
    // key (role) and check the tie order is reproducible.
    let first = eval_ordered(&env, "E $ role");
    let second = eval_ordered(&env, "E $ role");
    assert_eq!(first, second);

    let rows: Vec<_> = first.iter().collect();
    // Descending ordering is the exact reverse when all keys are distinct;
    // with ties it must still be deterministic.
    assert_eq!(rows.len(), 5);
}

#[test]
fn sort_orders_lexicographically_over_multiple_keys() {
    let env = sample_env();
    let sorted = eval_ordered(&env, "E $ [dept_id salary-]");
    let salaries: Vec<i64> = sorted
        .iter()
        .map(|t| match t.get("salary") {
            Some(relish::Value::Integer(i)) => *i,
            other => panic!("unexpected value {:?}", other),
        })
        .collect();
    assert_eq!(salaries, vec![90000, 80000, 60000, 55000, 45000]);
}

#[test]
fn take_clamps_to_the_available_length() {
    let env = sample_env();
    let taken = eval_ordered(&env, "E $ salary ^ 99");
    assert_eq!(taken.len(), 5);
    match eval(&env, "E $ salary ^ 0") {
        Output::Ordered(tuples) => assert!(tuples.is_empty()),
        other => panic!("unexpected output {:?}", other),
    }
}

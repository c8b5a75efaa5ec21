//! Shared fixtures for the integration suite.

#![allow(dead_code)]

use relish::data::sample::load_sample_data;
use relish::{compile_and_eval, Environment, Output, OrderedTuples, Relation, Tuple, Value};

/// An environment with the four sample relations bound.
pub fn sample_env() -> Environment {
    let mut env = Environment::new();
    load_sample_data(&mut env);
    env
}

pub fn eval(env: &Environment, source: &str) -> Output {
    compile_and_eval(source, env).unwrap_or_else(|err| panic!("query {:?} failed: {}", source, err))
}

pub fn eval_rel(env: &Environment, source: &str) -> Relation {
    match eval(env, source) {
        Output::Relation(rel) => rel,
        Output::Ordered(_) => panic!("query {:?} produced ordered tuples", source),
    }
}

pub fn eval_ordered(env: &Environment, source: &str) -> OrderedTuples {
    match eval(env, source) {
        Output::Ordered(tuples) => tuples,
        Output::Relation(_) => panic!("query {:?} produced a relation", source),
    }
}

pub fn tuple(pairs: &[(&str, Value)]) -> Tuple {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

pub fn int(i: i64) -> Value {
    Value::Integer(i)
}

pub fn s(text: &str) -> Value {
    Value::Str(text.to_owned())
}

/// The relation `{(name, salary)}` built from pairs, for expected values.
pub fn name_salary(pairs: &[(&str, i64)]) -> Relation {
    Relation::infer(
        pairs
            .iter()
            .map(|(name, salary)| tuple(&[("name", s(name)), ("salary", int(*salary))])),
    )
    .unwrap()
}

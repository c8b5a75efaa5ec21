//! Workspace persistence: a versioned JSON document holding every binding.
//!
//! Values carry a per-attribute type tag so that integers, decimals, and
//! booleans survive a round trip; nested relations serialize recursively.

use crate::error::{Error, Result};
use crate::execution::Environment;
use crate::types::{Relation, Tuple, Value};
use rust_decimal::Decimal;
use serde_json::{json, Map, Value as Json};
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

const WORKSPACE_VERSION: u64 = 1;

const TAG_INT: &str = "int";
const TAG_DECIMAL: &str = "Decimal";
const TAG_BOOL: &str = "bool";
const TAG_STR: &str = "str";
const TAG_RELATION: &str = "Relation";

/// Serialize every binding in the environment to a workspace file.
pub fn save(env: &Environment, path: &Path) -> Result<()> {
    let mut relations = Map::new();
    for (name, rel) in env.iter() {
        relations.insert(name.to_owned(), serialize_relation(rel));
    }
    let doc = json!({ "version": WORKSPACE_VERSION, "relations": relations });
    let text = serde_json::to_string_pretty(&doc).map_err(|e| Error::Io(e.to_string()))?;
    std::fs::write(path, text + "\n")?;
    debug!(path = %path.display(), "saved workspace");
    Ok(())
}

/// Deserialize a workspace file into named relations.
pub fn load(path: &Path) -> Result<BTreeMap<String, Relation>> {
    let text = std::fs::read_to_string(path)?;
    let doc: Json = serde_json::from_str(&text)
        .map_err(|e| Error::Load(format!("invalid workspace file: {}", e)))?;
    let version = doc.get("version").and_then(Json::as_u64);
    if version != Some(WORKSPACE_VERSION) {
        return Err(Error::Load(format!(
            "unsupported workspace version {:?} in {}",
            version,
            path.display()
        )));
    }
    let relations = doc
        .get("relations")
        .and_then(Json::as_object)
        .ok_or_else(|| {
            Error::Load(format!(
                "invalid workspace file (missing relations): {}",
                path.display()
            ))
        })?;

    let mut result = BTreeMap::new();
    for (name, rel_doc) in relations {
        result.insert(name.clone(), deserialize_relation(rel_doc)?);
    }
    debug!(path = %path.display(), relations = result.len(), "loaded workspace");
    Ok(result)
}

/// Does the file look like a workspace (JSON with version and relations)?
pub fn sniff(path: &Path) -> bool {
    let Ok(text) = std::fs::read_to_string(path) else {
        return false;
    };
    match serde_json::from_str::<Json>(&text) {
        Ok(Json::Object(doc)) => doc.contains_key("version") && doc.contains_key("relations"),
        _ => false,
    }
}

fn value_tag(value: &Value) -> &'static str {
    match value {
        Value::Integer(_) => TAG_INT,
        Value::Decimal(_) => TAG_DECIMAL,
        Value::Boolean(_) => TAG_BOOL,
        Value::Str(_) => TAG_STR,
        Value::Relation(_) => TAG_RELATION,
    }
}

fn serialize_relation(rel: &Relation) -> Json {
    let mut attributes = Map::new();
    for attr in rel.schema() {
        // Types are uniform within a relation, so one sample suffices.
        // An empty relation defaults its attributes to strings.
        let tag = rel
            .iter()
            .next()
            .and_then(|t| t.get(attr))
            .map(value_tag)
            .unwrap_or(TAG_STR);
        attributes.insert(attr.clone(), Json::String(tag.to_owned()));
    }
    let tuples: Vec<Json> = rel.iter().map(serialize_tuple).collect();
    json!({ "attributes": attributes, "tuples": tuples })
}

fn serialize_tuple(tuple: &Tuple) -> Json {
    let mut object = Map::new();
    for (attr, value) in tuple.iter() {
        object.insert(attr.clone(), serialize_value(value));
    }
    Json::Object(object)
}

fn serialize_value(value: &Value) -> Json {
    match value {
        Value::Integer(i) => json!(i),
        // Decimals travel as strings to keep their precision exact.
        Value::Decimal(d) => Json::String(d.to_string()),
        Value::Boolean(b) => json!(b),
        Value::Str(s) => Json::String(s.clone()),
        Value::Relation(r) => serialize_relation(r),
    }
}

fn deserialize_relation(doc: &Json) -> Result<Relation> {
    let attributes = doc
        .get("attributes")
        .and_then(Json::as_object)
        .ok_or_else(|| Error::Load("relation is missing its attributes".into()))?;
    let tuples = doc
        .get("tuples")
        .and_then(Json::as_array)
        .ok_or_else(|| Error::Load("relation is missing its tuples".into()))?;

    let mut tags = BTreeMap::new();
    for (attr, tag) in attributes {
        let tag = tag
            .as_str()
            .ok_or_else(|| Error::Load(format!("attribute {:?} has a non-string type", attr)))?;
        tags.insert(attr.clone(), tag.to_owned());
    }

    let schema = tags.keys().cloned().collect();
    let mut decoded = Vec::with_capacity(tuples.len());
    for tuple_doc in tuples {
        let object = tuple_doc
            .as_object()
            .ok_or_else(|| Error::Load("tuple is not an object".into()))?;
        let mut tuple = Vec::new();
        for (attr, tag) in &tags {
            let value = object
                .get(attr)
                .ok_or_else(|| Error::Load(format!("tuple is missing attribute {:?}", attr)))?;
            tuple.push((attr.clone(), deserialize_value(value, tag)?));
        }
        decoded.push(tuple.into_iter().collect::<Tuple>());
    }
    Relation::from_tuples(schema, decoded)
}

fn deserialize_value(value: &Json, tag: &str) -> Result<Value> {
    match tag {
        TAG_INT => value
            .as_i64()
            .map(Value::Integer)
            .ok_or_else(|| Error::Load(format!("expected an integer, got {}", value))),
        TAG_DECIMAL => value
            .as_str()
            .and_then(|s| Decimal::from_str(s).ok())
            .map(Value::Decimal)
            .ok_or_else(|| Error::Load(format!("expected a decimal string, got {}", value))),
        TAG_BOOL => value
            .as_bool()
            .map(Value::Boolean)
            .ok_or_else(|| Error::Load(format!("expected a boolean, got {}", value))),
        TAG_STR => value
            .as_str()
            .map(|s| Value::Str(s.to_owned()))
            .ok_or_else(|| Error::Load(format!("expected a string, got {}", value))),
        TAG_RELATION => Ok(Value::Relation(deserialize_relation(value)?)),
        other => Err(Error::Load(format!("unknown type tag {:?}", other))),
    }
}

//! CSV/TSV loading with per-column type inference.

use crate::error::{Error, Result};
use crate::types::{Relation, Tuple, Value};
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use std::io::Read;
use std::str::FromStr;
use tracing::debug;

/// How to read delimited data.
pub struct LoadOptions {
    /// Field delimiter; `b'\t'` for TSV.
    pub delimiter: u8,
    /// When set, prepend a synthetic `{name}_id` key column with sequential
    /// integers starting at 1.
    pub genkey: Option<String>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        LoadOptions {
            delimiter: b',',
            genkey: None,
        }
    }
}

/// The type a column is inferred to hold. Priority when scanning:
/// integer, then decimal, then boolean, then string.
#[derive(Clone, Copy, Debug, PartialEq)]
enum ColumnType {
    Integer,
    Decimal,
    Boolean,
    Str,
}

/// Read delimited data into a relation. The first row is the header; rows
/// with the wrong field count are skipped; empty fields stay empty strings.
pub fn load(reader: impl Read, options: &LoadOptions) -> Result<Relation> {
    let mut csv = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = csv
        .headers()
        .map_err(|e| Error::Load(e.to_string()))?
        .iter()
        .map(|h| h.trim().to_owned())
        .collect();
    if headers.is_empty() {
        return Ok(Relation::default());
    }

    let key_column = match &options.genkey {
        Some(name) => {
            let key = format!("{}_id", name);
            if headers.contains(&key) {
                return Err(Error::Load(format!(
                    "cannot generate key column {:?}: it already exists in the data",
                    key
                )));
            }
            Some(key)
        }
        None => None,
    };

    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut skipped = 0usize;
    for record in csv.records() {
        let record = record.map_err(|e| Error::Load(e.to_string()))?;
        if record.len() != headers.len() {
            skipped += 1;
            continue;
        }
        rows.push(record.iter().map(|f| f.to_owned()).collect());
    }
    if skipped > 0 {
        debug!(skipped, "skipped malformed rows");
    }

    let mut schema: BTreeSet<String> = headers.iter().cloned().collect();
    if let Some(key) = &key_column {
        schema.insert(key.clone());
    }
    if rows.is_empty() {
        return Ok(Relation::empty(schema));
    }

    let types: Vec<ColumnType> = (0..headers.len())
        .map(|i| infer_column_type(rows.iter().map(|r| r[i].as_str())))
        .collect();

    let mut tuples = Vec::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        let mut tuple: Tuple = headers
            .iter()
            .zip(row.iter().zip(types.iter()))
            .map(|(h, (field, ty))| (h.clone(), coerce(field, *ty)))
            .collect();
        if let Some(key) = &key_column {
            tuple = tuple.extend([(key.clone(), Value::Integer(i as i64 + 1))]);
        }
        tuples.push(tuple);
    }
    debug!(rows = tuples.len(), columns = headers.len(), "loaded relation");
    Relation::from_tuples(schema, tuples)
}

fn infer_column_type<'a>(values: impl Iterator<Item = &'a str>) -> ColumnType {
    let non_empty: Vec<&str> = values.filter(|v| !v.is_empty()).collect();
    if non_empty.is_empty() {
        return ColumnType::Str;
    }
    if non_empty.iter().all(|v| v.parse::<i64>().is_ok()) {
        return ColumnType::Integer;
    }
    if non_empty.iter().all(|v| Decimal::from_str(v).is_ok()) {
        return ColumnType::Decimal;
    }
    if non_empty
        .iter()
        .all(|v| v.eq_ignore_ascii_case("true") || v.eq_ignore_ascii_case("false"))
    {
        return ColumnType::Boolean;
    }
    ColumnType::Str
}

fn coerce(field: &str, ty: ColumnType) -> Value {
    if field.is_empty() {
        return Value::Str(String::new());
    }
    match ty {
        ColumnType::Integer => Value::Integer(field.parse().expect("inferred integer column")),
        ColumnType::Decimal => {
            Value::Decimal(Decimal::from_str(field).expect("inferred decimal column"))
        }
        ColumnType::Boolean => Value::Boolean(field.eq_ignore_ascii_case("true")),
        ColumnType::Str => Value::Str(field.to_owned()),
    }
}

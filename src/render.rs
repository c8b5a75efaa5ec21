//! ASCII table rendering.
//!
//! Relations have unordered rows and unordered attributes; ordered tuples
//! preserve row order but still have unordered attributes. The renderer
//! picks alphabetical column order; the core never does.

use crate::types::{Output, OrderedTuples, Relation, Tuple, Value};

pub fn format_output(output: &Output) -> String {
    match output {
        Output::Relation(rel) => format_relation(rel),
        Output::Ordered(tuples) => format_ordered(tuples),
    }
}

pub fn format_relation(rel: &Relation) -> String {
    let headers: Vec<&str> = rel.schema().iter().map(String::as_str).collect();
    if rel.is_empty() && headers.is_empty() {
        return "(empty relation)".into();
    }
    let rows = rel
        .iter()
        .map(|t| row_cells(t, &headers))
        .collect::<Vec<_>>();
    build_table(&headers, &rows)
}

pub fn format_ordered(tuples: &OrderedTuples) -> String {
    let Some(first) = tuples.iter().next() else {
        return "(empty array)".into();
    };
    let attrs = first.attributes();
    let headers: Vec<&str> = attrs.iter().map(String::as_str).collect();
    let rows = tuples
        .iter()
        .map(|t| row_cells(t, &headers))
        .collect::<Vec<_>>();
    build_table(&headers, &rows)
}

fn row_cells(tuple: &Tuple, headers: &[&str]) -> Vec<String> {
    headers
        .iter()
        .map(|h| tuple.get(h).map(format_cell).unwrap_or_default())
        .collect()
}

/// Top-level cells show strings bare; nested relations render inline with
/// their strings quoted, so the nesting stays readable.
fn format_cell(value: &Value) -> String {
    match value {
        Value::Str(s) => s.clone(),
        Value::Relation(rel) => format_inline(rel),
        other => other.to_string(),
    }
}

fn format_inline(rel: &Relation) -> String {
    if rel.is_empty() {
        return "{}".into();
    }
    let tuples: Vec<String> = rel.iter().map(|t| t.to_string()).collect();
    format!("{{{}}}", tuples.join(", "))
}

fn build_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.len());
        }
    }

    let separator = {
        let dashes: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        format!("+-{}-+", dashes.join("-+-"))
    };
    let format_row = |cells: &[String]| {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(cell, w)| format!("{:<width$}", cell, width = *w))
            .collect();
        format!("| {} |", padded.join(" | "))
    };

    let header_cells: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
    let mut lines = vec![separator.clone(), format_row(&header_cells), separator.clone()];
    for row in rows {
        lines.push(format_row(row));
    }
    lines.push(separator);
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Tuple;

    #[test]
    fn renders_a_table_with_alphabetical_columns() {
        let rel = Relation::infer([[
            ("name".to_string(), Value::Str("Alice".into())),
            ("salary".to_string(), Value::Integer(80000)),
        ]
        .into_iter()
        .collect::<Tuple>()])
        .unwrap();
        let table = format_relation(&rel);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[1], "| name  | salary |");
        assert_eq!(lines[3], "| Alice | 80000  |");
    }

    #[test]
    fn empty_relation_without_schema() {
        assert_eq!(format_relation(&Relation::default()), "(empty relation)");
    }

    #[test]
    fn empty_relation_with_schema_shows_headers() {
        let rel = Relation::empty(["a".to_string()].into_iter().collect());
        let table = format_relation(&rel);
        assert!(table.contains("| a |"));
    }

    #[test]
    fn empty_ordered_output() {
        assert_eq!(format_ordered(&OrderedTuples::default()), "(empty array)");
    }

    #[test]
    fn nested_relations_render_inline() {
        let inner = Relation::infer([[("phone".to_string(), Value::Str("555-1234".into()))]
            .into_iter()
            .collect::<Tuple>()])
        .unwrap();
        let rel = Relation::infer([[
            ("name".to_string(), Value::Str("Alice".into())),
            ("phones".to_string(), Value::Relation(inner)),
        ]
        .into_iter()
        .collect::<Tuple>()])
        .unwrap();
        let table = format_relation(&rel);
        assert!(table.contains(r#"{(phone: "555-1234")}"#));
    }
}

use anyhow::{Context, Result};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::Value as JsonValue;

use super::model::{Column, Table, Value};

// ---------------------------------------------------------------------------
// JSON records → Table
// ---------------------------------------------------------------------------

/// Build a table from records-oriented JSON (the shape of
/// `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "group": "A", "x": 1.5, "y": 2 },
///   { "group": "B", "x": 2.0, "y": null }
/// ]
/// ```
///
/// Column order follows first appearance of each key across records (keys
/// within one object come in the JSON map's iteration order); a record without a
/// key contributes a null to that column.
pub fn table_from_records(root: &JsonValue) -> Result<Table> {
    let records = root.as_array().context("Expected top-level JSON array")?;

    let mut names: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        for key in obj.keys() {
            if !names.contains(key) {
                names.push(key.clone());
            }
        }
    }

    let columns = names
        .iter()
        .map(|name| {
            let values = records
                .iter()
                .map(|rec| rec.get(name).map_or(Value::Null, json_to_value));
            Column::new(name.clone(), values)
        })
        .collect();

    Table::new(columns).context("building table from records")
}

fn json_to_value(val: &JsonValue) -> Value {
    match val {
        JsonValue::String(s) => Value::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Integer(i)
            } else if let Some(f) = n.as_f64() {
                Value::Float(f)
            } else {
                Value::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => Value::Bool(*b),
        JsonValue::Null => Value::Null,
        other => Value::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Table → JSON records
// ---------------------------------------------------------------------------

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::String(s) | Value::Date(s) => serializer.serialize_str(s),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Float(f) if f.is_finite() => serializer.serialize_f64(*f),
            Value::Float(_) | Value::Null => serializer.serialize_none(),
            Value::Bool(b) => serializer.serialize_bool(*b),
        }
    }
}

/// Serializes as an array of row objects. Row labels are not included;
/// use [`Table::index_to_column`] first to keep them.
impl Serialize for Table {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.height()))?;
        for row in 0..self.height() {
            seq.serialize_element(&Row { table: self, row })?;
        }
        seq.end()
    }
}

struct Row<'a> {
    table: &'a Table,
    row: usize,
}

impl Serialize for Row<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.table.width()))?;
        for col in self.table.columns() {
            map.serialize_entry(&col.name, &col.values[self.row])?;
        }
        map.end()
    }
}

impl Table {
    /// Parse records-oriented JSON into a table. See [`table_from_records`].
    pub fn from_json_records(root: &JsonValue) -> Result<Table> {
        table_from_records(root)
    }

    /// Render the table as records-oriented JSON.
    pub fn to_json_records(&self) -> JsonValue {
        serde_json::to_value(self).unwrap_or(JsonValue::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn records_keep_first_seen_key_order() {
        let t = Table::from_json_records(&json!([
            { "b": 1 },
            { "a": "y", "c": 2.5 }
        ]))
        .unwrap();

        assert_eq!(t.column_names(), vec!["b", "a", "c"]);
        assert_eq!(t.column("b").unwrap().values[1], Value::Null);
        assert_eq!(t.column("a").unwrap().values[0], Value::Null);
        assert_eq!(t.column("c").unwrap().values[1], Value::Float(2.5));
    }

    #[test]
    fn rejects_non_array_and_non_object_rows() {
        assert!(Table::from_json_records(&json!({ "a": 1 })).is_err());
        let err = Table::from_json_records(&json!([{ "a": 1 }, 3])).unwrap_err();
        assert!(err.to_string().contains("Row 1"));
    }

    #[test]
    fn serializes_nan_as_null() {
        let t = Table::new(vec![
            Column::new("a", [1.0, f64::NAN]),
            Column::new("b", ["p", "q"]),
        ])
        .unwrap();

        assert_eq!(
            t.to_json_records(),
            json!([{ "a": 1.0, "b": "p" }, { "a": null, "b": "q" }])
        );
    }
}

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value as JsonValue;

use crate::data::model::Table;
use crate::diagnostics::Outcome;
use crate::error::{Result, StatsError};
use crate::stats::polyfit::{polyfit, Polynomial};
use crate::stats::summary::summary;

// ---------------------------------------------------------------------------
// Selection – one column name or an ordered list of them
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Single(String),
    Multiple(Vec<String>),
}

impl Selection {
    /// Normalise to an ordered list of names.
    pub fn names(&self) -> Vec<String> {
        match self {
            Selection::Single(name) => vec![name.clone()],
            Selection::Multiple(names) => names.clone(),
        }
    }

    /// Interpret a JSON value as a selection. Anything other than a string
    /// or an array of strings is a type error against `field`.
    pub fn from_json(field: &'static str, value: &JsonValue) -> Result<Selection> {
        let invalid = || StatsError::InvalidSelection {
            field,
            found: json_kind(value).to_string(),
        };
        match value {
            JsonValue::String(name) => Ok(Selection::Single(name.clone())),
            JsonValue::Array(items) => items
                .iter()
                .map(|item| item.as_str().map(String::from).ok_or_else(invalid))
                .collect::<Result<Vec<_>>>()
                .map(Selection::Multiple),
            _ => Err(invalid()),
        }
    }
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(items) if items.iter().all(JsonValue::is_string) => "a list of strings",
        JsonValue::Array(_) => "a list containing non-strings",
        JsonValue::Object(_) => "an object",
    }
}

impl From<&str> for Selection {
    fn from(name: &str) -> Self {
        Selection::Single(name.to_string())
    }
}

impl From<String> for Selection {
    fn from(name: String) -> Self {
        Selection::Single(name)
    }
}

impl From<Vec<String>> for Selection {
    fn from(names: Vec<String>) -> Self {
        Selection::Multiple(names)
    }
}

impl From<Vec<&str>> for Selection {
    fn from(names: Vec<&str>) -> Self {
        Selection::Multiple(names.into_iter().map(String::from).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Selection {
    fn from(names: [&str; N]) -> Self {
        Selection::Multiple(names.into_iter().map(String::from).collect())
    }
}

impl Serialize for Selection {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Selection::Single(name) => serializer.serialize_str(name),
            Selection::Multiple(names) => names.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Selection {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = JsonValue::deserialize(deserializer)?;
        Selection::from_json("selection", &raw).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// SummaryOptions
// ---------------------------------------------------------------------------

/// Parameters of a [`summary`] call.
///
/// ```json
/// { "columns": ["price", "qty"], "groups": "region",
///   "filter": "qty > 0", "confidence": "95%" }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SummaryOptions {
    /// Columns to describe; `None` describes every column and ignores `groups`.
    pub columns: Option<Selection>,
    pub filter: Option<String>,
    pub groups: Option<Selection>,
    /// Confidence label such as `"95%"`. Unsupported labels only warn.
    pub confidence: Option<String>,
}

impl SummaryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn columns(mut self, columns: impl Into<Selection>) -> Self {
        self.columns = Some(columns.into());
        self
    }

    pub fn filter(mut self, expression: impl Into<String>) -> Self {
        self.filter = Some(expression.into());
        self
    }

    pub fn groups(mut self, groups: impl Into<Selection>) -> Self {
        self.groups = Some(groups.into());
        self
    }

    pub fn confidence(mut self, label: impl Into<String>) -> Self {
        self.confidence = Some(label.into());
        self
    }

    /// Read options from JSON. A `columns`/`groups` entry that is neither a
    /// string nor a list of strings is reported as
    /// [`StatsError::InvalidSelection`].
    pub fn from_json(value: &JsonValue) -> Result<Self> {
        for field in ["columns", "groups"] {
            match value.get(field) {
                None | Some(JsonValue::Null) => {}
                Some(raw) => {
                    Selection::from_json(field, raw)?;
                }
            }
        }
        serde_json::from_value(value.clone()).map_err(|e| StatsError::Config(e.to_string()))
    }

    /// Run [`summary`] with these options.
    pub fn run(&self, table: &Table) -> Result<Outcome<Table>> {
        summary(table, self)
    }
}

// ---------------------------------------------------------------------------
// PolyfitOptions
// ---------------------------------------------------------------------------

fn default_degree() -> usize {
    1
}

/// Parameters of a [`polyfit`] call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolyfitOptions {
    pub x: String,
    pub y: String,
    #[serde(default)]
    pub filter: Option<String>,
    #[serde(default = "default_degree")]
    pub degree: usize,
}

impl PolyfitOptions {
    pub fn new(x: impl Into<String>, y: impl Into<String>) -> Self {
        Self {
            x: x.into(),
            y: y.into(),
            filter: None,
            degree: default_degree(),
        }
    }

    pub fn filter(mut self, expression: impl Into<String>) -> Self {
        self.filter = Some(expression.into());
        self
    }

    pub fn degree(mut self, degree: usize) -> Self {
        self.degree = degree;
        self
    }

    pub fn from_json(value: &JsonValue) -> Result<Self> {
        serde_json::from_value(value.clone()).map_err(|e| StatsError::Config(e.to_string()))
    }

    /// Run [`polyfit`] with these options.
    pub fn run(&self, table: &Table) -> Result<Outcome<Polynomial>> {
        polyfit(table, &self.x, &self.y, self.filter.as_deref(), self.degree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn selection_from_string_or_list() {
        assert_eq!(
            Selection::from_json("columns", &json!("a")).unwrap(),
            Selection::Single("a".into())
        );
        assert_eq!(
            Selection::from_json("columns", &json!(["a", "b"])).unwrap().names(),
            vec!["a", "b"]
        );
        assert_eq!(Selection::from("a").names(), Selection::from(["a"]).names());
    }

    #[test]
    fn selection_rejects_other_json_types() {
        for bad in [json!(3), json!({ "a": 1 }), json!(["a", 2]), json!(true)] {
            let err = Selection::from_json("groups", &bad).unwrap_err();
            assert!(err.is_type_error(), "{bad}");
        }
    }

    #[test]
    fn summary_options_from_json() {
        let opts = SummaryOptions::from_json(&json!({
            "columns": ["x", "y"],
            "groups": "g",
            "confidence": "95%"
        }))
        .unwrap();

        assert_eq!(
            opts,
            SummaryOptions::new()
                .columns(["x", "y"])
                .groups("g")
                .confidence("95%")
        );
    }

    #[test]
    fn summary_options_type_error_names_field() {
        let err = SummaryOptions::from_json(&json!({ "columns": 12 })).unwrap_err();
        assert_eq!(
            err,
            StatsError::InvalidSelection {
                field: "columns",
                found: "a number".into()
            }
        );

        let err = SummaryOptions::from_json(&json!({ "colums": "x" })).unwrap_err();
        assert!(matches!(err, StatsError::Config(_)));
    }

    #[test]
    fn polyfit_options_default_degree() {
        let opts = PolyfitOptions::from_json(&json!({ "x": "a", "y": "b" })).unwrap();
        assert_eq!(opts, PolyfitOptions::new("a", "b"));
        assert_eq!(opts.degree, 1);
    }

    #[test]
    fn options_round_trip_through_json() {
        let opts = SummaryOptions::new().columns("x").filter("x > 0");
        let text = serde_json::to_value(&opts).unwrap();
        assert_eq!(text["columns"], json!("x"));
        assert_eq!(SummaryOptions::from_json(&text).unwrap(), opts);
    }
}

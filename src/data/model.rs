use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;

use crate::error::{Result, StatsError};

// ---------------------------------------------------------------------------
// Value – a single cell
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring common dataframe dtypes.
/// Values are totally ordered so they can key `BTreeMap` group partitions.
#[derive(Debug, Clone)]
pub enum Value {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    /// ISO-8601 date string kept as text; text order is date order.
    Date(String),
    Null,
}

// -- Manual Eq/Ord/Hash: integers and floats share one numeric order --

fn rank(v: &Value) -> u8 {
    match v {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Integer(_) | Value::Float(_) => 2,
        Value::String(_) => 3,
        Value::Date(_) => 4,
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        use Value::*;
        let (ra, rb) = (rank(self), rank(other));
        if ra != rb {
            return ra.cmp(&rb);
        }
        match (self, other) {
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(_), Float(_)) | (Integer(_), Float(_)) | (Float(_), Integer(_)) => {
                numeric_key(self).total_cmp(&numeric_key(other))
            }
            (String(a), String(b)) | (Date(a), Date(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

/// `1` and `1.0` are the same group key. `-0.0` folds onto `0.0` so that
/// equal magnitudes also hash alike.
fn numeric_key(v: &Value) -> f64 {
    match v {
        Value::Integer(i) => *i as f64,
        Value::Float(f) if *f == 0.0 => 0.0,
        Value::Float(f) => *f,
        _ => f64::NAN,
    }
}

impl std::hash::Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        rank(self).hash(state);
        match self {
            Value::String(s) | Value::Date(s) => s.hash(state),
            Value::Integer(_) | Value::Float(_) => numeric_key(self).to_bits().hash(state),
            Value::Bool(b) => b.hash(state),
            Value::Null => {}
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{s}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(v) if v.is_nan() => write!(f, "NaN"),
            Value::Float(v) => write!(f, "{v:.4}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Date(d) => write!(f, "{d}"),
            Value::Null => write!(f, "<null>"),
        }
    }
}

impl Value {
    /// Interpret the value as an `f64` if it is numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) | Value::Date(s) => Some(s),
            _ => None,
        }
    }

    /// Null and NaN are both treated as missing data.
    pub fn is_missing(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Float(v) => v.is_nan(),
            _ => false,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Integer(_) | Value::Float(_))
    }

    /// Short name of the value's kind, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::String(_) => "string",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::Bool(_) => "bool",
            Value::Date(_) => "date",
            Value::Null => "null",
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

// ---------------------------------------------------------------------------
// Column – a named vector of cells
// ---------------------------------------------------------------------------

/// Semantic type of a column, inferred from its non-missing values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Numeric,
    Boolean,
    Text,
    Temporal,
    Mixed,
    /// No non-missing values.
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<Value>,
}

impl Column {
    pub fn new<V: Into<Value>>(
        name: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Self {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over the non-missing values.
    pub fn present(&self) -> impl Iterator<Item = &Value> {
        self.values.iter().filter(|v| !v.is_missing())
    }

    /// Kind of the non-missing values; `Mixed` when they disagree.
    pub fn kind(&self) -> ColumnKind {
        let mut kind = ColumnKind::Empty;
        for v in self.present() {
            let k = match v {
                Value::Integer(_) | Value::Float(_) => ColumnKind::Numeric,
                Value::Bool(_) => ColumnKind::Boolean,
                Value::String(_) => ColumnKind::Text,
                Value::Date(_) => ColumnKind::Temporal,
                Value::Null => continue,
            };
            if kind == ColumnKind::Empty {
                kind = k;
            } else if kind != k {
                return ColumnKind::Mixed;
            }
        }
        kind
    }
}

// ---------------------------------------------------------------------------
// Table – ordered named columns of equal length
// ---------------------------------------------------------------------------

/// An ordered collection of equal-length columns.
///
/// `index` holds optional row labels; `None` means the dense range `0..height`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<Column>,
    index: Option<Vec<String>>,
}

impl Table {
    /// Build a table, checking that names are unique and lengths agree.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let mut seen = HashSet::new();
        for col in &columns {
            if !seen.insert(col.name.as_str()) {
                return Err(StatsError::DuplicateColumn(col.name.clone()));
            }
        }
        if let Some(first) = columns.first() {
            let expected = first.len();
            if let Some(bad) = columns.iter().find(|c| c.len() != expected) {
                return Err(StatsError::ColumnLength {
                    name: bad.name.clone(),
                    len: bad.len(),
                    expected,
                });
            }
        }
        Ok(Self {
            columns,
            index: None,
        })
    }

    /// Attach row labels.
    pub fn with_index(mut self, labels: Vec<String>) -> Result<Self> {
        if labels.len() != self.height() {
            return Err(StatsError::ColumnLength {
                name: "<index>".to_string(),
                len: labels.len(),
                expected: self.height(),
            });
        }
        self.index = Some(labels);
        Ok(self)
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.index
            .as_ref()
            .map(Vec::len)
            .or_else(|| self.columns.first().map(Column::len))
            .unwrap_or(0)
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// True when the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.height() == 0
    }

    /// All columns, in table order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Column names, in table order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Zero-based position of the column called `name`.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Whether a column called `name` exists.
    pub fn has_column(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Row labels, if the table carries any.
    pub fn index(&self) -> Option<&[String]> {
        self.index.as_deref()
    }

    /// Label of row `row`: the explicit label or its position.
    pub fn row_label(&self, row: usize) -> String {
        match &self.index {
            Some(labels) => labels[row].clone(),
            None => row.to_string(),
        }
    }

    /// Cell at (`row`, `column`), both positional.
    ///
    /// # Panics
    ///
    /// If either position is out of bounds.
    pub fn value(&self, row: usize, column: usize) -> &Value {
        &self.columns[column].values[row]
    }

    /// Fail with the missing names, if any of `names` is not a column.
    pub fn require(&self, field: &'static str, names: &[String]) -> Result<()> {
        let missing: Vec<String> = names
            .iter()
            .filter(|n| !self.has_column(n))
            .cloned()
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(StatsError::MissingColumns { field, missing })
        }
    }

    /// Project onto `names`, in that order.
    pub fn select(&self, names: &[String]) -> Result<Table> {
        self.require("columns", names)?;
        let columns = names
            .iter()
            .filter_map(|n| self.column(n).cloned())
            .collect();
        let mut table = Table::new(columns)?;
        table.index = self.index.clone();
        Ok(table)
    }

    /// Keep the rows at `rows`, in that order. Labels follow their rows.
    pub fn take(&self, rows: &[usize]) -> Table {
        let columns = self
            .columns
            .iter()
            .map(|c| Column {
                name: c.name.clone(),
                values: rows.iter().map(|&r| c.values[r].clone()).collect(),
            })
            .collect();
        let index = self
            .index
            .as_ref()
            .map(|labels| rows.iter().map(|&r| labels[r].clone()).collect());
        Table { columns, index }
    }

    /// Stable sort by the given columns, ascending, in priority order.
    pub fn sort_by(&self, keys: &[String]) -> Result<Table> {
        self.require("sort keys", keys)?;
        let key_cols: Vec<&Column> = keys.iter().filter_map(|k| self.column(k)).collect();
        let mut order: Vec<usize> = (0..self.height()).collect();
        order.sort_by(|&a, &b| {
            key_cols
                .iter()
                .map(|c| c.values[a].cmp(&c.values[b]))
                .find(|o| o.is_ne())
                .unwrap_or(Ordering::Equal)
        });
        Ok(self.take(&order))
    }

    /// Stack tables vertically. All tables must share column names and order.
    pub fn concat(tables: Vec<Table>) -> Result<Table> {
        let mut iter = tables.into_iter();
        let Some(mut out) = iter.next() else {
            return Ok(Table::default());
        };
        for next in iter {
            let (left, right) = (out.column_names(), next.column_names());
            if left != right {
                return Err(StatsError::SchemaMismatch {
                    left: left.iter().map(|s| s.to_string()).collect(),
                    right: right.iter().map(|s| s.to_string()).collect(),
                });
            }
            out.index = match (out.index.take(), next.index) {
                (Some(mut a), Some(b)) => {
                    a.extend(b);
                    Some(a)
                }
                _ => None,
            };
            for (dst, src) in out.columns.iter_mut().zip(next.columns) {
                dst.values.extend(src.values);
            }
        }
        Ok(out)
    }

    /// Drop the row labels in favour of the dense range.
    pub fn reset_index(mut self) -> Table {
        self.index = None;
        self
    }

    /// Move the row labels into a new leading column named `name`.
    pub fn index_to_column(mut self, name: &str) -> Result<Table> {
        let labels = match self.index.take() {
            Some(labels) => labels,
            None => (0..self.height()).map(|i| i.to_string()).collect(),
        };
        self.insert_column(0, Column::new(name, labels))?;
        Ok(self)
    }

    /// Insert `column` before position `at` (clamped to the end). The name
    /// must be new and the length must match the table height.
    pub fn insert_column(&mut self, at: usize, column: Column) -> Result<()> {
        if self.has_column(&column.name) {
            return Err(StatsError::DuplicateColumn(column.name));
        }
        let sized = !self.columns.is_empty() || self.index.is_some();
        if sized && column.len() != self.height() {
            let len = column.len();
            return Err(StatsError::ColumnLength {
                name: column.name,
                len,
                expected: self.height(),
            });
        }
        self.columns.insert(at.min(self.columns.len()), column);
        Ok(())
    }

    /// Remove and return the column called `name`.
    pub fn drop_column(&mut self, name: &str) -> Option<Column> {
        let pos = self.position(name)?;
        Some(self.columns.remove(pos))
    }
}

// -- Plain-text grid rendering --

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels: Vec<String> = (0..self.height()).map(|r| self.row_label(r)).collect();
        let cells: Vec<Vec<String>> = self
            .columns
            .iter()
            .map(|c| c.values.iter().map(ToString::to_string).collect())
            .collect();

        let label_width = labels.iter().map(String::len).max().unwrap_or(0);
        let widths: Vec<usize> = self
            .columns
            .iter()
            .zip(&cells)
            .map(|(c, vals)| vals.iter().map(String::len).chain([c.name.len()]).max().unwrap_or(0))
            .collect();

        write!(f, "{:label_width$}", "")?;
        for (c, &w) in self.columns.iter().zip(&widths) {
            write!(f, "  {:>w$}", c.name)?;
        }
        writeln!(f)?;
        for (r, label) in labels.iter().enumerate() {
            write!(f, "{label:<label_width$}")?;
            for (vals, &w) in cells.iter().zip(&widths) {
                write!(f, "  {:>w$}", vals[r])?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::new(vec![
            Column::new("k", ["b", "a", "b", "a"]),
            Column::new("v", [1, 2, 3, 4]),
        ])
        .unwrap()
    }

    #[test]
    fn numeric_order_spans_integers_and_floats() {
        assert!(Value::Integer(1) < Value::Float(1.5));
        assert!(Value::Float(0.5) < Value::Integer(1));
        assert!(Value::Null < Value::Bool(false));
        assert!(Value::Integer(100) < Value::String("a".into()));
    }

    #[test]
    fn equal_magnitudes_are_one_key() {
        use std::collections::HashSet;

        assert_eq!(Value::Integer(1), Value::Float(1.0));
        assert_eq!(Value::Float(-0.0), Value::Integer(0));
        let keys: HashSet<Value> = [Value::Integer(1), Value::Float(1.0), Value::Float(2.0)]
            .into_iter()
            .collect();
        assert_eq!(keys.len(), 2);
    }

    #[test]
    fn nan_is_missing_and_self_equal() {
        let nan = Value::Float(f64::NAN);
        assert!(nan.is_missing());
        assert_eq!(nan, nan.clone());
        assert!(Value::Null.is_missing());
        assert!(!Value::Float(0.0).is_missing());
    }

    #[test]
    fn kind_inference() {
        assert_eq!(Column::new("a", [1.0, 2.0]).kind(), ColumnKind::Numeric);
        assert_eq!(
            Column::new("a", [Some(1), None]).kind(),
            ColumnKind::Numeric
        );
        assert_eq!(Column::new("a", ["x", "y"]).kind(), ColumnKind::Text);
        assert_eq!(
            Column::new("a", vec![Value::from(1), Value::from("x")]).kind(),
            ColumnKind::Mixed
        );
        assert_eq!(Column::new("a", [Value::Null]).kind(), ColumnKind::Empty);
    }

    #[test]
    fn insert_column_checks_name_and_length() {
        let mut t = sample();
        assert_eq!(
            t.insert_column(0, Column::new("w", [1, 2])),
            Err(StatsError::ColumnLength {
                name: "w".into(),
                len: 2,
                expected: 4,
            })
        );
        assert_eq!(
            t.insert_column(0, Column::new("k", [0; 4])),
            Err(StatsError::DuplicateColumn("k".into()))
        );

        t.insert_column(1, Column::new("w", [0; 4])).unwrap();
        assert_eq!(t.column_names(), vec!["k", "w", "v"]);
        assert_eq!(t.drop_column("w").map(|c| c.len()), Some(4));
        assert_eq!(t.width(), 2);
    }

    #[test]
    fn new_rejects_ragged_and_duplicate_columns() {
        let ragged = Table::new(vec![Column::new("a", [1, 2]), Column::new("b", [1])]);
        assert!(matches!(ragged, Err(StatsError::ColumnLength { .. })));

        let dup = Table::new(vec![Column::new("a", [1]), Column::new("a", [2])]);
        assert_eq!(dup, Err(StatsError::DuplicateColumn("a".into())));
    }

    #[test]
    fn select_reorders_and_reports_missing() {
        let t = sample();
        let s = t.select(&["v".into(), "k".into()]).unwrap();
        assert_eq!(s.column_names(), vec!["v", "k"]);

        let err = t.select(&["v".into(), "nope".into()]).unwrap_err();
        assert!(err.is_value_error());
    }

    #[test]
    fn sort_is_stable() {
        let t = sample().with_index(vec!["r0".into(), "r1".into(), "r2".into(), "r3".into()]).unwrap();
        let sorted = t.sort_by(&["k".into()]).unwrap();
        assert_eq!(sorted.index().unwrap(), ["r1", "r3", "r0", "r2"]);
        assert_eq!(sorted.column("v").unwrap().values, vec![Value::from(2), 4.into(), 1.into(), 3.into()]);
    }

    #[test]
    fn concat_checks_schema() {
        let t = sample();
        let both = Table::concat(vec![t.clone(), t.clone()]).unwrap();
        assert_eq!(both.height(), 8);

        let other = t.select(&["v".into()]).unwrap();
        assert!(matches!(
            Table::concat(vec![t, other]),
            Err(StatsError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn index_moves_into_leading_column() {
        let t = sample().with_index(vec!["a".into(), "b".into(), "c".into(), "d".into()]).unwrap();
        let moved = t.index_to_column("Property").unwrap();
        assert_eq!(moved.column_names(), vec!["Property", "k", "v"]);
        assert!(moved.index().is_none());
        assert_eq!(moved.value(2, 0), &Value::from("c"));
    }

    #[test]
    fn display_renders_header_and_rows() {
        let text = sample().to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[0].contains('k') && lines[0].contains('v'));
        assert!(lines[1].starts_with('0'));
    }
}

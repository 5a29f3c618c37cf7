use std::collections::HashSet;

use crate::data::model::{Column, ColumnKind, Table, Value};
use crate::diagnostics::{Outcome, Warning};
use crate::error::Result;

use super::confidence::ConfidenceLevel;

pub const COUNT: &str = "count";
pub const UNIQUE: &str = "unique";
pub const MIN: &str = "min";
pub const MAX: &str = "max";
pub const MEAN: &str = "mean";
pub const STD: &str = "std";
pub const MEDIAN: &str = "median";

/// Statistic columns in output order, without interval bounds.
pub const STAT_COLUMNS: [&str; 7] = [COUNT, UNIQUE, MIN, MAX, MEAN, STD, MEDIAN];

// ---------------------------------------------------------------------------
// ColumnStats – descriptive statistics of one column
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnStats {
    /// Non-missing values.
    pub count: usize,
    /// Distinct non-missing values.
    pub unique: usize,
    pub min: Value,
    pub max: Value,
    /// `NaN` unless the column is numeric.
    pub mean: f64,
    /// Sample standard deviation (n - 1 denominator).
    pub std: f64,
    pub median: f64,
}

impl ColumnStats {
    pub fn of(column: &Column) -> Self {
        let kind = column.kind();
        if kind == ColumnKind::Numeric {
            let values: Vec<f64> = column.present().filter_map(Value::as_f64).collect();
            return Self::numeric(&values);
        }

        let present: Vec<&Value> = column.present().collect();
        let unique = present.iter().copied().collect::<HashSet<_>>().len();
        Self {
            count: present.len(),
            unique,
            min: present.iter().min().map_or(Value::Null, |v| (*v).clone()),
            max: present.iter().max().map_or(Value::Null, |v| (*v).clone()),
            mean: f64::NAN,
            std: f64::NAN,
            median: f64::NAN,
        }
    }

    /// Statistics of finite-or-infinite, non-NaN samples.
    pub fn numeric(values: &[f64]) -> Self {
        let count = values.len();
        // -0.0 and 0.0 are one value
        let unique = values
            .iter()
            .map(|v| (v + 0.0).to_bits())
            .collect::<HashSet<_>>()
            .len();

        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        let (min, max) = match (sorted.first(), sorted.last()) {
            (Some(lo), Some(hi)) => (Value::Float(*lo), Value::Float(*hi)),
            _ => (Value::Null, Value::Null),
        };

        Self {
            count,
            unique,
            min,
            max,
            mean: mean(values),
            std: sample_std(values),
            median: median_sorted(&sorted),
        }
    }

    pub fn interval(&self, level: ConfidenceLevel) -> (f64, f64) {
        level.interval(self.mean, self.std, self.count)
    }
}

/// Arithmetic mean with one refinement pass; `NaN` for no samples.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let n = values.len() as f64;
    let rough = values.iter().sum::<f64>() / n;
    rough + values.iter().map(|v| v - rough).sum::<f64>() / n
}

/// Sample standard deviation; `NaN` below two samples.
pub fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    (ss / (values.len() - 1) as f64).sqrt()
}

fn median_sorted(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    match n {
        0 => f64::NAN,
        _ if n % 2 == 1 => sorted[n / 2],
        _ => (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0,
    }
}

// ---------------------------------------------------------------------------
// describe – one summary row per column
// ---------------------------------------------------------------------------

/// Parse an optional confidence label. A missing or unrecognised label
/// yields `None` and a [`Warning::UnsupportedConfidence`].
pub fn resolve_confidence(confidence: Option<&str>) -> Outcome<Option<ConfidenceLevel>> {
    let mut outcome = Outcome::new(None);
    match confidence.map(|label| (label, label.parse::<ConfidenceLevel>())) {
        Some((_, Ok(level))) => outcome.value = Some(level),
        Some((label, Err(_))) => outcome.warn(Warning::UnsupportedConfidence {
            requested: Some(label.to_string()),
            supported: ConfidenceLevel::labels(),
        }),
        None => outcome.warn(Warning::UnsupportedConfidence {
            requested: None,
            supported: ConfidenceLevel::labels(),
        }),
    }
    outcome
}

/// Describe every column of `table`.
///
/// The result has one row per input column, labelled with the column name,
/// and the columns `count, unique, min, max, mean, std, median` followed by
/// the two interval bounds when `confidence` names a supported level.
pub fn describe(table: &Table, confidence: Option<&str>) -> Result<Outcome<Table>> {
    let mut outcome = Outcome::new(Table::default());
    let level = outcome.absorb(resolve_confidence(confidence));
    outcome.value = describe_with(table, level)?;
    Ok(outcome)
}

/// [`describe`] with an already-resolved level.
pub fn describe_with(table: &Table, level: Option<ConfidenceLevel>) -> Result<Table> {
    let stats: Vec<ColumnStats> = table.columns().iter().map(ColumnStats::of).collect();

    let mut columns = vec![
        Column::new(COUNT, stats.iter().map(|s| s.count as i64)),
        Column::new(UNIQUE, stats.iter().map(|s| s.unique as i64)),
        Column::new(MIN, stats.iter().map(|s| s.min.clone())),
        Column::new(MAX, stats.iter().map(|s| s.max.clone())),
        Column::new(MEAN, stats.iter().map(|s| s.mean)),
        Column::new(STD, stats.iter().map(|s| s.std)),
        Column::new(MEDIAN, stats.iter().map(|s| s.median)),
    ];
    if let Some(level) = level {
        let bounds: Vec<(f64, f64)> = stats.iter().map(|s| s.interval(level)).collect();
        columns.push(Column::new(level.low_column(), bounds.iter().map(|b| b.0)));
        columns.push(Column::new(level.high_column(), bounds.iter().map(|b| b.1)));
    }

    let labels = table.column_names().into_iter().map(String::from).collect();
    Table::new(columns)?.with_index(labels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn f(t: &Table, row: usize, col: &str) -> f64 {
        t.column(col).unwrap().values[row].as_f64().unwrap()
    }

    #[test]
    fn numeric_column_statistics() {
        let t = Table::new(vec![Column::new("x", [4.0, 1.0, 3.0, 2.0, 2.0])]).unwrap();
        let d = describe(&t, None).unwrap().value;

        assert_eq!(d.index().unwrap(), ["x"]);
        assert_eq!(d.column_names(), STAT_COLUMNS.to_vec());
        assert_eq!(d.value(0, 0), &Value::Integer(5));
        assert_eq!(d.value(0, 1), &Value::Integer(4));
        assert_relative_eq!(f(&d, 0, MIN), 1.0);
        assert_relative_eq!(f(&d, 0, MAX), 4.0);
        assert_relative_eq!(f(&d, 0, MEAN), 2.4, epsilon = 1e-12);
        assert_relative_eq!(f(&d, 0, STD), 1.140175425099138, epsilon = 1e-12);
        assert_relative_eq!(f(&d, 0, MEDIAN), 2.0);
    }

    #[test]
    fn missing_values_are_skipped() {
        let col = Column::new("x", [Some(1.0), None, Some(3.0), Some(f64::NAN)]);
        let s = ColumnStats::of(&col);
        assert_eq!(s.count, 2);
        assert_relative_eq!(s.mean, 2.0);
        assert_relative_eq!(s.median, 2.0);
    }

    #[test]
    fn text_column_has_order_statistics_only() {
        let s = ColumnStats::of(&Column::new("s", ["pear", "apple", "pear"]));
        assert_eq!(s.count, 3);
        assert_eq!(s.unique, 2);
        assert_eq!(s.min, Value::from("apple"));
        assert_eq!(s.max, Value::from("pear"));
        assert!(s.mean.is_nan() && s.std.is_nan() && s.median.is_nan());
    }

    #[test]
    fn constant_column_has_zero_width_interval() {
        let t = Table::new(vec![Column::new("c", [0.1, 0.1, 0.1, 0.1])]).unwrap();
        let d = describe(&t, Some("99%")).unwrap().value;

        assert_eq!(d.width(), 9);
        assert_eq!(f(&d, 0, STD), 0.0);
        let mean = f(&d, 0, MEAN);
        assert_eq!(f(&d, 0, "99% Confidence Interval Low"), mean);
        assert_eq!(f(&d, 0, "99% Confidence Interval High"), mean);
    }

    #[test]
    fn unsupported_level_warns_and_skips_interval() {
        let t = Table::new(vec![Column::new("x", [1, 2])]).unwrap();
        let out = describe(&t, Some("97%")).unwrap();

        assert_eq!(out.value.width(), STAT_COLUMNS.len());
        assert_eq!(out.warnings.len(), 1);
        match &out.warnings[0] {
            Warning::UnsupportedConfidence { requested, supported } => {
                assert_eq!(requested.as_deref(), Some("97%"));
                assert_eq!(supported.len(), 7);
            }
            other => panic!("unexpected warning {other:?}"),
        }
    }

    #[test]
    fn absent_level_warns_and_skips_interval() {
        let t = Table::new(vec![Column::new("x", [1, 2])]).unwrap();
        let out = describe(&t, None).unwrap();

        assert_eq!(out.value.width(), STAT_COLUMNS.len());
        assert_eq!(
            out.warnings,
            vec![Warning::UnsupportedConfidence {
                requested: None,
                supported: ConfidenceLevel::labels(),
            }]
        );
        assert!(out.warnings[0].to_string().starts_with("no confidence level given"));
    }

    #[test]
    fn single_value_has_undefined_spread() {
        let s = ColumnStats::numeric(&[7.0]);
        assert!(s.std.is_nan());
        let (low, high) = s.interval(ConfidenceLevel::P90);
        assert!(low.is_nan() && high.is_nan());
    }

    #[test]
    fn rows_follow_input_column_order() {
        let t = Table::new(vec![
            Column::new("b", [1, 2]),
            Column::new("a", ["x", "y"]),
        ])
        .unwrap();
        let d = describe(&t, None).unwrap().value;
        assert_eq!(d.index().unwrap(), ["b", "a"]);
        assert_eq!(d.value(1, 2), &Value::from("x"));
    }
}

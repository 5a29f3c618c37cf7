use crate::diagnostics::{Outcome, Warning};

use super::expr::Predicate;
use super::model::Table;

// ---------------------------------------------------------------------------
// Row filtering
// ---------------------------------------------------------------------------

/// Return a copy of `table` holding only the rows where `expression` is true.
///
/// * `None` or a blank expression → an unmodified copy.
/// * An expression that fails to parse or evaluate (unknown column, type
///   error, non-boolean result) → an unmodified copy plus one
///   [`Warning::FilterFailed`].
///
/// Row labels of the retained rows are kept.
pub fn filter(table: &Table, expression: Option<&str>) -> Outcome<Table> {
    let expression = match expression {
        Some(expr) if !expr.trim().is_empty() => expr,
        _ => return Outcome::new(table.clone()),
    };

    let mut outcome = Outcome::new(table.clone());
    let applied = Predicate::parse(expression)
        .and_then(|pred| pred.matches(table).map(|rows| (pred, rows)));
    match applied {
        Ok((pred, rows)) => {
            log::debug!(
                "filter '{}' on {:?} kept {} of {} rows",
                pred.source(),
                pred.columns(),
                rows.len(),
                table.height()
            );
            outcome.value = table.take(&rows);
        }
        Err(err) => outcome.warn(Warning::FilterFailed {
            expression: expression.to_string(),
            reason: err.to_string(),
        }),
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{Column, Value};

    fn table() -> Table {
        Table::new(vec![
            Column::new("id", [1, 2, 3]),
            Column::new("tag", ["a", "b", "a"]),
        ])
        .unwrap()
        .with_index(vec!["r1".into(), "r2".into(), "r3".into()])
        .unwrap()
    }

    #[test]
    fn absent_or_blank_expression_is_identity() {
        let t = table();
        for expr in [None, Some(""), Some("   ")] {
            let out = filter(&t, expr);
            assert_eq!(out.value, t);
            assert!(out.warnings.is_empty());
        }
    }

    #[test]
    fn keeps_matching_rows_and_their_labels() {
        let out = filter(&table(), Some("tag == 'a'"));
        assert!(out.warnings.is_empty());
        assert_eq!(out.value.height(), 2);
        assert_eq!(out.value.index().unwrap(), ["r1", "r3"]);
        assert_eq!(out.value.column("id").unwrap().values, vec![Value::from(1), 3.into()]);
    }

    #[test]
    fn failures_fall_back_with_one_warning() {
        let t = table();
        for expr in ["id >", "nope == 1", "tag > 3", "id + 1"] {
            let out = filter(&t, Some(expr));
            assert_eq!(out.value, t, "{expr}");
            assert_eq!(out.warnings.len(), 1, "{expr}");
            assert!(matches!(out.warnings[0], Warning::FilterFailed { .. }));
        }
    }

    #[test]
    fn pathological_nesting_falls_back_with_one_warning() {
        let t = table();
        let expr = "~".repeat(200_000) + "id > 1";
        let out = filter(&t, Some(&expr));
        assert_eq!(out.value, t);
        assert_eq!(out.warnings.len(), 1);
    }
}

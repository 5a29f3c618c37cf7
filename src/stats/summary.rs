use std::collections::BTreeMap;

use crate::data::filter::filter;
use crate::data::model::{Column, Table, Value};
use crate::diagnostics::Outcome;
use crate::error::Result;
use crate::options::{Selection, SummaryOptions};

use super::confidence::ConfidenceLevel;
use super::describe::{describe_with, resolve_confidence, STAT_COLUMNS, UNIQUE};

/// Leading column of grouped summaries: the name of the summarised column.
pub const PROPERTY: &str = "Property";

// ---------------------------------------------------------------------------
// summary – filter, select, optionally group, describe
// ---------------------------------------------------------------------------

/// Summarise `table` according to `options`.
///
/// Without groups the result is [`describe`](super::describe::describe) of
/// the selected columns: one row per column, labelled by column name.
///
/// With groups the rows are partitioned by the distinct combinations of the
/// group columns (in ascending key order; rows with a missing key are left
/// out) and each partition is described separately. The result has columns
/// `Property, <groups...>, count, min, max, mean, std, median[, intervals]`,
/// is sorted by `Property` and then by each group column, and carries a
/// dense 0-based index. Grouped summaries have no `unique` column.
///
/// Errors when a selection names a column the filtered table lacks, or when
/// the same name is selected twice.
pub fn summary(table: &Table, options: &SummaryOptions) -> Result<Outcome<Table>> {
    let mut outcome = Outcome::new(Table::default());
    let filtered = outcome.absorb(filter(table, options.filter.as_deref()));

    let Some(selection) = &options.columns else {
        let level = outcome.absorb(resolve_confidence(options.confidence.as_deref()));
        outcome.value = describe_with(&filtered, level)?;
        return Ok(outcome);
    };

    let columns = selection.names();
    filtered.require("columns", &columns)?;
    let groups = options
        .groups
        .as_ref()
        .map(Selection::names)
        .unwrap_or_default();
    filtered.require("groups", &groups)?;

    let projected = filtered.select(&[columns.as_slice(), groups.as_slice()].concat())?;
    let level = outcome.absorb(resolve_confidence(options.confidence.as_deref()));

    outcome.value = if groups.is_empty() {
        describe_with(&projected, level)?
    } else {
        grouped(&projected, &columns, &groups, level)?
    };
    Ok(outcome)
}

/// Row indices of each distinct group key, in ascending key order.
pub fn partition(table: &Table, groups: &[String]) -> Result<BTreeMap<Vec<Value>, Vec<usize>>> {
    table.require("groups", groups)?;
    let keys: Vec<&Column> = groups.iter().filter_map(|g| table.column(g)).collect();

    let mut partitions: BTreeMap<Vec<Value>, Vec<usize>> = BTreeMap::new();
    for row in 0..table.height() {
        let key: Vec<Value> = keys.iter().map(|c| c.values[row].clone()).collect();
        if key.iter().any(Value::is_missing) {
            continue;
        }
        partitions.entry(key).or_default().push(row);
    }
    Ok(partitions)
}

fn grouped(
    projected: &Table,
    columns: &[String],
    groups: &[String],
    level: Option<ConfidenceLevel>,
) -> Result<Table> {
    let partitions = partition(projected, groups)?;
    log::debug!(
        "summarising {} column(s) over {} group(s)",
        columns.len(),
        partitions.len()
    );

    let values = projected.select(columns)?;
    let mut parts = Vec::with_capacity(partitions.len());
    for (key, rows) in &partitions {
        let mut part = describe_with(&values.take(rows), level)?;
        part.drop_column(UNIQUE);
        let height = part.height();
        for (name, value) in groups.iter().zip(key).rev() {
            part.insert_column(0, Column::new(name.clone(), vec![value.clone(); height]))?;
        }
        parts.push(part.index_to_column(PROPERTY)?);
    }

    if parts.is_empty() {
        return empty_grouped(groups, level);
    }

    let sort_keys: Vec<String> = std::iter::once(PROPERTY.to_string())
        .chain(groups.iter().cloned())
        .collect();
    Ok(Table::concat(parts)?.sort_by(&sort_keys)?.reset_index())
}

/// The grouped layout with no rows, for inputs with no complete group key.
fn empty_grouped(groups: &[String], level: Option<ConfidenceLevel>) -> Result<Table> {
    let mut names = vec![PROPERTY.to_string()];
    names.extend(groups.iter().cloned());
    names.extend(
        STAT_COLUMNS
            .iter()
            .filter(|c| **c != UNIQUE)
            .map(|c| c.to_string()),
    );
    if let Some(level) = level {
        names.push(level.low_column());
        names.push(level.high_column());
    }
    Table::new(
        names
            .into_iter()
            .map(|n| Column::new(n, Vec::<Value>::new()))
            .collect(),
    )
}

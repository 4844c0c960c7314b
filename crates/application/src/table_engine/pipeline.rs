use std::collections::BTreeMap;

use januscope_domain::{ColumnDefinition, ColumnFilter, FilterOperator, SortDirection, TableSchema};
use serde_json::Value;

use crate::value_text::{compare_values, display_text, strict_equals, to_number};

/// Interactive state the row pipeline depends on.
#[derive(Debug, Clone, Copy)]
pub struct TableQuery<'a> {
    /// Free-text search.
    pub search: &'a str,
    /// Active filters keyed by column id.
    pub filters: &'a BTreeMap<String, ColumnFilter>,
    /// Sorted column and direction.
    pub sort: Option<(&'a str, SortDirection)>,
}

/// Runs search, then filters, then sort, and returns indices into `rows`.
///
/// Only visible columns take part. Pagination is applied by the caller.
#[must_use]
pub fn process_rows(schema: &TableSchema, rows: &[Value], query: &TableQuery<'_>) -> Vec<usize> {
    let columns: Vec<&ColumnDefinition> = schema.visible_columns().collect();
    let mut indices: Vec<usize> = (0..rows.len()).collect();

    if schema.is_searchable() && !query.search.trim().is_empty() {
        let needle = query.search.to_lowercase();
        indices.retain(|&index| matches_search(&columns, &rows[index], &needle));
    }

    if !query.filters.is_empty() {
        indices.retain(|&index| {
            query
                .filters
                .iter()
                .all(|(column_id, filter)| passes_filter(&columns, column_id, filter, &rows[index]))
        });
    }

    if let Some((column_id, direction)) = query.sort
        && let Some(column) = find_column(&columns, column_id)
    {
        indices.sort_by(|&left, &right| {
            let left = column.value_of(&rows[left]);
            let right = column.value_of(&rows[right]);
            let ordering = compare_values(left.as_deref(), right.as_deref());
            match direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });
    }

    indices
}

fn find_column<'a>(
    columns: &[&'a ColumnDefinition],
    column_id: &str,
) -> Option<&'a ColumnDefinition> {
    columns
        .iter()
        .copied()
        .find(|column| column.id().as_str() == column_id)
}

fn matches_search(columns: &[&ColumnDefinition], row: &Value, needle: &str) -> bool {
    columns
        .iter()
        .filter(|column| !column.is_actions())
        .any(|column| {
            display_text(column.value_of(row).as_deref())
                .to_lowercase()
                .contains(needle)
        })
}

/// Unknown columns and unsupported operators let every row through.
fn passes_filter(
    columns: &[&ColumnDefinition],
    column_id: &str,
    filter: &ColumnFilter,
    row: &Value,
) -> bool {
    let Some(column) = find_column(columns, column_id) else {
        return true;
    };
    let value = column.value_of(row);
    let value = value.as_deref();

    let text = || display_text(value).to_lowercase();
    let operand = || display_text(Some(&filter.value)).to_lowercase();

    match &filter.operator {
        FilterOperator::Equals => strict_equals(value, &filter.value),
        FilterOperator::Contains => text().contains(&operand()),
        FilterOperator::StartsWith => text().starts_with(&operand()),
        FilterOperator::EndsWith => text().ends_with(&operand()),
        FilterOperator::Gt => to_number(value) > to_number(Some(&filter.value)),
        FilterOperator::Lt => to_number(value) < to_number(Some(&filter.value)),
        FilterOperator::Between | FilterOperator::Unsupported(_) => true,
    }
}

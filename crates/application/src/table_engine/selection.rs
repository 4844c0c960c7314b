use std::fmt::{Display, Formatter};

use januscope_domain::TableSchema;
use serde_json::Value;

use crate::value_text::display_text;

/// Stable identity of a row across data refreshes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowKey(String);

impl RowKey {
    /// Wraps an already computed key.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Derives the key of a row.
    ///
    /// Uses the schema's row key accessor when it yields a non-empty value,
    /// otherwise the row's canonical JSON text.
    #[must_use]
    pub fn of(schema: &TableSchema, row: &Value) -> Self {
        let declared = schema
            .row_key()
            .and_then(|accessor| accessor.resolve(row))
            .map(|value| display_text(Some(&*value)))
            .filter(|text| !text.is_empty());

        match declared {
            Some(text) => Self(text),
            None => Self(serde_json::to_string(row).unwrap_or_default()),
        }
    }

    /// Returns the key text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for RowKey {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

/// Selected rows in selection order, with a snapshot of each row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    entries: Vec<(RowKey, Value)>,
}

impl Selection {
    /// Returns whether nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the number of selected rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether a row is selected.
    #[must_use]
    pub fn contains(&self, key: &RowKey) -> bool {
        self.entries.iter().any(|(selected, _)| selected == key)
    }

    /// Returns selected keys in selection order.
    pub fn keys(&self) -> impl Iterator<Item = &RowKey> {
        self.entries.iter().map(|(key, _)| key)
    }

    /// Returns copies of the selected rows in selection order.
    #[must_use]
    pub fn rows(&self) -> Vec<Value> {
        self.entries.iter().map(|(_, row)| row.clone()).collect()
    }

    /// Single mode: selects only this row, or clears when it was already selected.
    pub fn toggle_single(&mut self, key: RowKey, row: Value) {
        if self.contains(&key) {
            self.entries.clear();
        } else {
            self.entries = vec![(key, row)];
        }
    }

    /// Multiple mode: adds or removes this row.
    pub fn toggle_multiple(&mut self, key: RowKey, row: Value) {
        match self.entries.iter().position(|(selected, _)| *selected == key) {
            Some(position) => {
                self.entries.remove(position);
            }
            None => self.entries.push((key, row)),
        }
    }

    /// Returns whether every row of a non-empty page is selected.
    #[must_use]
    pub fn covers(&self, page_keys: &[RowKey]) -> bool {
        !page_keys.is_empty() && page_keys.iter().all(|key| self.contains(key))
    }

    /// Clears the selection when the page is fully selected, otherwise selects exactly the page.
    ///
    /// Rows sharing a key are selected once.
    pub fn toggle_page(&mut self, page: Vec<(RowKey, Value)>) {
        let page_keys: Vec<RowKey> = page.iter().map(|(key, _)| key.clone()).collect();
        if self.covers(&page_keys) {
            self.entries.clear();
            return;
        }

        self.entries.clear();
        for (key, row) in page {
            if !self.contains(&key) {
                self.entries.push((key, row));
            }
        }
    }

    /// Drops selected rows that are gone and refreshes snapshots of the rest.
    ///
    /// Returns whether any row was dropped.
    pub fn retain_present<'a>(
        &mut self,
        rows: impl IntoIterator<Item = (RowKey, &'a Value)>,
    ) -> bool {
        let current: Vec<(RowKey, &Value)> = rows.into_iter().collect();
        let before = self.entries.len();

        self.entries.retain_mut(|(key, snapshot)| {
            match current.iter().find(|(candidate, _)| candidate == key) {
                Some((_, row)) => {
                    *snapshot = (*row).clone();
                    true
                }
                None => false,
            }
        });

        self.entries.len() != before
    }

    /// Deselects everything.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use januscope_domain::{ColumnDefinition, TableMeta, TableSchema};

    use super::{RowKey, Selection};

    fn keyed_schema() -> TableSchema {
        let columns =
            vec![ColumnDefinition::new("name", "Name", "name").unwrap_or_else(|_| unreachable!())];
        TableSchema::new("people", TableMeta::default(), columns)
            .unwrap_or_else(|_| unreachable!())
            .with_row_key("id")
    }

    #[test]
    fn declared_keys_ignore_other_fields() {
        let schema = keyed_schema();

        assert_eq!(
            RowKey::of(&schema, &json!({"id": 7, "name": "A"})),
            RowKey::of(&schema, &json!({"id": 7, "name": "B"}))
        );
        assert_eq!(RowKey::of(&schema, &json!({"id": 7})).as_str(), "7");
    }

    #[test]
    fn missing_keys_fall_back_to_row_content() {
        let schema = keyed_schema();

        assert_eq!(
            RowKey::of(&schema, &json!({"name": "A"})).as_str(),
            r#"{"name":"A"}"#
        );
    }

    #[test]
    fn single_mode_replaces_or_clears() {
        let mut selection = Selection::default();

        selection.toggle_single(RowKey::new("1"), json!({"id": 1}));
        selection.toggle_single(RowKey::new("2"), json!({"id": 2}));
        assert_eq!(selection.rows(), vec![json!({"id": 2})]);

        selection.toggle_single(RowKey::new("2"), json!({"id": 2}));
        assert!(selection.is_empty());
    }

    #[test]
    fn page_toggle_keeps_one_entry_per_key() {
        let mut selection = Selection::default();
        let page = vec![
            (RowKey::new("a"), json!({"name": "A"})),
            (RowKey::new("a"), json!({"name": "A"})),
        ];

        selection.toggle_page(page.clone());
        assert_eq!(selection.rows().len(), 1);

        selection.toggle_page(page);
        assert!(selection.is_empty());
    }

    #[test]
    fn refreshed_rows_update_snapshots() {
        let mut selection = Selection::default();
        selection.toggle_multiple(RowKey::new("1"), json!({"id": 1, "v": "old"}));
        selection.toggle_multiple(RowKey::new("2"), json!({"id": 2}));

        let fresh = json!({"id": 1, "v": "new"});
        let dropped = selection.retain_present([(RowKey::new("1"), &fresh)]);

        assert!(dropped);
        assert_eq!(selection.rows(), vec![fresh]);
    }
}

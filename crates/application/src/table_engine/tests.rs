use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use proptest::prelude::*;
use serde_json::{Value, json};

use januscope_core::{AppError, AppResult};
use januscope_domain::{
    ActionButton, ColumnDefinition, ColumnFilter, ColumnType, ExportFormat, FilterOperator,
    PaginationConfig, SelectionConfig, SelectionMode, SortDirection, TableMeta, TableSchema,
    TableTheme, ThemeColors,
};

use crate::table_ports::SpreadsheetExportGateway;

use super::{CellContent, ExportOutcome, RowKey, TableOptions, TableSession, TableStatus};

fn column(id: &str, header: &str) -> ColumnDefinition {
    ColumnDefinition::new(id, header, id).unwrap_or_else(|_| unreachable!())
}

fn base_schema() -> TableSchema {
    let columns = vec![
        column("name", "Name").sortable(),
        column("active", "Active").with_type(ColumnType::Boolean),
        column("uptime", "Uptime").with_type(ColumnType::Number).sortable(),
        column("actions", "Actions")
            .with_type(ColumnType::Actions)
            .with_actions(vec![ActionButton::new("Edit", |_row| {})]),
    ];
    TableSchema::new("services", TableMeta::default(), columns)
        .unwrap_or_else(|_| unreachable!())
        .with_row_key("id")
        .searchable()
        .exportable()
}

fn service_rows() -> Vec<Value> {
    vec![
        json!({"id": 1, "name": "Gateway", "active": true, "uptime": 99.9}),
        json!({"id": 2, "name": "Billing", "active": false, "uptime": 97.1}),
        json!({"id": 3, "name": "Auth", "active": true, "uptime": 99.1}),
        json!({"id": 4, "name": "Search", "active": true, "uptime": 95.0}),
    ]
}

fn session(schema: TableSchema) -> TableSession {
    TableSession::new(Arc::new(schema), service_rows(), TableOptions::default())
}

fn names(rows: &[&Value]) -> Vec<String> {
    rows.iter()
        .map(|row| row["name"].as_str().unwrap_or_default().to_owned())
        .collect()
}

struct FailingGateway;

#[async_trait]
impl SpreadsheetExportGateway for FailingGateway {
    async fn fetch_spreadsheet(&self, _table_id: &str) -> AppResult<Vec<u8>> {
        Err(AppError::Export("export endpoint returned 503".to_owned()))
    }
}

struct StaticGateway {
    calls: AtomicUsize,
}

#[async_trait]
impl SpreadsheetExportGateway for StaticGateway {
    async fn fetch_spreadsheet(&self, table_id: &str) -> AppResult<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("xlsx:{table_id}").into_bytes())
    }
}

#[test]
fn three_header_clicks_restore_the_original_order() {
    let mut table = session(base_schema());
    let original = names(&table.processed_rows());

    assert_eq!(table.toggle_sort("name").ok(), Some(Some(SortDirection::Asc)));
    assert_eq!(
        names(&table.processed_rows()),
        vec!["Auth", "Billing", "Gateway", "Search"]
    );
    assert_eq!(table.toggle_sort("name").ok(), Some(Some(SortDirection::Desc)));
    assert_eq!(table.toggle_sort("name").ok(), Some(None));

    assert_eq!(names(&table.processed_rows()), original);
}

#[test]
fn switching_sort_column_starts_ascending() {
    let mut table = session(base_schema());

    table.toggle_sort("name").unwrap_or_else(|_| unreachable!());
    table.toggle_sort("name").unwrap_or_else(|_| unreachable!());
    let direction = table.toggle_sort("uptime").unwrap_or_else(|_| unreachable!());

    assert_eq!(direction, Some(SortDirection::Asc));
    assert_eq!(table.sort(), Some(("uptime", SortDirection::Asc)));
}

#[test]
fn sorting_rejects_unknown_and_unsortable_columns() {
    let mut table = session(base_schema());

    assert!(matches!(table.toggle_sort("region"), Err(AppError::NotFound(_))));
    assert!(matches!(table.toggle_sort("active"), Err(AppError::Validation(_))));
}

#[test]
fn search_and_filters_reset_to_the_first_page() {
    let schema = base_schema().with_pagination(
        PaginationConfig::new(2).unwrap_or_else(|_| unreachable!()),
    );
    let mut table = session(schema);
    table.set_page(2);

    table.set_search("gate");
    assert_eq!(table.page(), 1);
    assert_eq!(table.processed_len(), 1);

    table.set_search("");
    table.set_page(2);
    table.set_filter("uptime", ColumnFilter::new(FilterOperator::Gt, json!(98)));
    assert_eq!(table.page(), 1);
    assert_eq!(names(&table.processed_rows()), vec!["Gateway", "Auth"]);

    table.clear_filters();
    assert_eq!(table.processed_len(), 4);
}

#[test]
fn pages_past_the_end_are_empty() {
    let schema = base_schema().with_pagination(
        PaginationConfig::new(3)
            .unwrap_or_else(|_| unreachable!())
            .with_total(),
    );
    let mut table = session(schema);

    assert_eq!(table.page_window().total_pages(), 2);
    table.set_page(2);
    assert_eq!(names(&table.page_rows()), vec!["Search"]);

    table.set_page(7);
    assert!(table.page_rows().is_empty());
    let view = table.view();
    assert_eq!(view.status, TableStatus::Empty("No data available"));
}

#[test]
fn page_size_changes_validate_and_reset_the_page() {
    let schema = base_schema().with_pagination(
        PaginationConfig::new(2).unwrap_or_else(|_| unreachable!()),
    );
    let mut table = session(schema);
    table.set_page(2);

    assert!(matches!(table.set_page_size(0), Err(AppError::Validation(_))));
    table.set_page_size(3).unwrap_or_else(|_| unreachable!());

    assert_eq!(table.page(), 1);
    assert_eq!(table.page_rows().len(), 3);
}

#[test]
fn single_selection_replaces_or_clears() {
    let schema = base_schema().with_selection(SelectionConfig::new(SelectionMode::Single));
    let mut table = session(schema);
    let first = RowKey::new("1");
    let second = RowKey::new("2");

    table.toggle_row(&first).unwrap_or_else(|_| unreachable!());
    table.toggle_row(&first).unwrap_or_else(|_| unreachable!());
    assert!(table.selected_rows().is_empty());

    table.toggle_row(&first).unwrap_or_else(|_| unreachable!());
    table.toggle_row(&second).unwrap_or_else(|_| unreachable!());
    assert_eq!(table.selected_rows(), vec![service_rows()[1].clone()]);
    assert!(matches!(table.toggle_select_all(), Err(AppError::Validation(_))));
}

#[test]
fn select_all_covers_only_the_current_page() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorder = Arc::clone(&seen);
    let schema = base_schema()
        .with_pagination(PaginationConfig::new(2).unwrap_or_else(|_| unreachable!()))
        .with_selection(
            SelectionConfig::new(SelectionMode::Multiple).on_change(move |rows| {
                if let Ok(mut seen) = recorder.lock() {
                    seen.push(rows.len());
                }
            }),
        );
    let mut table = session(schema);

    table.toggle_select_all().unwrap_or_else(|_| unreachable!());
    assert_eq!(table.selected_rows().len(), 2);
    assert!(table.view().all_selected);

    table.toggle_select_all().unwrap_or_else(|_| unreachable!());
    assert!(table.selected_rows().is_empty());

    table.toggle_row_at(1).unwrap_or_else(|_| unreachable!());
    table.clear_selection();

    let seen = seen.lock().unwrap_or_else(|_| unreachable!());
    assert_eq!(seen.as_slice(), &[2, 0, 1, 0]);
}

#[test]
fn selection_survives_a_data_refresh_by_key() {
    let schema = base_schema().with_selection(SelectionConfig::new(SelectionMode::Multiple));
    let mut table = session(schema);
    table.toggle_row(&RowKey::new("1")).unwrap_or_else(|_| unreachable!());
    table.toggle_row(&RowKey::new("2")).unwrap_or_else(|_| unreachable!());

    let refreshed = json!({"id": 1, "name": "Gateway v2", "active": true, "uptime": 99.0});
    table.set_rows(vec![refreshed.clone()]);

    assert_eq!(table.selected_rows(), vec![refreshed]);
    assert!(table.is_selected(&RowKey::new("1")));
}

#[test]
fn selection_requires_an_enabled_config() {
    let mut table = session(base_schema());

    assert!(matches!(
        table.toggle_row(&RowKey::new("1")),
        Err(AppError::Validation(_))
    ));
}

#[test]
fn identical_unkeyed_rows_select_together() {
    let schema = TableSchema::new("notes", TableMeta::default(), vec![column("name", "Name")])
        .unwrap_or_else(|_| unreachable!())
        .with_selection(SelectionConfig::new(SelectionMode::Multiple));
    let rows = vec![json!({"name": "A"}), json!({"name": "A"})];
    let mut table = TableSession::new(Arc::new(schema), rows, TableOptions::default());

    table.toggle_select_all().unwrap_or_else(|_| unreachable!());
    assert_eq!(table.selected_rows().len(), 1);
    assert!(table.all_selected());

    table.toggle_row_at(0).unwrap_or_else(|_| unreachable!());
    let view = table.view();
    assert!(table.selected_rows().is_empty());
    assert!(view.rows.iter().all(|row| !row.selected));
    assert!(!view.all_selected);
}

#[test]
fn null_cells_do_not_match_a_null_search() {
    let schema = TableSchema::new("notes", TableMeta::default(), vec![column("note", "Note")])
        .unwrap_or_else(|_| unreachable!())
        .searchable();
    let rows = vec![json!({"note": null}), json!({"note": "nullable flag"})];
    let mut table = TableSession::new(Arc::new(schema), rows, TableOptions::default());

    table.set_search("null");

    assert_eq!(table.processed_rows(), vec![&json!({"note": "nullable flag"})]);
}

#[tokio::test]
async fn csv_export_quotes_commas_and_renders_booleans() {
    let columns = vec![
        column("name", "name"),
        column("active", "active").with_type(ColumnType::Boolean),
    ];
    let schema = TableSchema::new("quoting", TableMeta::default(), columns)
        .unwrap_or_else(|_| unreachable!());
    let mut table = TableSession::new(
        Arc::new(schema),
        vec![json!({"name": "A,B", "active": true})],
        TableOptions::default(),
    );

    let outcome = table
        .export(ExportFormat::Csv, None)
        .await
        .unwrap_or_else(|_| unreachable!());

    let ExportOutcome::Ready(file) = outcome else {
        unreachable!()
    };
    assert_eq!(file.mime_type, "text/csv;charset=utf-8");
    assert!(file.file_name.starts_with("quoting-export-"));
    assert_eq!(
        String::from_utf8(file.bytes).unwrap_or_else(|_| unreachable!()),
        "name,active\n\"A,B\",Yes"
    );
}

#[tokio::test]
async fn json_export_ignores_pagination_and_skips_filtered_rows() {
    let schema = base_schema().with_pagination(
        PaginationConfig::new(1).unwrap_or_else(|_| unreachable!()),
    );
    let mut table = session(schema);
    table.set_filter("active", ColumnFilter::new(FilterOperator::Equals, json!(true)));

    let outcome = table
        .export(ExportFormat::Json, None)
        .await
        .unwrap_or_else(|_| unreachable!());

    let Some(file) = outcome.file() else {
        unreachable!()
    };
    let exported: Vec<Value> =
        serde_json::from_slice(&file.bytes).unwrap_or_else(|_| unreachable!());
    assert_eq!(exported.len(), 3);
    assert!(file.file_name.ends_with(".json"));
}

#[tokio::test]
async fn failed_spreadsheet_export_falls_back_to_csv() {
    let mut table = session(base_schema());

    let outcome = table
        .export(ExportFormat::Excel, Some(&FailingGateway))
        .await
        .unwrap_or_else(|_| unreachable!());

    let ExportOutcome::FellBack { file, reason } = outcome else {
        unreachable!()
    };
    assert!(reason.contains("503"));
    assert!(file.file_name.ends_with(".csv"));
    assert!(
        String::from_utf8(file.bytes)
            .unwrap_or_default()
            .starts_with("Name,Active,Uptime\n")
    );
    assert!(table.export_notice().is_some());
    assert_eq!(table.view().export_notice.as_deref(), table.export_notice());
}

#[tokio::test]
async fn missing_gateway_also_falls_back() {
    let mut table = session(base_schema());

    let outcome = table
        .export(ExportFormat::Excel, None)
        .await
        .unwrap_or_else(|_| unreachable!());

    assert!(matches!(outcome, ExportOutcome::FellBack { .. }));
}

#[tokio::test]
async fn spreadsheet_success_clears_the_notice() {
    let gateway = StaticGateway {
        calls: AtomicUsize::new(0),
    };
    let mut table = session(base_schema());
    let _ = table.export(ExportFormat::Excel, Some(&FailingGateway)).await;

    let outcome = table
        .export(ExportFormat::Excel, Some(&gateway))
        .await
        .unwrap_or_else(|_| unreachable!());

    let ExportOutcome::Ready(file) = outcome else {
        unreachable!()
    };
    assert_eq!(file.bytes, b"xlsx:services".to_vec());
    assert!(file.file_name.ends_with(".xlsx"));
    assert_eq!(gateway.calls.load(Ordering::SeqCst), 1);
    assert!(table.export_notice().is_none());
}

#[tokio::test]
async fn export_hook_takes_over_every_format() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let recorder = Arc::clone(&calls);
    let gateway = StaticGateway {
        calls: AtomicUsize::new(0),
    };
    let schema = base_schema().on_export(move |format, rows| {
        if let Ok(mut calls) = recorder.lock() {
            calls.push((format, rows.len()));
        }
    });
    let mut table = session(schema);
    table.set_search("gate");

    for format in [ExportFormat::Csv, ExportFormat::Json, ExportFormat::Excel] {
        let outcome = table
            .export(format, Some(&gateway))
            .await
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(outcome, ExportOutcome::Delegated);
    }

    assert_eq!(gateway.calls.load(Ordering::SeqCst), 0);
    let calls = calls.lock().unwrap_or_else(|_| unreachable!());
    assert_eq!(
        calls.as_slice(),
        &[
            (ExportFormat::Csv, 1),
            (ExportFormat::Json, 1),
            (ExportFormat::Excel, 1)
        ]
    );
}

#[test]
fn actions_respect_row_predicates() {
    let clicks = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&clicks);
    let columns = vec![
        column("name", "Name"),
        column("actions", "Actions")
            .with_type(ColumnType::Actions)
            .with_actions(vec![
                ActionButton::new("Restart", move |_row| {
                    counter.fetch_add(1, Ordering::SeqCst);
                })
                .disabled_when(|row| row["active"] == json!(false)),
            ]),
    ];
    let schema = TableSchema::new("services", TableMeta::default(), columns)
        .unwrap_or_else(|_| unreachable!())
        .with_row_key("id");
    let table = TableSession::new(Arc::new(schema), service_rows(), TableOptions::default());

    table
        .trigger_action(&RowKey::new("1"), "actions", 0)
        .unwrap_or_else(|_| unreachable!());
    assert!(matches!(
        table.trigger_action(&RowKey::new("2"), "actions", 0),
        Err(AppError::Validation(_))
    ));
    assert!(matches!(
        table.trigger_action(&RowKey::new("9"), "actions", 0),
        Err(AppError::NotFound(_))
    ));
    assert_eq!(clicks.load(Ordering::SeqCst), 1);
}

#[test]
fn refresh_runs_the_schema_hook() {
    let refreshes = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&refreshes);
    let table = session(base_schema().refreshable().on_refresh(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    }));

    assert!(table.refresh());
    assert!(!session(base_schema()).refresh());
    assert_eq!(refreshes.load(Ordering::SeqCst), 1);
}

#[test]
fn view_describes_header_rows_and_pagination() {
    let meta = TableMeta {
        title: Some("Services".to_owned()),
        theme: TableTheme {
            colors: ThemeColors::new(Some("#ff6b35".to_owned()), None),
            striped_rows: true,
            ..TableTheme::default()
        },
        ..TableMeta::default()
    };
    let columns = vec![
        column("name", "Name").sortable(),
        column("active", "Active").with_type(ColumnType::Boolean),
    ];
    let schema = TableSchema::new("services", meta, columns)
        .unwrap_or_else(|_| unreachable!())
        .with_pagination(
            PaginationConfig::new(3)
                .unwrap_or_else(|_| unreachable!())
                .with_total()
                .with_page_size_options(vec![3, 6])
                .unwrap_or_else(|_| unreachable!()),
        );
    let mut table = TableSession::new(Arc::new(schema), service_rows(), TableOptions::default());
    table.toggle_sort("name").unwrap_or_else(|_| unreachable!());

    let view = table.view();

    assert_eq!(view.title.as_deref(), Some("Services"));
    assert!(view.class_names.contains(&"striped"));
    assert!(view.class_names.contains(&"table-themed"));
    assert_eq!(view.columns[0].sort_indicator(), Some("↑"));
    assert_eq!(view.columns[1].sort_indicator(), None);
    assert_eq!(view.status, TableStatus::Ready);
    assert_eq!(view.rows[0].cells[0], CellContent::Text("Auth".to_owned()));
    assert_eq!(view.rows[0].cells[1], CellContent::Text("Yes".to_owned()));

    let pagination = view.pagination.unwrap_or_else(|| unreachable!());
    assert_eq!(pagination.buttons, vec![1, 2]);
    assert_eq!(
        pagination.summary.as_deref(),
        Some("Showing 1 to 3 of 4 entries")
    );
    assert_eq!(pagination.page_size_options, Some(vec![3, 6]));
}

#[test]
fn loading_hides_rows_and_pagination() {
    let schema = base_schema().with_pagination(
        PaginationConfig::new(2).unwrap_or_else(|_| unreachable!()),
    );
    let mut table = session(schema);
    table.set_loading(true);

    let view = table.view();

    assert_eq!(view.status, TableStatus::Loading);
    assert!(view.rows.is_empty());
    assert!(view.pagination.is_none());
}

proptest! {
    #[test]
    fn sort_cycle_is_the_identity(uptimes in proptest::collection::vec(0_u32..1000, 0..20)) {
        let rows: Vec<Value> = uptimes
            .iter()
            .enumerate()
            .map(|(id, uptime)| json!({"id": id, "name": format!("svc-{id}"), "uptime": uptime}))
            .collect();
        let mut table = TableSession::new(Arc::new(base_schema()), rows, TableOptions::default());
        let original = names(&table.processed_rows());

        for _ in 0..3 {
            prop_assert!(table.toggle_sort("uptime").is_ok());
        }

        prop_assert_eq!(names(&table.processed_rows()), original);
    }
}

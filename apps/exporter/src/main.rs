//! Januscope table exporter.
//!
//! Loads a built-in table schema, runs a JSON row file through the table
//! engine and writes the export into the configured directory.

#![forbid(unsafe_code)]

mod config;

use std::env;
use std::sync::Arc;

use januscope_application::{ExportOutcome, SpreadsheetExportGateway, TableOptions, TableSession};
use januscope_core::{AppError, AppResult};
use januscope_domain::{ExportFormat, catalog};
use januscope_infrastructure::{ExportFileWriter, HttpSpreadsheetExportGateway};
use serde_json::Value;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::{ExportRequest, ExporterConfig};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ExporterConfig::load()?;
    let request = ExportRequest::parse(env::args().skip(1))?;
    run(&config, &request).await
}

async fn run(config: &ExporterConfig, request: &ExportRequest) -> AppResult<()> {
    let schema = Arc::new(catalog::table_schema(&request.table)?);
    let rows = load_rows(request).await?;
    let options = TableOptions {
        date_format: config.date_format.clone(),
        ..TableOptions::default()
    };

    let mut session = TableSession::new(schema, rows, options);
    if let Some(search) = &request.search {
        session.set_search(search.as_str());
    }
    info!(
        table = %request.table,
        format = %request.format,
        rows = session.rows().len(),
        matching_rows = session.processed_len(),
        "exporting table"
    );

    let gateway = match request.format {
        ExportFormat::Excel => Some(HttpSpreadsheetExportGateway::with_timeout(
            &config.api_base_url,
            config.access_token.clone(),
            config.export_timeout,
        )?),
        ExportFormat::Csv | ExportFormat::Json => None,
    };
    let gateway = gateway
        .as_ref()
        .map(|gateway| gateway as &dyn SpreadsheetExportGateway);

    let outcome = session.export(request.format, gateway).await?;
    if let Some(notice) = session.export_notice() {
        warn!("{notice}");
    }

    let Some(file) = outcome.file() else {
        info!(table = %request.table, "export handed to the schema export hook");
        return Ok(());
    };
    let path = ExportFileWriter::new(&config.export_dir).write(file).await?;
    if matches!(outcome, ExportOutcome::FellBack { .. }) {
        info!(path = %path.display(), "wrote CSV fallback export");
    }

    Ok(())
}

async fn load_rows(request: &ExportRequest) -> AppResult<Vec<Value>> {
    let contents = tokio::fs::read_to_string(&request.rows_path)
        .await
        .map_err(|error| {
            AppError::NotFound(format!(
                "failed to read rows file '{}': {error}",
                request.rows_path.display()
            ))
        })?;

    serde_json::from_str::<Vec<Value>>(&contents).map_err(|error| {
        AppError::Validation(format!(
            "rows file '{}' must hold a JSON array: {error}",
            request.rows_path.display()
        ))
    })
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

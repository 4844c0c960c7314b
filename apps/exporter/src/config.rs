use std::env;
use std::path::PathBuf;
use std::time::Duration;

use januscope_core::{AccessToken, AppError, AppResult};
use januscope_domain::ExportFormat;

pub const USAGE: &str = "usage: januscope-exporter <table> <rows.json> <csv|json|excel> [search]";

#[derive(Debug, Clone)]
pub struct ExporterConfig {
    pub api_base_url: String,
    pub access_token: AccessToken,
    pub export_timeout: Duration,
    pub export_dir: PathBuf,
    pub date_format: String,
}

impl ExporterConfig {
    pub fn load() -> AppResult<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> AppResult<Self> {
        let api_base_url = lookup("JANUSCOPE_API_BASE_URL")
            .unwrap_or_else(|| "http://localhost:9876".to_owned())
            .trim_end_matches('/')
            .to_owned();
        let access_token = AccessToken::new(lookup("JANUSCOPE_ACCESS_TOKEN").unwrap_or_default());
        let export_timeout_ms = match lookup("JANUSCOPE_EXPORT_TIMEOUT_MS") {
            Some(value) => value.parse::<u64>().map_err(|error| {
                AppError::Validation(format!(
                    "invalid JANUSCOPE_EXPORT_TIMEOUT_MS value '{value}': {error}"
                ))
            })?,
            None => 15_000,
        };
        let export_dir = lookup("JANUSCOPE_EXPORT_DIR")
            .filter(|value| !value.trim().is_empty())
            .map_or_else(|| PathBuf::from("."), PathBuf::from);
        let date_format = lookup("JANUSCOPE_DATE_FORMAT")
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| "%m/%d/%Y".to_owned());

        if export_timeout_ms == 0 {
            return Err(AppError::Validation(
                "JANUSCOPE_EXPORT_TIMEOUT_MS must be greater than zero".to_owned(),
            ));
        }

        Ok(Self {
            api_base_url,
            access_token,
            export_timeout: Duration::from_millis(export_timeout_ms),
            export_dir,
            date_format,
        })
    }
}

/// One export run requested on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRequest {
    pub table: String,
    pub rows_path: PathBuf,
    pub format: ExportFormat,
    pub search: Option<String>,
}

impl ExportRequest {
    pub fn parse(mut args: impl Iterator<Item = String>) -> AppResult<Self> {
        let mut next = |name: &str| {
            args.next()
                .ok_or_else(|| AppError::Validation(format!("missing <{name}> argument; {USAGE}")))
        };
        let table = next("table")?;
        let rows_path = PathBuf::from(next("rows.json")?);
        let format = next("format")?.parse::<ExportFormat>()?;
        let search = args.next().filter(|value| !value.trim().is_empty());

        if let Some(extra) = args.next() {
            return Err(AppError::Validation(format!(
                "unexpected argument '{extra}'; {USAGE}"
            )));
        }

        Ok(Self {
            table,
            rows_path,
            format,
            search,
        })
    }
}

use std::time::Duration;

use async_trait::async_trait;
use januscope_application::SpreadsheetExportGateway;
use januscope_core::{AccessToken, AppError, AppResult};
use reqwest::StatusCode;
use tracing::debug;
use url::Url;

const EXPORT_PATH: &str = "api/v1/bulk/export";

/// Spreadsheet export gateway backed by the monitoring API.
pub struct HttpSpreadsheetExportGateway {
    http_client: reqwest::Client,
    endpoint: Url,
    access_token: AccessToken,
}

impl HttpSpreadsheetExportGateway {
    /// Creates a gateway for the API rooted at `base_url`.
    pub fn new(
        http_client: reqwest::Client,
        base_url: &str,
        access_token: AccessToken,
    ) -> AppResult<Self> {
        Ok(Self {
            http_client,
            endpoint: export_endpoint(base_url)?,
            access_token,
        })
    }

    /// Creates a gateway with its own client bounded by `timeout`.
    pub fn with_timeout(
        base_url: &str,
        access_token: AccessToken,
        timeout: Duration,
    ) -> AppResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| {
                AppError::Internal(format!("failed to build export HTTP client: {error}"))
            })?;
        Self::new(http_client, base_url, access_token)
    }

    /// Returns the export URL requested by this gateway.
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

/// Resolves the export path below any path prefix of `base_url`.
fn export_endpoint(base_url: &str) -> AppResult<Url> {
    let mut base = Url::parse(base_url.trim()).map_err(|error| {
        AppError::Validation(format!("invalid export API base URL '{base_url}': {error}"))
    })?;
    if base.cannot_be_a_base() {
        return Err(AppError::Validation(format!(
            "export API base URL '{base_url}' cannot carry a path"
        )));
    }

    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }

    let mut endpoint = base.join(EXPORT_PATH).map_err(|error| {
        AppError::Validation(format!("invalid export API base URL '{base_url}': {error}"))
    })?;
    endpoint.query_pairs_mut().append_pair("format", "excel");
    Ok(endpoint)
}

#[async_trait]
impl SpreadsheetExportGateway for HttpSpreadsheetExportGateway {
    async fn fetch_spreadsheet(&self, table_id: &str) -> AppResult<Vec<u8>> {
        debug!(table_id = table_id, endpoint = %self.endpoint, "requesting spreadsheet export");

        let response = self
            .http_client
            .get(self.endpoint.clone())
            .header(reqwest::header::AUTHORIZATION, self.access_token.bearer_header())
            .send()
            .await
            .map_err(|error| {
                AppError::Export(format!("spreadsheet export transport error: {error}"))
            })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(AppError::Unauthorized(
                "spreadsheet export rejected the access token".to_owned(),
            ));
        }
        if !status.is_success() {
            return Err(AppError::Export(format!(
                "spreadsheet export failed with status {status}"
            )));
        }

        let bytes = response.bytes().await.map_err(|error| {
            AppError::Export(format!("failed to read spreadsheet export body: {error}"))
        })?;
        Ok(bytes.to_vec())
    }
}

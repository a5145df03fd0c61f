//! Google Sheets implementation of the booking ledger.
//!
//! Talks to the Sheets v4 REST API: one spreadsheet, one tab per day
//! partition, values written with `USER_ENTERED` so the sheet renders
//! dates and phone numbers the way a human entering them would get.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use salon_booking_core::header_row;

use crate::config::SheetsConfig;
use crate::services::google_auth::{GoogleAuth, GoogleAuthError};

use super::{Ledger, LedgerError};

/// Sheets API base URL.
const BASE_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Bound on every call to the store; expiry surfaces as unavailability
/// rather than a hung request.
const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

/// Errors that can occur when talking to the Sheets API.
#[derive(Debug, Error)]
pub enum SheetsError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Could not obtain an access token.
    #[error("auth error: {0}")]
    Auth(#[from] GoogleAuthError),
}

impl From<SheetsError> for LedgerError {
    fn from(err: SheetsError) -> Self {
        Self::StoreUnavailable(err.to_string())
    }
}

/// Sheet metadata, trimmed to tab titles.
#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    title: String,
}

/// `values.get` response.
#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

/// Booking ledger backed by one Google spreadsheet.
pub struct SheetsLedger {
    client: reqwest::Client,
    auth: GoogleAuth,
    spreadsheet_id: String,
    capacity: u32,
}

impl SheetsLedger {
    /// Create a ledger for the configured spreadsheet.
    ///
    /// # Errors
    ///
    /// Returns error if the service account key is unusable or the HTTP
    /// client fails to build.
    pub fn new(config: &SheetsConfig, capacity: u32) -> Result<Self, SheetsError> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        let auth = GoogleAuth::new(&config.service_account_json)?;

        Ok(Self {
            client,
            auth,
            spreadsheet_id: config.spreadsheet_id.clone(),
            capacity,
        })
    }

    /// Titles of all tabs in the spreadsheet.
    async fn tab_titles(&self) -> Result<Vec<String>, SheetsError> {
        let token = self.auth.bearer_token().await?;
        let url = format!(
            "{BASE_URL}/{}?fields=sheets.properties.title",
            self.spreadsheet_id
        );
        let response = self.client.get(&url).bearer_auth(token).send().await?;
        let meta: SpreadsheetMeta = check_status(response).await?.json().await?;

        Ok(meta.sheets.into_iter().map(|s| s.properties.title).collect())
    }

    /// Add a tab with the given title.
    async fn add_tab(&self, title: &str) -> Result<(), SheetsError> {
        let token = self.auth.bearer_token().await?;
        let url = format!("{BASE_URL}/{}:batchUpdate", self.spreadsheet_id);
        let body = serde_json::json!({
            "requests": [{ "addSheet": { "properties": { "title": title } } }],
        });
        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;
        check_status(response).await?;

        tracing::info!(tab = %title, "Created daily sheet tab");
        Ok(())
    }

    /// Read a range; `None` means the tab or range does not exist.
    async fn get_values(&self, range: &str) -> Result<Option<Vec<Vec<String>>>, SheetsError> {
        let token = self.auth.bearer_token().await?;
        let url = format!(
            "{BASE_URL}/{}/values/{}",
            self.spreadsheet_id,
            urlencoding::encode(range)
        );
        let response = self.client.get(&url).bearer_auth(token).send().await?;
        let status = response.status();

        // A missing tab comes back as 400 "Unable to parse range" (or
        // 404); either way the partition is simply empty.
        if status.as_u16() == 404 {
            return Ok(None);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            if message.contains("Unable to parse range") {
                return Ok(None);
            }
            return Err(SheetsError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: ValueRange = response.json().await?;
        Ok(Some(body.values))
    }

    /// Overwrite a range with the given rows.
    async fn update_values(
        &self,
        range: &str,
        values: Vec<Vec<String>>,
    ) -> Result<(), SheetsError> {
        let token = self.auth.bearer_token().await?;
        let url = format!(
            "{BASE_URL}/{}/values/{}?valueInputOption=USER_ENTERED",
            self.spreadsheet_id,
            urlencoding::encode(range)
        );
        let body = serde_json::json!({ "values": values });
        let response = self
            .client
            .put(&url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;
        check_status(response).await?;

        Ok(())
    }

    /// Append one row after the last row of the partition.
    async fn append_row(&self, key: &str, row: Vec<String>) -> Result<(), SheetsError> {
        let token = self.auth.bearer_token().await?;
        let range = format!("{key}!A:I");
        let url = format!(
            "{BASE_URL}/{}/values/{}:append?valueInputOption=USER_ENTERED&insertDataOption=INSERT_ROWS",
            self.spreadsheet_id,
            urlencoding::encode(&range)
        );
        let body = serde_json::json!({ "values": [row] });
        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;
        check_status(response).await?;

        Ok(())
    }

    /// Row count of the partition, header included; strict errors.
    async fn row_count(&self, key: &str) -> Result<u32, SheetsError> {
        let range = format!("{key}!A:A");
        let rows = self.get_values(&range).await?.unwrap_or_default();
        Ok(u32::try_from(rows.len()).unwrap_or(u32::MAX))
    }
}

#[async_trait]
impl Ledger for SheetsLedger {
    async fn ensure_partition(&self, key: &str) -> Result<(), LedgerError> {
        let titles = self.tab_titles().await?;
        if !titles.iter().any(|t| t == key) {
            self.add_tab(key).await?;
        }
        Ok(())
    }

    async fn ensure_header(&self, key: &str) -> Result<(), LedgerError> {
        let range = format!("{key}!A1:I1");
        let existing = self.get_values(&range).await?;
        if existing.is_none_or(|rows| rows.is_empty()) {
            self.update_values(&range, vec![header_row()]).await?;
        }
        Ok(())
    }

    async fn count_data_rows(&self, key: &str) -> u32 {
        match self.row_count(key).await {
            Ok(rows) => rows.saturating_sub(1),
            Err(e) => {
                // Availability over strictness: the status endpoint
                // should answer even when the sheet is unreachable.
                tracing::warn!(key = %key, error = %e, "Count failed, reporting zero bookings");
                0
            }
        }
    }

    async fn append(&self, key: &str, row: Vec<String>) -> Result<u32, LedgerError> {
        self.ensure_partition(key).await?;
        self.ensure_header(key).await?;

        // Re-derive the count here rather than trusting the caller's
        // earlier read; narrows the check-then-append race.
        let count = self
            .row_count(key)
            .await
            .map(|rows| rows.saturating_sub(1))
            .map_err(LedgerError::from)?;
        if count >= self.capacity {
            return Err(LedgerError::CapacityExceeded(self.capacity));
        }

        self.append_row(key, row).await?;
        Ok(count + 1)
    }
}

/// Fail on non-success responses, carrying the body as the message.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, SheetsError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        let message = response.text().await.unwrap_or_default();
        Err(SheetsError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sheets_error_maps_to_store_unavailable() {
        let err = SheetsError::Api {
            status: 503,
            message: "backend".to_string(),
        };
        let ledger_err = LedgerError::from(err);
        assert!(matches!(ledger_err, LedgerError::StoreUnavailable(_)));
    }

    #[test]
    fn test_value_range_defaults_to_empty() {
        // The API omits `values` entirely for an empty range.
        let range: ValueRange = serde_json::from_str("{}").expect("parses");
        assert!(range.values.is_empty());
    }

    #[test]
    fn test_spreadsheet_meta_parses_tab_titles() {
        let json = r#"{"sheets":[{"properties":{"title":"2025-06-01"}},{"properties":{"title":"Sheet1"}}]}"#;
        let meta: SpreadsheetMeta = serde_json::from_str(json).expect("parses");
        let titles: Vec<_> = meta.sheets.into_iter().map(|s| s.properties.title).collect();
        assert_eq!(titles, vec!["2025-06-01", "Sheet1"]);
    }
}

//! Google Sheets `values` API backend adapter implementation.

use std::time::Duration;

use serde_json::Value;

use crate::backends::{CatalogBackendAdapter, SheetTable};
use crate::config::SourceConfig;

const VALUES_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Sheets adapter backed by `ureq`.
pub struct GoogleSheetsAdapter {
    http_client: ureq::Agent,
}

impl GoogleSheetsAdapter {
    /// Creates a new Sheets adapter.
    pub fn new() -> Self {
        let http_client = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(5))
            .timeout_read(Duration::from_secs(15))
            .timeout_write(Duration::from_secs(15))
            .build();
        Self { http_client }
    }

    fn values_url(source: &SourceConfig) -> String {
        format!(
            "{}/{}/values/{}?key={}",
            VALUES_API_BASE,
            urlencoding::encode(source.sheet_id.trim()),
            urlencoding::encode(source.sheet_range.trim()),
            urlencoding::encode(source.api_key.trim())
        )
    }

    fn cell_text(cell: &Value) -> String {
        match cell {
            Value::String(text) => text.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }

    /// Splits the `values` 2D array into a header row plus data rows.
    fn parse_values(payload: &Value) -> Result<SheetTable, String> {
        if let Some(message) = payload
            .get("error")
            .and_then(|value| value.get("message"))
            .and_then(Value::as_str)
        {
            return Err(format!("Sheets API returned an error: {message}"));
        }

        let values = payload
            .get("values")
            .and_then(Value::as_array)
            .ok_or_else(|| "Sheets response missing values array".to_string())?;

        let mut rows_iter = values.iter().map(|row| {
            row.as_array()
                .map(|cells| cells.iter().map(Self::cell_text).collect::<Vec<String>>())
                .ok_or_else(|| "Sheets response row is not an array".to_string())
        });

        let headers = rows_iter
            .next()
            .ok_or_else(|| "Sheets response has no header row".to_string())??;
        let rows = rows_iter.collect::<Result<Vec<Vec<String>>, String>>()?;

        Ok(SheetTable { headers, rows })
    }
}

impl Default for GoogleSheetsAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogBackendAdapter for GoogleSheetsAdapter {
    fn fetch_table(&self, source: &SourceConfig) -> Result<SheetTable, String> {
        let url = Self::values_url(source);
        let response = self
            .http_client
            .get(&url)
            .call()
            .map_err(|err| format!("Sheets request failed: {err}"))?;
        let parsed: Value = response
            .into_json()
            .map_err(|err| format!("Sheets response parse failed: {err}"))?;
        Self::parse_values(&parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::GoogleSheetsAdapter;
    use crate::config::SourceConfig;

    #[test]
    fn test_values_url_encodes_components() {
        let source = SourceConfig {
            sheet_id: "sheet id".to_string(),
            sheet_range: "Sheet1!A:Z".to_string(),
            api_key: "k&y".to_string(),
        };

        let url = GoogleSheetsAdapter::values_url(&source);
        assert_eq!(
            url,
            "https://sheets.googleapis.com/v4/spreadsheets/sheet%20id/values/Sheet1%21A%3AZ?key=k%26y"
        );
    }

    #[test]
    fn test_parse_values_splits_header_and_data_rows() {
        let payload = serde_json::json!({
            "range": "Sheet1!A1:C3",
            "values": [
                ["title", "author", "rating"],
                ["Dune", "Frank Herbert", "5"],
                ["Emma", "Jane Austen"]
            ]
        });

        let table = GoogleSheetsAdapter::parse_values(&payload).expect("payload should parse");
        assert_eq!(table.headers, vec!["title", "author", "rating"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1], vec!["Emma", "Jane Austen"]);
    }

    #[test]
    fn test_parse_values_stringifies_numeric_cells() {
        let payload = serde_json::json!({
            "values": [["rating"], [5]]
        });

        let table = GoogleSheetsAdapter::parse_values(&payload).expect("payload should parse");
        assert_eq!(table.rows[0], vec!["5"]);
    }

    #[test]
    fn test_parse_values_surfaces_api_error_message() {
        let payload = serde_json::json!({
            "error": { "code": 403, "message": "API key invalid" }
        });

        let err = GoogleSheetsAdapter::parse_values(&payload).expect_err("error should surface");
        assert!(err.contains("API key invalid"));
    }

    #[test]
    fn test_parse_values_rejects_missing_values_array() {
        let payload = serde_json::json!({ "range": "Sheet1" });
        assert!(GoogleSheetsAdapter::parse_values(&payload).is_err());
    }

    #[test]
    fn test_parse_values_rejects_empty_values_array() {
        let payload = serde_json::json!({ "values": [] });
        assert!(GoogleSheetsAdapter::parse_values(&payload).is_err());
    }
}

//! # Feature: Google Sheets Storage
//!
//! The expense sheet is the only store the bot has. Rows are appended with the
//! Sheets v4 `values.append` call and read back with `values.get`.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.0.0: Service-account auth, append and read of columns A..D

use crate::expense::{ExpenseRow, SheetRow};
use anyhow::{Context, Result};
use chrono::Utc;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use serenity::async_trait;
use std::fs;
use std::path::Path;
use tokio::sync::Mutex;

/// Default Sheets API base, overridable with [`GoogleSheets::with_base_url`]
pub const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Seconds before expiry at which a cached access token is refreshed
const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;

/// Storage for expense rows
#[async_trait]
pub trait ExpenseSheet: Send + Sync {
    /// Append one expense below the existing rows
    async fn append_row(&self, row: &ExpenseRow) -> Result<()>;

    /// Read every expense row, skipping the header row
    async fn read_rows(&self) -> Result<Vec<SheetRow>>;
}

// ============================================================================
// Service Account Credentials
// ============================================================================

/// The fields of a Google service-account key file the bot needs
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ServiceAccountKey {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read credentials file: {}", path.display()))?;
        Self::from_json(&content)
            .with_context(|| format!("Failed to parse credentials file: {}", path.display()))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let key: ServiceAccountKey = serde_json::from_str(content)?;
        if key.client_email.is_empty() {
            anyhow::bail!("Service account key has empty client_email");
        }
        if key.private_key.is_empty() {
            anyhow::bail!("Service account key has empty private_key");
        }
        Ok(key)
    }
}

#[derive(Debug, Serialize)]
struct JwtClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    3600
}

#[derive(Debug, Clone)]
struct AccessToken {
    value: String,
    expires_at: i64,
}

// ============================================================================
// Google Sheets Client
// ============================================================================

/// Sheets v4 client authenticated as a service account
pub struct GoogleSheets {
    http: reqwest::Client,
    api_base: String,
    key: ServiceAccountKey,
    spreadsheet_id: String,
    sheet_name: String,
    token: Mutex<Option<AccessToken>>,
}

impl GoogleSheets {
    pub fn new(key: ServiceAccountKey, spreadsheet_id: String, sheet_name: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: SHEETS_API_BASE.to_string(),
            key,
            spreadsheet_id,
            sheet_name,
            token: Mutex::new(None),
        }
    }

    /// Point the client at another Sheets API base, e.g. a local mock server
    pub fn with_base_url(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Build a client from a key file on disk
    pub fn from_credentials_file<P: AsRef<Path>>(
        path: P,
        spreadsheet_id: String,
        sheet_name: String,
    ) -> Result<Self> {
        let key = ServiceAccountKey::from_file(path)?;
        info!(
            "Google Sheets client ready for {} (sheet '{}')",
            key.client_email, sheet_name
        );
        Ok(Self::new(key, spreadsheet_id, sheet_name))
    }

    /// A1 range covering all expense columns, for appends
    fn append_range(&self) -> String {
        a1_range(&self.sheet_name, "A:D")
    }

    /// A1 range below the header row, for reads
    fn data_range(&self) -> String {
        a1_range(&self.sheet_name, "A2:D")
    }

    fn values_url(&self, range_segment: &str) -> Result<reqwest::Url> {
        let mut url = reqwest::Url::parse(&self.api_base)
            .with_context(|| format!("Invalid Sheets API base URL: {}", self.api_base))?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("Sheets API base URL cannot have path segments"))?
            .pop_if_empty()
            .push(&self.spreadsheet_id)
            .push("values")
            .push(range_segment);
        Ok(url)
    }

    /// Current access token, exchanging a fresh JWT assertion when needed
    async fn access_token(&self) -> Result<String> {
        let mut cached = self.token.lock().await;
        let now = Utc::now().timestamp();

        if let Some(token) = cached.as_ref() {
            if token.expires_at - TOKEN_REFRESH_MARGIN_SECS > now {
                return Ok(token.value.clone());
            }
        }

        let token = self.fetch_access_token(now).await?;
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }

    async fn fetch_access_token(&self, now: i64) -> Result<AccessToken> {
        let claims = JwtClaims {
            iss: &self.key.client_email,
            scope: SPREADSHEETS_SCOPE,
            aud: &self.key.token_uri,
            iat: now,
            exp: now + 3600,
        };

        let encoding_key = jsonwebtoken::EncodingKey::from_rsa_pem(self.key.private_key.as_bytes())
            .context("Service account private_key is not a valid RSA PEM key")?;
        let assertion = jsonwebtoken::encode(
            &jsonwebtoken::Header::new(jsonwebtoken::Algorithm::RS256),
            &claims,
            &encoding_key,
        )
        .context("Failed to sign service account assertion")?;

        let response = self
            .http
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .context("Failed to connect to Google OAuth endpoint")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Google OAuth error ({}): {}", status, body);
        }

        let token: TokenResponse = response
            .json()
            .await
            .context("Failed to parse Google OAuth response")?;

        debug!("Obtained Sheets access token valid for {}s", token.expires_in);

        Ok(AccessToken {
            value: token.access_token,
            expires_at: now + token.expires_in,
        })
    }
}

#[async_trait]
impl ExpenseSheet for GoogleSheets {
    async fn append_row(&self, row: &ExpenseRow) -> Result<()> {
        let token = self.access_token().await?;
        let url = self.values_url(&format!("{}:append", self.append_range()))?;

        let response = self
            .http
            .post(url)
            .bearer_auth(token)
            .query(&[
                ("valueInputOption", "USER_ENTERED"),
                ("insertDataOption", "INSERT_ROWS"),
            ])
            .json(&json!({ "values": [row.to_cells()] }))
            .send()
            .await
            .context("Failed to connect to Google Sheets API")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Google Sheets append error ({}): {}", status, body);
        }

        debug!(
            "Appended expense row: {} {} {}",
            row.date, row.amount, row.category
        );
        Ok(())
    }

    async fn read_rows(&self) -> Result<Vec<SheetRow>> {
        let token = self.access_token().await?;
        let url = self.values_url(&self.data_range())?;

        let response = self
            .http
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .context("Failed to connect to Google Sheets API")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Google Sheets read error ({}): {}", status, body);
        }

        let body: Value = response
            .json()
            .await
            .context("Failed to parse Google Sheets response")?;

        let rows = rows_from_value_range(&body);
        debug!("Read {} expense row(s) from sheet", rows.len());
        Ok(rows)
    }
}

/// Quote a sheet name for A1 notation when it contains anything but letters, digits or `_`
fn a1_range(sheet_name: &str, cells: &str) -> String {
    if sheet_name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        format!("{}!{}", sheet_name, cells)
    } else {
        format!("'{}'!{}", sheet_name.replace('\'', "''"), cells)
    }
}

/// Convert a Sheets `ValueRange` body into rows. A missing `values` field means an empty range.
fn rows_from_value_range(body: &Value) -> Vec<SheetRow> {
    let Some(values) = body["values"].as_array() else {
        return Vec::new();
    };

    values
        .iter()
        .filter_map(|row| row.as_array())
        .map(|cells| {
            SheetRow::new(cells.iter().map(|cell| match cell {
                Value::String(s) => s.clone(),
                Value::Null => String::new(),
                other => other.to_string(),
            }))
        })
        .collect()
}

// ============================================================================
// In-Memory Sheet
// ============================================================================

/// Sheet kept in process memory, for tests
#[derive(Default)]
pub struct InMemorySheet {
    rows: Mutex<Vec<SheetRow>>,
}

impl InMemorySheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with rows already present, as if typed into the sheet
    pub fn with_rows(rows: Vec<SheetRow>) -> Self {
        Self {
            rows: Mutex::new(rows),
        }
    }

    pub async fn rows(&self) -> Vec<SheetRow> {
        self.rows.lock().await.clone()
    }
}

#[async_trait]
impl ExpenseSheet for InMemorySheet {
    async fn append_row(&self, row: &ExpenseRow) -> Result<()> {
        self.rows.lock().await.push(SheetRow::from(row));
        Ok(())
    }

    async fn read_rows(&self) -> Result<Vec<SheetRow>> {
        Ok(self.rows.lock().await.clone())
    }
}

use crate::domain::model::{Row, Table};
use crate::utils::error::{EtlError, Result};
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

const DEFAULT_API_BASE: &str = "https://sheets.googleapis.com";
const DEFAULT_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// 只需要試算表與雲端硬碟的唯讀權限
const SCOPES: &str = "https://www.googleapis.com/auth/spreadsheets.readonly \
                      https://www.googleapis.com/auth/drive.readonly";

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URL.to_string()
}

#[derive(Debug, Deserialize)]
struct ServiceAccountKey {
    client_email: String,
    private_key: String,
    #[serde(default = "default_token_uri")]
    token_uri: String,
}

#[derive(Debug, Serialize)]
struct Claims {
    iss: String,
    scope: String,
    aud: String,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetMeta>,
}

#[derive(Debug, Deserialize)]
struct SheetMeta {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    title: String,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

pub struct SheetClient {
    client: Client,
    creds_path: String,
    api_base: String,
    token_url_override: Option<String>,
}

impl SheetClient {
    pub fn new(creds_path: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(EtlError::ApiError)?;

        Ok(Self {
            client,
            creds_path,
            api_base: DEFAULT_API_BASE.to_string(),
            token_url_override: None,
        })
    }

    pub fn with_api_base(mut self, url: impl Into<String>) -> Self {
        self.api_base = url.into();
        self
    }

    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url_override = Some(url.into());
        self
    }

    /// 從分享連結取出試算表 ID
    pub fn spreadsheet_id(sheet_url: &str) -> Result<String> {
        let re = Regex::new(r"/spreadsheets/d/([a-zA-Z0-9_-]+)").unwrap();
        re.captures(sheet_url)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| EtlError::ValidationError {
                message: format!("Not a Google Sheets URL: {}", sheet_url),
            })
    }

    fn load_key(&self) -> Result<ServiceAccountKey> {
        let raw = std::fs::read_to_string(&self.creds_path)?;
        let key = serde_json::from_str(&raw)?;
        Ok(key)
    }

    /// 以服務帳戶簽出 JWT，換取短期 access token
    async fn access_token(&self, key: &ServiceAccountKey) -> Result<String> {
        let token_url = self
            .token_url_override
            .clone()
            .unwrap_or_else(|| key.token_uri.clone());

        let now = Utc::now().timestamp();
        let claims = Claims {
            iss: key.client_email.clone(),
            scope: SCOPES.to_string(),
            aud: token_url.clone(),
            iat: now,
            exp: now + 3600,
        };

        let encoding_key =
            EncodingKey::from_rsa_pem(key.private_key.as_bytes()).map_err(|e| {
                EtlError::AuthError {
                    message: format!("Invalid service account private key: {}", e),
                }
            })?;
        let assertion = encode(&Header::new(Algorithm::RS256), &claims, &encoding_key)
            .map_err(|e| EtlError::AuthError {
                message: format!("Failed to sign service account assertion: {}", e),
            })?;

        tracing::debug!("📡 Requesting access token for {}", key.client_email);
        let response = self
            .client
            .post(&token_url)
            .form(&[
                ("grant_type", JWT_BEARER_GRANT),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(EtlError::AuthError {
                message: format!("Token exchange failed with status: {}", response.status()),
            });
        }

        let token: TokenResponse = response.json().await?;
        Ok(token.access_token)
    }

    /// 開啟分享連結指到的試算表，讀取第一個工作表
    pub async fn load_table(&self, sheet_url: &str) -> Result<Table> {
        let spreadsheet_id = Self::spreadsheet_id(sheet_url)?;
        let key = self.load_key()?;
        let token = self.access_token(&key).await?;
        self.fetch_table(&spreadsheet_id, &token).await
    }

    pub async fn fetch_table(&self, spreadsheet_id: &str, token: &str) -> Result<Table> {
        // 先查工作表名稱，Sheets API 的範圍要用名稱指定
        let meta_url = format!(
            "{}/v4/spreadsheets/{}?fields=sheets.properties.title",
            self.api_base, spreadsheet_id
        );
        let response = self.client.get(&meta_url).bearer_auth(token).send().await?;
        if !response.status().is_success() {
            return Err(EtlError::ProcessingError {
                message: format!(
                    "Spreadsheet metadata request failed with status: {}",
                    response.status()
                ),
            });
        }
        let meta: SpreadsheetMeta = response.json().await?;
        let first_sheet = meta
            .sheets
            .first()
            .map(|s| s.properties.title.clone())
            .ok_or_else(|| EtlError::ProcessingError {
                message: "Spreadsheet has no worksheets".to_string(),
            })?;

        // 工作表名稱可能含空白，組 URL 時要經過編碼
        let mut values_url =
            Url::parse(&self.api_base).map_err(|e| EtlError::ValidationError {
                message: format!("Invalid Sheets API base URL: {}", e),
            })?;
        values_url
            .path_segments_mut()
            .map_err(|_| EtlError::ValidationError {
                message: "Sheets API base URL cannot be a base".to_string(),
            })?
            .pop_if_empty()
            .extend(&["v4", "spreadsheets", spreadsheet_id, "values", &first_sheet]);

        let response = self
            .client
            .get(values_url)
            .bearer_auth(token)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(EtlError::ProcessingError {
                message: format!(
                    "Spreadsheet values request failed with status: {}",
                    response.status()
                ),
            });
        }
        let range: ValueRange = response.json().await?;

        Ok(Self::materialize(range.values))
    }

    /// 第一列當表頭，其餘列轉成記錄；尾端缺的儲存格補空字串
    fn materialize(values: Vec<Vec<serde_json::Value>>) -> Table {
        let mut rows_iter = values.into_iter();
        let columns: Vec<String> = match rows_iter.next() {
            Some(header) => header
                .into_iter()
                .map(|cell| match cell {
                    serde_json::Value::String(s) => s,
                    other => other.to_string().trim_matches('"').to_string(),
                })
                .collect(),
            None => return Table::default(),
        };

        let rows = rows_iter
            .map(|cells| {
                let mut data = HashMap::new();
                for (i, column) in columns.iter().enumerate() {
                    let value = cells
                        .get(i)
                        .cloned()
                        .unwrap_or_else(|| serde_json::Value::String(String::new()));
                    data.insert(column.clone(), value);
                }
                Row { data }
            })
            .collect();

        Table { columns, rows }
    }
}

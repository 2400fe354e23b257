//! Cliente HTTP para a API de valores do Google Sheets (v4)

use crate::error::{Result, SheetsError};
use reqwest::{Client as HttpClient, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://sheets.googleapis.com/v4";

/// Bloco de valores devolvido por `spreadsheets.values.get`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueRange {
    #[serde(default)]
    pub range: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub major_dimension: Option<String>,

    /// Ausente quando o intervalo está vazio
    #[serde(default)]
    pub values: Vec<Vec<Value>>,
}

impl ValueRange {
    /// Linhas como texto; números e booleanos viram sua representação textual
    pub fn rows(&self) -> Vec<Vec<String>> {
        self.values
            .iter()
            .map(|row| row.iter().map(cell_to_string).collect())
            .collect()
    }
}

fn cell_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Cliente para uma planilha específica
///
/// O token de acesso (OAuth2 / service account) é obtido fora daqui.
#[derive(Clone)]
pub struct SheetsClient {
    http_client: HttpClient,
    access_token: String,
    base_url: String,
    spreadsheet_id: String,
}

impl SheetsClient {
    /// Cria um novo cliente
    ///
    /// # Timeouts
    ///
    /// - Total: 30s
    /// - Connect: 5s
    pub fn new(access_token: impl Into<String>, spreadsheet_id: impl Into<String>) -> Result<Self> {
        Self::with_timeouts(access_token, spreadsheet_id, 30, 5)
    }

    /// Cria um novo cliente com timeouts customizados
    pub fn with_timeouts(
        access_token: impl Into<String>,
        spreadsheet_id: impl Into<String>,
        total_timeout_secs: u64,
        connect_timeout_secs: u64,
    ) -> Result<Self> {
        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(total_timeout_secs))
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .build()
            .map_err(|e| SheetsError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        let spreadsheet_id = spreadsheet_id.into();
        if spreadsheet_id.trim().is_empty() {
            return Err(SheetsError::ConfigError("spreadsheet_id vazio".to_string()));
        }

        Ok(Self {
            http_client,
            access_token: access_token.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            spreadsheet_id,
        })
    }

    /// Aponta para outra URL base (proxy, emulador ou testes)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    fn values_url(&self, range: &str) -> String {
        format!(
            "{}/spreadsheets/{}/values/{}",
            self.base_url, self.spreadsheet_id, range
        )
    }

    /// `GET /spreadsheets/{id}/values/{range}`
    pub async fn get_values(&self, range: &str) -> Result<ValueRange> {
        let url = self.values_url(range);

        tracing::debug!("GET {}", url);

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&self.access_token)
            .query(&[("majorDimension", "ROWS")])
            .send()
            .await?;

        let response = self.handle_response(response, range).await?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// `PUT /spreadsheets/{id}/values/{range}?valueInputOption=RAW`
    ///
    /// RAW mantém datas como texto no formato gravado.
    pub async fn update_values(&self, range: &str, values: Vec<Vec<String>>) -> Result<()> {
        let url = self.values_url(range);
        let body = serde_json::json!({
            "range": urlencoding::decode(range).map(|r| r.into_owned()).unwrap_or_else(|_| range.to_string()),
            "majorDimension": "ROWS",
            "values": values,
        });

        tracing::debug!("PUT {} with body: {}", url, body);

        let response = self
            .http_client
            .put(&url)
            .bearer_auth(&self.access_token)
            .query(&[("valueInputOption", "RAW")])
            .json(&body)
            .send()
            .await?;

        self.handle_response(response, range).await?;
        Ok(())
    }

    /// Processa a resposta HTTP e trata erros
    async fn handle_response(&self, response: Response, range: &str) -> Result<Response> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let status_code = status.as_u16();
        let error_body = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());

        // Tentar extrair mensagem de erro do JSON ({"error": {"code", "message", "status"}})
        let message = serde_json::from_str::<Value>(&error_body)
            .ok()
            .and_then(|json| {
                json.get("error")
                    .and_then(|e| e.get("message"))
                    .and_then(|m| m.as_str())
                    .map(str::to_string)
            })
            .unwrap_or(error_body);

        tracing::error!("Sheets API error ({}): {}", status_code, message);

        match status_code {
            429 => Err(SheetsError::RateLimited(message)),
            404 => Err(SheetsError::SheetNotFound(self.spreadsheet_id.clone())),
            400 if message.contains("Unable to parse range") => {
                Err(SheetsError::SheetNotFound(range.to_string()))
            }
            _ => Err(SheetsError::ApiError {
                status: status_code,
                message,
            }),
        }
    }
}

/// Intervalo A1 com o nome da aba escapado para a URL
pub fn a1_range(sheet: &str, cells: &str) -> String {
    let quoted = if sheet.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        sheet.to_string()
    } else {
        format!("'{}'", sheet.replace('\'', "''"))
    };
    format!("{}!{}", urlencoding::encode(&quoted), cells)
}

/// Letra da coluna (1-based): 1 -> A, 27 -> AA
pub fn column_letter(mut column: usize) -> String {
    let mut letters = Vec::new();
    while column > 0 {
        let rem = (column - 1) % 26;
        letters.push((b'A' + rem as u8) as char);
        column = (column - 1) / 26;
    }
    letters.iter().rev().collect()
}

//! Tipos de erro para o crate planilha

use fila::StoreError;
use thiserror::Error;

/// Erros do cliente Google Sheets
#[derive(Debug, Error)]
pub enum SheetsError {
    /// Erro de requisição HTTP
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Erro da API do Sheets (status code não-2xx)
    #[error("Sheets API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    /// Quota de leitura/escrita excedida (HTTP 429)
    #[error("Rate limit: {0}")]
    RateLimited(String),

    /// Aba ou planilha não encontrada
    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    /// Erro de parsing JSON
    #[error("JSON parsing failed: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Erro de configuração
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Tipo Result padrão para o crate
pub type Result<T> = std::result::Result<T, SheetsError>;

impl From<SheetsError> for StoreError {
    fn from(err: SheetsError) -> Self {
        match err {
            SheetsError::HttpError(e) => StoreError::Connection(e.to_string()),
            SheetsError::ApiError { status, message } => StoreError::Api { status, message },
            SheetsError::RateLimited(message) => StoreError::RateLimited(message),
            SheetsError::SheetNotFound(name) => StoreError::SheetNotFound(name),
            SheetsError::JsonError(e) => StoreError::Connection(format!("resposta inválida: {}", e)),
            SheetsError::ConfigError(message) => StoreError::Connection(message),
        }
    }
}

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use fila::{ErrorKind, QueueError};
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    /// Erro da fila (armazenamento ou regra de negócio)
    Queue(QueueError),
    /// Header `X-Sessao` ausente, inválido ou expirado
    Unauthorized(String),
    /// Nome fora da lista de colaboradores
    UnknownAgent(String),
    /// Finalização sem confirmação prévia para o chamado
    ConfirmationRequired(String),
    ConfigError(String),
    ValidationError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Queue(err) => write!(f, "{}", err),
            AppError::Unauthorized(msg) => write!(f, "Sessão inválida: {}", msg),
            AppError::UnknownAgent(name) => write!(f, "Colaborador '{}' não encontrado", name),
            AppError::ConfirmationRequired(msg) => write!(f, "Confirmação necessária: {}", msg),
            AppError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<QueueError> for AppError {
    fn from(err: QueueError) -> Self {
        AppError::Queue(err)
    }
}

impl From<fila::StoreError> for AppError {
    fn from(err: fila::StoreError) -> Self {
        AppError::Queue(err.into())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(err.to_string())
    }
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Queue(err) => match err {
                QueueError::NotAssignee { .. } => StatusCode::FORBIDDEN,
                QueueError::InvalidTransition { .. }
                | QueueError::MultipleAssignments { .. }
                | QueueError::DuplicateId { .. } => StatusCode::CONFLICT,
                other => match other.kind() {
                    ErrorKind::ConnectFailed => StatusCode::BAD_GATEWAY,
                    ErrorKind::RowNotFound => StatusCode::NOT_FOUND,
                    ErrorKind::WriteFailed => StatusCode::BAD_GATEWAY,
                    ErrorKind::RosterEmpty => StatusCode::SERVICE_UNAVAILABLE,
                },
            },
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::UnknownAgent(_) => StatusCode::NOT_FOUND,
            AppError::ConfirmationRequired(_) => StatusCode::CONFLICT,
            AppError::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Categoria exposta ao cliente junto com a mensagem
    pub fn kind(&self) -> Option<&'static str> {
        match self {
            AppError::Queue(err) => Some(match err.kind() {
                ErrorKind::ConnectFailed => "connect_failed",
                ErrorKind::RowNotFound => "row_not_found",
                ErrorKind::WriteFailed => "write_failed",
                ErrorKind::RosterEmpty => "roster_empty",
            }),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let mut body = json!({
            "error": self.to_string(),
            "status": status.as_u16()
        });
        if let Some(kind) = self.kind() {
            body["kind"] = json!(kind);
        }

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use fila::{StoreError, TicketId, TicketStatus};

    #[test]
    fn test_status_codes() {
        let not_found: AppError = StoreError::RowNotFound(TicketId::new("9")).into();
        assert_eq!(not_found.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(not_found.kind(), Some("row_not_found"));

        let rate: AppError = StoreError::RateLimited("quota".into()).into();
        assert_eq!(rate.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(rate.kind(), Some("connect_failed"));

        let transition = AppError::Queue(QueueError::InvalidTransition {
            id: TicketId::new("1"),
            status: TicketStatus::Done,
        });
        assert_eq!(transition.status_code(), StatusCode::CONFLICT);
        assert_eq!(transition.kind(), Some("write_failed"));

        assert_eq!(
            AppError::Queue(QueueError::RosterEmpty).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(AppError::Unauthorized("x".into()).kind(), None);

        let repeated = AppError::Queue(QueueError::DuplicateId { id: TicketId::new("7") });
        assert_eq!(repeated.status_code(), StatusCode::CONFLICT);
        assert_eq!(repeated.kind(), Some("row_not_found"));
    }
}

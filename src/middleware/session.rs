//! Middleware de sessão para as rotas do colaborador
//!
//! Valida o token do header `X-Sessao` devolvido por `POST /sessao` e anexa a
//! [`Session`] às extensões da requisição.
//!
//! # Uso na requisição
//!
//! ```bash
//! curl -X POST -H "X-Sessao: 6f1c...-uuid" http://localhost:8080/chamados/proximo
//! ```
//!
//! # Respostas
//!
//! - Token válido: continua para o handler
//! - **401 Unauthorized**: header ausente, malformado ou sessão encerrada

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::services::Session;
use crate::utils::AppError;
use crate::AppState;

pub const SESSION_HEADER: &str = "X-Sessao";

pub async fn require_session(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized(format!("header {} ausente", SESSION_HEADER)))?;

    let id = Uuid::parse_str(token.trim())
        .map_err(|_| AppError::Unauthorized("token malformado".to_string()))?;

    let session: Session = state.sessions.get(&id).await.ok_or_else(|| {
        tracing::warn!("❌ Sessão desconhecida ou encerrada: {}", id);
        AppError::Unauthorized("sessão não encontrada".to_string())
    })?;

    tracing::debug!("✅ Sessão de '{}'", session.agent);
    request.extensions_mut().insert(session);
    Ok(next.run(request).await)
}

use axum::{extract::State, http::StatusCode, response::Json, Extension};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::models::LoginRequest;
use crate::services::Session;
use crate::utils::{logging::*, AppError, AppResult};
use crate::AppState;

/// Nomes da aba de colaboradores, na ordem da planilha
pub async fn list_agents(State(state): State<Arc<AppState>>) -> AppResult<Json<Value>> {
    log_request_received("/colaboradores", "GET");

    let agents = state.queue.roster().await?;
    let names: Vec<&str> = agents.iter().map(|a| a.name.as_str()).collect();

    Ok(Json(json!({
        "colaboradores": names,
        "total": names.len()
    })))
}

/// Login sem senha: o nome precisa existir no roster
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    log_request_received("/sessao", "POST");

    let name = request.nome.trim();
    if name.is_empty() {
        log_validation_error("nome", "vazio");
        return Err(AppError::ValidationError("nome é obrigatório".to_string()));
    }

    let agent = state
        .queue
        .find_agent(name)
        .await?
        .ok_or_else(|| AppError::UnknownAgent(name.to_string()))?;

    let session = state.sessions.login(&agent).await;
    log_login(&session.agent, &session.id.to_string());

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "sessao": session.id,
            "nome": session.agent,
            "entrou_em": session.logged_in_at.to_rfc3339()
        })),
    ))
}

pub async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> AppResult<Json<Value>> {
    log_request_received("/sessao", "DELETE");

    state.sessions.logout(&session.id).await;
    log_logout(&session.agent);

    Ok(Json(json!({
        "encerrada": true,
        "nome": session.agent
    })))
}

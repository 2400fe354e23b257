use axum::{extract::State, http::StatusCode, response::Json};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::utils::logging::*;
use crate::AppState;

pub async fn health_check() -> Json<Value> {
    log_health_check();

    Json(json!({
        "status": "healthy",
        "service": "distribuidor-chamados",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Pronto quando as duas abas respondem (pode servir do cache)
pub async fn ready_check(State(state): State<Arc<AppState>>) -> Result<Json<Value>, StatusCode> {
    log_health_check();

    let roster = state.queue.roster().await;
    let tickets = state.queue.tickets().await;

    let store_status = match (&roster, &tickets) {
        (Ok(_), Ok(_)) => "connected",
        (Err(e), _) | (_, Err(e)) => {
            log_store_error("verificação de prontidão", &e.to_string());
            "disconnected"
        }
    };

    if store_status != "connected" {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }

    Ok(Json(json!({
        "ready": true,
        "service": "distribuidor-chamados",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "dependencies": {
            "store": {
                "status": store_status,
                "conditional_writes": state.queue.store().supports_conditional_writes(),
                "colaboradores": roster.map(|r| r.len()).unwrap_or_default(),
                "chamados": tickets.map(|t| t.len()).unwrap_or_default()
            }
        },
        "sessoes_ativas": state.sessions.active_count().await
    })))
}

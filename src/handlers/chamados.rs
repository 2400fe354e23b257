// Painel e transições de chamado da sessão atual

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    Extension,
};
use fila::{ClaimResult, ReleaseResult, TicketId};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::models::{ChamadoView, FinalizarRequest, PainelView};
use crate::services::Session;
use crate::utils::{logging::*, AppError, AppResult};
use crate::AppState;

pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> AppResult<Json<PainelView>> {
    log_request_received("/painel", "GET");

    let dashboard = state.queue.dashboard(&session.agent).await.map_err(|e| {
        log_store_error("leitura do painel", &e.to_string());
        AppError::from(e)
    })?;

    let pending_release = session.pending_release.as_ref().map(TicketId::to_string);
    Ok(Json(PainelView::new(&dashboard, &state.links, pending_release)))
}

/// Pega o próximo chamado pendente
///
/// Fila vazia e disputa perdida não são erros: voltam 200 com `resultado`.
pub async fn claim_next(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> AppResult<(StatusCode, Json<Value>)> {
    log_request_received("/chamados/proximo", "POST");

    match state.queue.claim_next(&session.agent).await {
        ClaimResult::Claimed(ticket) => {
            log_claim_succeeded(&session.agent, &ticket);
            Ok((
                StatusCode::OK,
                Json(json!({
                    "resultado": "atribuido",
                    "chamado": ChamadoView::from_ticket(&ticket, &state.links)
                })),
            ))
        }
        ClaimResult::NoneAvailable => Ok((
            StatusCode::OK,
            Json(json!({
                "resultado": "fila_vazia",
                "mensagem": "Nenhum chamado pendente na fila."
            })),
        )),
        ClaimResult::Conflict => {
            log_claim_conflict(&session.agent);
            Ok((
                StatusCode::OK,
                Json(json!({
                    "resultado": "disputa_perdida",
                    "mensagem": "Alguém pegou o chamado antes de você."
                })),
            ))
        }
        ClaimResult::AlreadyAssigned(ticket) => Ok((
            StatusCode::CONFLICT,
            Json(json!({
                "resultado": "ja_atribuido",
                "mensagem": "Finalize o chamado atual antes de pegar outro.",
                "chamado": ChamadoView::from_ticket(&ticket, &state.links)
            })),
        )),
        ClaimResult::Error(e) => {
            log_store_error("atribuição", &e.to_string());
            Err(e.into())
        }
    }
}

/// Finalização em dois passos
///
/// `confirmado: false` só arma a confirmação na sessão; `confirmado: true`
/// para o mesmo chamado grava Status e Data Fim.
pub async fn release_ticket(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
    Json(request): Json<FinalizarRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    log_request_received(&format!("/chamados/{}/finalizar", id), "POST");

    let id = TicketId::new(id.trim());

    if !request.confirmado {
        state.sessions.arm_release(&session.id, id.clone()).await?;
        return Ok((
            StatusCode::ACCEPTED,
            Json(json!({
                "resultado": "confirmacao_pendente",
                "chamado": id,
                "mensagem": "Envie confirmado=true para finalizar o atendimento."
            })),
        ));
    }

    state.sessions.confirm_release(&session.id, &id).await?;

    match state.queue.release(&session.agent, &id).await {
        ReleaseResult::Released(ticket) => {
            log_release_succeeded(&session.agent, &ticket.id);
            Ok((
                StatusCode::OK,
                Json(json!({
                    "resultado": "finalizado",
                    "chamado": ChamadoView::from_ticket(&ticket, &state.links)
                })),
            ))
        }
        ReleaseResult::Error(e) => {
            log_store_error("finalização", &e.to_string());
            Err(e.into())
        }
    }
}

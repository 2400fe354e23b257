// Biblioteca do distribuidor de chamados
// Expõe módulos para uso em testes e no binário

pub mod config;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;

// AppState é definido aqui para ser compartilhado
#[derive(Clone)]
pub struct AppState {
    pub settings: config::Settings,
    pub queue: fila::QueueService,
    pub sessions: services::SessionManager,
    pub links: services::TrackerLinks,
}

impl AppState {
    pub fn new(settings: config::Settings, queue: fila::QueueService) -> Self {
        let links = services::TrackerLinks::new(settings.tracker.link_template.clone());
        Self {
            settings,
            queue,
            sessions: services::SessionManager::new(),
            links,
        }
    }
}

/// Rotas públicas e rotas que exigem o header `X-Sessao`
pub fn build_router(state: Arc<AppState>) -> Router {
    let session_routes = Router::new()
        .route("/sessao", delete(handlers::logout))
        .route("/painel", get(handlers::get_dashboard))
        .route("/chamados/proximo", post(handlers::claim_next))
        .route("/chamados/:id/finalizar", post(handlers::release_ticket))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_session,
        ))
        .with_state(state.clone());

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::ready_check))
        .route("/colaboradores", get(handlers::list_agents))
        .route("/sessao", post(handlers::login))
        .with_state(state)
        .merge(session_routes)
}

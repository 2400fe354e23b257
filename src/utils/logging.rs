use fila::{Ticket, TicketId};
use tracing::{debug, error, info, warn};

pub fn log_request_received(endpoint: &str, method: &str) {
    info!("Request received: {} {}", method, endpoint);
}

pub fn log_config_loaded(env: &str) {
    info!("Configuration loaded successfully for environment: {}", env);
}

pub fn log_server_startup(port: u16) {
    info!("🚀 Distribuidor de chamados starting on port {}", port);
}

pub fn log_server_ready(port: u16) {
    info!("✅ Server ready and listening on http://0.0.0.0:{}", port);
}

pub fn log_health_check() {
    debug!("Health check requested");
}

pub fn log_login(agent: &str, session: &str) {
    info!("👤 '{}' entrou (sessão {})", agent, session);
}

pub fn log_logout(agent: &str) {
    info!("👋 '{}' saiu", agent);
}

pub fn log_claim_succeeded(agent: &str, ticket: &Ticket) {
    info!(
        "📥 Chamado {} (nº {}) atribuído a '{}'",
        ticket.id,
        ticket.reference_or_default(),
        agent
    );
}

pub fn log_claim_conflict(agent: &str) {
    info!("🏁 '{}' perdeu a disputa: alguém pegou o chamado antes", agent);
}

pub fn log_release_succeeded(agent: &str, id: &TicketId) {
    info!("✅ Chamado {} finalizado por '{}'", id, agent);
}

pub fn log_store_error(operation: &str, error: &str) {
    error!("❌ Erro na planilha durante {}: {}", operation, error);
}

pub fn log_validation_error(field: &str, message: &str) {
    warn!("Validation error: {} - {}", field, message);
}

pub fn log_info(message: &str) {
    info!("{}", message);
}

pub fn log_error(message: &str) {
    error!("{}", message);
}

pub fn log_warning(message: &str) {
    warn!("{}", message);
}

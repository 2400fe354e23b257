/// Middleware layer para o Axum router
///
/// - Sessão do colaborador nas rotas de painel e chamados

pub mod session;

pub use session::{require_session, SESSION_HEADER};

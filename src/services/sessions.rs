use chrono::{DateTime, Local};
use fila::{Agent, TicketId};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::utils::{logging::log_info, AppError, AppResult};

/// Estado de uma sessão de colaborador
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub id: Uuid,
    pub agent: String,
    pub logged_in_at: DateTime<Local>,
    /// Chamado com finalização pedida e ainda não confirmada
    pub pending_release: Option<TicketId>,
}

/// Sessões ativas, indexadas pelo token devolvido no login
///
/// As operações da fila recebem o nome do colaborador como argumento e nunca
/// leem daqui.
#[derive(Debug, Clone, Default)]
pub struct SessionManager {
    sessions: Arc<RwLock<HashMap<Uuid, Session>>>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Abre uma sessão para um colaborador já validado contra o roster.
    ///
    /// Cada colaborador tem no máximo uma sessão: um novo login derruba a anterior.
    pub async fn login(&self, agent: &Agent) -> Session {
        let session = Session {
            id: Uuid::new_v4(),
            agent: agent.name.clone(),
            logged_in_at: Local::now(),
            pending_release: None,
        };

        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| s.agent != agent.name);
        if sessions.len() < before {
            log_info(&format!("🔁 Sessão anterior de '{}' substituída", agent.name));
        }
        sessions.insert(session.id, session.clone());
        session
    }

    pub async fn get(&self, id: &Uuid) -> Option<Session> {
        self.sessions.read().await.get(id).cloned()
    }

    pub async fn logout(&self, id: &Uuid) -> Option<Session> {
        self.sessions.write().await.remove(id)
    }

    pub async fn active_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Primeiro passo da finalização: guarda o chamado aguardando confirmação
    pub async fn arm_release(&self, id: &Uuid, ticket: TicketId) -> AppResult<()> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(id)
            .ok_or_else(|| AppError::Unauthorized("sessão não encontrada".to_string()))?;
        session.pending_release = Some(ticket);
        Ok(())
    }

    /// Segundo passo: só libera se o mesmo chamado foi armado antes.
    ///
    /// Consome a confirmação; um pedido para outro chamado não mexe no estado.
    pub async fn confirm_release(&self, id: &Uuid, ticket: &TicketId) -> AppResult<()> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(id)
            .ok_or_else(|| AppError::Unauthorized("sessão não encontrada".to_string()))?;

        match &session.pending_release {
            Some(armed) if armed == ticket => {
                session.pending_release = None;
                Ok(())
            }
            Some(armed) => Err(AppError::ConfirmationRequired(format!(
                "a confirmação pendente é do chamado {}, não do {}",
                armed, ticket
            ))),
            None => Err(AppError::ConfirmationRequired(format!(
                "finalização do chamado {} não foi solicitada",
                ticket
            ))),
        }
    }
}

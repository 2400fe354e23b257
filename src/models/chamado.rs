//! Representações JSON devolvidas pelas rotas de painel e chamados

use fila::model::format_timestamp;
use fila::{Dashboard, Ticket};
use serde::{Deserialize, Serialize};

use crate::services::TrackerLinks;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChamadoView {
    pub id: String,
    /// Número no sistema externo ou "N/A"
    pub numero: String,
    pub status: String,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub responsavel: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub inicio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub fim: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub link: Option<String>,
}

impl ChamadoView {
    pub fn from_ticket(ticket: &Ticket, links: &TrackerLinks) -> Self {
        Self {
            id: ticket.id.to_string(),
            numero: ticket.reference_or_default().to_string(),
            status: ticket.status.to_string(),
            responsavel: ticket.assignee.clone(),
            inicio: ticket.assigned_at.as_ref().map(format_timestamp),
            fim: ticket.completed_at.as_ref().map(format_timestamp),
            link: links.link_for(ticket),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PainelView {
    pub nome: String,
    /// Chamado em andamento do colaborador
    pub chamado: Option<ChamadoView>,
    pub pendentes: usize,
    /// Inconsistências encontradas na planilha (nada é corrigido automaticamente)
    pub avisos: Vec<String>,
    /// Chamado aguardando confirmação de finalização nesta sessão
    pub finalizacao_pendente: Option<String>,
}

impl PainelView {
    pub fn new(dashboard: &Dashboard, links: &TrackerLinks, pending_release: Option<String>) -> Self {
        Self {
            nome: dashboard.agent.clone(),
            chamado: dashboard
                .assignment
                .as_ref()
                .map(|ticket| ChamadoView::from_ticket(ticket, links)),
            pendentes: dashboard.pending_count,
            avisos: dashboard.warnings.iter().map(|w| w.to_string()).collect(),
            finalizacao_pendente: pending_release,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub nome: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct FinalizarRequest {
    #[serde(default)]
    pub confirmado: bool,
}

//! Camada de painel: o que uma sessão de colaborador enxerga e pode fazer.
//!
//! Não guarda estado de sessão. Quem chama passa o nome do colaborador em cada
//! operação.

use crate::audit::{audit, Violation};
use crate::cache::SnapshotCache;
use crate::error::{QueueError, Result, StoreError};
use crate::manager::{
    find_my_assignment, id_occurrences, list_pending, ClaimResult, QueueManager, ReleaseResult,
};
use crate::model::{Agent, Ticket, TicketId, TicketStatus};
use crate::retry::RetryPolicy;
use crate::store::RecordStore;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dashboard {
    pub agent: String,
    pub assignment: Option<Ticket>,
    pub pending_count: usize,
    pub warnings: Vec<Violation>,
}

#[derive(Clone)]
pub struct QueueService {
    store: Arc<dyn RecordStore>,
    manager: QueueManager,
    tickets: SnapshotCache<Vec<Ticket>>,
    roster: SnapshotCache<Vec<Agent>>,
    connect_policy: RetryPolicy,
}

impl QueueService {
    pub fn new(store: Arc<dyn RecordStore>, tickets_ttl: Duration, roster_ttl: Duration) -> Self {
        Self {
            store,
            manager: QueueManager::new(),
            tickets: SnapshotCache::new(tickets_ttl),
            roster: SnapshotCache::new(roster_ttl),
            connect_policy: RetryPolicy::connect(),
        }
    }

    pub fn with_manager(mut self, manager: QueueManager) -> Self {
        self.manager = manager;
        self
    }

    pub fn with_connect_policy(mut self, policy: RetryPolicy) -> Self {
        self.connect_policy = policy;
        self
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    /// Confere no startup que as duas abas respondem
    pub async fn connect(&self) -> Result<()> {
        let agents = self
            .connect_policy
            .run("conexão com a aba de colaboradores", || self.store.list_roster())
            .await?;
        let tickets = self
            .connect_policy
            .run("conexão com a aba de chamados", || self.store.read_all_rows())
            .await?;

        tracing::info!(
            "✅ Armazenamento conectado: {} colaboradores, {} chamados",
            agents.len(),
            tickets.len()
        );
        self.roster.put(agents).await;
        self.tickets.put(tickets).await;
        Ok(())
    }

    /// Colaboradores cadastrados (cacheado)
    pub async fn roster(&self) -> Result<Vec<Agent>> {
        if let Some(agents) = self.roster.get().await {
            return Ok(agents);
        }
        let agents = self.store.list_roster().await?;
        self.roster.put(agents.clone()).await;
        Ok(agents)
    }

    /// Valida o nome escolhido no login contra o roster
    pub async fn find_agent(&self, name: &str) -> Result<Option<Agent>> {
        let agents = self.roster().await?;
        if agents.is_empty() {
            return Err(QueueError::RosterEmpty);
        }
        let name = name.trim();
        Ok(agents.into_iter().find(|agent| agent.name == name))
    }

    /// Snapshot da aba de chamados (cacheado)
    pub async fn tickets(&self) -> Result<Vec<Ticket>> {
        if let Some(tickets) = self.tickets.get().await {
            return Ok(tickets);
        }
        let tickets = self.store.read_all_rows().await?;
        self.tickets.put(tickets.clone()).await;
        Ok(tickets)
    }

    pub async fn dashboard(&self, agent: &str) -> Result<Dashboard> {
        let tickets = self.tickets().await?;

        let warnings = audit(&tickets);
        for warning in &warnings {
            tracing::warn!("⚠️ Planilha inconsistente: {}", warning);
        }

        let assignment = find_my_assignment(&tickets, agent)?;
        Ok(Dashboard {
            agent: agent.to_string(),
            assignment,
            pending_count: list_pending(&tickets),
            warnings,
        })
    }

    /// Pega o próximo chamado, recusando quem já tem um em andamento
    pub async fn claim_next(&self, agent: &str) -> ClaimResult {
        let fresh = match self.store.read_all_rows().await {
            Ok(tickets) => tickets,
            Err(e) => return ClaimResult::Error(e.into()),
        };

        match find_my_assignment(&fresh, agent) {
            Ok(Some(current)) => {
                tracing::info!("ℹ️ '{}' já está com o chamado {}", agent, current.id);
                return ClaimResult::AlreadyAssigned(current);
            }
            Ok(None) => {}
            Err(e) => return ClaimResult::Error(e),
        }

        let result = self.manager.claim_next(self.store.as_ref(), agent).await;
        self.tickets.invalidate().await;
        result
    }

    /// Finaliza o chamado do colaborador, conferindo dono e status na releitura
    pub async fn release(&self, agent: &str, id: &TicketId) -> ReleaseResult {
        let fresh = match self.store.read_all_rows().await {
            Ok(tickets) => tickets,
            Err(e) => return ReleaseResult::Error(e.into()),
        };

        if id_occurrences(&fresh, id) > 1 {
            tracing::warn!("⚠️ Finalização recusada: chamado {} repetido na planilha", id);
            return ReleaseResult::Error(QueueError::DuplicateId { id: id.clone() });
        }
        let Some(ticket) = fresh.into_iter().find(|t| &t.id == id) else {
            return ReleaseResult::Error(StoreError::RowNotFound(id.clone()).into());
        };
        if ticket.assignee != agent {
            return ReleaseResult::Error(QueueError::NotAssignee {
                id: ticket.id,
                agent: agent.to_string(),
            });
        }
        if ticket.status != TicketStatus::InProgress {
            return ReleaseResult::Error(QueueError::InvalidTransition {
                id: ticket.id,
                status: ticket.status,
            });
        }

        let result = self.manager.release_current(self.store.as_ref(), &ticket).await;
        self.tickets.invalidate().await;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::memory::MemoryStore;
    use crate::model::parse_timestamp;

    fn service_with(store: Arc<MemoryStore>) -> QueueService {
        QueueService::new(store, Duration::from_secs(60), Duration::from_secs(60))
            .with_manager(QueueManager::with_clock(|| {
                parse_timestamp("11/03/2025 13:00:00").unwrap_or_default()
            }))
            .with_connect_policy(RetryPolicy::none())
    }

    fn seeded() -> Arc<MemoryStore> {
        Arc::new(MemoryStore::new(
            vec![
                Ticket::pending(1u64, Some("9001")),
                Ticket::pending(2u64, Some("9002")),
                Ticket::pending(3u64, None),
            ],
            vec!["Ana".into(), "Bruno".into()],
        ))
    }

    #[tokio::test]
    async fn test_dashboard_for_free_agent() {
        let service = service_with(seeded());
        let dashboard = service.dashboard("Ana").await.unwrap();
        assert_eq!(dashboard.assignment, None);
        assert_eq!(dashboard.pending_count, 3);
        assert!(dashboard.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_dashboard_is_idempotent() {
        let service = service_with(seeded());
        service.claim_next("Ana").await;
        let first = service.dashboard("Ana").await.unwrap();
        let second = service.dashboard("Ana").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.pending_count, 2);
    }

    #[tokio::test]
    async fn test_claim_invalidates_cached_snapshot() {
        let store = seeded();
        let service = service_with(store.clone());
        assert_eq!(service.dashboard("Ana").await.unwrap().pending_count, 3);

        assert!(matches!(service.claim_next("Ana").await, ClaimResult::Claimed(_)));

        let dashboard = service.dashboard("Ana").await.unwrap();
        assert_eq!(dashboard.pending_count, 2);
        assert_eq!(dashboard.assignment.map(|t| t.id), Some(TicketId::new("1")));
    }

    #[tokio::test]
    async fn test_second_claim_is_rejected() {
        let store = seeded();
        let service = service_with(store.clone());

        let ClaimResult::Claimed(first) = service.claim_next("Ana").await else {
            panic!("primeira atribuição falhou");
        };
        let writes = store.writes().len();

        assert_eq!(service.claim_next("Ana").await, ClaimResult::AlreadyAssigned(first));
        assert_eq!(store.writes().len(), writes);
        assert!(audit(&store.snapshot()).is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_claims_same_agent() {
        let store = seeded();
        let service = service_with(store.clone());

        let (a, b) = tokio::join!(service.claim_next("Ana"), service.claim_next("Ana"));
        let claimed = [&a, &b]
            .iter()
            .filter(|r| matches!(r, ClaimResult::Claimed(_)))
            .count();
        assert_eq!(claimed, 1, "resultados: {:?} / {:?}", a, b);

        let held = store.snapshot().into_iter().filter(|t| t.is_assigned_to("Ana")).count();
        assert_eq!(held, 1);
    }

    #[tokio::test]
    async fn test_release_checks_owner() {
        let service = service_with(seeded());
        let ClaimResult::Claimed(ticket) = service.claim_next("Ana").await else {
            panic!("atribuição falhou");
        };

        let result = service.release("Bruno", &ticket.id).await;
        assert!(matches!(result, ReleaseResult::Error(QueueError::NotAssignee { .. })));

        let ReleaseResult::Released(done) = service.release("Ana", &ticket.id).await else {
            panic!("finalização falhou");
        };
        assert_eq!(done.status, TicketStatus::Done);

        // Concluído não volta
        let again = service.release("Ana", &ticket.id).await;
        assert!(matches!(again, ReleaseResult::Error(QueueError::InvalidTransition { .. })));

        let dashboard = service.dashboard("Ana").await.unwrap();
        assert_eq!(dashboard.assignment, None);
    }

    #[tokio::test]
    async fn test_release_refuses_repeated_id() {
        let mut done = Ticket::pending(1u64, None);
        done.status = TicketStatus::Done;
        done.assignee = "Ana".into();
        let mut active = Ticket::pending(1u64, None);
        active.status = TicketStatus::InProgress;
        active.assignee = "Ana".into();
        let store = Arc::new(MemoryStore::new(vec![done, active], vec!["Ana".into()]));
        let service = service_with(store.clone());

        let ReleaseResult::Error(err) = service.release("Ana", &TicketId::new("1")).await else {
            panic!("esperava erro");
        };
        assert_eq!(err, QueueError::DuplicateId { id: TicketId::new("1") });
        assert_eq!(err.kind(), ErrorKind::RowNotFound);
        assert!(store.writes().is_empty());
    }

    #[tokio::test]
    async fn test_release_unknown_ticket() {
        let service = service_with(seeded());
        let ReleaseResult::Error(err) = service.release("Ana", &TicketId::new("404")).await else {
            panic!("esperava erro");
        };
        assert_eq!(err.kind(), ErrorKind::RowNotFound);
    }

    #[tokio::test]
    async fn test_dashboard_with_double_assignment_is_an_error() {
        let mut a = Ticket::pending(1u64, None);
        let mut b = Ticket::pending(2u64, None);
        for t in [&mut a, &mut b] {
            t.status = TicketStatus::InProgress;
            t.assignee = "Ana".into();
            t.assigned_at = parse_timestamp("01/03/2025 10:00:00");
        }
        let service = service_with(Arc::new(MemoryStore::new(vec![a, b], vec!["Ana".into()])));

        let err = service.dashboard("Ana").await.unwrap_err();
        assert!(matches!(err, QueueError::MultipleAssignments { .. }));
        assert!(matches!(service.claim_next("Ana").await, ClaimResult::Error(_)));
    }

    #[tokio::test]
    async fn test_find_agent_and_empty_roster() {
        let service = service_with(seeded());
        assert_eq!(service.find_agent(" Bruno ").await.unwrap(), Some(Agent::new("Bruno")));
        assert_eq!(service.find_agent("Zé").await.unwrap(), None);

        let empty = service_with(Arc::new(MemoryStore::new(vec![], vec![])));
        assert_eq!(empty.roster().await.unwrap(), vec![]);
        assert_eq!(empty.find_agent("Ana").await, Err(QueueError::RosterEmpty));
    }

    #[tokio::test]
    async fn test_connect_fails_after_policy() {
        let store = seeded();
        store.fail_next_reads(1);
        let service = service_with(store);
        let err = service.connect().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConnectFailed);
    }
}

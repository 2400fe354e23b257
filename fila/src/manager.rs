// ============================================================================
// Queue Manager - Atribuição e finalização de chamados
// ============================================================================
//
// Duas transições apenas:
//
// 1. **Pegar próximo** (claim_next): Pendente -> Em Andamento
//    - Relê a aba inteira (nunca do cache)
//    - Primeiro chamado pendente e sem responsável, na ordem das linhas
//    - Resolve a linha pelo ID e grava status, responsável e data de início
//
// 2. **Finalizar** (release_current): Em Andamento -> Concluido
//    - Resolve a linha pelo ID e grava status e data de fim
//
// # Concorrência
//
// A planilha não tem lock nem transação. Se o armazenamento suporta escrita
// condicional, o status é gravado com compare-and-set esperando "Pendente" e
// quem perder recebe `ClaimResult::Conflict`. Sem isso, duas sessões que leem
// o mesmo snapshot podem gravar o mesmo chamado; a janela é estreita mas real.

use crate::error::{QueueError, Result};
use crate::model::{format_timestamp, Field, Ticket, TicketId, TicketStatus};
use crate::store::RecordStore;
use chrono::NaiveDateTime;

/// Resultado de "pegar próximo chamado"
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimResult {
    /// Chamado atribuído ao colaborador
    Claimed(Ticket),
    /// Nenhum chamado livre no momento da releitura
    NoneAvailable,
    /// Outra sessão gravou o chamado entre a leitura e a escrita
    Conflict,
    /// O colaborador já tem um chamado em andamento
    AlreadyAssigned(Ticket),
    Error(QueueError),
}

/// Resultado de "finalizar atendimento"
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseResult {
    Released(Ticket),
    Error(QueueError),
}

/// Relógio usado para as datas de início e fim
pub type Clock = fn() -> NaiveDateTime;

fn local_now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

/// Quantidade de chamados pendentes no snapshot
pub fn list_pending(tickets: &[Ticket]) -> usize {
    tickets
        .iter()
        .filter(|t| t.status == TicketStatus::Pending)
        .count()
}

/// Chamado em andamento do colaborador.
///
/// Mais de um é estado corrompido (escrita dupla): vira erro, nunca escolhemos um.
pub fn find_my_assignment(tickets: &[Ticket], agent: &str) -> Result<Option<Ticket>> {
    let mut mine = tickets.iter().filter(|t| t.is_assigned_to(agent));
    let first = mine.next();
    let rest: Vec<&Ticket> = mine.collect();

    match (first, rest.is_empty()) {
        (None, _) => Ok(None),
        (Some(ticket), true) => Ok(Some(ticket.clone())),
        (Some(ticket), false) => Err(QueueError::MultipleAssignments {
            agent: agent.to_string(),
            ids: std::iter::once(ticket)
                .chain(rest)
                .map(|t| t.id.clone())
                .collect(),
        }),
    }
}

/// Quantas linhas do snapshot têm este ID
pub fn id_occurrences(tickets: &[Ticket], id: &TicketId) -> usize {
    tickets.iter().filter(|t| &t.id == id).count()
}

/// Primeiro chamado livre cujo ID aparece uma única vez.
///
/// A escrita localiza a linha pelo ID; com ID repetido ela cairia na primeira
/// ocorrência, que pode ser outro chamado.
fn first_unambiguous_claimable(tickets: &[Ticket]) -> Option<Ticket> {
    tickets
        .iter()
        .filter(|t| t.is_claimable())
        .find(|t| {
            let unique = id_occurrences(tickets, &t.id) == 1;
            if !unique {
                tracing::warn!("⚠️ Chamado {} ignorado: ID repetido na planilha", t.id);
            }
            unique
        })
        .cloned()
}

#[derive(Debug, Clone)]
pub struct QueueManager {
    clock: Clock,
}

impl Default for QueueManager {
    fn default() -> Self {
        Self::new()
    }
}

impl QueueManager {
    pub fn new() -> Self {
        Self { clock: local_now }
    }

    pub fn with_clock(clock: Clock) -> Self {
        Self { clock }
    }

    /// Atribui ao colaborador o primeiro chamado livre, na ordem da planilha.
    ///
    /// Uma única tentativa por chamada; o chamador decide se tenta de novo.
    pub async fn claim_next<S>(&self, store: &S, agent: &str) -> ClaimResult
    where
        S: RecordStore + ?Sized,
    {
        let tickets = match store.read_all_rows().await {
            Ok(tickets) => tickets,
            Err(e) => {
                tracing::error!("❌ Falha ao reler chamados antes de atribuir: {}", e);
                return ClaimResult::Error(e.into());
            }
        };

        let Some(candidate) = first_unambiguous_claimable(&tickets) else {
            tracing::info!("📭 Nenhum chamado livre para '{}'", agent);
            return ClaimResult::NoneAvailable;
        };

        let row = match store.find_row_by_id(&candidate.id).await {
            Ok(row) => row,
            Err(e) => {
                tracing::error!("❌ Chamado {} não localizado: {}", candidate.id, e);
                return ClaimResult::Error(e.into());
            }
        };

        let now = (self.clock)();
        let assigned_at = format_timestamp(&now);

        if store.supports_conditional_writes() {
            match store
                .update_field_if(
                    row,
                    Field::Status,
                    TicketStatus::Pending.as_str(),
                    TicketStatus::InProgress.as_str(),
                )
                .await
            {
                Ok(true) => {}
                Ok(false) => {
                    tracing::warn!(
                        "⚠️ Chamado {} foi pego por outra sessão antes de '{}'",
                        candidate.id,
                        agent
                    );
                    return ClaimResult::Conflict;
                }
                Err(e) => {
                    tracing::error!("❌ Falha ao gravar status do chamado {}: {}", candidate.id, e);
                    return ClaimResult::Error(e.into());
                }
            }
        } else if let Err(e) = store
            .update_field(row, Field::Status, TicketStatus::InProgress.as_str())
            .await
        {
            tracing::error!("❌ Falha ao gravar status do chamado {}: {}", candidate.id, e);
            return ClaimResult::Error(e.into());
        }

        let remaining = [(Field::Assignee, agent), (Field::AssignedAt, assigned_at.as_str())];
        let mut written = vec![Field::Status];
        for (field, value) in remaining {
            if let Err(e) = store.update_field(row, field, value).await {
                tracing::error!(
                    "❌ Escrita parcial no chamado {} (linha {}): gravados {:?}, falhou '{}': {}",
                    candidate.id,
                    row,
                    written,
                    field,
                    e
                );
                return ClaimResult::Error(e.into());
            }
            written.push(field);
        }

        let ticket = Ticket {
            status: TicketStatus::InProgress,
            assignee: agent.to_string(),
            assigned_at: Some(now),
            ..candidate
        };
        tracing::info!("✅ Chamado {} atribuído a '{}' (linha {})", ticket.id, agent, row);
        ClaimResult::Claimed(ticket)
    }

    /// Conclui o chamado em andamento. O responsável não muda.
    pub async fn release_current<S>(&self, store: &S, ticket: &Ticket) -> ReleaseResult
    where
        S: RecordStore + ?Sized,
    {
        let Some(done) = ticket.status.next().filter(|s| *s == TicketStatus::Done) else {
            return ReleaseResult::Error(QueueError::InvalidTransition {
                id: ticket.id.clone(),
                status: ticket.status,
            });
        };

        let row = match store.find_row_by_id(&ticket.id).await {
            Ok(row) => row,
            Err(e) => {
                tracing::error!("❌ Chamado {} não localizado para finalizar: {}", ticket.id, e);
                return ReleaseResult::Error(e.into());
            }
        };

        let now = (self.clock)();
        if let Err(e) = store
            .update_field(row, Field::Status, done.as_str())
            .await
        {
            tracing::error!("❌ Falha ao gravar status do chamado {}: {}", ticket.id, e);
            return ReleaseResult::Error(e.into());
        }
        if let Err(e) = store
            .update_field(row, Field::CompletedAt, &format_timestamp(&now))
            .await
        {
            tracing::error!(
                "❌ Escrita parcial no chamado {}: status concluído sem data de fim: {}",
                ticket.id,
                e
            );
            return ReleaseResult::Error(e.into());
        }

        let released = Ticket {
            status: done,
            completed_at: Some(now),
            ..ticket.clone()
        };
        tracing::info!("✅ Chamado {} finalizado por '{}'", released.id, released.assignee);
        ReleaseResult::Released(released)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{audit, Violation};
    use crate::error::{ErrorKind, StoreError};
    use crate::memory::MemoryStore;
    use crate::model::{parse_timestamp, RowPosition};

    fn fixed_clock() -> NaiveDateTime {
        parse_timestamp("10/03/2025 09:15:00").unwrap()
    }

    fn manager() -> QueueManager {
        QueueManager::with_clock(fixed_clock)
    }

    fn two_pending() -> MemoryStore {
        MemoryStore::new(
            vec![Ticket::pending(1u64, Some("4001")), Ticket::pending(2u64, Some("4002"))],
            vec!["Ana".into(), "Bruno".into()],
        )
    }

    #[test]
    fn test_list_pending_counts_only_pending() {
        let mut tickets = vec![Ticket::pending(1u64, None), Ticket::pending(2u64, None)];
        tickets[1].status = TicketStatus::Done;
        assert_eq!(list_pending(&tickets), 1);
        assert_eq!(list_pending(&[]), 0);
    }

    #[test]
    fn test_find_my_assignment() {
        let mut tickets = vec![Ticket::pending(1u64, None), Ticket::pending(2u64, None)];
        assert_eq!(find_my_assignment(&tickets, "Ana"), Ok(None));

        tickets[1].status = TicketStatus::InProgress;
        tickets[1].assignee = "Ana".into();
        assert_eq!(find_my_assignment(&tickets, "Ana").unwrap().unwrap().id, TicketId::new("2"));
        assert_eq!(find_my_assignment(&tickets, "Bruno"), Ok(None));

        tickets[0].status = TicketStatus::InProgress;
        tickets[0].assignee = "Ana".into();
        let err = find_my_assignment(&tickets, "Ana").unwrap_err();
        assert_eq!(
            err,
            QueueError::MultipleAssignments {
                agent: "Ana".into(),
                ids: vec![TicketId::new("1"), TicketId::new("2")]
            }
        );
    }

    #[tokio::test]
    async fn test_claim_takes_first_by_position() {
        let store = two_pending();
        let result = manager().claim_next(&store, "Ana").await;

        let ClaimResult::Claimed(ticket) = result else {
            panic!("esperava Claimed, veio {:?}", result);
        };
        assert_eq!(ticket.id, TicketId::new("1"));
        assert_eq!(ticket.status, TicketStatus::InProgress);
        assert_eq!(ticket.assignee, "Ana");
        assert_eq!(ticket.assigned_at, Some(fixed_clock()));

        let stored = store.snapshot();
        assert!(stored[0].is_assigned_to("Ana"));
        assert!(stored[1].is_claimable());
        assert!(audit(&stored).is_empty());

        let fields: Vec<Field> = store.writes().iter().map(|w| w.field).collect();
        assert_eq!(fields, vec![Field::Status, Field::Assignee, Field::AssignedAt]);
    }

    #[tokio::test]
    async fn test_claim_skips_pending_rows_with_assignee() {
        let mut odd = Ticket::pending(1u64, None);
        odd.assignee = "Carla".into();
        let store = MemoryStore::new(vec![odd, Ticket::pending(2u64, None)], vec![]);

        let result = manager().claim_next(&store, "Ana").await;
        assert!(matches!(result, ClaimResult::Claimed(ref t) if t.id == TicketId::new("2")));
    }

    #[tokio::test]
    async fn test_claim_with_empty_queue_writes_nothing() {
        let mut done = Ticket::pending(1u64, None);
        done.status = TicketStatus::Done;
        done.assignee = "Bruno".into();
        let store = MemoryStore::new(vec![done], vec![]);

        assert_eq!(manager().claim_next(&store, "Ana").await, ClaimResult::NoneAvailable);
        assert!(store.writes().is_empty());
    }

    #[tokio::test]
    async fn test_claim_resolves_row_after_insert() {
        let store = two_pending();
        // Outro editor insere uma linha concluída no topo
        let mut other = Ticket::pending(0u64, None);
        other.status = TicketStatus::Done;
        other.assignee = "Bruno".into();
        store.insert_row(RowPosition(2), &other);

        manager().claim_next(&store, "Ana").await;
        assert!(store.writes().iter().all(|w| w.row == RowPosition(3)));
    }

    fn done_by(id: u64, agent: &str) -> Ticket {
        let mut ticket = Ticket::pending(id, None);
        ticket.status = TicketStatus::Done;
        ticket.assignee = agent.into();
        ticket.assigned_at = Some(fixed_clock());
        ticket.completed_at = Some(fixed_clock());
        ticket
    }

    fn repeated_id_rows() -> Vec<Ticket> {
        vec![done_by(1, "Bruno"), Ticket::pending(1u64, None), Ticket::pending(2u64, None)]
    }

    async fn assert_repeated_id_is_skipped(store: MemoryStore) {
        let result = manager().claim_next(&store, "Ana").await;
        assert!(
            matches!(result, ClaimResult::Claimed(ref t) if t.id == TicketId::new("2")),
            "veio {:?}",
            result
        );

        let stored = store.snapshot();
        assert_eq!(stored[0].status, TicketStatus::Done);
        assert_eq!(stored[0].assignee, "Bruno");
        assert!(stored[1].is_claimable());
        assert!(stored[2].is_assigned_to("Ana"));
        assert!(store.writes().iter().all(|w| w.row == RowPosition(4)));
    }

    #[tokio::test]
    async fn test_claim_skips_repeated_id_with_conditional_writes() {
        assert_repeated_id_is_skipped(MemoryStore::new(repeated_id_rows(), vec![])).await;
    }

    #[tokio::test]
    async fn test_claim_skips_repeated_id_without_conditional_writes() {
        let store = MemoryStore::new(repeated_id_rows(), vec![]).without_conditional_writes();
        assert_repeated_id_is_skipped(store).await;
    }

    #[tokio::test]
    async fn test_claim_with_only_repeated_ids_writes_nothing() {
        let store = MemoryStore::new(vec![done_by(1, "Bruno"), Ticket::pending(1u64, None)], vec![]);
        assert_eq!(manager().claim_next(&store, "Ana").await, ClaimResult::NoneAvailable);
        assert!(store.writes().is_empty());
        assert_eq!(store.snapshot()[0].status, TicketStatus::Done);
    }

    #[tokio::test]
    async fn test_concurrent_claims_with_one_ticket() {
        let store = MemoryStore::new(vec![Ticket::pending(1u64, None)], vec![]);
        let manager = manager();

        let (a, b) = tokio::join!(manager.claim_next(&store, "Ana"), manager.claim_next(&store, "Bruno"));

        let claimed = [&a, &b]
            .iter()
            .filter(|r| matches!(r, ClaimResult::Claimed(_)))
            .count();
        assert_eq!(claimed, 1, "resultados: {:?} / {:?}", a, b);
        assert!([&a, &b]
            .iter()
            .any(|r| matches!(r, ClaimResult::Conflict | ClaimResult::NoneAvailable)));
        assert!(audit(&store.snapshot()).is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_claims_without_conditional_writes_can_double_claim() {
        // Sem compare-and-set as duas sessões passam pela releitura antes de gravar
        let store = MemoryStore::new(vec![Ticket::pending(1u64, None)], vec![]).without_conditional_writes();
        let manager = manager();

        let (a, b) = tokio::join!(manager.claim_next(&store, "Ana"), manager.claim_next(&store, "Bruno"));

        assert!(matches!(a, ClaimResult::Claimed(_)));
        assert!(matches!(b, ClaimResult::Claimed(_)));
        // A última escrita vence na planilha; o outro colaborador acha que tem o chamado
        let holder = store.snapshot()[0].assignee.clone();
        assert!(holder == "Ana" || holder == "Bruno");
    }

    #[tokio::test]
    async fn test_claim_partial_write_is_reported_and_detectable() {
        let store = two_pending();
        store.fail_writes_after(1);

        let result = manager().claim_next(&store, "Ana").await;
        let ClaimResult::Error(err) = result else {
            panic!("esperava Error, veio {:?}", result);
        };
        assert_eq!(err.kind(), ErrorKind::WriteFailed);

        let violations = audit(&store.snapshot());
        assert!(violations.contains(&Violation::UnassignedWhileActive {
            id: TicketId::new("1"),
            status: TicketStatus::InProgress,
        }));
    }

    #[tokio::test]
    async fn test_claim_read_failure() {
        let store = two_pending();
        store.fail_next_reads(1);
        let result = manager().claim_next(&store, "Ana").await;
        assert_eq!(
            result,
            ClaimResult::Error(QueueError::Store(StoreError::RateLimited(
                "quota de leitura excedida".into()
            )))
        );
        assert!(store.writes().is_empty());
    }

    #[tokio::test]
    async fn test_release_sets_done_and_keeps_assignee() {
        let store = two_pending();
        let ClaimResult::Claimed(ticket) = manager().claim_next(&store, "Ana").await else {
            panic!("claim falhou");
        };

        let result = manager().release_current(&store, &ticket).await;
        let ReleaseResult::Released(done) = result else {
            panic!("esperava Released, veio {:?}", result);
        };
        assert_eq!(done.status, TicketStatus::Done);
        assert_eq!(done.assignee, "Ana");
        assert_eq!(done.completed_at, Some(fixed_clock()));

        let stored = &store.snapshot()[0];
        assert_eq!(stored.status, TicketStatus::Done);
        assert_eq!(stored.assignee, "Ana");
        assert!(stored.completed_at.is_some());
        assert!(audit(&store.snapshot()).is_empty());
    }

    #[tokio::test]
    async fn test_release_requires_in_progress() {
        let store = two_pending();
        let pending = Ticket::pending(1u64, None);
        let result = manager().release_current(&store, &pending).await;
        assert!(matches!(result, ReleaseResult::Error(QueueError::InvalidTransition { .. })));
        assert!(store.writes().is_empty());
    }

    #[tokio::test]
    async fn test_release_with_stale_id() {
        let store = two_pending();
        let mut ghost = Ticket::pending(77u64, None);
        ghost.status = TicketStatus::InProgress;
        ghost.assignee = "Ana".into();

        let ReleaseResult::Error(err) = manager().release_current(&store, &ghost).await else {
            panic!("esperava erro");
        };
        assert_eq!(err.kind(), ErrorKind::RowNotFound);
    }
}

//! Verificação dos invariantes da aba de chamados.
//!
//! A sequência de escritas de uma atribuição não é atômica: se a rede cair no
//! meio, a linha fica com status e responsável inconsistentes. Nada aqui corrige
//! a planilha; as violações são apenas reportadas ao painel e ao log.

use crate::model::{Ticket, TicketId, TicketStatus};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "tipo", rename_all = "snake_case")]
pub enum Violation {
    /// Pendente com responsável preenchido
    AssignedWhilePending { id: TicketId, assignee: String },
    /// Em andamento/concluído sem responsável (escrita parcial)
    UnassignedWhileActive { id: TicketId, status: TicketStatus },
    MissingAssignedAt { id: TicketId },
    MissingCompletedAt { id: TicketId },
    /// Mesmo colaborador com mais de um chamado em andamento
    MultipleAssignments { agent: String, ids: Vec<TicketId> },
    DuplicateId { id: TicketId },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::AssignedWhilePending { id, assignee } => {
                write!(f, "Chamado {} está pendente mas tem responsável '{}'", id, assignee)
            }
            Violation::UnassignedWhileActive { id, status } => {
                write!(f, "Chamado {} está '{}' sem responsável", id, status)
            }
            Violation::MissingAssignedAt { id } => write!(f, "Chamado {} sem data de início", id),
            Violation::MissingCompletedAt { id } => write!(f, "Chamado {} concluído sem data de fim", id),
            Violation::MultipleAssignments { agent, ids } => {
                let ids: Vec<&str> = ids.iter().map(TicketId::as_str).collect();
                write!(f, "'{}' tem vários chamados em andamento: {}", agent, ids.join(", "))
            }
            Violation::DuplicateId { id } => write!(f, "ID {} aparece em mais de uma linha", id),
        }
    }
}

pub fn audit(tickets: &[Ticket]) -> Vec<Violation> {
    let mut violations = Vec::new();
    let mut seen = HashSet::new();
    let mut active: BTreeMap<&str, Vec<TicketId>> = BTreeMap::new();

    for ticket in tickets {
        if !seen.insert(&ticket.id) {
            violations.push(Violation::DuplicateId { id: ticket.id.clone() });
        }

        match ticket.status {
            TicketStatus::Pending => {
                if !ticket.assignee.is_empty() {
                    violations.push(Violation::AssignedWhilePending {
                        id: ticket.id.clone(),
                        assignee: ticket.assignee.clone(),
                    });
                }
            }
            TicketStatus::InProgress | TicketStatus::Done => {
                if ticket.assignee.is_empty() {
                    violations.push(Violation::UnassignedWhileActive {
                        id: ticket.id.clone(),
                        status: ticket.status,
                    });
                }
                if ticket.assigned_at.is_none() {
                    violations.push(Violation::MissingAssignedAt { id: ticket.id.clone() });
                }
            }
        }

        if ticket.status == TicketStatus::Done && ticket.completed_at.is_none() {
            violations.push(Violation::MissingCompletedAt { id: ticket.id.clone() });
        }

        if ticket.status == TicketStatus::InProgress && !ticket.assignee.is_empty() {
            active.entry(ticket.assignee.as_str()).or_default().push(ticket.id.clone());
        }
    }

    violations.extend(
        active
            .into_iter()
            .filter(|(_, ids)| ids.len() > 1)
            .map(|(agent, ids)| Violation::MultipleAssignments {
                agent: agent.to_string(),
                ids,
            }),
    );

    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::parse_timestamp;

    fn in_progress(id: u64, agent: &str) -> Ticket {
        Ticket {
            status: TicketStatus::InProgress,
            assignee: agent.to_string(),
            assigned_at: parse_timestamp("01/01/2025 10:00:00"),
            ..Ticket::pending(id, None)
        }
    }

    #[test]
    fn test_consistent_sheet_has_no_violations() {
        let tickets = vec![Ticket::pending(1u64, None), in_progress(2, "Ana"), in_progress(3, "Bruno")];
        assert!(audit(&tickets).is_empty());
    }

    #[test]
    fn test_partial_claim_is_flagged() {
        // Status gravado, responsável e data não
        let partial = Ticket {
            status: TicketStatus::InProgress,
            ..Ticket::pending(4u64, None)
        };
        let violations = audit(&[partial]);
        assert_eq!(
            violations,
            vec![
                Violation::UnassignedWhileActive {
                    id: TicketId::new("4"),
                    status: TicketStatus::InProgress
                },
                Violation::MissingAssignedAt { id: TicketId::new("4") },
            ]
        );
    }

    #[test]
    fn test_double_assignment_and_duplicates() {
        let tickets = vec![in_progress(1, "Ana"), in_progress(2, "Ana"), Ticket::pending(2u64, None)];
        let violations = audit(&tickets);
        assert!(violations.contains(&Violation::DuplicateId { id: TicketId::new("2") }));
        assert!(violations.contains(&Violation::MultipleAssignments {
            agent: "Ana".to_string(),
            ids: vec![TicketId::new("1"), TicketId::new("2")],
        }));
    }

    #[test]
    fn test_done_without_completion_date() {
        let done = Ticket {
            status: TicketStatus::Done,
            ..in_progress(9, "Ana")
        };
        assert_eq!(audit(&[done]), vec![Violation::MissingCompletedAt { id: TicketId::new("9") }]);
    }
}

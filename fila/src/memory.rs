//! Armazenamento em memória com o mesmo layout da planilha.
//!
//! Usado no modo local (`store.backend = "memoria"`) e nos testes. Cada operação
//! cede a vez ao runtime antes de executar, para que sessões concorrentes se
//! intercalem como fariam contra a API remota.

use crate::error::StoreError;
use crate::model::{ticket_from_cells, ticket_to_cells, Agent, Field, RowPosition, Ticket, TicketId};
use crate::store::{RecordStore, StoreResult};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use std::sync::Mutex;

/// Conteúdo inicial carregado de YAML
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MemorySeed {
    #[serde(default)]
    pub colaboradores: Vec<String>,
    #[serde(default)]
    pub chamados: Vec<Ticket>,
}

/// Escrita registrada, para inspeção em testes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteRecord {
    pub row: RowPosition,
    pub field: Field,
    pub value: String,
}

#[derive(Debug, Default)]
struct Inner {
    /// Linhas de dados (sem cabeçalho); posição = índice + 2
    rows: Vec<Vec<String>>,
    roster: Vec<String>,
    writes: Vec<WriteRecord>,
    /// Escritas restantes antes de começar a falhar
    writes_before_failure: Option<usize>,
    /// Próximas leituras que falham com rate limit
    transient_read_failures: usize,
}

#[derive(Debug)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    conditional_writes: bool,
}

impl MemoryStore {
    pub fn new(tickets: Vec<Ticket>, roster: Vec<String>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                rows: tickets.iter().map(ticket_to_cells).collect(),
                roster,
                ..Inner::default()
            }),
            conditional_writes: true,
        }
    }

    pub fn from_seed(seed: MemorySeed) -> Self {
        Self::new(seed.chamados, seed.colaboradores)
    }

    /// Carrega um arquivo YAML com `colaboradores` e `chamados`
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| StoreError::Connection(format!("{}: {}", path.display(), e)))?;
        let seed: MemorySeed = serde_yaml::from_str(&raw)
            .map_err(|e| StoreError::Connection(format!("{}: {}", path.display(), e)))?;
        Ok(Self::from_seed(seed))
    }

    /// Desliga a escrita condicional, reproduzindo uma planilha sem compare-and-set
    pub fn without_conditional_writes(mut self) -> Self {
        self.conditional_writes = false;
        self
    }

    /// As próximas `n` escritas funcionam; as seguintes falham
    pub fn fail_writes_after(&self, n: usize) {
        self.lock().writes_before_failure = Some(n);
    }

    /// As próximas `n` leituras falham com rate limit
    pub fn fail_next_reads(&self, n: usize) {
        self.lock().transient_read_failures = n;
    }

    /// Insere uma linha numa posição física (simula outro editor)
    pub fn insert_row(&self, row: RowPosition, ticket: &Ticket) {
        let mut inner = self.lock();
        let index = row.0.saturating_sub(2).min(inner.rows.len());
        inner.rows.insert(index, ticket_to_cells(ticket));
    }

    pub fn writes(&self) -> Vec<WriteRecord> {
        self.lock().writes.clone()
    }

    /// Estado atual, ignorando linhas inválidas
    pub fn snapshot(&self) -> Vec<Ticket> {
        let inner = self.lock();
        inner
            .rows
            .iter()
            .enumerate()
            .filter_map(|(i, cells)| ticket_from_cells(i + 2, cells).ok())
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // Um teste que entrou em pânico com o lock não invalida o estado
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn take_read_failure(inner: &mut Inner) -> StoreResult<()> {
        if inner.transient_read_failures > 0 {
            inner.transient_read_failures -= 1;
            return Err(StoreError::RateLimited("quota de leitura excedida".to_string()));
        }
        Ok(())
    }

    fn cell_mut<'a>(inner: &'a mut Inner, row: RowPosition, field: Field) -> StoreResult<&'a mut String> {
        let index = row
            .0
            .checked_sub(2)
            .ok_or_else(|| StoreError::Write(format!("linha {} é o cabeçalho", row)))?;
        let cells = inner
            .rows
            .get_mut(index)
            .ok_or_else(|| StoreError::Write(format!("linha {} não existe", row)))?;
        let column = field.column() - 1;
        if cells.len() <= column {
            cells.resize(column + 1, String::new());
        }
        Ok(&mut cells[column])
    }

    fn consume_write_budget(inner: &mut Inner) -> StoreResult<()> {
        match inner.writes_before_failure {
            Some(0) => Err(StoreError::Write("falha de rede simulada".to_string())),
            Some(ref mut remaining) => {
                *remaining -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn read_all_rows(&self) -> StoreResult<Vec<Ticket>> {
        tokio::task::yield_now().await;
        let mut inner = self.lock();
        Self::take_read_failure(&mut inner)?;
        inner
            .rows
            .iter()
            .enumerate()
            .map(|(i, cells)| ticket_from_cells(i + 2, cells))
            .collect()
    }

    async fn find_row_by_id(&self, id: &TicketId) -> StoreResult<RowPosition> {
        tokio::task::yield_now().await;
        let mut inner = self.lock();
        Self::take_read_failure(&mut inner)?;
        inner
            .rows
            .iter()
            .position(|cells| cells.first().map(|c| c.trim()) == Some(id.as_str()))
            .map(|index| RowPosition(index + 2))
            .ok_or_else(|| StoreError::RowNotFound(id.clone()))
    }

    async fn update_field(&self, row: RowPosition, field: Field, value: &str) -> StoreResult<()> {
        tokio::task::yield_now().await;
        let mut inner = self.lock();
        Self::consume_write_budget(&mut inner)?;
        *Self::cell_mut(&mut inner, row, field)? = value.to_string();
        inner.writes.push(WriteRecord {
            row,
            field,
            value: value.to_string(),
        });
        Ok(())
    }

    async fn list_roster(&self) -> StoreResult<Vec<Agent>> {
        tokio::task::yield_now().await;
        let mut inner = self.lock();
        Self::take_read_failure(&mut inner)?;
        Ok(inner
            .roster
            .iter()
            .map(|name| name.trim())
            .filter(|name| !name.is_empty())
            .map(Agent::new)
            .collect())
    }

    fn supports_conditional_writes(&self) -> bool {
        self.conditional_writes
    }

    async fn update_field_if(
        &self,
        row: RowPosition,
        field: Field,
        expected: &str,
        value: &str,
    ) -> StoreResult<bool> {
        if !self.conditional_writes {
            return Err(StoreError::Unsupported);
        }
        tokio::task::yield_now().await;
        let mut inner = self.lock();
        Self::consume_write_budget(&mut inner)?;
        let cell = Self::cell_mut(&mut inner, row, field)?;
        if cell.trim() != expected {
            return Ok(false);
        }
        *cell = value.to_string();
        inner.writes.push(WriteRecord {
            row,
            field,
            value: value.to_string(),
        });
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TicketStatus;

    fn store() -> MemoryStore {
        MemoryStore::new(
            vec![Ticket::pending(1u64, Some("5001")), Ticket::pending(2u64, None)],
            vec!["Ana".to_string(), "Bruno".to_string()],
        )
    }

    #[tokio::test]
    async fn test_find_row_by_id_is_one_based_with_header() {
        let store = store();
        assert_eq!(store.find_row_by_id(&TicketId::new("2")).await.unwrap(), RowPosition(3));
        assert_eq!(
            store.find_row_by_id(&TicketId::new("99")).await,
            Err(StoreError::RowNotFound(TicketId::new("99")))
        );
    }

    #[tokio::test]
    async fn test_inserted_row_shifts_positions() {
        let store = store();
        store.insert_row(RowPosition(2), &Ticket::pending(0u64, None));
        assert_eq!(store.find_row_by_id(&TicketId::new("1")).await.unwrap(), RowPosition(3));
    }

    #[tokio::test]
    async fn test_update_field_if_checks_current_value() {
        let store = store();
        let row = RowPosition(2);
        assert!(store.update_field_if(row, Field::Status, "Pendente", "Em Andamento").await.unwrap());
        assert!(!store.update_field_if(row, Field::Status, "Pendente", "Em Andamento").await.unwrap());
        assert_eq!(store.snapshot()[0].status, TicketStatus::InProgress);
        assert_eq!(store.writes().len(), 1);
    }

    #[tokio::test]
    async fn test_write_budget_and_read_failures() {
        let store = store();
        store.fail_writes_after(1);
        assert!(store.update_field(RowPosition(2), Field::Assignee, "Ana").await.is_ok());
        assert!(matches!(
            store.update_field(RowPosition(2), Field::Status, "Em Andamento").await,
            Err(StoreError::Write(_))
        ));

        store.fail_next_reads(1);
        assert!(matches!(store.read_all_rows().await, Err(StoreError::RateLimited(_))));
        assert_eq!(store.read_all_rows().await.unwrap().len(), 2);
    }

    #[test]
    fn test_seed_from_yaml() {
        let yaml = r#"
colaboradores: [Ana, Bruno]
chamados:
  - id: "10"
    reference: "777"
    status: Pendente
  - id: "11"
    status: Em Andamento
    assignee: Bruno
    assigned_at: "2025-03-01T09:00:00"
"#;
        let seed: MemorySeed = serde_yaml::from_str(yaml).unwrap();
        let store = MemoryStore::from_seed(seed);
        let tickets = store.snapshot();
        assert_eq!(tickets.len(), 2);
        assert!(tickets[1].is_assigned_to("Bruno"));
    }
}

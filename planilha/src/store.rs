//! `RecordStore` sobre duas abas de uma planilha Google
//!
//! Layout esperado da aba de chamados (colunas A..F):
//! `ID | Dados | Status | Responsavel | Data Inicio | Data Fim`
//!
//! A aba de colaboradores tem um nome por linha na coluna A, abaixo do cabeçalho.
//! A API de valores não tem escrita condicional: entre a releitura e a gravação
//! do Status outro editor pode gravar a mesma célula.

use crate::client::{a1_range, column_letter, SheetsClient};
use async_trait::async_trait;
use fila::model::{check_header, ticket_from_cells};
use fila::{Agent, Field, RecordStore, RowPosition, StoreError, StoreResult, Ticket, TicketId};

pub const DEFAULT_TICKETS_SHEET: &str = "Chamados";
pub const DEFAULT_ROSTER_SHEET: &str = "Colaboradores";

#[derive(Clone)]
pub struct SheetsStore {
    client: SheetsClient,
    tickets_sheet: String,
    roster_sheet: String,
}

impl SheetsStore {
    pub fn new(client: SheetsClient) -> Self {
        Self {
            client,
            tickets_sheet: DEFAULT_TICKETS_SHEET.to_string(),
            roster_sheet: DEFAULT_ROSTER_SHEET.to_string(),
        }
    }

    /// Abas localizadas pelo nome, nunca pela posição na planilha
    pub fn with_sheets(mut self, tickets_sheet: impl Into<String>, roster_sheet: impl Into<String>) -> Self {
        self.tickets_sheet = tickets_sheet.into();
        self.roster_sheet = roster_sheet.into();
        self
    }

    fn tickets_range(&self) -> String {
        let last = column_letter(Field::ALL.len());
        a1_range(&self.tickets_sheet, &format!("A:{}", last))
    }

    fn cell_range(&self, row: RowPosition, field: Field) -> String {
        a1_range(
            &self.tickets_sheet,
            &format!("{}{}", column_letter(field.column()), row.0),
        )
    }

    async fn read_column(&self, sheet: &str, field_column: usize) -> StoreResult<Vec<String>> {
        let letter = column_letter(field_column);
        let range = a1_range(sheet, &format!("{}:{}", letter, letter));
        let values = self.client.get_values(&range).await?;
        Ok(values
            .rows()
            .into_iter()
            .map(|row| row.into_iter().next().unwrap_or_default())
            .collect())
    }
}

fn is_blank(row: &[String]) -> bool {
    row.iter().all(|cell| cell.trim().is_empty())
}

#[async_trait]
impl RecordStore for SheetsStore {
    async fn read_all_rows(&self) -> StoreResult<Vec<Ticket>> {
        let rows = self.client.get_values(&self.tickets_range()).await?.rows();

        let Some((header, body)) = rows.split_first() else {
            tracing::info!("📋 Aba '{}' vazia", self.tickets_sheet);
            return Ok(Vec::new());
        };
        check_header(header)?;

        let mut tickets = Vec::with_capacity(body.len());
        for (index, cells) in body.iter().enumerate() {
            if is_blank(cells) {
                continue;
            }
            // +2: posição 1-based e o cabeçalho
            match ticket_from_cells(index + 2, cells) {
                Ok(ticket) => tickets.push(ticket),
                Err(e) => tracing::warn!("⚠️ Linha ignorada na aba '{}': {}", self.tickets_sheet, e),
            }
        }

        tracing::debug!("📋 {} chamados lidos de '{}'", tickets.len(), self.tickets_sheet);
        Ok(tickets)
    }

    async fn find_row_by_id(&self, id: &TicketId) -> StoreResult<RowPosition> {
        let ids = self.read_column(&self.tickets_sheet, Field::Id.column()).await?;
        ids.iter()
            .enumerate()
            .skip(1)
            .find(|(_, cell)| cell.trim() == id.as_str())
            .map(|(index, _)| RowPosition(index + 1))
            .ok_or_else(|| StoreError::RowNotFound(id.clone()))
    }

    async fn update_field(&self, row: RowPosition, field: Field, value: &str) -> StoreResult<()> {
        if row.0 < 2 {
            return Err(StoreError::Write(format!("linha {} é o cabeçalho", row)));
        }
        let range = self.cell_range(row, field);
        self.client
            .update_values(&range, vec![vec![value.to_string()]])
            .await
            .map_err(|e| {
                let err = StoreError::from(e);
                if err.is_transient() {
                    err
                } else {
                    StoreError::Write(format!("{} (linha {}, coluna {}): {}", self.tickets_sheet, row, field, err))
                }
            })
    }

    async fn list_roster(&self) -> StoreResult<Vec<Agent>> {
        let names = self.read_column(&self.roster_sheet, 1).await?;
        Ok(names
            .into_iter()
            .skip(1)
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .map(Agent::new)
            .collect())
    }
}

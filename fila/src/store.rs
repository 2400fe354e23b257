//! Contrato do armazenamento de registros (planilha compartilhada)
//!
//! O armazenamento não oferece transações: cada escrita é uma célula isolada.
//! Posições de linha mudam quando outros editores inserem ou removem linhas,
//! por isso toda escrita começa por `find_row_by_id`.

use crate::error::StoreError;
use crate::model::{Agent, Field, RowPosition, Ticket, TicketId};
use async_trait::async_trait;
use std::sync::Arc;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Snapshot completo da aba de chamados, na ordem natural das linhas
    async fn read_all_rows(&self) -> StoreResult<Vec<Ticket>>;

    /// Posição atual da linha com este ID
    async fn find_row_by_id(&self, id: &TicketId) -> StoreResult<RowPosition>;

    /// Grava uma única célula
    async fn update_field(&self, row: RowPosition, field: Field, value: &str) -> StoreResult<()>;

    /// Colaboradores da aba de roster, sem o cabeçalho
    async fn list_roster(&self) -> StoreResult<Vec<Agent>>;

    /// Indica se `update_field_if` é atômico neste armazenamento
    fn supports_conditional_writes(&self) -> bool {
        false
    }

    /// Grava `value` somente se a célula ainda contém `expected`.
    ///
    /// Retorna `Ok(false)` quando o valor atual difere.
    async fn update_field_if(
        &self,
        _row: RowPosition,
        _field: Field,
        _expected: &str,
        _value: &str,
    ) -> StoreResult<bool> {
        Err(StoreError::Unsupported)
    }
}

#[async_trait]
impl<S: RecordStore + ?Sized> RecordStore for Arc<S> {
    async fn read_all_rows(&self) -> StoreResult<Vec<Ticket>> {
        (**self).read_all_rows().await
    }

    async fn find_row_by_id(&self, id: &TicketId) -> StoreResult<RowPosition> {
        (**self).find_row_by_id(id).await
    }

    async fn update_field(&self, row: RowPosition, field: Field, value: &str) -> StoreResult<()> {
        (**self).update_field(row, field, value).await
    }

    async fn list_roster(&self) -> StoreResult<Vec<Agent>> {
        (**self).list_roster().await
    }

    fn supports_conditional_writes(&self) -> bool {
        (**self).supports_conditional_writes()
    }

    async fn update_field_if(
        &self,
        row: RowPosition,
        field: Field,
        expected: &str,
        value: &str,
    ) -> StoreResult<bool> {
        (**self).update_field_if(row, field, expected, value).await
    }
}

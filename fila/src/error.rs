//! Tipos de erro da fila

use crate::model::{TicketId, TicketStatus};
use thiserror::Error;

/// Erros devolvidos por um `RecordStore`
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Limite de requisições da API externa atingido
    #[error("Rate limit atingido: {0}")]
    RateLimited(String),

    /// Falha de rede ou de conexão com o armazenamento
    #[error("Falha de conexão: {0}")]
    Connection(String),

    /// Erro devolvido pela API (status HTTP não-2xx)
    #[error("Erro da API (status {status}): {message}")]
    Api { status: u16, message: String },

    /// Nenhuma linha com este ID (ID obsoleto)
    #[error("Linha não encontrada para o chamado {0}")]
    RowNotFound(TicketId),

    /// Cabeçalho esperado ausente ou fora da posição
    #[error("Coluna ausente ou fora de posição: {0}")]
    MissingColumn(String),

    /// Aba não encontrada pelo nome
    #[error("Aba não encontrada: {0}")]
    SheetNotFound(String),

    /// Conteúdo de célula inválido
    #[error("Linha {row} inválida: {message}")]
    InvalidRow { row: usize, message: String },

    /// Falha ao gravar uma célula
    #[error("Falha na escrita: {0}")]
    Write(String),

    /// Escrita condicional não suportada por este armazenamento
    #[error("Escrita condicional não suportada")]
    Unsupported,
}

impl StoreError {
    /// Erros que valem uma nova tentativa
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::RateLimited(_) | StoreError::Connection(_) => true,
            StoreError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Categoria fechada de erro, estável para testes e para a camada HTTP
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    ConnectFailed,
    RowNotFound,
    WriteFailed,
    RosterEmpty,
}

/// Erros das operações da fila
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QueueError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Mais de um chamado em andamento para o mesmo colaborador
    #[error("Colaborador '{agent}' tem {} chamados em andamento", .ids.len())]
    MultipleAssignments { agent: String, ids: Vec<TicketId> },

    /// Transição de status não permitida
    #[error("Chamado {id} está '{status}', transição não permitida")]
    InvalidTransition { id: TicketId, status: TicketStatus },

    /// Chamado pertence a outro colaborador
    #[error("Chamado {id} não está atribuído a '{agent}'")]
    NotAssignee { id: TicketId, agent: String },

    /// ID repetido em mais de uma linha; a linha não pode ser localizada com segurança
    #[error("Chamado {id} aparece em mais de uma linha da planilha")]
    DuplicateId { id: TicketId },

    /// Lista de colaboradores vazia
    #[error("Nenhum colaborador cadastrado")]
    RosterEmpty,
}

impl QueueError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            QueueError::Store(err) => match err {
                StoreError::RateLimited(_)
                | StoreError::Connection(_)
                | StoreError::Api { .. }
                | StoreError::SheetNotFound(_) => ErrorKind::ConnectFailed,
                StoreError::RowNotFound(_)
                | StoreError::MissingColumn(_)
                | StoreError::InvalidRow { .. } => ErrorKind::RowNotFound,
                StoreError::Write(_) | StoreError::Unsupported => ErrorKind::WriteFailed,
            },
            QueueError::MultipleAssignments { .. } | QueueError::DuplicateId { .. } => {
                ErrorKind::RowNotFound
            }
            QueueError::InvalidTransition { .. } | QueueError::NotAssignee { .. } => {
                ErrorKind::WriteFailed
            }
            QueueError::RosterEmpty => ErrorKind::RosterEmpty,
        }
    }
}

pub type Result<T> = std::result::Result<T, QueueError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_errors() {
        assert!(StoreError::RateLimited("quota".into()).is_transient());
        assert!(StoreError::Api { status: 503, message: "x".into() }.is_transient());
        assert!(!StoreError::Api { status: 400, message: "x".into() }.is_transient());
        assert!(!StoreError::RowNotFound(TicketId::new("9")).is_transient());
    }

    #[test]
    fn test_error_kinds() {
        let stale = QueueError::from(StoreError::RowNotFound(TicketId::new("1")));
        assert_eq!(stale.kind(), ErrorKind::RowNotFound);
        let write = QueueError::from(StoreError::Write("timeout".into()));
        assert_eq!(write.kind(), ErrorKind::WriteFailed);
        assert_eq!(QueueError::RosterEmpty.kind(), ErrorKind::RosterEmpty);
    }
}

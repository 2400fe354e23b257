//! Modelo de dados da fila: chamados, colaboradores e o layout posicional da planilha.
//!
//! Os literais de status são os mesmos gravados na planilha pela equipe de suporte:
//! - "Pendente"
//! - "Em Andamento"
//! - "Concluido"

use crate::error::StoreError;
use chrono::NaiveDateTime;
use deunicode::deunicode;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Formato das datas gravadas nas colunas "Data Inicio" / "Data Fim"
pub const DATE_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

/// Texto exibido quando o chamado não tem número externo
pub const NO_REFERENCE: &str = "N/A";

/// Identificador estável do chamado (coluna ID)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketId(pub String);

impl TicketId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TicketId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<u64> for TicketId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

/// Status do chamado. Só avança: Pendente -> Em Andamento -> Concluido
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TicketStatus {
    #[serde(rename = "Pendente")]
    Pending,
    #[serde(rename = "Em Andamento")]
    InProgress,
    #[serde(rename = "Concluido")]
    Done,
}

impl TicketStatus {
    /// Literal gravado na planilha
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Pending => "Pendente",
            TicketStatus::InProgress => "Em Andamento",
            TicketStatus::Done => "Concluido",
        }
    }

    /// Interpreta o texto de uma célula de status.
    ///
    /// Aceita variações de caixa, espaços nas pontas e acentos ("Concluído").
    pub fn parse(raw: &str) -> Option<Self> {
        match fold_text(raw).as_str() {
            "pendente" => Some(TicketStatus::Pending),
            "em andamento" => Some(TicketStatus::InProgress),
            "concluido" => Some(TicketStatus::Done),
            _ => None,
        }
    }

    /// Próximo status permitido, se houver
    pub fn next(&self) -> Option<Self> {
        match self {
            TicketStatus::Pending => Some(TicketStatus::InProgress),
            TicketStatus::InProgress => Some(TicketStatus::Done),
            TicketStatus::Done => None,
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Uma linha da aba de chamados
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,

    /// Número do chamado no sistema externo (coluna "Dados")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    pub status: TicketStatus,

    /// Nome do colaborador; vazio enquanto pendente
    #[serde(default)]
    pub assignee: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_at: Option<NaiveDateTime>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<NaiveDateTime>,
}

impl Ticket {
    /// Cria um chamado pendente, sem responsável
    pub fn pending(id: impl Into<TicketId>, reference: Option<&str>) -> Self {
        Self {
            id: id.into(),
            reference: reference.map(str::to_string),
            status: TicketStatus::Pending,
            assignee: String::new(),
            assigned_at: None,
            completed_at: None,
        }
    }

    /// Disponível para ser pego: pendente e sem responsável
    pub fn is_claimable(&self) -> bool {
        self.status == TicketStatus::Pending && self.assignee.is_empty()
    }

    pub fn is_assigned_to(&self, agent: &str) -> bool {
        self.status == TicketStatus::InProgress && self.assignee == agent
    }

    /// Número externo ou "N/A"
    pub fn reference_or_default(&self) -> &str {
        self.reference.as_deref().unwrap_or(NO_REFERENCE)
    }
}

impl From<String> for TicketId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Colaborador da aba de roster
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Agent {
    pub name: String,
}

impl Agent {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Posição física (1-based, cabeçalho incluso) de uma linha na aba.
///
/// Não é estável: deve ser resolvida de novo pelo ID antes de cada escrita.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RowPosition(pub usize);

impl fmt::Display for RowPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Colunas da aba de chamados, na ordem física da planilha
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Field {
    Id,
    Reference,
    Status,
    Assignee,
    AssignedAt,
    CompletedAt,
}

impl Field {
    pub const ALL: [Field; 6] = [
        Field::Id,
        Field::Reference,
        Field::Status,
        Field::Assignee,
        Field::AssignedAt,
        Field::CompletedAt,
    ];

    /// Índice da coluna (1-based) usado nas escritas posicionais
    pub fn column(&self) -> usize {
        match self {
            Field::Id => 1,
            Field::Reference => 2,
            Field::Status => 3,
            Field::Assignee => 4,
            Field::AssignedAt => 5,
            Field::CompletedAt => 6,
        }
    }

    /// Nome do cabeçalho na planilha
    pub fn header(&self) -> &'static str {
        match self {
            Field::Id => "ID",
            Field::Reference => "Dados",
            Field::Status => "Status",
            Field::Assignee => "Responsavel",
            Field::AssignedAt => "Data Inicio",
            Field::CompletedAt => "Data Fim",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

pub fn format_timestamp(value: &NaiveDateTime) -> String {
    value.format(DATE_FORMAT).to_string()
}

/// Célula vazia vira `None`; texto fora do formato também
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    NaiveDateTime::parse_from_str(raw, DATE_FORMAT).ok()
}

/// Converte as células de uma linha (ordem física) em chamado.
///
/// `row` é a posição 1-based usada apenas nas mensagens de erro.
pub fn ticket_from_cells(row: usize, cells: &[String]) -> Result<Ticket, StoreError> {
    let cell = |field: Field| cell_at(cells, field);

    let id = cell(Field::Id);
    if id.is_empty() {
        return Err(StoreError::InvalidRow {
            row,
            message: "ID vazio".to_string(),
        });
    }

    let status = TicketStatus::parse(cell(Field::Status)).ok_or_else(|| StoreError::InvalidRow {
        row,
        message: format!("status desconhecido '{}'", cell(Field::Status)),
    })?;

    let reference = match cell(Field::Reference) {
        "" | NO_REFERENCE => None,
        value => Some(value.to_string()),
    };

    Ok(Ticket {
        id: TicketId::new(id),
        reference,
        status,
        assignee: cell(Field::Assignee).to_string(),
        assigned_at: parse_timestamp(cell(Field::AssignedAt)),
        completed_at: parse_timestamp(cell(Field::CompletedAt)),
    })
}

fn cell_at(cells: &[String], field: Field) -> &str {
    cells
        .get(field.column() - 1)
        .map(|c| c.trim())
        .unwrap_or("")
}

/// Células de um chamado na ordem física das colunas
pub fn ticket_to_cells(ticket: &Ticket) -> Vec<String> {
    vec![
        ticket.id.to_string(),
        ticket.reference.clone().unwrap_or_default(),
        ticket.status.as_str().to_string(),
        ticket.assignee.clone(),
        ticket.assigned_at.as_ref().map(format_timestamp).unwrap_or_default(),
        ticket.completed_at.as_ref().map(format_timestamp).unwrap_or_default(),
    ]
}

/// Confere que o cabeçalho segue o layout posicional usado nas escritas
pub fn check_header(cells: &[String]) -> Result<(), StoreError> {
    for field in [Field::Id, Field::Status, Field::Assignee] {
        let found = cells
            .get(field.column() - 1)
            .map(|c| fold_text(c))
            .unwrap_or_default();
        if found != fold_text(field.header()) {
            return Err(StoreError::MissingColumn(format!(
                "esperado '{}' na coluna {}, encontrado '{}'",
                field.header(),
                field.column(),
                found
            )));
        }
    }
    Ok(())
}

/// Sem acentos, minúsculo e sem espaços nas pontas
fn fold_text(raw: &str) -> String {
    deunicode(raw.trim()).to_lowercase()
}

//! Armazenamento de chamados em Google Sheets
//!
//! Implementa [`fila::RecordStore`] sobre a API de valores v4: uma aba de
//! chamados (colunas A..F) e uma aba de colaboradores (coluna A).
//!
//! ```rust,ignore
//! use planilha::{SheetsClient, SheetsStore};
//!
//! let client = SheetsClient::new(token, "1AbC...")?;
//! let store = SheetsStore::new(client).with_sheets("Chamados", "Colaboradores");
//! ```

pub mod client;
pub mod error;
pub mod store;

pub use client::{SheetsClient, ValueRange};
pub use error::{Result, SheetsError};
pub use store::{SheetsStore, DEFAULT_ROSTER_SHEET, DEFAULT_TICKETS_SHEET};

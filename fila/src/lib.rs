//! Fila de chamados compartilhada
//!
//! Colaboradores pegam chamados pendentes um de cada vez e os finalizam. Os
//! dados vivem numa planilha externa que não oferece lock nem transação, então
//! toda decisão é tomada sobre uma releitura feita imediatamente antes da escrita.
//!
//! - [`QueueManager`]: as duas transições (pegar próximo / finalizar)
//! - [`QueueService`]: painel, cache e proteção contra segundo chamado
//! - [`RecordStore`]: contrato do armazenamento; [`MemoryStore`] para uso local
//! - [`RetryingStore`] / [`RetryPolicy`]: retentativa uniforme
//! - [`audit`]: verificação dos invariantes da planilha
//!
//! # Exemplo
//!
//! ```rust,ignore
//! use fila::{MemoryStore, QueueService, ClaimResult};
//! use std::{sync::Arc, time::Duration};
//!
//! let store = Arc::new(MemoryStore::from_yaml_file("config/chamados_demo.yaml")?);
//! let service = QueueService::new(store, Duration::from_secs(10), Duration::from_secs(300));
//!
//! match service.claim_next("Ana").await {
//!     ClaimResult::Claimed(ticket) => println!("Chamado {}", ticket.reference_or_default()),
//!     ClaimResult::NoneAvailable => println!("Fila zerada"),
//!     other => println!("{:?}", other),
//! }
//! ```

pub mod audit;
pub mod cache;
pub mod error;
pub mod manager;
pub mod memory;
pub mod model;
pub mod retry;
pub mod service;
pub mod store;

pub use audit::{audit, Violation};
pub use cache::SnapshotCache;
pub use error::{ErrorKind, QueueError, Result, StoreError};
pub use manager::{find_my_assignment, list_pending, ClaimResult, QueueManager, ReleaseResult};
pub use memory::{MemorySeed, MemoryStore};
pub use model::{Agent, Field, RowPosition, Ticket, TicketId, TicketStatus};
pub use retry::{Backoff, RetryPolicy, RetryingStore};
pub use service::{Dashboard, QueueService};
pub use store::{RecordStore, StoreResult};

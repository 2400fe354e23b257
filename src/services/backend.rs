//! Montagem do armazenamento a partir da configuração

use fila::{MemoryStore, QueueService, RecordStore, RetryingStore};
use planilha::{SheetsClient, SheetsStore};
use std::sync::Arc;

use crate::config::{Settings, StoreBackend};
use crate::utils::{logging::*, AppError, AppResult};

/// Store escolhido em `store.backend`, já envolto pela política de retentativa
pub fn build_store(settings: &Settings) -> AppResult<Arc<dyn RecordStore>> {
    match settings.store.backend {
        StoreBackend::Memoria => {
            let store = match &settings.store.seed_file {
                Some(path) => {
                    log_info(&format!("📂 Carregando chamados de demonstração de '{}'", path));
                    MemoryStore::from_yaml_file(path)?
                }
                None => {
                    log_warning("⚠️ store.seed_file não configurado, fila em memória vazia");
                    MemoryStore::new(Vec::new(), Vec::new())
                }
            };
            Ok(Arc::new(RetryingStore::new(store, settings.retry)))
        }
        StoreBackend::Planilha => {
            let cfg = &settings.planilha;
            if cfg.access_token.trim().is_empty() {
                return Err(AppError::ConfigError(
                    "PLANILHA_ACCESS_TOKEN não configurado".to_string(),
                ));
            }

            let mut client = SheetsClient::with_timeouts(
                cfg.access_token.clone(),
                cfg.spreadsheet_id.clone(),
                cfg.timeout_secs,
                cfg.connect_timeout_secs,
            )
            .map_err(|e| AppError::ConfigError(e.to_string()))?;
            if let Some(base_url) = &cfg.base_url {
                client = client.with_base_url(base_url.clone());
            }

            log_info(&format!(
                "📊 Planilha {} (abas '{}' e '{}')",
                cfg.spreadsheet_id, cfg.tickets_sheet, cfg.roster_sheet
            ));
            let store = SheetsStore::new(client)
                .with_sheets(cfg.tickets_sheet.clone(), cfg.roster_sheet.clone());
            Ok(Arc::new(RetryingStore::new(store, settings.retry)))
        }
    }
}

/// Serviço da fila com TTLs e política de conexão da configuração
pub fn build_queue_service(settings: &Settings, store: Arc<dyn RecordStore>) -> QueueService {
    QueueService::new(store, settings.cache.tickets_ttl(), settings.cache.roster_ttl())
        .with_connect_policy(settings.connect_retry)
}

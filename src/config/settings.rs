use config::{Config, ConfigError, Environment, File};
use fila::RetryPolicy;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub store: StoreSettings,
    #[serde(default)]
    pub planilha: PlanilhaSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub retry: RetryPolicy,
    #[serde(default = "RetryPolicy::connect")]
    pub connect_retry: RetryPolicy,
    #[serde(default)]
    pub tracker: TrackerSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Onde ficam os chamados
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    /// Google Sheets (produção)
    #[default]
    Planilha,
    /// Store em memória semeado por YAML (desenvolvimento/demonstração)
    Memoria,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct StoreSettings {
    #[serde(default)]
    pub backend: StoreBackend,
    /// Arquivo YAML com `colaboradores` e `chamados` (backend memoria)
    pub seed_file: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PlanilhaSettings {
    pub base_url: Option<String>,
    pub spreadsheet_id: String,
    pub access_token: String,
    pub tickets_sheet: String,
    pub roster_sheet: String,
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for PlanilhaSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            spreadsheet_id: String::new(),
            access_token: String::new(),
            tickets_sheet: planilha::DEFAULT_TICKETS_SHEET.to_string(),
            roster_sheet: planilha::DEFAULT_ROSTER_SHEET.to_string(),
            timeout_secs: 30,
            connect_timeout_secs: 5,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CacheSettings {
    pub tickets_ttl_secs: u64,
    pub roster_ttl_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            tickets_ttl_secs: 10,
            roster_ttl_secs: 300,
        }
    }
}

impl CacheSettings {
    pub fn tickets_ttl(&self) -> Duration {
        Duration::from_secs(self.tickets_ttl_secs)
    }

    pub fn roster_ttl(&self) -> Duration {
        Duration::from_secs(self.roster_ttl_secs)
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct TrackerSettings {
    /// URL com o marcador `{numero}`; sem template, nenhum link é gerado
    pub link_template: Option<String>,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let mut builder = Config::builder()
            // Arquivo de configuração base
            .add_source(File::with_name("config/default").required(false))
            // Arquivo específico do ambiente
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false));

        // Credenciais da planilha vêm do ambiente
        if let Ok(token) = std::env::var("PLANILHA_ACCESS_TOKEN") {
            builder = builder.set_override("planilha.access_token", token)?;
        }
        if let Ok(id) = std::env::var("PLANILHA_ID") {
            builder = builder.set_override("planilha.spreadsheet_id", id)?;
        }

        // DISTRIBUIDOR__SERVER__PORT, DISTRIBUIDOR__STORE__BACKEND, ...
        builder = builder.add_source(
            Environment::with_prefix("DISTRIBUIDOR")
                .separator("__")
                .try_parsing(true),
        );

        let s = builder.build()?;

        s.try_deserialize()
    }

    /// Configuração a partir de um TOML já carregado (testes e ferramentas)
    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from_str(raw, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fila::Backoff;

    #[test]
    fn test_defaults_without_any_source() {
        let settings = Settings::from_toml("").unwrap();
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.store.backend, StoreBackend::Planilha);
        assert_eq!(settings.planilha.tickets_sheet, "Chamados");
        assert_eq!(settings.planilha.roster_sheet, "Colaboradores");
        assert_eq!(settings.cache.tickets_ttl(), Duration::from_secs(10));
        assert_eq!(settings.cache.roster_ttl(), Duration::from_secs(300));
        assert_eq!(settings.retry, RetryPolicy::default());
        assert_eq!(settings.connect_retry, RetryPolicy::connect());
        assert!(settings.tracker.link_template.is_none());
    }

    #[test]
    fn test_sections_from_toml() {
        let settings = Settings::from_toml(
            r#"
            [server]
            host = "127.0.0.1"
            port = 9000

            [store]
            backend = "memoria"
            seed_file = "config/chamados_demo.yaml"

            [planilha]
            spreadsheet_id = "1AbC"
            tickets_sheet = "Fila"

            [retry]
            max_attempts = 4
            backoff = { tipo = "fixed", delay = 250 }

            [tracker]
            link_template = "https://tracker.local/chamado?id={numero}"
            "#,
        )
        .unwrap();

        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.store.backend, StoreBackend::Memoria);
        assert_eq!(settings.store.seed_file.as_deref(), Some("config/chamados_demo.yaml"));
        assert_eq!(settings.planilha.tickets_sheet, "Fila");
        assert_eq!(settings.planilha.roster_sheet, "Colaboradores");
        assert_eq!(settings.retry.max_attempts, 4);
        assert_eq!(
            settings.retry.backoff,
            Backoff::Fixed {
                delay: Duration::from_millis(250)
            }
        );
    }
}

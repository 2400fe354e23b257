//! Política única de retentativa para chamadas ao armazenamento.
//!
//! Só erros transitórios (rate limit, rede, 5xx) são repetidos. A sequência de
//! escritas de uma atribuição continua sendo executada uma vez por clique; o que
//! se repete é cada chamada individual dentro dela.

use crate::error::StoreError;
use crate::model::{Agent, Field, RowPosition, Ticket, TicketId};
use crate::store::{RecordStore, StoreResult};
use async_trait::async_trait;
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;

/// Intervalo entre tentativas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "tipo", rename_all = "snake_case")]
pub enum Backoff {
    Fixed {
        #[serde(with = "millis")]
        delay: Duration,
    },
    /// initial, initial + step, initial + 2*step, ...
    Linear {
        #[serde(with = "millis")]
        initial: Duration,
        #[serde(with = "millis")]
        step: Duration,
    },
    /// initial, 2*initial, 4*initial, ... limitado a `max`
    Exponential {
        #[serde(with = "millis")]
        initial: Duration,
        #[serde(with = "millis")]
        max: Duration,
    },
}

impl Backoff {
    /// Espera antes da tentativa `attempt + 1` (attempt começa em 1)
    pub fn delay(&self, attempt: u32) -> Duration {
        let n = attempt.saturating_sub(1);
        match *self {
            Backoff::Fixed { delay } => delay,
            Backoff::Linear { initial, step } => initial + step.saturating_mul(n),
            Backoff::Exponential { initial, max } => {
                let factor = 2u32.saturating_pow(n.min(16));
                initial.saturating_mul(factor).min(max)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Backoff::Exponential {
                initial: Duration::from_millis(500),
                max: Duration::from_secs(5),
            },
        }
    }
}

impl RetryPolicy {
    /// Política de conexão inicial: 5 tentativas, espera crescendo 2s a cada falha
    pub fn connect() -> Self {
        Self {
            max_attempts: 5,
            backoff: Backoff::Linear {
                initial: Duration::from_secs(2),
                step: Duration::from_secs(2),
            },
        }
    }

    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            backoff: Backoff::Fixed { delay: Duration::ZERO },
        }
    }

    /// Executa `op` até dar certo, falhar com erro permanente ou esgotar as tentativas
    pub async fn run<T, F, Fut>(&self, operation: &str, mut op: F) -> StoreResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = StoreResult<T>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::info!("✅ {} bem-sucedido após {} tentativa(s)", operation, attempt);
                    }
                    return Ok(value);
                }
                Err(e) if e.is_transient() && attempt < max_attempts => {
                    let wait = self.backoff.delay(attempt);
                    tracing::warn!(
                        "⚠️ Tentativa {}/{} de {} falhou: {}. Nova tentativa em {}ms...",
                        attempt,
                        max_attempts,
                        operation,
                        e,
                        wait.as_millis()
                    );
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
                Err(e) => {
                    if e.is_transient() {
                        tracing::error!(
                            "❌ Todas as {} tentativas de {} falharam: {}",
                            max_attempts,
                            operation,
                            e
                        );
                    }
                    return Err(e);
                }
            }
        }
    }
}

/// Decorador que aplica a mesma `RetryPolicy` a todas as chamadas do armazenamento
#[derive(Debug, Clone)]
pub struct RetryingStore<S> {
    inner: S,
    policy: RetryPolicy,
}

impl<S> RetryingStore<S> {
    pub fn new(inner: S, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: RecordStore> RecordStore for RetryingStore<S> {
    async fn read_all_rows(&self) -> StoreResult<Vec<Ticket>> {
        self.policy
            .run("leitura de chamados", || self.inner.read_all_rows())
            .await
    }

    async fn find_row_by_id(&self, id: &TicketId) -> StoreResult<RowPosition> {
        self.policy
            .run("busca de linha", || self.inner.find_row_by_id(id))
            .await
    }

    async fn update_field(&self, row: RowPosition, field: Field, value: &str) -> StoreResult<()> {
        self.policy
            .run("escrita de célula", || self.inner.update_field(row, field, value))
            .await
    }

    async fn list_roster(&self) -> StoreResult<Vec<Agent>> {
        self.policy
            .run("leitura de colaboradores", || self.inner.list_roster())
            .await
    }

    fn supports_conditional_writes(&self) -> bool {
        self.inner.supports_conditional_writes()
    }

    async fn update_field_if(
        &self,
        row: RowPosition,
        field: Field,
        expected: &str,
        value: &str,
    ) -> StoreResult<bool> {
        // Sem retentativa: um timeout pode ter gravado a célula, e a segunda
        // tentativa veria o valor novo e responderia `false` (conflito falso)
        self.inner.update_field_if(row, field, expected, value).await
    }
}

/// Durações em milissegundos na configuração
mod millis {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

/// Cache de snapshot com TTL para reduzir chamadas à planilha.
///
/// Toda escrita (atribuir/finalizar) deve chamar `invalidate` antes da próxima
/// leitura; a atribuição nunca lê daqui.
#[derive(Debug, Clone)]
pub struct SnapshotCache<T> {
    entry: Arc<RwLock<Option<CachedSnapshot<T>>>>,
    ttl: Duration,
}

#[derive(Debug, Clone)]
struct CachedSnapshot<T> {
    value: T,
    stored_at: Instant,
}

impl<T: Clone> SnapshotCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entry: Arc::new(RwLock::new(None)),
            ttl,
        }
    }

    /// Valor ainda válido, se houver
    pub async fn get(&self) -> Option<T> {
        let entry = self.entry.read().await;
        entry
            .as_ref()
            .filter(|cached| cached.stored_at.elapsed() < self.ttl)
            .map(|cached| cached.value.clone())
    }

    pub async fn put(&self, value: T) {
        *self.entry.write().await = Some(CachedSnapshot {
            value,
            stored_at: Instant::now(),
        });
    }

    pub async fn invalidate(&self) {
        *self.entry.write().await = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_after_ttl() {
        let cache = SnapshotCache::new(Duration::from_secs(10));
        assert_eq!(cache.get().await, None::<u32>);

        cache.put(7).await;
        tokio::time::advance(Duration::from_secs(9)).await;
        assert_eq!(cache.get().await, Some(7));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(cache.get().await, None);
    }

    #[tokio::test]
    async fn test_invalidate_clears_entry() {
        let cache = SnapshotCache::new(Duration::from_secs(60));
        cache.put(vec!["Ana".to_string()]).await;
        cache.invalidate().await;
        assert!(cache.get().await.is_none());
    }

    #[tokio::test]
    async fn test_zero_ttl_never_serves() {
        let cache = SnapshotCache::new(Duration::ZERO);
        cache.put(1).await;
        assert_eq!(cache.get().await, None);
    }
}

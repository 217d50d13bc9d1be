//! Process-wide handle to the record store.
//!
//! The store is opened on first use. Concurrent first callers wait on a
//! single connection attempt; a failed attempt leaves the client
//! unconnected so the next caller tries again.

use std::sync::Arc;

use tokio::sync::OnceCell;
use walletfolio_adapters::{AdapterError, ConnectOptions, DocumentStore, StoreConnector};

#[derive(Clone)]
pub struct StoreClient {
    cell: Arc<OnceCell<Arc<dyn DocumentStore>>>,
    connector: Arc<dyn StoreConnector>,
    options: Arc<ConnectOptions>,
}

impl StoreClient {
    pub fn new(connector: Arc<dyn StoreConnector>, options: ConnectOptions) -> Self {
        Self {
            cell: Arc::new(OnceCell::new()),
            connector,
            options: Arc::new(options),
        }
    }

    /// The connected store, connecting first if needed.
    pub async fn get(&self) -> Result<Arc<dyn DocumentStore>, AdapterError> {
        let store = self
            .cell
            .get_or_try_init(|| async {
                let timeout = self.options.connect_timeout;
                tracing::debug!(url = %self.options.url, "connecting to record store");
                let store = tokio::time::timeout(timeout, self.connector.connect(&self.options))
                    .await
                    .map_err(|_| AdapterError::Timeout(timeout.as_millis() as u64))
                    .and_then(|connected| connected)
                    .map_err(|err| {
                        tracing::warn!(error = %err, "record store connection failed");
                        err
                    })?;
                tracing::info!("record store connected");
                Ok::<_, AdapterError>(store)
            })
            .await?;
        Ok(Arc::clone(store))
    }

    pub fn is_connected(&self) -> bool {
        self.cell.initialized()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use walletfolio_adapters::MemoryConnector;

    /// Delays every connect so that concurrent callers overlap.
    struct Slow {
        inner: MemoryConnector,
        delay: Duration,
    }

    #[async_trait]
    impl StoreConnector for Slow {
        async fn connect(&self, options: &ConnectOptions) -> walletfolio_adapters::Result<Arc<dyn DocumentStore>> {
            tokio::time::sleep(self.delay).await;
            self.inner.connect(options).await
        }
    }

    /// Fails the first `failures` connects.
    struct Flaky {
        inner: MemoryConnector,
        failures: AtomicUsize,
    }

    #[async_trait]
    impl StoreConnector for Flaky {
        async fn connect(&self, options: &ConnectOptions) -> walletfolio_adapters::Result<Arc<dyn DocumentStore>> {
            let left = self.failures.load(Ordering::SeqCst);
            if left > 0 {
                self.failures.store(left - 1, Ordering::SeqCst);
                return Err(AdapterError::Connection("refused".into()));
            }
            self.inner.connect(options).await
        }
    }

    #[tokio::test]
    async fn test_concurrent_first_access_connects_once() {
        let connector = Arc::new(Slow {
            inner: MemoryConnector::new(Vec::new()),
            delay: Duration::from_millis(50),
        });
        let client = StoreClient::new(connector.clone(), ConnectOptions::new("memory://test"));

        let handles = (0..8)
            .map(|_| {
                let client = client.clone();
                tokio::spawn(async move { client.get().await.map(|_| ()) })
            })
            .collect::<Vec<_>>();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(connector.inner.connections(), 1);
        assert!(client.is_connected());
    }

    #[tokio::test]
    async fn test_failed_connect_is_retried() {
        let connector = Arc::new(Flaky {
            inner: MemoryConnector::new(Vec::new()),
            failures: AtomicUsize::new(1),
        });
        let client = StoreClient::new(connector.clone(), ConnectOptions::new("memory://test"));

        assert!(matches!(client.get().await, Err(AdapterError::Connection(_))));
        assert!(!client.is_connected());
        assert!(client.get().await.is_ok());
        assert_eq!(connector.inner.connections(), 1);
    }

    #[tokio::test]
    async fn test_connect_timeout() {
        let connector = Arc::new(Slow {
            inner: MemoryConnector::new(Vec::new()),
            delay: Duration::from_millis(200),
        });
        let mut options = ConnectOptions::new("memory://test");
        options.connect_timeout = Duration::from_millis(10);
        let client = StoreClient::new(connector, options);

        assert!(matches!(client.get().await, Err(AdapterError::Timeout(10))));
        assert!(!client.is_connected());
    }
}

use std::{sync::Arc, time::Duration};

use serde_json::Value;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FetchError {
    #[error("{0}")]
    AnyError(String),
    #[error("Request for `{resource_key}` timed out")]
    Timeout { resource_key: String },
}

impl FetchError {
    pub fn any(error: impl ToString) -> Self {
        FetchError::AnyError(error.to_string())
    }
}

pub type FetchResult<T> = Result<T, FetchError>;

/// A collaborator service records can be pulled from, one resource at a time.
#[async_trait::async_trait]
pub trait FetcherInner: Send + Sync {
    async fn fetch(&self, resource_key: &str) -> FetchResult<Value>;
}

#[derive(Clone)]
pub struct Fetcher {
    inner: Arc<dyn FetcherInner>,
    timeout: Option<Duration>,
}

impl Fetcher {
    pub fn new(fetcher: impl FetcherInner + 'static) -> Fetcher {
        Fetcher {
            inner: Arc::new(fetcher),
            timeout: None,
        }
    }

    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            ..self
        }
    }

    pub async fn fetch(&self, resource_key: &str) -> FetchResult<Value> {
        tracing::debug!(resource_key, "fetching from data source");

        let Some(timeout) = self.timeout else {
            return self.inner.fetch(resource_key).await;
        };

        let timeout = async {
            tokio::time::sleep(timeout).await;
            Err(FetchError::Timeout {
                resource_key: resource_key.to_string(),
            })
        };

        let execution = self.inner.fetch(resource_key);

        tokio::select! {
            result = timeout => { result }
            result = execution => { result }
        }
    }
}

impl std::fmt::Debug for Fetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fetcher").field("timeout", &self.timeout).finish_non_exhaustive()
    }
}

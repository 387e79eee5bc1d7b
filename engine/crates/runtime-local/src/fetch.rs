use runtime::fetch::{FetchError, FetchResult, Fetcher, FetcherInner};
use serde_json::Value;
use url::Url;

/// Pulls records over HTTP: a resource key `carData` is fetched with `GET <base_url>/carData`.
pub struct NativeFetcher {
    client: reqwest::Client,
    base_url: Url,
}

impl NativeFetcher {
    pub fn new(mut base_url: Url) -> Self {
        // Without a trailing slash `Url::join` would replace the last path segment.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    pub fn runtime_fetcher(base_url: Url) -> Fetcher {
        Fetcher::new(Self::new(base_url))
    }
}

#[async_trait::async_trait]
impl FetcherInner for NativeFetcher {
    async fn fetch(&self, resource_key: &str) -> FetchResult<Value> {
        let url = self.base_url.join(resource_key).map_err(FetchError::any)?;
        tracing::trace!(%url, "GET");

        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| FetchError::AnyError(e.to_string()))?;

        let response = response.error_for_status().map_err(FetchError::any)?;

        response.json::<Value>().await.map_err(FetchError::any)
    }
}

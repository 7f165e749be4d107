use crate::application::ports::ConnectivityProbe;
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, Url, header};
use std::time::Duration;

/// HEAD request against a same-origin resource, cache-busted per probe.
pub struct HttpConnectivityProbe {
    client: Client,
    url: Url,
}

impl HttpConnectivityProbe {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, AppError> {
        let url = Url::parse(url)
            .map_err(|err| AppError::ConfigurationError(format!("Invalid probe URL: {err}")))?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| AppError::ConfigurationError(err.to_string()))?;
        Ok(Self { client, url })
    }

    fn cache_busted_url(&self) -> Url {
        let mut url = self.url.clone();
        url.query_pairs_mut()
            .append_pair("_", &Utc::now().timestamp_millis().to_string());
        url
    }
}

#[async_trait]
impl ConnectivityProbe for HttpConnectivityProbe {
    async fn probe(&self) -> bool {
        let result = self
            .client
            .head(self.cache_busted_url())
            .header(header::CACHE_CONTROL, "no-store")
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                tracing::debug!(
                    target: "offline::connectivity",
                    status = %response.status(),
                    "connectivity probe returned non-success status"
                );
                false
            }
            Err(err) => {
                tracing::debug!(
                    target: "offline::connectivity",
                    error = %err,
                    "connectivity probe failed"
                );
                false
            }
        }
    }
}

use super::DocumentSink;
use crate::config::Config;
use crate::error::DeliveryError;
use crate::models::LogDocument;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode, Url};
use std::time::Duration;

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Characters Elasticsearch rejects in index names.
const FORBIDDEN_INDEX_CHARS: [char; 11] = ['\\', '/', '*', '?', '"', '<', '>', '|', ',', '#', ' '];

#[derive(Clone, Debug)]
struct Endpoint {
    client: Client,
    url: Url,
}

/// Posts each document to `{base_url}/{index}/_doc`.
///
/// A sink whose endpoint cannot be established at construction time is
/// disabled: `send` then succeeds immediately without touching the network.
#[derive(Clone, Debug)]
pub struct ElasticsearchSink {
    endpoint: Option<Endpoint>,
}

impl ElasticsearchSink {
    pub fn new(config: &Config) -> Self {
        Self::with_timeout(&config.base_url, &config.index_name, REQUEST_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, index_name: &str, timeout: Duration) -> Self {
        match Self::connect(base_url, index_name, timeout) {
            Ok(endpoint) => {
                tracing::debug!("Elasticsearch sink targeting {}", endpoint.url);
                Self {
                    endpoint: Some(endpoint),
                }
            }
            Err(reason) => {
                tracing::warn!("[Elasticsearch] Sink disabled: {}", reason);
                Self::disabled()
            }
        }
    }

    pub fn disabled() -> Self {
        Self { endpoint: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.endpoint.is_some()
    }

    pub fn url(&self) -> Option<&Url> {
        self.endpoint.as_ref().map(|endpoint| &endpoint.url)
    }

    fn connect(
        base_url: &str,
        index_name: &str,
        timeout: Duration,
    ) -> std::result::Result<Endpoint, String> {
        let index_name = index_name.trim();
        if index_name.is_empty() {
            return Err("index name is empty".to_string());
        }
        if let Some(c) = index_name.chars().find(|c| FORBIDDEN_INDEX_CHARS.contains(c)) {
            return Err(format!("index name '{}' contains '{}'", index_name, c));
        }

        let mut url = Url::parse(base_url.trim())
            .map_err(|e| format!("invalid base url '{}': {}", base_url, e))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(format!(
                "unsupported scheme '{}' in base url '{}'",
                url.scheme(),
                base_url
            ));
        }
        if url.query().is_some() || url.fragment().is_some() {
            return Err(format!(
                "base url '{}' must not carry a query or fragment",
                base_url
            ));
        }
        url.path_segments_mut()
            .map_err(|_| format!("base url '{}' cannot hold a path", base_url))?
            .pop_if_empty()
            .push(index_name)
            .push("_doc");

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| format!("failed to build HTTP client: {}", e))?;

        Ok(Endpoint { client, url })
    }
}

impl DocumentSink for ElasticsearchSink {
    async fn send(&self, document: &LogDocument) -> Result<(), DeliveryError> {
        let Some(endpoint) = &self.endpoint else {
            return Ok(());
        };

        let body = serde_json::to_vec(document)?;
        let response = endpoint
            .client
            .post(endpoint.url.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK | StatusCode::CREATED => Ok(()),
            status => Err(DeliveryError::Status(status.as_u16())),
        }
    }
}

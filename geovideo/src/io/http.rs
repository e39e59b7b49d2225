use std::time::Duration;

use bytes::Bytes;

use super::Transport;

pub use reqwest::StatusCode;
pub use reqwest::header::{HeaderMap, HeaderValue};

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error(transparent)]
    Request(#[from] reqwest::Error),

    #[error("server responded with {0}")]
    Status(StatusCode),

    #[error("server responded with an empty body")]
    EmptyBody,
}

/// [`Transport`] backed by a `reqwest` client. Cloning is cheap and shares the connection pool.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Every request, including reading the body, must complete within `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    async fn get(&self, url: &str, headers: HeaderMap) -> Result<Bytes, TransportError> {
        let response = self.client.get(url).headers(headers).send().await?;

        log::debug!("Downloaded {:?} from {url}.", response.status());

        if !response.status().is_success() {
            return Err(TransportError::Status(response.status()));
        }

        let body = response.bytes().await?;
        if body.is_empty() {
            return Err(TransportError::EmptyBody);
        }

        Ok(body)
    }
}

//! HTTP transport seam for the prober

use super::{ProbeMethod, ProbeRequest};
use async_trait::async_trait;
use reqwest::{header, Client, Method};
use std::error::Error as StdError;
use thiserror::Error;

/// A response as the wire delivered it, before interpretation
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    /// Reason phrase, if the status has one
    pub reason: Option<String>,
    /// Header pairs in arrival order, names not yet normalized
    pub headers: Vec<(String, String)>,
    /// Body text, or the error hit while reading it
    pub body: Result<String, TransportError>,
}

/// A failure below HTTP. The message carries the whole source chain so
/// classification can look at every layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct TransportError {
    pub message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Flatten an error and its sources into one message
    pub fn from_chain(err: &(dyn StdError + 'static)) -> Self {
        let mut message = err.to_string();
        let mut source = err.source();
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        Self { message }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        Self::from_chain(&err)
    }
}

/// Sends one probe request
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: &ProbeRequest) -> Result<RawResponse, TransportError>;
}

/// reqwest-backed transport. No cookie store and no auth headers, so
/// credentials are never sent to the probed endpoint.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, TransportError> {
        let client = Client::builder()
            .user_agent(concat!("compass-probe/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: &ProbeRequest) -> Result<RawResponse, TransportError> {
        let method = match request.method {
            ProbeMethod::Get => Method::GET,
            ProbeMethod::Post => Method::POST,
            ProbeMethod::Options => Method::OPTIONS,
        };

        let mut builder = self.client.request(method, &request.url);
        if request.method != ProbeMethod::Get {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
        }
        if let Some(origin) = &request.origin {
            builder = builder.header(header::ORIGIN, origin);
            if request.method == ProbeMethod::Options {
                builder = builder.header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST");
            }
        }
        if let Some(body) = &request.json_body {
            builder = builder.body(body.to_string());
        }

        let response = builder.send().await?;

        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();

        Ok(RawResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().map(str::to_string),
            headers,
            body: response.text().await.map_err(TransportError::from),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;

    #[derive(Debug)]
    struct Outer(Inner);
    #[derive(Debug)]
    struct Inner;

    impl fmt::Display for Outer {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("error sending request")
        }
    }
    impl fmt::Display for Inner {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("connection refused")
        }
    }
    impl StdError for Outer {
        fn source(&self) -> Option<&(dyn StdError + 'static)> {
            Some(&self.0)
        }
    }
    impl StdError for Inner {}

    #[test]
    fn test_chain_is_flattened() {
        let err = TransportError::from_chain(&Outer(Inner));
        assert_eq!(err.message, "error sending request: connection refused");
    }
}

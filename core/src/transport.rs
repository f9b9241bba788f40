//! Blocking execution of `HttpRequest` values.
//!
//! # Design
//! `Transport` is the seam between the pure `PodClient` and the network.
//! Status codes are never errors at this layer: a 404 or 500 comes back as
//! an `HttpResponse` and the client decides what it means. Only exchanges
//! that fail to complete (connect, timeout, bad URL, non-UTF-8 body) are
//! `Err`.

use std::time::Duration;

use tracing::trace;

use crate::config::DEFAULT_TIMEOUT_SECS;
use crate::error::PodError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Performs one blocking request/response exchange.
pub trait Transport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, PodError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, PodError> {
        (**self).execute(request)
    }
}

/// `Transport` over a `ureq` agent.
///
/// The agent keeps connections alive between calls; every exchange is still
/// independent and bounded by the configured timeout.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, PodError> {
        trace!(method = request.method.as_str(), url = %request.url, "executing request");

        let result = match request.method {
            HttpMethod::Get => {
                let mut builder = self.agent.get(&request.url);
                for (name, value) in &request.headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                builder.call()
            }
            HttpMethod::Head => {
                let mut builder = self.agent.head(&request.url);
                for (name, value) in &request.headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                builder.call()
            }
            HttpMethod::Put => {
                let mut builder = self.agent.put(&request.url);
                for (name, value) in &request.headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                match &request.body {
                    Some(body) => builder.send(body.as_bytes()),
                    None => builder.send_empty(),
                }
            }
        };
        let mut response = result.map_err(|e| PodError::transport(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = if request.method == HttpMethod::Head {
            String::new()
        } else {
            let bytes = response
                .body_mut()
                .read_to_vec()
                .map_err(|e| PodError::transport(e.to_string()))?;
            String::from_utf8(bytes).map_err(|e| PodError::Decode {
                message: e.to_string(),
            })?
        };

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

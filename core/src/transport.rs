//! The seam where an `HttpRequest` turns into an `HttpResponse`.
//!
//! Hosts that own their own networking (mobile apps through the C ABI) never
//! touch this module; they execute requests themselves and hand the result
//! to `BookListClient::complete`. Rust hosts implement `Transport`, or use
//! the blocking `UreqTransport`.

use std::time::Duration;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::settings::ClientSettings;

/// Executes one request. Any response, whatever its status, is `Ok`; `Err`
/// is reserved for failures where no response arrived, reported as
/// `ApiError::Transport`.
pub trait Transport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        (**self).execute(request)
    }
}

/// Blocking transport backed by a `ureq` agent.
///
/// ureq's status-as-error behavior is turned off so 4xx/5xx responses come
/// back as data and the core decides what they mean.
#[derive(Clone)]
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

    pub fn from_settings(settings: &ClientSettings) -> Self {
        Self::new(settings.timeout())
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::from_settings(&ClientSettings::default())
    }
}

fn with_headers<B>(
    mut builder: ureq::RequestBuilder<B>,
    request: &HttpRequest,
) -> ureq::RequestBuilder<B> {
    for (key, value) in &request.headers {
        builder = builder.header(key.as_str(), value.as_str());
    }
    builder
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        let body = request.body.as_deref().unwrap_or("");
        let result = match request.method {
            HttpMethod::Get => with_headers(self.agent.get(&request.path), request).call(),
            HttpMethod::Delete => with_headers(self.agent.delete(&request.path), request).call(),
            HttpMethod::Post => {
                with_headers(self.agent.post(&request.path), request).send(body.as_bytes())
            }
            HttpMethod::Put => {
                with_headers(self.agent.put(&request.path), request).send(body.as_bytes())
            }
        };

        let mut response = result.map_err(|e| ApiError::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    value.to_str().unwrap_or_default().to_string(),
                )
            })
            .collect();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        tracing::trace!(method = request.method.as_str(), path = %request.path, status, "http round-trip");
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

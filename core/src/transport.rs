//! Executes `HttpRequest` values over the network.
//!
//! # Design
//! `Transport` is the only I/O seam of the crate. `UreqTransport` drives a
//! blocking `ureq` agent on tokio's blocking pool so an in-flight request
//! never occupies an async worker. Status codes are returned as data; status
//! interpretation stays in `SquatchClient::parse_*`.

use std::future::Future;

use crate::error::TransportError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Performs exactly one HTTP round-trip per call.
pub trait Transport: Send + Sync + 'static {
    fn execute(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send;
}

/// Default transport backed by `ureq`.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn execute(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send {
        let agent = self.agent.clone();
        async move { tokio::task::spawn_blocking(move || execute_blocking(&agent, request)).await? }
    }
}

fn execute_blocking(
    agent: &ureq::Agent,
    request: HttpRequest,
) -> Result<HttpResponse, TransportError> {
    let HttpRequest {
        method,
        url,
        headers,
        body,
    } = request;

    let mut builder = match method {
        HttpMethod::Post => agent.post(&url),
        HttpMethod::Put => agent.put(&url),
    };
    for (key, value) in &headers {
        builder = builder.header(key, value);
    }
    let mut response = match body {
        Some(body) => builder.send(body.as_bytes())?,
        None => builder.send_empty()?,
    };

    let status = response.status().as_u16();
    let headers = response
        .headers()
        .iter()
        .filter_map(|(key, value)| {
            Some((key.as_str().to_string(), value.to_str().ok()?.to_string()))
        })
        .collect();
    let body = response.body_mut().read_to_string()?;

    Ok(HttpResponse { status, headers, body })
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! reqwest-backed [`Transport`].

use std::time::Duration;

use reqwest::Client;

use crate::error::{TransportError, TransportErrorKind};
use crate::transport::{HttpRequest, HttpResponse, Transport, TransportFuture};

/// HTTP transport over a shared reqwest client.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Self {
        ensure_crypto();
        let client = Client::builder().timeout(timeout).build().unwrap_or_default();
        Self { client }
    }

    fn url(base_url: &str, path: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
    }

    async fn execute(
        &self,
        base_url: &str,
        request: HttpRequest,
    ) -> Result<HttpResponse, TransportError> {
        let url = Self::url(base_url, &request.path);
        let mut req = self.client.request(request.method.clone(), &url);
        if !request.query.is_empty() {
            req = req.query(&request.query);
        }
        for (name, value) in &request.headers {
            req = req.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            req = req.body(body);
        }

        tracing::trace!(method = %request.method, %url, "sending request");
        let resp = req.send().await.map_err(map_reqwest_error)?;
        let status = resp.status().as_u16();
        let body = resp.bytes().await.map_err(map_reqwest_error)?;
        tracing::trace!(status, %url, "received response");
        Ok(HttpResponse { status, body })
    }
}

impl Transport for HttpTransport {
    fn send<'a>(&'a self, base_url: &'a str, request: HttpRequest) -> TransportFuture<'a> {
        Box::pin(self.execute(base_url, request))
    }
}

fn map_reqwest_error(e: reqwest::Error) -> TransportError {
    let kind = if e.is_timeout() {
        TransportErrorKind::Timeout
    } else if e.is_connect() {
        TransportErrorKind::Connect
    } else if e.is_builder() {
        TransportErrorKind::InvalidRequest
    } else {
        TransportErrorKind::Other
    };
    TransportError::new(kind, e.to_string())
}

/// Install the ring crypto provider for reqwest/rustls.
///
/// Only the first call has effect.
pub fn ensure_crypto() {
    static CRYPTO_INIT: std::sync::Once = std::sync::Once::new();
    CRYPTO_INIT.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

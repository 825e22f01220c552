use std::collections::HashMap;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use reqwest::{Client, RequestBuilder};
use tracing::{debug, warn};

use super::traits::{is_acceptable_status, PackageSource, ProgressFn};
use crate::error::LoadError;

/// Cap on the buffer reserved up front from the advertised package size (256 MB).
const MAX_PREALLOC_BYTES: u64 = 256 * 1024 * 1024;

pub struct HttpSource {
    client: Client,
    headers: HashMap<String, String>,
}

impl HttpSource {
    pub fn new(headers: HashMap<String, String>) -> Self {
        Self {
            client: Client::new(),
            headers,
        }
    }

    pub fn with_client(client: Client, headers: HashMap<String, String>) -> Self {
        Self { client, headers }
    }

    /// Plain GET with the custom headers. Never a Range request.
    fn build_request(&self, url: &str) -> RequestBuilder {
        let mut req = self.client.get(url);
        for (k, v) in &self.headers {
            req = req.header(k.as_str(), v.as_str());
        }
        req
    }
}

impl Default for HttpSource {
    fn default() -> Self {
        Self::new(HashMap::new())
    }
}

#[async_trait]
impl PackageSource for HttpSource {
    async fn fetch(
        &self,
        url: &str,
        expected_size: u64,
        on_progress: &ProgressFn,
    ) -> Result<Bytes, LoadError> {
        let mut resp = self
            .build_request(url)
            .send()
            .await
            .map_err(|e| LoadError::network(url, e))?;

        let status = resp.status();
        debug!("http package status={} url={}", status.as_u16(), url);
        // HTTP never yields status 0, so the body length does not matter here.
        if !is_acceptable_status(status.as_u16(), 0) {
            warn!("http package fetch failed status={} url={}", status.as_u16(), url);
            return Err(LoadError::network(
                url,
                format!(
                    "HTTP {} {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("")
                ),
            ));
        }

        let mut body = BytesMut::with_capacity(expected_size.min(MAX_PREALLOC_BYTES) as usize);
        on_progress(0, expected_size);
        while let Some(chunk) = resp.chunk().await.map_err(|e| LoadError::network(url, e))? {
            body.extend_from_slice(&chunk);
            on_progress(body.len() as u64, expected_size);
        }

        if body.len() as u64 != expected_size {
            warn!(
                "package size mismatch url={} expected={} received={}",
                url,
                expected_size,
                body.len()
            );
        }
        Ok(body.freeze())
    }
}

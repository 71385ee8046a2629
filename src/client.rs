//! Async HTTP client wrapping reqwest.
//!
//! Not a browser — just HTTP requests carrying the fixed header set a real
//! browser sends to the codes endpoint. There are no retries anywhere:
//! every request gets exactly one attempt, and the caller decides what a
//! failure means.

use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue};
use std::time::Duration;

use crate::boundary;

/// Default code submission endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://codes.thisisnotawebsitedotcom.com/";

/// Referer/Origin site the endpoint expects submissions to come from.
const SITE: &str = "https://thisisnotawebsitedotcom.com";

/// Static Firefox user agent sent on every request.
const USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:129.0) Gecko/20100101 Firefox/129.0";

/// HTTP client for code submissions and asset fetches.
#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpClient {
    /// Create a client that submits codes to `endpoint` with the given
    /// per-request timeout.
    pub fn new(endpoint: &str, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_default();

        Self {
            client,
            endpoint: endpoint.to_string(),
            timeout,
        }
    }

    /// The configured submission endpoint.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Submit one candidate code as a single-field multipart form.
    ///
    /// The body is framed by hand with a fresh boundary so the request
    /// matches what the site's own form produces byte-for-byte, modulo the
    /// random boundary digits.
    pub async fn submit_code(&self, code: &str) -> Result<reqwest::Response> {
        let marker = boundary::marker();
        let body = format!(
            "{marker}\r\nContent-Disposition: form-data; name=\"code\"\r\n\r\n{code}\r\n{marker}--"
        );
        let content_type = format!(
            "multipart/form-data; boundary={}",
            boundary::header_param(&marker)
        );

        let resp = self
            .client
            .post(&self.endpoint)
            .headers(browser_headers())
            .header("content-type", content_type)
            .body(body)
            .timeout(self.timeout)
            .send()
            .await
            .with_context(|| format!("code submission to {} failed", self.endpoint))?;

        Ok(resp)
    }

    /// Plain GET for an asset URL discovered inside a returned page.
    ///
    /// The caller inspects the status and reads the body buffered or in
    /// chunks; a transport error surfaces here, a non-200 does not.
    pub async fn get(&self, url: &str) -> Result<reqwest::Response> {
        let resp = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .with_context(|| format!("GET {url} failed"))?;
        Ok(resp)
    }
}

/// The fixed browser-mimicking header set for code submissions.
///
/// `Host`, `Connection`, and `Accept-Encoding` are left to reqwest so that
/// connection reuse and transparent decompression keep working; everything
/// else matches the site's own form submission.
fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("referer", HeaderValue::from_static("https://thisisnotawebsitedotcom.com/"));
    headers.insert("origin", HeaderValue::from_static(SITE));
    headers.insert("dnt", HeaderValue::from_static("1"));
    headers.insert("sec-fetch-dest", HeaderValue::from_static("empty"));
    headers.insert("sec-fetch-mode", HeaderValue::from_static("no-cors"));
    headers.insert("sec-fetch-site", HeaderValue::from_static("same-site"));
    headers.insert("accept", HeaderValue::from_static("*/*"));
    headers.insert("accept-language", HeaderValue::from_static("en-US,en;q=0.5"));
    headers.insert("priority", HeaderValue::from_static("u=0"));
    headers.insert("pragma", HeaderValue::from_static("no-cache"));
    headers.insert("cache-control", HeaderValue::from_static("no-cache"));
    headers
}

// src/net/client.rs
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use super::identity::IdentityProfile;

/// Status line and decoded body of one HTTP exchange.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: String,
}

impl Response {
    pub fn ok(body: impl Into<String>) -> Self {
        Self { status: 200, body: body.into() }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("request failed: {0}")]
    Request(String),
    #[error("failed to read body: {0}")]
    Body(String),
}

/// One GET with a given identity. Status codes are *returned*, not judged; the
/// transport decides what counts as failure.
pub trait HttpGet {
    fn get(&self, url: &str, profile: &IdentityProfile, timeout: Duration) -> Result<Response, TransportError>;
}

/// Production client: one pooled `reqwest` client, headers applied per request.
pub struct ReqwestClient {
    client: Client,
}

impl ReqwestClient {
    pub fn new() -> crate::Result<Self> {
        let client = Client::builder()
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;
        Ok(Self { client })
    }
}

impl HttpGet for ReqwestClient {
    fn get(&self, url: &str, profile: &IdentityProfile, timeout: Duration) -> Result<Response, TransportError> {
        let resp = self
            .client
            .get(url)
            .headers(header_map(profile))
            .timeout(timeout)
            .send()
            .map_err(classify)?;

        let status = resp.status().as_u16();
        let body = resp.text().map_err(|e| TransportError::Body(e.to_string()))?;
        Ok(Response { status, body })
    }
}

fn header_map(profile: &IdentityProfile) -> HeaderMap {
    let mut map = HeaderMap::with_capacity(profile.headers.len());
    for (k, v) in &profile.headers {
        match (HeaderName::from_bytes(k.as_bytes()), HeaderValue::from_str(v)) {
            (Ok(name), Ok(value)) => {
                map.insert(name, value);
            }
            _ => logd!(profile = %profile.name, header = %k, "skipping unencodable header"),
        }
    }
    map
}

fn classify(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout
    } else if e.is_connect() {
        TransportError::Connect(e.to_string())
    } else {
        TransportError::Request(e.to_string())
    }
}

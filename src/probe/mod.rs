//! HTTP probing of deployed endpoints.
//!
//! A [`Prober`] performs a single request and reports the status code and
//! body. [`HttpProber`] is the real implementation backed by `reqwest`;
//! tests substitute a scripted prober. Expectations are evaluated by
//! [`Check`], which never retries.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use thiserror::Error;

mod check;

pub use check::{Check, CheckOutcome, CheckReport, StatusExpectation};

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP methods issued by the checks.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProbeMethod {
    /// `GET`
    Get,
    /// `POST` with an empty body.
    Post,
}

impl fmt::Display for ProbeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => f.write_str("GET"),
            Self::Post => f.write_str("POST"),
        }
    }
}

/// A single request to send.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProbeRequest {
    /// Method to use.
    pub method: ProbeMethod,
    /// Absolute URL to target.
    pub url: String,
}

impl ProbeRequest {
    /// Builds a `GET` request.
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: ProbeMethod::Get,
            url: url.into(),
        }
    }

    /// Builds a `POST` request with an empty body.
    #[must_use]
    pub fn post(url: impl Into<String>) -> Self {
        Self {
            method: ProbeMethod::Post,
            url: url.into(),
        }
    }
}

/// Status and body observed for one request.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProbeResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body decoded as text.
    pub body: String,
}

/// Transport-level failures. These end the check that triggered them.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ProbeError {
    /// Raised when the HTTP client cannot be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(String),
    /// Raised when the request does not complete within the timeout.
    #[error("request to {url} timed out after {timeout:?}")]
    Timeout {
        /// Target URL.
        url: String,
        /// Configured timeout.
        timeout: Duration,
    },
    /// Raised when no connection can be established.
    #[error("failed to connect to {url}: {message}")]
    Connect {
        /// Target URL.
        url: String,
        /// Underlying client error.
        message: String,
    },
    /// Raised for any other transport failure.
    #[error("request to {url} failed: {message}")]
    Transport {
        /// Target URL.
        url: String,
        /// Underlying client error.
        message: String,
    },
}

/// Future returned by [`Prober::send`].
pub type ProbeFuture<'a> =
    Pin<Box<dyn Future<Output = Result<ProbeResponse, ProbeError>> + Send + 'a>>;

/// Sends one HTTP request and reports what came back.
pub trait Prober {
    /// Performs `request` and returns the observed status and body.
    fn send<'a>(&'a self, request: &'a ProbeRequest) -> ProbeFuture<'a>;
}

/// `reqwest`-backed prober with a fixed timeout.
#[derive(Clone, Debug)]
pub struct HttpProber {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpProber {
    /// Builds a prober whose requests fail after `timeout`.
    ///
    /// When `accept_invalid_certs` is set, TLS certificate validation is
    /// skipped; load balancers provisioned for tests typically serve
    /// self-managed certificates.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::Client`] when the TLS backend cannot be
    /// initialised.
    pub fn new(timeout: Duration, accept_invalid_certs: bool) -> Result<Self, ProbeError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(accept_invalid_certs)
            .build()
            .map_err(|err| ProbeError::Client(err.to_string()))?;
        Ok(Self { client, timeout })
    }

    fn classify(&self, url: &str, err: &reqwest::Error) -> ProbeError {
        if err.is_timeout() {
            return ProbeError::Timeout {
                url: url.to_owned(),
                timeout: self.timeout,
            };
        }
        if err.is_connect() {
            return ProbeError::Connect {
                url: url.to_owned(),
                message: err.to_string(),
            };
        }
        ProbeError::Transport {
            url: url.to_owned(),
            message: err.to_string(),
        }
    }
}

impl Prober for HttpProber {
    fn send<'a>(&'a self, request: &'a ProbeRequest) -> ProbeFuture<'a> {
        Box::pin(async move {
            let builder = match request.method {
                ProbeMethod::Get => self.client.get(&request.url),
                ProbeMethod::Post => self.client.post(&request.url).body(""),
            };
            let response = builder
                .send()
                .await
                .map_err(|err| self.classify(&request.url, &err))?;
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .map_err(|err| self.classify(&request.url, &err))?;
            Ok(ProbeResponse { status, body })
        })
    }
}

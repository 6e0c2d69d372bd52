//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the ingestor, including:
//! - Building HTTP clients with the configured user agent and timeout
//! - Attaching cache validators as conditional headers
//! - Classifying responses into fresh / not-modified / failed

use crate::config::UserAgentConfig;
use crate::crawler::outcome::{FailureReason, FetchOutcome};
use crate::state::Validators;
use reqwest::header::{HeaderMap, ETAG, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED};
use reqwest::{Client, StatusCode};
use std::time::Duration;

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout` - Total per-request timeout, covering the body read
///
/// # Example
///
/// ```no_run
/// use document_ingestor::config::UserAgentConfig;
/// use document_ingestor::crawler::build_http_client;
/// use std::time::Duration;
///
/// let client = build_http_client(&UserAgentConfig::default(), Duration::from_secs(30)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Issues one conditional GET for `url`
///
/// # Request Flow
///
/// 1. Attach `If-None-Match` when `validators.etag` is set
/// 2. Attach `If-Modified-Since` when `validators.last_modified` is set
/// 3. Classify the response
///
/// | Condition | Outcome |
/// |-----------|---------|
/// | HTTP 200 | `Fresh` with body and response validators |
/// | HTTP 304 | `NotModified`, body not read |
/// | Any other status | `Failed(BadStatus)` |
/// | Timeout | `Failed(Timeout)` |
/// | Connection / DNS / TLS error | `Failed(Transport)` |
/// | Undecodable body or validator header | `Failed(MalformedResponse)` |
///
/// This function never returns an error: every failure is an outcome.
pub async fn fetch_url(client: &Client, url: &str, validators: &Validators) -> FetchOutcome {
    let mut request = client.get(url);
    if let Some(etag) = &validators.etag {
        request = request.header(IF_NONE_MATCH, etag);
    }
    if let Some(last_modified) = &validators.last_modified {
        request = request.header(IF_MODIFIED_SINCE, last_modified);
    }

    let response = match request.send().await {
        Ok(response) => response,
        Err(e) => return FetchOutcome::Failed(classify_error(&e)),
    };

    match response.status() {
        StatusCode::NOT_MODIFIED => FetchOutcome::NotModified,
        StatusCode::OK => {
            let validators = match response_validators(response.headers()) {
                Ok(validators) => validators,
                Err(reason) => return FetchOutcome::Failed(reason),
            };

            match response.bytes().await {
                Ok(body) => FetchOutcome::Fresh {
                    bytes: body.to_vec(),
                    validators,
                },
                Err(e) if e.is_timeout() => FetchOutcome::Failed(FailureReason::Timeout),
                Err(e) if e.is_decode() || e.is_body() => {
                    FetchOutcome::Failed(FailureReason::MalformedResponse(e.to_string()))
                }
                Err(e) => FetchOutcome::Failed(FailureReason::Transport(e.to_string())),
            }
        }
        status => FetchOutcome::Failed(FailureReason::BadStatus {
            status: status.as_u16(),
        }),
    }
}

/// Reads `ETag` / `Last-Modified` from a response
fn response_validators(headers: &HeaderMap) -> Result<Validators, FailureReason> {
    let read = |name: reqwest::header::HeaderName| -> Result<Option<String>, FailureReason> {
        match headers.get(&name) {
            Some(value) => value
                .to_str()
                .map(|v| Some(v.to_string()))
                .map_err(|_| {
                    FailureReason::MalformedResponse(format!("{} header is not valid ASCII", name))
                }),
            None => Ok(None),
        }
    };

    Ok(Validators::new(read(ETAG)?, read(LAST_MODIFIED)?))
}

/// Maps a request error to a failure reason
fn classify_error(e: &reqwest::Error) -> FailureReason {
    if e.is_timeout() {
        FailureReason::Timeout
    } else if e.is_builder() {
        FailureReason::InvalidUrl(e.to_string())
    } else {
        FailureReason::Transport(e.to_string())
    }
}

//! Steam workshop client
//!
//! Looks up a published file through the Steam Web API and downloads the
//! file it points at. Requests are blocking.

mod types;

pub use types::{
    PublishedFileDetails, PublishedFileDetailsResponse, PublishedFileDetailsResult, RESULT_OK, Tag,
};

use std::io::{self, Write};
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};
use ureq::Body;
use ureq::http::Response;

use crate::config::Config;
use crate::error::{Error, Result};

const DETAILS_ENDPOINT: &str = "ISteamRemoteStorage/GetPublishedFileDetails/v1/";
const INITIAL_BACKOFF_MS: u64 = 100;
const MAX_BACKOFF_MS: u64 = 5000;

/// Backoff bookkeeping for one request.
struct RetryState {
    attempt: u32,
    max_attempts: u32,
    backoff_ms: u64,
}

impl RetryState {
    fn new(max_attempts: u32) -> Self {
        Self {
            attempt: 0,
            max_attempts: max_attempts.max(1),
            backoff_ms: INITIAL_BACKOFF_MS,
        }
    }

    fn can_retry(&self) -> bool {
        self.attempt < self.max_attempts - 1
    }

    fn increment(&mut self) {
        self.attempt += 1;
        self.backoff_ms = (self.backoff_ms * 2).min(MAX_BACKOFF_MS);
    }

    /// Retry-After (seconds) if the server sent one, else the current backoff.
    fn delay_for(&self, response: &Response<Body>) -> u64 {
        response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<u64>().ok())
            .map(|secs| secs.saturating_mul(1000).min(MAX_BACKOFF_MS))
            .unwrap_or(self.backoff_ms)
    }

    fn wait(&self, delay_ms: u64) {
        thread::sleep(Duration::from_millis(delay_ms));
    }
}

/// Errors worth another attempt: the request never got a usable answer.
fn is_transient(error: &ureq::Error) -> bool {
    match error {
        ureq::Error::StatusCode(code) => is_transient_status(*code),
        ureq::Error::Timeout(_) | ureq::Error::ConnectionFailed | ureq::Error::HostNotFound => {
            true
        }
        ureq::Error::Io(e) => matches!(
            e.kind(),
            io::ErrorKind::ConnectionReset
                | io::ErrorKind::ConnectionAborted
                | io::ErrorKind::TimedOut
                | io::ErrorKind::UnexpectedEof
        ),
        _ => false,
    }
}

fn is_transient_status(code: u16) -> bool {
    code == 429 || (500..600).contains(&code)
}

pub struct WorkshopClient {
    agent: ureq::Agent,
    base_url: String,
    user_agent: String,
    max_retries: u32,
}

impl WorkshopClient {
    pub fn new(config: &Config) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(config.http_timeout()))
            .http_status_as_error(false)
            .build()
            .into();

        Self {
            agent,
            base_url: config.steam_api_url.trim_end_matches('/').to_string(),
            user_agent: format!(
                "centrifuge/{} ({})",
                env!("CARGO_PKG_VERSION"),
                std::env::consts::OS
            ),
            max_retries: config.max_retries,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send a request, retrying rate limits, server errors and connection failures.
    fn with_retry<F>(&self, what: &str, request_fn: F) -> Result<Response<Body>>
    where
        F: Fn() -> std::result::Result<Response<Body>, ureq::Error>,
    {
        let mut state = RetryState::new(self.max_retries);

        loop {
            match request_fn() {
                Ok(response) => {
                    let status = response.status().as_u16();
                    if response.status().is_success() {
                        return Ok(response);
                    }
                    if !is_transient_status(status) || !state.can_retry() {
                        return Err(ureq::Error::StatusCode(status).into());
                    }

                    let delay = state.delay_for(&response);
                    warn!(
                        "{}: HTTP {} (attempt {}/{}), retrying in {}ms",
                        what,
                        status,
                        state.attempt + 1,
                        state.max_attempts,
                        delay
                    );
                    state.wait(delay);
                    state.increment();
                }
                Err(e) if is_transient(&e) && state.can_retry() => {
                    warn!(
                        "{}: {} (attempt {}/{}), retrying in {}ms",
                        what,
                        e,
                        state.attempt + 1,
                        state.max_attempts,
                        state.backoff_ms
                    );
                    state.wait(state.backoff_ms);
                    state.increment();
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Fetch the published file details for one workshop item.
    pub fn file_details(&self, workshop_id: u64) -> Result<PublishedFileDetailsResponse> {
        let url = format!("{}/{}", self.base_url, DETAILS_ENDPOINT);
        let id = workshop_id.to_string();
        debug!("Requesting file details for {} from {}", workshop_id, url);

        let mut response = self.with_retry("file details", || {
            self.agent
                .post(&url)
                .header("User-Agent", &self.user_agent)
                .send_form([("itemcount", "1"), ("publishedfileids[0]", id.as_str())])
        })?;

        let details: PublishedFileDetailsResponse = response.body_mut().read_json()?;
        Ok(details)
    }

    /// Download URL of a workshop item.
    pub fn file_url(&self, workshop_id: u64) -> Result<String> {
        let details = self.file_details(workshop_id)?;
        details
            .response
            .details
            .first()
            .and_then(|d| d.download_url())
            .map(str::to_string)
            .ok_or(Error::WorkshopItemNotFound(workshop_id))
    }

    /// Stream a workshop item into `writer`, returning the number of bytes written.
    ///
    /// Only the requests are retried: once bytes reach `writer` a failure is final.
    pub fn download<W: Write + ?Sized>(&self, workshop_id: u64, writer: &mut W) -> Result<u64> {
        let file_url = self.file_url(workshop_id)?;
        info!("Downloading workshop item {} from {}", workshop_id, file_url);

        let mut response = self.with_retry("download", || {
            self.agent
                .get(&file_url)
                .header("User-Agent", &self.user_agent)
                .call()
        })?;

        let mut reader = response.body_mut().as_reader();
        let written = io::copy(&mut reader, writer)?;
        writer.flush()?;

        info!("Downloaded {} bytes", written);
        Ok(written)
    }
}

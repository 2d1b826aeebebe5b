//! Shared blocking HTTP plumbing: client construction, pacing and logged sends.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use reqwest::blocking::{Client, RequestBuilder};

use crate::error::ClientError;

/// Response body with its status, read fully.
#[derive(Debug)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Convert a non-2xx response into [`ClientError::Status`].
    pub fn error_for_status(self) -> Result<Self, ClientError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(ClientError::Status {
                status: self.status,
                message: snippet(&self.body),
            })
        }
    }

    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, ClientError> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// First 200 characters of a body, for error messages.
pub fn snippet(body: &str) -> String {
    body.chars().take(200).collect()
}

/// Enforces a minimum interval between consecutive requests.
#[derive(Debug)]
pub struct Pacer {
    interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl Pacer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_request: Mutex::new(None),
        }
    }

    /// Sleep until at least `interval` has passed since the previous call.
    pub fn wait(&self) {
        let mut last = match self.last_request.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.interval {
                std::thread::sleep(self.interval - elapsed);
            }
        }
        *last = Some(Instant::now());
    }
}

/// Build a blocking client with the configured timeout.
pub fn build_client(timeout: Duration) -> Result<Client, ClientError> {
    Ok(Client::builder()
        .timeout(timeout)
        .user_agent(concat!("scenekeeper/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

/// Send `request`, logging method, URL and auth style before and the status
/// and size after.
pub fn send_logged(
    client: &Client,
    label: &str,
    auth: &str,
    request: RequestBuilder,
) -> Result<RawResponse, ClientError> {
    let request = request.build()?;
    log::debug!(
        "[{}] {} {} (auth: {})",
        label,
        request.method(),
        request.url(),
        auth
    );
    let resp = client.execute(request)?;
    let status = resp.status().as_u16();
    let body = resp.text()?;
    log::debug!("[{}] HTTP {} ({} bytes)", label, status, body.len());
    Ok(RawResponse { status, body })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pacer_spaces_requests() {
        let pacer = Pacer::new(Duration::from_millis(30));
        let start = Instant::now();
        pacer.wait();
        pacer.wait();
        pacer.wait();
        assert!(start.elapsed() >= Duration::from_millis(60));
    }

    #[test]
    fn zero_interval_never_sleeps() {
        let pacer = Pacer::new(Duration::ZERO);
        let start = Instant::now();
        for _ in 0..10 {
            pacer.wait();
        }
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[test]
    fn non_success_status_becomes_error() {
        let resp = RawResponse {
            status: 404,
            body: "x".repeat(500),
        };
        match resp.error_for_status() {
            Err(ClientError::Status { status, message }) => {
                assert_eq!(status, 404);
                assert_eq!(message.len(), 200);
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}

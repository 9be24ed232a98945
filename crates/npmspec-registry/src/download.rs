//! Packument downloading from an npm registry.

use std::time::Duration;

use npmspec_util::errors::NpmspecError;
use reqwest::Client;

use crate::auth;
use crate::repository::NpmRegistry;

const RETRY_DELAY: Duration = Duration::from_secs(2);

/// Build a shared reqwest client for registry requests.
pub fn build_client(timeout: Duration) -> Result<Client, NpmspecError> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("npmspec/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| NpmspecError::Registry {
            message: format!("Failed to create HTTP client: {e}"),
        })
}

/// Fetch a packument body, retrying transient failures.
///
/// Timeouts, connection errors and 5xx responses are retried up to
/// `retries` more times with a linearly growing delay. Any other non-200
/// status, or an empty body, is an error straight away.
pub async fn fetch_packument(
    client: &Client,
    registry: &NpmRegistry,
    url: &str,
    retries: u32,
) -> Result<Vec<u8>, NpmspecError> {
    let mut last_err = String::new();

    for attempt in 0..=retries {
        if attempt > 0 {
            tracing::debug!("Retrying {url} (attempt {}): {last_err}", attempt + 1);
            tokio::time::sleep(RETRY_DELAY * attempt).await;
        }

        let req = auth::apply_auth(client.get(url), registry)
            .header(reqwest::header::ACCEPT, "application/json");

        match req.send().await {
            Ok(resp) => {
                let status = resp.status();
                if status.is_server_error() {
                    last_err = format!("HTTP {status} from {url}");
                    continue;
                }
                if status == reqwest::StatusCode::NOT_FOUND {
                    return Err(NpmspecError::Registry {
                        message: format!("{url} not found, check the package name"),
                    });
                }
                if status != reqwest::StatusCode::OK {
                    return Err(NpmspecError::Registry {
                        message: format!("HTTP {status} fetching {url}"),
                    });
                }

                let bytes = resp.bytes().await.map_err(|e| NpmspecError::Registry {
                    message: format!("Failed to read response from {url}: {e}"),
                })?;
                if bytes.is_empty() {
                    return Err(NpmspecError::Registry {
                        message: format!("Empty response body from {url}"),
                    });
                }
                return Ok(bytes.to_vec());
            }
            Err(e) if e.is_timeout() || e.is_connect() => {
                last_err = format!("{e}");
                continue;
            }
            Err(e) => {
                return Err(NpmspecError::Registry {
                    message: format!("Request to {url} failed: {e}"),
                });
            }
        }
    }

    Err(NpmspecError::Registry {
        message: format!("Failed after {} attempts for {url}: {last_err}", retries + 1),
    })
}

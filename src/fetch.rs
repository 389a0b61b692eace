//! Rate-limited HTTP fetching with retry.
//!
//! One long-lived `reqwest::Client` per run, a semaphore permit pool
//! bounding in-flight requests, and exponential backoff between attempts.
//! The permit pool is the single throttling point for the whole pipeline:
//! phase workers all fetch through here.

use crate::config::Config;
use crate::error::{Error, Result};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

const USER_AGENT: &str = "Mozilla/5.0 (compatible; Letras/0.1)";
const MAX_ATTEMPTS: u32 = 3;
const BACKOFF_BASE_SECS: u64 = 4;
const BACKOFF_CAP_SECS: u64 = 10;
const JITTER_MAX_MS: u64 = 500;

/// HTTP fetcher bounded by a fixed permit count.
pub struct Fetcher {
    client: reqwest::Client,
    permits: Arc<Semaphore>,
    base_url: String,
}

impl Fetcher {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Connection(e.to_string()))?;

        Ok(Self {
            client,
            permits: Arc::new(Semaphore::new(config.max_workers)),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Number of permits in the pool (phase workers size their fan-out off this).
    pub fn permit_count(&self) -> usize {
        self.permits.available_permits()
    }

    /// GET `base_url` + `path`, holding a permit for the duration.
    ///
    /// Each request is attempted up to three times with exponential backoff
    /// on any transport failure; the final error propagates to the caller,
    /// which decides between skipping the unit of work and aborting.
    pub async fn fetch(&self, path: &str) -> Result<String> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| Error::Internal("permit pool closed".to_string()))?;

        let url = format!("{}{}", self.base_url, path);
        let mut attempt = 1;

        loop {
            match self.try_get(&url, path).await {
                Ok(body) => return Ok(body),
                Err(e) if e.is_retryable() && attempt < MAX_ATTEMPTS => {
                    let delay = backoff_delay(attempt);
                    tracing::warn!(
                        path = %path,
                        attempt = attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Fetch failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn try_get(&self, url: &str, path: &str) -> Result<String> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                Error::Timeout(path.to_string())
            } else {
                Error::Connection(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                path: path.to_string(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| Error::Connection(e.to_string()))
    }
}

/// Exponential backoff: 4s, 8s, ... capped at 10s, plus up to 500ms jitter.
fn backoff_delay(attempt: u32) -> Duration {
    let exp = BACKOFF_BASE_SECS.saturating_mul(1 << (attempt - 1).min(8));
    let capped = exp.min(BACKOFF_CAP_SECS);
    let jitter = rand::thread_rng().gen_range(0..=JITTER_MAX_MS);
    Duration::from_secs(capped) + Duration::from_millis(jitter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_grows_and_caps() {
        let first = backoff_delay(1);
        let second = backoff_delay(2);
        let third = backoff_delay(3);

        assert!(first >= Duration::from_secs(4));
        assert!(first < Duration::from_secs(5));
        assert!(second >= Duration::from_secs(8));
        assert!(second < Duration::from_secs(9));
        // Capped at 10s (+ jitter), not 16s
        assert!(third >= Duration::from_secs(10));
        assert!(third < Duration::from_secs(11));
    }

    #[test]
    fn permit_pool_sized_from_config() {
        let config = Config {
            max_workers: 7,
            ..Config::default()
        };
        let fetcher = Fetcher::new(&config).unwrap();
        assert_eq!(fetcher.permit_count(), 7);
    }

    #[tokio::test]
    async fn permits_bound_concurrency() {
        let config = Config {
            max_workers: 2,
            ..Config::default()
        };
        let fetcher = Fetcher::new(&config).unwrap();

        let first = fetcher.permits.clone().acquire_owned().await.unwrap();
        let _second = fetcher.permits.clone().acquire_owned().await.unwrap();
        assert_eq!(fetcher.permit_count(), 0);

        drop(first);
        assert_eq!(fetcher.permit_count(), 1);
    }
}

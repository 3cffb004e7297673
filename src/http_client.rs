use std::time::Duration;

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use reqwest::blocking::Client;

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Blocking client built on first use, so constructing an API handle never fails and the
/// TLS setup cost lands on the worker thread instead of the UI thread.
#[derive(Debug)]
pub struct LazyClient {
    timeout: Duration,
    cell: OnceCell<Client>,
}

impl LazyClient {
    pub fn new(timeout_secs: u64) -> Self {
        Self {
            timeout: Duration::from_secs(timeout_secs.max(1)),
            cell: OnceCell::new(),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn get(&self) -> Result<&Client> {
        self.cell.get_or_try_init(|| {
            Client::builder()
                .timeout(self.timeout)
                .build()
                .context("failed to build http client")
        })
    }
}

impl Default for LazyClient {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT_SECS)
    }
}

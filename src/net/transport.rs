use std::time::Duration;

use anyhow::Context as _;
use reqwest::blocking::Client;

use crate::foundation::error::{Goes16Error, Goes16Result};

/// A single GET against some byte source.
///
/// Implementations report every failure (transport or HTTP status) as an
/// error; retrying is the caller's job.
pub trait Transport: Send + Sync {
    fn get(&self, url: &str) -> anyhow::Result<Vec<u8>>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn get(&self, url: &str) -> anyhow::Result<Vec<u8>> {
        (**self).get(url)
    }
}

/// Blocking HTTP transport.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

    pub fn new() -> Goes16Result<Self> {
        Self::with_timeout(Self::DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Goes16Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .build()
            .context("failed to build HTTP client")
            .map_err(Goes16Error::from)?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str) -> anyhow::Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .with_context(|| format!("GET {url}"))?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("GET {url} returned HTTP {status}");
        }

        let body = response
            .bytes()
            .with_context(|| format!("read response body of {url}"))?;
        Ok(body.to_vec())
    }
}

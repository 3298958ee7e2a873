//! Source file retrieval
//!
//! Providers never touch the network directly; they ask a [`Fetcher`] for
//! bytes. [`HttpFetcher`] is the production implementation and also reads
//! `file://` URLs and plain paths, which is how mirrored or pre-staged
//! source files are fed in.

use crate::error::{IngestError, Result};
use async_trait::async_trait;
use chemref_common::decompression::payload_to_string;
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Byte source for provider inputs
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// HTTP(S) and local file fetcher with retries
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    max_retries: u32,
    backoff_base: Duration,
    show_progress: bool,
}

impl HttpFetcher {
    pub fn new(timeout_secs: u64, max_retries: u32, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client,
            max_retries: max_retries.max(1),
            backoff_base: Duration::from_secs(1),
            show_progress: false,
        })
    }

    /// Delay unit for retries; attempt `n` waits `base * 2^n`
    pub fn with_backoff_base(mut self, base: Duration) -> Self {
        self.backoff_base = base;
        self
    }

    /// Draw a progress bar on stderr while downloading
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    fn backoff_delay(&self, attempt: u32) -> Duration {
        self.backoff_base.saturating_mul(2u32.saturating_pow(attempt))
    }

    async fn download_with_retry(&self, url: &str) -> Result<Vec<u8>> {
        let mut last_error = None;

        for attempt in 1..=self.max_retries {
            match self.download_url(url).await {
                Ok(content) => return Ok(content),
                Err(e) => {
                    warn!("Download attempt {}/{} for {} failed: {}", attempt, self.max_retries, url, e);
                    last_error = Some(e);

                    if attempt < self.max_retries {
                        let backoff = self.backoff_delay(attempt);
                        info!("Retrying in {:?}...", backoff);
                        tokio::time::sleep(backoff).await;
                    }
                },
            }
        }

        Err(last_error.unwrap_or_else(|| IngestError::fetch(url, "no download attempt made")))
    }

    async fn download_url(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(IngestError::fetch(url, format!("HTTP {}", response.status())));
        }

        let total_size = response.content_length().unwrap_or(0);
        let pb = if self.show_progress {
            let pb = ProgressBar::new(total_size);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{msg}\n{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} ({eta})")
                    .map(|style| style.progress_chars("#>-"))
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            pb.set_message(format!("Downloading {}", url));
            pb
        } else {
            ProgressBar::hidden()
        };

        let mut content = Vec::with_capacity(total_size as usize);
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            content.extend_from_slice(&chunk);
            pb.set_position(content.len() as u64);
        }
        pb.finish_and_clear();

        info!("Downloaded {} bytes from {}", content.len(), url);
        Ok(content)
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        match local_path(url) {
            Some(path) => {
                debug!("Reading local source {}", path);
                tokio::fs::read(path)
                    .await
                    .map_err(|e| IngestError::fetch(url, e.to_string()))
            },
            None => self.download_with_retry(url).await,
        }
    }
}

/// Path for `file://` URLs and scheme-less strings
fn local_path(url: &str) -> Option<&str> {
    if let Some(path) = url.strip_prefix("file://") {
        return Some(path);
    }
    if url.contains("://") {
        None
    } else {
        Some(url)
    }
}

/// Try each mirror in order; the last failure is returned if all fail
pub async fn fetch_with_fallback<S: AsRef<str>>(fetcher: &dyn Fetcher, urls: &[S]) -> Result<Vec<u8>> {
    let mut last_error = None;

    for url in urls {
        let url = url.as_ref();
        match fetcher.fetch(url).await {
            Ok(content) => return Ok(content),
            Err(e) => {
                warn!("Fetching {} failed: {}", url, e);
                last_error = Some(e);
            },
        }
    }

    Err(last_error.unwrap_or_else(|| IngestError::Config("No source URLs configured".to_string())))
}

/// [`fetch_with_fallback`] followed by gzip sniffing and UTF-8 decoding
pub async fn fetch_text<S: AsRef<str>>(fetcher: &dyn Fetcher, urls: &[S]) -> Result<String> {
    let payload = fetch_with_fallback(fetcher, urls).await?;
    Ok(payload_to_string(payload)?)
}

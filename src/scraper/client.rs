//! HTTP client with rate limiting for kaijiang.500.com

use super::{
    parse_award, parse_term_list, DecodeError, DetailLayout, TextDecoder, DEFAULT_BASE_URL,
    DEFAULT_ENCODING,
};
use crate::models::{format_term, Award};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::Mutex;

/// Broad error category, used to map failures onto API responses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Config,
    Transport,
    Decode,
    Scrape,
}

/// Scraper errors
#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Failed to decode page: {0}")]
    Decode(#[from] DecodeError),

    #[error("Failed to parse HTML: {0}")]
    ParseError(String),

    #[error("[{selector}] matched no nodes")]
    EmptySelection { selector: String },

    #[error("[{selector}] matched {actual} nodes, expected {expected}")]
    UnexpectedCount {
        selector: String,
        expected: usize,
        actual: usize,
    },

    #[error("Unexpected {what} format: {html}")]
    UnexpectedFormat { what: String, html: String },

    #[error("Page reports term {found}, requested {requested}")]
    TermMismatch { requested: u32, found: u32 },

    #[error("Invalid scraper configuration: {0}")]
    InvalidConfig(String),
}

impl ScraperError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ScraperError::InvalidConfig(_) => ErrorKind::Config,
            ScraperError::RequestFailed(_) | ScraperError::HttpStatus { .. } => {
                ErrorKind::Transport
            }
            ScraperError::Decode(_) => ErrorKind::Decode,
            _ => ErrorKind::Scrape,
        }
    }

    /// Whether another attempt could succeed
    fn is_retryable(&self) -> bool {
        match self {
            ScraperError::RequestFailed(_) => true,
            ScraperError::HttpStatus { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Scraper configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    /// Results base URL, without trailing slash
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Encoding label of the served pages
    #[serde(default = "default_encoding")]
    pub encoding: String,
    /// Delay between requests in milliseconds
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Attempts per page, first request included (1 = no retry)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// User agent string
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Number of title nodes on a detail page
    #[serde(default = "default_title_span_count")]
    pub title_span_count: usize,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_encoding() -> String {
    DEFAULT_ENCODING.to_string()
}

fn default_delay_ms() -> u64 {
    500
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_attempts() -> u32 {
    1
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string()
}

fn default_title_span_count() -> usize {
    DetailLayout::default().title_span_count()
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            encoding: default_encoding(),
            delay_ms: default_delay_ms(),
            timeout_secs: default_timeout_secs(),
            max_attempts: default_max_attempts(),
            user_agent: default_user_agent(),
            title_span_count: default_title_span_count(),
        }
    }
}

impl ScraperConfig {
    /// Validated detail page layout
    pub fn layout(&self) -> Result<DetailLayout, ScraperError> {
        DetailLayout::new(self.title_span_count)
    }
}

/// Lottery results scraper with rate limiting
pub struct LotteryScraper {
    client: reqwest::Client,
    decoder: TextDecoder,
    config: ScraperConfig,
    layout: DetailLayout,
    last_request: Mutex<Option<Instant>>,
}

impl LotteryScraper {
    /// Create a new scraper with the given configuration
    pub fn new(config: ScraperConfig) -> Result<Self, ScraperError> {
        let layout = config.layout()?;
        let decoder = TextDecoder::new(&config.encoding)?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self {
            client,
            decoder,
            config,
            layout,
            last_request: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &ScraperConfig {
        &self.config
    }

    /// URL of the index page listing all terms
    pub fn index_url(&self) -> String {
        format!("{}/", self.config.base_url.trim_end_matches('/'))
    }

    /// URL of the result page for a term
    pub fn award_url(&self, term: u32) -> String {
        format!(
            "{}/{}.shtml",
            self.config.base_url.trim_end_matches('/'),
            format_term(term)
        )
    }

    /// Wait for rate limit
    async fn wait_for_rate_limit(&self) {
        let mut last = self.last_request.lock().await;
        let delay = Duration::from_millis(self.config.delay_ms);

        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < delay {
                tokio::time::sleep(delay - elapsed).await;
            }
        }

        *last = Some(Instant::now());
    }

    async fn request_bytes(&self, url: &str) -> Result<Vec<u8>, ScraperError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScraperError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response.bytes().await?.to_vec())
    }

    /// Fetch a page and decode it to text, retrying transport failures
    pub async fn fetch_page(&self, url: &str) -> Result<String, ScraperError> {
        let attempts = self.config.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            self.wait_for_rate_limit().await;

            match self.request_bytes(url).await {
                Ok(bytes) => return Ok(self.decoder.decode(&bytes)?),
                Err(e) if e.is_retryable() && attempt < attempts => {
                    tracing::warn!(
                        "Request failed (attempt {}/{}): {}",
                        attempt,
                        attempts,
                        e
                    );
                    let backoff = Duration::from_millis(self.config.delay_ms * attempt as u64);
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// List all published terms, oldest first
    pub async fn list_terms(&self) -> Result<Vec<u32>, ScraperError> {
        let url = self.index_url();
        tracing::info!("Listing terms: {}", url);

        let html = self.fetch_page(&url).await?;
        let terms = parse_term_list(&html)?;

        tracing::debug!("Found {} terms", terms.len());
        Ok(terms)
    }

    /// Fetch and parse the result of a single term
    pub async fn fetch_award(&self, term: u32) -> Result<Award, ScraperError> {
        let url = self.award_url(term);
        tracing::info!("Scraping award: {}", url);

        let html = self.fetch_page(&url).await?;
        parse_award(&html, term, &self.layout)
    }

    /// Fetch the most recently published award
    pub async fn fetch_latest_award(&self) -> Result<Award, ScraperError> {
        let terms = self.list_terms().await?;
        let latest = terms.last().copied().ok_or_else(|| ScraperError::EmptySelection {
            selector: super::terms::TERM_LIST_SELECTOR.to_string(),
        })?;

        self.fetch_award(latest).await
    }

    /// Fetch several terms in order, one result per term
    pub async fn fetch_awards(&self, terms: &[u32]) -> Vec<Result<Award, ScraperError>> {
        let mut results = Vec::with_capacity(terms.len());

        for &term in terms {
            let result = self.fetch_award(term).await;
            if let Err(ref e) = result {
                tracing::warn!("Term {} failed: {}", format_term(term), e);
            }
            results.push(result);
        }

        results
    }
}

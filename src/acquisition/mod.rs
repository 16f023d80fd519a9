//! Text acquisition: turn a locator (raw text or article URL) into a single block of text.
//!
//! The pipeline only needs "some text or an explicit failure". Raw text passes straight
//! through; URLs are fetched over HTTP and reduced to article text by [`extract`].

pub mod extract;

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Errors raised while acquiring article text.
#[derive(Debug, Error)]
pub enum AcquisitionError {
    /// Locator could not be interpreted as an http(s) URL.
    #[error("invalid article URL '{0}'")]
    InvalidLocator(String),
    /// Transport-level failure while fetching the article.
    #[error("failed to fetch article: {0}")]
    Request(String),
    /// Server answered with a non-success status.
    #[error("article fetch returned HTTP {status} for {url}")]
    Status {
        /// HTTP status code returned by the server.
        status: u16,
        /// URL that was requested.
        url: String,
    },
    /// The page contained no extractable article text.
    #[error("no article text found at {0}")]
    Empty(String),
}

/// Where the text to summarize comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// Text supplied directly by the caller.
    Text(String),
    /// Article URL to fetch and extract.
    Url(String),
}

impl Locator {
    /// Short description suitable for log fields.
    pub fn describe(&self) -> String {
        match self {
            Self::Text(text) => format!("text ({} chars)", text.chars().count()),
            Self::Url(url) => url.clone(),
        }
    }
}

/// Anything that can turn a [`Locator`] into raw text.
#[async_trait]
pub trait TextSource: Send + Sync {
    /// Produce the raw text behind `locator`.
    async fn acquire(&self, locator: &Locator) -> Result<String, AcquisitionError>;
}

/// Default source: raw text passthrough plus HTTP article fetching.
pub struct ArticleSource {
    http: Client,
}

impl ArticleSource {
    /// Build a source whose fetches time out after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, AcquisitionError> {
        let http = Client::builder()
            .user_agent(concat!("newsdigest/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|error| AcquisitionError::Request(error.to_string()))?;
        Ok(Self { http })
    }

    /// Fetch `raw_url` and extract its article text.
    pub async fn fetch_article(&self, raw_url: &str) -> Result<String, AcquisitionError> {
        let url = parse_article_url(raw_url)?;
        tracing::info!(url = %url, "Fetching article");

        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|error| AcquisitionError::Request(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AcquisitionError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let html = response
            .text()
            .await
            .map_err(|error| AcquisitionError::Request(error.to_string()))?;
        let text = extract::extract_article(&html, url.host_str());
        if text.trim().is_empty() {
            return Err(AcquisitionError::Empty(url.to_string()));
        }
        tracing::debug!(url = %url, chars = text.chars().count(), "Article extracted");
        Ok(text)
    }
}

#[async_trait]
impl TextSource for ArticleSource {
    async fn acquire(&self, locator: &Locator) -> Result<String, AcquisitionError> {
        match locator {
            Locator::Text(text) => Ok(text.clone()),
            Locator::Url(url) => self.fetch_article(url).await,
        }
    }
}

fn parse_article_url(raw: &str) -> Result<Url, AcquisitionError> {
    let url =
        Url::parse(raw.trim()).map_err(|_| AcquisitionError::InvalidLocator(raw.to_string()))?;
    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Ok(url),
        _ => Err(AcquisitionError::InvalidLocator(raw.to_string())),
    }
}

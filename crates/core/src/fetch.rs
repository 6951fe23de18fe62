//! Document loading from URLs, files, and stdin.
//!
//! Loaded documents become [`StaticPage`](crate::StaticPage)s; the URL a
//! document was fetched from (after redirects) is its base URL.

use std::fs;
use std::path::PathBuf;
#[cfg(feature = "fetch")]
use std::time::Duration;

#[cfg(feature = "fetch")]
use reqwest::Client;
use url::Url;

use crate::{Result, SplitViewError};

/// HTTP client configuration for fetching web pages.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Request timeout in seconds.
    pub timeout: u64,
    /// Custom User-Agent string.
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: 30,
            user_agent: "Mozilla/5.0 (compatible; SplitView/1.0; +https://github.com/stormlightlabs/splitview)"
                .to_string(),
        }
    }
}

/// A fetched HTML document and the URL it was served from.
#[derive(Debug, Clone)]
pub struct FetchedDocument {
    pub html: String,
    /// Final URL after redirects
    pub url: Url,
}

/// Parses a user-supplied URL, requiring an http(s) scheme.
pub fn parse_page_url(url: &str) -> Result<Url> {
    let parsed = Url::parse(url).map_err(|e| SplitViewError::InvalidUrl(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => Err(SplitViewError::InvalidUrl(format!("unsupported scheme {}", scheme))),
    }
}

/// Fetches HTML content from a URL.
///
/// Follows redirects and respects the configured timeout.
#[cfg(feature = "fetch")]
pub async fn fetch_url(url: &str, config: &FetchConfig) -> Result<FetchedDocument> {
    let parsed_url = parse_page_url(url)?;

    let client = Client::builder()
        .timeout(Duration::from_secs(config.timeout))
        .build()
        .map_err(SplitViewError::HttpError)?;

    tracing::debug!(url = %parsed_url, "fetching page");
    let response = client
        .get(parsed_url)
        .header("User-Agent", &config.user_agent)
        .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
        .header("Accept-Language", "en-US,en;q=0.9")
        .send()
        .await
        .map_err(|e| {
            if e.is_timeout() {
                SplitViewError::Timeout { timeout: config.timeout }
            } else {
                SplitViewError::HttpError(e)
            }
        })?;

    let url = response.url().clone();
    let html = response.text().await?;

    Ok(FetchedDocument { html, url })
}

/// Reads HTML content from a local file.
pub fn fetch_file(path: &str) -> Result<String> {
    let path_buf = PathBuf::from(path);

    if !path_buf.exists() {
        Err(SplitViewError::FileNotFound(path_buf))
    } else {
        fs::read_to_string(&path_buf).map_err(SplitViewError::from)
    }
}

/// Reads HTML content from standard input until EOF.
pub fn fetch_stdin() -> Result<String> {
    use std::io::{self, Read};

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer).map_err(SplitViewError::from)?;

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_config_default() {
        let config = FetchConfig::default();
        assert_eq!(config.timeout, 30);
        assert!(config.user_agent.contains("SplitView"));
    }

    #[cfg(feature = "fetch")]
    #[tokio::test]
    async fn test_fetch_url_invalid() {
        let result = fetch_url("not-a-url", &FetchConfig::default()).await;

        assert!(matches!(result, Err(SplitViewError::InvalidUrl(_))));
    }

    #[test]
    fn test_parse_page_url() {
        assert!(parse_page_url("https://example.com/feed").is_ok());
        assert!(matches!(parse_page_url("example.com"), Err(SplitViewError::InvalidUrl(_))));
        assert!(matches!(parse_page_url("ftp://example.com"), Err(SplitViewError::InvalidUrl(_))));
    }

    #[test]
    fn test_fetch_file_not_found() {
        let result = fetch_file("/nonexistent/path/file.html");
        assert!(matches!(result, Err(SplitViewError::FileNotFound(_))));
    }

    #[test]
    fn test_fetch_file_reads_content() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("page.html");
        fs::write(&path, "<p>hi</p>").unwrap();

        assert_eq!(fetch_file(path.to_str().unwrap()).unwrap(), "<p>hi</p>");
    }
}

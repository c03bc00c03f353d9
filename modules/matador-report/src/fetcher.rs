use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use spider_transformations::transformation::content::{
    transform_content_input, ReturnFormat, TransformConfig, TransformInput,
};
use tracing::{info, warn};

use ai_client::collapse_whitespace;

use crate::traits::PageFetcher;

/// Only the website fetch carries an explicit timeout.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Plain HTTP GET of a competitor homepage, reduced to visible text.
pub struct WebsiteTextFetcher {
    client: reqwest::Client,
}

impl WebsiteTextFetcher {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .user_agent("Mozilla/5.0 (compatible; MatadorReport/0.1)")
            .build()
            .context("Failed to build website HTTP client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for WebsiteTextFetcher {
    async fn text(&self, url: &str) -> Result<String> {
        let parsed = url::Url::parse(url).context("Invalid URL")?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            bail!("Only http/https URLs are allowed, got: {}", parsed.scheme());
        }

        info!(url, "Fetching competitor website");

        let resp = self.client.get(parsed.clone()).send().await?;
        let status = resp.status();
        if !status.is_success() {
            bail!("Website returned status {status}");
        }
        let html = resp.bytes().await?;

        let text = html_to_text(&html, &parsed);
        if text.is_empty() {
            warn!(url, "Website had no readable text");
        }
        Ok(text)
    }
}

/// Strip markup and collapse whitespace, keeping the whole page rather than
/// a Readability main-content cut: brand voice lives in nav, hero and footer too.
pub fn html_to_text(html: &[u8], url: &url::Url) -> String {
    let config = TransformConfig {
        readability: false,
        main_content: false,
        return_format: ReturnFormat::Text,
        filter_images: true,
        filter_svg: true,
        clean_html: true,
    };
    let input = TransformInput {
        url: Some(url),
        content: html,
        screenshot_bytes: None,
        encoding: None,
        selector_config: None,
        ignore_tags: None,
    };

    collapse_whitespace(&transform_content_input(input, &config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn non_http_schemes_are_refused() {
        let fetcher = WebsiteTextFetcher::new().unwrap();
        let err = fetcher.text("ftp://menus.example/list").await.unwrap_err();
        assert!(err.to_string().contains("http/https"));
    }

    #[tokio::test]
    async fn garbage_url_is_an_error() {
        let fetcher = WebsiteTextFetcher::new().unwrap();
        assert!(fetcher.text("not a url").await.is_err());
    }

    #[test]
    fn markup_is_reduced_to_words() {
        let url = url::Url::parse("https://tacos.example").unwrap();
        let html = b"<html><body><h1>Fresh   Tortillas</h1>\n<p>Made daily.</p></body></html>";
        let text = html_to_text(html, &url);
        assert!(text.contains("Tortillas"));
        assert!(text.contains("Made daily"));
        assert!(!text.contains('<'));
        assert!(!text.contains("  "));
    }
}

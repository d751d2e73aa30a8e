//! Web crawling with robots.txt support and rate limiting
//!
//! This module provides:
//! - Single-URL fetching with configurable timeouts
//! - robots.txt parsing and respect (cached per host)
//! - Per-host rate limiting
//! - Bounded same-host crawling from a seed URL

mod rate_limit;
mod robots;

pub use rate_limit::*;
pub use robots::*;

use crate::config::CrawlConfig;
use crate::error::{Error, Result};
use crate::parse::{cap_content, count_words, parse_html, ExtractedLink};
use reqwest::Client;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use url::Url;

/// A fetched and extracted page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub url: String,
    pub title: Option<String>,
    pub text: String,
    pub links: Vec<ExtractedLink>,
    pub word_count: usize,
}

/// Per-page crawl outcome
#[derive(Debug, Clone)]
pub enum PageOutcome {
    Fetched(FetchedPage),
    Failed(String),
}

/// Result of attempting one page during a crawl
#[derive(Debug, Clone)]
pub struct PageResult {
    pub url: String,
    pub outcome: PageOutcome,
}

impl PageResult {
    pub fn is_fetched(&self) -> bool {
        matches!(self.outcome, PageOutcome::Fetched(_))
    }
}

/// Web crawler state
pub struct Crawler {
    client: Client,
    config: CrawlConfig,
    robots_cache: Arc<RwLock<HashMap<String, RobotsRules>>>,
    rate_limiters: Arc<RwLock<HashMap<String, HostRateLimiter>>>,
    visited: Arc<RwLock<HashSet<String>>>,
}

impl Crawler {
    /// Create a new crawler
    pub fn new(config: CrawlConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .gzip(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| Error::Crawl(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config,
            robots_cache: Arc::new(RwLock::new(HashMap::new())),
            rate_limiters: Arc::new(RwLock::new(HashMap::new())),
            visited: Arc::new(RwLock::new(HashSet::new())),
        })
    }

    /// Fetch a single URL and extract its content
    pub async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        let parsed_url = Url::parse(url)?;
        let host = parsed_url
            .host_str()
            .ok_or_else(|| Error::Crawl("URL has no host".to_string()))?
            .to_string();

        // Check robots.txt
        if self.config.respect_robots_txt {
            self.ensure_robots_loaded(&host, &parsed_url).await?;
            let rules = self.robots_cache.read().await;
            if let Some(r) = rules.get(&host) {
                if !r.is_allowed(parsed_url.path(), &self.config.user_agent) {
                    return Err(Error::Crawl(format!("robots.txt disallows {}", url)));
                }
            }
        }

        // Rate limiting
        self.rate_limit(&host).await;

        debug!("Fetching: {}", url);

        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Crawl(format!("HTTP {}: {}", status, url)));
        }

        let content = response.text().await?;
        let parsed = parse_html(&content, Some(url))?;

        let text = cap_content(&parsed.text, self.config.max_content_chars).to_string();
        let word_count = count_words(&text);

        Ok(FetchedPage {
            url: url.to_string(),
            title: parsed.title,
            text,
            links: parsed.links,
            word_count,
        })
    }

    /// Crawl same-host pages starting from a seed URL.
    ///
    /// At most `max_pages` pages are fetched. Failed pages are logged,
    /// recorded in the result and skipped; the crawl continues.
    pub async fn crawl(&self, seed_url: &str) -> Result<Vec<PageResult>> {
        let seed = Url::parse(seed_url)?;
        let seed_host = seed
            .host_str()
            .ok_or_else(|| Error::Crawl("Seed URL has no host".to_string()))?
            .to_string();

        let mut queue: VecDeque<String> = VecDeque::new();
        queue.push_back(seed_url.to_string());

        let mut results = Vec::new();
        let mut pages_fetched = 0u32;
        let mut attempts = 0u32;

        // Failed fetches count against an attempt budget so a site full of
        // dead links cannot stall the crawl
        let max_attempts = self.config.max_pages.saturating_mul(5).max(1);

        while let Some(url) = queue.pop_front() {
            if pages_fetched >= self.config.max_pages {
                info!("Reached max pages limit ({})", self.config.max_pages);
                break;
            }
            if attempts >= max_attempts {
                warn!(
                    "Reached crawl attempt limit ({}); stopping to avoid stalling",
                    max_attempts
                );
                break;
            }
            attempts += 1;

            let normalized = normalize_url(&url);
            {
                let mut visited = self.visited.write().await;
                if visited.contains(&normalized) {
                    continue;
                }
                visited.insert(normalized);
            }

            match self.fetch(&url).await {
                Ok(page) => {
                    // Queue internal links on the seed host
                    for link in &page.links {
                        if !link.is_internal || !should_crawl_url(&link.url) {
                            continue;
                        }

                        if let Ok(link_url) = Url::parse(&link.url) {
                            if link_url.host_str() == Some(seed_host.as_str()) {
                                let link_normalized = normalize_url(&link.url);
                                let visited = self.visited.read().await;
                                if !visited.contains(&link_normalized) {
                                    queue.push_back(link.url.clone());
                                }
                            }
                        }
                    }

                    pages_fetched += 1;
                    results.push(PageResult {
                        url: url.clone(),
                        outcome: PageOutcome::Fetched(page),
                    });
                }
                Err(e) => {
                    warn!("Failed to fetch {}: {}", url, e);
                    results.push(PageResult {
                        url: url.clone(),
                        outcome: PageOutcome::Failed(e.to_string()),
                    });
                }
            }
        }

        info!(
            "Crawled {} pages from {} ({} failed)",
            pages_fetched,
            seed_url,
            results.iter().filter(|r| !r.is_fetched()).count()
        );
        Ok(results)
    }

    async fn ensure_robots_loaded(&self, host: &str, url: &Url) -> Result<()> {
        {
            let cache = self.robots_cache.read().await;
            if cache.contains_key(host) {
                return Ok(());
            }
        }

        let robots_url = format!("{}://{}/robots.txt", url.scheme(), host);
        debug!("Fetching robots.txt from {}", robots_url);

        let rules = match self.client.get(&robots_url).send().await {
            Ok(response) if response.status().is_success() => {
                let text = response.text().await.unwrap_or_default();
                RobotsRules::parse(&text)
            }
            _ => {
                // No robots.txt or error - allow all
                RobotsRules::allow_all()
            }
        };

        let mut cache = self.robots_cache.write().await;
        cache.insert(host.to_string(), rules);
        Ok(())
    }

    async fn rate_limit(&self, host: &str) {
        let existing = { self.rate_limiters.read().await.get(host).cloned() };

        let limiter = match existing {
            Some(limiter) => limiter,
            None => {
                // A robots.txt Crawl-delay lowers the configured rate
                let mut rps = self.config.rate_limit_per_host;
                if self.config.respect_robots_txt {
                    let cache = self.robots_cache.read().await;
                    if let Some(rules) = cache.get(host) {
                        if let Some(delay) = rules.crawl_delay(&self.config.user_agent) {
                            if delay > 0.0 {
                                rps = rps.min(1.0 / delay);
                            }
                        }
                    }
                }

                let limiter = HostRateLimiter::new(rps);
                self.rate_limiters
                    .write()
                    .await
                    .insert(host.to_string(), limiter.clone());
                limiter
            }
        };

        limiter.wait().await;
    }
}

/// Normalize a URL for deduplication
pub fn normalize_url(url: &str) -> String {
    if let Ok(parsed) = Url::parse(url) {
        let mut normalized = parsed.clone();

        normalized.set_fragment(None);

        // Remove trailing slash from path
        let path = parsed.path().trim_end_matches('/');
        if path.is_empty() {
            normalized.set_path("/");
        } else {
            normalized.set_path(path);
        }

        normalized.to_string()
    } else {
        url.to_string()
    }
}

/// Check if a URL should be crawled based on patterns
pub fn should_crawl_url(url: &str) -> bool {
    let lower = url.to_lowercase();

    // Skip asset files and feeds
    let skip_extensions = [
        ".pdf", ".jpg", ".jpeg", ".png", ".gif", ".svg", ".webp", ".ico", ".css", ".js", ".zip",
        ".tar", ".gz", ".mp3", ".mp4", ".avi", ".mov", ".xml", ".json", ".rss", ".atom",
    ];
    for ext in skip_extensions {
        if lower.ends_with(ext) {
            return false;
        }
    }

    // Skip common non-content URLs
    let skip_patterns = [
        "/login",
        "/logout",
        "/signin",
        "/signout",
        "/register",
        "/admin",
        "/wp-admin",
        "/api/",
        "/cgi-bin/",
        "javascript:",
        "mailto:",
        "tel:",
    ];
    for pattern in skip_patterns {
        if lower.contains(pattern) {
            return false;
        }
    }

    // Skip anchor-only fragments
    if let Some(hash_idx) = lower.find('#') {
        if !lower[hash_idx + 1..].is_empty() {
            return false;
        }
    }

    true
}

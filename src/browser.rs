//! Fetching pages of the music archive and feeding them to the parsers.
//!
//! The parsers never touch the network; [`MusicBrowser`] pulls HTML from a
//! [`PageSource`] and aggregates multi-page results.

use crate::config::BrowserConfig;
use crate::error::{BrowserError, PageError};
use crate::models::{Browsable, Folder, GameEntry, GameInfo, MenuPage};
use crate::parsers::{
    parse_game_detail_page, parse_game_list_page, parse_info_page, parse_menu_page,
};
use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt, stream};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use url::Url;

/// Source of page HTML.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetches the page at `path` (relative to the `/music/` namespace).
    ///
    /// `page` selects a page of a paginated list; `1` is the first page.
    async fn fetch(&self, path: &str, page: u32) -> Result<String, BrowserError>;
}

/// Page source backed by HTTP requests to the site.
pub struct HttpSource {
    client: reqwest::Client,
    base_url: Url,
    throttle: Throttle,
}

impl HttpSource {
    /// Creates a new HTTP source with the given configuration.
    pub fn new(config: &BrowserConfig) -> Result<Self, BrowserError> {
        Ok(Self {
            client: create_http_client(config)?,
            base_url: config.base_url()?,
            throttle: Throttle::new(config.delay()?),
        })
    }

    /// Builds the URL of a page; pages after the first use `?page=<n>`.
    fn page_url(&self, path: &str, page: u32) -> Result<Url, BrowserError> {
        let mut url = self
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| BrowserError::InvalidUrl(format!("{}: {}", path, e)))?;

        if page > 1 {
            url.query_pairs_mut()
                .append_pair("page", &page.to_string());
        }

        Ok(url)
    }
}

#[async_trait]
impl PageSource for HttpSource {
    async fn fetch(&self, path: &str, page: u32) -> Result<String, BrowserError> {
        let url = self.page_url(path, page)?;
        self.throttle.wait().await;

        tracing::debug!("GET {}", url);
        let response = self.client.get(url).send().await?.error_for_status()?;

        Ok(response.text().await?)
    }
}

/// Common HTTP client configuration.
pub fn create_http_client(config: &BrowserConfig) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_sec))
        .build()
}

/// Spaces out request starts by a fixed delay, shared by every concurrent
/// caller.
pub struct Throttle {
    delay: Duration,
    last_start: Mutex<Option<Instant>>,
}

impl Throttle {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            last_start: Mutex::new(None),
        }
    }

    /// Waits until `delay` has passed since the previous caller's turn.
    ///
    /// The lock is held while sleeping, so callers go one at a time.
    pub async fn wait(&self) {
        let mut last_start = self.last_start.lock().await;
        if let Some(last) = *last_start {
            tokio::time::sleep_until(last + self.delay).await;
        }
        *last_start = Some(Instant::now());
    }
}

/// Browses the music archive through a page source.
pub struct MusicBrowser<S> {
    source: S,
    concurrency: usize,
}

impl MusicBrowser<HttpSource> {
    /// Creates a browser talking to the site over HTTP.
    pub fn from_config(config: &BrowserConfig) -> Result<Self, BrowserError> {
        Ok(Self::new(
            HttpSource::new(config)?,
            config.max_concurrent_requests,
        ))
    }
}

impl<S: PageSource> MusicBrowser<S> {
    /// Creates a browser with at most `concurrency` pages in flight.
    pub fn new(source: S, concurrency: usize) -> Self {
        Self {
            source,
            concurrency: concurrency.max(1),
        }
    }

    async fn load<T>(
        &self,
        path: &str,
        page: u32,
        parse: impl FnOnce(&str) -> Result<T, PageError>,
    ) -> Result<T, BrowserError> {
        let html = self.source.fetch(path, page).await?;

        parse(&html).map_err(|source| BrowserError::Page {
            path: path.to_string(),
            source,
        })
    }

    /// Fetches the sidebar menu and search platforms.
    pub async fn menu(&self) -> Result<MenuPage, BrowserError> {
        self.load("", 1, parse_menu_page).await
    }

    /// Fetches every page of a game list, in page order.
    pub async fn game_list(&self, path: &str) -> Result<Vec<GameEntry>, BrowserError> {
        let (mut entries, pages) = self.load(path, 1, parse_game_list_page).await?;
        tracing::debug!("'{}' has {} pages", path, pages);

        let rest: Vec<Vec<GameEntry>> = stream::iter(2..=pages)
            .map(|page| async move {
                self.load(path, page, parse_game_list_page)
                    .await
                    .map(|(entries, _)| entries)
            })
            .buffered(self.concurrency)
            .try_collect()
            .await?;

        entries.extend(rest.into_iter().flatten());
        Ok(entries)
    }

    /// Fetches a game page.
    pub async fn game(&self, path: &str) -> Result<GameInfo, BrowserError> {
        self.load(path, 1, |html| parse_game_detail_page(html, Some(path)))
            .await
    }

    /// Fetches several game pages concurrently; results keep the input order.
    pub async fn games<P: AsRef<str>>(&self, paths: &[P]) -> Vec<Result<GameInfo, BrowserError>> {
        stream::iter(paths)
            .map(|path| self.game(path.as_ref()))
            .buffered(self.concurrency)
            .collect()
            .await
    }

    /// Fetches the child links of an info page.
    pub async fn info(&self, path: &str) -> Result<Vec<Browsable>, BrowserError> {
        self.load(path, 1, parse_info_page).await
    }

    /// Adds the children listed on the info page at `path` to `tree`.
    ///
    /// The folder at `path` must already be in the tree. Children that
    /// cannot be placed in the tree are skipped. Returns the number of
    /// children added.
    pub async fn expand(&self, tree: &mut Folder, path: &str) -> Result<usize, BrowserError> {
        tree.get(path)?;

        let mut added = 0;
        for item in self.info(path).await? {
            match tree.add_browsable(&item) {
                Ok(_) => added += 1,
                Err(err) => tracing::warn!("Skipping '{}' of '{}': {}", item.name, path, err),
            }
        }

        Ok(added)
    }
}

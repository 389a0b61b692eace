//! Site access: fetching composed with parsing.
//!
//! The orchestrator talks to the site exclusively through [`Source`], so
//! tests drive whole pipeline runs against an in-memory implementation.

use crate::error::Result;
use crate::fetch::Fetcher;
use crate::models::{ArtistPage, ArtistRef, SongPage};
use crate::parse;
use async_trait::async_trait;

/// The three page kinds the pipeline knows how to read.
///
/// `Ok(None)` means the page was reachable but carried no usable data
/// ("absent"); `Err` means the fetch itself failed after retries. Callers
/// branch on the data rather than catching control-flow errors.
#[async_trait]
pub trait Source: Send + Sync {
    /// Full artist catalogue from the genre index page.
    async fn artist_index(&self) -> Result<Vec<ArtistRef>>;

    /// One artist's page: views plus song list. `None` when the page has
    /// neither a views block nor songs.
    async fn artist_page(&self, artist_slug: &str) -> Result<Option<ArtistPage>>;

    /// One song's page: views plus lyrics. `None` when no lyrics found.
    async fn song_page(&self, artist_slug: &str, song_slug: &str) -> Result<Option<SongPage>>;
}

/// Live implementation backed by the rate-limited fetcher.
pub struct Scraper {
    fetcher: Fetcher,
    index_path: String,
}

impl Scraper {
    pub fn new(fetcher: Fetcher, index_path: String) -> Self {
        Self {
            fetcher,
            index_path,
        }
    }
}

#[async_trait]
impl Source for Scraper {
    async fn artist_index(&self) -> Result<Vec<ArtistRef>> {
        let html = self.fetcher.fetch(&self.index_path).await?;
        Ok(parse::artist_index(&html))
    }

    async fn artist_page(&self, artist_slug: &str) -> Result<Option<ArtistPage>> {
        let html = self.fetcher.fetch(&format!("/{}/", artist_slug)).await?;
        let page = parse::artist_page(&html);
        if page.views.is_none() && page.songs.is_empty() {
            return Ok(None);
        }
        Ok(Some(page))
    }

    async fn song_page(&self, artist_slug: &str, song_slug: &str) -> Result<Option<SongPage>> {
        let html = self
            .fetcher
            .fetch(&format!("/{}/{}/", artist_slug, song_slug))
            .await?;
        Ok(parse::song_page(&html))
    }
}

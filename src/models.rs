//! Persisted entities and fetched candidate types.
//!
//! Rows (`Artist`, `Song`, `Lyrics`) carry store-assigned ids and are only
//! ever written by the `db` module. The `*Ref`/`*Page` types are value
//! snapshots of scraped data that workers pass around freely.

/// Persisted artist row. One row per slug.
#[derive(Debug, Clone)]
pub struct Artist {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub views: i64,
    pub added_date: String,
}

/// Persisted song row. Unique per (artist_id, slug).
#[derive(Debug, Clone)]
pub struct Song {
    pub id: i64,
    pub artist_id: i64,
    pub name: String,
    pub slug: String,
    pub views: i64,
    pub added_date: String,
}

/// Persisted lyrics row. At most one per song; replaced wholesale on update.
#[derive(Debug, Clone)]
pub struct Lyrics {
    pub id: i64,
    pub song_id: i64,
    pub content: String,
    pub last_updated: String,
}

/// Artist link scraped from the index page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtistRef {
    pub name: String,
    pub slug: String,
}

/// Song link scraped from an artist page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongRef {
    pub name: String,
    pub slug: String,
}

/// Artist candidate with its freshly observed view count, ready for
/// reconciliation against the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedArtist {
    pub name: String,
    pub slug: String,
    pub views: i64,
}

/// Parsed artist page: popularity counter plus the song list.
///
/// `views` is `None` when the page carries no views block, which the
/// artist phase treats as "no data" for that artist.
#[derive(Debug, Clone)]
pub struct ArtistPage {
    pub views: Option<i64>,
    pub songs: Vec<SongRef>,
}

/// Parsed song page: popularity counter plus the paragraph-joined lyrics.
#[derive(Debug, Clone)]
pub struct SongPage {
    pub views: i64,
    pub content: String,
}

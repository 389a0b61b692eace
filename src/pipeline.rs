//! Ingestion orchestration.
//!
//! Drives the artist → song → lyrics phase sequence for the two operating
//! modes. Phases are strict barriers: the worker set of one phase fully
//! drains before the next phase starts. Work within a phase is unordered;
//! network concurrency is throttled solely by the fetcher's permit pool.
//!
//! Per-unit failures (one artist, one song, one lyrics fetch) are caught at
//! the work-item boundary, logged and counted; the run continues. Failure
//! to acquire the artist index or to reach the store aborts the run.

use crate::db;
use crate::filter::FilterChain;
use crate::models::{Artist, ArtistRef, FetchedArtist, Lyrics, Song};
use crate::reconcile::{reconcile_artists, reconcile_songs};
use crate::release::Packager;
use crate::scrape::Source;
use crate::Result;
use sqlx::SqlitePool;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Operating mode, selected at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Process the entire fetched artist index.
    Full,
    /// Process artists absent from the store, plus a views-refresh sweep
    /// over every persisted artist.
    Incremental,
}

/// Counters reported at the end of a run. Partial failures are visible
/// here rather than silently dropped.
#[derive(Debug, Default, Clone)]
pub struct RunSummary {
    pub new_artists: usize,
    pub updated_artists: usize,
    pub new_songs: usize,
    pub new_lyrics: usize,
    pub skipped: usize,
    pub failures: usize,
}

/// Outcome of probing one artist page for its view counter.
enum Probe {
    Fetched(FetchedArtist),
    /// No views counter on the page; a stored row still gets its song
    /// sweep with stale views.
    Absent {
        slug: String,
        stored: Option<Artist>,
    },
    /// Fetch failed after retries; a stored row is carried forward.
    Failed(Option<Artist>),
    Cancelled,
}

pub struct Orchestrator<S: Source + 'static> {
    db: SqlitePool,
    source: Arc<S>,
    filter: Arc<FilterChain>,
    packager: Packager,
    cancel: CancellationToken,
}

impl<S: Source + 'static> Orchestrator<S> {
    pub fn new(
        db: SqlitePool,
        source: Arc<S>,
        filter: Arc<FilterChain>,
        packager: Packager,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            db,
            source,
            filter,
            packager,
            cancel,
        }
    }

    /// Execute one full run: all four phases in order.
    pub async fn run(&self, mode: Mode, output: &Path) -> Result<RunSummary> {
        let mut summary = RunSummary::default();

        let artists = self.artist_phase(mode, &mut summary).await?;
        info!(artists = artists.len(), "Artist phase complete");
        if self.cancel.is_cancelled() {
            info!("Run cancelled after artist phase");
            return Ok(summary);
        }

        let new_songs = self.song_phase(&artists, &mut summary).await;
        info!(new_songs = new_songs.len(), "Song phase complete");
        if self.cancel.is_cancelled() {
            info!("Run cancelled after song phase");
            return Ok(summary);
        }

        let lyrics = self.lyrics_phase(&artists, new_songs, &mut summary).await;
        info!(new_lyrics = lyrics.len(), "Lyrics phase complete");
        if self.cancel.is_cancelled() {
            info!("Run cancelled after lyrics phase");
            return Ok(summary);
        }

        self.packager.publish(&lyrics, output).await?;

        info!(
            new_artists = summary.new_artists,
            updated_artists = summary.updated_artists,
            new_songs = summary.new_songs,
            new_lyrics = summary.new_lyrics,
            skipped = summary.skipped,
            failures = summary.failures,
            "Run complete"
        );

        Ok(summary)
    }

    /// Phase 1: fetch the index, filter, probe views, reconcile, persist.
    ///
    /// Returns the artists surviving into the song phase. Index fetch
    /// failure is fatal.
    async fn artist_phase(&self, mode: Mode, summary: &mut RunSummary) -> Result<Vec<Artist>> {
        let index = self.source.artist_index().await?;
        let total = index.len();

        let filtered: Vec<ArtistRef> = index
            .into_iter()
            .filter(|a| self.filter.accepts_artist(&a.name))
            .collect();
        info!(
            fetched = total,
            kept = filtered.len(),
            mode = ?mode,
            "Artist index filtered"
        );

        let persisted = db::artists::all(&self.db).await?;
        let persisted_slugs: HashSet<&str> = persisted.iter().map(|a| a.slug.as_str()).collect();

        // Probe targets differ by mode: FULL probes the whole filtered
        // index; INCREMENTAL probes only unseen candidates but still sweeps
        // every persisted artist for view changes.
        let by_slug: HashMap<&str, &Artist> =
            persisted.iter().map(|a| (a.slug.as_str(), a)).collect();
        let mut targets: Vec<(ArtistRef, Option<Artist>)> = Vec::new();
        let mut queued = HashSet::new();
        match mode {
            Mode::Full => {
                for candidate in filtered {
                    if queued.insert(candidate.slug.clone()) {
                        let stored = by_slug.get(candidate.slug.as_str()).map(|a| (*a).clone());
                        targets.push((candidate, stored));
                    }
                }
            }
            Mode::Incremental => {
                for candidate in filtered {
                    if !persisted_slugs.contains(candidate.slug.as_str())
                        && queued.insert(candidate.slug.clone())
                    {
                        targets.push((candidate, None));
                    }
                }
                for stored in &persisted {
                    if queued.insert(stored.slug.clone()) {
                        let candidate = ArtistRef {
                            name: stored.name.clone(),
                            slug: stored.slug.clone(),
                        };
                        targets.push((candidate, Some(stored.clone())));
                    }
                }
            }
        }

        let mut workers = JoinSet::new();
        for (candidate, stored) in targets {
            let source = Arc::clone(&self.source);
            let cancel = self.cancel.clone();
            workers.spawn(async move {
                if cancel.is_cancelled() {
                    return Probe::Cancelled;
                }
                match source.artist_page(&candidate.slug).await {
                    Ok(Some(page)) => match page.views {
                        Some(views) => Probe::Fetched(FetchedArtist {
                            name: candidate.name,
                            slug: candidate.slug,
                            views,
                        }),
                        None => Probe::Absent {
                            slug: candidate.slug,
                            stored,
                        },
                    },
                    Ok(None) => Probe::Absent {
                        slug: candidate.slug,
                        stored,
                    },
                    Err(e) => {
                        warn!(artist = %candidate.slug, error = %e, "Artist probe failed");
                        Probe::Failed(stored)
                    }
                }
            });
        }

        let mut fetched = Vec::new();
        let mut carried = Vec::new();
        while let Some(joined) = workers.join_next().await {
            let Ok(outcome) = joined else {
                summary.failures += 1;
                continue;
            };
            match outcome {
                Probe::Fetched(candidate) => fetched.push(candidate),
                Probe::Absent { slug, stored } => {
                    summary.skipped += 1;
                    // The top-songs layout carries no views counter; the
                    // stored row still moves on with its stale value.
                    if let Some(stored) = stored {
                        warn!(artist = %slug, "No views counter, keeping stored views");
                        carried.push(stored);
                    } else {
                        warn!(artist = %slug, "No views counter on artist page, skipping");
                    }
                }
                Probe::Failed(stored) => {
                    summary.failures += 1;
                    // A persisted artist whose refresh failed still moves on
                    // to the song phase with its stale views.
                    if let Some(stored) = stored {
                        carried.push(stored);
                    }
                }
                Probe::Cancelled => {}
            }
        }

        let partition = reconcile_artists(fetched, &persisted);

        let mut survivors = Vec::new();
        for candidate in partition.new {
            let row = db::artists::upsert(
                &self.db,
                &candidate.name,
                &candidate.slug,
                candidate.views,
            )
            .await?;
            summary.new_artists += 1;
            survivors.push(row);
        }
        for (stored, views) in partition.updated {
            db::artists::update_views(&self.db, stored.id, views).await?;
            summary.updated_artists += 1;
            survivors.push(Artist { views, ..stored });
        }
        survivors.extend(partition.unchanged);
        survivors.extend(carried);

        Ok(survivors)
    }

    /// Phase 2: per artist, fetch the song list, filter titles, reconcile,
    /// insert NEW songs. Existing song rows are never touched here.
    async fn song_phase(&self, artists: &[Artist], summary: &mut RunSummary) -> Vec<Song> {
        let mut workers = JoinSet::new();
        for artist in artists.iter().cloned() {
            let source = Arc::clone(&self.source);
            let filter = Arc::clone(&self.filter);
            let pool = self.db.clone();
            let cancel = self.cancel.clone();
            workers.spawn(async move {
                if cancel.is_cancelled() {
                    return (Vec::new(), 0usize, 0usize);
                }

                let page = match source.artist_page(&artist.slug).await {
                    Ok(Some(page)) => page,
                    Ok(None) => {
                        return (Vec::new(), 1, 0);
                    }
                    Err(e) => {
                        warn!(artist = %artist.slug, error = %e, "Song list fetch failed");
                        return (Vec::new(), 0, 1);
                    }
                };

                let candidates: Vec<_> = page
                    .songs
                    .into_iter()
                    .filter(|s| filter.accepts_title(&s.name))
                    .collect();

                let persisted = match db::songs::by_artist(&pool, artist.id).await {
                    Ok(rows) => rows,
                    Err(e) => {
                        warn!(artist = %artist.slug, error = %e, "Song lookup failed");
                        return (Vec::new(), 0, 1);
                    }
                };

                let partition = reconcile_songs(candidates, &persisted);

                let mut inserted = Vec::new();
                let mut failed = 0;
                for candidate in partition.new {
                    match db::songs::upsert(&pool, &candidate.name, &candidate.slug, artist.id, 0)
                        .await
                    {
                        Ok(row) => inserted.push(row),
                        Err(e) => {
                            warn!(
                                artist = %artist.slug,
                                song = %candidate.slug,
                                error = %e,
                                "Song insert failed"
                            );
                            failed += 1;
                        }
                    }
                }

                if !inserted.is_empty() {
                    info!(
                        artist = %artist.name,
                        new_songs = inserted.len(),
                        "Found new songs"
                    );
                }
                (inserted, 0, failed)
            });
        }

        let mut new_songs = Vec::new();
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok((inserted, skipped, failed)) => {
                    summary.new_songs += inserted.len();
                    summary.skipped += skipped;
                    summary.failures += failed;
                    new_songs.extend(inserted);
                }
                Err(_) => summary.failures += 1,
            }
        }
        new_songs
    }

    /// Phase 3: fetch lyrics for phase-2 NEW songs, guard against songs
    /// that already hold a lyrics row, filter, and commit views + lyrics
    /// together. Rejections are skips, not retries.
    async fn lyrics_phase(
        &self,
        artists: &[Artist],
        new_songs: Vec<Song>,
        summary: &mut RunSummary,
    ) -> Vec<Lyrics> {
        let artist_by_id: Arc<HashMap<i64, Artist>> = Arc::new(
            artists
                .iter()
                .map(|a| (a.id, a.clone()))
                .collect(),
        );

        let mut workers = JoinSet::new();
        for song in new_songs {
            let source = Arc::clone(&self.source);
            let filter = Arc::clone(&self.filter);
            let artist_by_id = Arc::clone(&artist_by_id);
            let pool = self.db.clone();
            let cancel = self.cancel.clone();
            workers.spawn(async move {
                if cancel.is_cancelled() {
                    return LyricsOutcome::Cancelled;
                }

                // Lyrics are immutable once stored; re-fetching is wasted work.
                match db::lyrics::by_song(&pool, song.id).await {
                    Ok(Some(_)) => return LyricsOutcome::Skipped,
                    Ok(None) => {}
                    Err(e) => {
                        warn!(song = %song.slug, error = %e, "Lyrics lookup failed");
                        return LyricsOutcome::Failed;
                    }
                }

                let Some(artist) = artist_by_id.get(&song.artist_id) else {
                    warn!(song = %song.slug, "Owning artist missing from phase set");
                    return LyricsOutcome::Skipped;
                };

                let page = match source.song_page(&artist.slug, &song.slug).await {
                    Ok(Some(page)) => page,
                    Ok(None) => return LyricsOutcome::Skipped,
                    Err(e) => {
                        warn!(song = %song.slug, error = %e, "Song page fetch failed");
                        return LyricsOutcome::Failed;
                    }
                };

                if !filter.accepts_lyrics(&page.content) {
                    return LyricsOutcome::Skipped;
                }

                match db::lyrics::commit(&pool, song.id, page.views, &page.content).await {
                    Ok(lyrics) => {
                        info!(song = %song.name, "Added lyrics");
                        LyricsOutcome::Added(lyrics)
                    }
                    Err(e) => {
                        warn!(song = %song.slug, error = %e, "Lyrics commit failed");
                        LyricsOutcome::Failed
                    }
                }
            });
        }

        let mut accepted = Vec::new();
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(LyricsOutcome::Added(lyrics)) => {
                    summary.new_lyrics += 1;
                    accepted.push(lyrics);
                }
                Ok(LyricsOutcome::Skipped) => summary.skipped += 1,
                Ok(LyricsOutcome::Failed) | Err(_) => summary.failures += 1,
                Ok(LyricsOutcome::Cancelled) => {}
            }
        }
        accepted
    }
}

enum LyricsOutcome {
    Added(Lyrics),
    Skipped,
    Failed,
    Cancelled,
}

//! Reconciliation of fetched candidates against persisted records.
//!
//! Classification is a pure function of the two input sets: no I/O, no
//! ordering dependency. Duplicate slugs within one fetched batch collapse
//! first-seen-wins.

use crate::models::{Artist, FetchedArtist, Song, SongRef};
use std::collections::{HashMap, HashSet};

/// Artist partition: NEW to insert, UPDATED (stored row + fresh views) to
/// refresh, UNCHANGED carried forward as-is.
#[derive(Debug, Default)]
pub struct ArtistPartition {
    pub new: Vec<FetchedArtist>,
    pub updated: Vec<(Artist, i64)>,
    pub unchanged: Vec<Artist>,
}

/// Song partition: phase 2 only ever inserts, so MATCHED songs are carried
/// without distinguishing view changes.
#[derive(Debug, Default)]
pub struct SongPartition {
    pub new: Vec<SongRef>,
    pub existing: Vec<Song>,
}

/// Classify fetched artists against the persisted set, keyed by slug.
pub fn reconcile_artists(fetched: Vec<FetchedArtist>, persisted: &[Artist]) -> ArtistPartition {
    let by_slug: HashMap<&str, &Artist> =
        persisted.iter().map(|a| (a.slug.as_str(), a)).collect();

    let mut partition = ArtistPartition::default();
    let mut seen = HashSet::new();

    for candidate in fetched {
        if !seen.insert(candidate.slug.clone()) {
            continue;
        }
        match by_slug.get(candidate.slug.as_str()) {
            None => partition.new.push(candidate),
            Some(stored) if stored.views != candidate.views => {
                partition.updated.push(((*stored).clone(), candidate.views));
            }
            Some(stored) => partition.unchanged.push((*stored).clone()),
        }
    }

    partition
}

/// Classify fetched songs against one artist's persisted songs.
pub fn reconcile_songs(fetched: Vec<SongRef>, persisted: &[Song]) -> SongPartition {
    let by_slug: HashMap<&str, &Song> = persisted.iter().map(|s| (s.slug.as_str(), s)).collect();

    let mut partition = SongPartition::default();
    let mut seen = HashSet::new();

    for candidate in fetched {
        if !seen.insert(candidate.slug.clone()) {
            continue;
        }
        match by_slug.get(candidate.slug.as_str()) {
            None => partition.new.push(candidate),
            Some(stored) => partition.existing.push((*stored).clone()),
        }
    }

    partition
}

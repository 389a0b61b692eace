//! Release packaging.
//!
//! Materializes one text file per accepted lyrics record, optionally drops
//! a store snapshot next to them, zips the staging directory into a dated
//! archive and writes markdown release notes. The staging directory is
//! removed after a successful archive; failures propagate so a broken
//! release never passes silently.

use crate::db;
use crate::error::{Error, Result};
use crate::models::Lyrics;
use sqlx::SqlitePool;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Per-artist aggregation for the release notes, kept in first-seen order
/// so view-count ties resolve by fetch order.
struct ArtistStat {
    name: String,
    views: i64,
    songs: usize,
}

pub struct Packager {
    db: SqlitePool,
    include_snapshot: bool,
}

impl Packager {
    pub fn new(db: SqlitePool, include_snapshot: bool) -> Self {
        Self {
            db,
            include_snapshot,
        }
    }

    /// Write the release for this run's accepted lyrics.
    ///
    /// With nothing accepted there is nothing to ship and no archive is
    /// produced (a re-run against an unchanged catalogue stays empty).
    pub async fn publish(&self, lyrics: &[Lyrics], output: &Path) -> Result<Option<PathBuf>> {
        if lyrics.is_empty() {
            info!("No new lyrics accepted; skipping release");
            return Ok(None);
        }

        fs::create_dir_all(output)?;
        let staging = output.join("temp");
        fs::create_dir_all(&staging)?;

        let mut stats: Vec<ArtistStat> = Vec::new();
        let mut stat_index = std::collections::HashMap::new();

        for record in lyrics {
            let song = db::songs::by_id(&self.db, record.song_id)
                .await?
                .ok_or_else(|| {
                    Error::Internal(format!("lyrics {} references missing song", record.id))
                })?;
            let artist = db::artists::by_id(&self.db, song.artist_id)
                .await?
                .ok_or_else(|| {
                    Error::Internal(format!("song {} references missing artist", song.id))
                })?;

            let filename = sanitize_filename(&format!("{} - {}.txt", artist.name, song.name));
            fs::write(
                staging.join(filename),
                format!("{}\n{}\n\n{}", song.name, artist.name, record.content),
            )?;

            let index = *stat_index.entry(artist.id).or_insert_with(|| {
                stats.push(ArtistStat {
                    name: artist.name.clone(),
                    views: artist.views,
                    songs: 0,
                });
                stats.len() - 1
            });
            stats[index].songs += 1;
        }

        let stamp = chrono::Local::now().format("%Y%m%d");

        if self.include_snapshot {
            db::snapshot(&self.db, &staging.join(format!("letras-{}.db", stamp))).await?;
        }

        let archive_path = output.join(format!("letras-{}.zip", stamp));
        zip_directory(&staging, &archive_path)?;

        write_notes(lyrics.len(), &mut stats, output)?;

        fs::remove_dir_all(&staging)?;

        info!(
            archive = %archive_path.display(),
            songs = lyrics.len(),
            artists = stats.len(),
            "Release created"
        );
        Ok(Some(archive_path))
    }
}

/// Flat zip of every file in the staging directory.
fn zip_directory(staging: &Path, archive: &Path) -> Result<()> {
    let file = fs::File::create(archive)?;
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for entry in fs::read_dir(staging)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        writer
            .start_file(name, options)
            .map_err(|e| Error::Archive(e.to_string()))?;
        writer.write_all(&fs::read(entry.path())?)?;
    }

    writer.finish().map_err(|e| Error::Archive(e.to_string()))?;
    Ok(())
}

fn write_notes(total_songs: usize, stats: &mut [ArtistStat], output: &Path) -> Result<()> {
    let mut content = format!(
        "# Letras Gospel Update\n\nAdded {} new songs from {} artists.\n\n## Top Artists\n\n",
        total_songs,
        stats.len()
    );

    // Stable sort keeps first-seen order for equal view counts
    stats.sort_by(|a, b| b.views.cmp(&a.views));
    for stat in stats.iter().take(5) {
        content.push_str(&format!("- **{}** ({} songs)\n", stat.name, stat.songs));
    }

    fs::write(output.join("RELEASE_NOTES.md"), content)?;
    Ok(())
}

/// Replace path-hostile characters so every song maps to a valid filename.
fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            _ => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_replaces_path_separators() {
        assert_eq!(
            sanitize_filename("AC/DC - Back: In \"Black\".txt"),
            "AC_DC - Back_ In _Black_.txt"
        );
        assert_eq!(sanitize_filename("Aline Barros - Sonda-me.txt"),
            "Aline Barros - Sonda-me.txt");
    }

    #[test]
    fn notes_rank_by_views_with_stable_ties() {
        let mut stats = vec![
            ArtistStat {
                name: "First Tie".to_string(),
                views: 100,
                songs: 1,
            },
            ArtistStat {
                name: "Second Tie".to_string(),
                views: 100,
                songs: 2,
            },
            ArtistStat {
                name: "Leader".to_string(),
                views: 900,
                songs: 3,
            },
        ];

        let dir = tempfile::TempDir::new().unwrap();
        write_notes(6, &mut stats, dir.path()).unwrap();

        let notes = fs::read_to_string(dir.path().join("RELEASE_NOTES.md")).unwrap();
        assert!(notes.contains("Added 6 new songs from 3 artists."));

        let leader = notes.find("Leader").unwrap();
        let first = notes.find("First Tie").unwrap();
        let second = notes.find("Second Tie").unwrap();
        assert!(leader < first);
        assert!(first < second);
    }
}

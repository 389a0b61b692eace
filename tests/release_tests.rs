//! Release packaging against a seeded store.

use letras::db;
use letras::release::Packager;
use std::io::Read;
use tempfile::TempDir;

const MULTI_PARAGRAPH: &str =
    "First line\nSecond line\n\nFourth line after empty line\nLast line";

async fn seeded_store(dir: &TempDir) -> (sqlx::SqlitePool, Vec<letras::models::Lyrics>) {
    let pool = db::connect(&dir.path().join("letras.db")).await.unwrap();

    let aline = db::artists::upsert(&pool, "Aline Barros", "aline-barros", 900)
        .await
        .unwrap();
    let fernandinho = db::artists::upsert(&pool, "Fernandinho", "fernandinho", 400)
        .await
        .unwrap();

    let sonda = db::songs::upsert(&pool, "Sonda-me", "sonda-me", aline.id, 50)
        .await
        .unwrap();
    let historia = db::songs::upsert(
        &pool,
        "Uma Nova História",
        "uma-nova-historia",
        fernandinho.id,
        70,
    )
    .await
    .unwrap();

    let first = db::lyrics::upsert(&pool, sonda.id, MULTI_PARAGRAPH).await.unwrap();
    let second = db::lyrics::upsert(&pool, historia.id, "Outra letra\n\nSegundo verso")
        .await
        .unwrap();

    (pool, vec![first, second])
}

#[tokio::test]
async fn archive_contains_one_file_per_lyrics_plus_snapshot() {
    let dir = TempDir::new().unwrap();
    let (pool, lyrics) = seeded_store(&dir).await;
    let output = dir.path().join("out");

    let packager = Packager::new(pool, true);
    let archive_path = packager.publish(&lyrics, &output).await.unwrap().unwrap();

    let file = std::fs::File::open(&archive_path).unwrap();
    let archive = zip::ZipArchive::new(file).unwrap();
    let names: Vec<&str> = archive.file_names().collect();

    let txt_count = names.iter().filter(|n| n.ends_with(".txt")).count();
    let db_count = names.iter().filter(|n| n.ends_with(".db")).count();
    assert_eq!(txt_count, 2);
    assert_eq!(db_count, 1);

    let notes = std::fs::read_to_string(output.join("RELEASE_NOTES.md")).unwrap();
    assert!(notes.contains("Added 2 new songs from 2 artists."));
    // Higher views rank first
    assert!(notes.find("Aline Barros").unwrap() < notes.find("Fernandinho").unwrap());

    // Staging directory cleaned up after success
    assert!(!output.join("temp").exists());
}

#[tokio::test]
async fn lyrics_section_round_trips_byte_identical() {
    let dir = TempDir::new().unwrap();
    let (pool, lyrics) = seeded_store(&dir).await;
    let output = dir.path().join("out");

    let packager = Packager::new(pool, false);
    let archive_path = packager.publish(&lyrics, &output).await.unwrap().unwrap();

    let file = std::fs::File::open(&archive_path).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();
    let mut entry = archive
        .by_name("Aline Barros - Sonda-me.txt")
        .expect("song file in archive");
    let mut content = String::new();
    entry.read_to_string(&mut content).unwrap();

    // Header is song name then artist name, then a blank line, then the
    // lyrics exactly as scraped.
    assert_eq!(
        content,
        format!("Sonda-me\nAline Barros\n\n{}", MULTI_PARAGRAPH)
    );
}

#[tokio::test]
async fn empty_run_produces_no_archive() {
    let dir = TempDir::new().unwrap();
    let (pool, _) = seeded_store(&dir).await;
    let output = dir.path().join("out");

    let packager = Packager::new(pool, true);
    let result = packager.publish(&[], &output).await.unwrap();

    assert!(result.is_none());
    assert!(!output.exists());
}

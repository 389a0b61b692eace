//! Lyrics persistence.
//!
//! One lyrics row per song; on conflict the content is replaced wholesale
//! and `last_updated` bumped. Content fidelity is byte-for-byte: whatever
//! the parser produced is what reads return.

use crate::error::Result;
use crate::models::Lyrics;
use sqlx::{Row, SqlitePool};

fn from_row(row: &sqlx::sqlite::SqliteRow) -> Lyrics {
    Lyrics {
        id: row.get("id"),
        song_id: row.get("song_id"),
        content: row.get("content"),
        last_updated: row.get("last_updated"),
    }
}

/// Insert lyrics, or replace content entirely if the song already has a row.
pub async fn upsert(pool: &SqlitePool, song_id: i64, content: &str) -> Result<Lyrics> {
    let row = sqlx::query(
        r#"
        INSERT INTO lyrics (song_id, content)
        VALUES (?, ?)
        ON CONFLICT(song_id) DO UPDATE SET
            content = excluded.content,
            last_updated = CURRENT_TIMESTAMP
        RETURNING id, song_id, content, last_updated
        "#,
    )
    .bind(song_id)
    .bind(content)
    .fetch_one(pool)
    .await?;

    Ok(from_row(&row))
}

pub async fn by_song(pool: &SqlitePool, song_id: i64) -> Result<Option<Lyrics>> {
    let row = sqlx::query("SELECT id, song_id, content, last_updated FROM lyrics WHERE song_id = ?")
        .bind(song_id)
        .fetch_optional(pool)
        .await?;

    Ok(row.as_ref().map(from_row))
}

/// Persist the refreshed song view count and the lyrics row together.
///
/// The lyrics phase commits both or neither, so an interruption can never
/// leave a song with bumped views but missing lyrics.
pub async fn commit(pool: &SqlitePool, song_id: i64, views: i64, content: &str) -> Result<Lyrics> {
    let mut tx = pool.begin().await?;

    sqlx::query("UPDATE songs SET views = ? WHERE id = ?")
        .bind(views)
        .bind(song_id)
        .execute(&mut *tx)
        .await?;

    let row = sqlx::query(
        r#"
        INSERT INTO lyrics (song_id, content)
        VALUES (?, ?)
        ON CONFLICT(song_id) DO UPDATE SET
            content = excluded.content,
            last_updated = CURRENT_TIMESTAMP
        RETURNING id, song_id, content, last_updated
        "#,
    )
    .bind(song_id)
    .bind(content)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(from_row(&row))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{artists, songs, test_pool};

    async fn seeded_song(pool: &SqlitePool) -> i64 {
        let artist = artists::upsert(pool, "A", "a", 0).await.unwrap();
        songs::upsert(pool, "Song", "song", artist.id, 0)
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn content_round_trips_byte_identical() {
        let pool = test_pool().await;
        let song_id = seeded_song(&pool).await;

        let content = "First line\nSecond line\n\nFourth line after empty line\nLast line";
        upsert(&pool, song_id, content).await.unwrap();

        let stored = by_song(&pool, song_id).await.unwrap().unwrap();
        assert_eq!(stored.content, content);
    }

    #[tokio::test]
    async fn conflict_replaces_content_wholesale() {
        let pool = test_pool().await;
        let song_id = seeded_song(&pool).await;

        let first = upsert(&pool, song_id, "old text").await.unwrap();
        let second = upsert(&pool, song_id, "new text").await.unwrap();

        assert_eq!(second.id, first.id);
        assert_eq!(second.content, "new text");

        // Still exactly one row for the song
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM lyrics WHERE song_id = ?")
            .bind(song_id)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn commit_updates_views_and_lyrics_together() {
        let pool = test_pool().await;
        let song_id = seeded_song(&pool).await;

        commit(&pool, song_id, 4321, "letra completa").await.unwrap();

        let song = songs::by_id(&pool, song_id).await.unwrap().unwrap();
        assert_eq!(song.views, 4321);
        let stored = by_song(&pool, song_id).await.unwrap().unwrap();
        assert_eq!(stored.content, "letra completa");
    }
}

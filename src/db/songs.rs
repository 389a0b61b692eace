//! Song persistence.

use crate::error::Result;
use crate::models::Song;
use sqlx::{Row, SqlitePool};

fn from_row(row: &sqlx::sqlite::SqliteRow) -> Song {
    Song {
        id: row.get("id"),
        artist_id: row.get("artist_id"),
        name: row.get("name"),
        slug: row.get("slug"),
        views: row.get("views"),
        added_date: row.get("added_date"),
    }
}

/// Insert a song, or refresh `views` if (artist_id, slug) already exists.
pub async fn upsert(
    pool: &SqlitePool,
    name: &str,
    slug: &str,
    artist_id: i64,
    views: i64,
) -> Result<Song> {
    let row = sqlx::query(
        r#"
        INSERT INTO songs (name, slug, artist_id, views)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(artist_id, slug) DO UPDATE SET views = excluded.views
        RETURNING id, artist_id, name, slug, views, added_date
        "#,
    )
    .bind(name)
    .bind(slug)
    .bind(artist_id)
    .bind(views)
    .fetch_one(pool)
    .await?;

    Ok(from_row(&row))
}

pub async fn update_views(pool: &SqlitePool, id: i64, views: i64) -> Result<()> {
    sqlx::query("UPDATE songs SET views = ? WHERE id = ?")
        .bind(views)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn by_artist(pool: &SqlitePool, artist_id: i64) -> Result<Vec<Song>> {
    let rows = sqlx::query(
        "SELECT id, artist_id, name, slug, views, added_date FROM songs WHERE artist_id = ?",
    )
    .bind(artist_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(from_row).collect())
}

pub async fn by_id(pool: &SqlitePool, id: i64) -> Result<Option<Song>> {
    let row = sqlx::query(
        "SELECT id, artist_id, name, slug, views, added_date FROM songs WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.as_ref().map(from_row))
}

//! Artist persistence.

use crate::error::Result;
use crate::models::Artist;
use sqlx::{Row, SqlitePool};

fn from_row(row: &sqlx::sqlite::SqliteRow) -> Artist {
    Artist {
        id: row.get("id"),
        name: row.get("name"),
        slug: row.get("slug"),
        views: row.get("views"),
        added_date: row.get("added_date"),
    }
}

/// Insert an artist, or refresh `views` if the slug already exists.
/// `name`, `id` and `added_date` are never touched on conflict.
pub async fn upsert(pool: &SqlitePool, name: &str, slug: &str, views: i64) -> Result<Artist> {
    let row = sqlx::query(
        r#"
        INSERT INTO artists (name, slug, views)
        VALUES (?, ?, ?)
        ON CONFLICT(slug) DO UPDATE SET views = excluded.views
        RETURNING id, name, slug, views, added_date
        "#,
    )
    .bind(name)
    .bind(slug)
    .bind(views)
    .fetch_one(pool)
    .await?;

    Ok(from_row(&row))
}

pub async fn update_views(pool: &SqlitePool, id: i64, views: i64) -> Result<()> {
    sqlx::query("UPDATE artists SET views = ? WHERE id = ?")
        .bind(views)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn all(pool: &SqlitePool) -> Result<Vec<Artist>> {
    let rows = sqlx::query(
        "SELECT id, name, slug, views, added_date FROM artists ORDER BY name",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(from_row).collect())
}

pub async fn by_slug(pool: &SqlitePool, slug: &str) -> Result<Option<Artist>> {
    let row = sqlx::query(
        "SELECT id, name, slug, views, added_date FROM artists WHERE slug = ?",
    )
    .bind(slug)
    .fetch_optional(pool)
    .await?;

    Ok(row.as_ref().map(from_row))
}

pub async fn by_id(pool: &SqlitePool, id: i64) -> Result<Option<Artist>> {
    let row = sqlx::query(
        "SELECT id, name, slug, views, added_date FROM artists WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.as_ref().map(from_row))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    #[tokio::test]
    async fn upsert_inserts_then_updates_views_only() {
        let pool = test_pool().await;

        let first = upsert(&pool, "Aline Barros", "aline-barros", 100)
            .await
            .unwrap();
        assert!(first.id > 0);
        assert_eq!(first.views, 100);

        // Conflicting upsert with a different name must keep the original
        // name, id and added_date and only move the views counter.
        let second = upsert(&pool, "RENAMED", "aline-barros", 250).await.unwrap();
        assert_eq!(second.id, first.id);
        assert_eq!(second.name, "Aline Barros");
        assert_eq!(second.views, 250);
        assert_eq!(second.added_date, first.added_date);
    }

    #[tokio::test]
    async fn lookup_by_slug_and_id() {
        let pool = test_pool().await;
        let stored = upsert(&pool, "Fernandinho", "fernandinho", 7).await.unwrap();

        let by_slug = by_slug(&pool, "fernandinho").await.unwrap().unwrap();
        assert_eq!(by_slug.id, stored.id);

        let by_id = by_id(&pool, stored.id).await.unwrap().unwrap();
        assert_eq!(by_id.slug, "fernandinho");

        assert!(super::by_slug(&pool, "missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_views_touches_one_row() {
        let pool = test_pool().await;
        let a = upsert(&pool, "A", "a", 1).await.unwrap();
        let b = upsert(&pool, "B", "b", 2).await.unwrap();

        update_views(&pool, a.id, 99).await.unwrap();

        assert_eq!(by_id(&pool, a.id).await.unwrap().unwrap().views, 99);
        assert_eq!(by_id(&pool, b.id).await.unwrap().unwrap().views, 2);
    }
}

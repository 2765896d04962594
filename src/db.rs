use crate::{
    errors::StoreError,
    hasher,
    models::{FeedEntry, Link, ListOrder, Record},
};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tokio::sync::mpsc;
use tokio_stream::{wrappers::ReceiverStream, StreamExt};

/// Capacity of the hand-off buffer between the listing query and its reader.
const LISTING_BUFFER: usize = 10;

// ── Links ──────────────────────────────────────────────────────────────────

/// Insert a new link and return its identifier.
///
/// The identifier is derived from `url`, so submitting the same URL twice
/// fails with [`StoreError::DuplicateKey`] and leaves the first row alone.
pub async fn insert_link(
    pool: &SqlitePool,
    url: &str,
    description: &str,
    now: DateTime<Utc>,
) -> Result<String, StoreError> {
    let hash = hasher::hash(url);

    let result = sqlx::query(
        r#"INSERT INTO links (hash, "desc", url, time, hits) VALUES (?1, ?2, ?3, ?4, 0)"#,
    )
    .bind(&hash)
    .bind(description)
    .bind(url)
    .bind(now)
    .execute(pool)
    .await;

    match result {
        Ok(_) => Ok(hash),
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            Err(StoreError::DuplicateKey)
        }
        Err(e) => Err(StoreError::Unavailable(e)),
    }
}

/// Look up the target URL for `hash` and count the hit.
///
/// Counting is best-effort: a failed increment is logged and the URL is
/// still returned.
pub async fn resolve_link(pool: &SqlitePool, hash: &str) -> Result<String, StoreError> {
    let url: Option<String> = sqlx::query_scalar("SELECT url FROM links WHERE hash = ?1")
        .bind(hash)
        .fetch_optional(pool)
        .await?;

    let url = url.ok_or(StoreError::NotFound)?;

    if let Err(e) = increment_hits(pool, hash).await {
        tracing::warn!("Failed to count hit for '{}': {:?}", hash, e);
    }

    Ok(url)
}

async fn increment_hits(pool: &SqlitePool, hash: &str) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE links SET hits = hits + 1 WHERE hash = ?1")
        .bind(hash)
        .execute(pool)
        .await?;
    Ok(())
}

/// Fetch a single link by its identifier.
pub async fn get_link(pool: &SqlitePool, hash: &str) -> Result<Option<Link>, StoreError> {
    let link: Option<Link> = sqlx::query_as(
        r#"SELECT id, hash, "desc" AS description, url, hits, time
           FROM links WHERE hash = ?1"#,
    )
    .bind(hash)
    .fetch_optional(pool)
    .await?;

    Ok(link)
}

// ── Listings ───────────────────────────────────────────────────────────────

/// Stream every link in `order`, optionally capped at `limit` rows.
///
/// A background task runs the query and feeds rows through a bounded channel,
/// so the reader can start before the whole result set is loaded. Each call
/// issues a fresh query. Rows that fail to decode are logged and skipped; a
/// failing query ends the stream early.
pub fn list_recent(
    pool: &SqlitePool,
    order: ListOrder,
    limit: Option<u32>,
) -> ReceiverStream<Record> {
    let (tx, rx) = mpsc::channel(LISTING_BUFFER);
    let pool = pool.clone();

    tokio::spawn(async move {
        let sql = format!(
            r#"SELECT time, hash, "desc" AS description, hits
               FROM links ORDER BY {} LIMIT ?1"#,
            order.order_by()
        );
        // SQLite treats a negative LIMIT as "no limit".
        let limit = limit.map(i64::from).unwrap_or(-1);

        let mut rows = sqlx::query_as::<_, Record>(&sql).bind(limit).fetch(&pool);
        while let Some(row) = rows.next().await {
            match row {
                Ok(record) => {
                    if tx.send(record).await.is_err() {
                        // Reader went away.
                        return;
                    }
                }
                Err(sqlx::Error::ColumnDecode { index, source }) => {
                    tracing::warn!("Skipping undecodable link row (column {}): {}", index, source);
                }
                Err(e) => {
                    tracing::error!("Listing query failed: {:?}", e);
                    return;
                }
            }
        }
    });

    ReceiverStream::new(rx)
}

/// The `limit` newest links, for the RSS feed.
///
/// Rows that fail to decode are logged and skipped so one bad row can't take
/// the whole feed down; a failing query is returned as an error.
pub async fn recent_feed_entries(
    pool: &SqlitePool,
    limit: u32,
) -> Result<Vec<FeedEntry>, StoreError> {
    let mut rows = sqlx::query_as::<_, FeedEntry>(
        r#"SELECT hash, "desc" AS description
           FROM links ORDER BY time DESC, id DESC LIMIT ?1"#,
    )
    .bind(i64::from(limit))
    .fetch(pool);

    let mut entries = Vec::new();
    while let Some(row) = rows.next().await {
        match row {
            Ok(entry) => entries.push(entry),
            Err(sqlx::Error::ColumnDecode { index, source }) => {
                tracing::warn!("Skipping undecodable feed row (column {}): {}", index, source);
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(entries)
}

mod common;

use chrono::{Duration, TimeZone, Utc};
use linkblog::{db, errors::StoreError, hasher, models::ListOrder};
use tokio_stream::StreamExt;

use common::{block_hit_updates, file_pool, hits_for, row_count, test_pool};

#[tokio::test]
async fn insert_returns_the_url_hash() {
    let pool = test_pool().await;

    let hash = db::insert_link(&pool, "http://example.com", "Example", Utc::now())
        .await
        .unwrap();

    assert_eq!(hash, hasher::hash("http://example.com"));
    let link = db::get_link(&pool, &hash).await.unwrap().unwrap();
    assert_eq!(link.url, "http://example.com");
    assert_eq!(link.description, "Example");
    assert_eq!(link.hits, 0);
}

#[tokio::test]
async fn second_insert_of_same_url_is_a_duplicate() {
    let pool = test_pool().await;
    let now = Utc::now();

    db::insert_link(&pool, "http://example.com", "first", now)
        .await
        .unwrap();
    let err = db::insert_link(&pool, "http://example.com", "second", now)
        .await
        .unwrap_err();

    assert!(matches!(err, StoreError::DuplicateKey));
    assert_eq!(row_count(&pool).await, 1);
    let link = db::get_link(&pool, &hasher::hash("http://example.com"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(link.description, "first");
}

#[tokio::test]
async fn resolving_an_unknown_identifier_is_not_found() {
    let pool = test_pool().await;

    let err = db::resolve_link(&pool, "00000000").await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound));
}

#[tokio::test]
async fn each_resolution_counts_one_hit() {
    let pool = test_pool().await;
    let hash = db::insert_link(&pool, "http://example.com", "Example", Utc::now())
        .await
        .unwrap();

    for _ in 0..5 {
        let url = db::resolve_link(&pool, &hash).await.unwrap();
        assert_eq!(url, "http://example.com");
    }

    assert_eq!(hits_for(&pool, &hash).await, 5);
}

#[tokio::test]
async fn failed_hit_count_does_not_block_resolution() {
    let pool = test_pool().await;
    let hash = db::insert_link(&pool, "http://example.com", "Example", Utc::now())
        .await
        .unwrap();
    block_hit_updates(&pool).await;

    let url = db::resolve_link(&pool, &hash).await.unwrap();

    assert_eq!(url, "http://example.com");
    assert_eq!(hits_for(&pool, &hash).await, 0);
}

#[tokio::test]
async fn concurrent_resolutions_never_overcount() {
    let dir = tempfile::tempdir().unwrap();
    let pool = file_pool(dir.path(), 8).await;
    let hash = db::insert_link(&pool, "http://example.com", "Example", Utc::now())
        .await
        .unwrap();

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let pool = pool.clone();
            let hash = hash.clone();
            tokio::spawn(async move { db::resolve_link(&pool, &hash).await })
        })
        .collect();
    for task in tasks {
        assert_eq!(task.await.unwrap().unwrap(), "http://example.com");
    }

    let hits = hits_for(&pool, &hash).await;
    assert!((0..=8).contains(&hits), "unexpected hit count {hits}");
}

#[tokio::test]
async fn listings_are_ordered_descending() {
    let pool = test_pool().await;
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();

    let old = db::insert_link(&pool, "http://old.test", "old", base)
        .await
        .unwrap();
    let mid = db::insert_link(&pool, "http://mid.test", "mid", base + Duration::hours(1))
        .await
        .unwrap();
    let new = db::insert_link(&pool, "http://new.test", "new", base + Duration::hours(2))
        .await
        .unwrap();

    for _ in 0..3 {
        db::resolve_link(&pool, &old).await.unwrap();
    }
    db::resolve_link(&pool, &mid).await.unwrap();

    let by_time: Vec<String> = db::list_recent(&pool, ListOrder::Time, None)
        .map(|r| r.hash)
        .collect()
        .await;
    assert_eq!(by_time, vec![new.clone(), mid.clone(), old.clone()]);

    let by_hits: Vec<(String, i64)> = db::list_recent(&pool, ListOrder::Hits, None)
        .map(|r| (r.hash, r.hits))
        .collect()
        .await;
    assert_eq!(by_hits, vec![(old, 3), (mid, 1), (new.clone(), 0)]);

    let limited: Vec<String> = db::list_recent(&pool, ListOrder::Time, Some(1))
        .map(|r| r.hash)
        .collect()
        .await;
    assert_eq!(limited, vec![new]);
}

#[tokio::test]
async fn listing_reflects_current_state_on_each_call() {
    let pool = test_pool().await;

    let first: Vec<_> = db::list_recent(&pool, ListOrder::Time, None).collect().await;
    assert!(first.is_empty());

    db::insert_link(&pool, "http://example.com", "Example", Utc::now())
        .await
        .unwrap();

    let second: Vec<_> = db::list_recent(&pool, ListOrder::Time, None).collect().await;
    assert_eq!(second.len(), 1);
    assert_eq!(second[0].description, "Example");
}

#[tokio::test]
async fn feed_entries_are_newest_first_and_limited() {
    let pool = test_pool().await;
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    for i in 0..5 {
        db::insert_link(
            &pool,
            &format!("http://example.com/{i}"),
            &format!("link {i}"),
            base + Duration::minutes(i),
        )
        .await
        .unwrap();
    }

    let entries = db::recent_feed_entries(&pool, 3).await.unwrap();
    let descriptions: Vec<&str> = entries.iter().map(|e| e.description.as_str()).collect();
    assert_eq!(descriptions, vec!["link 4", "link 3", "link 2"]);
}

#[tokio::test]
async fn feed_entries_skip_undecodable_rows() {
    let pool = test_pool().await;
    db::insert_link(&pool, "http://example.com", "Example", Utc::now())
        .await
        .unwrap();
    sqlx::query(
        r#"INSERT INTO links (hash, "desc", url, hits, time)
           VALUES ('badbad00', X'FF00', 'http://bad.test', 0, '2020-01-01T00:00:00+00:00')"#,
    )
    .execute(&pool)
    .await
    .unwrap();

    let entries = db::recent_feed_entries(&pool, 10).await.unwrap();

    let hashes: Vec<String> = entries.into_iter().map(|e| e.hash).collect();
    assert_eq!(hashes, vec![hasher::hash("http://example.com")]);
}

#[tokio::test]
async fn untrimmed_urls_get_their_own_identifier() {
    let pool = test_pool().await;

    let plain = db::insert_link(&pool, "http://example.com", "a", Utc::now())
        .await
        .unwrap();
    let padded = db::insert_link(&pool, " http://example.com", "b", Utc::now())
        .await
        .unwrap();

    assert_ne!(plain, padded);
    assert_eq!(plain, "0cb7bf44");
}

//! Connection cache behavior against real temporary SQLite files.

mod support;

use std::sync::Arc;
use std::time::Duration;

use common::errors::AppError;
use engine::{ConnectionCache, TableBackend};
use tempfile::TempDir;

const TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::test]
async fn same_file_reuses_one_handle() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let path = support::create_users_db(dir.path(), "a.sqlite", 3).await?;

    let cache = ConnectionCache::new(TIMEOUT);
    let first = cache.acquire(&path).await?;
    let second = cache.acquire(&path).await?;

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(cache.len().await, 1);
    Ok(())
}

#[tokio::test]
async fn missing_file_is_not_found() {
    let cache = ConnectionCache::new(TIMEOUT);
    let result = cache.acquire("/no/such/dir/missing.sqlite".as_ref()).await;
    assert!(matches!(result, Err(AppError::DatabaseNotFound(_))));
}

#[tokio::test]
async fn unsupported_extension_is_rejected() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("notes.txt");
    std::fs::write(&path, "not a database")?;

    let cache = ConnectionCache::new(TIMEOUT);
    let result = cache.acquire(&path).await;
    assert!(matches!(result, Err(AppError::Validation(_))));
    Ok(())
}

#[tokio::test]
async fn full_cache_evicts_least_recently_used() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let a = support::create_users_db(dir.path(), "a.sqlite", 1).await?;
    let b = support::create_users_db(dir.path(), "b.sqlite", 1).await?;
    let c = support::create_users_db(dir.path(), "c.sqlite", 1).await?;

    let cache = ConnectionCache::with_capacity(2, TIMEOUT);
    let handle_a = cache.acquire(&a).await?;
    let handle_b = cache.acquire(&b).await?;
    let handle_c = cache.acquire(&c).await?;

    assert_eq!(cache.len().await, 2);
    assert!(handle_a.is_closed());
    assert!(!handle_b.is_closed());
    assert!(!handle_c.is_closed());
    Ok(())
}

#[tokio::test]
async fn reacquiring_refreshes_recency() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let a = support::create_users_db(dir.path(), "a.sqlite", 1).await?;
    let b = support::create_users_db(dir.path(), "b.sqlite", 1).await?;
    let c = support::create_users_db(dir.path(), "c.sqlite", 1).await?;

    let cache = ConnectionCache::with_capacity(2, TIMEOUT);
    let handle_a = cache.acquire(&a).await?;
    let handle_b = cache.acquire(&b).await?;
    // a becomes most recently used, so b is the eviction candidate
    cache.acquire(&a).await?;
    cache.acquire(&c).await?;

    assert!(!handle_a.is_closed());
    assert!(handle_b.is_closed());
    Ok(())
}

#[tokio::test]
async fn release_closes_and_is_idempotent() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let path = support::create_users_db(dir.path(), "a.sqlite", 1).await?;

    let cache = ConnectionCache::new(TIMEOUT);
    let handle = cache.acquire(&path).await?;

    cache.release_by_path(&path).await;
    assert!(handle.is_closed());
    assert!(cache.is_empty().await);

    // second release of the same path is a no-op
    cache.release_by_path(&path).await;
    assert!(cache.is_empty().await);
    Ok(())
}

#[tokio::test]
async fn close_all_drains_the_cache() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let a = support::create_users_db(dir.path(), "a.sqlite", 1).await?;
    let b = support::create_users_db(dir.path(), "b.sqlite", 1).await?;

    let cache = ConnectionCache::new(TIMEOUT);
    let handle_a = cache.acquire(&a).await?;
    let handle_b = cache.acquire(&b).await?;

    cache.close_all().await;
    assert!(cache.is_empty().await);
    assert!(handle_a.is_closed());
    assert!(handle_b.is_closed());
    Ok(())
}

#[tokio::test]
async fn concurrent_acquires_share_one_handle() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let path = support::create_users_db(dir.path(), "a.sqlite", 1).await?;

    let cache = Arc::new(ConnectionCache::new(TIMEOUT));
    let mut tasks = Vec::new();
    for _ in 0..50 {
        let cache = Arc::clone(&cache);
        let path = path.clone();
        tasks.push(tokio::spawn(
            async move { cache.acquire(&path).await },
        ));
    }

    let mut handles = Vec::new();
    for task in tasks {
        handles.push(task.await??);
    }

    let first = &handles[0];
    assert!(handles.iter().all(|h| Arc::ptr_eq(first, h)));
    assert_eq!(cache.len().await, 1);
    Ok(())
}

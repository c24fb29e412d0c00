//! End-to-end page queries over a real temporary SQLite database.

mod support;

use std::time::Duration;

use common::errors::AppError;
use common::models::{PageRequest, SortOrder, MAX_PAGE_SIZE};
use engine::{query_page, Backend, TableBackend};
use tempfile::TempDir;

const TIMEOUT: Duration = Duration::from_secs(5);

async fn users_backend(dir: &TempDir, rows: u32) -> anyhow::Result<Backend> {
    let path = support::create_users_db(dir.path(), "users.sqlite", rows).await?;
    Ok(Backend::connect(&path, TIMEOUT).await?)
}

#[tokio::test]
async fn searched_sorted_page_reports_both_counts() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let backend = users_backend(&dir, 120).await?;

    let mut req = PageRequest::new("Users");
    req.search_term = "Smith".to_string();
    req.search_columns = vec!["all".to_string()];
    req.sort_column = Some("name".to_string());
    req.sort_order = SortOrder::Desc;
    req.page = 1;
    req.page_size = 50;

    let result = query_page(&backend, &req).await?;

    assert_eq!(result.total_count, 120);
    // rows 4, 8, ..., 120 are Smiths
    assert_eq!(result.filtered_count, 30);
    assert_eq!(result.rows.len(), 30);
    assert_eq!(result.total_pages, 3);

    let name_idx = result
        .columns
        .iter()
        .position(|c| c.name == "name")
        .expect("name column present");
    let names: Vec<&String> = result.rows.iter().map(|r| &r[name_idx]).collect();
    assert!(names.iter().all(|n| n.contains("Smith")));
    let mut sorted = names.clone();
    sorted.sort_by(|a, b| b.cmp(a));
    assert_eq!(names, sorted);

    // highlighting wraps the matched surname
    assert!(names[0].contains("<mark>Smith</mark>"));
    Ok(())
}

#[tokio::test]
async fn page_past_the_matches_is_empty_but_counted() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let backend = users_backend(&dir, 120).await?;

    let mut req = PageRequest::new("Users");
    req.search_term = "Smith".to_string();
    req.search_columns = vec!["all".to_string()];
    req.page = 2;
    req.page_size = 50;

    let result = query_page(&backend, &req).await?;
    assert!(result.rows.is_empty());
    assert_eq!(result.filtered_count, 30);
    assert_eq!(result.total_count, 120);
    Ok(())
}

#[tokio::test]
async fn page_size_is_clamped_both_ways() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let backend = users_backend(&dir, 10).await?;

    let mut req = PageRequest::new("Users");
    req.page_size = 10_000;
    let result = query_page(&backend, &req).await?;
    assert_eq!(result.page_size, MAX_PAGE_SIZE);

    req.page_size = 0;
    let result = query_page(&backend, &req).await?;
    assert_eq!(result.page_size, 1);
    assert_eq!(result.rows.len(), 1);
    assert_eq!(result.total_pages, 10);
    Ok(())
}

#[tokio::test]
async fn one_row_past_a_full_page_adds_a_page() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let backend = users_backend(&dir, 51).await?;

    let mut req = PageRequest::new("Users");
    req.page_size = 50;
    let result = query_page(&backend, &req).await?;
    assert_eq!(result.total_pages, 2);
    assert_eq!(result.rows.len(), 50);

    req.page = 2;
    let result = query_page(&backend, &req).await?;
    assert_eq!(result.rows.len(), 1);

    // exactly one full page
    let backend = {
        let path = support::create_users_db(dir.path(), "fifty.sqlite", 50).await?;
        Backend::connect(&path, TIMEOUT).await?
    };
    let result = query_page(&backend, &PageRequest::new("Users")).await?;
    assert_eq!(result.total_pages, 1);
    Ok(())
}

#[tokio::test]
async fn empty_table_has_zero_pages() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let backend = users_backend(&dir, 0).await?;

    let result = query_page(&backend, &PageRequest::new("Users")).await?;
    assert_eq!(result.total_count, 0);
    assert_eq!(result.filtered_count, 0);
    assert_eq!(result.total_pages, 0);
    assert!(result.rows.is_empty());
    Ok(())
}

#[tokio::test]
async fn unknown_sort_column_falls_back_to_natural_order() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let backend = users_backend(&dir, 5).await?;

    let mut req = PageRequest::new("Users");
    req.sort_column = Some("no_such_column".to_string());
    let result = query_page(&backend, &req).await?;

    let ids: Vec<&String> = result.rows.iter().map(|r| &r[0]).collect();
    assert_eq!(ids, ["1", "2", "3", "4", "5"]);
    Ok(())
}

#[tokio::test]
async fn unknown_table_is_rejected_before_any_sql() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let backend = users_backend(&dir, 1).await?;

    let err = query_page(&backend, &PageRequest::new("Users; DROP TABLE Users"))
        .await
        .expect_err("unknown table must fail");
    assert!(matches!(err, AppError::TableNotFound(_)));
    Ok(())
}

#[tokio::test]
async fn quoted_search_term_is_bound_not_spliced() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let backend = users_backend(&dir, 8).await?;

    let mut req = PageRequest::new("Users");
    req.search_term = "O'Brien".to_string();
    req.search_columns = vec!["all".to_string()];

    let result = query_page(&backend, &req).await?;
    assert_eq!(result.filtered_count, 0);
    assert!(result.rows.is_empty());
    // the table itself is untouched
    assert!(backend.list_tables().await?.contains(&"Users".to_string()));
    Ok(())
}

#[tokio::test]
async fn wildcard_terms_are_bound_with_like_semantics() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let backend = users_backend(&dir, 8).await?;

    let mut req = PageRequest::new("Users");
    req.search_columns = vec!["name".to_string()];

    // a bare % widens the bound %term% pattern to match every row
    req.search_term = "%".to_string();
    let result = query_page(&backend, &req).await?;
    assert_eq!(result.filtered_count, 8);

    // % inside the term keeps standard LIKE semantics
    req.search_term = "Jones%002".to_string();
    let result = query_page(&backend, &req).await?;
    assert_eq!(result.filtered_count, 1);

    req.search_term = "zz%zz".to_string();
    let result = query_page(&backend, &req).await?;
    assert_eq!(result.filtered_count, 0);

    // wildcards never reach the SQL text itself
    assert!(backend.list_tables().await?.contains(&"Users".to_string()));
    Ok(())
}

#[tokio::test]
async fn explicit_search_column_narrows_the_match() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let backend = users_backend(&dir, 8).await?;

    // "user" appears in every email but in no name
    let mut req = PageRequest::new("Users");
    req.search_term = "user".to_string();
    req.search_columns = vec!["name".to_string()];

    let result = query_page(&backend, &req).await?;
    assert_eq!(result.filtered_count, 0);

    req.search_columns = vec!["email".to_string()];
    let result = query_page(&backend, &req).await?;
    assert_eq!(result.filtered_count, 8);
    Ok(())
}

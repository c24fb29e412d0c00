//! Shared fixtures: temporary SQLite databases built with sqlx directly.

use std::path::{Path, PathBuf};

use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{Connection, SqliteConnection};

/// Creates a `Users(id, name, email)` database with `rows` rows. Every
/// fourth row is a Smith, the rest are Joneses.
pub async fn create_users_db(dir: &Path, name: &str, rows: u32) -> anyhow::Result<PathBuf> {
    let path = dir.join(name);
    let mut conn = SqliteConnection::connect_with(
        &SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true),
    )
    .await?;

    sqlx::query("CREATE TABLE Users (id INTEGER PRIMARY KEY, name TEXT, email TEXT)")
        .execute(&mut conn)
        .await?;

    for i in 1..=rows {
        let surname = if i % 4 == 0 { "Smith" } else { "Jones" };
        sqlx::query("INSERT INTO Users (id, name, email) VALUES (?, ?, ?)")
            .bind(i64::from(i))
            .bind(format!("{surname} {i:03}"))
            .bind(format!("user{i:03}@example.com"))
            .execute(&mut conn)
            .await?;
    }

    conn.close().await?;
    Ok(path)
}

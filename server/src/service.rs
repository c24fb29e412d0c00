//! Upload store: the directory of database files the viewer serves.
//!
//! Every id arriving from a URL is validated as a bare, allow-listed
//! filename before it is joined to the upload directory, so no request can
//! name a path outside the store. Uploads are additionally sniffed by file
//! signature before they are accepted.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use common::config::AppConfig;
use common::errors::{AppError, AppResult};
use common::models::DatabaseItem;
use common::utils::filename::{allowed_file, display_name, is_safe_component, sanitize_filename};
use engine::{ConnectionCache, TableBackend};

/// First bytes of a SQLite 3 file.
const SQLITE_MAGIC: &[u8] = b"SQLite format 3\0";

/// Jet/ACE files carry their format marker at offset 4.
const JET_MAGIC_OFFSET: usize = 4;
const JET_MAGIC: &[u8] = b"Standard Jet DB";
const ACE_MAGIC: &[u8] = b"Standard ACE DB";

/// File-backed database store.
pub struct DatabaseStore {
    upload_dir: PathBuf,
    cache: Arc<ConnectionCache>,
}

impl DatabaseStore {
    pub fn new(config: &AppConfig, cache: Arc<ConnectionCache>) -> Self {
        Self {
            upload_dir: config.upload_dir.clone(),
            cache,
        }
    }

    /// Maps a URL id to the stored file path. Rejects traversal attempts
    /// and unknown extensions before touching the filesystem.
    pub fn resolve_id(&self, id: &str) -> AppResult<PathBuf> {
        if !is_safe_component(id) || !allowed_file(id) {
            return Err(AppError::DatabaseNotFound(id.to_string()));
        }
        let path = self.upload_dir.join(id);
        if !path.is_file() {
            return Err(AppError::DatabaseNotFound(id.to_string()));
        }
        Ok(path)
    }

    /// Lists stored databases newest first, with their table lists. A file
    /// that fails to open is still listed, with an empty table list.
    pub async fn list(&self) -> AppResult<Vec<DatabaseItem>> {
        let mut items = Vec::new();
        let entries = match std::fs::read_dir(&self.upload_dir) {
            Ok(entries) => entries,
            // an empty store is not an error
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(items),
            Err(e) => return Err(e.into()),
        };

        for entry in entries {
            let entry = entry?;
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if !allowed_file(&name) || !entry.path().is_file() {
                continue;
            }

            let meta = entry.metadata()?;
            let modified: DateTime<Utc> = meta.modified()?.into();

            let tables = match self.tables_of(&entry.path()).await {
                Ok(tables) => tables,
                Err(e) => {
                    tracing::warn!(file = %name, error = %e, "could not read tables for listing");
                    Vec::new()
                }
            };

            items.push(DatabaseItem {
                original_name: display_name(&name),
                table_count: tables.len(),
                tables,
                file_size: meta.len(),
                modified_time: modified.to_rfc3339(),
                id: name,
            });
        }

        items.sort_by(|a, b| b.modified_time.cmp(&a.modified_time));
        Ok(items)
    }

    async fn tables_of(&self, path: &std::path::Path) -> AppResult<Vec<String>> {
        let backend = self.cache.acquire(path).await?;
        backend.list_tables().await
    }

    /// Validates and stores an upload, returning its metadata. The stored
    /// name is the sanitized original prefixed with the upload timestamp so
    /// repeated uploads never collide.
    pub async fn save_upload(&self, original: &str, bytes: &[u8]) -> AppResult<DatabaseItem> {
        if !allowed_file(original) {
            return Err(AppError::InvalidFileType(original.to_string()));
        }
        let sanitized = sanitize_filename(original);
        // the sanitized name must survive the same checks resolve_id applies
        if !is_safe_component(&sanitized) || !allowed_file(&sanitized) {
            return Err(AppError::InvalidFileType(original.to_string()));
        }
        if !matches_signature(&sanitized, bytes) {
            return Err(AppError::InvalidFileType(format!(
                "{original}: content does not match its extension"
            )));
        }

        std::fs::create_dir_all(&self.upload_dir)?;
        let id = format!("{}_{}", Utc::now().timestamp(), sanitized);
        let path = self.upload_dir.join(&id);
        if let Err(e) = std::fs::write(&path, bytes) {
            // never leave a partial file behind
            let _ = std::fs::remove_file(&path);
            return Err(e.into());
        }

        let tables = match self.tables_of(&path).await {
            Ok(tables) => tables,
            Err(e) => {
                self.cache.release_by_path(&path).await;
                let _ = std::fs::remove_file(&path);
                return Err(e);
            }
        };

        tracing::info!(id = %id, size = bytes.len(), "database uploaded");
        Ok(DatabaseItem {
            original_name: display_name(&id),
            table_count: tables.len(),
            tables,
            file_size: bytes.len() as u64,
            modified_time: Utc::now().to_rfc3339(),
            id,
        })
    }

    /// Removes one stored database, closing its cached connection first.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let path = self.resolve_id(id)?;
        self.cache.release_by_path(&path).await;
        std::fs::remove_file(&path)?;
        tracing::info!(id = %id, "database deleted");
        Ok(())
    }

    /// Removes every stored database. Returns how many files were deleted.
    pub async fn cleanup_all(&self) -> AppResult<usize> {
        self.cache.close_all().await;
        let entries = match std::fs::read_dir(&self.upload_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let mut removed = 0;
        for entry in entries {
            let entry = entry?;
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if allowed_file(&name) && entry.path().is_file() {
                std::fs::remove_file(entry.path())?;
                removed += 1;
            }
        }
        tracing::info!(removed, "upload store cleaned");
        Ok(removed)
    }
}

/// Checks the file signature matching the claimed extension.
fn matches_signature(name: &str, bytes: &[u8]) -> bool {
    let ext = name.rsplit('.').next().unwrap_or_default().to_ascii_lowercase();
    match ext.as_str() {
        "sqlite" | "db" => bytes.starts_with(SQLITE_MAGIC),
        "mdb" | "accdb" => {
            let end = JET_MAGIC_OFFSET + JET_MAGIC.len();
            bytes.len() >= end
                && (&bytes[JET_MAGIC_OFFSET..end] == JET_MAGIC
                    || &bytes[JET_MAGIC_OFFSET..end] == ACE_MAGIC)
        }
        _ => false,
    }
}

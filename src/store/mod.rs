//! # Persistence
//!
//! Templates and users live in two JSON files inside a data directory:
//!
//! ```text
//! <data-dir>/
//!   templates.json   [TemplateRecord, ...]
//!   users.json       [UserRecord, ...]
//! ```
//!
//! Each collection is loaded once on open and held in memory. Every mutation
//! is applied to a copy, written to `<file>.tmp` and renamed over the
//! original, and only then published; a failed write leaves both the file
//! and the in-memory state untouched.

mod templates;
mod users;

pub use templates::{NewTemplate, TemplateRecord, TemplateStore, TemplateSummary};
pub use users::{NewUser, UserPage, UserQuery, UserRecord, UserStore, display_name};

use serde::{Serialize, de::DeserializeOwned};
use std::path::{Path, PathBuf};
use tokio::sync::{RwLock, RwLockReadGuard};

use crate::error::CardpressError;

/// A JSON array of records on disk, mirrored in memory.
pub struct JsonCollection<T> {
    path: PathBuf,
    records: RwLock<Vec<T>>,
}

impl<T> JsonCollection<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync,
{
    /// Load `path`, starting empty when the file does not exist yet.
    pub async fn open(path: PathBuf) -> Result<Self, CardpressError> {
        let records = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Vec::new(),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                CardpressError::Store(format!("Failed to parse {}: {}", path.display(), e))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        tracing::debug!(path = %path.display(), count = records.len(), "Loaded collection");
        Ok(Self {
            path,
            records: RwLock::new(records),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn read(&self) -> RwLockReadGuard<'_, Vec<T>> {
        self.records.read().await
    }

    /// Apply `change` to a copy of the records, persist, then publish.
    pub async fn update<R>(
        &self,
        change: impl FnOnce(&mut Vec<T>) -> Result<R, CardpressError>,
    ) -> Result<R, CardpressError> {
        let mut records = self.records.write().await;
        let mut next = records.clone();
        let result = change(&mut next)?;
        self.persist(&next).await?;
        *records = next;
        Ok(result)
    }

    async fn persist(&self, records: &[T]) -> Result<(), CardpressError> {
        let json = serde_json::to_vec_pretty(records)?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        tokio::fs::write(&tmp, &json)
            .await
            .map_err(|e| CardpressError::Store(format!("Failed to write {}: {}", tmp.display(), e)))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| CardpressError::Store(format!("Failed to replace {}: {}", self.path.display(), e)))?;
        Ok(())
    }
}

/// Both collections of a data directory.
pub struct Store {
    pub templates: TemplateStore,
    pub users: UserStore,
}

impl Store {
    /// Open (creating if needed) the data directory.
    pub async fn open(data_dir: impl AsRef<Path>) -> Result<Self, CardpressError> {
        let dir = data_dir.as_ref();
        tokio::fs::create_dir_all(dir).await.map_err(|e| {
            CardpressError::Store(format!("Failed to create data directory {}: {}", dir.display(), e))
        })?;
        let templates = TemplateStore::new(JsonCollection::open(dir.join("templates.json")).await?);
        let users = UserStore::new(JsonCollection::open(dir.join("users.json")).await?);
        tracing::info!(data_dir = %dir.display(), "Opened store");
        Ok(Self { templates, users })
    }
}

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard},
};

use async_trait::async_trait;
use serde_json::Value;

use crate::prelude::*;

/// Durable device-scoped key-value storage.
#[async_trait]
pub trait Store: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    async fn set(&self, key: &str, value: Value) -> Result;
}

type Entries = BTreeMap<String, Value>;

/// TOML file with all the entries, rewritten on every update.
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<Entries>,
}

impl FileStore {
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let entries = if path.is_file() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("failed to read `{}`", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("failed to parse `{}`", path.display()))?
        } else {
            info!("no store yet, starting empty");
            Entries::new()
        };
        Ok(Self { path: path.to_owned(), entries: Mutex::new(entries) })
    }

    /// Snapshot of all the entries.
    pub fn entries(&self) -> Result<Entries> {
        Ok(self.lock()?.clone())
    }

    /// Sibling file that is renamed over the store once fully written.
    fn temporary_path(&self) -> PathBuf {
        let mut path = self.path.clone().into_os_string();
        path.push(".tmp");
        path.into()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Entries>> {
        self.entries.lock().map_err(|_| anyhow!("the store is poisoned"))
    }
}

#[async_trait]
impl Store for FileStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.lock()?.get(key).cloned())
    }

    #[instrument(skip_all, fields(key = key))]
    async fn set(&self, key: &str, value: Value) -> Result {
        let mut entries = self.lock()?;
        entries.insert(key.to_owned(), value);
        let contents = toml::to_string(&*entries).context("failed to serialize the store")?;
        let temporary_path = self.temporary_path();
        fs::write(&temporary_path, contents)
            .with_context(|| format!("failed to write `{}`", temporary_path.display()))?;
        fs::rename(&temporary_path, &self.path)
            .with_context(|| format!("failed to replace `{}`", self.path.display()))?;
        debug!("saved");
        Ok(())
    }
}

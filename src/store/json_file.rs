use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::fs;

use super::{Store, StoreError};
use crate::config::Settings;
use crate::models::{Signal, Wallet};

const WALLETS_FILE: &str = "wallets.json";
const SIGNALS_FILE: &str = "signals.json";
const SETTINGS_FILE: &str = "settings.json";

/// File-backed store: one pretty-printed JSON array per collection.
///
/// Writes go to a sibling `.tmp` file which is then renamed over the target,
/// so a crash mid-write leaves the previous collection intact.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn read_collection<T: DeserializeOwned>(&self, name: &str) -> Result<Vec<T>, StoreError> {
        let path = self.dir.join(name);
        let content = match fs::read(&path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        if content.iter().all(|b| b.is_ascii_whitespace()) {
            return Ok(Vec::new());
        }

        Ok(serde_json::from_slice(&content)?)
    }

    /// Write `value` next to `name` and return the temp path, ready to be
    /// renamed into place.
    async fn stage<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<PathBuf, StoreError> {
        fs::create_dir_all(&self.dir).await?;

        let tmp = self.dir.join(format!("{name}.tmp"));
        fs::write(&tmp, serde_json::to_vec_pretty(value)?).await?;
        Ok(tmp)
    }

    async fn write_collection<T: Serialize>(&self, name: &str, items: &[T]) -> Result<(), StoreError> {
        let tmp = self.stage(name, items).await?;
        fs::rename(&tmp, self.dir.join(name)).await?;
        Ok(())
    }
}

#[async_trait]
impl Store for JsonFileStore {
    async fn load_wallets(&self) -> Result<Vec<Wallet>, StoreError> {
        self.read_collection(WALLETS_FILE).await
    }

    async fn replace_wallets(&self, wallets: &[Wallet]) -> Result<(), StoreError> {
        self.write_collection(WALLETS_FILE, wallets).await
    }

    async fn load_signals(&self) -> Result<Vec<Signal>, StoreError> {
        self.read_collection(SIGNALS_FILE).await
    }

    async fn replace_signals(&self, signals: &[Signal]) -> Result<(), StoreError> {
        self.write_collection(SIGNALS_FILE, signals).await
    }

    /// Both temp files are fully written before either is renamed, so a
    /// serialization or disk-full error leaves both collections untouched.
    async fn replace_all(&self, wallets: &[Wallet], signals: &[Signal]) -> Result<(), StoreError> {
        let wallets_tmp = self.stage(WALLETS_FILE, wallets).await?;
        let signals_tmp = self.stage(SIGNALS_FILE, signals).await?;

        fs::rename(&signals_tmp, self.dir.join(SIGNALS_FILE)).await?;
        fs::rename(&wallets_tmp, self.dir.join(WALLETS_FILE)).await?;
        Ok(())
    }

    async fn load_settings(&self) -> Result<Option<Settings>, StoreError> {
        let content = match fs::read(self.dir.join(SETTINGS_FILE)).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        if content.iter().all(|b| b.is_ascii_whitespace()) {
            return Ok(None);
        }

        Ok(Some(serde_json::from_slice(&content)?))
    }

    async fn save_settings(&self, settings: &Settings) -> Result<(), StoreError> {
        let tmp = self.stage(SETTINGS_FILE, settings).await?;
        fs::rename(&tmp, self.dir.join(SETTINGS_FILE)).await?;
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        match fs::metadata(&self.dir).await {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(StoreError::Unavailable(format!(
                "{} is not a directory",
                self.dir.display()
            ))),
            // Not created until the first write
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

use log::{debug, info};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::error::Error;
use std::fs::{self, File};
use std::future::Future;
use std::io::{BufReader, BufWriter, Write};
use std::path::PathBuf;
use tempfile::NamedTempFile;

type Result<T> = std::result::Result<T, Box<dyn Error>>;

/// Flat JSON files keyed by name. A file that exists is trusted as-is
/// unless `force_refresh` is set.
pub struct JsonCache {
    dir: PathBuf,
    force_refresh: bool,
}

impl JsonCache {
    pub fn new(dir: impl Into<PathBuf>, force_refresh: bool) -> Self {
        Self {
            dir: dir.into(),
            force_refresh,
        }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    pub fn load<T: DeserializeOwned>(&self, name: &str) -> Result<Option<Vec<T>>> {
        let path = self.path(name);
        if self.force_refresh || !path.is_file() {
            return Ok(None);
        }
        let reader = BufReader::new(File::open(&path)?);
        let items: Vec<T> = serde_json::from_reader(reader)
            .map_err(|e| format!("corrupt cache file {}: {e}", path.display()))?;
        Ok(Some(items))
    }

    /// Replaces the whole file; a crash mid-write leaves the old one intact.
    pub fn store<T: Serialize>(&self, name: &str, items: &[T]) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path(name);
        let temp_file = NamedTempFile::new_in(&self.dir)?;
        let mut writer = BufWriter::new(temp_file);
        serde_json::to_writer(&mut writer, items)?;
        writer.flush()?;
        writer.into_inner().map_err(|e| e.into_error())?.persist(&path)?;
        debug!("Wrote {} records to {}", items.len(), path.display());
        Ok(())
    }

    pub async fn load_or_build<T, F, Fut>(&self, name: &str, build: F) -> Result<Vec<T>>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Vec<T>>,
    {
        if let Some(items) = self.load(name)? {
            info!("Loaded {} from cache", self.path(name).display());
            return Ok(items);
        }
        let items = build().await;
        self.store(name, &items)?;
        Ok(items)
    }
}

//! Zone persistence backends

use super::constants::MAX_ZONE_FILE_SIZE;
use super::{Result, Zone, ZoneError};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, trace};

/// Storage for serialized zone documents, keyed by zone name
#[async_trait]
pub trait ZoneBackend: Send + Sync {
    /// Load a zone; `Ok(None)` when it does not exist
    async fn load(&self, name: &str) -> Result<Option<Zone>>;

    /// Write a zone, replacing any previous version
    async fn store(&self, name: &str, zone: &Zone) -> Result<()>;

    /// Remove a zone; returns false when it did not exist
    async fn remove(&self, name: &str) -> Result<bool>;

    /// Names of all stored zones
    async fn list(&self) -> Result<Vec<String>>;

    async fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.load(name).await?.is_some())
    }
}

/// One pretty-printed `<zone>.json` file per zone in a directory
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn zone_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", name))
    }
}

#[async_trait]
impl ZoneBackend for FileBackend {
    async fn load(&self, name: &str) -> Result<Option<Zone>> {
        let path = self.zone_path(name);
        let metadata = match fs::metadata(&path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if metadata.len() as usize > MAX_ZONE_FILE_SIZE {
            return Err(ZoneError::FileTooLarge);
        }

        let contents = match fs::read(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        trace!("Read {} bytes from {}", contents.len(), path.display());

        let zone = serde_json::from_slice(&contents)?;
        Ok(Some(zone))
    }

    async fn store(&self, name: &str, zone: &Zone) -> Result<()> {
        fs::create_dir_all(&self.dir).await?;

        let contents = serde_json::to_vec_pretty(zone)?;
        if contents.len() > MAX_ZONE_FILE_SIZE {
            return Err(ZoneError::FileTooLarge);
        }

        // Write then rename so readers never observe a partial document
        let path = self.zone_path(name);
        let tmp = self.dir.join(format!(".{}.json.tmp", name));
        fs::write(&tmp, &contents).await?;
        fs::rename(&tmp, &path).await?;

        debug!("Wrote zone {} to {}", name, path.display());
        Ok(())
    }

    async fn remove(&self, name: &str) -> Result<bool> {
        match fs::remove_file(self.zone_path(name)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self) -> Result<Vec<String>> {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if !stem.starts_with('.') {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    async fn exists(&self, name: &str) -> Result<bool> {
        Ok(fs::try_exists(self.zone_path(name)).await?)
    }
}

/// In-process backend holding serialized documents
#[derive(Default)]
pub struct MemoryBackend {
    documents: RwLock<HashMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store raw document text, bypassing serialization
    pub fn insert_raw(&self, name: &str, contents: &str) {
        self.documents
            .write()
            .insert(name.to_string(), contents.to_string());
    }

    /// Raw document text as last stored
    pub fn raw(&self, name: &str) -> Option<String> {
        self.documents.read().get(name).cloned()
    }
}

#[async_trait]
impl ZoneBackend for MemoryBackend {
    async fn load(&self, name: &str) -> Result<Option<Zone>> {
        let contents = self.documents.read().get(name).cloned();
        match contents {
            Some(contents) => Ok(Some(serde_json::from_str(&contents)?)),
            None => Ok(None),
        }
    }

    async fn store(&self, name: &str, zone: &Zone) -> Result<()> {
        let contents = serde_json::to_string_pretty(zone)?;
        self.documents.write().insert(name.to_string(), contents);
        Ok(())
    }

    async fn remove(&self, name: &str) -> Result<bool> {
        Ok(self.documents.write().remove(name).is_some())
    }

    async fn list(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.documents.read().keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.documents.read().contains_key(name))
    }
}

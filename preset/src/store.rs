//! On-disk preset store
//!
//! Presets live in a flat folder of `<name>.json` files, each holding one
//! [`PresetDoc`]. The store keeps a cached listing and refreshes it lazily
//! after any mutation. The store never validates: it moves JSON text between
//! disk and [`PresetDoc`], and callers run [`crate::validate`] when they need
//! the resolved model.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;

use crate::document::PresetDoc;

/// Error type for store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("preset not found: {0}")]
    NotFound(String),
    #[error("invalid preset name: {0:?}")]
    InvalidName(String),
    #[error("failed to determine preset directory")]
    NoStoreDirectory,
}

/// Brief info about a stored preset (listing without loading documents).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresetInfo {
    pub name: String,
}

/// Manages the preset folder.
pub struct PresetStore {
    dir: PathBuf,
    cached: Vec<PresetInfo>,
    cache_dirty: bool,
}

impl PresetStore {
    /// Open a store at an explicit directory, creating it if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
        }
        let mut store = Self {
            dir,
            cached: Vec::new(),
            cache_dirty: true,
        };
        store.refresh_cache()?;
        Ok(store)
    }

    /// Open the store at the platform data directory.
    pub fn open_default() -> Result<Self, StoreError> {
        Self::open(Self::default_location()?)
    }

    /// Platform preset directory (`<data dir>/presets`).
    pub fn default_location() -> Result<PathBuf, StoreError> {
        let dirs = ProjectDirs::from("systems", "cindergrid", "cindergrid")
            .ok_or(StoreError::NoStoreDirectory)?;
        Ok(dirs.data_dir().join("presets"))
    }

    /// The folder backing this store.
    pub fn directory(&self) -> &Path {
        &self.dir
    }

    /// List stored presets, refreshing the cache if anything changed.
    pub fn list(&mut self) -> Result<&[PresetInfo], StoreError> {
        if self.cache_dirty {
            self.refresh_cache()?;
        }
        Ok(&self.cached)
    }

    /// Save a document under `name`, overwriting any existing file.
    pub fn save(&mut self, name: &str, doc: &PresetDoc) -> Result<(), StoreError> {
        let path = self.preset_path(name)?;
        fs::write(&path, doc.to_json()?)?;
        self.cache_dirty = true;
        log::info!("saved preset `{}`", name);
        Ok(())
    }

    /// Load the document stored under `name`.
    pub fn load(&self, name: &str) -> Result<PresetDoc, StoreError> {
        let path = self.preset_path(name)?;
        if !path.exists() {
            return Err(StoreError::NotFound(name.to_string()));
        }
        Ok(PresetDoc::from_json(&fs::read_to_string(&path)?)?)
    }

    /// Delete the preset stored under `name`.
    pub fn delete(&mut self, name: &str) -> Result<(), StoreError> {
        let path = self.preset_path(name)?;
        if !path.exists() {
            return Err(StoreError::NotFound(name.to_string()));
        }
        fs::remove_file(&path)?;
        self.cache_dirty = true;
        log::info!("deleted preset `{}`", name);
        Ok(())
    }

    /// Whether a preset exists under `name`.
    pub fn exists(&self, name: &str) -> bool {
        self.preset_path(name).is_ok_and(|p| p.exists())
    }

    fn preset_path(&self, name: &str) -> Result<PathBuf, StoreError> {
        let sanitized = sanitize_filename(name);
        if sanitized.is_empty() {
            return Err(StoreError::InvalidName(name.to_string()));
        }
        Ok(self.dir.join(format!("{}.json", sanitized)))
    }

    fn refresh_cache(&mut self) -> Result<(), StoreError> {
        self.cached.clear();

        if !self.dir.exists() {
            self.cache_dirty = false;
            return Ok(());
        }

        for entry in fs::read_dir(&self.dir)?.flatten() {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json")
                && let Some(stem) = path.file_stem().and_then(|s| s.to_str())
            {
                self.cached.push(PresetInfo {
                    name: stem.to_string(),
                });
            }
        }

        self.cached.sort_by(|a, b| a.name.cmp(&b.name));
        self.cache_dirty = false;
        Ok(())
    }
}

/// Strip path separators and other filesystem-hostile characters.
fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '.' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect::<String>()
        .trim()
        .to_string()
}

//! Persistent storage for imported artifacts.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use rootcause::prelude::*;
use thiserror::Error;
use tracing::debug;

use crate::data::asset::{AssetData, AssetType};
use crate::data::container;
use crate::data::model_header::parse_model_header;
use crate::models::scene::MaterialSlot;
use crate::recognized::Recognized;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("cannot write asset {}", .0.display())]
    Write(PathBuf),
    #[error("cannot read asset {}", .0.display())]
    Read(PathBuf),
}

/// Type tag, layout version and metadata of a stored artifact.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredHeader {
    pub type_name: Recognized<AssetType, String>,
    pub serialized_version: u32,
    pub metadata: Vec<u8>,
}

/// The parts of a stored artifact that survive a re-import.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredAsset {
    pub asset_type: AssetType,
    pub material_slots: Vec<MaterialSlot>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AssetLoad {
    /// Nothing is stored at the path.
    Missing,
    /// Something is stored but could not be loaded.
    NotLoaded,
    Loaded(StoredAsset),
}

pub trait AssetStorage {
    fn load_header(&self, path: &Path) -> Option<StoredHeader>;
    fn load_asset(&self, path: &Path) -> AssetLoad;
    fn save(&mut self, path: &Path, data: AssetData) -> Result<(), Report<StorageError>>;
}

/// Decode the persistent parts of an artifact from its header chunk.
fn load_stored_asset(asset_type: AssetType, header_chunk: Option<&[u8]>, path: &Path) -> AssetLoad {
    let material_slots = if asset_type.has_material_slots() {
        let Some(chunk) = header_chunk else {
            debug!("{}: model artifact has no header chunk", path.display());
            return AssetLoad::NotLoaded;
        };
        match parse_model_header(chunk) {
            Ok(header) => header.materials,
            Err(e) => {
                debug!("{}: cannot read model header: {e}", path.display());
                return AssetLoad::NotLoaded;
            }
        }
    } else {
        Vec::new()
    };
    AssetLoad::Loaded(StoredAsset {
        asset_type,
        material_slots,
    })
}

/// Artifacts kept in process memory.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    assets: HashMap<PathBuf, AssetData>,
}

impl MemoryStorage {
    pub fn insert(&mut self, path: impl Into<PathBuf>, data: AssetData) {
        self.assets.insert(path.into(), data);
    }

    pub fn get(&self, path: impl AsRef<Path>) -> Option<&AssetData> {
        self.assets.get(path.as_ref())
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.assets.keys().map(PathBuf::as_path)
    }
}

impl AssetStorage for MemoryStorage {
    fn load_header(&self, path: &Path) -> Option<StoredHeader> {
        let data = self.assets.get(path)?;
        Some(StoredHeader {
            type_name: Recognized::Known(data.type_name),
            serialized_version: data.serialized_version,
            metadata: data.metadata.clone(),
        })
    }

    fn load_asset(&self, path: &Path) -> AssetLoad {
        match self.assets.get(path) {
            Some(data) => load_stored_asset(data.type_name, data.chunk(0), path),
            None => AssetLoad::Missing,
        }
    }

    fn save(&mut self, path: &Path, data: AssetData) -> Result<(), Report<StorageError>> {
        self.assets.insert(path.to_path_buf(), data);
        Ok(())
    }
}

/// Artifacts stored as container files below a root directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn full_path(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }

    /// Read and parse the container at `path`.
    pub fn read_container(&self, path: &Path) -> Result<container::Container, Report<StorageError>> {
        let full_path = self.full_path(path);
        let bytes = fs::read(&full_path).context(StorageError::Read(full_path.clone()))?;
        container::parse(&bytes).context(StorageError::Read(full_path))
    }
}

impl AssetStorage for FileStorage {
    fn load_header(&self, path: &Path) -> Option<StoredHeader> {
        let full_path = self.full_path(path);
        let bytes = fs::read(&full_path).ok()?;
        match container::parse_header(&bytes) {
            Ok(header) => Some(header),
            Err(e) => {
                debug!("{}: {e}", full_path.display());
                None
            }
        }
    }

    fn load_asset(&self, path: &Path) -> AssetLoad {
        if !self.full_path(path).exists() {
            return AssetLoad::Missing;
        }
        let container = match self.read_container(path) {
            Ok(container) => container,
            Err(e) => {
                debug!("{e}");
                return AssetLoad::NotLoaded;
            }
        };
        let Some(asset_type) = container.header.type_name.known().copied() else {
            return AssetLoad::NotLoaded;
        };
        let header_chunk = container
            .chunks
            .iter()
            .find(|(index, _)| *index == 0)
            .map(|(_, bytes)| bytes.as_slice());
        load_stored_asset(asset_type, header_chunk, path)
    }

    fn save(&mut self, path: &Path, data: AssetData) -> Result<(), Report<StorageError>> {
        let full_path = self.full_path(path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).context(StorageError::Write(full_path.clone()))?;
        }
        fs::write(&full_path, container::encode(&data))
            .context(StorageError::Write(full_path))?;
        Ok(())
    }
}

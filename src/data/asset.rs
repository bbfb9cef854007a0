//! Asset type tags and the chunked payload built for one artifact.

use crate::error::ImportError;
use crate::recognized::Recognized;

/// Number of chunk slots an artifact can hold.
pub const MAX_CHUNKS: usize = 16;
/// Chunk slot reserved for the model signed distance field.
pub const SDF_CHUNK_INDEX: usize = 15;

/// Kind of persisted artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetType {
    Model,
    SkinnedModel,
    Animation,
}

impl AssetType {
    pub const ALL: [AssetType; 3] = [
        AssetType::Model,
        AssetType::SkinnedModel,
        AssetType::Animation,
    ];

    /// Type tag written into the artifact header.
    pub const fn type_name(&self) -> &'static str {
        match self {
            AssetType::Model => "ModelImport.Model",
            AssetType::SkinnedModel => "ModelImport.SkinnedModel",
            AssetType::Animation => "ModelImport.Animation",
        }
    }

    /// Current layout version written for this type.
    pub const fn serialized_version(&self) -> u32 {
        match self {
            AssetType::Model => 25,
            AssetType::SkinnedModel => 5,
            AssetType::Animation => 1,
        }
    }

    /// Oldest layout version whose import metadata can still be reused.
    pub const fn min_restorable_version(&self) -> u32 {
        match self {
            AssetType::Model => 4,
            AssetType::SkinnedModel => 1,
            AssetType::Animation => 1,
        }
    }

    pub fn from_type_name(name: &str) -> Recognized<AssetType, String> {
        AssetType::ALL
            .into_iter()
            .find(|ty| ty.type_name() == name)
            .map_or_else(|| Recognized::Unknown(name.to_owned()), Recognized::Known)
    }

    /// Whether the artifact carries a model header with material slots.
    pub fn has_material_slots(&self) -> bool {
        matches!(self, AssetType::Model | AssetType::SkinnedModel)
    }
}

impl std::fmt::Display for AssetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Header, chunks and metadata of an artifact being created.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetData {
    pub type_name: AssetType,
    pub serialized_version: u32,
    chunks: Vec<Option<Vec<u8>>>,
    pub metadata: Vec<u8>,
}

impl AssetData {
    pub fn new(type_name: AssetType) -> Self {
        Self {
            type_name,
            serialized_version: type_name.serialized_version(),
            chunks: vec![None; MAX_CHUNKS],
            metadata: Vec::new(),
        }
    }

    /// Allocate the chunk at `index` and return its empty buffer.
    ///
    /// Fails for indices past [`MAX_CHUNKS`] and for chunks that are already
    /// allocated.
    pub fn allocate_chunk(&mut self, index: usize) -> Result<&mut Vec<u8>, ImportError> {
        let chunk = self
            .chunks
            .get_mut(index)
            .filter(|chunk| chunk.is_none())
            .ok_or(ImportError::CannotAllocateChunk {
                index,
                max: MAX_CHUNKS,
            })?;
        Ok(chunk.insert(Vec::new()))
    }

    /// Allocate the chunk at `index` and fill it with `bytes`.
    pub fn write_chunk(&mut self, index: usize, bytes: &[u8]) -> Result<(), ImportError> {
        self.allocate_chunk(index)?.extend_from_slice(bytes);
        Ok(())
    }

    pub fn chunk(&self, index: usize) -> Option<&[u8]> {
        self.chunks.get(index)?.as_deref()
    }

    /// `(index, bytes)` of every allocated chunk, in index order.
    pub fn allocated_chunks(&self) -> impl Iterator<Item = (usize, &[u8])> {
        self.chunks
            .iter()
            .enumerate()
            .filter_map(|(index, chunk)| Some((index, chunk.as_deref()?)))
    }

    pub(crate) fn set_chunk(&mut self, index: usize, bytes: Vec<u8>) -> Result<(), ImportError> {
        *self.allocate_chunk(index)? = bytes;
        Ok(())
    }
}

use thiserror::Error;

use crate::export::pack::PackError;
use crate::import::options::ModelType;

/// Result code of a single artifact import, as reported to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CreateAssetResult {
    Ok,
    Error,
    CannotAllocateChunk,
    InvalidTypeId,
}

impl CreateAssetResult {
    pub fn is_ok(&self) -> bool {
        matches!(self, CreateAssetResult::Ok)
    }
}

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Cannot import model file: {0}")]
    Parse(String),
    #[error("Model has no valid meshes")]
    EmptyModel,
    #[error("Cannot allocate chunk {index} (max: {max})")]
    CannotAllocateChunk { index: usize, max: usize },
    #[error("Unsupported asset type: {0:?}")]
    InvalidType(ModelType),
    #[error("Cannot pack asset data: {0}")]
    Pack(#[from] PackError),
    #[error("Error serializing import metadata: {err}")]
    SerdeJson {
        #[from]
        err: serde_json::Error,
    },
    #[error("Cannot save asset: {0}")]
    Storage(String),
}

impl ImportError {
    /// The result code this failure is reported as.
    pub fn result(&self) -> CreateAssetResult {
        match self {
            ImportError::CannotAllocateChunk { .. } => CreateAssetResult::CannotAllocateChunk,
            ImportError::InvalidType(_) => CreateAssetResult::InvalidTypeId,
            ImportError::Parse(_)
            | ImportError::EmptyModel
            | ImportError::Pack(_)
            | ImportError::SerdeJson { .. }
            | ImportError::Storage(_) => CreateAssetResult::Error,
        }
    }
}

pub type IResult<T> = Result<T, ImportError>;

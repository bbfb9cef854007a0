//! On-disk container holding one artifact.
//!
//! Layout (little-endian):
//!
//! ```text
//! u32   magic "MIAF"
//! u32   container version
//! u16   type name length, then UTF-8 type name
//! u32   serialized version of the artifact layout
//! u32   metadata length, then metadata bytes (JSON)
//! u8    chunk count
//! per chunk:
//!   u8  chunk index
//!   u32 length, then chunk bytes
//! ```

use rootcause::Report;
use thiserror::Error;
use winnow::Parser;
use winnow::binary::{le_u32, length_take, u8 as le_u8};

use crate::data::asset::{AssetData, AssetType, MAX_CHUNKS};
use crate::data::parser_utils::{WResult, offset_of, parse_string_u16};
use crate::data::storage::StoredHeader;

/// Magic bytes: `MIAF` = 0x4641494D little-endian.
pub const CONTAINER_MAGIC: u32 = 0x4641494D;
pub const CONTAINER_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("data too short: need at least {need} bytes, have {have}")]
    DataTooShort { need: usize, have: usize },
    #[error("bad magic: expected 0x{:08X}, got 0x{got:08X}", CONTAINER_MAGIC)]
    BadMagic { got: u32 },
    #[error("unsupported container version {0}")]
    UnsupportedVersion(u32),
    #[error("chunk index {0} is out of range")]
    ChunkIndexOutOfRange(u8),
    #[error("parse error at 0x{offset:X}: {detail}")]
    ParseError { offset: usize, detail: String },
}

/// A fully parsed container.
#[derive(Debug, Clone, PartialEq)]
pub struct Container {
    pub header: StoredHeader,
    /// `(index, bytes)` in file order.
    pub chunks: Vec<(usize, Vec<u8>)>,
}

impl Container {
    /// Rebuild the in-memory artifact, if its type is one this crate writes.
    pub fn into_asset_data(self) -> Option<AssetData> {
        let asset_type = self.header.type_name.into_known()?;
        let mut data = AssetData::new(asset_type);
        data.serialized_version = self.header.serialized_version;
        data.metadata = self.header.metadata;
        for (index, bytes) in self.chunks {
            data.set_chunk(index, bytes).ok()?;
        }
        Some(data)
    }
}

pub fn encode(data: &AssetData) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&CONTAINER_MAGIC.to_le_bytes());
    out.extend_from_slice(&CONTAINER_VERSION.to_le_bytes());

    let type_name = data.type_name.type_name();
    out.extend_from_slice(&(type_name.len() as u16).to_le_bytes());
    out.extend_from_slice(type_name.as_bytes());
    out.extend_from_slice(&data.serialized_version.to_le_bytes());
    out.extend_from_slice(&(data.metadata.len() as u32).to_le_bytes());
    out.extend_from_slice(&data.metadata);

    let chunks: Vec<(usize, &[u8])> = data.allocated_chunks().collect();
    // At most MAX_CHUNKS slots exist, so the count fits a byte.
    out.push(chunks.len() as u8);
    for (index, bytes) in chunks {
        out.push(index as u8);
        out.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
        out.extend_from_slice(bytes);
    }
    out
}

/// Winnow sub-parser for the fixed preamble: `(magic, version)`.
fn parse_preamble(input: &mut &[u8]) -> WResult<(u32, u32)> {
    let magic = le_u32.parse_next(input)?;
    let version = le_u32.parse_next(input)?;
    Ok((magic, version))
}

/// Winnow sub-parser for the variable header: `(type name, serialized version, metadata)`.
fn parse_header_fields(input: &mut &[u8]) -> WResult<(String, u32, Vec<u8>)> {
    let type_name = parse_string_u16(input)?;
    let serialized_version = le_u32.parse_next(input)?;
    let metadata: &[u8] = length_take(le_u32).parse_next(input)?;
    Ok((type_name, serialized_version, metadata.to_vec()))
}

fn parse_chunk(input: &mut &[u8]) -> WResult<(u8, Vec<u8>)> {
    let index = le_u8.parse_next(input)?;
    let bytes: &[u8] = length_take(le_u32).parse_next(input)?;
    Ok((index, bytes.to_vec()))
}

fn winnow_error(
    file_data: &[u8],
    remaining: &[u8],
    e: winnow::error::ErrMode<winnow::error::ContextError>,
) -> Report<ContainerError> {
    Report::new(ContainerError::ParseError {
        offset: offset_of(file_data, remaining),
        detail: format!("{e}"),
    })
}

/// Parse the header, leaving `input` at the chunk table.
fn parse_header_from(
    file_data: &[u8],
    input: &mut &[u8],
) -> Result<StoredHeader, Report<ContainerError>> {
    let (magic, version) = parse_preamble(input).map_err(|e| {
        if file_data.len() < 8 {
            Report::new(ContainerError::DataTooShort {
                need: 8,
                have: file_data.len(),
            })
        } else {
            winnow_error(file_data, *input, e)
        }
    })?;
    if magic != CONTAINER_MAGIC {
        return Err(Report::new(ContainerError::BadMagic { got: magic }));
    }
    if version != CONTAINER_VERSION {
        return Err(Report::new(ContainerError::UnsupportedVersion(version)));
    }

    let (type_name, serialized_version, metadata) =
        parse_header_fields(input).map_err(|e| winnow_error(file_data, *input, e))?;
    Ok(StoredHeader {
        type_name: AssetType::from_type_name(&type_name),
        serialized_version,
        metadata,
    })
}

/// Parse only the header of a container file.
pub fn parse_header(file_data: &[u8]) -> Result<StoredHeader, Report<ContainerError>> {
    let input = &mut &file_data[..];
    parse_header_from(file_data, input)
}

/// Parse a whole container file.
pub fn parse(file_data: &[u8]) -> Result<Container, Report<ContainerError>> {
    let input = &mut &file_data[..];
    let header = parse_header_from(file_data, input)?;

    let count = le_u8
        .parse_next(input)
        .map_err(|e| winnow_error(file_data, *input, e))?;
    let mut chunks = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let (index, bytes) = parse_chunk(input).map_err(|e| winnow_error(file_data, *input, e))?;
        if index as usize >= MAX_CHUNKS {
            return Err(Report::new(ContainerError::ChunkIndexOutOfRange(index)));
        }
        chunks.push((index as usize, bytes));
    }
    Ok(Container { header, chunks })
}

//! Reader for the model header stored in chunk 0 of model artifacts.
//!
//! Only the parts needed after an import are decoded: the material slot table
//! (to carry materials across re-imports) and the per-LOD mesh summaries (for
//! inspection). A skinned header's trailing skeleton is left unread.

use rootcause::Report;
use thiserror::Error;
use winnow::Parser;
use winnow::binary::{le_f32, le_u16, le_u32, le_u64, u8 as le_u8};

use crate::data::parser_utils::{WResult, offset_of, parse_string_u32};
use crate::export::pack::MODEL_HEADER_VERSION;
use crate::models::scene::{AssetId, BoundingBox, MaterialSlot, ShadowsCastingMode};

#[derive(Debug, Error)]
pub enum HeaderError {
    #[error("unsupported model header version {0}")]
    UnsupportedVersion(u8),
    #[error("invalid shadows mode {mode} for material slot {slot}")]
    InvalidShadowsMode { slot: usize, mode: u8 },
    #[error("parse error at 0x{offset:X}: {detail}")]
    ParseError { offset: usize, detail: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct MeshInfo {
    pub name: String,
    pub material_slot_index: u32,
    pub bounds: BoundingBox,
    pub sphere_center: [f32; 3],
    pub sphere_radius: f32,
    pub vertex_count: u32,
    pub triangle_count: u32,
    pub flags: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LodInfo {
    pub screen_size: f32,
    pub meshes: Vec<MeshInfo>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelHeader {
    pub min_screen_size: f32,
    pub materials: Vec<MaterialSlot>,
    pub lods: Vec<LodInfo>,
}

fn parse_float3(input: &mut &[u8]) -> WResult<[f32; 3]> {
    Ok([
        le_f32.parse_next(input)?,
        le_f32.parse_next(input)?,
        le_f32.parse_next(input)?,
    ])
}

/// `(material id, raw shadows mode, name)`
fn parse_slot(input: &mut &[u8]) -> WResult<(u64, u8, String)> {
    let material = le_u64.parse_next(input)?;
    let shadows_mode = le_u8.parse_next(input)?;
    let name = parse_string_u32(input)?;
    Ok((material, shadows_mode, name))
}

fn parse_mesh_info(input: &mut &[u8]) -> WResult<MeshInfo> {
    let name = parse_string_u32(input)?;
    let material_slot_index = le_u32.parse_next(input)?;
    let min = parse_float3(input)?;
    let max = parse_float3(input)?;
    let sphere_center = parse_float3(input)?;
    let sphere_radius = le_f32.parse_next(input)?;
    let vertex_count = le_u32.parse_next(input)?;
    let triangle_count = le_u32.parse_next(input)?;
    let flags = le_u8.parse_next(input)?;
    Ok(MeshInfo {
        name,
        material_slot_index,
        bounds: BoundingBox { min, max },
        sphere_center,
        sphere_radius,
        vertex_count,
        triangle_count,
        flags,
    })
}

fn parse_lod_info(input: &mut &[u8]) -> WResult<LodInfo> {
    let screen_size = le_f32.parse_next(input)?;
    let mesh_count = le_u16.parse_next(input)?;
    let meshes = (0..mesh_count)
        .map(|_| parse_mesh_info(input))
        .collect::<WResult<Vec<_>>>()?;
    Ok(LodInfo {
        screen_size,
        meshes,
    })
}

/// Parse the model header at the start of `chunk`.
pub fn parse_model_header(chunk: &[u8]) -> Result<ModelHeader, Report<HeaderError>> {
    let input = &mut &chunk[..];
    let parse_error = |remaining: &[u8], e: winnow::error::ErrMode<winnow::error::ContextError>| {
        Report::new(HeaderError::ParseError {
            offset: offset_of(chunk, remaining),
            detail: format!("{e}"),
        })
    };

    let version = le_u8.parse_next(input).map_err(|e| parse_error(*input, e))?;
    if version != MODEL_HEADER_VERSION {
        return Err(Report::new(HeaderError::UnsupportedVersion(version)));
    }
    let min_screen_size = le_f32.parse_next(input).map_err(|e| parse_error(*input, e))?;

    let slot_count = le_u32.parse_next(input).map_err(|e| parse_error(*input, e))?;
    let mut materials = Vec::new();
    for slot in 0..slot_count as usize {
        let (material, mode, name) = parse_slot(input).map_err(|e| parse_error(*input, e))?;
        let shadows_mode = ShadowsCastingMode::from_u8(mode)
            .ok_or_else(|| Report::new(HeaderError::InvalidShadowsMode { slot, mode }))?;
        materials.push(MaterialSlot {
            name,
            shadows_mode,
            material: AssetId(material),
        });
    }

    let lod_count = le_u8.parse_next(input).map_err(|e| parse_error(*input, e))?;
    let lods = (0..lod_count)
        .map(|_| parse_lod_info(input))
        .collect::<WResult<Vec<_>>>()
        .map_err(|e| parse_error(*input, e))?;

    Ok(ModelHeader {
        min_screen_size,
        materials,
        lods,
    })
}

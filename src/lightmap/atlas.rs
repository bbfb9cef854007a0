//! Packing of per-mesh lightmap charts into one shared atlas.
//!
//! Each mesh arrives with its own lightmap UVs covering [0,1]². To bake one
//! lightmap for the whole model, every chart gets a square cell in a shared
//! atlas whose side is proportional to the square root of the mesh surface
//! area, so bigger meshes receive more texels.

use tracing::{debug, warn};

use crate::lightmap::rect_pack::{Rect, RectPack};
use crate::models::scene::Mesh;

/// Number of packing passes before giving up.
pub const MAX_PACK_ATTEMPTS: u32 = 10;
/// Initial slack over the total chart area.
const ATLAS_SIZE_SLACK: f32 = 1.02;
/// Atlas growth factor after a failed pass.
const ATLAS_GROWTH: f32 = 1.5;
/// Chart padding as a fraction of the atlas side (4 texels of a 256 map).
const CHART_PADDING_RATIO: f32 = 4.0 / 256.0;
const AREA_EPSILON: f32 = 1e-6;

/// What the atlas packer did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AtlasOutcome {
    /// Total surface area is (close to) zero; UVs untouched.
    ZeroArea,
    /// Some vertex position is not finite; UVs untouched.
    NonFiniteArea,
    /// All charts placed and UVs rewritten.
    Packed { attempts: u32, atlas_size: f32 },
    /// No pass placed every chart; UVs untouched.
    Exhausted { attempts: u32, atlas_size: f32 },
}

impl AtlasOutcome {
    pub fn is_packed(&self) -> bool {
        matches!(self, AtlasOutcome::Packed { .. })
    }
}

/// Move every mesh's lightmap chart into its own cell of a shared atlas.
pub fn repack_lightmap_uvs(meshes: &mut [Mesh]) -> AtlasOutcome {
    repack_with_attempts(meshes, MAX_PACK_ATTEMPTS)
}

pub(crate) fn repack_with_attempts(meshes: &mut [Mesh], max_attempts: u32) -> AtlasOutcome {
    let areas: Vec<f32> = meshes.iter().map(Mesh::triangles_area).collect();
    let area_sum: f32 = areas.iter().sum();
    if !area_sum.is_finite() {
        warn!("skipping lightmap atlas: mesh positions are not finite");
        return AtlasOutcome::NonFiniteArea;
    }
    if area_sum <= AREA_EPSILON {
        debug!("skipping lightmap atlas: meshes have no surface area");
        return AtlasOutcome::ZeroArea;
    }

    let mut atlas_size = area_sum.sqrt() * ATLAS_SIZE_SLACK;
    let mut pack = RectPack::default();
    let sizes: Vec<f32> = areas.iter().map(|area| area.sqrt()).collect();
    let mut slots: Vec<Rect> = Vec::with_capacity(sizes.len());

    for attempt in 1..=max_attempts {
        let padding = CHART_PADDING_RATIO * atlas_size;
        pack.reset(padding, padding, atlas_size - padding, atlas_size - padding);
        slots.clear();

        let placed_all = sizes.iter().all(|&size| match pack.insert(size, size, padding) {
            Some(slot) => {
                slots.push(slot);
                true
            }
            None => false,
        });

        if placed_all {
            let inv_size = 1.0 / atlas_size;
            for (mesh, slot) in meshes.iter_mut().zip(&slots) {
                let offset = [slot.x * inv_size, slot.y * inv_size];
                let scale = [
                    (slot.width - padding) * inv_size,
                    (slot.height - padding) * inv_size,
                ];
                for uv in &mut mesh.lightmap_uvs {
                    uv[0] = uv[0] * scale[0] + offset[0];
                    uv[1] = uv[1] * scale[1] + offset[1];
                }
            }
            debug!("packed {} lightmap charts in {attempt} attempt(s)", meshes.len());
            return AtlasOutcome::Packed {
                attempts: attempt,
                atlas_size,
            };
        }

        atlas_size *= ATLAS_GROWTH;
    }

    warn!(
        "failed to pack {} lightmap charts after {max_attempts} attempts; keeping per-mesh UVs",
        meshes.len()
    );
    AtlasOutcome::Exhausted {
        attempts: max_attempts,
        atlas_size,
    }
}

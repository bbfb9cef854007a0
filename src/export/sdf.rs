//! Signed distance field baking for model collision and lighting.
//!
//! The field is sampled on a regular grid covering the LOD bounds (plus a
//! small margin). Each sample stores the distance to the closest triangle,
//! negative when the sample lies behind that triangle's face.

use thiserror::Error;

use crate::models::scene::{BoundingBox, Float3, Lod, cross, dot, length, sub};

/// Voxels along the longest axis at resolution 1.0.
const BASE_RESOLUTION: f32 = 32.0;
const MIN_RESOLUTION: u32 = 8;
const MAX_RESOLUTION: u32 = 128;
/// Bounds margin as a fraction of the longest side.
const BOUNDS_MARGIN: f32 = 0.05;

#[derive(Debug, Error)]
pub enum SdfError {
    #[error("LOD has no triangles")]
    NoGeometry,
    #[error("LOD bounds are degenerate")]
    DegenerateBounds,
    #[error("invalid SDF resolution {0}")]
    InvalidResolution(f32),
}

/// What happened to the optional SDF chunk.
#[derive(Debug, Clone, PartialEq)]
pub enum SdfOutcome {
    Baked { dimensions: [u32; 3] },
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SdfVolume {
    pub dimensions: [u32; 3],
    pub bounds: BoundingBox,
    pub voxel_size: f32,
    pub max_distance: f32,
    /// X-major distances, `dimensions[0] * dimensions[1] * dimensions[2]` values.
    pub distances: Vec<f32>,
}

impl SdfVolume {
    pub fn write(&self, out: &mut Vec<u8>) {
        for dimension in self.dimensions {
            out.extend_from_slice(&dimension.to_le_bytes());
        }
        for value in self.bounds.min.iter().chain(&self.bounds.max) {
            out.extend_from_slice(&value.to_le_bytes());
        }
        out.extend_from_slice(&self.voxel_size.to_le_bytes());
        out.extend_from_slice(&self.max_distance.to_le_bytes());
        for distance in &self.distances {
            out.extend_from_slice(&distance.to_le_bytes());
        }
    }

    pub fn sample(&self, x: u32, y: u32, z: u32) -> Option<f32> {
        let [w, h, d] = self.dimensions;
        if x >= w || y >= h || z >= d {
            return None;
        }
        let index = (z as usize * h as usize + y as usize) * w as usize + x as usize;
        self.distances.get(index).copied()
    }
}

/// Closest point to `p` on triangle `abc` (Ericson, Real-Time Collision Detection 5.1.5).
fn closest_point_on_triangle(p: Float3, [a, b, c]: [Float3; 3]) -> Float3 {
    let at = |s: f32, u: Float3, t: f32, v: Float3| {
        [
            a[0] + u[0] * s + v[0] * t,
            a[1] + u[1] * s + v[1] * t,
            a[2] + u[2] * s + v[2] * t,
        ]
    };
    let ab = sub(b, a);
    let ac = sub(c, a);
    let ap = sub(p, a);
    let d1 = dot(ab, ap);
    let d2 = dot(ac, ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return a;
    }

    let bp = sub(p, b);
    let d3 = dot(ab, bp);
    let d4 = dot(ac, bp);
    if d3 >= 0.0 && d4 <= d3 {
        return b;
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        return at(d1 / (d1 - d3), ab, 0.0, ac);
    }

    let cp = sub(p, c);
    let d5 = dot(ab, cp);
    let d6 = dot(ac, cp);
    if d6 >= 0.0 && d5 <= d6 {
        return c;
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        return at(0.0, ab, d2 / (d2 - d6), ac);
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        let bc = sub(c, b);
        return [b[0] + bc[0] * w, b[1] + bc[1] * w, b[2] + bc[2] * w];
    }

    let denom = 1.0 / (va + vb + vc);
    at(vb * denom, ab, vc * denom, ac)
}

/// Bake the distance field of `lod`, scaling the grid by `resolution`.
pub fn bake_sdf(lod: &Lod, resolution: f32) -> Result<SdfVolume, SdfError> {
    if !(resolution.is_finite() && resolution > 0.0) {
        return Err(SdfError::InvalidResolution(resolution));
    }
    let triangles: Vec<([Float3; 3], Float3)> = lod
        .meshes
        .iter()
        .flat_map(|mesh| mesh.triangles())
        .map(|tri| (tri, cross(sub(tri[1], tri[0]), sub(tri[2], tri[0]))))
        .collect();
    if triangles.is_empty() {
        return Err(SdfError::NoGeometry);
    }

    let mut bounds = lod.bounds();
    let longest = bounds.size().into_iter().fold(0.0f32, f32::max);
    if longest <= f32::EPSILON {
        return Err(SdfError::DegenerateBounds);
    }
    let margin = longest * BOUNDS_MARGIN;
    for axis in 0..3 {
        bounds.min[axis] -= margin;
        bounds.max[axis] += margin;
    }

    let longest_voxels = ((BASE_RESOLUTION * resolution).round() as u32)
        .clamp(MIN_RESOLUTION, MAX_RESOLUTION);
    let voxel_size = (longest + 2.0 * margin) / longest_voxels as f32;
    let size = bounds.size();
    // Tolerance keeps the longest axis at exactly `longest_voxels`.
    let dimensions = size.map(|extent| {
        ((extent / voxel_size - 1e-3).ceil() as u32).clamp(1, MAX_RESOLUTION)
    });
    let max_distance = length(size);

    let mut distances =
        Vec::with_capacity((dimensions[0] * dimensions[1] * dimensions[2]) as usize);
    for z in 0..dimensions[2] {
        for y in 0..dimensions[1] {
            for x in 0..dimensions[0] {
                let p = [
                    bounds.min[0] + (x as f32 + 0.5) * voxel_size,
                    bounds.min[1] + (y as f32 + 0.5) * voxel_size,
                    bounds.min[2] + (z as f32 + 0.5) * voxel_size,
                ];
                distances.push(signed_distance(p, &triangles).clamp(-max_distance, max_distance));
            }
        }
    }

    Ok(SdfVolume {
        dimensions,
        bounds,
        voxel_size,
        max_distance,
        distances,
    })
}

fn signed_distance(p: Float3, triangles: &[([Float3; 3], Float3)]) -> f32 {
    let mut best = f32::INFINITY;
    let mut sign = 1.0;
    for (tri, normal) in triangles {
        let closest = closest_point_on_triangle(p, *tri);
        let offset = sub(p, closest);
        let distance = length(offset);
        if distance < best {
            best = distance;
            sign = if dot(offset, *normal) < 0.0 { -1.0 } else { 1.0 };
        }
    }
    best * sign
}

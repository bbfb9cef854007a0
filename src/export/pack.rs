//! Little-endian packing of model headers, mesh buffers and animation clips.
//!
//! Layouts:
//!
//! - Model header: `u8` version, `f32` minimum screen size, the material slot
//!   table (`u32` count, then per slot `u64` material id, `u8` shadows mode and
//!   name), then the LOD table (`u8` count, then per LOD `f32` screen size,
//!   `u16` mesh count and a name, slot, bounds and counts record per mesh). Skinned
//!   headers append the skeleton nodes and bones.
//! - Mesh data: `u32` vertex count, `u32` triangle count, `u8` index size,
//!   `u8` attribute flags, then the attribute arrays, skin data and indices.
//! - Animation: `u32` version, `f64` duration, `f64` frames per second and
//!   one keyframe set per animated node.
//!
//! Strings are a `u32` byte length followed by UTF-8 bytes.

use thiserror::Error;

use crate::models::scene::{
    Animation, Float2, Keyframe, Lod, Mesh, SceneModel, Skeleton, Transform,
};

pub const MODEL_HEADER_VERSION: u8 = 2;
/// Leading byte of every skinned LOD chunk.
pub const SKINNED_MESH_DATA_VERSION: u8 = 1;
pub const ANIMATION_VERSION: u32 = 100;

pub const MESH_FLAG_NORMALS: u8 = 1 << 0;
pub const MESH_FLAG_UVS: u8 = 1 << 1;
pub const MESH_FLAG_LIGHTMAP_UVS: u8 = 1 << 2;
pub const MESH_FLAG_SKIN: u8 = 1 << 3;

#[derive(Debug, Error)]
pub enum PackError {
    #[error("mesh '{mesh}' has {found} {attribute} for {expected} vertices")]
    AttributeCountMismatch {
        mesh: String,
        attribute: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("mesh '{mesh}' references vertex {index} but has {vertex_count} vertices")]
    IndexOutOfRange {
        mesh: String,
        index: u32,
        vertex_count: usize,
    },
    #[error("mesh '{mesh}' index count {count} is not a multiple of 3")]
    IncompleteTriangleList { mesh: String, count: usize },
    #[error("mesh '{mesh}' uses material slot {index} of {count}")]
    InvalidMaterialSlot {
        mesh: String,
        index: usize,
        count: usize,
    },
    #[error("skinned mesh '{mesh}' has no blend indices or weights")]
    MissingSkinData { mesh: String },
    #[error("LOD {lod} has {count} meshes")]
    TooManyMeshes { lod: usize, count: usize },
    #[error("model has {0} LODs")]
    TooManyLods(usize),
    #[error("animation {index} requested but {count} clips were imported")]
    AnimationOutOfRange { index: usize, count: usize },
}

pub(crate) fn write_string(out: &mut Vec<u8>, value: &str) {
    out.extend_from_slice(&(value.len() as u32).to_le_bytes());
    out.extend_from_slice(value.as_bytes());
}

fn write_f32s(out: &mut Vec<u8>, values: &[f32]) {
    for value in values {
        out.extend_from_slice(&value.to_le_bytes());
    }
}

fn write_parent(out: &mut Vec<u8>, parent: Option<usize>) {
    let parent = parent.map_or(-1, |index| index as i32);
    out.extend_from_slice(&parent.to_le_bytes());
}

fn write_transform(out: &mut Vec<u8>, transform: &Transform) {
    write_f32s(out, &transform.translation);
    write_f32s(out, &transform.orientation);
    write_f32s(out, &transform.scale);
}

fn mesh_flags(mesh: &Mesh, skinned: bool) -> u8 {
    let mut flags = 0;
    if !mesh.normals.is_empty() {
        flags |= MESH_FLAG_NORMALS;
    }
    if !mesh.uvs.is_empty() {
        flags |= MESH_FLAG_UVS;
    }
    if !mesh.lightmap_uvs.is_empty() {
        flags |= MESH_FLAG_LIGHTMAP_UVS;
    }
    if skinned {
        flags |= MESH_FLAG_SKIN;
    }
    flags
}

/// Write the model header stored in chunk 0.
pub fn write_model_header(
    scene: &SceneModel,
    skinned: bool,
    out: &mut Vec<u8>,
) -> Result<(), PackError> {
    let lod_count = u8::try_from(scene.lods.len())
        .map_err(|_| PackError::TooManyLods(scene.lods.len()))?;

    out.push(MODEL_HEADER_VERSION);
    out.extend_from_slice(&scene.min_screen_size().to_le_bytes());

    out.extend_from_slice(&(scene.materials.len() as u32).to_le_bytes());
    for slot in &scene.materials {
        out.extend_from_slice(&slot.material.0.to_le_bytes());
        out.push(slot.shadows_mode as u8);
        write_string(out, &slot.name);
    }

    out.push(lod_count);
    for (lod_index, lod) in scene.lods.iter().enumerate() {
        let mesh_count = u16::try_from(lod.meshes.len()).map_err(|_| PackError::TooManyMeshes {
            lod: lod_index,
            count: lod.meshes.len(),
        })?;
        out.extend_from_slice(&lod.screen_size.to_le_bytes());
        out.extend_from_slice(&mesh_count.to_le_bytes());

        for mesh in &lod.meshes {
            if mesh.material_slot_index >= scene.materials.len() {
                return Err(PackError::InvalidMaterialSlot {
                    mesh: mesh.name.clone(),
                    index: mesh.material_slot_index,
                    count: scene.materials.len(),
                });
            }
            let bounds = mesh.bounds();
            write_string(out, &mesh.name);
            out.extend_from_slice(&(mesh.material_slot_index as u32).to_le_bytes());
            write_f32s(out, &bounds.min);
            write_f32s(out, &bounds.max);
            write_f32s(out, &bounds.center());
            out.extend_from_slice(&bounds.bounding_radius().to_le_bytes());
            out.extend_from_slice(&(mesh.vertex_count() as u32).to_le_bytes());
            out.extend_from_slice(&(mesh.triangle_count() as u32).to_le_bytes());
            out.push(mesh_flags(mesh, skinned));
        }
    }

    if skinned {
        write_skeleton(&scene.skeleton, out);
    }
    Ok(())
}

fn write_skeleton(skeleton: &Skeleton, out: &mut Vec<u8>) {
    out.extend_from_slice(&(skeleton.nodes.len() as u32).to_le_bytes());
    for node in &skeleton.nodes {
        write_string(out, &node.name);
        write_parent(out, node.parent_index);
        write_transform(out, &node.local_transform);
    }
    out.extend_from_slice(&(skeleton.bones.len() as u32).to_le_bytes());
    for bone in &skeleton.bones {
        write_parent(out, bone.parent_index);
        out.extend_from_slice(&(bone.node_index as u32).to_le_bytes());
        write_transform(out, &bone.local_transform);
        write_f32s(out, &bone.offset_matrix);
    }
}

fn check_attribute<T>(
    mesh: &Mesh,
    attribute: &'static str,
    values: &[T],
    required: bool,
) -> Result<(), PackError> {
    let expected = mesh.vertex_count();
    if values.len() == expected || (!required && values.is_empty()) {
        return Ok(());
    }
    if required && values.is_empty() {
        return Err(PackError::MissingSkinData {
            mesh: mesh.name.clone(),
        });
    }
    Err(PackError::AttributeCountMismatch {
        mesh: mesh.name.clone(),
        attribute,
        expected,
        found: values.len(),
    })
}

fn validate_mesh(mesh: &Mesh, skinned: bool) -> Result<(), PackError> {
    check_attribute(mesh, "normals", &mesh.normals, false)?;
    check_attribute(mesh, "uvs", &mesh.uvs, false)?;
    check_attribute(mesh, "lightmap uvs", &mesh.lightmap_uvs, false)?;
    if skinned {
        check_attribute(mesh, "blend indices", &mesh.blend_indices, true)?;
        check_attribute(mesh, "blend weights", &mesh.blend_weights, true)?;
    }
    if mesh.indices.len() % 3 != 0 {
        return Err(PackError::IncompleteTriangleList {
            mesh: mesh.name.clone(),
            count: mesh.indices.len(),
        });
    }
    let vertex_count = mesh.vertex_count();
    if let Some(&index) = mesh.indices.iter().find(|&&i| i as usize >= vertex_count) {
        return Err(PackError::IndexOutOfRange {
            mesh: mesh.name.clone(),
            index,
            vertex_count,
        });
    }
    Ok(())
}

/// Write one mesh's vertex and index buffers.
///
/// Indices are stored as 16 bits when every vertex is addressable that way.
pub fn write_mesh(mesh: &Mesh, skinned: bool, out: &mut Vec<u8>) -> Result<(), PackError> {
    validate_mesh(mesh, skinned)?;

    let use_16_bit = mesh.vertex_count() <= u16::MAX as usize + 1;
    out.extend_from_slice(&(mesh.vertex_count() as u32).to_le_bytes());
    out.extend_from_slice(&(mesh.triangle_count() as u32).to_le_bytes());
    out.push(if use_16_bit { 2 } else { 4 });
    out.push(mesh_flags(mesh, skinned));

    for position in &mesh.positions {
        write_f32s(out, position);
    }
    for normal in &mesh.normals {
        write_f32s(out, normal);
    }
    let write_uvs = |out: &mut Vec<u8>, uvs: &[Float2]| {
        for uv in uvs {
            write_f32s(out, uv);
        }
    };
    write_uvs(out, &mesh.uvs);
    write_uvs(out, &mesh.lightmap_uvs);

    if skinned {
        for joints in &mesh.blend_indices {
            for joint in joints {
                out.extend_from_slice(&joint.to_le_bytes());
            }
        }
        for weights in &mesh.blend_weights {
            write_f32s(out, weights);
        }
    }

    if use_16_bit {
        for &index in &mesh.indices {
            out.extend_from_slice(&(index as u16).to_le_bytes());
        }
    } else {
        for &index in &mesh.indices {
            out.extend_from_slice(&index.to_le_bytes());
        }
    }
    Ok(())
}

/// Write every mesh of a LOD back to back.
pub fn write_lod(lod: &Lod, skinned: bool, out: &mut Vec<u8>) -> Result<(), PackError> {
    if skinned {
        out.push(SKINNED_MESH_DATA_VERSION);
    }
    for mesh in &lod.meshes {
        write_mesh(mesh, skinned, out)?;
    }
    Ok(())
}

fn write_keyframes<const N: usize>(out: &mut Vec<u8>, keys: &[Keyframe<[f32; N]>]) {
    out.extend_from_slice(&(keys.len() as u32).to_le_bytes());
    for key in keys {
        out.extend_from_slice(&key.time.to_le_bytes());
        write_f32s(out, &key.value);
    }
}

/// Write a single animation clip.
pub fn write_animation(clip: &Animation, out: &mut Vec<u8>) {
    out.extend_from_slice(&ANIMATION_VERSION.to_le_bytes());
    out.extend_from_slice(&clip.duration.to_le_bytes());
    out.extend_from_slice(&clip.frames_per_second.to_le_bytes());
    out.extend_from_slice(&(clip.channels.len() as u32).to_le_bytes());
    for channel in &clip.channels {
        write_string(out, &channel.node_name);
        write_keyframes::<3>(out, &channel.positions);
        write_keyframes::<4>(out, &channel.rotations);
        write_keyframes::<3>(out, &channel.scales);
    }
}

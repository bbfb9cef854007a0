//! Partitioning of LOD 0 meshes into logical objects.
//!
//! Parsers emit one mesh per (object, material) pair, so several meshes may
//! share a name. Meshes with the same name form one object. Groups are sorted
//! by key so that group indices (and the artifact names derived from them)
//! stay the same across re-imports even when the parser changes mesh order.

use itertools::Itertools;

use crate::models::scene::Mesh;

/// Meshes of LOD 0 sharing a name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeshGroup {
    pub key: String,
    /// Positions of the members within LOD 0, in their original order.
    pub members: Vec<usize>,
}

impl MeshGroup {
    /// The part of the key after the last `|` separator (exporters use `|` to
    /// encode hierarchy paths in mesh names).
    pub fn short_name(&self) -> &str {
        short_name(&self.key)
    }
}

pub(crate) fn short_name(key: &str) -> &str {
    key.rsplit_once('|').map_or(key, |(_, tail)| tail)
}

/// Group meshes by exact name, ordered ascending by ordinal key comparison.
pub fn group_meshes_by_name(meshes: &[Mesh]) -> Vec<MeshGroup> {
    meshes
        .iter()
        .enumerate()
        .into_group_map_by(|&(_, mesh)| mesh.name.as_str())
        .into_iter()
        .sorted_unstable_by(|(a, _), (b, _)| a.cmp(b))
        .map(|(key, members)| MeshGroup {
            key: key.to_owned(),
            members: members.into_iter().map(|(index, _)| index).collect(),
        })
        .collect()
}

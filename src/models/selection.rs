//! Extraction of a single logical object out of a parsed scene.
//!
//! There are two ways to pull an object out:
//!
//! - [`select_object`] works on a scene owned by the current artifact and
//!   throws away everything that does not belong to the object.
//! - [`SharedScene::take_object`] works on a scene shared by several sibling
//!   artifacts of a split import. The object's meshes are moved out of the
//!   shared arena into a fresh [`SceneModel`], so they can never be handed
//!   out twice, while the skeleton and node data are copied.

use tracing::debug;

use crate::models::grouping::MeshGroup;
use crate::models::materials::consolidate_material_slots;
use crate::models::scene::{Animation, Lod, MaterialSlot, Mesh, Node, SceneModel, Skeleton};

/// Keep only the meshes of `group` in `scene` and rebuild its material slots.
///
/// LOD 0 keeps exactly the group's members; every other LOD keeps the meshes
/// named like the group key. Returns the number of released meshes.
pub fn select_object(scene: &mut SceneModel, group: &MeshGroup) -> usize {
    let before: usize = scene.lods.iter().map(|lod| lod.meshes.len()).sum();

    if let Some(lod0) = scene.lods.first_mut() {
        let mut meshes: Vec<Option<Mesh>> =
            std::mem::take(&mut lod0.meshes).into_iter().map(Some).collect();
        lod0.meshes = group
            .members
            .iter()
            .filter_map(|&index| meshes.get_mut(index).and_then(Option::take))
            .collect();
    }
    for lod in scene.lods.iter_mut().skip(1) {
        lod.meshes.retain(|mesh| mesh.name == group.key);
    }

    let source = std::mem::take(&mut scene.materials);
    scene.materials = consolidate_material_slots(&source, scene.meshes_mut());

    let after: usize = scene.lods.iter().map(|lod| lod.meshes.len()).sum();
    debug!(
        "selected object '{}': kept {after} meshes, {} material slots",
        group.key,
        scene.materials.len()
    );
    before - after
}

#[derive(Debug)]
struct SharedLod {
    screen_size: f32,
    meshes: Vec<Option<Mesh>>,
}

/// A parsed scene shared between the sibling artifacts of a split import.
///
/// Mesh records live in per-LOD arenas; taking an object moves its records
/// out and leaves empty slots behind, so group member indices stay valid for
/// the remaining objects.
#[derive(Debug)]
pub struct SharedScene {
    lods: Vec<SharedLod>,
    skeleton: Skeleton,
    nodes: Vec<Node>,
    materials: Vec<MaterialSlot>,
    animations: Vec<Animation>,
    groups: Vec<MeshGroup>,
}

impl SharedScene {
    pub fn new(scene: SceneModel, groups: Vec<MeshGroup>) -> Self {
        let SceneModel {
            lods,
            skeleton,
            nodes,
            materials,
            animations,
        } = scene;
        let lods = lods
            .into_iter()
            .map(|lod| SharedLod {
                screen_size: lod.screen_size,
                meshes: lod.meshes.into_iter().map(Some).collect(),
            })
            .collect();
        Self {
            lods,
            skeleton,
            nodes,
            materials,
            animations,
            groups,
        }
    }

    pub fn groups(&self) -> &[MeshGroup] {
        &self.groups
    }

    pub fn animations(&self) -> &[Animation] {
        &self.animations
    }

    /// Move the object at `group_index` out of the shared scene.
    ///
    /// LOD 0 members are moved into the new model's first LOD. Each later LOD
    /// contributes its meshes named like the group key; the scan stops at the
    /// first LOD without any, since an object's LODs are contiguous. The
    /// material table is rebuilt from the shared table.
    pub fn take_object(&mut self, group_index: usize) -> Option<SceneModel> {
        let group = self.groups.get(group_index)?;
        let mut model = SceneModel {
            skeleton: self.skeleton.clone(),
            nodes: self.nodes.clone(),
            ..Default::default()
        };

        if let Some(lod0) = self.lods.first_mut() {
            let meshes = group
                .members
                .iter()
                .filter_map(|&index| lod0.meshes.get_mut(index).and_then(Option::take))
                .collect();
            model.lods.push(Lod {
                meshes,
                screen_size: lod0.screen_size,
            });
        }

        for shared_lod in self.lods.iter_mut().skip(1) {
            let meshes: Vec<Mesh> = shared_lod
                .meshes
                .iter_mut()
                .filter(|slot| matches!(slot, Some(mesh) if mesh.name == group.key))
                .filter_map(Option::take)
                .collect();
            if meshes.is_empty() {
                break;
            }
            model.lods.push(Lod {
                meshes,
                screen_size: shared_lod.screen_size,
            });
        }

        model.materials = consolidate_material_slots(&self.materials, model.meshes_mut());
        debug!(
            "moved object '{}' out of shared scene: {} LODs, {} material slots",
            group.key,
            model.lods.len(),
            model.materials.len()
        );
        Some(model)
    }

    /// Collapse the arena back into a scene holding every mesh not taken yet.
    pub fn into_scene(self) -> SceneModel {
        SceneModel {
            lods: self
                .lods
                .into_iter()
                .map(|lod| Lod {
                    meshes: lod.meshes.into_iter().flatten().collect(),
                    screen_size: lod.screen_size,
                })
                .collect(),
            skeleton: self.skeleton,
            nodes: self.nodes,
            materials: self.materials,
            animations: self.animations,
        }
    }
}

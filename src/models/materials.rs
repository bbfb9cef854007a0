//! Material slot table consolidation.

use crate::models::scene::{MaterialSlot, Mesh};

/// Build a dense slot table holding exactly the slots referenced by `meshes`.
///
/// Slots keep the order in which they are first referenced while walking the
/// meshes in iteration order, and every mesh's `material_slot_index` is
/// rewritten to the compacted index. References past the end of `source` are
/// left as they are, so they stay out of range of the new table too.
pub fn consolidate_material_slots<'a>(
    source: &[MaterialSlot],
    meshes: impl IntoIterator<Item = &'a mut Mesh>,
) -> Vec<MaterialSlot> {
    let mut remap: Vec<Option<usize>> = vec![None; source.len()];
    let mut slots = Vec::new();
    for mesh in meshes {
        let old_index = mesh.material_slot_index;
        if old_index >= source.len() {
            continue;
        }
        let new_index = *remap[old_index].get_or_insert_with(|| {
            slots.push(source[old_index].clone());
            slots.len() - 1
        });
        mesh.material_slot_index = new_index;
    }
    slots
}

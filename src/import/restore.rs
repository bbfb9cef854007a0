//! Carrying user-assigned materials over to a re-imported model.

use std::path::Path;

use tracing::debug;

use crate::data::storage::{AssetLoad, AssetStorage};
use crate::models::scene::MaterialSlot;

/// What the material restorer did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// Copied this many leading slots from the previous artifact.
    Restored { slots: usize },
    /// No previous artifact at the target path.
    NoPreviousAsset,
    /// The previous artifact exists but could not be loaded.
    NotLoaded,
    /// The previous artifact is not a model.
    IncompatibleType,
}

/// Copy name, shadows mode and material of each slot of the previous
/// artifact at `path` onto the slot at the same index in `slots`.
pub fn try_restore_materials<S: AssetStorage + ?Sized>(
    storage: &S,
    path: &Path,
    slots: &mut [MaterialSlot],
) -> RestoreOutcome {
    let previous = match storage.load_asset(path) {
        AssetLoad::Missing => return RestoreOutcome::NoPreviousAsset,
        AssetLoad::NotLoaded => return RestoreOutcome::NotLoaded,
        AssetLoad::Loaded(previous) => previous,
    };
    if !previous.asset_type.has_material_slots() {
        return RestoreOutcome::IncompatibleType;
    }

    let mut restored = 0;
    for (slot, old) in slots.iter_mut().zip(previous.material_slots) {
        *slot = old;
        restored += 1;
    }
    debug!("{}: restored {restored} material slot(s)", path.display());
    RestoreOutcome::Restored { slots: restored }
}

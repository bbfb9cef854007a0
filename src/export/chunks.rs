//! Serialization of a prepared scene into the chunk slots of an artifact.

use tracing::{debug, warn};

use crate::data::asset::{AssetData, MAX_CHUNKS, SDF_CHUNK_INDEX};
use crate::error::ImportError;
use crate::export::pack::{self, PackError};
use crate::export::sdf::{self, SdfOutcome};
use crate::import::options::ImportOptions;
use crate::models::scene::{Animation, SceneModel};

/// Chunk 0 holds the header; LOD `k` lives in chunk `k + 1`.
fn write_lods(scene: &SceneModel, skinned: bool, data: &mut AssetData) -> Result<(), ImportError> {
    let mut header = Vec::new();
    pack::write_model_header(scene, skinned, &mut header)?;
    data.set_chunk(0, header)?;

    for (lod_index, lod) in scene.lods.iter().enumerate() {
        let chunk = data.allocate_chunk(lod_index + 1)?;
        pack::write_lod(lod, skinned, chunk)?;
    }
    Ok(())
}

/// Write a static model. A failed SDF bake never fails the import, but a model
/// whose LODs reach the SDF chunk cannot carry one.
pub fn write_model(
    scene: &SceneModel,
    options: &ImportOptions,
    data: &mut AssetData,
) -> Result<Option<SdfOutcome>, ImportError> {
    if options.generate_sdf && scene.lods.len() >= SDF_CHUNK_INDEX {
        return Err(ImportError::CannotAllocateChunk {
            index: SDF_CHUNK_INDEX,
            max: MAX_CHUNKS,
        });
    }
    write_lods(scene, false, data)?;

    if !options.generate_sdf {
        return Ok(None);
    }
    let Some(coarsest) = scene.lods.last() else {
        return Ok(None);
    };
    let outcome = match sdf::bake_sdf(coarsest, options.sdf_resolution) {
        Ok(volume) => {
            let chunk = data.allocate_chunk(SDF_CHUNK_INDEX)?;
            volume.write(chunk);
            debug!("baked SDF {:?}", volume.dimensions);
            SdfOutcome::Baked {
                dimensions: volume.dimensions,
            }
        }
        Err(e) => {
            warn!("cannot generate model SDF: {e}");
            SdfOutcome::Failed(e.to_string())
        }
    };
    Ok(Some(outcome))
}

pub fn write_skinned_model(scene: &SceneModel, data: &mut AssetData) -> Result<(), ImportError> {
    write_lods(scene, true, data)
}

/// Write the selected clip (the first one when none is selected) into chunk 0.
pub fn write_animation(
    clips: &[Animation],
    options: &ImportOptions,
    data: &mut AssetData,
) -> Result<(), ImportError> {
    let index = options.selected_object().unwrap_or(0);
    let clip = clips.get(index).ok_or(PackError::AnimationOutOfRange {
        index,
        count: clips.len(),
    })?;
    let chunk = data.allocate_chunk(0)?;
    pack::write_animation(clip, chunk);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::asset::AssetType;
    use crate::models::scene::Lod;
    use crate::models::scene::test_util::{quad, slot};

    fn model(lod_count: usize) -> SceneModel {
        SceneModel {
            lods: (0..lod_count)
                .map(|_| Lod::new(vec![quad("a", 0, 1.0)]))
                .collect(),
            materials: vec![slot("m")],
            ..Default::default()
        }
    }

    #[test]
    fn lods_follow_header() {
        let mut data = AssetData::new(AssetType::Model);
        let sdf = write_model(&model(3), &ImportOptions::default(), &mut data).unwrap();
        assert_eq!(sdf, None);
        let chunks: Vec<usize> = data.allocated_chunks().map(|(i, _)| i).collect();
        assert_eq!(chunks, vec![0, 1, 2, 3]);
    }

    #[test]
    fn sdf_goes_to_its_own_chunk() {
        let mut data = AssetData::new(AssetType::Model);
        let options = ImportOptions {
            generate_sdf: true,
            sdf_resolution: 0.25,
            ..Default::default()
        };
        let sdf = write_model(&model(2), &options, &mut data).unwrap();
        assert!(matches!(sdf, Some(SdfOutcome::Baked { .. })));
        assert!(data.chunk(SDF_CHUNK_INDEX).is_some());
    }

    #[test]
    fn sdf_failure_is_not_fatal() {
        let mut scene = model(1);
        scene.lods[0].meshes[0].indices.clear();
        let mut data = AssetData::new(AssetType::Model);
        let options = ImportOptions {
            generate_sdf: true,
            ..Default::default()
        };
        let sdf = write_model(&scene, &options, &mut data).unwrap();
        assert!(matches!(sdf, Some(SdfOutcome::Failed(_))));
        assert!(data.chunk(SDF_CHUNK_INDEX).is_none());
        assert!(data.chunk(1).is_some());
    }

    #[test]
    fn too_many_lods_cannot_allocate() {
        let mut data = AssetData::new(AssetType::Model);
        let err = write_model(&model(MAX_CHUNKS), &ImportOptions::default(), &mut data)
            .unwrap_err();
        assert!(matches!(err, ImportError::CannotAllocateChunk { index: 16, .. }));
    }

    #[test]
    fn lods_may_not_overlap_the_sdf_chunk() {
        let scene = model(SDF_CHUNK_INDEX);
        let options = ImportOptions {
            generate_sdf: true,
            ..Default::default()
        };
        let mut data = AssetData::new(AssetType::Model);
        let err = write_model(&scene, &options, &mut data).unwrap_err();
        assert!(matches!(
            err,
            ImportError::CannotAllocateChunk { index: SDF_CHUNK_INDEX, .. }
        ));
        assert_eq!(data.allocated_chunks().count(), 0);

        // Without an SDF the last LOD owns chunk 15.
        let mut data = AssetData::new(AssetType::Model);
        assert_eq!(write_model(&scene, &ImportOptions::default(), &mut data).unwrap(), None);
        let mut last_lod = Vec::new();
        pack::write_lod(&scene.lods[SDF_CHUNK_INDEX - 1], false, &mut last_lod).unwrap();
        assert_eq!(data.chunk(SDF_CHUNK_INDEX), Some(last_lod.as_slice()));
    }

    #[test]
    fn animation_clip_selection() {
        let clips = vec![
            Animation {
                name: "idle".into(),
                ..Default::default()
            },
            Animation {
                name: "run".into(),
                duration: 12.0,
                ..Default::default()
            },
        ];
        let mut options = ImportOptions::default();

        let mut first = AssetData::new(AssetType::Animation);
        write_animation(&clips, &options, &mut first).unwrap();
        options.object_index = 1;
        let mut second = AssetData::new(AssetType::Animation);
        write_animation(&clips, &options, &mut second).unwrap();
        assert_ne!(first.chunk(0), second.chunk(0));

        options.object_index = 2;
        let err = write_animation(&clips, &options, &mut AssetData::new(AssetType::Animation))
            .unwrap_err();
        assert!(matches!(
            err,
            ImportError::Pack(PackError::AnimationOutOfRange { index: 2, count: 2 })
        ));
    }
}

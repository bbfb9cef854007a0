use std::path::{Path, PathBuf};

use modelimport::data::asset::AssetType;
use modelimport::data::model_header::{ModelHeader, parse_model_header};
use modelimport::data::storage::{AssetStorage, FileStorage, MemoryStorage};
use modelimport::error::CreateAssetResult;
use modelimport::import::options::{ImportOptions, ModelType, OptionsSource};
use modelimport::import::pipeline::{ImportRequest, Importer, ParserWithCallback, SceneParser};
use modelimport::import::restore::RestoreOutcome;
use modelimport::models::scene::{
    Animation, AssetId, Lod, MaterialSlot, Mesh, SceneModel, ShadowsCastingMode,
};

fn quad(name: &str, material_slot_index: usize) -> Mesh {
    Mesh::builder()
        .name(name)
        .material_slot_index(material_slot_index)
        .positions(vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
        ])
        .lightmap_uvs(vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]])
        .indices(vec![0, 1, 2, 0, 2, 3])
        .build()
}

fn slots(names: &[&str]) -> Vec<MaterialSlot> {
    names
        .iter()
        .map(|name| MaterialSlot::builder().name(*name).build())
        .collect()
}

/// Three objects: "Car|Body" (two materials), "Car|Wheel" and "Car|Door".
/// LOD 1 holds the body and the wheel.
fn car() -> SceneModel {
    SceneModel {
        lods: vec![
            Lod::new(vec![
                quad("Car|Wheel", 2),
                quad("Car|Body", 0),
                quad("Car|Door", 3),
                quad("Car|Body", 1),
            ]),
            Lod {
                meshes: vec![quad("Car|Body", 0), quad("Car|Wheel", 2)],
                screen_size: 0.5,
            },
        ],
        materials: slots(&["paint", "glass", "rubber", "metal"]),
        ..Default::default()
    }
}

fn parser_for(
    scene: SceneModel,
) -> ParserWithCallback<impl Fn(&Path, &ImportOptions, &Path) -> Result<SceneModel, String>> {
    ParserWithCallback::new(move |_: &Path, _: &ImportOptions, _: &Path| Ok(scene.clone()))
}

fn request(options: Option<ImportOptions>) -> ImportRequest {
    ImportRequest::builder()
        .source("source/car.fbx")
        .target("content/Car.model")
        .maybe_options(options)
        .build()
}

fn split_options() -> ImportOptions {
    ImportOptions {
        split_objects: true,
        ..Default::default()
    }
}

fn stored_header<P: SceneParser>(importer: &Importer<P, MemoryStorage>, path: &str) -> ModelHeader {
    let data = importer.storage().get(path).unwrap();
    parse_model_header(data.chunk(0).unwrap()).unwrap()
}

#[test]
fn split_fans_out_one_artifact_per_group() {
    let mut importer = Importer::new(parser_for(car()), MemoryStorage::default());
    let report = importer.import(&request(Some(split_options())));

    assert_eq!(report.result(), CreateAssetResult::Ok);
    assert_eq!(report.primary.options.object_index, 0);
    assert!(!report.primary.options.split_objects);

    let sibling_paths: Vec<&Path> = report
        .siblings
        .iter()
        .map(|s| s.output_path.as_path())
        .collect();
    assert_eq!(
        sibling_paths,
        vec![Path::new("content/Car Door.model"), Path::new("content/Car Wheel.model")]
    );
    for (sibling, index) in report.siblings.iter().zip(1..) {
        assert!(sibling.is_ok(), "{:?}", sibling.error);
        assert_eq!(sibling.options.object_index, index);
        assert!(!sibling.options.split_objects);
    }
    assert_eq!(importer.storage().len(), 3);

    // Body: both LODs, two slots.
    let body = stored_header(&importer, "content/Car.model");
    assert_eq!(body.lods.len(), 2);
    assert_eq!(body.lods[0].meshes.len(), 2);
    assert!(body.lods.iter().flat_map(|l| &l.meshes).all(|m| m.name == "Car|Body"));
    assert_eq!(body.materials, slots(&["paint", "glass"]));

    // Door: LOD 1 has no door, so the artifact has a single LOD.
    let door = stored_header(&importer, "content/Car Door.model");
    assert_eq!(door.lods.len(), 1);
    assert_eq!(door.materials, slots(&["metal"]));

    let wheel = stored_header(&importer, "content/Car Wheel.model");
    assert_eq!(wheel.lods.len(), 2);
    assert_eq!(wheel.lods[1].screen_size, 0.5);
    assert_eq!(wheel.materials, slots(&["rubber"]));
}

#[test]
fn failing_sibling_does_not_abort_the_rest() {
    let mut scene = car();
    // Break the door mesh only.
    scene.lods[0].meshes[2].indices.push(99);
    let mut importer = Importer::new(parser_for(scene), MemoryStorage::default());
    let report = importer.import(&request(Some(split_options())));

    assert!(report.primary.is_ok());
    assert_eq!(report.siblings[0].result, CreateAssetResult::Error);
    assert!(report.siblings[0].error.is_some());
    assert!(report.siblings[1].is_ok());
    assert!(importer.storage().get("content/Car Door.model").is_none());
    assert_eq!(importer.storage().len(), 2);
}

#[test]
fn empty_model_fails_without_output() {
    for scene in [
        SceneModel::default(),
        SceneModel {
            lods: vec![Lod::default()],
            ..Default::default()
        },
    ] {
        let mut importer = Importer::new(parser_for(scene), MemoryStorage::default());
        let report = importer.import(&request(None));
        assert_eq!(report.result(), CreateAssetResult::Error);
        assert!(importer.storage().is_empty());
    }
}

#[test]
fn dangling_material_slot_fails_with_and_without_selection() {
    let mut scene = car();
    scene.lods[0].meshes[0].material_slot_index = 9;
    for object_index in [-1, 2] {
        let mut importer = Importer::new(parser_for(scene.clone()), MemoryStorage::default());
        let report = importer.import(&request(Some(ImportOptions {
            object_index,
            ..Default::default()
        })));
        assert_eq!(report.result(), CreateAssetResult::Error, "object {object_index}");
        assert!(importer.storage().is_empty());
    }
}

#[test]
fn too_many_lods_cannot_allocate_chunk() {
    let scene = SceneModel {
        lods: (0..16).map(|_| Lod::new(vec![quad("Box", 0)])).collect(),
        materials: slots(&["m"]),
        ..Default::default()
    };
    let mut importer = Importer::new(parser_for(scene), MemoryStorage::default());
    let report = importer.import(&request(None));
    assert_eq!(report.result(), CreateAssetResult::CannotAllocateChunk);
    assert!(importer.storage().is_empty());
}

#[test]
fn sdf_cannot_share_a_chunk_with_the_last_lod() {
    let scene = SceneModel {
        lods: (0..15).map(|_| Lod::new(vec![quad("Box", 0)])).collect(),
        materials: slots(&["m"]),
        ..Default::default()
    };
    let mut importer = Importer::new(parser_for(scene), MemoryStorage::default());
    let report = importer.import(&request(Some(ImportOptions {
        generate_sdf: true,
        ..Default::default()
    })));
    assert_eq!(report.result(), CreateAssetResult::CannotAllocateChunk);
    assert!(importer.storage().is_empty());

    let report = importer.import(&request(None));
    assert!(report.primary.is_ok());
    assert_eq!(stored_header(&importer, "content/Car.model").lods.len(), 15);
}

#[test]
fn reimport_restores_materials_and_options() {
    let mut importer = Importer::new(
        parser_for(SceneModel {
            lods: vec![Lod::new(vec![quad("Head", 0), quad("Head", 1), quad("Head", 2)])],
            materials: slots(&["s0", "s1", "s2"]),
            ..Default::default()
        }),
        MemoryStorage::default(),
    );

    // A previous import whose slots the user edited.
    let previous = SceneModel {
        lods: vec![Lod::new(vec![quad("Head", 0), quad("Head", 1)])],
        materials: vec![
            MaterialSlot::builder()
                .name("Body")
                .material(AssetId(7))
                .shadows_mode(ShadowsCastingMode::DynamicOnly)
                .build(),
            MaterialSlot::builder().name("Eyes").material(AssetId(8)).build(),
        ],
        ..Default::default()
    };
    assert!(
        importer
            .create_from_data(previous, Path::new("content/Car.model"))
            .is_ok()
    );
    let first = importer.import(&request(Some(ImportOptions {
        generate_sdf: true,
        sdf_resolution: 0.25,
        ..Default::default()
    })));
    assert!(first.primary.is_ok());
    assert_eq!(
        first.primary.diagnostics.restore,
        Some(RestoreOutcome::Restored { slots: 2 })
    );

    let header = stored_header(&importer, "content/Car.model");
    let names: Vec<&str> = header.materials.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Body", "Eyes", "s2"]);
    assert_eq!(header.materials[0].material, AssetId(7));
    assert_eq!(header.materials[0].shadows_mode, ShadowsCastingMode::DynamicOnly);
    assert_eq!(header.materials[1].material, AssetId(8));
    assert!(header.materials[2].material.is_none());

    // No options given: the ones stored by the first import are reused.
    let second = importer.import(&request(None));
    assert_eq!(second.primary.diagnostics.options_source, OptionsSource::Restored);
    assert!(second.primary.options.generate_sdf);
    assert!(second.primary.diagnostics.sdf.is_some());
}

#[test]
fn animation_split_writes_one_clip_per_artifact() {
    let scene = SceneModel {
        animations: ["Idle", "Walk", "Run"]
            .iter()
            .map(|name| Animation {
                name: name.to_string(),
                duration: 10.0,
                frames_per_second: 30.0,
                channels: Vec::new(),
            })
            .collect(),
        ..Default::default()
    };
    let mut importer = Importer::new(parser_for(scene), MemoryStorage::default());
    let options = ImportOptions {
        object_type: ModelType::Animation,
        split_objects: true,
        ..Default::default()
    };
    let report = importer.import(
        &ImportRequest::builder()
            .source("source/hero.fbx")
            .target("content/Hero.anim")
            .options(options)
            .build(),
    );

    assert!(report.artifacts().all(|a| a.is_ok()));
    let paths: Vec<PathBuf> = report.artifacts().map(|a| a.output_path.clone()).collect();
    assert_eq!(
        paths,
        vec![
            PathBuf::from("content/Hero.anim"),
            PathBuf::from("content/Hero Walk.anim"),
            PathBuf::from("content/Hero Run.anim"),
        ]
    );
    for path in &paths {
        let data = importer.storage().get(path).unwrap();
        assert_eq!(data.type_name, AssetType::Animation);
        assert_eq!(data.allocated_chunks().count(), 1);
    }
}

#[test]
fn split_import_into_files() {
    let dir = tempfile::tempdir().unwrap();
    let mut importer = Importer::new(parser_for(car()), FileStorage::new(dir.path()));
    let report = importer.import(&request(Some(split_options())));
    assert!(report.artifacts().all(|a| a.is_ok()));

    for name in ["Car.model", "Car Door.model", "Car Wheel.model"] {
        assert!(dir.path().join("content").join(name).is_file(), "{name}");
    }

    let storage = importer.into_storage();
    let container = storage
        .read_container(Path::new("content/Car Wheel.model"))
        .unwrap();
    assert_eq!(container.chunks.len(), 3);

    // The stored options are picked up again from disk.
    let header = storage.load_header(Path::new("content/Car Wheel.model")).unwrap();
    assert_eq!(header.type_name.into_known(), Some(AssetType::Model));
    let mut importer = Importer::new(parser_for(car()), storage);
    let request = ImportRequest::builder()
        .source("source/car.fbx")
        .target("content/Car Wheel.model")
        .build();
    let report = importer.import(&request);
    assert_eq!(report.primary.diagnostics.options_source, OptionsSource::Restored);
    assert_eq!(report.primary.options.object_index, 2);
    assert_eq!(
        report.primary.diagnostics.restore,
        Some(RestoreOutcome::Restored { slots: 1 })
    );
}

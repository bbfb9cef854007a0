//! The import pipeline: parse once, fan out split objects, and turn every
//! resulting scene into a stored artifact.

use std::path::{Path, PathBuf};

use bon::Builder;
use tracing::{error, info, warn};

use crate::data::asset::{AssetData, AssetType};
use crate::data::storage::AssetStorage;
use crate::error::{CreateAssetResult, IResult, ImportError};
use crate::export::chunks;
use crate::export::sdf::SdfOutcome;
use crate::import::options::{
    ImportMetadata, ImportOptions, LightmapUvsSource, OptionsSource, auto_import_output,
    resolve_import_options,
};
use crate::import::restore::{RestoreOutcome, try_restore_materials};
use crate::import::split::{JobInput, SplitQueue};
use crate::lightmap::atlas::{AtlasOutcome, repack_lightmap_uvs};
use crate::models::grouping::group_meshes_by_name;
use crate::models::scene::{Animation, SceneModel};
use crate::models::selection::select_object;

/// Turns a source file into a [`SceneModel`].
pub trait SceneParser {
    fn parse(
        &self,
        source: &Path,
        options: &ImportOptions,
        auto_import_output: &Path,
    ) -> Result<SceneModel, String>;
}

/// A [`SceneParser`] backed by a closure.
pub struct ParserWithCallback<F> {
    callback: F,
}

impl<F> ParserWithCallback<F>
where
    F: Fn(&Path, &ImportOptions, &Path) -> Result<SceneModel, String>,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> SceneParser for ParserWithCallback<F>
where
    F: Fn(&Path, &ImportOptions, &Path) -> Result<SceneModel, String>,
{
    fn parse(
        &self,
        source: &Path,
        options: &ImportOptions,
        auto_import_output: &Path,
    ) -> Result<SceneModel, String> {
        (self.callback)(source, options, auto_import_output)
    }
}

/// One import of `source` into `target`.
#[derive(Builder, Clone, Debug)]
pub struct ImportRequest {
    #[builder(into)]
    pub source: PathBuf,
    #[builder(into)]
    pub target: PathBuf,
    /// Options to use instead of the ones stored with the existing artifact.
    pub options: Option<ImportOptions>,
    /// Recorded in the artifact metadata.
    #[builder(into, default)]
    pub username: String,
}

/// Best-effort steps and what they did.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostics {
    pub options_source: OptionsSource,
    /// `None` when restoring was disabled or there were no slots.
    pub restore: Option<RestoreOutcome>,
    /// `None` when the atlas packer did not apply.
    pub atlas: Option<AtlasOutcome>,
    /// `None` when no SDF was requested.
    pub sdf: Option<SdfOutcome>,
}

impl Diagnostics {
    fn new(options_source: OptionsSource) -> Self {
        Self {
            options_source,
            restore: None,
            atlas: None,
            sdf: None,
        }
    }
}

/// Result of producing one artifact.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactOutcome {
    pub output_path: PathBuf,
    pub options: ImportOptions,
    pub result: CreateAssetResult,
    /// Failure message when `result` is not `Ok`.
    pub error: Option<String>,
    pub diagnostics: Diagnostics,
}

impl ArtifactOutcome {
    fn new(
        output_path: &Path,
        options: ImportOptions,
        diagnostics: Diagnostics,
        result: IResult<()>,
    ) -> Self {
        let (result, error) = match result {
            Ok(()) => (CreateAssetResult::Ok, None),
            Err(e) => (e.result(), Some(e.to_string())),
        };
        Self {
            output_path: output_path.to_path_buf(),
            options,
            result,
            error,
            diagnostics,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Everything one request produced: the requested artifact and, for split
/// imports, one sibling per extra object in unit order.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportReport {
    pub primary: ArtifactOutcome,
    pub siblings: Vec<ArtifactOutcome>,
}

impl ImportReport {
    /// The result code of the requested artifact.
    pub fn result(&self) -> CreateAssetResult {
        self.primary.result
    }

    pub fn artifacts(&self) -> impl Iterator<Item = &ArtifactOutcome> {
        std::iter::once(&self.primary).chain(&self.siblings)
    }
}

/// Scene data an artifact is built from.
enum Payload<'a> {
    Scene(&'a mut SceneModel),
    Clips(&'a [Animation]),
}

/// Who and what an artifact was imported from.
struct Creation<'a> {
    source: &'a Path,
    username: &'a str,
}

pub struct Importer<P, S> {
    parser: P,
    storage: S,
}

impl<P: SceneParser, S: AssetStorage> Importer<P, S> {
    pub fn new(parser: P, storage: S) -> Self {
        Self { parser, storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Import `request.source` into `request.target`.
    ///
    /// With `split_objects` set, every object after the first is written to
    /// its own sibling artifact before the first object is written to the
    /// target. A failing sibling is reported and does not affect the others.
    pub fn import(&mut self, request: &ImportRequest) -> ImportReport {
        let target = request.target.as_path();
        let (mut options, options_source) =
            resolve_import_options(&self.storage, target, request.options.as_ref());
        let creation = Creation {
            source: &request.source,
            username: &request.username,
        };
        let fail = |options: ImportOptions, e: ImportError| ImportReport {
            primary: ArtifactOutcome::new(target, options, Diagnostics::new(options_source), Err(e)),
            siblings: Vec::new(),
        };

        let Some(asset_type) = options.object_type.asset_type() else {
            warn!("{}: cannot import as {:?}", target.display(), options.object_type);
            let object_type = options.object_type;
            return fail(options, ImportError::InvalidType(object_type));
        };

        let auto_output = auto_import_output(&request.source, target, &options);
        let mut scene = match self.parser.parse(&request.source, &options, &auto_output) {
            Ok(scene) => scene,
            Err(message) => {
                error!("Cannot import model file. {message}");
                return fail(options, ImportError::Parse(message));
            }
        };

        let mut siblings = Vec::new();
        if options.split_objects {
            options.split_objects = false;
            options.object_index = 0;

            let mut queue = SplitQueue::new(scene, target, &options);
            match asset_type {
                AssetType::Animation => info!("Splitting imported {} animations", queue.len() + 1),
                _ => info!("Splitting imported {} meshes", queue.len() + 1),
            }
            while let Some((job, input)) = queue.pop() {
                let mut diagnostics = Diagnostics::new(OptionsSource::Explicit);
                let result = match input {
                    JobInput::Model(mut model) => self.create_artifact(
                        Payload::Scene(&mut model),
                        asset_type,
                        &job.options,
                        &job.output_path,
                        &creation,
                        &mut diagnostics,
                    ),
                    JobInput::Clips(clips) => self.create_artifact(
                        Payload::Clips(clips),
                        asset_type,
                        &job.options,
                        &job.output_path,
                        &creation,
                        &mut diagnostics,
                    ),
                };
                if let Err(e) = &result {
                    warn!("{}: split object '{}' failed: {e}", job.output_path.display(), job.label);
                }
                siblings.push(ArtifactOutcome::new(&job.output_path, job.options, diagnostics, result));
            }
            scene = queue.into_primary_scene();
        }

        if matches!(asset_type, AssetType::Model | AssetType::SkinnedModel) {
            let groups = scene
                .lods
                .first()
                .map(|lod| group_meshes_by_name(&lod.meshes))
                .unwrap_or_default();
            if let Some(group) = options.selected_object().and_then(|index| groups.get(index)) {
                select_object(&mut scene, group);
            }
        }

        let mut diagnostics = Diagnostics::new(options_source);
        let result = self.create_artifact(
            Payload::Scene(&mut scene),
            asset_type,
            &options,
            target,
            &creation,
            &mut diagnostics,
        );
        ImportReport {
            primary: ArtifactOutcome::new(target, options, diagnostics, result),
            siblings,
        }
    }

    /// Store an already-built scene as a model at `target`.
    ///
    /// LOD screen sizes are recomputed; materials and lightmaps are written
    /// as given.
    pub fn create_from_data(&mut self, mut scene: SceneModel, target: &Path) -> ArtifactOutcome {
        let options = ImportOptions {
            restore_materials_on_reimport: false,
            ..Default::default()
        };
        let mut diagnostics = Diagnostics::new(OptionsSource::Default);
        if !scene.has_no_meshes() {
            scene.calculate_lod_screen_sizes();
        }
        let creation = Creation {
            source: Path::new(""),
            username: "",
        };
        let result = self.create_artifact(
            Payload::Scene(&mut scene),
            AssetType::Model,
            &options,
            target,
            &creation,
            &mut diagnostics,
        );
        ArtifactOutcome::new(target, options, diagnostics, result)
    }

    fn create_artifact(
        &mut self,
        payload: Payload<'_>,
        asset_type: AssetType,
        options: &ImportOptions,
        target: &Path,
        creation: &Creation<'_>,
        diagnostics: &mut Diagnostics,
    ) -> IResult<()> {
        let mut data = AssetData::new(asset_type);

        match payload {
            Payload::Scene(scene) if asset_type.has_material_slots() => {
                if scene.has_no_meshes() {
                    warn!("{}: model has no valid meshes", target.display());
                    return Err(ImportError::EmptyModel);
                }

                if options.restore_materials_on_reimport && !scene.materials.is_empty() {
                    diagnostics.restore = Some(try_restore_materials(
                        &self.storage,
                        target,
                        &mut scene.materials,
                    ));
                }

                if asset_type == AssetType::Model
                    && options.lightmap_uvs_source == LightmapUvsSource::Generate
                {
                    if let Some(lod0) = scene.lods.first_mut().filter(|lod| lod.meshes.len() > 1) {
                        diagnostics.atlas = Some(repack_lightmap_uvs(&mut lod0.meshes));
                    }
                }

                if asset_type == AssetType::Model {
                    diagnostics.sdf = chunks::write_model(scene, options, &mut data)?;
                } else {
                    chunks::write_skinned_model(scene, &mut data)?;
                }
            }
            Payload::Scene(scene) => chunks::write_animation(&scene.animations, options, &mut data)?,
            Payload::Clips(clips) if asset_type == AssetType::Animation => {
                chunks::write_animation(clips, options, &mut data)?
            }
            Payload::Clips(_) => return Err(ImportError::InvalidType(options.object_type)),
        }

        data.metadata = serde_json::to_vec(&ImportMetadata {
            import_path: creation.source.display().to_string(),
            import_username: creation.username.to_owned(),
            options: options.clone(),
        })?;

        self.storage
            .save(target, data)
            .map_err(|e| ImportError::Storage(e.to_string()))
    }
}

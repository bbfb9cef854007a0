//! Import configuration, its persisted form, and how it is resolved for a
//! given target artifact.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::data::asset::AssetType;
use crate::data::storage::AssetStorage;

/// The kind of artifact an import produces.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelType {
    #[default]
    Model,
    SkinnedModel,
    Animation,
    /// Listed for compatibility with persisted options; cannot be imported.
    Prefab,
}

impl ModelType {
    /// The stored asset type this option produces, if any.
    pub fn asset_type(&self) -> Option<AssetType> {
        match self {
            ModelType::Model => Some(AssetType::Model),
            ModelType::SkinnedModel => Some(AssetType::SkinnedModel),
            ModelType::Animation => Some(AssetType::Animation),
            ModelType::Prefab => None,
        }
    }
}

/// Where lightmap UVs come from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LightmapUvsSource {
    #[default]
    Disable,
    Generate,
    Channel0,
    Channel1,
    Channel2,
    Channel3,
}

/// User-facing import configuration.
///
/// Missing fields fall back to their defaults when deserialized, so metadata
/// written by older versions still loads.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct ImportOptions {
    #[serde(rename = "Type")]
    pub object_type: ModelType,
    pub split_objects: bool,
    /// Unit to import when splitting; `-1` imports everything.
    pub object_index: i32,
    pub restore_materials_on_reimport: bool,
    #[serde(rename = "LightmapUVsSource")]
    pub lightmap_uvs_source: LightmapUvsSource,
    #[serde(rename = "GenerateSDF")]
    pub generate_sdf: bool,
    #[serde(rename = "SDFResolution")]
    pub sdf_resolution: f32,
    pub sub_asset_folder: String,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            object_type: ModelType::Model,
            split_objects: false,
            object_index: -1,
            restore_materials_on_reimport: true,
            lightmap_uvs_source: LightmapUvsSource::Disable,
            generate_sdf: false,
            sdf_resolution: 1.0,
            sub_asset_folder: String::new(),
        }
    }
}

impl ImportOptions {
    /// The selected unit, if one is selected.
    pub fn selected_object(&self) -> Option<usize> {
        usize::try_from(self.object_index).ok()
    }
}

/// JSON metadata persisted next to every artifact.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ImportMetadata {
    #[serde(default)]
    pub import_path: String,
    #[serde(default)]
    pub import_username: String,
    #[serde(flatten)]
    pub options: ImportOptions,
}

/// Where the options used for an artifact came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OptionsSource {
    /// Passed in with the request.
    Explicit,
    /// Read back from the metadata of the artifact being replaced.
    Restored,
    /// Nothing usable was found.
    Default,
}

/// Read the options stored with the artifact at `path`.
///
/// Returns `None` when the artifact is missing, has an unknown type, is older
/// than the oldest layout whose metadata is compatible, or holds metadata
/// that does not parse.
pub fn try_get_import_options<S: AssetStorage + ?Sized>(
    storage: &S,
    path: &Path,
) -> Option<ImportOptions> {
    let header = storage.load_header(path)?;
    let asset_type = header.type_name.into_known()?;
    if header.serialized_version < asset_type.min_restorable_version() {
        debug!(
            "{}: stored {asset_type} version {} predates reusable import options",
            path.display(),
            header.serialized_version
        );
        return None;
    }
    match serde_json::from_slice::<ImportMetadata>(&header.metadata) {
        Ok(metadata) => Some(metadata.options),
        Err(e) => {
            debug!("{}: cannot read import options: {e}", path.display());
            None
        }
    }
}

/// Pick the options for importing into `target`.
pub fn resolve_import_options<S: AssetStorage + ?Sized>(
    storage: &S,
    target: &Path,
    explicit: Option<&ImportOptions>,
) -> (ImportOptions, OptionsSource) {
    if let Some(options) = explicit {
        return (options.clone(), OptionsSource::Explicit);
    }
    if let Some(options) = try_get_import_options(storage, target) {
        return (options, OptionsSource::Restored);
    }
    warn!(
        "{}: no import options given or stored, using defaults",
        target.display()
    );
    (ImportOptions::default(), OptionsSource::Default)
}

/// Folder the parser writes auxiliary assets (textures, materials) into.
///
/// This is `dir(target)/<sub asset folder>` when a folder is configured, and
/// `dir(target)/<source file stem>` otherwise.
pub fn auto_import_output(source: &Path, target: &Path, options: &ImportOptions) -> PathBuf {
    let dir = target.parent().unwrap_or_else(|| Path::new(""));
    let folder = options.sub_asset_folder.trim();
    if folder.is_empty() {
        let stem = source.file_stem().unwrap_or_default();
        dir.join(stem)
    } else {
        dir.join(folder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::asset::AssetData;
    use crate::data::storage::MemoryStorage;

    fn stored(ty: AssetType, version: u32, metadata: &[u8]) -> AssetData {
        let mut data = AssetData::new(ty);
        data.serialized_version = version;
        data.metadata = metadata.to_vec();
        data
    }

    fn metadata_json(options: &ImportOptions) -> Vec<u8> {
        serde_json::to_vec(&ImportMetadata {
            import_path: "in.fbx".into(),
            import_username: "someone".into(),
            options: options.clone(),
        })
        .unwrap()
    }

    #[test]
    fn defaults() {
        let options = ImportOptions::default();
        assert_eq!(options.object_type, ModelType::Model);
        assert_eq!(options.object_index, -1);
        assert_eq!(options.selected_object(), None);
        assert!(options.restore_materials_on_reimport);
        assert_eq!(options.sdf_resolution, 1.0);
    }

    #[test]
    fn partial_metadata_uses_defaults() {
        let options: ImportOptions =
            serde_json::from_str(r#"{"Type":"SkinnedModel","SplitObjects":true}"#).unwrap();
        assert_eq!(options.object_type, ModelType::SkinnedModel);
        assert!(options.split_objects);
        assert_eq!(options.object_index, -1);
        assert!(options.restore_materials_on_reimport);
    }

    #[test]
    fn metadata_is_flat() {
        let json = metadata_json(&ImportOptions::default());
        let value: serde_json::Value = serde_json::from_slice(&json).unwrap();
        assert_eq!(value["ImportPath"], "in.fbx");
        assert_eq!(value["ObjectIndex"], -1);
        assert_eq!(value["LightmapUVsSource"], "Disable");
    }

    #[test]
    fn stored_options_are_version_gated() {
        let options = ImportOptions {
            split_objects: true,
            ..Default::default()
        };
        let json = metadata_json(&options);
        let mut storage = MemoryStorage::default();
        storage.insert("new.model", stored(AssetType::Model, 4, &json));
        storage.insert("old.model", stored(AssetType::Model, 3, &json));
        storage.insert("anim.anim", stored(AssetType::Animation, 1, &json));
        storage.insert("junk.model", stored(AssetType::Model, 25, b"not json"));

        assert_eq!(
            try_get_import_options(&storage, Path::new("new.model")),
            Some(options.clone())
        );
        assert_eq!(try_get_import_options(&storage, Path::new("old.model")), None);
        assert!(try_get_import_options(&storage, Path::new("anim.anim")).is_some());
        assert_eq!(try_get_import_options(&storage, Path::new("junk.model")), None);
        assert_eq!(try_get_import_options(&storage, Path::new("missing")), None);
    }

    #[test]
    fn resolution_order() {
        let stored_options = ImportOptions {
            generate_sdf: true,
            ..Default::default()
        };
        let mut storage = MemoryStorage::default();
        storage.insert(
            "a.model",
            stored(AssetType::Model, 25, &metadata_json(&stored_options)),
        );
        let explicit = ImportOptions {
            object_type: ModelType::Animation,
            ..Default::default()
        };

        let target = Path::new("a.model");
        assert_eq!(
            resolve_import_options(&storage, target, Some(&explicit)),
            (explicit, OptionsSource::Explicit)
        );
        assert_eq!(
            resolve_import_options(&storage, target, None),
            (stored_options, OptionsSource::Restored)
        );
        assert_eq!(
            resolve_import_options(&storage, Path::new("b.model"), None),
            (ImportOptions::default(), OptionsSource::Default)
        );
    }

    #[test]
    fn auto_import_folder() {
        let mut options = ImportOptions::default();
        let source = Path::new("/src/Car.fbx");
        let target = Path::new("/content/cars/Car.model");
        assert_eq!(
            auto_import_output(source, target, &options),
            Path::new("/content/cars/Car")
        );
        options.sub_asset_folder = "  textures ".into();
        assert_eq!(
            auto_import_output(source, target, &options),
            Path::new("/content/cars/textures")
        );
    }
}

//! Model import pipeline.
//!
//! A parsed scene goes through mesh grouping, optional splitting into sibling
//! artifacts, object selection, material slot consolidation and restoration,
//! lightmap atlas packing, and finally chunked binary serialization into an
//! [`data::storage::AssetStorage`].
//!
//! ```no_run
//! use modelimport::data::storage::MemoryStorage;
//! use modelimport::import::options::ImportOptions;
//! use modelimport::import::pipeline::{ImportRequest, Importer, ParserWithCallback};
//! use modelimport::models::scene::SceneModel;
//! use std::path::Path;
//!
//! let parser = ParserWithCallback::new(|_: &Path, _: &ImportOptions, _: &Path| {
//!     Ok::<_, String>(SceneModel::default())
//! });
//! let mut importer = Importer::new(parser, MemoryStorage::default());
//! let request = ImportRequest::builder()
//!     .source("scene.fbx")
//!     .target("content/Scene.model")
//!     .build();
//! let report = importer.import(&request);
//! println!("{:?}", report.result());
//! ```

/// Artifact data, containers and storage
pub mod data;
/// Error definitions
pub mod error;
/// Serialization of prepared scenes into artifact chunks
pub mod export;
/// Import options and the import pipeline
pub mod import;
/// Lightmap UV atlas packing
pub mod lightmap;
/// Scene data model and object-level transforms
pub mod models;
/// Generic wrapper for values that may or may not match a known variant.
pub mod recognized;

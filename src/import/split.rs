//! Fan-out of a multi-object scene into sibling artifacts.
//!
//! Unit 0 stays in the artifact being imported. Every other unit (a mesh
//! group for models, a clip for animations) becomes a [`SplitJob`] whose
//! artifact is written next to the original one. Jobs never split again.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use crate::import::options::{ImportOptions, ModelType};
use crate::models::grouping::{MeshGroup, group_meshes_by_name, short_name};
use crate::models::scene::{Animation, SceneModel};
use crate::models::selection::SharedScene;

/// One sibling artifact to produce.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitJob {
    /// Index of the unit (group or clip) this job extracts.
    pub unit: usize,
    pub label: String,
    pub output_path: PathBuf,
    pub options: ImportOptions,
}

/// Source data handed to a job.
#[derive(Debug)]
pub enum JobInput<'a> {
    /// The job's object, moved out of the shared scene.
    Model(SceneModel),
    /// Every parsed clip; the job's options select one.
    Clips(&'a [Animation]),
}

/// Replace characters that are not allowed in file names.
pub fn sanitize_label(label: &str) -> String {
    label
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

/// `dir/Name.ext` + `Label` becomes `dir/Name Label.ext`.
pub fn split_output_path(target: &Path, label: &str) -> PathBuf {
    let mut file_name = target.file_stem().unwrap_or_default().to_os_string();
    file_name.push(" ");
    file_name.push(sanitize_label(label));
    if let Some(extension) = target.extension() {
        file_name.push(".");
        file_name.push(extension);
    }
    target.with_file_name(file_name)
}

/// Build the jobs for units `1..labels.len()`.
pub fn plan_split_jobs(target: &Path, options: &ImportOptions, labels: &[String]) -> Vec<SplitJob> {
    labels
        .iter()
        .enumerate()
        .skip(1)
        .map(|(unit, label)| SplitJob {
            unit,
            label: label.clone(),
            output_path: split_output_path(target, label),
            options: ImportOptions {
                split_objects: false,
                object_index: unit as i32,
                ..options.clone()
            },
        })
        .collect()
}

fn unit_label(name: &str, unit: usize) -> String {
    if name.is_empty() {
        unit.to_string()
    } else {
        name.to_owned()
    }
}

/// Queue of pending sibling jobs, owning the scene they share.
#[derive(Debug)]
pub struct SplitQueue {
    shared: SharedScene,
    jobs: VecDeque<SplitJob>,
}

impl SplitQueue {
    /// Plan the fan-out of `scene` for an import into `target`.
    pub fn new(scene: SceneModel, target: &Path, options: &ImportOptions) -> Self {
        let groups: Vec<MeshGroup> = scene
            .lods
            .first()
            .map(|lod| group_meshes_by_name(&lod.meshes))
            .unwrap_or_default();
        let labels: Vec<String> = if options.object_type == ModelType::Animation {
            scene
                .animations
                .iter()
                .enumerate()
                .map(|(unit, clip)| unit_label(&clip.name, unit))
                .collect()
        } else {
            groups
                .iter()
                .enumerate()
                .map(|(unit, group)| unit_label(short_name(&group.key), unit))
                .collect()
        };
        let jobs = plan_split_jobs(target, options, &labels).into();
        Self {
            shared: SharedScene::new(scene, groups),
            jobs,
        }
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn jobs(&self) -> impl Iterator<Item = &SplitJob> {
        self.jobs.iter()
    }

    /// Pop the next job together with its input.
    pub fn pop(&mut self) -> Option<(SplitJob, JobInput<'_>)> {
        let job = self.jobs.pop_front()?;
        let input = if job.options.object_type == ModelType::Animation {
            JobInput::Clips(self.shared.animations())
        } else {
            JobInput::Model(self.shared.take_object(job.unit).unwrap_or_default())
        };
        Some((job, input))
    }

    /// The scene left for unit 0 once every job has taken its share.
    pub fn into_primary_scene(self) -> SceneModel {
        self.shared.into_scene()
    }
}

//! Import orchestration: option resolution, object splitting, material
//! restoration and the pipeline tying them to storage.

pub mod options;
pub mod pipeline;
pub mod restore;
pub mod split;

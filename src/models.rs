//! Scene data model and the object-level transforms applied to it.

pub mod grouping;
pub mod materials;
pub mod scene;
pub mod selection;

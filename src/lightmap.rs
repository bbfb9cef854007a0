//! Lightmap UV atlas packing.

pub mod atlas;
pub mod rect_pack;

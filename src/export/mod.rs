//! Turning prepared scenes into artifact bytes.

/// Chunk layout of each artifact type.
pub mod chunks;
/// Little-endian header, mesh and animation encoders.
pub mod pack;
/// Signed distance field baking.
pub mod sdf;

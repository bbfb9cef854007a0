/// Asset type tags and the in-memory chunked artifact
pub mod asset;
/// On-disk container format for a single artifact
pub mod container;
/// Reader for the model header chunk
pub mod model_header;
/// Shared winnow parsing helpers
pub mod parser_utils;
/// Where artifacts are loaded from and saved to
pub mod storage;

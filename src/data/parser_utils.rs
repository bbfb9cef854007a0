//! Shared winnow-based parsing utilities used by the container and model
//! header readers.

use winnow::Parser;
use winnow::binary::{le_u16, le_u32};
use winnow::error::{ContextError, ErrMode};
use winnow::token::take;

/// Common result type for winnow parsers.
pub type WResult<T> = Result<T, winnow::error::ErrMode<ContextError>>;

/// Parse a UTF-8 string prefixed by a `u32` byte length.
pub fn parse_string_u32(input: &mut &[u8]) -> WResult<String> {
    let len = le_u32.parse_next(input)?;
    parse_utf8(input, len as usize)
}

/// Parse a UTF-8 string prefixed by a `u16` byte length.
pub fn parse_string_u16(input: &mut &[u8]) -> WResult<String> {
    let len = le_u16.parse_next(input)?;
    parse_utf8(input, len as usize)
}

fn parse_utf8(input: &mut &[u8], len: usize) -> WResult<String> {
    let bytes: &[u8] = take(len).parse_next(input)?;
    std::str::from_utf8(bytes)
        .map(str::to_owned)
        .map_err(|_| ErrMode::Cut(ContextError::new()))
}

/// Offset of `remaining` within `file_data`, for error messages.
pub fn offset_of(file_data: &[u8], remaining: &[u8]) -> usize {
    file_data.len() - remaining.len()
}

//! Column extraction for fixed-width text records.
//!
//! Offsets are 0-based byte positions. Short lines are tolerated: a field
//! that starts past the end of the line is empty, one that runs past the end
//! is cut short, matching how the published files drop trailing blanks.

use crate::error::{CatalogError, Result};
use std::io::{self, BufRead};
use std::str::FromStr;

/// Bytes `start..start + len` of `line`, clamped to the line length.
pub fn field(line: &str, start: usize, len: usize) -> &str {
    let end = (start + len).min(line.len());
    if start >= end {
        return "";
    }
    line.get(start..end).unwrap_or("")
}

/// Lines of `reader` without their terminators.
///
/// Invalid UTF-8 is replaced rather than reported, so such a line reaches
/// the record parser and is rejected there like any other malformed record.
pub fn text_lines<R: BufRead>(reader: R) -> impl Iterator<Item = io::Result<String>> {
    reader.split(b'\n').map(|line| {
        let mut line = line?;
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        Ok(match String::from_utf8(line) {
            Ok(text) => text,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        })
    })
}

/// Parse a trimmed numeric field, naming it in the error.
pub fn parse_field<T: FromStr>(line: &str, start: usize, len: usize, what: &str) -> Result<T> {
    let raw = field(line, start, len).trim();
    raw.parse::<T>()
        .map_err(|_| CatalogError::parse(format!("cannot parse {}: '{}'", what, raw)))
}

/// Like [`parse_field`], but a blank field is `None`.
pub fn parse_optional<T: FromStr>(
    line: &str,
    start: usize,
    len: usize,
    what: &str,
) -> Result<Option<T>> {
    if field(line, start, len).trim().is_empty() {
        return Ok(None);
    }
    parse_field(line, start, len, what).map(Some)
}

/// `-1.0` if the byte at `index` is a minus sign, `1.0` otherwise.
pub fn sign_at(line: &str, index: usize) -> f64 {
    if field(line, index, 1) == "-" {
        -1.0
    } else {
        1.0
    }
}

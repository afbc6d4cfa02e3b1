//! Source map correction.
//!
//! Copyright (c) 2025 Posit, PBC
//!
//! Compilers fed from a stream name the compiled entry `"stdin"` in the map's
//! `sources`. Passing the real input path to the compiler instead breaks
//! relative `@import` resolution, so the placeholder is patched in the map
//! text after compilation. Browser devtools need a POSIX-style path relative
//! to the working directory.

use std::path::{MAIN_SEPARATOR, Path};

/// The placeholder source identifier, including its field terminator.
pub const SOURCE_PLACEHOLDER: &str = "stdin\",";

/// Path of `source` relative to `working_dir`, with forward slashes.
///
/// Paths outside the working directory are kept whole (slash-converted).
pub fn map_source_path(source: &Path, working_dir: &Path) -> String {
    relative_slash_path(
        &source.to_string_lossy(),
        &working_dir.to_string_lossy(),
        MAIN_SEPARATOR,
    )
}

fn relative_slash_path(source: &str, working_dir: &str, separator: char) -> String {
    let prefix = format!("{}{}", working_dir, separator);
    let relative = source.strip_prefix(prefix.as_str()).unwrap_or(source);
    if separator == '/' {
        relative.to_string()
    } else {
        relative.replace(separator, "/")
    }
}

/// Replace the first `"stdin"` source in `raw_map` with `source_path`.
///
/// Only the first occurrence is rewritten; the compiler emits the placeholder
/// once per map.
pub fn correct_source_map(raw_map: &str, source_path: &str) -> String {
    raw_map.replacen(SOURCE_PLACEHOLDER, &format!("{}\",", source_path), 1)
}

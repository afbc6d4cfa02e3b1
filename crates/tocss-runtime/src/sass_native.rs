//! SASS compilation using the grass crate.
//!
//! Copyright (c) 2025 Posit, PBC
//!
//! This module provides SASS/SCSS compilation using the
//! grass crate, a pure Rust implementation that targets dart-sass 1.54.3.
//!
//! Key components:
//! - `RuntimeFs`: Adapter implementing `grass::Fs` for our `SystemRuntime`
//! - `compile_sass`: High-level function for SCSS and indented-syntax compilation

use std::fmt::Debug;
use std::io;
use std::path::{Path, PathBuf};

use grass::{InputSyntax, Options, OutputStyle};

use crate::traits::{RuntimeError, RuntimeResult, SystemRuntime};

/// Number of fractional digits grass emits for numbers. Not configurable.
pub const GRASS_PRECISION: u8 = 10;

/// Adapter that implements `grass::Fs` using a `SystemRuntime`.
///
/// This allows grass to read `@import`ed files through our runtime
/// abstraction, enabling consistent behavior across runtime configurations.
pub struct RuntimeFs<'a> {
    runtime: &'a dyn SystemRuntime,
}

impl<'a> RuntimeFs<'a> {
    /// Create a new RuntimeFs adapter wrapping the given runtime.
    pub fn new(runtime: &'a dyn SystemRuntime) -> Self {
        Self { runtime }
    }
}

impl Debug for RuntimeFs<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeFs")
            .field("runtime", &"<SystemRuntime>")
            .finish()
    }
}

impl grass::Fs for RuntimeFs<'_> {
    fn is_dir(&self, path: &Path) -> bool {
        self.runtime.is_dir(path).unwrap_or(false)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.runtime.is_file(path).unwrap_or(false)
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.runtime
            .file_read(path)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))
    }
}

/// Compile SASS source to CSS using grass.
///
/// # Arguments
///
/// * `runtime` - The runtime to use for file system access
/// * `source` - The stylesheet source code to compile
/// * `load_paths` - Directories to search for @use/@import resolution, in order
/// * `minified` - Whether to produce compressed output
/// * `indented` - Whether `source` uses the indented (`.sass`) syntax
///
/// # Returns
///
/// Compiled CSS string on success, `RuntimeError::SassError` on failure.
pub fn compile_sass(
    runtime: &dyn SystemRuntime,
    source: &str,
    load_paths: &[PathBuf],
    minified: bool,
    indented: bool,
) -> RuntimeResult<String> {
    let fs = RuntimeFs::new(runtime);

    let style = if minified {
        OutputStyle::Compressed
    } else {
        OutputStyle::Expanded
    };

    let syntax = if indented {
        InputSyntax::Sass
    } else {
        InputSyntax::Scss
    };

    let options = Options::default()
        .fs(&fs)
        .load_paths(load_paths)
        .style(style)
        .input_syntax(syntax);

    grass::from_string(source, &options).map_err(|e| RuntimeError::SassError(e.to_string()))
}

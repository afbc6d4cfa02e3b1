/*
 * layered.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Layered (overlay) filesystem resolution.
 *
 * A build tree is presented to the pipeline as one virtual tree assembled
 * from several real roots (project, theme, modules). LayeredFs answers the
 * one question the transformation step asks of it: which real directories
 * does a virtual directory map to, in precedence order.
 */

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::native::NativeRuntime;
use crate::traits::SystemRuntime;

/// Maps virtual paths of the build tree onto real, on-disk paths.
///
/// Implementations are shared read-only between concurrent transformations.
pub trait DirResolver: Send + Sync {
    /// All real directories the virtual directory `dir` maps to, highest
    /// precedence first, without duplicates.
    ///
    /// A path that does not exist in any root yields an empty list.
    fn real_dirs(&self, dir: &str) -> Vec<PathBuf>;

    /// The real path of the virtual file `file`, taken from the first root
    /// that contains it.
    fn real_filename(&self, file: &str) -> Option<PathBuf>;
}

/// A [`DirResolver`] over an ordered list of real root directories.
///
/// Roots are consulted in the order given; the first root has the highest
/// precedence.
pub struct LayeredFs {
    runtime: Arc<dyn SystemRuntime>,
    roots: Vec<PathBuf>,
}

impl LayeredFs {
    /// Create a layered filesystem over `roots` (highest precedence first).
    pub fn new(runtime: Arc<dyn SystemRuntime>, roots: Vec<PathBuf>) -> Self {
        Self { runtime, roots }
    }

    /// Create a layered filesystem backed by the host filesystem.
    pub fn native(roots: Vec<PathBuf>) -> Self {
        Self::new(Arc::new(NativeRuntime::new()), roots)
    }

    /// Join a virtual path onto a root, or `None` if the path escapes it.
    fn join(root: &Path, virtual_path: &str) -> Option<PathBuf> {
        let cleaned = clean_path(virtual_path);
        let relative = cleaned.trim_start_matches('/');
        if relative == ".." || relative.starts_with("../") {
            return None;
        }
        if relative.is_empty() || relative == "." {
            return Some(root.to_path_buf());
        }
        Some(root.join(relative))
    }
}

impl std::fmt::Debug for LayeredFs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayeredFs")
            .field("runtime", &"<SystemRuntime>")
            .field("roots", &self.roots)
            .finish()
    }
}

impl DirResolver for LayeredFs {
    fn real_dirs(&self, dir: &str) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = Vec::new();
        for root in &self.roots {
            let Some(candidate) = Self::join(root, dir) else {
                tracing::debug!(dir, root = %root.display(), "Path escapes overlay root");
                continue;
            };
            match self.runtime.is_dir(&candidate) {
                Ok(true) => {
                    if !dirs.contains(&candidate) {
                        dirs.push(candidate);
                    }
                }
                Ok(false) => {}
                Err(e) => {
                    tracing::debug!(dir, root = %root.display(), error = %e, "Overlay lookup failed");
                }
            }
        }
        dirs
    }

    fn real_filename(&self, file: &str) -> Option<PathBuf> {
        self.roots
            .iter()
            .filter_map(|root| Self::join(root, file))
            .find(|candidate| self.runtime.is_file(candidate).unwrap_or(false))
    }
}

/// Lexically normalize a slash-separated path.
///
/// Removes `.` segments and empty segments, and resolves `..` against the
/// preceding segment. A rooted path cannot go above `/`; a relative path
/// keeps its leading `..` segments. The empty path cleans to `.`.
pub fn clean_path(path: &str) -> String {
    let rooted = path.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(&last) if last != ".." => {
                    segments.pop();
                }
                _ => {
                    if !rooted {
                        segments.push("..");
                    }
                }
            },
            other => segments.push(other),
        }
    }

    let joined = segments.join("/");
    match (rooted, joined.is_empty()) {
        (true, _) => format!("/{}", joined),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}

/// The directory part of a slash-separated virtual path (`.` if none).
pub fn path_dir(path: &str) -> String {
    match path.rfind('/') {
        Some(0) => "/".to_string(),
        Some(idx) => clean_path(&path[..idx]),
        None => ".".to_string(),
    }
}

/// The final segment of a slash-separated virtual path.
pub fn path_base(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return if path.is_empty() { "." } else { "/" };
    }
    match trimmed.rfind('/') {
        Some(idx) => &trimmed[idx + 1..],
        None => trimmed,
    }
}

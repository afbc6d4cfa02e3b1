/*
 * tocss-runtime
 * Copyright (c) 2025 Posit, PBC
 *
 * Runtime abstraction layer for the stylesheet transformation step.
 *
 * This crate provides:
 *
 * - SystemRuntime: trait-based file access, with NativeRuntime for std
 * - LayeredFs: resolution of virtual build-tree paths across overlay roots
 * - sass_native: the grass-backed SASS compiler reading through the runtime
 */

mod layered;
mod native;
pub mod sass_native;
mod traits;

// Re-export core types (API surface)
pub use traits::{PathKind, RuntimeError, RuntimeResult, SystemRuntime};

pub use layered::{DirResolver, LayeredFs, clean_path, path_base, path_dir};
pub use native::NativeRuntime;


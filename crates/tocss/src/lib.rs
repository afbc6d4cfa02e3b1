//! SCSS/SASS to CSS transformation step for the site build pipeline.
//!
//! Copyright (c) 2025 Posit, PBC
//!
//! This crate provides:
//! - Option decoding and assembly (FromOptions, ToOptions, OptionAssembler)
//! - The compiler seam (ScssCompiler, Transpiler) with a grass implementation
//! - Source map correction for stream-fed compilers
//! - The `tocss` resource transformation (Client, ToCss)

pub mod compiler;
mod error;
mod media;
pub mod options;
pub mod source_map;
mod transform;

pub use compiler::{CompileResult, GrassCompiler, ScssCompiler, Transpiler, to_css};
pub use error::{Result, TransformError};
pub use media::MediaType;
pub use options::{FromOptions, OptionAssembler, OutputStyle, ToOptions};
pub use source_map::{correct_source_map, map_source_path};
pub use transform::{
    ArtifactPublisher, Client, ResourceTransformation, RuntimePublisher, ToCss,
    TransformationContext,
};

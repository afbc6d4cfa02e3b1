/*
 * transform.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * The tocss resource transformation.
 */

//! The `tocss` resource transformation.
//!
//! - [`ResourceTransformation`] - The trait implemented by resource transformations
//! - [`TransformationContext`] - One resource flowing through a transformation
//! - [`Client`] - Shared, read-only state (resolvers, working dir, compiler)
//! - [`ToCss`] - Compiles a SCSS/SASS resource into CSS plus an optional map
//!
//! # Example
//!
//! ```ignore
//! use tocss::{Client, FromOptions, MediaType, ResourceTransformation, TransformationContext};
//!
//! let client = Client::native("/site", vec!["/site/assets".into(), "/themes/base/assets".into()]);
//! let transformation = client.to_css(FromOptions::default());
//!
//! let mut input = std::fs::File::open("/site/assets/css/main.scss")?;
//! let mut output: Vec<u8> = Vec::new();
//! let mut ctx = TransformationContext::new("css/main.scss", MediaType::SCSS, &mut input, &mut output);
//! transformation.transform(&mut ctx)?;
//! assert_eq!(ctx.out_path, "css/main.css");
//! ```

use std::collections::BTreeMap;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::sync::Arc;

use tocss_runtime::{DirResolver, LayeredFs, RuntimeError, SystemRuntime, path_base};

use crate::compiler::{GrassCompiler, ScssCompiler, to_css};
use crate::error::Result;
use crate::media::MediaType;
use crate::options::{FromOptions, OptionAssembler};
use crate::source_map::{correct_source_map, map_source_path};

/// Receives sidecar artifacts (such as source maps) published by a transformation.
pub trait ArtifactPublisher {
    /// Publish `content` at the virtual path `path`.
    fn publish(&mut self, path: &str, content: &str) -> io::Result<()>;
}

/// In-memory publisher, keyed by virtual path.
impl ArtifactPublisher for BTreeMap<String, String> {
    fn publish(&mut self, path: &str, content: &str) -> io::Result<()> {
        self.insert(path.to_string(), content.to_string());
        Ok(())
    }
}

/// Publishes artifacts as files under a publish directory.
pub struct RuntimePublisher {
    runtime: Arc<dyn SystemRuntime>,
    publish_dir: PathBuf,
}

impl RuntimePublisher {
    pub fn new(runtime: Arc<dyn SystemRuntime>, publish_dir: impl Into<PathBuf>) -> Self {
        Self {
            runtime,
            publish_dir: publish_dir.into(),
        }
    }

    /// Where an artifact with the virtual path `path` is written.
    pub fn target_path(&self, path: &str) -> PathBuf {
        self.publish_dir.join(path.trim_start_matches('/'))
    }
}

impl ArtifactPublisher for RuntimePublisher {
    fn publish(&mut self, path: &str, content: &str) -> io::Result<()> {
        let target = self.target_path(path);
        let write = || -> tocss_runtime::RuntimeResult<()> {
            if let Some(parent) = target.parent() {
                self.runtime.dir_create(parent, true)?;
            }
            self.runtime.file_write(&target, content.as_bytes())
        };
        write().map_err(|e| match e {
            RuntimeError::Io(e) => e,
            other => io::Error::new(io::ErrorKind::Other, other.to_string()),
        })
    }
}

/// One stylesheet resource being transformed.
///
/// Owned by the pipeline invocation that created it and used for a single
/// transform call.
pub struct TransformationContext<'a> {
    /// Virtual path of the source, relative to the layered build tree.
    pub source_path: String,
    pub in_media_type: MediaType,
    pub out_media_type: MediaType,
    /// Virtual output path; starts out as the source path.
    pub out_path: String,
    pub from: &'a mut dyn Read,
    pub to: &'a mut dyn Write,
    publisher: Option<&'a mut dyn ArtifactPublisher>,
}

impl<'a> TransformationContext<'a> {
    pub fn new(
        source_path: impl Into<String>,
        in_media_type: MediaType,
        from: &'a mut dyn Read,
        to: &'a mut dyn Write,
    ) -> Self {
        let source_path = source_path.into();
        Self {
            out_path: source_path.clone(),
            source_path,
            in_media_type,
            out_media_type: in_media_type,
            from,
            to,
            publisher: None,
        }
    }

    /// Attach the sink that receives sidecar artifacts.
    pub fn with_publisher(mut self, publisher: &'a mut dyn ArtifactPublisher) -> Self {
        self.publisher = Some(publisher);
        self
    }

    /// Set the output path to the source path with its extension replaced
    /// by `new_ext` (which includes the leading dot).
    ///
    /// A source without an extension gets `new_ext` appended.
    pub fn replace_out_path_extension(&mut self, new_ext: &str) {
        let dir_end = self.source_path.rfind('/').map_or(0, |idx| idx + 1);
        let (dir, file) = self.source_path.split_at(dir_end);
        let stem = file.rfind('.').map_or(file, |idx| &file[..idx]);
        self.out_path = format!("{}{}{}", dir, stem, new_ext);
    }

    /// Publish `content` as the source map of the output, at `<out_path>.map`.
    pub fn publish_source_map(&mut self, content: &str) -> io::Result<()> {
        let target = format!("{}.map", self.out_path);
        match self.publisher.as_mut() {
            Some(publisher) => publisher.publish(&target, content),
            None => Err(io::Error::new(
                io::ErrorKind::NotConnected,
                format!("no artifact publisher to receive {}", target),
            )),
        }
    }
}

/// A single named stage that turns one resource into a processed resource.
///
/// # Thread Safety
///
/// Transformations must be `Send + Sync`; the pipeline runs them for many
/// resources in parallel.
pub trait ResourceTransformation: Send + Sync {
    /// Human-readable name for this transformation.
    ///
    /// Used for logging and debugging.
    fn name(&self) -> &str;

    /// Apply the transformation to one resource.
    ///
    /// # Errors
    ///
    /// Returns an error if the transformation fails. Nothing is published
    /// for the resource in that case.
    fn transform(&self, ctx: &mut TransformationContext<'_>) -> Result<()>;
}

/// Process-wide state shared by every `tocss` transformation.
///
/// All members are read-only and safe to share between concurrent
/// transformations.
#[derive(Clone)]
pub struct Client {
    source_fs: Arc<dyn DirResolver>,
    work_fs: Arc<dyn DirResolver>,
    working_dir: PathBuf,
    compiler: Arc<dyn ScssCompiler>,
}

impl Client {
    /// # Arguments
    ///
    /// * `source_fs` - Resolves the layered tree the stylesheets live in
    /// * `work_fs` - Resolves paths relative to `working_dir`
    /// * `working_dir` - The build's working directory
    /// * `compiler` - The SASS compiler
    pub fn new(
        source_fs: Arc<dyn DirResolver>,
        work_fs: Arc<dyn DirResolver>,
        working_dir: impl Into<PathBuf>,
        compiler: Arc<dyn ScssCompiler>,
    ) -> Self {
        Self {
            source_fs,
            work_fs,
            working_dir: working_dir.into(),
            compiler,
        }
    }

    /// A client on the host filesystem compiling with grass.
    ///
    /// `roots` are the overlay roots of the source tree, highest precedence
    /// first.
    pub fn native(working_dir: impl Into<PathBuf>, roots: Vec<PathBuf>) -> Self {
        let working_dir = working_dir.into();
        Self::new(
            Arc::new(LayeredFs::native(roots)),
            Arc::new(LayeredFs::native(vec![working_dir.clone()])),
            working_dir,
            Arc::new(GrassCompiler::native()),
        )
    }

    /// Create the transformation for a resource declared with `options`.
    pub fn to_css(&self, options: FromOptions) -> ToCss {
        ToCss {
            client: self.clone(),
            options,
        }
    }
}

/// Compiles a SCSS or SASS resource into CSS.
#[derive(Clone)]
pub struct ToCss {
    client: Client,
    options: FromOptions,
}

impl ResourceTransformation for ToCss {
    fn name(&self) -> &str {
        "tocss"
    }

    fn transform(&self, ctx: &mut TransformationContext<'_>) -> Result<()> {
        let client = &self.client;
        let from = &self.options;

        tracing::debug!(transform = self.name(), source = %ctx.source_path, "Running transform");

        ctx.out_media_type = MediaType::CSS;

        if from.target_path.is_empty() {
            ctx.replace_out_path_extension(".css");
        } else {
            ctx.out_path = from.target_path.clone();
        }

        let out_name = path_base(&ctx.out_path).to_string();

        let assembler = OptionAssembler::new(
            client.source_fs.as_ref(),
            client.work_fs.as_ref(),
            &client.working_dir,
        );
        let options = assembler.assemble(from, &ctx.source_path, &ctx.in_media_type, &out_name);

        tracing::debug!(
            include_paths = ?options.include_paths,
            indented_syntax = options.indented_syntax,
            "Assembled compiler options"
        );

        let result = to_css(client.compiler.as_ref(), &options, &mut *ctx.to, &mut *ctx.from)?;
        ctx.to.flush()?;

        if !from.enable_source_map {
            return Ok(());
        }

        if let Some(raw_map) = result.source_map.filter(|m| !m.is_empty()) {
            let real_source = client
                .source_fs
                .real_filename(&ctx.source_path)
                .unwrap_or_else(|| PathBuf::from(&ctx.source_path));
            let source_path = map_source_path(&real_source, &client.working_dir);
            let content = correct_source_map(&raw_map, &source_path);

            ctx.publish_source_map(&content)?;
            tracing::debug!(out = %ctx.out_path, source = %source_path, "Published source map");
        }

        Ok(())
    }
}

//! Compiler adapter: the seam between the transformation and a SASS compiler.
//!
//! Copyright (c) 2025 Posit, PBC
//!
//! The transformation only ever talks to [`ScssCompiler`]. A compiler builds a
//! [`Transpiler`] for one set of [`ToOptions`] (rejecting combinations it
//! cannot honor), and the transpiler turns stylesheet source into CSS plus an
//! optional raw source map. [`GrassCompiler`] is the native implementation.

use std::io::{Read, Write};
use std::sync::Arc;

use tocss_runtime::sass_native::{GRASS_PRECISION, compile_sass};
use tocss_runtime::{NativeRuntime, RuntimeError, RuntimeResult, SystemRuntime};

use crate::error::{Result, TransformError};
use crate::options::{OutputStyle, ToOptions};

/// Output of one compilation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileResult {
    pub css: String,
    /// Raw source map in the compiler's native format. The compiled entry's
    /// source is named `"stdin"` until corrected.
    pub source_map: Option<String>,
}

/// A compiler configured for one set of options.
pub trait Transpiler {
    /// Compile the stylesheet read from `src`.
    fn execute(&self, src: &mut dyn Read) -> RuntimeResult<CompileResult>;
}

/// A SASS/SCSS compiler capability.
///
/// Compilers hold no per-resource state and are shared between concurrent
/// transformations.
pub trait ScssCompiler: Send + Sync {
    /// Build a transpiler for `options`.
    ///
    /// # Errors
    ///
    /// Returns `TransformError::CompilerInit` if the option combination is
    /// malformed or unsupported by this compiler.
    fn transpiler<'a>(&'a self, options: &ToOptions) -> Result<Box<dyn Transpiler + 'a>>;
}

/// Compile `src` with `compiler` and write the CSS to `dst`.
///
/// Nothing is written to `dst` unless compilation succeeds.
///
/// # Errors
///
/// - `TransformError::CompilerInit` if the compiler rejects `options`
/// - `TransformError::CompilationFailed` if compilation fails; the compiler's
///   message is kept verbatim after the `SCSS processing failed: ` prefix
/// - `TransformError::Publish` if `dst` fails
pub fn to_css(
    compiler: &dyn ScssCompiler,
    options: &ToOptions,
    dst: &mut dyn Write,
    src: &mut dyn Read,
) -> Result<CompileResult> {
    let transpiler = compiler.transpiler(options)?;

    let result = transpiler.execute(src).map_err(|e| match e {
        RuntimeError::SassError(message) => TransformError::compilation_failed(message),
        other => TransformError::compilation_failed(other.to_string()),
    })?;

    dst.write_all(result.css.as_bytes())?;
    Ok(result)
}

/// [`ScssCompiler`] backed by grass, reading imports through a [`SystemRuntime`].
///
/// grass does not produce source maps; its results never carry one. It also
/// formats numbers with a fixed precision, so a configured `precision` is
/// accepted and ignored.
pub struct GrassCompiler {
    runtime: Arc<dyn SystemRuntime>,
}

impl GrassCompiler {
    pub fn new(runtime: Arc<dyn SystemRuntime>) -> Self {
        Self { runtime }
    }

    /// A compiler reading imports from the host filesystem.
    pub fn native() -> Self {
        Self::new(Arc::new(NativeRuntime::new()))
    }

    fn validate(options: &ToOptions) -> Result<()> {
        if options.wants_source_map() && options.output_path.is_empty() {
            return Err(TransformError::CompilerInit(format!(
                "source map file name {:?} requires an output path",
                options.source_map_filename
            )));
        }
        if options.enable_embedded_source_map && options.omit_source_map_url {
            return Err(TransformError::CompilerInit(
                "an embedded source map cannot omit its source map URL".to_string(),
            ));
        }
        Ok(())
    }
}

impl std::fmt::Debug for GrassCompiler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GrassCompiler")
            .field("runtime", &"<SystemRuntime>")
            .finish()
    }
}

impl ScssCompiler for GrassCompiler {
    fn transpiler<'a>(&'a self, options: &ToOptions) -> Result<Box<dyn Transpiler + 'a>> {
        Self::validate(options)?;
        if let Some(precision) = options.precision.filter(|p| *p != GRASS_PRECISION) {
            tracing::debug!(
                precision,
                grass_precision = GRASS_PRECISION,
                "Ignoring configured precision, grass uses a fixed precision"
            );
        }
        Ok(Box::new(GrassTranspiler {
            runtime: self.runtime.as_ref(),
            options: options.clone(),
        }))
    }
}

struct GrassTranspiler<'a> {
    runtime: &'a dyn SystemRuntime,
    options: ToOptions,
}

impl Transpiler for GrassTranspiler<'_> {
    fn execute(&self, src: &mut dyn Read) -> RuntimeResult<CompileResult> {
        let mut source = String::new();
        src.read_to_string(&mut source)?;

        let css = compile_sass(
            self.runtime,
            &source,
            &self.options.include_paths,
            self.options.output_style == OutputStyle::Compressed,
            self.options.indented_syntax,
        )?;

        tracing::debug!(
            bytes = css.len(),
            include_paths = self.options.include_paths.len(),
            "grass compilation finished"
        );

        Ok(CompileResult {
            css,
            source_map: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(options: &ToOptions, source: &str) -> (Result<CompileResult>, Vec<u8>) {
        let compiler = GrassCompiler::native();
        let mut dst: Vec<u8> = Vec::new();
        let result = to_css(&compiler, options, &mut dst, &mut source.as_bytes());
        (result, dst)
    }

    #[test]
    fn test_compiles_and_writes_css() {
        let (result, dst) = compile(&ToOptions::default(), "body { color: red; }");

        let result = result.unwrap();
        assert!(result.css.contains("color: red"));
        assert_eq!(result.source_map, None);
        assert_eq!(String::from_utf8(dst).unwrap(), result.css);
    }

    #[test]
    fn test_compressed_style() {
        let options = ToOptions {
            output_style: OutputStyle::Compressed,
            ..ToOptions::default()
        };
        let (result, _) = compile(&options, ".a {\n  color: red;\n}\n\n.b { color: blue; }");

        let css = result.unwrap().css;
        assert!(!css.contains("\n\n"));
        assert!(css.contains(".a{color:red}"));
    }

    #[test]
    fn test_indented_syntax() {
        let options = ToOptions {
            indented_syntax: true,
            ..ToOptions::default()
        };
        let (result, _) = compile(&options, "body\n  color: red\n");

        assert!(result.unwrap().css.contains("color: red"));
    }

    #[test]
    fn test_compilation_error_is_prefixed_and_writes_nothing() {
        let (result, dst) = compile(&ToOptions::default(), ".btn { color: $undefined; }");

        let err = result.unwrap_err();
        assert!(matches!(err, TransformError::CompilationFailed { .. }));
        assert!(err.to_string().starts_with("SCSS processing failed: "));
        assert!(dst.is_empty());
    }

    #[test]
    fn test_invalid_utf8_input_is_a_compilation_error() {
        let compiler = GrassCompiler::native();
        let mut dst: Vec<u8> = Vec::new();
        let input: &[u8] = &[0xff, 0xfe, b'a'];

        let err = to_css(&compiler, &ToOptions::default(), &mut dst, &mut &input[..]).unwrap_err();

        assert!(matches!(err, TransformError::CompilationFailed { .. }));
        assert!(dst.is_empty());
    }

    #[test]
    fn test_init_rejects_map_without_output_path() {
        let options = ToOptions {
            source_map_filename: "main.css.map".to_string(),
            ..ToOptions::default()
        };
        let (result, dst) = compile(&options, "a { b: c; }");

        let err = result.unwrap_err();
        assert!(matches!(err, TransformError::CompilerInit(_)));
        assert!(err.to_string().contains("requires an output path"));
        assert!(dst.is_empty());
    }

    #[test]
    fn test_init_rejects_embedded_map_without_url() {
        let options = ToOptions {
            enable_embedded_source_map: true,
            omit_source_map_url: true,
            ..ToOptions::default()
        };
        let (result, _) = compile(&options, "a { b: c; }");

        assert!(matches!(result, Err(TransformError::CompilerInit(_))));
    }

    #[test]
    fn test_precision_accepted_at_any_value() {
        for precision in [5, 8, 10] {
            let options = ToOptions {
                precision: Some(precision),
                ..ToOptions::default()
            };
            let (result, dst) = compile(&options, "a { width: 10px; }");

            assert!(result.unwrap().css.contains("width: 10px"));
            assert!(!dst.is_empty());
        }
    }

    #[test]
    fn test_debug_hides_runtime() {
        let debug_str = format!("{:?}", GrassCompiler::native());
        assert!(debug_str.contains("GrassCompiler"));
    }
}

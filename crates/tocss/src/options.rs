//! Transformation options: user-declared ("from") and compiler-facing ("to").
//!
//! Copyright (c) 2025 Posit, PBC
//!
//! Options reach the step as a loosely typed map from upstream configuration:
//!
//! ```yaml
//! targetPath: css/site.css
//! includePaths:
//!   - node_modules/bootstrap/scss
//! enableSourceMap: true
//! outputStyle: compressed
//! ```
//!
//! [`FromOptions::decode`] turns that map into [`FromOptions`];
//! [`OptionAssembler`] derives the [`ToOptions`] handed to the compiler.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::{Map, Value};
use tocss_runtime::{DirResolver, clean_path, path_dir};

use crate::error::TransformError;
use crate::media::MediaType;

/// CSS output formatting requested from the compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputStyle {
    #[default]
    Expanded,
    Compressed,
}

/// Options declared by the user for one stylesheet resource.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct FromOptions {
    /// Output path used verbatim when non-empty; otherwise the source path
    /// with its extension replaced by `.css`.
    #[serde(rename = "targetpath")]
    pub target_path: String,

    /// Extra include paths, relative to the build's working directory.
    #[serde(rename = "includepaths")]
    pub include_paths: Vec<String>,

    #[serde(rename = "enablesourcemap")]
    pub enable_source_map: bool,

    #[serde(rename = "outputstyle")]
    pub output_style: OutputStyle,

    /// Number of fractional digits in numbers; compiler default when unset.
    /// Compilers with a fixed precision (grass) ignore it.
    pub precision: Option<u8>,
}

impl FromOptions {
    /// Decode options from a generic map.
    ///
    /// Keys match case-insensitively and ignore `_`/`-`, so `targetPath`,
    /// `TargetPath` and `target_path` are the same option. A null value
    /// yields the defaults.
    pub fn decode(value: &Value) -> Result<Self, TransformError> {
        let map = match value {
            Value::Null => return Ok(Self::default()),
            Value::Object(map) => map,
            other => {
                return Err(TransformError::InvalidOptions {
                    message: format!("expected a map of options, got {}", other),
                });
            }
        };

        let mut normalized = Map::with_capacity(map.len());
        for (key, value) in map {
            let key = normalize_key(key);
            let value = match (key.as_str(), value) {
                ("outputstyle", Value::String(s)) => Value::String(s.to_lowercase()),
                _ => value.clone(),
            };
            normalized.insert(key, value);
        }

        serde_json::from_value(Value::Object(normalized)).map_err(|e| {
            TransformError::InvalidOptions {
                message: e.to_string(),
            }
        })
    }
}

fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|c| *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Options handed to the compiler, derived per resource.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ToOptions {
    /// Real directories searched by `@import`, in precedence order.
    pub include_paths: Vec<PathBuf>,
    /// Treat the input as indented (`.sass`) syntax.
    pub indented_syntax: bool,
    pub output_style: OutputStyle,
    pub precision: Option<u8>,

    // Source map settings; left empty/false unless source maps are enabled.
    pub output_path: String,
    pub source_map_filename: String,
    pub source_map_root: PathBuf,
    /// Embed the sources' content in the map file itself.
    pub source_map_contents: bool,
    /// Leave out the `sourceMappingURL` comment in the CSS.
    pub omit_source_map_url: bool,
    /// Embed the map in the CSS as a data URI instead of a sidecar file.
    pub enable_embedded_source_map: bool,
}

impl ToOptions {
    /// The compiler options that follow directly from the user's options.
    pub fn from_user(from: &FromOptions) -> Self {
        Self {
            output_style: from.output_style,
            precision: from.precision,
            ..Self::default()
        }
    }

    /// Whether the compiler should emit a source map.
    pub fn wants_source_map(&self) -> bool {
        !self.source_map_filename.is_empty()
    }
}

/// Derives [`ToOptions`] for a resource from its [`FromOptions`].
///
/// Apart from directory lookups against the two resolvers, assembly has no
/// side effects and never fails.
pub struct OptionAssembler<'a> {
    source_fs: &'a dyn DirResolver,
    work_fs: &'a dyn DirResolver,
    working_dir: &'a Path,
}

impl<'a> OptionAssembler<'a> {
    /// * `source_fs` - resolves the layered build tree the sources live in
    /// * `work_fs` - resolves paths relative to the working directory
    /// * `working_dir` - the build's working directory (source map root)
    pub fn new(
        source_fs: &'a dyn DirResolver,
        work_fs: &'a dyn DirResolver,
        working_dir: &'a Path,
    ) -> Self {
        Self {
            source_fs,
            work_fs,
            working_dir,
        }
    }

    /// Assemble compiler options for one resource.
    ///
    /// # Arguments
    ///
    /// * `from` - The user-declared options
    /// * `source_path` - Virtual path of the stylesheet
    /// * `in_media_type` - Media type of the stylesheet source
    /// * `out_name` - Base name of the output file (e.g. `main.css`)
    pub fn assemble(
        &self,
        from: &FromOptions,
        source_path: &str,
        in_media_type: &MediaType,
        out_name: &str,
    ) -> ToOptions {
        let mut to = ToOptions::from_user(from);

        // The stylesheet's own directory wins over configured include paths.
        to.include_paths = self.source_fs.real_dirs(&path_dir(source_path));

        for include_path in &from.include_paths {
            let dirs = self.work_fs.real_dirs(&clean_path(include_path));
            if dirs.is_empty() {
                tracing::debug!(include_path = %include_path, "Include path did not resolve");
            }
            to.include_paths.extend(dirs);
        }

        to.indented_syntax = in_media_type.is_indented_syntax();

        if from.enable_source_map {
            to.source_map_filename = format!("{}.map", out_name);
            to.source_map_root = self.working_dir.to_path_buf();
            to.output_path = out_name.to_string();
            to.source_map_contents = true;
            to.omit_source_map_url = false;
            to.enable_embedded_source_map = false;
        }

        to
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    /// Resolver that maps virtual dirs to `<root>/<dir>` for every root,
    /// without touching the disk.
    struct FakeResolver {
        roots: Vec<PathBuf>,
        missing: Vec<String>,
    }

    impl FakeResolver {
        fn new(roots: &[&str]) -> Self {
            Self {
                roots: roots.iter().map(PathBuf::from).collect(),
                missing: Vec::new(),
            }
        }
    }

    impl DirResolver for FakeResolver {
        fn real_dirs(&self, dir: &str) -> Vec<PathBuf> {
            if self.missing.iter().any(|m| m == dir) {
                return Vec::new();
            }
            self.roots
                .iter()
                .map(|r| if dir == "." { r.clone() } else { r.join(dir) })
                .collect()
        }

        fn real_filename(&self, file: &str) -> Option<PathBuf> {
            self.roots.first().map(|r| r.join(file))
        }
    }

    #[test]
    fn test_decode_case_insensitive_keys() {
        let value = json!({
            "TargetPath": "css/site.css",
            "include_paths": ["node_modules/bootstrap/scss"],
            "enableSourceMap": true,
            "outputStyle": "Compressed",
            "precision": 10,
        });

        let from = FromOptions::decode(&value).unwrap();

        assert_eq!(from.target_path, "css/site.css");
        assert_eq!(from.include_paths, vec!["node_modules/bootstrap/scss"]);
        assert!(from.enable_source_map);
        assert_eq!(from.output_style, OutputStyle::Compressed);
        assert_eq!(from.precision, Some(10));
    }

    #[test]
    fn test_decode_defaults() {
        assert_eq!(FromOptions::decode(&Value::Null).unwrap(), FromOptions::default());
        assert_eq!(FromOptions::decode(&json!({})).unwrap(), FromOptions::default());
    }

    #[test]
    fn test_decode_rejects_bad_values() {
        let err = FromOptions::decode(&json!({"outputStyle": "nested"})).unwrap_err();
        assert!(matches!(err, TransformError::InvalidOptions { .. }));
        assert!(err.to_string().contains("nested"));

        let err = FromOptions::decode(&json!({"includePaths": "not-a-list"})).unwrap_err();
        assert!(matches!(err, TransformError::InvalidOptions { .. }));

        let err = FromOptions::decode(&json!(["targetPath"])).unwrap_err();
        assert!(matches!(err, TransformError::InvalidOptions { .. }));
    }

    #[test]
    fn test_include_paths_source_dir_first_then_extras_in_order() {
        let source_fs = FakeResolver::new(&["/R", "/theme"]);
        let work_fs = FakeResolver::new(&["/work"]);
        let assembler = OptionAssembler::new(&source_fs, &work_fs, Path::new("/work"));

        let from = FromOptions {
            include_paths: vec!["vendor/./scss".to_string(), "lib/x/..".to_string()],
            ..FromOptions::default()
        };

        let to = assembler.assemble(&from, "a/b/style.scss", &MediaType::SCSS, "style.css");

        assert_eq!(
            to.include_paths,
            vec![
                PathBuf::from("/R/a/b"),
                PathBuf::from("/theme/a/b"),
                PathBuf::from("/work/vendor/scss"),
                PathBuf::from("/work/lib"),
            ]
        );
    }

    #[test]
    fn test_unresolved_include_path_contributes_nothing() {
        let source_fs = FakeResolver::new(&["/R"]);
        let mut work_fs = FakeResolver::new(&["/work"]);
        work_fs.missing.push("gone".to_string());
        let assembler = OptionAssembler::new(&source_fs, &work_fs, Path::new("/work"));

        let from = FromOptions {
            include_paths: vec!["gone".to_string(), "kept".to_string()],
            ..FromOptions::default()
        };

        let to = assembler.assemble(&from, "main.scss", &MediaType::SCSS, "main.css");

        assert_eq!(
            to.include_paths,
            vec![PathBuf::from("/R"), PathBuf::from("/work/kept")]
        );
    }

    #[test]
    fn test_indented_syntax_flag_follows_media_type() {
        let fs = FakeResolver::new(&["/R"]);
        let assembler = OptionAssembler::new(&fs, &fs, Path::new("/R"));
        let from = FromOptions::default();

        let cases: HashMap<&str, (MediaType, bool)> = HashMap::from([
            ("a.scss", (MediaType::SCSS, false)),
            ("a.sass", (MediaType::SASS, true)),
        ]);

        for (path, (media_type, expected)) in cases {
            let to = assembler.assemble(&from, path, &media_type, "a.css");
            assert_eq!(to.indented_syntax, expected, "{}", path);
        }
    }

    #[test]
    fn test_source_map_settings() {
        let fs = FakeResolver::new(&["/R"]);
        let assembler = OptionAssembler::new(&fs, &fs, Path::new("/site"));
        let from = FromOptions {
            enable_source_map: true,
            output_style: OutputStyle::Compressed,
            ..FromOptions::default()
        };

        let to = assembler.assemble(&from, "css/main.scss", &MediaType::SCSS, "main.css");

        assert!(to.wants_source_map());
        assert_eq!(to.output_path, "main.css");
        assert_eq!(to.source_map_filename, "main.css.map");
        assert_eq!(to.source_map_root, PathBuf::from("/site"));
        assert!(to.source_map_contents);
        assert!(!to.omit_source_map_url);
        assert!(!to.enable_embedded_source_map);
        assert_eq!(to.output_style, OutputStyle::Compressed);
    }

    #[test]
    fn test_no_source_map_settings_when_disabled() {
        let fs = FakeResolver::new(&["/R"]);
        let assembler = OptionAssembler::new(&fs, &fs, Path::new("/site"));

        let to = assembler.assemble(
            &FromOptions::default(),
            "css/main.scss",
            &MediaType::SCSS,
            "main.css",
        );

        assert!(!to.wants_source_map());
        assert!(to.output_path.is_empty());
        assert!(!to.source_map_contents);
    }
}

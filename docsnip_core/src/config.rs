use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;

use crate::SnipError;
use crate::SnipResult;

/// Supported config file locations in discovery order (highest precedence
/// first).
pub const CONFIG_FILE_CANDIDATES: [&str; 3] = [
	"docsnip.toml",
	".docsnip.toml",
	".config/docsnip.toml",
];

/// Default documentation source directory, relative to the project root.
pub const DEFAULT_SOURCE_DIRECTORY: &str = "docs/main";

/// Default output directory, relative to the project root.
pub const DEFAULT_TARGET_DIRECTORY: &str = "target/docs/main";

/// Files matching this glob are scanned for `@@snip` directives. Everything
/// else is copied verbatim.
pub const DEFAULT_CONTENT_GLOB: &str = "**/*.md";

/// Configuration loaded from a `docsnip.toml` file.
///
/// ```toml
/// source_directory = "docs/main"
/// target_directory = "target/docs/main"
/// content_glob = "**/*.md"
/// snippet_root = "."
///
/// [exclude]
/// patterns = ["drafts/", "*.tmp"]
/// ```
#[derive(Debug, Deserialize)]
pub struct SnipConfig {
	/// Directory holding the documentation sources.
	#[serde(default = "default_source_directory")]
	pub source_directory: PathBuf,
	/// Directory the built documentation is written to. It is emptied on
	/// every successful build.
	#[serde(default = "default_target_directory")]
	pub target_directory: PathBuf,
	/// Glob, relative to the source directory, selecting content files.
	#[serde(default = "default_content_glob")]
	pub content_glob: String,
	/// Root that relative `@@snip` paths are resolved against. Defaults to the
	/// project root.
	#[serde(default)]
	pub snippet_root: Option<PathBuf>,
	/// Files under the source directory to leave out of the build entirely.
	#[serde(default)]
	pub exclude: ExcludeConfig,
}

impl Default for SnipConfig {
	fn default() -> Self {
		Self {
			source_directory: default_source_directory(),
			target_directory: default_target_directory(),
			content_glob: default_content_glob(),
			snippet_root: None,
			exclude: ExcludeConfig::default(),
		}
	}
}

/// Gitignore-style exclusions, applied relative to the source directory.
#[derive(Debug, Default, Deserialize)]
pub struct ExcludeConfig {
	#[serde(default)]
	pub patterns: Vec<String>,
}

fn default_source_directory() -> PathBuf {
	PathBuf::from(DEFAULT_SOURCE_DIRECTORY)
}

fn default_target_directory() -> PathBuf {
	PathBuf::from(DEFAULT_TARGET_DIRECTORY)
}

fn default_content_glob() -> String {
	DEFAULT_CONTENT_GLOB.to_string()
}

impl SnipConfig {
	/// Resolve the config path from known discovery candidates.
	#[must_use]
	pub fn resolve_path(root: &Path) -> Option<PathBuf> {
		CONFIG_FILE_CANDIDATES
			.iter()
			.map(|candidate| root.join(candidate))
			.find(|path| path.is_file())
	}

	/// Load the config from the first discovered config file at `root`.
	/// Returns `None` if no config file exists.
	pub fn load(root: &Path) -> SnipResult<Option<SnipConfig>> {
		let Some(config_path) = Self::resolve_path(root) else {
			return Ok(None);
		};

		let content =
			std::fs::read_to_string(&config_path).map_err(SnipError::file_io(&config_path))?;
		let config: SnipConfig =
			toml::from_str(&content).map_err(|e| SnipError::ConfigParse(e.to_string()))?;
		tracing::debug!(path = %config_path.display(), "loaded config");

		Ok(Some(config))
	}
}

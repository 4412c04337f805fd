use std::path::Path;
use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;

#[derive(Parser)]
#[command(
	author,
	version,
	about = "Build documentation with code snippets taken from real source files.",
	long_about = "docsnip copies a documentation source tree to an output directory, replacing \
	              every `@@snip [tag](path)` line in content files with the code between a pair \
	              of `// @@ tag` markers in the referenced source file.\n\nThe output directory \
	              is only rebuilt when every directive in the tree resolves, so a broken \
	              reference never produces partial documentation.\n\nQuick start:\n  docsnip \
	              build   Rebuild the documentation output\n  docsnip check   Verify every \
	              directive resolves without writing anything"
)]
pub struct DocsnipCli {
	#[command(subcommand)]
	pub command: Option<Commands>,

	/// Path to the project root directory. Config discovery and relative
	/// paths start here.
	#[arg(long, short, global = true)]
	pub path: Option<PathBuf>,

	/// Documentation source directory. Overrides `source_directory` from
	/// `docsnip.toml`.
	#[arg(long, global = true)]
	pub source: Option<PathBuf>,

	/// Output directory. Overrides `target_directory` from `docsnip.toml`.
	#[arg(long, global = true)]
	pub target: Option<PathBuf>,

	/// Glob selecting content files, relative to the source directory.
	#[arg(long, global = true)]
	pub content_glob: Option<String>,

	/// Root that relative snippet paths are resolved against.
	#[arg(long, global = true)]
	pub snippet_root: Option<PathBuf>,

	/// Enable verbose output.
	#[arg(long, short, global = true, default_value_t = false)]
	pub verbose: bool,

	/// Disable colored output.
	#[arg(long, global = true, default_value_t = false)]
	pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
	/// Rebuild the documentation output directory.
	///
	/// Walks the source directory, resolves every snippet directive, and only
	/// when no errors were found empties the output directory and writes the
	/// new tree. Exits with a non-zero status code when any directive fails
	/// to resolve.
	Build {
		/// Watch for file changes and rebuild automatically.
		#[arg(long, default_value_t = false)]
		watch: bool,
	},
	/// Check that every snippet directive resolves without writing output.
	///
	/// Ideal for CI pipelines. Use `--format` to control the output style.
	Check {
		/// Output format for check results. Use `text` for human-readable
		/// output, `json` for programmatic consumption, or `github` for
		/// GitHub Actions annotations that appear inline on PRs.
		#[arg(long, value_enum, default_value_t = OutputFormat::Text)]
		format: OutputFormat,
	},
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
	/// Human-readable text output with colors and formatting.
	Text,
	/// JSON output for programmatic consumption.
	Json,
	/// GitHub Actions annotation format. Emits `::error` and `::warning`
	/// annotations that appear inline on pull request diffs.
	Github,
}

/// The path whose file events the watcher ignores.
///
/// Notify reports events under the canonical watch root, and the target may
/// not exist yet after a failed first build, so a target below `root` is
/// re-rooted onto `canonical_root` instead of being canonicalized itself.
pub fn resolve_watch_target(root: &Path, canonical_root: &Path, target: &Path) -> PathBuf {
	match target.strip_prefix(root) {
		Ok(relative) => canonical_root.join(relative),
		Err(_) => target.canonicalize().unwrap_or_else(|_| target.to_path_buf()),
	}
}

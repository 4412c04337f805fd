use std::collections::HashSet;
use std::path::Path;
use std::path::PathBuf;

use globset::Glob;
use globset::GlobMatcher;
use ignore::gitignore::Gitignore;
use ignore::gitignore::GitignoreBuilder;

use crate::BuildError;
use crate::DirectiveParser;
use crate::SnipError;
use crate::SnipResult;
use crate::Snippet;
use crate::SnippetDirective;
use crate::config::DEFAULT_CONTENT_GLOB;
use crate::config::DEFAULT_SOURCE_DIRECTORY;
use crate::config::DEFAULT_TARGET_DIRECTORY;
use crate::config::SnipConfig;
use crate::engine::inject_snippets_into_file;
use crate::parser::parse_content_file;
use crate::snippet_cache::SnippetCache;

/// Options for a single documentation build.
///
/// Use [`BuildOptions::default()`] for the conventional layout or
/// [`BuildOptions::from_config`] to construct from a [`SnipConfig`].
#[derive(Debug, Clone)]
pub struct BuildOptions {
	/// Directory walked for content and static files.
	pub source_directory: PathBuf,
	/// Directory rebuilt from scratch on every successful build.
	pub target_directory: PathBuf,
	/// Glob selecting content files, matched relative to the source directory.
	pub content_glob: String,
	/// Root that relative snippet paths are resolved against.
	pub snippet_root: PathBuf,
	/// Gitignore-style patterns for files to leave out of the build.
	pub exclude_patterns: Vec<String>,
}

impl Default for BuildOptions {
	fn default() -> Self {
		Self {
			source_directory: PathBuf::from(DEFAULT_SOURCE_DIRECTORY),
			target_directory: PathBuf::from(DEFAULT_TARGET_DIRECTORY),
			content_glob: DEFAULT_CONTENT_GLOB.to_string(),
			snippet_root: PathBuf::new(),
			exclude_patterns: Vec::new(),
		}
	}
}

impl BuildOptions {
	/// Construct [`BuildOptions`] from an optional [`SnipConfig`], resolving
	/// every relative path against the project `root`.
	pub fn from_config(root: &Path, config: Option<&SnipConfig>) -> Self {
		let default_config = SnipConfig::default();
		let config = config.unwrap_or(&default_config);

		Self {
			source_directory: root.join(&config.source_directory),
			target_directory: root.join(&config.target_directory),
			content_glob: config.content_glob.clone(),
			snippet_root: config
				.snippet_root
				.as_ref()
				.map_or_else(|| root.to_path_buf(), |snippet_root| root.join(snippet_root)),
			exclude_patterns: config.exclude.patterns.clone(),
		}
	}
}

/// Outcome of a build or check.
#[derive(Debug, Default)]
pub struct BuildReport {
	/// Every recoverable error found in the source tree. When non-empty
	/// nothing was written.
	pub errors: Vec<BuildError>,
	/// Content files written with snippets injected.
	pub copied_with_snippets: usize,
	/// Regular files copied byte-for-byte.
	pub copied_without_snippets: usize,
	/// Snippets defined in parsed source files but never referenced.
	pub unused_snippets: Vec<Snippet>,
	/// Whether the destination directory was rebuilt.
	pub written: bool,
}

impl BuildReport {
	/// Returns true when no build errors were found.
	pub fn is_ok(&self) -> bool {
		self.errors.is_empty()
	}
}

/// A file system action deferred until the whole tree has been collected.
#[derive(Debug)]
enum PendingOperation {
	CreateDirectory {
		destination: PathBuf,
	},
	Copy {
		source: PathBuf,
		destination: PathBuf,
	},
	Inject {
		source: PathBuf,
		destination: PathBuf,
	},
}

/// Drives one documentation build.
///
/// The build runs in two phases. Collection walks the source tree, resolves
/// every directive, and queues file operations while accumulating errors.
/// Only when collection finishes without errors is the destination emptied
/// and the queued operations executed, so a failing build never leaves
/// partial output behind.
#[derive(Debug)]
pub struct DocsBuilder {
	options: BuildOptions,
	parser: DirectiveParser,
	content_matcher: GlobMatcher,
	exclude: Gitignore,
	cache: SnippetCache,
	operations: Vec<PendingOperation>,
	errors: Vec<BuildError>,
	referenced: HashSet<SnippetDirective>,
}

impl DocsBuilder {
	pub fn new(options: BuildOptions) -> SnipResult<Self> {
		let content_matcher = build_content_matcher(&options.content_glob)?;
		let exclude = build_exclude_matcher(&options.source_directory, &options.exclude_patterns)?;
		let parser = DirectiveParser::new(&options.snippet_root);

		Ok(Self {
			options,
			parser,
			content_matcher,
			exclude,
			cache: SnippetCache::new(),
			operations: Vec::new(),
			errors: Vec::new(),
			referenced: HashSet::new(),
		})
	}

	pub fn options(&self) -> &BuildOptions {
		&self.options
	}

	pub fn cache(&self) -> &SnippetCache {
		&self.cache
	}

	/// Run both phases. The destination is only touched when collection
	/// produced no errors.
	pub fn build(mut self) -> SnipResult<BuildReport> {
		tracing::info!(
			"Building Documentation from: {} to: {}",
			self.options.source_directory.display(),
			self.options.target_directory.display()
		);

		self.collect()?;
		if !self.errors.is_empty() {
			for error in &self.errors {
				tracing::error!("{} {}", error.location(), error);
			}
			return Ok(self.into_failed_report());
		}

		let mut report = self.commit()?;
		report.unused_snippets = self.warn_unused_snippets();

		Ok(report)
	}

	/// Run the collection phase only and report what a build would do.
	/// Errors are returned in the report rather than logged.
	pub fn check(mut self) -> SnipResult<BuildReport> {
		self.collect()?;
		if !self.errors.is_empty() {
			return Ok(self.into_failed_report());
		}

		let unused_snippets = self.warn_unused_snippets();
		Ok(BuildReport {
			unused_snippets,
			..BuildReport::default()
		})
	}

	/// Walk the source tree, resolve every directive, and queue operations.
	fn collect(&mut self) -> SnipResult<()> {
		let source_root = self.options.source_directory.clone();
		ensure_source_has_entries(&source_root)?;
		ensure_target_outside_source(&source_root, &self.options.target_directory)?;

		let skip = self.options.target_directory.canonicalize().ok();
		let entries = collect_entries(&source_root, &self.exclude, skip.as_deref())?;

		for entry in entries {
			let relative = entry.path.strip_prefix(&source_root).unwrap_or(&entry.path);
			let destination = self.options.target_directory.join(relative);

			if entry.is_dir {
				self.operations
					.push(PendingOperation::CreateDirectory { destination });
			} else if self.content_matcher.is_match(relative) {
				self.collect_content_file(entry.path, destination)?;
			} else {
				self.operations.push(PendingOperation::Copy {
					source: entry.path,
					destination,
				});
			}
		}

		Ok(())
	}

	fn collect_content_file(&mut self, source: PathBuf, destination: PathBuf) -> SnipResult<()> {
		let (errors, occurrences) = parse_content_file(&self.parser, &source)?.into_parts();
		self.errors.extend(errors);

		for occurrence in &occurrences {
			self.referenced.insert(occurrence.directive().clone());
			let (errors, _) = self.cache.resolve(occurrence)?.into_parts();
			self.errors.extend(errors);
		}

		tracing::debug!(
			file = %source.display(),
			directives = occurrences.len(),
			"collected content file"
		);

		let operation = if occurrences.is_empty() {
			PendingOperation::Copy {
				source,
				destination,
			}
		} else {
			PendingOperation::Inject {
				source,
				destination,
			}
		};
		self.operations.push(operation);

		Ok(())
	}

	fn into_failed_report(self) -> BuildReport {
		BuildReport {
			errors: self.errors,
			..BuildReport::default()
		}
	}

	/// Empty the destination and execute every queued operation.
	fn commit(&self) -> SnipResult<BuildReport> {
		create_or_clean_target_directory(&self.options.target_directory)?;

		let mut report = BuildReport {
			written: true,
			..BuildReport::default()
		};

		for operation in &self.operations {
			match operation {
				PendingOperation::CreateDirectory { destination } => {
					std::fs::create_dir_all(destination)
						.map_err(SnipError::file_io(destination))?;
				}
				PendingOperation::Copy {
					source,
					destination,
				} => {
					ensure_parent(destination)?;
					std::fs::copy(source, destination).map_err(SnipError::file_io(destination))?;
					report.copied_without_snippets += 1;
				}
				PendingOperation::Inject {
					source,
					destination,
				} => {
					let lines =
						inject_snippets_into_file(&self.parser, source, self.cache.snippets())?;
					ensure_parent(destination)?;
					std::fs::write(destination, join_lines(&lines))
						.map_err(SnipError::file_io(destination))?;
					report.copied_with_snippets += 1;
				}
			}
		}

		tracing::info!("Copied {} files with snippets", report.copied_with_snippets);
		tracing::info!(
			"Copied {} files without snippets",
			report.copied_without_snippets
		);

		Ok(report)
	}

	/// Warn about snippets in parsed source files that nothing referenced.
	/// Source files no content file pointed at are never read, so this is
	/// best effort.
	fn warn_unused_snippets(&self) -> Vec<Snippet> {
		let unused: Vec<Snippet> = self
			.cache
			.unused(&self.referenced)
			.into_iter()
			.cloned()
			.collect();

		if !unused.is_empty() {
			tracing::warn!(
				"Ran into unused snippet in parsed source file. Note we do not check every \
				 possible file for unused snippets"
			);
		}

		for snippet in &unused {
			tracing::warn!(
				"Unused snippet (in source file): {} line: {}",
				snippet.directive(),
				snippet.line_number()
			);
		}

		unused
	}
}

/// Build the documentation described by `options`.
pub fn build_docs(options: BuildOptions) -> SnipResult<BuildReport> {
	DocsBuilder::new(options)?.build()
}

/// Collect and validate the documentation described by `options` without
/// writing anything.
pub fn check_docs(options: BuildOptions) -> SnipResult<BuildReport> {
	DocsBuilder::new(options)?.check()
}

/// Load the project config at `root` and build with it.
pub fn build_project(root: &Path) -> SnipResult<BuildReport> {
	let config = SnipConfig::load(root)?;
	build_docs(BuildOptions::from_config(root, config.as_ref()))
}

/// Normalize CRLF line endings to LF.
pub fn normalize_line_endings(content: &str) -> String {
	if content.contains('\r') {
		content.replace("\r\n", "\n").replace('\r', "\n")
	} else {
		content.to_string()
	}
}

/// Read a text file with normalized line endings.
pub(crate) fn read_normalized(path: &Path) -> SnipResult<String> {
	let content = std::fs::read_to_string(path).map_err(SnipError::file_io(path))?;
	Ok(normalize_line_endings(&content))
}

fn join_lines(lines: &[String]) -> String {
	let mut output = String::new();
	for line in lines {
		output.push_str(line);
		output.push('\n');
	}
	output
}

fn ensure_parent(path: &Path) -> SnipResult<()> {
	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent).map_err(SnipError::file_io(parent))?;
	}
	Ok(())
}

/// Strip the optional `glob:` prefix and compile the content glob.
fn build_content_matcher(pattern: &str) -> SnipResult<GlobMatcher> {
	let glob = pattern.strip_prefix("glob:").unwrap_or(pattern);
	Glob::new(glob)
		.map(|glob| glob.compile_matcher())
		.map_err(|e| {
			SnipError::InvalidContentGlob {
				pattern: pattern.to_string(),
				reason: e.to_string(),
			}
		})
}

/// Build a `Gitignore` matcher from the configured exclude patterns.
fn build_exclude_matcher(root: &Path, patterns: &[String]) -> SnipResult<Gitignore> {
	let mut builder = GitignoreBuilder::new(root);
	for pattern in patterns {
		builder.add_line(None, pattern).map_err(|e| {
			SnipError::InvalidExcludePattern {
				pattern: pattern.clone(),
				reason: e.to_string(),
			}
		})?;
	}
	builder.build().map_err(|e| {
		SnipError::InvalidExcludePattern {
			pattern: patterns.join(", "),
			reason: e.to_string(),
		}
	})
}

fn ensure_source_has_entries(source_root: &Path) -> SnipResult<()> {
	if !source_root.is_dir() {
		return Err(SnipError::SourceDirectoryMissing(source_root.to_path_buf()));
	}

	let mut entries = std::fs::read_dir(source_root).map_err(SnipError::file_io(source_root))?;
	if entries.next().is_none() {
		return Err(SnipError::EmptySourceDirectory(source_root.to_path_buf()));
	}

	Ok(())
}

/// The target is emptied on commit, so it must never be the source directory
/// or one of its ancestors.
fn ensure_target_outside_source(source_root: &Path, target: &Path) -> SnipResult<()> {
	let Ok(target) = target.canonicalize() else {
		// A missing target cannot contain the existing source directory.
		return Ok(());
	};
	let source = source_root
		.canonicalize()
		.map_err(SnipError::file_io(source_root))?;

	if source.starts_with(&target) {
		return Err(SnipError::TargetContainsSource {
			target,
			source_directory: source,
		});
	}

	Ok(())
}

fn create_or_clean_target_directory(target: &Path) -> SnipResult<()> {
	if target.exists() {
		tracing::info!("Emptying directory: {}", target.display());
		std::fs::remove_dir_all(target).map_err(SnipError::file_io(target))?;
	}
	std::fs::create_dir_all(target).map_err(SnipError::file_io(target))?;
	Ok(())
}

#[derive(Debug)]
struct WalkEntry {
	path: PathBuf,
	is_dir: bool,
}

/// Collect every directory and file below `root` in sorted, depth-first
/// order.
fn collect_entries(
	root: &Path,
	exclude: &Gitignore,
	skip: Option<&Path>,
) -> SnipResult<Vec<WalkEntry>> {
	let mut entries = Vec::new();
	let mut visited_dirs = HashSet::new();
	walk_dir(root, &mut entries, exclude, skip, &mut visited_dirs)?;
	Ok(entries)
}

fn walk_dir(
	dir: &Path,
	entries: &mut Vec<WalkEntry>,
	exclude: &Gitignore,
	skip: Option<&Path>,
	visited_dirs: &mut HashSet<PathBuf>,
) -> SnipResult<()> {
	// Detect symlink cycles by tracking canonical paths.
	let canonical = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
	if !visited_dirs.insert(canonical) {
		return Err(SnipError::SymlinkCycle {
			path: dir.display().to_string(),
		});
	}

	let mut paths = std::fs::read_dir(dir)
		.and_then(|entries| {
			entries
				.map(|entry| entry.map(|entry| entry.path()))
				.collect::<Result<Vec<_>, _>>()
		})
		.map_err(SnipError::file_io(dir))?;
	// Sort for deterministic ordering.
	paths.sort();

	for path in paths {
		let is_dir = path.is_dir();

		if exclude.matched(&path, is_dir).is_ignore() {
			continue;
		}

		if is_dir {
			// Never walk into the build output.
			if skip.is_some_and(|skip| path.canonicalize().is_ok_and(|path| path == skip)) {
				continue;
			}

			entries.push(WalkEntry {
				path: path.clone(),
				is_dir: true,
			});
			walk_dir(&path, entries, exclude, skip, visited_dirs)?;
		} else if path.is_file() {
			entries.push(WalkEntry {
				path,
				is_dir: false,
			});
		}
	}

	Ok(())
}

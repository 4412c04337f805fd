use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

use crate::SnippetDirective;
use crate::SnippetDirectiveOccurrence;
use crate::VALID_SNIPPET_IDENTIFIER;

/// Fatal errors. Any of these aborts the build. Only `FileIo` and
/// `MissingSnippet` can be raised after the destination has been emptied.
#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum SnipError {
	#[error(transparent)]
	#[diagnostic(code(docsnip::io_error))]
	Io(#[from] std::io::Error),

	#[error("failed to access {}: {source}", .path.display())]
	#[diagnostic(code(docsnip::file_io))]
	FileIo {
		path: PathBuf,
		source: std::io::Error,
	},

	#[error(
		"refusing to empty target directory {} because it contains source directory {}",
		.target.display(),
		.source_directory.display()
	)]
	#[diagnostic(
		code(docsnip::target_contains_source),
		help("point `target_directory` outside the documentation sources")
	)]
	TargetContainsSource {
		target: PathBuf,
		source_directory: PathBuf,
	},

	#[error("No files in source directory to copy: {}", .0.display())]
	#[diagnostic(
		code(docsnip::empty_source_directory),
		help("add at least one file to the documentation source directory")
	)]
	EmptySourceDirectory(PathBuf),

	#[error("source directory does not exist: {}", .0.display())]
	#[diagnostic(
		code(docsnip::missing_source_directory),
		help("set `source_directory` in docsnip.toml or pass `--source`")
	)]
	SourceDirectoryMissing(PathBuf),

	#[error("invalid content glob `{pattern}`: {reason}")]
	#[diagnostic(code(docsnip::invalid_content_glob))]
	InvalidContentGlob { pattern: String, reason: String },

	#[error("invalid exclude pattern `{pattern}`: {reason}")]
	#[diagnostic(code(docsnip::invalid_exclude_pattern))]
	InvalidExcludePattern { pattern: String, reason: String },

	#[error("failed to parse config file: {0}")]
	#[diagnostic(
		code(docsnip::config_parse),
		help("check that docsnip.toml is valid TOML")
	)]
	ConfigParse(String),

	#[error("symlink cycle detected at: `{path}`")]
	#[diagnostic(
		code(docsnip::symlink_cycle),
		help("remove the circular symlink or exclude this path")
	)]
	SymlinkCycle { path: String },

	/// A directive survived collection but its snippet is absent at injection
	/// time. This can only happen when the orchestrator is misused.
	#[error("snippet `{directive}` referenced from {} was never resolved", .file.display())]
	#[diagnostic(code(docsnip::missing_snippet))]
	MissingSnippet {
		directive: SnippetDirective,
		file: PathBuf,
	},
}

impl SnipError {
	/// Attach `path` to an I/O error.
	pub fn file_io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
		let path = path.into();
		move |source| Self::FileIo { path, source }
	}
}

pub type SnipResult<T> = Result<T, SnipError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;

/// A recoverable problem found while collecting snippets.
///
/// Build errors are returned as data and accumulated across the whole source
/// tree so that a single run reports every problem at once.
#[derive(Debug, Clone, PartialEq, Eq, Diagnostic, Error)]
pub enum BuildError {
	#[error(
		"Tag: {} appeared more than once in source file: {}. Snippet tags must be unique in \
		 source files.",
		.directive.tag(),
		.directive.path().display()
	)]
	#[diagnostic(
		code(docsnip::duplicate_tag),
		help("rename one of the blocks so every tag in a file is unique")
	)]
	DuplicateTag {
		directive: SnippetDirective,
		/// Start lines of every earlier block with the same tag.
		line_numbers: Vec<usize>,
	},

	#[error(
		"Invalid snippet tag: {} in file: {} line: {}. Tags must be in the form: {}",
		.0.directive().tag(),
		.0.definition_path().display(),
		.0.line_number(),
		VALID_SNIPPET_IDENTIFIER
	)]
	#[diagnostic(
		code(docsnip::invalid_identifier),
		help("tags start with a letter followed by letters, digits or underscores")
	)]
	InvalidIdentifier(SnippetDirectiveOccurrence),

	#[error("Cannot locate source file: {}", .0.directive().path().display())]
	#[diagnostic(
		code(docsnip::snippet_file_not_found),
		help("check the path inside the parentheses of the `@@snip` directive")
	)]
	SnippetFileNotFound(SnippetDirectiveOccurrence),

	#[error(
		"Unable to find Snippet Block tagged {} In file {}",
		.0.directive().tag(),
		.0.directive().path().display()
	)]
	#[diagnostic(
		code(docsnip::snippet_tag_not_found),
		help("wrap the code in `// @@ <tag>` markers inside the source file")
	)]
	SnippetTagNotFound(SnippetDirectiveOccurrence),
}

impl BuildError {
	/// Where the error was found, e.g. `docs/index.md line: 4`.
	pub fn location(&self) -> String {
		match self {
			Self::DuplicateTag {
				directive,
				line_numbers,
			} => {
				let lines = line_numbers
					.iter()
					.map(ToString::to_string)
					.collect::<Vec<_>>()
					.join(", ");
				format!("{} lines: {lines}", directive.path().display())
			}
			Self::InvalidIdentifier(occurrence)
			| Self::SnippetFileNotFound(occurrence)
			| Self::SnippetTagNotFound(occurrence) => {
				format!(
					"{} line: {}",
					occurrence.definition_path().display(),
					occurrence.line_number()
				)
			}
		}
	}

	/// Human-readable explanation of the error.
	pub fn message(&self) -> String {
		self.to_string()
	}

	/// The file the error should be attributed to when annotating output.
	pub fn file(&self) -> &std::path::Path {
		match self {
			Self::DuplicateTag { directive, .. } => directive.path(),
			Self::InvalidIdentifier(occurrence)
			| Self::SnippetFileNotFound(occurrence)
			| Self::SnippetTagNotFound(occurrence) => occurrence.definition_path(),
		}
	}

	/// The first line the error refers to.
	pub fn line(&self) -> usize {
		match self {
			Self::DuplicateTag { line_numbers, .. } => {
				line_numbers.first().copied().unwrap_or(1)
			}
			Self::InvalidIdentifier(occurrence)
			| Self::SnippetFileNotFound(occurrence)
			| Self::SnippetTagNotFound(occurrence) => occurrence.line_number(),
		}
	}
}

/// Errors as data: a value together with every recoverable error found while
/// producing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseResult<T> {
	pub errors: Vec<BuildError>,
	pub value: T,
}

impl<T> ParseResult<T> {
	pub fn new(errors: Vec<BuildError>, value: T) -> Self {
		Self { errors, value }
	}

	/// A result without errors.
	pub fn ok(value: T) -> Self {
		Self::new(Vec::new(), value)
	}

	pub fn has_errors(&self) -> bool {
		!self.errors.is_empty()
	}

	pub fn into_parts(self) -> (Vec<BuildError>, T) {
		(self.errors, self.value)
	}
}

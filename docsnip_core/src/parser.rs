use std::fmt;
use std::path::Path;
use std::path::PathBuf;

use crate::BuildError;
use crate::ParseResult;
use crate::SnipResult;
use crate::project::read_normalized;

/// The grammar every snippet tag must satisfy.
pub const VALID_SNIPPET_IDENTIFIER: &str = "[A-Za-z][A-Za-z0-9_]*";

/// A reference to one tagged block inside one source file.
///
/// Written in content files as:
///
/// ```text
/// @@snip [drop_duplicate_rows](src/table.rs)
/// ```
///
/// The tag is lowercased on construction so that identity is
/// case-insensitive. Two directives are equal when both their tag and their
/// path are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SnippetDirective {
	tag: String,
	path: PathBuf,
}

impl SnippetDirective {
	pub fn new(tag: impl AsRef<str>, path: impl Into<PathBuf>) -> Self {
		Self {
			tag: tag.as_ref().to_lowercase(),
			path: path.into(),
		}
	}

	pub fn tag(&self) -> &str {
		&self.tag
	}

	pub fn path(&self) -> &Path {
		&self.path
	}
}

impl fmt::Display for SnippetDirective {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "@@snip [{}]({})", self.tag, self.path.display())
	}
}

/// A directive together with the place it was written. Only used to locate
/// errors, so it is not part of the directive's identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SnippetDirectiveOccurrence {
	directive: SnippetDirective,
	line_number: usize,
	definition_path: PathBuf,
}

impl SnippetDirectiveOccurrence {
	pub fn new(
		directive: SnippetDirective,
		line_number: usize,
		definition_path: impl Into<PathBuf>,
	) -> Self {
		Self {
			directive,
			line_number,
			definition_path: definition_path.into(),
		}
	}

	pub fn directive(&self) -> &SnippetDirective {
		&self.directive
	}

	/// 1-indexed line of the directive in its content file.
	pub fn line_number(&self) -> usize {
		self.line_number
	}

	pub fn definition_path(&self) -> &Path {
		&self.definition_path
	}
}

impl fmt::Display for SnippetDirectiveOccurrence {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"{} defined in file: {} line: {}",
			self.directive,
			self.definition_path.display(),
			self.line_number
		)
	}
}

/// The raw pieces of a directive line before any path resolution or tag
/// validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawDirective<'a> {
	pub tag: &'a str,
	pub path: &'a str,
}

/// Recognize `@@snip [tag](path)` in a single line.
///
/// Leading whitespace and any text after the closing parenthesis are
/// ignored. The `snip` keyword is case-insensitive. The tag runs up to the
/// first `](` and the path up to the last `)` on the line, so paths may
/// contain parentheses. The tag is returned unvalidated.
pub fn parse_directive(line: &str) -> Option<RawDirective<'_>> {
	let rest = line.trim_start().strip_prefix("@@")?;
	let (keyword, rest) = rest.split_at_checked(4)?;
	if !keyword.eq_ignore_ascii_case("snip") {
		return None;
	}

	let rest = rest.trim_start().strip_prefix('[')?;
	let tag_end = rest.find("](")?;
	let tag = &rest[..tag_end];
	let rest = &rest[tag_end + 2..];
	let path_end = rest.rfind(')')?;
	let path = rest[..path_end].trim();

	if tag.is_empty() || path.is_empty() {
		return None;
	}

	Some(RawDirective { tag, path })
}

/// Check a tag against [`VALID_SNIPPET_IDENTIFIER`].
pub fn is_valid_identifier(tag: &str) -> bool {
	let mut chars = tag.chars();
	chars.next().is_some_and(|c| c.is_ascii_alphabetic())
		&& chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Turns directive lines into [`SnippetDirectiveOccurrence`]s, resolving
/// relative snippet paths against a fixed root.
#[derive(Debug, Clone, Default)]
pub struct DirectiveParser {
	snippet_root: PathBuf,
}

impl DirectiveParser {
	/// Relative directive paths are joined onto `snippet_root`. Absolute
	/// paths are used as written.
	pub fn new(snippet_root: impl Into<PathBuf>) -> Self {
		Self {
			snippet_root: snippet_root.into(),
		}
	}

	pub fn snippet_root(&self) -> &Path {
		&self.snippet_root
	}

	/// Parse a single line written at `line_number` of `definition_path`.
	/// Lines without a directive produce `None`; this is not an error.
	pub fn parse_line(
		&self,
		line: &str,
		line_number: usize,
		definition_path: &Path,
	) -> Option<SnippetDirectiveOccurrence> {
		let raw = parse_directive(line)?;
		let directive = SnippetDirective::new(raw.tag, self.snippet_root.join(raw.path));

		Some(SnippetDirectiveOccurrence::new(
			directive,
			line_number,
			definition_path,
		))
	}
}

/// Scan content for directives, returning valid occurrences in file order
/// and an [`BuildError::InvalidIdentifier`] for every malformed tag.
pub fn parse_content(
	parser: &DirectiveParser,
	content: impl AsRef<str>,
	definition_path: &Path,
) -> ParseResult<Vec<SnippetDirectiveOccurrence>> {
	let mut occurrences = Vec::new();
	let mut errors = Vec::new();

	for (index, line) in content.as_ref().lines().enumerate() {
		let Some(occurrence) = parser.parse_line(line, index + 1, definition_path) else {
			continue;
		};

		if is_valid_identifier(occurrence.directive().tag()) {
			occurrences.push(occurrence);
		} else {
			errors.push(BuildError::InvalidIdentifier(occurrence));
		}
	}

	ParseResult::new(errors, occurrences)
}

/// Read a content file from disk and scan it for directives.
pub fn parse_content_file(
	parser: &DirectiveParser,
	path: &Path,
) -> SnipResult<ParseResult<Vec<SnippetDirectiveOccurrence>>> {
	let content = read_normalized(path)?;
	Ok(parse_content(parser, &content, path))
}

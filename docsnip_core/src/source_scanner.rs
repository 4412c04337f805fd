use std::collections::HashMap;
use std::path::Path;

use crate::BuildError;
use crate::ParseResult;
use crate::SnipResult;
use crate::SnippetDirective;
use crate::SnippetDirectiveOccurrence;
use crate::project::read_normalized;

/// The resolved content of one directive: the lines between a pair of
/// `// @@ tag` markers in a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snippet {
	directive: SnippetDirective,
	line_number: usize,
	lines: Vec<String>,
}

impl Snippet {
	pub fn new(directive: SnippetDirective, line_number: usize, lines: Vec<String>) -> Self {
		Self {
			directive,
			line_number,
			lines,
		}
	}

	pub fn directive(&self) -> &SnippetDirective {
		&self.directive
	}

	pub fn tag(&self) -> &str {
		self.directive.tag()
	}

	/// 1-indexed line of the opening marker in the source file.
	pub fn line_number(&self) -> usize {
		self.line_number
	}

	/// Body lines in source order. The marker lines are never included.
	pub fn lines(&self) -> &[String] {
		&self.lines
	}
}

/// Recognize a `// @@ tag` marker and return the tag.
///
/// Whitespace is allowed around `//` and `@@`. The tag is the longest
/// identifier that follows; anything after it on the line is ignored.
pub fn parse_marker(line: &str) -> Option<&str> {
	let rest = line.trim_start().strip_prefix("//")?;
	let rest = rest.trim_start().strip_prefix("@@")?.trim_start();

	if !rest.starts_with(|c: char| c.is_ascii_alphabetic()) {
		return None;
	}

	let end = rest
		.find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
		.unwrap_or(rest.len());

	Some(&rest[..end])
}

/// Read the source file referenced by `occurrence` and extract every snippet
/// it defines, not only the one that was asked for.
///
/// A missing file is reported as [`BuildError::SnippetFileNotFound`] with no
/// snippets.
pub fn extract_snippets(
	occurrence: &SnippetDirectiveOccurrence,
) -> SnipResult<ParseResult<Vec<Snippet>>> {
	let path = occurrence.directive().path();
	if !path.is_file() {
		return Ok(ParseResult::new(
			vec![BuildError::SnippetFileNotFound(occurrence.clone())],
			Vec::new(),
		));
	}

	let content = read_normalized(path)?;
	Ok(scan_snippets(path, &content))
}

/// Run the marker state machine over `content`, attributing every snippet to
/// `path`.
///
/// Blocks never nest. A marker with the open tag closes the block, a marker
/// with any other tag closes the open block and starts a new one, and a
/// block still open at the end of the content runs to the last line. When a
/// tag is seen more than once the first block wins and each later block
/// produces a [`BuildError::DuplicateTag`] listing the earlier start lines.
pub fn scan_snippets(path: &Path, content: &str) -> ParseResult<Vec<Snippet>> {
	let mut scanner = SnippetScanner::new(path);
	let mut open: Option<OpenBlock> = None;

	for (index, line) in content.lines().enumerate() {
		let line_number = index + 1;

		let Some(tag) = parse_marker(line) else {
			if let Some(block) = open.as_mut() {
				block.lines.push(line.to_string());
			}
			continue;
		};

		let directive = SnippetDirective::new(tag, path);
		open = match open.take() {
			None => Some(OpenBlock::new(directive, line_number)),
			Some(block) => {
				let is_closing = block.directive == directive;
				scanner.finish(block);

				if is_closing {
					None
				} else {
					Some(OpenBlock::new(directive, line_number))
				}
			}
		};
	}

	if let Some(block) = open {
		scanner.finish(block);
	}

	ParseResult::new(scanner.errors, scanner.found)
}

/// A block whose closing marker has not been reached yet.
struct OpenBlock {
	directive: SnippetDirective,
	line_number: usize,
	lines: Vec<String>,
}

impl OpenBlock {
	fn new(directive: SnippetDirective, line_number: usize) -> Self {
		Self {
			directive,
			line_number,
			lines: Vec::new(),
		}
	}
}

struct SnippetScanner<'a> {
	path: &'a Path,
	found: Vec<Snippet>,
	errors: Vec<BuildError>,
	/// Start line of every block seen so far, keyed by tag.
	seen_tag_lines: HashMap<String, Vec<usize>>,
}

impl<'a> SnippetScanner<'a> {
	fn new(path: &'a Path) -> Self {
		Self {
			path,
			found: Vec::new(),
			errors: Vec::new(),
			seen_tag_lines: HashMap::new(),
		}
	}

	fn finish(&mut self, block: OpenBlock) {
		let seen = self
			.seen_tag_lines
			.entry(block.directive.tag().to_string())
			.or_default();

		if seen.is_empty() {
			self.found.push(Snippet::new(
				block.directive,
				block.line_number,
				block.lines,
			));
		} else {
			tracing::debug!(
				path = %self.path.display(),
				tag = block.directive.tag(),
				line = block.line_number,
				"dropping duplicate snippet block"
			);
			self.errors.push(BuildError::DuplicateTag {
				directive: block.directive,
				line_numbers: seen.clone(),
			});
		}

		seen.push(block.line_number);
	}
}

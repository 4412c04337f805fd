use std::collections::HashMap;
use std::path::Path;

use crate::DirectiveParser;
use crate::SnipError;
use crate::SnipResult;
use crate::Snippet;
use crate::SnippetDirective;
use crate::project::read_normalized;

/// Remove the indentation shared by every non-empty line.
///
/// Empty lines neither constrain the shared indentation nor get modified.
/// Relative indentation between lines is preserved.
pub fn normalize_indentation<S: AsRef<str>>(lines: &[S]) -> Vec<String> {
	let shared = lines
		.iter()
		.map(AsRef::as_ref)
		.filter(|line| !line.is_empty())
		.map(|line| line.chars().take_while(|c| c.is_whitespace()).count())
		.min()
		.unwrap_or(0);

	lines
		.iter()
		.map(AsRef::as_ref)
		.map(|line| {
			if shared == 0 || line.is_empty() {
				return line.to_string();
			}

			let start = line
				.char_indices()
				.nth(shared)
				.map_or(line.len(), |(offset, _)| offset);
			line[start..].to_string()
		})
		.collect()
}

/// Replace every directive line in `content` with the normalized body of its
/// snippet. Other lines pass through unchanged.
///
/// All directives must already be resolved. A directive without a snippet
/// in `snippets` means collection was skipped, and is reported as
/// [`SnipError::MissingSnippet`].
#[allow(clippy::implicit_hasher)]
pub fn inject_snippets(
	parser: &DirectiveParser,
	content: impl AsRef<str>,
	content_file: &Path,
	snippets: &HashMap<SnippetDirective, Snippet>,
) -> SnipResult<Vec<String>> {
	let mut lines = Vec::new();

	for line in content.as_ref().lines() {
		// Positions are irrelevant once every directive has been resolved.
		let Some(occurrence) = parser.parse_line(line, 0, content_file) else {
			lines.push(line.to_string());
			continue;
		};

		let Some(snippet) = snippets.get(occurrence.directive()) else {
			return Err(SnipError::MissingSnippet {
				directive: occurrence.directive().clone(),
				file: content_file.to_path_buf(),
			});
		};

		lines.extend(normalize_indentation(snippet.lines()));
	}

	Ok(lines)
}

/// Read `content_file` from disk and inject its snippets.
#[allow(clippy::implicit_hasher)]
pub fn inject_snippets_into_file(
	parser: &DirectiveParser,
	content_file: &Path,
	snippets: &HashMap<SnippetDirective, Snippet>,
) -> SnipResult<Vec<String>> {
	let content = read_normalized(content_file)?;
	inject_snippets(parser, &content, content_file, snippets)
}

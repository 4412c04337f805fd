use std::collections::HashMap;
use std::collections::HashSet;
use std::path::Path;
use std::path::PathBuf;

use crate::BuildError;
use crate::ParseResult;
use crate::SnipResult;
use crate::Snippet;
use crate::SnippetDirective;
use crate::SnippetDirectiveOccurrence;
use crate::source_scanner::extract_snippets;

/// Loads and memoizes snippets from source files for a single build.
///
/// A source file is read at most once. The first lookup against a path
/// extracts every snippet in that file, so later lookups for other tags in
/// the same file are answered from memory. Paths are remembered as either
/// parsed or missing, which keeps "file not found" and "tag not found"
/// distinct no matter the order of lookups.
#[derive(Debug, Default)]
pub struct SnippetCache {
	snippets: HashMap<SnippetDirective, Snippet>,
	seen_paths: HashSet<PathBuf>,
	missing_paths: HashSet<PathBuf>,
}

impl SnippetCache {
	pub fn new() -> Self {
		Self::default()
	}

	/// Every snippet extracted so far, across all parsed source files.
	pub fn snippets(&self) -> &HashMap<SnippetDirective, Snippet> {
		&self.snippets
	}

	pub fn get(&self, directive: &SnippetDirective) -> Option<&Snippet> {
		self.snippets.get(directive)
	}

	/// Whether the source file at `path` has already been read.
	pub fn is_parsed(&self, path: &Path) -> bool {
		self.seen_paths.contains(path) || self.missing_paths.contains(path)
	}

	/// Resolve an occurrence to its snippet, parsing the source file on first
	/// touch. Unresolvable occurrences yield `None` plus a build error.
	pub fn resolve(
		&mut self,
		occurrence: &SnippetDirectiveOccurrence,
	) -> SnipResult<ParseResult<Option<&Snippet>>> {
		let directive = occurrence.directive();

		if self.snippets.contains_key(directive) {
			return Ok(ParseResult::ok(self.snippets.get(directive)));
		}

		let path = directive.path();
		if self.seen_paths.contains(path) {
			return Ok(ParseResult::new(
				vec![BuildError::SnippetTagNotFound(occurrence.clone())],
				None,
			));
		}

		if self.missing_paths.contains(path) {
			return Ok(ParseResult::new(
				vec![BuildError::SnippetFileNotFound(occurrence.clone())],
				None,
			));
		}

		let mut errors = self.parse_and_cache(occurrence)?;
		if self.seen_paths.contains(path) && !self.snippets.contains_key(directive) {
			errors.push(BuildError::SnippetTagNotFound(occurrence.clone()));
		}

		Ok(ParseResult::new(errors, self.snippets.get(directive)))
	}

	/// Snippets that were extracted but never referenced, ordered by source
	/// file and line.
	///
	/// Only files touched during this build are considered, so this is not an
	/// exhaustive search of the project.
	#[allow(clippy::implicit_hasher)]
	pub fn unused(&self, referenced: &HashSet<SnippetDirective>) -> Vec<&Snippet> {
		let mut unused: Vec<&Snippet> = self
			.snippets
			.iter()
			.filter(|(directive, _)| !referenced.contains(*directive))
			.map(|(_, snippet)| snippet)
			.collect();
		unused.sort_by(|a, b| {
			a.directive()
				.path()
				.cmp(b.directive().path())
				.then_with(|| a.line_number().cmp(&b.line_number()))
		});
		unused
	}

	fn parse_and_cache(
		&mut self,
		occurrence: &SnippetDirectiveOccurrence,
	) -> SnipResult<Vec<BuildError>> {
		let path = occurrence.directive().path();
		if path.is_file() {
			self.seen_paths.insert(path.to_path_buf());
		} else {
			self.missing_paths.insert(path.to_path_buf());
		}

		let (errors, snippets) = extract_snippets(occurrence)?.into_parts();
		tracing::debug!(
			path = %path.display(),
			snippets = snippets.len(),
			errors = errors.len(),
			"parsed source file"
		);

		for snippet in snippets {
			self.snippets
				.entry(snippet.directive().clone())
				.or_insert(snippet);
		}

		Ok(errors)
	}
}

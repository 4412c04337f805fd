use std::path::Path;
use std::path::PathBuf;

use tempfile::TempDir;

use crate::BuildOptions;

pub(crate) const SOURCE_WITH_ONE_SNIPPET: &str = "fn main() {\n\t//@@ snip_one\n\tcode\n\t//@@ snip_one\n}\n";

pub(crate) const SOURCE_WITH_TWO_SNIPPETS: &str = "\
struct Table;

impl Table {
    // @@ first
    fn first(&self) {
        println!(\"first\");
    }
    // @@ first

    // @@ second
    fn second(&self) {}
    // @@ second
}
";

/// A temporary project with a `docs` source tree and a `src` snippet tree.
pub(crate) struct Sandbox {
	pub(crate) dir: TempDir,
}

impl Sandbox {
	pub(crate) fn new() -> Self {
		let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
		Self { dir }
	}

	pub(crate) fn root(&self) -> &Path {
		self.dir.path()
	}

	pub(crate) fn docs(&self) -> PathBuf {
		self.root().join("docs")
	}

	pub(crate) fn target(&self) -> PathBuf {
		self.root().join("out")
	}

	/// Write `content` to `relative`, creating parent directories.
	pub(crate) fn write(&self, relative: &str, content: &str) -> PathBuf {
		let path = self.root().join(relative);
		if let Some(parent) = path.parent() {
			std::fs::create_dir_all(parent).unwrap_or_else(|e| panic!("create_dir_all: {e}"));
		}
		std::fs::write(&path, content).unwrap_or_else(|e| panic!("write: {e}"));
		path
	}

	pub(crate) fn read(&self, relative: &str) -> String {
		std::fs::read_to_string(self.root().join(relative))
			.unwrap_or_else(|e| panic!("read {relative}: {e}"))
	}

	pub(crate) fn exists(&self, relative: &str) -> bool {
		self.root().join(relative).exists()
	}

	pub(crate) fn options(&self) -> BuildOptions {
		BuildOptions {
			source_directory: self.docs(),
			target_directory: self.target(),
			snippet_root: self.root().to_path_buf(),
			..BuildOptions::default()
		}
	}
}

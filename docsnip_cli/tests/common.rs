#![allow(dead_code)]

use std::path::Path;

use assert_cmd::Command;

pub const SOURCE: &str = "fn main() {\n    // @@ greeting\n    println!(\"hello\");\n    // @@ greeting\n}\n";

pub fn docsnip_cmd() -> Command {
	let mut cmd = Command::new(env!("CARGO_BIN_EXE_docsnip"));
	cmd.env("NO_COLOR", "1");
	cmd.env_remove("DOCSNIP_LOG");
	cmd
}

/// Write `content` to `relative` under `root`, creating parent directories.
pub fn write(root: &Path, relative: &str, content: &str) -> std::io::Result<()> {
	let path = root.join(relative);
	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent)?;
	}
	std::fs::write(path, content)
}

/// A project using the default layout with one resolvable directive.
pub fn write_project(root: &Path) -> std::io::Result<()> {
	write(root, "src/main.rs", SOURCE)?;
	write(root, "docs/main/index.md", "# Hello\n\n@@snip [greeting](src/main.rs)\n")?;
	write(root, "docs/main/assets/style.css", "body {}\n")
}

//! `docsnip_core` builds a documentation tree from a source tree, replacing
//! `@@snip [tag](path)` directives in content files with code taken from
//! real, compiled source files.
//!
//! ## Processing Pipeline
//!
//! ```text
//! Documentation source directory
//!   → Walk (sorted, depth-first, exclusions applied)
//!   → Parser (finds `@@snip` directives in content files)
//!   → Snippet cache (reads each referenced source file once, extracts `// @@ tag` blocks)
//!   → Engine (replaces directive lines with indentation-normalized snippet bodies)
//!   → Destination directory (emptied and rewritten only when no errors were found)
//! ```
//!
//! ## Modules
//!
//! - [`config`]: Configuration loading from `docsnip.toml`.
//! - [`project`]: The build orchestrator and directory walking.
//!
//! ## Example
//!
//! Given a source file containing
//!
//! ```text
//! fn main() {
//!     // @@ greeting
//!     println!("hello");
//!     // @@ greeting
//! }
//! ```
//!
//! a markdown file with `@@snip [greeting](src/main.rs)` on its own line is
//! written to the destination with `println!("hello");` in its place.
//!
//! ```rust,no_run
//! use docsnip_core::BuildOptions;
//! use docsnip_core::build_docs;
//!
//! let report = build_docs(BuildOptions::default()).unwrap();
//! if !report.is_ok() {
//!     eprintln!("{} error(s) found", report.errors.len());
//! }
//! ```

pub use config::*;
pub use engine::*;
pub use error::*;
pub use parser::*;
pub use project::*;
pub use snippet_cache::*;
pub use source_scanner::*;

pub mod config;
mod engine;
#[allow(unused_assignments)]
mod error;
mod parser;
pub mod project;
mod snippet_cache;
mod source_scanner;

#[cfg(test)]
mod __fixtures;

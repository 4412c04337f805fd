use std::path::Path;
use std::path::PathBuf;
use std::process;
use std::sync::mpsc;
use std::time::Duration;

use clap::Parser;
use docsnip_cli::Commands;
use docsnip_cli::DocsnipCli;
use docsnip_cli::OutputFormat;
use docsnip_cli::resolve_watch_target;
use docsnip_core::AnyResult;
use docsnip_core::BuildError;
use docsnip_core::BuildOptions;
use docsnip_core::BuildReport;
use docsnip_core::SnipConfig;
use docsnip_core::Snippet;
use docsnip_core::build_docs;
use docsnip_core::check_docs;
use miette::Diagnostic;
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

static USE_COLOR: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

/// Environment variable holding a `tracing` filter directive.
const LOG_ENV: &str = "DOCSNIP_LOG";

fn color_enabled() -> bool {
	USE_COLOR.load(std::sync::atomic::Ordering::Relaxed)
}

/// Apply ANSI color codes only when color is enabled.
macro_rules! colored {
	($text:expr,red) => {
		if color_enabled() {
			format!("{}", $text.red())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,green) => {
		if color_enabled() {
			format!("{}", $text.green())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,yellow) => {
		if color_enabled() {
			format!("{}", $text.yellow())
		} else {
			format!("{}", $text)
		}
	};
}

fn main() {
	let args = DocsnipCli::parse();

	// Respect NO_COLOR env var and --no-color flag.
	let use_color = !args.no_color && std::env::var_os("NO_COLOR").is_none();
	if !use_color {
		USE_COLOR.store(false, std::sync::atomic::Ordering::Relaxed);
	}

	init_tracing(args.verbose, use_color);

	// Install miette's fancy handler for rich error diagnostics.
	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.build(),
		)
	}))
	.ok();

	let result = match args.command {
		Some(Commands::Build { watch }) => run_build(&args, watch),
		Some(Commands::Check { format }) => run_check(&args, format),
		None => {
			eprintln!("No subcommand specified. Run `docsnip --help` for usage.");
			process::exit(1);
		}
	};

	if let Err(e) = result {
		// Try to render through miette for rich diagnostics with help text
		// and error codes.
		match e.downcast::<docsnip_core::SnipError>() {
			Ok(snip_err) => {
				let report: miette::Report = (*snip_err).into();
				eprintln!("{report:?}");
			}
			Err(e) => {
				eprintln!("{} {e}", colored!("error:", red));
			}
		}
		process::exit(2);
	}
}

/// Log to stderr. `--verbose` forces debug output, otherwise `DOCSNIP_LOG`
/// is honored with `info` as the fallback.
fn init_tracing(verbose: bool, use_color: bool) {
	let filter = if verbose {
		EnvFilter::new("debug")
	} else {
		EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"))
	};

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_ansi(use_color)
		.with_target(false)
		.without_time()
		.init();
}

fn resolve_root(args: &DocsnipCli) -> PathBuf {
	args.path
		.clone()
		.unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

/// Load `docsnip.toml` from the project root and apply command line
/// overrides on top.
fn resolve_options(args: &DocsnipCli, root: &Path) -> AnyResult<BuildOptions> {
	let config = SnipConfig::load(root)?;
	let mut options = BuildOptions::from_config(root, config.as_ref());

	if let Some(source) = &args.source {
		options.source_directory = root.join(source);
	}
	if let Some(target) = &args.target {
		options.target_directory = root.join(target);
	}
	if let Some(content_glob) = &args.content_glob {
		options.content_glob.clone_from(content_glob);
	}
	if let Some(snippet_root) = &args.snippet_root {
		options.snippet_root = root.join(snippet_root);
	}

	tracing::debug!(?options, "resolved build options");
	Ok(options)
}

fn run_build(args: &DocsnipCli, watch: bool) -> AnyResult<()> {
	let root = resolve_root(args);
	let options = resolve_options(args, &root)?;

	// Run the initial build.
	let is_ok = run_build_once(&options)?;

	if !watch {
		if !is_ok {
			process::exit(1);
		}
		return Ok(());
	}

	// Watch mode
	println!("\nWatching for file changes... (press Ctrl+C to stop)");

	let canonical_root = root.canonicalize()?;
	let target = resolve_watch_target(&root, &canonical_root, &options.target_directory);
	let root = canonical_root;
	let (tx, rx) = mpsc::channel();

	let mut watcher =
		notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
			if let Ok(event) = res {
				// Writes to the output directory must not trigger another build.
				let outside_target = event.paths.iter().any(|path| !path.starts_with(&target));
				if outside_target
					&& matches!(
						event.kind,
						notify::EventKind::Modify(_)
							| notify::EventKind::Create(_)
							| notify::EventKind::Remove(_)
					) {
					let _ = tx.send(());
				}
			}
		})?;

	use notify::Watcher;
	watcher.watch(&root, notify::RecursiveMode::Recursive)?;

	loop {
		rx.recv()?;
		// Debounce: drain additional events within 200ms.
		while rx.recv_timeout(Duration::from_millis(200)).is_ok() {}

		println!("\nFile change detected, rebuilding...");
		if let Err(e) = run_build_once(&options) {
			eprintln!("{} {e}", colored!("error:", red));
		}
	}
}

/// Run a single build and return whether it succeeded.
fn run_build_once(options: &BuildOptions) -> AnyResult<bool> {
	let report = build_docs(options.clone())?;

	if report.is_ok() {
		println!(
			"{} {} with snippets, {} without",
			colored!("Build succeeded:", green),
			report.copied_with_snippets,
			report.copied_without_snippets
		);
		if !report.unused_snippets.is_empty() {
			println!(
				"{} {} unused snippet(s) in parsed source files",
				colored!("warning:", yellow),
				report.unused_snippets.len()
			);
		}
		return Ok(true);
	}

	// Each error has already been logged with its location.
	eprintln!(
		"{} {} error(s) found, {} left untouched",
		colored!("Build failed:", red),
		report.errors.len(),
		options.target_directory.display()
	);

	Ok(false)
}

fn run_check(args: &DocsnipCli, format: OutputFormat) -> AnyResult<()> {
	let root = resolve_root(args);
	let options = resolve_options(args, &root)?;
	let report = check_docs(options)?;

	print_check_report(&report, &root, format);

	if !report.is_ok() {
		process::exit(1);
	}

	Ok(())
}

#[derive(Serialize)]
struct CheckOutput {
	ok: bool,
	errors: Vec<ErrorEntry>,
	unused: Vec<UnusedEntry>,
}

#[derive(Serialize)]
struct ErrorEntry {
	file: String,
	line: usize,
	code: Option<String>,
	location: String,
	message: String,
}

#[derive(Serialize)]
struct UnusedEntry {
	file: String,
	line: usize,
	tag: String,
}

impl ErrorEntry {
	fn new(error: &BuildError, root: &Path) -> Self {
		Self {
			file: make_relative(error.file(), root),
			line: error.line(),
			code: error.code().map(|code| code.to_string()),
			location: error.location(),
			message: error.message(),
		}
	}
}

impl UnusedEntry {
	fn new(snippet: &Snippet, root: &Path) -> Self {
		Self {
			file: make_relative(snippet.directive().path(), root),
			line: snippet.line_number(),
			tag: snippet.tag().to_string(),
		}
	}
}

fn print_check_report(report: &BuildReport, root: &Path, format: OutputFormat) {
	match format {
		OutputFormat::Json => {
			let output = CheckOutput {
				ok: report.is_ok(),
				errors: report
					.errors
					.iter()
					.map(|error| ErrorEntry::new(error, root))
					.collect(),
				unused: report
					.unused_snippets
					.iter()
					.map(|snippet| UnusedEntry::new(snippet, root))
					.collect(),
			};
			println!("{}", serde_json::to_string(&output).unwrap_or_default());
		}
		OutputFormat::Github => {
			for error in &report.errors {
				let rel = make_relative(error.file(), root);
				println!("::error file={rel},line={}::{}", error.line(), error);
			}
			for snippet in &report.unused_snippets {
				let rel = make_relative(snippet.directive().path(), root);
				println!(
					"::warning file={rel},line={}::Snippet `{}` is never referenced",
					snippet.line_number(),
					snippet.tag()
				);
			}
			if report.is_ok() {
				println!("All snippet directives resolve.");
			} else {
				eprintln!("{} snippet error(s) found", report.errors.len());
			}
		}
		OutputFormat::Text => {
			if report.is_ok() {
				println!(
					"{} all snippet directives resolve.",
					colored!("Check passed:", green)
				);
				return;
			}

			eprintln!("{}", colored!("Check failed.", red));
			eprintln!("  errors: {}", report.errors.len());
			eprintln!();
			for error in &report.errors {
				let rel = make_relative(error.file(), root);
				eprintln!("  {rel}:{}: {error}", error.line());
			}
		}
	}
}

/// Make a path relative to root for display purposes.
fn make_relative(path: &Path, root: &Path) -> String {
	path.strip_prefix(root)
		.unwrap_or(path)
		.display()
		.to_string()
}

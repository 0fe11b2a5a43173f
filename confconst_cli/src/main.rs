use std::path::Path;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use confconst_cli::Commands;
use confconst_cli::ConfConstCli;
use confconst_cli::LOG_ENV;
use confconst_cli::LanguageArg;
use confconst_cli::OutputFormat;
use confconst_core::ConfConstConfig;
use confconst_core::GenerateOptions;
use confconst_core::UpdateOptions;
use confconst_core::UpdateReport;
use confconst_core::WriteOutcome;
use confconst_core::generate_constants;
use confconst_core::update_constants;
use owo_colors::OwoColorize;
use similar::ChangeTag;
use similar::TextDiff;
use tracing_subscriber::EnvFilter;

static USE_COLOR: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

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
	($text:expr,bold) => {
		if color_enabled() {
			format!("{}", $text.bold())
		} else {
			format!("{}", $text)
		}
	};
}

fn main() {
	let args = ConfConstCli::parse();

	// Respect NO_COLOR env var and --no-color flag.
	let use_color = !args.no_color
		&& std::env::var_os("NO_COLOR").is_none()
		&& supports_color::on(supports_color::Stream::Stdout).is_some();
	if !use_color {
		USE_COLOR.store(false, std::sync::atomic::Ordering::Relaxed);
	}

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

	init_tracing(args.verbose, use_color);

	let result = match &args.command {
		Commands::Generate {
			target,
			out,
			package,
			language,
			backup,
		} => {
			run_generate(
				&args,
				GenerateArgs {
					target: target.clone(),
					out: out.clone(),
					package: package.clone(),
					language: *language,
					backup: *backup,
				},
			)
			.map(|()| true)
		}
		Commands::Update {
			old,
			new,
			dirs,
			dry_run,
			backup,
			language,
			exclude,
			format,
			diff,
			check,
		} => {
			let mut options = UpdateOptions::new(old, new);
			options.directories.clone_from(dirs);
			options.dry_run = *dry_run || *check;
			options.backup = *backup;
			options.exclude_patterns.clone_from(exclude);
			run_update(&args, options, *language, *format, *diff)
				.map(|pending| !(*check && pending))
		}
	};

	match result {
		Ok(true) => {}
		Ok(false) => process::exit(1),
		Err(e) => {
			// Try to render through miette for rich diagnostics with help text
			// and error codes.
			match e.downcast::<confconst_core::ConfConstError>() {
				Ok(error) => {
					let report: miette::Report = (*error).into();
					eprintln!("{report:?}");
				}
				Err(e) => {
					eprintln!("{} {e}", colored!("error:", red));
				}
			}
			process::exit(2);
		}
	}
}

/// Send `tracing` events to stderr, filtered by `CONFCONST_LOG` when set.
fn init_tracing(verbose: bool, use_color: bool) {
	let fallback = if verbose { "debug" } else { "warn" };
	let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(fallback));

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_ansi(use_color)
		.with_target(false)
		.without_time()
		.try_init()
		.ok();
}

fn resolve_root(args: &ConfConstCli) -> PathBuf {
	args.path
		.clone()
		.unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

/// Load the explicit `--config` file, or discover one in the project root.
/// Returns the config with the directory its relative paths resolve against.
fn load_config(
	args: &ConfConstCli,
) -> Result<(Option<ConfConstConfig>, PathBuf), Box<dyn std::error::Error>> {
	let root = resolve_root(args);

	if let Some(path) = &args.config {
		let config = ConfConstConfig::load_from(path)?;
		let base = path
			.parent()
			.filter(|parent| !parent.as_os_str().is_empty())
			.map_or(root, Path::to_path_buf);
		return Ok((Some(config), base));
	}

	let config = ConfConstConfig::load(&root)?;
	Ok((config, root))
}

struct GenerateArgs {
	target: Option<PathBuf>,
	out: Option<PathBuf>,
	package: Option<String>,
	language: Option<LanguageArg>,
	backup: bool,
}

fn run_generate(args: &ConfConstCli, flags: GenerateArgs) -> Result<(), Box<dyn std::error::Error>> {
	let (config, base) = load_config(args)?;
	let generate = config.as_ref().map(|config| &config.generate);
	let root = resolve_root(args);

	if flags.target.is_none() && generate.and_then(|section| section.target.as_ref()).is_none() {
		return Err("no target given; pass `--target` or set `[generate] target` in confconst.toml".into());
	}
	if flags.out.is_none() && generate.and_then(|section| section.out.as_ref()).is_none() {
		return Err("no output given; pass `--out` or set `[generate] out` in confconst.toml".into());
	}

	let mut options = GenerateOptions::from_config(config.as_ref(), &base);
	// Relative flag paths resolve against the project root, like config paths.
	if let Some(target) = flags.target {
		options.target = root.join(target);
	}
	if let Some(out) = flags.out {
		options.out = root.join(out);
	}
	if let Some(package) = flags.package {
		options.package = package;
	}
	if let Some(language) = flags.language {
		options.language = language.into();
	}
	options.backup |= flags.backup;

	let report = generate_constants(&options)?;

	if report.files.is_empty() {
		println!(
			"No YAML documents found in {}.",
			make_relative(&options.target, &root)
		);
		return Ok(());
	}

	for file in &report.files {
		let rel = make_relative(&file.path, &root);
		match &file.outcome {
			WriteOutcome::Created => {
				println!(
					"  {} {rel} ({} constant(s))",
					colored!("created", green),
					file.constants
				);
			}
			WriteOutcome::Updated { backup } => {
				println!(
					"  {} {rel} ({} constant(s))",
					colored!("updated", green),
					file.constants
				);
				if let Some(backup) = backup {
					println!("    backup: {}", make_relative(backup, &root));
				}
			}
			WriteOutcome::Unchanged => {
				if args.verbose {
					println!("  unchanged {rel}");
				}
			}
		}
	}

	let written = report.written().count();
	if written == 0 {
		println!("All generated files are already up to date.");
	} else {
		println!(
			"Generated {} constant(s) in {written} file(s).",
			report.constant_count()
		);
	}

	Ok(())
}

/// Run an update. Returns whether any reference is (or was) outdated.
fn run_update(
	args: &ConfConstCli,
	options: UpdateOptions,
	language: Option<LanguageArg>,
	format: OutputFormat,
	show_diff: bool,
) -> Result<bool, Box<dyn std::error::Error>> {
	let (config, base) = load_config(args)?;
	let root = resolve_root(args);
	let mut options = UpdateOptions {
		old_file: root.join(&options.old_file),
		new_file: root.join(&options.new_file),
		directories: options.directories.iter().map(|dir| root.join(dir)).collect(),
		..options
	}
	.with_config(config.as_ref(), &base);
	if options.directories.is_empty() {
		options.directories = vec![root.clone()];
	}
	if let Some(language) = language {
		options.language = language.into();
	}

	let report = update_constants(&options)?;
	let pending = report.has_changes();

	match format {
		OutputFormat::Json => {
			println!("{}", serde_json::to_string_pretty(&report)?);
		}
		OutputFormat::Text => print_update_report(&report, &root, args.verbose, show_diff),
	}

	Ok(pending)
}

fn print_update_report(report: &UpdateReport, root: &Path, verbose: bool, show_diff: bool) {
	for constant in &report.unmatched {
		eprintln!(
			"{} `{}` ({:?}) has no counterpart in the new constants file",
			colored!("warning:", yellow),
			constant.name,
			constant.value
		);
	}

	for skipped in &report.skipped {
		eprintln!(
			"{} skipped {}: {}",
			colored!("warning:", yellow),
			make_relative(&skipped.path, root),
			skipped.issue
		);
	}

	if report.mapping.is_empty() {
		println!("No constants were renamed; nothing to update.");
		return;
	}

	if verbose {
		println!("{}", colored!("Renames:", bold));
		for (old, new) in report.mapping.iter() {
			println!("  {old} -> {new}");
		}
	}

	if !report.has_changes() {
		println!("All references are already up to date.");
		return;
	}

	if report.dry_run {
		println!(
			"Dry run: would make {} substitution(s) in {} file(s):",
			report.substitution_count(),
			report.files.len()
		);
	}

	for file in &report.files {
		let rel = make_relative(&file.path, root);
		if report.dry_run || verbose {
			for substitution in &file.substitutions {
				println!(
					"  {rel}:{}:{} {} -> {}",
					substitution.line,
					substitution.column,
					colored!(substitution.old, red),
					colored!(substitution.new, green)
				);
			}
		}

		if show_diff {
			print_diff(&file.original, &file.updated);
		}
	}

	if !report.dry_run {
		println!(
			"Updated {} reference(s) in {} file(s).",
			report.substitution_count(),
			report.files.len()
		);

		if verbose {
			for backup in &report.backups {
				println!("  backup: {}", make_relative(backup, root));
			}
		}
	}
}

/// Print a unified diff between two strings, colorized.
fn print_diff(current: &str, expected: &str) {
	let diff = TextDiff::from_lines(current, expected);
	for change in diff.iter_all_changes() {
		match change.tag() {
			ChangeTag::Delete => {
				eprint!("  {}", colored!(format!("-{change}"), red));
			}
			ChangeTag::Insert => {
				eprint!("  {}", colored!(format!("+{change}"), green));
			}
			ChangeTag::Equal => {
				eprint!("   {change}");
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

use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use confconst_core::Language;

/// Environment variable holding a `tracing` filter directive for log output.
pub const LOG_ENV: &str = "CONFCONST_LOG";

#[derive(Parser)]
#[command(
	author,
	version,
	about = "Generate typed constants from YAML config and keep code referencing them in sync.",
	long_about = "confconst turns hierarchical YAML configuration into named constants in \
	              generated source code.\n\nWhen a regenerated constants file renames constants, \
	              `confconst update` rewrites every reference to the old names across your \
	              sources.\n\nQuick start:\n  confconst generate -t config -o internal/config/constants.go\n  \
	              confconst update -o old.go -n internal/config/constants.go --dry-run"
)]
pub struct ConfConstCli {
	#[command(subcommand)]
	pub command: Commands,

	/// Path to the project root directory. Config discovery and relative
	/// config paths start here.
	#[arg(long, global = true)]
	pub path: Option<PathBuf>,

	/// Path to a config file, instead of discovering `confconst.toml`.
	#[arg(long, global = true)]
	pub config: Option<PathBuf>,

	/// Enable verbose output.
	#[arg(long, short, global = true, default_value_t = false)]
	pub verbose: bool,

	/// Disable colored output.
	#[arg(long, global = true, default_value_t = false)]
	pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
	/// Generate constant source files from YAML config documents.
	///
	/// The target is a YAML file or a directory searched recursively for
	/// `*.yaml` and `*.yml` files. Every scalar leaf becomes one constant named
	/// from its key path. Annotate a key with a `# prefix: Name` comment to
	/// replace the name prefix for its whole subtree.
	///
	/// When the output path ends in the language's extension every document is
	/// aggregated into that file. Otherwise it is a directory receiving one
	/// file per document.
	Generate {
		/// YAML file or directory of YAML files.
		#[arg(long, short)]
		target: Option<PathBuf>,

		/// Output file or directory.
		#[arg(long, short)]
		out: Option<PathBuf>,

		/// Package (Go) or module (Rust) name written into generated files.
		#[arg(long, short)]
		package: Option<String>,

		/// Language of the generated source.
		#[arg(long, value_enum)]
		language: Option<LanguageArg>,

		/// Back up existing output files before overwriting them.
		#[arg(long, short, default_value_t = false)]
		backup: bool,
	},
	/// Rewrite references to renamed constants.
	///
	/// Parses the old and new constants files, matches constants by value
	/// and replaces every identifier reference to an old name with its new
	/// name in the scanned source files. String literals and comments are
	/// never touched. Files that cannot be tokenized safely are skipped and
	/// reported.
	///
	/// Use `--dry-run` to preview substitutions, `--diff` to see them in
	/// context, or `--check` in CI to fail while references are outdated.
	Update {
		/// Constants file with the names currently used in source.
		#[arg(long, short)]
		old: PathBuf,

		/// Constants file with the names source should use instead.
		#[arg(long, short)]
		new: PathBuf,

		/// Directories to scan, comma separated. Defaults to the config's
		/// `[update] dirs`, or the project root.
		#[arg(long, value_delimiter = ',')]
		dirs: Vec<PathBuf>,

		/// Report substitutions without modifying any file.
		#[arg(long, short, default_value_t = false)]
		dry_run: bool,

		/// Back up each file before rewriting it.
		#[arg(long, short, default_value_t = false)]
		backup: bool,

		/// Language of the scanned source files.
		#[arg(long, value_enum)]
		language: Option<LanguageArg>,

		/// Gitignore-style pattern to exclude from scanning. May be repeated.
		#[arg(long)]
		exclude: Vec<String>,

		/// Output format for the update report. Use `text` for
		/// human-readable output or `json` for programmatic consumption.
		#[arg(long, value_enum, default_value_t = OutputFormat::Text)]
		format: OutputFormat,

		/// Show a unified diff for each file that would change.
		#[arg(long, default_value_t = false)]
		diff: bool,

		/// Imply `--dry-run` and exit with status 1 when any reference is
		/// outdated.
		#[arg(long, default_value_t = false)]
		check: bool,
	},
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
	Text,
	Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LanguageArg {
	Go,
	Rust,
}

impl From<LanguageArg> for Language {
	fn from(value: LanguageArg) -> Self {
		match value {
			LanguageArg::Go => Self::Go,
			LanguageArg::Rust => Self::Rust,
		}
	}
}

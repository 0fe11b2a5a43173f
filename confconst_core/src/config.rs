use std::fmt;
use std::path::Path;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

use crate::ConfConstError;
use crate::ConfConstResult;

/// Supported config file locations in discovery order (highest precedence
/// first).
pub const CONFIG_FILE_CANDIDATES: [&str; 3] = [
	"confconst.toml",
	".confconst.toml",
	".config/confconst.toml",
];

/// Suffix appended to a file name to form its backup path.
pub const DEFAULT_BACKUP_SUFFIX: &str = ".bak";

/// Package name used when none is configured.
pub const DEFAULT_PACKAGE: &str = "config";

/// The language constants are generated in and source files are scanned for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
	/// `package <name>` followed by a `const ( ... )` block in a `.go` file.
	#[default]
	Go,
	/// `pub const Name: &str = "...";` items in a `.rs` file.
	Rust,
}

impl Language {
	/// File extension (without the dot) of source files in this language.
	pub fn extension(self) -> &'static str {
		match self {
			Self::Go => "go",
			Self::Rust => "rs",
		}
	}

	/// Whether the path carries this language's file extension.
	pub fn matches_path(self, path: &Path) -> bool {
		path.extension()
			.and_then(|ext| ext.to_str())
			.is_some_and(|ext| ext == self.extension())
	}
}

impl fmt::Display for Language {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Go => write!(f, "go"),
			Self::Rust => write!(f, "rust"),
		}
	}
}

impl FromStr for Language {
	type Err = String;

	fn from_str(value: &str) -> Result<Self, Self::Err> {
		match value.trim().to_ascii_lowercase().as_str() {
			"go" | "golang" => Ok(Self::Go),
			"rust" | "rs" => Ok(Self::Rust),
			other => Err(format!("unsupported language `{other}`")),
		}
	}
}

/// Configuration loaded from a `confconst.toml` file.
///
/// ```toml
/// language = "go"
/// backup_suffix = ".bak"
///
/// [generate]
/// target = "config"
/// out = "internal/config"
/// package = "config"
///
/// [update]
/// dirs = ["cmd", "internal"]
/// exclude = ["**/testdata/**"]
/// ```
///
/// Relative paths are resolved against the directory the config file was
/// discovered in.
#[derive(Debug, Default, Deserialize)]
pub struct ConfConstConfig {
	/// Target language for generation and update scanning.
	#[serde(default)]
	pub language: Option<Language>,
	/// Suffix appended to backup copies of overwritten files.
	#[serde(default)]
	pub backup_suffix: Option<String>,
	/// Defaults for `confconst generate`.
	#[serde(default)]
	pub generate: GenerateConfig,
	/// Defaults for `confconst update`.
	#[serde(default)]
	pub update: UpdateConfig,
}

/// The `[generate]` section.
#[derive(Debug, Default, Deserialize)]
pub struct GenerateConfig {
	/// YAML file or directory of YAML files.
	#[serde(default)]
	pub target: Option<PathBuf>,
	/// Output file or directory.
	#[serde(default)]
	pub out: Option<PathBuf>,
	/// Package (namespace) name written into generated files.
	#[serde(default)]
	pub package: Option<String>,
	/// Back up existing output files before overwriting them.
	#[serde(default)]
	pub backup: bool,
}

/// The `[update]` section.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateConfig {
	/// Directories scanned for source files referencing old constants.
	#[serde(default)]
	pub dirs: Vec<PathBuf>,
	/// Gitignore-style patterns excluded from scanning.
	#[serde(default)]
	pub exclude: Vec<String>,
	/// When true, `.gitignore` files are not consulted while scanning.
	#[serde(default)]
	pub disable_gitignore: bool,
	/// Back up rewritten files before writing them.
	#[serde(default)]
	pub backup: bool,
}

impl ConfConstConfig {
	/// Resolve the config path to load for a project root.
	pub fn resolve_path(root: &Path) -> Option<PathBuf> {
		CONFIG_FILE_CANDIDATES
			.iter()
			.map(|candidate| root.join(candidate))
			.find(|path| path.is_file())
	}

	/// Load config from the first candidate file found in `root`. Returns
	/// `Ok(None)` when no config file exists.
	pub fn load(root: &Path) -> ConfConstResult<Option<ConfConstConfig>> {
		let Some(config_path) = Self::resolve_path(root) else {
			return Ok(None);
		};

		Self::load_from(&config_path).map(Some)
	}

	/// Load config from an explicit file path.
	pub fn load_from(path: &Path) -> ConfConstResult<ConfConstConfig> {
		let content = std::fs::read_to_string(path)
			.map_err(|e| ConfConstError::ConfigParse(format!("{}: {e}", path.display())))?;
		toml::from_str(&content).map_err(|e| ConfConstError::ConfigParse(e.to_string()))
	}
}

/// Options for [`generate_constants`](crate::generate_constants).
#[derive(Debug, Clone)]
pub struct GenerateOptions {
	/// A YAML file, or a directory searched recursively for `*.yaml` and
	/// `*.yml` files.
	pub target: PathBuf,
	/// Output file (aggregates every document) or output directory (one file
	/// per document).
	pub out: PathBuf,
	/// Package or namespace name for generated files.
	pub package: String,
	/// Language of the generated source.
	pub language: Language,
	/// Back up existing output files before overwriting them.
	pub backup: bool,
	/// Suffix used to name backup files.
	pub backup_suffix: String,
}

impl Default for GenerateOptions {
	fn default() -> Self {
		Self {
			target: PathBuf::from("."),
			out: PathBuf::from("."),
			package: DEFAULT_PACKAGE.to_string(),
			language: Language::default(),
			backup: false,
			backup_suffix: DEFAULT_BACKUP_SUFFIX.to_string(),
		}
	}
}

impl GenerateOptions {
	/// Construct [`GenerateOptions`] from a loaded config. Relative paths are
	/// joined onto `root`.
	pub fn from_config(config: Option<&ConfConstConfig>, root: &Path) -> Self {
		let defaults = Self::default();
		let Some(config) = config else {
			return defaults;
		};

		Self {
			target: config
				.generate
				.target
				.as_ref()
				.map_or(defaults.target, |path| root.join(path)),
			out: config
				.generate
				.out
				.as_ref()
				.map_or(defaults.out, |path| root.join(path)),
			package: config
				.generate
				.package
				.clone()
				.unwrap_or(defaults.package),
			language: config.language.unwrap_or_default(),
			backup: config.generate.backup,
			backup_suffix: config
				.backup_suffix
				.clone()
				.unwrap_or(defaults.backup_suffix),
		}
	}
}

/// Options for [`update_constants`](crate::update_constants).
#[derive(Debug, Clone)]
#[allow(clippy::struct_excessive_bools)]
pub struct UpdateOptions {
	/// Constants file describing the names currently used in source.
	pub old_file: PathBuf,
	/// Constants file describing the names source should use instead.
	pub new_file: PathBuf,
	/// Report substitutions without modifying any file.
	pub dry_run: bool,
	/// Back up each file before rewriting it.
	pub backup: bool,
	/// Directories searched recursively for source files.
	pub directories: Vec<PathBuf>,
	/// Language of the scanned source files.
	pub language: Language,
	/// Suffix used to name backup files.
	pub backup_suffix: String,
	/// Gitignore-style patterns excluded from scanning.
	pub exclude_patterns: Vec<String>,
	/// Whether to ignore `.gitignore` files while scanning.
	pub disable_gitignore: bool,
}

impl UpdateOptions {
	/// Create options for the given constants files with every toggle off.
	pub fn new(old_file: impl Into<PathBuf>, new_file: impl Into<PathBuf>) -> Self {
		Self {
			old_file: old_file.into(),
			new_file: new_file.into(),
			dry_run: false,
			backup: false,
			directories: Vec::new(),
			language: Language::default(),
			backup_suffix: DEFAULT_BACKUP_SUFFIX.to_string(),
			exclude_patterns: Vec::new(),
			disable_gitignore: false,
		}
	}

	/// Fill scanning defaults from a loaded config. Relative directories are
	/// joined onto `root`.
	pub fn with_config(mut self, config: Option<&ConfConstConfig>, root: &Path) -> Self {
		let Some(config) = config else {
			return self;
		};

		if self.directories.is_empty() {
			self.directories = config.update.dirs.iter().map(|dir| root.join(dir)).collect();
		}
		self.exclude_patterns
			.extend(config.update.exclude.iter().cloned());
		self.disable_gitignore |= config.update.disable_gitignore;
		self.backup |= config.update.backup;
		if let Some(language) = config.language {
			self.language = language;
		}
		if let Some(suffix) = &config.backup_suffix {
			self.backup_suffix.clone_from(suffix);
		}

		self
	}
}

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum ConfConstError {
	#[error(transparent)]
	#[diagnostic(code(confconst::io_error))]
	Io(#[from] std::io::Error),

	#[error("failed to parse `{path}`: {reason}")]
	#[diagnostic(code(confconst::parse))]
	Parse { path: String, reason: String },

	#[error("failed to build config tree from `{path}`: {reason}")]
	#[diagnostic(
		code(confconst::build),
		help("the top level of a config document must be a mapping of keys")
	)]
	Build { path: String, reason: String },

	#[error("constant name `{name}` is generated by both `{first}` and `{second}`")]
	#[diagnostic(
		code(confconst::name_collision),
		help("rename one of the keys or annotate it with a different `# prefix: <Name>` comment")
	)]
	NameCollision {
		name: String,
		first: String,
		second: String,
	},

	#[error("key path `{path}` does not produce a usable constant name")]
	#[diagnostic(
		code(confconst::empty_name),
		help("keys must contain at least one letter, digit or underscore")
	)]
	EmptyName { path: String },

	#[error("invalid package name: `{0}`")]
	#[diagnostic(
		code(confconst::invalid_package),
		help("package names must start with a letter or underscore and contain only letters, digits and underscores")
	)]
	InvalidPackage(String),

	#[error("failed to scan directory `{path}`: {reason}")]
	#[diagnostic(code(confconst::scan))]
	Scan { path: String, reason: String },

	#[error("failed to write `{path}`: {reason}")]
	#[diagnostic(code(confconst::write))]
	Write { path: String, reason: String },

	#[error("failed to parse config file: {0}")]
	#[diagnostic(
		code(confconst::config_parse),
		help("check that confconst.toml is valid TOML with [generate] and/or [update] sections")
	)]
	ConfigParse(String),
}

impl ConfConstError {
	pub(crate) fn parse(path: impl AsRef<std::path::Path>, reason: impl ToString) -> Self {
		Self::Parse {
			path: path.as_ref().display().to_string(),
			reason: reason.to_string(),
		}
	}

	pub(crate) fn build(path: impl AsRef<std::path::Path>, reason: impl ToString) -> Self {
		Self::Build {
			path: path.as_ref().display().to_string(),
			reason: reason.to_string(),
		}
	}

	pub(crate) fn scan(path: impl AsRef<std::path::Path>, reason: impl ToString) -> Self {
		Self::Scan {
			path: path.as_ref().display().to_string(),
			reason: reason.to_string(),
		}
	}

	pub(crate) fn write(path: impl AsRef<std::path::Path>, reason: impl ToString) -> Self {
		Self::Write {
			path: path.as_ref().display().to_string(),
			reason: reason.to_string(),
		}
	}
}

pub type ConfConstResult<T> = Result<T, ConfConstError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;

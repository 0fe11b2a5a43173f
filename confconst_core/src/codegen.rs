use std::fmt::Write as _;
use std::path::Path;
use std::path::PathBuf;

use serde::Serialize;

use crate::ConfConstError;
use crate::ConfConstResult;
use crate::Language;
use crate::NamedConstant;
use crate::backup::create_backup;

/// First line of every generated file. Go tooling recognizes this exact form
/// as marking generated code.
pub const GENERATED_HEADER: &str = "// Code generated by confconst. DO NOT EDIT.";

/// Render constant declarations under one generation header.
///
/// Output depends only on the arguments, so the same constants and package
/// always produce byte-identical text.
pub fn render_constants(
	constants: &[NamedConstant],
	package: &str,
	language: Language,
) -> ConfConstResult<String> {
	if !is_identifier(package) {
		return Err(ConfConstError::InvalidPackage(package.to_string()));
	}

	let output = match language {
		Language::Go => render_go(constants, package),
		Language::Rust => render_rust(constants, package),
	};

	Ok(output)
}

fn render_go(constants: &[NamedConstant], package: &str) -> String {
	let mut output = format!("{GENERATED_HEADER}\n\npackage {package}\n");
	if constants.is_empty() {
		return output;
	}

	// Match gofmt, which aligns the `=` of consecutive const specs.
	let width = constants
		.iter()
		.map(|constant| constant.name.chars().count())
		.max()
		.unwrap_or_default();

	output.push_str("\nconst (\n");
	for constant in constants {
		let _ = writeln!(
			output,
			"\t{:<width$} = {}",
			constant.name,
			quote_go(&constant.value)
		);
	}
	output.push_str(")\n");

	output
}

fn render_rust(constants: &[NamedConstant], package: &str) -> String {
	let mut output = format!(
		"{GENERATED_HEADER}\n\n//! Constants for the `{package}` module.\n\n\
		 #![allow(non_upper_case_globals)]\n"
	);
	if constants.is_empty() {
		return output;
	}

	output.push('\n');
	for constant in constants {
		let _ = writeln!(
			output,
			"pub const {}: &str = {};",
			constant.name,
			quote_rust(&constant.value)
		);
	}

	output
}

/// Quote a value as a Go interpreted string literal.
pub fn quote_go(value: &str) -> String {
	quote_with(value, |ch, out| {
		let _ = write!(out, "\\u{:04x}", u32::from(ch));
	})
}

/// Quote a value as a Rust string literal.
pub fn quote_rust(value: &str) -> String {
	quote_with(value, |ch, out| {
		let _ = write!(out, "\\u{{{:x}}}", u32::from(ch));
	})
}

fn quote_with(value: &str, escape_control: impl Fn(char, &mut String)) -> String {
	let mut out = String::with_capacity(value.len() + 2);
	out.push('"');
	for ch in value.chars() {
		match ch {
			'\\' => out.push_str("\\\\"),
			'"' => out.push_str("\\\""),
			'\n' => out.push_str("\\n"),
			'\r' => out.push_str("\\r"),
			'\t' => out.push_str("\\t"),
			ch if ch.is_control() => escape_control(ch, &mut out),
			ch => out.push(ch),
		}
	}
	out.push('"');
	out
}

/// Whether `text` is usable as a package or module name.
pub fn is_identifier(text: &str) -> bool {
	let mut chars = text.chars();
	chars
		.next()
		.is_some_and(|first| first.is_alphabetic() || first == '_')
		&& chars.all(|ch| ch.is_alphanumeric() || ch == '_')
}

/// What happened when a generated file was written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WriteOutcome {
	/// The file did not exist before.
	Created,
	/// The file existed with different content and was replaced.
	Updated { backup: Option<PathBuf> },
	/// The file already held exactly this content and was left alone.
	Unchanged,
}

/// Write generated content to `path`, creating parent directories. Existing
/// files with identical content are not touched. When `backup_suffix` is set
/// an existing file is copied aside before it is replaced.
pub fn write_generated(
	path: &Path,
	content: &str,
	backup_suffix: Option<&str>,
) -> ConfConstResult<WriteOutcome> {
	let exists = path.is_file();
	if exists {
		let current = std::fs::read(path).map_err(|e| ConfConstError::write(path, e))?;
		if current == content.as_bytes() {
			tracing::debug!(file = %path.display(), "generated output unchanged");
			return Ok(WriteOutcome::Unchanged);
		}
	}

	if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
		std::fs::create_dir_all(parent).map_err(|e| ConfConstError::write(parent, e))?;
	}

	let backup = match backup_suffix {
		Some(suffix) if exists => Some(create_backup(path, suffix)?),
		_ => None,
	};

	std::fs::write(path, content).map_err(|e| ConfConstError::write(path, e))?;
	tracing::info!(file = %path.display(), "wrote generated constants");

	Ok(if exists {
		WriteOutcome::Updated { backup }
	} else {
		WriteOutcome::Created
	})
}

use std::collections::HashMap;
use std::path::PathBuf;

use derive_more::Deref;
use indexmap::IndexMap;
use serde::Serialize;

use crate::ConfConstError;
use crate::ConfConstResult;
use crate::ConstantMap;
use crate::Language;
use crate::ScanIssue;
use crate::SourceScanOptions;
use crate::Substitution;
use crate::UpdateOptions;
use crate::apply_substitutions;
use crate::backup::create_backup;
use crate::collect_source_files;
use crate::parse_constants;
use crate::scan_identifiers;

/// Old constant name → new constant name, in old-file declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deref, Serialize)]
#[serde(transparent)]
pub struct RenameMapping(IndexMap<String, String>);

impl RenameMapping {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn insert(&mut self, old: impl Into<String>, new: impl Into<String>) {
		self.0.insert(old.into(), new.into());
	}
}

impl<O: Into<String>, N: Into<String>> FromIterator<(O, N)> for RenameMapping {
	fn from_iter<I: IntoIterator<Item = (O, N)>>(iter: I) -> Self {
		let mut mapping = Self::new();
		for (old, new) in iter {
			mapping.insert(old, new);
		}
		mapping
	}
}

/// An old constant whose value no new constant shares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnmatchedConstant {
	pub name: String,
	pub value: String,
}

/// Join two constant maps on value.
///
/// When several new constants share a value the one declared first wins, and
/// every old constant with that value maps to it. A name present in both maps
/// with the same value produces no entry. The second element lists old
/// constants whose value has no counterpart.
pub fn build_rename_mapping(
	old: &ConstantMap,
	new: &ConstantMap,
) -> (RenameMapping, Vec<UnmatchedConstant>) {
	let mut by_value: HashMap<&str, &str> = HashMap::with_capacity(new.len());
	for (name, value) in new.iter() {
		by_value.entry(value.as_str()).or_insert(name.as_str());
	}

	let mut mapping = RenameMapping::new();
	let mut unmatched = Vec::new();

	for (name, value) in old.iter() {
		// A constant kept with the same value is not a rename, even when an
		// earlier new constant shares its value.
		if new.get(name) == Some(value) {
			continue;
		}

		match by_value.get(value.as_str()) {
			Some(&new_name) if new_name != name.as_str() => mapping.insert(name.as_str(), new_name),
			Some(_) => {}
			None => {
				unmatched.push(UnmatchedConstant {
					name: name.clone(),
					value: value.clone(),
				});
			}
		}
	}

	(mapping, unmatched)
}

/// The result of rewriting one file's identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
	pub content: String,
	pub substitutions: Vec<Substitution>,
}

impl Rewrite {
	pub fn is_changed(&self) -> bool {
		!self.substitutions.is_empty()
	}
}

/// Rewrite every identifier occurrence covered by `mapping`. Literals and
/// comments are left alone.
pub fn rewrite_identifiers(
	content: &str,
	language: Language,
	mapping: &RenameMapping,
) -> Result<Rewrite, ScanIssue> {
	let substitutions = scan_identifiers(content, language, mapping)?;
	let content = if substitutions.is_empty() {
		content.to_string()
	} else {
		apply_substitutions(content, &substitutions)
	};

	Ok(Rewrite {
		content,
		substitutions,
	})
}

/// A source file with at least one pending substitution.
#[derive(Debug, Clone, Serialize)]
pub struct FileUpdate {
	pub path: PathBuf,
	pub substitutions: Vec<Substitution>,
	#[serde(skip)]
	pub original: String,
	#[serde(skip)]
	pub updated: String,
}

/// A source file left untouched because it could not be tokenized safely.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedFile {
	pub path: PathBuf,
	pub issue: ScanIssue,
}

/// Everything an update run found and, unless dry-run, changed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateReport {
	pub dry_run: bool,
	pub mapping: RenameMapping,
	pub unmatched: Vec<UnmatchedConstant>,
	/// Number of source files tokenized.
	pub scanned_files: usize,
	pub files: Vec<FileUpdate>,
	pub skipped: Vec<SkippedFile>,
	/// Backup copies written before rewriting.
	pub backups: Vec<PathBuf>,
}

impl UpdateReport {
	/// Total substitutions across every file.
	pub fn substitution_count(&self) -> usize {
		self.files.iter().map(|file| file.substitutions.len()).sum()
	}

	/// Whether any file would change.
	pub fn has_changes(&self) -> bool {
		!self.files.is_empty()
	}
}

/// Parse both constants files, build the rename mapping and compute the
/// rewrite of every source file without writing anything.
pub fn compute_updates(options: &UpdateOptions) -> ConfConstResult<UpdateReport> {
	let old = parse_constants(&options.old_file)?;
	let new = parse_constants(&options.new_file)?;
	let (mapping, unmatched) = build_rename_mapping(&old, &new);

	for constant in &unmatched {
		tracing::warn!(
			name = %constant.name,
			value = %constant.value,
			"no new constant shares this value; references are left unchanged"
		);
	}

	let mut report = UpdateReport {
		dry_run: options.dry_run,
		mapping,
		unmatched,
		..UpdateReport::default()
	};

	if report.mapping.is_empty() {
		tracing::info!("rename mapping is empty, nothing to update");
		return Ok(report);
	}

	let scan_options = SourceScanOptions {
		language: options.language,
		exclude_patterns: options.exclude_patterns.clone(),
		disable_gitignore: options.disable_gitignore,
		skip_files: vec![options.old_file.clone(), options.new_file.clone()],
	};
	let files = collect_source_files(&options.directories, &scan_options)?;
	report.scanned_files = files.len();

	for path in files {
		let bytes = std::fs::read(&path).map_err(|e| ConfConstError::scan(&path, e))?;
		let issue = match String::from_utf8(bytes) {
			Ok(original) => {
				match rewrite_identifiers(&original, options.language, &report.mapping) {
					Ok(rewrite) if rewrite.is_changed() => {
						tracing::debug!(
							file = %path.display(),
							count = rewrite.substitutions.len(),
							"found references to renamed constants"
						);
						report.files.push(FileUpdate {
							path,
							substitutions: rewrite.substitutions,
							original,
							updated: rewrite.content,
						});
						continue;
					}
					Ok(_) => continue,
					Err(issue) => issue,
				}
			}
			Err(_) => ScanIssue::NotUtf8,
		};

		tracing::warn!(file = %path.display(), %issue, "skipping file");
		report.skipped.push(SkippedFile { path, issue });
	}

	tracing::info!(
		files = report.files.len(),
		substitutions = report.substitution_count(),
		skipped = report.skipped.len(),
		"computed constant updates"
	);

	Ok(report)
}

/// Write every computed rewrite to disk, backing each file up first when
/// `backup_suffix` is set. Returns the backup paths created. Files without
/// substitutions are never opened.
pub fn write_updates(
	report: &UpdateReport,
	backup_suffix: Option<&str>,
) -> ConfConstResult<Vec<PathBuf>> {
	let mut backups = Vec::new();

	for file in &report.files {
		if let Some(suffix) = backup_suffix {
			backups.push(create_backup(&file.path, suffix)?);
		}

		std::fs::write(&file.path, &file.updated)
			.map_err(|e| ConfConstError::write(&file.path, e))?;
		tracing::debug!(file = %file.path.display(), "rewrote constant references");
	}

	Ok(backups)
}

/// Compute the updates and, unless this is a dry run, write them.
pub fn update_constants(options: &UpdateOptions) -> ConfConstResult<UpdateReport> {
	let mut report = compute_updates(options)?;

	if !options.dry_run {
		let suffix = options.backup.then_some(options.backup_suffix.as_str());
		report.backups = write_updates(&report, suffix)?;
	}

	Ok(report)
}

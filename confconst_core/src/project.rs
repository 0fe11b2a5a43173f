use std::collections::BTreeSet;
use std::collections::HashSet;
use std::path::Path;
use std::path::PathBuf;

use ignore::gitignore::Gitignore;
use ignore::gitignore::GitignoreBuilder;

use crate::ConfConstError;
use crate::ConfConstResult;
use crate::Language;

/// Options controlling which files an update run scans.
#[derive(Debug, Clone, Default)]
pub struct SourceScanOptions {
	/// Only files with this language's extension are collected.
	pub language: Language,
	/// Gitignore-style patterns to exclude from scanning.
	pub exclude_patterns: Vec<String>,
	/// Whether to disable `.gitignore` integration.
	pub disable_gitignore: bool,
	/// Files never collected, such as the constants files being compared.
	pub skip_files: Vec<PathBuf>,
}

/// Collect source files under each directory, recursively. A path that is a
/// file is collected directly if it has the language's extension. The result
/// is sorted and free of duplicates.
pub fn collect_source_files(
	directories: &[PathBuf],
	options: &SourceScanOptions,
) -> ConfConstResult<Vec<PathBuf>> {
	let skip: HashSet<PathBuf> = options
		.skip_files
		.iter()
		.filter_map(|path| path.canonicalize().ok())
		.collect();
	let mut files = BTreeSet::new();

	for dir in directories {
		if dir.is_file() {
			if options.language.matches_path(dir) && !is_skipped(dir, &skip) {
				files.insert(dir.clone());
			}
			continue;
		}

		if !dir.is_dir() {
			return Err(ConfConstError::scan(dir, "no such directory"));
		}

		let gitignore = if options.disable_gitignore {
			Gitignore::empty()
		} else {
			build_gitignore(dir)
		};
		let custom_exclude = build_exclude_matcher(dir, &options.exclude_patterns)?;
		let mut visited_dirs = HashSet::new();
		let walker = Walker {
			language: options.language,
			gitignore: &gitignore,
			custom_exclude: &custom_exclude,
			skip: &skip,
		};
		walker.walk_dir(dir, &mut files, &mut visited_dirs)?;
	}

	tracing::debug!(count = files.len(), "collected source files");
	Ok(files.into_iter().collect())
}

/// Collect every YAML file (`*.yaml`, `*.yml`) at or below `target`.
pub fn collect_yaml_files(target: &Path) -> ConfConstResult<Vec<PathBuf>> {
	if target.is_file() {
		return Ok(vec![target.to_path_buf()]);
	}

	if !target.is_dir() {
		return Err(ConfConstError::scan(target, "no such file or directory"));
	}

	let mut files = Vec::new();
	let mut pending = vec![target.to_path_buf()];
	while let Some(dir) = pending.pop() {
		for entry in read_dir_sorted(&dir)? {
			if entry.is_dir() {
				if !is_ignored_directory(&entry) {
					pending.push(entry);
				}
			} else if is_yaml_file(&entry) {
				files.push(entry);
			}
		}
	}

	files.sort();
	Ok(files)
}

/// Whether the path has a YAML extension.
pub fn is_yaml_file(path: &Path) -> bool {
	path.extension()
		.and_then(|ext| ext.to_str())
		.is_some_and(|ext| matches!(ext, "yaml" | "yml"))
}

struct Walker<'a> {
	language: Language,
	gitignore: &'a Gitignore,
	custom_exclude: &'a Gitignore,
	skip: &'a HashSet<PathBuf>,
}

impl Walker<'_> {
	fn walk_dir(
		&self,
		dir: &Path,
		files: &mut BTreeSet<PathBuf>,
		visited_dirs: &mut HashSet<PathBuf>,
	) -> ConfConstResult<()> {
		// Detect symlink cycles by tracking canonical paths.
		let canonical = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
		if !visited_dirs.insert(canonical) {
			return Err(ConfConstError::scan(dir, "symlink cycle detected"));
		}

		for path in read_dir_sorted(dir)? {
			let is_dir = path.is_dir();

			if is_dir && is_ignored_directory(&path) {
				continue;
			}

			if self.gitignore.matched(&path, is_dir).is_ignore()
				|| self.custom_exclude.matched(&path, is_dir).is_ignore()
			{
				continue;
			}

			if is_dir {
				self.walk_dir(&path, files, visited_dirs)?;
			} else if self.language.matches_path(&path) && !is_skipped(&path, self.skip) {
				files.insert(path);
			}
		}

		Ok(())
	}
}

fn read_dir_sorted(dir: &Path) -> ConfConstResult<Vec<PathBuf>> {
	let entries = std::fs::read_dir(dir).map_err(|e| ConfConstError::scan(dir, e))?;
	let mut paths = Vec::new();
	for entry in entries {
		let entry = entry.map_err(|e| ConfConstError::scan(dir, e))?;
		paths.push(entry.path());
	}
	paths.sort();
	Ok(paths)
}

fn is_skipped(path: &Path, skip: &HashSet<PathBuf>) -> bool {
	!skip.is_empty()
		&& path
			.canonicalize()
			.is_ok_and(|canonical| skip.contains(&canonical))
}

/// Hidden directories and common dependency/build output directories.
fn is_ignored_directory(path: &Path) -> bool {
	path.file_name()
		.and_then(|name| name.to_str())
		.is_some_and(|name| {
			name.starts_with('.') || matches!(name, "vendor" | "node_modules" | "target")
		})
}

/// Build a `Gitignore` matcher from exclude patterns. These follow
/// `.gitignore` syntax and are applied on top of any `.gitignore` rules.
fn build_exclude_matcher(root: &Path, patterns: &[String]) -> ConfConstResult<Gitignore> {
	let mut builder = GitignoreBuilder::new(root);
	for pattern in patterns {
		builder.add_line(None, pattern).map_err(|e| {
			ConfConstError::ConfigParse(format!("invalid exclude pattern `{pattern}`: {e}"))
		})?;
	}
	builder
		.build()
		.map_err(|e| ConfConstError::ConfigParse(format!("failed to build exclude rules: {e}")))
}

/// Build a `Gitignore` matcher from the directory's `.gitignore` file (if any).
fn build_gitignore(root: &Path) -> Gitignore {
	let mut builder = GitignoreBuilder::new(root);
	let gitignore_path = root.join(".gitignore");
	if gitignore_path.exists() {
		let _ = builder.add(gitignore_path);
	}
	builder.build().unwrap_or_else(|_| Gitignore::empty())
}

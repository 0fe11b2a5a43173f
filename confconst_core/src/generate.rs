use std::collections::HashMap;
use std::path::Path;
use std::path::PathBuf;

use serde::Serialize;

use crate::ConfConstError;
use crate::ConfConstResult;
use crate::GenerateOptions;
use crate::Language;
use crate::NameRegistry;
use crate::NamedConstant;
use crate::WriteOutcome;
use crate::collect_yaml_files;
use crate::flatten_tree;
use crate::load_tree;
use crate::name_constants;
use crate::render_constants;
use crate::write_generated;

/// One generated output file.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedFile {
	pub path: PathBuf,
	/// YAML documents the constants were read from.
	pub sources: Vec<PathBuf>,
	pub constants: usize,
	pub outcome: WriteOutcome,
}

/// Summary of a generate run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GenerateReport {
	pub files: Vec<GeneratedFile>,
}

impl GenerateReport {
	/// Total constants across every output file.
	pub fn constant_count(&self) -> usize {
		self.files.iter().map(|file| file.constants).sum()
	}

	/// Files that were created or replaced.
	pub fn written(&self) -> impl Iterator<Item = &GeneratedFile> {
		self.files
			.iter()
			.filter(|file| file.outcome != WriteOutcome::Unchanged)
	}
}

/// Generate constant source files from YAML config documents.
///
/// When `out` carries the language's extension every document is aggregated
/// into that file and names must be unique across all of them. Otherwise
/// `out` is a directory and each `dir/name.yaml` below the target produces
/// `dir/name.<ext>` there. Go files sharing a directory share one package, so
/// their names must be unique across those documents too.
pub fn generate_constants(options: &GenerateOptions) -> ConfConstResult<GenerateReport> {
	let documents = collect_yaml_files(&options.target)?;
	let backup_suffix = options.backup.then_some(options.backup_suffix.as_str());
	let mut report = GenerateReport::default();

	if documents.is_empty() {
		tracing::warn!(target = %options.target.display(), "no YAML documents found");
		return Ok(report);
	}

	if options.language.matches_path(&options.out) {
		let mut registry = NameRegistry::new();
		let mut constants = Vec::new();
		for document in &documents {
			let label = document_label(document, &options.target);
			constants.extend(document_constants(document, &mut registry, Some(&label))?);
		}

		let content = render_constants(&constants, &options.package, options.language)?;
		let outcome = write_generated(&options.out, &content, backup_suffix)?;
		report.files.push(GeneratedFile {
			path: options.out.clone(),
			sources: documents,
			constants: constants.len(),
			outcome,
		});
	} else {
		let mut registries: HashMap<PathBuf, NameRegistry> = HashMap::new();
		let mut outputs: HashMap<PathBuf, PathBuf> = HashMap::new();
		let mut pending = Vec::with_capacity(documents.len());

		for document in documents {
			let path = output_path(
				&options.out,
				&document,
				&options.target,
				options.language.extension(),
			);
			if let Some(first) = outputs.insert(path.clone(), document.clone()) {
				return Err(ConfConstError::write(
					&path,
					format!(
						"both `{}` and `{}` generate this file",
						first.display(),
						document.display()
					),
				));
			}

			let label = document_label(&document, &options.target);
			let mut fresh = NameRegistry::new();
			let registry = match options.language {
				// Go files in one directory share a package namespace.
				Language::Go => {
					let directory = path.parent().map(Path::to_path_buf).unwrap_or_default();
					registries.entry(directory).or_default()
				}
				Language::Rust => &mut fresh,
			};
			let constants = document_constants(&document, registry, Some(&label))?;
			let content = render_constants(&constants, &options.package, options.language)?;
			pending.push((path, document, constants.len(), content));
		}

		// Nothing is written until every document has been named.
		for (path, document, constants, content) in pending {
			let outcome = write_generated(&path, &content, backup_suffix)?;
			report.files.push(GeneratedFile {
				path,
				sources: vec![document],
				constants,
				outcome,
			});
		}
	}

	tracing::info!(
		files = report.files.len(),
		constants = report.constant_count(),
		"generated constants"
	);

	Ok(report)
}

fn document_constants(
	document: &Path,
	registry: &mut NameRegistry,
	label: Option<&str>,
) -> ConfConstResult<Vec<NamedConstant>> {
	let tree = load_tree(document)?;
	name_constants(&flatten_tree(&tree), registry, label)
}

/// The document path relative to the target, used to tell sources apart in
/// collision reports.
fn document_label(document: &Path, target: &Path) -> String {
	document
		.strip_prefix(target)
		.ok()
		.filter(|relative| !relative.as_os_str().is_empty())
		.unwrap_or(document)
		.display()
		.to_string()
}

/// Mirror the document's location below the target under `out`, swapping the
/// YAML extension for the language's.
fn output_path(out: &Path, document: &Path, target: &Path, extension: &str) -> PathBuf {
	let relative = document
		.strip_prefix(target)
		.ok()
		.filter(|relative| !relative.as_os_str().is_empty())
		.map_or_else(
			|| PathBuf::from(document.file_name().unwrap_or(document.as_os_str())),
			Path::to_path_buf,
		);
	out.join(relative).with_extension(extension)
}

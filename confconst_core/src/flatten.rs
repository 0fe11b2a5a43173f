use std::collections::HashMap;

use heck::ToUpperCamelCase;

use crate::ConfConstError;
use crate::ConfConstResult;
use crate::TreeNode;

/// The prefix override in effect for a leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveOverride {
	/// Text that replaces the path prefix in the generated name.
	pub prefix: String,
	/// Index into the leaf path of the key that declared the override. Path
	/// segments up to and including this one are replaced by `prefix`.
	pub depth: usize,
}

impl EffectiveOverride {
	/// An override declared on the first path segment.
	pub fn new(prefix: impl Into<String>) -> Self {
		Self::at(prefix, 0)
	}

	pub fn at(prefix: impl Into<String>, depth: usize) -> Self {
		Self {
			prefix: prefix.into(),
			depth,
		}
	}
}

/// A leaf of the config tree with the information needed to name it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlattenResult {
	/// Keys from the document root (exclusive) down to the leaf.
	pub path: Vec<String>,
	/// Nearest override declared on the leaf or one of its ancestors.
	pub effective_override: Option<EffectiveOverride>,
	/// The leaf's scalar value.
	pub value: String,
}

impl FlattenResult {
	/// The key path joined with dots, e.g. `server.http.port`.
	pub fn dotted_path(&self) -> String {
		self.path.join(".")
	}
}

/// A leaf with its generated constant name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedConstant {
	pub name: String,
	/// Where the constant came from, used in collision reports.
	pub source: String,
	pub value: String,
}

/// Walk the tree depth first, keys in document order, producing one result
/// per scalar leaf. Empty mappings and sequences produce nothing. The root has
/// no key of its own, so an override set on it is ignored.
pub fn flatten_tree(root: &TreeNode) -> Vec<FlattenResult> {
	let mut results = Vec::new();
	let mut path = Vec::new();
	flatten_node(root, &mut path, None, &mut results);
	results
}

fn flatten_node(
	node: &TreeNode,
	path: &mut Vec<String>,
	inherited: Option<&EffectiveOverride>,
	results: &mut Vec<FlattenResult>,
) {
	for (key, child) in &node.children {
		path.push(key.clone());
		let own = child
			.prefix_override
			.as_ref()
			.map(|prefix| EffectiveOverride::at(prefix.clone(), path.len() - 1));
		let effective = own.as_ref().or(inherited);

		if let Some(value) = &child.value {
			results.push(FlattenResult {
				path: path.clone(),
				effective_override: effective.cloned(),
				value: value.clone(),
			});
		} else {
			flatten_node(child, path, effective, results);
		}

		path.pop();
	}
}

/// Generate the constant name for a leaf.
///
/// The prefix is the override when one is in effect, otherwise the first path
/// segment. Every segment after the one the prefix stands for is appended in
/// UpperCamelCase, so `["Parent", "Child"]` under the override `Override`
/// becomes `OverrideChild`, and `["A", "B"]` without one becomes `AB`.
pub fn generate_const_name(result: &FlattenResult) -> String {
	let (mut name, rest) = match &result.effective_override {
		Some(effective) => {
			(
				sanitize_identifier(&effective.prefix),
				result.path.get(effective.depth + 1..).unwrap_or_default(),
			)
		}
		None => {
			match result.path.split_first() {
				Some((first, rest)) => (normalize_segment(first), rest),
				None => (String::new(), &[][..]),
			}
		}
	};

	for segment in rest {
		name.push_str(&normalize_segment(segment));
	}

	if name.starts_with(|ch: char| ch.is_ascii_digit()) {
		name.insert(0, '_');
	}

	name
}

/// Convert a key into an identifier-safe UpperCamelCase token.
pub fn normalize_segment(segment: &str) -> String {
	sanitize_identifier(&segment.to_upper_camel_case())
}

fn sanitize_identifier(text: &str) -> String {
	text.chars()
		.filter(|ch| ch.is_alphanumeric() || *ch == '_')
		.collect()
}

/// Tracks generated names and the source that claimed each one.
#[derive(Debug, Default)]
pub struct NameRegistry {
	claimed: HashMap<String, String>,
}

impl NameRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Claim `name` for `source`, failing if another source already owns it.
	pub fn claim(&mut self, name: &str, source: &str) -> ConfConstResult<()> {
		if name.is_empty() {
			return Err(ConfConstError::EmptyName {
				path: source.to_string(),
			});
		}

		if let Some(first) = self.claimed.get(name) {
			return Err(ConfConstError::NameCollision {
				name: name.to_string(),
				first: first.clone(),
				second: source.to_string(),
			});
		}

		self.claimed.insert(name.to_string(), source.to_string());
		Ok(())
	}
}

/// Flatten a tree and name every leaf, failing on the first collision.
pub fn flatten_and_name(root: &TreeNode) -> ConfConstResult<Vec<NamedConstant>> {
	let mut registry = NameRegistry::new();
	name_constants(&flatten_tree(root), &mut registry, None)
}

/// Name flattened leaves, claiming each name in `registry`. When `document` is
/// set, sources are reported as `document:key.path` so collisions across
/// files stay traceable.
pub fn name_constants(
	results: &[FlattenResult],
	registry: &mut NameRegistry,
	document: Option<&str>,
) -> ConfConstResult<Vec<NamedConstant>> {
	let mut constants = Vec::with_capacity(results.len());

	for result in results {
		let name = generate_const_name(result);
		let source = match document {
			Some(document) => format!("{document}:{}", result.dotted_path()),
			None => result.dotted_path(),
		};
		registry.claim(&name, &source)?;
		constants.push(NamedConstant {
			name,
			source,
			value: result.value.clone(),
		});
	}

	Ok(constants)
}

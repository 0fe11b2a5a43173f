use std::path::Path;

use indexmap::IndexMap;
use serde_yaml_ng::Value;

use crate::Annotations;
use crate::ConfConstError;
use crate::ConfConstResult;

/// One key of the configuration hierarchy.
///
/// A node with a `value` is a leaf and has no children. A node built from a
/// mapping or sequence has children (possibly none, for an empty collection)
/// and no value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeNode {
	/// Child nodes in document order.
	pub children: IndexMap<String, TreeNode>,
	/// Scalar value of a leaf.
	pub value: Option<String>,
	/// Prefix override declared on this key with a `# prefix: X` comment.
	pub prefix_override: Option<String>,
}

impl TreeNode {
	pub fn leaf(value: impl Into<String>) -> Self {
		Self {
			value: Some(value.into()),
			..Self::default()
		}
	}

	pub fn internal<K: Into<String>>(children: impl IntoIterator<Item = (K, TreeNode)>) -> Self {
		Self {
			children: children
				.into_iter()
				.map(|(key, child)| (key.into(), child))
				.collect(),
			..Self::default()
		}
	}

	#[must_use]
	pub fn with_override(mut self, prefix: impl Into<String>) -> Self {
		self.prefix_override = Some(prefix.into());
		self
	}

	pub fn is_leaf(&self) -> bool {
		self.children.is_empty()
	}

	/// Number of scalar leaves in this subtree.
	pub fn leaf_count(&self) -> usize {
		if self.value.is_some() {
			return 1;
		}

		self.children.values().map(TreeNode::leaf_count).sum()
	}
}

/// Read and parse a YAML config file into a tree.
pub fn load_tree(path: &Path) -> ConfConstResult<TreeNode> {
	let content = std::fs::read_to_string(path).map_err(|e| ConfConstError::parse(path, e))?;
	parse_document(path, &content)
}

/// Parse YAML text into a tree, attaching prefix annotations found in its
/// comments. `source` is only used for error messages.
pub fn parse_document(source: &Path, content: &str) -> ConfConstResult<TreeNode> {
	let document: Value =
		serde_yaml_ng::from_str(content).map_err(|e| ConfConstError::parse(source, e))?;
	let annotations = Annotations::scan(content);
	let tree = build_tree(source, &document, &annotations)?;
	tracing::debug!(
		source = %source.display(),
		leaves = tree.leaf_count(),
		annotations = annotations.len(),
		"built config tree"
	);

	Ok(tree)
}

/// Build a tree from a parsed YAML document. The document root must be a
/// mapping.
pub fn build_tree(
	source: &Path,
	document: &Value,
	annotations: &Annotations,
) -> ConfConstResult<TreeNode> {
	let root = untag(document);
	if !matches!(root, Value::Mapping(_)) {
		return Err(ConfConstError::build(
			source,
			format!("expected a mapping at the document root, found {}", kind_of(root)),
		));
	}

	let mut path = Vec::new();
	build_node(source, root, &mut path, annotations)
}

fn build_node(
	source: &Path,
	value: &Value,
	path: &mut Vec<String>,
	annotations: &Annotations,
) -> ConfConstResult<TreeNode> {
	let mut node = TreeNode {
		prefix_override: annotations.prefix_for(path).map(str::to_string),
		..TreeNode::default()
	};

	match untag(value) {
		Value::Mapping(mapping) => {
			for (key, child) in mapping {
				let key = key_text(source, path, key)?;
				add_child(source, &mut node, key, child, path, annotations)?;
			}
		}
		Value::Sequence(items) => {
			for (index, item) in items.iter().enumerate() {
				add_child(source, &mut node, index.to_string(), item, path, annotations)?;
			}
		}
		scalar => node.value = Some(scalar_text(scalar)),
	}

	Ok(node)
}

fn add_child(
	source: &Path,
	node: &mut TreeNode,
	key: String,
	value: &Value,
	path: &mut Vec<String>,
	annotations: &Annotations,
) -> ConfConstResult<()> {
	if node.children.contains_key(&key) {
		return Err(ConfConstError::build(
			source,
			format!("duplicate key `{}`", dotted(path, &key)),
		));
	}

	path.push(key);
	let child = build_node(source, value, path, annotations);
	let key = path.pop().unwrap_or_default();
	node.children.insert(key, child?);

	Ok(())
}

fn key_text(source: &Path, path: &[String], key: &Value) -> ConfConstResult<String> {
	match untag(key) {
		Value::Mapping(_) | Value::Sequence(_) => {
			Err(ConfConstError::build(
				source,
				format!(
					"unsupported {} key under `{}`",
					kind_of(key),
					if path.is_empty() {
						"<root>".to_string()
					} else {
						path.join(".")
					}
				),
			))
		}
		Value::Null => Ok("null".to_string()),
		scalar => Ok(scalar_text(scalar)),
	}
}

fn scalar_text(value: &Value) -> String {
	match value {
		Value::String(text) => text.clone(),
		Value::Bool(flag) => flag.to_string(),
		Value::Number(number) => number.to_string(),
		Value::Tagged(tagged) => scalar_text(&tagged.value),
		Value::Null | Value::Mapping(_) | Value::Sequence(_) => String::new(),
	}
}

fn untag(value: &Value) -> &Value {
	match value {
		Value::Tagged(tagged) => untag(&tagged.value),
		other => other,
	}
}

fn kind_of(value: &Value) -> &'static str {
	match untag(value) {
		Value::Null => "null",
		Value::Bool(_) => "boolean",
		Value::Number(_) => "number",
		Value::String(_) => "string",
		Value::Sequence(_) => "sequence",
		Value::Mapping(_) => "mapping",
		Value::Tagged(_) => "tagged value",
	}
}

fn dotted(path: &[String], key: &str) -> String {
	if path.is_empty() {
		key.to_string()
	} else {
		format!("{}.{key}", path.join("."))
	}
}

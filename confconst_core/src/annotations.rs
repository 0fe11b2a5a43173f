use std::collections::HashMap;

use serde_yaml_ng::Value;
use snailquote::unescape;

/// The comment tag recognized as a prefix override, e.g. `# prefix: Http`.
pub const ANNOTATION_TAG: &str = "prefix:";

/// Prefix overrides attached to YAML keys, keyed by the key path from the
/// document root.
///
/// YAML parsers discard comments, so annotations are recovered by scanning the
/// raw document text. A `# prefix: X` comment applies to the key on the next
/// line (with no blank line in between) or to the key it trails on the same
/// line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Annotations {
	prefixes: HashMap<Vec<String>, String>,
}

impl Annotations {
	pub fn new() -> Self {
		Self::default()
	}

	/// Record an override for a key path.
	pub fn insert(&mut self, path: Vec<String>, prefix: impl Into<String>) {
		self.prefixes.insert(path, prefix.into());
	}

	/// The override declared on the key at `path`, if any.
	pub fn prefix_for(&self, path: &[String]) -> Option<&str> {
		self.prefixes.get(path).map(String::as_str)
	}

	pub fn len(&self) -> usize {
		self.prefixes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.prefixes.is_empty()
	}

	/// Scan raw YAML text for prefix annotations.
	pub fn scan(content: &str) -> Self {
		AnnotationScanner::default().run(content)
	}
}

/// One open level of the block structure: a mapping key or a sequence item.
struct Frame {
	indent: usize,
	segment: String,
	is_item: bool,
}

#[derive(Default)]
struct AnnotationScanner {
	stack: Vec<Frame>,
	/// Next index for each sequence, keyed by parent path and dash column.
	sequence_counters: HashMap<(Vec<String>, usize), usize>,
	/// Annotation waiting for the key on the following line.
	pending: Option<String>,
	/// Indentation of a key whose block scalar body is being skipped.
	block_scalar_indent: Option<usize>,
	annotations: Annotations,
}

impl AnnotationScanner {
	fn run(mut self, content: &str) -> Annotations {
		for raw_line in content.lines() {
			self.scan_line(raw_line.trim_end());
		}

		self.annotations
	}

	fn path(&self) -> Vec<String> {
		self.stack.iter().map(|frame| frame.segment.clone()).collect()
	}

	fn scan_line(&mut self, line: &str) {
		if let Some(parent_indent) = self.block_scalar_indent {
			if line.trim().is_empty() || indent_of(line) > parent_indent {
				return;
			}
			self.block_scalar_indent = None;
		}

		let trimmed = line.trim_start();
		if trimmed.is_empty() {
			self.pending = None;
			return;
		}

		if trimmed == "---" || trimmed.starts_with("--- ") || trimmed == "..." {
			self.stack.clear();
			self.pending = None;
			return;
		}

		if let Some(comment) = trimmed.strip_prefix('#') {
			if let Some(prefix) = parse_annotation(comment) {
				self.pending = Some(prefix);
			}
			return;
		}

		let mut indent = indent_of(line);
		let mut rest = trimmed;

		// Sequence items, including compact nested ones like `- - value`.
		while rest == "-" || rest.starts_with("- ") {
			while self
				.stack
				.last()
				.is_some_and(|top| top.indent > indent || (top.indent == indent && top.is_item))
			{
				self.stack.pop();
			}

			let parent = self.path();
			let counter = self.sequence_counters.entry((parent, indent)).or_insert(0);
			let index = *counter;
			*counter += 1;
			self.stack.push(Frame {
				indent,
				segment: index.to_string(),
				is_item: true,
			});

			let after_dash = &rest[1..];
			let after_spaces = after_dash.trim_start();
			indent += 1 + (after_dash.len() - after_spaces.len());
			rest = after_spaces;
		}

		let Some((key, after_colon)) = split_key(rest) else {
			self.pending = None;
			return;
		};

		while self.stack.last().is_some_and(|top| top.indent >= indent) {
			self.stack.pop();
		}

		let mut path = self.path();
		path.push(key.clone());

		let pending = self.pending.take();
		let (value, comment) = split_trailing_comment(after_colon);
		if let Some(prefix) = comment.and_then(parse_annotation).or(pending) {
			tracing::trace!(path = %path.join("."), prefix = %prefix, "found prefix annotation");
			self.annotations.insert(path, prefix);
		}

		let value = value.trim();
		if value.starts_with('|') || value.starts_with('>') {
			self.block_scalar_indent = Some(indent);
		}

		self.stack.push(Frame {
			indent,
			segment: key,
			is_item: false,
		});
	}
}

fn indent_of(line: &str) -> usize {
	line.len() - line.trim_start_matches(' ').len()
}

/// Parse the text after `#` as a prefix annotation.
fn parse_annotation(comment: &str) -> Option<String> {
	let value = comment.trim().strip_prefix(ANNOTATION_TAG)?.trim();
	(!value.is_empty()).then(|| value.to_string())
}

/// Split `key: rest` into the unquoted key and everything after the colon.
/// Returns `None` for lines that are not block mapping entries.
fn split_key(line: &str) -> Option<(String, &str)> {
	let first = line.chars().next()?;

	if first == '"' || first == '\'' {
		let close = find_closing_quote(line, first)?;
		let after_quote = &line[close + 1..];
		let after_colon = after_quote.trim_start().strip_prefix(':')?;
		if !(after_colon.is_empty() || after_colon.starts_with([' ', '\t'])) {
			return None;
		}

		let quoted = &line[..=close];
		let key = if first == '"' {
			unescape(quoted).unwrap_or_else(|_| quoted[1..quoted.len() - 1].to_string())
		} else {
			quoted[1..quoted.len() - 1].replace("''", "'")
		};
		return Some((key, after_colon));
	}

	if matches!(first, '{' | '[' | '&' | '*' | '!' | '|' | '>' | '?' | '%' | '@' | '`') {
		return None;
	}

	let bytes = line.as_bytes();
	for (index, byte) in bytes.iter().enumerate() {
		match byte {
			b'#' if index > 0 && matches!(bytes[index - 1], b' ' | b'\t') => return None,
			b':' if index + 1 == bytes.len() || matches!(bytes[index + 1], b' ' | b'\t') => {
				let key = line[..index].trim_end();
				return Some((resolve_plain_key(key), &line[index + 1..]));
			}
			_ => {}
		}
	}

	None
}

/// Spell a plain key the way the tree builder does, so `~`, `True` or `0x10`
/// resolve to the same segment (`null`, `true`, `16`) on both sides.
fn resolve_plain_key(key: &str) -> String {
	if key.is_empty() {
		return "null".to_string();
	}

	match serde_yaml_ng::from_str::<Value>(key) {
		Ok(Value::Null) => "null".to_string(),
		Ok(Value::Bool(flag)) => flag.to_string(),
		Ok(Value::Number(number)) => number.to_string(),
		_ => key.to_string(),
	}
}

fn find_closing_quote(line: &str, quote: char) -> Option<usize> {
	let mut chars = line.char_indices().skip(1);
	while let Some((index, ch)) = chars.next() {
		if quote == '"' && ch == '\\' {
			chars.next();
			continue;
		}

		if ch == quote {
			// `''` is an escaped quote inside single-quoted scalars.
			if quote == '\'' && line[index + 1..].starts_with('\'') {
				chars.next();
				continue;
			}
			return Some(index);
		}
	}

	None
}

/// Separate a value from a trailing `# comment`, ignoring `#` inside quotes.
fn split_trailing_comment(text: &str) -> (&str, Option<&str>) {
	let mut quote: Option<char> = None;
	let mut previous = ' ';

	for (index, ch) in text.char_indices() {
		match quote {
			Some(open) if ch == open => quote = None,
			Some(_) => {}
			None if (ch == '"' || ch == '\'') && previous.is_whitespace() => quote = Some(ch),
			None if ch == '#' && previous.is_whitespace() => {
				return (&text[..index], Some(&text[index + 1..]));
			}
			None => {}
		}
		previous = ch;
	}

	(text, None)
}

use std::fmt;

use serde::Serialize;

use crate::Language;
use crate::RenameMapping;

/// One identifier occurrence that the rename mapping rewrites.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Substitution {
	/// 1-indexed line of the identifier.
	pub line: usize,
	/// 1-indexed byte column of the identifier.
	pub column: usize,
	/// Byte offset of the identifier in the file.
	#[serde(skip)]
	pub offset: usize,
	pub old: String,
	pub new: String,
}

/// Why a file could not be tokenized safely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScanIssue {
	/// The file is not valid UTF-8.
	NotUtf8,
	/// A string literal opened on `line` never closes.
	UnterminatedString { line: usize },
	/// A block comment opened on `line` never closes.
	UnterminatedComment { line: usize },
	/// A rune literal on `line` could not be read.
	InvalidRune { line: usize },
}

impl fmt::Display for ScanIssue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::NotUtf8 => write!(f, "file is not valid UTF-8"),
			Self::UnterminatedString { line } => write!(f, "unterminated string literal on line {line}"),
			Self::UnterminatedComment { line } => {
				write!(f, "unterminated block comment on line {line}")
			}
			Self::InvalidRune { line } => write!(f, "invalid rune literal on line {line}"),
		}
	}
}

/// Pre-computed table of line-start byte offsets for offset-to-line/column
/// conversion.
struct LineTable {
	line_starts: Vec<usize>,
}

impl LineTable {
	fn new(content: &str) -> Self {
		let mut line_starts = vec![0];
		for (i, byte) in content.bytes().enumerate() {
			if byte == b'\n' {
				line_starts.push(i + 1);
			}
		}
		Self { line_starts }
	}

	/// 1-indexed line and column of a byte offset.
	fn locate(&self, offset: usize) -> (usize, usize) {
		let line_idx = match self.line_starts.binary_search(&offset) {
			Ok(exact) => exact,
			Err(insert) => insert.saturating_sub(1),
		};
		(line_idx + 1, offset - self.line_starts[line_idx] + 1)
	}
}

/// Find every whole-identifier occurrence of an old name in source code.
///
/// Identifiers are matched on token boundaries only, so `OldConst` never
/// matches inside `OldConstant`. String, raw string, rune/char literals and
/// comments are skipped entirely. Returns a [`ScanIssue`] when a literal or
/// comment is left open, since everything after it would be misread.
pub fn scan_identifiers(
	content: &str,
	language: Language,
	mapping: &RenameMapping,
) -> Result<Vec<Substitution>, ScanIssue> {
	let bytes = content.as_bytes();
	let lines = LineTable::new(content);
	let line_of = |offset: usize| lines.locate(offset).0;
	let mut substitutions = Vec::new();
	let mut i = 0;

	while i < bytes.len() {
		let byte = bytes[i];
		let next = bytes.get(i + 1).copied();

		match byte {
			b'/' if next == Some(b'/') => {
				i = memchr_newline(bytes, i);
			}
			b'/' if next == Some(b'*') => {
				i = skip_block_comment(bytes, i, language == Language::Rust)
					.ok_or_else(|| ScanIssue::UnterminatedComment { line: line_of(i) })?;
			}
			b'"' => {
				i = skip_quoted(bytes, i, language == Language::Go)
					.ok_or_else(|| ScanIssue::UnterminatedString { line: line_of(i) })?;
			}
			b'`' if language == Language::Go => {
				let close = bytes[i + 1..]
					.iter()
					.position(|&b| b == b'`')
					.ok_or_else(|| ScanIssue::UnterminatedString { line: line_of(i) })?;
				i += close + 2;
			}
			b'\'' => {
				i = match (skip_char_literal(content, i), language) {
					(Some(end), _) => end,
					// Rust lifetimes and labels: `'a`, `'static`.
					(None, Language::Rust) => skip_word(bytes, i + 1),
					(None, Language::Go) => return Err(ScanIssue::InvalidRune { line: line_of(i) }),
				};
			}
			b'0'..=b'9' => {
				i = skip_number(bytes, i);
			}
			byte if is_word_start(byte) => {
				let end = skip_word(bytes, i);
				let word = &content[i..end];

				if language == Language::Rust && matches!(word, "r" | "br" | "cr") {
					if let Some(raw_end) = skip_rust_raw_string(bytes, end) {
						i = raw_end;
						continue;
					}
				}

				if let Some(new) = mapping.get(word) {
					let (line, column) = lines.locate(i);
					substitutions.push(Substitution {
						line,
						column,
						offset: i,
						old: word.to_string(),
						new: new.clone(),
					});
				}

				i = end;
			}
			_ => i += 1,
		}
	}

	Ok(substitutions)
}

/// Replace each substitution's old identifier with its new one.
pub fn apply_substitutions(content: &str, substitutions: &[Substitution]) -> String {
	let mut sorted: Vec<&Substitution> = substitutions.iter().collect();
	sorted.sort_by_key(|substitution| substitution.offset);

	let mut result = String::with_capacity(content.len());
	let mut cursor = 0;
	for substitution in sorted {
		let end = substitution.offset + substitution.old.len();
		if substitution.offset < cursor
			|| content.get(substitution.offset..end) != Some(substitution.old.as_str())
		{
			continue;
		}
		result.push_str(&content[cursor..substitution.offset]);
		result.push_str(&substitution.new);
		cursor = end;
	}
	result.push_str(&content[cursor..]);

	result
}

fn is_word_start(byte: u8) -> bool {
	byte.is_ascii_alphabetic() || byte == b'_' || byte >= 0x80
}

fn is_word_byte(byte: u8) -> bool {
	byte.is_ascii_alphanumeric() || byte == b'_' || byte >= 0x80
}

fn skip_word(bytes: &[u8], start: usize) -> usize {
	let mut end = start;
	while end < bytes.len() && is_word_byte(bytes[end]) {
		end += 1;
	}
	end
}

fn skip_number(bytes: &[u8], start: usize) -> usize {
	let mut end = start;
	while end < bytes.len() && (is_word_byte(bytes[end]) || bytes[end] == b'.') {
		// `1..10` is a range, not a float.
		if bytes[end] == b'.' && bytes.get(end + 1) == Some(&b'.') {
			break;
		}
		end += 1;
	}
	end
}

/// Offset of the newline ending the line that contains `start`, or the end of
/// input.
fn memchr_newline(bytes: &[u8], start: usize) -> usize {
	bytes[start..]
		.iter()
		.position(|&b| b == b'\n')
		.map_or(bytes.len(), |offset| start + offset)
}

/// Offset just past the block comment opening at `start`.
fn skip_block_comment(bytes: &[u8], start: usize, nested: bool) -> Option<usize> {
	let mut depth = 1;
	let mut i = start + 2;

	while i + 1 < bytes.len() {
		match (bytes[i], bytes[i + 1]) {
			(b'*', b'/') => {
				depth -= 1;
				i += 2;
				if depth == 0 {
					return Some(i);
				}
			}
			(b'/', b'*') if nested => {
				depth += 1;
				i += 2;
			}
			_ => i += 1,
		}
	}

	None
}

/// Offset just past the double-quoted string opening at `start`.
fn skip_quoted(bytes: &[u8], start: usize, single_line: bool) -> Option<usize> {
	let mut i = start + 1;

	while i < bytes.len() {
		match bytes[i] {
			b'\\' => i += 2,
			b'"' => return Some(i + 1),
			b'\n' if single_line => return None,
			_ => i += 1,
		}
	}

	None
}

/// Offset just past a char or rune literal starting at `start`, or `None` if
/// the quote does not open one.
fn skip_char_literal(content: &str, start: usize) -> Option<usize> {
	let mut chars = content[start + 1..].char_indices();
	let (_, first) = chars.next()?;

	if first == '\\' {
		chars.next()?;
		// Longest escape is `\u{10FFFF}`.
		for (offset, ch) in chars.take(10) {
			match ch {
				'\'' => return Some(start + 1 + offset + 1),
				'\n' => return None,
				_ => {}
			}
		}
		return None;
	}

	if first == '\'' || first == '\n' {
		return None;
	}

	match chars.next() {
		Some((offset, '\'')) => Some(start + 1 + offset + 1),
		_ => None,
	}
}

/// Offset just past a Rust raw string whose `r`/`br` prefix ends at `start`.
fn skip_rust_raw_string(bytes: &[u8], start: usize) -> Option<usize> {
	let mut i = start;
	let mut hashes = 0;
	while bytes.get(i) == Some(&b'#') {
		hashes += 1;
		i += 1;
	}

	if bytes.get(i) != Some(&b'"') {
		return None;
	}
	i += 1;

	while i < bytes.len() {
		let closes = bytes[i + 1..]
			.iter()
			.take(hashes)
			.filter(|&&b| b == b'#')
			.count() == hashes;
		if bytes[i] == b'"' && closes {
			return Some(i + 1 + hashes);
		}
		i += 1;
	}

	None
}

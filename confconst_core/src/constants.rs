use std::borrow::Cow;
use std::path::Path;

use derive_more::Deref;
use indexmap::IndexMap;
use snailquote::unescape;

use crate::ConfConstError;
use crate::ConfConstResult;
use crate::lexer::Lexeme;
use crate::lexer::RawToken;
use crate::lexer::statements;
use crate::lexer::tokenize;

/// Constant names mapped to their literal values.
///
/// Entries keep the position of the first declaration of a name. A later
/// declaration of the same name replaces the value in place, so the map
/// mirrors what the source file leaves in effect.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deref)]
pub struct ConstantMap(IndexMap<String, String>);

impl ConstantMap {
	pub fn new() -> Self {
		Self::default()
	}

	/// Insert a constant, returning the value it replaced.
	pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
		self.0.insert(name.into(), value.into())
	}

	pub fn into_inner(self) -> IndexMap<String, String> {
		self.0
	}
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for ConstantMap {
	fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
		let mut map = Self::new();
		for (name, value) in iter {
			map.insert(name, value);
		}
		map
	}
}

/// Read the literal constant declarations of a source file.
pub fn parse_constants(path: &Path) -> ConfConstResult<ConstantMap> {
	let bytes = std::fs::read(path).map_err(|e| ConfConstError::parse(path, e))?;
	let content =
		String::from_utf8(bytes).map_err(|_| ConfConstError::parse(path, "file is not valid UTF-8"))?;
	let constants = parse_constants_str(&content);
	tracing::debug!(path = %path.display(), count = constants.len(), "parsed constants");

	Ok(constants)
}

/// Extract `Name = "literal"` style declarations from source text.
///
/// Recognized forms include Go const block entries (`Name = "v"`,
/// `Name string = "v"`), Go single-line consts (`const Name = "v"`), and Rust
/// items (`pub const Name: &str = "v";`). Anything else is skipped.
pub fn parse_constants_str(content: &str) -> ConstantMap {
	let lexemes = tokenize(content);
	let mut constants = ConstantMap::new();

	for statement in statements(&lexemes) {
		let Some((name, value)) = parse_declaration(statement) else {
			continue;
		};

		if let Some(previous) = constants.insert(name.clone(), value) {
			tracing::debug!(
				name = %name,
				line = statement[0].line,
				previous = %previous,
				"constant redeclared, later value wins"
			);
		}
	}

	constants
}

fn parse_declaration(statement: &[Lexeme<'_>]) -> Option<(String, String)> {
	let mut cursor = 0;

	if statement.first()?.is_ident("pub") {
		cursor += 1;
		// `pub(crate)` and friends.
		if statement.get(cursor)?.is(RawToken::ParenOpen) {
			let close = statement[cursor..]
				.iter()
				.position(|lexeme| lexeme.is(RawToken::ParenClose))?;
			cursor += close + 1;
		}
	}

	if statement
		.get(cursor)
		.is_some_and(|lexeme| lexeme.is_ident("const") || lexeme.is_ident("static"))
	{
		cursor += 1;
	}

	let name = statement.get(cursor)?;
	if !name.is(RawToken::Ident) || is_keyword(name.text) {
		return None;
	}
	cursor += 1;

	let next = statement.get(cursor)?;
	if next.is(RawToken::Colon) {
		let assign = statement[cursor..]
			.iter()
			.position(|lexeme| lexeme.is(RawToken::Assign))?;
		let type_tokens = &statement[cursor + 1..cursor + assign];
		if type_tokens.is_empty() || !type_tokens.iter().all(is_type_token) {
			return None;
		}
		cursor += assign;
	} else if next.is(RawToken::Ident) {
		if is_keyword(next.text) {
			return None;
		}
		cursor += 1;
		// Qualified Go types, e.g. `pkg.Kind`.
		while statement.get(cursor).is_some_and(|l| l.is(RawToken::Dot))
			&& statement.get(cursor + 1).is_some_and(|l| l.is(RawToken::Ident))
		{
			cursor += 2;
		}
	}

	if !statement.get(cursor)?.is(RawToken::Assign) {
		return None;
	}
	cursor += 1;

	let value = literal_value(statement.get(cursor)?)?;
	cursor += 1;

	if statement
		.get(cursor)
		.is_some_and(|lexeme| lexeme.is(RawToken::Comma))
	{
		cursor += 1;
	}

	(cursor == statement.len()).then(|| (name.text.to_string(), value))
}

fn literal_value(lexeme: &Lexeme<'_>) -> Option<String> {
	match lexeme.kind? {
		RawToken::DoubleQuotedString => {
			match unescape(&brace_unicode_escapes(lexeme.text)) {
				Ok(value) => Some(value),
				Err(e) => {
					tracing::debug!(
						line = lexeme.line,
						literal = lexeme.text,
						"skipping literal with unsupported escapes: {e}"
					);
					None
				}
			}
		}
		RawToken::RawString => Some(lexeme.text[1..lexeme.text.len() - 1].to_string()),
		RawToken::Number => Some(lexeme.text.to_string()),
		RawToken::Ident if matches!(lexeme.text, "true" | "false") => Some(lexeme.text.to_string()),
		_ => None,
	}
}

/// `snailquote` only reads braced unicode escapes, so Go's `\u00e9` and
/// `\U0001f600` forms are rewritten to `\u{00e9}` first.
fn brace_unicode_escapes(literal: &str) -> Cow<'_, str> {
	if !literal.contains("\\u") && !literal.contains("\\U") {
		return Cow::Borrowed(literal);
	}

	let mut out = String::with_capacity(literal.len() + 4);
	let mut chars = literal.chars().peekable();
	while let Some(ch) = chars.next() {
		if ch != '\\' {
			out.push(ch);
			continue;
		}

		match chars.next() {
			Some(marker @ ('u' | 'U')) if chars.peek() != Some(&'{') => {
				let width = if marker == 'u' { 4 } else { 8 };
				let digits: String = chars.by_ref().take(width).collect();
				out.push_str("\\u{");
				out.push_str(&digits);
				out.push('}');
			}
			Some(other) => {
				out.push('\\');
				out.push(other);
			}
			None => out.push('\\'),
		}
	}

	Cow::Owned(out)
}

fn is_type_token(lexeme: &Lexeme<'_>) -> bool {
	matches!(
		lexeme.kind,
		Some(
			RawToken::Ident
				| RawToken::Ampersand
				| RawToken::Lifetime
				| RawToken::Dot
				| RawToken::Colon
		)
	)
}

/// Words that can open a statement but never name a constant.
fn is_keyword(word: &str) -> bool {
	matches!(
		word,
		"break"
			| "case" | "const"
			| "continue" | "default"
			| "defer" | "else"
			| "fn" | "for"
			| "func" | "go"
			| "goto" | "if"
			| "impl" | "import"
			| "let" | "match"
			| "mod" | "mut"
			| "package" | "pub"
			| "return" | "static"
			| "struct" | "switch"
			| "type" | "use"
			| "var" | "while"
	)
}

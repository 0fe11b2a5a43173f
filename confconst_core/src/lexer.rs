use logos::Logos;

/// Raw tokens produced by logos for constant declaration files. Only the
/// handful of tokens the declaration grammar needs are distinguished,
/// everything else surfaces as a lexing error and is treated as opaque.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\f]+")]
pub(crate) enum RawToken {
	#[token("\n")]
	Newline,
	#[token("=")]
	Assign,
	#[token("==")]
	Equals,
	#[token(":=")]
	Define,
	#[token(":")]
	Colon,
	#[token(";")]
	Semicolon,
	#[token(",")]
	Comma,
	#[token(".")]
	Dot,
	#[token("&")]
	Ampersand,
	#[token("(")]
	ParenOpen,
	#[token(")")]
	ParenClose,
	#[regex(r"//[^\n]*", allow_greedy = true)]
	LineComment,
	#[regex(r"/\*([^*]|\*+[^*/])*\*+/")]
	BlockComment,
	#[regex(r"'[a-zA-Z_][a-zA-Z0-9_]*")]
	Lifetime,
	#[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
	Ident,
	#[regex(r#""([^"\\\n]|\\.)*""#)]
	DoubleQuotedString,
	#[regex(r"`[^`]*`")]
	RawString,
	#[regex(r"-?[0-9][0-9_]*(\.[0-9_]+)?([eE][+-]?[0-9]+)?")]
	#[regex(r"0[xX][0-9a-fA-F_]+")]
	Number,
}

/// A token together with the source text it was lexed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Lexeme<'a> {
	/// `None` when the text did not match any known token.
	pub kind: Option<RawToken>,
	pub text: &'a str,
	/// 1-indexed line the token starts on.
	pub line: usize,
}

impl Lexeme<'_> {
	pub fn is(&self, kind: RawToken) -> bool {
		self.kind == Some(kind)
	}

	pub fn is_ident(&self, text: &str) -> bool {
		self.is(RawToken::Ident) && self.text == text
	}
}

/// Tokenize a constants file, keeping comments out of the result. Newlines
/// are kept (including those swallowed by block comments) because they end
/// declarations.
pub(crate) fn tokenize(source: &str) -> Vec<Lexeme<'_>> {
	let mut lexemes = Vec::new();
	let mut line = 1;

	for (result, span) in RawToken::lexer(source).spanned() {
		let text = &source[span];
		let kind = result.ok();

		match kind {
			Some(RawToken::LineComment) => {}
			Some(RawToken::BlockComment) => {
				for _ in 0..text.matches('\n').count() {
					lexemes.push(Lexeme {
						kind: Some(RawToken::Newline),
						text: "\n",
						line,
					});
					line += 1;
				}
			}
			_ => {
				lexemes.push(Lexeme { kind, text, line });
				line += text.matches('\n').count();
			}
		}
	}

	lexemes
}

/// Split a token stream into statements. Statements end at a newline or a
/// semicolon, and empty statements are dropped.
pub(crate) fn statements<'a, 'b>(lexemes: &'b [Lexeme<'a>]) -> Vec<&'b [Lexeme<'a>]> {
	lexemes
		.split(|lexeme| lexeme.is(RawToken::Newline) || lexeme.is(RawToken::Semicolon))
		.filter(|statement| !statement.is_empty())
		.collect()
}

//! Core token types: the [`Token`] sum type and the primitive leaves.
//!
//! Every node in the tree serializes by concatenating the exact text of its
//! children, so `to_string()` on any token reproduces the bytes it was parsed
//! from. Primitive tokens store their text directly; aggregate tokens own an
//! ordered child list and serialize recursively. This is the round-trip
//! guarantee: parse → `to_string()` is an identity, and targeted mutation
//! only ever changes the text of the tokens it touches.

use std::fmt;

use crate::dockerfile::error::{Error, Result};
use crate::dockerfile::token::keyvalue::KeyValueToken;
use crate::dockerfile::token::literal::{IdentifierToken, LiteralToken};
use crate::dockerfile::token::variable::VariableRefToken;

/// Any node in the token tree.
///
/// Primitive variants are leaves; aggregate variants own ordered children and
/// serialize by concatenation (see the module docs).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A run of literal text.
    String(StringToken),
    /// Punctuation: `=`, `{`, `}`, `[`, `,`, `--`, the escape character.
    Symbol(SymbolToken),
    /// Horizontal whitespace only.
    Whitespace(WhitespaceToken),
    /// A line-ending sequence.
    Newline(NewlineToken),
    /// An instruction name or grammar keyword (`FROM`, `AS`, `NONE`, `CMD`).
    Keyword(KeywordToken),
    /// A validated identifier (stage names).
    Identifier(IdentifierToken),
    /// A `#` comment, optionally with leading whitespace and trailing newline.
    Comment(CommentToken),
    /// Escape character + optional trailing whitespace + newline.
    LineContinuation(LineContinuationToken),
    /// An optionally quoted value that may contain variable references,
    /// embedded line continuations, and embedded comments.
    Literal(LiteralToken),
    /// `$NAME` or `${NAME<modifier><default>}`.
    VariableRef(VariableRefToken),
    /// A `key<separator>value` pair (ARG declarations, ENV/LABEL pairs,
    /// `--flag=value` options).
    KeyValue(KeyValueToken),
}

impl Token {
    pub fn as_literal(&self) -> Option<&LiteralToken> {
        match self {
            Token::Literal(lit) => Some(lit),
            _ => None,
        }
    }

    pub fn as_literal_mut(&mut self) -> Option<&mut LiteralToken> {
        match self {
            Token::Literal(lit) => Some(lit),
            _ => None,
        }
    }

    pub fn as_key_value(&self) -> Option<&KeyValueToken> {
        match self {
            Token::KeyValue(kv) => Some(kv),
            _ => None,
        }
    }

    pub fn as_key_value_mut(&mut self) -> Option<&mut KeyValueToken> {
        match self {
            Token::KeyValue(kv) => Some(kv),
            _ => None,
        }
    }

    pub fn as_keyword(&self) -> Option<&KeywordToken> {
        match self {
            Token::Keyword(kw) => Some(kw),
            _ => None,
        }
    }

    pub fn is_whitespace(&self) -> bool {
        matches!(self, Token::Whitespace(_))
    }

    pub fn is_comment(&self) -> bool {
        matches!(self, Token::Comment(_))
    }

    pub fn is_line_continuation(&self) -> bool {
        matches!(self, Token::LineContinuation(_))
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::String(t) => f.write_str(t.value()),
            Token::Symbol(t) => f.write_str(t.value()),
            Token::Whitespace(t) => f.write_str(t.value()),
            Token::Newline(t) => f.write_str(t.value()),
            Token::Keyword(t) => f.write_str(t.value()),
            Token::Identifier(t) => f.write_str(t.value()),
            Token::Comment(t) => t.fmt(f),
            Token::LineContinuation(t) => t.fmt(f),
            Token::Literal(t) => t.fmt(f),
            Token::VariableRef(t) => t.fmt(f),
            Token::KeyValue(t) => t.fmt(f),
        }
    }
}

/// Writes the concatenated text of a token sequence. All aggregate `Display`
/// impls funnel through this.
pub(crate) fn write_tokens(tokens: &[Token], f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for token in tokens {
        fmt::Display::fmt(token, f)?;
    }
    Ok(())
}

/// Concatenated text of a token sequence as an owned string.
pub fn tokens_text(tokens: &[Token]) -> String {
    tokens.iter().map(|t| t.to_string()).collect()
}

/// A run of literal text with no internal structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringToken {
    value: String,
}

impl StringToken {
    pub fn new(value: impl Into<String>) -> Self {
        StringToken {
            value: value.into(),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
    }
}

/// A punctuation token. Multi-character symbols (`--`, `:-`) are a single
/// token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolToken {
    value: String,
}

impl SymbolToken {
    pub fn new(value: impl Into<String>) -> Self {
        SymbolToken {
            value: value.into(),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

/// Horizontal whitespace. Invariant: the value contains only spaces and tabs
/// (enforced on construction).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhitespaceToken {
    value: String,
}

impl WhitespaceToken {
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        if value.chars().all(|ch| ch == ' ' || ch == '\t') {
            Ok(WhitespaceToken { value })
        } else {
            Err(Error::InvalidArgument(format!(
                "whitespace token may only contain spaces and tabs, got {:?}",
                value
            )))
        }
    }

    /// Constructor for grammar-internal use where the text has already been
    /// matched by a whitespace character class.
    pub(crate) fn from_matched(value: impl Into<String>) -> Self {
        WhitespaceToken {
            value: value.into(),
        }
    }

    /// A single space, the most common programmatically created separator.
    pub fn space() -> Self {
        WhitespaceToken {
            value: " ".to_string(),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

/// A line-ending sequence: `\n`, `\r\n`, or `\r` (enforced on construction).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewlineToken {
    value: String,
}

impl NewlineToken {
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        match value.as_str() {
            "\n" | "\r\n" | "\r" => Ok(NewlineToken { value }),
            _ => Err(Error::InvalidArgument(format!(
                "newline token must be a line-ending sequence, got {:?}",
                value
            ))),
        }
    }

    pub(crate) fn from_matched(value: impl Into<String>) -> Self {
        NewlineToken {
            value: value.into(),
        }
    }

    /// A bare `\n`, for programmatically created lines.
    pub fn lf() -> Self {
        NewlineToken {
            value: "\n".to_string(),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

/// An instruction name or grammar keyword. Matching is case-insensitive;
/// the original casing is preserved for round-trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordToken {
    value: String,
}

impl KeywordToken {
    pub fn new(value: impl Into<String>) -> Self {
        KeywordToken {
            value: value.into(),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
    }

    /// Case-insensitive keyword comparison.
    pub fn matches(&self, keyword: &str) -> bool {
        self.value.eq_ignore_ascii_case(keyword)
    }
}

/// A `#` comment. Children: optional leading whitespace, the `#` symbol,
/// optional whitespace, the comment text, and (when parsed from a full line)
/// the trailing newline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentToken {
    tokens: Vec<Token>,
}

impl CommentToken {
    pub(crate) fn from_tokens(tokens: Vec<Token>) -> Self {
        CommentToken { tokens }
    }

    /// Builds `# <text>` with no trailing newline.
    pub fn create(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        if text.contains('\n') || text.contains('\r') {
            return Err(Error::InvalidArgument(
                "comment text may not contain line endings".to_string(),
            ));
        }
        Ok(CommentToken {
            tokens: vec![
                Token::Symbol(SymbolToken::new("#")),
                Token::Whitespace(WhitespaceToken::space()),
                Token::String(StringToken::new(text)),
            ],
        })
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// The comment text, without the `#`, surrounding whitespace, or newline.
    pub fn text(&self) -> String {
        self.tokens
            .iter()
            .find_map(|t| match t {
                Token::String(s) => Some(s.value().to_string()),
                _ => None,
            })
            .unwrap_or_default()
    }

    pub fn set_text(&mut self, text: impl Into<String>) -> Result<()> {
        let text = text.into();
        if text.contains('\n') || text.contains('\r') {
            return Err(Error::InvalidArgument(
                "comment text may not contain line endings".to_string(),
            ));
        }
        for token in &mut self.tokens {
            if let Token::String(s) = token {
                s.set_value(text);
                return Ok(());
            }
        }
        // Comment had no text run (`#` alone); append one.
        let insert_at = self
            .tokens
            .iter()
            .position(|t| matches!(t, Token::Newline(_)))
            .unwrap_or(self.tokens.len());
        self.tokens
            .insert(insert_at, Token::String(StringToken::new(text)));
        Ok(())
    }
}

impl fmt::Display for CommentToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_tokens(&self.tokens, f)
    }
}

/// A line continuation: the escape character, optional trailing horizontal
/// whitespace, and the newline. Preserved wherever it occurred so that
/// reserializing reproduces the original physical line breaks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineContinuationToken {
    tokens: Vec<Token>,
}

impl LineContinuationToken {
    pub(crate) fn from_tokens(tokens: Vec<Token>) -> Self {
        LineContinuationToken { tokens }
    }

    /// Builds `<escape>\n`.
    pub fn create(escape: char) -> Self {
        LineContinuationToken {
            tokens: vec![
                Token::Symbol(SymbolToken::new(escape.to_string())),
                Token::Newline(NewlineToken::lf()),
            ],
        }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }
}

impl fmt::Display for LineContinuationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_tokens(&self.tokens, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whitespace_token_rejects_non_whitespace() {
        assert!(WhitespaceToken::new("  \t").is_ok());
        assert!(WhitespaceToken::new(" x ").is_err());
        assert!(WhitespaceToken::new("\n").is_err());
    }

    #[test]
    fn test_newline_token_accepts_line_endings_only() {
        assert!(NewlineToken::new("\n").is_ok());
        assert!(NewlineToken::new("\r\n").is_ok());
        assert!(NewlineToken::new("\n\n").is_err());
        assert!(NewlineToken::new(" ").is_err());
    }

    #[test]
    fn test_keyword_matches_case_insensitively() {
        let kw = KeywordToken::new("FrOm");
        assert!(kw.matches("FROM"));
        assert!(kw.matches("from"));
        assert_eq!(kw.value(), "FrOm");
    }

    #[test]
    fn test_comment_create_and_text() {
        let comment = CommentToken::create("a note").unwrap();
        assert_eq!(comment.to_string(), "# a note");
        assert_eq!(comment.text(), "a note");
    }

    #[test]
    fn test_comment_set_text_rejects_newlines() {
        let mut comment = CommentToken::create("a").unwrap();
        assert!(comment.set_text("b\nc").is_err());
        assert_eq!(comment.text(), "a");
    }

    #[test]
    fn test_line_continuation_create() {
        assert_eq!(LineContinuationToken::create('\\').to_string(), "\\\n");
        assert_eq!(LineContinuationToken::create('`').to_string(), "`\n");
    }
}

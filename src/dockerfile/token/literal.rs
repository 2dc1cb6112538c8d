//! Literal and identifier tokens, and the quoting model.
//!
//! A [`LiteralToken`] tracks its optional surrounding quote character
//! separately from its content, so editing the value never touches the
//! quoting and quoting can be toggled independently. Its children may include
//! [`VariableRefToken`]s, embedded line continuations, embedded comment
//! lines, and symbol tokens (which only ever hold an escape character
//! guarding a `$`); the `value()` getter strips continuations and comments to
//! produce the logical text while serialization keeps every byte.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::dockerfile::error::{Error, Result};
use crate::dockerfile::token::core::{write_tokens, StringToken, Token};

/// Stage names: a letter followed by letters, digits, `_`, `.`, or `-`.
static IDENTIFIER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9_.-]*$").expect("identifier pattern is valid"));

/// An optionally quoted value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteralToken {
    quote: Option<char>,
    tokens: Vec<Token>,
}

impl LiteralToken {
    pub(crate) fn from_tokens(quote: Option<char>, tokens: Vec<Token>) -> Self {
        LiteralToken { quote, tokens }
    }

    /// An unquoted literal holding plain text.
    pub fn create(value: impl Into<String>) -> Self {
        let value = value.into();
        let tokens = if value.is_empty() {
            Vec::new()
        } else {
            vec![Token::String(StringToken::new(value))]
        };
        LiteralToken {
            quote: None,
            tokens,
        }
    }

    /// A quoted literal holding plain text.
    pub fn create_quoted(quote: char, value: impl Into<String>) -> Result<Self> {
        let mut literal = LiteralToken::create(value);
        literal.set_quote_char(Some(quote))?;
        Ok(literal)
    }

    /// An empty, unquoted literal (the value side of `ARG name=`).
    pub(crate) fn empty() -> Self {
        LiteralToken {
            quote: None,
            tokens: Vec::new(),
        }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn tokens_mut(&mut self) -> &mut Vec<Token> {
        &mut self.tokens
    }

    pub fn quote_char(&self) -> Option<char> {
        self.quote
    }

    /// Toggles quoting without altering the value text.
    pub fn set_quote_char(&mut self, quote: Option<char>) -> Result<()> {
        match quote {
            None | Some('"') | Some('\'') => {
                self.quote = quote;
                Ok(())
            }
            Some(other) => Err(Error::InvalidArgument(format!(
                "quote character must be '\"' or '\\'', got {:?}",
                other
            ))),
        }
    }

    /// The logical value: concatenated child text, skipping embedded line
    /// continuations and comments, excluding the quotes.
    pub fn value(&self) -> String {
        let mut out = String::new();
        for token in &self.tokens {
            match token {
                Token::LineContinuation(_) | Token::Comment(_) => {}
                other => out.push_str(&other.to_string()),
            }
        }
        out
    }

    /// Replaces the content with plain text. Quoting is preserved; any
    /// variable references, continuations, or comments the literal held are
    /// discarded with the old content.
    pub fn set_value(&mut self, value: impl Into<String>) {
        let value = value.into();
        self.tokens.clear();
        if !value.is_empty() {
            self.tokens.push(Token::String(StringToken::new(value)));
        }
    }

    /// The variable references directly contained in this literal, in order.
    pub fn variable_refs(&self) -> Vec<&crate::dockerfile::token::variable::VariableRefToken> {
        self.tokens
            .iter()
            .filter_map(|t| match t {
                Token::VariableRef(v) => Some(v),
                _ => None,
            })
            .collect()
    }
}

impl fmt::Display for LiteralToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(q) = self.quote {
            write!(f, "{}", q)?;
        }
        write_tokens(&self.tokens, f)?;
        if let Some(q) = self.quote {
            write!(f, "{}", q)?;
        }
        Ok(())
    }
}

/// A validated identifier, used for build-stage names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierToken {
    value: String,
}

impl IdentifierToken {
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        if IDENTIFIER_PATTERN.is_match(&value) {
            Ok(IdentifierToken { value })
        } else {
            Err(Error::InvalidArgument(format!(
                "not a valid identifier: {:?}",
                value
            )))
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn set_value(&mut self, value: impl Into<String>) -> Result<()> {
        let value = value.into();
        if IDENTIFIER_PATTERN.is_match(&value) {
            self.value = value;
            Ok(())
        } else {
            Err(Error::InvalidArgument(format!(
                "not a valid identifier: {:?}",
                value
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_value_excludes_quotes() {
        let lit = LiteralToken::create_quoted('"', "hello world").unwrap();
        assert_eq!(lit.to_string(), "\"hello world\"");
        assert_eq!(lit.value(), "hello world");
    }

    #[test]
    fn test_set_value_preserves_quote() {
        let mut lit = LiteralToken::create_quoted('\'', "old").unwrap();
        lit.set_value("new");
        assert_eq!(lit.to_string(), "'new'");
    }

    #[test]
    fn test_clearing_quote_keeps_value() {
        let mut lit = LiteralToken::create_quoted('"', "value").unwrap();
        lit.set_quote_char(None).unwrap();
        assert_eq!(lit.to_string(), "value");
    }

    #[test]
    fn test_invalid_quote_char_rejected() {
        let mut lit = LiteralToken::create("x");
        assert!(lit.set_quote_char(Some('`')).is_err());
    }

    #[test]
    fn test_identifier_validation() {
        assert!(IdentifierToken::new("builder").is_ok());
        assert!(IdentifierToken::new("build-stage.2").is_ok());
        assert!(IdentifierToken::new("2stage").is_err());
        assert!(IdentifierToken::new("").is_err());
        assert!(IdentifierToken::new("has space").is_err());
    }
}

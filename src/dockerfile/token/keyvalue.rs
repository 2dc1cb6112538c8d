//! Key/value pair tokens.
//!
//! One shape covers ARG declarations (`name`, `name=`, `name=value`), ENV and
//! LABEL pairs (both the `KEY=value` and the legacy whitespace-separated
//! form), parser directive bodies (`key=value`), and instruction flags
//! (`--chown=user:group`). The children are, in order: an optional `--`
//! symbol, the key literal, an optional `=` symbol (legacy pairs use a
//! whitespace separator instead), and an optional value literal. A present
//! separator with an empty value literal models `name=` — distinct from a
//! bare `name`.

use std::fmt;

use crate::dockerfile::error::{Error, Result};
use crate::dockerfile::token::core::{write_tokens, SymbolToken, Token, WhitespaceToken};
use crate::dockerfile::token::literal::LiteralToken;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValueToken {
    tokens: Vec<Token>,
}

impl KeyValueToken {
    pub(crate) fn from_tokens(tokens: Vec<Token>) -> Self {
        KeyValueToken { tokens }
    }

    /// Builds `key=value`.
    pub fn create(key: impl Into<String>, value: impl Into<String>) -> Result<Self> {
        let key = key.into();
        if key.is_empty() {
            return Err(Error::InvalidArgument("key may not be empty".to_string()));
        }
        Ok(KeyValueToken {
            tokens: vec![
                Token::Literal(LiteralToken::create(key)),
                Token::Symbol(SymbolToken::new("=")),
                Token::Literal(LiteralToken::create(value.into())),
            ],
        })
    }

    /// Builds a bare `key` with no separator and no value.
    pub fn create_key_only(key: impl Into<String>) -> Result<Self> {
        let key = key.into();
        if key.is_empty() {
            return Err(Error::InvalidArgument("key may not be empty".to_string()));
        }
        Ok(KeyValueToken {
            tokens: vec![Token::Literal(LiteralToken::create(key))],
        })
    }

    /// Builds `--name=value`.
    pub fn create_flag(name: impl Into<String>, value: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::InvalidArgument(
                "flag name may not be empty".to_string(),
            ));
        }
        Ok(KeyValueToken {
            tokens: vec![
                Token::Symbol(SymbolToken::new("--")),
                Token::Literal(LiteralToken::create(name)),
                Token::Symbol(SymbolToken::new("=")),
                Token::Literal(LiteralToken::create(value.into())),
            ],
        })
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn tokens_mut(&mut self) -> &mut Vec<Token> {
        &mut self.tokens
    }

    /// True for `--name=value` style flags.
    pub fn is_flag(&self) -> bool {
        matches!(self.tokens.first(), Some(Token::Symbol(s)) if s.value() == "--")
    }

    fn literals(&self) -> impl Iterator<Item = &LiteralToken> {
        self.tokens.iter().filter_map(|t| t.as_literal())
    }

    /// The key text (flag name without the leading `--`).
    pub fn key(&self) -> String {
        self.literals()
            .next()
            .map(|lit| lit.value())
            .unwrap_or_default()
    }

    pub fn key_literal(&self) -> Option<&LiteralToken> {
        self.literals().next()
    }

    /// `None` for a bare key; `Some("")` for `key=` with an empty value.
    pub fn value(&self) -> Option<String> {
        if self.has_separator() {
            Some(
                self.literals()
                    .nth(1)
                    .map(|lit| lit.value())
                    .unwrap_or_default(),
            )
        } else {
            None
        }
    }

    pub fn value_literal(&self) -> Option<&LiteralToken> {
        if self.has_separator() {
            self.literals().nth(1)
        } else {
            None
        }
    }

    pub fn value_literal_mut(&mut self) -> Option<&mut LiteralToken> {
        if !self.has_separator() {
            return None;
        }
        self.tokens
            .iter_mut()
            .filter_map(|t| t.as_literal_mut())
            .nth(1)
    }

    /// Sets the value text, adding a `=` separator and value literal if the
    /// pair was a bare key.
    pub fn set_value(&mut self, value: impl Into<String>) {
        let value = value.into();
        if let Some(lit) = self.value_literal_mut() {
            lit.set_value(value);
            return;
        }
        self.tokens.push(Token::Symbol(SymbolToken::new("=")));
        self.tokens
            .push(Token::Literal(LiteralToken::create(value)));
    }

    fn has_separator(&self) -> bool {
        let mut saw_key = false;
        for token in &self.tokens {
            match token {
                Token::Literal(_) if !saw_key => saw_key = true,
                // Second literal reached with no separator in between: the
                // pair has no value side at all (should not happen in
                // practice, but keeps the scan honest).
                Token::Literal(_) => return false,
                Token::Symbol(s) if saw_key && s.value() == "=" => return true,
                Token::Whitespace(_) if saw_key => return true,
                _ => {}
            }
        }
        false
    }

    /// Builds the legacy whitespace-separated form (`KEY value`).
    pub fn create_legacy(key: impl Into<String>, value: impl Into<String>) -> Result<Self> {
        let key = key.into();
        if key.is_empty() {
            return Err(Error::InvalidArgument("key may not be empty".to_string()));
        }
        Ok(KeyValueToken {
            tokens: vec![
                Token::Literal(LiteralToken::create(key)),
                Token::Whitespace(WhitespaceToken::space()),
                Token::Literal(LiteralToken::create(value.into())),
            ],
        })
    }
}

impl fmt::Display for KeyValueToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_tokens(&self.tokens, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_pair() {
        let kv = KeyValueToken::create("VERSION", "1.0").unwrap();
        assert_eq!(kv.to_string(), "VERSION=1.0");
        assert_eq!(kv.key(), "VERSION");
        assert_eq!(kv.value(), Some("1.0".to_string()));
    }

    #[test]
    fn test_bare_key_has_no_value() {
        let kv = KeyValueToken::create_key_only("NAME").unwrap();
        assert_eq!(kv.to_string(), "NAME");
        assert_eq!(kv.value(), None);
    }

    #[test]
    fn test_empty_value_is_distinct_from_absent() {
        let kv = KeyValueToken::create("NAME", "").unwrap();
        assert_eq!(kv.to_string(), "NAME=");
        assert_eq!(kv.value(), Some(String::new()));
    }

    #[test]
    fn test_flag() {
        let kv = KeyValueToken::create_flag("chown", "app:app").unwrap();
        assert_eq!(kv.to_string(), "--chown=app:app");
        assert!(kv.is_flag());
        assert_eq!(kv.key(), "chown");
        assert_eq!(kv.value(), Some("app:app".to_string()));
    }

    #[test]
    fn test_set_value_on_bare_key_adds_separator() {
        let mut kv = KeyValueToken::create_key_only("NAME").unwrap();
        kv.set_value("x");
        assert_eq!(kv.to_string(), "NAME=x");
    }

    #[test]
    fn test_legacy_form() {
        let kv = KeyValueToken::create_legacy("PATH", "/usr/bin").unwrap();
        assert_eq!(kv.to_string(), "PATH /usr/bin");
        assert_eq!(kv.value(), Some("/usr/bin".to_string()));
    }
}

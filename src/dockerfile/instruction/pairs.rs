//! The ENV and LABEL instructions: one or more key/value pairs, in either the
//! `KEY=value` form (repeatable) or the legacy whitespace-separated form
//! (one pair, value running to the end of the line).

use std::fmt;

use crate::dockerfile::error::Result;
use crate::dockerfile::instruction::splice;
use crate::dockerfile::token::core::{write_tokens, KeywordToken, Token, WhitespaceToken};
use crate::dockerfile::token::keyvalue::KeyValueToken;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairsInstruction {
    tokens: Vec<Token>,
}

impl PairsInstruction {
    pub(crate) fn from_tokens(tokens: Vec<Token>) -> Self {
        PairsInstruction { tokens }
    }

    /// Builds `<KEYWORD> <key>=<value>`.
    pub fn create(
        keyword: &str,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<Self> {
        let pair = KeyValueToken::create(key, value)?;
        Ok(PairsInstruction {
            tokens: vec![
                Token::Keyword(KeywordToken::new(keyword)),
                Token::Whitespace(WhitespaceToken::space()),
                Token::KeyValue(pair),
            ],
        })
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub(crate) fn tokens_mut(&mut self) -> &mut Vec<Token> {
        &mut self.tokens
    }

    pub fn keyword(&self) -> Result<&KeywordToken> {
        splice::keyword(&self.tokens)
    }

    /// All pairs in source order. The legacy form always has a value, so
    /// unlike ARG declarations the value side is never absent.
    pub fn pairs(&self) -> Vec<(String, String)> {
        splice::key_values(&self.tokens)
            .into_iter()
            .map(|kv| (kv.key(), kv.value().unwrap_or_default()))
            .collect()
    }

    pub(crate) fn pair_tokens(&self) -> Vec<&KeyValueToken> {
        splice::key_values(&self.tokens)
    }

    /// The value of the named key, if any pair declares it.
    pub fn value(&self, key: &str) -> Option<String> {
        splice::key_values(&self.tokens)
            .into_iter()
            .find(|kv| kv.key() == key)
            .and_then(|kv| kv.value())
    }

    /// Updates the named pair in place, or appends `<key>=<value>` when the
    /// key is not declared yet.
    pub fn set_pair(&mut self, key: impl Into<String>, value: impl Into<String>) -> Result<()> {
        let key = key.into();
        let value = value.into();
        for token in &mut self.tokens {
            if let Token::KeyValue(kv) = token {
                if kv.key() == key {
                    kv.set_value(value);
                    return Ok(());
                }
            }
        }
        let pair = KeyValueToken::create(key, value)?;
        self.tokens.push(Token::Whitespace(WhitespaceToken::space()));
        self.tokens.push(Token::KeyValue(pair));
        Ok(())
    }
}

impl fmt::Display for PairsInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_tokens(&self.tokens, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create() {
        let env = PairsInstruction::create("ENV", "PATH", "/usr/bin").unwrap();
        assert_eq!(env.to_string(), "ENV PATH=/usr/bin");
        assert_eq!(env.pairs(), vec![("PATH".to_string(), "/usr/bin".to_string())]);
    }

    #[test]
    fn test_set_pair_updates_or_appends() {
        let mut env = PairsInstruction::create("ENV", "A", "1").unwrap();
        env.set_pair("A", "2").unwrap();
        assert_eq!(env.to_string(), "ENV A=2");
        env.set_pair("B", "3").unwrap();
        assert_eq!(env.to_string(), "ENV A=2 B=3");
        assert_eq!(env.value("B"), Some("3".to_string()));
    }
}

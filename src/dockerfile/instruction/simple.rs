//! Single-value instructions: WORKDIR, USER, STOPSIGNAL, and the deprecated
//! MAINTAINER. Which keyword it is lives in the [`Instruction`] variant
//! wrapping this node.
//!
//! [`Instruction`]: crate::dockerfile::instruction::Instruction

use std::fmt;

use crate::dockerfile::error::{Error, Result};
use crate::dockerfile::instruction::splice;
use crate::dockerfile::token::core::{write_tokens, KeywordToken, Token, WhitespaceToken};
use crate::dockerfile::token::literal::LiteralToken;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleInstruction {
    tokens: Vec<Token>,
}

impl SimpleInstruction {
    pub(crate) fn from_tokens(tokens: Vec<Token>) -> Self {
        SimpleInstruction { tokens }
    }

    /// Builds `<KEYWORD> <value>`.
    pub fn create(keyword: &str, value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        if value.is_empty() {
            return Err(Error::InvalidArgument(
                "value may not be empty".to_string(),
            ));
        }
        Ok(SimpleInstruction {
            tokens: vec![
                Token::Keyword(KeywordToken::new(keyword)),
                Token::Whitespace(WhitespaceToken::space()),
                Token::Literal(LiteralToken::create(value)),
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

    /// The argument text (with any variable references unresolved).
    pub fn value(&self) -> String {
        self.tokens
            .iter()
            .find_map(|t| t.as_literal())
            .map(|lit| lit.value())
            .unwrap_or_default()
    }

    pub fn set_value(&mut self, value: impl Into<String>) -> Result<()> {
        let value = value.into();
        if value.is_empty() {
            return Err(Error::InvalidArgument(
                "value may not be empty".to_string(),
            ));
        }
        let keyword = self.keyword()?.value().to_string();
        match splice::first_literal_mut(&mut self.tokens) {
            Some(lit) => {
                lit.set_value(value);
                Ok(())
            }
            None => Err(Error::InvalidState(format!(
                "{} instruction has no value literal",
                keyword
            ))),
        }
    }
}

impl fmt::Display for SimpleInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_tokens(&self.tokens, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_set_value() {
        let mut workdir = SimpleInstruction::create("WORKDIR", "/app").unwrap();
        assert_eq!(workdir.to_string(), "WORKDIR /app");
        assert_eq!(workdir.value(), "/app");
        workdir.set_value("/srv").unwrap();
        assert_eq!(workdir.to_string(), "WORKDIR /srv");
    }

    #[test]
    fn test_empty_value_rejected() {
        assert!(SimpleInstruction::create("USER", "").is_err());
        let mut user = SimpleInstruction::create("USER", "app").unwrap();
        assert!(user.set_value("").is_err());
        assert_eq!(user.value(), "app");
    }
}

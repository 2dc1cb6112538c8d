//! The ARG instruction: one or more whitespace-separated declarations, each
//! `name`, `name=` (empty default, distinct from absent), or `name=value`.

use std::fmt;

use crate::dockerfile::error::{Error, Result};
use crate::dockerfile::instruction::splice;
use crate::dockerfile::token::core::{write_tokens, KeywordToken, Token, WhitespaceToken};
use crate::dockerfile::token::keyvalue::KeyValueToken;

/// An owned snapshot of a single declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgDeclaration {
    pub name: String,
    /// `None` for `name`, `Some("")` for `name=`, `Some(v)` for `name=v`.
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgInstruction {
    tokens: Vec<Token>,
}

impl ArgInstruction {
    pub(crate) fn from_tokens(tokens: Vec<Token>) -> Self {
        ArgInstruction { tokens }
    }

    /// Builds `ARG <name>` or `ARG <name>=<value>`.
    pub fn create(name: impl Into<String>, value: Option<&str>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::InvalidArgument("name may not be empty".to_string()));
        }
        let declaration = match value {
            Some(value) => KeyValueToken::create(name, value)?,
            None => KeyValueToken::create_key_only(name)?,
        };
        Ok(ArgInstruction {
            tokens: vec![
                Token::Keyword(KeywordToken::new("ARG")),
                Token::Whitespace(WhitespaceToken::space()),
                Token::KeyValue(declaration),
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

    /// All declarations in source order.
    pub fn declarations(&self) -> Vec<ArgDeclaration> {
        splice::key_values(&self.tokens)
            .into_iter()
            .map(|kv| ArgDeclaration {
                name: kv.key(),
                value: kv.value(),
            })
            .collect()
    }

    pub(crate) fn declaration_tokens(&self) -> Vec<&KeyValueToken> {
        splice::key_values(&self.tokens)
    }
}

impl fmt::Display for ArgInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_tokens(&self.tokens, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_forms() {
        assert_eq!(
            ArgInstruction::create("VERSION", None).unwrap().to_string(),
            "ARG VERSION"
        );
        assert_eq!(
            ArgInstruction::create("VERSION", Some("1.0"))
                .unwrap()
                .to_string(),
            "ARG VERSION=1.0"
        );
        assert_eq!(
            ArgInstruction::create("VERSION", Some(""))
                .unwrap()
                .to_string(),
            "ARG VERSION="
        );
    }

    #[test]
    fn test_declarations_distinguish_empty_from_absent() {
        let bare = ArgInstruction::create("A", None).unwrap();
        assert_eq!(bare.declarations()[0].value, None);
        let empty = ArgInstruction::create("A", Some("")).unwrap();
        assert_eq!(empty.declarations()[0].value, Some(String::new()));
    }
}

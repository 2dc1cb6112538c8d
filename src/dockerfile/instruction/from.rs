//! The FROM instruction: optional `--platform=` flag, an image reference,
//! and an optional `AS <stage-name>` clause.

use std::fmt;

use crate::dockerfile::error::{Error, Result};
use crate::dockerfile::instruction::image::ImageName;
use crate::dockerfile::instruction::splice;
use crate::dockerfile::token::core::{write_tokens, KeywordToken, Token, WhitespaceToken};
use crate::dockerfile::token::literal::{IdentifierToken, LiteralToken};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FromInstruction {
    tokens: Vec<Token>,
}

impl FromInstruction {
    pub(crate) fn from_tokens(tokens: Vec<Token>) -> Self {
        FromInstruction { tokens }
    }

    /// Builds `FROM <image>`.
    pub fn create(image: impl Into<String>) -> Result<Self> {
        let image = image.into();
        if image.is_empty() {
            return Err(Error::InvalidArgument(
                "image may not be empty".to_string(),
            ));
        }
        Ok(FromInstruction {
            tokens: vec![
                Token::Keyword(KeywordToken::new("FROM")),
                Token::Whitespace(WhitespaceToken::space()),
                Token::Literal(LiteralToken::create(image)),
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

    /// The image reference text (with any variable references unresolved).
    pub fn image(&self) -> String {
        self.image_literal().map(|lit| lit.value()).unwrap_or_default()
    }

    pub fn set_image(&mut self, image: impl Into<String>) -> Result<()> {
        let image = image.into();
        if image.is_empty() {
            return Err(Error::InvalidArgument(
                "image may not be empty".to_string(),
            ));
        }
        match splice::first_literal_mut(&mut self.tokens) {
            Some(lit) => {
                lit.set_value(image);
                Ok(())
            }
            None => Err(Error::InvalidState(
                "FROM instruction has no image literal".to_string(),
            )),
        }
    }

    /// The image reference parsed into registry/repository/tag/digest.
    pub fn image_name(&self) -> Result<ImageName> {
        ImageName::parse(&self.image())
    }

    pub fn set_image_name(&mut self, image: &ImageName) -> Result<()> {
        self.set_image(image.to_string())
    }

    pub fn platform(&self) -> Option<String> {
        splice::flag_value(&self.tokens, "platform")
    }

    /// Sets or clears the `--platform=` flag, inserting or removing the flag
    /// and its adjoining space as needed.
    pub fn set_platform(&mut self, platform: Option<&str>) -> Result<()> {
        match platform {
            Some(value) => {
                if value.is_empty() {
                    return Err(Error::InvalidArgument(
                        "platform may not be empty".to_string(),
                    ));
                }
                let insert_at = splice::first_literal_index(&self.tokens).ok_or_else(|| {
                    Error::InvalidState("FROM instruction has no image literal".to_string())
                })?;
                splice::set_flag(&mut self.tokens, "platform", value, insert_at)?;
                Ok(())
            }
            None => {
                splice::remove_flag(&mut self.tokens, "platform");
                Ok(())
            }
        }
    }

    pub fn stage_name(&self) -> Option<String> {
        self.tokens.iter().find_map(|t| match t {
            Token::Identifier(id) => Some(id.value().to_string()),
            _ => None,
        })
    }

    /// Sets or clears the `AS <name>` clause.
    pub fn set_stage_name(&mut self, name: Option<&str>) -> Result<()> {
        match name {
            Some(name) => {
                let identifier = IdentifierToken::new(name)?;
                for token in &mut self.tokens {
                    if let Token::Identifier(existing) = token {
                        *existing = identifier;
                        return Ok(());
                    }
                }
                let image_at = splice::first_literal_index(&self.tokens).ok_or_else(|| {
                    Error::InvalidState("FROM instruction has no image literal".to_string())
                })?;
                let clause = vec![
                    Token::Whitespace(WhitespaceToken::space()),
                    Token::Keyword(KeywordToken::new("AS")),
                    Token::Whitespace(WhitespaceToken::space()),
                    Token::Identifier(identifier),
                ];
                self.tokens.splice(image_at + 1..image_at + 1, clause);
                Ok(())
            }
            None => {
                let as_at = self
                    .tokens
                    .iter()
                    .position(|t| matches!(t, Token::Keyword(kw) if kw.matches("AS")));
                let id_at = self
                    .tokens
                    .iter()
                    .position(|t| matches!(t, Token::Identifier(_)));
                if let (Some(as_at), Some(id_at)) = (as_at, id_at) {
                    let start =
                        if as_at > 0 && self.tokens[as_at - 1].is_whitespace() {
                            as_at - 1
                        } else {
                            as_at
                        };
                    self.tokens.drain(start..=id_at);
                }
                Ok(())
            }
        }
    }

    fn image_literal(&self) -> Option<&LiteralToken> {
        self.tokens.iter().find_map(|t| t.as_literal())
    }
}

impl fmt::Display for FromInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_tokens(&self.tokens, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create() {
        let from = FromInstruction::create("scratch").unwrap();
        assert_eq!(from.to_string(), "FROM scratch");
        assert_eq!(from.image(), "scratch");
        assert_eq!(from.platform(), None);
        assert_eq!(from.stage_name(), None);
    }

    #[test]
    fn test_set_platform_inserts_and_removes() {
        let mut from = FromInstruction::create("alpine").unwrap();
        from.set_platform(Some("linux/arm64")).unwrap();
        assert_eq!(from.to_string(), "FROM --platform=linux/arm64 alpine");
        from.set_platform(None).unwrap();
        assert_eq!(from.to_string(), "FROM alpine");
    }

    #[test]
    fn test_set_stage_name_inserts_and_removes() {
        let mut from = FromInstruction::create("alpine").unwrap();
        from.set_stage_name(Some("builder")).unwrap();
        assert_eq!(from.to_string(), "FROM alpine AS builder");
        from.set_stage_name(Some("base")).unwrap();
        assert_eq!(from.to_string(), "FROM alpine AS base");
        from.set_stage_name(None).unwrap();
        assert_eq!(from.to_string(), "FROM alpine");
    }

    #[test]
    fn test_stage_name_must_be_identifier() {
        let mut from = FromInstruction::create("alpine").unwrap();
        assert!(from.set_stage_name(Some("2bad")).is_err());
        assert_eq!(from.to_string(), "FROM alpine");
    }
}

//! The COPY and ADD instructions: optional flags, then one or more sources
//! and a destination, in either the plain whitespace-separated form or the
//! bracketed string-array form (required when paths contain spaces).

use std::fmt;

use crate::dockerfile::error::{Error, Result};
use crate::dockerfile::instruction::splice;
use crate::dockerfile::token::core::{write_tokens, KeywordToken, Token, WhitespaceToken};
use crate::dockerfile::token::literal::LiteralToken;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyInstruction {
    tokens: Vec<Token>,
}

impl CopyInstruction {
    pub(crate) fn from_tokens(tokens: Vec<Token>) -> Self {
        CopyInstruction { tokens }
    }

    /// Builds `<KEYWORD> <source>... <destination>` in the plain form.
    pub fn create(keyword: &str, sources: &[&str], destination: &str) -> Result<Self> {
        if sources.is_empty() {
            return Err(Error::InvalidArgument(
                "at least one source is required".to_string(),
            ));
        }
        if destination.is_empty() {
            return Err(Error::InvalidArgument(
                "destination may not be empty".to_string(),
            ));
        }
        let mut tokens = vec![Token::Keyword(KeywordToken::new(keyword))];
        for source in sources {
            tokens.push(Token::Whitespace(WhitespaceToken::space()));
            tokens.push(Token::Literal(LiteralToken::create(*source)));
        }
        tokens.push(Token::Whitespace(WhitespaceToken::space()));
        tokens.push(Token::Literal(LiteralToken::create(destination)));
        Ok(CopyInstruction { tokens })
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

    /// True for the bracketed string-array form.
    pub fn is_string_array_form(&self) -> bool {
        self.tokens
            .iter()
            .any(|t| matches!(t, Token::Symbol(s) if s.value() == "["))
    }

    /// All path arguments but the last. Works for both forms, since flags are
    /// key/value tokens rather than literals.
    pub fn sources(&self) -> Vec<String> {
        let mut paths = splice::literal_values(&self.tokens);
        paths.pop();
        paths
    }

    /// The last path argument.
    pub fn destination(&self) -> Option<String> {
        splice::literal_values(&self.tokens).pop()
    }

    /// The stage name or image of the `--from=` flag.
    pub fn from_stage(&self) -> Option<String> {
        splice::flag_value(&self.tokens, "from")
    }

    pub fn chown(&self) -> Option<String> {
        splice::flag_value(&self.tokens, "chown")
    }

    pub fn chmod(&self) -> Option<String> {
        splice::flag_value(&self.tokens, "chmod")
    }

    pub fn set_from_stage(&mut self, stage: Option<&str>) -> Result<()> {
        self.set_flag("from", stage)
    }

    pub fn set_chown(&mut self, chown: Option<&str>) -> Result<()> {
        self.set_flag("chown", chown)
    }

    pub fn set_chmod(&mut self, chmod: Option<&str>) -> Result<()> {
        self.set_flag("chmod", chmod)
    }

    fn set_flag(&mut self, name: &str, value: Option<&str>) -> Result<()> {
        match value {
            Some(value) => {
                let keyword = self.keyword()?.value().to_string();
                let insert_at = self.arguments_start().ok_or_else(|| {
                    Error::InvalidState(format!("{} instruction has no path arguments", keyword))
                })?;
                splice::set_flag(&mut self.tokens, name, value, insert_at)
            }
            None => {
                splice::remove_flag(&mut self.tokens, name);
                Ok(())
            }
        }
    }

    /// Index of the first path argument: the first literal, or the opening
    /// bracket in the string-array form.
    fn arguments_start(&self) -> Option<usize> {
        self.tokens.iter().position(|t| {
            matches!(t, Token::Literal(_)) || matches!(t, Token::Symbol(s) if s.value() == "[")
        })
    }
}

impl fmt::Display for CopyInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_tokens(&self.tokens, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create() {
        let copy = CopyInstruction::create("COPY", &["a.txt", "b.txt"], "/dst/").unwrap();
        assert_eq!(copy.to_string(), "COPY a.txt b.txt /dst/");
        assert_eq!(copy.sources(), vec!["a.txt", "b.txt"]);
        assert_eq!(copy.destination(), Some("/dst/".to_string()));
    }

    #[test]
    fn test_set_flags() {
        let mut copy = CopyInstruction::create("COPY", &["app"], "/app").unwrap();
        copy.set_from_stage(Some("builder")).unwrap();
        assert_eq!(copy.to_string(), "COPY --from=builder app /app");
        copy.set_chown(Some("app:app")).unwrap();
        assert_eq!(copy.to_string(), "COPY --from=builder --chown=app:app app /app");
        copy.set_from_stage(None).unwrap();
        assert_eq!(copy.to_string(), "COPY --chown=app:app app /app");
        assert_eq!(copy.chown(), Some("app:app".to_string()));
        assert_eq!(copy.from_stage(), None);
    }

    #[test]
    fn test_create_requires_arguments() {
        assert!(CopyInstruction::create("COPY", &[], "/dst").is_err());
        assert!(CopyInstruction::create("COPY", &["a"], "").is_err());
    }
}

//! The EXPOSE instruction: one or more ports, each optionally suffixed with
//! `/tcp` or `/udp`.

use std::fmt;

use crate::dockerfile::error::{Error, Result};
use crate::dockerfile::instruction::splice;
use crate::dockerfile::token::core::{write_tokens, KeywordToken, Token, WhitespaceToken};
use crate::dockerfile::token::literal::LiteralToken;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExposeInstruction {
    tokens: Vec<Token>,
}

impl ExposeInstruction {
    pub(crate) fn from_tokens(tokens: Vec<Token>) -> Self {
        ExposeInstruction { tokens }
    }

    /// Builds `EXPOSE <port>[ <port>...]`.
    pub fn create(ports: &[&str]) -> Result<Self> {
        if ports.is_empty() {
            return Err(Error::InvalidArgument(
                "at least one port is required".to_string(),
            ));
        }
        let mut tokens = vec![Token::Keyword(KeywordToken::new("EXPOSE"))];
        for port in ports {
            if port.is_empty() {
                return Err(Error::InvalidArgument("port may not be empty".to_string()));
            }
            tokens.push(Token::Whitespace(WhitespaceToken::space()));
            tokens.push(Token::Literal(LiteralToken::create(*port)));
        }
        Ok(ExposeInstruction { tokens })
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

    /// All port specs as written (`8080`, `53/udp`, ...).
    pub fn ports(&self) -> Vec<String> {
        splice::literal_values(&self.tokens)
    }

    /// The number part of the first port spec.
    pub fn port(&self) -> Option<String> {
        self.ports()
            .first()
            .map(|spec| match spec.split_once('/') {
                Some((number, _)) => number.to_string(),
                None => spec.clone(),
            })
    }

    /// The protocol of the first port spec; `tcp` when unstated.
    pub fn protocol(&self) -> Option<String> {
        self.ports().first().map(|spec| match spec.split_once('/') {
            Some((_, protocol)) => protocol.to_string(),
            None => "tcp".to_string(),
        })
    }
}

impl fmt::Display for ExposeInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_tokens(&self.tokens, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_accessors() {
        let expose = ExposeInstruction::create(&["8080", "53/udp"]).unwrap();
        assert_eq!(expose.to_string(), "EXPOSE 8080 53/udp");
        assert_eq!(expose.keyword().unwrap().value(), "EXPOSE");
        assert_eq!(expose.ports(), vec!["8080", "53/udp"]);
        assert_eq!(expose.port(), Some("8080".to_string()));
        assert_eq!(expose.protocol(), Some("tcp".to_string()));
    }

    #[test]
    fn test_explicit_protocol() {
        let expose = ExposeInstruction::create(&["53/udp"]).unwrap();
        assert_eq!(expose.port(), Some("53".to_string()));
        assert_eq!(expose.protocol(), Some("udp".to_string()));
    }
}

//! Instructions kept only as parsed argument tokens: VOLUME and ONBUILD.
//! Their arguments round-trip and participate in variable resolution, but get
//! no dedicated accessors.

use std::fmt;

use crate::dockerfile::error::Result;
use crate::dockerfile::instruction::splice;
use crate::dockerfile::token::core::{write_tokens, KeywordToken, Token};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenericInstruction {
    tokens: Vec<Token>,
}

impl GenericInstruction {
    pub(crate) fn from_tokens(tokens: Vec<Token>) -> Self {
        GenericInstruction { tokens }
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

    /// The argument literals' logical values, in order.
    pub fn arguments(&self) -> Vec<String> {
        splice::literal_values(&self.tokens)
    }
}

impl fmt::Display for GenericInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_tokens(&self.tokens, f)
    }
}

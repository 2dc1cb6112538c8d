//! Variable reference tokens: `$NAME`, `${NAME}`, `${NAME<modifier><default>}`.

use std::fmt;

use crate::dockerfile::error::{Error, Result};
use crate::dockerfile::token::core::{write_tokens, StringToken, SymbolToken, Token};
use crate::dockerfile::token::literal::LiteralToken;

/// The POSIX-shell-style parameter expansion modifiers.
///
/// The plain forms (`-`, `+`, `?`) test presence only; the `:`-prefixed forms
/// additionally treat a present-but-empty value as unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modifier {
    /// `-`: use the default if the variable is unset.
    DefaultIfUnset,
    /// `:-`: use the default if the variable is unset or empty.
    DefaultIfUnsetOrEmpty,
    /// `+`: use the alternate value if the variable is set.
    ValueIfSet,
    /// `:+`: use the alternate value if the variable is set and non-empty.
    ValueIfSetNonEmpty,
    /// `?`: error if the variable is unset.
    ErrorIfUnset,
    /// `:?`: error if the variable is unset or empty.
    ErrorIfUnsetOrEmpty,
}

impl Modifier {
    pub fn symbol(&self) -> &'static str {
        match self {
            Modifier::DefaultIfUnset => "-",
            Modifier::DefaultIfUnsetOrEmpty => ":-",
            Modifier::ValueIfSet => "+",
            Modifier::ValueIfSetNonEmpty => ":+",
            Modifier::ErrorIfUnset => "?",
            Modifier::ErrorIfUnsetOrEmpty => ":?",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Modifier> {
        match symbol {
            "-" => Some(Modifier::DefaultIfUnset),
            ":-" => Some(Modifier::DefaultIfUnsetOrEmpty),
            "+" => Some(Modifier::ValueIfSet),
            ":+" => Some(Modifier::ValueIfSetNonEmpty),
            "?" => Some(Modifier::ErrorIfUnset),
            ":?" => Some(Modifier::ErrorIfUnsetOrEmpty),
            _ => None,
        }
    }

    /// Whether a present-but-empty binding counts as unset for this modifier.
    pub fn empty_counts_as_unset(&self) -> bool {
        matches!(
            self,
            Modifier::DefaultIfUnsetOrEmpty
                | Modifier::ValueIfSetNonEmpty
                | Modifier::ErrorIfUnsetOrEmpty
        )
    }
}

/// A variable reference inside a literal.
///
/// Children hold the exact source text (`$`, braces, name, modifier symbol,
/// default-value literal); `braced` and `modifier` classify the form so the
/// resolver does not re-parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableRefToken {
    tokens: Vec<Token>,
    braced: bool,
    modifier: Option<Modifier>,
}

impl VariableRefToken {
    pub(crate) fn from_tokens(
        tokens: Vec<Token>,
        braced: bool,
        modifier: Option<Modifier>,
    ) -> Self {
        VariableRefToken {
            tokens,
            braced,
            modifier,
        }
    }

    /// Builds a bare `$name` reference.
    pub fn create(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        validate_variable_name(&name)?;
        Ok(VariableRefToken {
            tokens: vec![
                Token::Symbol(SymbolToken::new("$")),
                Token::String(StringToken::new(name)),
            ],
            braced: false,
            modifier: None,
        })
    }

    /// Builds `${name<modifier><default>}`.
    pub fn create_with_modifier(
        name: impl Into<String>,
        modifier: Modifier,
        default_value: LiteralToken,
    ) -> Result<Self> {
        let name = name.into();
        validate_variable_name(&name)?;
        Ok(VariableRefToken {
            tokens: vec![
                Token::Symbol(SymbolToken::new("$")),
                Token::Symbol(SymbolToken::new("{")),
                Token::String(StringToken::new(name)),
                Token::Symbol(SymbolToken::new(modifier.symbol())),
                Token::Literal(default_value),
                Token::Symbol(SymbolToken::new("}")),
            ],
            braced: true,
            modifier: Some(modifier),
        })
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn braced(&self) -> bool {
        self.braced
    }

    pub fn modifier(&self) -> Option<Modifier> {
        self.modifier
    }

    /// The referenced variable's name.
    pub fn name(&self) -> String {
        self.tokens
            .iter()
            .find_map(|t| match t {
                Token::String(s) => Some(s.value().to_string()),
                _ => None,
            })
            .unwrap_or_default()
    }

    /// The default-value subtree, present exactly when a modifier is present.
    pub fn default_value(&self) -> Option<&LiteralToken> {
        self.tokens.iter().find_map(|t| t.as_literal())
    }
}

impl fmt::Display for VariableRefToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_tokens(&self.tokens, f)
    }
}

pub(crate) fn is_variable_name_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

pub(crate) fn is_variable_name_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

fn validate_variable_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => is_variable_name_start(first) && chars.all(is_variable_name_char),
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidArgument(format!(
            "not a valid variable name: {:?}",
            name
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_reference_serialization() {
        let var = VariableRefToken::create("TAG").unwrap();
        assert_eq!(var.to_string(), "$TAG");
        assert_eq!(var.name(), "TAG");
        assert_eq!(var.modifier(), None);
        assert!(var.default_value().is_none());
    }

    #[test]
    fn test_modifier_reference_serialization() {
        let var = VariableRefToken::create_with_modifier(
            "TAG",
            Modifier::DefaultIfUnsetOrEmpty,
            LiteralToken::create("latest"),
        )
        .unwrap();
        assert_eq!(var.to_string(), "${TAG:-latest}");
        assert_eq!(var.modifier(), Some(Modifier::DefaultIfUnsetOrEmpty));
        assert_eq!(var.default_value().unwrap().value(), "latest");
    }

    #[test]
    fn test_modifier_symbols_round_trip() {
        for symbol in ["-", ":-", "+", ":+", "?", ":?"] {
            let modifier = Modifier::from_symbol(symbol).unwrap();
            assert_eq!(modifier.symbol(), symbol);
        }
        assert_eq!(Modifier::from_symbol(":"), None);
    }

    #[test]
    fn test_invalid_names_rejected() {
        assert!(VariableRefToken::create("1abc").is_err());
        assert!(VariableRefToken::create("").is_err());
        assert!(VariableRefToken::create("a-b").is_err());
        assert!(VariableRefToken::create("_ok9").is_ok());
    }
}

//! Shared token-splicing helpers for instruction setters.
//!
//! Setters that add or remove optional pieces (flags, clauses) must keep the
//! output syntactically valid while touching the smallest possible span, so
//! insertion and removal always manage the single adjoining whitespace token
//! alongside the piece itself.

use crate::dockerfile::error::{Error, Result};
use crate::dockerfile::token::core::{KeywordToken, Token, WhitespaceToken};
use crate::dockerfile::token::keyvalue::KeyValueToken;
use crate::dockerfile::token::literal::LiteralToken;

/// The instruction-name keyword. Every instruction node is constructed with
/// one, either by the grammar or by a `create` factory; a node whose tokens
/// have been edited into a keyword-less state reports it as an error.
pub(crate) fn keyword(tokens: &[Token]) -> Result<&KeywordToken> {
    tokens
        .iter()
        .find_map(|t| t.as_keyword())
        .ok_or_else(|| Error::InvalidState("instruction has no keyword token".to_string()))
}

pub(crate) fn first_literal_index(tokens: &[Token]) -> Option<usize> {
    tokens.iter().position(|t| matches!(t, Token::Literal(_)))
}

pub(crate) fn first_literal_mut(tokens: &mut [Token]) -> Option<&mut LiteralToken> {
    tokens.iter_mut().find_map(|t| t.as_literal_mut())
}

pub(crate) fn literal_values(tokens: &[Token]) -> Vec<String> {
    tokens
        .iter()
        .filter_map(|t| t.as_literal())
        .map(|lit| lit.value())
        .collect()
}

pub(crate) fn key_values(tokens: &[Token]) -> Vec<&KeyValueToken> {
    tokens.iter().filter_map(|t| t.as_key_value()).collect()
}

fn flag_index(tokens: &[Token], name: &str) -> Option<usize> {
    tokens.iter().position(
        |t| matches!(t, Token::KeyValue(kv) if kv.is_flag() && kv.key().eq_ignore_ascii_case(name)),
    )
}

/// The value of the named `--flag`, if present.
pub(crate) fn flag_value(tokens: &[Token], name: &str) -> Option<String> {
    tokens.iter().find_map(|t| match t {
        Token::KeyValue(kv) if kv.is_flag() && kv.key().eq_ignore_ascii_case(name) => kv.value(),
        _ => None,
    })
}

/// Updates the named flag in place, or inserts `--name=value ` at `insert_at`
/// when absent.
pub(crate) fn set_flag(
    tokens: &mut Vec<Token>,
    name: &str,
    value: &str,
    insert_at: usize,
) -> Result<()> {
    if let Some(at) = flag_index(tokens, name) {
        if let Token::KeyValue(kv) = &mut tokens[at] {
            kv.set_value(value);
        }
        return Ok(());
    }
    let flag = KeyValueToken::create_flag(name, value)?;
    tokens.splice(
        insert_at..insert_at,
        [
            Token::KeyValue(flag),
            Token::Whitespace(WhitespaceToken::space()),
        ],
    );
    Ok(())
}

/// Removes the named flag and its adjoining whitespace, if present.
pub(crate) fn remove_flag(tokens: &mut Vec<Token>, name: &str) {
    if let Some(at) = flag_index(tokens, name) {
        tokens.remove(at);
        if at < tokens.len() && tokens[at].is_whitespace() {
            tokens.remove(at);
        } else if at > 0 && tokens[at - 1].is_whitespace() {
            tokens.remove(at - 1);
        }
    }
}

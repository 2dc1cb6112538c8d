//! The HEALTHCHECK instruction: either `HEALTHCHECK NONE`, or timing flags
//! followed by `CMD <command>` in either command form.

use std::fmt;

use crate::dockerfile::error::{Error, Result};
use crate::dockerfile::instruction::command::Command;
use crate::dockerfile::instruction::splice;
use crate::dockerfile::token::core::{write_tokens, KeywordToken, Token, WhitespaceToken};

/// What follows the flags: a disable marker or a checked command. The token
/// vectors hold the `NONE` keyword, or the `CMD` keyword and the gap before
/// the command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthcheckBody {
    Disabled(Vec<Token>),
    Command { prelude: Vec<Token>, command: Command },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthcheckInstruction {
    head: Vec<Token>,
    body: HealthcheckBody,
    trail: Vec<Token>,
}

impl HealthcheckInstruction {
    pub(crate) fn from_parts(head: Vec<Token>, body: HealthcheckBody, trail: Vec<Token>) -> Self {
        HealthcheckInstruction { head, body, trail }
    }

    /// Builds `HEALTHCHECK CMD <command>`.
    pub fn create(command: Command) -> Self {
        HealthcheckInstruction {
            head: vec![
                Token::Keyword(KeywordToken::new("HEALTHCHECK")),
                Token::Whitespace(WhitespaceToken::space()),
            ],
            body: HealthcheckBody::Command {
                prelude: vec![
                    Token::Keyword(KeywordToken::new("CMD")),
                    Token::Whitespace(WhitespaceToken::space()),
                ],
                command,
            },
            trail: Vec::new(),
        }
    }

    /// Builds `HEALTHCHECK NONE`.
    pub fn create_disabled() -> Self {
        HealthcheckInstruction {
            head: vec![
                Token::Keyword(KeywordToken::new("HEALTHCHECK")),
                Token::Whitespace(WhitespaceToken::space()),
            ],
            body: HealthcheckBody::Disabled(vec![Token::Keyword(KeywordToken::new("NONE"))]),
            trail: Vec::new(),
        }
    }

    pub fn keyword(&self) -> Result<&KeywordToken> {
        self.head.iter().find_map(|t| t.as_keyword()).ok_or_else(|| {
            Error::InvalidState("healthcheck instruction has no keyword token".to_string())
        })
    }

    pub fn is_disabled(&self) -> bool {
        matches!(self.body, HealthcheckBody::Disabled(_))
    }

    pub fn body(&self) -> &HealthcheckBody {
        &self.body
    }

    pub fn command(&self) -> Option<&Command> {
        match &self.body {
            HealthcheckBody::Command { command, .. } => Some(command),
            HealthcheckBody::Disabled(_) => None,
        }
    }

    /// Replaces the checked command, turning a disabled check back on.
    pub fn set_command(&mut self, command: Command) {
        match &mut self.body {
            HealthcheckBody::Command {
                command: existing, ..
            } => *existing = command,
            HealthcheckBody::Disabled(_) => {
                self.body = HealthcheckBody::Command {
                    prelude: vec![
                        Token::Keyword(KeywordToken::new("CMD")),
                        Token::Whitespace(WhitespaceToken::space()),
                    ],
                    command,
                };
            }
        }
    }

    /// Disables the check, dropping any flags and command.
    pub fn disable(&mut self) {
        self.body = HealthcheckBody::Disabled(vec![Token::Keyword(KeywordToken::new("NONE"))]);
        self.head.retain(|t| !matches!(t, Token::KeyValue(_)));
        self.collapse_head_whitespace();
    }

    pub fn interval(&self) -> Option<String> {
        splice::flag_value(&self.head, "interval")
    }

    pub fn timeout(&self) -> Option<String> {
        splice::flag_value(&self.head, "timeout")
    }

    pub fn start_period(&self) -> Option<String> {
        splice::flag_value(&self.head, "start-period")
    }

    pub fn retries(&self) -> Option<String> {
        splice::flag_value(&self.head, "retries")
    }

    pub fn set_interval(&mut self, interval: Option<&str>) -> Result<()> {
        self.set_flag("interval", interval)
    }

    pub fn set_timeout(&mut self, timeout: Option<&str>) -> Result<()> {
        self.set_flag("timeout", timeout)
    }

    pub fn set_start_period(&mut self, start_period: Option<&str>) -> Result<()> {
        self.set_flag("start-period", start_period)
    }

    pub fn set_retries(&mut self, retries: Option<&str>) -> Result<()> {
        self.set_flag("retries", retries)
    }

    /// The tokens before the body: keyword, whitespace, and flags.
    pub fn head(&self) -> &[Token] {
        &self.head
    }

    pub fn trail(&self) -> &[Token] {
        &self.trail
    }

    pub(crate) fn parts_mut(
        &mut self,
    ) -> (&mut Vec<Token>, &mut HealthcheckBody, &mut Vec<Token>) {
        (&mut self.head, &mut self.body, &mut self.trail)
    }

    fn set_flag(&mut self, name: &str, value: Option<&str>) -> Result<()> {
        match value {
            Some(value) => {
                if self.is_disabled() {
                    return Err(Error::InvalidState(
                        "a disabled healthcheck takes no flags".to_string(),
                    ));
                }
                let insert_at = self.head.len();
                splice::set_flag(&mut self.head, name, value, insert_at)
            }
            None => {
                splice::remove_flag(&mut self.head, name);
                Ok(())
            }
        }
    }

    fn collapse_head_whitespace(&mut self) {
        let mut previous_was_whitespace = false;
        self.head.retain(|t| {
            let keep = !(t.is_whitespace() && previous_was_whitespace);
            previous_was_whitespace = t.is_whitespace();
            keep
        });
    }
}

impl fmt::Display for HealthcheckInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_tokens(&self.head, f)?;
        match &self.body {
            HealthcheckBody::Disabled(tokens) => write_tokens(tokens, f)?,
            HealthcheckBody::Command { prelude, command } => {
                write_tokens(prelude, f)?;
                command.fmt(f)?;
            }
        }
        write_tokens(&self.trail, f)
    }
}

//! Commands (exec form and shell form) and the shared node for the
//! command-bearing instructions RUN, CMD, ENTRYPOINT, and SHELL.
//!
//! Exec form is the bracketed, comma-delimited, double-quoted string array
//! (`["/bin/sh", "-c", "echo hi"]`); shell form is free text running to the
//! end of the logical instruction, collapsed into a single literal that keeps
//! any embedded comments and line continuations as children.

use std::fmt;

use crate::dockerfile::combinators::Cursor;
use crate::dockerfile::error::{Error, Result};
use crate::dockerfile::grammar;
use crate::dockerfile::token::core::{
    write_tokens, KeywordToken, StringToken, SymbolToken, Token, WhitespaceToken,
};
use crate::dockerfile::token::keyvalue::KeyValueToken;
use crate::dockerfile::token::literal::LiteralToken;

/// Either form of a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Exec(ExecFormCommand),
    Shell(ShellFormCommand),
}

impl Command {
    /// A shell-form command from plain text.
    pub fn shell(text: impl Into<String>) -> Result<Command> {
        Ok(Command::Shell(ShellFormCommand::create(text)?))
    }

    /// An exec-form command from its string values.
    pub fn exec(values: &[&str]) -> Command {
        Command::Exec(ExecFormCommand::create(values))
    }

    pub fn tokens(&self) -> &[Token] {
        match self {
            Command::Exec(cmd) => cmd.tokens(),
            Command::Shell(cmd) => cmd.tokens(),
        }
    }

    pub(crate) fn tokens_mut(&mut self) -> &mut Vec<Token> {
        match self {
            Command::Exec(cmd) => &mut cmd.tokens,
            Command::Shell(cmd) => &mut cmd.tokens,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Exec(cmd) => cmd.fmt(f),
            Command::Shell(cmd) => cmd.fmt(f),
        }
    }
}

/// A bracketed string-array command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecFormCommand {
    pub(crate) tokens: Vec<Token>,
}

impl ExecFormCommand {
    pub(crate) fn from_tokens(tokens: Vec<Token>) -> Self {
        ExecFormCommand { tokens }
    }

    /// Parses a standalone exec-form array, e.g. `["/bin/sh", "-c"]`.
    pub fn parse(text: &str) -> Result<Self> {
        let cursor = Cursor::new(text);
        let (command, cursor) = grammar::command::exec_form_command(cursor, '\\')
            .map_err(|failure| failure.into_error(1))?;
        if !cursor.is_at_end() {
            return Err(cursor.fail("end of input").into_error(1));
        }
        Ok(command)
    }

    /// Builds `["a", "b", ...]` with the canonical one-space separators.
    pub fn create(values: &[&str]) -> Self {
        let mut tokens = vec![Token::Symbol(SymbolToken::new("["))];
        for (i, value) in values.iter().enumerate() {
            if i > 0 {
                tokens.push(Token::Symbol(SymbolToken::new(",")));
                tokens.push(Token::Whitespace(WhitespaceToken::space()));
            }
            tokens.push(Token::Literal(LiteralToken::from_tokens(
                Some('"'),
                vec![Token::String(StringToken::new(escape_json(value)))],
            )));
        }
        tokens.push(Token::Symbol(SymbolToken::new("]")));
        ExecFormCommand { tokens }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub(crate) fn into_tokens(self) -> Vec<Token> {
        self.tokens
    }

    /// The array's string values, with JSON escapes decoded.
    pub fn values(&self) -> Vec<String> {
        self.tokens
            .iter()
            .filter_map(|t| t.as_literal())
            .map(|lit| unescape_json(&lit.value()))
            .collect()
    }
}

impl fmt::Display for ExecFormCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_tokens(&self.tokens, f)
    }
}

/// A free-text command running to the end of the logical instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellFormCommand {
    pub(crate) tokens: Vec<Token>,
}

impl ShellFormCommand {
    pub(crate) fn from_tokens(tokens: Vec<Token>) -> Self {
        ShellFormCommand { tokens }
    }

    pub fn create(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        if text.is_empty() {
            return Err(Error::InvalidArgument(
                "command text may not be empty".to_string(),
            ));
        }
        if text.contains('\n') || text.contains('\r') {
            return Err(Error::InvalidArgument(
                "command text may not contain raw line endings".to_string(),
            ));
        }
        Ok(ShellFormCommand {
            tokens: vec![Token::Literal(LiteralToken::create(text))],
        })
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// The logical command text (continuations and embedded comments
    /// stripped).
    pub fn value(&self) -> String {
        self.tokens
            .iter()
            .filter_map(|t| t.as_literal())
            .map(|lit| lit.value())
            .collect()
    }
}

impl fmt::Display for ShellFormCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_tokens(&self.tokens, f)
    }
}

/// RUN, CMD, ENTRYPOINT, or SHELL: optional repeatable flags, then a command
/// in either form. Which keyword it is lives in the [`Instruction`] variant
/// wrapping this node.
///
/// [`Instruction`]: crate::dockerfile::instruction::Instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInstruction {
    head: Vec<Token>,
    command: Command,
    trail: Vec<Token>,
}

impl CommandInstruction {
    pub(crate) fn from_parts(head: Vec<Token>, command: Command, trail: Vec<Token>) -> Self {
        CommandInstruction {
            head,
            command,
            trail,
        }
    }

    /// Builds `<KEYWORD> <command>`.
    pub fn create(keyword: &str, command: Command) -> Self {
        CommandInstruction {
            head: vec![
                Token::Keyword(KeywordToken::new(keyword)),
                Token::Whitespace(WhitespaceToken::space()),
            ],
            command,
            trail: Vec::new(),
        }
    }

    pub fn keyword(&self) -> Result<&KeywordToken> {
        self.head.iter().find_map(|t| t.as_keyword()).ok_or_else(|| {
            Error::InvalidState("command instruction has no keyword token".to_string())
        })
    }

    pub fn command(&self) -> &Command {
        &self.command
    }

    pub fn set_command(&mut self, command: Command) {
        self.command = command;
    }

    /// All `--flag=value` options before the command, in order.
    pub fn flags(&self) -> Vec<&KeyValueToken> {
        self.head.iter().filter_map(|t| t.as_key_value()).collect()
    }

    /// The values of the repeatable `--mount` flag.
    pub fn mounts(&self) -> Vec<String> {
        self.flags()
            .into_iter()
            .filter(|kv| kv.key().eq_ignore_ascii_case("mount"))
            .filter_map(|kv| kv.value())
            .collect()
    }

    /// The tokens before the command: keyword, whitespace, and flags.
    pub fn head(&self) -> &[Token] {
        &self.head
    }

    /// The tokens after the command: trailing whitespace, comment, newline.
    pub fn trail(&self) -> &[Token] {
        &self.trail
    }

    pub(crate) fn parts_mut(&mut self) -> (&mut Vec<Token>, &mut Command, &mut Vec<Token>) {
        (&mut self.head, &mut self.command, &mut self.trail)
    }
}

impl fmt::Display for CommandInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_tokens(&self.head, f)?;
        self.command.fmt(f)?;
        write_tokens(&self.trail, f)
    }
}

fn escape_json(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            other => out.push(other),
        }
    }
    out
}

fn unescape_json(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.next() {
                Some(next) => out.push(next),
                None => out.push('\\'),
            }
        } else {
            out.push(ch);
        }
    }
    out
}

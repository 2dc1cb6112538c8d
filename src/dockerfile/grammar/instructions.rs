//! Per-keyword instruction grammars.
//!
//! Each grammar consumes the full text of one logical instruction (leading
//! whitespace through trailing newline, continuations included) and produces
//! a typed [`Instruction`] whose tokens reserialize to the input exactly.
//! Keywords match case-insensitively and keep their source casing.

use std::collections::HashSet;

use once_cell::sync::Lazy;

use crate::dockerfile::combinators as cmb;
use crate::dockerfile::combinators::{Cursor, Failure, Step};
use crate::dockerfile::grammar::{command, values};
use crate::dockerfile::instruction::{
    ArgInstruction, CommandInstruction, CopyInstruction, ExposeInstruction, FromInstruction,
    GenericInstruction, HealthcheckBody, HealthcheckInstruction, Instruction, PairsInstruction,
    SimpleInstruction,
};
use crate::dockerfile::token::core::{KeywordToken, SymbolToken, Token};
use crate::dockerfile::token::keyvalue::KeyValueToken;
use crate::dockerfile::token::literal::{IdentifierToken, LiteralToken};

static KEYWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "ADD",
        "ARG",
        "CMD",
        "COPY",
        "ENTRYPOINT",
        "ENV",
        "EXPOSE",
        "FROM",
        "HEALTHCHECK",
        "LABEL",
        "MAINTAINER",
        "ONBUILD",
        "RUN",
        "SHELL",
        "STOPSIGNAL",
        "USER",
        "VOLUME",
        "WORKDIR",
    ]
    .into_iter()
    .collect()
});

pub fn is_instruction_keyword(word: &str) -> bool {
    KEYWORDS.contains(word.to_ascii_uppercase().as_str())
}

/// The first word of a line (after leading horizontal whitespace), for
/// classifying lines before committing to an instruction grammar.
pub fn leading_word(line: &str) -> Option<&str> {
    let trimmed = line.trim_start_matches([' ', '\t']);
    let end = trimmed
        .find(|ch: char| !ch.is_ascii_alphabetic())
        .unwrap_or(trimmed.len());
    if end == 0 {
        None
    } else {
        Some(&trimmed[..end])
    }
}

/// Parses one logical instruction. `text` must span the whole instruction,
/// trailing newline included when present.
pub fn parse_instruction(text: &str, escape: char) -> Result<Instruction, Failure> {
    let start = Cursor::new(text);
    let (lead, cur) = cmb::opt(start, values::whitespace);
    let keyword_at = cur;
    let (word, cur) = cmb::take_while1(cur, |ch| ch.is_ascii_alphabetic(), "instruction keyword")?;
    let canonical = word.to_ascii_uppercase();
    let mut head = Vec::new();
    if let Some(lead) = lead {
        head.push(Token::Whitespace(lead));
    }
    head.push(Token::Keyword(KeywordToken::new(word)));
    match canonical.as_str() {
        "FROM" => from_instruction(head, cur, escape),
        "ARG" => arg_instruction(head, cur, escape),
        "ENV" => pairs_instruction(head, cur, escape, Instruction::Env),
        "LABEL" => pairs_instruction(head, cur, escape, Instruction::Label),
        "RUN" => command_instruction(head, cur, escape, Instruction::Run),
        "CMD" => command_instruction(head, cur, escape, Instruction::Cmd),
        "ENTRYPOINT" => command_instruction(head, cur, escape, Instruction::Entrypoint),
        "SHELL" => command_instruction(head, cur, escape, Instruction::Shell),
        "COPY" => copy_instruction(head, cur, escape, Instruction::Copy),
        "ADD" => copy_instruction(head, cur, escape, Instruction::Add),
        "HEALTHCHECK" => healthcheck_instruction(head, cur, escape),
        "EXPOSE" => expose_instruction(head, cur, escape),
        "WORKDIR" => simple_instruction(head, cur, escape, Instruction::Workdir),
        "USER" => simple_instruction(head, cur, escape, Instruction::User),
        "STOPSIGNAL" => simple_instruction(head, cur, escape, Instruction::Stopsignal),
        "MAINTAINER" => simple_instruction(head, cur, escape, Instruction::Maintainer),
        "VOLUME" => generic_instruction(head, cur, escape, Instruction::Volume),
        "ONBUILD" => generic_instruction(head, cur, escape, Instruction::Onbuild),
        _ => Err(keyword_at.fail("instruction keyword")),
    }
}

/// Zero or more leading `--flag=value` options, each followed by a required
/// gap.
fn flags<'a>(tokens: &mut Vec<Token>, c: Cursor<'a>, escape: char) -> Step<'a, ()> {
    let mut cur = c;
    while let Ok((kv, next)) = values::flag(cur, escape) {
        tokens.push(Token::KeyValue(kv));
        let (gap_tokens, next) = values::required_gap(next, escape)?;
        tokens.extend(gap_tokens);
        cur = next;
    }
    Ok(((), cur))
}

fn finish<'a>(
    mut tokens: Vec<Token>,
    c: Cursor<'a>,
    build: impl FnOnce(Vec<Token>) -> Instruction,
) -> Result<Instruction, Failure> {
    let (tail, _) = values::instruction_tail(c)?;
    tokens.extend(tail);
    Ok(build(tokens))
}

fn stage_identifier(c: Cursor<'_>) -> Step<'_, IdentifierToken> {
    let (_, after_first) = cmb::char_where(c, |ch| ch.is_ascii_alphabetic(), "stage name")?;
    let (_, cur) = cmb::take_while(after_first, |ch| {
        ch.is_ascii_alphanumeric() || ch == '_' || ch == '.' || ch == '-'
    });
    let (name, _) = c.advance(c.rest().len() - cur.rest().len());
    // The scan above matched exactly the identifier character set, so the
    // validating constructor cannot fail here.
    let id = IdentifierToken::new(name).map_err(|_| c.fail("stage name"))?;
    Ok((id, cur))
}

/// `AS <name>` preceded by a gap; `None` when absent.
fn as_clause(c: Cursor<'_>, escape: char) -> Option<(Vec<Token>, Cursor<'_>)> {
    let (gap1, cur) = values::gap(c, escape);
    if gap1.is_empty() {
        return None;
    }
    let (word, cur) = cmb::literal_ignore_case(cur, "AS").ok()?;
    let (gap2, cur) = values::required_gap(cur, escape).ok()?;
    let (id, cur) = stage_identifier(cur).ok()?;
    let mut tokens = gap1;
    tokens.push(Token::Keyword(KeywordToken::new(word)));
    tokens.extend(gap2);
    tokens.push(Token::Identifier(id));
    Some((tokens, cur))
}

fn from_instruction(
    mut tokens: Vec<Token>,
    c: Cursor<'_>,
    escape: char,
) -> Result<Instruction, Failure> {
    let (gap_tokens, cur) = values::required_gap(c, escape)?;
    tokens.extend(gap_tokens);
    let ((), cur) = flags(&mut tokens, cur, escape)?;
    let (image, cur) = values::word_literal(cur, escape, "image reference")?;
    tokens.push(Token::Literal(image));
    let cur = match as_clause(cur, escape) {
        Some((clause, next)) => {
            tokens.extend(clause);
            next
        }
        None => cur,
    };
    finish(tokens, cur, |tokens| {
        Instruction::From(FromInstruction::from_tokens(tokens))
    })
}

fn key_literal(c: Cursor<'_>, escape: char) -> Step<'_, LiteralToken> {
    values::literal(
        c,
        escape,
        |ch| ch == '=' || values::is_horizontal_whitespace(ch),
        "name",
    )
}

/// `name`, `name=`, or `name=value`.
fn arg_declaration(c: Cursor<'_>, escape: char) -> Step<'_, KeyValueToken> {
    let (key, cur) = key_literal(c, escape)?;
    let mut tokens = vec![Token::Literal(key)];
    if let Ok((_, cur)) = cmb::literal(cur, "=") {
        tokens.push(Token::Symbol(SymbolToken::new("=")));
        let (value, cur) =
            values::literal_allow_empty(cur, escape, values::is_horizontal_whitespace)?;
        tokens.push(Token::Literal(value));
        return Ok((KeyValueToken::from_tokens(tokens), cur));
    }
    Ok((KeyValueToken::from_tokens(tokens), cur))
}

/// `name=value` with the separator required.
fn pair(c: Cursor<'_>, escape: char) -> Step<'_, KeyValueToken> {
    let (key, cur) = key_literal(c, escape)?;
    let (_, cur) = cmb::literal(cur, "=")?;
    let (value, cur) = values::literal_allow_empty(cur, escape, values::is_horizontal_whitespace)?;
    Ok((
        KeyValueToken::from_tokens(vec![
            Token::Literal(key),
            Token::Symbol(SymbolToken::new("=")),
            Token::Literal(value),
        ]),
        cur,
    ))
}

/// One or more of `item` separated by gaps. The trailing gap (before the tail)
/// is left unconsumed.
fn separated<'a>(
    tokens: &mut Vec<Token>,
    c: Cursor<'a>,
    escape: char,
    item: impl Fn(Cursor<'a>, char) -> Step<'a, Token>,
) -> Step<'a, ()> {
    let (first, mut cur) = item(c, escape)?;
    tokens.push(first);
    loop {
        let (gap_tokens, next) = values::gap(cur, escape);
        if gap_tokens.is_empty() {
            break;
        }
        match item(next, escape) {
            Ok((token, next)) => {
                tokens.extend(gap_tokens);
                tokens.push(token);
                cur = next;
            }
            Err(_) => break,
        }
    }
    Ok(((), cur))
}

fn arg_instruction(
    mut tokens: Vec<Token>,
    c: Cursor<'_>,
    escape: char,
) -> Result<Instruction, Failure> {
    let (gap_tokens, cur) = values::required_gap(c, escape)?;
    tokens.extend(gap_tokens);
    let ((), cur) = separated(&mut tokens, cur, escape, |c, escape| {
        let (kv, cur) = arg_declaration(c, escape)?;
        Ok((Token::KeyValue(kv), cur))
    })?;
    finish(tokens, cur, |tokens| {
        Instruction::Arg(ArgInstruction::from_tokens(tokens))
    })
}

fn pairs_instruction(
    mut tokens: Vec<Token>,
    c: Cursor<'_>,
    escape: char,
    build: impl FnOnce(PairsInstruction) -> Instruction,
) -> Result<Instruction, Failure> {
    let (gap_tokens, cur) = values::required_gap(c, escape)?;
    tokens.extend(gap_tokens);
    let (key, after_key) = key_literal(cur, escape)?;
    if after_key.peek() == Some('=') {
        // K=V form, repeatable.
        let ((), cur) = separated(&mut tokens, cur, escape, |c, escape| {
            let (kv, cur) = pair(c, escape)?;
            Ok((Token::KeyValue(kv), cur))
        })?;
        finish(tokens, cur, |tokens| {
            build(PairsInstruction::from_tokens(tokens))
        })
    } else {
        // Legacy form: one pair, whitespace separator, value running to the
        // end of the logical line.
        let (separator, cur) = values::required_gap(after_key, escape)?;
        let (value, cur) = values::literal(cur, escape, |_| false, "value")?;
        let mut kv_tokens = vec![Token::Literal(key)];
        kv_tokens.extend(separator);
        kv_tokens.push(Token::Literal(value));
        tokens.push(Token::KeyValue(KeyValueToken::from_tokens(kv_tokens)));
        finish(tokens, cur, |tokens| {
            build(PairsInstruction::from_tokens(tokens))
        })
    }
}

fn command_instruction(
    mut head: Vec<Token>,
    c: Cursor<'_>,
    escape: char,
    build: impl FnOnce(CommandInstruction) -> Instruction,
) -> Result<Instruction, Failure> {
    let (gap_tokens, cur) = values::required_gap(c, escape)?;
    head.extend(gap_tokens);
    let ((), cur) = flags(&mut head, cur, escape)?;
    let (cmd, cur) = command::command(cur, escape)?;
    let (trail, _) = values::instruction_tail(cur)?;
    Ok(build(CommandInstruction::from_parts(head, cmd, trail)))
}

fn path_arguments<'a>(
    tokens: &mut Vec<Token>,
    c: Cursor<'a>,
    escape: char,
) -> Step<'a, ()> {
    if c.peek() == Some('[') {
        let (array, cur) = command::exec_form_command(c, escape)?;
        tokens.extend(array.into_tokens());
        return Ok(((), cur));
    }
    separated(tokens, c, escape, |c, escape| {
        let (lit, cur) = values::word_literal(c, escape, "path")?;
        Ok((Token::Literal(lit), cur))
    })
}

fn copy_instruction(
    mut tokens: Vec<Token>,
    c: Cursor<'_>,
    escape: char,
    build: impl FnOnce(CopyInstruction) -> Instruction,
) -> Result<Instruction, Failure> {
    let (gap_tokens, cur) = values::required_gap(c, escape)?;
    tokens.extend(gap_tokens);
    let ((), cur) = flags(&mut tokens, cur, escape)?;
    let ((), cur) = path_arguments(&mut tokens, cur, escape)?;
    finish(tokens, cur, |tokens| {
        build(CopyInstruction::from_tokens(tokens))
    })
}

fn healthcheck_instruction(
    mut head: Vec<Token>,
    c: Cursor<'_>,
    escape: char,
) -> Result<Instruction, Failure> {
    let (gap_tokens, cur) = values::required_gap(c, escape)?;
    head.extend(gap_tokens);
    let ((), cur) = flags(&mut head, cur, escape)?;
    if let Ok((word, next)) = cmb::literal_ignore_case(cur, "NONE") {
        if next.peek().map_or(true, |ch| !ch.is_ascii_alphanumeric()) {
            let (trail, _) = values::instruction_tail(next)?;
            return Ok(Instruction::Healthcheck(HealthcheckInstruction::from_parts(
                head,
                HealthcheckBody::Disabled(vec![Token::Keyword(KeywordToken::new(word))]),
                trail,
            )));
        }
    }
    let (word, cur) = cmb::literal_ignore_case(cur, "CMD").map_err(|_| cur.fail("CMD or NONE"))?;
    let (gap, cur) = values::required_gap(cur, escape)?;
    let (cmd, cur) = command::command(cur, escape)?;
    let (trail, _) = values::instruction_tail(cur)?;
    Ok(Instruction::Healthcheck(HealthcheckInstruction::from_parts(
        head,
        HealthcheckBody::Command {
            prelude: {
                let mut prelude = vec![Token::Keyword(KeywordToken::new(word))];
                prelude.extend(gap);
                prelude
            },
            command: cmd,
        },
        trail,
    )))
}

fn expose_instruction(
    mut tokens: Vec<Token>,
    c: Cursor<'_>,
    escape: char,
) -> Result<Instruction, Failure> {
    let (gap_tokens, cur) = values::required_gap(c, escape)?;
    tokens.extend(gap_tokens);
    let ((), cur) = separated(&mut tokens, cur, escape, |c, escape| {
        let (lit, cur) = values::word_literal(c, escape, "port")?;
        Ok((Token::Literal(lit), cur))
    })?;
    finish(tokens, cur, |tokens| {
        Instruction::Expose(ExposeInstruction::from_tokens(tokens))
    })
}

fn simple_instruction(
    mut tokens: Vec<Token>,
    c: Cursor<'_>,
    escape: char,
    build: impl FnOnce(SimpleInstruction) -> Instruction,
) -> Result<Instruction, Failure> {
    let (gap_tokens, cur) = values::required_gap(c, escape)?;
    tokens.extend(gap_tokens);
    let (value, cur) = values::literal(cur, escape, |_| false, "value")?;
    tokens.push(Token::Literal(value));
    finish(tokens, cur, |tokens| {
        build(SimpleInstruction::from_tokens(tokens))
    })
}

fn generic_instruction(
    mut tokens: Vec<Token>,
    c: Cursor<'_>,
    escape: char,
    build: impl FnOnce(GenericInstruction) -> Instruction,
) -> Result<Instruction, Failure> {
    let (gap_tokens, cur) = values::required_gap(c, escape)?;
    tokens.extend(gap_tokens);
    let ((), cur) = path_arguments(&mut tokens, cur, escape)?;
    finish(tokens, cur, |tokens| {
        build(GenericInstruction::from_tokens(tokens))
    })
}

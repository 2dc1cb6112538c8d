//! Grammars for exec-form and shell-form commands.

use crate::dockerfile::combinators as cmb;
use crate::dockerfile::combinators::{Cursor, Step};
use crate::dockerfile::grammar::values;
use crate::dockerfile::instruction::command::{Command, ExecFormCommand, ShellFormCommand};
use crate::dockerfile::token::core::{StringToken, SymbolToken, Token};
use crate::dockerfile::token::literal::LiteralToken;

/// A double-quoted exec-form element. JSON escaping applies inside (always
/// backslash, independent of the document's escape character); the raw inner
/// text is kept verbatim for round-trip and decoded by
/// [`ExecFormCommand::values`].
fn json_string(c: Cursor<'_>) -> Step<'_, LiteralToken> {
    let (_, cur) = cmb::literal(c, "\"")?;
    let mut raw = String::new();
    let mut cur = cur;
    loop {
        match cur.peek() {
            None | Some('\n') | Some('\r') => return Err(cur.fail("closing \"")),
            Some('"') => break,
            Some('\\') => {
                let (consumed, next) = cur.advance(1);
                raw.push_str(consumed);
                cur = next;
                if let Some(escaped) = cur.peek() {
                    if escaped != '\n' && escaped != '\r' {
                        let (consumed, next) = cur.advance(escaped.len_utf8());
                        raw.push_str(consumed);
                        cur = next;
                    }
                }
            }
            Some(ch) => {
                let (consumed, next) = cur.advance(ch.len_utf8());
                raw.push_str(consumed);
                cur = next;
            }
        }
    }
    let (_, cur) = cmb::literal(cur, "\"")?;
    let tokens = if raw.is_empty() {
        Vec::new()
    } else {
        vec![Token::String(StringToken::new(raw))]
    };
    Ok((LiteralToken::from_tokens(Some('"'), tokens), cur))
}

/// `[` elements `]`, with whitespace/continuations permitted around elements
/// and commas.
pub fn exec_form_command(c: Cursor<'_>, escape: char) -> Step<'_, ExecFormCommand> {
    let (_, cur) = cmb::literal(c, "[")?;
    let mut tokens = vec![Token::Symbol(SymbolToken::new("["))];
    let (gap_tokens, mut cur) = values::gap(cur, escape);
    tokens.extend(gap_tokens);
    if let Ok((_, next)) = cmb::literal(cur, "]") {
        tokens.push(Token::Symbol(SymbolToken::new("]")));
        return Ok((ExecFormCommand::from_tokens(tokens), next));
    }
    loop {
        let (element, next) = json_string(cur)?;
        tokens.push(Token::Literal(element));
        let (gap_tokens, next) = values::gap(next, escape);
        tokens.extend(gap_tokens);
        cur = next;
        if let Ok((_, next)) = cmb::literal(cur, ",") {
            tokens.push(Token::Symbol(SymbolToken::new(",")));
            let (gap_tokens, next) = values::gap(next, escape);
            tokens.extend(gap_tokens);
            cur = next;
            continue;
        }
        if let Ok((_, next)) = cmb::literal(cur, "]") {
            tokens.push(Token::Symbol(SymbolToken::new("]")));
            return Ok((ExecFormCommand::from_tokens(tokens), next));
        }
        return Err(cur.fail("',' or ']'"));
    }
}

/// Free text to the end of the logical instruction, as a single literal that
/// keeps embedded continuations and comment lines. A trailing same-line
/// comment is not part of the command.
pub fn shell_form_command(c: Cursor<'_>, escape: char) -> Step<'_, ShellFormCommand> {
    let (lit, cur) = values::shell_text(c, escape)?;
    Ok((ShellFormCommand::from_tokens(vec![Token::Literal(lit)]), cur))
}

/// Exec form when the argument starts with `[` and parses as one; shell form
/// otherwise (a `[` that is not a valid string array is shell text).
pub fn command(c: Cursor<'_>, escape: char) -> Step<'_, Command> {
    if c.peek() == Some('[') {
        if let Ok((exec, cur)) = exec_form_command(c, escape) {
            return Ok((Command::Exec(exec), cur));
        }
    }
    let (shell, cur) = shell_form_command(c, escape)?;
    Ok((Command::Shell(shell), cur))
}

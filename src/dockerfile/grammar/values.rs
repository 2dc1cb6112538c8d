//! Value-level grammars shared by every instruction: whitespace, newlines,
//! line continuations, comments, literals, variable references, flags, and
//! the inter-argument "gap".
//!
//! The gap rule is what gives every instruction multi-line support for free:
//! wherever arguments may be separated, the grammar accepts any mix of
//! horizontal whitespace and line continuations (each continuation optionally
//! followed by whole comment lines), and keeps all of it as tokens so the
//! original physical layout reserializes exactly.
//!
//! Every rule that can cross a line continuation takes the active escape
//! character as an explicit parameter; there is no ambient escape state, so
//! documents with different `escape=` directives can be parsed concurrently.

use crate::dockerfile::combinators as cmb;
use crate::dockerfile::combinators::{Cursor, Step};
use crate::dockerfile::token::core::{
    CommentToken, LineContinuationToken, NewlineToken, StringToken, SymbolToken, Token,
    WhitespaceToken,
};
use crate::dockerfile::token::keyvalue::KeyValueToken;
use crate::dockerfile::token::literal::LiteralToken;
use crate::dockerfile::token::variable::{
    is_variable_name_char, is_variable_name_start, Modifier, VariableRefToken,
};

pub fn is_horizontal_whitespace(ch: char) -> bool {
    ch == ' ' || ch == '\t'
}

fn is_line_ending(ch: char) -> bool {
    ch == '\n' || ch == '\r'
}

/// A non-empty run of spaces and tabs.
pub fn whitespace(c: Cursor<'_>) -> Step<'_, WhitespaceToken> {
    let (run, next) = cmb::take_while1(c, is_horizontal_whitespace, "whitespace")?;
    Ok((WhitespaceToken::from_matched(run), next))
}

/// A single line-ending sequence.
pub fn newline(c: Cursor<'_>) -> Step<'_, NewlineToken> {
    for ending in ["\r\n", "\n", "\r"] {
        if let Ok((matched, next)) = cmb::literal(c, ending) {
            return Ok((NewlineToken::from_matched(matched), next));
        }
    }
    Err(c.fail("newline"))
}

/// Escape character + optional trailing horizontal whitespace + newline.
pub fn line_continuation(c: Cursor<'_>, escape: char) -> Step<'_, LineContinuationToken> {
    let (_, cur) = cmb::char_where(c, |ch| ch == escape, "line continuation")?;
    let mut tokens = vec![Token::Symbol(SymbolToken::new(escape.to_string()))];
    let (ws, cur) = cmb::opt(cur, whitespace);
    if let Some(ws) = ws {
        tokens.push(Token::Whitespace(ws));
    }
    let (nl, cur) = newline(cur).map_err(|_| c.fail("line continuation"))?;
    tokens.push(Token::Newline(nl));
    Ok((LineContinuationToken::from_tokens(tokens), cur))
}

/// A whole comment: optional leading whitespace, `#`, optional whitespace,
/// the text, and the trailing newline when present.
pub fn comment_line(c: Cursor<'_>) -> Step<'_, CommentToken> {
    let (lead, cur) = cmb::opt(c, whitespace);
    let (_, cur) = cmb::literal(cur, "#")?;
    let mut tokens = Vec::new();
    if let Some(lead) = lead {
        tokens.push(Token::Whitespace(lead));
    }
    tokens.push(Token::Symbol(SymbolToken::new("#")));
    let (inner_ws, cur) = cmb::opt(cur, whitespace);
    if let Some(inner_ws) = inner_ws {
        tokens.push(Token::Whitespace(inner_ws));
    }
    let (text, cur) = cmb::take_while(cur, |ch| !is_line_ending(ch));
    if !text.is_empty() {
        tokens.push(Token::String(StringToken::new(text)));
    }
    let (nl, cur) = cmb::opt(cur, newline);
    if let Some(nl) = nl {
        tokens.push(Token::Newline(nl));
    }
    Ok((CommentToken::from_tokens(tokens), cur))
}

/// Inter-argument separation: whitespace and line continuations in any order,
/// each continuation optionally followed by whole comment lines. May be empty.
pub fn gap(c: Cursor<'_>, escape: char) -> (Vec<Token>, Cursor<'_>) {
    let mut tokens = Vec::new();
    let mut cur = c;
    loop {
        if let Ok((ws, next)) = whitespace(cur) {
            tokens.push(Token::Whitespace(ws));
            cur = next;
            continue;
        }
        if let Ok((cont, next)) = line_continuation(cur, escape) {
            tokens.push(Token::LineContinuation(cont));
            let (comments, next) = cmb::many0(next, comment_line);
            tokens.extend(comments.into_iter().map(Token::Comment));
            cur = next;
            continue;
        }
        break;
    }
    (tokens, cur)
}

/// Like [`gap`] but at least one whitespace or continuation is required.
pub fn required_gap(c: Cursor<'_>, escape: char) -> Step<'_, Vec<Token>> {
    let (tokens, cur) = gap(c, escape);
    if tokens.is_empty() {
        Err(c.fail("whitespace"))
    } else {
        Ok((tokens, cur))
    }
}

/// Trailing tokens of a logical instruction: an optional same-line comment
/// (which owns the newline), or optional whitespace and newline, then end of
/// input.
pub fn instruction_tail(c: Cursor<'_>) -> Step<'_, Vec<Token>> {
    let mut tokens = Vec::new();
    let mut cur = c;
    if let Ok((comment, next)) = comment_line(cur) {
        tokens.push(Token::Comment(comment));
        cur = next;
    } else {
        let (ws, next) = cmb::opt(cur, whitespace);
        if let Some(ws) = ws {
            tokens.push(Token::Whitespace(ws));
        }
        let (nl, next) = cmb::opt(next, newline);
        if let Some(nl) = nl {
            tokens.push(Token::Newline(nl));
        }
        cur = next;
    }
    let (_, cur) = cmb::expect_end(cur)?;
    Ok((tokens, cur))
}

/// A variable name: a letter or underscore, then letters, digits, and
/// underscores.
fn variable_name<'a>(c: Cursor<'a>) -> Step<'a, &'a str> {
    let (first, cur) = cmb::char_where(c, is_variable_name_start, "variable name")?;
    let (rest, cur) = cmb::take_while(cur, is_variable_name_char);
    let len = first.len_utf8() + rest.len();
    let (name, _) = c.advance(len);
    Ok((name, cur))
}

/// `$NAME`, `${NAME}`, or `${NAME<modifier><default>}`.
///
/// Callers try this wherever an unescaped `$` appears inside a value; if it
/// fails, the `$` is ordinary text.
pub fn variable_ref(c: Cursor<'_>, escape: char) -> Step<'_, VariableRefToken> {
    let (_, cur) = cmb::literal(c, "$")?;
    let mut tokens = vec![Token::Symbol(SymbolToken::new("$"))];
    if let Ok((_, cur)) = cmb::literal(cur, "{") {
        tokens.push(Token::Symbol(SymbolToken::new("{")));
        let (name, cur) = variable_name(cur)?;
        tokens.push(Token::String(StringToken::new(name)));
        // Two-character modifiers must be tried before their one-character
        // prefixes.
        let mut modifier = None;
        let mut cur = cur;
        for symbol in [":-", ":+", ":?", "-", "+", "?"] {
            if let Ok((_, next)) = cmb::literal(cur, symbol) {
                modifier = Modifier::from_symbol(symbol);
                tokens.push(Token::Symbol(SymbolToken::new(symbol)));
                cur = next;
                break;
            }
        }
        if modifier.is_some() {
            let (default_value, next) = literal_allow_empty(cur, escape, |ch| ch == '}')?;
            tokens.push(Token::Literal(default_value));
            cur = next;
        }
        let (_, cur) = cmb::literal(cur, "}")?;
        tokens.push(Token::Symbol(SymbolToken::new("}")));
        Ok((VariableRefToken::from_tokens(tokens, true, modifier), cur))
    } else {
        let (name, cur) = variable_name(cur)?;
        tokens.push(Token::String(StringToken::new(name)));
        Ok((VariableRefToken::from_tokens(tokens, false, None), cur))
    }
}

/// Scans value content until `terminate` matches (or the line ends),
/// producing the child tokens of a literal: text runs, escaped characters,
/// variable references, and embedded continuations/comments.
fn scan_value<'a>(
    c: Cursor<'a>,
    escape: char,
    terminate: impl Fn(Cursor<'a>) -> bool + Copy,
) -> (Vec<Token>, Cursor<'a>) {
    let mut tokens: Vec<Token> = Vec::new();
    let mut run = String::new();
    let mut cur = c;

    fn flush(run: &mut String, tokens: &mut Vec<Token>) {
        if !run.is_empty() {
            tokens.push(Token::String(StringToken::new(std::mem::take(run))));
        }
    }

    loop {
        let ch = match cur.peek() {
            Some(ch) => ch,
            None => break,
        };
        if is_line_ending(ch) || (ch != escape && terminate(cur)) {
            break;
        }
        if ch == escape {
            if let Ok((cont, next)) = line_continuation(cur, escape) {
                flush(&mut run, &mut tokens);
                tokens.push(Token::LineContinuation(cont));
                // Whole comment lines may follow a continuation inside a
                // value; they are part of the literal's exact text but not of
                // its logical value.
                let (comments, next) = cmb::many0(next, comment_line);
                tokens.extend(comments.into_iter().map(Token::Comment));
                cur = next;
                continue;
            }
            let (esc, next) = cur.advance(ch.len_utf8());
            cur = next;
            match cur.peek() {
                // An escaped `$` keeps the escape as its own symbol token so
                // the resolver can strip it from output without re-scanning
                // the text.
                Some('$') => {
                    flush(&mut run, &mut tokens);
                    tokens.push(Token::Symbol(SymbolToken::new(esc)));
                    let (dollar, next) = cur.advance(1);
                    run.push_str(dollar);
                    cur = next;
                }
                // Any other escaped character: the escape and the char that
                // follows are both literal text.
                Some(following) if !is_line_ending(following) => {
                    run.push_str(esc);
                    let (consumed, next) = cur.advance(following.len_utf8());
                    run.push_str(consumed);
                    cur = next;
                }
                // A trailing escape at end of input stands alone.
                _ => run.push_str(esc),
            }
            continue;
        }
        if ch == '$' {
            if let Ok((var, next)) = variable_ref(cur, escape) {
                flush(&mut run, &mut tokens);
                tokens.push(Token::VariableRef(var));
                cur = next;
                continue;
            }
        }
        let (consumed, next) = cur.advance(ch.len_utf8());
        run.push_str(consumed);
        cur = next;
    }
    flush(&mut run, &mut tokens);
    (tokens, cur)
}

/// A possibly empty literal value, quoted or not, stopping at `stop` (outside
/// quotes), the end of the line, or end of input.
pub fn literal_allow_empty(
    c: Cursor<'_>,
    escape: char,
    stop: impl Fn(char) -> bool + Copy,
) -> Step<'_, LiteralToken> {
    match c.peek() {
        Some(q) if q == '"' || q == '\'' => {
            let (_, cur) = c.advance(1);
            let (tokens, cur) = scan_value(cur, escape, move |c| c.peek() == Some(q));
            match cmb::literal(cur, &q.to_string()) {
                Ok((_, cur)) => Ok((LiteralToken::from_tokens(Some(q), tokens), cur)),
                Err(_) => Err(cur.fail(format!("closing {}", q))),
            }
        }
        _ => {
            let (tokens, cur) = scan_value(c, escape, move |c| c.peek().map_or(false, stop));
            Ok((LiteralToken::from_tokens(None, tokens), cur))
        }
    }
}

/// A literal that must be non-empty (quoted-empty counts as present).
pub fn literal<'a>(
    c: Cursor<'a>,
    escape: char,
    stop: impl Fn(char) -> bool + Copy,
    expected: &str,
) -> Step<'a, LiteralToken> {
    let (lit, cur) = literal_allow_empty(c, escape, stop)?;
    if lit.quote_char().is_none() && lit.tokens().is_empty() {
        Err(c.fail(expected))
    } else {
        Ok((lit, cur))
    }
}

/// A whitespace-delimited word literal (the common argument shape).
pub fn word_literal<'a>(c: Cursor<'a>, escape: char, expected: &str) -> Step<'a, LiteralToken> {
    literal(c, escape, is_horizontal_whitespace, expected)
}

/// Shell-form command text: runs to the end of the logical line like an
/// unquoted literal, but stops before a trailing comment (horizontal
/// whitespace followed by `#`). A `#` with no whitespace before it is part
/// of the command.
pub fn shell_text(c: Cursor<'_>, escape: char) -> Step<'_, LiteralToken> {
    let (tokens, cur) = scan_value(c, escape, |cur| {
        let rest = cur.rest();
        rest.starts_with([' ', '\t']) && rest.trim_start_matches([' ', '\t']).starts_with('#')
    });
    if tokens.is_empty() {
        Err(c.fail("command"))
    } else {
        Ok((LiteralToken::from_tokens(None, tokens), cur))
    }
}

/// `--name=value`. The value may be empty and may be quoted.
pub fn flag(c: Cursor<'_>, escape: char) -> Step<'_, KeyValueToken> {
    let (_, cur) = cmb::literal(c, "--")?;
    let (name, cur) = cmb::take_while1(
        cur,
        |ch| ch.is_ascii_alphanumeric() || ch == '-',
        "flag name",
    )?;
    let (_, cur) = cmb::literal(cur, "=")?;
    let (value, cur) = literal_allow_empty(cur, escape, is_horizontal_whitespace)?;
    let tokens = vec![
        Token::Symbol(SymbolToken::new("--")),
        Token::Literal(LiteralToken::create(name)),
        Token::Symbol(SymbolToken::new("=")),
        Token::Literal(value),
    ];
    Ok((KeyValueToken::from_tokens(tokens), cur))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dockerfile::token::tokens_text;

    fn cursor(text: &str) -> Cursor<'_> {
        Cursor::new(text)
    }

    #[test]
    fn test_line_continuation_with_trailing_whitespace() {
        let (cont, next) = line_continuation(cursor("\\  \nrest"), '\\').unwrap();
        assert_eq!(cont.to_string(), "\\  \n");
        assert_eq!(next.rest(), "rest");
    }

    #[test]
    fn test_line_continuation_requires_newline() {
        assert!(line_continuation(cursor("\\ x"), '\\').is_err());
        assert!(line_continuation(cursor("`\n"), '`').is_ok());
    }

    #[test]
    fn test_comment_line_round_trip() {
        let (comment, next) = comment_line(cursor("  # a note\nFROM x")).unwrap();
        assert_eq!(comment.to_string(), "  # a note\n");
        assert_eq!(comment.text(), "a note");
        assert_eq!(next.rest(), "FROM x");
    }

    #[test]
    fn test_word_literal_stops_at_whitespace() {
        let (lit, next) = word_literal(cursor("alpine:3.20 AS base"), '\\', "image").unwrap();
        assert_eq!(lit.to_string(), "alpine:3.20");
        assert_eq!(next.rest(), " AS base");
    }

    #[test]
    fn test_quoted_literal_may_contain_spaces() {
        let (lit, next) = word_literal(cursor("\"two words\" tail"), '\\', "value").unwrap();
        assert_eq!(lit.to_string(), "\"two words\"");
        assert_eq!(lit.value(), "two words");
        assert_eq!(lit.quote_char(), Some('"'));
        assert_eq!(next.rest(), " tail");
    }

    #[test]
    fn test_unterminated_quote_fails() {
        assert!(word_literal(cursor("\"unclosed"), '\\', "value").is_err());
    }

    #[test]
    fn test_literal_with_variable_reference() {
        let (lit, _) = word_literal(cursor("repo:$TAG-suffix"), '\\', "image").unwrap();
        assert_eq!(lit.to_string(), "repo:$TAG-suffix");
        let refs = lit.variable_refs();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].name(), "TAG");
    }

    #[test]
    fn test_escaped_dollar_is_plain_text() {
        let (lit, _) = word_literal(cursor("a\\$b"), '\\', "value").unwrap();
        assert_eq!(lit.to_string(), "a\\$b");
        assert!(lit.variable_refs().is_empty());
        // The escape stays a separate token; the `$` is ordinary text.
        assert!(matches!(lit.tokens()[1], Token::Symbol(_)));
    }

    #[test]
    fn test_shell_text_stops_before_trailing_comment() {
        let (lit, next) = shell_text(cursor("apt-get update  # refresh\n"), '\\').unwrap();
        assert_eq!(lit.to_string(), "apt-get update");
        assert_eq!(next.rest(), "  # refresh\n");

        let (lit, _) = shell_text(cursor("echo a#b\n"), '\\').unwrap();
        assert_eq!(lit.to_string(), "echo a#b");
    }

    #[test]
    fn test_literal_spans_line_continuation() {
        let (lit, next) = word_literal(cursor("ab\\\ncd "), '\\', "value").unwrap();
        assert_eq!(lit.to_string(), "ab\\\ncd");
        assert_eq!(lit.value(), "abcd");
        assert_eq!(next.rest(), " ");
    }

    #[test]
    fn test_literal_keeps_comment_after_continuation() {
        let (lit, _) = word_literal(cursor("ab\\\n# note\ncd"), '\\', "value").unwrap();
        assert_eq!(lit.to_string(), "ab\\\n# note\ncd");
        assert_eq!(lit.value(), "abcd");
    }

    #[test]
    fn test_double_escape_then_newline_ends_literal() {
        let (lit, next) = word_literal(cursor("ab\\\\\ncd"), '\\', "value").unwrap();
        assert_eq!(lit.to_string(), "ab\\\\");
        assert_eq!(next.rest(), "\ncd");
    }

    #[test]
    fn test_variable_ref_forms() {
        let (bare, _) = variable_ref(cursor("$name rest"), '\\').unwrap();
        assert_eq!(bare.to_string(), "$name");
        assert!(!bare.braced());

        let (braced, _) = variable_ref(cursor("${name}"), '\\').unwrap();
        assert_eq!(braced.to_string(), "${name}");
        assert!(braced.braced());
        assert_eq!(braced.modifier(), None);

        let (with_default, _) = variable_ref(cursor("${name:-fall back}"), '\\').unwrap();
        assert_eq!(with_default.to_string(), "${name:-fall back}");
        assert_eq!(
            with_default.modifier(),
            Some(Modifier::DefaultIfUnsetOrEmpty)
        );
        assert_eq!(with_default.default_value().unwrap().value(), "fall back");
    }

    #[test]
    fn test_nested_variable_ref_in_default() {
        let (var, _) = variable_ref(cursor("${a:-x$b}"), '\\').unwrap();
        assert_eq!(var.to_string(), "${a:-x$b}");
        let default = var.default_value().unwrap();
        assert_eq!(default.variable_refs()[0].name(), "b");
    }

    #[test]
    fn test_invalid_variable_ref_rejected() {
        assert!(variable_ref(cursor("$1"), '\\').is_err());
        assert!(variable_ref(cursor("${}"), '\\').is_err());
        assert!(variable_ref(cursor("${a"), '\\').is_err());
    }

    #[test]
    fn test_gap_collects_continuations_and_comments() {
        let (tokens, next) = gap(cursor("  \\\n# c\n  x"), '\\');
        assert_eq!(tokens_text(&tokens), "  \\\n# c\n  ");
        assert_eq!(next.rest(), "x");
    }

    #[test]
    fn test_flag_parsing() {
        let (kv, next) = flag(cursor("--chown=app:app rest"), '\\').unwrap();
        assert_eq!(kv.to_string(), "--chown=app:app");
        assert_eq!(kv.key(), "chown");
        assert_eq!(kv.value(), Some("app:app".to_string()));
        assert_eq!(next.rest(), " rest");
    }

    #[test]
    fn test_instruction_tail_variants() {
        let (tokens, _) = instruction_tail(cursor("\n")).unwrap();
        assert_eq!(tokens_text(&tokens), "\n");

        let (tokens, _) = instruction_tail(cursor("  # done\n")).unwrap();
        assert_eq!(tokens_text(&tokens), "  # done\n");

        let (tokens, _) = instruction_tail(cursor("")).unwrap();
        assert!(tokens.is_empty());

        assert!(instruction_tail(cursor(" more")).is_err());
    }
}

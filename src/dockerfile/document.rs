//! The document assembler: physical lines in, an ordered [`Item`] list out.
//!
//! Assembly runs in two phases. The directive phase consumes the leading run
//! of `# key=value` lines as [`ParserDirective`]s; the first `escape=`
//! directive fixes the escape character for the rest of the parse (`\` by
//! default, `` ` `` the only alternative). The main phase classifies each
//! remaining line as blank, comment, or the start of an instruction, and
//! accumulates an instruction's physical lines until the continuation chain
//! ends: a line continues when its trailing run of escape characters (before
//! optional trailing whitespace) has odd length, and whole comment lines
//! inside a chain neither end it nor extend it. The accumulated text is then
//! handed to the per-keyword grammar with its starting line number, so error
//! positions refer to the original document.

use std::fmt;

use crate::dockerfile::combinators as cmb;
use crate::dockerfile::combinators::Cursor;
use crate::dockerfile::error::{Error, Result};
use crate::dockerfile::grammar;
use crate::dockerfile::grammar::values;
use crate::dockerfile::instruction::Instruction;
use crate::dockerfile::token::core::{
    write_tokens, CommentToken, NewlineToken, SymbolToken, Token, WhitespaceToken,
};
use crate::dockerfile::token::keyvalue::KeyValueToken;
use crate::dockerfile::token::literal::LiteralToken;

pub const DEFAULT_ESCAPE_CHAR: char = '\\';

/// A `# key=value` line from the leading directive block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserDirective {
    tokens: Vec<Token>,
}

impl ParserDirective {
    fn from_tokens(tokens: Vec<Token>) -> Self {
        ParserDirective { tokens }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    fn key_value(&self) -> Option<&KeyValueToken> {
        self.tokens.iter().find_map(|t| t.as_key_value())
    }

    pub fn key(&self) -> String {
        self.key_value().map(|kv| kv.key()).unwrap_or_default()
    }

    pub fn value(&self) -> String {
        self.key_value()
            .and_then(|kv| kv.value())
            .unwrap_or_default()
    }
}

impl fmt::Display for ParserDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_tokens(&self.tokens, f)
    }
}

/// A line containing only whitespace (and usually a newline).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhitespaceLine {
    tokens: Vec<Token>,
}

impl WhitespaceLine {
    fn from_tokens(tokens: Vec<Token>) -> Self {
        WhitespaceLine { tokens }
    }

    /// A single empty line.
    pub fn blank() -> Self {
        WhitespaceLine {
            tokens: vec![Token::Newline(NewlineToken::lf())],
        }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }
}

impl fmt::Display for WhitespaceLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_tokens(&self.tokens, f)
    }
}

/// One top-level construct of a document, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    Directive(ParserDirective),
    Comment(CommentToken),
    Whitespace(WhitespaceLine),
    Instruction(Instruction),
}

impl Item {
    pub fn as_instruction(&self) -> Option<&Instruction> {
        match self {
            Item::Instruction(inst) => Some(inst),
            _ => None,
        }
    }

    pub fn as_instruction_mut(&mut self) -> Option<&mut Instruction> {
        match self {
            Item::Instruction(inst) => Some(inst),
            _ => None,
        }
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Item::Directive(d) => d.fmt(f),
            Item::Comment(c) => c.fmt(f),
            Item::Whitespace(w) => w.fmt(f),
            Item::Instruction(i) => i.fmt(f),
        }
    }
}

/// A parsed document. `to_string()` reproduces the source byte for byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dockerfile {
    items: Vec<Item>,
    escape: char,
}

impl Dockerfile {
    /// An empty document with the default escape character.
    pub fn new() -> Self {
        Dockerfile {
            items: Vec::new(),
            escape: DEFAULT_ESCAPE_CHAR,
        }
    }

    pub fn parse(text: &str) -> Result<Self> {
        parse(text)
    }

    /// The escape character fixed by the directive block at parse time.
    pub fn escape_char(&self) -> char {
        self.escape
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn items_mut(&mut self) -> &mut Vec<Item> {
        &mut self.items
    }

    /// The instructions, in order, skipping other item kinds.
    pub fn instructions(&self) -> impl Iterator<Item = &Instruction> {
        self.items.iter().filter_map(Item::as_instruction)
    }
}

impl Default for Dockerfile {
    fn default() -> Self {
        Dockerfile::new()
    }
}

impl fmt::Display for Dockerfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for item in &self.items {
            item.fmt(f)?;
        }
        Ok(())
    }
}

/// Parses a whole document.
pub fn parse(text: &str) -> Result<Dockerfile> {
    let lines = split_lines(text);
    let mut items = Vec::new();
    let mut escape = None;
    let mut index = 0;

    // Directive phase: the leading run of `# key=value` lines.
    while index < lines.len() {
        let directive = match directive_line(lines[index]) {
            Some(directive) => directive,
            None => break,
        };
        if escape.is_none() && directive.key().eq_ignore_ascii_case("escape") {
            escape = Some(parse_escape_value(&directive.value(), index + 1)?);
        }
        items.push(Item::Directive(directive));
        index += 1;
    }
    let escape = escape.unwrap_or(DEFAULT_ESCAPE_CHAR);

    while index < lines.len() {
        let line = lines[index];
        if is_blank(line) {
            items.push(Item::Whitespace(whitespace_line(line)));
            index += 1;
            continue;
        }
        if is_comment(line) {
            let (comment, _) = values::comment_line(Cursor::new(line))
                .map_err(|failure| failure.into_error(index + 1))?;
            items.push(Item::Comment(comment));
            index += 1;
            continue;
        }
        match grammar::leading_word(line) {
            Some(word) if grammar::is_instruction_keyword(word) => {}
            _ => {
                return Err(Error::UnexpectedLine {
                    line: index + 1,
                    content: line.trim_end_matches(['\n', '\r']).to_string(),
                });
            }
        }
        let base_line = index + 1;
        let mut text = String::from(line);
        let mut continuing = continues(line, escape);
        index += 1;
        while continuing && index < lines.len() {
            let line = lines[index];
            text.push_str(line);
            index += 1;
            if is_comment(line) {
                continue;
            }
            continuing = continues(line, escape);
        }
        let instruction = grammar::parse_instruction(&text, escape)
            .map_err(|failure| failure.into_error(base_line))?;
        items.push(Item::Instruction(instruction));
    }

    Ok(Dockerfile { items, escape })
}

/// Splits into physical lines, each keeping its line ending. Recognizes
/// `\n`, `\r\n`, and lone `\r`.
fn split_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let bytes = text.as_bytes();
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\n' => {
                lines.push(&text[start..=i]);
                start = i + 1;
            }
            b'\r' => {
                if bytes.get(i + 1) == Some(&b'\n') {
                    i += 1;
                }
                lines.push(&text[start..=i]);
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    if start < text.len() {
        lines.push(&text[start..]);
    }
    lines
}

fn is_blank(line: &str) -> bool {
    line.chars()
        .all(|ch| ch == ' ' || ch == '\t' || ch == '\n' || ch == '\r')
}

fn is_comment(line: &str) -> bool {
    line.trim_start_matches([' ', '\t']).starts_with('#')
}

/// A physical line continues the instruction when its trailing run of escape
/// characters (ignoring trailing whitespace) has odd length; an even run is
/// escaped escapes and ends the line normally.
fn continues(line: &str, escape: char) -> bool {
    let body = line
        .trim_end_matches(['\n', '\r'])
        .trim_end_matches([' ', '\t']);
    let run = body.chars().rev().take_while(|&ch| ch == escape).count();
    run % 2 == 1
}

fn whitespace_line(line: &str) -> WhitespaceLine {
    let body = line.trim_end_matches(['\n', '\r']);
    let mut tokens = Vec::new();
    if !body.is_empty() {
        tokens.push(Token::Whitespace(WhitespaceToken::from_matched(body)));
    }
    if line.len() > body.len() {
        tokens.push(Token::Newline(NewlineToken::from_matched(&line[body.len()..])));
    }
    WhitespaceLine::from_tokens(tokens)
}

/// Parses one line as a `# key=value` directive; `None` when the line has a
/// different shape (making it an ordinary comment or an instruction).
fn directive_line(line: &str) -> Option<ParserDirective> {
    let c = Cursor::new(line);
    let (lead, cur) = cmb::opt(c, values::whitespace);
    let (_, cur) = cmb::literal(cur, "#").ok()?;
    let (inner, cur) = cmb::opt(cur, values::whitespace);
    let (key, cur) =
        cmb::take_while1(cur, |ch| ch.is_ascii_alphanumeric(), "directive key").ok()?;
    let (before_eq, cur) = cmb::opt(cur, values::whitespace);
    let (_, cur) = cmb::literal(cur, "=").ok()?;
    let (after_eq, cur) = cmb::opt(cur, values::whitespace);
    let (raw_value, cur) = cmb::take_while(cur, |ch| ch != '\n' && ch != '\r');
    let value = raw_value.trim_end_matches([' ', '\t']);
    let trailing = &raw_value[value.len()..];
    let (newline, cur) = cmb::opt(cur, values::newline);
    cmb::expect_end(cur).ok()?;

    let mut pair_tokens = vec![Token::Literal(LiteralToken::create(key))];
    if let Some(ws) = before_eq {
        pair_tokens.push(Token::Whitespace(ws));
    }
    pair_tokens.push(Token::Symbol(SymbolToken::new("=")));
    if let Some(ws) = after_eq {
        pair_tokens.push(Token::Whitespace(ws));
    }
    pair_tokens.push(Token::Literal(LiteralToken::create(value)));

    let mut tokens = Vec::new();
    if let Some(ws) = lead {
        tokens.push(Token::Whitespace(ws));
    }
    tokens.push(Token::Symbol(SymbolToken::new("#")));
    if let Some(ws) = inner {
        tokens.push(Token::Whitespace(ws));
    }
    tokens.push(Token::KeyValue(KeyValueToken::from_tokens(pair_tokens)));
    if !trailing.is_empty() {
        tokens.push(Token::Whitespace(WhitespaceToken::from_matched(trailing)));
    }
    if let Some(nl) = newline {
        tokens.push(Token::Newline(nl));
    }
    Some(ParserDirective::from_tokens(tokens))
}

fn parse_escape_value(value: &str, line: usize) -> Result<char> {
    match value {
        "\\" => Ok('\\'),
        "`" => Ok('`'),
        _ => Err(Error::Parse {
            line,
            column: 1,
            expected: "escape directive value \"\\\\\" or \"`\"".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MULTI_STAGE: &str = "\
# syntax=docker/dockerfile:1
ARG BASE=alpine:3.20

FROM $BASE AS builder
RUN apk add --no-cache build-base && \\
    make install # build tools

FROM $BASE
COPY --from=builder /usr/local /usr/local
CMD [\"app\"]
";

    #[test]
    fn test_round_trip_multi_stage() {
        let doc = parse(MULTI_STAGE).unwrap();
        assert_eq!(doc.to_string(), MULTI_STAGE);
        assert_eq!(doc.escape_char(), '\\');
        assert_eq!(doc.instructions().count(), 6);
    }

    #[test]
    fn test_directive_phase_first_wins() {
        let source = "# escape=`\n# escape=\\\nFROM alpine\n";
        let doc = parse(source).unwrap();
        assert_eq!(doc.escape_char(), '`');
        assert_eq!(doc.to_string(), source);
    }

    #[test]
    fn test_directive_after_comment_is_a_comment() {
        let source = "# just a note\n# escape=`\nFROM alpine\n";
        let doc = parse(source).unwrap();
        assert_eq!(doc.escape_char(), '\\');
        assert!(matches!(doc.items()[1], Item::Comment(_)));
    }

    #[test]
    fn test_unknown_directive_preserved() {
        let source = "# check=skip=all\nFROM alpine\n";
        let doc = parse(source).unwrap();
        match &doc.items()[0] {
            Item::Directive(d) => {
                assert_eq!(d.key(), "check");
                assert_eq!(d.value(), "skip=all");
            }
            other => panic!("expected directive, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_escape_value_is_an_error() {
        match parse("# escape=x\nFROM alpine\n") {
            Err(Error::Parse { line, .. }) => assert_eq!(line, 1),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_unexpected_line_reports_position_and_content() {
        match parse("FROM alpine\nBOGUS something\n") {
            Err(Error::UnexpectedLine { line, content }) => {
                assert_eq!(line, 2);
                assert_eq!(content, "BOGUS something");
            }
            other => panic!("expected unexpected-line error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_error_line_offset_through_continuations() {
        // The unterminated quote is on physical line 3 of the document.
        let source = "FROM alpine\nARG \\\n    NAME=\"unclosed\n";
        match parse(source) {
            Err(Error::Parse { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_escaped_escape_does_not_continue() {
        let source = "RUN echo a\\\\\nFROM alpine\n";
        let doc = parse(source).unwrap();
        assert_eq!(doc.instructions().count(), 2);
        assert_eq!(doc.to_string(), source);
    }

    #[test]
    fn test_comment_inside_continuation_chain() {
        let source = "RUN apk add \\\n# tools\n    build-base\n";
        let doc = parse(source).unwrap();
        assert_eq!(doc.instructions().count(), 1);
        assert_eq!(doc.to_string(), source);
    }

    #[test]
    fn test_crlf_round_trip() {
        let source = "FROM alpine\r\nRUN echo hi\r\n";
        let doc = parse(source).unwrap();
        assert_eq!(doc.to_string(), source);
    }

    #[test]
    fn test_blank_lines_and_indentation() {
        let source = "\n  \t\n  FROM alpine\n";
        let doc = parse(source).unwrap();
        assert_eq!(doc.to_string(), source);
        assert!(matches!(doc.items()[0], Item::Whitespace(_)));
        assert!(matches!(doc.items()[1], Item::Whitespace(_)));
    }

    #[test]
    fn test_backtick_escape_document() {
        let source = "# escape=`\nFROM alpine\nRUN echo a `\n    b\n";
        let doc = parse(source).unwrap();
        assert_eq!(doc.to_string(), source);
        assert_eq!(doc.instructions().count(), 2);
    }

    #[test]
    fn test_missing_final_newline() {
        let source = "FROM alpine";
        let doc = parse(source).unwrap();
        assert_eq!(doc.to_string(), source);
    }
}

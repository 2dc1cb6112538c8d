//! Parser combinator engine for the Dockerfile grammars.
//!
//! A grammar rule is a function from a [`Cursor`] (a line/column-tracked view
//! into the source) to either a successful match plus the remaining cursor, or
//! a [`Failure`] carrying the furthest position reached. Rules compose through
//! the small combinator set in this module:
//!
//! - exact and case-insensitive literal matches
//! - character-class matches (`char_where`, `take_while`, `take_while1`)
//! - optional (`opt`), repetition (`many0`, `many1`)
//! - ordered alternation via `Failure::or_further` (first success wins; on
//!   failure the alternative that reached furthest reports)
//! - end-of-input assertion (`expect_end`)
//!
//! Negative lookahead ("any char except a continuation or line end") falls out
//! of the character-class predicates: callers bound free-text runs by stopping
//! the predicate at the excluded prefix. Cursors are `Copy`, so backtracking is
//! saving a cursor and reusing it.

use crate::dockerfile::error::Error;

/// A position-tracked view into the text being parsed.
///
/// Line and column are 1-based; `offset` is the byte offset into the full
/// source slice. Advancing is the only way to move, and it keeps line/column
/// in sync with the consumed text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor<'a> {
    source: &'a str,
    offset: usize,
    line: usize,
    column: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(source: &'a str) -> Self {
        Cursor {
            source,
            offset: 0,
            line: 1,
            column: 1,
        }
    }

    /// The unconsumed remainder of the input.
    pub fn rest(&self) -> &'a str {
        &self.source[self.offset..]
    }

    pub fn is_at_end(&self) -> bool {
        self.offset >= self.source.len()
    }

    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn column(&self) -> usize {
        self.column
    }

    /// Consumes `len` bytes, returning the consumed slice and the advanced
    /// cursor. `len` must fall on a char boundary within the remainder.
    pub fn advance(self, len: usize) -> (&'a str, Cursor<'a>) {
        let consumed = &self.source[self.offset..self.offset + len];
        let mut line = self.line;
        let mut column = self.column;
        for ch in consumed.chars() {
            if ch == '\n' {
                line += 1;
                column = 1;
            } else {
                column += 1;
            }
        }
        (
            consumed,
            Cursor {
                source: self.source,
                offset: self.offset + len,
                line,
                column,
            },
        )
    }

    /// Builds a failure anchored at this cursor's position.
    pub fn fail(&self, expected: impl Into<String>) -> Failure {
        Failure {
            line: self.line,
            column: self.column,
            expected: expected.into(),
        }
    }
}

/// A failed match: the furthest position reached and what was expected there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub line: usize,
    pub column: usize,
    pub expected: String,
}

impl Failure {
    /// Ordered-alternation merge: keeps whichever failure reached further into
    /// the input, preferring `self` on ties (first alternative listed wins the
    /// report).
    pub fn or_further(self, other: Failure) -> Failure {
        if (other.line, other.column) > (self.line, self.column) {
            other
        } else {
            self
        }
    }

    /// Converts into the public error type, offsetting the line number for
    /// sub-parses that started partway into the document.
    pub fn into_error(self, base_line: usize) -> Error {
        Error::Parse {
            line: self.line + base_line - 1,
            column: self.column,
            expected: self.expected,
        }
    }
}

/// The result of applying a rule: the parsed value and the advanced cursor.
pub type Step<'a, T> = std::result::Result<(T, Cursor<'a>), Failure>;

/// Matches an exact literal string.
pub fn literal<'a>(c: Cursor<'a>, expected: &str) -> Step<'a, &'a str> {
    if c.rest().starts_with(expected) {
        let (matched, next) = c.advance(expected.len());
        Ok((matched, next))
    } else {
        Err(c.fail(format!("{:?}", expected)))
    }
}

/// Matches a literal string ignoring ASCII case, returning the source text in
/// its original casing.
pub fn literal_ignore_case<'a>(c: Cursor<'a>, expected: &str) -> Step<'a, &'a str> {
    let rest = c.rest();
    if rest.len() >= expected.len() && rest[..expected.len()].eq_ignore_ascii_case(expected) {
        let (matched, next) = c.advance(expected.len());
        Ok((matched, next))
    } else {
        Err(c.fail(format!("{:?}", expected)))
    }
}

/// Matches a single character satisfying `pred`.
pub fn char_where<'a>(
    c: Cursor<'a>,
    pred: impl Fn(char) -> bool,
    expected: &str,
) -> Step<'a, char> {
    match c.peek() {
        Some(ch) if pred(ch) => {
            let (_, next) = c.advance(ch.len_utf8());
            Ok((ch, next))
        }
        _ => Err(c.fail(expected)),
    }
}

/// Consumes the longest (possibly empty) run of characters satisfying `pred`.
/// Cannot fail.
pub fn take_while<'a>(c: Cursor<'a>, pred: impl Fn(char) -> bool) -> (&'a str, Cursor<'a>) {
    let rest = c.rest();
    let len = rest
        .char_indices()
        .find(|(_, ch)| !pred(*ch))
        .map(|(i, _)| i)
        .unwrap_or(rest.len());
    c.advance(len)
}

/// Consumes a non-empty run of characters satisfying `pred`.
pub fn take_while1<'a>(
    c: Cursor<'a>,
    pred: impl Fn(char) -> bool,
    expected: &str,
) -> Step<'a, &'a str> {
    let (run, next) = take_while(c, pred);
    if run.is_empty() {
        Err(c.fail(expected))
    } else {
        Ok((run, next))
    }
}

/// Zero-or-one: applies `rule`, treating failure as an empty match.
pub fn opt<'a, T>(
    c: Cursor<'a>,
    rule: impl FnOnce(Cursor<'a>) -> Step<'a, T>,
) -> (Option<T>, Cursor<'a>) {
    match rule(c) {
        Ok((value, next)) => (Some(value), next),
        Err(_) => (None, c),
    }
}

/// Zero-or-more: applies `rule` until it fails, collecting matches in order.
/// Stops if a match consumes no input, so rules that can match empty do not
/// loop forever.
pub fn many0<'a, T>(
    mut c: Cursor<'a>,
    mut rule: impl FnMut(Cursor<'a>) -> Step<'a, T>,
) -> (Vec<T>, Cursor<'a>) {
    let mut items = Vec::new();
    while let Ok((value, next)) = rule(c) {
        if next.offset == c.offset {
            break;
        }
        items.push(value);
        c = next;
    }
    (items, c)
}

/// One-or-more: like [`many0`] but the first match is required.
pub fn many1<'a, T>(
    c: Cursor<'a>,
    mut rule: impl FnMut(Cursor<'a>) -> Step<'a, T>,
) -> Step<'a, Vec<T>> {
    let (first, next) = rule(c)?;
    let (mut restv, next) = many0(next, &mut rule);
    let mut items = vec![first];
    items.append(&mut restv);
    Ok((items, next))
}

/// Succeeds only at end of input.
pub fn expect_end(c: Cursor<'_>) -> Step<'_, ()> {
    if c.is_at_end() {
        Ok(((), c))
    } else {
        Err(c.fail("end of input"))
    }
}

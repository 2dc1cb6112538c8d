//! Output formats for a parsed document: a JSON summary and an indented
//! tree-view dump of the token tree.

use serde::Serialize;

use crate::dockerfile::document::{Dockerfile, Item};
use crate::dockerfile::error::{Error, Result};
use crate::dockerfile::token::core::Token;

#[derive(Serialize)]
struct DocumentSummary {
    escape: char,
    directives: Vec<DirectiveSummary>,
    instructions: Vec<InstructionSummary>,
}

#[derive(Serialize)]
struct DirectiveSummary {
    key: String,
    value: String,
}

#[derive(Serialize)]
struct InstructionSummary {
    kind: String,
    text: String,
}

/// A JSON summary of the document: the active escape character, the parser
/// directives, and each instruction's kind and exact text.
pub fn to_json(dockerfile: &Dockerfile) -> Result<String> {
    let summary = DocumentSummary {
        escape: dockerfile.escape_char(),
        directives: dockerfile
            .items()
            .iter()
            .filter_map(|item| match item {
                Item::Directive(directive) => Some(DirectiveSummary {
                    key: directive.key(),
                    value: directive.value(),
                }),
                _ => None,
            })
            .collect(),
        instructions: dockerfile
            .instructions()
            .map(|inst| InstructionSummary {
                kind: inst.kind().to_string(),
                text: inst.to_string(),
            })
            .collect(),
    };
    serde_json::to_string_pretty(&summary)
        .map_err(|err| Error::InvalidState(format!("summary serialization failed: {}", err)))
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        let mut truncated = s.chars().take(max_chars).collect::<String>();
        truncated.push_str("...");
        truncated
    } else {
        s.to_string()
    }
}

/// An indented dump of the full token tree, one node per line.
pub fn to_tree_string(dockerfile: &Dockerfile) -> String {
    let mut result = String::new();
    let items = dockerfile.items();
    for (i, item) in items.iter().enumerate() {
        let is_last = i == items.len() - 1;
        append_item(&mut result, item, "", is_last);
    }
    result
}

fn append_item(result: &mut String, item: &Item, prefix: &str, is_last: bool) {
    let connector = if is_last { "└─" } else { "├─" };
    let (node_type, label, children): (&str, String, &[Token]) = match item {
        Item::Directive(directive) => (
            "directive",
            format!("{}={}", directive.key(), directive.value()),
            directive.tokens(),
        ),
        Item::Comment(comment) => ("comment", comment.text(), comment.tokens()),
        Item::Whitespace(ws) => ("whitespace", format!("{:?}", ws.to_string()), ws.tokens()),
        Item::Instruction(inst) => {
            let display_label = truncate(&format!("{:?}", inst.to_string()), 30);
            result.push_str(&format!(
                "{}{} instruction: {}\n",
                prefix, connector, display_label
            ));
            let new_prefix = format!("{}{}", prefix, if is_last { "  " } else { "│ " });
            let groups = inst.token_groups();
            let total: usize = groups.iter().map(|g| g.len()).sum();
            let mut seen = 0;
            for group in groups {
                for token in group {
                    seen += 1;
                    append_token(result, token, &new_prefix, seen == total);
                }
            }
            return;
        }
    };
    let display_label = truncate(&label, 30);
    result.push_str(&format!(
        "{}{} {}: {}\n",
        prefix, connector, node_type, display_label
    ));
    let new_prefix = format!("{}{}", prefix, if is_last { "  " } else { "│ " });
    append_tokens(result, children, &new_prefix);
}

fn append_tokens(result: &mut String, tokens: &[Token], prefix: &str) {
    for (i, token) in tokens.iter().enumerate() {
        let is_last = i == tokens.len() - 1;
        append_token(result, token, prefix, is_last);
    }
}

fn append_token(result: &mut String, token: &Token, prefix: &str, is_last: bool) {
    let connector = if is_last { "└─" } else { "├─" };
    let node_type = token_type(token);
    let display_label = truncate(&format!("{:?}", token.to_string()), 30);
    result.push_str(&format!(
        "{}{} {}: {}\n",
        prefix, connector, node_type, display_label
    ));

    let new_prefix = format!("{}{}", prefix, if is_last { "  " } else { "│ " });
    match token {
        Token::Comment(t) => append_tokens(result, t.tokens(), &new_prefix),
        Token::LineContinuation(t) => append_tokens(result, t.tokens(), &new_prefix),
        Token::Literal(t) => append_tokens(result, t.tokens(), &new_prefix),
        Token::VariableRef(t) => append_tokens(result, t.tokens(), &new_prefix),
        Token::KeyValue(t) => append_tokens(result, t.tokens(), &new_prefix),
        _ => {}
    }
}

fn token_type(token: &Token) -> &'static str {
    match token {
        Token::String(_) => "string",
        Token::Symbol(_) => "symbol",
        Token::Whitespace(_) => "whitespace",
        Token::Newline(_) => "newline",
        Token::Keyword(_) => "keyword",
        Token::Identifier(_) => "identifier",
        Token::Comment(_) => "comment",
        Token::LineContinuation(_) => "continuation",
        Token::Literal(_) => "literal",
        Token::VariableRef(_) => "variable",
        Token::KeyValue(_) => "keyvalue",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dockerfile::parse;

    #[test]
    fn test_to_json_summary() {
        let doc = parse("# syntax=docker/dockerfile:1\nFROM alpine:3.20\nRUN echo hi\n").unwrap();
        let json = to_json(&doc).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["escape"], "\\");
        assert_eq!(value["directives"][0]["key"], "syntax");
        assert_eq!(value["directives"][0]["value"], "docker/dockerfile:1");
        assert_eq!(value["instructions"][0]["kind"], "FROM");
        assert_eq!(value["instructions"][1]["text"], "RUN echo hi\n");
    }

    #[test]
    fn test_tree_string_structure() {
        let doc = parse("FROM alpine:$TAG\n").unwrap();
        let tree = to_tree_string(&doc);
        insta::assert_snapshot!(tree, @r###"
        └─ instruction: "FROM alpine:$TAG\n"
          ├─ keyword: "FROM"
          ├─ whitespace: " "
          ├─ literal: "alpine:$TAG"
          │ ├─ string: "alpine:"
          │ └─ variable: "$TAG"
          │   ├─ symbol: "$"
          │   └─ string: "TAG"
          └─ newline: "\n"
        "###);
    }
}

//! Variable substitution over token trees.
//!
//! This module knows how to render a token sequence with `$NAME` and
//! `${NAME...}` references replaced according to the shell-style modifier
//! rules, and how to rewrite the tokens in place with the same result. It
//! does not know where variable bindings come from; the scoping rules (build
//! args, stages) live in the document-level driver.
//!
//! A binding map entry means "set"; an entry with an empty value means "set
//! but empty", which the `:`-prefixed modifiers treat as unset. A missing
//! entry means unset, which a plain reference renders as the empty string.

use std::collections::HashMap;

use crate::dockerfile::error::{Error, Result};
use crate::dockerfile::instruction::Instruction;
use crate::dockerfile::token::core::{StringToken, Token};
use crate::dockerfile::token::keyvalue::KeyValueToken;
use crate::dockerfile::token::literal::LiteralToken;
use crate::dockerfile::token::variable::{Modifier, VariableRefToken};

/// How resolution output is produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolutionOptions {
    /// Rewrite the resolved instructions in place, replacing each variable
    /// reference with its substituted text.
    pub update_inline: bool,
    /// Drop line continuations (and the comment lines they allow) from the
    /// output, joining each instruction onto one physical line, and strip
    /// escape characters guarding a `$`.
    pub remove_escape_characters: bool,
}

/// Renders an instruction with substitution applied and, when
/// `options.update_inline` is set, rewrites its tokens to match. Errors
/// surface during rendering, before any mutation happens.
pub(crate) fn resolve_instruction(
    instruction: &mut Instruction,
    variables: &HashMap<String, String>,
    options: &ResolutionOptions,
) -> Result<String> {
    let mut groups = instruction.token_groups_mut();
    let mut out = String::new();
    for group in groups.iter() {
        render_tokens(group, variables, options, false, &mut out)?;
    }
    if options.update_inline {
        for group in groups.iter_mut() {
            rewrite_tokens(group, variables, options, false);
        }
    }
    Ok(out)
}

/// The resolved logical value of a literal: quotes excluded, continuations
/// and embedded comments skipped, references substituted. This is what an
/// `ARG` default or `ENV` value contributes to the variable scope.
pub(crate) fn resolve_literal_value(
    literal: &LiteralToken,
    variables: &HashMap<String, String>,
) -> Result<String> {
    let mut out = String::new();
    for token in literal.tokens() {
        match token {
            Token::LineContinuation(_) | Token::Comment(_) => {}
            Token::VariableRef(var) => substitute(var, variables, &mut out)?,
            other => out.push_str(&other.to_string()),
        }
    }
    Ok(out)
}

/// Like [`resolve_literal_value`] for the optional value side of a key/value
/// pair; a bare key yields `None`.
pub(crate) fn resolve_pair_value(
    pair: &KeyValueToken,
    variables: &HashMap<String, String>,
) -> Result<Option<String>> {
    match pair.value_literal() {
        Some(literal) => Ok(Some(resolve_literal_value(literal, variables)?)),
        None => Ok(None),
    }
}

fn render_tokens(
    tokens: &[Token],
    variables: &HashMap<String, String>,
    options: &ResolutionOptions,
    in_literal: bool,
    out: &mut String,
) -> Result<()> {
    let mut after_continuation = false;
    for token in tokens {
        match token {
            Token::VariableRef(var) => {
                substitute(var, variables, out)?;
                after_continuation = false;
            }
            Token::Literal(lit) => {
                render_literal(lit, variables, options, out)?;
                after_continuation = false;
            }
            Token::KeyValue(kv) => {
                render_tokens(kv.tokens(), variables, options, false, out)?;
                after_continuation = false;
            }
            // The only symbol child a literal can hold is an escape character
            // guarding a `$`.
            Token::Symbol(sym) if in_literal => {
                if !options.remove_escape_characters {
                    out.push_str(sym.value());
                }
                after_continuation = false;
            }
            Token::LineContinuation(cont) => {
                if !options.remove_escape_characters {
                    out.push_str(&cont.to_string());
                }
                after_continuation = true;
            }
            // A comment directly after a dropped continuation would otherwise
            // merge into the logical line, so it goes with it.
            Token::Comment(comment) => {
                if !(options.remove_escape_characters && after_continuation) {
                    out.push_str(&comment.to_string());
                }
            }
            other => {
                out.push_str(&other.to_string());
                after_continuation = false;
            }
        }
    }
    Ok(())
}

fn render_literal(
    literal: &LiteralToken,
    variables: &HashMap<String, String>,
    options: &ResolutionOptions,
    out: &mut String,
) -> Result<()> {
    if let Some(q) = literal.quote_char() {
        out.push(q);
    }
    render_tokens(literal.tokens(), variables, options, true, out)?;
    if let Some(q) = literal.quote_char() {
        out.push(q);
    }
    Ok(())
}

/// Applies the modifier truth table for one reference.
fn substitute(
    var: &VariableRefToken,
    variables: &HashMap<String, String>,
    out: &mut String,
) -> Result<()> {
    let name = var.name();
    let bound = variables.get(&name);
    let modifier = match var.modifier() {
        None => {
            if let Some(value) = bound {
                out.push_str(value);
            }
            return Ok(());
        }
        Some(modifier) => modifier,
    };
    // The default/alternate expression resolves in the same scope, so nested
    // references like `${a:-$b}` work.
    let argument = match var.default_value() {
        Some(literal) => resolve_literal_value(literal, variables)?,
        None => String::new(),
    };
    let treat_as_unset = match bound {
        None => true,
        Some(value) => modifier.empty_counts_as_unset() && value.is_empty(),
    };
    match modifier {
        Modifier::DefaultIfUnset | Modifier::DefaultIfUnsetOrEmpty => {
            if treat_as_unset {
                out.push_str(&argument);
            } else if let Some(value) = bound {
                out.push_str(value);
            }
        }
        Modifier::ValueIfSet | Modifier::ValueIfSetNonEmpty => {
            if !treat_as_unset {
                out.push_str(&argument);
            }
        }
        Modifier::ErrorIfUnset | Modifier::ErrorIfUnsetOrEmpty => {
            if treat_as_unset {
                return Err(Error::UndefinedVariable {
                    name,
                    detail: argument,
                });
            }
            if let Some(value) = bound {
                out.push_str(value);
            }
        }
    }
    Ok(())
}

/// Rewrites tokens so their serialized text matches what [`render_tokens`]
/// produced. Substitution cannot fail here: the caller rendered the same data
/// first, so every `?`/`:?` reference is known to be satisfied.
fn rewrite_tokens(
    tokens: &mut Vec<Token>,
    variables: &HashMap<String, String>,
    options: &ResolutionOptions,
    in_literal: bool,
) {
    let mut rewritten = Vec::with_capacity(tokens.len());
    let mut after_continuation = false;
    for mut token in tokens.drain(..) {
        match &mut token {
            Token::VariableRef(var) => {
                let mut text = String::new();
                if substitute(var, variables, &mut text).is_ok() && !text.is_empty() {
                    rewritten.push(Token::String(StringToken::new(text)));
                }
                after_continuation = false;
                continue;
            }
            Token::Literal(lit) => {
                rewrite_tokens(lit.tokens_mut(), variables, options, true);
                after_continuation = false;
            }
            Token::KeyValue(kv) => {
                rewrite_tokens(kv.tokens_mut(), variables, options, false);
                after_continuation = false;
            }
            Token::Symbol(_) if in_literal => {
                after_continuation = false;
                if options.remove_escape_characters {
                    continue;
                }
            }
            Token::LineContinuation(_) => {
                let drop = options.remove_escape_characters;
                after_continuation = true;
                if drop {
                    continue;
                }
            }
            Token::Comment(_) => {
                if options.remove_escape_characters && after_continuation {
                    continue;
                }
            }
            _ => after_continuation = false,
        }
        rewritten.push(token);
    }
    *tokens = rewritten;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dockerfile::grammar::parse_instruction;

    fn vars(entries: &[(&str, &str)]) -> HashMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn resolve(text: &str, variables: &HashMap<String, String>) -> Result<String> {
        let mut inst = parse_instruction(text, '\\').unwrap();
        resolve_instruction(&mut inst, variables, &ResolutionOptions::default())
    }

    #[test]
    fn test_plain_reference_substitution() {
        let v = vars(&[("TAG", "3.20")]);
        assert_eq!(resolve("FROM alpine:$TAG\n", &v).unwrap(), "FROM alpine:3.20\n");
        assert_eq!(
            resolve("FROM alpine:${TAG}\n", &v).unwrap(),
            "FROM alpine:3.20\n"
        );
    }

    #[test]
    fn test_unset_plain_reference_is_empty() {
        let v = vars(&[]);
        assert_eq!(resolve("USER $WHO\n", &v).unwrap(), "USER \n");
    }

    #[test]
    fn test_default_modifiers() {
        let unset = vars(&[]);
        let empty = vars(&[("V", "")]);
        let set = vars(&[("V", "x")]);
        assert_eq!(resolve("USER ${V-d}\n", &unset).unwrap(), "USER d\n");
        assert_eq!(resolve("USER ${V-d}\n", &empty).unwrap(), "USER \n");
        assert_eq!(resolve("USER ${V-d}\n", &set).unwrap(), "USER x\n");
        assert_eq!(resolve("USER ${V:-d}\n", &unset).unwrap(), "USER d\n");
        assert_eq!(resolve("USER ${V:-d}\n", &empty).unwrap(), "USER d\n");
        assert_eq!(resolve("USER ${V:-d}\n", &set).unwrap(), "USER x\n");
    }

    #[test]
    fn test_alternate_modifiers() {
        let unset = vars(&[]);
        let empty = vars(&[("V", "")]);
        let set = vars(&[("V", "x")]);
        assert_eq!(resolve("USER ${V+a}\n", &unset).unwrap(), "USER \n");
        assert_eq!(resolve("USER ${V+a}\n", &empty).unwrap(), "USER a\n");
        assert_eq!(resolve("USER ${V+a}\n", &set).unwrap(), "USER a\n");
        assert_eq!(resolve("USER ${V:+a}\n", &unset).unwrap(), "USER \n");
        assert_eq!(resolve("USER ${V:+a}\n", &empty).unwrap(), "USER \n");
        assert_eq!(resolve("USER ${V:+a}\n", &set).unwrap(), "USER a\n");
    }

    #[test]
    fn test_error_modifiers() {
        let unset = vars(&[]);
        let empty = vars(&[("V", "")]);
        let set = vars(&[("V", "x")]);
        assert!(matches!(
            resolve("USER ${V?missing}\n", &unset),
            Err(Error::UndefinedVariable { name, detail }) if name == "V" && detail == "missing"
        ));
        assert_eq!(resolve("USER ${V?missing}\n", &empty).unwrap(), "USER \n");
        assert_eq!(resolve("USER ${V?missing}\n", &set).unwrap(), "USER x\n");
        assert!(resolve("USER ${V:?missing}\n", &empty).is_err());
        assert_eq!(resolve("USER ${V:?missing}\n", &set).unwrap(), "USER x\n");
    }

    #[test]
    fn test_nested_default_resolves() {
        let v = vars(&[("FALLBACK", "latest")]);
        assert_eq!(
            resolve("FROM repo:${TAG:-$FALLBACK}\n", &v).unwrap(),
            "FROM repo:latest\n"
        );
    }

    #[test]
    fn test_remove_escape_characters_joins_lines() {
        let mut inst = parse_instruction("RUN echo a \\\n# note\n    b\n", '\\').unwrap();
        let options = ResolutionOptions {
            update_inline: false,
            remove_escape_characters: true,
        };
        let text = resolve_instruction(&mut inst, &vars(&[]), &options).unwrap();
        assert_eq!(text, "RUN echo a     b\n");
        // Without update_inline the tokens are untouched.
        assert_eq!(inst.to_string(), "RUN echo a \\\n# note\n    b\n");
    }

    #[test]
    fn test_remove_escape_characters_strips_escaped_dollar() {
        let mut inst = parse_instruction("RUN echo \\$HOME\n", '\\').unwrap();
        let options = ResolutionOptions {
            update_inline: true,
            remove_escape_characters: true,
        };
        let text = resolve_instruction(&mut inst, &vars(&[]), &options).unwrap();
        assert_eq!(text, "RUN echo $HOME\n");
        assert_eq!(inst.to_string(), "RUN echo $HOME\n");
    }

    #[test]
    fn test_escaped_dollar_kept_without_option() {
        let mut inst = parse_instruction("RUN echo \\$HOME\n", '\\').unwrap();
        let text =
            resolve_instruction(&mut inst, &vars(&[]), &ResolutionOptions::default()).unwrap();
        assert_eq!(text, "RUN echo \\$HOME\n");
    }

    #[test]
    fn test_update_inline_rewrites_tokens() {
        let mut inst = parse_instruction("FROM alpine:$TAG\n", '\\').unwrap();
        let options = ResolutionOptions {
            update_inline: true,
            remove_escape_characters: false,
        };
        let v = vars(&[("TAG", "3.20")]);
        resolve_instruction(&mut inst, &v, &options).unwrap();
        assert_eq!(inst.to_string(), "FROM alpine:3.20\n");
        assert_eq!(inst.as_from().unwrap().image(), "alpine:3.20");
    }

    #[test]
    fn test_failed_resolution_leaves_tokens_untouched() {
        let mut inst = parse_instruction("USER ${WHO:?who}\n", '\\').unwrap();
        let options = ResolutionOptions {
            update_inline: true,
            remove_escape_characters: true,
        };
        assert!(resolve_instruction(&mut inst, &vars(&[]), &options).is_err());
        assert_eq!(inst.to_string(), "USER ${WHO:?who}\n");
    }
}

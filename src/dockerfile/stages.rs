//! Build stages and document-level variable resolution.
//!
//! [`StagesView`] groups a parsed document into its global prelude and FROM
//! stages. The resolution driver on [`Dockerfile`] implements the build-arg
//! scoping rules:
//!
//! - ARG instructions before the first FROM declare global args. An override
//!   binds the name outright; otherwise the declared default (resolved
//!   against the global args declared so far) binds it; a declaration with
//!   no default and no override leaves it unset.
//! - Each FROM resolves against the global args, and opens a fresh, empty
//!   stage scope: global args are not visible inside a stage until
//!   re-declared.
//! - An ARG inside a stage binds from, in order: the override, the declared
//!   default (resolved against the globals overlaid with the stage scope so
//!   far), the global value.
//! - ENV pairs bind into the current scope unconditionally; overrides do not
//!   apply to them. Within one ENV or ARG instruction, references resolve
//!   against the scope as it was before the instruction, so `ENV A=1 B=$A`
//!   gives B the previous value of A.
//! - Stages are isolated: bindings never leak from one stage into the next.
//! - With `update_inline`, tokens are rewritten only after the whole document
//!   has rendered; a failed resolution mutates nothing.

use std::collections::HashMap;

use crate::dockerfile::document::{Dockerfile, Item};
use crate::dockerfile::error::{Error, Result};
use crate::dockerfile::instruction::{
    ArgInstruction, FromInstruction, Instruction, PairsInstruction,
};
use crate::dockerfile::resolve;
use crate::dockerfile::resolve::ResolutionOptions;

/// One FROM stage: the FROM itself and every item up to the next FROM.
#[derive(Debug)]
pub struct Stage<'a> {
    from: &'a FromInstruction,
    items: Vec<&'a Item>,
}

impl<'a> Stage<'a> {
    pub fn from_instruction(&self) -> &'a FromInstruction {
        self.from
    }

    pub fn name(&self) -> Option<String> {
        self.from.stage_name()
    }

    /// The items following the FROM, in order.
    pub fn items(&self) -> &[&'a Item] {
        &self.items
    }

    pub fn instructions(&self) -> impl Iterator<Item = &'a Instruction> + '_ {
        self.items.iter().filter_map(|item| item.as_instruction())
    }
}

/// The document split into its global prelude and stages.
#[derive(Debug)]
pub struct StagesView<'a> {
    global_args: Vec<&'a ArgInstruction>,
    stages: Vec<Stage<'a>>,
}

impl<'a> StagesView<'a> {
    pub fn new(dockerfile: &'a Dockerfile) -> Self {
        let mut global_args = Vec::new();
        let mut stages: Vec<Stage<'a>> = Vec::new();
        for item in dockerfile.items() {
            match item.as_instruction() {
                Some(Instruction::From(from)) => {
                    stages.push(Stage {
                        from,
                        items: Vec::new(),
                    });
                }
                Some(Instruction::Arg(arg)) if stages.is_empty() => {
                    global_args.push(arg);
                }
                _ => {
                    if let Some(stage) = stages.last_mut() {
                        stage.items.push(item);
                    }
                }
            }
        }
        StagesView {
            global_args,
            stages,
        }
    }

    /// ARG instructions before the first FROM.
    pub fn global_args(&self) -> &[&'a ArgInstruction] {
        &self.global_args
    }

    pub fn stages(&self) -> &[Stage<'a>] {
        &self.stages
    }

    /// Finds a stage by its `AS` name (stage references are case-sensitive).
    pub fn stage(&self, name: &str) -> Option<&Stage<'a>> {
        self.stages
            .iter()
            .find(|stage| stage.name().as_deref() == Some(name))
    }
}

impl Dockerfile {
    /// Resolves every variable reference in the document and returns the
    /// resolved text. With `update_inline`, the document's tokens are
    /// rewritten to the resolved form as well.
    pub fn resolve_variables(
        &mut self,
        overrides: &HashMap<String, String>,
        options: &ResolutionOptions,
    ) -> Result<String> {
        self.drive_resolution(overrides, options, None)
    }

    /// Resolves a single instruction, identified by its index in
    /// [`Dockerfile::items`], with the variable scope it would have during a
    /// whole-document resolution. Only the target instruction is rewritten
    /// when `update_inline` is set.
    pub fn resolve_instruction(
        &mut self,
        item_index: usize,
        overrides: &HashMap<String, String>,
        options: &ResolutionOptions,
    ) -> Result<String> {
        match self.items().get(item_index) {
            Some(Item::Instruction(_)) => {}
            Some(_) => {
                return Err(Error::InvalidArgument(format!(
                    "item {} is not an instruction",
                    item_index
                )));
            }
            None => {
                return Err(Error::InvalidArgument(format!(
                    "item index {} is out of range",
                    item_index
                )));
            }
        }
        self.drive_resolution(overrides, options, Some(item_index))
    }

    /// Two passes over the items: a read-only rendering pass that maintains
    /// the scoping state, then (with `update_inline`) a rewrite pass using the
    /// scope snapshot each instruction rendered under. With a target, returns
    /// just the target's resolved text; otherwise the whole document's.
    fn drive_resolution(
        &mut self,
        overrides: &HashMap<String, String>,
        options: &ResolutionOptions,
        target: Option<usize>,
    ) -> Result<String> {
        let read_only = ResolutionOptions {
            update_inline: false,
            ..*options
        };
        let mut globals: HashMap<String, String> = HashMap::new();
        let mut stage: Option<HashMap<String, String>> = None;
        let mut output = String::new();
        let mut target_output = None;
        let mut scopes: Vec<Option<HashMap<String, String>>> =
            Vec::with_capacity(self.items().len());

        // Rendering pass: no tokens are touched, so a failure part way
        // through leaves the document exactly as it was.
        for (index, item) in self.items_mut().iter_mut().enumerate() {
            let instruction = match item.as_instruction_mut() {
                Some(instruction) => instruction,
                None => {
                    output.push_str(&item.to_string());
                    scopes.push(None);
                    continue;
                }
            };
            let (text, scope) = match instruction {
                Instruction::From(_) => {
                    let scope = globals.clone();
                    let text = resolve::resolve_instruction(instruction, &scope, &read_only)?;
                    stage = Some(HashMap::new());
                    (text, scope)
                }
                Instruction::Arg(arg) => {
                    // A stage ARG's default may reference globals as well as
                    // the stage's own bindings; the stage bindings shadow.
                    let scope = match &stage {
                        Some(stage_scope) => {
                            let mut merged = globals.clone();
                            merged.extend(stage_scope.clone());
                            merged
                        }
                        None => globals.clone(),
                    };
                    let bindings =
                        arg_bindings(arg, &scope, stage.is_some().then_some(&globals), overrides)?;
                    let text = resolve::resolve_instruction(instruction, &scope, &read_only)?;
                    let binding_scope = stage.as_mut().unwrap_or(&mut globals);
                    for (name, value) in bindings {
                        match value {
                            Some(value) => binding_scope.insert(name, value),
                            None => binding_scope.remove(&name),
                        };
                    }
                    (text, scope)
                }
                Instruction::Env(env) => {
                    let scope = stage.as_ref().unwrap_or(&globals).clone();
                    let bindings = env_bindings(env, &scope)?;
                    let text = resolve::resolve_instruction(instruction, &scope, &read_only)?;
                    stage.as_mut().unwrap_or(&mut globals).extend(bindings);
                    (text, scope)
                }
                _ => {
                    let scope = stage.as_ref().unwrap_or(&globals).clone();
                    let text = resolve::resolve_instruction(instruction, &scope, &read_only)?;
                    (text, scope)
                }
            };
            if target == Some(index) {
                target_output = Some(text.clone());
            }
            output.push_str(&text);
            scopes.push(Some(scope));
        }

        // Rewrite pass, only after the whole render succeeded.
        if options.update_inline {
            for (index, item) in self.items_mut().iter_mut().enumerate() {
                if matches!(target, Some(t) if t != index) {
                    continue;
                }
                let instruction = match item.as_instruction_mut() {
                    Some(instruction) => instruction,
                    None => continue,
                };
                if let Some(scope) = &scopes[index] {
                    resolve::resolve_instruction(instruction, scope, options)?;
                }
            }
        }

        match target {
            Some(_) => Ok(target_output.unwrap_or_default()),
            None => Ok(output),
        }
    }
}

/// The bindings one ARG instruction contributes: override first, then the
/// declared default (resolved against `scope`), then the global binding when
/// re-declaring inside a stage. `None` means the name becomes unset.
fn arg_bindings(
    arg: &ArgInstruction,
    scope: &HashMap<String, String>,
    globals: Option<&HashMap<String, String>>,
    overrides: &HashMap<String, String>,
) -> Result<Vec<(String, Option<String>)>> {
    let mut bindings = Vec::new();
    for declaration in arg.declaration_tokens() {
        let name = declaration.key();
        let value = if let Some(value) = overrides.get(&name) {
            Some(value.clone())
        } else if let Some(default) = declaration.value_literal() {
            Some(resolve::resolve_literal_value(default, scope)?)
        } else if let Some(globals) = globals {
            globals.get(&name).cloned()
        } else {
            None
        };
        bindings.push((name, value));
    }
    Ok(bindings)
}

fn env_bindings(
    env: &PairsInstruction,
    scope: &HashMap<String, String>,
) -> Result<Vec<(String, String)>> {
    let mut bindings = Vec::new();
    for pair in env.pair_tokens() {
        let value = resolve::resolve_pair_value(pair, scope)?.unwrap_or_default();
        bindings.push((pair.key(), value));
    }
    Ok(bindings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dockerfile::document::parse;

    fn overrides(entries: &[(&str, &str)]) -> HashMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    const STAGED: &str = "\
ARG TAG=3.20
ARG BASE=alpine:$TAG

FROM $BASE AS builder
ARG TAG
RUN echo building $TAG

FROM $BASE
RUN echo final $TAG
";

    #[test]
    fn test_stages_view_structure() {
        let doc = parse(STAGED).unwrap();
        let view = StagesView::new(&doc);
        assert_eq!(view.global_args().len(), 2);
        assert_eq!(view.stages().len(), 2);
        assert_eq!(view.stages()[0].name(), Some("builder".to_string()));
        assert_eq!(view.stages()[1].name(), None);
        assert_eq!(view.stage("builder").unwrap().instructions().count(), 2);
        assert!(view.stage("missing").is_none());
    }

    #[test]
    fn test_global_args_chain_and_stage_isolation() {
        let mut doc = parse(STAGED).unwrap();
        let text = doc
            .resolve_variables(&overrides(&[]), &ResolutionOptions::default())
            .unwrap();
        // BASE's default sees TAG; both FROMs see the globals; the first
        // stage re-declares TAG so its RUN sees it, the second does not.
        assert!(text.contains("FROM alpine:3.20 AS builder"));
        assert!(text.contains("RUN echo building 3.20"));
        assert!(text.contains("FROM alpine:3.20\n"));
        assert!(text.contains("RUN echo final \n"));
    }

    #[test]
    fn test_override_wins_over_default() {
        let mut doc = parse(STAGED).unwrap();
        let text = doc
            .resolve_variables(&overrides(&[("TAG", "edge")]), &ResolutionOptions::default())
            .unwrap();
        assert!(text.contains("FROM alpine:edge AS builder"));
        assert!(text.contains("RUN echo building edge"));
    }

    #[test]
    fn test_stage_arg_not_visible_before_redeclaration() {
        let source = "ARG A=1\nFROM alpine\nRUN echo $A\nARG A\nRUN echo $A\n";
        let mut doc = parse(source).unwrap();
        let text = doc
            .resolve_variables(&overrides(&[]), &ResolutionOptions::default())
            .unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[2], "RUN echo ");
        assert_eq!(lines[4], "RUN echo 1");
    }

    #[test]
    fn test_declaration_order_is_left_to_right() {
        let source = "ARG A=$B\nARG B=x\nARG C=$B\nFROM alpine:$A$C\n";
        let mut doc = parse(source).unwrap();
        let text = doc
            .resolve_variables(&overrides(&[]), &ResolutionOptions::default())
            .unwrap();
        // A's default is evaluated before B exists; C's after.
        assert!(text.contains("FROM alpine:x\n"));
    }

    #[test]
    fn test_stage_arg_default_resolves_against_globals() {
        let source = "ARG TAG=3.20\nFROM alpine\nARG IMAGE=alpine:$TAG\nRUN echo $IMAGE\n";
        let mut doc = parse(source).unwrap();
        let text = doc
            .resolve_variables(&overrides(&[]), &ResolutionOptions::default())
            .unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[2], "ARG IMAGE=alpine:3.20");
        assert_eq!(lines[3], "RUN echo alpine:3.20");
    }

    #[test]
    fn test_stage_bindings_shadow_globals_in_arg_defaults() {
        let source = "ARG V=global\nFROM alpine\nARG V=stage\nARG OUT=$V\nRUN echo $OUT\n";
        let mut doc = parse(source).unwrap();
        let text = doc
            .resolve_variables(&overrides(&[]), &ResolutionOptions::default())
            .unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[4], "RUN echo stage");
    }

    #[test]
    fn test_failed_resolution_rewrites_nothing() {
        let source = "ARG TAG=3.20\nFROM alpine:$TAG\nUSER ${WHO:?required}\n";
        let mut doc = parse(source).unwrap();
        let options = ResolutionOptions {
            update_inline: true,
            remove_escape_characters: false,
        };
        assert!(doc.resolve_variables(&overrides(&[]), &options).is_err());
        assert_eq!(doc.to_string(), source);
    }

    #[test]
    fn test_env_binds_and_shadows_arg() {
        let source = "FROM alpine\nARG V=from-arg\nENV V=from-env\nRUN echo $V\n";
        let mut doc = parse(source).unwrap();
        let text = doc
            .resolve_variables(&overrides(&[]), &ResolutionOptions::default())
            .unwrap();
        assert!(text.contains("RUN echo from-env"));
    }

    #[test]
    fn test_env_same_instruction_uses_previous_scope() {
        let source = "FROM alpine\nENV A=1\nENV A=2 B=$A\nRUN echo $A$B\n";
        let mut doc = parse(source).unwrap();
        let text = doc
            .resolve_variables(&overrides(&[]), &ResolutionOptions::default())
            .unwrap();
        assert!(text.contains("RUN echo 21"));
    }

    #[test]
    fn test_resolve_instruction_scoped() {
        let mut doc = parse(STAGED).unwrap();
        // Item indices: two ARGs, a blank line, then the first FROM.
        let from_index = doc
            .items()
            .iter()
            .position(|item| matches!(item.as_instruction(), Some(Instruction::From(_))))
            .unwrap();
        let text = doc
            .resolve_instruction(from_index, &overrides(&[]), &ResolutionOptions::default())
            .unwrap();
        assert_eq!(text, "FROM alpine:3.20 AS builder\n");
        // The document itself is untouched without update_inline.
        assert_eq!(doc.to_string(), STAGED);
    }

    #[test]
    fn test_resolve_instruction_update_inline_touches_only_target() {
        let mut doc = parse(STAGED).unwrap();
        let from_index = doc
            .items()
            .iter()
            .position(|item| matches!(item.as_instruction(), Some(Instruction::From(_))))
            .unwrap();
        let options = ResolutionOptions {
            update_inline: true,
            remove_escape_characters: false,
        };
        doc.resolve_instruction(from_index, &overrides(&[]), &options)
            .unwrap();
        let text = doc.to_string();
        assert!(text.contains("FROM alpine:3.20 AS builder"));
        // The second FROM keeps its reference.
        assert!(text.contains("FROM $BASE\n"));
    }

    #[test]
    fn test_resolve_instruction_rejects_non_instruction_index() {
        let mut doc = parse("# note\nFROM alpine\n").unwrap();
        assert!(doc
            .resolve_instruction(0, &overrides(&[]), &ResolutionOptions::default())
            .is_err());
        assert!(doc
            .resolve_instruction(9, &overrides(&[]), &ResolutionOptions::default())
            .is_err());
    }

    #[test]
    fn test_unset_required_variable_fails() {
        let source = "FROM alpine\nUSER ${WHO:?user required}\n";
        let mut doc = parse(source).unwrap();
        match doc.resolve_variables(&overrides(&[]), &ResolutionOptions::default()) {
            Err(Error::UndefinedVariable { name, detail }) => {
                assert_eq!(name, "WHO");
                assert_eq!(detail, "user required");
            }
            other => panic!("expected undefined-variable error, got {:?}", other),
        }
    }
}

//! Instruction nodes.
//!
//! One struct per argument shape rather than per keyword: RUN, CMD,
//! ENTRYPOINT, and SHELL share [`CommandInstruction`]; ENV and LABEL share
//! [`PairsInstruction`]; COPY and ADD share [`CopyInstruction`]; WORKDIR,
//! USER, STOPSIGNAL, and MAINTAINER share [`SimpleInstruction`]. The keyword
//! an instruction was written with is carried by the [`Instruction`] variant
//! (and by the keyword token inside the node, which preserves its original
//! casing).

pub mod arg;
pub mod command;
pub mod copy;
pub mod expose;
pub mod from;
pub mod generic;
pub mod healthcheck;
pub mod image;
pub mod pairs;
pub mod simple;
pub(crate) mod splice;

use std::fmt;

use crate::dockerfile::error::Result;
use crate::dockerfile::token::core::{KeywordToken, Token};

pub use arg::{ArgDeclaration, ArgInstruction};
pub use command::{Command, CommandInstruction, ExecFormCommand, ShellFormCommand};
pub use copy::CopyInstruction;
pub use expose::ExposeInstruction;
pub use from::FromInstruction;
pub use generic::GenericInstruction;
pub use healthcheck::{HealthcheckBody, HealthcheckInstruction};
pub use image::ImageName;
pub use pairs::PairsInstruction;
pub use simple::SimpleInstruction;

/// A parsed instruction, tagged by keyword.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    From(FromInstruction),
    Arg(ArgInstruction),
    Env(PairsInstruction),
    Label(PairsInstruction),
    Run(CommandInstruction),
    Cmd(CommandInstruction),
    Entrypoint(CommandInstruction),
    Shell(CommandInstruction),
    Copy(CopyInstruction),
    Add(CopyInstruction),
    Healthcheck(HealthcheckInstruction),
    Expose(ExposeInstruction),
    Workdir(SimpleInstruction),
    User(SimpleInstruction),
    Stopsignal(SimpleInstruction),
    Maintainer(SimpleInstruction),
    Volume(GenericInstruction),
    Onbuild(GenericInstruction),
}

impl Instruction {
    /// The canonical (upper-case) keyword for this instruction.
    pub fn kind(&self) -> &'static str {
        match self {
            Instruction::From(_) => "FROM",
            Instruction::Arg(_) => "ARG",
            Instruction::Env(_) => "ENV",
            Instruction::Label(_) => "LABEL",
            Instruction::Run(_) => "RUN",
            Instruction::Cmd(_) => "CMD",
            Instruction::Entrypoint(_) => "ENTRYPOINT",
            Instruction::Shell(_) => "SHELL",
            Instruction::Copy(_) => "COPY",
            Instruction::Add(_) => "ADD",
            Instruction::Healthcheck(_) => "HEALTHCHECK",
            Instruction::Expose(_) => "EXPOSE",
            Instruction::Workdir(_) => "WORKDIR",
            Instruction::User(_) => "USER",
            Instruction::Stopsignal(_) => "STOPSIGNAL",
            Instruction::Maintainer(_) => "MAINTAINER",
            Instruction::Volume(_) => "VOLUME",
            Instruction::Onbuild(_) => "ONBUILD",
        }
    }

    /// The keyword token as written (original casing).
    pub fn keyword(&self) -> Result<&KeywordToken> {
        match self {
            Instruction::From(i) => i.keyword(),
            Instruction::Arg(i) => i.keyword(),
            Instruction::Env(i) | Instruction::Label(i) => i.keyword(),
            Instruction::Run(i)
            | Instruction::Cmd(i)
            | Instruction::Entrypoint(i)
            | Instruction::Shell(i) => i.keyword(),
            Instruction::Copy(i) | Instruction::Add(i) => i.keyword(),
            Instruction::Healthcheck(i) => i.keyword(),
            Instruction::Expose(i) => i.keyword(),
            Instruction::Workdir(i)
            | Instruction::User(i)
            | Instruction::Stopsignal(i)
            | Instruction::Maintainer(i) => i.keyword(),
            Instruction::Volume(i) | Instruction::Onbuild(i) => i.keyword(),
        }
    }

    pub fn as_from(&self) -> Option<&FromInstruction> {
        match self {
            Instruction::From(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_from_mut(&mut self) -> Option<&mut FromInstruction> {
        match self {
            Instruction::From(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_arg(&self) -> Option<&ArgInstruction> {
        match self {
            Instruction::Arg(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_arg_mut(&mut self) -> Option<&mut ArgInstruction> {
        match self {
            Instruction::Arg(i) => Some(i),
            _ => None,
        }
    }

    /// The pair list for ENV and LABEL.
    pub fn as_pairs(&self) -> Option<&PairsInstruction> {
        match self {
            Instruction::Env(i) | Instruction::Label(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_pairs_mut(&mut self) -> Option<&mut PairsInstruction> {
        match self {
            Instruction::Env(i) | Instruction::Label(i) => Some(i),
            _ => None,
        }
    }

    /// The command node for RUN, CMD, ENTRYPOINT, and SHELL.
    pub fn as_command(&self) -> Option<&CommandInstruction> {
        match self {
            Instruction::Run(i)
            | Instruction::Cmd(i)
            | Instruction::Entrypoint(i)
            | Instruction::Shell(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_command_mut(&mut self) -> Option<&mut CommandInstruction> {
        match self {
            Instruction::Run(i)
            | Instruction::Cmd(i)
            | Instruction::Entrypoint(i)
            | Instruction::Shell(i) => Some(i),
            _ => None,
        }
    }

    /// The path-copying node for COPY and ADD.
    pub fn as_copy(&self) -> Option<&CopyInstruction> {
        match self {
            Instruction::Copy(i) | Instruction::Add(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_copy_mut(&mut self) -> Option<&mut CopyInstruction> {
        match self {
            Instruction::Copy(i) | Instruction::Add(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_healthcheck(&self) -> Option<&HealthcheckInstruction> {
        match self {
            Instruction::Healthcheck(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_healthcheck_mut(&mut self) -> Option<&mut HealthcheckInstruction> {
        match self {
            Instruction::Healthcheck(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_expose(&self) -> Option<&ExposeInstruction> {
        match self {
            Instruction::Expose(i) => Some(i),
            _ => None,
        }
    }

    /// The single-value node for WORKDIR, USER, STOPSIGNAL, and MAINTAINER.
    pub fn as_simple(&self) -> Option<&SimpleInstruction> {
        match self {
            Instruction::Workdir(i)
            | Instruction::User(i)
            | Instruction::Stopsignal(i)
            | Instruction::Maintainer(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_simple_mut(&mut self) -> Option<&mut SimpleInstruction> {
        match self {
            Instruction::Workdir(i)
            | Instruction::User(i)
            | Instruction::Stopsignal(i)
            | Instruction::Maintainer(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_generic(&self) -> Option<&GenericInstruction> {
        match self {
            Instruction::Volume(i) | Instruction::Onbuild(i) => Some(i),
            _ => None,
        }
    }

    /// The instruction's token storage as a list of ordered groups. Groups
    /// concatenate, in order, to the instruction's full text.
    pub(crate) fn token_groups(&self) -> Vec<&[Token]> {
        match self {
            Instruction::From(i) => vec![i.tokens()],
            Instruction::Arg(i) => vec![i.tokens()],
            Instruction::Env(i) | Instruction::Label(i) => vec![i.tokens()],
            Instruction::Run(i)
            | Instruction::Cmd(i)
            | Instruction::Entrypoint(i)
            | Instruction::Shell(i) => vec![i.head(), i.command().tokens(), i.trail()],
            Instruction::Copy(i) | Instruction::Add(i) => vec![i.tokens()],
            Instruction::Healthcheck(i) => {
                let mut groups = vec![i.head()];
                match i.body() {
                    HealthcheckBody::Disabled(tokens) => groups.push(tokens.as_slice()),
                    HealthcheckBody::Command { prelude, command } => {
                        groups.push(prelude.as_slice());
                        groups.push(command.tokens());
                    }
                }
                groups.push(i.trail());
                groups
            }
            Instruction::Expose(i) => vec![i.tokens()],
            Instruction::Workdir(i)
            | Instruction::User(i)
            | Instruction::Stopsignal(i)
            | Instruction::Maintainer(i) => vec![i.tokens()],
            Instruction::Volume(i) | Instruction::Onbuild(i) => vec![i.tokens()],
        }
    }

    /// The mutable form of [`Instruction::token_groups`], for the resolver to
    /// rewrite.
    pub(crate) fn token_groups_mut(&mut self) -> Vec<&mut Vec<Token>> {
        match self {
            Instruction::From(i) => vec![i.tokens_mut()],
            Instruction::Arg(i) => vec![i.tokens_mut()],
            Instruction::Env(i) | Instruction::Label(i) => vec![i.tokens_mut()],
            Instruction::Run(i)
            | Instruction::Cmd(i)
            | Instruction::Entrypoint(i)
            | Instruction::Shell(i) => {
                let (head, command, trail) = i.parts_mut();
                vec![head, command.tokens_mut(), trail]
            }
            Instruction::Copy(i) | Instruction::Add(i) => vec![i.tokens_mut()],
            Instruction::Healthcheck(i) => {
                let (head, body, trail) = i.parts_mut();
                let mut groups = vec![head];
                match body {
                    HealthcheckBody::Disabled(tokens) => groups.push(tokens),
                    HealthcheckBody::Command { prelude, command } => {
                        groups.push(prelude);
                        groups.push(command.tokens_mut());
                    }
                }
                groups.push(trail);
                groups
            }
            Instruction::Expose(i) => vec![i.tokens_mut()],
            Instruction::Workdir(i)
            | Instruction::User(i)
            | Instruction::Stopsignal(i)
            | Instruction::Maintainer(i) => vec![i.tokens_mut()],
            Instruction::Volume(i) | Instruction::Onbuild(i) => vec![i.tokens_mut()],
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::From(i) => i.fmt(f),
            Instruction::Arg(i) => i.fmt(f),
            Instruction::Env(i) | Instruction::Label(i) => i.fmt(f),
            Instruction::Run(i)
            | Instruction::Cmd(i)
            | Instruction::Entrypoint(i)
            | Instruction::Shell(i) => i.fmt(f),
            Instruction::Copy(i) | Instruction::Add(i) => i.fmt(f),
            Instruction::Healthcheck(i) => i.fmt(f),
            Instruction::Expose(i) => i.fmt(f),
            Instruction::Workdir(i)
            | Instruction::User(i)
            | Instruction::Stopsignal(i)
            | Instruction::Maintainer(i) => i.fmt(f),
            Instruction::Volume(i) | Instruction::Onbuild(i) => i.fmt(f),
        }
    }
}

//! A lossless Dockerfile object model.
//!
//! `parse` turns source text into a [`Dockerfile`] whose token tree preserves
//! every byte of the input (casing, whitespace, comments, line continuations),
//! so `to_string()` reproduces the source exactly. The typed instruction
//! nodes support targeted mutation without disturbing surrounding text, and
//! the resolver substitutes `$VAR`/`${VAR...}` references with full ARG/ENV
//! stage scoping.

pub mod combinators;
pub mod document;
pub mod error;
pub mod formats;
pub mod grammar;
pub mod instruction;
pub mod resolve;
pub mod stages;
pub mod testing;
pub mod token;

pub use document::{parse, Dockerfile, Item, ParserDirective, WhitespaceLine, DEFAULT_ESCAPE_CHAR};
pub use error::{Error, Result};
pub use instruction::{
    ArgDeclaration, ArgInstruction, Command, CommandInstruction, CopyInstruction,
    ExecFormCommand, ExposeInstruction, FromInstruction, GenericInstruction, HealthcheckBody,
    HealthcheckInstruction, ImageName, Instruction, PairsInstruction, ShellFormCommand,
    SimpleInstruction,
};
pub use resolve::ResolutionOptions;
pub use stages::{Stage, StagesView};
pub use token::{
    tokens_text, CommentToken, IdentifierToken, KeyValueToken, KeywordToken,
    LineContinuationToken, LiteralToken, Modifier, NewlineToken, StringToken, SymbolToken, Token,
    VariableRefToken, WhitespaceToken,
};

//! The lossless token tree.
//!
//! Tokens come in two kinds:
//!
//! Primitive tokens:
//!     String runs, symbols, whitespace, newlines, keywords, identifiers.
//!     Leaves whose value is stored directly. See [core].
//!
//! Aggregate tokens:
//!     Nodes owning an ordered list of child tokens, reconstructible by
//!     concatenating the children's text. Comments, line continuations,
//!     literals (with the quoting model), variable references, and key/value
//!     pairs. See [literal], [variable], [keyvalue].
//!
//! Serialization never re-parses and never reformats: `to_string()` on any
//! token is pure concatenation, which is what makes parse → serialize an
//! exact identity and edits strictly local.

pub mod core;
pub mod keyvalue;
pub mod literal;
pub mod variable;

pub use core::{
    tokens_text, CommentToken, KeywordToken, LineContinuationToken, NewlineToken, StringToken,
    SymbolToken, Token, WhitespaceToken,
};
pub use keyvalue::KeyValueToken;
pub use literal::{IdentifierToken, LiteralToken};
pub use variable::{Modifier, VariableRefToken};

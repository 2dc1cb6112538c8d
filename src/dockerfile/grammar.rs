//! Grammar rules, layered over the combinator engine.
//!
//! [values] holds the shared vocabulary (whitespace, continuations, comments,
//! literals, variable references, flags, the inter-argument gap); [command]
//! the exec-form and shell-form command shapes; [instructions] the
//! per-keyword instruction grammars and the keyword table.
//!
//! Every rule that can cross a line continuation takes the document's escape
//! character as a parameter, so a parsed `escape=` directive changes behavior
//! without any global state.

pub mod command;
pub mod instructions;
pub mod values;

pub use instructions::{is_instruction_keyword, leading_word, parse_instruction};

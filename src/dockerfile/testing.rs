//! Fluent assertion helpers for document tests.
//!
//! `assert_document` wraps a parsed [`Dockerfile`] in a builder that checks
//! item shape, instruction kinds, and the round-trip guarantee with far less
//! boilerplate than matching on [`Item`] variants by hand.

use crate::dockerfile::document::{Dockerfile, Item};
use crate::dockerfile::instruction::Instruction;

/// Parses `source` and asserts the result reserializes to the input exactly.
pub fn parse_round_trip(source: &str) -> Dockerfile {
    let doc = crate::dockerfile::parse(source)
        .unwrap_or_else(|err| panic!("parse failed for {:?}: {}", source, err));
    assert_eq!(
        doc.to_string(),
        source,
        "reserialized text differs from input"
    );
    doc
}

/// Create an assertion builder for a parsed document.
pub fn assert_document(doc: &Dockerfile) -> DocumentAssertion<'_> {
    DocumentAssertion { doc }
}

pub struct DocumentAssertion<'a> {
    doc: &'a Dockerfile,
}

impl<'a> DocumentAssertion<'a> {
    pub fn item_count(self, expected: usize) -> Self {
        let actual = self.doc.items().len();
        assert_eq!(
            actual,
            expected,
            "expected {} items, found {}: [{}]",
            expected,
            actual,
            summarize_items(self.doc.items())
        );
        self
    }

    pub fn instruction_count(self, expected: usize) -> Self {
        let actual = self.doc.instructions().count();
        assert_eq!(
            actual,
            expected,
            "expected {} instructions, found {}: [{}]",
            expected,
            actual,
            summarize_items(self.doc.items())
        );
        self
    }

    /// Assert on the instruction at the given position (counting instructions
    /// only, not comments or blank lines).
    pub fn instruction<F>(self, index: usize, assertion: F) -> Self
    where
        F: FnOnce(InstructionAssertion<'a>),
    {
        let instruction = self
            .doc
            .instructions()
            .nth(index)
            .unwrap_or_else(|| {
                panic!(
                    "instruction index {} out of bounds ({} instructions: [{}])",
                    index,
                    self.doc.instructions().count(),
                    summarize_items(self.doc.items())
                )
            });
        assertion(InstructionAssertion {
            instruction,
            context: format!("instructions[{}]", index),
        });
        self
    }

    pub fn serializes_to(self, expected: &str) -> Self {
        assert_eq!(self.doc.to_string(), expected);
        self
    }
}

pub struct InstructionAssertion<'a> {
    instruction: &'a Instruction,
    context: String,
}

impl<'a> InstructionAssertion<'a> {
    pub fn kind(self, expected: &str) -> Self {
        assert_eq!(
            self.instruction.kind(),
            expected,
            "{}: wrong instruction kind",
            self.context
        );
        self
    }

    pub fn text(self, expected: &str) -> Self {
        assert_eq!(
            self.instruction.to_string(),
            expected,
            "{}: wrong instruction text",
            self.context
        );
        self
    }

    pub fn inner(self) -> &'a Instruction {
        self.instruction
    }
}

fn summarize_items(items: &[Item]) -> String {
    items
        .iter()
        .map(|item| match item {
            Item::Directive(d) => format!("directive({})", d.key()),
            Item::Comment(_) => "comment".to_string(),
            Item::Whitespace(_) => "whitespace".to_string(),
            Item::Instruction(inst) => inst.kind().to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

//! # dockerfile-model
//!
//! A lossless parser and mutable object model for Dockerfiles.
//!
//! Parsing produces a token tree that preserves the input byte for byte, so
//! a parsed document reserializes to exactly the text it came from. Typed
//! instruction nodes allow targeted edits (set a tag, add a flag, update a
//! pair) that leave all surrounding formatting untouched, and the resolver
//! substitutes variable references with the same ARG/ENV scoping rules Docker
//! applies across build stages.
//!
//! ## Testing
//!
//! Document tests use the fluent helpers in the
//! [testing module](dockerfile::testing) rather than matching on item
//! variants by hand.

pub mod dockerfile;

pub use dockerfile::{parse, Dockerfile, Error, Result};

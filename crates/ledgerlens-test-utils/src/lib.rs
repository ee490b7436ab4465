//! # ledgerlens-test-utils
//!
//! Fixture builders and shared assertions for testing the parsing engine.
//!
//! The central piece is [`StatementFixture`], which lays out text
//! fragments on a synthetic page grid the way a PDF extractor would
//! deliver them, so tests can describe statements as tables instead of
//! hand-placing coordinates.

pub mod assertions;
pub mod fixtures;

pub use assertions::*;
pub use fixtures::*;

//! # ledgerlens-config
//!
//! Configuration schema and validation for the statement parsing engine.
//!
//! `ProcessingConfig` covers every recognized option with serde defaults;
//! `validation` rejects out-of-range values before a pipeline run starts.

pub mod schema;
pub mod validation;

pub use schema::*;
pub use validation::validate_config;

//! # ledgerlens-core
//!
//! Core domain models and shared infrastructure for the statement parsing engine.
//!
//! This crate provides the foundational types used throughout the pipeline:
//! - Positioned-text geometry (bounding boxes, fragments, lines)
//! - Table structure models (regions, column boundaries, extracted rows)
//! - Transaction and document models with validation metadata
//! - Per-cell provenance tracking (every emitted value traces to source text)
//! - Deterministic transaction-ID factory for reproducible output
//! - Compile-time pattern catalogs (dates, headers, categories, currencies, banks)

pub mod catalog;
pub mod confidence;
pub mod error;
pub mod geometry;
pub mod id_factory;
pub mod models;
pub mod provenance;

pub use confidence::*;
pub use error::*;
pub use geometry::*;
pub use id_factory::*;
pub use models::*;
pub use provenance::*;

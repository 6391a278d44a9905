//! Common types and utilities for the Moss compiler.
//!
//! This crate provides foundational types used across all Moss crates:
//! - String interning (`Atom`, `Interner`)
//! - Source spans (`Span`)
//! - Diagnostics (category, code, message)
//! - Compiler limits and thresholds

// String interning for identifier deduplication
pub mod interner;
pub use interner::{Atom, Interner};

// Span - source location tracking (byte offsets)
pub mod span;
pub use span::Span;

// Diagnostics - category/code/message model
pub mod diagnostics;
pub use diagnostics::{Diagnostic, DiagnosticCategory, codes};

// Centralized limits and thresholds
pub mod limits;

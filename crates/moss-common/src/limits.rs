//! Centralized limits and thresholds for the Moss compiler.
//!
//! Solver recursion limits (member resolution, castability, substitution)
//! live in `moss_solver::recursion::RecursionProfile`; the profiles are the
//! single source of truth there. This module holds the limits that other
//! layers share.

/// Maximum nesting depth of type syntax accepted from the parser boundary.
///
/// An unresolved type reference deeper than this (e.g. hundreds of nested
/// type arguments) is rejected before resolution rather than recursed into.
pub const MAX_TYPE_SYNTAX_DEPTH: u32 = 128;

/// Maximum number of explicit type arguments on a single reference.
///
/// Far above anything a real program declares; bounds allocation when the
/// parser hands over malformed input.
pub const MAX_TYPE_ARGUMENTS: usize = 64;

/// Pre-allocation size for member groups on a freshly built member set.
pub const MEMBER_GROUP_CAPACITY: usize = 8;

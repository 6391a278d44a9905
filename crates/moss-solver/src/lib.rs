//! Type system and overload resolution for the Moss compiler front end.
//!
//! This crate turns syntactic call sites, declarations, and generic
//! signatures into a fully resolved, type-checked representation that
//! bytecode emitters, source emitters, and IDE tooling consume unchanged.
//! It provides:
//!
//! - **Interned type descriptors**: O(1) type equality via structural
//!   hash-consing (`TypeId` comparison)
//! - **Generic substitution**: nested, capture-avoiding parameter mappers
//! - **Signature matching and inference**: exact and implicit-cast overload
//!   applicability, bidirectional type-argument inference
//! - **Cached member resolution**: the merged member surface of any
//!   instantiated type, built once per session and safe under re-entrant
//!   queries on mutually recursive type graphs
//!
//! Resolution is synchronous and deterministic; all shared state lives in
//! explicitly passed, session-scoped context objects.

pub mod builtins;
pub mod calls;
pub mod def;
pub mod format;
pub mod header;
pub mod intern;
pub mod member_ref;
pub mod members;
pub mod recursion;
pub mod scope;
pub mod substitute;
pub mod types;
pub mod unify;

pub use builtins::register_builtins;
pub use calls::{BoundCall, CallArguments, CallResult, OverrideResult};
pub use def::{
    DefId, DefKind, DefinitionInfo, DefinitionStore, ExpansionDecl, ExpansionId, MemberDecl,
    MemberId, MemberKind, MemberModifiers, OperatorKind, TypeParamId,
};
pub use format::TypeFormatter;
pub use header::{ExprRef, FunctionHeader, FunctionParameter, Instantiated};
pub use intern::TypeInterner;
pub use member_ref::{DefinitionMemberRef, FunctionalMemberRef};
pub use members::{
    MemberEntry, MemberGroup, MemberName, MemberPriority, ResolutionContext, TypeMembers,
};
pub use recursion::{Enter, RecursionGuard, RecursionProfile};
pub use scope::{
    BuiltinScope, StackedScope, TypeScope, TypeSymbol, UnresolvedType, UnresolvedTypeRef,
    resolve_type_ref,
};
pub use substitute::{GenericMapper, instantiate_stored, instantiate_type};
pub use types::{
    FunctionShape, FunctionShapeId, ParamBound, Primitive, ShapeParam, StorageClass, StoredType,
    TypeData, TypeId, TypeParamData,
};

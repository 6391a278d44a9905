//! Definition identifiers and storage.
//!
//! The solver addresses nominal types, their members, type parameters, and
//! expansions through stable integer ids rather than owning references, so
//! mutually recursive graphs (a type's members mention the type; supertypes
//! are referenced back by overrides) are expressible without ownership
//! cycles.
//!
//! The store is `DashMap`-backed: entries are written once at registration
//! and read many times during resolution, so an external driver may check
//! independent files in parallel against one shared store.

use crate::header::FunctionHeader;
use crate::member_ref::FunctionalMemberRef;
use crate::types::{ParamBound, TypeId, TypeParamData};
use bitflags::bitflags;
use dashmap::DashMap;
use moss_common::{Atom, Span};
use std::sync::RwLock;
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::trace;

/// Identifier of a registered nominal definition.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DefId(pub u32);

impl DefId {
    /// Sentinel value for an invalid `DefId`.
    pub const INVALID: Self = Self(0);

    /// First valid `DefId`.
    pub const FIRST_VALID: u32 = 1;

    pub const fn is_valid(self) -> bool {
        self.0 >= Self::FIRST_VALID
    }
}

/// Identifier of a declared type parameter.
///
/// Identity, not name, distinguishes parameters: two `T`s declared in
/// different positions receive different ids and never unify with each other.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeParamId(pub u32);

/// Identifier of a registered member declaration.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MemberId(pub u32);

/// Identifier of a registered expansion.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExpansionId(pub u32);

/// Kind of nominal definition.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DefKind {
    Class,
    Interface,
    Struct,
    Enum,
    Variant,
}

/// A registered nominal definition.
///
/// `superclass` and `interfaces` are expressed in terms of the definition's
/// own type parameters; they are instantiated through the receiver's
/// type-argument mapper during member resolution.
#[derive(Clone, Debug)]
pub struct DefinitionInfo {
    pub kind: DefKind,
    pub name: Atom,
    pub type_params: Vec<TypeParamId>,
    pub superclass: Option<TypeId>,
    pub interfaces: Vec<TypeId>,
    /// Member declarations in declaration order.
    pub members: Vec<MemberId>,
    pub span: Option<Span>,
}

impl DefinitionInfo {
    pub fn new(kind: DefKind, name: Atom, type_params: Vec<TypeParamId>) -> Self {
        Self {
            kind,
            name,
            type_params,
            superclass: None,
            interfaces: Vec::new(),
            members: Vec::new(),
            span: None,
        }
    }

    pub fn class(name: Atom, type_params: Vec<TypeParamId>) -> Self {
        Self::new(DefKind::Class, name, type_params)
    }

    pub fn interface(name: Atom, type_params: Vec<TypeParamId>) -> Self {
        Self::new(DefKind::Interface, name, type_params)
    }

    pub fn with_superclass(mut self, superclass: TypeId) -> Self {
        self.superclass = Some(superclass);
        self
    }

    pub fn with_interfaces(mut self, interfaces: Vec<TypeId>) -> Self {
        self.interfaces = interfaces;
        self
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }
}

bitflags! {
    /// Modifiers on a member declaration.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
    pub struct MemberModifiers: u16 {
        const STATIC   = 1 << 0;
        const CONST    = 1 << 1;
        const FINAL    = 1 << 2;
        /// Caster members only: participates in implicit conversion.
        const IMPLICIT = 1 << 3;
        const EXTERN   = 1 << 4;
        const ABSTRACT = 1 << 5;
        const OVERRIDE = 1 << 6;
    }
}

/// Overloadable operators.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OperatorKind {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Neg,
    Not,
    Index,
    IndexSet,
    Equals,
    Compare,
    Contains,
    Call,
}

impl OperatorKind {
    pub const fn symbol(self) -> &'static str {
        match self {
            OperatorKind::Add => "+",
            OperatorKind::Sub => "-",
            OperatorKind::Mul => "*",
            OperatorKind::Div => "/",
            OperatorKind::Mod => "%",
            OperatorKind::Neg => "-",
            OperatorKind::Not => "!",
            OperatorKind::Index => "[]",
            OperatorKind::IndexSet => "[]=",
            OperatorKind::Equals => "==",
            OperatorKind::Compare => "<=>",
            OperatorKind::Contains => "in",
            OperatorKind::Call => "()",
        }
    }
}

/// What a member declaration is.
///
/// Every kind carries a [`FunctionHeader`] so instantiation and matching are
/// uniform: fields and constants use a nullary header whose return type is
/// the member type, getters `() -> T`, setters `(T) -> void`, casters
/// `() -> Target`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MemberKind {
    Method { name: Atom },
    Constructor,
    Operator(OperatorKind),
    /// Conversion to the header's return type.
    Caster,
    Field { name: Atom },
    Getter { name: Atom },
    Setter { name: Atom },
    Constant { name: Atom },
}

impl MemberKind {
    /// Name atom for named members; operators, constructors and casters
    /// resolve through their own channels.
    pub const fn name(self) -> Option<Atom> {
        match self {
            MemberKind::Method { name }
            | MemberKind::Field { name }
            | MemberKind::Getter { name }
            | MemberKind::Setter { name }
            | MemberKind::Constant { name } => Some(name),
            MemberKind::Constructor | MemberKind::Operator(_) | MemberKind::Caster => None,
        }
    }

    /// Whether the member is invoked with an argument list.
    pub const fn is_callable(self) -> bool {
        matches!(
            self,
            MemberKind::Method { .. } | MemberKind::Constructor | MemberKind::Operator(_)
        )
    }
}

/// A raw member declaration, as handed over by the parser collaborator.
#[derive(Clone, Debug)]
pub struct MemberDecl {
    pub kind: MemberKind,
    pub modifiers: MemberModifiers,
    pub header: FunctionHeader,
    pub span: Option<Span>,
}

impl MemberDecl {
    pub fn new(kind: MemberKind, modifiers: MemberModifiers, header: FunctionHeader) -> Self {
        Self {
            kind,
            modifiers,
            header,
            span: None,
        }
    }
}

/// An expansion: members attached to an existing (possibly foreign) type
/// without touching its declaration.
///
/// `target` is a pattern type expressed in terms of `type_params`; a receiver
/// matches when the pattern unifies structurally against it (`unify.rs`).
#[derive(Clone, Debug)]
pub struct ExpansionDecl {
    pub type_params: Vec<TypeParamId>,
    pub target: TypeId,
    pub members: Vec<MemberId>,
    pub span: Option<Span>,
}

/// Session-scoped storage for definitions, members, type parameters, and
/// expansions.
pub struct DefinitionStore {
    definitions: DashMap<DefId, DefinitionInfo, rustc_hash::FxBuildHasher>,
    members: DashMap<MemberId, MemberDecl, rustc_hash::FxBuildHasher>,
    type_params: DashMap<TypeParamId, TypeParamData, rustc_hash::FxBuildHasher>,
    expansions: DashMap<ExpansionId, ExpansionDecl, rustc_hash::FxBuildHasher>,
    /// Expansions in registration order; `DashMap` iteration order is not
    /// deterministic and member-cache population must be.
    expansion_order: RwLock<Vec<ExpansionId>>,
    /// Override links discovered by override resolution. The only
    /// post-registration mutation of member state.
    overrides: DashMap<MemberId, FunctionalMemberRef, rustc_hash::FxBuildHasher>,
    next_def: AtomicU32,
    next_member: AtomicU32,
    next_param: AtomicU32,
    next_expansion: AtomicU32,
}

impl Default for DefinitionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DefinitionStore {
    pub fn new() -> Self {
        Self {
            definitions: DashMap::default(),
            members: DashMap::default(),
            type_params: DashMap::default(),
            expansions: DashMap::default(),
            expansion_order: RwLock::new(Vec::new()),
            overrides: DashMap::default(),
            next_def: AtomicU32::new(DefId::FIRST_VALID),
            next_member: AtomicU32::new(0),
            next_param: AtomicU32::new(0),
            next_expansion: AtomicU32::new(0),
        }
    }

    /// Register a new definition and return its `DefId`.
    pub fn register(&self, info: DefinitionInfo) -> DefId {
        let id = DefId(self.next_def.fetch_add(1, Ordering::SeqCst));
        trace!(def_id = id.0, kind = ?info.kind, "DefinitionStore::register");
        self.definitions.insert(id, info);
        id
    }

    pub fn get(&self, id: DefId) -> Option<DefinitionInfo> {
        self.definitions.get(&id).map(|r| r.clone())
    }

    pub fn get_name(&self, id: DefId) -> Option<Atom> {
        self.definitions.get(&id).map(|r| r.name)
    }

    pub fn get_kind(&self, id: DefId) -> Option<DefKind> {
        self.definitions.get(&id).map(|r| r.kind)
    }

    pub fn get_type_params(&self, id: DefId) -> Vec<TypeParamId> {
        self.definitions
            .get(&id)
            .map(|r| r.type_params.clone())
            .unwrap_or_default()
    }

    /// Attach a member to an existing definition. Used both during initial
    /// registration and by the edit path; callers on the edit path must
    /// invalidate affected member-cache entries afterwards.
    pub fn add_member(&self, def: DefId, decl: MemberDecl) -> MemberId {
        let id = MemberId(self.next_member.fetch_add(1, Ordering::SeqCst));
        trace!(def_id = def.0, member_id = id.0, kind = ?decl.kind, "DefinitionStore::add_member");
        self.members.insert(id, decl);
        if let Some(mut info) = self.definitions.get_mut(&def) {
            info.members.push(id);
        }
        id
    }

    /// Register a member owned by an expansion rather than a definition.
    pub fn add_expansion_member(&self, decl: MemberDecl) -> MemberId {
        let id = MemberId(self.next_member.fetch_add(1, Ordering::SeqCst));
        self.members.insert(id, decl);
        id
    }

    pub fn member(&self, id: MemberId) -> Option<MemberDecl> {
        self.members.get(&id).map(|r| r.clone())
    }

    /// Replace a member's header after override inference fills its
    /// undetermined parts. Callers invalidate affected member-cache entries.
    pub fn update_member_header(&self, id: MemberId, header: FunctionHeader) {
        if let Some(mut decl) = self.members.get_mut(&id) {
            decl.header = header;
        }
    }

    /// Set the superclass after registration. Heritage routinely references
    /// the definition's own id (`Loop<T> : Loop<Loop<T>>` is at least
    /// expressible), so it cannot always be supplied up front.
    pub fn set_superclass(&self, id: DefId, superclass: TypeId) {
        if let Some(mut info) = self.definitions.get_mut(&id) {
            info.superclass = Some(superclass);
        }
    }

    /// Set the implemented interfaces after registration.
    pub fn set_interfaces(&self, id: DefId, interfaces: Vec<TypeId>) {
        if let Some(mut info) = self.definitions.get_mut(&id) {
            info.interfaces = interfaces;
        }
    }

    /// Allocate a fresh type parameter.
    pub fn type_param(&self, name: Atom) -> TypeParamId {
        let id = TypeParamId(self.next_param.fetch_add(1, Ordering::SeqCst));
        self.type_params.insert(
            id,
            TypeParamData {
                name,
                bounds: Vec::new(),
            },
        );
        id
    }

    /// Append a bound to a type parameter. Bounds may reference the parameter
    /// itself, so they are attached after allocation.
    pub fn add_bound(&self, param: TypeParamId, bound: ParamBound) {
        if let Some(mut data) = self.type_params.get_mut(&param) {
            data.bounds.push(bound);
        }
    }

    pub fn param_data(&self, id: TypeParamId) -> Option<TypeParamData> {
        self.type_params.get(&id).map(|r| r.clone())
    }

    pub fn param_name(&self, id: TypeParamId) -> Option<Atom> {
        self.type_params.get(&id).map(|r| r.name)
    }

    /// Register an expansion. Registration order is resolution order.
    pub fn register_expansion(&self, decl: ExpansionDecl) -> ExpansionId {
        let id = ExpansionId(self.next_expansion.fetch_add(1, Ordering::SeqCst));
        trace!(expansion_id = id.0, "DefinitionStore::register_expansion");
        self.expansions.insert(id, decl);
        self.expansion_order
            .write()
            .expect("expansion order lock poisoned")
            .push(id);
        id
    }

    pub fn expansion(&self, id: ExpansionId) -> Option<ExpansionDecl> {
        self.expansions.get(&id).map(|r| r.clone())
    }

    /// All expansions in registration order.
    pub fn expansion_ids(&self) -> Vec<ExpansionId> {
        self.expansion_order
            .read()
            .expect("expansion order lock poisoned")
            .clone()
    }

    /// Attach the discovered override link for a member.
    pub fn set_overrides(&self, member: MemberId, target: FunctionalMemberRef) {
        self.overrides.insert(member, target);
    }

    pub fn get_overrides(&self, member: MemberId) -> Option<FunctionalMemberRef> {
        self.overrides.get(&member).map(|r| r.clone())
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

#[cfg(test)]
#[path = "../tests/def_tests.rs"]
mod tests;

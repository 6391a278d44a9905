//! Member references: a raw declaration bound to an owning instantiation.
//!
//! A reference pairs a member declaration with the concrete receiver type it
//! was found on and the substitution that instantiation implies. The
//! instantiated header is a lazily-computed memoization cell: bound
//! computation can require reentrant resolution of signatures that are not
//! ready yet, so first access computes and caches, a re-entrant access during
//! computation observes a transient undetermined placeholder instead of
//! recursing, and the captured mapper is discarded once the header exists.

use crate::def::{DefinitionStore, MemberDecl, MemberId, MemberKind, MemberModifiers, TypeParamId};
use crate::header::{FunctionHeader, FunctionParameter};
use crate::intern::TypeInterner;
use crate::substitute::GenericMapper;
use crate::types::{StoredType, TypeId};
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::{Arc, Mutex};

enum HeaderSlot {
    Pending(GenericMapper),
    InProgress,
    Ready(FunctionHeader),
}

struct RefInner {
    decl: MemberId,
    owner: StoredType,
    /// The mapper's effective bindings projected onto the type parameters
    /// the declaration actually uses, sorted by id. Identity of the
    /// reference: two references produced through different substitution
    /// paths but yielding the same concrete signature on the same type
    /// have equal projections.
    bindings: Vec<(TypeParamId, TypeId)>,
    header_cell: Mutex<HeaderSlot>,
}

/// A member declaration bound to a specific owning-type instantiation.
#[derive(Clone)]
pub struct DefinitionMemberRef {
    inner: Arc<RefInner>,
}

impl DefinitionMemberRef {
    /// Bind `decl` to `owner` under `mapper`.
    pub fn bind(
        interner: &TypeInterner,
        store: &DefinitionStore,
        decl: MemberId,
        owner: StoredType,
        mapper: GenericMapper,
    ) -> Self {
        let bindings = match store.member(decl) {
            Some(member) => {
                let mut free = Vec::new();
                interner.collect_params(member.header.return_type, &mut free);
                if let Some(thrown) = member.header.thrown_type {
                    interner.collect_params(thrown, &mut free);
                }
                for p in &member.header.params {
                    interner.collect_params(p.ty, &mut free);
                }
                // Method-level parameters are bound per call site, not by the
                // owner instantiation; they stay out of the identity.
                free.retain(|p| !member.header.type_params.contains(p));
                mapper.bindings_for(&free)
            }
            None => Vec::new(),
        };
        Self {
            inner: Arc::new(RefInner {
                decl,
                owner,
                bindings,
                header_cell: Mutex::new(HeaderSlot::Pending(mapper)),
            }),
        }
    }

    pub fn decl(&self) -> MemberId {
        self.inner.decl
    }

    pub fn owner(&self) -> StoredType {
        self.inner.owner
    }

    pub fn raw(&self, store: &DefinitionStore) -> Option<MemberDecl> {
        store.member(self.inner.decl)
    }

    pub fn kind(&self, store: &DefinitionStore) -> Option<MemberKind> {
        self.raw(store).map(|m| m.kind)
    }

    pub fn modifiers(&self, store: &DefinitionStore) -> MemberModifiers {
        self.raw(store)
            .map(|m| m.modifiers)
            .unwrap_or(MemberModifiers::empty())
    }

    /// The instantiated header. Computed on first access from the captured
    /// mapper, then cached for the lifetime of the reference.
    pub fn header(&self, interner: &TypeInterner, store: &DefinitionStore) -> FunctionHeader {
        let taken = {
            let mut slot = self
                .inner
                .header_cell
                .lock()
                .expect("member header cell poisoned");
            match &*slot {
                HeaderSlot::Ready(header) => return header.clone(),
                HeaderSlot::InProgress => return self.placeholder(store),
                HeaderSlot::Pending(_) => {
                    match std::mem::replace(&mut *slot, HeaderSlot::InProgress) {
                        HeaderSlot::Pending(mapper) => mapper,
                        _ => unreachable!("slot state changed under lock"),
                    }
                }
            }
        };
        // Compute outside the lock: substitution may transitively resolve
        // other not-yet-ready members which may come back to this one.
        let header = match store.member(self.inner.decl) {
            Some(member) => member.header.instance(interner, &taken),
            None => FunctionHeader::nullary(TypeId::UNDETERMINED),
        };
        let mut slot = self
            .inner
            .header_cell
            .lock()
            .expect("member header cell poisoned");
        *slot = HeaderSlot::Ready(header.clone());
        header
    }

    /// Transient stand-in observed by re-entrant header requests: same arity,
    /// every type undetermined.
    fn placeholder(&self, store: &DefinitionStore) -> FunctionHeader {
        let arity = store
            .member(self.inner.decl)
            .map(|m| m.header.params.len())
            .unwrap_or(0);
        FunctionHeader::new(
            (0..arity)
                .map(|_| FunctionParameter::new(TypeId::UNDETERMINED))
                .collect(),
            TypeId::UNDETERMINED,
        )
    }

    /// Instantiated type of a field/constant/getter-style member.
    pub fn member_type(&self, interner: &TypeInterner, store: &DefinitionStore) -> TypeId {
        self.header(interner, store).return_type
    }
}

impl PartialEq for DefinitionMemberRef {
    fn eq(&self, other: &Self) -> bool {
        self.inner.decl == other.inner.decl
            && self.inner.owner == other.inner.owner
            && self.inner.bindings == other.inner.bindings
    }
}

impl Eq for DefinitionMemberRef {}

impl Hash for DefinitionMemberRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.decl.hash(state);
        self.inner.owner.hash(state);
        self.inner.bindings.hash(state);
    }
}

impl std::fmt::Debug for DefinitionMemberRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefinitionMemberRef")
            .field("decl", &self.inner.decl)
            .field("owner", &self.inner.owner)
            .field("bindings", &self.inner.bindings)
            .finish()
    }
}

/// A callable member bound to its owning instantiation.
///
/// Thin view over [`DefinitionMemberRef`] for members invoked with an
/// argument list; overload resolution traffics in these.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct FunctionalMemberRef {
    target: DefinitionMemberRef,
}

impl FunctionalMemberRef {
    pub fn new(target: DefinitionMemberRef) -> Self {
        Self { target }
    }

    pub fn target(&self) -> &DefinitionMemberRef {
        &self.target
    }
}

impl Deref for FunctionalMemberRef {
    type Target = DefinitionMemberRef;

    fn deref(&self) -> &Self::Target {
        &self.target
    }
}

#[cfg(test)]
#[path = "../tests/member_ref_tests.rs"]
mod tests;

//! Per-type member resolution and caching.
//!
//! For an instantiated receiver type, [`ResolutionContext::resolve`] computes
//! the complete, priority-ordered member surface by merging:
//!
//! 1. members declared directly on the nominal type, mapped through its own
//!    type arguments,
//! 2. members inherited transitively from the supertype and implemented
//!    interfaces, each through the derived mapper,
//! 3. members contributed by satisfied generic-parameter bounds when the
//!    receiver is itself a type parameter,
//! 4. members contributed by expansions whose declared target structurally
//!    matches the receiver.
//!
//! Population happens once per distinct instantiated type and the result is
//! shared for the rest of the session. Population is re-entrant: resolving A
//! may need B which may reference A again; the cache marks an entry
//! in-progress and hands the partially-built (empty) surface to re-entrant
//! requests instead of recursing forever. Edits invalidate and rebuild a key,
//! never merge into it.

use crate::def::{DefId, DefinitionStore, MemberKind};
use crate::intern::TypeInterner;
use crate::member_ref::DefinitionMemberRef;
use crate::recursion::{Enter, RecursionGuard, RecursionProfile};
use crate::substitute::{GenericMapper, instantiate_type};
use crate::types::{ParamBound, StoredType, TypeData, TypeId};
use dashmap::DashMap;
use indexmap::IndexMap;
use moss_common::diagnostics::{Diagnostic, codes};
use moss_common::{Atom, limits};
use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, error, trace};

/// Where a member entry came from. Lower is stronger: a receiver's own
/// declaration shadows anything merged in later.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MemberPriority {
    Declared,
    Inherited,
    Bound,
    Expansion,
}

/// Key of a member group.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MemberName {
    Id(Atom),
    Operator(crate::def::OperatorKind),
}

#[derive(Clone, Debug)]
pub struct MemberEntry {
    pub priority: MemberPriority,
    pub kind: MemberKind,
    pub member: DefinitionMemberRef,
}

/// All candidates sharing one name, so overload resolution walks them
/// without a second lookup.
#[derive(Clone, Debug)]
pub struct MemberGroup {
    pub name: MemberName,
    pub entries: Vec<MemberEntry>,
}

impl MemberGroup {
    fn new(name: MemberName) -> Self {
        Self {
            name,
            entries: Vec::with_capacity(limits::MEMBER_GROUP_CAPACITY),
        }
    }

    /// Candidates invoked with an argument list.
    pub fn callables(&self) -> impl Iterator<Item = &MemberEntry> {
        self.entries.iter().filter(|e| e.kind.is_callable())
    }

    pub fn field_like(&self) -> Option<&MemberEntry> {
        self.entries.iter().find(|e| {
            matches!(
                e.kind,
                MemberKind::Field { .. } | MemberKind::Getter { .. } | MemberKind::Constant { .. }
            )
        })
    }
}

/// The merged member surface of one instantiated type.
#[derive(Clone, Debug)]
pub struct TypeMembers {
    pub receiver: StoredType,
    groups: IndexMap<MemberName, MemberGroup, rustc_hash::FxBuildHasher>,
    constructors: Vec<MemberEntry>,
    casters: Vec<MemberEntry>,
}

impl TypeMembers {
    pub fn empty(receiver: StoredType) -> Self {
        Self {
            receiver,
            groups: IndexMap::default(),
            constructors: Vec::new(),
            casters: Vec::new(),
        }
    }

    pub fn group(&self, name: &MemberName) -> Option<&MemberGroup> {
        self.groups.get(name)
    }

    pub fn constructors(&self) -> &[MemberEntry] {
        &self.constructors
    }

    pub fn casters(&self) -> &[MemberEntry] {
        &self.casters
    }

    /// Member names in resolution order; the completion surface.
    pub fn names(&self) -> impl Iterator<Item = &MemberName> {
        self.groups.keys()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty() && self.constructors.is_empty() && self.casters.is_empty()
    }

    fn add(&mut self, priority: MemberPriority, kind: MemberKind, member: DefinitionMemberRef) {
        let entry = MemberEntry {
            priority,
            kind,
            member,
        };
        let bucket = match kind {
            MemberKind::Constructor => &mut self.constructors,
            MemberKind::Caster => &mut self.casters,
            MemberKind::Operator(op) => {
                &mut self
                    .groups
                    .entry(MemberName::Operator(op))
                    .or_insert_with(|| MemberGroup::new(MemberName::Operator(op)))
                    .entries
            }
            MemberKind::Method { name }
            | MemberKind::Field { name }
            | MemberKind::Getter { name }
            | MemberKind::Setter { name }
            | MemberKind::Constant { name } => {
                &mut self
                    .groups
                    .entry(MemberName::Id(name))
                    .or_insert_with(|| MemberGroup::new(MemberName::Id(name)))
                    .entries
            }
        };
        // Diamond inheritance merges the same binding twice; keep one.
        if bucket.iter().any(|e| e.member == entry.member) {
            return;
        }
        bucket.push(entry);
    }

    /// Merge another surface in at (at least) the given priority. Entries
    /// keep declaration order; an expansion member inherited from a
    /// supertype stays expansion-ranked.
    fn merge(&mut self, other: &TypeMembers, floor: MemberPriority) {
        for group in other.groups.values() {
            for entry in &group.entries {
                self.add(entry.priority.max(floor), entry.kind, entry.member.clone());
            }
        }
        for entry in &other.casters {
            self.add(entry.priority.max(floor), entry.kind, entry.member.clone());
        }
        // Constructors do not flow down an inheritance chain.
    }

    fn merge_constructors(&mut self, other: &TypeMembers, floor: MemberPriority) {
        for entry in &other.constructors {
            self.add(entry.priority.max(floor), entry.kind, entry.member.clone());
        }
    }

    /// Stable order within each group: priority class first, declaration
    /// order within a class. This is the order duplicate-name members are
    /// surfaced in for override and ambiguity diagnostics.
    fn seal(&mut self) {
        for group in self.groups.values_mut() {
            group.entries.sort_by_key(|e| e.priority);
        }
        self.constructors.sort_by_key(|e| e.priority);
        self.casters.sort_by_key(|e| e.priority);
    }
}

enum CacheEntry {
    /// Population underway on the current resolution path; the partial
    /// surface (empty) is what re-entrant requests observe.
    InProgress(Arc<TypeMembers>),
    Ready(Arc<TypeMembers>),
}

/// Session-scoped resolution state: the interner, the definition store, and
/// the member cache. Explicitly passed, never static, so independent
/// compilation sessions cannot interfere.
pub struct ResolutionContext<'a> {
    pub interner: &'a TypeInterner,
    pub store: &'a DefinitionStore,
    cache: DashMap<StoredType, CacheEntry, rustc_hash::FxBuildHasher>,
    /// Definitions each cache key consulted during population; the
    /// invalidation index for the edit path.
    deps: DashMap<StoredType, FxHashSet<DefId>, rustc_hash::FxBuildHasher>,
    /// Nesting depth of in-flight populations. Mutually recursive types are
    /// handled by the in-progress marker; this bounds pathological graphs
    /// that keep generating *distinct* keys (`A<T> : A<A<T>>`).
    population_depth: AtomicU32,
    faults: Mutex<Vec<Diagnostic>>,
}

const MAX_POPULATION_DEPTH: u32 = 64;

impl<'a> ResolutionContext<'a> {
    pub fn new(interner: &'a TypeInterner, store: &'a DefinitionStore) -> Self {
        Self {
            interner,
            store,
            cache: DashMap::default(),
            deps: DashMap::default(),
            population_depth: AtomicU32::new(0),
            faults: Mutex::new(Vec::new()),
        }
    }

    /// Internal faults recorded so far (recursion limits, malformed
    /// instantiations). Distinct from user diagnostics; fatal for the unit.
    pub fn take_faults(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.faults.lock().expect("fault list poisoned"))
    }

    pub(crate) fn record_fault(&self, fault: Diagnostic) {
        error!(code = fault.code, message = %fault.message_text, "internal fault");
        self.faults.lock().expect("fault list poisoned").push(fault);
    }

    // =========================================================================
    // Member resolution
    // =========================================================================

    /// The member surface of `receiver`. Cached per distinct instantiated
    /// type for the lifetime of the session.
    pub fn resolve(&self, receiver: impl Into<StoredType>) -> Arc<TypeMembers> {
        let key = self.interner.normalize_stored(receiver.into());
        {
            if let Some(entry) = self.cache.get(&key) {
                return match &*entry {
                    CacheEntry::InProgress(partial) => partial.clone(),
                    CacheEntry::Ready(members) => members.clone(),
                };
            }
        }

        let depth = self.population_depth.fetch_add(1, Ordering::SeqCst);
        if depth >= MAX_POPULATION_DEPTH {
            self.population_depth.fetch_sub(1, Ordering::SeqCst);
            self.record_fault(Diagnostic::fault(
                codes::FAULT_RECURSION_LIMIT,
                "member resolution exceeded the population depth limit",
            ));
            let empty = Arc::new(TypeMembers::empty(key));
            self.cache.insert(key, CacheEntry::Ready(empty.clone()));
            return empty;
        }

        trace!(type_id = key.id.0, "member cache populate");
        self.cache.insert(
            key,
            CacheEntry::InProgress(Arc::new(TypeMembers::empty(key))),
        );
        let (members, deps) = self.build_members(key);
        let members = Arc::new(members);
        self.deps.insert(key, deps);
        self.cache.insert(key, CacheEntry::Ready(members.clone()));
        self.population_depth.fetch_sub(1, Ordering::SeqCst);
        members
    }

    fn build_members(&self, key: StoredType) -> (TypeMembers, FxHashSet<DefId>) {
        let mut members = TypeMembers::empty(key);
        let mut deps: FxHashSet<DefId> = FxHashSet::default();
        self.collect_defs(key.id, &mut deps);

        match self.interner.data(key.id) {
            TypeData::Definition { def, type_args } => {
                if let Some(info) = self.store.get(def) {
                    match GenericMapper::from_args(&info.type_params, &type_args) {
                        Some(mapper) => {
                            for &member_id in &info.members {
                                if let Some(decl) = self.store.member(member_id) {
                                    members.add(
                                        MemberPriority::Declared,
                                        decl.kind,
                                        DefinitionMemberRef::bind(
                                            self.interner,
                                            self.store,
                                            member_id,
                                            key,
                                            mapper.clone(),
                                        ),
                                    );
                                }
                            }
                            let supertypes = info
                                .superclass
                                .iter()
                                .chain(info.interfaces.iter())
                                .copied();
                            for supertype in supertypes {
                                let instantiated =
                                    instantiate_type(self.interner, supertype, &mapper);
                                let super_key = StoredType::bare(instantiated);
                                let inherited = self.resolve(super_key);
                                members.merge(&inherited, MemberPriority::Inherited);
                                self.absorb_deps(super_key, &mut deps);
                            }
                        }
                        None => {
                            // An interned instantiation whose argument count
                            // disagrees with the declaration is corrupt state,
                            // not a user error.
                            self.record_fault(Diagnostic::fault(
                                codes::FAULT_MALFORMED_HEADER,
                                "definition instantiated with wrong type-argument count",
                            ));
                        }
                    }
                }
            }
            TypeData::GenericParam(param) => {
                if let Some(data) = self.store.param_data(param) {
                    for bound in &data.bounds {
                        match bound {
                            ParamBound::Type(bound_ty) => {
                                let bound_key = StoredType::bare(*bound_ty);
                                let contributed = self.resolve(bound_key);
                                members.merge(&contributed, MemberPriority::Bound);
                                self.absorb_deps(bound_key, &mut deps);
                            }
                            ParamBound::Super(bound_ty) => {
                                let bound_key = StoredType::bare(*bound_ty);
                                let contributed = self.resolve(bound_key);
                                members.merge_constructors(&contributed, MemberPriority::Bound);
                                self.absorb_deps(bound_key, &mut deps);
                            }
                        }
                    }
                }
            }
            _ => {}
        }

        // Expansions apply to every receiver shape, nominal or not.
        for expansion_id in self.store.expansion_ids() {
            let Some(expansion) = self.store.expansion(expansion_id) else {
                continue;
            };
            let mut bindings: FxHashMap<crate::def::TypeParamId, TypeId> = FxHashMap::default();
            let matched = crate::unify::match_type(
                self.interner,
                expansion.target,
                key.id,
                &expansion.type_params,
                &mut bindings,
            );
            if !matched {
                continue;
            }
            if !expansion
                .type_params
                .iter()
                .all(|p| bindings.contains_key(p))
            {
                continue;
            }
            let mapper = GenericMapper::from_pairs(bindings);
            for &member_id in &expansion.members {
                if let Some(decl) = self.store.member(member_id) {
                    members.add(
                        MemberPriority::Expansion,
                        decl.kind,
                        DefinitionMemberRef::bind(
                            self.interner,
                            self.store,
                            member_id,
                            key,
                            mapper.clone(),
                        ),
                    );
                }
            }
        }

        members.seal();
        (members, deps)
    }

    fn collect_defs(&self, id: TypeId, out: &mut FxHashSet<DefId>) {
        self.interner.contains(id, &mut |data| {
            if let TypeData::Definition { def, .. } = data {
                out.insert(*def);
            }
            false
        });
    }

    fn absorb_deps(&self, key: StoredType, out: &mut FxHashSet<DefId>) {
        let key = self.interner.normalize_stored(key);
        if let Some(recorded) = self.deps.get(&key) {
            out.extend(recorded.iter().copied());
        }
        self.collect_defs(key.id, out);
    }

    // =========================================================================
    // Invalidation (edit path)
    // =========================================================================

    /// Drop the cache entry for one instantiated type.
    pub fn invalidate(&self, receiver: StoredType) {
        let key = self.interner.normalize_stored(receiver);
        self.cache.remove(&key);
        self.deps.remove(&key);
    }

    /// Drop every cache entry whose population consulted `def`. The next
    /// query rebuilds from the store instead of merging stale data.
    pub fn invalidate_definition(&self, def: DefId) {
        let stale: Vec<StoredType> = self
            .deps
            .iter()
            .filter(|entry| entry.value().contains(&def))
            .map(|entry| *entry.key())
            .collect();
        debug!(def = def.0, entries = stale.len(), "invalidating member cache");
        for key in stale {
            self.cache.remove(&key);
            self.deps.remove(&key);
        }
    }

    pub fn invalidate_all(&self) {
        self.cache.clear();
        self.deps.clear();
    }

    // =========================================================================
    // Implicit castability
    // =========================================================================

    /// Whether `from` converts to `to` without an explicit cast: identity,
    /// null-to-optional, optional lifting, supertype chains, exact-type
    /// bounds, and implicit caster members.
    pub fn is_implicitly_castable(&self, from: TypeId, to: TypeId) -> bool {
        let mut guard = RecursionGuard::with_profile(RecursionProfile::CastCheck);
        let result = self.castable_inner(
            self.interner.normalize(from),
            self.interner.normalize(to),
            &mut guard,
        );
        if guard.is_exceeded() {
            self.record_fault(Diagnostic::fault(
                codes::FAULT_RECURSION_LIMIT,
                "castability check exceeded the recursion limit",
            ));
        }
        result
    }

    fn castable_inner(
        &self,
        from: TypeId,
        to: TypeId,
        guard: &mut RecursionGuard<(TypeId, TypeId)>,
    ) -> bool {
        if from == to {
            return true;
        }
        // The invalid type converts silently in both directions so one
        // unresolvable reference does not cascade.
        if from == TypeId::INVALID || to == TypeId::INVALID {
            return true;
        }
        // Undetermined placeholders accept everything until inference fills
        // them in.
        if from == TypeId::UNDETERMINED || to == TypeId::UNDETERMINED {
            return true;
        }
        match guard.enter((from, to)) {
            Enter::Entered => {}
            Enter::Cycle | Enter::LimitExceeded => return false,
        }
        let result = self.castable_step(from, to, guard);
        guard.leave((from, to));
        result
    }

    fn castable_step(
        &self,
        from: TypeId,
        to: TypeId,
        guard: &mut RecursionGuard<(TypeId, TypeId)>,
    ) -> bool {
        // Optional targets: null, both-optional covariance, and lifting.
        if let TypeData::Optional(to_inner) = self.interner.data(to) {
            if from == TypeId::NULL {
                return true;
            }
            if let TypeData::Optional(from_inner) = self.interner.data(from) {
                return self.castable_inner(from_inner, to_inner, guard);
            }
            if self.castable_inner(from, to_inner, guard) {
                return true;
            }
        }

        match self.interner.data(from) {
            TypeData::Definition { def, type_args } => {
                if let Some(info) = self.store.get(def) {
                    if let Some(mapper) = GenericMapper::from_args(&info.type_params, &type_args) {
                        let supertypes = info
                            .superclass
                            .iter()
                            .chain(info.interfaces.iter())
                            .copied();
                        for supertype in supertypes {
                            let instantiated = instantiate_type(self.interner, supertype, &mapper);
                            if self.castable_inner(instantiated, to, guard) {
                                return true;
                            }
                        }
                    }
                }
            }
            TypeData::GenericParam(param) => {
                if let Some(data) = self.store.param_data(param) {
                    for bound in &data.bounds {
                        if let ParamBound::Type(bound_ty) = bound {
                            if self.castable_inner(*bound_ty, to, guard) {
                                return true;
                            }
                        }
                    }
                }
            }
            _ => {}
        }

        // Implicit caster members on the source type, declared or contributed
        // by expansions (the builtin widening lattice arrives this way).
        let members = self.resolve(StoredType::bare(from));
        for caster in members.casters() {
            if !caster
                .member
                .modifiers(self.store)
                .contains(crate::def::MemberModifiers::IMPLICIT)
            {
                continue;
            }
            let target = caster.member.header(self.interner, self.store).return_type;
            if self.interner.normalize(target) == to {
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
#[path = "../tests/members_tests.rs"]
mod tests;

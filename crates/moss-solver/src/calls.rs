//! Call-site overload resolution.
//!
//! Given a receiver type, a member name, argument types, and optional
//! explicit type arguments, resolution is: gather the named group from the
//! member cache, filter by arity, prefer exact matches over implicit-cast
//! matches, and bind the single survivor. More than one survivor in the
//! deciding pass is an ambiguous call; none is a no-applicable-method error.
//! Every outcome is a [`CallResult`] sentinel — resolution never throws for
//! ordinary failure, the expression layer converts failures into invalid
//! placeholder nodes and keeps compiling.

use crate::def::{DefId, MemberId, MemberModifiers, OperatorKind};
use crate::format::TypeFormatter;
use crate::header::{FunctionHeader, Instantiated};
use crate::member_ref::FunctionalMemberRef;
use crate::members::{MemberEntry, MemberName, ResolutionContext};
use crate::types::{StoredType, TypeId};
use moss_common::diagnostics::{Diagnostic, codes};
use moss_common::{Atom, Span};
use smallvec::SmallVec;
use tracing::trace;

/// A call site, as handed over by the expression-compilation collaborator:
/// one concrete type per argument, optional explicit type arguments, and
/// optional return-type hints in priority order.
#[derive(Clone, Debug, Default)]
pub struct CallArguments {
    pub type_args: Vec<TypeId>,
    pub args: Vec<TypeId>,
    pub expected_results: Vec<TypeId>,
    /// The trailing argument is an array spread into the variadic parameter.
    pub spread: bool,
}

impl CallArguments {
    pub fn new(args: Vec<TypeId>) -> Self {
        Self {
            type_args: Vec::new(),
            args,
            expected_results: Vec::new(),
            spread: false,
        }
    }

    pub fn with_type_args(mut self, type_args: Vec<TypeId>) -> Self {
        self.type_args = type_args;
        self
    }

    pub fn with_expected_results(mut self, hints: Vec<TypeId>) -> Self {
        self.expected_results = hints;
        self
    }

    pub fn with_spread(mut self) -> Self {
        self.spread = true;
        self
    }
}

/// A successfully bound call: the member plus its call-instantiated header,
/// consumed unchanged by code generation and tooling.
#[derive(Clone, Debug)]
pub struct BoundCall {
    pub member: FunctionalMemberRef,
    pub header: FunctionHeader,
}

#[derive(Clone, Debug)]
pub enum CallResult {
    Match(BoundCall),
    /// More than one candidate survives the deciding pass.
    AmbiguousCall {
        receiver: StoredType,
        name: MemberName,
        candidates: Vec<FunctionalMemberRef>,
    },
    /// The group exists but no candidate accepts these argument types.
    NoMatchingMember {
        receiver: StoredType,
        name: MemberName,
    },
    /// Every arity-compatible candidate is generic and type-argument
    /// inference failed for each of them.
    InferenceBlocked {
        receiver: StoredType,
        name: MemberName,
    },
    /// No member with this name at all.
    UnknownMember {
        receiver: StoredType,
        name: MemberName,
    },
    ArgumentCountMismatch {
        expected_min: usize,
        expected_max: Option<usize>,
        actual: usize,
    },
    TypeArgumentCount {
        expected: usize,
        actual: usize,
    },
}

impl CallResult {
    pub fn is_match(&self) -> bool {
        matches!(self, CallResult::Match(_))
    }

    pub fn bound(self) -> Option<BoundCall> {
        match self {
            CallResult::Match(bound) => Some(bound),
            _ => None,
        }
    }

    /// Render a failure as a user diagnostic. `None` for a match.
    pub fn to_diagnostic(&self, cx: &ResolutionContext<'_>, span: Span) -> Option<Diagnostic> {
        let formatter = TypeFormatter::new(cx.interner, cx.store);
        let member_label = |name: &MemberName| match name {
            MemberName::Id(atom) => cx.interner.resolve_atom(*atom).to_string(),
            MemberName::Operator(op) => format!("operator {}", op.symbol()),
        };
        match self {
            CallResult::Match(_) => None,
            CallResult::AmbiguousCall {
                receiver, name, ..
            } => Some(Diagnostic::error(
                codes::AMBIGUOUS_CALL,
                span,
                format!(
                    "ambiguous call to {} on {}",
                    member_label(name),
                    formatter.format_stored(*receiver)
                ),
            )),
            CallResult::NoMatchingMember { receiver, name } => Some(Diagnostic::error(
                codes::NO_APPLICABLE_METHOD,
                span,
                format!(
                    "no overload of {} on {} accepts these argument types",
                    member_label(name),
                    formatter.format_stored(*receiver)
                ),
            )),
            CallResult::InferenceBlocked { receiver, name } => Some(Diagnostic::error(
                codes::INFERENCE_BLOCKED,
                span,
                format!(
                    "could not infer type arguments for {} on {}",
                    member_label(name),
                    formatter.format_stored(*receiver)
                ),
            )),
            CallResult::UnknownMember { receiver, name } => Some(Diagnostic::error(
                codes::NO_SUCH_MEMBER,
                span,
                format!(
                    "{} has no member {}",
                    formatter.format_stored(*receiver),
                    member_label(name)
                ),
            )),
            CallResult::ArgumentCountMismatch {
                expected_min,
                expected_max,
                actual,
            } => Some(Diagnostic::error(
                codes::ARITY_MISMATCH,
                span,
                match expected_max {
                    Some(max) if max == expected_min => {
                        format!("expected {expected_min} arguments, found {actual}")
                    }
                    Some(max) => {
                        format!("expected {expected_min} to {max} arguments, found {actual}")
                    }
                    None => format!("expected at least {expected_min} arguments, found {actual}"),
                },
            )),
            CallResult::TypeArgumentCount { expected, actual } => Some(Diagnostic::error(
                codes::TYPE_ARGUMENT_COUNT,
                span,
                format!("expected {expected} type arguments, found {actual}"),
            )),
        }
    }
}

/// Outcome of resolving which base member a declaration overrides.
#[derive(Clone, Debug)]
pub enum OverrideResult {
    Resolved(FunctionalMemberRef),
    NoBase,
    Ambiguous(Vec<FunctionalMemberRef>),
}

impl ResolutionContext<'_> {
    /// Resolve a named method call on `receiver`.
    pub fn resolve_call(
        &self,
        receiver: StoredType,
        name: Atom,
        call: &CallArguments,
    ) -> CallResult {
        let members = self.resolve(receiver);
        let member_name = MemberName::Id(name);
        let Some(group) = members.group(&member_name) else {
            return CallResult::UnknownMember {
                receiver,
                name: member_name,
            };
        };
        let candidates: Vec<MemberEntry> = group.callables().cloned().collect();
        self.resolve_group(receiver, member_name, &candidates, call)
    }

    /// Resolve an operator application on `receiver`.
    pub fn resolve_operator(
        &self,
        receiver: StoredType,
        op: OperatorKind,
        call: &CallArguments,
    ) -> CallResult {
        let members = self.resolve(receiver);
        let member_name = MemberName::Operator(op);
        let Some(group) = members.group(&member_name) else {
            return CallResult::UnknownMember {
                receiver,
                name: member_name,
            };
        };
        let candidates: Vec<MemberEntry> = group.callables().cloned().collect();
        self.resolve_group(receiver, member_name, &candidates, call)
    }

    /// Resolve a constructor call for `receiver`.
    pub fn resolve_constructor(&self, receiver: StoredType, call: &CallArguments) -> CallResult {
        let members = self.resolve(receiver);
        let candidates: Vec<MemberEntry> = members.constructors().to_vec();
        if candidates.is_empty() {
            return CallResult::UnknownMember {
                receiver,
                name: MemberName::Operator(OperatorKind::Call),
            };
        }
        self.resolve_group(
            receiver,
            MemberName::Operator(OperatorKind::Call),
            &candidates,
            call,
        )
    }

    fn resolve_group(
        &self,
        receiver: StoredType,
        name: MemberName,
        candidates: &[MemberEntry],
        call: &CallArguments,
    ) -> CallResult {
        if candidates.is_empty() {
            return CallResult::NoMatchingMember { receiver, name };
        }

        // Arity filter, tracking the group-wide bounds for the diagnostic.
        let mut expected_min = usize::MAX;
        let mut expected_max: Option<usize> = Some(0);
        let mut arity_ok: Vec<(&MemberEntry, FunctionHeader)> = Vec::new();
        for entry in candidates {
            let header = entry.member.header(self.interner, self.store);
            expected_min = expected_min.min(header.min_parameters());
            expected_max = match (expected_max, header.max_parameters()) {
                (Some(a), Some(b)) => Some(a.max(b)),
                _ => None,
            };
            if header.accepts(call.args.len()) {
                arity_ok.push((entry, header));
            }
        }
        if arity_ok.is_empty() {
            return CallResult::ArgumentCountMismatch {
                expected_min,
                expected_max,
                actual: call.args.len(),
            };
        }

        // Exact pass first; implicit-cast pass only when no exact match
        // exists. Both passes yield call-instantiated headers.
        let mut survivors: Vec<(&MemberEntry, FunctionHeader)> = arity_ok
            .iter()
            .filter_map(|(entry, header)| {
                header
                    .matches_exactly(self, call)
                    .map(|filled| (*entry, filled))
            })
            .collect();
        if survivors.is_empty() {
            survivors = arity_ok
                .iter()
                .filter_map(|(entry, header)| {
                    header
                        .matches_implicitly(self, call)
                        .map(|filled| (*entry, filled))
                })
                .collect();
        }

        if survivors.is_empty() {
            // Distinguish a wrong explicit type-argument count from a plain
            // argument-type mismatch.
            if !call.type_args.is_empty() {
                if let Some((_, header)) = arity_ok
                    .iter()
                    .find(|(_, h)| h.type_params.len() != call.type_args.len())
                {
                    return CallResult::TypeArgumentCount {
                        expected: header.type_params.len(),
                        actual: call.type_args.len(),
                    };
                }
            }
            // Blocked inference gets its own diagnostic when it is the only
            // reason every candidate dropped out.
            if call.type_args.is_empty() {
                let all_blocked = arity_ok.iter().all(|(_, h)| {
                    !h.type_params.is_empty()
                        && matches!(
                            h.instance_for_call(self.interner, call),
                            Instantiated::InferenceFailed
                        )
                });
                if all_blocked {
                    return CallResult::InferenceBlocked { receiver, name };
                }
            }
            return CallResult::NoMatchingMember { receiver, name };
        }

        // A subtype's own declaration shadows the member it overrides; keep
        // only the strongest priority class, then collapse survivors whose
        // instantiated signatures are identical (override pairs reached
        // through different supertypes).
        let strongest = survivors
            .iter()
            .map(|(entry, _)| entry.priority)
            .min()
            .expect("survivors is non-empty");
        survivors.retain(|(entry, _)| entry.priority == strongest);
        let mut distinct: Vec<(&MemberEntry, FunctionHeader)> = Vec::new();
        for (entry, header) in survivors {
            if !distinct.iter().any(|(_, kept)| *kept == header) {
                distinct.push((entry, header));
            }
        }

        if distinct.len() > 1 {
            return CallResult::AmbiguousCall {
                receiver,
                name,
                candidates: distinct
                    .into_iter()
                    .map(|(entry, _)| FunctionalMemberRef::new(entry.member.clone()))
                    .collect(),
            };
        }
        let (entry, header) = distinct.into_iter().next().expect("single survivor");
        trace!(member = entry.member.decl().0, "call bound");
        CallResult::Match(BoundCall {
            member: FunctionalMemberRef::new(entry.member.clone()),
            header,
        })
    }

    // =========================================================================
    // Declaration-level checks
    // =========================================================================

    /// The definition applied to its own type parameters (`List<T>` seen from
    /// inside `List`).
    pub fn self_type(&self, def: DefId) -> TypeId {
        let args: SmallVec<[TypeId; 2]> = self
            .store
            .get_type_params(def)
            .into_iter()
            .map(|p| self.interner.generic_param(p))
            .collect();
        self.interner.definition(def, args)
    }

    /// Find the base member a declaration overrides: a callable with the same
    /// name on a supertype whose signature is override-compatible. A single
    /// base attaches the overrides link to the store.
    pub fn resolve_override(&self, def: DefId, member_id: MemberId) -> OverrideResult {
        let Some(decl) = self.store.member(member_id) else {
            return OverrideResult::NoBase;
        };
        let Some(info) = self.store.get(def) else {
            return OverrideResult::NoBase;
        };
        let name = match decl.kind {
            crate::def::MemberKind::Method { name } => MemberName::Id(name),
            crate::def::MemberKind::Operator(op) => MemberName::Operator(op),
            _ => return OverrideResult::NoBase,
        };

        // Heritage types are expressed in the definition's own parameters, so
        // seen from inside the definition they need no substitution.
        let mut bases: Vec<FunctionalMemberRef> = Vec::new();
        let supertypes = info.superclass.iter().chain(info.interfaces.iter());
        for &supertype in supertypes {
            let super_members = self.resolve(StoredType::bare(supertype));
            let Some(group) = super_members.group(&name) else {
                continue;
            };
            for entry in group.callables() {
                let base_header = entry.member.header(self.interner, self.store);
                if decl.header.can_override(self, &base_header) {
                    let candidate = FunctionalMemberRef::new(entry.member.clone());
                    if !bases.contains(&candidate) {
                        bases.push(candidate);
                    }
                }
            }
        }
        match bases.len() {
            0 => OverrideResult::NoBase,
            1 => {
                let base = bases.pop().expect("single base");
                self.store.set_overrides(member_id, base.clone());
                OverrideResult::Resolved(base)
            }
            _ => OverrideResult::Ambiguous(bases),
        }
    }

    /// Run override resolution over a definition's members: attach override
    /// links, fill undetermined signature parts from the base, and report
    /// illegal overrides.
    pub fn apply_override_inference(&self, def: DefId) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        let Some(info) = self.store.get(def) else {
            return diagnostics;
        };
        for member_id in info.members {
            let Some(decl) = self.store.member(member_id) else {
                continue;
            };
            let declared_override = decl.modifiers.contains(MemberModifiers::OVERRIDE);
            if !declared_override && !decl.header.has_unknowns(self.interner) {
                continue;
            }
            match self.resolve_override(def, member_id) {
                OverrideResult::Resolved(base) => {
                    let merged = decl
                        .header
                        .infer_from_override(&base.header(self.interner, self.store));
                    if merged != decl.header {
                        self.store.update_member_header(member_id, merged);
                        self.invalidate_definition(def);
                    }
                }
                OverrideResult::NoBase => {
                    if declared_override {
                        diagnostics.push(Diagnostic::error(
                            codes::ILLEGAL_OVERRIDE_NO_BASE,
                            decl.span.unwrap_or(Span::EMPTY),
                            "method overrides nothing in the supertype chain",
                        ));
                    }
                }
                OverrideResult::Ambiguous(_) => {
                    diagnostics.push(Diagnostic::error(
                        codes::ILLEGAL_OVERRIDE_AMBIGUOUS,
                        decl.span.unwrap_or(Span::EMPTY),
                        "override target is ambiguous",
                    ));
                }
            }
        }
        diagnostics
    }

    /// Detect illegal co-declarations on one definition: two callables with
    /// the same name whose signatures are similar (some call could name
    /// either).
    pub fn find_duplicate_members(&self, def: DefId) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        let Some(info) = self.store.get(def) else {
            return diagnostics;
        };
        let decls: Vec<(MemberId, crate::def::MemberDecl)> = info
            .members
            .iter()
            .filter_map(|&id| self.store.member(id).map(|decl| (id, decl)))
            .filter(|(_, decl)| decl.kind.is_callable())
            .collect();
        for (i, (_, a)) in decls.iter().enumerate() {
            for (_, b) in decls.iter().skip(i + 1) {
                let same_channel = match (a.kind, b.kind) {
                    (
                        crate::def::MemberKind::Method { name: n1 },
                        crate::def::MemberKind::Method { name: n2 },
                    ) => n1 == n2,
                    (
                        crate::def::MemberKind::Operator(o1),
                        crate::def::MemberKind::Operator(o2),
                    ) => o1 == o2,
                    (crate::def::MemberKind::Constructor, crate::def::MemberKind::Constructor) => {
                        true
                    }
                    _ => false,
                };
                if same_channel && a.header.is_similar_to(self.interner, &b.header) {
                    diagnostics.push(Diagnostic::error(
                        codes::DUPLICATE_MEMBER,
                        b.span.unwrap_or(Span::EMPTY),
                        "conflicting declaration with the same signature",
                    ));
                }
            }
        }
        diagnostics
    }
}

#[cfg(test)]
#[path = "../tests/calls_tests.rs"]
mod tests;

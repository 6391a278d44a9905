//! Function signatures: matching, inference, instantiation.
//!
//! A [`FunctionHeader`] is the resolved or resolvable signature of any
//! callable member (methods, constructors, operators, casters) and, in
//! degenerate nullary form, of fields and constants. This module carries the
//! core overload machinery:
//!
//! - arity bounds and `accepts`
//! - exact and implicit-cast argument matching
//! - call-site type-argument inference (`infer_types`)
//! - explicit type-argument instantiation
//! - override compatibility and override-based inference
//! - co-declaration conflict detection (`is_similar_to`)
//! - canonical signature encoding for backend dedup
//!
//! Ordinary "no match" outcomes are sentinels (`None` / result enums); only
//! programming-invariant violations abort.

use crate::calls::CallArguments;
use crate::def::TypeParamId;
use crate::intern::TypeInterner;
use crate::members::ResolutionContext;
use crate::substitute::{GenericMapper, instantiate_type};
use crate::types::{FunctionShape, ShapeParam, StorageClass, TypeData, TypeId};
use moss_common::Atom;
use rustc_hash::FxHashMap;
use tracing::debug;

/// Opaque handle into the expression arena of the parsing collaborator.
/// Default values are carried, never evaluated, by this core.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ExprRef(pub u32);

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FunctionParameter {
    pub name: Option<Atom>,
    pub ty: TypeId,
    pub default: Option<ExprRef>,
    pub variadic: bool,
}

impl FunctionParameter {
    pub const fn new(ty: TypeId) -> Self {
        Self {
            name: None,
            ty,
            default: None,
            variadic: false,
        }
    }

    pub const fn named(name: Atom, ty: TypeId) -> Self {
        Self {
            name: Some(name),
            ty,
            default: None,
            variadic: false,
        }
    }

    pub const fn with_default(mut self, default: ExprRef) -> Self {
        self.default = Some(default);
        self
    }

    pub const fn variadic(mut self) -> Self {
        self.variadic = true;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FunctionHeader {
    pub type_params: Vec<TypeParamId>,
    pub return_type: TypeId,
    pub thrown_type: Option<TypeId>,
    pub storage: Option<StorageClass>,
    pub params: Vec<FunctionParameter>,
}

/// Outcome of preparing a header for a concrete call.
#[derive(Clone, Debug)]
pub enum Instantiated {
    /// Concrete header: type-parameter list stripped, all occurrences
    /// substituted.
    Ready(FunctionHeader),
    TypeArgumentCount { expected: usize, actual: usize },
    /// Inference could not produce a complete, conflict-free mapping.
    InferenceFailed,
}

/// Where an argument position lands in the parameter list.
enum ParamSlot {
    Fixed(TypeId),
    /// Position covered by the trailing variadic parameter: the argument may
    /// be one element, or (for the single argument at the variadic position)
    /// the whole array.
    Variadic { array: TypeId, element: TypeId },
    /// Spread call: the trailing argument must be the variadic array itself.
    Spread(TypeId),
}

impl FunctionHeader {
    /// Build a header. Only the last parameter may be variadic; a variadic
    /// flag anywhere else is a malformed declaration and a defect in the
    /// caller.
    pub fn new(params: Vec<FunctionParameter>, return_type: TypeId) -> Self {
        let variadic_ok = params
            .iter()
            .enumerate()
            .all(|(i, p)| !p.variadic || i + 1 == params.len());
        assert!(variadic_ok, "variadic parameter must be last");
        Self {
            type_params: Vec::new(),
            return_type,
            thrown_type: None,
            storage: None,
            params,
        }
    }

    /// `() -> ty`; the shape used for fields, constants, and getters.
    pub fn nullary(return_type: TypeId) -> Self {
        Self::new(Vec::new(), return_type)
    }

    pub fn with_type_params(mut self, type_params: Vec<TypeParamId>) -> Self {
        self.type_params = type_params;
        self
    }

    pub fn with_thrown(mut self, thrown: TypeId) -> Self {
        self.thrown_type = Some(thrown);
        self
    }

    pub fn with_storage(mut self, storage: StorageClass) -> Self {
        self.storage = Some(storage);
        self
    }

    // =========================================================================
    // Arity
    // =========================================================================

    /// Number of required leading parameters: the first defaulted or variadic
    /// parameter stops the count.
    pub fn min_parameters(&self) -> usize {
        self.params
            .iter()
            .position(|p| p.default.is_some() || p.variadic)
            .unwrap_or(self.params.len())
    }

    /// `None` means unbounded (trailing variadic parameter).
    pub fn max_parameters(&self) -> Option<usize> {
        if self.is_variadic() {
            None
        } else {
            Some(self.params.len())
        }
    }

    pub fn is_variadic(&self) -> bool {
        self.params.last().is_some_and(|p| p.variadic)
    }

    pub fn accepts(&self, argument_count: usize) -> bool {
        argument_count >= self.min_parameters()
            && self
                .max_parameters()
                .is_none_or(|max| argument_count <= max)
    }

    /// Whether the return type or any parameter type still carries the
    /// undetermined placeholder (pre-inference state).
    pub fn has_unknowns(&self, interner: &TypeInterner) -> bool {
        interner.has_undetermined(self.return_type)
            || self
                .thrown_type
                .is_some_and(|t| interner.has_undetermined(t))
            || self.params.iter().any(|p| interner.has_undetermined(p.ty))
    }

    /// The function *type* of this signature (names and defaults erased).
    pub fn function_type(&self, interner: &TypeInterner) -> TypeId {
        interner.function(FunctionShape {
            params: self
                .params
                .iter()
                .map(|p| ShapeParam {
                    ty: p.ty,
                    variadic: p.variadic,
                })
                .collect(),
            return_type: self.return_type,
            thrown_type: self.thrown_type,
        })
    }

    // =========================================================================
    // Substitution
    // =========================================================================

    /// Substitute every type in the header through `mapper`. Method-level
    /// type parameters are ids, not names, so they pass through untouched
    /// unless the mapper explicitly binds them.
    pub fn instance(&self, interner: &TypeInterner, mapper: &GenericMapper) -> FunctionHeader {
        if mapper.is_empty() {
            return self.clone();
        }
        FunctionHeader {
            type_params: self.type_params.clone(),
            return_type: instantiate_type(interner, self.return_type, mapper),
            thrown_type: self
                .thrown_type
                .map(|t| instantiate_type(interner, t, mapper)),
            storage: self.storage,
            params: self
                .params
                .iter()
                .map(|p| FunctionParameter {
                    name: p.name,
                    ty: instantiate_type(interner, p.ty, mapper),
                    default: p.default,
                    variadic: p.variadic,
                })
                .collect(),
        }
    }

    /// Instantiate with explicit type arguments, stripping the
    /// type-parameter list (the result is concrete).
    /// `None` on type-argument arity mismatch.
    pub fn with_generic_arguments(
        &self,
        interner: &TypeInterner,
        type_args: &[TypeId],
    ) -> Option<FunctionHeader> {
        let mapper = GenericMapper::from_args(&self.type_params, type_args)?;
        let mut filled = self.instance(interner, &mapper);
        filled.type_params = Vec::new();
        Some(filled)
    }

    /// Prepare this header for a concrete call: explicit type arguments if
    /// supplied, inference otherwise.
    pub fn instance_for_call(&self, interner: &TypeInterner, call: &CallArguments) -> Instantiated {
        if self.type_params.is_empty() {
            if !call.type_args.is_empty() {
                return Instantiated::TypeArgumentCount {
                    expected: 0,
                    actual: call.type_args.len(),
                };
            }
            return Instantiated::Ready(self.clone());
        }
        if !call.type_args.is_empty() {
            return match self.with_generic_arguments(interner, &call.type_args) {
                Some(filled) => Instantiated::Ready(filled),
                None => Instantiated::TypeArgumentCount {
                    expected: self.type_params.len(),
                    actual: call.type_args.len(),
                },
            };
        }
        match self.infer_types(interner, call) {
            Some(mapper) => {
                let mut filled = self.instance(interner, &mapper);
                filled.type_params = Vec::new();
                Instantiated::Ready(filled)
            }
            None => Instantiated::InferenceFailed,
        }
    }

    // =========================================================================
    // Inference
    // =========================================================================

    /// Unify call-argument types (and return-type hints) against this
    /// header's parameter types, producing a complete mapping for the
    /// declared type parameters.
    ///
    /// All-or-nothing: a single argument that fails to unify, or a declared
    /// parameter left unbound, fails the whole call. Left-to-right order is
    /// the tie-break when several argument positions could bind the same
    /// parameter: the first successful unification wins and later conflicts
    /// are failures, never overwrites.
    pub fn infer_types(
        &self,
        interner: &TypeInterner,
        call: &CallArguments,
    ) -> Option<GenericMapper> {
        let scope = &self.type_params;
        let mut bindings: FxHashMap<TypeParamId, TypeId> = FxHashMap::default();

        // Return-type hints: first hint whose unification against the return
        // type does not conflict seeds the mapping; a hint that fails is
        // skipped, not fatal.
        for &hint in &call.expected_results {
            let mut trial = FxHashMap::default();
            if crate::unify::match_type(interner, self.return_type, hint, scope, &mut trial) {
                bindings = trial;
                break;
            }
        }

        for (index, &arg) in call.args.iter().enumerate() {
            let slot = self.param_slot(interner, index, call.args.len(), call.spread)?;
            let matched = match slot {
                ParamSlot::Fixed(param_ty) | ParamSlot::Spread(param_ty) => {
                    crate::unify::match_type(interner, param_ty, arg, scope, &mut bindings)
                }
                ParamSlot::Variadic { array, element } => {
                    // Whole-array form is only plausible for the single
                    // argument sitting exactly at the variadic position; try
                    // it on a trial map so a failed attempt cannot poison the
                    // element-wise unification.
                    let whole_array_form =
                        call.args.len() == self.params.len() && index + 1 == call.args.len();
                    if whole_array_form {
                        let mut trial = bindings.clone();
                        if crate::unify::match_type(interner, array, arg, scope, &mut trial) {
                            bindings = trial;
                            true
                        } else {
                            crate::unify::match_type(interner, element, arg, scope, &mut bindings)
                        }
                    } else {
                        crate::unify::match_type(interner, element, arg, scope, &mut bindings)
                    }
                }
            };
            if !matched {
                return None;
            }
        }

        for &param in scope {
            if !bindings.contains_key(&param) {
                debug!(param = param.0, "inference left a type parameter unbound");
                return None;
            }
        }
        if bindings.len() > scope.len() {
            // More bindings than declared parameters is an internal invariant
            // violation (unify is scope-restricted); fail the candidate
            // coarsely, matching the original, but leave a trace.
            debug!(
                bound = bindings.len(),
                declared = scope.len(),
                "inference produced excess bindings"
            );
            return None;
        }
        Some(GenericMapper::from_pairs(bindings))
    }

    // =========================================================================
    // Matching
    // =========================================================================

    /// Arity check, generic fill, then identical (not merely castable)
    /// argument types. Returns the call-instantiated header on success.
    pub fn matches_exactly(
        &self,
        cx: &ResolutionContext<'_>,
        call: &CallArguments,
    ) -> Option<FunctionHeader> {
        self.matches_inner(cx, call, true)
    }

    /// Arity check, generic fill, then implicit castability per argument.
    /// The primary overload-applicability test.
    pub fn matches_implicitly(
        &self,
        cx: &ResolutionContext<'_>,
        call: &CallArguments,
    ) -> Option<FunctionHeader> {
        self.matches_inner(cx, call, false)
    }

    fn matches_inner(
        &self,
        cx: &ResolutionContext<'_>,
        call: &CallArguments,
        exact: bool,
    ) -> Option<FunctionHeader> {
        if !self.accepts(call.args.len()) {
            return None;
        }
        let Instantiated::Ready(filled) = self.instance_for_call(cx.interner, call) else {
            return None;
        };
        let arg_ok = |arg: TypeId, param: TypeId| -> bool {
            if exact {
                cx.interner.normalize(arg) == cx.interner.normalize(param)
            } else {
                cx.is_implicitly_castable(arg, param)
            }
        };
        for (index, &arg) in call.args.iter().enumerate() {
            let slot = filled.param_slot(cx.interner, index, call.args.len(), call.spread)?;
            let ok = match slot {
                ParamSlot::Fixed(param_ty) | ParamSlot::Spread(param_ty) => arg_ok(arg, param_ty),
                ParamSlot::Variadic { array, element } => {
                    let whole_array_form =
                        call.args.len() == filled.params.len() && index + 1 == call.args.len();
                    (whole_array_form && arg_ok(arg, array)) || arg_ok(arg, element)
                }
            };
            if !ok {
                return None;
            }
        }
        Some(filled)
    }

    fn param_slot(
        &self,
        interner: &TypeInterner,
        index: usize,
        arg_count: usize,
        spread: bool,
    ) -> Option<ParamSlot> {
        if self.is_variadic() && index + 1 >= self.params.len() {
            let last = self.params.last()?;
            if spread && index + 1 == arg_count {
                return Some(ParamSlot::Spread(last.ty));
            }
            let element = match interner.data(last.ty) {
                TypeData::Array { element, dim: 1 } => element,
                TypeData::Array { element, dim } => interner.array(element, dim - 1),
                // Defensive: a variadic parameter is declared with an array
                // type; anything else matches as itself.
                _ => last.ty,
            };
            return Some(ParamSlot::Variadic {
                array: last.ty,
                element,
            });
        }
        self.params.get(index).map(|p| ParamSlot::Fixed(p.ty))
    }

    // =========================================================================
    // Overrides
    // =========================================================================

    /// Whether this header can override `other` (the base signature).
    ///
    /// Parameters whose declared type is still undetermined are skipped;
    /// `infer_from_override` adopts them from the base afterwards. Otherwise
    /// parameters are contravariant (base param converts to this param) and
    /// the return type covariant (this return converts to the base return).
    pub fn can_override(&self, cx: &ResolutionContext<'_>, other: &FunctionHeader) -> bool {
        if self.params.len() != other.params.len() {
            return false;
        }
        for (mine, base) in self.params.iter().zip(other.params.iter()) {
            if mine.ty == TypeId::UNDETERMINED {
                continue;
            }
            if mine.variadic != base.variadic {
                return false;
            }
            if !cx.is_implicitly_castable(base.ty, mine.ty) {
                return false;
            }
        }
        if self.return_type != TypeId::UNDETERMINED
            && !cx.is_implicitly_castable(self.return_type, other.return_type)
        {
            return false;
        }
        true
    }

    /// Adopt missing pieces of this signature from the signature it
    /// overrides: any undetermined return/parameter type and any absent
    /// thrown type or storage tag is filled from the base.
    pub fn infer_from_override(&self, overridden: &FunctionHeader) -> FunctionHeader {
        let params = self
            .params
            .iter()
            .enumerate()
            .map(|(i, mine)| {
                let base = overridden.params.get(i);
                if mine.ty == TypeId::UNDETERMINED {
                    if let Some(base) = base {
                        return FunctionParameter {
                            name: mine.name,
                            ty: base.ty,
                            default: mine.default,
                            variadic: base.variadic,
                        };
                    }
                }
                mine.clone()
            })
            .collect();
        FunctionHeader {
            type_params: self.type_params.clone(),
            return_type: if self.return_type == TypeId::UNDETERMINED {
                overridden.return_type
            } else {
                self.return_type
            },
            thrown_type: self.thrown_type.or(overridden.thrown_type),
            storage: self.storage.or(overridden.storage),
            params,
        }
    }

    // =========================================================================
    // Conflict detection
    // =========================================================================

    /// Whether two signatures are illegal to co-declare: over the common
    /// parameter prefix every type matches exactly, and every parameter
    /// beyond the prefix on either side is defaulted or variadic, so some
    /// call could name either. Deliberately independent of implicit-cast
    /// rules — exact identity plus defaultability only.
    pub fn is_similar_to(&self, interner: &TypeInterner, other: &FunctionHeader) -> bool {
        let common = self.params.len().min(other.params.len());
        for i in 0..common {
            let a = interner.normalize(self.params[i].ty);
            let b = interner.normalize(other.params[i].ty);
            if a != b {
                return false;
            }
        }
        let optional_beyond = |params: &[FunctionParameter]| {
            params[common..]
                .iter()
                .all(|p| p.default.is_some() || p.variadic)
        };
        optional_beyond(&self.params) && optional_beyond(&other.params)
    }

    // =========================================================================
    // Canonicalization
    // =========================================================================

    /// Deterministic signature key: type-parameter list (positional, with
    /// bounds), parameter types, and return type. Names and defaults are
    /// excluded so independently parsed declarations of the same shape
    /// produce the same key.
    pub fn canonical(&self, cx: &ResolutionContext<'_>) -> String {
        let formatter = crate::format::TypeFormatter::new(cx.interner, cx.store)
            .with_positional_params(&self.type_params);
        let mut out = String::new();
        if !self.type_params.is_empty() {
            out.push('<');
            for (i, &param) in self.type_params.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push('#');
                out.push_str(&i.to_string());
                if let Some(data) = cx.store.param_data(param) {
                    for bound in &data.bounds {
                        match bound {
                            crate::types::ParamBound::Type(ty) => {
                                out.push(':');
                                out.push_str(&formatter.format(*ty));
                            }
                            crate::types::ParamBound::Super(ty) => {
                                out.push_str(" super ");
                                out.push_str(&formatter.format(*ty));
                            }
                        }
                    }
                }
            }
            out.push('>');
        }
        out.push('(');
        for (i, p) in self.params.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            out.push_str(&formatter.format(cx.interner.normalize(p.ty)));
            if p.variadic {
                out.push_str("...");
            }
        }
        out.push(')');
        out.push_str(&formatter.format(cx.interner.normalize(self.return_type)));
        if let Some(thrown) = self.thrown_type {
            out.push_str(" throws ");
            out.push_str(&formatter.format(cx.interner.normalize(thrown)));
        }
        out
    }
}

#[cfg(test)]
#[path = "../tests/header_tests.rs"]
mod tests;

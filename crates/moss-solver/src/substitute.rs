//! Generic substitution.
//!
//! A [`GenericMapper`] is the only mechanism by which a generic declaration
//! becomes concrete. Mappers nest: a method-level mapper links to the
//! enclosing type-level mapper and lookups fall through outward, so a single
//! composed mapper rewrites every reachable type-parameter occurrence at
//! once. Substitution is never applied iteratively in parts; that is what
//! keeps coincidentally same-named parameters from capturing each other
//! (identity, not name, is the key).

use crate::def::TypeParamId;
use crate::intern::TypeInterner;
use crate::types::{FunctionShape, ShapeParam, StoredType, TypeData, TypeId};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::sync::Arc;

/// An ordered, possibly nested substitution from type parameters to types.
#[derive(Clone, Debug, Default)]
pub struct GenericMapper {
    parent: Option<Arc<GenericMapper>>,
    map: FxHashMap<TypeParamId, TypeId>,
}

impl GenericMapper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(param: TypeParamId, ty: TypeId) -> Self {
        let mut map = FxHashMap::default();
        map.insert(param, ty);
        Self { parent: None, map }
    }

    pub fn from_pairs(pairs: impl IntoIterator<Item = (TypeParamId, TypeId)>) -> Self {
        Self {
            parent: None,
            map: pairs.into_iter().collect(),
        }
    }

    /// Pair up declared parameters with concrete arguments.
    /// `None` on arity mismatch; the caller owns the diagnostic.
    pub fn from_args(params: &[TypeParamId], args: &[TypeId]) -> Option<Self> {
        if params.len() != args.len() {
            return None;
        }
        Some(Self::from_pairs(
            params.iter().copied().zip(args.iter().copied()),
        ))
    }

    /// Child mapper layering `bindings` over `self`. Inner bindings shadow
    /// outer ones; unmatched lookups fall through.
    pub fn inner(self: &Arc<Self>, bindings: FxHashMap<TypeParamId, TypeId>) -> GenericMapper {
        GenericMapper {
            parent: Some(Arc::clone(self)),
            map: bindings,
        }
    }

    /// Nearest enclosing binding for `param`, or `None` if it is never bound
    /// (in which case the parameter resolves to itself during substitution).
    pub fn map(&self, param: TypeParamId) -> Option<TypeId> {
        if let Some(&ty) = self.map.get(&param) {
            return Some(ty);
        }
        self.parent.as_deref().and_then(|p| p.map(param))
    }

    /// True when no binding exists at any level.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty() && self.parent.as_deref().is_none_or(|p| p.is_empty())
    }

    /// The effective bindings for the given parameters, sorted by parameter
    /// id. This is the projection member references compare under: mappers
    /// reached through different substitution paths are interchangeable iff
    /// they agree on the parameters actually used.
    pub fn bindings_for(&self, params: &[TypeParamId]) -> Vec<(TypeParamId, TypeId)> {
        let mut bindings: Vec<(TypeParamId, TypeId)> = params
            .iter()
            .filter_map(|&p| self.map(p).map(|ty| (p, ty)))
            .collect();
        bindings.sort_unstable_by_key(|&(p, _)| p);
        bindings
    }
}

/// Rewrite every type-parameter occurrence in `ty` through `mapper`.
///
/// Returns the identical id when nothing applies: the no-op case must be
/// pointer-stable because downstream caches key on the returned id.
pub fn instantiate_type(interner: &TypeInterner, ty: TypeId, mapper: &GenericMapper) -> TypeId {
    if mapper.is_empty() {
        return ty;
    }
    match interner.data(ty) {
        TypeData::Invalid
        | TypeData::Undetermined
        | TypeData::Primitive(_)
        | TypeData::String => ty,
        TypeData::GenericParam(param) => mapper.map(param).unwrap_or(ty),
        TypeData::Array { element, dim } => {
            interner.array(instantiate_type(interner, element, mapper), dim)
        }
        TypeData::Assoc { key, value } => interner.assoc(
            instantiate_type(interner, key, mapper),
            instantiate_type(interner, value, mapper),
        ),
        TypeData::GenericMap { value, key } => {
            // The key parameter is the map's own binder; only the value side
            // is open to substitution.
            interner.generic_map(instantiate_type(interner, value, mapper), key)
        }
        TypeData::Range { element } => {
            interner.range(instantiate_type(interner, element, mapper))
        }
        TypeData::Optional(inner) => {
            // optional() collapses T?? produced by substituting T := U?.
            interner.optional(instantiate_type(interner, inner, mapper))
        }
        TypeData::Function(shape_id) => {
            let shape = interner.shape(shape_id);
            let params: Vec<ShapeParam> = shape
                .params
                .iter()
                .map(|p| ShapeParam {
                    ty: instantiate_type(interner, p.ty, mapper),
                    variadic: p.variadic,
                })
                .collect();
            interner.function(FunctionShape {
                params,
                return_type: instantiate_type(interner, shape.return_type, mapper),
                thrown_type: shape
                    .thrown_type
                    .map(|t| instantiate_type(interner, t, mapper)),
            })
        }
        TypeData::Definition { def, type_args } => {
            let args: SmallVec<[TypeId; 2]> = type_args
                .iter()
                .map(|&a| instantiate_type(interner, a, mapper))
                .collect();
            interner.definition(def, args)
        }
    }
}

/// Substitute through a stored type; the storage tag is orthogonal to shape
/// and passes through unchanged.
pub fn instantiate_stored(
    interner: &TypeInterner,
    stored: StoredType,
    mapper: &GenericMapper,
) -> StoredType {
    StoredType {
        id: instantiate_type(interner, stored.id, mapper),
        storage: stored.storage,
    }
}

#[cfg(test)]
#[path = "../tests/substitute_tests.rs"]
mod tests;

//! Structural pattern matching of types.
//!
//! `match_type` unifies a pattern type (one that may mention in-scope type
//! parameters) against a concrete type, accumulating parameter bindings into
//! a running map. It backs both call-site type-argument inference
//! (`header.rs`) and expansion target matching (`members.rs`).
//!
//! The discipline is first-wins: the first successful unification of a
//! parameter fixes its binding, and any later attempt to bind it differently
//! fails the whole match. There is no union-find and no partial success.

use crate::def::TypeParamId;
use crate::intern::TypeInterner;
use crate::types::{TypeData, TypeId};
use rustc_hash::FxHashMap;

/// Unify `pattern` against `concrete`, merging discovered bindings into
/// `bindings`. Only parameters listed in `scope` may be bound; any other
/// parameter occurring in the pattern must be matched by the identical
/// parameter on the concrete side.
///
/// On failure `bindings` may hold entries added before the failing position;
/// callers discard the map wholesale (inference has no partial success).
pub fn match_type(
    interner: &TypeInterner,
    pattern: TypeId,
    concrete: TypeId,
    scope: &[TypeParamId],
    bindings: &mut FxHashMap<TypeParamId, TypeId>,
) -> bool {
    let pattern = interner.normalize(pattern);
    let concrete = interner.normalize(concrete);
    if pattern == concrete {
        return true;
    }
    match interner.data(pattern) {
        TypeData::GenericParam(param) if scope.contains(&param) => {
            match bindings.get(&param) {
                // First successful unification wins; a later conflicting
                // attempt is an error, not a silent overwrite.
                Some(&existing) => existing == concrete,
                None => {
                    bindings.insert(param, concrete);
                    true
                }
            }
        }
        // The undetermined placeholder matches anything without binding:
        // headers still awaiting override inference must not reject calls
        // structurally.
        TypeData::Undetermined => true,
        TypeData::Array { element, dim } => match interner.data(concrete) {
            TypeData::Array {
                element: c_element,
                dim: c_dim,
            } => dim == c_dim && match_type(interner, element, c_element, scope, bindings),
            _ => false,
        },
        TypeData::Assoc { key, value } => match interner.data(concrete) {
            TypeData::Assoc {
                key: c_key,
                value: c_value,
            } => {
                match_type(interner, key, c_key, scope, bindings)
                    && match_type(interner, value, c_value, scope, bindings)
            }
            _ => false,
        },
        TypeData::GenericMap { value, key } => match interner.data(concrete) {
            TypeData::GenericMap {
                value: c_value,
                key: c_key,
            } => key == c_key && match_type(interner, value, c_value, scope, bindings),
            _ => false,
        },
        TypeData::Range { element } => match interner.data(concrete) {
            TypeData::Range { element: c_element } => {
                match_type(interner, element, c_element, scope, bindings)
            }
            _ => false,
        },
        TypeData::Optional(inner) => match interner.data(concrete) {
            TypeData::Optional(c_inner) => {
                match_type(interner, inner, c_inner, scope, bindings)
            }
            // `T?` receiving a non-optional argument still infers T: the
            // optional wrapper is satisfied by the implicit T -> T? lift.
            _ => match_type(interner, inner, concrete, scope, bindings),
        },
        TypeData::Function(shape_id) => match interner.data(concrete) {
            TypeData::Function(c_shape_id) => {
                let shape = interner.shape(shape_id);
                let c_shape = interner.shape(c_shape_id);
                if shape.params.len() != c_shape.params.len() {
                    return false;
                }
                for (p, c) in shape.params.iter().zip(c_shape.params.iter()) {
                    if p.variadic != c.variadic {
                        return false;
                    }
                    if !match_type(interner, p.ty, c.ty, scope, bindings) {
                        return false;
                    }
                }
                if !match_type(interner, shape.return_type, c_shape.return_type, scope, bindings)
                {
                    return false;
                }
                match (shape.thrown_type, c_shape.thrown_type) {
                    (None, None) => true,
                    (Some(t), Some(c_t)) => match_type(interner, t, c_t, scope, bindings),
                    _ => false,
                }
            }
            _ => false,
        },
        TypeData::Definition { def, type_args } => match interner.data(concrete) {
            TypeData::Definition {
                def: c_def,
                type_args: c_args,
            } => {
                // Strictly invariant: no supertype walking during inference.
                def == c_def
                    && type_args.len() == c_args.len()
                    && type_args
                        .iter()
                        .zip(c_args.iter())
                        .all(|(&p, &c)| match_type(interner, p, c, scope, bindings))
            }
            _ => false,
        },
        // Fully concrete pattern positions unify only with an identical
        // (normalized) type, which the fast path above already ruled out.
        TypeData::Invalid
        | TypeData::Primitive(_)
        | TypeData::String
        | TypeData::GenericParam(_) => false,
    }
}

#[cfg(test)]
#[path = "../tests/unify_tests.rs"]
mod tests;

//! Structural type interning.
//!
//! The original front end relied on reference identity of canonical type
//! instances for fast equality. Here that becomes hash-consing: every
//! [`TypeData`] shape maps to exactly one [`TypeId`], so id equality *is*
//! structural equality and downstream caches can key on ids directly.
//!
//! The constructors on this type normalize as they intern (`optional`
//! collapses double-wrapping, `array` drops zero dimensions), so types built
//! through them are always canonical. [`TypeInterner::normalize`] rebuilds an
//! arbitrary id through those constructors; it is idempotent and the result
//! is what all equality checks use.

use crate::def::{DefId, TypeParamId};
use crate::types::{FunctionShape, FunctionShapeId, Primitive, StoredType, TypeData, TypeId};
use dashmap::DashMap;
use moss_common::{Atom, Interner};
use smallvec::SmallVec;
use std::sync::Arc;
use std::sync::RwLock;

pub struct TypeInterner {
    strings: Interner,
    map: DashMap<TypeData, TypeId, rustc_hash::FxBuildHasher>,
    types: RwLock<Vec<TypeData>>,
    shape_map: DashMap<FunctionShape, FunctionShapeId, rustc_hash::FxBuildHasher>,
    shapes: RwLock<Vec<FunctionShape>>,
}

impl Default for TypeInterner {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeInterner {
    pub fn new() -> Self {
        let interner = Self {
            strings: Interner::new(),
            map: DashMap::default(),
            types: RwLock::new(Vec::new()),
            shape_map: DashMap::default(),
            shapes: RwLock::new(Vec::new()),
        };
        // Pre-intern the well-known ids in the order of the TypeId constants.
        let intrinsics = [
            TypeData::Invalid,
            TypeData::Undetermined,
            TypeData::Primitive(Primitive::Void),
            TypeData::Primitive(Primitive::Null),
            TypeData::Primitive(Primitive::Bool),
            TypeData::Primitive(Primitive::Byte),
            TypeData::Primitive(Primitive::Short),
            TypeData::Primitive(Primitive::Int),
            TypeData::Primitive(Primitive::Long),
            TypeData::Primitive(Primitive::Float),
            TypeData::Primitive(Primitive::Double),
            TypeData::Primitive(Primitive::Char),
            TypeData::String,
        ];
        for (index, data) in intrinsics.into_iter().enumerate() {
            let id = interner.intern(data);
            debug_assert_eq!(id.0 as usize, index);
        }
        debug_assert_eq!(interner.len() as u32, TypeId::FIRST_DYNAMIC);
        interner
    }

    /// Intern a shape as-is. Prefer the normalizing constructors below;
    /// `intern` does not canonicalize, so it can produce denormalized ids
    /// (which `normalize` later collapses).
    pub fn intern(&self, data: TypeData) -> TypeId {
        if let Some(existing) = self.map.get(&data) {
            return *existing;
        }
        let mut types = self.types.write().expect("type table lock poisoned");
        if let Some(existing) = self.map.get(&data) {
            return *existing;
        }
        let id = TypeId(u32::try_from(types.len()).expect("type table overflow"));
        types.push(data.clone());
        self.map.insert(data, id);
        id
    }

    /// Shape behind an id. `None` only for ids from a foreign interner,
    /// which is a caller bug.
    pub fn lookup(&self, id: TypeId) -> Option<TypeData> {
        let types = self.types.read().expect("type table lock poisoned");
        types.get(id.0 as usize).cloned()
    }

    pub(crate) fn data(&self, id: TypeId) -> TypeData {
        self.lookup(id).expect("dangling TypeId")
    }

    pub fn len(&self) -> usize {
        self.types.read().expect("type table lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // =========================================================================
    // String interning
    // =========================================================================

    pub fn intern_string(&self, text: &str) -> Atom {
        self.strings.intern(text)
    }

    pub fn resolve_atom(&self, atom: Atom) -> Arc<str> {
        self.strings.resolve(atom)
    }

    // =========================================================================
    // Normalizing constructors
    // =========================================================================

    pub fn array(&self, element: TypeId, dim: u32) -> TypeId {
        if dim == 0 {
            // Zero-dimensional arrays are denormalized spellings of the
            // element type itself.
            return element;
        }
        self.intern(TypeData::Array { element, dim })
    }

    pub fn assoc(&self, key: TypeId, value: TypeId) -> TypeId {
        self.intern(TypeData::Assoc { key, value })
    }

    pub fn generic_map(&self, value: TypeId, key: TypeParamId) -> TypeId {
        self.intern(TypeData::GenericMap { value, key })
    }

    pub fn range(&self, element: TypeId) -> TypeId {
        self.intern(TypeData::Range { element })
    }

    /// `T?`. Wrapping an optional or the invalid type is a no-op.
    pub fn optional(&self, inner: TypeId) -> TypeId {
        if inner == TypeId::INVALID {
            return inner;
        }
        if matches!(self.data(inner), TypeData::Optional(_)) {
            return inner;
        }
        self.intern(TypeData::Optional(inner))
    }

    pub fn function(&self, shape: FunctionShape) -> TypeId {
        let shape_id = self.intern_shape(shape);
        self.intern(TypeData::Function(shape_id))
    }

    pub fn generic_param(&self, param: TypeParamId) -> TypeId {
        self.intern(TypeData::GenericParam(param))
    }

    pub fn definition(&self, def: DefId, type_args: impl IntoIterator<Item = TypeId>) -> TypeId {
        self.intern(TypeData::Definition {
            def,
            type_args: type_args.into_iter().collect(),
        })
    }

    pub fn intern_shape(&self, shape: FunctionShape) -> FunctionShapeId {
        if let Some(existing) = self.shape_map.get(&shape) {
            return *existing;
        }
        let mut shapes = self.shapes.write().expect("shape table lock poisoned");
        if let Some(existing) = self.shape_map.get(&shape) {
            return *existing;
        }
        let id = FunctionShapeId(u32::try_from(shapes.len()).expect("shape table overflow"));
        shapes.push(shape.clone());
        self.shape_map.insert(shape, id);
        id
    }

    pub fn shape(&self, id: FunctionShapeId) -> FunctionShape {
        let shapes = self.shapes.read().expect("shape table lock poisoned");
        shapes
            .get(id.0 as usize)
            .cloned()
            .expect("dangling FunctionShapeId")
    }

    // =========================================================================
    // Normalization
    // =========================================================================

    /// Canonical form of an id. Idempotent; already-normalized ids come back
    /// unchanged, so this is also the pointer-stable fast path for cache
    /// keys.
    pub fn normalize(&self, id: TypeId) -> TypeId {
        match self.data(id) {
            TypeData::Invalid
            | TypeData::Undetermined
            | TypeData::Primitive(_)
            | TypeData::String
            | TypeData::GenericParam(_) => id,
            TypeData::Array { element, dim } => self.array(self.normalize(element), dim),
            TypeData::Assoc { key, value } => self.assoc(self.normalize(key), self.normalize(value)),
            TypeData::GenericMap { value, key } => self.generic_map(self.normalize(value), key),
            TypeData::Range { element } => self.range(self.normalize(element)),
            TypeData::Optional(inner) => self.optional(self.normalize(inner)),
            TypeData::Function(shape_id) => {
                let shape = self.shape(shape_id);
                let normalized = FunctionShape {
                    params: shape
                        .params
                        .iter()
                        .map(|p| crate::types::ShapeParam {
                            ty: self.normalize(p.ty),
                            variadic: p.variadic,
                        })
                        .collect(),
                    return_type: self.normalize(shape.return_type),
                    thrown_type: shape.thrown_type.map(|t| self.normalize(t)),
                };
                self.function(normalized)
            }
            TypeData::Definition { def, type_args } => {
                let args: SmallVec<[TypeId; 2]> =
                    type_args.iter().map(|&a| self.normalize(a)).collect();
                self.definition(def, args)
            }
        }
    }

    pub fn normalize_stored(&self, stored: StoredType) -> StoredType {
        StoredType {
            id: self.normalize(stored.id),
            storage: stored.storage,
        }
    }

    // =========================================================================
    // Containment queries
    // =========================================================================

    /// Whether any node reachable from `id` satisfies the predicate.
    /// Interned types form a finite DAG, so plain recursion terminates.
    pub fn contains(&self, id: TypeId, pred: &mut impl FnMut(&TypeData) -> bool) -> bool {
        let data = self.data(id);
        if pred(&data) {
            return true;
        }
        match data {
            TypeData::Invalid
            | TypeData::Undetermined
            | TypeData::Primitive(_)
            | TypeData::String
            | TypeData::GenericParam(_) => false,
            TypeData::Array { element, .. } => self.contains(element, pred),
            TypeData::Assoc { key, value } => self.contains(key, pred) || self.contains(value, pred),
            TypeData::GenericMap { value, .. } => self.contains(value, pred),
            TypeData::Range { element } => self.contains(element, pred),
            TypeData::Optional(inner) => self.contains(inner, pred),
            TypeData::Function(shape_id) => {
                let shape = self.shape(shape_id);
                shape.params.iter().any(|p| self.contains(p.ty, pred))
                    || self.contains(shape.return_type, pred)
                    || shape
                        .thrown_type
                        .is_some_and(|t| self.contains(t, pred))
            }
            TypeData::Definition { type_args, .. } => {
                type_args.iter().any(|&a| self.contains(a, pred))
            }
        }
    }

    /// Whether the undetermined placeholder occurs anywhere in `id`.
    pub fn has_undetermined(&self, id: TypeId) -> bool {
        self.contains(id, &mut |data| matches!(data, TypeData::Undetermined))
    }

    /// Whether `id` mentions the given definition.
    pub fn mentions_def(&self, id: TypeId, def: DefId) -> bool {
        self.contains(
            id,
            &mut |data| matches!(data, TypeData::Definition { def: d, .. } if *d == def),
        )
    }

    /// Whether `id` mentions the given type parameter.
    pub fn mentions_param(&self, id: TypeId, param: TypeParamId) -> bool {
        self.contains(id, &mut |data| match data {
            TypeData::GenericParam(p) => *p == param,
            TypeData::GenericMap { key, .. } => *key == param,
            _ => false,
        })
    }

    /// Collect every type parameter referenced from `id`.
    pub fn collect_params(&self, id: TypeId, out: &mut Vec<TypeParamId>) {
        match self.data(id) {
            TypeData::GenericParam(p) => {
                if !out.contains(&p) {
                    out.push(p);
                }
            }
            TypeData::Invalid
            | TypeData::Undetermined
            | TypeData::Primitive(_)
            | TypeData::String => {}
            TypeData::Array { element, .. } => self.collect_params(element, out),
            TypeData::Assoc { key, value } => {
                self.collect_params(key, out);
                self.collect_params(value, out);
            }
            TypeData::GenericMap { value, key } => {
                if !out.contains(&key) {
                    out.push(key);
                }
                self.collect_params(value, out);
            }
            TypeData::Range { element } => self.collect_params(element, out),
            TypeData::Optional(inner) => self.collect_params(inner, out),
            TypeData::Function(shape_id) => {
                let shape = self.shape(shape_id);
                for p in &shape.params {
                    self.collect_params(p.ty, out);
                }
                self.collect_params(shape.return_type, out);
                if let Some(thrown) = shape.thrown_type {
                    self.collect_params(thrown, out);
                }
            }
            TypeData::Definition { type_args, .. } => {
                for a in type_args {
                    self.collect_params(a, out);
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "../tests/intern_tests.rs"]
mod tests;

//! Core type representation.
//!
//! Every type the solver reasons about is a [`TypeData`] node interned into a
//! [`TypeId`] (see `intern.rs`). Interning makes `TypeId` comparison the
//! canonical equality: structurally identical shapes always receive the same
//! id, so equality and hashing never walk the structure.
//!
//! The variant set is closed. The original front end dispatched over it with
//! double-dispatch visitors; here every consumer is an exhaustive `match`, so
//! adding a variant is a compile error at each dispatch site.

use crate::def::{DefId, TypeParamId};
use moss_common::Atom;
use smallvec::SmallVec;

/// An interned type descriptor handle.
///
/// Ids are only meaningful relative to the [`crate::intern::TypeInterner`]
/// that produced them. The well-known ids below are pre-interned by
/// `TypeInterner::new` in this exact order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub u32);

impl TypeId {
    /// Error placeholder. Produced for unresolvable references so the rest of
    /// the file keeps compiling; converts to and from everything silently to
    /// suppress cascading diagnostics.
    pub const INVALID: Self = Self(0);
    /// Not-yet-inferred placeholder used before inference completes.
    pub const UNDETERMINED: Self = Self(1);
    pub const VOID: Self = Self(2);
    /// Type of the `null` literal; implicitly converts to any optional type.
    pub const NULL: Self = Self(3);
    pub const BOOL: Self = Self(4);
    pub const BYTE: Self = Self(5);
    pub const SHORT: Self = Self(6);
    pub const INT: Self = Self(7);
    pub const LONG: Self = Self(8);
    pub const FLOAT: Self = Self(9);
    pub const DOUBLE: Self = Self(10);
    pub const CHAR: Self = Self(11);
    pub const STRING: Self = Self(12);

    /// First id handed out for non-intrinsic types.
    pub const FIRST_DYNAMIC: u32 = 13;
}

/// Builtin scalar kinds.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Primitive {
    Void,
    Null,
    Bool,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    Char,
}

impl Primitive {
    pub const fn name(self) -> &'static str {
        match self {
            Primitive::Void => "void",
            Primitive::Null => "null",
            Primitive::Bool => "bool",
            Primitive::Byte => "byte",
            Primitive::Short => "short",
            Primitive::Int => "int",
            Primitive::Long => "long",
            Primitive::Float => "float",
            Primitive::Double => "double",
            Primitive::Char => "char",
        }
    }
}

/// Interned handle for a function type's shape (see `TypeInterner`).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct FunctionShapeId(pub u32);

/// The structural shape of a function *type*.
///
/// Shapes carry only what participates in type identity: parameter types and
/// variadic flags, return type, thrown type. Names and default values belong
/// to [`crate::header::FunctionHeader`], which describes declarations.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FunctionShape {
    pub params: Vec<ShapeParam>,
    pub return_type: TypeId,
    pub thrown_type: Option<TypeId>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ShapeParam {
    pub ty: TypeId,
    pub variadic: bool,
}

/// A type descriptor. Structurally interned; never compare `TypeData` values
/// directly outside the interner, compare [`TypeId`]s.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeData {
    Invalid,
    Undetermined,
    Primitive(Primitive),
    String,
    /// `T[]`, `T[,]`, ... — element type plus dimension (>= 1).
    Array { element: TypeId, dim: u32 },
    /// `V[K]` — associative map.
    Assoc { key: TypeId, value: TypeId },
    /// `V[<K>]` — map keyed by a type parameter rather than a value.
    GenericMap { value: TypeId, key: TypeParamId },
    /// `T .. T`
    Range { element: TypeId },
    /// One-layer optional wrapper; `T??` is denormalized and collapses.
    Optional(TypeId),
    Function(FunctionShapeId),
    /// Reference to a type parameter. A parameter with no active binding
    /// resolves to itself through any mapper.
    GenericParam(TypeParamId),
    /// Nominal type (class/interface/struct/enum/variant) instantiation.
    Definition {
        def: DefId,
        type_args: SmallVec<[TypeId; 2]>,
    },
}

/// Ownership/placement tag, orthogonal to a type's shape.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum StorageClass {
    Value,
    Shared,
    Borrow,
    Static,
}

impl StorageClass {
    pub const fn name(self) -> &'static str {
        match self {
            StorageClass::Value => "value",
            StorageClass::Shared => "shared",
            StorageClass::Borrow => "borrow",
            StorageClass::Static => "static",
        }
    }
}

/// A type paired with its optional storage tag.
///
/// Equality includes the tag only when specified: `int` and `shared int` are
/// distinct stored types, but both carry `TypeId::INT`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct StoredType {
    pub id: TypeId,
    pub storage: Option<StorageClass>,
}

impl StoredType {
    pub const fn bare(id: TypeId) -> Self {
        Self { id, storage: None }
    }

    pub const fn with_storage(id: TypeId, storage: StorageClass) -> Self {
        Self {
            id,
            storage: Some(storage),
        }
    }
}

impl From<TypeId> for StoredType {
    fn from(id: TypeId) -> Self {
        Self::bare(id)
    }
}

/// A bound constraining a type parameter.
///
/// Bounds both constrain inference and contribute members: any member cache
/// built for a receiver known to satisfy the bound includes the bound's
/// contribution (see `members.rs`).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ParamBound {
    /// `T: X` — T is usable as X; contributes X's full instance surface and
    /// admits an implicit conversion T -> X.
    Type(TypeId),
    /// `T super X` — X is usable as T; contributes constructors only.
    Super(TypeId),
}

/// Data behind a [`TypeParamId`].
///
/// Identity is the id, never the name: two declarations spelling `T` are
/// distinct parameters.
#[derive(Clone, Debug)]
pub struct TypeParamData {
    pub name: Atom,
    pub bounds: Vec<ParamBound>,
}

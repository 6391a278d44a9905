//! Resolution of unresolved type references from the parser boundary.
//!
//! The parser hands over type syntax as names with optional type-argument
//! lists and an optional storage annotation. Resolution walks an enclosing
//! scope chain (type parameters, file imports, package, builtins) to a
//! concrete interned type. A failed resolution is a recoverable diagnostic;
//! the caller substitutes the invalid type and keeps compiling.

use crate::def::{DefId, DefinitionStore, TypeParamId};
use crate::intern::TypeInterner;
use crate::types::{StorageClass, StoredType, TypeId};
use moss_common::diagnostics::{Diagnostic, codes};
use moss_common::{Atom, Span, limits};
use rustc_hash::FxHashMap;

/// Type syntax as delivered by the parser, not yet resolved.
#[derive(Clone, Debug)]
pub enum UnresolvedType {
    Named {
        name: Atom,
        type_args: Vec<UnresolvedType>,
    },
    Array {
        element: Box<UnresolvedType>,
        dim: u32,
    },
    Assoc {
        key: Box<UnresolvedType>,
        value: Box<UnresolvedType>,
    },
    Optional(Box<UnresolvedType>),
    Range(Box<UnresolvedType>),
}

impl UnresolvedType {
    pub fn named(name: Atom) -> Self {
        UnresolvedType::Named {
            name,
            type_args: Vec::new(),
        }
    }
}

/// A full type reference: syntax plus optional storage annotation and the
/// source range for diagnostics.
#[derive(Clone, Debug)]
pub struct UnresolvedTypeRef {
    pub ty: UnresolvedType,
    pub storage: Option<StorageClass>,
    pub span: Span,
}

/// What a type name resolves to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TypeSymbol {
    Definition(DefId),
    Parameter(TypeParamId),
    Builtin(TypeId),
}

/// One link of the scope chain.
pub trait TypeScope {
    fn lookup_type(&self, name: Atom) -> Option<TypeSymbol>;
}

/// The outermost scope: builtin type names.
pub struct BuiltinScope {
    symbols: FxHashMap<Atom, TypeSymbol>,
}

impl BuiltinScope {
    pub fn new(interner: &TypeInterner) -> Self {
        let mut symbols = FxHashMap::default();
        let builtins: &[(&str, TypeId)] = &[
            ("void", TypeId::VOID),
            ("bool", TypeId::BOOL),
            ("byte", TypeId::BYTE),
            ("short", TypeId::SHORT),
            ("int", TypeId::INT),
            ("long", TypeId::LONG),
            ("float", TypeId::FLOAT),
            ("double", TypeId::DOUBLE),
            ("char", TypeId::CHAR),
            ("string", TypeId::STRING),
        ];
        for &(name, ty) in builtins {
            symbols.insert(interner.intern_string(name), TypeSymbol::Builtin(ty));
        }
        Self { symbols }
    }
}

impl TypeScope for BuiltinScope {
    fn lookup_type(&self, name: Atom) -> Option<TypeSymbol> {
        self.symbols.get(&name).copied()
    }
}

/// A scope layered over a parent: file imports, package contents, or the
/// type parameters of an enclosing declaration.
pub struct StackedScope<'p> {
    parent: &'p dyn TypeScope,
    symbols: FxHashMap<Atom, TypeSymbol>,
}

impl<'p> StackedScope<'p> {
    pub fn new(parent: &'p dyn TypeScope) -> Self {
        Self {
            parent,
            symbols: FxHashMap::default(),
        }
    }

    pub fn define(&mut self, name: Atom, symbol: TypeSymbol) {
        self.symbols.insert(name, symbol);
    }
}

impl TypeScope for StackedScope<'_> {
    fn lookup_type(&self, name: Atom) -> Option<TypeSymbol> {
        self.symbols
            .get(&name)
            .copied()
            .or_else(|| self.parent.lookup_type(name))
    }
}

/// Resolve a type reference against a scope chain.
pub fn resolve_type_ref(
    interner: &TypeInterner,
    store: &DefinitionStore,
    scope: &dyn TypeScope,
    reference: &UnresolvedTypeRef,
) -> Result<StoredType, Diagnostic> {
    let id = resolve_inner(interner, store, scope, &reference.ty, reference.span, 0)?;
    Ok(StoredType {
        id,
        storage: reference.storage,
    })
}

fn resolve_inner(
    interner: &TypeInterner,
    store: &DefinitionStore,
    scope: &dyn TypeScope,
    ty: &UnresolvedType,
    span: Span,
    depth: u32,
) -> Result<TypeId, Diagnostic> {
    if depth > limits::MAX_TYPE_SYNTAX_DEPTH {
        return Err(Diagnostic::error(
            codes::UNKNOWN_TYPE,
            span,
            "type syntax is nested too deeply",
        ));
    }
    match ty {
        UnresolvedType::Named { name, type_args } => {
            let Some(symbol) = scope.lookup_type(*name) else {
                return Err(Diagnostic::error(
                    codes::UNKNOWN_TYPE,
                    span,
                    format!("unknown type name {}", interner.resolve_atom(*name)),
                ));
            };
            match symbol {
                TypeSymbol::Definition(def) => {
                    let params = store.get_type_params(def);
                    if params.len() != type_args.len() {
                        return Err(Diagnostic::error(
                            codes::TYPE_ARGUMENT_COUNT,
                            span,
                            format!(
                                "expected {} type arguments, found {}",
                                params.len(),
                                type_args.len()
                            ),
                        ));
                    }
                    let mut args = Vec::with_capacity(type_args.len());
                    for arg in type_args {
                        args.push(resolve_inner(interner, store, scope, arg, span, depth + 1)?);
                    }
                    Ok(interner.definition(def, args))
                }
                TypeSymbol::Parameter(param) => {
                    if !type_args.is_empty() {
                        return Err(Diagnostic::error(
                            codes::TYPE_ARGUMENT_COUNT,
                            span,
                            "type parameters take no type arguments",
                        ));
                    }
                    Ok(interner.generic_param(param))
                }
                TypeSymbol::Builtin(id) => {
                    if !type_args.is_empty() {
                        return Err(Diagnostic::error(
                            codes::TYPE_ARGUMENT_COUNT,
                            span,
                            "builtin types take no type arguments",
                        ));
                    }
                    Ok(id)
                }
            }
        }
        UnresolvedType::Array { element, dim } => {
            let element = resolve_inner(interner, store, scope, element, span, depth + 1)?;
            Ok(interner.array(element, *dim))
        }
        UnresolvedType::Assoc { key, value } => {
            let key = resolve_inner(interner, store, scope, key, span, depth + 1)?;
            let value = resolve_inner(interner, store, scope, value, span, depth + 1)?;
            Ok(interner.assoc(key, value))
        }
        UnresolvedType::Optional(inner) => {
            let inner = resolve_inner(interner, store, scope, inner, span, depth + 1)?;
            Ok(interner.optional(inner))
        }
        UnresolvedType::Range(element) => {
            let element = resolve_inner(interner, store, scope, element, span, depth + 1)?;
            Ok(interner.range(element))
        }
    }
}

#[cfg(test)]
#[path = "../tests/scope_tests.rs"]
mod tests;

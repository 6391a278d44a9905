use super::*;
use crate::def::DefinitionStore;
use crate::intern::TypeInterner;
use crate::members::ResolutionContext;
use crate::types::{StoredType, TypeId};

#[test]
fn test_widening_lattice_is_implicit_only() {
    let interner = TypeInterner::new();
    let store = DefinitionStore::new();
    register_builtins(&store);
    let cx = ResolutionContext::new(&interner, &store);

    // Upward along the lattice.
    assert!(cx.is_implicitly_castable(TypeId::BYTE, TypeId::SHORT));
    assert!(cx.is_implicitly_castable(TypeId::BYTE, TypeId::LONG));
    assert!(cx.is_implicitly_castable(TypeId::SHORT, TypeId::DOUBLE));
    assert!(cx.is_implicitly_castable(TypeId::INT, TypeId::FLOAT));
    assert!(cx.is_implicitly_castable(TypeId::FLOAT, TypeId::DOUBLE));
    assert!(cx.is_implicitly_castable(TypeId::CHAR, TypeId::STRING));
    assert!(cx.is_implicitly_castable(TypeId::CHAR, TypeId::INT));

    // Never downward, never across.
    assert!(!cx.is_implicitly_castable(TypeId::DOUBLE, TypeId::FLOAT));
    assert!(!cx.is_implicitly_castable(TypeId::LONG, TypeId::BYTE));
    assert!(!cx.is_implicitly_castable(TypeId::STRING, TypeId::CHAR));
    assert!(!cx.is_implicitly_castable(TypeId::BOOL, TypeId::INT));
}

#[test]
fn test_casters_surface_through_member_resolution() {
    let interner = TypeInterner::new();
    let store = DefinitionStore::new();
    register_builtins(&store);
    let cx = ResolutionContext::new(&interner, &store);

    let members = cx.resolve(StoredType::bare(TypeId::INT));
    let targets: Vec<TypeId> = members
        .casters()
        .iter()
        .map(|entry| entry.member.header(&interner, &store).return_type)
        .collect();
    assert_eq!(targets, vec![TypeId::LONG, TypeId::FLOAT, TypeId::DOUBLE]);
}

use super::*;
use crate::header::{FunctionHeader, FunctionParameter};
use crate::intern::TypeInterner;
use crate::member_ref::{DefinitionMemberRef, FunctionalMemberRef};
use crate::substitute::GenericMapper;
use crate::types::{ParamBound, StoredType, TypeId};

#[test]
fn test_register_and_get() {
    let interner = TypeInterner::new();
    let store = DefinitionStore::new();
    assert!(store.is_empty());

    let def = store.register(DefinitionInfo::class(interner.intern_string("Point"), vec![]));
    assert!(def.is_valid());
    assert_eq!(store.len(), 1);
    assert_eq!(store.get_kind(def), Some(DefKind::Class));
    assert_eq!(
        store.get_name(def).map(|n| interner.resolve_atom(n)),
        Some("Point".into())
    );
    assert!(store.get(DefId(999)).is_none());
    assert!(!DefId::INVALID.is_valid());
}

#[test]
fn test_members_keep_declaration_order() {
    let interner = TypeInterner::new();
    let store = DefinitionStore::new();
    let def = store.register(DefinitionInfo::class(interner.intern_string("Text"), vec![]));

    let first = store.add_member(
        def,
        MemberDecl::new(
            MemberKind::Method {
                name: interner.intern_string("a"),
            },
            MemberModifiers::empty(),
            FunctionHeader::nullary(TypeId::VOID),
        ),
    );
    let second = store.add_member(
        def,
        MemberDecl::new(
            MemberKind::Field {
                name: interner.intern_string("b"),
            },
            MemberModifiers::CONST,
            FunctionHeader::nullary(TypeId::INT),
        ),
    );

    let info = store.get(def).expect("registered");
    assert_eq!(info.members, vec![first, second]);
    assert!(store
        .member(second)
        .expect("member")
        .modifiers
        .contains(MemberModifiers::CONST));
}

#[test]
fn test_type_params_have_identity_not_names() {
    let interner = TypeInterner::new();
    let store = DefinitionStore::new();
    let name = interner.intern_string("T");
    let a = store.type_param(name);
    let b = store.type_param(name);
    assert_ne!(a, b);

    store.add_bound(a, ParamBound::Type(TypeId::STRING));
    assert_eq!(store.param_data(a).expect("a").bounds.len(), 1);
    assert!(store.param_data(b).expect("b").bounds.is_empty());
}

#[test]
fn test_expansions_iterate_in_registration_order() {
    let store = DefinitionStore::new();
    let first = store.register_expansion(ExpansionDecl {
        type_params: vec![],
        target: TypeId::STRING,
        members: vec![],
        span: None,
    });
    let second = store.register_expansion(ExpansionDecl {
        type_params: vec![],
        target: TypeId::INT,
        members: vec![],
        span: None,
    });
    assert_eq!(store.expansion_ids(), vec![first, second]);
    assert_eq!(store.expansion(first).expect("first").target, TypeId::STRING);
}

#[test]
fn test_override_link_attaches_once_resolved() {
    let interner = TypeInterner::new();
    let store = DefinitionStore::new();
    let def = store.register(DefinitionInfo::class(interner.intern_string("Base"), vec![]));
    let member = store.add_member(
        def,
        MemberDecl::new(
            MemberKind::Method {
                name: interner.intern_string("m"),
            },
            MemberModifiers::empty(),
            FunctionHeader::new(vec![FunctionParameter::new(TypeId::INT)], TypeId::VOID),
        ),
    );
    assert!(store.get_overrides(member).is_none());

    let owner = StoredType::bare(interner.definition(def, []));
    let target = FunctionalMemberRef::new(DefinitionMemberRef::bind(
        &interner,
        &store,
        member,
        owner,
        GenericMapper::new(),
    ));
    store.set_overrides(member, target.clone());
    assert_eq!(store.get_overrides(member), Some(target));
}

#[test]
fn test_heritage_may_reference_own_id() {
    let interner = TypeInterner::new();
    let store = DefinitionStore::new();
    let t = store.type_param(interner.intern_string("T"));
    let def = store.register(DefinitionInfo::class(interner.intern_string("Node"), vec![t]));
    store.set_superclass(def, interner.definition(def, [TypeId::INT]));
    assert_eq!(
        store.get(def).expect("node").superclass,
        Some(interner.definition(def, [TypeId::INT]))
    );
}

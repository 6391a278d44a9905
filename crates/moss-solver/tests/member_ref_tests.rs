use super::*;
use crate::def::{DefinitionInfo, DefinitionStore, MemberDecl, MemberKind, MemberModifiers};
use crate::header::FunctionHeader;
use crate::intern::TypeInterner;
use crate::substitute::GenericMapper;
use crate::types::{StoredType, TypeId};

fn box_fixture() -> (TypeInterner, DefinitionStore, crate::def::DefId, crate::def::MemberId) {
    let interner = TypeInterner::new();
    let store = DefinitionStore::new();
    let t = store.type_param(interner.intern_string("T"));
    let def = store.register(DefinitionInfo::class(interner.intern_string("Box"), vec![t]));
    let member = store.add_member(
        def,
        MemberDecl::new(
            MemberKind::Field {
                name: interner.intern_string("value"),
            },
            MemberModifiers::empty(),
            FunctionHeader::nullary(interner.generic_param(t)),
        ),
    );
    (interner, store, def, member)
}

#[test]
fn test_header_is_instantiated_lazily() {
    let (interner, store, def, member) = box_fixture();
    let t = store.get_type_params(def)[0];

    let owner = StoredType::bare(interner.definition(def, [TypeId::INT]));
    let reference = DefinitionMemberRef::bind(
        &interner,
        &store,
        member,
        owner,
        GenericMapper::single(t, TypeId::INT),
    );
    assert_eq!(reference.header(&interner, &store).return_type, TypeId::INT);
    assert_eq!(reference.member_type(&interner, &store), TypeId::INT);
    // Second access hits the memoized header.
    assert_eq!(reference.header(&interner, &store).return_type, TypeId::INT);
}

#[test]
fn test_equality_is_projection_based() {
    let (interner, store, def, member) = box_fixture();
    let t = store.get_type_params(def)[0];
    let unrelated = store.type_param(interner.intern_string("U"));
    let owner = StoredType::bare(interner.definition(def, [TypeId::INT]));

    // Two substitution paths that agree on T: the extra unrelated binding
    // does not affect identity.
    let direct = DefinitionMemberRef::bind(
        &interner,
        &store,
        member,
        owner,
        GenericMapper::single(t, TypeId::INT),
    );
    let indirect = DefinitionMemberRef::bind(
        &interner,
        &store,
        member,
        owner,
        GenericMapper::from_pairs([(t, TypeId::INT), (unrelated, TypeId::STRING)]),
    );
    assert_eq!(direct, indirect);

    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};
    let hash_of = |r: &DefinitionMemberRef| {
        let mut hasher = DefaultHasher::new();
        r.hash(&mut hasher);
        hasher.finish()
    };
    assert_eq!(hash_of(&direct), hash_of(&indirect));
}

#[test]
fn test_distinct_instantiations_are_distinct() {
    let (interner, store, def, member) = box_fixture();
    let t = store.get_type_params(def)[0];

    let int_owner = StoredType::bare(interner.definition(def, [TypeId::INT]));
    let string_owner = StoredType::bare(interner.definition(def, [TypeId::STRING]));

    let on_int = DefinitionMemberRef::bind(
        &interner,
        &store,
        member,
        int_owner,
        GenericMapper::single(t, TypeId::INT),
    );
    let on_string = DefinitionMemberRef::bind(
        &interner,
        &store,
        member,
        string_owner,
        GenericMapper::single(t, TypeId::STRING),
    );
    assert_ne!(on_int, on_string);
    assert_eq!(on_int.header(&interner, &store).return_type, TypeId::INT);
    assert_eq!(
        on_string.header(&interner, &store).return_type,
        TypeId::STRING
    );
}

#[test]
fn test_functional_ref_wraps_target() {
    let (interner, store, def, member) = box_fixture();
    let t = store.get_type_params(def)[0];
    let owner = StoredType::bare(interner.definition(def, [TypeId::INT]));
    let target = DefinitionMemberRef::bind(
        &interner,
        &store,
        member,
        owner,
        GenericMapper::single(t, TypeId::INT),
    );
    let functional = FunctionalMemberRef::new(target.clone());
    assert_eq!(functional.decl(), target.decl());
    assert_eq!(functional.owner(), owner);
}

//! Builtin conversion lattice.
//!
//! Primitive widening is not special-cased in the castability check; it is
//! registered here as expansion-contributed implicit caster members, so the
//! ordinary member-resolution path serves primitives exactly the way it
//! serves user expansions on foreign types.

use crate::def::{DefinitionStore, ExpansionDecl, MemberDecl, MemberKind, MemberModifiers};
use crate::header::FunctionHeader;
use crate::types::TypeId;

/// The widening targets of each primitive source type. Full closure per
/// source: the castability check follows direct casters only.
const WIDENINGS: &[(TypeId, &[TypeId])] = &[
    (
        TypeId::BYTE,
        &[
            TypeId::SHORT,
            TypeId::INT,
            TypeId::LONG,
            TypeId::FLOAT,
            TypeId::DOUBLE,
        ],
    ),
    (
        TypeId::SHORT,
        &[TypeId::INT, TypeId::LONG, TypeId::FLOAT, TypeId::DOUBLE],
    ),
    (TypeId::INT, &[TypeId::LONG, TypeId::FLOAT, TypeId::DOUBLE]),
    (TypeId::LONG, &[TypeId::FLOAT, TypeId::DOUBLE]),
    (TypeId::FLOAT, &[TypeId::DOUBLE]),
    (TypeId::CHAR, &[TypeId::STRING, TypeId::INT]),
];

/// Register the builtin implicit conversions. Call once per session, before
/// the first member-cache query on a primitive receiver.
pub fn register_builtins(store: &DefinitionStore) {
    for &(source, targets) in WIDENINGS {
        let members = targets
            .iter()
            .map(|&target| {
                store.add_expansion_member(MemberDecl::new(
                    MemberKind::Caster,
                    MemberModifiers::IMPLICIT,
                    FunctionHeader::nullary(target),
                ))
            })
            .collect();
        store.register_expansion(ExpansionDecl {
            type_params: Vec::new(),
            target: source,
            members,
            span: None,
        });
    }
}

#[cfg(test)]
#[path = "../tests/builtins_tests.rs"]
mod tests;

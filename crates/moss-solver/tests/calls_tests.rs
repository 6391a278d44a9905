use super::*;
use crate::builtins::register_builtins;
use crate::def::{
    DefinitionInfo, DefinitionStore, MemberDecl, MemberKind, MemberModifiers, OperatorKind,
};
use crate::header::{ExprRef, FunctionHeader, FunctionParameter};
use crate::intern::TypeInterner;
use crate::members::ResolutionContext;
use crate::types::{StoredType, TypeId};
use moss_common::Span;
use moss_common::diagnostics::codes;

fn method(interner: &TypeInterner, name: &str, header: FunctionHeader) -> MemberDecl {
    MemberDecl::new(
        MemberKind::Method {
            name: interner.intern_string(name),
        },
        MemberModifiers::empty(),
        header,
    )
}

fn setup() -> (TypeInterner, DefinitionStore) {
    let interner = TypeInterner::new();
    let store = DefinitionStore::new();
    register_builtins(&store);
    (interner, store)
}

#[test]
fn test_exact_match_beats_implicit() {
    let (interner, store) = setup();
    let text = store.register(DefinitionInfo::class(interner.intern_string("Text"), vec![]));
    store.add_member(
        text,
        method(
            &interner,
            "pad",
            FunctionHeader::new(vec![FunctionParameter::new(TypeId::INT)], TypeId::BOOL),
        ),
    );
    store.add_member(
        text,
        method(
            &interner,
            "pad",
            FunctionHeader::new(vec![FunctionParameter::new(TypeId::LONG)], TypeId::STRING),
        ),
    );

    let cx = ResolutionContext::new(&interner, &store);
    let receiver = StoredType::bare(interner.definition(text, []));
    let pad = interner.intern_string("pad");

    // int matches pad(int) exactly even though pad(long) also applies
    // implicitly.
    let result = cx.resolve_call(receiver, pad, &CallArguments::new(vec![TypeId::INT]));
    let bound = result.bound().expect("exact overload wins");
    assert_eq!(bound.header.params[0].ty, TypeId::INT);
    assert_eq!(bound.header.return_type, TypeId::BOOL);

    // long only fits pad(long).
    let result = cx.resolve_call(receiver, pad, &CallArguments::new(vec![TypeId::LONG]));
    let bound = result.bound().expect("single applicable overload");
    assert_eq!(bound.header.params[0].ty, TypeId::LONG);
}

#[test]
fn test_two_implicit_candidates_are_ambiguous() {
    let (interner, store) = setup();
    let text = store.register(DefinitionInfo::class(interner.intern_string("Text"), vec![]));
    store.add_member(
        text,
        method(
            &interner,
            "pad",
            FunctionHeader::new(vec![FunctionParameter::new(TypeId::INT)], TypeId::VOID),
        ),
    );
    store.add_member(
        text,
        method(
            &interner,
            "pad",
            FunctionHeader::new(vec![FunctionParameter::new(TypeId::LONG)], TypeId::VOID),
        ),
    );

    let cx = ResolutionContext::new(&interner, &store);
    let receiver = StoredType::bare(interner.definition(text, []));

    // short widens to both int and long; neither is exact.
    let result = cx.resolve_call(
        receiver,
        interner.intern_string("pad"),
        &CallArguments::new(vec![TypeId::SHORT]),
    );
    let CallResult::AmbiguousCall { candidates, .. } = result else {
        panic!("expected ambiguity, got {result:?}");
    };
    assert_eq!(candidates.len(), 2);

    // The diagnostic carries the ambiguity code.
    let diag = cx
        .resolve_call(
            receiver,
            interner.intern_string("pad"),
            &CallArguments::new(vec![TypeId::SHORT]),
        )
        .to_diagnostic(&cx, Span::EMPTY)
        .expect("failure diagnostic");
    assert_eq!(diag.code, codes::AMBIGUOUS_CALL);
}

#[test]
fn test_failure_sentinels() {
    let (interner, store) = setup();
    let text = store.register(DefinitionInfo::class(interner.intern_string("Text"), vec![]));
    store.add_member(
        text,
        method(
            &interner,
            "trim",
            FunctionHeader::new(vec![FunctionParameter::new(TypeId::STRING)], TypeId::STRING),
        ),
    );

    let cx = ResolutionContext::new(&interner, &store);
    let receiver = StoredType::bare(interner.definition(text, []));

    // Unknown name.
    let result = cx.resolve_call(
        receiver,
        interner.intern_string("missing"),
        &CallArguments::new(vec![]),
    );
    assert!(matches!(result, CallResult::UnknownMember { .. }));

    // Arity.
    let result = cx.resolve_call(
        receiver,
        interner.intern_string("trim"),
        &CallArguments::new(vec![]),
    );
    assert!(matches!(
        result,
        CallResult::ArgumentCountMismatch {
            expected_min: 1,
            expected_max: Some(1),
            actual: 0
        }
    ));

    // Applicable arity, inapplicable types.
    let result = cx.resolve_call(
        receiver,
        interner.intern_string("trim"),
        &CallArguments::new(vec![TypeId::INT]),
    );
    assert!(matches!(result, CallResult::NoMatchingMember { .. }));
}

#[test]
fn test_generic_method_inference_and_explicit_arguments() {
    let (interner, store) = setup();
    let util = store.register(DefinitionInfo::class(interner.intern_string("Util"), vec![]));
    let t = store.type_param(interner.intern_string("T"));
    let param_t = interner.generic_param(t);
    store.add_member(
        util,
        method(
            &interner,
            "id",
            FunctionHeader::new(vec![FunctionParameter::new(param_t)], param_t)
                .with_type_params(vec![t]),
        ),
    );

    let cx = ResolutionContext::new(&interner, &store);
    let receiver = StoredType::bare(interner.definition(util, []));
    let id = interner.intern_string("id");

    // Inference from the argument.
    let bound = cx
        .resolve_call(receiver, id, &CallArguments::new(vec![TypeId::INT]))
        .bound()
        .expect("inferred call");
    assert_eq!(bound.header.return_type, TypeId::INT);
    assert!(bound.header.type_params.is_empty());

    // Explicit type argument.
    let bound = cx
        .resolve_call(
            receiver,
            id,
            &CallArguments::new(vec![TypeId::STRING]).with_type_args(vec![TypeId::STRING]),
        )
        .bound()
        .expect("explicit call");
    assert_eq!(bound.header.return_type, TypeId::STRING);

    // Wrong explicit count.
    let result = cx.resolve_call(
        receiver,
        id,
        &CallArguments::new(vec![TypeId::STRING])
            .with_type_args(vec![TypeId::STRING, TypeId::INT]),
    );
    assert!(matches!(
        result,
        CallResult::TypeArgumentCount {
            expected: 1,
            actual: 2
        }
    ));

    // Conflicting inference fails the candidate.
    let conflicted = store.add_member(
        util,
        method(
            &interner,
            "pair",
            FunctionHeader::new(
                vec![
                    FunctionParameter::new(param_t),
                    FunctionParameter::new(param_t),
                ],
                param_t,
            )
            .with_type_params(vec![t]),
        ),
    );
    let _ = conflicted;
    cx.invalidate_definition(util);
    let result = cx.resolve_call(
        receiver,
        interner.intern_string("pair"),
        &CallArguments::new(vec![TypeId::INT, TypeId::STRING]),
    );
    assert!(matches!(result, CallResult::InferenceBlocked { .. }));
}

#[test]
fn test_variadic_call_resolution() {
    let (interner, store) = setup();
    let text = store.register(DefinitionInfo::class(interner.intern_string("Text"), vec![]));
    let strings = interner.array(TypeId::STRING, 1);
    store.add_member(
        text,
        method(
            &interner,
            "join",
            FunctionHeader::new(
                vec![FunctionParameter::new(strings).variadic()],
                TypeId::STRING,
            ),
        ),
    );

    let cx = ResolutionContext::new(&interner, &store);
    let receiver = StoredType::bare(interner.definition(text, []));
    let join = interner.intern_string("join");

    for args in [
        vec![],
        vec![TypeId::STRING],
        vec![TypeId::STRING, TypeId::STRING, TypeId::STRING],
        vec![strings],
    ] {
        assert!(
            cx.resolve_call(receiver, join, &CallArguments::new(args.clone()))
                .is_match(),
            "join should accept {args:?}"
        );
    }

    let spread = CallArguments::new(vec![strings]).with_spread();
    assert!(cx.resolve_call(receiver, join, &spread).is_match());

    let bad = cx.resolve_call(
        receiver,
        join,
        &CallArguments::new(vec![TypeId::STRING, TypeId::INT]),
    );
    assert!(matches!(bad, CallResult::NoMatchingMember { .. }));
}

#[test]
fn test_constructor_and_operator_resolution() {
    let (interner, store) = setup();
    let vec2 = store.register(DefinitionInfo::class(interner.intern_string("Vec2"), vec![]));
    let vec2_ty = interner.definition(vec2, []);
    store.add_member(
        vec2,
        MemberDecl::new(
            MemberKind::Constructor,
            MemberModifiers::empty(),
            FunctionHeader::new(
                vec![
                    FunctionParameter::new(TypeId::DOUBLE),
                    FunctionParameter::new(TypeId::DOUBLE),
                ],
                TypeId::VOID,
            ),
        ),
    );
    store.add_member(
        vec2,
        MemberDecl::new(
            MemberKind::Operator(OperatorKind::Add),
            MemberModifiers::empty(),
            FunctionHeader::new(vec![FunctionParameter::new(vec2_ty)], vec2_ty),
        ),
    );

    let cx = ResolutionContext::new(&interner, &store);
    let receiver = StoredType::bare(vec2_ty);

    // Constructor with widening arguments.
    let result = cx.resolve_constructor(
        receiver,
        &CallArguments::new(vec![TypeId::INT, TypeId::DOUBLE]),
    );
    assert!(result.is_match());

    // Operator group.
    let result = cx.resolve_operator(
        receiver,
        OperatorKind::Add,
        &CallArguments::new(vec![vec2_ty]),
    );
    let bound = result.bound().expect("operator resolves");
    assert_eq!(bound.header.return_type, vec2_ty);

    let result = cx.resolve_operator(
        receiver,
        OperatorKind::Mul,
        &CallArguments::new(vec![vec2_ty]),
    );
    assert!(matches!(result, CallResult::UnknownMember { .. }));
}

#[test]
fn test_override_shadow_is_not_ambiguous() {
    let (interner, store) = setup();
    let base = store.register(DefinitionInfo::class(interner.intern_string("Base"), vec![]));
    store.add_member(
        base,
        method(
            &interner,
            "run",
            FunctionHeader::new(vec![FunctionParameter::new(TypeId::INT)], TypeId::VOID),
        ),
    );
    let derived = store.register(
        DefinitionInfo::class(interner.intern_string("Derived"), vec![])
            .with_superclass(interner.definition(base, [])),
    );
    store.add_member(
        derived,
        method(
            &interner,
            "run",
            FunctionHeader::new(vec![FunctionParameter::new(TypeId::INT)], TypeId::VOID),
        ),
    );

    let cx = ResolutionContext::new(&interner, &store);
    let receiver = StoredType::bare(interner.definition(derived, []));
    // Both the declaration and the inherited base member apply; the
    // declaration shadows, no ambiguity.
    let result = cx.resolve_call(
        receiver,
        interner.intern_string("run"),
        &CallArguments::new(vec![TypeId::INT]),
    );
    let bound = result.bound().expect("declaration shadows inherited");
    assert_eq!(bound.member.owner(), receiver);
}

#[test]
fn test_override_inference_adopts_base_signature() {
    let (interner, store) = setup();
    let base = store.register(DefinitionInfo::class(interner.intern_string("Base"), vec![]));
    store.add_member(
        base,
        method(
            &interner,
            "greet",
            FunctionHeader::new(vec![FunctionParameter::new(TypeId::STRING)], TypeId::VOID),
        ),
    );
    let derived = store.register(
        DefinitionInfo::class(interner.intern_string("Derived"), vec![])
            .with_superclass(interner.definition(base, [])),
    );
    // Declared as `override greet(x)` with the parameter type still
    // undetermined; it must adopt `string` from the base.
    let member = store.add_member(
        derived,
        MemberDecl::new(
            MemberKind::Method {
                name: interner.intern_string("greet"),
            },
            MemberModifiers::OVERRIDE,
            FunctionHeader::new(
                vec![FunctionParameter::new(TypeId::UNDETERMINED)],
                TypeId::UNDETERMINED,
            ),
        ),
    );

    let cx = ResolutionContext::new(&interner, &store);
    let diagnostics = cx.apply_override_inference(derived);
    assert!(diagnostics.is_empty());
    assert!(store.get_overrides(member).is_some());

    let updated = store.member(member).expect("member persists");
    assert_eq!(updated.header.params[0].ty, TypeId::STRING);
    assert_eq!(updated.header.return_type, TypeId::VOID);

    // The rebuilt surface resolves calls against the adopted signature.
    let receiver = StoredType::bare(interner.definition(derived, []));
    let bound = cx
        .resolve_call(
            receiver,
            interner.intern_string("greet"),
            &CallArguments::new(vec![TypeId::STRING]),
        )
        .bound()
        .expect("call binds");
    assert_eq!(bound.header.params[0].ty, TypeId::STRING);
}

#[test]
fn test_illegal_override_diagnostics() {
    let (interner, store) = setup();
    let base = store.register(DefinitionInfo::class(interner.intern_string("Base"), vec![]));
    store.add_member(
        base,
        method(
            &interner,
            "run",
            FunctionHeader::new(vec![FunctionParameter::new(TypeId::INT)], TypeId::VOID),
        ),
    );
    let derived = store.register(
        DefinitionInfo::class(interner.intern_string("Derived"), vec![])
            .with_superclass(interner.definition(base, [])),
    );
    // `override walk` matches nothing in the chain.
    store.add_member(
        derived,
        MemberDecl::new(
            MemberKind::Method {
                name: interner.intern_string("walk"),
            },
            MemberModifiers::OVERRIDE,
            FunctionHeader::new(vec![FunctionParameter::new(TypeId::INT)], TypeId::VOID),
        ),
    );

    let cx = ResolutionContext::new(&interner, &store);
    let diagnostics = cx.apply_override_inference(derived);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].code, codes::ILLEGAL_OVERRIDE_NO_BASE);
}

#[test]
fn test_duplicate_member_detection() {
    let (interner, store) = setup();
    let text = store.register(DefinitionInfo::class(interner.intern_string("Text"), vec![]));
    store.add_member(
        text,
        method(
            &interner,
            "f",
            FunctionHeader::new(
                vec![
                    FunctionParameter::new(TypeId::INT),
                    FunctionParameter::new(TypeId::STRING).with_default(ExprRef(0)),
                ],
                TypeId::VOID,
            ),
        ),
    );
    store.add_member(
        text,
        method(
            &interner,
            "f",
            FunctionHeader::new(vec![FunctionParameter::new(TypeId::INT)], TypeId::VOID),
        ),
    );
    // Same shape under a different name is fine.
    store.add_member(
        text,
        method(
            &interner,
            "g",
            FunctionHeader::new(vec![FunctionParameter::new(TypeId::INT)], TypeId::VOID),
        ),
    );

    let cx = ResolutionContext::new(&interner, &store);
    let diagnostics = cx.find_duplicate_members(text);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].code, codes::DUPLICATE_MEMBER);
}

#[test]
fn test_expected_result_hint_drives_resolution() {
    let (interner, store) = setup();
    let util = store.register(DefinitionInfo::class(interner.intern_string("Util"), vec![]));
    let t = store.type_param(interner.intern_string("T"));
    store.add_member(
        util,
        method(
            &interner,
            "empty",
            FunctionHeader::new(vec![], interner.generic_param(t)).with_type_params(vec![t]),
        ),
    );

    let cx = ResolutionContext::new(&interner, &store);
    let receiver = StoredType::bare(interner.definition(util, []));

    // Without a hint the type parameter stays unbound.
    let result = cx.resolve_call(
        receiver,
        interner.intern_string("empty"),
        &CallArguments::new(vec![]),
    );
    assert!(matches!(&result, CallResult::InferenceBlocked { .. }));
    let diag = result
        .to_diagnostic(&cx, Span::EMPTY)
        .expect("blocked inference diagnostic");
    assert_eq!(diag.code, codes::INFERENCE_BLOCKED);

    let hinted = CallArguments::new(vec![]).with_expected_results(vec![TypeId::STRING]);
    let bound = cx
        .resolve_call(receiver, interner.intern_string("empty"), &hinted)
        .bound()
        .expect("hint binds T");
    assert_eq!(bound.header.return_type, TypeId::STRING);
}

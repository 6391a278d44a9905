use super::*;
use crate::def::{DefinitionInfo, DefinitionStore};
use crate::intern::TypeInterner;
use crate::types::{FunctionShape, ShapeParam, StorageClass, StoredType, TypeId};

#[test]
fn test_basic_shapes() {
    let interner = TypeInterner::new();
    let store = DefinitionStore::new();
    let formatter = TypeFormatter::new(&interner, &store);

    assert_eq!(formatter.format(TypeId::INT), "int");
    assert_eq!(formatter.format(TypeId::STRING), "string");
    assert_eq!(formatter.format(interner.optional(TypeId::INT)), "int?");
    assert_eq!(formatter.format(interner.array(TypeId::INT, 1)), "int[]");
    assert_eq!(formatter.format(interner.array(TypeId::INT, 2)), "int[,]");
    assert_eq!(
        formatter.format(interner.assoc(TypeId::STRING, TypeId::INT)),
        "int[string]"
    );
    assert_eq!(
        formatter.format(interner.range(TypeId::INT)),
        "int .. int"
    );
}

#[test]
fn test_definitions_and_parameters() {
    let interner = TypeInterner::new();
    let store = DefinitionStore::new();
    let t = store.type_param(interner.intern_string("T"));
    let list = store.register(DefinitionInfo::class(interner.intern_string("List"), vec![t]));

    let formatter = TypeFormatter::new(&interner, &store);
    assert_eq!(
        formatter.format(interner.definition(list, [TypeId::STRING])),
        "List<string>"
    );
    assert_eq!(
        formatter.format(interner.definition(list, [interner.generic_param(t)])),
        "List<T>"
    );

    // Positional rendering hides the parsed name.
    let params = [t];
    let positional = TypeFormatter::new(&interner, &store).with_positional_params(&params);
    assert_eq!(
        positional.format(interner.definition(list, [interner.generic_param(t)])),
        "List<#0>"
    );
}

#[test]
fn test_function_types_and_storage() {
    let interner = TypeInterner::new();
    let store = DefinitionStore::new();
    let formatter = TypeFormatter::new(&interner, &store);

    let function = interner.function(FunctionShape {
        params: vec![
            ShapeParam {
                ty: TypeId::INT,
                variadic: false,
            },
            ShapeParam {
                ty: interner.array(TypeId::STRING, 1),
                variadic: true,
            },
        ],
        return_type: TypeId::VOID,
        thrown_type: None,
    });
    assert_eq!(formatter.format(function), "(int, string[]...) => void");

    assert_eq!(
        formatter.format_stored(StoredType::with_storage(TypeId::INT, StorageClass::Shared)),
        "shared int"
    );
    assert_eq!(formatter.format_stored(StoredType::bare(TypeId::INT)), "int");
}

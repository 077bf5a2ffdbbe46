// Copyright 2015-2024 Swim Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use typepack_model::Value;

use super::compile_schema;
use crate::{
    DefaultSpec, DescriptorKind, FieldDef, SchemaDefinition, SchemaError, StructDef, TagRepr,
    TypeDef, TypeDescriptor,
};

fn point() -> StructDef {
    StructDef::new("Point")
        .with_field(FieldDef::new("x", TypeDef::Int))
        .with_field(FieldDef::new("y", TypeDef::Int))
}

#[test]
fn compile_simple_struct() {
    let definition = SchemaDefinition::new(TypeDef::reference("Point")).with_struct(point());
    let schema = compile_schema(&definition).expect("Compilation failed.");

    let id = match schema.root() {
        TypeDescriptor::Struct(id) => *id,
        ow => panic!("Unexpected root: {:?}", ow),
    };
    let descriptor = schema.struct_descriptor(id);
    assert_eq!(descriptor.fields().len(), 2);
    assert_eq!(descriptor.fields()[1].name(), "y");
    assert!(!descriptor.is_array_like());
}

#[test]
fn mutually_recursive_structs() {
    // Forest is referenced before it is defined.
    let definition = SchemaDefinition::new(TypeDef::reference("Tree"))
        .with_struct(
            StructDef::new("Tree")
                .with_field(FieldDef::new("value", TypeDef::Int))
                .with_field(FieldDef::new("children", TypeDef::reference("Forest"))),
        )
        .with_struct(
            StructDef::new("Forest").with_field(FieldDef::new(
                "trees",
                TypeDef::seq(TypeDef::reference("Tree")),
            )),
        );
    let schema = compile_schema(&definition).expect("Compilation failed.");

    let tree = schema.lookup("Tree").expect("Missing Tree.");
    let forest = schema.lookup("Forest").expect("Missing Forest.");
    let children = &schema.struct_descriptor(tree).fields()[1];
    assert!(matches!(children.ty(), TypeDescriptor::Struct(id) if *id == forest));
}

#[test]
fn self_reference_through_optional() {
    let definition = SchemaDefinition::new(TypeDef::reference("List")).with_struct(
        StructDef::new("List")
            .with_field(FieldDef::new("head", TypeDef::Int))
            .with_field(FieldDef::new(
                "tail",
                TypeDef::optional(TypeDef::reference("List")),
            )),
    );
    assert!(compile_schema(&definition).is_ok());
}

#[test]
fn required_self_reference_is_uninhabited() {
    let definition = SchemaDefinition::new(TypeDef::reference("A"))
        .with_struct(StructDef::new("A").with_field(FieldDef::new("b", TypeDef::reference("B"))))
        .with_struct(StructDef::new("B").with_field(FieldDef::new("a", TypeDef::reference("A"))));
    assert!(matches!(
        compile_schema(&definition),
        Err(SchemaError::UninhabitedCycle(_))
    ));
}

#[test]
fn unknown_reference() {
    let definition = SchemaDefinition::new(TypeDef::reference("Missing"));
    assert_eq!(
        compile_schema(&definition).err(),
        Some(SchemaError::UnknownSchema("Missing".to_string()))
    );
}

#[test]
fn duplicate_schema() {
    let definition = SchemaDefinition::new(TypeDef::Int)
        .with_struct(point())
        .with_struct(point());
    assert_eq!(
        compile_schema(&definition).err(),
        Some(SchemaError::DuplicateSchema("Point".to_string()))
    );
}

#[test]
fn duplicate_field() {
    let definition = SchemaDefinition::new(TypeDef::reference("Point"))
        .with_struct(point().with_field(FieldDef::new("x", TypeDef::Float)));
    assert_eq!(
        compile_schema(&definition).err(),
        Some(SchemaError::DuplicateField {
            schema: "Point".to_string(),
            field: "x".to_string()
        })
    );
}

fn pets(variants: TypeDef) -> SchemaDefinition {
    SchemaDefinition::new(variants)
        .with_struct(StructDef::new("Cat").with_field(FieldDef::new("sound", TypeDef::Str)))
        .with_struct(StructDef::new("Dog").with_field(FieldDef::new("sound", TypeDef::Str)))
        .with_struct(
            StructDef::new("Fish")
                .array_like()
                .with_field(FieldDef::new("fins", TypeDef::Int)),
        )
        .with_struct(StructDef::new("Odd").with_field(FieldDef::new("kind", TypeDef::Str)))
}

#[test]
fn compile_union() {
    let definition = pets(
        TypeDef::union("kind", [("cat", "Cat"), ("dog", "Dog")])
            .with_repr(TagRepr::Extension { type_id: 3 }),
    );
    let schema = compile_schema(&definition).expect("Compilation failed.");
    match schema.root() {
        TypeDescriptor::TaggedUnion(union) => {
            assert_eq!(union.tag_field(), "kind");
            assert_eq!(union.repr(), TagRepr::Extension { type_id: 3 });
            assert!(!union.is_array_like());
            let dog = union.variant_for_str("dog").expect("Missing dog.");
            assert_eq!(Some(dog.schema()), schema.lookup("Dog"));
            assert!(union.variant_for_str("fish").is_none());
            assert!(union.variant_for_int(0).is_none());
        }
        ow => panic!("Unexpected root: {:?}", ow),
    }
}

#[test]
fn union_errors() {
    let duplicate = pets(TypeDef::union("kind", [("cat", "Cat"), ("cat", "Dog")]));
    assert_eq!(
        compile_schema(&duplicate).err(),
        Some(SchemaError::DuplicateDiscriminant {
            tag_field: "kind".to_string(),
            tag: "\"cat\"".to_string(),
        })
    );

    let empty = pets(TypeDef::union("kind", Vec::<(&str, &str)>::new()));
    assert_eq!(
        compile_schema(&empty).err(),
        Some(SchemaError::EmptyUnion("kind".to_string()))
    );

    let mixed = pets(TypeDef::union("kind", [("cat", "Cat"), ("fish", "Fish")]));
    assert_eq!(
        compile_schema(&mixed).err(),
        Some(SchemaError::MixedUnionLayout("kind".to_string()))
    );

    let conflict = pets(TypeDef::union("kind", [("cat", "Cat"), ("odd", "Odd")]));
    assert_eq!(
        compile_schema(&conflict).err(),
        Some(SchemaError::TagFieldConflict {
            schema: "Odd".to_string(),
            field: "kind".to_string(),
        })
    );
}

#[test]
fn union_with_int_discriminants() {
    let definition = pets(TypeDef::union("kind", [(1i64, "Cat"), (2i64, "Dog")]));
    let schema = compile_schema(&definition).expect("Compilation failed.");
    match schema.root() {
        TypeDescriptor::TaggedUnion(union) => {
            assert!(union.variant_for_int(2).is_some());
            assert!(union.variant_for_str("2").is_none());
        }
        ow => panic!("Unexpected root: {:?}", ow),
    }
}

#[test]
fn enum_errors() {
    let empty = SchemaDefinition::new(TypeDef::enumeration(Vec::<i64>::new()));
    assert_eq!(compile_schema(&empty).err(), Some(SchemaError::EmptyEnum));

    let duplicate = SchemaDefinition::new(TypeDef::enumeration(["a", "b", "a"]));
    assert_eq!(
        compile_schema(&duplicate).err(),
        Some(SchemaError::DuplicateEnumMember("\"a\"".to_string()))
    );

    let mixed = SchemaDefinition::new(TypeDef::Enum {
        members: vec!["a".into(), 1i64.into()],
    });
    assert_eq!(
        compile_schema(&mixed).err(),
        Some(SchemaError::MixedEnumMembers)
    );
}

#[test]
fn unsupported_map_key() {
    let definition = SchemaDefinition::new(TypeDef::map(TypeDef::seq(TypeDef::Int), TypeDef::Int));
    assert_eq!(
        compile_schema(&definition).err(),
        Some(SchemaError::UnsupportedKey(DescriptorKind::Sequence))
    );

    let enum_key = SchemaDefinition::new(TypeDef::map(
        TypeDef::enumeration(["a", "b"]),
        TypeDef::Int,
    ));
    assert!(compile_schema(&enum_key).is_ok());
}

#[test]
fn field_requiredness() {
    let definition = SchemaDefinition::new(TypeDef::reference("S")).with_struct(
        StructDef::new("S")
            .with_field(FieldDef::new("a", TypeDef::Int))
            .with_field(FieldDef::new("b", TypeDef::Int).with_default(3))
            .with_field(FieldDef::new("c", TypeDef::optional(TypeDef::Int)).required(false))
            .with_field(
                FieldDef::new("d", TypeDef::seq(TypeDef::Int)).with_factory(|| Value::Seq(vec![])),
            ),
    );
    let schema = compile_schema(&definition).expect("Compilation failed.");
    let id = schema.lookup("S").expect("Missing S.");
    let fields = schema.struct_descriptor(id).fields();

    assert!(fields[0].is_required());
    assert!(matches!(fields[0].default(), DefaultSpec::NoDefault));
    assert!(!fields[1].is_required());
    assert_eq!(fields[1].default().resolve(), Some(Value::Int(3)));
    assert!(!fields[2].is_required());
    assert_eq!(fields[2].default().resolve(), Some(Value::Nil));
    assert!(matches!(fields[3].default(), DefaultSpec::Factory(_)));
}

#[test]
fn field_default_errors() {
    let missing = SchemaDefinition::new(TypeDef::reference("S")).with_struct(
        StructDef::new("S").with_field(FieldDef::new("a", TypeDef::Int).required(false)),
    );
    assert_eq!(
        compile_schema(&missing).err(),
        Some(SchemaError::MissingDefault {
            schema: "S".to_string(),
            field: "a".to_string(),
        })
    );

    let invalid = SchemaDefinition::new(TypeDef::reference("S")).with_struct(
        StructDef::new("S").with_field(FieldDef::new("a", TypeDef::Int).with_default("one")),
    );
    assert_eq!(
        compile_schema(&invalid).err(),
        Some(SchemaError::InvalidDefault {
            schema: "S".to_string(),
            field: "a".to_string(),
        })
    );

    let contradictory = SchemaDefinition::new(TypeDef::reference("S")).with_struct(
        StructDef::new("S").with_field(
            FieldDef::new("a", TypeDef::Int)
                .with_default(1)
                .required(true),
        ),
    );
    assert_eq!(
        compile_schema(&contradictory).err(),
        Some(SchemaError::RequiredWithDefault {
            schema: "S".to_string(),
            field: "a".to_string(),
        })
    );
}

const JSON_DEFINITION: &str = r#"
{
    "root": { "type": "ref", "name": "Message" },
    "structs": [
        {
            "name": "Message",
            "fields": [
                { "name": "id", "type": { "type": "int" } },
                { "name": "tags", "type": { "type": "seq", "element": { "type": "str" } }, "default": [] },
                { "name": "note", "type": { "type": "optional", "inner": { "type": "str" } }, "default": null },
                {
                    "name": "body",
                    "type": {
                        "type": "union",
                        "tag_field": "kind",
                        "repr": { "extension": { "type_id": 7 } },
                        "variants": [
                            { "tag": "text", "schema": "Text" },
                            { "tag": 2, "schema": "Binary" }
                        ]
                    }
                },
                { "name": "level", "type": { "type": "enum", "members": ["low", "high"] }, "default": "low" }
            ]
        },
        {
            "name": "Text",
            "array_like": true,
            "fields": [ { "name": "content", "type": { "type": "str" } } ]
        },
        {
            "name": "Binary",
            "array_like": true,
            "forbid_unknown_fields": true,
            "fields": [ { "name": "content", "type": { "type": "bytes" } } ]
        }
    ]
}
"#;

#[test]
fn load_definition_from_json() {
    let definition: SchemaDefinition =
        serde_json::from_str(JSON_DEFINITION).expect("Invalid JSON definition.");
    let schema = compile_schema(&definition).expect("Compilation failed.");

    let message = schema.lookup("Message").expect("Missing Message.");
    let fields = schema.struct_descriptor(message).fields();
    assert_eq!(fields[1].default().resolve(), Some(Value::Seq(vec![])));
    assert_eq!(fields[2].default().resolve(), Some(Value::Nil));
    assert_eq!(fields[4].default().resolve(), Some(Value::from("low")));

    match fields[3].ty() {
        TypeDescriptor::TaggedUnion(union) => {
            assert_eq!(union.repr(), TagRepr::Extension { type_id: 7 });
            assert!(union.is_array_like());
            assert!(union.variant_for_int(2).is_some());
        }
        ow => panic!("Unexpected descriptor: {:?}", ow),
    }

    let binary = schema.lookup("Binary").expect("Missing Binary.");
    assert!(schema.struct_descriptor(binary).forbids_unknown_fields());
}

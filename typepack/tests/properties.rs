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

use std::sync::Arc;
use std::thread;

use rmp::encode;
use typepack::error::DecodeErrorKind;
use typepack::model::{Raw, Record, Value, Variant};
use typepack::schema::{
    compile_schema, DescriptorKind, FieldDef, Schema, SchemaDefinition, StructDef, TagRepr,
    TypeDef,
};
use typepack::{decode, encode};

fn compile(definition: SchemaDefinition) -> Schema {
    compile_schema(&definition).expect("Invalid schema.")
}

fn key(buf: &mut Vec<u8>, name: &str) {
    encode::write_str(buf, name).unwrap();
}

fn document_schema(repr: TagRepr) -> Schema {
    compile(
        SchemaDefinition::new(TypeDef::reference("Document"))
            .with_struct(
                StructDef::new("Document")
                    .with_field(FieldDef::new("title", TypeDef::Str))
                    .with_field(FieldDef::new("version", TypeDef::Int))
                    .with_field(FieldDef::new("score", TypeDef::Float).with_default(0.0))
                    .with_field(
                        FieldDef::new("tags", TypeDef::seq(TypeDef::Str))
                            .with_factory(|| Value::Seq(vec![])),
                    )
                    .with_field(
                        FieldDef::new("attributes", TypeDef::map(TypeDef::Str, TypeDef::Int))
                            .with_factory(|| Value::Map(vec![])),
                    )
                    .with_field(
                        FieldDef::new("checksum", TypeDef::optional(TypeDef::Bytes))
                            .required(false),
                    )
                    .with_field(
                        FieldDef::new("status", TypeDef::enumeration(["draft", "final"]))
                            .with_default("draft"),
                    )
                    .with_field(FieldDef::new(
                        "sections",
                        TypeDef::seq(TypeDef::union(
                            "kind",
                            [("text", "Text"), ("figure", "Figure")],
                        )
                        .with_repr(repr)),
                    ))
                    .with_field(
                        FieldDef::new("parent", TypeDef::optional(TypeDef::reference("Document")))
                            .required(false),
                    ),
            )
            .with_struct(StructDef::new("Text").with_field(FieldDef::new("body", TypeDef::Str)))
            .with_struct(
                StructDef::new("Figure")
                    .with_field(FieldDef::new("caption", TypeDef::Str))
                    .with_field(FieldDef::new("data", TypeDef::Any)),
            ),
    )
}

fn document(version: i64) -> Value<'static> {
    let sections = Value::seq([
        Value::Variant(Variant::new(
            "text",
            Record::new().with("body", "Introduction"),
        )),
        Value::Variant(Variant::new(
            "figure",
            Record::new()
                .with("caption", "Results")
                .with("data", Value::Raw(Raw::new(vec![0x93u8, 0x01, 0x02, 0x03]))),
        )),
    ]);
    let parent = Record::new()
        .with("title", "Draft")
        .with("version", version - 1)
        .with("score", 0.0)
        .with("tags", Value::Seq(vec![]))
        .with("attributes", Value::Map(vec![]))
        .with("checksum", Value::Nil)
        .with("status", "draft")
        .with("sections", Value::Seq(vec![]))
        .with("parent", Value::Nil);
    Value::Struct(
        Record::new()
            .with("title", "Report")
            .with("version", version)
            .with("score", 9.5)
            .with("tags", Value::seq(["a", "b"]))
            .with("attributes", Value::map([("pages", 12), ("pages", 13)]))
            .with("checksum", Value::blob(vec![0xdeu8, 0xad]))
            .with("status", "final")
            .with("sections", sections)
            .with("parent", parent),
    )
}

#[test]
fn round_trip() {
    for repr in [TagRepr::Field, TagRepr::Extension { type_id: 3 }] {
        let schema = document_schema(repr);
        let value = document(2);
        let bytes = encode(&value, &schema).expect("Encoding failed.");
        assert_eq!(decode(&bytes, &schema), Ok(value));
    }
}

#[test]
fn round_trip_fills_defaults() {
    let schema = document_schema(TagRepr::Field);
    let sparse = Value::Struct(
        Record::new()
            .with("title", "Empty")
            .with("version", 1)
            .with("sections", Value::Seq(vec![])),
    );
    let bytes = encode(&sparse, &schema).expect("Encoding failed.");
    let decoded = decode(&bytes, &schema).expect("Decoding failed.");
    let record = decoded.as_record().expect("Expected a record.");
    assert_eq!(record.len(), 9);
    assert_eq!(record.get("status"), Some(&Value::from("draft")));
    assert_eq!(record.get("score"), Some(&Value::Float(0.0)));
    assert_eq!(record.get("parent"), Some(&Value::Nil));
}

#[test]
fn reject_wrong_kind() {
    let schema = compile(SchemaDefinition::new(TypeDef::Str));
    let mut input = vec![];
    encode::write_sint(&mut input, 42).unwrap();

    let error = decode(&input, &schema).expect_err("Decoding should fail.");
    assert!(matches!(
        error.kind(),
        DecodeErrorKind::TypeMismatch {
            expected: DescriptorKind::Str,
            ..
        }
    ));
    assert_eq!(error.path().to_string(), "");
}

#[test]
fn nested_path_reporting() {
    let schema = compile(
        SchemaDefinition::new(TypeDef::reference("Outer"))
            .with_struct(
                StructDef::new("Outer").with_field(FieldDef::new("a", TypeDef::reference("Inner"))),
            )
            .with_struct(StructDef::new("Inner").with_field(FieldDef::new("b", TypeDef::Int))),
    );
    let mut input = vec![];
    encode::write_map_len(&mut input, 1).unwrap();
    key(&mut input, "a");
    encode::write_map_len(&mut input, 1).unwrap();
    key(&mut input, "b");
    encode::write_str(&mut input, "x").unwrap();

    let error = decode(&input, &schema).expect_err("Decoding should fail.");
    assert!(matches!(
        error.kind(),
        DecodeErrorKind::TypeMismatch { .. }
    ));
    assert_eq!(error.path().to_string(), "a.b");
}

fn named_schema() -> Schema {
    compile(
        SchemaDefinition::new(TypeDef::reference("Named"))
            .with_struct(StructDef::new("Named").with_field(FieldDef::new("name", TypeDef::Str))),
    )
}

#[test]
fn required_field_enforcement() {
    let schema = named_schema();
    let mut input = vec![];
    encode::write_map_len(&mut input, 0).unwrap();

    let error = decode(&input, &schema).expect_err("Decoding should fail.");
    assert_eq!(
        error.kind(),
        &DecodeErrorKind::MissingRequiredField("name".to_string())
    );
}

#[test]
fn unknown_field_tolerance() {
    let schema = named_schema();
    let mut input = vec![];
    encode::write_map_len(&mut input, 2).unwrap();
    key(&mut input, "name");
    encode::write_str(&mut input, "n").unwrap();
    key(&mut input, "extra");
    encode::write_sint(&mut input, 1).unwrap();

    assert_eq!(
        decode(&input, &schema),
        Ok(Value::Struct(Record::new().with("name", "n")))
    );
}

#[test]
fn union_discriminant_dispatch() {
    let schema = compile(
        SchemaDefinition::new(TypeDef::union("kind", [("cat", "Cat"), ("dog", "Dog")]))
            .with_struct(StructDef::new("Cat").with_field(FieldDef::new("sound", TypeDef::Str)))
            .with_struct(StructDef::new("Dog").with_field(FieldDef::new("sound", TypeDef::Str))),
    );
    let animal = |kind: &str| {
        let mut input = vec![];
        encode::write_map_len(&mut input, 2).unwrap();
        key(&mut input, "kind");
        encode::write_str(&mut input, kind).unwrap();
        key(&mut input, "sound");
        encode::write_str(&mut input, "woof").unwrap();
        input
    };

    let dog = animal("dog");
    assert_eq!(
        decode(&dog, &schema),
        Ok(Value::Variant(Variant::new(
            "dog",
            Record::new().with("sound", "woof")
        )))
    );

    let fish = animal("fish");
    let error = decode(&fish, &schema).expect_err("Decoding should fail.");
    assert!(matches!(error.kind(), DecodeErrorKind::InvalidVariant(_)));
}

#[test]
fn truncation() {
    let schema = compile(SchemaDefinition::new(TypeDef::map(TypeDef::Str, TypeDef::Int)));
    let mut input = vec![];
    encode::write_map_len(&mut input, 3).unwrap();
    for name in ["a", "b"] {
        key(&mut input, name);
        encode::write_sint(&mut input, 1).unwrap();
    }

    let error = decode(&input, &schema).expect_err("Decoding should fail.");
    assert!(matches!(
        error.kind(),
        DecodeErrorKind::TruncatedInput { .. }
    ));
}

#[test]
fn default_factory_isolation() {
    let schema = document_schema(TagRepr::Field);
    let mut input = vec![];
    encode::write_map_len(&mut input, 3).unwrap();
    key(&mut input, "title");
    encode::write_str(&mut input, "t").unwrap();
    key(&mut input, "version");
    encode::write_sint(&mut input, 1).unwrap();
    key(&mut input, "sections");
    encode::write_array_len(&mut input, 0).unwrap();

    let mut first = decode(&input, &schema).expect("Decoding failed.");
    let mut second = decode(&input, &schema).expect("Decoding failed.");
    first
        .as_record_mut()
        .and_then(|record| record.get_mut("tags"))
        .and_then(Value::as_seq_mut)
        .expect("Expected tags.")
        .push(Value::from("first"));
    second
        .as_record_mut()
        .and_then(|record| record.get_mut("tags"))
        .and_then(Value::as_seq_mut)
        .expect("Expected tags.")
        .push(Value::from("second"));

    fn tags<'a>(value: &Value<'a>) -> Option<Value<'a>> {
        value
            .as_record()
            .and_then(|record| record.get("tags"))
            .cloned()
    }
    assert_eq!(tags(&first), Some(Value::seq(["first"])));
    assert_eq!(tags(&second), Some(Value::seq(["second"])));
}

#[test]
fn shared_schema_across_threads() {
    let schema = Arc::new(document_schema(TagRepr::Extension { type_id: 9 }));
    let handles = (0..4)
        .map(|i| {
            let schema = schema.clone();
            thread::spawn(move || {
                for version in 0..50 {
                    let value = document(i * 100 + version);
                    let bytes = encode(&value, &schema).expect("Encoding failed.");
                    let decoded = decode(&bytes, &schema).expect("Decoding failed.");
                    assert_eq!(decoded, value);
                }
            })
        })
        .collect::<Vec<_>>();
    for handle in handles {
        handle.join().expect("Worker panicked.");
    }
}

const JSON_DEFINITION: &str = r#"
{
    "root": { "type": "seq", "element": { "type": "ref", "name": "Reading" } },
    "structs": [
        {
            "name": "Reading",
            "array_like": true,
            "fields": [
                { "name": "sensor", "type": { "type": "str" } },
                { "name": "value", "type": { "type": "float" } },
                { "name": "unit", "type": { "type": "enum", "members": ["c", "f"] }, "default": "c" }
            ]
        }
    ]
}
"#;

#[test]
fn schema_loaded_from_json() {
    let definition: SchemaDefinition =
        serde_json::from_str(JSON_DEFINITION).expect("Invalid definition.");
    let schema = compile_schema(&definition).expect("Invalid schema.");
    let readings = Value::seq([
        Record::new()
            .with("sensor", "s1")
            .with("value", 21.5)
            .with("unit", "c"),
        Record::new()
            .with("sensor", "s2")
            .with("value", 70.0)
            .with("unit", "f"),
    ]);
    let bytes = encode(&readings, &schema).expect("Encoding failed.");
    assert_eq!(bytes[0], 0x92);
    assert_eq!(bytes[1], 0x93);
    assert_eq!(decode(&bytes, &schema), Ok(readings));
}

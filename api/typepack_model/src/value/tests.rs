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

use std::borrow::Cow;

use super::{Discriminant, Raw, Record, Value, ValueKind, Variant};

#[test]
fn unsigned_conversion_normalizes() {
    assert_eq!(Value::from(7u64), Value::Int(7));
    assert_eq!(Value::from(i64::MAX as u64), Value::Int(i64::MAX));
    assert_eq!(Value::from(u64::MAX), Value::UInt(u64::MAX));
}

#[test]
fn record_equality_ignores_order() {
    let first = Record::new().with("a", 1).with("b", "x");
    let second = Record::new().with("b", "x").with("a", 1);
    assert_eq!(first, second);

    let third = Record::new().with("a", 1);
    assert_ne!(first, third);

    let fourth = Record::new().with("a", 2).with("b", "x");
    assert_ne!(first, fourth);
}

#[test]
fn record_insert_replaces() {
    let mut record = Record::new().with("a", 1);
    record.insert("a", 2);
    assert_eq!(record.len(), 1);
    assert_eq!(record.get("a"), Some(&Value::Int(2)));
    assert!(record.get("b").is_none());
}

#[test]
fn into_owned_detaches() {
    let buffer = String::from("hello");
    let value = {
        let borrowed = Value::seq([Value::from(buffer.as_str())]);
        borrowed.into_owned()
    };
    drop(buffer);
    match value {
        Value::Seq(items) => {
            assert!(matches!(&items[0], Value::Text(Cow::Owned(s)) if s == "hello"));
        }
        ow => panic!("Unexpected value: {:?}", ow),
    }
}

#[test]
fn value_kinds() {
    assert_eq!(Value::Nil.kind(), ValueKind::Nil);
    assert_eq!(Value::from(1.5).kind(), ValueKind::Float);
    assert_eq!(Value::blob(vec![1u8]).kind(), ValueKind::Blob);
    assert_eq!(Value::from(Record::new()).kind(), ValueKind::Struct);
    assert_eq!(
        Value::from(Variant::new("a", Record::new())).kind(),
        ValueKind::Variant
    );
    assert_eq!(Value::from(Raw::new(vec![0xc0u8])).kind(), ValueKind::Raw);
    assert_eq!(ValueKind::Seq.to_string(), "sequence");
}

#[test]
fn display_values() {
    let value = Value::map([("k", Value::seq([1, 2]))]);
    assert_eq!(value.to_string(), "{\"k\": [1, 2]}");

    let variant = Value::from(Variant::new("dog", Record::new().with("sound", "woof")));
    assert_eq!(variant.to_string(), "\"dog\"{sound: \"woof\"}");

    assert_eq!(Discriminant::Int(3).to_string(), "3");
    assert_eq!(Value::from(None::<i64>), Value::Nil);
}

#[test]
fn scalar_accessors() {
    let data = [0xdeu8, 0xad];
    let blob = Value::blob(&data[..]);
    assert_eq!(blob.as_blob(), Some(&data[..]));
    assert!(blob.as_str().is_none());

    let text = Value::text("abc");
    assert_eq!(text.as_str(), Some("abc"));
    assert!(text.as_blob().is_none());

    assert_eq!(Value::Int(-4).as_i64(), Some(-4));
    assert!(Value::UInt(u64::MAX).as_i64().is_none());
    assert_eq!(Value::Bool(true).as_bool(), Some(true));
    assert_eq!(Value::Float(0.5).as_f64(), Some(0.5));
    assert!(Value::Nil.is_nil());
}

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

use super::{PathContext, PathSegment};

#[test]
fn root_path_is_empty() {
    let root = PathContext::root();
    let path = root.snapshot();
    assert!(path.is_root());
    assert_eq!(path.to_string(), "");
    assert_eq!(root.depth(), 0);
}

#[test]
fn nested_fields() {
    let root = PathContext::root();
    let a = root.field("a");
    let b = a.field("b");
    assert_eq!(b.depth(), 2);
    assert_eq!(b.snapshot(), "a.b");
    assert_eq!(a.snapshot(), "a");
}

#[test]
fn indices_and_keys() {
    let root = PathContext::root();
    let items = root.field("items");
    let second = items.index(2);
    let tags = second.field("tags");
    let key = Value::from("a");
    let entry = tags.key(&key);
    assert_eq!(entry.snapshot().to_string(), "items[2].tags[\"a\"]");

    let number = Value::Int(7);
    let at_root = root.index(0);
    let keyed = at_root.key(&number);
    assert_eq!(keyed.snapshot().to_string(), "[0][7]");
    assert_eq!(
        keyed.snapshot().segments(),
        &[PathSegment::Index(0), PathSegment::Key("7".to_string())]
    );
}

#[test]
fn siblings_do_not_share_segments() {
    let root = PathContext::root();
    {
        let first = root.index(0);
        assert_eq!(first.snapshot(), "[0]");
    }
    let second = root.index(1);
    assert_eq!(second.snapshot(), "[1]");
}

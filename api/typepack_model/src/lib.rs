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

//! # Typepack Value Model
//!
//! This crate contains [`Value`], the generic representation of data that is produced by decoding
//! a message against a schema and that is consumed when encoding a message. Its shape mirrors the
//! kinds of type descriptor that a schema can contain: scalars, sequences, mappings, struct
//! instances ([`Record`]), tagged union instances ([`Variant`]) and opaque, still encoded,
//! spans of the wire format ([`Raw`]).
//!
//! Values are parameterized by the lifetime of the buffer they were decoded from. Strings, binary
//! blobs and raw spans borrow from that buffer where possible and [`Value::into_owned`] detaches a
//! value from it.

mod value;

pub use value::{Discriminant, Raw, Record, Value, ValueKind, Variant};

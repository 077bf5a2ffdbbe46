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

//! # Typepack
//!
//! Schema validated MessagePack. A [`schema::SchemaDefinition`] describes the shape of the
//! messages to be exchanged and is compiled, once, into a [`schema::Schema`]. The schema can
//! then be shared (for example behind an `Arc`) by any number of threads that encode and
//! decode [`model::Value`]s against it.
//!
//! # Example
//!
//! ```
//! use typepack::model::{Record, Value};
//! use typepack::schema::{compile_schema, FieldDef, SchemaDefinition, StructDef, TypeDef};
//!
//! let definition = SchemaDefinition::new(TypeDef::reference("Point")).with_struct(
//!     StructDef::new("Point")
//!         .with_field(FieldDef::new("x", TypeDef::Int))
//!         .with_field(FieldDef::new("y", TypeDef::Int).with_default(0)),
//! );
//! let schema = compile_schema(&definition).unwrap();
//!
//! let bytes = typepack::encode(&Value::Struct(Record::new().with("x", 1)), &schema).unwrap();
//! let decoded = typepack::decode(&bytes, &schema).unwrap();
//! assert_eq!(decoded, Value::Struct(Record::new().with("x", 1).with("y", 0)));
//! ```

#[doc(inline)]
pub use typepack_model as model;

#[doc(inline)]
pub use typepack_schema as schema;

/// MessagePack encoding and decoding.
pub mod msgpack {
    pub use typepack_msgpack::wire;
    pub use typepack_msgpack::{
        ByteReader, Decoder, DecoderConfig, Encoder, EncoderConfig, OutputBuffer,
        DEFAULT_INITIAL_CAPACITY, DEFAULT_MAX_DEPTH,
    };
}

pub mod error {
    pub use typepack_msgpack::{DecodeError, DecodeErrorKind, EncodeError, EncodeErrorKind};
    pub use typepack_schema::SchemaError;

    /// Paths to the parts of a value that caused errors.
    pub mod path {
        pub use typepack_msgpack::{Path, PathContext, PathSegment, Segment};
    }
}

pub use typepack_msgpack::{decode, decode_from, encode, encode_into, encode_value};
pub use typepack_schema::compile_schema;

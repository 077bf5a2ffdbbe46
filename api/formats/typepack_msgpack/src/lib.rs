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

//! Schema directed MessagePack encoding and decoding of [`Value`]s.
//!
//! Values are checked against a compiled [`Schema`] as they are written and read so decoded
//! values never need to be validated separately. Decoding is zero-copy: strings, binary data and
//! raw values in a decoded [`Value`] borrow from the input.

mod buffer;
mod config;
mod decoder;
mod encoder;
mod error;
mod path;
mod reader;
pub mod wire;

use bytes::Bytes;
use typepack_model::Value;
use typepack_schema::Schema;

pub use buffer::OutputBuffer;
pub use config::{DecoderConfig, EncoderConfig, DEFAULT_INITIAL_CAPACITY, DEFAULT_MAX_DEPTH};
pub use decoder::Decoder;
pub use encoder::Encoder;
pub use error::{DecodeError, DecodeErrorKind, EncodeError, EncodeErrorKind};
pub use path::{Path, PathContext, PathSegment, Segment};
pub use reader::ByteReader;

/// Encode a value that conforms to the root of a schema.
pub fn encode(value: &Value<'_>, schema: &Schema) -> Result<Bytes, EncodeError> {
    Encoder::new(schema).encode(value)
}

/// Append the encoding of a value that conforms to the root of a schema to a buffer. If
/// encoding fails, nothing is appended.
pub fn encode_into(
    value: &Value<'_>,
    schema: &Schema,
    buf: &mut OutputBuffer,
) -> Result<(), EncodeError> {
    Encoder::new(schema).encode_into(value, buf)
}

/// Encode a value without a schema. Structs are written as maps from field name to value and raw
/// values are written verbatim. Fails with [`EncodeErrorKind::RequiresSchema`] for a tagged union
/// variant, as the name of its tag field is not known.
pub fn encode_value(value: &Value<'_>) -> Result<Bytes, EncodeError> {
    encoder::encode_value(value, &EncoderConfig::default())
}

/// Decode a buffer containing exactly one value that conforms to the root of a schema.
pub fn decode<'a>(input: &'a [u8], schema: &Schema) -> Result<Value<'a>, DecodeError> {
    Decoder::new(schema).decode(input)
}

/// Decode one value that conforms to the root of a schema from a reader, leaving the reader
/// positioned after the value. This allows values to be embedded in larger messages.
pub fn decode_from<'a>(
    reader: &mut ByteReader<'a>,
    schema: &Schema,
) -> Result<Value<'a>, DecodeError> {
    Decoder::new(schema).decode_from(reader)
}

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

use std::io;

use rmp::encode::ValueWriteError;
use thiserror::Error;
use typepack_model::ValueKind;
use typepack_schema::DescriptorKind;

use crate::path::Path;
use crate::wire::WireKind;


/// The reasons that decoding can fail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeErrorKind {
    /// Fewer bytes remain than the token being read requires.
    #[error("The input ended part way through a value ({needed} bytes were required but {remaining} remain).")]
    TruncatedInput { needed: usize, remaining: usize },
    #[error("Expected {expected} but found {actual}.")]
    TypeMismatch {
        expected: DescriptorKind,
        actual: WireKind,
    },
    #[error("The required field '{0}' is missing.")]
    MissingRequiredField(String),
    #[error("{0} does not identify a variant of the union.")]
    InvalidVariant(String),
    #[error("The field '{0}' occurs more than once.")]
    DuplicateField(String),
    /// An unknown field in a struct that forbids them.
    #[error("Unexpected field '{0}'.")]
    UnknownField(String),
    /// An array encoded struct that forbids unknown fields has more elements than it has fields.
    #[error("Expected at most {expected} elements but found {actual}.")]
    TooManyElements { expected: usize, actual: usize },
    #[error("{0} is not a member of the enumeration.")]
    InvalidEnumValue(String),
    /// The reserved marker byte (0xc1) occurred.
    #[error("0x{0:02x} is not a valid MessagePack marker.")]
    InvalidMarker(u8),
    #[error("Expected an extension of type {expected} but found type {actual}.")]
    InvalidExtension { expected: i8, actual: i8 },
    #[error("A string contained invalid UTF8.")]
    InvalidUtf8,
    /// Bytes remained after a complete value (or the payload of an extension) was read.
    #[error("{0} bytes remain after the end of the value.")]
    TrailingData(usize),
    #[error("Values are nested more deeply than the limit of {0}.")]
    DepthLimitExceeded(usize),
}

/// Error produced when decoding fails. This records the path from the root of the value being
/// decoded to the point where the failure occurred and the offset, into the input, of the token
/// that caused it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} - at `{path}` (byte {offset})")]
pub struct DecodeError {
    kind: DecodeErrorKind,
    path: Path,
    offset: usize,
}

impl DecodeError {
    pub fn new(kind: DecodeErrorKind, path: Path, offset: usize) -> Self {
        DecodeError { kind, path, offset }
    }

    pub fn kind(&self) -> &DecodeErrorKind {
        &self.kind
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn into_kind(self) -> DecodeErrorKind {
        self.kind
    }
}

/// The reasons that encoding can fail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeErrorKind {
    #[error("Expected {expected} but the value was {actual}.")]
    TypeMismatch {
        expected: DescriptorKind,
        actual: ValueKind,
    },
    #[error("The required field '{0}' is missing.")]
    MissingField(String),
    #[error("The field '{0}' is not defined by the schema.")]
    UnknownField(String),
    #[error("{0} does not identify a variant of the union.")]
    InvalidVariant(String),
    #[error("{0} is not a member of the enumeration.")]
    InvalidEnumValue(String),
    /// A string, binary, array or map exceeds the maximum length of a MessagePack container.
    #[error("A length of {0} cannot be represented in MessagePack.")]
    LengthOverflow(usize),
    /// The value has no single MessagePack representation without a schema.
    #[error("A {0} value can only be encoded against a schema.")]
    RequiresSchema(ValueKind),
    #[error("Values are nested more deeply than the limit of {0}.")]
    DepthLimitExceeded(usize),
    /// The output could not be written.
    #[error("Writing the output failed: {0}")]
    Io(io::ErrorKind),
}

impl From<io::Error> for EncodeErrorKind {
    fn from(err: io::Error) -> Self {
        EncodeErrorKind::Io(err.kind())
    }
}

impl From<ValueWriteError> for EncodeErrorKind {
    fn from(err: ValueWriteError) -> Self {
        match err {
            ValueWriteError::InvalidMarkerWrite(err) | ValueWriteError::InvalidDataWrite(err) => {
                EncodeErrorKind::Io(err.kind())
            }
        }
    }
}

/// Error produced when encoding fails, with the path to the part of the value that was
/// rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} - at `{path}`")]
pub struct EncodeError {
    kind: EncodeErrorKind,
    path: Path,
}

impl EncodeError {
    pub fn new(kind: EncodeErrorKind, path: Path) -> Self {
        EncodeError { kind, path }
    }

    pub fn kind(&self) -> &EncodeErrorKind {
        &self.kind
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn into_kind(self) -> EncodeErrorKind {
        self.kind
    }
}

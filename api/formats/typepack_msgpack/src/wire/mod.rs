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

//! Reading of individual MessagePack tokens. Nothing in this module knows about schemas. Tokens
//! are written with `rmp::encode`.

use std::fmt::{Display, Formatter};

use rmp::Marker;

use crate::error::{DecodeErrorKind, EncodeErrorKind};
use crate::reader::ByteReader;


/// The classes of MessagePack token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireKind {
    Nil,
    Bool,
    Int,
    Float,
    Str,
    Bin,
    Array,
    Map,
    Ext,
}

impl Display for WireKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            WireKind::Nil => "nil",
            WireKind::Bool => "bool",
            WireKind::Int => "int",
            WireKind::Float => "float",
            WireKind::Str => "str",
            WireKind::Bin => "bin",
            WireKind::Array => "array",
            WireKind::Map => "map",
            WireKind::Ext => "ext",
        };
        f.write_str(name)
    }
}

/// A single token read from the input. Strings, binary and extension payloads borrow from the
/// input. Arrays and maps are only headers: their elements follow as further tokens.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Header<'a> {
    Nil,
    Bool(bool),
    /// Any integer that fits into an `i64`.
    Int(i64),
    /// An integer that is too large for an `i64`.
    UInt(u64),
    Float(f64),
    Str(&'a str),
    Bin(&'a [u8]),
    Array(u32),
    Map(u32),
    Ext(i8, &'a [u8]),
}

impl Header<'_> {
    pub fn kind(&self) -> WireKind {
        match self {
            Header::Nil => WireKind::Nil,
            Header::Bool(_) => WireKind::Bool,
            Header::Int(_) | Header::UInt(_) => WireKind::Int,
            Header::Float(_) => WireKind::Float,
            Header::Str(_) => WireKind::Str,
            Header::Bin(_) => WireKind::Bin,
            Header::Array(_) => WireKind::Array,
            Header::Map(_) => WireKind::Map,
            Header::Ext(_, _) => WireKind::Ext,
        }
    }
}

/// Read the next token. String payloads are checked to be valid UTF8.
pub fn read_header<'a>(reader: &mut ByteReader<'a>) -> Result<Header<'a>, DecodeErrorKind> {
    let marker = Marker::from_u8(reader.read_u8()?);
    let header = match marker {
        Marker::Null => Header::Nil,
        Marker::True => Header::Bool(true),
        Marker::False => Header::Bool(false),
        Marker::FixPos(n) => Header::Int(n as i64),
        Marker::FixNeg(n) => Header::Int(n as i64),
        Marker::U8 => Header::Int(reader.read_u8()? as i64),
        Marker::U16 => Header::Int(reader.read_u16()? as i64),
        Marker::U32 => Header::Int(reader.read_u32()? as i64),
        Marker::U64 => {
            let n = reader.read_u64()?;
            match i64::try_from(n) {
                Ok(m) => Header::Int(m),
                Err(_) => Header::UInt(n),
            }
        }
        Marker::I8 => Header::Int(reader.read_i8()? as i64),
        Marker::I16 => Header::Int(reader.read_i16()? as i64),
        Marker::I32 => Header::Int(reader.read_i32()? as i64),
        Marker::I64 => Header::Int(reader.read_i64()?),
        Marker::F32 => Header::Float(reader.read_f32()? as f64),
        Marker::F64 => Header::Float(reader.read_f64()?),
        Marker::FixStr(_) | Marker::Str8 | Marker::Str16 | Marker::Str32 => {
            let len = payload_len(reader, marker)?;
            let bytes = reader.take(len)?;
            let string =
                std::str::from_utf8(bytes).map_err(|_| DecodeErrorKind::InvalidUtf8)?;
            Header::Str(string)
        }
        Marker::Bin8 | Marker::Bin16 | Marker::Bin32 => {
            let len = payload_len(reader, marker)?;
            Header::Bin(reader.take(len)?)
        }
        Marker::FixArray(n) => Header::Array(n as u32),
        Marker::Array16 => Header::Array(reader.read_u16()? as u32),
        Marker::Array32 => Header::Array(reader.read_u32()?),
        Marker::FixMap(n) => Header::Map(n as u32),
        Marker::Map16 => Header::Map(reader.read_u16()? as u32),
        Marker::Map32 => Header::Map(reader.read_u32()?),
        Marker::FixExt1
        | Marker::FixExt2
        | Marker::FixExt4
        | Marker::FixExt8
        | Marker::FixExt16
        | Marker::Ext8
        | Marker::Ext16
        | Marker::Ext32 => {
            let len = payload_len(reader, marker)?;
            let type_id = reader.read_i8()?;
            Header::Ext(type_id, reader.take(len)?)
        }
        Marker::Reserved => return Err(DecodeErrorKind::InvalidMarker(marker.to_u8())),
    };
    Ok(header)
}

/// The length of the payload of a string, binary or extension token.
fn payload_len(reader: &mut ByteReader<'_>, marker: Marker) -> Result<usize, DecodeErrorKind> {
    let len = match marker {
        Marker::FixStr(n) => n as usize,
        Marker::FixExt1 => 1,
        Marker::FixExt2 => 2,
        Marker::FixExt4 => 4,
        Marker::FixExt8 => 8,
        Marker::FixExt16 => 16,
        Marker::Str8 | Marker::Bin8 | Marker::Ext8 => reader.read_u8()? as usize,
        Marker::Str16 | Marker::Bin16 | Marker::Ext16 => reader.read_u16()? as usize,
        Marker::Str32 | Marker::Bin32 | Marker::Ext32 => reader.read_u32()? as usize,
        _ => 0,
    };
    Ok(len)
}

/// Consume exactly one complete value, including all of the elements of arrays and maps.
///
/// The traversal is iterative, keeping a count of the tokens that are still to be consumed, so
/// arbitrarily deep nesting in the input cannot exhaust the stack.
pub fn skip_value(reader: &mut ByteReader<'_>) -> Result<(), DecodeErrorKind> {
    let mut pending: u64 = 1;
    while pending > 0 {
        pending -= 1;
        let marker = Marker::from_u8(reader.read_u8()?);
        let skip = match marker {
            Marker::FixPos(_)
            | Marker::FixNeg(_)
            | Marker::Null
            | Marker::True
            | Marker::False => 0,
            Marker::U8 | Marker::I8 => 1,
            Marker::U16 | Marker::I16 => 2,
            Marker::U32 | Marker::I32 | Marker::F32 => 4,
            Marker::U64 | Marker::I64 | Marker::F64 => 8,
            Marker::FixStr(_)
            | Marker::Str8
            | Marker::Str16
            | Marker::Str32
            | Marker::Bin8
            | Marker::Bin16
            | Marker::Bin32 => payload_len(reader, marker)?,
            Marker::FixExt1
            | Marker::FixExt2
            | Marker::FixExt4
            | Marker::FixExt8
            | Marker::FixExt16
            | Marker::Ext8
            | Marker::Ext16
            | Marker::Ext32 => payload_len(reader, marker)? + 1,
            Marker::FixArray(n) => {
                pending += n as u64;
                0
            }
            Marker::Array16 => {
                pending += reader.read_u16()? as u64;
                0
            }
            Marker::Array32 => {
                pending += reader.read_u32()? as u64;
                0
            }
            Marker::FixMap(n) => {
                pending += 2 * n as u64;
                0
            }
            Marker::Map16 => {
                pending += 2 * reader.read_u16()? as u64;
                0
            }
            Marker::Map32 => {
                pending += 2 * reader.read_u32()? as u64;
                0
            }
            Marker::Reserved => return Err(DecodeErrorKind::InvalidMarker(marker.to_u8())),
        };
        reader.take(skip)?;
    }
    Ok(())
}

/// MessagePack lengths are at most 32 bits. `rmp::encode` truncates longer lengths so they must
/// be checked before a string, binary, container or extension header is written.
pub fn checked_len(len: usize) -> Result<u32, EncodeErrorKind> {
    u32::try_from(len).map_err(|_| EncodeErrorKind::LengthOverflow(len))
}

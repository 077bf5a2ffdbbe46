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

use rmp::Marker;
use tracing::trace;
use typepack_model::{Discriminant, Raw, Record, Value, Variant};
use typepack_schema::{
    DescriptorKind, PrimitiveKind, Schema, StructDescriptor, TagRepr, TypeDescriptor,
    UnionDescriptor, UnionVariant,
};

use crate::config::DecoderConfig;
use crate::error::{DecodeError, DecodeErrorKind};
use crate::path::{Path, PathContext};
use crate::reader::ByteReader;
use crate::wire::{read_header, skip_value, Header};


/// Reads MessagePack data into [`Value`]s, validating it against a [`Schema`] as it is read.
///
/// The input is consumed in a single pass: each token is read exactly once and the first token
/// that does not match the schema causes the whole decoding to fail. Strings, binary data and raw
/// values in the result borrow from the input.
///
/// | Token | Accepted by |
/// |-------|-------------|
/// | nil | optional, nil |
/// | bool | bool |
/// | int | int, float (when `int_to_float` is set), integer enumerations |
/// | float | float |
/// | str | str, string enumerations |
/// | bin | bytes |
/// | array | sequences, array-like structs and unions |
/// | map | mappings, map-like structs and unions |
/// | ext | unions represented as extensions |
///
/// Any value is accepted where a raw value is expected and is captured without being decoded.
#[derive(Debug, Clone, Copy)]
pub struct Decoder<'s> {
    schema: &'s Schema,
    config: DecoderConfig,
}

fn fail(path: &PathContext<'_>, offset: usize, kind: DecodeErrorKind) -> DecodeError {
    DecodeError::new(kind, path.snapshot(), offset)
}

fn mismatch(
    path: &PathContext<'_>,
    offset: usize,
    expected: DescriptorKind,
    header: &Header<'_>,
) -> DecodeError {
    fail(
        path,
        offset,
        DecodeErrorKind::TypeMismatch {
            expected,
            actual: header.kind(),
        },
    )
}

/// Containers can't have more elements than there are bytes remaining so this is used to bound
/// the space that is reserved for them.
fn capacity(reader: &ByteReader<'_>, len: u32, min_entry_size: usize) -> usize {
    (len as usize).min(reader.remaining() / min_entry_size)
}

impl<'s> Decoder<'s> {
    pub fn new(schema: &'s Schema) -> Self {
        Decoder {
            schema,
            config: DecoderConfig::default(),
        }
    }

    pub fn with_config(self, config: DecoderConfig) -> Self {
        Decoder { config, ..self }
    }

    /// Decode a buffer that contains exactly one value conforming to the root of the schema.
    pub fn decode<'a>(&self, input: &'a [u8]) -> Result<Value<'a>, DecodeError> {
        let mut reader = ByteReader::new(input);
        let value = self.decode_from(&mut reader)?;
        if reader.is_exhausted() {
            Ok(value)
        } else {
            let error = DecodeError::new(
                DecodeErrorKind::TrailingData(reader.remaining()),
                Path::default(),
                reader.position(),
            );
            trace!(error = %error, "Decoding failed.");
            Err(error)
        }
    }

    /// Decode one value, conforming to the root of the schema, from the reader. The reader is left
    /// positioned after the value.
    pub fn decode_from<'a>(&self, reader: &mut ByteReader<'a>) -> Result<Value<'a>, DecodeError> {
        self.decode_as(reader, self.schema.root())
    }

    /// Decode one value, conforming to a descriptor from the schema, from the reader.
    pub fn decode_as<'a>(
        &self,
        reader: &mut ByteReader<'a>,
        ty: &TypeDescriptor,
    ) -> Result<Value<'a>, DecodeError> {
        let result = self.decode_value(reader, ty, &PathContext::root());
        if let Err(error) = &result {
            trace!(error = %error, "Decoding failed.");
        }
        result
    }

    fn decode_value<'a>(
        &self,
        reader: &mut ByteReader<'a>,
        ty: &TypeDescriptor,
        path: &PathContext<'_>,
    ) -> Result<Value<'a>, DecodeError> {
        let offset = reader.position();
        if path.depth() > self.config.max_depth {
            return Err(fail(
                path,
                offset,
                DecodeErrorKind::DepthLimitExceeded(self.config.max_depth),
            ));
        }
        match ty {
            TypeDescriptor::Raw => {
                let mark = reader.mark();
                skip_value(reader).map_err(|kind| fail(path, offset, kind))?;
                Ok(Value::Raw(Raw::new(reader.consumed_since(mark))))
            }
            TypeDescriptor::Optional(inner) => {
                let tag = reader
                    .peek_tag()
                    .map_err(|kind| fail(path, offset, kind))?;
                if tag == Marker::Null.to_u8() {
                    reader.take(1).map_err(|kind| fail(path, offset, kind))?;
                    Ok(Value::Nil)
                } else {
                    self.decode_value(reader, inner, path)
                }
            }
            _ => {
                let header = read_header(reader).map_err(|kind| fail(path, offset, kind))?;
                self.decode_header(reader, header, ty, path, offset)
            }
        }
    }

    fn decode_header<'a>(
        &self,
        reader: &mut ByteReader<'a>,
        header: Header<'a>,
        ty: &TypeDescriptor,
        path: &PathContext<'_>,
        offset: usize,
    ) -> Result<Value<'a>, DecodeError> {
        match (ty, header) {
            (TypeDescriptor::Primitive(kind), header) => self
                .decode_primitive(*kind, header)
                .ok_or_else(|| mismatch(path, offset, ty.kind(), &header)),
            (TypeDescriptor::Sequence(element), Header::Array(len)) => {
                let mut items = Vec::with_capacity(capacity(reader, len, 1));
                for i in 0..len as usize {
                    let child = path.index(i);
                    items.push(self.decode_value(reader, element, &child)?);
                }
                Ok(Value::Seq(items))
            }
            (TypeDescriptor::Mapping(key_ty, value_ty), Header::Map(len)) => {
                let mut entries = Vec::with_capacity(capacity(reader, len, 2));
                for _ in 0..len {
                    let key = self.decode_value(reader, key_ty, path)?;
                    let child = path.key(&key);
                    let value = self.decode_value(reader, value_ty, &child)?;
                    entries.push((key, value));
                }
                Ok(Value::Map(entries))
            }
            (TypeDescriptor::Struct(id), header) => {
                let descriptor = self.schema.struct_descriptor(*id);
                self.decode_struct(reader, header, descriptor, path, offset)
                    .map(Value::Struct)
            }
            (TypeDescriptor::TaggedUnion(union), header) => {
                self.decode_union(reader, header, union, path, offset)
            }
            (TypeDescriptor::Enum(members), Header::Str(s)) => {
                if members.contains_str(s) {
                    Ok(Value::Text(Cow::Borrowed(s)))
                } else {
                    Err(fail(
                        path,
                        offset,
                        DecodeErrorKind::InvalidEnumValue(format!("{:?}", s)),
                    ))
                }
            }
            (TypeDescriptor::Enum(members), Header::Int(n)) => {
                if members.contains_int(n) {
                    Ok(Value::Int(n))
                } else {
                    Err(fail(
                        path,
                        offset,
                        DecodeErrorKind::InvalidEnumValue(n.to_string()),
                    ))
                }
            }
            // Enumerations only have signed members.
            (TypeDescriptor::Enum(_), Header::UInt(n)) => Err(fail(
                path,
                offset,
                DecodeErrorKind::InvalidEnumValue(n.to_string()),
            )),
            (ty, header) => Err(mismatch(path, offset, ty.kind(), &header)),
        }
    }

    fn decode_primitive<'a>(&self, kind: PrimitiveKind, header: Header<'a>) -> Option<Value<'a>> {
        let value = match (kind, header) {
            (PrimitiveKind::Nil, Header::Nil) => Value::Nil,
            (PrimitiveKind::Bool, Header::Bool(b)) => Value::Bool(b),
            (PrimitiveKind::Int, Header::Int(n)) => Value::Int(n),
            (PrimitiveKind::Int, Header::UInt(n)) => Value::UInt(n),
            (PrimitiveKind::Float, Header::Float(x)) => Value::Float(x),
            (PrimitiveKind::Float, Header::Int(n)) if self.config.int_to_float => {
                Value::Float(n as f64)
            }
            (PrimitiveKind::Float, Header::UInt(n)) if self.config.int_to_float => {
                Value::Float(n as f64)
            }
            (PrimitiveKind::Str, Header::Str(s)) => Value::Text(Cow::Borrowed(s)),
            (PrimitiveKind::Bytes, Header::Bin(b)) => Value::Blob(Cow::Borrowed(b)),
            _ => return None,
        };
        Some(value)
    }

    /// Decode the body of a struct from the header of its container.
    fn decode_struct<'a>(
        &self,
        reader: &mut ByteReader<'a>,
        header: Header<'a>,
        descriptor: &StructDescriptor,
        path: &PathContext<'_>,
        offset: usize,
    ) -> Result<Record<'a>, DecodeError> {
        match header {
            Header::Map(len) if !descriptor.is_array_like() => {
                self.decode_struct_map(reader, len, descriptor, path, offset)
            }
            Header::Array(len) if descriptor.is_array_like() => {
                self.decode_struct_array(reader, len, 0, descriptor, path, offset)
            }
            header => Err(mismatch(path, offset, DescriptorKind::Struct, &header)),
        }
    }

    fn decode_struct_map<'a>(
        &self,
        reader: &mut ByteReader<'a>,
        len: u32,
        descriptor: &StructDescriptor,
        path: &PathContext<'_>,
        offset: usize,
    ) -> Result<Record<'a>, DecodeError> {
        let fields = descriptor.fields();
        let mut slots: Vec<Option<Value<'a>>> = vec![None; fields.len()];
        for _ in 0..len {
            let key_offset = reader.position();
            let name = read_field_name(reader, path)?;
            match descriptor.field_index(name) {
                Some(i) => {
                    let field = &fields[i];
                    if slots[i].is_some() {
                        return Err(fail(
                            path,
                            key_offset,
                            DecodeErrorKind::DuplicateField(name.to_string()),
                        ));
                    }
                    let child = path.field(field.name());
                    slots[i] = Some(self.decode_value(reader, field.ty(), &child)?);
                }
                None if descriptor.forbids_unknown_fields() => {
                    return Err(fail(
                        path,
                        key_offset,
                        DecodeErrorKind::UnknownField(name.to_string()),
                    ));
                }
                None => {
                    let value_offset = reader.position();
                    skip_value(reader).map_err(|kind| fail(path, value_offset, kind))?;
                }
            }
        }
        complete_record(descriptor, slots, path, offset)
    }

    /// Decode the fields of an array encoded struct. The fields start at `first_index` in the
    /// enclosing array, after any discriminant.
    fn decode_struct_array<'a>(
        &self,
        reader: &mut ByteReader<'a>,
        len: u32,
        first_index: usize,
        descriptor: &StructDescriptor,
        path: &PathContext<'_>,
        offset: usize,
    ) -> Result<Record<'a>, DecodeError> {
        let fields = descriptor.fields();
        let len = len as usize;
        if len > fields.len() && descriptor.forbids_unknown_fields() {
            return Err(fail(
                path,
                offset,
                DecodeErrorKind::TooManyElements {
                    expected: fields.len(),
                    actual: len,
                },
            ));
        }
        let mut slots = Vec::with_capacity(fields.len());
        for field in fields.iter().take(len) {
            let child = path.field(field.name());
            slots.push(Some(self.decode_value(reader, field.ty(), &child)?));
        }
        slots.resize(fields.len(), None);
        for i in fields.len()..len {
            let child = path.index(first_index + i);
            let element_offset = reader.position();
            skip_value(reader).map_err(|kind| fail(&child, element_offset, kind))?;
        }
        complete_record(descriptor, slots, path, offset)
    }

    fn decode_union<'a>(
        &self,
        reader: &mut ByteReader<'a>,
        header: Header<'a>,
        union: &UnionDescriptor,
        path: &PathContext<'_>,
        offset: usize,
    ) -> Result<Value<'a>, DecodeError> {
        let missing_tag = || {
            fail(
                path,
                offset,
                DecodeErrorKind::MissingRequiredField(union.tag_field().to_string()),
            )
        };
        let (selected, record) = match (union.repr(), header) {
            (TagRepr::Field, Header::Map(len)) if !union.is_array_like() => {
                if len == 0 {
                    return Err(missing_tag());
                }
                // The discriminant must be the first entry.
                let name = read_field_name(reader, path)?;
                if name != union.tag_field() {
                    return Err(missing_tag());
                }
                let selected = self.read_discriminant(reader, union, path)?;
                let descriptor = self.schema.struct_descriptor(selected.schema());
                let record = self.decode_struct_map(reader, len - 1, descriptor, path, offset)?;
                (selected, record)
            }
            (TagRepr::Field, Header::Array(len)) if union.is_array_like() => {
                if len == 0 {
                    return Err(missing_tag());
                }
                let selected = self.read_discriminant(reader, union, path)?;
                let descriptor = self.schema.struct_descriptor(selected.schema());
                let record =
                    self.decode_struct_array(reader, len - 1, 1, descriptor, path, offset)?;
                (selected, record)
            }
            (TagRepr::Extension { type_id }, Header::Ext(actual, payload)) => {
                if actual != type_id {
                    return Err(fail(
                        path,
                        offset,
                        DecodeErrorKind::InvalidExtension {
                            expected: type_id,
                            actual,
                        },
                    ));
                }
                // The payload was the last thing to be read.
                let base = reader.position() - payload.len();
                let mut payload_reader = ByteReader::at_offset(payload, base);
                let selected = self.read_discriminant(&mut payload_reader, union, path)?;
                let descriptor = self.schema.struct_descriptor(selected.schema());
                let body_offset = payload_reader.position();
                let body = read_header(&mut payload_reader)
                    .map_err(|kind| fail(path, body_offset, kind))?;
                let record =
                    self.decode_struct(&mut payload_reader, body, descriptor, path, body_offset)?;
                if !payload_reader.is_exhausted() {
                    return Err(fail(
                        path,
                        payload_reader.position(),
                        DecodeErrorKind::TrailingData(payload_reader.remaining()),
                    ));
                }
                (selected, record)
            }
            (_, header) => {
                return Err(mismatch(path, offset, DescriptorKind::TaggedUnion, &header));
            }
        };
        Ok(Value::Variant(Variant {
            tag: selected.tag().clone(),
            record,
        }))
    }

    fn read_discriminant<'u>(
        &self,
        reader: &mut ByteReader<'_>,
        union: &'u UnionDescriptor,
        path: &PathContext<'_>,
    ) -> Result<&'u UnionVariant, DecodeError> {
        let child = path.field(union.tag_field());
        let offset = reader.position();
        let header = read_header(reader).map_err(|kind| fail(&child, offset, kind))?;
        let selected = match header {
            Header::Str(s) => union
                .variant_for_str(s)
                .ok_or_else(|| format!("{:?}", s)),
            Header::Int(n) => union.variant_for_int(n).ok_or_else(|| n.to_string()),
            Header::UInt(n) => Err(n.to_string()),
            header => {
                let expected = if union
                    .variants()
                    .iter()
                    .any(|v| matches!(v.tag(), Discriminant::Str(_)))
                {
                    DescriptorKind::Str
                } else {
                    DescriptorKind::Int
                };
                return Err(mismatch(&child, offset, expected, &header));
            }
        };
        selected.map_err(|tag| fail(&child, offset, DecodeErrorKind::InvalidVariant(tag)))
    }
}

fn read_field_name<'a>(
    reader: &mut ByteReader<'a>,
    path: &PathContext<'_>,
) -> Result<&'a str, DecodeError> {
    let offset = reader.position();
    match read_header(reader).map_err(|kind| fail(path, offset, kind))? {
        Header::Str(name) => Ok(name),
        header => Err(mismatch(path, offset, DescriptorKind::Str, &header)),
    }
}

/// Fill in absent fields from their defaults.
fn complete_record<'a>(
    descriptor: &StructDescriptor,
    slots: Vec<Option<Value<'a>>>,
    path: &PathContext<'_>,
    offset: usize,
) -> Result<Record<'a>, DecodeError> {
    let fields = descriptor.fields();
    let mut record = Record::with_capacity(fields.len());
    for (field, slot) in fields.iter().zip(slots) {
        let value = match slot {
            Some(value) => value,
            None => field.default().resolve().ok_or_else(|| {
                fail(
                    path,
                    offset,
                    DecodeErrorKind::MissingRequiredField(field.name().to_string()),
                )
            })?,
        };
        record.push(field.shared_name().clone(), value);
    }
    Ok(record)
}

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

use bytes::Bytes;
use rmp::encode;
use tracing::trace;
use typepack_model::{Discriminant, Record, Value, Variant};
use typepack_schema::{
    PrimitiveKind, Schema, StructDescriptor, TagRepr, TypeDescriptor, UnionDescriptor,
};

use crate::buffer::OutputBuffer;
use crate::config::EncoderConfig;
use crate::error::{EncodeError, EncodeErrorKind};
use crate::path::PathContext;
use crate::wire::checked_len;


/// Writes [`Value`]s as MessagePack, checking that they conform to a [`Schema`].
///
/// Encoding is stricter than decoding: the producer of a value is in control of its shape so no
/// conversions are applied and any value that does not match the schema is rejected.
///
/// - Structs are written as maps from field name to value in field order or, if the struct is
/// array-like, as arrays of the field values. Absent fields are written with their default unless
/// the struct omits defaults (which also causes fields equal to their defaults to be omitted).
/// - The discriminant of a tagged union is written as the first entry of the map (keyed by the
/// tag field) or the first element of the array. Alternatively, the union can be written as an
/// extension whose payload is the discriminant followed by the struct.
/// - Raw values are written verbatim. Where a raw value is expected, any other value is written
/// without reference to the schema.
#[derive(Debug, Clone, Copy)]
pub struct Encoder<'s> {
    schema: &'s Schema,
    config: EncoderConfig,
}

fn fail<K: Into<EncodeErrorKind>>(path: &PathContext<'_>, kind: K) -> EncodeError {
    EncodeError::new(kind.into(), path.snapshot())
}

fn mismatch(path: &PathContext<'_>, ty: &TypeDescriptor, value: &Value<'_>) -> EncodeError {
    fail(
        path,
        EncodeErrorKind::TypeMismatch {
            expected: ty.kind(),
            actual: value.kind(),
        },
    )
}

fn write_str(buf: &mut OutputBuffer, s: &str) -> Result<(), EncodeErrorKind> {
    checked_len(s.len())?;
    encode::write_str(buf, s)?;
    Ok(())
}

fn write_bin(buf: &mut OutputBuffer, data: &[u8]) -> Result<(), EncodeErrorKind> {
    checked_len(data.len())?;
    encode::write_bin(buf, data)?;
    Ok(())
}

fn write_array_len(buf: &mut OutputBuffer, len: usize) -> Result<(), EncodeErrorKind> {
    encode::write_array_len(buf, checked_len(len)?)?;
    Ok(())
}

fn write_map_len(buf: &mut OutputBuffer, len: usize) -> Result<(), EncodeErrorKind> {
    encode::write_map_len(buf, checked_len(len)?)?;
    Ok(())
}

fn write_discriminant(buf: &mut OutputBuffer, tag: &Discriminant) -> Result<(), EncodeErrorKind> {
    match tag {
        Discriminant::Str(s) => write_str(buf, s),
        Discriminant::Int(n) => {
            encode::write_sint(buf, *n)?;
            Ok(())
        }
    }
}

impl<'s> Encoder<'s> {
    pub fn new(schema: &'s Schema) -> Self {
        Encoder {
            schema,
            config: EncoderConfig::default(),
        }
    }

    pub fn with_config(self, config: EncoderConfig) -> Self {
        Encoder { config, ..self }
    }

    /// Encode a value that conforms to the root of the schema into a new buffer.
    pub fn encode(&self, value: &Value<'_>) -> Result<Bytes, EncodeError> {
        let mut buf = OutputBuffer::with_capacity(self.config.initial_capacity);
        self.encode_into(value, &mut buf)?;
        Ok(buf.finish())
    }

    /// Append the encoding of a value that conforms to the root of the schema to a buffer. If
    /// encoding fails, the buffer is restored to its original length.
    pub fn encode_into(&self, value: &Value<'_>, buf: &mut OutputBuffer) -> Result<(), EncodeError> {
        self.encode_as(value, self.schema.root(), buf)
    }

    /// Append the encoding of a value that conforms to a descriptor from the schema to a buffer.
    /// If encoding fails, the buffer is restored to its original length.
    pub fn encode_as(
        &self,
        value: &Value<'_>,
        ty: &TypeDescriptor,
        buf: &mut OutputBuffer,
    ) -> Result<(), EncodeError> {
        let start = buf.len();
        let result = self.encode_value(buf, value, ty, &PathContext::root());
        if let Err(error) = &result {
            trace!(error = %error, "Encoding failed.");
            buf.truncate(start);
        }
        result
    }

    fn encode_value(
        &self,
        buf: &mut OutputBuffer,
        value: &Value<'_>,
        ty: &TypeDescriptor,
        path: &PathContext<'_>,
    ) -> Result<(), EncodeError> {
        check_depth(path, self.config.max_depth)?;
        match (ty, value) {
            (TypeDescriptor::Raw, Value::Raw(raw)) => buf.append_bytes(raw.as_bytes()),
            (TypeDescriptor::Raw, value) => {
                encode_untyped(buf, value, path, self.config.max_depth)?
            }
            (TypeDescriptor::Optional(_), Value::Nil) => {
                encode::write_nil(buf).map_err(|err| fail(path, err))?
            }
            (TypeDescriptor::Optional(inner), value) => self.encode_value(buf, value, inner, path)?,
            (TypeDescriptor::Primitive(kind), value) if primitive_accepts(*kind, value) => {
                encode_untyped(buf, value, path, self.config.max_depth)?
            }
            (TypeDescriptor::Sequence(element), Value::Seq(items)) => {
                write_array_len(buf, items.len()).map_err(|kind| fail(path, kind))?;
                for (i, item) in items.iter().enumerate() {
                    let child = path.index(i);
                    self.encode_value(buf, item, element, &child)?;
                }
            }
            (TypeDescriptor::Mapping(key_ty, value_ty), Value::Map(entries)) => {
                write_map_len(buf, entries.len()).map_err(|kind| fail(path, kind))?;
                for (key, value) in entries {
                    let child = path.key(key);
                    self.encode_value(buf, key, key_ty, &child)?;
                    self.encode_value(buf, value, value_ty, &child)?;
                }
            }
            (TypeDescriptor::Struct(id), Value::Struct(record)) => {
                let descriptor = self.schema.struct_descriptor(*id);
                self.encode_struct(buf, record, descriptor, None, path)?;
            }
            (TypeDescriptor::TaggedUnion(union), Value::Variant(variant)) => {
                self.encode_variant(buf, variant, union, path)?;
            }
            (TypeDescriptor::Enum(members), Value::Text(s)) if members.contains_str(s) => {
                write_str(buf, s).map_err(|kind| fail(path, kind))?;
            }
            (TypeDescriptor::Enum(members), Value::Int(n)) if members.contains_int(*n) => {
                encode::write_sint(buf, *n).map_err(|err| fail(path, err))?;
            }
            (TypeDescriptor::Enum(_), Value::Text(_) | Value::Int(_) | Value::UInt(_)) => {
                return Err(fail(
                    path,
                    EncodeErrorKind::InvalidEnumValue(value.to_string()),
                ));
            }
            (ty, value) => return Err(mismatch(path, ty, value)),
        }
        Ok(())
    }

    fn encode_struct(
        &self,
        buf: &mut OutputBuffer,
        record: &Record<'_>,
        descriptor: &StructDescriptor,
        tag: Option<(&str, &Discriminant)>,
        path: &PathContext<'_>,
    ) -> Result<(), EncodeError> {
        if let Some((name, _)) = record
            .fields()
            .find(|(name, _)| descriptor.field_index(name).is_none())
        {
            return Err(fail(path, EncodeErrorKind::UnknownField(name.to_string())));
        }

        let array_like = descriptor.is_array_like();
        let omit_defaults = descriptor.omits_defaults() && !array_like;
        let mut entries = Vec::with_capacity(descriptor.fields().len());
        for field in descriptor.fields() {
            match record.get(field.name()) {
                Some(value) if omit_defaults && field.default().is_default(value) => {}
                Some(value) => entries.push((field, Cow::Borrowed(value))),
                None if field.is_required() => {
                    return Err(fail(
                        path,
                        EncodeErrorKind::MissingField(field.name().to_string()),
                    ));
                }
                None if omit_defaults => {}
                None => {
                    if let Some(default) = field.default().resolve() {
                        entries.push((field, Cow::Owned(default)));
                    }
                }
            }
        }

        let len = entries.len() + usize::from(tag.is_some());
        if array_like {
            write_array_len(buf, len).map_err(|kind| fail(path, kind))?;
            if let Some((_, discriminant)) = tag {
                write_discriminant(buf, discriminant).map_err(|kind| fail(path, kind))?;
            }
        } else {
            write_map_len(buf, len).map_err(|kind| fail(path, kind))?;
            if let Some((tag_field, discriminant)) = tag {
                write_str(buf, tag_field).map_err(|kind| fail(path, kind))?;
                write_discriminant(buf, discriminant).map_err(|kind| fail(path, kind))?;
            }
        }
        for (field, value) in entries {
            let child = path.field(field.name());
            if !array_like {
                write_str(buf, field.name()).map_err(|kind| fail(&child, kind))?;
            }
            self.encode_value(buf, &value, field.ty(), &child)?;
        }
        Ok(())
    }

    fn encode_variant(
        &self,
        buf: &mut OutputBuffer,
        variant: &Variant<'_>,
        union: &UnionDescriptor,
        path: &PathContext<'_>,
    ) -> Result<(), EncodeError> {
        let selected = union.variant_for(&variant.tag).ok_or_else(|| {
            fail(
                path,
                EncodeErrorKind::InvalidVariant(variant.tag.to_string()),
            )
        })?;
        let descriptor = self.schema.struct_descriptor(selected.schema());
        match union.repr() {
            TagRepr::Field => self.encode_struct(
                buf,
                &variant.record,
                descriptor,
                Some((union.tag_field(), selected.tag())),
                path,
            ),
            TagRepr::Extension { type_id } => {
                // The length of the extension must be known before the payload can be written.
                let mut payload = OutputBuffer::new();
                write_discriminant(&mut payload, selected.tag()).map_err(|kind| fail(path, kind))?;
                self.encode_struct(&mut payload, &variant.record, descriptor, None, path)?;
                let len = checked_len(payload.len()).map_err(|kind| fail(path, kind))?;
                encode::write_ext_meta(buf, len, type_id).map_err(|err| fail(path, err))?;
                buf.append_bytes(payload.as_slice());
                Ok(())
            }
        }
    }
}

fn check_depth(path: &PathContext<'_>, max_depth: usize) -> Result<(), EncodeError> {
    if path.depth() > max_depth {
        Err(fail(path, EncodeErrorKind::DepthLimitExceeded(max_depth)))
    } else {
        Ok(())
    }
}

/// Encode a value using only its own structure. Structs are written as maps.
fn encode_untyped(
    buf: &mut OutputBuffer,
    value: &Value<'_>,
    path: &PathContext<'_>,
    max_depth: usize,
) -> Result<(), EncodeError> {
    check_depth(path, max_depth)?;
    match value {
        Value::Nil => encode::write_nil(buf).map_err(|err| fail(path, err))?,
        Value::Bool(b) => encode::write_bool(buf, *b).map_err(|err| fail(path, err))?,
        Value::Int(n) => {
            encode::write_sint(buf, *n).map_err(|err| fail(path, err))?;
        }
        Value::UInt(n) => {
            encode::write_uint(buf, *n).map_err(|err| fail(path, err))?;
        }
        Value::Float(x) => encode::write_f64(buf, *x).map_err(|err| fail(path, err))?,
        Value::Text(s) => write_str(buf, s).map_err(|kind| fail(path, kind))?,
        Value::Blob(b) => write_bin(buf, b).map_err(|kind| fail(path, kind))?,
        Value::Seq(items) => {
            write_array_len(buf, items.len()).map_err(|kind| fail(path, kind))?;
            for (i, item) in items.iter().enumerate() {
                encode_untyped(buf, item, &path.index(i), max_depth)?;
            }
        }
        Value::Map(entries) => {
            write_map_len(buf, entries.len()).map_err(|kind| fail(path, kind))?;
            for (key, value) in entries {
                let child = path.key(key);
                encode_untyped(buf, key, &child, max_depth)?;
                encode_untyped(buf, value, &child, max_depth)?;
            }
        }
        Value::Struct(record) => {
            write_map_len(buf, record.len()).map_err(|kind| fail(path, kind))?;
            for (name, value) in record.fields() {
                let child = path.field(name);
                write_str(buf, name).map_err(|kind| fail(&child, kind))?;
                encode_untyped(buf, value, &child, max_depth)?;
            }
        }
        Value::Raw(raw) => buf.append_bytes(raw.as_bytes()),
        Value::Variant(_) => {
            return Err(fail(path, EncodeErrorKind::RequiresSchema(value.kind())));
        }
    }
    Ok(())
}

/// Whether a value has the kind that a primitive type requires. An unsigned value is only
/// accepted for an int when it is too large for an `i64`, as anything smaller is read back as a
/// signed value.
fn primitive_accepts(kind: PrimitiveKind, value: &Value<'_>) -> bool {
    match (kind, value) {
        (PrimitiveKind::Int, Value::UInt(n)) => *n > i64::MAX as u64,
        _ => matches!(
            (kind, value),
            (PrimitiveKind::Bool, Value::Bool(_))
                | (PrimitiveKind::Int, Value::Int(_))
                | (PrimitiveKind::Float, Value::Float(_))
                | (PrimitiveKind::Str, Value::Text(_))
                | (PrimitiveKind::Bytes, Value::Blob(_))
                | (PrimitiveKind::Nil, Value::Nil)
        ),
    }
}

/// Encode a value without a schema. Structs are written as maps from field name to value and
/// raw values are written verbatim. Tagged union variants cannot be encoded in this way as the
/// name of the tag field is not known.
pub fn encode_value(value: &Value<'_>, config: &EncoderConfig) -> Result<Bytes, EncodeError> {
    let mut buf = OutputBuffer::with_capacity(config.initial_capacity);
    match encode_untyped(&mut buf, value, &PathContext::root(), config.max_depth) {
        Ok(()) => Ok(buf.finish()),
        Err(error) => {
            trace!(error = %error, "Encoding failed.");
            Err(error)
        }
    }
}

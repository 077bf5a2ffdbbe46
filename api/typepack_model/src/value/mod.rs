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
use std::fmt::{Display, Formatter};
use std::sync::Arc;

#[cfg(test)]
mod tests;

/// The kinds of [`Value`] that can occur at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Nil,
    Bool,
    Int,
    UInt,
    Float,
    Text,
    Blob,
    Seq,
    Map,
    Struct,
    Variant,
    Raw,
}

impl Display for ValueKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ValueKind::Nil => "nil",
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::UInt => "uint",
            ValueKind::Float => "float",
            ValueKind::Text => "text",
            ValueKind::Blob => "blob",
            ValueKind::Seq => "sequence",
            ValueKind::Map => "mapping",
            ValueKind::Struct => "struct",
            ValueKind::Variant => "variant",
            ValueKind::Raw => "raw",
        };
        f.write_str(name)
    }
}

/// A value that has been decoded from, or is to be encoded to, the wire format.
///
/// Integers that fit into an `i64` are always represented as [`Value::Int`]. [`Value::UInt`] is
/// reserved for integers above `i64::MAX` and the `From` conversions maintain this.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value<'a> {
    #[default]
    Nil,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(Cow<'a, str>),
    Blob(Cow<'a, [u8]>),
    Seq(Vec<Value<'a>>),
    /// Entries of a mapping in the order they were written.
    Map(Vec<(Value<'a>, Value<'a>)>),
    /// An instance of a struct, keyed by field name.
    Struct(Record<'a>),
    /// An instance of one of the variants of a tagged union.
    Variant(Variant<'a>),
    /// A span of the wire format that has not been decoded.
    Raw(Raw<'a>),
}

impl<'a> Value<'a> {
    pub fn text<T: Into<Cow<'a, str>>>(text: T) -> Self {
        Value::Text(text.into())
    }

    pub fn blob<B: Into<Cow<'a, [u8]>>>(blob: B) -> Self {
        Value::Blob(blob.into())
    }

    pub fn seq<I>(items: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value<'a>>,
    {
        Value::Seq(items.into_iter().map(Into::into).collect())
    }

    pub fn map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Value<'a>>,
        V: Into<Value<'a>>,
    {
        Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Nil => ValueKind::Nil,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::UInt(_) => ValueKind::UInt,
            Value::Float(_) => ValueKind::Float,
            Value::Text(_) => ValueKind::Text,
            Value::Blob(_) => ValueKind::Blob,
            Value::Seq(_) => ValueKind::Seq,
            Value::Map(_) => ValueKind::Map,
            Value::Struct(_) => ValueKind::Struct,
            Value::Variant(_) => ValueKind::Variant,
            Value::Raw(_) => ValueKind::Raw,
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s.as_ref()),
            _ => None,
        }
    }

    pub fn as_blob(&self) -> Option<&[u8]> {
        match self {
            Value::Blob(b) => Some(b.as_ref()),
            _ => None,
        }
    }

    pub fn as_seq(&self) -> Option<&[Value<'a>]> {
        match self {
            Value::Seq(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    pub fn as_seq_mut(&mut self) -> Option<&mut Vec<Value<'a>>> {
        match self {
            Value::Seq(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record<'a>> {
        match self {
            Value::Struct(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_record_mut(&mut self) -> Option<&mut Record<'a>> {
        match self {
            Value::Struct(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_variant(&self) -> Option<&Variant<'a>> {
        match self {
            Value::Variant(variant) => Some(variant),
            _ => None,
        }
    }

    /// Copy any data borrowed from the input buffer so that the value can outlive it.
    pub fn into_owned(self) -> Value<'static> {
        match self {
            Value::Nil => Value::Nil,
            Value::Bool(b) => Value::Bool(b),
            Value::Int(n) => Value::Int(n),
            Value::UInt(n) => Value::UInt(n),
            Value::Float(x) => Value::Float(x),
            Value::Text(s) => Value::Text(Cow::Owned(s.into_owned())),
            Value::Blob(b) => Value::Blob(Cow::Owned(b.into_owned())),
            Value::Seq(items) => Value::Seq(items.into_iter().map(Value::into_owned).collect()),
            Value::Map(entries) => Value::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.into_owned(), v.into_owned()))
                    .collect(),
            ),
            Value::Struct(record) => Value::Struct(record.into_owned()),
            Value::Variant(variant) => Value::Variant(variant.into_owned()),
            Value::Raw(raw) => Value::Raw(raw.into_owned()),
        }
    }
}

impl From<bool> for Value<'_> {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value<'_> {
    fn from(n: i32) -> Self {
        Value::Int(n as i64)
    }
}

impl From<i64> for Value<'_> {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<u32> for Value<'_> {
    fn from(n: u32) -> Self {
        Value::Int(n as i64)
    }
}

impl From<u64> for Value<'_> {
    fn from(n: u64) -> Self {
        match i64::try_from(n) {
            Ok(m) => Value::Int(m),
            Err(_) => Value::UInt(n),
        }
    }
}

impl From<f64> for Value<'_> {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl<'a> From<&'a str> for Value<'a> {
    fn from(s: &'a str) -> Self {
        Value::Text(Cow::Borrowed(s))
    }
}

impl From<String> for Value<'_> {
    fn from(s: String) -> Self {
        Value::Text(Cow::Owned(s))
    }
}

impl<'a> From<Record<'a>> for Value<'a> {
    fn from(record: Record<'a>) -> Self {
        Value::Struct(record)
    }
}

impl<'a> From<Variant<'a>> for Value<'a> {
    fn from(variant: Variant<'a>) -> Self {
        Value::Variant(variant)
    }
}

impl<'a> From<Raw<'a>> for Value<'a> {
    fn from(raw: Raw<'a>) -> Self {
        Value::Raw(raw)
    }
}

impl<'a, T: Into<Value<'a>>> From<Option<T>> for Value<'a> {
    fn from(maybe: Option<T>) -> Self {
        maybe.map(Into::into).unwrap_or(Value::Nil)
    }
}

impl Display for Value<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Nil => f.write_str("nil"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::UInt(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{:?}", x),
            Value::Text(s) => write!(f, "{:?}", s.as_ref()),
            Value::Blob(b) => write!(f, "<{} bytes>", b.len()),
            Value::Seq(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Value::Map(entries) => {
                f.write_str("{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                f.write_str("}")
            }
            Value::Struct(record) => write!(f, "{}", record),
            Value::Variant(variant) => write!(f, "{}{}", variant.tag, variant.record),
            Value::Raw(raw) => write!(f, "<raw {} bytes>", raw.as_bytes().len()),
        }
    }
}

/// An instance of a struct: a collection of named field values.
///
/// Equality does not depend on the order of the fields.
#[derive(Debug, Clone, Default)]
pub struct Record<'a> {
    fields: Vec<(Arc<str>, Value<'a>)>,
}

impl<'a> Record<'a> {
    pub fn new() -> Self {
        Record::default()
    }

    pub fn with_capacity(n: usize) -> Self {
        Record {
            fields: Vec::with_capacity(n),
        }
    }

    /// Add a field, replacing any existing field with the same name.
    pub fn with<N, V>(mut self, name: N, value: V) -> Self
    where
        N: Into<Arc<str>>,
        V: Into<Value<'a>>,
    {
        self.insert(name, value);
        self
    }

    pub fn insert<N, V>(&mut self, name: N, value: V)
    where
        N: Into<Arc<str>>,
        V: Into<Value<'a>>,
    {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Append a field without checking for an existing field of the same name.
    pub fn push(&mut self, name: Arc<str>, value: Value<'a>) {
        self.fields.push((name, value));
    }

    pub fn get(&self, name: &str) -> Option<&Value<'a>> {
        self.fields
            .iter()
            .find(|(n, _)| n.as_ref() == name)
            .map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value<'a>> {
        self.fields
            .iter_mut()
            .find(|(n, _)| n.as_ref() == name)
            .map(|(_, v)| v)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value<'a>)> {
        self.fields.iter().map(|(n, v)| (n.as_ref(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn into_owned(self) -> Record<'static> {
        Record {
            fields: self
                .fields
                .into_iter()
                .map(|(n, v)| (n, v.into_owned()))
                .collect(),
        }
    }
}

impl PartialEq for Record<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.fields.len() == other.fields.len()
            && self
                .fields
                .iter()
                .all(|(name, value)| other.get(name) == Some(value))
    }
}

impl Display for Record<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("{")?;
        for (i, (name, value)) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", name, value)?;
        }
        f.write_str("}")
    }
}

/// The value that identifies a variant of a tagged union or a member of an enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Discriminant {
    Str(Arc<str>),
    Int(i64),
}

impl Display for Discriminant {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Discriminant::Str(s) => write!(f, "{:?}", s.as_ref()),
            Discriminant::Int(n) => write!(f, "{}", n),
        }
    }
}

impl From<&str> for Discriminant {
    fn from(s: &str) -> Self {
        Discriminant::Str(s.into())
    }
}

impl From<String> for Discriminant {
    fn from(s: String) -> Self {
        Discriminant::Str(s.into())
    }
}

impl From<i64> for Discriminant {
    fn from(n: i64) -> Self {
        Discriminant::Int(n)
    }
}

impl From<Discriminant> for Value<'_> {
    fn from(tag: Discriminant) -> Self {
        match tag {
            Discriminant::Str(s) => Value::Text(Cow::Owned(s.as_ref().to_string())),
            Discriminant::Int(n) => Value::Int(n),
        }
    }
}

/// An instance of a tagged union: the discriminant of the variant and its fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Variant<'a> {
    pub tag: Discriminant,
    pub record: Record<'a>,
}

impl<'a> Variant<'a> {
    pub fn new<T: Into<Discriminant>>(tag: T, record: Record<'a>) -> Self {
        Variant {
            tag: tag.into(),
            record,
        }
    }

    pub fn into_owned(self) -> Variant<'static> {
        let Variant { tag, record } = self;
        Variant {
            tag,
            record: record.into_owned(),
        }
    }
}

/// A single, complete, encoded value in the wire format. The bytes are not validated on
/// construction and are written verbatim when encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raw<'a>(Cow<'a, [u8]>);

impl<'a> Raw<'a> {
    pub fn new<B: Into<Cow<'a, [u8]>>>(bytes: B) -> Self {
        Raw(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_ref()
    }

    pub fn into_owned(self) -> Raw<'static> {
        Raw(Cow::Owned(self.0.into_owned()))
    }
}

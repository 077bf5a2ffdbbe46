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

use std::collections::{HashMap, HashSet};
use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;

use serde::Deserialize;
use typepack_model::{Discriminant, Record, Value};


/// Kinds of scalar value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Bool,
    Int,
    Float,
    Str,
    Bytes,
    Nil,
}

/// The kind of a [`TypeDescriptor`], used to report what was expected when a value does not
/// match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptorKind {
    Bool,
    Int,
    Float,
    Str,
    Bytes,
    Nil,
    Sequence,
    Mapping,
    Struct,
    TaggedUnion,
    Enum,
    Raw,
}

impl Display for DescriptorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DescriptorKind::Bool => "bool",
            DescriptorKind::Int => "int",
            DescriptorKind::Float => "float",
            DescriptorKind::Str => "str",
            DescriptorKind::Bytes => "bytes",
            DescriptorKind::Nil => "nil",
            DescriptorKind::Sequence => "sequence",
            DescriptorKind::Mapping => "mapping",
            DescriptorKind::Struct => "struct",
            DescriptorKind::TaggedUnion => "tagged union",
            DescriptorKind::Enum => "enum",
            DescriptorKind::Raw => "raw",
        };
        f.write_str(name)
    }
}

/// Index of a struct within the [`Schema`] that it was compiled into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StructId(usize);

impl StructId {
    pub(crate) fn new(index: usize) -> Self {
        StructId(index)
    }

    pub fn index(&self) -> usize {
        self.0
    }
}

/// The compiled description of the expected shape of a value.
#[derive(Debug, Clone)]
pub enum TypeDescriptor {
    Primitive(PrimitiveKind),
    /// Nil or a value matching the inner descriptor. Never directly contains another optional.
    Optional(Box<TypeDescriptor>),
    Sequence(Box<TypeDescriptor>),
    Mapping(Box<TypeDescriptor>, Box<TypeDescriptor>),
    Struct(StructId),
    TaggedUnion(Box<UnionDescriptor>),
    Enum(EnumDescriptor),
    /// Any single value, kept in its encoded form.
    Raw,
}

impl TypeDescriptor {
    /// Wrap a descriptor as optional. Descriptors that already admit nil are returned unchanged.
    pub fn optional(inner: TypeDescriptor) -> TypeDescriptor {
        match inner {
            TypeDescriptor::Optional(_)
            | TypeDescriptor::Raw
            | TypeDescriptor::Primitive(PrimitiveKind::Nil) => inner,
            ow => TypeDescriptor::Optional(Box::new(ow)),
        }
    }

    pub fn accepts_nil(&self) -> bool {
        matches!(
            self,
            TypeDescriptor::Optional(_)
                | TypeDescriptor::Raw
                | TypeDescriptor::Primitive(PrimitiveKind::Nil)
        )
    }

    /// The kind of the descriptor. For optional descriptors this is the kind of the inner
    /// descriptor.
    pub fn kind(&self) -> DescriptorKind {
        match self {
            TypeDescriptor::Primitive(kind) => match kind {
                PrimitiveKind::Bool => DescriptorKind::Bool,
                PrimitiveKind::Int => DescriptorKind::Int,
                PrimitiveKind::Float => DescriptorKind::Float,
                PrimitiveKind::Str => DescriptorKind::Str,
                PrimitiveKind::Bytes => DescriptorKind::Bytes,
                PrimitiveKind::Nil => DescriptorKind::Nil,
            },
            TypeDescriptor::Optional(inner) => inner.kind(),
            TypeDescriptor::Sequence(_) => DescriptorKind::Sequence,
            TypeDescriptor::Mapping(_, _) => DescriptorKind::Mapping,
            TypeDescriptor::Struct(_) => DescriptorKind::Struct,
            TypeDescriptor::TaggedUnion(_) => DescriptorKind::TaggedUnion,
            TypeDescriptor::Enum(_) => DescriptorKind::Enum,
            TypeDescriptor::Raw => DescriptorKind::Raw,
        }
    }
}

/// Produces a fresh default value each time it is invoked.
#[derive(Clone)]
pub struct DefaultFactory(Arc<dyn Fn() -> Value<'static> + Send + Sync>);

impl DefaultFactory {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn() -> Value<'static> + Send + Sync + 'static,
    {
        DefaultFactory(Arc::new(f))
    }

    pub fn produce(&self) -> Value<'static> {
        (self.0)()
    }
}

impl Debug for DefaultFactory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("DefaultFactory(..)")
    }
}

/// How to obtain a value for a field that is absent.
#[derive(Debug, Clone, Default)]
pub enum DefaultSpec {
    /// The field is required.
    #[default]
    NoDefault,
    Value(Value<'static>),
    Factory(DefaultFactory),
}

impl DefaultSpec {
    /// Produce a value for an absent field, if there is a default.
    pub fn resolve(&self) -> Option<Value<'static>> {
        match self {
            DefaultSpec::NoDefault => None,
            DefaultSpec::Value(v) => Some(v.clone()),
            DefaultSpec::Factory(factory) => Some(factory.produce()),
        }
    }

    /// Determine whether a value is equal to the default.
    pub fn is_default(&self, value: &Value<'_>) -> bool {
        match self {
            DefaultSpec::NoDefault => false,
            DefaultSpec::Value(v) => v == value,
            DefaultSpec::Factory(factory) => factory.produce() == *value,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub(crate) name: Arc<str>,
    pub(crate) ty: TypeDescriptor,
    pub(crate) required: bool,
    pub(crate) default: DefaultSpec,
}

impl FieldDescriptor {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The name as a shared string, for use as a key in a [`Record`].
    pub fn shared_name(&self) -> &Arc<str> {
        &self.name
    }

    pub fn ty(&self) -> &TypeDescriptor {
        &self.ty
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn default(&self) -> &DefaultSpec {
        &self.default
    }
}

/// The compiled form of a struct definition.
#[derive(Debug, Clone)]
pub struct StructDescriptor {
    pub(crate) name: Arc<str>,
    pub(crate) fields: Vec<FieldDescriptor>,
    pub(crate) index: HashMap<Arc<str>, usize>,
    pub(crate) array_like: bool,
    pub(crate) forbid_unknown_fields: bool,
    pub(crate) omit_defaults: bool,
}

impl StructDescriptor {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The fields in declaration order. This is the order in which they are encoded.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn is_array_like(&self) -> bool {
        self.array_like
    }

    pub fn forbids_unknown_fields(&self) -> bool {
        self.forbid_unknown_fields
    }

    pub fn omits_defaults(&self) -> bool {
        self.omit_defaults
    }
}

/// The representation of the discriminant of a tagged union on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagRepr {
    /// The discriminant is the leading entry of the map (keyed by the tag field) or the leading
    /// element of the array.
    #[default]
    Field,
    /// The whole union is written as a MessagePack extension with the given type. The payload is
    /// the discriminant followed by the body of the variant.
    Extension { type_id: i8 },
}

#[derive(Debug, Clone)]
pub struct UnionVariant {
    pub(crate) tag: Discriminant,
    pub(crate) schema: StructId,
}

impl UnionVariant {
    pub fn tag(&self) -> &Discriminant {
        &self.tag
    }

    pub fn schema(&self) -> StructId {
        self.schema
    }
}

/// The compiled form of a tagged union.
#[derive(Debug, Clone)]
pub struct UnionDescriptor {
    pub(crate) tag_field: Arc<str>,
    pub(crate) variants: Vec<UnionVariant>,
    pub(crate) by_str: HashMap<Arc<str>, usize>,
    pub(crate) by_int: HashMap<i64, usize>,
    pub(crate) repr: TagRepr,
    pub(crate) array_like: bool,
}

impl UnionDescriptor {
    pub fn tag_field(&self) -> &str {
        &self.tag_field
    }

    pub fn variants(&self) -> &[UnionVariant] {
        &self.variants
    }

    pub fn repr(&self) -> TagRepr {
        self.repr
    }

    /// Whether the variants are all array-like structs.
    pub fn is_array_like(&self) -> bool {
        self.array_like
    }

    pub fn variant_for_str(&self, tag: &str) -> Option<&UnionVariant> {
        self.by_str.get(tag).map(|i| &self.variants[*i])
    }

    pub fn variant_for_int(&self, tag: i64) -> Option<&UnionVariant> {
        self.by_int.get(&tag).map(|i| &self.variants[*i])
    }

    pub fn variant_for(&self, tag: &Discriminant) -> Option<&UnionVariant> {
        match tag {
            Discriminant::Str(s) => self.variant_for_str(s),
            Discriminant::Int(n) => self.variant_for_int(*n),
        }
    }
}

/// A closed set of permitted values. Enumerations are either entirely string or entirely integer
/// backed.
#[derive(Debug, Clone)]
pub struct EnumDescriptor {
    pub(crate) members: Vec<Discriminant>,
    pub(crate) strs: HashSet<Arc<str>>,
    pub(crate) ints: HashSet<i64>,
}

impl EnumDescriptor {
    pub fn members(&self) -> &[Discriminant] {
        &self.members
    }

    pub fn contains_str(&self, value: &str) -> bool {
        self.strs.contains(value)
    }

    pub fn contains_int(&self, value: i64) -> bool {
        self.ints.contains(&value)
    }
}

/// A compiled schema. The root descriptor describes the top level value and the structs that it
/// refers to are held in an arena, indexed by [`StructId`].
///
/// A schema is immutable. It can be shared (for example, in an [`Arc`]) by any number of threads
/// that are encoding and decoding concurrently.
#[derive(Debug, Clone)]
pub struct Schema {
    pub(crate) root: TypeDescriptor,
    pub(crate) structs: Vec<StructDescriptor>,
    pub(crate) names: HashMap<Arc<str>, StructId>,
}

impl Schema {
    pub fn root(&self) -> &TypeDescriptor {
        &self.root
    }

    /// Get the descriptor of a struct.
    ///
    /// # Panics
    /// If the ID was not produced by this schema.
    pub fn struct_descriptor(&self, id: StructId) -> &StructDescriptor {
        &self.structs[id.0]
    }

    pub fn lookup(&self, name: &str) -> Option<StructId> {
        self.names.get(name).copied()
    }

    pub fn structs(&self) -> impl Iterator<Item = (StructId, &StructDescriptor)> {
        self.structs
            .iter()
            .enumerate()
            .map(|(i, s)| (StructId(i), s))
    }

    pub fn num_structs(&self) -> usize {
        self.structs.len()
    }

    /// Determine whether a value matches a descriptor from this schema.
    pub fn conforms(&self, value: &Value<'_>, descriptor: &TypeDescriptor) -> bool {
        match (descriptor, value) {
            (TypeDescriptor::Raw, _) => true,
            (TypeDescriptor::Optional(_), Value::Nil) => true,
            (TypeDescriptor::Optional(inner), v) => self.conforms(v, inner),
            // Smaller unsigned values have a signed representation.
            (TypeDescriptor::Primitive(PrimitiveKind::Int), Value::UInt(n)) => *n > i64::MAX as u64,
            (TypeDescriptor::Primitive(kind), v) => matches!(
                (kind, v),
                (PrimitiveKind::Bool, Value::Bool(_))
                    | (PrimitiveKind::Int, Value::Int(_))
                    | (PrimitiveKind::Float, Value::Float(_))
                    | (PrimitiveKind::Str, Value::Text(_))
                    | (PrimitiveKind::Bytes, Value::Blob(_))
                    | (PrimitiveKind::Nil, Value::Nil)
            ),
            (TypeDescriptor::Sequence(element), Value::Seq(items)) => {
                items.iter().all(|item| self.conforms(item, element))
            }
            (TypeDescriptor::Mapping(key, val), Value::Map(entries)) => entries
                .iter()
                .all(|(k, v)| self.conforms(k, key) && self.conforms(v, val)),
            (TypeDescriptor::Struct(id), Value::Struct(record)) => {
                self.record_conforms(record, *id)
            }
            (TypeDescriptor::TaggedUnion(union), Value::Variant(variant)) => union
                .variant_for(&variant.tag)
                .map(|v| self.record_conforms(&variant.record, v.schema))
                .unwrap_or(false),
            (TypeDescriptor::Enum(members), Value::Text(s)) => members.contains_str(s),
            (TypeDescriptor::Enum(members), Value::Int(n)) => members.contains_int(*n),
            _ => false,
        }
    }

    fn record_conforms(&self, record: &Record<'_>, id: StructId) -> bool {
        let descriptor = self.struct_descriptor(id);
        record
            .fields()
            .all(|(name, _)| descriptor.field_index(name).is_some())
            && descriptor
                .fields
                .iter()
                .all(|field| match record.get(&field.name) {
                    Some(v) => self.conforms(v, &field.ty),
                    None => !field.required,
                })
    }
}

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

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Deserializer};
use typepack_model::{Discriminant, Value};

use crate::{DefaultFactory, TagRepr};

/// A declarative description of a schema: the type of the top level value and the structs that
/// may be referred to, by name, from any type in the definition (including from the fields of
/// the structs themselves).
///
/// # Example
///
/// ```
/// use typepack_schema::{FieldDef, SchemaDefinition, StructDef, TypeDef};
///
/// let definition = SchemaDefinition::new(TypeDef::reference("Node")).with_struct(
///     StructDef::new("Node")
///         .with_field(FieldDef::new("label", TypeDef::Str))
///         .with_field(FieldDef::new("children", TypeDef::seq(TypeDef::reference("Node")))),
/// );
/// assert!(typepack_schema::compile_schema(&definition).is_ok());
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct SchemaDefinition {
    pub root: TypeDef,
    #[serde(default)]
    pub structs: Vec<StructDef>,
}

impl SchemaDefinition {
    pub fn new(root: TypeDef) -> Self {
        SchemaDefinition {
            root,
            structs: vec![],
        }
    }

    pub fn with_struct(mut self, def: StructDef) -> Self {
        self.structs.push(def);
        self
    }
}

/// Description of the expected type of a value.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TypeDef {
    Bool,
    Int,
    Float,
    Str,
    Bytes,
    Nil,
    /// Any value, captured without being decoded.
    Any,
    Optional {
        inner: Box<TypeDef>,
    },
    Seq {
        element: Box<TypeDef>,
    },
    Map {
        key: Box<TypeDef>,
        value: Box<TypeDef>,
    },
    /// A reference to a struct, by name.
    Ref {
        name: String,
    },
    Union {
        tag_field: String,
        variants: Vec<VariantDef>,
        #[serde(default)]
        repr: TagRepr,
    },
    Enum {
        members: Vec<DiscriminantDef>,
    },
}

impl TypeDef {
    pub fn optional(inner: TypeDef) -> Self {
        TypeDef::Optional {
            inner: Box::new(inner),
        }
    }

    pub fn seq(element: TypeDef) -> Self {
        TypeDef::Seq {
            element: Box::new(element),
        }
    }

    pub fn map(key: TypeDef, value: TypeDef) -> Self {
        TypeDef::Map {
            key: Box::new(key),
            value: Box::new(value),
        }
    }

    pub fn reference<S: Into<String>>(name: S) -> Self {
        TypeDef::Ref { name: name.into() }
    }

    /// A union where the variant is identified by the field `tag_field`. Each variant is given
    /// as a pair of its discriminant and the name of the struct that it refers to.
    pub fn union<S, I, D, N>(tag_field: S, variants: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = (D, N)>,
        D: Into<DiscriminantDef>,
        N: Into<String>,
    {
        TypeDef::Union {
            tag_field: tag_field.into(),
            variants: variants
                .into_iter()
                .map(|(tag, schema)| VariantDef {
                    tag: tag.into(),
                    schema: schema.into(),
                })
                .collect(),
            repr: TagRepr::default(),
        }
    }

    /// Change the discriminant representation of a union definition. Has no effect on any other
    /// type.
    pub fn with_repr(self, repr: TagRepr) -> Self {
        match self {
            TypeDef::Union {
                tag_field,
                variants,
                ..
            } => TypeDef::Union {
                tag_field,
                variants,
                repr,
            },
            ow => ow,
        }
    }

    pub fn enumeration<I, D>(members: I) -> Self
    where
        I: IntoIterator<Item = D>,
        D: Into<DiscriminantDef>,
    {
        TypeDef::Enum {
            members: members.into_iter().map(Into::into).collect(),
        }
    }
}

/// A variant of a tagged union.
#[derive(Debug, Clone, Deserialize)]
pub struct VariantDef {
    pub tag: DiscriminantDef,
    /// The name of the struct definition for the variant.
    pub schema: String,
}

/// A union discriminant or enumeration member, as it appears in a definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(untagged)]
pub enum DiscriminantDef {
    Int(i64),
    Str(String),
}

impl From<&str> for DiscriminantDef {
    fn from(s: &str) -> Self {
        DiscriminantDef::Str(s.to_string())
    }
}

impl From<String> for DiscriminantDef {
    fn from(s: String) -> Self {
        DiscriminantDef::Str(s)
    }
}

impl From<i64> for DiscriminantDef {
    fn from(n: i64) -> Self {
        DiscriminantDef::Int(n)
    }
}

impl From<&DiscriminantDef> for Discriminant {
    fn from(def: &DiscriminantDef) -> Self {
        match def {
            DiscriminantDef::Int(n) => Discriminant::Int(*n),
            DiscriminantDef::Str(s) => Discriminant::Str(s.as_str().into()),
        }
    }
}

impl Display for DiscriminantDef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DiscriminantDef::Int(n) => write!(f, "{}", n),
            DiscriminantDef::Str(s) => write!(f, "{:?}", s),
        }
    }
}

/// Definition of a named struct.
#[derive(Debug, Clone, Deserialize)]
pub struct StructDef {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
    /// Encode instances as arrays of field values, in field order, rather than as maps.
    #[serde(default)]
    pub array_like: bool,
    /// Treat unknown fields (or surplus elements for array-like structs) as errors.
    #[serde(default)]
    pub forbid_unknown_fields: bool,
    /// Do not write fields that are equal to their default (map-like structs only).
    #[serde(default)]
    pub omit_defaults: bool,
}

impl StructDef {
    pub fn new<S: Into<String>>(name: S) -> Self {
        StructDef {
            name: name.into(),
            fields: vec![],
            array_like: false,
            forbid_unknown_fields: false,
            omit_defaults: false,
        }
    }

    pub fn with_field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    pub fn array_like(mut self) -> Self {
        self.array_like = true;
        self
    }

    pub fn forbid_unknown_fields(mut self) -> Self {
        self.forbid_unknown_fields = true;
        self
    }

    pub fn omit_defaults(mut self) -> Self {
        self.omit_defaults = true;
        self
    }
}

/// Definition of a field of a struct. A field without a default is required unless `required`
/// is explicitly `false`, in which case its type must admit nil.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeDef,
    #[serde(default, deserialize_with = "literal_default")]
    pub default: Option<DefaultDef>,
    #[serde(default)]
    pub required: Option<bool>,
}

impl FieldDef {
    pub fn new<S: Into<String>>(name: S, ty: TypeDef) -> Self {
        FieldDef {
            name: name.into(),
            ty,
            default: None,
            required: None,
        }
    }

    pub fn with_default<V: Into<Value<'static>>>(mut self, value: V) -> Self {
        self.default = Some(DefaultDef::Value(value.into()));
        self
    }

    /// Use a function to produce a fresh default each time one is required.
    pub fn with_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Value<'static> + Send + Sync + 'static,
    {
        self.default = Some(DefaultDef::Factory(DefaultFactory::new(factory)));
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }
}

/// The default of a field, as it appears in a definition.
#[derive(Debug, Clone)]
pub enum DefaultDef {
    Value(Value<'static>),
    Factory(DefaultFactory),
}

fn literal_default<'de, D>(deserializer: D) -> Result<Option<DefaultDef>, D::Error>
where
    D: Deserializer<'de>,
{
    let literal = Literal::deserialize(deserializer)?;
    Ok(Some(DefaultDef::Value(literal.into())))
}

/// Default values that can be written in a serialized definition.
#[derive(Deserialize)]
#[serde(untagged)]
enum Literal {
    Nil,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(String),
    Seq(Vec<Literal>),
    Map(BTreeMap<String, Literal>),
}

impl From<Literal> for Value<'static> {
    fn from(literal: Literal) -> Self {
        match literal {
            Literal::Nil => Value::Nil,
            Literal::Bool(b) => Value::Bool(b),
            Literal::Int(n) => Value::Int(n),
            Literal::UInt(n) => Value::from(n),
            Literal::Float(x) => Value::Float(x),
            Literal::Str(s) => Value::from(s),
            Literal::Seq(items) => Value::Seq(items.into_iter().map(Into::into).collect()),
            Literal::Map(entries) => Value::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| (Value::from(k), v.into()))
                    .collect(),
            ),
        }
    }
}

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

//! # Typepack Schemas
//!
//! A schema is described declaratively with a [`SchemaDefinition`]: a root type and a table of
//! named struct definitions that types may refer to by name. Definitions can be built in code
//! or deserialized with any [`serde`] format.
//!
//! [`compile_schema`] turns a definition into a [`Schema`]: an immutable tree of
//! [`TypeDescriptor`]s that the encoder and decoder walk. Structs are held in an arena within the
//! schema and are referred to by [`StructId`] so that structs may refer to themselves or to each
//! other. A compiled schema is `Send + Sync` and may be shared between any number of concurrent
//! encode and decode calls.

mod compile;
mod definition;
mod descriptor;
mod error;

pub use compile::compile_schema;
pub use definition::{
    DefaultDef, DiscriminantDef, FieldDef, SchemaDefinition, StructDef, TypeDef, VariantDef,
};
pub use descriptor::{
    DefaultFactory, DefaultSpec, DescriptorKind, EnumDescriptor, FieldDescriptor, PrimitiveKind,
    Schema, StructDescriptor, StructId, TagRepr, TypeDescriptor, UnionDescriptor, UnionVariant,
};
pub use error::SchemaError;

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

use thiserror::Error;

use crate::DescriptorKind;

/// Errors that can occur when compiling a [`crate::SchemaDefinition`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// Two struct definitions have the same name.
    #[error("The schema name '{0}' is defined more than once.")]
    DuplicateSchema(String),
    /// A reference to a struct that is not defined.
    #[error("No schema named '{0}' is defined.")]
    UnknownSchema(String),
    #[error("Field '{field}' occurs more than once in schema '{schema}'.")]
    DuplicateField { schema: String, field: String },
    /// A tagged union with no variants.
    #[error("The union tagged by '{0}' has no variants.")]
    EmptyUnion(String),
    #[error("The discriminant {tag} occurs more than once in the union tagged by '{tag_field}'.")]
    DuplicateDiscriminant { tag_field: String, tag: String },
    /// A variant of a map-like union has a field with the same name as the tag field.
    #[error("Schema '{schema}' has a field named '{field}' that collides with the tag of a union.")]
    TagFieldConflict { schema: String, field: String },
    /// Some of the variants of a union are array-like and some are map-like.
    #[error("The variants of the union tagged by '{0}' do not all have the same layout.")]
    MixedUnionLayout(String),
    #[error("Values of kind '{0}' cannot be used as mapping keys.")]
    UnsupportedKey(DescriptorKind),
    #[error("An enumeration has no members.")]
    EmptyEnum,
    #[error("The enumeration member {0} occurs more than once.")]
    DuplicateEnumMember(String),
    #[error("An enumeration has both string and integer members.")]
    MixedEnumMembers,
    /// A field that is not required has no default and its type does not admit nil.
    #[error("Field '{field}' of schema '{schema}' is not required but has no default.")]
    MissingDefault { schema: String, field: String },
    #[error("The default for field '{field}' of schema '{schema}' does not match its type.")]
    InvalidDefault { schema: String, field: String },
    #[error("Field '{field}' of schema '{schema}' is required but has a default.")]
    RequiredWithDefault { schema: String, field: String },
    /// A cycle of required struct fields means that no finite value of the schema exists.
    #[error("Schema '{0}' requires an instance of itself and can never be constructed.")]
    UninhabitedCycle(String),
}

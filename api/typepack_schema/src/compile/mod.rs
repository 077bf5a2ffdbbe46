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
use std::sync::Arc;

use tracing::debug;
use typepack_model::{Discriminant, Value};

use crate::definition::{DefaultDef, DiscriminantDef, FieldDef, StructDef, TypeDef, VariantDef};
use crate::descriptor::{
    DefaultSpec, EnumDescriptor, FieldDescriptor, PrimitiveKind, Schema, StructDescriptor,
    StructId, TagRepr, TypeDescriptor, UnionDescriptor, UnionVariant,
};
use crate::{SchemaDefinition, SchemaError};

#[cfg(test)]
mod tests;

/// Compile a schema definition.
///
/// Compilation happens in two passes. The first assigns an ID to the name of each struct
/// definition. The second compiles the types of the fields, resolving references to structs
/// by name, so a struct may refer to itself or to any other struct in the definition regardless
/// of the order in which they are defined. Defaults are checked against the types of their fields
/// once all structs have been compiled.
pub fn compile_schema(definition: &SchemaDefinition) -> Result<Schema, SchemaError> {
    let result = Compiler::new(definition).and_then(Compiler::compile);
    match &result {
        Ok(schema) => debug!(structs = schema.num_structs(), "Compiled schema."),
        Err(error) => debug!(error = %error, "Schema definition rejected."),
    }
    result
}

struct Compiler<'d> {
    definition: &'d SchemaDefinition,
    ids: HashMap<&'d str, StructId>,
}

impl<'d> Compiler<'d> {
    fn new(definition: &'d SchemaDefinition) -> Result<Self, SchemaError> {
        let mut ids = HashMap::with_capacity(definition.structs.len());
        for (i, def) in definition.structs.iter().enumerate() {
            if ids.insert(def.name.as_str(), StructId::new(i)).is_some() {
                return Err(SchemaError::DuplicateSchema(def.name.clone()));
            }
        }
        Ok(Compiler { definition, ids })
    }

    fn compile(self) -> Result<Schema, SchemaError> {
        let root = self.compile_type(&self.definition.root)?;
        let structs = self
            .definition
            .structs
            .iter()
            .map(|def| self.compile_struct(def))
            .collect::<Result<Vec<_>, _>>()?;
        let names = structs
            .iter()
            .enumerate()
            .map(|(i, s)| (s.name.clone(), StructId::new(i)))
            .collect();
        let schema = Schema {
            root,
            structs,
            names,
        };
        check_defaults(&schema)?;
        check_inhabited(&schema)?;
        Ok(schema)
    }

    fn struct_id(&self, name: &str) -> Result<StructId, SchemaError> {
        self.ids
            .get(name)
            .copied()
            .ok_or_else(|| SchemaError::UnknownSchema(name.to_string()))
    }

    fn struct_def(&self, id: StructId) -> &'d StructDef {
        &self.definition.structs[id.index()]
    }

    fn compile_struct(&self, def: &StructDef) -> Result<StructDescriptor, SchemaError> {
        let StructDef {
            name,
            fields,
            array_like,
            forbid_unknown_fields,
            omit_defaults,
        } = def;
        let mut index = HashMap::with_capacity(fields.len());
        let mut compiled = Vec::with_capacity(fields.len());
        for (i, field) in fields.iter().enumerate() {
            let descriptor = self.compile_field(name, field)?;
            if index.insert(descriptor.name.clone(), i).is_some() {
                return Err(SchemaError::DuplicateField {
                    schema: name.clone(),
                    field: field.name.clone(),
                });
            }
            compiled.push(descriptor);
        }
        Ok(StructDescriptor {
            name: name.as_str().into(),
            fields: compiled,
            index,
            array_like: *array_like,
            forbid_unknown_fields: *forbid_unknown_fields,
            omit_defaults: *omit_defaults,
        })
    }

    fn compile_field(&self, schema: &str, def: &FieldDef) -> Result<FieldDescriptor, SchemaError> {
        let ty = self.compile_type(&def.ty)?;
        let (required, default) = match (&def.default, def.required) {
            (None, None | Some(true)) => (true, DefaultSpec::NoDefault),
            (None, Some(false)) if ty.accepts_nil() => (false, DefaultSpec::Value(Value::Nil)),
            (None, Some(false)) => {
                return Err(SchemaError::MissingDefault {
                    schema: schema.to_string(),
                    field: def.name.clone(),
                })
            }
            (Some(_), Some(true)) => {
                return Err(SchemaError::RequiredWithDefault {
                    schema: schema.to_string(),
                    field: def.name.clone(),
                })
            }
            (Some(DefaultDef::Value(v)), _) => (false, DefaultSpec::Value(v.clone())),
            (Some(DefaultDef::Factory(f)), _) => (false, DefaultSpec::Factory(f.clone())),
        };
        Ok(FieldDescriptor {
            name: def.name.as_str().into(),
            ty,
            required,
            default,
        })
    }

    fn compile_type(&self, def: &TypeDef) -> Result<TypeDescriptor, SchemaError> {
        Ok(match def {
            TypeDef::Bool => TypeDescriptor::Primitive(PrimitiveKind::Bool),
            TypeDef::Int => TypeDescriptor::Primitive(PrimitiveKind::Int),
            TypeDef::Float => TypeDescriptor::Primitive(PrimitiveKind::Float),
            TypeDef::Str => TypeDescriptor::Primitive(PrimitiveKind::Str),
            TypeDef::Bytes => TypeDescriptor::Primitive(PrimitiveKind::Bytes),
            TypeDef::Nil => TypeDescriptor::Primitive(PrimitiveKind::Nil),
            TypeDef::Any => TypeDescriptor::Raw,
            TypeDef::Optional { inner } => TypeDescriptor::optional(self.compile_type(inner)?),
            TypeDef::Seq { element } => {
                TypeDescriptor::Sequence(Box::new(self.compile_type(element)?))
            }
            TypeDef::Map { key, value } => {
                let key = self.compile_type(key)?;
                match &key {
                    TypeDescriptor::Primitive(kind) if *kind != PrimitiveKind::Nil => {}
                    TypeDescriptor::Enum(_) => {}
                    ow => return Err(SchemaError::UnsupportedKey(ow.kind())),
                }
                TypeDescriptor::Mapping(Box::new(key), Box::new(self.compile_type(value)?))
            }
            TypeDef::Ref { name } => TypeDescriptor::Struct(self.struct_id(name)?),
            TypeDef::Union {
                tag_field,
                variants,
                repr,
            } => TypeDescriptor::TaggedUnion(Box::new(self.compile_union(
                tag_field, variants, *repr,
            )?)),
            TypeDef::Enum { members } => TypeDescriptor::Enum(compile_enum(members)?),
        })
    }

    fn compile_union(
        &self,
        tag_field: &str,
        variants: &[VariantDef],
        repr: TagRepr,
    ) -> Result<UnionDescriptor, SchemaError> {
        let mut compiled = Vec::with_capacity(variants.len());
        let mut by_str = HashMap::new();
        let mut by_int = HashMap::new();
        let mut layout = None;
        for (i, VariantDef { tag, schema }) in variants.iter().enumerate() {
            let id = self.struct_id(schema)?;
            let def = self.struct_def(id);
            match layout {
                Some(array_like) if array_like != def.array_like => {
                    return Err(SchemaError::MixedUnionLayout(tag_field.to_string()));
                }
                _ => layout = Some(def.array_like),
            }
            if !def.array_like && def.fields.iter().any(|f| f.name == tag_field) {
                return Err(SchemaError::TagFieldConflict {
                    schema: def.name.clone(),
                    field: tag_field.to_string(),
                });
            }
            let tag = Discriminant::from(tag);
            let is_new = match &tag {
                Discriminant::Str(s) => by_str.insert(s.clone(), i).is_none(),
                Discriminant::Int(n) => by_int.insert(*n, i).is_none(),
            };
            if !is_new {
                return Err(SchemaError::DuplicateDiscriminant {
                    tag_field: tag_field.to_string(),
                    tag: tag.to_string(),
                });
            }
            compiled.push(UnionVariant { tag, schema: id });
        }
        match layout {
            Some(array_like) => Ok(UnionDescriptor {
                tag_field: tag_field.into(),
                variants: compiled,
                by_str,
                by_int,
                repr,
                array_like,
            }),
            None => Err(SchemaError::EmptyUnion(tag_field.to_string())),
        }
    }
}

fn compile_enum(members: &[DiscriminantDef]) -> Result<EnumDescriptor, SchemaError> {
    let mut strs: HashSet<Arc<str>> = HashSet::new();
    let mut ints = HashSet::new();
    let mut compiled = Vec::with_capacity(members.len());
    for member in members {
        let is_new = match member {
            DiscriminantDef::Str(s) => strs.insert(s.as_str().into()),
            DiscriminantDef::Int(n) => ints.insert(*n),
        };
        if !is_new {
            return Err(SchemaError::DuplicateEnumMember(member.to_string()));
        }
        compiled.push(Discriminant::from(member));
    }
    if compiled.is_empty() {
        Err(SchemaError::EmptyEnum)
    } else if !strs.is_empty() && !ints.is_empty() {
        Err(SchemaError::MixedEnumMembers)
    } else {
        Ok(EnumDescriptor {
            members: compiled,
            strs,
            ints,
        })
    }
}

fn check_defaults(schema: &Schema) -> Result<(), SchemaError> {
    for (_, descriptor) in schema.structs() {
        for field in descriptor.fields() {
            if let DefaultSpec::Value(v) = field.default() {
                if !schema.conforms(v, field.ty()) {
                    return Err(SchemaError::InvalidDefault {
                        schema: descriptor.name().to_string(),
                        field: field.name().to_string(),
                    });
                }
            }
        }
    }
    Ok(())
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    Unvisited,
    InProgress,
    Done,
}

/// Reject schemas where following required fields that are directly of struct type leads back
/// to the starting struct. Sequences, mappings, optional and defaulted fields all admit a finite
/// value so they break such cycles.
fn check_inhabited(schema: &Schema) -> Result<(), SchemaError> {
    let edges = |id: StructId| {
        schema
            .struct_descriptor(id)
            .fields()
            .iter()
            .filter(|f| f.is_required())
            .filter_map(|f| match f.ty() {
                TypeDescriptor::Struct(target) => Some(*target),
                _ => None,
            })
            .collect::<Vec<_>>()
    };

    let mut state = vec![Visit::Unvisited; schema.num_structs()];
    for (start, _) in schema.structs() {
        if state[start.index()] != Visit::Unvisited {
            continue;
        }
        let mut stack = vec![(start, edges(start), 0usize)];
        state[start.index()] = Visit::InProgress;
        while let Some((id, targets, next)) = stack.last_mut() {
            if let Some(target) = targets.get(*next).copied() {
                *next += 1;
                match state[target.index()] {
                    Visit::InProgress => {
                        let name = schema.struct_descriptor(target).name().to_string();
                        return Err(SchemaError::UninhabitedCycle(name));
                    }
                    Visit::Unvisited => {
                        state[target.index()] = Visit::InProgress;
                        stack.push((target, edges(target), 0));
                    }
                    Visit::Done => {}
                }
            } else {
                state[id.index()] = Visit::Done;
                stack.pop();
            }
        }
    }
    Ok(())
}

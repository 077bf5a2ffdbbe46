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

use std::fmt::{Display, Formatter};

use typepack_model::Value;

#[cfg(test)]
mod tests;

/// A single step from a container to one of its children.
#[derive(Debug, Clone, Copy)]
pub enum Segment<'p> {
    Field(&'p str),
    Index(usize),
    Key(&'p Value<'p>),
}

/// The location, within the value being encoded or decoded, of the current position of the
/// traversal.
///
/// The context is a stack that lives on the call stack of the traversal: descending into a child
/// pushes a new frame that refers to its parent and the frame is popped when the child is
/// complete and it goes out of scope. Nothing is allocated unless a [`Path`] is requested, which
/// only happens when an error is reported.
#[derive(Debug, Clone, Copy)]
pub struct PathContext<'p> {
    parent: Option<&'p PathContext<'p>>,
    segment: Option<Segment<'p>>,
    depth: usize,
}

impl Default for PathContext<'_> {
    fn default() -> Self {
        PathContext::root()
    }
}

impl<'p> PathContext<'p> {
    pub fn root() -> Self {
        PathContext {
            parent: None,
            segment: None,
            depth: 0,
        }
    }

    /// Create the context for a child of the current position.
    pub fn push<'c>(&'c self, segment: Segment<'c>) -> PathContext<'c>
    where
        'p: 'c,
    {
        PathContext {
            parent: Some(self),
            segment: Some(segment),
            depth: self.depth + 1,
        }
    }

    pub fn field<'c>(&'c self, name: &'c str) -> PathContext<'c>
    where
        'p: 'c,
    {
        self.push(Segment::Field(name))
    }

    pub fn index<'c>(&'c self, index: usize) -> PathContext<'c>
    where
        'p: 'c,
    {
        self.push(Segment::Index(index))
    }

    pub fn key<'c>(&'c self, key: &'c Value<'c>) -> PathContext<'c>
    where
        'p: 'c,
    {
        self.push(Segment::Key(key))
    }

    /// The number of segments between the root and the current position.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Record the current position.
    pub fn snapshot(&self) -> Path {
        let mut segments = Vec::with_capacity(self.depth);
        let mut current = Some(self);
        while let Some(PathContext {
            parent, segment, ..
        }) = current
        {
            if let Some(segment) = segment {
                segments.push(PathSegment::from(segment));
            }
            current = *parent;
        }
        segments.reverse();
        Path(segments)
    }
}

/// An owned segment of a [`Path`]. Map keys are rendered as they would be displayed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Field(String),
    Index(usize),
    Key(String),
}

impl From<&Segment<'_>> for PathSegment {
    fn from(segment: &Segment<'_>) -> Self {
        match segment {
            Segment::Field(name) => PathSegment::Field(name.to_string()),
            Segment::Index(i) => PathSegment::Index(*i),
            Segment::Key(key) => PathSegment::Key(key.to_string()),
        }
    }
}

/// The path from the root of a value to the location of an error. The path of the root is the
/// empty string, fields are joined with '.' and sequence indices and map keys are written in
/// brackets. For example, `items[2].tags["a"]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Path(Vec<PathSegment>);

impl Path {
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl Display for Path {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Field(name) if i == 0 => f.write_str(name)?,
                PathSegment::Field(name) => write!(f, ".{}", name)?,
                PathSegment::Index(index) => write!(f, "[{}]", index)?,
                PathSegment::Key(key) => write!(f, "[{}]", key)?,
            }
        }
        Ok(())
    }
}

impl PartialEq<str> for Path {
    fn eq(&self, other: &str) -> bool {
        self.to_string() == other
    }
}

impl PartialEq<&str> for Path {
    fn eq(&self, other: &&str) -> bool {
        self.to_string() == *other
    }
}

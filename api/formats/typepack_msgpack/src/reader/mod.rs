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

use bytes::Buf;

use crate::error::DecodeErrorKind;

#[cfg(test)]
mod tests;

/// A cursor over a borrowed input buffer. Slices that are read from the input are borrowed from
/// it and are never copied.
///
/// All reads that consume input go through [`ByteReader::take`], which is the only place where
/// the bounds of the input are checked.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    input: &'a [u8],
    pos: usize,
    base: usize,
}

macro_rules! read_num {
    ($name:ident, $get:ident, $t:ty) => {
        pub fn $name(&mut self) -> Result<$t, DecodeErrorKind> {
            let mut bytes = self.take(std::mem::size_of::<$t>())?;
            Ok(bytes.$get())
        }
    };
}

impl<'a> ByteReader<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        ByteReader {
            input,
            pos: 0,
            base: 0,
        }
    }

    /// Create a reader over a region that starts at `base` within some larger input.
    pub fn at_offset(input: &'a [u8], base: usize) -> Self {
        ByteReader {
            input,
            pos: 0,
            base,
        }
    }

    /// The offset of the cursor from the start of the outermost input.
    pub fn position(&self) -> usize {
        self.base + self.pos
    }

    pub fn remaining(&self) -> usize {
        self.input.len() - self.pos
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    /// Get the next byte without consuming it.
    pub fn peek_tag(&self) -> Result<u8, DecodeErrorKind> {
        self.input
            .get(self.pos)
            .copied()
            .ok_or(DecodeErrorKind::TruncatedInput {
                needed: 1,
                remaining: 0,
            })
    }

    /// Consume exactly `n` bytes.
    pub fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeErrorKind> {
        let remaining = self.remaining();
        if n > remaining {
            Err(DecodeErrorKind::TruncatedInput {
                needed: n,
                remaining,
            })
        } else {
            let start = self.pos;
            self.pos += n;
            Ok(&self.input[start..self.pos])
        }
    }

    read_num!(read_u8, get_u8, u8);
    read_num!(read_u16, get_u16, u16);
    read_num!(read_u32, get_u32, u32);
    read_num!(read_u64, get_u64, u64);
    read_num!(read_i8, get_i8, i8);
    read_num!(read_i16, get_i16, i16);
    read_num!(read_i32, get_i32, i32);
    read_num!(read_i64, get_i64, i64);
    read_num!(read_f32, get_f32, f32);
    read_num!(read_f64, get_f64, f64);

    /// Consume `n` bytes and return a reader over them. Positions reported by the new reader
    /// are relative to the outermost input.
    pub fn sub_reader(&mut self, n: usize) -> Result<ByteReader<'a>, DecodeErrorKind> {
        let base = self.position();
        let input = self.take(n)?;
        Ok(ByteReader {
            input,
            pos: 0,
            base,
        })
    }

    /// Mark the current position so that everything consumed after it can be retrieved with
    /// [`ByteReader::consumed_since`].
    pub fn mark(&self) -> usize {
        self.pos
    }

    pub fn consumed_since(&self, mark: usize) -> &'a [u8] {
        self.input.get(mark..self.pos).unwrap_or_default()
    }
}

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

use std::io;
use std::io::Write;

use bytes::{BufMut, Bytes, BytesMut};


/// Append only sink for encoded bytes. When the buffer is full its capacity is (at least)
/// doubled so the cost of growth is amortized over the whole of an encoding.
///
/// Tokens are written into the buffer with `rmp::encode`, through its [`Write`] implementation,
/// which never fails.
#[derive(Debug, Default)]
pub struct OutputBuffer {
    bytes: BytesMut,
}

impl OutputBuffer {
    pub fn new() -> Self {
        OutputBuffer::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        OutputBuffer {
            bytes: BytesMut::with_capacity(capacity),
        }
    }

    /// Ensure that there is space for at least `n` more bytes.
    pub fn reserve(&mut self, n: usize) {
        let OutputBuffer { bytes } = self;
        let free = bytes.capacity() - bytes.len();
        if free < n {
            let grow_by = bytes.capacity().max(n - free);
            bytes.reserve(free + grow_by);
        }
    }

    pub fn append_bytes(&mut self, bytes: &[u8]) {
        self.reserve(bytes.len());
        self.bytes.put_slice(bytes);
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.bytes.capacity()
    }

    pub fn as_slice(&self) -> &[u8] {
        self.bytes.as_ref()
    }

    /// Discard everything written after the first `len` bytes.
    pub fn truncate(&mut self, len: usize) {
        self.bytes.truncate(len);
    }

    /// Consume the buffer, returning the bytes that were written.
    pub fn finish(self) -> Bytes {
        self.bytes.freeze()
    }
}

impl Write for OutputBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.append_bytes(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

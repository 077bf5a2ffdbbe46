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

pub const DEFAULT_MAX_DEPTH: usize = 256;
pub const DEFAULT_INITIAL_CAPACITY: usize = 64;

/// Configuration for decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoderConfig {
    /// Accept integers where a float is expected, converting them.
    pub int_to_float: bool,
    /// The maximum depth of nesting of containers.
    pub max_depth: usize,
}

impl DecoderConfig {
    const DEFAULT: DecoderConfig = DecoderConfig {
        int_to_float: true,
        max_depth: DEFAULT_MAX_DEPTH,
    };
}

impl Default for DecoderConfig {
    fn default() -> Self {
        DecoderConfig::DEFAULT
    }
}

/// Configuration for encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderConfig {
    /// Capacity of the buffer that is allocated for each encoding.
    pub initial_capacity: usize,
    /// The maximum depth of nesting of containers.
    pub max_depth: usize,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        EncoderConfig {
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

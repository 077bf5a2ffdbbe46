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

use super::ByteReader;
use crate::error::DecodeErrorKind;

#[test]
fn read_numbers() {
    let input = [0x01, 0x02, 0xff, 0xfe, 0x3f, 0xf0, 0, 0, 0, 0, 0, 0];
    let mut reader = ByteReader::new(&input);
    assert_eq!(reader.read_u16(), Ok(0x0102));
    assert_eq!(reader.read_i16(), Ok(-2));
    assert_eq!(reader.read_f64(), Ok(1.0));
    assert!(reader.is_exhausted());
}

#[test]
fn peek_does_not_consume() {
    let input = [0xc0];
    let mut reader = ByteReader::new(&input);
    assert_eq!(reader.peek_tag(), Ok(0xc0));
    assert_eq!(reader.position(), 0);
    assert_eq!(reader.read_u8(), Ok(0xc0));
    assert_eq!(
        reader.peek_tag(),
        Err(DecodeErrorKind::TruncatedInput {
            needed: 1,
            remaining: 0
        })
    );
}

#[test]
fn take_is_bounds_checked() {
    let input = b"abc";
    let mut reader = ByteReader::new(input);
    assert_eq!(reader.take(2), Ok(&b"ab"[..]));
    assert_eq!(
        reader.take(2),
        Err(DecodeErrorKind::TruncatedInput {
            needed: 2,
            remaining: 1
        })
    );
    assert_eq!(reader.position(), 2);
    assert_eq!(
        reader.take(usize::MAX),
        Err(DecodeErrorKind::TruncatedInput {
            needed: usize::MAX,
            remaining: 1
        })
    );
}

#[test]
fn take_borrows_input() {
    let input = b"hello".to_vec();
    let mut reader = ByteReader::new(&input);
    let slice = reader.take(5).expect("Read failed.");
    assert_eq!(slice.as_ptr(), input.as_ptr());
}

#[test]
fn sub_reader_positions() {
    let input = [1, 2, 3, 4, 5];
    let mut reader = ByteReader::new(&input);
    reader.read_u8().expect("Read failed.");
    let mut sub = reader.sub_reader(3).expect("Read failed.");
    assert_eq!(reader.position(), 4);
    assert_eq!(sub.position(), 1);
    assert_eq!(sub.read_u8(), Ok(2));
    assert_eq!(sub.position(), 2);
    assert_eq!(sub.remaining(), 2);
    assert!(sub.take(3).is_err());
}

#[test]
fn consumed_since_mark() {
    let input = [1, 2, 3, 4];
    let mut reader = ByteReader::new(&input);
    reader.read_u8().expect("Read failed.");
    let mark = reader.mark();
    reader.read_u16().expect("Read failed.");
    assert_eq!(reader.consumed_since(mark), &[2, 3]);
}

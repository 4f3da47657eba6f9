// Copyright 2025 eraflo
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

use super::{Reader, Writer};
use crate::error::{EngineError, EngineResult};

/// An in-memory stream backed by a `Vec<u8>`.
///
/// Writing past the end grows the buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStream {
    data: Vec<u8>,
    position: usize,
}

impl MemoryStream {
    /// Creates an empty stream.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps existing bytes, positioned at the start.
    pub fn from_bytes(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            position: 0,
        }
    }

    /// Borrows the whole buffer regardless of position.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Consumes the stream and returns its buffer.
    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }

    fn seek(&mut self, position: u64) -> EngineResult<()> {
        let len = self.data.len();
        match usize::try_from(position) {
            Ok(p) if p <= len => {
                self.position = p;
                Ok(())
            }
            _ => Err(EngineError::OutOfRange {
                index: position as usize,
                len,
            }),
        }
    }
}

impl Reader for MemoryStream {
    fn read(&mut self, buf: &mut [u8]) -> EngineResult<usize> {
        let available = &self.data[self.position..];
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        self.position += n;
        Ok(n)
    }

    fn position(&self) -> u64 {
        self.position as u64
    }

    fn set_position(&mut self, position: u64) -> EngineResult<()> {
        self.seek(position)
    }

    fn len(&self) -> u64 {
        self.data.len() as u64
    }
}

impl Writer for MemoryStream {
    fn write(&mut self, buf: &[u8]) -> EngineResult<usize> {
        let end = self.position + buf.len();
        if end > self.data.len() {
            self.data.resize(end, 0);
        }
        self.data[self.position..end].copy_from_slice(buf);
        self.position = end;
        Ok(buf.len())
    }

    fn flush(&mut self) -> EngineResult<()> {
        Ok(())
    }

    fn position(&self) -> u64 {
        self.position as u64
    }

    fn set_position(&mut self, position: u64) -> EngineResult<()> {
        self.seek(position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_advances_position_until_end() {
        let mut stream = MemoryStream::from_bytes(vec![1, 2, 3, 4, 5]);
        let mut buf = [0u8; 3];

        assert_eq!(stream.read(&mut buf).unwrap(), 3);
        assert_eq!(buf, [1, 2, 3]);
        assert_eq!(Reader::position(&stream), 3);

        assert_eq!(stream.read(&mut buf).unwrap(), 2);
        assert_eq!(&buf[..2], &[4, 5]);
        assert_eq!(stream.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn read_exact_fails_on_short_stream() {
        let mut stream = MemoryStream::from_bytes(vec![1, 2]);
        let mut buf = [0u8; 4];
        assert!(matches!(
            stream.read_exact(&mut buf),
            Err(EngineError::Io(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof
        ));
    }

    #[test]
    fn set_position_past_end_is_out_of_range() {
        let mut stream = MemoryStream::from_bytes(vec![0; 4]);
        assert!(Reader::set_position(&mut stream, 4).is_ok());
        assert!(matches!(
            Reader::set_position(&mut stream, 5),
            Err(EngineError::OutOfRange { index: 5, len: 4 })
        ));
    }

    #[test]
    fn write_overwrites_then_grows() {
        let mut stream = MemoryStream::from_bytes(vec![9, 9, 9]);
        Writer::set_position(&mut stream, 1).unwrap();
        stream.write_all(&[1, 2, 3]).unwrap();

        assert_eq!(stream.as_bytes(), &[9, 1, 2, 3]);
        assert_eq!(Writer::position(&stream), 4);

        Reader::set_position(&mut stream, 0).unwrap();
        assert_eq!(stream.read_to_end().unwrap(), vec![9, 1, 2, 3]);
    }
}

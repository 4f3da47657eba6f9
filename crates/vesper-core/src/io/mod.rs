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

//! Byte-oriented stream abstractions.
//!
//! Configuration and asset loaders consume data through [`Reader`] and
//! [`Writer`] so they never care whether the bytes come from disk or memory.

mod file;
mod memory;

pub use self::file::FileStream;
pub use self::memory::MemoryStream;

use crate::error::{EngineError, EngineResult};

/// A seekable source of bytes.
pub trait Reader {
    /// Reads up to `buf.len()` bytes, returning how many were read.
    /// `Ok(0)` means the end of the stream.
    fn read(&mut self, buf: &mut [u8]) -> EngineResult<usize>;

    /// Returns the current read position in bytes.
    fn position(&self) -> u64;

    /// Moves the read position. Positions past the end are rejected with
    /// [`EngineError::OutOfRange`].
    fn set_position(&mut self, position: u64) -> EngineResult<()>;

    /// Returns the total length of the stream in bytes.
    fn len(&self) -> u64;

    /// Returns `true` if the stream holds no bytes.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fills `buf` completely, failing if the stream ends first.
    fn read_exact(&mut self, mut buf: &mut [u8]) -> EngineResult<()> {
        while !buf.is_empty() {
            let n = self.read(buf)?;
            if n == 0 {
                return Err(EngineError::Io(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "stream ended before the buffer was filled",
                )));
            }
            buf = &mut buf[n..];
        }
        Ok(())
    }

    /// Reads everything from the current position to the end.
    fn read_to_end(&mut self) -> EngineResult<Vec<u8>> {
        let remaining = self.len().saturating_sub(self.position());
        let mut out = Vec::with_capacity(remaining as usize);
        let mut chunk = [0u8; 4096];
        loop {
            let n = self.read(&mut chunk)?;
            if n == 0 {
                break;
            }
            out.extend_from_slice(&chunk[..n]);
        }
        Ok(out)
    }
}

/// A seekable sink for bytes.
pub trait Writer {
    /// Writes up to `buf.len()` bytes, returning how many were written.
    fn write(&mut self, buf: &[u8]) -> EngineResult<usize>;

    /// Flushes buffered bytes to the underlying storage.
    fn flush(&mut self) -> EngineResult<()>;

    /// Returns the current write position in bytes.
    fn position(&self) -> u64;

    /// Moves the write position.
    fn set_position(&mut self, position: u64) -> EngineResult<()>;

    /// Writes all of `buf`.
    fn write_all(&mut self, mut buf: &[u8]) -> EngineResult<()> {
        while !buf.is_empty() {
            let n = self.write(buf)?;
            if n == 0 {
                return Err(EngineError::Io(std::io::Error::new(
                    std::io::ErrorKind::WriteZero,
                    "stream refused further bytes",
                )));
            }
            buf = &buf[n..];
        }
        Ok(())
    }
}

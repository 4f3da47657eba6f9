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
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

/// A stream over a file on disk.
#[derive(Debug)]
pub struct FileStream {
    file: File,
    position: u64,
}

impl FileStream {
    /// Opens an existing file for reading.
    pub fn open(path: impl AsRef<Path>) -> EngineResult<Self> {
        let file = File::open(path.as_ref())?;
        Ok(Self { file, position: 0 })
    }

    /// Creates (or truncates) a file for reading and writing.
    pub fn create(path: impl AsRef<Path>) -> EngineResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path.as_ref())?;
        Ok(Self { file, position: 0 })
    }

    fn file_len(&self) -> u64 {
        self.file.metadata().map(|m| m.len()).unwrap_or(0)
    }
}

impl Reader for FileStream {
    fn read(&mut self, buf: &mut [u8]) -> EngineResult<usize> {
        let n = self.file.read(buf)?;
        self.position += n as u64;
        Ok(n)
    }

    fn position(&self) -> u64 {
        self.position
    }

    fn set_position(&mut self, position: u64) -> EngineResult<()> {
        let len = self.file_len();
        if position > len {
            return Err(EngineError::OutOfRange {
                index: position as usize,
                len: len as usize,
            });
        }
        self.position = self.file.seek(SeekFrom::Start(position))?;
        Ok(())
    }

    fn len(&self) -> u64 {
        self.file_len()
    }
}

impl Writer for FileStream {
    fn write(&mut self, buf: &[u8]) -> EngineResult<usize> {
        let n = self.file.write(buf)?;
        self.position += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> EngineResult<()> {
        self.file.flush()?;
        Ok(())
    }

    fn position(&self) -> u64 {
        self.position
    }

    fn set_position(&mut self, position: u64) -> EngineResult<()> {
        // Files may be extended by seeking past the end before writing.
        self.position = self.file.seek(SeekFrom::Start(position))?;
        Ok(())
    }
}

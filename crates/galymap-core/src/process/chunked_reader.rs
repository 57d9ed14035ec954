//! Chunked memory reading and module image capture.
//!
//! Large regions are read in fixed-size chunks so one unreadable page only
//! costs its own chunk. [`ModuleImage`] uses this to take a local copy of the
//! game module that signature scans run against.

use tracing::{debug, info};

use super::ReadMemory;
use crate::error::{Error, Result};
use crate::process::value::ValueKind;

/// Default chunk size for memory reading (4MB).
pub const DEFAULT_CHUNK_SIZE: usize = 4 * 1024 * 1024;

/// A chunk of memory read from a process.
#[derive(Debug)]
pub struct MemoryChunk {
    /// Starting address of this chunk.
    pub address: u64,
    /// The actual bytes read.
    pub data: Vec<u8>,
}

/// Iterator that reads memory in fixed-size chunks.
///
/// Each item carries its own result so callers decide whether a failed chunk
/// aborts the pass or is skipped.
pub struct ChunkedMemoryIterator<'a, R: ReadMemory> {
    reader: &'a R,
    current: u64,
    end: u64,
    chunk_size: usize,
}

impl<'a, R: ReadMemory> ChunkedMemoryIterator<'a, R> {
    /// Create a new chunked memory iterator over `start..end`.
    pub fn new(reader: &'a R, start: u64, end: u64, chunk_size: usize) -> Self {
        Self {
            reader,
            current: start,
            end,
            chunk_size: chunk_size.max(1),
        }
    }

    /// Create a new chunked memory iterator with default chunk size.
    pub fn with_default_chunk_size(reader: &'a R, start: u64, end: u64) -> Self {
        Self::new(reader, start, end, DEFAULT_CHUNK_SIZE)
    }
}

impl<R: ReadMemory> Iterator for ChunkedMemoryIterator<'_, R> {
    type Item = (u64, usize, Result<MemoryChunk>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.current >= self.end {
            return None;
        }

        let read_size = self.chunk_size.min((self.end - self.current) as usize);
        let address = self.current;
        self.current += read_size as u64;

        let chunk = self
            .reader
            .read_bytes(address, read_size)
            .map(|data| MemoryChunk { address, data });
        Some((address, read_size, chunk))
    }
}

/// Local copy of the target's main module.
///
/// Captured once at attach time and immutable afterwards.
#[derive(Debug, Clone)]
pub struct ModuleImage {
    base: u64,
    bytes: Vec<u8>,
    unreadable_chunks: usize,
}

impl ModuleImage {
    /// Build an image from bytes already in hand.
    pub fn from_bytes(base: u64, bytes: Vec<u8>) -> Self {
        Self {
            base,
            bytes,
            unreadable_chunks: 0,
        }
    }

    /// Copy `size` bytes of the module mapped at `base`.
    ///
    /// Unreadable chunks are zero-filled. Fails only when nothing at all could
    /// be read.
    pub fn capture<R: ReadMemory>(
        reader: &R,
        base: u64,
        size: usize,
        chunk_size: usize,
    ) -> Result<Self> {
        let mut bytes = Vec::with_capacity(size);
        let mut unreadable_chunks = 0;
        let mut chunks = 0;

        let end = base + size as u64;
        for (address, len, chunk) in ChunkedMemoryIterator::new(reader, base, end, chunk_size) {
            chunks += 1;
            match chunk {
                Ok(chunk) => bytes.extend_from_slice(&chunk.data),
                Err(e) => {
                    debug!("Chunk at {:#x} unreadable, zero-filling: {}", address, e);
                    unreadable_chunks += 1;
                    bytes.resize(bytes.len() + len, 0);
                }
            }
        }

        if chunks > 0 && unreadable_chunks == chunks {
            return Err(Error::read_failed(
                base,
                ValueKind::Bytes(size),
                "no part of the module image was readable",
            ));
        }

        info!(
            "Captured module image: {:#x} bytes at {:#x} ({} unreadable chunks)",
            size, base, unreadable_chunks
        );
        Ok(Self {
            base,
            bytes,
            unreadable_chunks,
        })
    }

    pub fn base(&self) -> u64 {
        self.base
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn unreadable_chunks(&self) -> usize {
        self.unreadable_chunks
    }

    pub fn contains(&self, address: u64) -> bool {
        address >= self.base && address < self.base + self.bytes.len() as u64
    }

    /// Little-endian i32 at a module-relative offset.
    pub fn read_i32_at(&self, offset: usize) -> Result<i32> {
        let bytes = offset
            .checked_add(4)
            .and_then(|end| self.bytes.get(offset..end))
            .ok_or_else(|| {
                Error::read_failed(
                    self.base.wrapping_add(offset as u64),
                    ValueKind::I32,
                    "outside module image",
                )
            })?;
        Ok(i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }
}

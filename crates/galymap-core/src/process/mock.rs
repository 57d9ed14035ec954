//! In-memory stand-in for the game process.
//!
//! Provides an in-memory implementation of [`ReadMemory`] and [`WriteMemory`]
//! so decoders, walkers and the poll loop can be exercised without a game
//! process.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{Error, Result};
use crate::process::value::{StringEncoding, ValueKind};
use crate::process::{ReadMemory, WriteMemory};

/// A fake target process.
///
/// Reads from (and writes to) an in-memory buffer mapped at `base`. Calling
/// [`close`](Self::close) makes every later access fail, the way reads behave
/// once the game has exited.
#[derive(Debug)]
pub struct MockMemoryReader {
    data: Mutex<Vec<u8>>,
    base: u64,
    closed: AtomicBool,
}

impl MockMemoryReader {
    /// `data` mapped at 0x1000.
    pub fn new(data: Vec<u8>) -> Self {
        Self::with_base(data, 0x1000)
    }

    pub fn with_base(data: Vec<u8>, base: u64) -> Self {
        Self {
            data: Mutex::new(data),
            base,
            closed: AtomicBool::new(false),
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Simulate the target going away
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<u8>> {
        self.data
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn range(&self, address: u64, size: usize, len: usize) -> std::result::Result<usize, String> {
        if self.is_closed() {
            return Err("mock target closed".to_string());
        }
        if address < self.base {
            return Err(format!("Address below base (base=0x{:X})", self.base));
        }
        let offset = (address - self.base) as usize;
        match offset.checked_add(size) {
            Some(end) if end <= len => Ok(offset),
            _ => Err(format!(
                "Out of bounds: offset={}, size={}, len={}",
                offset, size, len
            )),
        }
    }
}

impl ReadMemory for MockMemoryReader {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        let data = self.lock();
        let offset = self
            .range(address, size, data.len())
            .map_err(|message| Error::read_failed(address, ValueKind::Bytes(size), message))?;
        Ok(data[offset..offset + size].to_vec())
    }

    fn base_address(&self) -> u64 {
        self.base
    }

    fn is_alive(&self) -> bool {
        !self.is_closed()
    }
}

impl WriteMemory for MockMemoryReader {
    fn write_bytes(&self, address: u64, bytes: &[u8]) -> Result<()> {
        let mut data = self.lock();
        let len = data.len();
        let offset = self
            .range(address, bytes.len(), len)
            .map_err(|message| {
                Error::write_failed(address, ValueKind::Bytes(bytes.len()), message)
            })?;
        data[offset..offset + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }
}

/// Lays out fake game structures byte by byte.
///
/// Every `write_*` takes an offset from the base address and grows the
/// buffer as needed, so fixtures only spell out the fields they care about.
#[derive(Debug, Clone, Default)]
pub struct MockMemoryBuilder {
    data: Vec<u8>,
    base: u64,
}

impl MockMemoryBuilder {
    pub fn new() -> Self {
        Self {
            data: Vec::new(),
            base: 0x1000,
        }
    }

    /// Map the buffer somewhere other than 0x1000.
    pub fn base(mut self, base: u64) -> Self {
        self.base = base;
        self
    }

    /// Zero-fill up to `size` bytes.
    pub fn with_size(mut self, size: usize) -> Self {
        self.data.resize(size, 0);
        self
    }

    pub fn write_u8(mut self, offset: usize, value: u8) -> Self {
        self.put(offset, &[value]);
        self
    }

    pub fn write_u16(mut self, offset: usize, value: u16) -> Self {
        self.put(offset, &value.to_le_bytes());
        self
    }

    pub fn write_i32(mut self, offset: usize, value: i32) -> Self {
        self.put(offset, &value.to_le_bytes());
        self
    }

    pub fn write_u32(mut self, offset: usize, value: u32) -> Self {
        self.put(offset, &value.to_le_bytes());
        self
    }

    /// Also used for pointers.
    pub fn write_u64(mut self, offset: usize, value: u64) -> Self {
        self.put(offset, &value.to_le_bytes());
        self
    }

    pub fn write_bytes(mut self, offset: usize, bytes: &[u8]) -> Self {
        self.put(offset, bytes);
        self
    }

    /// NUL-terminated.
    pub fn write_utf8(self, offset: usize, text: &str) -> Self {
        self.write_string(offset, text, StringEncoding::Utf8)
    }

    pub fn write_string(mut self, offset: usize, text: &str, encoding: StringEncoding) -> Self {
        // Test fixtures only use representable text.
        let bytes = encoding.encode(text).unwrap_or_default();
        self.put(offset, &bytes);
        self
    }

    /// Current absolute address of `offset`
    pub fn address(&self, offset: usize) -> u64 {
        self.base + offset as u64
    }

    pub fn build(self) -> MockMemoryReader {
        MockMemoryReader::with_base(self.data, self.base)
    }

    fn put(&mut self, offset: usize, bytes: &[u8]) {
        let end = offset + bytes.len();
        if self.data.len() < end {
            self.data.resize(end, 0);
        }
        self.data[offset..end].copy_from_slice(bytes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_little_endian_at_default_base() {
        let reader = MockMemoryReader::new(vec![0x2a, 0x00, 0x00, 0x00]);

        assert_eq!(reader.base_address(), 0x1000);
        assert_eq!(reader.read_u32(0x1000).unwrap(), 42);
    }

    #[test]
    fn test_reads_at_module_base() {
        let reader = MockMemoryReader::with_base(vec![0xaa, 0xbb], 0x7ff6_0000_0000);

        let bytes = reader.read_bytes(0x7ff6_0000_0001, 1).unwrap();
        assert_eq!(bytes, vec![0xbb]);
    }

    #[test]
    fn test_read_past_end_is_transport_error() {
        let reader = MockMemoryReader::new(vec![0x01, 0x02]);

        let result = reader.read_u32(0x1000);
        assert!(matches!(result, Err(Error::Transport { .. })));
    }

    #[test]
    fn test_read_before_base_fails() {
        let reader = MockMemoryReader::with_base(vec![0; 4], 0x2000);

        assert!(reader.read_u8(0x1fff).is_err());
    }

    #[test]
    fn test_closed_reader_fails_every_access() {
        let reader = MockMemoryReader::new(vec![0; 16]);
        assert!(reader.is_alive());

        reader.close();

        assert!(!reader.is_alive());
        assert!(reader.read_u32(0x1000).is_err());
        assert!(reader.write_u32(0x1000, 1).is_err());
    }

    #[test]
    fn test_write_out_of_bounds() {
        let reader = MockMemoryReader::new(vec![0; 4]);

        let result = reader.write_u64(0x1000, 1);
        assert!(matches!(result, Err(Error::Transport { .. })));
        assert_eq!(reader.read_u32(0x1000).unwrap(), 0);
    }

    #[test]
    fn test_builder_lays_out_pointer_and_fields() {
        // a unit record pointing at a path record
        let builder = MockMemoryBuilder::new()
            .write_u32(0x00, 0)
            .write_u32(0x08, 1001)
            .write_u64(0x38, 0x1000 + 0x80)
            .write_u16(0x80 + 0x02, 5123);
        assert_eq!(builder.address(0x80), 0x1080);
        let reader = builder.build();

        assert_eq!(reader.read_u32(0x1008).unwrap(), 1001);
        let path = reader.read_u64(0x1038).unwrap();
        assert_eq!(reader.read_u16(path + 0x02).unwrap(), 5123);
    }

    #[test]
    fn test_builder_zero_fills_to_size() {
        let reader = MockMemoryBuilder::new()
            .with_size(0x100)
            .write_u8(0x10, 7)
            .build();

        assert_eq!(reader.len(), 0x100);
        assert_eq!(reader.read_u8(0x10ff).unwrap(), 0);
        assert_eq!(reader.read_u8(0x1010).unwrap(), 7);
    }

    #[test]
    fn test_builder_player_name() {
        let reader = MockMemoryBuilder::new()
            .with_size(16)
            .write_utf8(0, "Sorc")
            .build();

        assert_eq!(reader.read_string_utf8(0x1000, 16).unwrap(), "Sorc");
    }
}

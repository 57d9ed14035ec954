#![cfg_attr(not(target_os = "windows"), allow(dead_code, unused_variables))]

use tracing::trace;

use crate::error::{Error, Result};
use crate::process::ProcessHandle;
use crate::process::layout::{Field, Record, RecordLayout};
use crate::process::value::{FromValue, StringEncoding, TypedValue, ValueKind};

#[cfg(target_os = "windows")]
use windows::Win32::System::Diagnostics::Debug::{ReadProcessMemory, WriteProcessMemory};

/// Trait for reading memory from a process or buffer
///
/// This trait enables mocking for tests and abstracts over different memory sources.
pub trait ReadMemory {
    /// Read raw bytes from memory at the given address
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>>;

    /// Load base of the main module
    fn base_address(&self) -> u64;

    /// Whether the underlying target still answers reads
    fn is_alive(&self) -> bool {
        true
    }

    /// Absolute address of a module-relative offset
    fn module_address(&self, offset: u64) -> u64 {
        self.base_address().wrapping_add(offset)
    }

    /// Read one value of the declared kind
    fn read(&self, address: u64, kind: ValueKind) -> Result<TypedValue> {
        let bytes = self
            .read_bytes(address, kind.size())
            .map_err(|e| e.with_kind(kind))?;
        TypedValue::decode(kind, &bytes).map_err(|e| match e {
            Error::EncodingError(message) => Error::decode(address, message),
            other => other,
        })
    }

    /// Read a value whose kind is fixed by the Rust type
    fn read_as<T: FromValue>(&self, address: u64) -> Result<T> {
        let value = self.read(address, T::KIND)?;
        let found = value.kind_name();
        value
            .extract()
            .ok_or_else(|| Error::decode(address, format!("expected {}, got {}", T::KIND, found)))
    }

    /// Read a single field of a record that lives at `base`
    fn read_field<T: FromValue>(&self, base: u64, field: Field) -> Result<T> {
        if field.kind != T::KIND {
            return Err(Error::decode(
                base,
                format!("field {} is {}, not {}", field.name, field.kind, T::KIND),
            ));
        }
        self.read_as(field.address(base))
    }

    /// Read a string field of a record that lives at `base`
    fn read_string_field(&self, base: u64, field: Field) -> Result<String> {
        match self.read(field.address(base), field.kind)? {
            TypedValue::String(text) => Ok(text),
            other => Err(Error::decode(
                base,
                format!("field {} is {}, not a string", field.name, other.kind_name()),
            )),
        }
    }

    /// Read a whole record in one round trip
    fn read_record(&self, address: u64, layout: &'static RecordLayout) -> Result<Record> {
        let bytes = self
            .read_bytes(address, layout.size)
            .map_err(|e| e.with_kind(ValueKind::Bytes(layout.size)))?;
        Record::new(address, layout, bytes)
    }

    fn read_u8(&self, address: u64) -> Result<u8> {
        self.read_as(address)
    }

    fn read_u16(&self, address: u64) -> Result<u16> {
        self.read_as(address)
    }

    fn read_i32(&self, address: u64) -> Result<i32> {
        self.read_as(address)
    }

    fn read_u32(&self, address: u64) -> Result<u32> {
        self.read_as(address)
    }

    fn read_u64(&self, address: u64) -> Result<u64> {
        self.read_as(address)
    }

    /// Read a 64-bit pointer
    fn read_pointer(&self, address: u64) -> Result<u64> {
        self.read_u64(address)
    }

    /// Follow a pointer chain and return the final address
    ///
    /// Each hop reads a pointer at the current address and adds the next
    /// offset. The first unreadable or null hop fails the whole chain; an
    /// empty offset list returns `address` unchanged.
    fn read_pointer_chain(&self, address: u64, offsets: &[i64]) -> Result<u64> {
        let mut current = address;
        for (hop, &offset) in offsets.iter().enumerate() {
            let pointer = self.read_pointer(current)?;
            if pointer == 0 {
                return Err(Error::decode(
                    current,
                    format!("null pointer at hop {} of {}", hop, offsets.len()),
                ));
            }
            current = pointer.wrapping_add_signed(offset);
            trace!("chain hop {}: {:#x} -> {:#x}", hop, pointer, current);
        }
        Ok(current)
    }

    /// Follow a pointer chain and read a value at its end
    fn read_chain(&self, address: u64, offsets: &[i64], kind: ValueKind) -> Result<TypedValue> {
        let target = self.read_pointer_chain(address, offsets)?;
        self.read(target, kind)
    }

    /// Read a NUL-terminated string from a buffer of `max_len` bytes
    fn read_string(&self, address: u64, max_len: usize, encoding: StringEncoding) -> Result<String> {
        let kind = ValueKind::String { max_len, encoding };
        match self.read(address, kind)? {
            TypedValue::String(text) => Ok(text),
            other => Err(Error::decode(
                address,
                format!("expected string, got {}", other.kind_name()),
            )),
        }
    }

    /// Read a UTF-8 encoded string from memory
    fn read_string_utf8(&self, address: u64, max_len: usize) -> Result<String> {
        self.read_string(address, max_len, StringEncoding::Utf8)
    }
}

/// Trait for writing memory into a process or buffer
pub trait WriteMemory {
    fn write_bytes(&self, address: u64, data: &[u8]) -> Result<()>;

    /// Write a scalar or raw byte value
    fn write(&self, address: u64, value: &TypedValue) -> Result<()> {
        let bytes = value
            .to_le_bytes()
            .map_err(|e| Error::write_failed(address, ValueKind::Bytes(0), e.to_string()))?;
        let kind = ValueKind::Bytes(bytes.len());
        self.write_bytes(address, &bytes).map_err(|e| e.with_kind(kind))
    }

    /// Write a NUL-terminated string, refusing to overflow `max_len`
    fn write_string(
        &self,
        address: u64,
        text: &str,
        max_len: usize,
        encoding: StringEncoding,
    ) -> Result<()> {
        let kind = ValueKind::String { max_len, encoding };
        let bytes = encoding.encode(text)?;
        if bytes.len() > max_len {
            return Err(Error::write_failed(
                address,
                kind,
                format!("encoded length {} exceeds buffer", bytes.len()),
            ));
        }
        self.write_bytes(address, &bytes).map_err(|e| e.with_kind(kind))
    }

    fn write_u32(&self, address: u64, value: u32) -> Result<()> {
        self.write(address, &TypedValue::U32(value))
    }

    fn write_u64(&self, address: u64, value: u64) -> Result<()> {
        self.write(address, &TypedValue::U64(value))
    }
}

/// Reads and writes the memory of an opened game process.
pub struct RemoteAccessor<'a> {
    process: &'a ProcessHandle,
}

impl<'a> RemoteAccessor<'a> {
    pub fn new(process: &'a ProcessHandle) -> Self {
        Self { process }
    }

    pub fn process(&self) -> &ProcessHandle {
        self.process
    }

    fn ensure_open(&self, address: u64, size: usize) -> Result<()> {
        if self.process.is_closed() {
            return Err(Error::read_failed(
                address,
                ValueKind::Bytes(size),
                "process handle is closed",
            ));
        }
        Ok(())
    }

    #[cfg(target_os = "windows")]
    fn read_bytes_impl(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        self.ensure_open(address, size)?;
        let mut buffer = vec![0u8; size];
        let mut bytes_read = 0;

        // SAFETY: ReadProcessMemory is called with:
        // - A live handle from ProcessHandle (opened with PROCESS_VM_READ, not yet closed)
        // - A properly allocated buffer of the requested size
        // - A pointer to receive the actual bytes read
        // An invalid remote address makes the call fail, which is handled via Result.
        unsafe {
            ReadProcessMemory(
                self.process.handle(),
                address as *const _,
                buffer.as_mut_ptr() as *mut _,
                size,
                Some(&mut bytes_read),
            )
            .map_err(|e| Error::read_failed(address, ValueKind::Bytes(size), e.to_string()))?;
        }

        // Partial reads are errors: a truncated record cannot be decoded.
        if bytes_read != size {
            return Err(Error::read_failed(
                address,
                ValueKind::Bytes(size),
                format!("Expected {} bytes, read {}", size, bytes_read),
            ));
        }

        Ok(buffer)
    }

    #[cfg(not(target_os = "windows"))]
    fn read_bytes_impl(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        self.ensure_open(address, size)?;
        Err(Error::read_failed(
            address,
            ValueKind::Bytes(size),
            "Windows only: memory reading not supported on this platform",
        ))
    }

    #[cfg(target_os = "windows")]
    fn write_bytes_impl(&self, address: u64, data: &[u8]) -> Result<()> {
        self.ensure_open(address, data.len())
            .map_err(|_| Error::write_failed(address, ValueKind::Bytes(data.len()), "process handle is closed"))?;
        let mut written = 0;

        // SAFETY: WriteProcessMemory is called with a live handle opened with
        // PROCESS_VM_WRITE | PROCESS_VM_OPERATION and a source buffer of data.len() bytes.
        unsafe {
            WriteProcessMemory(
                self.process.handle(),
                address as *const _,
                data.as_ptr() as *const _,
                data.len(),
                Some(&mut written),
            )
            .map_err(|e| Error::write_failed(address, ValueKind::Bytes(data.len()), e.to_string()))?;
        }

        if written != data.len() {
            return Err(Error::write_failed(
                address,
                ValueKind::Bytes(data.len()),
                format!("Expected {} bytes, wrote {}", data.len(), written),
            ));
        }
        Ok(())
    }

    #[cfg(not(target_os = "windows"))]
    fn write_bytes_impl(&self, address: u64, data: &[u8]) -> Result<()> {
        Err(Error::write_failed(
            address,
            ValueKind::Bytes(data.len()),
            "Windows only: memory writing not supported on this platform",
        ))
    }
}

impl ReadMemory for RemoteAccessor<'_> {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        self.read_bytes_impl(address, size)
    }

    fn base_address(&self) -> u64 {
        self.process.base_address
    }

    fn is_alive(&self) -> bool {
        !self.process.is_closed() && self.process.is_alive()
    }
}

impl WriteMemory for RemoteAccessor<'_> {
    fn write_bytes(&self, address: u64, data: &[u8]) -> Result<()> {
        self.write_bytes_impl(address, data)
    }
}

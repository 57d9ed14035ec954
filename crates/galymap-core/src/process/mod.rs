pub mod chunked_reader;
mod handle;
pub mod layout;
pub mod pattern;
pub mod provider;
mod reader;
pub mod value;

// Mock memory reader for testing (always available for unit and integration tests)
#[doc(hidden)]
pub mod mock;

pub use chunked_reader::{ChunkedMemoryIterator, DEFAULT_CHUNK_SIZE, MemoryChunk, ModuleImage};
pub use handle::*;
pub use layout::{Field, Record, RecordLayout};
pub use pattern::Pattern;
pub use provider::{ProcessInfo, ProcessProvider, SystemProcessProvider};
pub use reader::{ReadMemory, RemoteAccessor, WriteMemory};
pub use value::{FromValue, StringEncoding, TypedValue, ValueKind};

// Re-export mock for convenient access in tests
#[doc(hidden)]
pub use mock::{MockMemoryBuilder, MockMemoryReader};

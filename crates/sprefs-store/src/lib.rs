//! sprefs-store: encrypted preference storage
//!
//! [`SecurePreferences`] wraps any [`StorageProvider`] and exposes a typed
//! key-value API. Keys reach the provider hashed, values encrypted:
//!
//! ```text
//! "Foo" ──obfuscate──▶ "i8rRT...="            (storage key)
//! "Bar" ──encrypt────▶ "iv:mac:ciphertext"    (storage value)
//! ```
//!
//! Two providers ship with the crate: [`MemoryProvider`] for tests and
//! embedding, and [`JsonFileProvider`] which persists to a JSON file with
//! atomic replace.

pub mod file;
pub mod memory;
pub mod provider;
pub mod secure;
pub mod value;

pub use file::JsonFileProvider;
pub use memory::MemoryProvider;
pub use provider::{Batch, BatchOp, ChangeListener, ListenerRegistry, StorageProvider, StoreChange, Value};
pub use secure::{Editor, SecurePreferences};
pub use value::{PrefValue, TypeParseError};

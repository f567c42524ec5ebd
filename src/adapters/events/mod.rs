//! Event publication adapters.
//!
//! - `InMemoryEventBus` - in-process capture of lifecycle events

mod in_memory;

pub use in_memory::InMemoryEventBus;

//! In-memory backend for the Agora forum store.
//!
//! All entities live in per-type maps behind a single mutex; nothing is
//! persisted. Process restart discards all data — accepted, not a bug,
//! for this deployment model.

mod store;

pub use store::MemoryStore;

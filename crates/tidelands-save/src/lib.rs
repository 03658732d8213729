//! Persistence layer: snapshot proxies and the durable save store.
//!
//! Proxies are immutable value copies of live state taken at save or evict
//! time. They never back-reference the objects they were copied from and
//! carry only what is needed to reconstruct equivalent state; physics
//! bodies, caches, and other derived data are excluded by construction.

pub mod proxy;
pub mod store;

pub use proxy::{ChunkProxy, ObjectProxy, WorldProxy};
pub use store::SaveStore;

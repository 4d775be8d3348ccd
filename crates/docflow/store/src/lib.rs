//! Storage Abstraction for Docflow
//!
//! The engine assumes a shared, multiply-accessed durable store with
//! atomic read-modify-write support scoped to a single logical operation.
//! This crate defines that seam as `async` traits plus the write payload
//! for the one compound operation the engine needs — resolving an
//! approval task — and ships a deterministic in-memory adapter.
//!
//! Production deployments put a transactional backend (e.g. PostgreSQL)
//! behind the same traits; [`InMemoryStore`] is the reference semantics
//! and the test harness.

#![deny(unsafe_code)]

mod error;
mod memory;
mod model;
mod traits;

pub use error::{StoreError, StoreResult};
pub use memory::InMemoryStore;
pub use model::TaskResolution;
pub use traits::{Directory, DocumentStore, EngineStore, GraphStore, TaskStore};

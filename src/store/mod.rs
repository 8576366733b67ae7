//! Durable hierarchy storage.
//!
//! The classifier writes resolved class nodes here so repeated lookups of the
//! same or sibling classes never hit the knowledge graph again.
//!
//! - [`PostgresStore`] - durable, shared between processes
//! - [`MemoryStore`] - process-local, with write counters for tests

mod memory;
mod postgres;
mod traits;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;
pub use traits::HierarchyStore;

//! Knowledge-graph access.
//!
//! The classifier only depends on the [`GraphClient`] capability trait, so
//! the same engine runs against the live Wikidata API or an in-memory graph.
//!
//! - [`WikidataClient`] - batched `wbgetentities` calls over HTTP
//! - [`MemoryGraph`] - fixtures and tests, with call counters

mod memory;
mod traits;
mod wikidata;

pub use memory::MemoryGraph;
pub use traits::{ClaimsBatch, EntityClaims, GraphClient, Relation};
pub use wikidata::WikidataClient;

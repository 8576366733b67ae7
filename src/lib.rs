//! Taxoclass - hierarchy classification over a knowledge graph
//!
//! Maps knowledge-graph identifiers to a small set of configured categories
//! by walking "instance of" and "subclass of" relations, caching verdicts for
//! intermediate classes in a durable store.

pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod graph;
pub mod migrations;
pub mod models;
pub mod services;
pub mod store;

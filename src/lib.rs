//! Transcript Corpus Library
//!
//! This library exposes the internal modules for testing and for the binaries.

pub mod aggregator;
pub mod analysis;
pub mod components;
pub mod config;
pub mod corpus;
pub mod import;
pub mod query;
pub mod repository;
pub mod server;
pub mod source;
pub mod stats_store;

// Re-export commonly used types for convenience
pub use components::CorpusComponents;
pub use import::{ImportError, ImportManager, ImportObserver, ImportPhase, ImportSummary};
pub use query::{CorpusStats, QueryCache};
pub use server::{make_app, run_server, RequestsLoggingLevel, ServerConfig};

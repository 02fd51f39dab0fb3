// Fundscout - Discovery Core
//
// This crate runs the funding-opportunity discovery pipeline: scheduled
// multi-engine web searches, anti-spam filtering, deduplication, and
// confidence-based candidate classification.
//
// Domain logic lives in domains/discovery/; infrastructure (search engine
// clients, storage adapters, trait seams) lives in kernel/.

pub mod config;
pub mod domains;
pub mod kernel;

pub use config::*;

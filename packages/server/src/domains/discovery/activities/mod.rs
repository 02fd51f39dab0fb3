//! Discovery domain activities
//!
//! Business logic for the discovery pipeline:
//! - `workflow`: session driver (categories -> queries -> orchestrator -> pipeline)
//! - `orchestrator`: concurrent multi-engine fan-out with partial-failure semantics
//! - `pipeline`: per-result filtering, dedup, scoring, classification
//! - `classifier`: confidence threshold -> candidate disposition
//! - `registry`: domain registry helpers (retry backoff, requeue)
//! - `session_state`: lock-guarded per-session dedup set and statistics

pub mod classifier;
pub mod orchestrator;
pub mod pipeline;
pub mod registry;
pub mod session_state;
pub mod workflow;

pub use classifier::*;
pub use orchestrator::*;
pub use pipeline::*;
pub use registry::*;
pub use session_state::*;
pub use workflow::*;

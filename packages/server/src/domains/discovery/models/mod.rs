//! Discovery domain models.
//!
//! ALL SQL for the discovery tables lives here, as static methods on the
//! model structs.

pub mod candidate;
pub mod category;
pub mod discovery_result;
pub mod discovery_session;
pub mod domain;
pub mod provider_usage;

pub use candidate::*;
pub use category::*;
pub use discovery_result::*;
pub use discovery_session::*;
pub use domain::*;
pub use provider_usage::*;

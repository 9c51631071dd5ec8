//! Job store abstraction.
//!
//! The store is the single source of truth for job state; every status
//! mutation flows through it. Persistence backends are collaborators
//! behind the [`JobStore`] trait; [`MemoryJobStore`] is the in-process
//! implementation used by the worker loop and tests.

pub mod error;
pub mod memory;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryJobStore;
pub use store::JobStore;

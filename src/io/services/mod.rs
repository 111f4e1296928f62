//! Persistence service implementations.
//!
//! Orchestrates format selection, file guarding, and codec dispatch.

pub mod store;

pub use store::{MechanismStore, SaveOptions, SaveResult};

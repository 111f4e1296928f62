//! Data models for mechstore.
//!
//! A [`Mechanism`] is an ordered [`Mapping`] from field names to [`Value`]s.
//! Values are a closed sum type so both persistence formats can match on the
//! shape of the data instead of inspecting it at runtime.

mod array;
mod mapping;
mod value;

pub use array::{ArrayData, DType, NdArray};
pub use mapping::Mapping;
pub use value::{MAX_DEPTH, Number, Value};

/// One record in a persisted collection.
pub type Mechanism = Mapping;

/// An ordered sequence of mechanisms. Order is preserved across save/load.
pub type MechanismCollection = Vec<Mechanism>;

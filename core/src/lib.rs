//! Core utilities and shared types for the scan aggregation engine.

mod date;
mod error;
pub mod keylock;
mod model;
mod ordered;

pub use date::DateKey;
pub use error::QueryError;
pub use model::*;
pub use ordered::{OrderedCounts, OrderedMap};

pub const fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

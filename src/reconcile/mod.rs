//! Reconcile module - Runs the engine across many tables against a metadata
//! source and a statement executor.
//!
//! Tables are independent: a table that cannot be read, fails validation or
//! fails to apply is reported and the remaining tables carry on.

mod executor;
mod reconciler;
mod snapshot;
mod source;

#[cfg(test)]
mod reconcile_test;

pub use executor::*;
pub use reconciler::*;
pub use snapshot::*;
pub use source::*;

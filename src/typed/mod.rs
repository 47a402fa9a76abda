//! Typed module - Property trees normalized against a schema.
//!
//! This module provides coercion of raw values into typed property values,
//! default filling, and export back into raw documents.

mod export;
mod normalizer;
mod property_value;
mod validation;


pub use export::*;
pub use normalizer::*;
pub use property_value::*;
pub use validation::*;

pub(crate) use property_value::quote;

//! Field path module - Names properties inside nested property trees.

mod path;

pub use path::*;

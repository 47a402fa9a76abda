//! Diff module - Property changes between desired and observed tables, and
//! the statements that converge them.

mod change;
mod cql;
mod differ;
mod statement;



pub use change::*;
pub use cql::{render_statement, render_value};
pub use differ::*;
pub use statement::*;

//! Core domain entities
//!
//! Pure data structures shared by the pipeline stages. No I/O and no
//! external service dependencies live here.

pub mod result;
pub mod rules;
mod table;
mod transaction;

pub use result::{Error, Result};
pub use rules::CategoryRules;
pub use table::{Cell, RawTable, Table};
pub use transaction::Transaction;

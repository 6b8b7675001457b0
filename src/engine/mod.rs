//! # Engine
//!
//! - [`evaluator`]: recursive, cycle-checked evaluation of derived expressions
//! - [`dependents`]: transitive dependents and the order to recompute them in
//! - [`catalog`]: transactional read, write, rename and erase

pub mod catalog;
pub mod dependents;
pub mod evaluator;

pub use catalog::{Catalog, CheckOutcome};
pub use evaluator::{Evaluation, Evaluator};

//! CLI command implementations.

pub mod history;
pub mod load;
pub mod query;
pub mod status;

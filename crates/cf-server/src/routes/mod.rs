//! Route handlers for the processing contract.

pub mod health;
pub mod process;

// src/error/mod.rs
//
// Error types shared by every layer of the crate

mod types;

pub use types::{DataAccessError, DataResult};

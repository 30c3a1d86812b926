// src/models/mod.rs
pub mod order;

pub use order::*;

// src/handlers/mod.rs
pub mod order_handler;

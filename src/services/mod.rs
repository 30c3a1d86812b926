// src/services/mod.rs
pub mod credentials;
pub mod messaging_service;

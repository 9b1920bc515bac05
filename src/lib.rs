//! fit-coach: routine generation and coaching backend.

pub mod chat;
pub mod config;
pub mod error;
pub mod llm;
pub mod profile;
pub mod routine;
pub mod server;
pub mod store;

//! `gatehouse-api` — HTTP transport (Axum).
//!
//! Folder map:
//! - `config.rs`: env-backed process configuration
//! - `app.rs`: router + service wiring
//! - `middleware.rs`: session auth, API-key auth, panic recovery
//! - `routes/`: handlers, one file per surface area
//! - `dto.rs`: request DTOs + validation into domain commands
//! - `errors.rs`: error-taxonomy → HTTP response mapping

pub mod app;
pub mod config;
pub mod dto;
pub mod errors;
pub mod middleware;
pub mod routes;

//! chirpy: credential and session service for a multi-user posting app.
//!
//! Passwords are bcrypt-hashed, access tokens are short-lived HS256 JWTs and
//! refresh tokens are opaque, persisted and revocable.

pub mod auth;
pub mod configuration;
pub mod error;
pub mod logger;
pub mod middleware;
pub mod routes;
pub mod session;
pub mod startup;
pub mod store;
pub mod telemetry;
pub mod validators;

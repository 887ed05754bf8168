//! HTTP API handlers.
//!
//! All bodies are JSON with camelCase fields. Errors use the
//! `{"error": code, "message": ...}` shape produced by
//! [`tree_farm_web::AppError`].

pub mod cancellation;
pub mod confirmation;
pub mod open_dates;
pub mod reservations;

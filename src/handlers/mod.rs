//! HTTP handlers

pub mod analyze;
pub mod events;
pub mod health;

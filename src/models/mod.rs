//! Data models

pub mod event;

pub use event::*;

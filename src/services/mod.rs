//! Service implementations backing the HTTP API.
//!
//! Each module owns one concern.

pub mod assist;
pub mod compiler;
pub mod fenced;
pub mod workspace;

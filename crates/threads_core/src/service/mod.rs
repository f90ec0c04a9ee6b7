//! Use-case services.
//!
//! # Responsibility
//! - Turn repository calls into the operations callers actually invoke.
//! - Keep callers free of SQL and connection details.

pub mod community_service;
pub mod thread_service;
pub mod user_service;

//! Domain model for posts ("threads"), their authors and communities.
//!
//! # Responsibility
//! - Define canonical stored documents and their validation rules.
//! - Define the expanded read models returned by population queries.
//!
//! # Invariants
//! - Every document is identified by a stable UUID assigned at creation.
//! - A root thread has no `parent_id`; a reply's id is listed in its
//!   parent's `children`.

pub mod community;
pub mod expanded;
pub mod thread;
pub mod user;
mod validation;

pub use validation::ValidationError;

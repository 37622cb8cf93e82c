//! Domain core for the resume optimizer job service.
//!
//! Holds everything that does not depend on HTTP, object storage, or the
//! message broker: the job record and its transition rules, the job store
//! abstraction, and the on-disk artifact layout.

pub mod artifacts;
pub mod error;
pub mod hashing;
pub mod job;
pub mod store;
pub mod types;

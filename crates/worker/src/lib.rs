//! Out-of-process consumer for the queue bridge.
//!
//! Pops [`JobMessage`](resumeopt_queue::JobMessage)s published by the API's
//! `POST /v1/jobs`, scores them against the resume ML service, writes the
//! results next to the API's own run outputs and reports the outcome back
//! through the API's status endpoint.

pub mod config;
pub mod consumer;
pub mod error;
pub mod processor;
pub mod reporter;
pub mod scoring;

//! Route tables. Everything is mounted at the root; there is no version
//! prefix apart from the `/v1/jobs` queue intake.
//!
//! ```text
//! GET    /                                 health
//! GET    /health                           health
//!
//! POST   /optimize                         create inline job (form)
//! POST   /v1/jobs                          create queue-bridge job (JSON, 202)
//! POST   /v1/jobs/{id}/status              worker status report
//! GET    /job/{id}                         job status
//! DELETE /job/{id}                         delete job and its outputs
//! GET    /jobs                             list jobs
//!
//! POST   /upload-resume                    multipart resume upload
//! GET    /download/{id}/{filename}         download a job artifact
//! ```

pub mod files;
pub mod health;
pub mod jobs;

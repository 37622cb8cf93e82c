pub mod downloads;
pub mod jobs;
pub mod uploads;

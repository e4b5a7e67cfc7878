//! Domain models shared across the Restora client crates.

pub mod credentials;
pub mod job;
pub mod session;
pub mod upload;

pub use credentials::{LoginRequest, RegisterRequest};
pub use job::{Job, JobPage, JobStatus};
pub use session::Session;
pub use upload::{CreateJobRequest, SelectedFile, StoreUploadRequest, StoreUploadResponse};

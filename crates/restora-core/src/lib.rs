//! Restora Core Library
//!
//! Domain models, error taxonomy, configuration, token decoding, and the
//! route-access predicate shared across the Restora client crates.

pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod token;

// Re-export commonly used types
pub use config::{Config, JOB_PAGE_SIZE};
pub use error::ClientError;
pub use models::{
    CreateJobRequest, Job, JobPage, JobStatus, LoginRequest, RegisterRequest, SelectedFile,
    Session, StoreUploadRequest, StoreUploadResponse,
};
pub use routes::{Route, RouteDecision};
pub use token::decode_session;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use crate::error::ClientError;

/// Processing state of a restoration job. The backend serializes these as
/// uppercase strings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl Display for JobStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            JobStatus::Pending => write!(f, "PENDING"),
            JobStatus::Processing => write!(f, "PROCESSING"),
            JobStatus::Completed => write!(f, "COMPLETED"),
            JobStatus::Failed => write!(f, "FAILED"),
        }
    }
}

impl FromStr for JobStatus {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(JobStatus::Pending),
            "PROCESSING" => Ok(JobStatus::Processing),
            "COMPLETED" => Ok(JobStatus::Completed),
            "FAILED" => Ok(JobStatus::Failed),
            _ => Err(ClientError::Validation(format!("Invalid job status: {}", s))),
        }
    }
}

/// Server-tracked restoration job, as returned by `GET /jobs`.
///
/// Read-only projection: the client renders these but never mutates or
/// re-submits them. `user_id` always matches the requesting session's
/// subject (enforced server-side).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: i64,
    pub image_name: String,
    /// Opaque blob-store key the job was created from.
    pub key: String,
    pub created_at: DateTime<Utc>,
    pub status: JobStatus,
    pub user_id: i64,
}

/// Paginated envelope for the job listing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JobPage {
    pub data: Vec<Job>,
    pub total: i64,
    pub page: u32,
    pub last_page: u32,
}

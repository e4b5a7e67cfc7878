use serde::{Deserialize, Serialize};

/// File chosen for a restoration attempt.
///
/// Carries the raw bytes alongside the metadata the UI renders; the bytes
/// are only read when the blob-store stage encodes them for transmission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub size_bytes: u64,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    pub fn from_bytes(
        name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            name: name.into(),
            size_bytes: bytes.len() as u64,
            content_type: content_type.into(),
            bytes,
        }
    }

    /// Lowercased extension, or `None` when the name has no usable one.
    /// A leading-dot name ("`.env`") does not count as having an extension.
    pub fn extension(&self) -> Option<String> {
        match self.name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => {
                Some(ext.to_ascii_lowercase())
            }
            _ => None,
        }
    }
}

/// Blob-store write request: base64-encoded content plus the extension the
/// store uses to derive the object key.
#[derive(Debug, Serialize)]
pub struct StoreUploadRequest {
    pub file: String,
    pub ext: String,
}

/// Blob-store write response.
#[derive(Debug, Deserialize)]
pub struct StoreUploadResponse {
    pub key: String,
}

/// Backend job-creation request, submitted once a storage key exists.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobRequest {
    pub key: String,
    pub file_name: String,
}

/// Fetch collaborator failures, always unit-scoped
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("network error for {resource}: {reason}")]
    Network { resource: String, reason: String },

    #[error("upstream returned {status} for {resource}")]
    Status { status: u16, resource: String },

    #[error("malformed payload from {resource}: {reason}")]
    Malformed { resource: String, reason: String },
}

impl FetchError {
    /// the resource the failed call was attempting, for run reports
    pub fn resource(&self) -> &str {
        match self {
            FetchError::Network { resource, .. } => resource,
            FetchError::Status { resource, .. } => resource,
            FetchError::Malformed { resource, .. } => resource,
        }
    }
}

/// Run-level failures. These abort the run; unit-level failures are caught
/// at the chapter/user scope and land in the run report instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unmapped external identifier: {0}")]
    Unmapped(String),
    #[error("book not in catalog: {0}")]
    BookNotFound(String),
}

//! Error types for protogen-env

use thiserror::Error;

/// Errors that can occur while provisioning the protoc environment
#[derive(Error, Debug)]
pub enum ProvisionError {
    /// The environment specification contains a floating or empty reference
    #[error("environment specification is not fully pinned: {0}")]
    Unpinned(String),

    /// The container runtime binary could not be started
    #[error("cannot run container runtime `{program}`")]
    RuntimeUnavailable {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The image build exited unsuccessfully
    #[error("{program} build failed: {status}")]
    BuildFailed { program: String, status: String },

    /// The build succeeded but printed no image id
    #[error("{program} build printed no image id")]
    MissingImageId { program: String },

    /// JSON serialization error
    #[error("cannot serialize environment specification")]
    Json(#[from] serde_json::Error),
}

//! Error types for protogen-core.

use protogen_env::ProvisionError;

/// Errors produced while running protoc inside the container.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("cannot start protoc container via `{program}`")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("protoc command failed: {status}")]
    CompilerFailed {
        status: String,
        /// Exit code reported by the runtime, if the process exited normally
        code: Option<i32>,
    },
}

/// Top-level error for one proto-gen run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("cannot determine working directory")]
    WorkingDir(#[source] std::io::Error),

    #[error(transparent)]
    Provision(#[from] ProvisionError),

    #[error(transparent)]
    Bridge(#[from] BridgeError),
}

impl Error {
    /// Process exit code for this failure.
    ///
    /// A failing compiler's own exit code is passed on; every other failure
    /// maps to 1. Never 0.
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::Bridge(BridgeError::CompilerFailed {
                code: Some(code), ..
            }) => u8::try_from(*code).ok().filter(|c| *c != 0).unwrap_or(1),
            _ => 1,
        }
    }
}

/// Result type for proto-gen runs.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    fn compiler_failed(code: Option<i32>) -> Error {
        Error::Bridge(BridgeError::CompilerFailed {
            status: "exit status".to_string(),
            code,
        })
    }

    #[test]
    fn test_exit_code_passes_compiler_code() {
        assert_eq!(compiler_failed(Some(3)).exit_code(), 3);
    }

    #[test]
    fn test_exit_code_never_zero() {
        assert_eq!(compiler_failed(Some(0)).exit_code(), 1);
        assert_eq!(compiler_failed(Some(256)).exit_code(), 1);
        assert_eq!(compiler_failed(Some(-1)).exit_code(), 1);
        assert_eq!(compiler_failed(None).exit_code(), 1);
    }

    #[test]
    fn test_provision_failures_exit_one() {
        let err: Error = ProvisionError::Unpinned("tag".to_string()).into();
        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().contains("not fully pinned"));
    }

    #[test]
    fn test_working_dir_message() {
        let err = Error::WorkingDir(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "gone",
        ));
        assert_eq!(err.to_string(), "cannot determine working directory");
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "gone");
        assert_eq!(err.exit_code(), 1);
    }
}

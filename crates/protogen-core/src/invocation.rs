//! The caller's side of a protoc run: where it was invoked and with what.

use crate::error::{Error, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Working directory plus the verbatim protoc argument vector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationRequest {
    working_dir: PathBuf,
    args: Vec<OsString>,
}

impl InvocationRequest {
    /// Build a request for an explicit directory.
    ///
    /// `working_dir` is used exactly as given; it must be absolute for the
    /// bind mount to mean anything to the runtime.
    pub fn new(working_dir: impl Into<PathBuf>, args: Vec<OsString>) -> Self {
        InvocationRequest {
            working_dir: working_dir.into(),
            args,
        }
    }

    /// Build a request for the process's current directory.
    pub fn from_current_dir(args: Vec<OsString>) -> Result<Self> {
        let working_dir = std::env::current_dir().map_err(Error::WorkingDir)?;
        Ok(InvocationRequest::new(working_dir, args))
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn args(&self) -> &[OsString] {
        &self.args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_current_dir_is_absolute() {
        let req = InvocationRequest::from_current_dir(vec!["a.proto".into()]).unwrap();
        assert!(req.working_dir().is_absolute());
        assert_eq!(req.args(), &[OsString::from("a.proto")]);
    }

    #[test]
    fn test_new_keeps_path_verbatim() {
        let req = InvocationRequest::new("/src/./api/", Vec::new());
        assert_eq!(req.working_dir().as_os_str(), "/src/./api/");
    }
}

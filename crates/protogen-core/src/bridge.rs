//! Invocation bridge: run protoc in the provisioned image against the
//! caller's real filesystem.
//!
//! The working directory is mounted at its own path and used as the
//! container's working directory, so absolute and relative paths in the
//! protoc arguments resolve exactly as they would natively.

use crate::cmdline::{display_command, PWD_PLACEHOLDER};
use crate::error::BridgeError;
use crate::invocation::InvocationRequest;
use protogen_env::{ContainerRuntime, ImageId, RunPlan};
use tracing::info;

/// Runs the compiler entrypoint of a provisioned image
pub struct Bridge<'a, R: ContainerRuntime + ?Sized> {
    runtime: &'a R,
    entrypoint: &'a str,
}

impl<'a, R: ContainerRuntime + ?Sized> Bridge<'a, R> {
    /// `entrypoint` only names the compiler in logs; the image decides what
    /// actually runs.
    pub fn new(runtime: &'a R, entrypoint: &'a str) -> Self {
        Bridge {
            runtime,
            entrypoint,
        }
    }

    /// Run `request` inside `image`, streaming output to stderr.
    pub async fn invoke(
        &self,
        image: &ImageId,
        request: &InvocationRequest,
    ) -> Result<(), BridgeError> {
        let plan = plan_for(image, request);

        let base = request.working_dir().to_string_lossy();
        info!(
            "{}",
            display_command(self.entrypoint, request.args(), &base, PWD_PLACEHOLDER)
        );

        let outcome = self
            .runtime
            .run_image(&plan)
            .await
            .map_err(|source| BridgeError::Spawn {
                program: self.runtime.program().to_string_lossy().into_owned(),
                source,
            })?;

        if !outcome.success() {
            return Err(BridgeError::CompilerFailed {
                status: outcome.to_string(),
                code: outcome.code,
            });
        }

        info!("done");
        Ok(())
    }
}

/// Mount and work in the caller's directory at its identical path.
pub fn plan_for(image: &ImageId, request: &InvocationRequest) -> RunPlan {
    RunPlan {
        image: image.clone(),
        mount: request.working_dir().to_path_buf(),
        workdir: request.working_dir().to_path_buf(),
        args: request.args().to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;
    use std::path::Path;

    #[test]
    fn test_plan_mounts_working_dir_at_same_path() {
        let request = InvocationRequest::new("/home/dev/my api", vec!["x.proto".into()]);
        let plan = plan_for(&ImageId("img".to_string()), &request);

        assert_eq!(plan.mount, Path::new("/home/dev/my api"));
        assert_eq!(plan.workdir, plan.mount);
        let mount = OsString::from("type=bind,source=/home/dev/my api,target=/home/dev/my api");
        assert!(plan.to_args().contains(&mount));
    }

    #[test]
    fn test_plan_appends_args_verbatim() {
        let args: Vec<OsString> = ["-I.", "--go_out=.", "-I.", "a.proto", "--help"]
            .iter()
            .map(OsString::from)
            .collect();
        let request = InvocationRequest::new("/w", args.clone());
        let plan = plan_for(&ImageId("img".to_string()), &request);

        let full = plan.to_args();
        let image_pos = full.iter().position(|a| a == "img").unwrap();
        assert_eq!(&full[image_pos + 1..], args.as_slice());
    }
}

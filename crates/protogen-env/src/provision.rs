//! Environment provisioning
//!
//! Turns an [`EnvironmentSpec`] into an [`ImageId`] by asking the container
//! runtime to build the rendered recipe. Layers are cached by the runtime, so
//! provisioning an unchanged specification again is cheap and yields an image
//! that behaves identically.

use crate::error::ProvisionError;
use crate::runtime::{ContainerRuntime, ImageId};
use crate::spec::EnvironmentSpec;
use crate::Result;
use tracing::{debug, info};

/// Builds (or reuses) the pinned image through a [`ContainerRuntime`]
pub struct Provisioner<'a, R: ContainerRuntime + ?Sized> {
    runtime: &'a R,
}

impl<'a, R: ContainerRuntime + ?Sized> Provisioner<'a, R> {
    pub fn new(runtime: &'a R) -> Self {
        Provisioner { runtime }
    }

    /// Validate `spec` and build it. Never retried: any failure is final.
    pub async fn provision(&self, spec: &EnvironmentSpec) -> Result<ImageId> {
        spec.validate()?;

        let program = self.runtime.program().to_string_lossy().into_owned();
        let recipe = spec.render_dockerfile();
        debug!("environment spec: {}", serde_json::to_string(spec)?);
        info!(
            "building {} container image (recipe {})...",
            spec.compiler.name,
            spec.digest().short()
        );

        let outcome = self.runtime.build_image(&recipe).await.map_err(|source| {
            ProvisionError::RuntimeUnavailable {
                program: program.clone(),
                source,
            }
        })?;

        if !outcome.status.success() {
            return Err(ProvisionError::BuildFailed {
                program,
                status: outcome.status.to_string(),
            });
        }

        let image = parse_image_id(&outcome.stdout)
            .ok_or(ProvisionError::MissingImageId { program })?;
        debug!("image {}", image.short());
        Ok(image)
    }
}

/// The image id is the last non-empty line a quiet build prints.
fn parse_image_id(stdout: &str) -> Option<ImageId> {
    stdout
        .lines()
        .map(str::trim)
        .rev()
        .find(|line| !line.is_empty())
        .map(|line| ImageId(line.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_image_id_trims() {
        assert_eq!(
            parse_image_id("sha256:abc\n"),
            Some(ImageId("sha256:abc".to_string()))
        );
    }

    #[test]
    fn test_parse_image_id_takes_last_line() {
        assert_eq!(
            parse_image_id("STEP 1/4\n\nsha256:def  \n\n"),
            Some(ImageId("sha256:def".to_string()))
        );
    }

    #[test]
    fn test_parse_image_id_empty() {
        assert_eq!(parse_image_id(""), None);
        assert_eq!(parse_image_id(" \n\t\n"), None);
    }

    #[test]
    fn test_non_ascii_image_id_short() {
        let id = parse_image_id("a\u{e9}\u{e9}\u{e9}\u{e9}\u{e9}\u{e9}\u{e9}\n").unwrap();
        assert_eq!(id.short(), "a\u{e9}\u{e9}\u{e9}\u{e9}\u{e9}\u{e9}\u{e9}");

        let id = parse_image_id(&format!("sha256:{}\n", "\u{e9}".repeat(20))).unwrap();
        assert_eq!(id.short(), "\u{e9}".repeat(12));
    }
}

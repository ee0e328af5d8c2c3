//! protogen-core: run protoc reproducibly
//!
//! Composes the two halves of a proto-gen run:
//!
//! 1. [`Provisioner`] builds (or reuses) the pinned image and returns its id.
//! 2. [`Bridge`] runs the image's protoc entrypoint with the caller's
//!    arguments, bind-mounting the working directory at its own path.
//!
//! [`run`] performs both in order and stops at the first failure. Errors are
//! returned, never printed here; the binary reports them once.

pub mod bridge;
pub mod cmdline;
pub mod config;
pub mod error;
pub mod invocation;
pub mod telemetry;

pub use bridge::Bridge;
pub use cmdline::{abbreviate, PWD_PLACEHOLDER};
pub use config::Settings;
pub use error::{BridgeError, Error, Result};
pub use invocation::InvocationRequest;
pub use telemetry::init_tracing;

pub use protogen_env::{CliRuntime, ContainerRuntime, EnvironmentSpec, ImageId, Provisioner};

/// Provision `spec`, then run protoc for `request`.
///
/// The bridge is only reached with an image id from a successful build.
pub async fn run<R: ContainerRuntime + ?Sized>(
    runtime: &R,
    spec: &EnvironmentSpec,
    request: &InvocationRequest,
) -> Result<()> {
    let image = Provisioner::new(runtime).provision(spec).await?;
    Bridge::new(runtime, &spec.entrypoint)
        .invoke(&image, request)
        .await?;
    Ok(())
}

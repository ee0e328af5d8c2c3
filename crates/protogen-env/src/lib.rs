//! protogen-env: the pinned protoc environment
//!
//! This crate owns everything about the execution environment protoc runs
//! in: the fully pinned [`EnvironmentSpec`], its rendering into a build
//! recipe, and [`Provisioner`], which builds that recipe through a
//! [`ContainerRuntime`] and hands back an [`ImageId`].
//!
//! Nothing here reads the caller's repository; the build context is empty.

pub mod error;
pub mod provision;
pub mod runtime;
pub mod spec;

pub use error::ProvisionError;
pub use provision::Provisioner;
pub use runtime::{BuildOutcome, CliRuntime, ContainerRuntime, ImageId, ProcessOutcome, RunPlan};
pub use spec::{BaseImage, CompilerRelease, EnvironmentSpec, GoPlugin, OsPackage, RecipeDigest};

/// Result type for provisioning operations
pub type Result<T> = std::result::Result<T, ProvisionError>;

//! Container runtime seam
//!
//! [`ContainerRuntime`] is the process boundary to docker (or a
//! CLI-compatible runtime such as podman). [`CliRuntime`] drives the real
//! binary; tests substitute an in-memory fake.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::ffi::{OsStr, OsString};
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// Opaque handle to a provisioned image, as printed by the runtime's build
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageId(pub String);

impl ImageId {
    /// Get short id (first 12 characters after any `sha256:` prefix)
    pub fn short(&self) -> &str {
        let id = self.0.strip_prefix("sha256:").unwrap_or(&self.0);
        id.char_indices().nth(12).map_or(id, |(end, _)| &id[..end])
    }
}

impl std::fmt::Display for ImageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a runtime child process ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessOutcome {
    /// Exit code; `None` when terminated by a signal
    pub code: Option<i32>,
}

impl ProcessOutcome {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

impl From<ExitStatus> for ProcessOutcome {
    fn from(status: ExitStatus) -> Self {
        ProcessOutcome {
            code: status.code(),
        }
    }
}

impl std::fmt::Display for ProcessOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.code {
            Some(code) => write!(f, "exit status {}", code),
            None => write!(f, "terminated by signal"),
        }
    }
}

/// Result of an image build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOutcome {
    pub status: ProcessOutcome,
    /// Everything the build wrote to stdout (the image id in quiet mode)
    pub stdout: String,
}

/// A fully resolved container run: image, bind mount and verbatim arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPlan {
    pub image: ImageId,
    /// Host directory mounted at the identical path inside the container
    pub mount: PathBuf,
    /// Working directory of the entrypoint inside the container
    pub workdir: PathBuf,
    /// Arguments appended after the image's entrypoint, untouched
    pub args: Vec<OsString>,
}

impl RunPlan {
    /// The runtime sub-command line, e.g.
    /// `run --rm --mount type=bind,source=/src,target=/src -w /src <image> a.proto`.
    ///
    /// `--mount` rather than `-v` so a `:` in the path is not read as a
    /// separator.
    pub fn to_args(&self) -> Vec<OsString> {
        let mut mount = OsString::from("type=bind,");
        mount.push(mount_field("source=", self.mount.as_os_str()));
        mount.push(",");
        mount.push(mount_field("target=", self.mount.as_os_str()));

        let mut out: Vec<OsString> = vec![
            "run".into(),
            "--rm".into(),
            "--mount".into(),
            mount,
            "-w".into(),
            self.workdir.clone().into_os_string(),
            self.image.0.clone().into(),
        ];
        out.extend(self.args.iter().cloned());
        out
    }
}

/// One `key=value` field of a `--mount` spec.
///
/// The runtime splits the spec as CSV, so a value holding `,` or `"` is
/// quoted, with `"` doubled.
#[cfg(unix)]
fn mount_field(key: &str, value: &OsStr) -> OsString {
    use std::os::unix::ffi::{OsStrExt, OsStringExt};

    let mut field = key.as_bytes().to_vec();
    field.extend_from_slice(value.as_bytes());
    if !value.as_bytes().iter().any(|b| matches!(b, b',' | b'"')) {
        return OsString::from_vec(field);
    }

    let mut quoted = Vec::with_capacity(field.len() + 2);
    quoted.push(b'"');
    for b in field {
        if b == b'"' {
            quoted.push(b'"');
        }
        quoted.push(b);
    }
    quoted.push(b'"');
    OsString::from_vec(quoted)
}

#[cfg(not(unix))]
fn mount_field(key: &str, value: &OsStr) -> OsString {
    let field = format!("{}{}", key, value.to_string_lossy());
    if !field.contains([',', '"']) {
        return field.into();
    }
    format!("\"{}\"", field.replace('"', "\"\"")).into()
}

/// Process boundary to the host container runtime
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Program name used in diagnostics
    fn program(&self) -> &OsStr;

    /// Build an image from `recipe` with an empty build context.
    ///
    /// `Err` means the runtime could not be started at all.
    async fn build_image(&self, recipe: &str) -> std::io::Result<BuildOutcome>;

    /// Run `plan`, streaming the container's stdout and stderr to our stderr.
    async fn run_image(&self, plan: &RunPlan) -> std::io::Result<ProcessOutcome>;
}

/// [`ContainerRuntime`] backed by a docker-compatible command line
#[derive(Debug, Clone)]
pub struct CliRuntime {
    program: OsString,
}

impl CliRuntime {
    pub fn new(program: impl Into<OsString>) -> Self {
        CliRuntime {
            program: program.into(),
        }
    }
}

impl Default for CliRuntime {
    fn default() -> Self {
        CliRuntime::new("docker")
    }
}

#[async_trait]
impl ContainerRuntime for CliRuntime {
    fn program(&self) -> &OsStr {
        &self.program
    }

    async fn build_image(&self, recipe: &str) -> std::io::Result<BuildOutcome> {
        debug!("{:?} build -q -", self.program);
        let mut child = Command::new(&self.program)
            .args(["build", "-q", "-"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            // A runtime that exits early closes stdin; report its exit
            // status instead of the broken pipe.
            match stdin.write_all(recipe.as_bytes()).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {}
                Err(e) => return Err(e),
            }
        }

        let output = child.wait_with_output().await?;
        Ok(BuildOutcome {
            status: output.status.into(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        })
    }

    async fn run_image(&self, plan: &RunPlan) -> std::io::Result<ProcessOutcome> {
        let status = Command::new(&self.program)
            .args(plan.to_args())
            .stdin(Stdio::null())
            .stdout(std::io::stderr())
            .stderr(Stdio::inherit())
            .status()
            .await?;
        Ok(status.into())
    }
}

//! Pinned environment specification
//!
//! Describes, version by version, the image protoc runs in and renders it
//! into the build recipe handed to the container runtime. Every reference is
//! exact so that two machines building the same specification get the same
//! compiler and plugins, and therefore byte-identical generated code.

use crate::error::ProvisionError;
use crate::Result;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt::Write as _;

/// Name the downloaded compiler archive is stored under during the build.
const COMPILER_ARCHIVE: &str = "protoc.zip";

/// Directory the compiler archive is unpacked into.
const COMPILER_PREFIX: &str = "/usr/local/";

/// References that float and therefore defeat pinning.
const FLOATING_REFS: &[&str] = &["latest", "master", "main", "head", "stable"];

/// A container base image reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseImage {
    /// Image repository, e.g. `golang`
    pub name: String,
    /// Exact tag, e.g. `1.16.5`
    pub tag: String,
}

/// An OS package installed with an exact version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OsPackage {
    pub name: String,
    pub version: String,
}

/// The external compiler release baked into the image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilerRelease {
    /// Binary name, also used as the image entrypoint
    pub name: String,
    pub version: String,
    /// Exact release archive URL
    pub url: String,
    /// Optional SHA-256 of the archive, verified during the build
    pub sha256: Option<String>,
}

/// A protoc plugin installed as a Go module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoPlugin {
    /// Module path of the plugin command
    pub module: String,
    /// Exact module version
    pub version: String,
}

impl GoPlugin {
    fn reference(&self) -> String {
        format!("{}@{}", self.module, self.version)
    }
}

/// Fully pinned description of the protoc execution environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentSpec {
    pub base: BaseImage,
    /// Working directory inside the image
    pub workdir: String,
    pub packages: Vec<OsPackage>,
    pub compiler: CompilerRelease,
    pub plugins: Vec<GoPlugin>,
    /// Fixed entrypoint; arguments are appended to it at run time
    pub entrypoint: String,
}

impl EnvironmentSpec {
    /// The environment this tool ships with: protoc 3.13.0 plus the Go and
    /// Twirp plugins on a golang 1.16.5 base.
    pub fn pinned() -> Self {
        EnvironmentSpec {
            base: BaseImage {
                name: "golang".to_string(),
                tag: "1.16.5".to_string(),
            },
            workdir: "/work".to_string(),
            packages: vec![OsPackage {
                name: "unzip".to_string(),
                version: "6.0-23+deb10u2".to_string(),
            }],
            compiler: CompilerRelease {
                name: "protoc".to_string(),
                version: "3.13.0".to_string(),
                url: "https://github.com/protocolbuffers/protobuf/releases/download/v3.13.0/protoc-3.13.0-linux-x86_64.zip".to_string(),
                sha256: None,
            },
            plugins: vec![
                GoPlugin {
                    module: "google.golang.org/protobuf/cmd/protoc-gen-go".to_string(),
                    version: "v1.20.0".to_string(),
                },
                GoPlugin {
                    module: "github.com/twitchtv/twirp/protoc-gen-twirp".to_string(),
                    version: "v5.12.1+incompatible".to_string(),
                },
            ],
            entrypoint: "protoc".to_string(),
        }
    }

    /// Check that every dependency carries an explicit, non-floating version.
    pub fn validate(&self) -> Result<()> {
        check_pinned("base image tag", &self.base.name, &self.base.tag)?;
        for pkg in &self.packages {
            check_pinned("package", &pkg.name, &pkg.version)?;
        }
        check_pinned("compiler", &self.compiler.name, &self.compiler.version)?;
        if !self.compiler.url.contains(&self.compiler.version) {
            return Err(ProvisionError::Unpinned(format!(
                "compiler url {} does not name version {}",
                self.compiler.url, self.compiler.version
            )));
        }
        if let Some(sha) = &self.compiler.sha256 {
            if sha.len() != 64 || !sha.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(ProvisionError::Unpinned(format!(
                    "compiler sha256 {:?} is not a hex digest",
                    sha
                )));
            }
        }
        for plugin in &self.plugins {
            check_pinned("plugin", &plugin.module, &plugin.version)?;
        }
        if self.entrypoint.trim().is_empty() {
            return Err(ProvisionError::Unpinned("empty entrypoint".to_string()));
        }
        Ok(())
    }

    /// Render the build recipe (a Dockerfile) for this specification.
    ///
    /// Output depends only on `self`, so an unchanged specification always
    /// renders the same text and the runtime's layer cache can reuse it.
    pub fn render_dockerfile(&self) -> String {
        let mut out = String::new();

        // Writing to a String cannot fail.
        let _ = writeln!(out, "FROM {}:{}", self.base.name, self.base.tag);
        let _ = writeln!(out);
        let _ = writeln!(out, "WORKDIR {}", self.workdir);
        let _ = writeln!(out);

        let mut steps = vec!["apt-get update".to_string()];
        if !self.packages.is_empty() {
            let pkgs: Vec<String> = self
                .packages
                .iter()
                .map(|p| format!("{}={}", p.name, p.version))
                .collect();
            steps.push(format!("apt-get install -y {}", pkgs.join(" ")));
        }
        steps.push(format!(
            "curl --location --silent -o {} {}",
            COMPILER_ARCHIVE, self.compiler.url
        ));
        if let Some(sha) = &self.compiler.sha256 {
            steps.push(format!(
                "echo \"{}  {}\" | sha256sum -c -",
                sha, COMPILER_ARCHIVE
            ));
        }
        steps.push(format!("unzip {} -d {}", COMPILER_ARCHIVE, COMPILER_PREFIX));
        steps.push(format!("rm -fr {}", COMPILER_ARCHIVE));
        let _ = writeln!(out, "RUN {}", steps.join(" && \\\n    "));

        if !self.plugins.is_empty() {
            let refs: Vec<String> = self.plugins.iter().map(GoPlugin::reference).collect();
            let _ = writeln!(out);
            let _ = writeln!(out, "RUN go get {}", refs.join(" \\\n           "));
        }

        let _ = writeln!(out);
        let _ = writeln!(out, "ENTRYPOINT [\"{}\"]", self.entrypoint);
        out
    }

    /// Content digest of the rendered recipe.
    pub fn digest(&self) -> RecipeDigest {
        let mut hasher = Sha256::new();
        hasher.update(self.render_dockerfile().as_bytes());
        RecipeDigest(hex::encode(hasher.finalize()))
    }
}

fn check_pinned(kind: &str, name: &str, version: &str) -> Result<()> {
    let version = version.trim();
    if name.trim().is_empty() {
        return Err(ProvisionError::Unpinned(format!("{} with empty name", kind)));
    }
    if version.is_empty() {
        return Err(ProvisionError::Unpinned(format!(
            "{} {} has no version",
            kind, name
        )));
    }
    if FLOATING_REFS.contains(&version.to_ascii_lowercase().as_str()) {
        return Err(ProvisionError::Unpinned(format!(
            "{} {} uses floating reference {:?}",
            kind, name, version
        )));
    }
    Ok(())
}

/// SHA-256 of a rendered build recipe
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecipeDigest(pub String);

impl RecipeDigest {
    /// Get short digest (first 12 characters)
    pub fn short(&self) -> &str {
        &self.0[..12.min(self.0.len())]
    }
}

impl std::fmt::Display for RecipeDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

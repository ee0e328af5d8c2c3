//! Run-time settings read from the environment.
//!
//! Only ambient knobs live here: which container runtime to drive and how to
//! log. The pinned environment itself is not configurable.

use std::ffi::OsString;
use tracing::Level;

/// Container runtime program override
pub const RUNTIME_VAR: &str = "PROTO_GEN_RUNTIME";
/// Emit JSON log lines when truthy
pub const LOG_JSON_VAR: &str = "PROTO_GEN_LOG_JSON";
/// Default to debug-level logging when truthy
pub const VERBOSE_VAR: &str = "PROTO_GEN_VERBOSE";

const DEFAULT_RUNTIME: &str = "docker";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// docker-compatible runtime binary (`docker`, `podman`, or a path)
    pub runtime: OsString,
    pub log_json: bool,
    pub verbose: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            runtime: DEFAULT_RUNTIME.into(),
            log_json: false,
            verbose: false,
        }
    }
}

impl Settings {
    /// Create settings from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var_os(key))
    }

    /// Create settings from an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<OsString>) -> Self {
        let runtime = lookup(RUNTIME_VAR)
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_RUNTIME.into());
        Settings {
            runtime,
            log_json: lookup(LOG_JSON_VAR).is_some_and(|v| truthy(&v)),
            verbose: lookup(VERBOSE_VAR).is_some_and(|v| truthy(&v)),
        }
    }

    /// Default log level when `RUST_LOG` is unset
    pub fn log_level(&self) -> Level {
        if self.verbose {
            Level::DEBUG
        } else {
            Level::INFO
        }
    }
}

fn truthy(value: &OsString) -> bool {
    matches!(
        value.to_string_lossy().trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> Settings {
        let map: HashMap<String, OsString> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), OsString::from(v)))
            .collect();
        Settings::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let s = settings(&[]);
        assert_eq!(s, Settings::default());
        assert_eq!(s.runtime, "docker");
        assert_eq!(s.log_level(), Level::INFO);
    }

    #[test]
    fn test_runtime_override() {
        assert_eq!(settings(&[(RUNTIME_VAR, "podman")]).runtime, "podman");
        assert_eq!(settings(&[(RUNTIME_VAR, "")]).runtime, "docker");
    }

    #[test]
    fn test_flags() {
        let s = settings(&[(LOG_JSON_VAR, "true"), (VERBOSE_VAR, "1")]);
        assert!(s.log_json);
        assert!(s.verbose);
        assert_eq!(s.log_level(), Level::DEBUG);

        let s = settings(&[(LOG_JSON_VAR, "0"), (VERBOSE_VAR, "no")]);
        assert!(!s.log_json);
        assert!(!s.verbose);
    }
}

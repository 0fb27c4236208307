//! ---
//! vtel_section: "01-core-functionality"
//! vtel_subsection: "module"
//! vtel_type: "source"
//! vtel_scope: "code"
//! vtel_description: "Shared primitives and utilities for the simulator runtime."
//! vtel_version: "v0.0.0-prealpha"
//! vtel_owner: "tbd"
//! ---

/// Build metadata reported by `--version` and the startup log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionInfo {
    pub semver: &'static str,
    pub git_sha: &'static str,
    pub profile: &'static str,
}

impl VersionInfo {
    pub fn current() -> Self {
        Self {
            semver: env!("CARGO_PKG_VERSION"),
            // Injected by release pipelines; local builds report "unknown".
            git_sha: option_env!("VTEL_GIT_SHA").unwrap_or("unknown"),
            profile: if cfg!(debug_assertions) {
                "debug"
            } else {
                "release"
            },
        }
    }

    /// Multi-field summary suitable for `--version` output.
    pub fn extended(&self) -> String {
        format!(
            "VTEL {} (git {}, {} build)",
            self.semver, self.git_sha, self.profile
        )
    }
}

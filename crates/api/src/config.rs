//! Process configuration read from the environment.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;

const DEFAULT_BIND: &str = "0.0.0.0:8080";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// `POLICYGATE_BIND`
    pub bind: SocketAddr,
    /// `POLICYGATE_MANIFEST`: JSON manifest replacing the built-in controller
    /// declarations.
    pub manifest: Option<PathBuf>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 8080)),
            manifest: None,
        }
    }
}

impl ApiConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source (tests pass a map).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let bind = lookup("POLICYGATE_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = bind
            .parse()
            .with_context(|| format!("POLICYGATE_BIND is not a socket address: {bind}"))?;

        let manifest = lookup("POLICYGATE_MANIFEST")
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self { bind, manifest })
    }
}

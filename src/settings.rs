use miette::{IntoDiagnostic, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    pub server: Server,
    pub authz: Authz,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Server {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Authz {
    /// Directory of `.kdl` policy files loaded at startup.
    pub policies_dir: PathBuf,
}

impl Default for Server {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8088,
        }
    }
}

impl Default for Authz {
    fn default() -> Self {
        Self {
            policies_dir: PathBuf::from("policies"),
        }
    }
}

impl Settings {
    pub fn load(path: &str) -> Result<Self> {
        let mut builder = config::Config::builder()
            .set_default("server.host", Server::default().host)
            .into_diagnostic()?
            .set_default("server.port", Server::default().port)
            .into_diagnostic()?
            .set_default(
                "authz.policies_dir",
                Authz::default().policies_dir.to_string_lossy().to_string(),
            )
            .into_diagnostic()?;

        // Optional file
        if Path::new(path).exists() {
            builder = builder.add_source(config::File::with_name(path));
        }

        // Environment overrides: PALISADE__SERVER__PORT=9090, etc.
        builder =
            builder.add_source(config::Environment::with_prefix("PALISADE").separator("__"));

        let cfg = builder.build().into_diagnostic()?;
        let mut s: Settings = cfg.try_deserialize().into_diagnostic()?;

        // Normalize the policies dir to be relative to current dir
        if s.authz.policies_dir.is_relative() {
            s.authz.policies_dir = std::env::current_dir()
                .into_diagnostic()?
                .join(&s.authz.policies_dir);
        }

        Ok(s)
    }
}

use std::path::Path;

use anyhow::{Context, ensure};
use central_fetch::ClientConfig;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};

/// Prefix for environment overrides, e.g. `CENTRAL_TIMEOUT_MS=5000` or
/// `CENTRAL_RETRY__MAX_RETRIES=5`.
pub const ENV_PREFIX: &str = "CENTRAL_";

/// Layer built-in defaults, then the TOML file if given, then the environment.
pub fn load(path: Option<&Path>) -> anyhow::Result<ClientConfig> {
    let mut figment = Figment::from(Serialized::defaults(ClientConfig::default()));

    if let Some(path) = path {
        ensure!(path.is_file(), "config file {} does not exist", path.display());
        figment = figment.merge(Toml::file(path));
    }

    figment
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .context("invalid configuration")
}

use crate::config::PipelineConfig;
use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Json, Toml},
    Figment,
};
use std::path::Path;

const ENV_PREFIX: &str = "SENTITRADE_";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads pipeline configuration by merging TOML, environment variables, and JSON.
    ///
    /// Missing files are skipped, so with no files and no environment the
    /// defaults apply.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration files cannot be parsed or the merged
    /// configuration fails validation.
    pub fn load() -> Result<PipelineConfig> {
        Self::load_from(Path::new("config"), None)
    }

    /// Loads pipeline configuration with a specific profile.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration files cannot be parsed or the merged
    /// configuration fails validation.
    pub fn load_with_profile(profile: &str) -> Result<PipelineConfig> {
        Self::load_from(Path::new("config"), Some(profile))
    }

    /// Loads configuration from `dir` instead of `./config`.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration files cannot be parsed or the merged
    /// configuration fails validation.
    pub fn load_from(dir: &Path, profile: Option<&str>) -> Result<PipelineConfig> {
        let config: PipelineConfig = Self::figment(dir, profile)
            .extract()
            .context("failed to load pipeline configuration")?;

        config.validate()?;
        tracing::debug!(dir = %dir.display(), profile = ?profile, "configuration loaded");
        Ok(config)
    }

    fn figment(dir: &Path, profile: Option<&str>) -> Figment {
        let mut figment = Figment::new().merge(Toml::file(dir.join("Config.toml")));
        if let Some(profile) = profile {
            figment = figment.merge(Toml::file(dir.join(format!("Config.{profile}.toml"))));
        }
        figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .join(Json::file(dir.join("Config.json")))
    }
}

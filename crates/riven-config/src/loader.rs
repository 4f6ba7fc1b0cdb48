//! Layered configuration loading: a TOML file overlaid with `RIVEN_`-prefixed
//! environment variables, merged by [`figment`].

use std::path::Path;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};

use crate::error::{ConfigError, ConfigResult};
use crate::model::Settings;
use crate::validate::validate;

/// Load settings from an optional TOML file at `config_path`, overlaid with
/// `RIVEN_`-prefixed environment variables (nested keys via `__`, e.g.
/// `RIVEN_HARVESTER__BASE_URL`). Missing files are tolerated; missing
/// required fields (`default_profile`, `mount_path`) surface as
/// [`ConfigError::Load`].
pub fn load(config_path: Option<&Path>, defaults: &Settings) -> ConfigResult<Settings> {
    let mut figment = Figment::new().merge(Serialized::defaults(defaults));
    if let Some(path) = config_path {
        figment = figment.merge(Toml::file(path));
    }
    figment = figment.merge(Env::prefixed("RIVEN_").split("__"));
    let settings: Settings = figment.extract().map_err(|source| ConfigError::Load { source })?;
    validate(&settings)?;
    Ok(settings)
}

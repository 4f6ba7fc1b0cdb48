//! Validation for a loaded [`Settings`] snapshot.

use std::collections::HashSet;

use crate::error::{ConfigError, ConfigResult};
use crate::model::Settings;

/// Validate a settings snapshot: profile names are unique and referenced
/// consistently, `path_profiles` paths are unique (so longest-prefix lookup
/// never ties), and per-profile numeric bounds are sane.
pub fn validate(settings: &Settings) -> ConfigResult<()> {
    let mut seen_names = HashSet::new();
    for profile in &settings.ranking_profiles {
        if !seen_names.insert(profile.name.as_str()) {
            return Err(ConfigError::Invalid {
                section: "ranking_profiles",
                field: "name".to_string(),
                reason: format!("duplicate profile name '{}'", profile.name),
            });
        }
        if profile.bucket_limit == 0 {
            return Err(ConfigError::Invalid {
                section: "ranking_profiles",
                field: format!("{}.bucket_limit", profile.name),
                reason: "must be greater than zero".to_string(),
            });
        }
        if profile.keep_versions_per_item == 0 {
            return Err(ConfigError::Invalid {
                section: "ranking_profiles",
                field: format!("{}.keep_versions_per_item", profile.name),
                reason: "must be greater than zero".to_string(),
            });
        }
    }

    if !settings.default_profile.is_empty()
        && settings.ranking_profile(&settings.default_profile).is_none()
    {
        return Err(ConfigError::Invalid {
            section: "settings",
            field: "default_profile".to_string(),
            reason: format!(
                "default_profile '{}' is not a declared ranking profile",
                settings.default_profile
            ),
        });
    }

    let mut seen_paths = HashSet::new();
    for entry in &settings.path_profiles {
        if !seen_paths.insert(entry.path.as_str()) {
            return Err(ConfigError::Invalid {
                section: "path_profiles",
                field: "path".to_string(),
                reason: format!("duplicate path '{}'", entry.path),
            });
        }
        if settings.ranking_profile(&entry.profile).is_none() {
            return Err(ConfigError::Invalid {
                section: "path_profiles",
                field: entry.path.clone(),
                reason: format!("references undeclared profile '{}'", entry.profile),
            });
        }
    }

    Ok(())
}

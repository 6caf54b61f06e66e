mod types;

pub use types::*;

use anyhow::Result;
use std::path::PathBuf;
use tracing::info;

/// Returns the config directory: <config_dir>/driftview/
pub fn config_dir() -> Result<PathBuf> {
    let dir = dirs::config_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
        .join("driftview");
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Returns the config file path: <config_dir>/driftview/config.toml
pub fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

/// Load config from disk, or return default if not found.
pub fn load_config() -> Result<AppConfig> {
    let path = config_path()?;
    if path.exists() {
        let contents = std::fs::read_to_string(&path)?;
        let config = parse_config(&contents)?;
        info!(?path, "Loaded config");
        Ok(config)
    } else {
        info!("No config found, using defaults");
        Ok(AppConfig::default())
    }
}

/// Save config to disk.
pub fn save_config(config: &AppConfig) -> Result<()> {
    let path = config_path()?;
    let contents = toml::to_string_pretty(config)?;
    std::fs::write(&path, contents)?;
    info!(?path, "Saved config");
    Ok(())
}

/// Parse a TOML document into a config, filling omitted fields with defaults.
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    let mut config: AppConfig = toml::from_str(contents)?;
    config.viewport.initial_scale = clamp_scale(config.viewport.initial_scale);
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.feed.address, "127.0.0.1:5760");
        assert_eq!(config.viewport.initial_scale, 50.0);
        assert_eq!(config.render.path_stroke_px, 5.0);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = parse_config(
            r#"
            [feed]
            address = "192.168.1.20:9000"
            "#,
        )
        .unwrap();
        assert_eq!(config.feed.address, "192.168.1.20:9000");
        assert_eq!(config.feed.connect_timeout_ms, 3000);
        assert_eq!(config.render.grid_stroke_px, 2.0);
    }

    #[test]
    fn out_of_range_scale_is_clamped_on_load() {
        let config = parse_config("[viewport]\ninitial_scale = 10000.0\n").unwrap();
        assert_eq!(config.viewport.initial_scale, MAX_SCALE);

        let config = parse_config("[viewport]\ninitial_scale = 0.5\n").unwrap();
        assert_eq!(config.viewport.initial_scale, MIN_SCALE);
    }

    #[test]
    fn nan_scale_falls_back_to_default() {
        let config = parse_config("[viewport]\ninitial_scale = nan\n").unwrap();
        assert_eq!(config.viewport.initial_scale, DEFAULT_SCALE);

        let config = parse_config("[viewport]\ninitial_scale = inf\n").unwrap();
        assert_eq!(config.viewport.initial_scale, MAX_SCALE);
    }

    #[test]
    fn config_survives_toml_round_trip() {
        let mut config = AppConfig::default();
        config.viewport.initial_scale = 120.0;
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed = parse_config(&text).unwrap();
        assert_eq!(parsed.viewport.initial_scale, 120.0);
        assert_eq!(parsed.render.inertial_color, config.render.inertial_color);
    }

    #[test]
    fn malformed_document_is_an_error() {
        assert!(parse_config("[feed\naddress = 3").is_err());
    }
}

// src/config.rs

use anyhow::{Context, Result};
use serde::Deserialize;
use std::{env, fs, path::Path, path::PathBuf};

/// Env var naming an optional YAML settings file.
pub const CONFIG_ENV: &str = "SHEETPRESS_CONFIG";

/// Service settings: defaults, then an optional YAML file, then env vars.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub port: u16,
    /// Work dir for staged uploads, intermediate CSVs and finished archives.
    pub upload_dir: PathBuf,
    pub max_upload_mb: u64,
    pub log_level: String,
    /// Include the cause chain in failure responses.
    pub expose_error_details: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            port: 5000,
            upload_dir: PathBuf::from("uploads"),
            max_upload_mb: 100,
            log_level: "info".to_string(),
            expose_error_details: false,
        }
    }
}

impl Settings {
    /// Loads settings from the process environment.
    pub fn load() -> Result<Self> {
        let mut settings = match env::var(CONFIG_ENV) {
            Ok(path) => Self::from_yaml_file(&path)?,
            Err(_) => Self::default(),
        };
        settings.apply_overrides(|key| env::var(key).ok())?;
        Ok(settings)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading settings file {}", path.display()))?;
        serde_yaml::from_str(&raw)
            .with_context(|| format!("parsing settings file {}", path.display()))
    }

    /// Applies `PORT`, `UPLOAD_DIR`, `MAX_UPLOAD_MB`, `LOG_LEVEL` and
    /// `EXPOSE_ERROR_DETAILS` from `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT") {
            self.port = port.parse().with_context(|| format!("invalid PORT {:?}", port))?;
        }
        if let Some(dir) = lookup("UPLOAD_DIR") {
            self.upload_dir = PathBuf::from(dir);
        }
        if let Some(mb) = lookup("MAX_UPLOAD_MB") {
            self.max_upload_mb = mb
                .parse()
                .with_context(|| format!("invalid MAX_UPLOAD_MB {:?}", mb))?;
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            self.log_level = level;
        }
        if let Some(flag) = lookup("EXPOSE_ERROR_DETAILS") {
            self.expose_error_details = matches!(flag.as_str(), "1" | "true" | "yes");
        }
        Ok(())
    }

    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_mb * 1024 * 1024
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults_match_the_original_service() {
        let s = Settings::default();
        assert_eq!(s.port, 5000);
        assert_eq!(s.upload_dir, PathBuf::from("uploads"));
        assert_eq!(s.max_upload_bytes(), 100 * 1024 * 1024);
    }

    #[test]
    fn yaml_fills_missing_keys_with_defaults() -> Result<()> {
        let file = NamedTempFile::new()?;
        fs::write(file.path(), "port: 8080\nupload_dir: /tmp/sp\n")?;

        let s = Settings::from_yaml_file(file.path())?;
        assert_eq!(s.port, 8080);
        assert_eq!(s.upload_dir, PathBuf::from("/tmp/sp"));
        assert_eq!(s.max_upload_mb, 100);
        assert_eq!(s.log_level, "info");
        Ok(())
    }

    #[test]
    fn env_overrides_win() -> Result<()> {
        let vars: HashMap<&str, &str> = [
            ("PORT", "9000"),
            ("MAX_UPLOAD_MB", "5"),
            ("EXPOSE_ERROR_DETAILS", "true"),
        ]
        .into_iter()
        .collect();

        let mut s = Settings::default();
        s.apply_overrides(|k| vars.get(k).map(|v| v.to_string()))?;
        assert_eq!(s.port, 9000);
        assert_eq!(s.max_upload_bytes(), 5 * 1024 * 1024);
        assert!(s.expose_error_details);
        assert_eq!(s.log_level, "info");
        Ok(())
    }

    #[test]
    fn bad_port_is_rejected() {
        let mut s = Settings::default();
        assert!(s.apply_overrides(|k| (k == "PORT").then(|| "http".to_string())).is_err());
    }
}

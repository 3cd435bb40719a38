use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::AgoratuiError;

const DEFAULT_LOOKBACK_SECS: u64 = 60 * 60 * 24;

#[derive(Serialize, Deserialize, Debug)]
pub struct Config {
    pub server: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub last_login: Option<u64>,
}

impl Config {
    pub fn default_path() -> Result<PathBuf, AgoratuiError> {
        let home = dirs::home_dir()
            .ok_or_else(|| AgoratuiError::Config("could not find home directory".to_string()))?;
        Ok(home.join(".config/agoratui/config.json"))
    }

    pub fn load() -> Result<(Config, PathBuf), AgoratuiError> {
        let config_path = Config::default_path()?;
        let config = Config::load_from(&config_path)?;
        Ok((config, config_path))
    }

    pub fn load_from(path: &Path) -> Result<Config, AgoratuiError> {
        let file = File::open(path).map_err(|e| {
            AgoratuiError::Config(format!("could not open {}: {}", path.display(), e))
        })?;
        let reader = BufReader::new(file);
        let config: Config = serde_json::from_reader(reader)
            .map_err(|e| AgoratuiError::Config(format!("could not parse config: {}", e)))?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), AgoratuiError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self)?;
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }

    /// Fetch window start: last recorded login, or a day ago on first run.
    pub fn get_last_login(&self) -> u64 {
        match self.last_login {
            Some(login_date) => login_date,
            None => now_secs().saturating_sub(DEFAULT_LOOKBACK_SECS),
        }
    }

    pub fn update_last_login(&mut self) {
        self.last_login = Some(now_secs());
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = Config {
            server: "https://agora.example".to_string(),
            token: Some("sekrit".to_string()),
            last_login: None,
        };
        config.update_last_login();
        config.save(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.server, "https://agora.example");
        assert_eq!(loaded.token.as_deref(), Some("sekrit"));
        assert_eq!(loaded.last_login, config.last_login);
    }

    #[test]
    fn missing_optional_fields_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"server": "https://agora.example"}"#).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert!(loaded.token.is_none());
        assert!(loaded.last_login.is_none());
    }

    #[test]
    fn first_run_looks_back_a_day() {
        let config = Config {
            server: String::new(),
            token: None,
            last_login: None,
        };
        let window = config.get_last_login();
        assert!(window <= now_secs().saturating_sub(DEFAULT_LOOKBACK_SECS));
        assert!(window > 0);
    }
}

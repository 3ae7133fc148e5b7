use crate::agent::{default_api_url, DEFAULT_ASSISTANT_ID};
use crate::effort::{EffortLevel, DEFAULT_MODEL};
use crate::error::Result;
use crate::history::DEFAULT_HISTORY_LIMIT;
use crate::theme::ThemeVariant;
use directories::ProjectDirs;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "config.toml";
const DATABASE_FILE: &str = "history.db";
const LOG_FILE: &str = "domainscout.log";
const ENV_PREFIX: &str = "DOMAINSCOUT_";

#[derive(Debug, PartialEq, Eq)]
pub enum ValidationError {
    ApiUrl,
    AssistantId,
    Model,
    HistoryLimit,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let message = match self {
            Self::ApiUrl => "api_url must be an http(s) URL",
            Self::AssistantId => "assistant_id must not be empty",
            Self::Model => "model must not be empty",
            Self::HistoryLimit => "history_limit must be positive",
        };
        f.write_str(message)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Settings {
    pub theme: ThemeVariant,
    pub api_url: String,
    pub assistant_id: String,
    pub effort: EffortLevel,
    pub model: String,
    pub history_limit: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: ThemeVariant::default(),
            api_url: default_api_url().to_string(),
            assistant_id: DEFAULT_ASSISTANT_ID.to_string(),
            effort: EffortLevel::default(),
            model: DEFAULT_MODEL.to_string(),
            history_limit: DEFAULT_HISTORY_LIMIT,
            database_path: None,
        }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("dev", "domainscout", "domainscout")
}

pub fn config_dir() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn data_dir() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn log_path() -> PathBuf {
    data_dir().join(LOG_FILE)
}

impl Settings {
    /// Load from the user config dir, writing defaults on first run.
    pub fn new() -> Result<Self> {
        let path = config_dir().join(CONFIG_FILE);
        if !path.exists() {
            let defaults = Settings::default();
            if let Err(err) = defaults.save_to(&path) {
                tracing::warn!(error = %err, path = %path.display(), "could not write default config");
            }
        }
        Self::load_from(&path)
    }

    /// Defaults, then the TOML file, then `DOMAINSCOUT_*` variables.
    pub fn load_from(path: &Path) -> Result<Self> {
        let settings = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX))
            .extract()?;
        Ok(settings)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&config_dir().join(CONFIG_FILE))
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let toml_string = toml::to_string_pretty(self)?;
        fs::write(path, toml_string)?;
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(|| data_dir().join(DATABASE_FILE))
    }

    pub fn is_valid(&self) -> std::result::Result<(), ValidationError> {
        let url = self.api_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ValidationError::ApiUrl);
        }
        if self.assistant_id.trim().is_empty() {
            return Err(ValidationError::AssistantId);
        }
        if self.model.trim().is_empty() {
            return Err(ValidationError::Model);
        }
        if self.history_limit <= 0 {
            return Err(ValidationError::HistoryLimit);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(settings.assistant_id, "agent");
        assert_eq!(settings.model, DEFAULT_MODEL);
        assert_eq!(settings.effort, EffortLevel::Medium);
        assert_eq!(settings.history_limit, 50);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "api_url = \"https://agent.example.net\"\neffort = \"high\"\ntheme = \"Light\"\n",
        )
        .unwrap();
        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.api_url, "https://agent.example.net");
        assert_eq!(settings.effort, EffortLevel::High);
        assert_eq!(settings.theme, ThemeVariant::Light);
        assert_eq!(settings.assistant_id, "agent");
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("config.toml");
        let mut settings = Settings::default();
        settings.model = "gemini-2.0-flash".into();
        settings.database_path = Some(dir.path().join("h.db"));
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(&path).unwrap();
        assert_eq!(loaded.model, "gemini-2.0-flash");
        assert_eq!(loaded.database_path(), dir.path().join("h.db"));
    }

    #[test]
    fn test_validation() {
        assert!(Settings::default().is_valid().is_ok());

        let mut bad = Settings::default();
        bad.api_url = "localhost:2024".into();
        assert_eq!(bad.is_valid(), Err(ValidationError::ApiUrl));

        let mut bad = Settings::default();
        bad.assistant_id = " ".into();
        assert_eq!(bad.is_valid(), Err(ValidationError::AssistantId));

        let mut bad = Settings::default();
        bad.history_limit = 0;
        assert_eq!(bad.is_valid(), Err(ValidationError::HistoryLimit));
    }
}

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Length of a mock interview answer in seconds (default: 120)
    #[serde(default = "default_mock_seconds")]
    pub mock_seconds: u32,

    /// Shuffle the working set whenever the topic filter changes (default: false)
    #[serde(default)]
    pub shuffle_on_start: bool,

    /// Grade recorded for a correct quiz answer (default: 5)
    #[serde(default = "default_quiz_correct_grade")]
    pub quiz_correct_grade: i64,

    /// Grade recorded for a wrong quiz answer (default: 2)
    #[serde(default = "default_quiz_wrong_grade")]
    pub quiz_wrong_grade: i64,

    /// Question bank to use instead of the built-in one
    #[serde(default)]
    pub questions_path: Option<PathBuf>,

    /// Path to database file
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Directory progress exports are written to
    #[serde(default = "default_export_dir")]
    pub export_dir: PathBuf,

    /// Path to log file
    #[serde(default = "default_log_path")]
    pub log_path: PathBuf,
}

fn default_mock_seconds() -> u32 {
    120
}

fn default_quiz_correct_grade() -> i64 {
    5
}

fn default_quiz_wrong_grade() -> i64 {
    2
}

fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .map(|p| p.join("jitprep").join("jitprep.db"))
        .unwrap_or_else(|| PathBuf::from("jitprep.db"))
}

fn default_export_dir() -> PathBuf {
    dirs::download_dir().unwrap_or_else(|| PathBuf::from("."))
}

fn default_log_path() -> PathBuf {
    dirs::data_dir()
        .map(|p| p.join("jitprep").join("jitprep.log"))
        .unwrap_or_else(|| PathBuf::from("jitprep.log"))
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mock_seconds: default_mock_seconds(),
            shuffle_on_start: false,
            quiz_correct_grade: default_quiz_correct_grade(),
            quiz_wrong_grade: default_quiz_wrong_grade(),
            questions_path: None,
            db_path: default_db_path(),
            export_dir: default_export_dir(),
            log_path: default_log_path(),
        }
    }
}

fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(suffix) = path.strip_prefix("~")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(suffix);
    }
    path.to_path_buf()
}

impl Config {
    /// Load config from file or return defaults
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config: {}", config_path.display()))?;
        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Invalid config: {}", config_path.display()))?;
        config.questions_path = config.questions_path.as_deref().map(expand_tilde);
        config.db_path = expand_tilde(&config.db_path);
        config.export_dir = expand_tilde(&config.export_dir);
        config.log_path = expand_tilde(&config.log_path);
        Ok(config)
    }

    /// Path to config file
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .map(|p| p.join("jitprep").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// Ensure required directories exist
    pub fn ensure_dirs(&self) -> Result<()> {
        for path in [&self.db_path, &self.log_path] {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                std::fs::create_dir_all(parent)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = Config::load_from(Path::new("/nonexistent/jitprep/config.toml")).unwrap();
        assert_eq!(config.mock_seconds, 120);
        assert_eq!(config.quiz_correct_grade, 5);
        assert_eq!(config.quiz_wrong_grade, 2);
        assert!(config.questions_path.is_none());
    }

    #[test]
    fn test_partial_file() {
        let mut file = NamedTempFile::with_suffix(".toml").unwrap();
        writeln!(file, "mock_seconds = 90").unwrap();
        writeln!(file, "db_path = \"/tmp/jit.db\"").unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.mock_seconds, 90);
        assert_eq!(config.db_path, PathBuf::from("/tmp/jit.db"));
        assert!(!config.shuffle_on_start);
    }

    #[test]
    fn test_expand_tilde() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_tilde(Path::new("~/x.db")), home.join("x.db"));
        }
        assert_eq!(expand_tilde(Path::new("/abs")), PathBuf::from("/abs"));
    }
}

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const LOCAL_CONFIG_FILE: &str = "ytx.yaml";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where and how transcripts are delivered
    pub output: OutputConfig,

    /// Transcript service settings
    pub youtube: YoutubeConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory receiving `ytx-*.txt` files
    pub dir: PathBuf,

    /// Mirror the saved text to the system clipboard
    pub copy_to_clipboard: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct YoutubeConfig {
    /// Accept-Language header sent with every request
    pub accept_language: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("/tmp"),
            copy_to_clipboard: true,
        }
    }
}

impl Default for YoutubeConfig {
    fn default() -> Self {
        Self {
            accept_language: "en-US".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file, falling back to defaults when there is none
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load and validate a specific configuration file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs_err::read_to_string(path).context("Failed to read config file")?;

        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        config.validate()?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Get configuration file path
    fn config_path() -> Option<PathBuf> {
        let local_config = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_config.exists() {
            return Some(local_config);
        }

        dirs::config_dir().map(|dir| dir.join("ytx").join("config.yaml"))
    }

    fn validate(&self) -> Result<()> {
        if self.output.dir.as_os_str().is_empty() {
            anyhow::bail!("output.dir must not be empty");
        }

        if self.youtube.accept_language.trim().is_empty() {
            anyhow::bail!("youtube.accept_language must not be empty");
        }

        Ok(())
    }

    /// Use `dir` for output files instead of the configured one
    pub fn with_output_dir(mut self, dir: Option<PathBuf>) -> Self {
        if let Some(dir) = dir {
            self.output.dir = dir;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(content: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.output.dir, PathBuf::from("/tmp"));
        assert!(config.output.copy_to_clipboard);
        assert_eq!(config.youtube.accept_language, "en-US");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let (_dir, path) = write_config("output:\n  copy_to_clipboard: false\n");
        let config = Config::load_from(&path).unwrap();

        assert!(!config.output.copy_to_clipboard);
        assert_eq!(config.output.dir, PathBuf::from("/tmp"));
        assert_eq!(config.youtube, YoutubeConfig::default());
    }

    #[test]
    fn test_full_file() {
        let (_dir, path) = write_config(
            "output:\n  dir: /var/tmp/transcripts\n  copy_to_clipboard: true\nyoutube:\n  accept_language: pl-PL\n",
        );
        let config = Config::load_from(&path).unwrap();

        assert_eq!(config.output.dir, PathBuf::from("/var/tmp/transcripts"));
        assert_eq!(config.youtube.accept_language, "pl-PL");
    }

    #[test]
    fn test_empty_output_dir_rejected() {
        let (_dir, path) = write_config("output:\n  dir: \"\"\n");
        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("output.dir"));
    }

    #[test]
    fn test_malformed_file_rejected() {
        let (_dir, path) = write_config("output: [not, a, mapping]\n");
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_output_dir_override() {
        let config = Config::default().with_output_dir(Some(PathBuf::from("/data")));
        assert_eq!(config.output.dir, PathBuf::from("/data"));

        let config = Config::default().with_output_dir(None);
        assert_eq!(config.output.dir, PathBuf::from("/tmp"));
    }
}

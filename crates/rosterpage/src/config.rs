//! Configuration management for rosterpage.
//!
//! This module provides configuration loading and validation using figment,
//! supporting a TOML config file, environment variables, and defaults.

use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name, resolved against the working directory.
const CONFIG_FILE_NAME: &str = "rosterpage.toml";

/// Prefix for environment variable overrides.
const ENV_PREFIX: &str = "ROSTERPAGE_";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `ROSTERPAGE_`, `__` between sections)
/// 2. TOML config file, `rosterpage.toml` unless overridden
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Input data configuration.
    pub data: DataConfig,
    /// Generated page configuration.
    pub page: PageConfig,
    /// Download gate configuration.
    pub gate: GateConfig,
}

/// Input data configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Path to the registration JSON file.
    pub path: PathBuf,
}

/// Generated page configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    /// Where `render` writes the page.
    pub output_path: PathBuf,
    /// Value of the `lang` attribute on `<html>`.
    pub lang: String,
    /// Document title, also used as the top-level heading.
    pub title: String,
    /// External stylesheet to link. Empty disables the link.
    pub stylesheet: String,
    /// Label shown before each companion name.
    pub companion_label: String,
    /// Text of each download button.
    pub button_label: String,
    /// Heading of the verification modal.
    pub modal_title: String,
    /// Instructions shown in the verification modal.
    pub modal_prompt: String,
    /// Label of the code input.
    pub input_label: String,
    /// Text of the submit button.
    pub submit_label: String,
}

/// Download gate configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Directory, relative to the page, that PDFs are fetched from.
    pub download_dir: String,
    /// Number of digits in a verification code.
    pub code_length: usize,
    /// Minimum time between accepted submit attempts, in milliseconds.
    pub cooldown_ms: u64,
    /// Delay before a downloaded object URL is revoked, in milliseconds.
    pub revoke_delay_ms: u64,
    /// User-visible gate messages.
    pub messages: GateMessages,
}

/// Messages the gate shows inline in the modal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateMessages {
    /// Shown when a submit arrives inside the cooldown window.
    pub cooldown: String,
    /// Shown when the code has the wrong number of characters.
    pub wrong_length: String,
    /// Shown when the code contains non-digit characters.
    pub not_numeric: String,
    /// Shown when the code does not match.
    pub wrong_code: String,
    /// Shown when fetching the PDF fails.
    pub download_failed: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data_sekolah.json"),
        }
    }
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            output_path: PathBuf::from("index.html"),
            lang: "id".to_string(),
            title: "Daftar Peserta".to_string(),
            stylesheet: "style.css".to_string(),
            companion_label: "Pendamping".to_string(),
            button_label: "Download PDF".to_string(),
            modal_title: "Verifikasi Unduhan".to_string(),
            modal_prompt: "Masukkan 4 digit terakhir nomor telepon pendamping untuk mengunduh PDF."
                .to_string(),
            input_label: "Kode Verifikasi (4 Digit):".to_string(),
            submit_label: "Verifikasi dan Unduh".to_string(),
        }
    }
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            download_dir: "pdf_files".to_string(),
            code_length: 4,
            cooldown_ms: 1000,
            revoke_delay_ms: 100,
            messages: GateMessages::default(),
        }
    }
}

impl Default for GateMessages {
    fn default() -> Self {
        Self {
            cooldown: "Mohon tunggu sebentar sebelum mencoba lagi.".to_string(),
            wrong_length: "Kode harus berupa 4 digit angka.".to_string(),
            not_numeric: "Kode harus berupa angka.".to_string(),
            wrong_code: "Kode verifikasi salah.".to_string(),
            download_failed: "Gagal mengunduh file. Silakan coba lagi nanti.".to_string(),
        }
    }
}

impl GateConfig {
    /// Minimum time between accepted submit attempts.
    #[must_use]
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }
}

impl GateMessages {
    fn entries(&self) -> [(&'static str, &str); 5] {
        [
            ("cooldown", &self.cooldown),
            ("wrong_length", &self.wrong_length),
            ("not_numeric", &self.not_numeric),
            ("wrong_code", &self.wrong_code),
            ("download_failed", &self.download_failed),
        ]
    }
}

impl Config {
    /// Load configuration with an optional custom config path.
    ///
    /// A missing config file is not an error; defaults apply.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading, parsing or validation fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        PathBuf::from(CONFIG_FILE_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.gate.code_length == 0 {
            return Err(Error::ConfigValidation {
                message: "gate.code_length must be greater than 0".to_string(),
            });
        }

        validate_download_dir(&self.gate.download_dir)?;

        if self.page.output_path.as_os_str().is_empty() {
            return Err(Error::ConfigValidation {
                message: "page.output_path must not be empty".to_string(),
            });
        }

        for (name, message) in self.gate.messages.entries() {
            if message.trim().is_empty() {
                return Err(Error::ConfigValidation {
                    message: format!("gate.messages.{name} must not be empty"),
                });
            }
        }

        Ok(())
    }
}

/// The download directory must be a non-empty relative path that stays below
/// the page's directory.
fn validate_download_dir(dir: &str) -> Result<()> {
    let invalid = |reason: &str| Error::ConfigValidation {
        message: format!("gate.download_dir {dir:?} {reason}"),
    };

    if dir.trim().is_empty() {
        return Err(invalid("must not be empty"));
    }
    for component in Path::new(dir).components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            Component::ParentDir => return Err(invalid("must not contain '..'")),
            Component::RootDir | Component::Prefix(_) => {
                return Err(invalid("must be a relative path"));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.data.path, PathBuf::from("data_sekolah.json"));
        assert_eq!(config.page.output_path, PathBuf::from("index.html"));
        assert_eq!(config.gate.download_dir, "pdf_files");
        assert_eq!(config.gate.code_length, 4);
    }

    #[test]
    fn test_default_page_config() {
        let page = PageConfig::default();

        assert_eq!(page.lang, "id");
        assert_eq!(page.companion_label, "Pendamping");
        assert_eq!(page.button_label, "Download PDF");
        assert_eq!(page.stylesheet, "style.css");
    }

    #[test]
    fn test_default_gate_messages_are_distinct() {
        let messages = GateMessages::default();
        let entries = messages.entries();
        for (i, (_, a)) in entries.iter().enumerate() {
            for (_, b) in &entries[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_zero_code_length() {
        let mut config = Config::default();
        config.gate.code_length = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("code_length"));
    }

    #[test]
    fn test_validate_download_dir_rejects_parent() {
        let mut config = Config::default();
        config.gate.download_dir = "../secret".to_string();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("'..'"));
    }

    #[test]
    fn test_validate_download_dir_rejects_absolute() {
        let mut config = Config::default();
        config.gate.download_dir = "/var/pdf".to_string();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("relative"));
    }

    #[test]
    fn test_validate_download_dir_rejects_empty() {
        let mut config = Config::default();
        config.gate.download_dir = "  ".to_string();

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_nested_download_dir() {
        let mut config = Config::default();
        config.gate.download_dir = "assets/pdf".to_string();

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_empty_message() {
        let mut config = Config::default();
        config.gate.messages.wrong_code = String::new();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("gate.messages.wrong_code"));
    }

    #[test]
    fn test_validate_empty_output_path() {
        let mut config = Config::default();
        config.page.output_path = PathBuf::new();

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_gate_cooldown() {
        let mut gate = GateConfig::default();
        assert_eq!(gate.cooldown(), Duration::from_millis(1000));

        gate.cooldown_ms = 0;
        assert_eq!(gate.cooldown(), Duration::ZERO);
    }

    #[test]
    fn test_default_config_path() {
        assert_eq!(
            Config::default_config_path(),
            PathBuf::from("rosterpage.toml")
        );
    }

    #[test]
    fn test_load_nonexistent_config() {
        let config = Config::load_from(Some(PathBuf::from("/nonexistent/rosterpage.toml")))
            .expect("missing config file falls back to defaults");
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rosterpage.toml");
        std::fs::write(
            &path,
            r#"
            [page]
            title = "Daftar Peserta Bebras Challenge 2025"

            [gate]
            cooldown_ms = 250
            download_dir = "berkas"
            "#,
        )
        .unwrap();

        let config = Config::load_from(Some(path)).unwrap();
        assert_eq!(config.page.title, "Daftar Peserta Bebras Challenge 2025");
        assert_eq!(config.gate.cooldown_ms, 250);
        assert_eq!(config.gate.download_dir, "berkas");
        assert_eq!(config.gate.code_length, 4);
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rosterpage.toml");
        std::fs::write(&path, "[gate]\ncode_length = 0\n").unwrap();

        let result = Config::load_from(Some(path));
        assert!(matches!(result, Err(Error::ConfigValidation { .. })));
    }

    #[test]
    fn test_load_rejects_malformed_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rosterpage.toml");
        std::fs::write(&path, "[gate\ncooldown_ms = ").unwrap();

        let result = Config::load_from(Some(path));
        assert!(matches!(result, Err(Error::ConfigLoad(_))));
    }

    #[test]
    fn test_gate_messages_deserialize_partial() {
        let json = r#"{"wrong_code": "Wrong code."}"#;
        let messages: GateMessages = serde_json::from_str(json).unwrap();
        assert_eq!(messages.wrong_code, "Wrong code.");
        assert_eq!(messages.cooldown, GateMessages::default().cooldown);
    }

    #[test]
    fn test_config_serialize() {
        let json = serde_json::to_string(&Config::default()).unwrap();
        assert!(json.contains("download_dir"));
        assert!(json.contains("cooldown_ms"));
    }
}

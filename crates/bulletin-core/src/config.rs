use crate::bulletin::DEFAULT_WELCOME_MESSAGE;
use crate::schedule::{parse_timezone, parse_weekday};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_DIR_NAME: &str = "bulletin";
const CONFIG_FILE_NAME: &str = "config.toml";
const CURRENT_SCHEMA_VERSION: u32 = 1;
pub const DEFAULT_WEEKDAY: &str = "sunday";
pub const DEFAULT_TIMEZONE: &str = "America/Detroit";
pub const DEFAULT_SERVICES: [&str; 2] = ["morning", "evening"];
pub const DEFAULT_FOOTNOTE_GLYPH: &str = "*";

/// Result returned by [`load_config`], capturing the source and any non-fatal issues.
#[derive(Debug, Clone)]
pub struct ConfigLoadResult {
    pub config: FileConfig,
    pub warnings: Vec<String>,
    pub source: ConfigSource,
}

/// Indicates where the configuration was loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    /// No persisted configuration was found or usable; defaults were synthesized.
    Default,
    /// Configuration was read from `config.toml`.
    File,
}

/// Errors that can occur when persisting configuration.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Ser(toml::ser::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "IO error: {err}"),
            ConfigError::Ser(err) => write!(f, "TOML serialization error: {err}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<toml::ser::Error> for ConfigError {
    fn from(value: toml::ser::Error) -> Self {
        Self::Ser(value)
    }
}

/// Disk-backed configuration schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default = "FileConfig::schema_version")]
    pub schema_version: u32,
    #[serde(default)]
    pub store: StorePreferences,
    #[serde(default)]
    pub build: BuildPreferences,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            store: StorePreferences::default(),
            build: BuildPreferences::default(),
        }
    }
}

impl FileConfig {
    const fn schema_version() -> u32 {
        CURRENT_SCHEMA_VERSION
    }
}

/// Where parameter records and order-of-worship skeletons live.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorePreferences {
    #[serde(default = "StorePreferences::default_data_dir")]
    pub data_dir: String,
}

impl Default for StorePreferences {
    fn default() -> Self {
        Self {
            data_dir: Self::default_data_dir(),
        }
    }
}

impl StorePreferences {
    fn default_data_dir() -> String {
        config_directory()
            .join("data")
            .to_string_lossy()
            .into_owned()
    }
}

/// Preferences for a bulletin build that map closely to CLI flag behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildPreferences {
    #[serde(default = "BuildPreferences::default_services")]
    pub services: Vec<String>,
    #[serde(default = "BuildPreferences::default_weekday")]
    pub weekday: String,
    #[serde(default = "BuildPreferences::default_timezone")]
    pub timezone: String,
    #[serde(default)]
    pub weeks_offset: i32,
    #[serde(default)]
    pub output_format: OutputFormat,
    #[serde(default)]
    pub output_path: Option<String>,
    #[serde(default = "BuildPreferences::default_footnote_glyph")]
    pub footnote_glyph: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub welcome_message: Option<String>,
}

impl Default for BuildPreferences {
    fn default() -> Self {
        Self {
            services: Self::default_services(),
            weekday: Self::default_weekday(),
            timezone: Self::default_timezone(),
            weeks_offset: 0,
            output_format: OutputFormat::default(),
            output_path: None,
            footnote_glyph: Self::default_footnote_glyph(),
            title: None,
            welcome_message: None,
        }
    }
}

impl BuildPreferences {
    fn default_services() -> Vec<String> {
        DEFAULT_SERVICES.iter().map(|s| s.to_string()).collect()
    }

    fn default_weekday() -> String {
        DEFAULT_WEEKDAY.to_string()
    }

    fn default_timezone() -> String {
        DEFAULT_TIMEZONE.to_string()
    }

    fn default_footnote_glyph() -> String {
        DEFAULT_FOOTNOTE_GLYPH.to_string()
    }

    /// Welcome text to print, falling back to the built-in greeting.
    pub fn welcome_message_or_default(&self) -> String {
        self.welcome_message
            .clone()
            .unwrap_or_else(|| DEFAULT_WELCOME_MESSAGE.to_string())
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Text => "txt",
            OutputFormat::Json => "json",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "text" | "txt" => Some(OutputFormat::Text),
            "json" => Some(OutputFormat::Json),
            _ => None,
        }
    }
}

/// Path to the configuration directory.
pub fn config_directory() -> PathBuf {
    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
}

/// Path to `config.toml`.
pub fn config_path() -> PathBuf {
    config_directory().join(CONFIG_FILE_NAME)
}

/// Load the configuration from the default location, falling back to defaults.
pub fn load_config() -> ConfigLoadResult {
    load_config_from(&config_path())
}

/// Load the configuration from `path`, falling back to defaults.
pub fn load_config_from(path: &Path) -> ConfigLoadResult {
    let mut warnings = Vec::new();

    if path.exists() {
        match fs::read_to_string(path) {
            Ok(raw) => match toml::from_str::<FileConfig>(&raw) {
                Ok(cfg) => {
                    let (cfg, mut sanitize_warnings) = sanitize_config(cfg);
                    warnings.append(&mut sanitize_warnings);
                    return ConfigLoadResult {
                        config: cfg,
                        warnings,
                        source: ConfigSource::File,
                    };
                }
                Err(err) => {
                    warnings.push(format!(
                        "Failed to parse {} as TOML: {}. Falling back to defaults.",
                        path.display(),
                        err
                    ));
                }
            },
            Err(err) => {
                warnings.push(format!(
                    "Failed to read {}: {}. Falling back to defaults.",
                    path.display(),
                    err
                ));
            }
        }
    }

    // Default fallback
    ConfigLoadResult {
        config: FileConfig::default(),
        warnings,
        source: ConfigSource::Default,
    }
}

/// Persist the configuration to the default location.
pub fn save_config(config: &FileConfig) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(config, &path)?;
    Ok(path)
}

/// Persist the configuration to `path`.
pub fn save_config_to(config: &FileConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, render_config(config)?)?;
    Ok(())
}

/// The TOML text [`save_config_to`] writes.
pub fn render_config(config: &FileConfig) -> Result<String, ConfigError> {
    Ok(toml::to_string_pretty(config)?)
}

fn sanitize_config(mut config: FileConfig) -> (FileConfig, Vec<String>) {
    let mut warnings = Vec::new();

    if config.schema_version != CURRENT_SCHEMA_VERSION {
        warnings.push(format!(
            "Unknown config schema version {}. Resetting to {}.",
            config.schema_version, CURRENT_SCHEMA_VERSION
        ));
        config = FileConfig::default();
        return (config, warnings);
    }

    if config.store.data_dir.trim().is_empty() {
        warnings.push("Empty store.data_dir. Resetting to the default data directory.".to_string());
        config.store = StorePreferences::default();
    }

    let build = &mut config.build;

    let mut seen = HashSet::new();
    let mut duplicates = Vec::new();
    build.services = build
        .services
        .iter()
        .map(|service| service.trim().to_string())
        .filter(|service| !service.is_empty())
        .filter(|service| {
            if seen.insert(service.clone()) {
                true
            } else {
                duplicates.push(service.clone());
                false
            }
        })
        .collect();
    if !duplicates.is_empty() {
        warnings.push(format!(
            "Removed duplicate services: {}",
            duplicates.join(", ")
        ));
    }
    if build.services.is_empty() {
        warnings.push(format!(
            "No services configured. Resetting to {}.",
            DEFAULT_SERVICES.join(", ")
        ));
        build.services = BuildPreferences::default_services();
    }

    if parse_weekday(&build.weekday).is_none() {
        warnings.push(format!(
            "Unknown weekday '{}'. Resetting to '{}'.",
            build.weekday, DEFAULT_WEEKDAY
        ));
        build.weekday = DEFAULT_WEEKDAY.to_string();
    }

    if parse_timezone(&build.timezone).is_none() {
        warnings.push(format!(
            "Unknown timezone '{}'. Resetting to '{}'.",
            build.timezone, DEFAULT_TIMEZONE
        ));
        build.timezone = DEFAULT_TIMEZONE.to_string();
    }

    if build.footnote_glyph.trim().is_empty() {
        warnings.push(format!(
            "Empty footnote_glyph. Resetting to '{}'.",
            DEFAULT_FOOTNOTE_GLYPH
        ));
        build.footnote_glyph = DEFAULT_FOOTNOTE_GLYPH.to_string();
    }

    if build
        .output_path
        .as_ref()
        .is_some_and(|path| path.trim().is_empty())
    {
        build.output_path = None;
    }

    (config, warnings)
}

/// Represents overrides sourced from CLI flags.
#[derive(Debug, Default, Clone)]
pub struct RuntimeOverrides {
    pub service_date: Option<String>,
    pub weeks_offset: Option<i32>,
    pub services: Option<Vec<String>>,
    pub data_dir: Option<String>,
    pub output_format: Option<OutputFormat>,
    pub output_path: Option<Option<String>>,
    pub dry_run: Option<bool>,
}

impl RuntimeOverrides {
    pub fn is_empty(&self) -> bool {
        self.service_date.is_none()
            && self.weeks_offset.is_none()
            && self.services.is_none()
            && self.data_dir.is_none()
            && self.output_format.is_none()
            && self.output_path.is_none()
            && self.dry_run.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_sanitize_duplicate_and_blank_services() {
        let mut config = FileConfig::default();
        config.build.services = vec![
            "morning".to_string(),
            " ".to_string(),
            "morning".to_string(),
            "evening".to_string(),
        ];

        let (sanitized, warnings) = sanitize_config(config);

        assert_eq!(sanitized.build.services, vec!["morning", "evening"]);
        assert!(
            warnings.iter().any(|w| w.contains("duplicate")),
            "Should warn about duplicate services"
        );
    }

    #[test]
    fn test_sanitize_empty_services_resets_to_defaults() {
        let mut config = FileConfig::default();
        config.build.services.clear();

        let (sanitized, warnings) = sanitize_config(config);

        assert_eq!(sanitized.build.services, vec!["morning", "evening"]);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_sanitize_invalid_weekday_and_timezone() {
        let mut config = FileConfig::default();
        config.build.weekday = "funday".to_string();
        config.build.timezone = "Nowhere/Special".to_string();

        let (sanitized, warnings) = sanitize_config(config);

        assert_eq!(sanitized.build.weekday, DEFAULT_WEEKDAY);
        assert_eq!(sanitized.build.timezone, DEFAULT_TIMEZONE);
        assert_eq!(warnings.len(), 2);
    }

    #[test]
    fn test_sanitize_empty_glyph_and_output_path() {
        let mut config = FileConfig::default();
        config.build.footnote_glyph = String::new();
        config.build.output_path = Some("   ".to_string());

        let (sanitized, warnings) = sanitize_config(config);

        assert_eq!(sanitized.build.footnote_glyph, DEFAULT_FOOTNOTE_GLYPH);
        assert_eq!(sanitized.build.output_path, None);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_sanitize_wrong_schema_version() {
        let mut config = FileConfig::default();
        config.schema_version = 99;
        config.build.weeks_offset = 3;

        let (sanitized, warnings) = sanitize_config(config);

        assert_eq!(sanitized, FileConfig::default());
        assert!(warnings[0].contains("schema version 99"));
    }

    #[test]
    fn test_load_config_bad_toml() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        fs::write(&path, "[build\nservices = ").expect("write config");

        let result = load_config_from(&path);

        assert_eq!(result.source, ConfigSource::Default);
        assert!(result.warnings[0].contains("Failed to parse"));
    }

    #[test]
    fn test_load_config_missing_file_is_default() {
        let temp = tempdir().expect("tempdir");
        let result = load_config_from(&temp.path().join("absent.toml"));

        assert_eq!(result.source, ConfigSource::Default);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_save_and_load_config() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("nested").join("config.toml");
        let mut config = FileConfig::default();
        config.store.data_dir = "~/bulletin-data".to_string();
        config.build.services = vec!["evening".to_string()];
        config.build.output_format = OutputFormat::Json;
        config.build.welcome_message = Some("Welcome, friends!".to_string());

        save_config_to(&config, &path).expect("save config");
        let result = load_config_from(&path);

        assert_eq!(result.source, ConfigSource::File);
        assert!(result.warnings.is_empty());
        assert_eq!(result.config, config);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        fs::write(&path, "[build]\nweeks_offset = 1\noutput_format = \"json\"\n")
            .expect("write config");

        let result = load_config_from(&path);

        assert_eq!(result.config.build.weeks_offset, 1);
        assert_eq!(result.config.build.output_format, OutputFormat::Json);
        assert_eq!(result.config.build.weekday, DEFAULT_WEEKDAY);
        assert_eq!(result.config.build.services, vec!["morning", "evening"]);
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!(OutputFormat::parse("JSON"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::parse("txt"), Some(OutputFormat::Text));
        assert_eq!(OutputFormat::parse("pdf"), None);
        assert_eq!(OutputFormat::Json.extension(), "json");
    }
}

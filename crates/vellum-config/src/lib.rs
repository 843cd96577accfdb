//! Vellum settings.
//!
//! Settings come from a `vellum.toml` file, found either at an explicit path
//! or by walking up from the working directory. Command-line overrides in
//! [`CliSettings`] win over the file.
//!
//! ## Path variables
//!
//! `docs.source_dir` and `cache.dir` may reference environment variables as
//! `${VAR}` (must be set) or `${VAR:-fallback}`.

mod expand;

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Command-line overrides.
///
/// A `None` field leaves the loaded value untouched.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Replaces `docs.source_dir`.
    pub source_dir: Option<PathBuf>,
    /// Replaces `docs.default_locale`.
    pub default_locale: Option<String>,
    /// Replaces `cache.enabled`.
    pub cache_enabled: Option<bool>,
    /// Replaces `display.title_from_heading`.
    pub title_from_heading: Option<bool>,
}

/// File looked up during discovery.
const CONFIG_FILENAME: &str = "vellum.toml";

/// Deepest heading level a document may have.
const MAX_HEADING_DEPTH: u8 = 6;

/// Loaded settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// `[docs]` table as written.
    docs: DocsConfigRaw,
    /// `[display]` table.
    pub display: DisplaySettings,
    /// `[cache]` table as written.
    cache: CacheConfigRaw,

    /// `[docs]` with paths anchored at the file's directory.
    #[serde(skip)]
    pub docs_resolved: DocsConfig,
    /// `[cache]` with paths anchored at the file's directory.
    #[serde(skip)]
    pub cache_resolved: CacheConfig,
    /// File the settings were read from, if any.
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// `[docs]` before variable expansion.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct DocsConfigRaw {
    source_dir: Option<String>,
    default_locale: Option<String>,
    wiki: Option<String>,
}

/// Document source settings.
#[derive(Debug)]
pub struct DocsConfig {
    /// Source directory for documents.
    pub source_dir: PathBuf,
    /// Locale of untranslated documents and of requests without one.
    pub default_locale: String,
    /// Wiki the source directory belongs to.
    pub wiki: String,
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("docs"),
            default_locale: "en".to_owned(),
            wiki: "main".to_owned(),
        }
    }
}

/// How recoverable failures in fallback-eligible steps are handled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackPolicy {
    /// Log a warning and continue with the next fallback.
    #[default]
    Lenient,
    /// Report the failure to the caller.
    Strict,
}

impl FallbackPolicy {
    /// Whether recoverable failures are reported instead of logged.
    #[must_use]
    pub fn is_strict(self) -> bool {
        self == Self::Strict
    }
}

/// Display compatibility settings.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    /// Extract the title from the first heading when the title field is blank.
    pub title_from_heading: bool,
    /// Deepest heading level eligible for title extraction.
    pub title_heading_depth: u8,
    /// Handling of recoverable failures.
    pub fallback: FallbackPolicy,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            title_from_heading: false,
            title_heading_depth: 2,
            fallback: FallbackPolicy::Lenient,
        }
    }
}

impl DisplaySettings {
    /// Enable or disable heading-based title extraction.
    #[must_use]
    pub fn with_title_from_heading(mut self, enabled: bool) -> Self {
        self.title_from_heading = enabled;
        self
    }

    /// Set the deepest heading level eligible for title extraction.
    #[must_use]
    pub fn with_title_heading_depth(mut self, depth: u8) -> Self {
        self.title_heading_depth = depth;
        self
    }

    /// Set the fallback policy.
    #[must_use]
    pub fn with_fallback(mut self, fallback: FallbackPolicy) -> Self {
        self.fallback = fallback;
        self
    }

    /// Validate display settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if the heading depth is out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_HEADING_DEPTH).contains(&self.title_heading_depth) {
            return Err(ConfigError::Validation(format!(
                "display.title_heading_depth must be between 1 and {MAX_HEADING_DEPTH}"
            )));
        }
        Ok(())
    }
}

/// `[cache]` before variable expansion.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct CacheConfigRaw {
    enabled: Option<bool>,
    dir: Option<String>,
    version: Option<String>,
}

/// Resolved render cache configuration.
#[derive(Debug)]
pub struct CacheConfig {
    /// Whether rendered trees are cached.
    pub enabled: bool,
    /// Cache root directory.
    pub dir: PathBuf,
    /// Cache format version; a mismatch wipes the cache.
    pub version: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: PathBuf::from(".vellum/cache"),
            version: default_cache_version(),
        }
    }
}

fn default_cache_version() -> String {
    env!("CARGO_PKG_VERSION").to_owned()
}

/// Failure to produce a [`Config`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An explicit settings file does not exist.
    #[error("Settings file {} does not exist", .0.display())]
    NotFound(PathBuf),
    /// The settings file could not be read.
    #[error("Cannot read settings: {0}")]
    Io(#[from] std::io::Error),
    /// The settings file is not valid TOML for [`Config`].
    #[error("Malformed settings: {0}")]
    Parse(#[from] toml::de::Error),
    /// A value is out of range.
    #[error("Invalid setting: {0}")]
    Validation(String),
    /// A path variable could not be expanded.
    #[error("Cannot expand {field}: {message}")]
    EnvVar {
        /// Dotted key, e.g. `cache.dir`.
        field: String,
        /// Expansion failure.
        message: String,
    },
}

fn ensure_present(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        Err(ConfigError::Validation(format!("{field} must not be empty")))
    } else {
        Ok(())
    }
}

impl Config {
    /// Read settings from `config_path`, or from the nearest `vellum.toml`
    /// above the working directory, then apply `overrides`.
    ///
    /// Without any file the defaults are anchored at the working directory.
    ///
    /// # Errors
    ///
    /// Fails when an explicit path is missing, or when the file cannot be
    /// read, parsed, expanded or validated.
    pub fn load(
        config_path: Option<&Path>,
        overrides: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let file = match config_path {
            Some(path) if !path.exists() => {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Some(path) => Some(path.to_path_buf()),
            None => Self::discover_config(),
        };
        let mut config = match file {
            Some(path) => Self::read(&path)?,
            None => Self::default_with_base(&std::env::current_dir().unwrap_or_default()),
        };

        if let Some(overrides) = overrides {
            config.override_with(overrides);
        }
        Ok(config)
    }

    fn override_with(&mut self, settings: &CliSettings) {
        if let Some(source_dir) = &settings.source_dir {
            self.docs_resolved.source_dir.clone_from(source_dir);
        }
        if let Some(locale) = &settings.default_locale {
            self.docs_resolved.default_locale.clone_from(locale);
        }
        if let Some(cache_enabled) = settings.cache_enabled {
            self.cache_resolved.enabled = cache_enabled;
        }
        if let Some(title_from_heading) = settings.title_from_heading {
            self.display.title_from_heading = title_from_heading;
        }
    }

    fn discover_config() -> Option<PathBuf> {
        let cwd = std::env::current_dir().ok()?;
        cwd.ancestors()
            .map(|dir| dir.join(CONFIG_FILENAME))
            .find(|candidate| candidate.is_file())
    }

    /// Defaults with paths under `base`.
    fn default_with_base(base: &Path) -> Self {
        Self {
            docs: DocsConfigRaw::default(),
            display: DisplaySettings::default(),
            cache: CacheConfigRaw::default(),
            docs_resolved: DocsConfig {
                source_dir: base.join("docs"),
                ..DocsConfig::default()
            },
            cache_resolved: CacheConfig {
                dir: base.join(".vellum/cache"),
                ..CacheConfig::default()
            },
            config_path: None,
        }
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(&std::fs::read_to_string(path)?)?;

        // Variables first: an expanded value may itself be relative.
        config.expand_env_vars()?;
        config.resolve_paths(path.parent().unwrap_or(Path::new(".")));
        config.config_path = Some(path.to_path_buf());
        config.validate()?;
        Ok(config)
    }

    /// Check resolved values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` naming the first offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_present(&self.docs_resolved.wiki, "docs.wiki")?;
        ensure_present(&self.docs_resolved.default_locale, "docs.default_locale")?;
        if self.docs_resolved.wiki.contains([':', '.']) {
            return Err(ConfigError::Validation(
                "docs.wiki cannot contain ':' or '.'".to_owned(),
            ));
        }
        self.display.validate()?;
        ensure_present(&self.cache_resolved.version, "cache.version")?;
        Ok(())
    }

    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        for (value, field) in [
            (&mut self.docs.source_dir, "docs.source_dir"),
            (&mut self.cache.dir, "cache.dir"),
        ] {
            if let Some(raw) = value.as_deref() {
                *value = Some(expand::expand_env(raw, field)?);
            }
        }
        Ok(())
    }

    /// Anchor relative paths at `base` and fill in defaults.
    fn resolve_paths(&mut self, base: &Path) {
        let anchored = |path: Option<&str>, default: &str| base.join(path.unwrap_or(default));
        let defaults = DocsConfig::default();

        self.docs_resolved = DocsConfig {
            source_dir: anchored(self.docs.source_dir.as_deref(), "docs"),
            default_locale: self
                .docs
                .default_locale
                .clone()
                .unwrap_or(defaults.default_locale),
            wiki: self.docs.wiki.clone().unwrap_or(defaults.wiki),
        };

        self.cache_resolved = CacheConfig {
            enabled: self.cache.enabled.unwrap_or(true),
            dir: anchored(self.cache.dir.as_deref(), ".vellum/cache"),
            version: self
                .cache
                .version
                .clone()
                .unwrap_or_else(default_cache_version),
        };
    }
}

//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveTime;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

use td_core::{Lexicon, RelevanceConfig, SlotConfig};

const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
const CLOCK_FORMAT: &str = "%H:%M";

/// Working day as `HH:MM` strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingHours {
    pub start: String,
    pub end: String,
    pub skip_weekends: bool,
}

impl Default for WorkingHours {
    fn default() -> Self {
        Self {
            start: "09:00".to_string(),
            end: "17:00".to_string(),
            skip_weekends: true,
        }
    }
}

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Claude API key, required only by `--ai`.
    pub api_key: Option<String>,
    pub model: String,
    pub working_hours: WorkingHours,
    pub search_horizon_days: u32,
    /// Limits for selecting relevant context in `plan`.
    pub context: RelevanceConfig,
    pub lexicon: Lexicon,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("model", &self.model)
            .field("working_hours", &self.working_hours)
            .field("search_horizon_days", &self.search_horizon_days)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            working_hours: WorkingHours::default(),
            search_horizon_days: 14,
            context: RelevanceConfig::default(),
            lexicon: Lexicon::default(),
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    ///
    /// Later sources win: defaults, the user config file, `path`, then
    /// `TD_*` environment variables (`__` separates nested keys, as in
    /// `TD_WORKING_HOURS__START`).
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment = figment.merge(Env::prefixed("TD_").split("__"));

        figment.extract()
    }

    /// Slot search constraints from the working-hours section.
    pub fn slot_config(&self) -> Result<SlotConfig> {
        let parse = |value: &str, field: &str| {
            NaiveTime::parse_from_str(value.trim(), CLOCK_FORMAT)
                .with_context(|| format!("working_hours.{field} must be HH:MM, got {value:?}"))
        };
        Ok(SlotConfig {
            work_start: parse(&self.working_hours.start, "start")?,
            work_end: parse(&self.working_hours.end, "end")?,
            horizon_days: self.search_horizon_days,
            skip_weekends: self.working_hours.skip_weekends,
        })
    }

    /// The API key, if set to something other than whitespace.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }
}

/// Returns the platform-specific config directory for td.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("td"))
}

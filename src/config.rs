// File: ./src/config.rs
// Handles configuration loading, validation, and first-run template.
use crate::context::AppContext;
use crate::model::EventColor;
use anyhow::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;

const MINUTES_PER_DAY: u32 = 24 * 60;

fn default_log_level() -> String {
    "info".to_string()
}
fn default_start_hour() -> u32 {
    0
}
fn default_end_hour() -> u32 {
    24
}
fn default_column_width() -> u16 {
    25
}
fn default_refresh_interval() -> u64 {
    300
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct CalendarConfig {
    pub id: String,
    #[serde(default)]
    pub color: EventColor,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct AccountConfig {
    pub name: String,
    /// Path to the account's OAuth token file; `~` is expanded.
    pub credentials: String,
    #[serde(default)]
    pub calendars: Vec<CalendarConfig>,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct Config {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_start_hour")]
    pub start_hour: u32,
    #[serde(default = "default_end_hour")]
    pub end_hour: u32,
    #[serde(default = "default_column_width")]
    pub column_width: u16,
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,
    /// Overrides the system's local UTC offset.
    #[serde(default)]
    pub utc_offset_minutes: Option<i32>,
    #[serde(default)]
    pub accounts: Vec<AccountConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            start_hour: default_start_hour(),
            end_hour: default_end_hour(),
            column_width: default_column_width(),
            refresh_interval_secs: default_refresh_interval(),
            utc_offset_minutes: None,
            accounts: Vec::new(),
        }
    }
}

const TEMPLATE: &str = r#"# gcal-tui configuration
# start_hour = 0
# end_hour = 24
# column_width = 25
# refresh_interval_secs = 300
# utc_offset_minutes = 420
# log_level = "info"

# Create the token file with: gcal-tui auth personal --client-secret <client_secret.json>
[[accounts]]
name = "personal"
credentials = "~/.config/gcal-tui/personal.json"
calendars = [
    { id = "primary", color = "green" },
]
"#;

impl Config {
    /// Load the configuration from disk using an explicit context.
    /// Returns a contextualized error if reading, parsing or validation fails.
    pub fn load(ctx: &dyn AppContext) -> Result<Self> {
        let path = ctx.config_file()?;

        if !path.exists() {
            return Err(anyhow::anyhow!("Config file not found"));
        }

        let contents = fs::read_to_string(&path).map_err(|e| {
            anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e)
        })?;

        let config = Self::parse(&contents).map_err(|e| {
            anyhow::anyhow!("Invalid config file '{}': {}", path.display(), e)
        })?;

        Ok(config)
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.accounts.is_empty() {
            anyhow::bail!("no accounts configured");
        }
        for acc in &self.accounts {
            if acc.calendars.is_empty() {
                anyhow::bail!("account '{}' has no calendars", acc.name);
            }
        }
        if self.end_hour > 24 {
            anyhow::bail!("end_hour must be at most 24");
        }
        if self.start_hour >= self.end_hour {
            anyhow::bail!("start_hour must be before end_hour");
        }
        if self.column_width < 4 {
            anyhow::bail!("column_width must be at least 4");
        }
        if let Some(m) = self.utc_offset_minutes
            && m.unsigned_abs() >= MINUTES_PER_DAY
        {
            anyhow::bail!("utc_offset_minutes must be within (-1440, 1440), got {}", m);
        }
        Ok(())
    }

    /// Helper to detect whether an anyhow::Error indicates that the config file was missing.
    pub fn is_missing_config_error(err: &Error) -> bool {
        if err.to_string().contains("Config file not found") {
            return true;
        }

        for cause in err.chain() {
            if let Some(io_err) = cause.downcast_ref::<std::io::Error>()
                && io_err.kind() == std::io::ErrorKind::NotFound
            {
                return true;
            }
        }

        false
    }

    /// Writes a commented starter config if none exists and returns its path.
    pub fn write_template(ctx: &dyn AppContext) -> Result<String> {
        let path = ctx.config_file()?;
        if !path.exists() {
            fs::write(&path, TEMPLATE).map_err(|e| {
                anyhow::anyhow!("Failed to write config file '{}': {}", path.display(), e)
            })?;
        }
        Ok(path.to_string_lossy().to_string())
    }

    pub fn log_level_filter(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or(log::LevelFilter::Info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::TestContext;

    const SAMPLE: &str = r#"
        column_width = 20

        [[accounts]]
        name = "work"
        credentials = "~/work.json"
        calendars = [
            { id = "primary", color = "green" },
            { id = "team@group.calendar.google.com", color = "teal" },
        ]

        [[accounts]]
        name = "home"
        credentials = "/tmp/home.json"
        calendars = [{ id = "primary" }]
    "#;

    #[test]
    fn test_parse_sample_with_defaults() {
        let cfg = Config::parse(SAMPLE).unwrap();
        assert_eq!(cfg.accounts.len(), 2);
        assert_eq!(cfg.column_width, 20);
        assert_eq!(cfg.start_hour, 0);
        assert_eq!(cfg.end_hour, 24);
        assert_eq!(cfg.refresh_interval_secs, 300);
        assert_eq!(cfg.accounts[0].calendars[1].color, EventColor::Teal);
        assert_eq!(cfg.accounts[1].calendars[0].color, EventColor::Orange);
    }

    #[test]
    fn test_validation_rejects_bad_hours() {
        let bad = format!("start_hour = 10\nend_hour = 9\n{}", SAMPLE);
        assert!(Config::parse(&bad).is_err());
        let bad = format!("end_hour = 25\n{}", SAMPLE);
        assert!(Config::parse(&bad).is_err());
    }

    #[test]
    fn test_validation_rejects_empty_accounts() {
        assert!(Config::parse("column_width = 20").is_err());
        let no_cals = r#"
            [[accounts]]
            name = "x"
            credentials = "y"
        "#;
        let err = Config::parse(no_cals).unwrap_err();
        assert!(err.to_string().contains("'x' has no calendars"));
    }

    #[test]
    fn test_utc_offset_range() {
        let with_offset = |m: i64| {
            format!(
                "utc_offset_minutes = {}\n[[accounts]]\nname = \"a\"\ncredentials = \"c\"\ncalendars = [{{ id = \"primary\" }}]\n",
                m
            )
        };
        assert!(Config::parse(&with_offset(420)).is_ok());
        assert!(Config::parse(&with_offset(-1439)).is_ok());
        let err = Config::parse(&with_offset(1440)).unwrap_err();
        assert!(err.to_string().contains("utc_offset_minutes"));
        assert!(Config::parse(&with_offset(-2_000_000)).is_err());
    }

    #[test]
    fn test_missing_config_detected() {
        let ctx = TestContext::new();
        let err = Config::load(&ctx).unwrap_err();
        assert!(Config::is_missing_config_error(&err));
    }

    #[test]
    fn test_template_round_trip() {
        let ctx = TestContext::new();
        let path = Config::write_template(&ctx).unwrap();
        assert!(path.ends_with("config.toml"));
        let cfg = Config::load(&ctx).unwrap();
        assert_eq!(cfg.accounts[0].name, "personal");
        assert_eq!(cfg.accounts[0].calendars[0].color, EventColor::Green);
    }

    #[test]
    fn test_syntax_error_is_not_missing() {
        let ctx = TestContext::new();
        fs::write(ctx.config_file().unwrap(), "accounts = [").unwrap();
        let err = Config::load(&ctx).unwrap_err();
        assert!(!Config::is_missing_config_error(&err));
    }
}

use crate::domain::models::{
    DEFAULT_CUSTOM_COLOR, DEFAULT_DURATION_MINUTES, DEFAULT_SLOT_WIDTH_MINUTES,
    DEFAULT_WINDOW_END, DEFAULT_WINDOW_START, DayPlanPolicy, parse_hhmm,
};
use crate::infrastructure::error::InfraError;
use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

const APP_JSON: &str = "app.json";
const DAYPLAN_JSON: &str = "dayplan.json";
const DEFAULT_TIMEZONE: &str = "UTC";
const DEFAULT_SYNC_MAX_ATTEMPTS: u8 = 3;
const DEFAULT_SYNC_BASE_DELAY_MS: u64 = 200;

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigBundle {
    pub app: serde_json::Value,
    pub dayplan: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncSettings {
    pub max_attempts: u8,
    pub base_delay_ms: u64,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_SYNC_MAX_ATTEMPTS,
            base_delay_ms: DEFAULT_SYNC_BASE_DELAY_MS,
        }
    }
}

fn default_files() -> HashMap<&'static str, serde_json::Value> {
    HashMap::from([
        (
            APP_JSON,
            serde_json::json!({
                "schema": 1,
                "appName": "DayPlan",
                "timezone": DEFAULT_TIMEZONE
            }),
        ),
        (
            DAYPLAN_JSON,
            serde_json::json!({
                "schema": 1,
                "windowStart": DEFAULT_WINDOW_START,
                "windowEnd": DEFAULT_WINDOW_END,
                "slotWidthMinutes": DEFAULT_SLOT_WIDTH_MINUTES,
                "defaultDurationMinutes": DEFAULT_DURATION_MINUTES,
                "defaultCustomColor": DEFAULT_CUSTOM_COLOR,
                "sync": {
                    "maxAttempts": DEFAULT_SYNC_MAX_ATTEMPTS,
                    "baseDelayMs": DEFAULT_SYNC_BASE_DELAY_MS
                }
            }),
        ),
    ])
}

pub fn ensure_default_configs(config_dir: &Path) -> Result<(), InfraError> {
    for (name, value) in default_files() {
        let path = config_dir.join(name);
        if !path.exists() {
            let formatted = serde_json::to_string_pretty(&value)?;
            fs::write(path, format!("{formatted}\n"))?;
        }
    }
    Ok(())
}

fn read_config(path: &Path) -> Result<serde_json::Value, InfraError> {
    let raw = fs::read_to_string(path)?;
    let parsed: serde_json::Value = serde_json::from_str(&raw)?;
    let schema = parsed
        .get("schema")
        .and_then(serde_json::Value::as_u64)
        .ok_or_else(|| InfraError::InvalidConfig(format!("missing schema in {}", path.display())))?;
    if schema != 1 {
        return Err(InfraError::InvalidConfig(format!(
            "unsupported schema {} in {}",
            schema,
            path.display()
        )));
    }
    Ok(parsed)
}

pub fn load_configs(config_dir: &Path) -> Result<ConfigBundle, InfraError> {
    Ok(ConfigBundle {
        app: read_config(&config_dir.join(APP_JSON))?,
        dayplan: read_config(&config_dir.join(DAYPLAN_JSON))?,
    })
}

fn str_field<'a>(value: &'a serde_json::Value, key: &str) -> Option<&'a str> {
    value
        .get(key)
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Reads `dayplan.json`; fields that are missing or malformed keep their
/// defaults.
pub fn read_day_plan_policy(config_dir: &Path) -> Result<DayPlanPolicy, InfraError> {
    let parsed = read_config(&config_dir.join(DAYPLAN_JSON))?;
    let mut policy = DayPlanPolicy::default();

    if let Some(start) = str_field(&parsed, "windowStart").filter(|value| parse_hhmm(value).is_some())
    {
        policy.window_start = start.to_string();
    }
    if let Some(end) = str_field(&parsed, "windowEnd").filter(|value| parse_hhmm(value).is_some()) {
        policy.window_end = end.to_string();
    }
    if let Some(width) = parsed
        .get("slotWidthMinutes")
        .and_then(serde_json::Value::as_u64)
        .filter(|value| (1..=u64::from(u32::MAX)).contains(value))
    {
        policy.slot_width_minutes = width as u32;
    }
    if let Some(duration) = parsed
        .get("defaultDurationMinutes")
        .and_then(serde_json::Value::as_u64)
        .filter(|value| (1..=u64::from(u32::MAX)).contains(value))
    {
        policy.default_duration_minutes = duration as u32;
    }
    if let Some(color) = str_field(&parsed, "defaultCustomColor") {
        policy.default_custom_color = color.to_string();
    }

    policy.validate().map_err(InfraError::InvalidConfig)?;
    Ok(policy)
}

pub fn read_sync_settings(config_dir: &Path) -> Result<SyncSettings, InfraError> {
    let parsed = read_config(&config_dir.join(DAYPLAN_JSON))?;
    let mut settings = SyncSettings::default();
    let Some(sync) = parsed.get("sync") else {
        return Ok(settings);
    };
    if let Some(attempts) = sync.get("maxAttempts").and_then(serde_json::Value::as_u64) {
        settings.max_attempts = attempts.clamp(1, u64::from(u8::MAX)) as u8;
    }
    if let Some(delay) = sync.get("baseDelayMs").and_then(serde_json::Value::as_u64) {
        settings.base_delay_ms = delay;
    }
    Ok(settings)
}

pub fn read_timezone(config_dir: &Path) -> Result<Tz, InfraError> {
    let app = read_config(&config_dir.join(APP_JSON))?;
    let name = str_field(&app, "timezone").unwrap_or(DEFAULT_TIMEZONE);
    name.parse::<Tz>()
        .map_err(|error| InfraError::InvalidConfig(format!("unknown timezone '{name}': {error}")))
}

/// Calendar date "now" in the configured timezone.
pub fn today_in(timezone: Tz) -> NaiveDate {
    Utc::now().with_timezone(&timezone).date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().expect("temp dir");
        ensure_default_configs(dir.path()).expect("write defaults");
        dir
    }

    #[test]
    fn defaults_round_trip_to_default_policy() {
        let dir = config_dir();
        let policy = read_day_plan_policy(dir.path()).expect("policy");
        assert_eq!(policy, DayPlanPolicy::default());
        assert_eq!(read_sync_settings(dir.path()).expect("sync"), SyncSettings::default());
        assert_eq!(read_timezone(dir.path()).expect("timezone"), Tz::UTC);
        assert!(load_configs(dir.path()).is_ok());
    }

    #[test]
    fn ensure_defaults_keeps_existing_files() {
        let dir = config_dir();
        let path = dir.path().join(DAYPLAN_JSON);
        fs::write(
            &path,
            r#"{"schema": 1, "windowStart": "08:00", "slotWidthMinutes": 30}"#,
        )
        .expect("write custom config");
        ensure_default_configs(dir.path()).expect("ensure again");

        let policy = read_day_plan_policy(dir.path()).expect("policy");
        assert_eq!(policy.window_start, "08:00");
        assert_eq!(policy.window_end, DEFAULT_WINDOW_END);
        assert_eq!(policy.slot_width_minutes, 30);
    }

    #[test]
    fn malformed_fields_fall_back_to_defaults() {
        let dir = config_dir();
        fs::write(
            dir.path().join(DAYPLAN_JSON),
            r#"{"schema": 1, "windowEnd": "5pm", "slotWidthMinutes": 0, "sync": {"maxAttempts": 0}}"#,
        )
        .expect("write config");

        let policy = read_day_plan_policy(dir.path()).expect("policy");
        assert_eq!(policy.window_end, DEFAULT_WINDOW_END);
        assert_eq!(policy.slot_width_minutes, DEFAULT_SLOT_WIDTH_MINUTES);
        assert_eq!(read_sync_settings(dir.path()).expect("sync").max_attempts, 1);
    }

    #[test]
    fn unsupported_schema_is_rejected() {
        let dir = config_dir();
        fs::write(dir.path().join(DAYPLAN_JSON), r#"{"schema": 2}"#).expect("write config");
        let result = read_day_plan_policy(dir.path());
        assert!(matches!(result, Err(InfraError::InvalidConfig(_))));
    }

    #[test]
    fn unknown_timezone_is_invalid_config() {
        let dir = config_dir();
        fs::write(
            dir.path().join(APP_JSON),
            r#"{"schema": 1, "timezone": "Mars/Olympus"}"#,
        )
        .expect("write config");
        assert!(matches!(
            read_timezone(dir.path()),
            Err(InfraError::InvalidConfig(_))
        ));
    }
}

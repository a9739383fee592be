use chrono::{NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

pub const DEFAULT_WINDOW_START: &str = "09:00";
pub const DEFAULT_WINDOW_END: &str = "17:00";
pub const DEFAULT_SLOT_WIDTH_MINUTES: u32 = 15;
pub const DEFAULT_DURATION_MINUTES: u32 = 60;
pub const DEFAULT_CUSTOM_COLOR: &str = "blue";

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

pub fn next_id(prefix: &str) -> String {
    let sequence = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}-{}-{sequence}", Utc::now().timestamp_micros())
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Task,
    Custom,
}

impl ItemKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Task => "task",
            Self::Custom => "custom",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "task" => Some(Self::Task),
            "custom" => Some(Self::Custom),
            _ => None,
        }
    }
}

/// A task or custom entry placed on the slot grid of one date.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScheduledItem {
    pub id: String,
    pub date: String,
    pub kind: ItemKind,
    pub ref_id: Option<String>,
    pub title: Option<String>,
    pub color: Option<String>,
    pub start_slot: String,
    pub duration_minutes: u32,
}

impl ScheduledItem {
    pub fn for_task(
        id: impl Into<String>,
        date: impl Into<String>,
        task_id: impl Into<String>,
        start_slot: impl Into<String>,
        duration_minutes: u32,
    ) -> Self {
        Self {
            id: id.into(),
            date: date.into(),
            kind: ItemKind::Task,
            ref_id: Some(task_id.into()),
            title: None,
            color: None,
            start_slot: start_slot.into(),
            duration_minutes,
        }
    }

    pub fn custom(
        id: impl Into<String>,
        date: impl Into<String>,
        title: impl Into<String>,
        color: impl Into<String>,
        start_slot: impl Into<String>,
        duration_minutes: u32,
    ) -> Self {
        Self {
            id: id.into(),
            date: date.into(),
            kind: ItemKind::Custom,
            ref_id: None,
            title: Some(title.into()),
            color: Some(color.into()),
            start_slot: start_slot.into(),
            duration_minutes,
        }
    }

    /// Task id this item stands for, if it is a task placement.
    pub fn task_ref(&self) -> Option<&str> {
        match self.kind {
            ItemKind::Task => self.ref_id.as_deref(),
            ItemKind::Custom => None,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        validate_non_empty(&self.id, "item.id")?;
        validate_date(&self.date, "item.date")?;
        validate_hhmm(&self.start_slot, "item.start_slot")?;
        if self.duration_minutes == 0 {
            return Err("item.duration_minutes must be > 0".to_string());
        }
        match self.kind {
            ItemKind::Task => {
                let task_id = self.ref_id.as_deref().unwrap_or_default();
                validate_non_empty(task_id, "item.ref_id")?;
            }
            ItemKind::Custom => {
                let title = self.title.as_deref().unwrap_or_default();
                validate_non_empty(title, "item.title")?;
            }
        }
        Ok(())
    }
}

/// Work item owned by the task collaborator. Carries no scheduling fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkTask {
    pub id: String,
    pub title: String,
    pub assignee_id: Option<String>,
    pub client_name: Option<String>,
    pub due_date: Option<String>,
}

impl WorkTask {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            assignee_id: None,
            client_name: None,
            due_date: None,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        validate_non_empty(&self.id, "task.id")?;
        validate_non_empty(&self.title, "task.title")?;
        if let Some(due_date) = self.due_date.as_deref() {
            validate_date(due_date, "task.due_date")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientDisplay {
    pub initials: String,
    pub color_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DayPlanPolicy {
    pub window_start: String,
    pub window_end: String,
    pub slot_width_minutes: u32,
    pub default_duration_minutes: u32,
    pub default_custom_color: String,
}

impl Default for DayPlanPolicy {
    fn default() -> Self {
        Self {
            window_start: DEFAULT_WINDOW_START.to_string(),
            window_end: DEFAULT_WINDOW_END.to_string(),
            slot_width_minutes: DEFAULT_SLOT_WIDTH_MINUTES,
            default_duration_minutes: DEFAULT_DURATION_MINUTES,
            default_custom_color: DEFAULT_CUSTOM_COLOR.to_string(),
        }
    }
}

impl DayPlanPolicy {
    pub fn validate(&self) -> Result<(), String> {
        validate_hhmm(&self.window_start, "dayplan.window_start")?;
        validate_hhmm(&self.window_end, "dayplan.window_end")?;
        if self.slot_width_minutes == 0 {
            return Err("dayplan.slot_width_minutes must be > 0".to_string());
        }
        if self.default_duration_minutes == 0 {
            return Err("dayplan.default_duration_minutes must be > 0".to_string());
        }
        validate_non_empty(&self.default_custom_color, "dayplan.default_custom_color")
    }
}

pub(crate) fn validate_non_empty(value: &str, field_name: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field_name} must not be empty"));
    }
    Ok(())
}

pub(crate) fn validate_hhmm(value: &str, field_name: &str) -> Result<(), String> {
    parse_hhmm(value)
        .map(|_| ())
        .ok_or_else(|| format!("{field_name} must be HH:MM"))
}

pub(crate) fn validate_date(value: &str, field_name: &str) -> Result<(), String> {
    parse_date(value).map_err(|_| format!("{field_name} must be YYYY-MM-DD"))?;
    Ok(())
}

pub fn parse_hhmm(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M").ok()
}

pub fn parse_date(value: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_task_item() -> ScheduledItem {
        ScheduledItem::for_task("itm-1", "2026-02-16", "tsk-1", "09:00", 60)
    }

    fn sample_custom_item() -> ScheduledItem {
        ScheduledItem::custom("itm-2", "2026-02-16", "Standup", "green", "10:00", 15)
    }

    #[test]
    fn scheduled_item_validate_accepts_valid_items() {
        assert!(sample_task_item().validate().is_ok());
        assert!(sample_custom_item().validate().is_ok());
    }

    #[test]
    fn scheduled_item_validate_rejects_zero_duration() {
        let mut item = sample_task_item();
        item.duration_minutes = 0;
        assert!(item.validate().is_err());
    }

    #[test]
    fn task_item_requires_ref_and_custom_item_requires_title() {
        let mut task_item = sample_task_item();
        task_item.ref_id = None;
        assert!(task_item.validate().is_err());

        let mut custom_item = sample_custom_item();
        custom_item.title = Some("  ".to_string());
        assert!(custom_item.validate().is_err());
    }

    #[test]
    fn scheduled_item_validate_rejects_bad_labels() {
        let mut item = sample_task_item();
        item.start_slot = "9am".to_string();
        assert!(item.validate().is_err());

        let mut item = sample_task_item();
        item.date = "16/02/2026".to_string();
        assert!(item.validate().is_err());
    }

    #[test]
    fn custom_items_never_report_a_task_ref() {
        let mut item = sample_custom_item();
        item.ref_id = Some("tsk-9".to_string());
        assert_eq!(item.task_ref(), None);
        assert_eq!(sample_task_item().task_ref(), Some("tsk-1"));
    }

    #[test]
    fn policy_defaults_are_valid() {
        let policy = DayPlanPolicy::default();
        assert!(policy.validate().is_ok());
        assert_eq!(policy.default_duration_minutes, 60);
    }

    #[test]
    fn next_id_is_unique_per_call() {
        let first = next_id("itm");
        let second = next_id("itm");
        assert_ne!(first, second);
        assert!(first.starts_with("itm-"));
    }

    #[test]
    fn domain_models_support_serde_roundtrip() {
        let item = sample_custom_item();
        let json = serde_json::to_string(&item).expect("serialize item");
        assert!(json.contains("\"kind\":\"custom\""));
        let roundtrip: ScheduledItem = serde_json::from_str(&json).expect("deserialize item");
        assert_eq!(roundtrip, item);
    }
}

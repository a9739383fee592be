use crate::domain::models::parse_hhmm;
use chrono::{Duration, NaiveTime};
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

/// Start of one fixed-width slot, rendered as `HH:MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeSlot(NaiveTime);

impl TimeSlot {
    pub fn label(self) -> String {
        self.0.format("%H:%M").to_string()
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%H:%M"))
    }
}

impl Serialize for TimeSlot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Labels at `width_minutes` cadence over `[window_start, window_end)`.
pub fn generate_slots(
    window_start: NaiveTime,
    window_end: NaiveTime,
    width_minutes: u32,
) -> Vec<TimeSlot> {
    if width_minutes == 0 || window_end <= window_start {
        return Vec::new();
    }

    let step = Duration::minutes(i64::from(width_minutes));
    let mut slots = Vec::new();
    let mut cursor = window_start;
    while cursor < window_end {
        slots.push(TimeSlot(cursor));
        let (next, wrapped) = cursor.overflowing_add_signed(step);
        if wrapped != 0 {
            break;
        }
        cursor = next;
    }
    slots
}

#[derive(Debug, Clone)]
pub struct SlotGrid {
    slots: Vec<TimeSlot>,
    index: HashMap<String, usize>,
    width_minutes: u32,
    window_end: NaiveTime,
}

impl SlotGrid {
    pub fn new(window_start: NaiveTime, window_end: NaiveTime, width_minutes: u32) -> Self {
        let slots = generate_slots(window_start, window_end, width_minutes);
        let index = slots
            .iter()
            .enumerate()
            .map(|(position, slot)| (slot.label(), position))
            .collect();
        Self {
            slots,
            index,
            width_minutes,
            window_end,
        }
    }

    pub fn parse_window(start: &str, end: &str, width_minutes: u32) -> Result<Self, String> {
        let window_start =
            parse_hhmm(start).ok_or_else(|| format!("window start must be HH:MM: {start}"))?;
        let window_end =
            parse_hhmm(end).ok_or_else(|| format!("window end must be HH:MM: {end}"))?;
        Ok(Self::new(window_start, window_end, width_minutes))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn width_minutes(&self) -> u32 {
        self.width_minutes
    }

    pub fn slots(&self) -> &[TimeSlot] {
        &self.slots
    }

    pub fn labels(&self) -> Vec<String> {
        self.slots.iter().map(|slot| slot.label()).collect()
    }

    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.index.get(label.trim()).copied()
    }

    pub fn label_at(&self, index: usize) -> Option<String> {
        self.slots.get(index).map(|slot| slot.label())
    }

    /// Number of slots a duration occupies, rounded up.
    pub fn slots_needed(&self, duration_minutes: u32) -> usize {
        if self.width_minutes == 0 {
            return 0;
        }
        duration_minutes.div_ceil(self.width_minutes) as usize
    }

    /// Label where a range starting at `start_index` ends; the window end when
    /// the range reaches the last slot.
    pub fn end_label(&self, start_index: usize, duration_minutes: u32) -> Option<String> {
        let end_index = start_index + self.slots_needed(duration_minutes);
        if end_index > self.slots.len() {
            return None;
        }
        if end_index == self.slots.len() {
            return Some(self.window_end.format("%H:%M").to_string());
        }
        self.label_at(end_index)
    }
}

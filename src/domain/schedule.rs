use crate::domain::models::{ScheduledItem, WorkTask};
use crate::domain::placement::{PlacementRejection, check_placement, find_conflict};
use crate::domain::resolver::{ResizeOutcome, ResizeRejection, resolve_duration_change};
use crate::domain::slot_grid::SlotGrid;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("item not found: {0}")]
    UnknownItem(String),
    #[error("item already scheduled: {0}")]
    DuplicateItem(String),
    #[error("item belongs to {item_date}, schedule is for {schedule_date}")]
    WrongDate {
        item_date: String,
        schedule_date: String,
    },
    #[error("placement rejected: {0}")]
    Rejected(#[from] PlacementRejection),
    #[error("resize rejected: {0}")]
    ResizeRejected(#[from] ResizeRejection),
}

/// In-memory schedule for one date. Every positional change goes through the
/// placement validator, so items never overlap and never leave the grid.
#[derive(Debug, Clone)]
pub struct ScheduleStore {
    date: String,
    grid: SlotGrid,
    items: Vec<ScheduledItem>,
    remembered_durations: HashMap<String, u32>,
}

impl ScheduleStore {
    pub fn new(date: impl Into<String>, grid: SlotGrid) -> Self {
        Self {
            date: date.into(),
            grid,
            items: Vec::new(),
            remembered_durations: HashMap::new(),
        }
    }

    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn grid(&self) -> &SlotGrid {
        &self.grid
    }

    /// Items ordered by start slot.
    pub fn items(&self) -> Vec<ScheduledItem> {
        let mut items = self.items.clone();
        items.sort_by_key(|item| self.grid.index_of(&item.start_slot).unwrap_or(usize::MAX));
        items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, item_id: &str) -> Option<&ScheduledItem> {
        self.items.iter().find(|item| item.id == item_id)
    }

    pub fn find_task(&self, task_id: &str) -> Option<&ScheduledItem> {
        self.items
            .iter()
            .find(|item| item.task_ref() == Some(task_id))
    }

    /// Duration a task had when it was last on the grid today.
    pub fn remembered_duration(&self, task_id: &str) -> Option<u32> {
        self.find_task(task_id)
            .map(|item| item.duration_minutes)
            .or_else(|| self.remembered_durations.get(task_id).copied())
    }

    pub fn place(&mut self, item: ScheduledItem) -> Result<(), ScheduleError> {
        if item.date != self.date {
            return Err(ScheduleError::WrongDate {
                item_date: item.date,
                schedule_date: self.date.clone(),
            });
        }
        if self.get(&item.id).is_some() {
            return Err(ScheduleError::DuplicateItem(item.id));
        }
        check_placement(
            &item.start_slot,
            item.duration_minutes,
            &self.grid,
            &self.items,
            None,
        )?;
        tracing::debug!(item_id = %item.id, start = %item.start_slot, "placed item");
        self.items.push(item);
        Ok(())
    }

    /// Moves an item, returning its previous start slot.
    pub fn move_item(&mut self, item_id: &str, new_start: &str) -> Result<String, ScheduleError> {
        let Some(position) = self.items.iter().position(|item| item.id == item_id) else {
            return Err(ScheduleError::UnknownItem(item_id.to_string()));
        };
        check_placement(
            new_start,
            self.items[position].duration_minutes,
            &self.grid,
            &self.items,
            Some(item_id),
        )?;
        let previous =
            std::mem::replace(&mut self.items[position].start_slot, new_start.trim().to_string());
        tracing::debug!(item_id, from = %previous, to = new_start, "moved item");
        Ok(previous)
    }

    pub fn remove(&mut self, item_id: &str) -> Result<ScheduledItem, ScheduleError> {
        let Some(position) = self.items.iter().position(|item| item.id == item_id) else {
            return Err(ScheduleError::UnknownItem(item_id.to_string()));
        };
        let removed = self.items.remove(position);
        if let Some(task_id) = removed.task_ref() {
            self.remembered_durations
                .insert(task_id.to_string(), removed.duration_minutes);
        }
        Ok(removed)
    }

    pub fn resize(
        &mut self,
        item_id: &str,
        new_duration: u32,
    ) -> Result<ResizeOutcome, ScheduleError> {
        Ok(resolve_duration_change(
            &mut self.items,
            &self.grid,
            item_id,
            new_duration,
        )?)
    }

    /// Replaces the whole set with what persistence returned. Items from other
    /// dates and malformed items are dropped; conflicts are logged but kept so
    /// nothing silently disappears from the user's view.
    pub fn replace_all(&mut self, items: Vec<ScheduledItem>) {
        let date = self.date.clone();
        let (kept, foreign): (Vec<_>, Vec<_>) =
            items.into_iter().partition(|item| item.date == date);
        if !foreign.is_empty() {
            tracing::warn!(date = %date, dropped = foreign.len(), "ignored items from other dates");
        }
        let (kept, malformed): (Vec<_>, Vec<_>) =
            kept.into_iter().partition(|item| item.validate().is_ok());
        for item in &malformed {
            tracing::warn!(date = %date, item_id = %item.id, "ignored malformed item");
        }
        if let Some((first, second)) = find_conflict(&kept, &self.grid) {
            tracing::warn!(
                date = %date,
                first = %first,
                second = second.as_deref().unwrap_or("<grid bounds>"),
                "loaded schedule violates placement rules"
            );
        }
        self.items = kept;
    }

    /// First start slot where `duration_minutes` fits.
    pub fn first_free_slot(&self, duration_minutes: u32) -> Option<String> {
        (0..self.grid.len())
            .filter_map(|index| self.grid.label_at(index))
            .find(|label| {
                check_placement(label, duration_minutes, &self.grid, &self.items, None).is_ok()
            })
    }
}

/// Tasks no task-kind item references, in their original order.
pub fn unscheduled_tasks(all_tasks: &[WorkTask], schedule: &[ScheduledItem]) -> Vec<WorkTask> {
    let scheduled = schedule
        .iter()
        .filter_map(ScheduledItem::task_ref)
        .collect::<HashSet<_>>();
    all_tasks
        .iter()
        .filter(|task| !scheduled.contains(task.id.as_str()))
        .cloned()
        .collect()
}

//! Zone-to-zone interpretation of drag gestures.
//!
//! The UI reports where a drag started and where it ended; this module turns
//! that pair into a store operation. Only duration edits cascade; a drop onto
//! a taken slot is cancelled rather than bumping anything.

use crate::domain::models::{ItemKind, ScheduledItem, next_id};
use crate::domain::schedule::ScheduleStore;
use serde::Serialize;
use std::fmt;

const POOL_ZONE: &str = "pool";
const SLOT_ZONE_PREFIX: &str = "slot:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropZone {
    Pool,
    Slot(String),
}

impl DropZone {
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.eq_ignore_ascii_case(POOL_ZONE) {
            return Some(Self::Pool);
        }
        let label = value.strip_prefix(SLOT_ZONE_PREFIX)?.trim();
        if label.is_empty() {
            return None;
        }
        Some(Self::Slot(label.to_string()))
    }
}

impl fmt::Display for DropZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pool => f.write_str(POOL_ZONE),
            Self::Slot(label) => write!(f, "{SLOT_ZONE_PREFIX}{label}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DropOutcome {
    Placed { item: ScheduledItem },
    Moved {
        item_id: String,
        from: String,
        to: String,
    },
    Removed { item: ScheduledItem },
    Cancelled { reason: String },
    Ignored,
}

impl DropOutcome {
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Self::Placed { .. } | Self::Moved { .. } | Self::Removed { .. }
        )
    }

    fn cancelled(reason: impl fmt::Display) -> Self {
        Self::Cancelled {
            reason: reason.to_string(),
        }
    }
}

pub struct DragDropController {
    default_duration_minutes: u32,
}

impl DragDropController {
    pub fn new(default_duration_minutes: u32) -> Self {
        Self {
            default_duration_minutes,
        }
    }

    /// Applies one drop. `item_ref` is a task id for pool-sourced drags and a
    /// scheduled item id otherwise.
    pub fn apply(
        &self,
        store: &mut ScheduleStore,
        source: &DropZone,
        destination: &DropZone,
        item_ref: &str,
    ) -> DropOutcome {
        let item_ref = item_ref.trim();
        match (source, destination) {
            (DropZone::Pool, DropZone::Pool) => DropOutcome::Ignored,
            (DropZone::Pool, DropZone::Slot(label)) => self.place_from_pool(store, item_ref, label),
            (DropZone::Slot(_), DropZone::Slot(to))
                if store.get(item_ref).is_some_and(|item| item.start_slot == *to) =>
            {
                DropOutcome::Ignored
            }
            (DropZone::Slot(_), DropZone::Slot(to)) => match store.move_item(item_ref, to) {
                Ok(from) => DropOutcome::Moved {
                    item_id: item_ref.to_string(),
                    from,
                    to: to.clone(),
                },
                Err(error) => DropOutcome::cancelled(error),
            },
            (DropZone::Slot(_), DropZone::Pool) => match store.remove(item_ref) {
                Ok(item) => DropOutcome::Removed { item },
                Err(error) => DropOutcome::cancelled(error),
            },
        }
    }

    fn place_from_pool(&self, store: &mut ScheduleStore, task_id: &str, label: &str) -> DropOutcome {
        if task_id.is_empty() {
            return DropOutcome::cancelled("task id must not be empty");
        }
        if let Some(existing) = store.find_task(task_id) {
            return DropOutcome::cancelled(format!(
                "task {task_id} is already scheduled at {}",
                existing.start_slot
            ));
        }

        let duration = store
            .remembered_duration(task_id)
            .unwrap_or(self.default_duration_minutes);
        let item = ScheduledItem {
            id: next_id("itm"),
            date: store.date().to_string(),
            kind: ItemKind::Task,
            ref_id: Some(task_id.to_string()),
            title: None,
            color: None,
            start_slot: label.to_string(),
            duration_minutes: duration,
        };
        match store.place(item.clone()) {
            Ok(()) => DropOutcome::Placed { item },
            Err(error) => DropOutcome::cancelled(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::slot_grid::SlotGrid;

    const DATE: &str = "2026-02-16";

    fn store() -> ScheduleStore {
        let grid = SlotGrid::parse_window("09:00", "17:00", 15).expect("grid");
        ScheduleStore::new(DATE, grid)
    }

    fn slot(label: &str) -> DropZone {
        DropZone::Slot(label.to_string())
    }

    #[test]
    fn zones_parse_and_display() {
        assert_eq!(DropZone::parse("pool"), Some(DropZone::Pool));
        assert_eq!(DropZone::parse(" slot:09:15 "), Some(slot("09:15")));
        assert_eq!(DropZone::parse("slot:"), None);
        assert_eq!(DropZone::parse("calendar"), None);
        assert_eq!(slot("10:00").to_string(), "slot:10:00");
        assert_eq!(DropZone::Pool.to_string(), "pool");
    }

    #[test]
    fn pool_to_slot_places_task_with_default_duration() {
        let mut store = store();
        let controller = DragDropController::new(60);
        let outcome = controller.apply(&mut store, &DropZone::Pool, &slot("09:00"), "tsk-1");

        let DropOutcome::Placed { item } = outcome else {
            panic!("expected placement");
        };
        assert_eq!(item.duration_minutes, 60);
        assert_eq!(item.task_ref(), Some("tsk-1"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn pool_to_taken_slot_is_cancelled() {
        let mut store = store();
        let controller = DragDropController::new(60);
        controller.apply(&mut store, &DropZone::Pool, &slot("09:00"), "tsk-1");
        let outcome = controller.apply(&mut store, &DropZone::Pool, &slot("09:30"), "tsk-2");

        assert!(matches!(outcome, DropOutcome::Cancelled { .. }));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn pool_drop_of_already_scheduled_task_is_cancelled() {
        let mut store = store();
        let controller = DragDropController::new(60);
        controller.apply(&mut store, &DropZone::Pool, &slot("09:00"), "tsk-1");
        let outcome = controller.apply(&mut store, &DropZone::Pool, &slot("13:00"), "tsk-1");
        assert!(matches!(outcome, DropOutcome::Cancelled { .. }));
    }

    #[test]
    fn slot_to_slot_moves_and_keeps_duration() {
        let mut store = store();
        let controller = DragDropController::new(60);
        let DropOutcome::Placed { item } =
            controller.apply(&mut store, &DropZone::Pool, &slot("09:00"), "tsk-1")
        else {
            panic!("expected placement");
        };

        let outcome = controller.apply(&mut store, &slot("09:00"), &slot("14:00"), &item.id);
        assert_eq!(
            outcome,
            DropOutcome::Moved {
                item_id: item.id.clone(),
                from: "09:00".to_string(),
                to: "14:00".to_string(),
            }
        );
        let moved = store.get(&item.id).expect("item");
        assert_eq!(moved.duration_minutes, 60);
    }

    #[test]
    fn slot_to_pool_returns_task_and_remembers_duration() {
        let mut store = store();
        let controller = DragDropController::new(60);
        store
            .place(ScheduledItem::for_task("itm-1", DATE, "tsk-1", "09:00", 90))
            .expect("place");

        let outcome = controller.apply(&mut store, &slot("09:00"), &DropZone::Pool, "itm-1");
        assert!(matches!(outcome, DropOutcome::Removed { .. }));
        assert!(store.is_empty());

        let DropOutcome::Placed { item } =
            controller.apply(&mut store, &DropZone::Pool, &slot("11:00"), "tsk-1")
        else {
            panic!("expected placement");
        };
        assert_eq!(item.duration_minutes, 90);
    }

    #[test]
    fn same_zone_drops_are_ignored() {
        let mut store = store();
        let controller = DragDropController::new(60);
        store
            .place(ScheduledItem::for_task("itm-1", DATE, "tsk-1", "09:00", 60))
            .expect("place");
        assert_eq!(
            controller.apply(&mut store, &DropZone::Pool, &DropZone::Pool, "tsk-2"),
            DropOutcome::Ignored
        );
        assert_eq!(
            controller.apply(&mut store, &slot("09:00"), &slot("09:00"), "itm-1"),
            DropOutcome::Ignored
        );
    }

    #[test]
    fn stale_source_label_still_moves_by_item_id() {
        let mut store = store();
        let controller = DragDropController::new(60);
        store
            .place(ScheduledItem::for_task("itm-1", DATE, "tsk-1", "09:00", 60))
            .expect("place");

        let outcome = controller.apply(&mut store, &slot("14:00"), &slot("14:00"), "itm-1");
        assert_eq!(
            outcome,
            DropOutcome::Moved {
                item_id: "itm-1".to_string(),
                from: "09:00".to_string(),
                to: "14:00".to_string(),
            }
        );
        assert_eq!(store.get("itm-1").expect("item").start_slot, "14:00");
    }

    #[test]
    fn slot_drop_of_unknown_item_is_cancelled() {
        let mut store = store();
        let controller = DragDropController::new(60);
        let outcome = controller.apply(&mut store, &slot("09:00"), &slot("09:00"), "ghost");
        assert!(matches!(outcome, DropOutcome::Cancelled { .. }));
    }

    #[test]
    fn drop_on_unknown_slot_is_cancelled() {
        let mut store = store();
        let controller = DragDropController::new(60);
        let outcome = controller.apply(&mut store, &DropZone::Pool, &slot("18:00"), "tsk-1");
        assert!(!outcome.is_mutation());
        assert!(store.is_empty());
    }
}

//! Cascading shifts applied when an item's duration is edited.
//!
//! Growing pushes every later item back; shrinking pulls later items forward
//! into the freed slots when the validator allows it. The whole edit is
//! computed on a scratch copy and committed only when it stays inside the grid.

use crate::domain::models::ScheduledItem;
use crate::domain::placement::check_range;
use crate::domain::slot_grid::SlotGrid;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResizeRejection {
    #[error("item not found: {0}")]
    UnknownItem(String),
    #[error("duration must be > 0 minutes")]
    InvalidDuration,
    #[error("item {0} does not start on the grid")]
    TargetNotOnGrid(String),
    #[error("resized item would run past the end of the grid")]
    TargetOutOfBounds,
    #[error("item {item_id} cannot be pushed past the end of the grid")]
    CascadeOutOfBounds { item_id: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemShift {
    pub item_id: String,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResizeOutcome {
    pub item_id: String,
    pub old_slots: usize,
    pub new_slots: usize,
    pub shifts: Vec<ItemShift>,
}

pub fn resolve_duration_change(
    items: &mut Vec<ScheduledItem>,
    grid: &SlotGrid,
    item_id: &str,
    new_duration: u32,
) -> Result<ResizeOutcome, ResizeRejection> {
    if new_duration == 0 {
        return Err(ResizeRejection::InvalidDuration);
    }
    let Some(target) = items.iter().position(|item| item.id == item_id) else {
        return Err(ResizeRejection::UnknownItem(item_id.to_string()));
    };
    let Some(start) = grid.index_of(&items[target].start_slot) else {
        return Err(ResizeRejection::TargetNotOnGrid(item_id.to_string()));
    };

    let old_slots = grid.slots_needed(items[target].duration_minutes);
    let new_slots = grid.slots_needed(new_duration);
    let old_end = start + old_slots;
    let new_end = start + new_slots;
    if new_end > grid.len() {
        return Err(ResizeRejection::TargetOutOfBounds);
    }

    let mut plan = items.clone();
    plan[target].duration_minutes = new_duration;

    let shifts = if new_slots > old_slots {
        push_later(&mut plan, grid, target, old_end, new_end)?
    } else if new_slots < old_slots {
        pull_earlier(&mut plan, grid, target, old_end, new_end)
    } else {
        Vec::new()
    };

    tracing::debug!(
        item_id,
        old_slots,
        new_slots,
        shifted = shifts.len(),
        "resolved duration change"
    );

    *items = plan;
    Ok(ResizeOutcome {
        item_id: item_id.to_string(),
        old_slots,
        new_slots,
        shifts,
    })
}

/// Items after `boundary` (plus anything straddling it), earliest first, as
/// `(start_index, position)` pairs.
fn followers(
    plan: &[ScheduledItem],
    grid: &SlotGrid,
    target: usize,
    boundary: usize,
) -> Vec<(usize, usize)> {
    let mut result = plan
        .iter()
        .enumerate()
        .filter(|(position, _)| *position != target)
        .filter_map(|(position, item)| {
            let start = grid.index_of(&item.start_slot)?;
            let needed = grid.slots_needed(item.duration_minutes);
            let end = start + needed;
            (needed > 0 && (start >= boundary || end > boundary)).then_some((start, position))
        })
        .collect::<Vec<_>>();
    result.sort_unstable();
    result
}

fn push_later(
    plan: &mut [ScheduledItem],
    grid: &SlotGrid,
    target: usize,
    old_end: usize,
    new_end: usize,
) -> Result<Vec<ItemShift>, ResizeRejection> {
    let grown = new_end - old_end;
    let mut shifts = Vec::new();
    let mut cursor = new_end;

    for (start, position) in followers(plan, grid, target, old_end) {
        let needed = grid.slots_needed(plan[position].duration_minutes);
        let destination = if start < new_end {
            cursor
        } else {
            (start + grown).max(cursor)
        };
        if destination + needed > grid.len() {
            tracing::debug!(
                item_id = %plan[position].id,
                destination,
                "cascade would leave the grid, rejecting resize"
            );
            return Err(ResizeRejection::CascadeOutOfBounds {
                item_id: plan[position].id.clone(),
            });
        }
        cursor = destination + needed;
        if destination != start {
            shifts.push(relabel(&mut plan[position], grid, destination));
        }
    }
    Ok(shifts)
}

fn pull_earlier(
    plan: &mut [ScheduledItem],
    grid: &SlotGrid,
    target: usize,
    old_end: usize,
    new_end: usize,
) -> Vec<ItemShift> {
    let freed = old_end - new_end;
    let mut shifts = Vec::new();

    for (start, position) in followers(plan, grid, target, old_end) {
        if start < old_end {
            continue;
        }
        let candidate = start.saturating_sub(freed).max(new_end);
        if candidate == start {
            continue;
        }
        let duration = plan[position].duration_minutes;
        let moved_id = plan[position].id.clone();
        if check_range(candidate, duration, grid, plan, Some(&moved_id)).is_err() {
            continue;
        }
        shifts.push(relabel(&mut plan[position], grid, candidate));
    }
    shifts
}

fn relabel(item: &mut ScheduledItem, grid: &SlotGrid, destination: usize) -> ItemShift {
    let to = grid.label_at(destination).unwrap_or_default();
    let from = std::mem::replace(&mut item.start_slot, to.clone());
    ItemShift {
        item_id: item.id.clone(),
        from,
        to,
    }
}

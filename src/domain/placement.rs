use crate::domain::models::ScheduledItem;
use crate::domain::slot_grid::SlotGrid;
use std::ops::Range;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlacementRejection {
    #[error("slot {0} is not on the grid")]
    InvalidSlot(String),
    #[error("range starting at {start_slot} runs past the end of the grid")]
    OutOfBounds { start_slot: String },
    #[error("range overlaps item {item_id}")]
    Overlap { item_id: String },
    #[error("duration must be > 0 minutes")]
    InvalidDuration,
}

/// Slot indexes occupied by an item, or `None` when its start is not on the grid.
pub fn occupied_range(item: &ScheduledItem, grid: &SlotGrid) -> Option<Range<usize>> {
    let start = grid.index_of(&item.start_slot)?;
    Some(start..start + grid.slots_needed(item.duration_minutes))
}

pub fn check_placement(
    candidate_start: &str,
    candidate_duration: u32,
    grid: &SlotGrid,
    existing: &[ScheduledItem],
    exclude_id: Option<&str>,
) -> Result<(), PlacementRejection> {
    let Some(start) = grid.index_of(candidate_start) else {
        return Err(PlacementRejection::InvalidSlot(candidate_start.to_string()));
    };
    check_range(start, candidate_duration, grid, existing, exclude_id)
}

pub fn is_available(
    candidate_start: &str,
    candidate_duration: u32,
    grid: &SlotGrid,
    existing: &[ScheduledItem],
    exclude_id: Option<&str>,
) -> bool {
    check_placement(candidate_start, candidate_duration, grid, existing, exclude_id).is_ok()
}

/// First pair of items whose ranges intersect or that leave the grid.
pub fn find_conflict(items: &[ScheduledItem], grid: &SlotGrid) -> Option<(String, Option<String>)> {
    let mut ranges = Vec::with_capacity(items.len());
    for item in items {
        match occupied_range(item, grid) {
            Some(range) if range.end <= grid.len() && !range.is_empty() => {
                ranges.push((range, item.id.as_str()));
            }
            _ => return Some((item.id.clone(), None)),
        }
    }
    ranges.sort_by_key(|(range, _)| range.start);
    ranges.windows(2).find_map(|pair| {
        let (left, left_id) = &pair[0];
        let (right, right_id) = &pair[1];
        (right.start < left.end).then(|| (left_id.to_string(), Some(right_id.to_string())))
    })
}

/// Same gate as [`check_placement`] for a start already resolved to an index.
pub(crate) fn check_range(
    start: usize,
    duration_minutes: u32,
    grid: &SlotGrid,
    existing: &[ScheduledItem],
    exclude_id: Option<&str>,
) -> Result<(), PlacementRejection> {
    if duration_minutes == 0 {
        return Err(PlacementRejection::InvalidDuration);
    }
    let needed = grid.slots_needed(duration_minutes);
    if start >= grid.len() || start + needed > grid.len() {
        return Err(PlacementRejection::OutOfBounds {
            start_slot: grid.label_at(start).unwrap_or_default(),
        });
    }

    let candidate = start..start + needed;
    for item in existing {
        if exclude_id.is_some_and(|excluded| excluded == item.id) {
            continue;
        }
        let Some(range) = occupied_range(item, grid) else {
            continue;
        };
        if range.start < candidate.end && candidate.start < range.end {
            return Err(PlacementRejection::Overlap {
                item_id: item.id.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn grid() -> SlotGrid {
        SlotGrid::parse_window("09:00", "17:00", 15).expect("grid")
    }

    fn item(id: &str, start: &str, minutes: u32) -> ScheduledItem {
        ScheduledItem::for_task(id, "2026-02-16", format!("tsk-{id}"), start, minutes)
    }

    #[test]
    fn free_slot_is_available() {
        let existing = vec![item("a", "09:00", 60)];
        assert!(is_available("10:00", 30, &grid(), &existing, None));
    }

    #[test]
    fn unknown_label_is_rejected() {
        let result = check_placement("08:45", 30, &grid(), &[], None);
        assert_eq!(result, Err(PlacementRejection::InvalidSlot("08:45".to_string())));
    }

    #[test]
    fn range_past_grid_end_is_rejected() {
        let result = check_placement("16:30", 60, &grid(), &[], None);
        assert!(matches!(result, Err(PlacementRejection::OutOfBounds { .. })));
        assert!(is_available("16:00", 60, &grid(), &[], None));
    }

    #[test]
    fn overlapping_range_names_the_blocking_item() {
        let existing = vec![item("a", "09:00", 60)];
        let result = check_placement("09:45", 30, &grid(), &existing, None);
        assert_eq!(
            result,
            Err(PlacementRejection::Overlap {
                item_id: "a".to_string()
            })
        );
    }

    #[test]
    fn excluded_item_does_not_block_itself() {
        let existing = vec![item("a", "09:00", 60)];
        assert!(!is_available("09:15", 60, &grid(), &existing, None));
        assert!(is_available("09:15", 60, &grid(), &existing, Some("a")));
    }

    #[test]
    fn partial_slot_durations_round_up_when_checking_overlap() {
        let existing = vec![item("a", "09:00", 20)];
        assert!(!is_available("09:15", 15, &grid(), &existing, None));
        assert!(is_available("09:30", 15, &grid(), &existing, None));
    }

    #[test]
    fn zero_duration_is_rejected() {
        let result = check_placement("09:00", 0, &grid(), &[], None);
        assert_eq!(result, Err(PlacementRejection::InvalidDuration));
    }

    #[test]
    fn find_conflict_reports_overlaps_and_stray_items() {
        let clean = vec![item("a", "09:00", 60), item("b", "10:00", 30)];
        assert_eq!(find_conflict(&clean, &grid()), None);

        let overlapping = vec![item("a", "09:00", 60), item("b", "09:45", 30)];
        assert_eq!(
            find_conflict(&overlapping, &grid()),
            Some(("a".to_string(), Some("b".to_string())))
        );

        let stray = vec![item("a", "16:45", 60)];
        assert_eq!(find_conflict(&stray, &grid()), Some(("a".to_string(), None)));
    }

    proptest! {
        #[test]
        fn availability_check_is_idempotent(
            start in 0usize..40,
            minutes in 1u32..240,
            blocker_start in 0usize..32,
            blocker_minutes in 1u32..120
        ) {
            let grid = grid();
            let start_label = grid.label_at(start).unwrap_or_else(|| "18:00".to_string());
            let blocker_label = grid.label_at(blocker_start).expect("blocker on grid");
            let existing = vec![item("b", &blocker_label, blocker_minutes)];

            let first = is_available(&start_label, minutes, &grid, &existing, None);
            let second = is_available(&start_label, minutes, &grid, &existing, None);
            prop_assert_eq!(first, second);
        }
    }
}

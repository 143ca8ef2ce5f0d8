use serde::Serialize;

use crate::grid::{MonthGrid, DAYS_PER_WEEK};
use crate::model::*;

// ── Overlap Layout ────────────────────────────────────────────────

/// A run of consecutive days of one block inside one grid row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub row: usize,
    /// First column, 0 = Sunday.
    pub column: usize,
    /// Columns covered, 1..=7.
    pub span: usize,
}

/// Stacking slot of one placed block, independent of any grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotAssignment {
    pub block_id: BlockId,
    pub span: DaySpan,
    pub slot: usize,
    /// Bands the row height is divided into while this block is drawn.
    pub slot_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockLayout {
    pub block_id: BlockId,
    pub employee_id: EmployeeId,
    pub slot: usize,
    pub slot_count: usize,
    pub segments: Vec<Segment>,
}

impl BlockLayout {
    /// `(offset, height)` as fractions of the row height.
    pub fn vertical_band(&self) -> (f64, f64) {
        let height = 1.0 / self.slot_count as f64;
        (self.slot as f64 * height, height)
    }
}

/// Assign stacking slots to every placed block, in collection order.
///
/// Each block takes the lowest slot not held by an earlier block sharing any of its
/// days, so blocks that share a day never share a slot while disjoint blocks reuse
/// slots freely. `slot_count` is the most blocks drawn on any single day of the span
/// (the block itself included), raised if needed so the slot fits.
///
/// Recomputed from scratch on every call: inserting a block earlier in the collection
/// can shift the slots of later ones.
pub fn assign_slots(blocks: &[VacationBlock]) -> Vec<SlotAssignment> {
    let placed: Vec<(BlockId, DaySpan)> = blocks
        .iter()
        .filter_map(|b| b.span().map(|span| (b.id, span)))
        .collect();

    let mut assigned: Vec<SlotAssignment> = Vec::with_capacity(placed.len());
    for (i, &(block_id, span)) in placed.iter().enumerate() {
        let slots_needed = max_co_occupants(&placed, i) + 1;

        let mut taken: Vec<usize> = assigned
            .iter()
            .filter(|a| a.span.overlaps(&span))
            .map(|a| a.slot)
            .collect();
        taken.sort_unstable();
        taken.dedup();
        let slot = lowest_free(&taken);

        assigned.push(SlotAssignment {
            block_id,
            span,
            slot,
            slot_count: slots_needed.max(slot + 1),
        });
    }
    assigned
}

/// Most other blocks covering a single day of `placed[i]`'s span.
fn max_co_occupants(placed: &[(BlockId, DaySpan)], i: usize) -> usize {
    let span = placed[i].1;
    let len = span.day_count() as usize;
    // Difference array over the span's day offsets.
    let mut delta = vec![0i64; len + 1];
    for (j, (_, other)) in placed.iter().enumerate() {
        if j == i || !other.overlaps(&span) {
            continue;
        }
        let from = (other.start.max(span.start) - span.start).num_days() as usize;
        let to = (other.end.min(span.end) - span.start).num_days() as usize;
        delta[from] += 1;
        delta[to + 1] -= 1;
    }
    let mut running = 0i64;
    let mut max = 0i64;
    for d in &delta[..len] {
        running += d;
        max = max.max(running);
    }
    max as usize
}

/// Smallest value missing from a sorted, deduplicated list.
fn lowest_free(sorted_taken: &[usize]) -> usize {
    let mut slot = 0;
    for &s in sorted_taken {
        if s == slot {
            slot += 1;
        } else if s > slot {
            break;
        }
    }
    slot
}

/// Row segments of `span` on `grid`. Days off the grid produce nothing.
pub fn segments(grid: &MonthGrid, span: &DaySpan) -> Vec<Segment> {
    let first = span.start.max(grid.first_date());
    let last = span.end.min(grid.last_date());
    if first > last {
        return Vec::new();
    }
    // Grid cells are contiguous days, so the clipped span maps to a contiguous index run.
    let (Some(mut idx), Some(end)) = (grid.cell_index(first), grid.cell_index(last)) else {
        return Vec::new();
    };

    let mut out = Vec::new();
    while idx <= end {
        let column = idx % DAYS_PER_WEEK;
        let width = (DAYS_PER_WEEK - column).min(end - idx + 1);
        out.push(Segment {
            row: idx / DAYS_PER_WEEK,
            column,
            span: width,
        });
        idx += width;
    }
    out
}

/// Drawable layout of every placed block that touches `grid`, in collection order.
///
/// Slots are assigned over the whole collection, not just the visible blocks, so a
/// block keeps the same band in every displayed month.
pub fn layout_grid(grid: &MonthGrid, blocks: &[VacationBlock]) -> Vec<BlockLayout> {
    let slots = assign_slots(blocks);
    layout_with_slots(grid, blocks, &slots)
}

/// Lay out several grids sharing one slot assignment.
pub fn layout_months(grids: &[MonthGrid], blocks: &[VacationBlock]) -> Vec<Vec<BlockLayout>> {
    let slots = assign_slots(blocks);
    grids
        .iter()
        .map(|g| layout_with_slots(g, blocks, &slots))
        .collect()
}

fn layout_with_slots(
    grid: &MonthGrid,
    blocks: &[VacationBlock],
    slots: &[SlotAssignment],
) -> Vec<BlockLayout> {
    // `slots` follows the placed blocks in collection order.
    blocks
        .iter()
        .filter(|b| !b.is_pending())
        .zip(slots)
        .filter_map(|(block, assignment)| {
            debug_assert_eq!(block.id, assignment.block_id);
            let drawn = segments(grid, &assignment.span);
            if drawn.is_empty() {
                return None;
            }
            Some(BlockLayout {
                block_id: block.id,
                employee_id: block.employee_id,
                slot: assignment.slot,
                slot_count: assignment.slot_count,
                segments: drawn,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use ulid::Ulid;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn placed(start: NaiveDate, day_count: u32) -> VacationBlock {
        VacationBlock {
            id: Ulid::new(),
            employee_id: Ulid::new(),
            day_count,
            start_date: Some(start),
        }
    }

    fn pending(day_count: u32) -> VacationBlock {
        VacationBlock {
            id: Ulid::new(),
            employee_id: Ulid::new(),
            day_count,
            start_date: None,
        }
    }

    fn slot_of(slots: &[SlotAssignment], id: BlockId) -> SlotAssignment {
        *slots.iter().find(|s| s.block_id == id).unwrap()
    }

    // ── lowest_free ───────────────────────────────────────

    #[test]
    fn lowest_free_basics() {
        assert_eq!(lowest_free(&[]), 0);
        assert_eq!(lowest_free(&[0, 1, 2]), 3);
        assert_eq!(lowest_free(&[1, 2]), 0);
        assert_eq!(lowest_free(&[0, 2, 3]), 1);
    }

    // ── assign_slots ──────────────────────────────────────

    #[test]
    fn identical_spans_get_distinct_slots() {
        let a = placed(d(2025, 3, 10), 3);
        let b = placed(d(2025, 3, 10), 3);
        let c = placed(d(2025, 4, 20), 3); // shares no day with a or b
        let slots = assign_slots(&[a.clone(), b.clone(), c.clone()]);

        let (sa, sb, sc) = (slot_of(&slots, a.id), slot_of(&slots, b.id), slot_of(&slots, c.id));
        assert_ne!(sa.slot, sb.slot);
        assert_eq!(sa.slot_count, 2);
        assert_eq!(sb.slot_count, 2);
        assert_eq!(sc.slot, 0);
        assert_eq!(sc.slot_count, 1);
    }

    #[test]
    fn lone_block_fills_the_row() {
        let a = placed(d(2025, 3, 10), 5);
        let slots = assign_slots(std::slice::from_ref(&a));
        assert_eq!(slots[0].slot, 0);
        assert_eq!(slots[0].slot_count, 1);
    }

    #[test]
    fn pending_blocks_ignored() {
        let a = placed(d(2025, 3, 10), 5);
        let p = pending(5);
        let slots = assign_slots(&[p, a.clone()]);
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].block_id, a.id);
        assert_eq!(slots[0].slot, 0);
    }

    #[test]
    fn slot_reused_after_neighbour_ends() {
        // a: 1..=5, b: 3..=7 (slot 1), c: 6..=9 overlaps only b → slot 0.
        let a = placed(d(2025, 3, 1), 5);
        let b = placed(d(2025, 3, 3), 5);
        let c = placed(d(2025, 3, 6), 4);
        let slots = assign_slots(&[a.clone(), b.clone(), c.clone()]);
        assert_eq!(slot_of(&slots, a.id).slot, 0);
        assert_eq!(slot_of(&slots, b.id).slot, 1);
        assert_eq!(slot_of(&slots, c.id).slot, 0);
        assert_eq!(slot_of(&slots, c.id).slot_count, 2);
    }

    #[test]
    fn co_occupants_counted_per_day_not_per_span() {
        // x spans 1..=10; two neighbours touch it on different days only.
        let x = placed(d(2025, 3, 1), 10);
        let left = placed(d(2025, 3, 1), 2);
        let right = placed(d(2025, 3, 9), 2);
        let slots = assign_slots(&[x.clone(), left, right]);
        // Never more than one other block on a single day of x.
        assert_eq!(slot_of(&slots, x.id).slot_count, 2);
    }

    #[test]
    fn slot_count_grows_to_fit_slot() {
        // s holds slot 0 on the 6th; r (5..=6) overlaps s → slot 1.
        // x (1..=5) meets p on the 1st (slot 0) and r on the 5th (slot 1): never two
        // neighbours on one day, but the lowest free slot is 2.
        let p = placed(d(2025, 3, 1), 1);
        let s = placed(d(2025, 3, 6), 1);
        let r = placed(d(2025, 3, 5), 2);
        let x = placed(d(2025, 3, 1), 5);
        let slots = assign_slots(&[p, s, r, x.clone()]);
        let sx = slot_of(&slots, x.id);
        assert_eq!(sx.slot, 2);
        assert_eq!(sx.slot_count, 3);
    }

    #[test]
    fn no_two_blocks_sharing_a_day_share_a_slot() {
        let starts = [1, 2, 2, 4, 5, 5, 8, 9, 12, 13];
        let lengths = [3, 5, 1, 6, 2, 9, 3, 4, 2, 7];
        let blocks: Vec<_> = starts
            .iter()
            .zip(lengths)
            .map(|(&s, len)| placed(d(2025, 7, s), len))
            .collect();
        let slots = assign_slots(&blocks);
        for (i, a) in slots.iter().enumerate() {
            assert!(a.slot < a.slot_count);
            for b in &slots[i + 1..] {
                if a.span.overlaps(&b.span) {
                    assert_ne!(a.slot, b.slot, "{a:?} vs {b:?}");
                }
            }
        }
    }

    #[test]
    fn earlier_insertion_can_shift_later_slots() {
        let a = placed(d(2025, 3, 10), 3);
        let b = placed(d(2025, 3, 10), 3);
        let before = assign_slots(&[a.clone(), b.clone()]);
        assert_eq!(slot_of(&before, b.id).slot, 1);

        let after = assign_slots(&[b.clone(), a.clone()]);
        assert_eq!(slot_of(&after, b.id).slot, 0);
    }

    // ── segments ──────────────────────────────────────────

    #[test]
    fn single_row_segment() {
        let g = MonthGrid::build(2025, 3).unwrap();
        // Mon 10 .. Wed 12 March → row 2, columns 1..=3
        let segs = segments(&g, &DaySpan::from_start(d(2025, 3, 10), 3));
        assert_eq!(segs, vec![Segment { row: 2, column: 1, span: 3 }]);
    }

    #[test]
    fn ten_days_from_last_friday_wraps_rows() {
        let g = MonthGrid::build(2025, 3).unwrap();
        // Last Friday of March 2025 is the 28th (row 4, column 5).
        let segs = segments(&g, &DaySpan::from_start(d(2025, 3, 28), 10));
        assert_eq!(
            segs,
            vec![
                Segment { row: 4, column: 5, span: 2 }, // Fri 28, Sat 29
                Segment { row: 5, column: 0, span: 7 }, // Sun 30 .. Sat 5 Apr
            ]
        );
        // Sun 6 Apr is past the grid and draws nothing.
        let drawn: usize = segs.iter().map(|s| s.span).sum();
        assert_eq!(drawn, 9);
        assert!(segs[0].span <= 7 - segs[0].column);
    }

    #[test]
    fn block_ending_inside_grid_clipped_at_start() {
        let g = MonthGrid::build(2025, 3).unwrap(); // first cell Sun 23 Feb
        let segs = segments(&g, &DaySpan::from_start(d(2025, 2, 20), 6)); // 20..=25 Feb
        assert_eq!(segs, vec![Segment { row: 0, column: 0, span: 3 }]);
    }

    #[test]
    fn block_outside_grid_has_no_segments() {
        let g = MonthGrid::build(2025, 3).unwrap();
        assert!(segments(&g, &DaySpan::from_start(d(2025, 1, 5), 10)).is_empty());
        assert!(segments(&g, &DaySpan::from_start(d(2025, 4, 6), 3)).is_empty());
    }

    #[test]
    fn long_block_covers_whole_grid() {
        let g = MonthGrid::build(2025, 3).unwrap();
        let segs = segments(&g, &DaySpan::from_start(d(2025, 2, 1), 90));
        assert_eq!(segs.len(), g.rows());
        assert!(segs.iter().all(|s| s.column == 0 && s.span == 7));
    }

    #[test]
    fn block_starting_on_saturday_splits_after_one_day() {
        let g = MonthGrid::build(2025, 3).unwrap();
        let segs = segments(&g, &DaySpan::from_start(d(2025, 3, 1), 3)); // Sat 1 .. Mon 3
        assert_eq!(
            segs,
            vec![
                Segment { row: 0, column: 6, span: 1 },
                Segment { row: 1, column: 0, span: 2 },
            ]
        );
    }

    // ── layout_grid ───────────────────────────────────────

    #[test]
    fn layout_skips_invisible_and_pending_blocks() {
        let g = MonthGrid::build(2025, 3).unwrap();
        let visible = placed(d(2025, 3, 10), 3);
        let hidden = placed(d(2025, 8, 1), 3);
        let blocks = vec![pending(4), hidden, visible.clone()];
        let layouts = layout_grid(&g, &blocks);
        assert_eq!(layouts.len(), 1);
        assert_eq!(layouts[0].block_id, visible.id);
        assert_eq!(layouts[0].employee_id, visible.employee_id);
    }

    #[test]
    fn layout_overlap_outside_grid_still_counts() {
        // Both blocks visible in March only through their first days; they overlap in April.
        let g = MonthGrid::build(2025, 3).unwrap();
        let a = placed(d(2025, 4, 5), 5);
        let b = placed(d(2025, 4, 5), 5);
        let layouts = layout_grid(&g, &[a, b]);
        assert_eq!(layouts.len(), 2);
        assert_ne!(layouts[0].slot, layouts[1].slot);
        assert!(layouts.iter().all(|l| l.slot_count == 2));
    }

    #[test]
    fn same_slot_in_every_month() {
        let grids = vec![MonthGrid::build(2025, 3).unwrap(), MonthGrid::build(2025, 4).unwrap()];
        let a = placed(d(2025, 3, 30), 10);
        let b = placed(d(2025, 3, 28), 5);
        let per_month = layout_months(&grids, &[a.clone(), b.clone()]);
        let slot_in = |month: usize, id: BlockId| {
            per_month[month].iter().find(|l| l.block_id == id).map(|l| l.slot)
        };
        assert_eq!(slot_in(0, a.id), slot_in(1, a.id));
        assert_eq!(slot_in(0, b.id), Some(1));
    }

    #[test]
    fn vertical_band_fractions() {
        let layout = BlockLayout {
            block_id: Ulid::new(),
            employee_id: Ulid::new(),
            slot: 1,
            slot_count: 4,
            segments: vec![],
        };
        assert_eq!(layout.vertical_band(), (0.25, 0.25));
    }
}

use chrono::NaiveDate;

use super::axis::DateAxis;
use super::item::{Badge, Block, ItemId, Milestone};
use super::push::PushPlan;

const MIN_ZOOM: f32 = 0.25;
const MAX_ZOOM: f32 = 4.0;

/// Partial update applied by [`ItemStore::update_item`]. Fields that do not
/// apply to the targeted variant are ignored.
#[derive(Debug, Clone, Default)]
pub struct ItemPatch {
    pub start_date: Option<NaiveDate>,
    pub duration: Option<i64>,
    pub row: Option<usize>,
    pub label: Option<String>,
    pub badge: Option<Badge>,
    pub date: Option<NaiveDate>,
    pub text: Option<String>,
}

/// The authoritative, ordered collection of timeline entities.
///
/// Blocks are kept stable-sorted ascending by start date after every
/// mutation, and every mutating call bumps the revision counter exactly
/// once — the change notification collaborators poll between frames.
#[derive(Debug, Clone)]
pub struct ItemStore {
    blocks: Vec<Block>,
    milestones: Vec<Milestone>,
    /// Blocks dragged off the track; kept so the document round-trips.
    off_timeline: Vec<Block>,
    start_date: NaiveDate,
    zoom: f32,
    scroll_position: f32,
    last_badge: Badge,
    next_id: u64,
    revision: u64,
    dirty: bool,
}

impl ItemStore {
    pub fn new(start_date: NaiveDate) -> Self {
        Self {
            blocks: Vec::new(),
            milestones: Vec::new(),
            off_timeline: Vec::new(),
            start_date,
            zoom: 1.0,
            scroll_position: 0.0,
            last_badge: Badge::A,
            next_id: 1,
            revision: 0,
            dirty: false,
        }
    }

    /// Rebuild a store from deserialized parts, re-establishing every
    /// invariant: duration floor, stable date order, one milestone per
    /// (date, row), and the id counter reseeded past the highest id.
    pub fn from_parts(
        start_date: NaiveDate,
        mut blocks: Vec<Block>,
        milestones: Vec<Milestone>,
        off_timeline: Vec<Block>,
        zoom: f32,
        scroll_position: f32,
        last_badge: Badge,
    ) -> Self {
        for b in &mut blocks {
            b.duration = b.duration.max(1);
        }
        blocks.sort_by_key(|b| b.start_date);

        let mut unique: Vec<Milestone> = Vec::with_capacity(milestones.len());
        for m in milestones {
            if !unique.iter().any(|u| u.date == m.date && u.row == m.row) {
                unique.push(m);
            }
        }

        let max_id = blocks
            .iter()
            .map(|b| b.id.0)
            .chain(unique.iter().map(|m| m.id.0))
            .chain(off_timeline.iter().map(|b| b.id.0))
            .max()
            .unwrap_or(0);

        Self {
            blocks,
            milestones: unique,
            off_timeline,
            start_date,
            zoom: zoom.clamp(MIN_ZOOM, MAX_ZOOM),
            scroll_position,
            last_badge,
            next_id: max_id + 1,
            revision: 0,
            dirty: false,
        }
    }

    // --- Change notification ---

    fn notify(&mut self) {
        self.revision += 1;
        self.dirty = true;
    }

    /// Monotonic counter bumped once per mutating call.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Whether anything changed since the last [`Self::take_dirty`] poll.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    // --- View state (persisted alongside the items) ---

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    /// Move the axis origin. Clamped so no placed item ends up before day 0.
    pub fn set_start_date(&mut self, date: NaiveDate) {
        let earliest = self
            .blocks
            .iter()
            .map(|b| b.start_date)
            .chain(self.milestones.iter().map(|m| m.date))
            .min();
        let clamped = match earliest {
            Some(min) => date.min(min),
            None => date,
        };
        if clamped != self.start_date {
            self.start_date = clamped;
            self.notify();
        }
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn set_zoom(&mut self, zoom: f32) {
        let clamped = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        if clamped != self.zoom {
            self.zoom = clamped;
            self.notify();
        }
    }

    pub fn scroll_position(&self) -> f32 {
        self.scroll_position
    }

    pub fn set_scroll_position(&mut self, scroll: f32) {
        if (scroll - self.scroll_position).abs() > 0.5 {
            self.scroll_position = scroll;
            self.dirty = true;
        }
    }

    /// Axis value for the current origin and zoom.
    pub fn axis(&self) -> DateAxis {
        DateAxis::new(self.start_date, self.zoom)
    }

    pub fn last_badge(&self) -> Badge {
        self.last_badge
    }

    // --- Lookup ---

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn milestones(&self) -> &[Milestone] {
        &self.milestones
    }

    pub fn off_timeline_blocks(&self) -> &[Block] {
        &self.off_timeline
    }

    pub fn block(&self, id: ItemId) -> Option<&Block> {
        self.blocks.iter().find(|b| b.id == id)
    }

    pub fn milestone(&self, id: ItemId) -> Option<&Milestone> {
        self.milestones.iter().find(|m| m.id == id)
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.block(id).is_some() || self.milestone(id).is_some()
    }

    /// The milestone occupying a (date, row) intersection, if any.
    pub fn annotation_at(&self, date: NaiveDate, row: usize) -> Option<&Milestone> {
        self.milestones
            .iter()
            .find(|m| m.date == date && m.row == row)
    }

    /// All placed item ids in row-major traversal order, for keyboard
    /// selection cycling.
    pub fn row_major_ids(&self) -> Vec<ItemId> {
        let mut keyed: Vec<(usize, NaiveDate, u64)> = self
            .blocks
            .iter()
            .map(|b| (b.row, b.start_date, b.id.0))
            .chain(self.milestones.iter().map(|m| (m.row, m.date, m.id.0)))
            .collect();
        keyed.sort();
        keyed.into_iter().map(|(_, _, id)| ItemId(id)).collect()
    }

    fn fresh_id(&mut self) -> ItemId {
        let id = ItemId(self.next_id);
        self.next_id += 1;
        id
    }

    fn sort_blocks(&mut self) {
        self.blocks.sort_by_key(|b| b.start_date);
    }

    // --- Mutations ---

    /// Insert a block. Duration is floored at 1; the last used badge is
    /// applied as the default.
    pub fn add_block(
        &mut self,
        start_date: NaiveDate,
        duration: i64,
        label: impl Into<String>,
        row: usize,
    ) -> ItemId {
        let id = self.fresh_id();
        self.blocks.push(Block {
            id,
            start_date,
            duration: duration.max(1),
            row,
            label: label.into(),
            badge: self.last_badge,
        });
        self.sort_blocks();
        self.notify();
        id
    }

    /// Relative-day form of [`Self::add_block`]. Days clamp at 0.
    pub fn add_block_at_day(
        &mut self,
        day: i64,
        duration: i64,
        label: impl Into<String>,
        row: usize,
    ) -> ItemId {
        let date = self.axis().date_from_relative_day(day.max(0));
        self.add_block(date, duration, label, row)
    }

    /// Insert a milestone, unless its (date, row) intersection is already
    /// occupied — creation there is suppressed.
    pub fn add_milestone(
        &mut self,
        date: NaiveDate,
        row: usize,
        text: impl Into<String>,
    ) -> Option<ItemId> {
        if self.annotation_at(date, row).is_some() {
            return None;
        }
        let id = self.fresh_id();
        self.milestones.push(Milestone {
            id,
            date,
            row,
            text: text.into(),
        });
        self.notify();
        Some(id)
    }

    /// Relative-day form of [`Self::add_milestone`].
    pub fn add_milestone_at_day(
        &mut self,
        day: i64,
        row: usize,
        text: impl Into<String>,
    ) -> Option<ItemId> {
        let date = self.axis().date_from_relative_day(day.max(0));
        self.add_milestone(date, row, text)
    }

    /// Remove a block or milestone. Unknown ids are a no-op.
    pub fn remove_item(&mut self, id: ItemId) -> bool {
        let before = self.blocks.len() + self.milestones.len();
        self.blocks.retain(|b| b.id != id);
        self.milestones.retain(|m| m.id != id);
        let removed = self.blocks.len() + self.milestones.len() < before;
        if removed {
            self.notify();
        }
        removed
    }

    /// Move a block off the track (drag-to-outside delete). The block stops
    /// participating in layout but survives in the document.
    pub fn move_off_timeline(&mut self, id: ItemId) -> bool {
        let Some(idx) = self.blocks.iter().position(|b| b.id == id) else {
            return false;
        };
        let block = self.blocks.remove(idx);
        self.off_timeline.push(block);
        self.notify();
        true
    }

    /// Apply a partial update. Unknown ids are a no-op returning `false`.
    /// Updating a block's badge records it as the last used badge.
    pub fn update_item(&mut self, id: ItemId, patch: ItemPatch) -> bool {
        if let Some(b) = self.blocks.iter_mut().find(|b| b.id == id) {
            if let Some(d) = patch.start_date {
                b.start_date = d;
            }
            if let Some(d) = patch.duration {
                b.duration = d.max(1);
            }
            if let Some(r) = patch.row {
                b.row = r;
            }
            if let Some(l) = patch.label {
                b.label = l;
            }
            if let Some(badge) = patch.badge {
                b.badge = badge;
                self.last_badge = badge;
            }
            self.sort_blocks();
            self.notify();
            return true;
        }
        if let Some(idx) = self.milestones.iter().position(|m| m.id == id) {
            let new_date = patch.date.unwrap_or(self.milestones[idx].date);
            let new_row = patch.row.unwrap_or(self.milestones[idx].row);
            // Moves onto an occupied intersection are rejected, mirroring
            // the suppression in add_milestone.
            if self
                .annotation_at(new_date, new_row)
                .is_some_and(|other| other.id != id)
            {
                return false;
            }
            let m = &mut self.milestones[idx];
            m.date = new_date;
            m.row = new_row;
            if let Some(t) = patch.text {
                m.text = t;
            }
            self.notify();
            return true;
        }
        false
    }

    /// Advance a block's badge through the fixed cycle and record it as the
    /// default for new blocks.
    pub fn cycle_badge(&mut self, id: ItemId) -> Option<Badge> {
        let next = self.block(id)?.badge.next();
        self.update_item(
            id,
            ItemPatch {
                badge: Some(next),
                ..Default::default()
            },
        );
        Some(next)
    }

    /// Splice a block to `target_index` in the ordered collection. The
    /// stable date sort runs afterwards, so the splice is observable among
    /// blocks sharing a start date.
    pub fn reorder(&mut self, id: ItemId, target_index: usize) -> bool {
        let Some(current) = self.blocks.iter().position(|b| b.id == id) else {
            return false;
        };
        let block = self.blocks.remove(current);
        let mut target = target_index;
        if target > current {
            target -= 1;
        }
        let target = target.min(self.blocks.len());
        self.blocks.insert(target, block);
        self.sort_blocks();
        self.notify();
        true
    }

    /// Commit a resize and its push shifts as one transaction: either the
    /// resized block and every affected block are updated, or nothing is.
    pub fn commit_resize(&mut self, plan: &PushPlan, new_duration: i64) -> bool {
        let new_duration = new_duration.max(1);
        if self.block(plan.block).is_none() {
            return false;
        }
        if plan.affected.iter().any(|id| self.block(*id).is_none()) {
            return false;
        }
        let delta = new_duration - plan.old_duration;
        for b in &mut self.blocks {
            if b.id == plan.block {
                b.duration = new_duration;
            } else if plan.affected.contains(&b.id) {
                b.start_date += chrono::Duration::days(delta);
            }
        }
        self.sort_blocks();
        self.notify();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(n: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, n).unwrap()
    }

    fn store() -> ItemStore {
        ItemStore::new(day(1))
    }

    #[test]
    fn blocks_stay_sorted_by_start_date() {
        let mut s = store();
        s.add_block(day(10), 2, "late", 0);
        s.add_block(day(2), 3, "early", 0);
        s.add_block(day(5), 1, "middle", 1);
        let starts: Vec<_> = s.blocks().iter().map(|b| b.start_date).collect();
        let mut sorted = starts.clone();
        sorted.sort();
        assert_eq!(starts, sorted);

        // Still sorted after a mutation moves a block.
        let id = s.blocks()[0].id;
        s.update_item(
            id,
            ItemPatch {
                start_date: Some(day(20)),
                ..Default::default()
            },
        );
        let starts: Vec<_> = s.blocks().iter().map(|b| b.start_date).collect();
        let mut sorted = starts.clone();
        sorted.sort();
        assert_eq!(starts, sorted);
    }

    #[test]
    fn milestone_creation_at_occupied_intersection_is_suppressed() {
        let mut s = store();
        assert!(s.add_milestone(day(4), 0, "first").is_some());
        assert!(s.add_milestone(day(4), 0, "second").is_none());
        assert_eq!(s.milestones().len(), 1);
        // Same date on another row is fine.
        assert!(s.add_milestone(day(4), 1, "other row").is_some());
    }

    #[test]
    fn milestone_move_onto_occupied_intersection_is_rejected() {
        let mut s = store();
        s.add_milestone(day(3), 0, "first");
        let second = s.add_milestone(day(4), 0, "second").unwrap();
        let rev = s.revision();

        assert!(!s.update_item(
            second,
            ItemPatch {
                date: Some(day(3)),
                ..Default::default()
            },
        ));
        assert_eq!(s.milestone(second).unwrap().date, day(4));
        assert_eq!(s.revision(), rev);
        let occupied = s
            .milestones()
            .iter()
            .filter(|m| m.date == day(3) && m.row == 0)
            .count();
        assert_eq!(occupied, 1);

        // A patch that keeps the milestone on its own intersection works.
        assert!(s.update_item(
            second,
            ItemPatch {
                text: Some("renamed".into()),
                ..Default::default()
            },
        ));
        // Same date on a free row is fine too.
        assert!(s.update_item(
            second,
            ItemPatch {
                date: Some(day(3)),
                row: Some(1),
                ..Default::default()
            },
        ));
    }

    #[test]
    fn mutations_fire_exactly_one_notification() {
        let mut s = store();
        let r0 = s.revision();
        let id = s.add_block(day(1), 5, "a", 0);
        assert_eq!(s.revision(), r0 + 1);
        s.update_item(
            id,
            ItemPatch {
                duration: Some(2),
                label: Some("b".into()),
                ..Default::default()
            },
        );
        assert_eq!(s.revision(), r0 + 2);
        s.remove_item(id);
        assert_eq!(s.revision(), r0 + 3);
    }

    #[test]
    fn unknown_id_operations_are_noops() {
        let mut s = store();
        s.add_block(day(1), 1, "a", 0);
        let rev = s.revision();
        let ghost = ItemId(999);
        assert!(!s.remove_item(ghost));
        assert!(!s.update_item(ghost, ItemPatch::default()));
        assert!(!s.reorder(ghost, 0));
        assert!(!s.move_off_timeline(ghost));
        assert!(s.cycle_badge(ghost).is_none());
        assert_eq!(s.revision(), rev);
    }

    #[test]
    fn badge_update_becomes_default_for_new_blocks() {
        let mut s = store();
        let id = s.add_block(day(1), 1, "a", 0);
        assert_eq!(s.block(id).unwrap().badge, Badge::A);
        s.cycle_badge(id);
        assert_eq!(s.last_badge(), Badge::B);
        let id2 = s.add_block(day(2), 1, "b", 0);
        assert_eq!(s.block(id2).unwrap().badge, Badge::B);
    }

    #[test]
    fn duration_is_floored_at_one() {
        let mut s = store();
        let id = s.add_block(day(1), 0, "a", 0);
        assert_eq!(s.block(id).unwrap().duration, 1);
        s.update_item(
            id,
            ItemPatch {
                duration: Some(-7),
                ..Default::default()
            },
        );
        assert_eq!(s.block(id).unwrap().duration, 1);
    }

    #[test]
    fn from_parts_reseeds_id_counter_past_max() {
        let blocks = vec![Block {
            id: ItemId(41),
            start_date: day(1),
            duration: 1,
            row: 0,
            label: String::new(),
            badge: Badge::A,
        }];
        let mut s = ItemStore::from_parts(day(1), blocks, vec![], vec![], 1.0, 0.0, Badge::A);
        let id = s.add_block(day(2), 1, "fresh", 0);
        assert_eq!(id, ItemId(42));
    }

    #[test]
    fn from_parts_drops_duplicate_annotations() {
        let ms = vec![
            Milestone {
                id: ItemId(1),
                date: day(3),
                row: 0,
                text: "keep".into(),
            },
            Milestone {
                id: ItemId(2),
                date: day(3),
                row: 0,
                text: "drop".into(),
            },
        ];
        let s = ItemStore::from_parts(day(1), vec![], ms, vec![], 1.0, 0.0, Badge::A);
        assert_eq!(s.milestones().len(), 1);
        assert_eq!(s.milestones()[0].text, "keep");
    }

    #[test]
    fn move_off_timeline_shrinks_placed_set() {
        let mut s = store();
        let id = s.add_block(day(1), 2, "a", 0);
        assert!(s.move_off_timeline(id));
        assert!(s.blocks().is_empty());
        assert_eq!(s.off_timeline_blocks().len(), 1);
        assert_eq!(s.off_timeline_blocks()[0].id, id);
    }

    #[test]
    fn start_date_clamps_to_earliest_item() {
        let mut s = store();
        s.add_block(day(5), 2, "a", 0);
        s.set_start_date(day(10));
        assert_eq!(s.start_date(), day(5));
        s.set_start_date(day(2));
        assert_eq!(s.start_date(), day(2));
    }
}

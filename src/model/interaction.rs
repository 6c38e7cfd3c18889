use egui::{Pos2, Rect};

use super::grid::GridIntersection;
use super::item::ItemId;
use super::push::{self, PushPlan};
use super::rows::RowLayout;
use super::store::{ItemPatch, ItemStore};

/// Pointer travel (in either axis) that promotes an armed press to a drag.
pub const DRAG_THRESHOLD: f32 = 5.0;

/// Half-width of the band around a gap midpoint that counts as a drop zone.
const GAP_SNAP: f32 = 8.0;

/// What the pointer went down on, resolved by the adapter's hit test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerTarget {
    Background,
    Block(ItemId),
    ResizeHandle(ItemId),
    BadgeControl(ItemId),
    Milestone(ItemId),
    Affordance(GridIntersection),
}

/// Input to the pure state machine. The egui adapter translates raw pointer
/// state into these; tests feed them directly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerDown { pos: Pos2, target: PointerTarget },
    PointerMove { pos: Pos2 },
    PointerUp { pos: Pos2 },
}

/// Keyboard commands operating on the current selection. These are plain
/// store mutations, deliberately outside the pointer state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCommand {
    SelectNext,
    SelectPrev,
    GrowBlock,
    ShrinkBlock,
    NudgeLeft,
    NudgeRight,
    NudgeUp,
    NudgeDown,
    Delete,
    BeginEdit,
}

/// Splice position in the store's block order, identified mid-drag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DropZone {
    pub index: usize,
}

/// Inline text-editing session, orthogonal to the pointer states.
#[derive(Debug, Clone)]
pub struct EditSession {
    pub id: ItemId,
    pub buffer: String,
    /// The entity had no text when editing began; Escape deletes it.
    pub created_empty: bool,
}

#[derive(Debug, Clone)]
enum Gesture {
    Idle,
    Armed {
        origin: Pos2,
        target: PointerTarget,
    },
    DragCreate {
        row: usize,
        origin: Pos2,
        current: Pos2,
    },
    DragMove {
        id: ItemId,
        grab_days: i64,
        current: Pos2,
        drop: Option<DropZone>,
    },
    DragResize {
        plan: PushPlan,
        start_day: i64,
        base_width: f32,
        origin_x: f32,
        dx: f32,
    },
}

/// Transient visual state for the renderer, valid for the current frame
/// only and discarded with the gesture.
#[derive(Debug, Clone, PartialEq)]
pub enum GesturePreview {
    Create {
        row: usize,
        start_day: i64,
        duration: i64,
    },
    Move {
        id: ItemId,
        day: i64,
        row: usize,
        outside: bool,
        drop: Option<DropZone>,
    },
    Resize {
        id: ItemId,
        width_px: f32,
        shift_px: f32,
        affected: Vec<ItemId>,
    },
}

/// The pointer/keyboard state machine orchestrating creation, move,
/// resize-with-push and deletion against the store.
pub struct InteractionController {
    gesture: Gesture,
    pub rows: RowLayout,
    pub selected: Option<ItemId>,
    pub editing: Option<EditSession>,
    /// Track bounds in the same coordinate space as pointer positions;
    /// a DragMove released outside deletes the item.
    track: Rect,
}

impl InteractionController {
    pub fn new(rows: RowLayout) -> Self {
        Self {
            gesture: Gesture::Idle,
            rows,
            selected: None,
            editing: None,
            track: Rect::NOTHING,
        }
    }

    /// Refresh the track bounding box; the adapter calls this every frame.
    pub fn set_track_bounds(&mut self, track: Rect) {
        self.track = track;
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.gesture, Gesture::Idle)
    }

    // --- Pointer state machine ---

    pub fn handle_event(&mut self, event: InputEvent, store: &mut ItemStore) {
        match event {
            InputEvent::PointerDown { pos, target } => {
                // A press anywhere blurs an open edit (commit semantics).
                if self.editing.is_some() {
                    self.commit_edit(store);
                }
                self.gesture = Gesture::Armed {
                    origin: pos,
                    target,
                };
            }
            InputEvent::PointerMove { pos } => self.pointer_move(pos, store),
            InputEvent::PointerUp { pos } => self.pointer_up(pos, store),
        }
    }

    fn pointer_move(&mut self, pos: Pos2, store: &mut ItemStore) {
        if let Gesture::Armed { origin, target } = &self.gesture {
            let (origin, target) = (*origin, *target);
            if (pos.x - origin.x).abs() > DRAG_THRESHOLD
                || (pos.y - origin.y).abs() > DRAG_THRESHOLD
            {
                self.gesture = self.promote(origin, pos, target, store);
            }
            return;
        }
        match &mut self.gesture {
            Gesture::DragCreate { current, .. } => *current = pos,
            Gesture::DragMove { current, .. } => *current = pos,
            Gesture::DragResize { origin_x, dx, .. } => *dx = pos.x - *origin_x,
            Gesture::Idle | Gesture::Armed { .. } => return,
        }
        // Drop-zone recompute needs the gesture borrow released.
        if let Gesture::DragMove { id, .. } = &self.gesture {
            let id = *id;
            let zone = self.move_drop_zone(store, id, pos);
            if let Gesture::DragMove { drop, .. } = &mut self.gesture {
                *drop = zone;
            }
        }
    }

    /// Decide which drag an armed press becomes once past the threshold.
    fn promote(
        &mut self,
        origin: Pos2,
        pos: Pos2,
        target: PointerTarget,
        store: &ItemStore,
    ) -> Gesture {
        let axis = store.axis();
        match target {
            PointerTarget::Background => Gesture::DragCreate {
                row: self.rows.row_from_y(origin.y),
                origin,
                current: pos,
            },
            PointerTarget::Block(id) | PointerTarget::Milestone(id) => {
                let start_day = if let Some(b) = store.block(id) {
                    axis.relative_day_from_date(b.start_date)
                } else if let Some(m) = store.milestone(id) {
                    axis.relative_day_from_date(m.date)
                } else {
                    return Gesture::Idle;
                };
                self.selected = Some(id);
                Gesture::DragMove {
                    id,
                    grab_days: axis.pixel_to_day(origin.x) - start_day,
                    current: pos,
                    drop: None,
                }
            }
            PointerTarget::ResizeHandle(id) => {
                let (Some(plan), Some(block)) = (push::plan_resize(store, id), store.block(id))
                else {
                    return Gesture::Idle;
                };
                let start_day = axis.relative_day_from_date(block.start_date);
                self.selected = Some(id);
                Gesture::DragResize {
                    plan,
                    start_day,
                    base_width: axis.day_span_width(start_day, block.duration),
                    origin_x: origin.x,
                    dx: pos.x - origin.x,
                }
            }
            // Affordance and badge presses never become drags; past the
            // threshold the press is discarded.
            PointerTarget::Affordance(_) | PointerTarget::BadgeControl(_) => Gesture::Idle,
        }
    }

    fn pointer_up(&mut self, pos: Pos2, store: &mut ItemStore) {
        let gesture = std::mem::replace(&mut self.gesture, Gesture::Idle);
        match gesture {
            Gesture::Idle => {}
            Gesture::Armed { target, .. } => self.resolve_click(pos, target, store),
            Gesture::DragCreate { row, origin, .. } => {
                let axis = store.axis();
                let (start_day, duration) = create_span(&axis, origin.x, pos.x);
                let id = store.add_block_at_day(start_day, duration, "", row);
                self.selected = Some(id);
                self.begin_edit(id, store);
            }
            Gesture::DragMove {
                id,
                grab_days,
                drop,
                ..
            } => {
                if !store.contains(id) {
                    return; // deleted mid-drag; abort silently
                }
                if !self.track.contains(pos) {
                    if store.block(id).is_some() {
                        store.move_off_timeline(id);
                    } else {
                        store.remove_item(id);
                    }
                    if self.selected == Some(id) {
                        self.selected = None;
                    }
                    return;
                }
                let axis = store.axis();
                let day = (axis.pixel_to_day(pos.x) - grab_days).max(0);
                let date = axis.date_from_relative_day(day);
                let row = self.rows.row_from_y(pos.y);
                let patch = if store.block(id).is_some() {
                    ItemPatch {
                        start_date: Some(date),
                        row: Some(row),
                        ..Default::default()
                    }
                } else {
                    ItemPatch {
                        date: Some(date),
                        row: Some(row),
                        ..Default::default()
                    }
                };
                store.update_item(id, patch);
                if let Some(zone) = drop {
                    store.reorder(id, zone.index);
                }
            }
            Gesture::DragResize {
                plan,
                start_day,
                base_width,
                dx,
                ..
            } => {
                let axis = store.axis();
                let min_width = axis.day_span_width(start_day, 1);
                let width = (base_width + dx).max(min_width);
                let left = axis.day_to_pixel(start_day);
                let new_duration = (axis.pixel_to_day(left + width) - start_day).max(1);
                store.commit_resize(&plan, new_duration);
            }
        }
    }

    fn resolve_click(&mut self, pos: Pos2, target: PointerTarget, store: &mut ItemStore) {
        match target {
            PointerTarget::Background => {
                let axis = store.axis();
                let day = axis.pixel_to_day(pos.x);
                let row = self.rows.row_from_y(pos.y);
                let id = store.add_block_at_day(day, 1, "", row);
                self.selected = Some(id);
                self.begin_edit(id, store);
            }
            PointerTarget::Block(id)
            | PointerTarget::Milestone(id)
            | PointerTarget::ResizeHandle(id) => {
                if self.selected == Some(id) {
                    self.begin_edit(id, store);
                } else {
                    self.selected = Some(id);
                }
            }
            PointerTarget::BadgeControl(id) => {
                store.cycle_badge(id);
                self.selected = Some(id);
            }
            PointerTarget::Affordance(at) => {
                let axis = store.axis();
                let date = axis.date_from_relative_day(at.day);
                if let Some(id) = store.add_milestone(date, at.row, "") {
                    self.selected = Some(id);
                    self.begin_edit(id, store);
                }
            }
        }
    }

    /// Transient visual state for the current gesture, if any.
    pub fn preview(&self, store: &ItemStore) -> Option<GesturePreview> {
        let axis = store.axis();
        match &self.gesture {
            Gesture::Idle | Gesture::Armed { .. } => None,
            Gesture::DragCreate {
                row,
                origin,
                current,
            } => {
                let (start_day, duration) = create_span(&axis, origin.x, current.x);
                Some(GesturePreview::Create {
                    row: *row,
                    start_day,
                    duration,
                })
            }
            Gesture::DragMove {
                id,
                grab_days,
                current,
                drop,
            } => Some(GesturePreview::Move {
                id: *id,
                day: (axis.pixel_to_day(current.x) - grab_days).max(0),
                row: self.rows.row_from_y(current.y),
                outside: !self.track.contains(*current),
                drop: *drop,
            }),
            Gesture::DragResize {
                plan,
                start_day,
                base_width,
                dx,
                ..
            } => {
                let min_width = axis.day_span_width(*start_day, 1);
                let width = (base_width + dx).max(min_width);
                Some(GesturePreview::Resize {
                    id: plan.block,
                    width_px: width,
                    shift_px: width - base_width,
                    affected: plan.affected.clone(),
                })
            }
        }
    }

    /// The drop zone for a mid-drag pointer position: the global splice
    /// index when the pointer sits near a same-row gap midpoint or past
    /// either end of the row's blocks.
    fn move_drop_zone(&self, store: &ItemStore, moving: ItemId, pos: Pos2) -> Option<DropZone> {
        if store.block(moving).is_none() {
            return None; // milestones keep plain positional moves
        }
        let axis = store.axis();
        let row = self.rows.row_from_y(pos.y);
        let neighbours: Vec<(usize, f32, f32)> = store
            .blocks()
            .iter()
            .enumerate()
            .filter(|(_, b)| b.id != moving && b.row == row)
            .map(|(i, b)| {
                let day = axis.relative_day_from_date(b.start_date);
                let left = axis.day_to_pixel(day);
                (i, left, left + axis.day_span_width(day, b.duration))
            })
            .collect();
        let (first, last) = match (neighbours.first(), neighbours.last()) {
            (Some(f), Some(l)) => (f, l),
            _ => return None,
        };
        if pos.x < first.1 {
            return Some(DropZone { index: first.0 });
        }
        if pos.x > last.2 {
            return Some(DropZone { index: last.0 + 1 });
        }
        for pair in neighbours.windows(2) {
            let midpoint = (pair[0].2 + pair[1].1) / 2.0;
            if (pos.x - midpoint).abs() <= GAP_SNAP {
                return Some(DropZone { index: pair[1].0 });
            }
        }
        None
    }

    // --- Editing session ---

    pub fn begin_edit(&mut self, id: ItemId, store: &ItemStore) {
        let buffer = if let Some(b) = store.block(id) {
            b.label.clone()
        } else if let Some(m) = store.milestone(id) {
            m.text.clone()
        } else {
            return;
        };
        self.editing = Some(EditSession {
            id,
            created_empty: buffer.is_empty(),
            buffer,
        });
    }

    /// Commit the edit buffer. A milestone committed with empty text is
    /// transient and removed instead.
    pub fn commit_edit(&mut self, store: &mut ItemStore) {
        let Some(session) = self.editing.take() else {
            return;
        };
        if store.block(session.id).is_some() {
            store.update_item(
                session.id,
                ItemPatch {
                    label: Some(session.buffer),
                    ..Default::default()
                },
            );
        } else if store.milestone(session.id).is_some() {
            if session.buffer.trim().is_empty() {
                store.remove_item(session.id);
                if self.selected == Some(session.id) {
                    self.selected = None;
                }
            } else {
                store.update_item(
                    session.id,
                    ItemPatch {
                        text: Some(session.buffer),
                        ..Default::default()
                    },
                );
            }
        }
    }

    /// Abandon the edit. The prior value stands, except an entity that was
    /// created empty is deleted outright.
    pub fn cancel_edit(&mut self, store: &mut ItemStore) {
        let Some(session) = self.editing.take() else {
            return;
        };
        if session.created_empty {
            store.remove_item(session.id);
            if self.selected == Some(session.id) {
                self.selected = None;
            }
        }
    }

    // --- Keyboard commands ---

    pub fn handle_key(&mut self, cmd: KeyCommand, store: &mut ItemStore) {
        match cmd {
            KeyCommand::SelectNext => self.cycle_selection(store, 1),
            KeyCommand::SelectPrev => self.cycle_selection(store, -1),
            KeyCommand::GrowBlock => self.adjust_duration(store, 1),
            KeyCommand::ShrinkBlock => self.adjust_duration(store, -1),
            KeyCommand::NudgeLeft => self.nudge_days(store, -1),
            KeyCommand::NudgeRight => self.nudge_days(store, 1),
            KeyCommand::NudgeUp => self.nudge_rows(store, -1),
            KeyCommand::NudgeDown => self.nudge_rows(store, 1),
            KeyCommand::Delete => {
                if let Some(id) = self.selected.take() {
                    if self.editing.as_ref().map(|e| e.id) == Some(id) {
                        self.editing = None;
                    }
                    store.remove_item(id);
                }
            }
            KeyCommand::BeginEdit => {
                if let Some(id) = self.selected {
                    self.begin_edit(id, store);
                }
            }
        }
    }

    fn cycle_selection(&mut self, store: &ItemStore, step: isize) {
        let order = store.row_major_ids();
        if order.is_empty() {
            self.selected = None;
            return;
        }
        let len = order.len() as isize;
        let next = match self.selected.and_then(|id| order.iter().position(|x| *x == id)) {
            Some(i) => (i as isize + step).rem_euclid(len) as usize,
            None if step > 0 => 0,
            None => order.len() - 1,
        };
        self.selected = Some(order[next]);
    }

    fn adjust_duration(&mut self, store: &mut ItemStore, delta: i64) {
        let Some(id) = self.selected else { return };
        let Some(block) = store.block(id) else { return };
        let duration = block.duration + delta;
        store.update_item(
            id,
            ItemPatch {
                duration: Some(duration),
                ..Default::default()
            },
        );
    }

    fn nudge_days(&mut self, store: &mut ItemStore, delta: i64) {
        let Some(id) = self.selected else { return };
        let floor = store.start_date();
        let patch = if let Some(b) = store.block(id) {
            ItemPatch {
                start_date: Some((b.start_date + chrono::Duration::days(delta)).max(floor)),
                ..Default::default()
            }
        } else if let Some(m) = store.milestone(id) {
            ItemPatch {
                date: Some((m.date + chrono::Duration::days(delta)).max(floor)),
                ..Default::default()
            }
        } else {
            return;
        };
        store.update_item(id, patch);
    }

    fn nudge_rows(&mut self, store: &mut ItemStore, delta: isize) {
        let Some(id) = self.selected else { return };
        let row = if let Some(b) = store.block(id) {
            b.row
        } else if let Some(m) = store.milestone(id) {
            m.row
        } else {
            return;
        };
        let row = (row as isize + delta).max(0) as usize;
        store.update_item(
            id,
            ItemPatch {
                row: Some(row),
                ..Default::default()
            },
        );
    }
}

/// Snapped (start_day, duration) for a horizontal drag span: left edge to
/// the containing day's left gridline, right edge preferring the right
/// gridline on a tie, width never below one day.
fn create_span(axis: &super::axis::DateAxis, x0: f32, x1: f32) -> (i64, i64) {
    let (lo, hi) = if x0 <= x1 { (x0, x1) } else { (x1, x0) };
    let left = axis.snap_to_grid(lo);
    let right = axis.snap_prefer_right(hi);
    let start_day = axis.pixel_to_day(left);
    let end_day = axis.pixel_to_day(right);
    (start_day, (end_day - start_day).max(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::axis::DateAxis;
    use chrono::NaiveDate;

    fn day(n: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, n).unwrap()
    }

    fn fixture() -> (ItemStore, InteractionController) {
        let store = ItemStore::new(day(1)); // a Monday
        let mut ctrl = InteractionController::new(RowLayout::default());
        ctrl.set_track_bounds(Rect::from_min_max(
            Pos2::new(0.0, 0.0),
            Pos2::new(2000.0, 600.0),
        ));
        (store, ctrl)
    }

    fn down(ctrl: &mut InteractionController, store: &mut ItemStore, pos: Pos2, t: PointerTarget) {
        ctrl.handle_event(InputEvent::PointerDown { pos, target: t }, store);
    }

    fn mv(ctrl: &mut InteractionController, store: &mut ItemStore, pos: Pos2) {
        ctrl.handle_event(InputEvent::PointerMove { pos }, store);
    }

    fn up(ctrl: &mut InteractionController, store: &mut ItemStore, pos: Pos2) {
        ctrl.handle_event(InputEvent::PointerUp { pos }, store);
    }

    #[test]
    fn click_on_empty_track_creates_one_day_block_and_opens_edit() {
        let (mut store, mut ctrl) = fixture();
        let axis = store.axis();
        let pos = Pos2::new(axis.day_to_pixel(3) + 2.0, ctrl.rows.row_top(1) + 10.0);
        down(&mut ctrl, &mut store, pos, PointerTarget::Background);
        up(&mut ctrl, &mut store, pos);

        assert_eq!(store.blocks().len(), 1);
        let b = &store.blocks()[0];
        assert_eq!(b.start_date, day(4));
        assert_eq!(b.duration, 1);
        assert_eq!(b.row, 1);
        assert_eq!(ctrl.selected, Some(b.id));
        assert!(ctrl.editing.as_ref().is_some_and(|e| e.created_empty));
    }

    #[test]
    fn sub_threshold_motion_still_resolves_as_click() {
        let (mut store, mut ctrl) = fixture();
        let pos = Pos2::new(10.0, 20.0);
        down(&mut ctrl, &mut store, pos, PointerTarget::Background);
        mv(&mut ctrl, &mut store, Pos2::new(13.0, 22.0));
        up(&mut ctrl, &mut store, Pos2::new(13.0, 22.0));
        assert_eq!(store.blocks().len(), 1);
        assert_eq!(store.blocks()[0].duration, 1);
    }

    #[test]
    fn drag_create_commits_snapped_span() {
        let (mut store, mut ctrl) = fixture();
        let axis = store.axis();
        // From inside day 1 to just past the middle of day 3.
        let start = Pos2::new(axis.day_to_pixel(1) + 4.0, 20.0);
        let mid3 = (axis.day_to_pixel(3) + axis.day_to_pixel(4)) / 2.0;
        down(&mut ctrl, &mut store, start, PointerTarget::Background);
        mv(&mut ctrl, &mut store, Pos2::new(mid3, 20.0));
        assert!(matches!(
            ctrl.preview(&store),
            Some(GesturePreview::Create {
                start_day: 1,
                duration: 3,
                ..
            })
        ));
        up(&mut ctrl, &mut store, Pos2::new(mid3, 20.0));

        let b = &store.blocks()[0];
        assert_eq!(b.start_date, day(2));
        assert_eq!(b.duration, 3); // right edge tie-broke rightward
    }

    #[test]
    fn reversed_drag_create_uses_min_max_span() {
        let (mut store, mut ctrl) = fixture();
        let axis = store.axis();
        let right = Pos2::new(axis.day_to_pixel(4) + 1.0, 20.0);
        let left = Pos2::new(axis.day_to_pixel(2) + 1.0, 20.0);
        down(&mut ctrl, &mut store, right, PointerTarget::Background);
        mv(&mut ctrl, &mut store, left);
        up(&mut ctrl, &mut store, left);
        let b = &store.blocks()[0];
        assert_eq!(b.start_date, day(3));
        assert!(b.duration >= 1);
    }

    #[test]
    fn drag_create_keeps_the_row_where_the_drag_began() {
        // The create preview shows the press-time row for the whole
        // gesture; the commit matches it even if the pointer drifts into
        // another row.
        let (mut store, mut ctrl) = fixture();
        let axis = store.axis();
        let start = Pos2::new(axis.day_to_pixel(1) + 4.0, ctrl.rows.row_top(0) + 5.0);
        let end = Pos2::new(axis.day_to_pixel(4) + 4.0, ctrl.rows.row_top(2) + 5.0);
        down(&mut ctrl, &mut store, start, PointerTarget::Background);
        mv(&mut ctrl, &mut store, end);
        assert!(matches!(
            ctrl.preview(&store),
            Some(GesturePreview::Create { row: 0, .. })
        ));
        up(&mut ctrl, &mut store, end);
        assert_eq!(store.blocks()[0].row, 0);
    }

    #[test]
    fn drag_move_repositions_block_to_snapped_day_and_row() {
        let (mut store, mut ctrl) = fixture();
        let id = store.add_block_at_day(2, 2, "move me", 0);
        let axis = store.axis();
        let grab = Pos2::new(axis.day_to_pixel(2) + 3.0, ctrl.rows.row_top(0) + 5.0);
        down(&mut ctrl, &mut store, grab, PointerTarget::Block(id));
        let dest = Pos2::new(axis.day_to_pixel(7) + 3.0, ctrl.rows.row_top(2) + 5.0);
        mv(&mut ctrl, &mut store, dest);
        up(&mut ctrl, &mut store, dest);

        let b = store.block(id).unwrap();
        assert_eq!(b.start_date, day(8));
        assert_eq!(b.row, 2);
    }

    #[test]
    fn drop_outside_track_deletes_the_item() {
        // Scenario: pointer-up outside the track bounding box removes the
        // block from the placed set.
        let (mut store, mut ctrl) = fixture();
        let id = store.add_block_at_day(2, 2, "doomed", 0);
        let axis = store.axis();
        let grab = Pos2::new(axis.day_to_pixel(2) + 3.0, 20.0);
        down(&mut ctrl, &mut store, grab, PointerTarget::Block(id));
        let outside = Pos2::new(-50.0, -50.0);
        mv(&mut ctrl, &mut store, outside);
        assert!(matches!(
            ctrl.preview(&store),
            Some(GesturePreview::Move { outside: true, .. })
        ));
        up(&mut ctrl, &mut store, outside);

        assert!(store.blocks().is_empty());
        assert_eq!(store.off_timeline_blocks().len(), 1);
        assert_eq!(ctrl.selected, None);
    }

    #[test]
    fn resize_gesture_pushes_later_blocks_on_commit() {
        let (mut store, mut ctrl) = fixture();
        let design = store.add_block_at_day(0, 5, "Design", 0);
        let build = store.add_block_at_day(5, 3, "Build", 0);
        let axis = store.axis();

        let edge = axis.day_to_pixel(5);
        down(
            &mut ctrl,
            &mut store,
            Pos2::new(edge, 20.0),
            PointerTarget::ResizeHandle(design),
        );
        // Drag right by exactly three more columns (days 5..8).
        let dx = axis.day_span_width(5, 3);
        mv(&mut ctrl, &mut store, Pos2::new(edge + dx, 20.0));
        match ctrl.preview(&store) {
            Some(GesturePreview::Resize {
                shift_px, affected, ..
            }) => {
                assert!((shift_px - dx).abs() < 0.01);
                assert_eq!(affected, vec![build]);
            }
            other => panic!("expected resize preview, got {:?}", other),
        }
        up(&mut ctrl, &mut store, Pos2::new(edge + dx, 20.0));

        assert_eq!(store.block(design).unwrap().duration, 8);
        assert_eq!(store.block(build).unwrap().start_date, day(9));
        assert_eq!(store.block(build).unwrap().duration, 3);
    }

    #[test]
    fn resize_absorbs_deltas_below_one_day_floor() {
        let (mut store, mut ctrl) = fixture();
        let id = store.add_block_at_day(0, 4, "a", 0);
        let axis = store.axis();
        let edge = axis.day_to_pixel(4);
        down(
            &mut ctrl,
            &mut store,
            Pos2::new(edge, 20.0),
            PointerTarget::ResizeHandle(id),
        );
        mv(&mut ctrl, &mut store, Pos2::new(edge - 5000.0, 20.0));
        up(&mut ctrl, &mut store, Pos2::new(edge - 5000.0, 20.0));
        assert_eq!(store.block(id).unwrap().duration, 1);
    }

    #[test]
    fn resize_target_deleted_mid_gesture_aborts_silently() {
        let (mut store, mut ctrl) = fixture();
        let a = store.add_block_at_day(0, 5, "a", 0);
        let b = store.add_block_at_day(5, 3, "b", 0);
        let axis = store.axis();
        let edge = axis.day_to_pixel(5);
        down(
            &mut ctrl,
            &mut store,
            Pos2::new(edge, 20.0),
            PointerTarget::ResizeHandle(a),
        );
        mv(&mut ctrl, &mut store, Pos2::new(edge + 50.0, 20.0));
        ctrl.selected = Some(a);
        ctrl.handle_key(KeyCommand::Delete, &mut store);
        up(&mut ctrl, &mut store, Pos2::new(edge + 50.0, 20.0));

        assert!(store.block(a).is_none());
        assert_eq!(store.block(b).unwrap().start_date, day(6));
    }

    #[test]
    fn repeated_pointer_up_is_idempotent() {
        let (mut store, mut ctrl) = fixture();
        let pos = Pos2::new(10.0, 20.0);
        down(&mut ctrl, &mut store, pos, PointerTarget::Background);
        up(&mut ctrl, &mut store, pos);
        assert_eq!(store.blocks().len(), 1);
        up(&mut ctrl, &mut store, pos);
        assert_eq!(store.blocks().len(), 1);
    }

    #[test]
    fn affordance_click_creates_empty_milestone_and_edits() {
        let (mut store, mut ctrl) = fixture();
        let at = GridIntersection { day: 3, row: 0 };
        let pos = Pos2::new(100.0, 50.0);
        down(&mut ctrl, &mut store, pos, PointerTarget::Affordance(at));
        up(&mut ctrl, &mut store, pos);
        assert_eq!(store.milestones().len(), 1);
        assert_eq!(store.milestones()[0].date, day(4));
        assert!(ctrl.editing.is_some());

        // Commit a non-empty text, then clicking the same intersection's
        // affordance again must be suppressed.
        if let Some(e) = ctrl.editing.as_mut() {
            e.buffer = "kept".into();
        }
        ctrl.commit_edit(&mut store);
        down(&mut ctrl, &mut store, pos, PointerTarget::Affordance(at));
        up(&mut ctrl, &mut store, pos);
        assert_eq!(store.milestones().len(), 1);
        assert_eq!(store.milestones()[0].text, "kept");
    }

    #[test]
    fn ending_edit_with_empty_text_removes_milestone() {
        // Scenario: an empty milestone is transient.
        let (mut store, mut ctrl) = fixture();
        let id = store.add_milestone_at_day(3, 0, "").unwrap();
        ctrl.begin_edit(id, &store);
        ctrl.commit_edit(&mut store);
        assert!(store.milestones().is_empty());
    }

    #[test]
    fn escape_deletes_entity_created_empty_but_keeps_prior_text() {
        let (mut store, mut ctrl) = fixture();
        let id = store.add_milestone_at_day(3, 0, "existing").unwrap();
        ctrl.begin_edit(id, &store);
        if let Some(e) = ctrl.editing.as_mut() {
            e.buffer = "scratch".into();
        }
        ctrl.cancel_edit(&mut store);
        assert_eq!(store.milestone(id).unwrap().text, "existing");

        let empty = store.add_milestone_at_day(5, 0, "").unwrap();
        ctrl.begin_edit(empty, &store);
        ctrl.cancel_edit(&mut store);
        assert!(store.milestone(empty).is_none());
    }

    #[test]
    fn keyboard_nudges_clamp_at_day_and_row_zero() {
        let (mut store, mut ctrl) = fixture();
        let id = store.add_block_at_day(0, 1, "a", 0);
        ctrl.selected = Some(id);
        ctrl.handle_key(KeyCommand::NudgeLeft, &mut store);
        ctrl.handle_key(KeyCommand::NudgeUp, &mut store);
        let b = store.block(id).unwrap();
        assert_eq!(b.start_date, day(1));
        assert_eq!(b.row, 0);

        ctrl.handle_key(KeyCommand::NudgeRight, &mut store);
        ctrl.handle_key(KeyCommand::NudgeDown, &mut store);
        let b = store.block(id).unwrap();
        assert_eq!(b.start_date, day(2));
        assert_eq!(b.row, 1);
    }

    #[test]
    fn keyboard_duration_changes_respect_floor() {
        let (mut store, mut ctrl) = fixture();
        let id = store.add_block_at_day(0, 1, "a", 0);
        ctrl.selected = Some(id);
        ctrl.handle_key(KeyCommand::ShrinkBlock, &mut store);
        assert_eq!(store.block(id).unwrap().duration, 1);
        ctrl.handle_key(KeyCommand::GrowBlock, &mut store);
        assert_eq!(store.block(id).unwrap().duration, 2);
    }

    #[test]
    fn selection_traversal_is_row_major_and_wraps() {
        let (mut store, mut ctrl) = fixture();
        let b0 = store.add_block_at_day(5, 1, "row0 late", 0);
        let b1 = store.add_block_at_day(1, 1, "row0 early", 0);
        let b2 = store.add_block_at_day(0, 1, "row1", 1);

        ctrl.handle_key(KeyCommand::SelectNext, &mut store);
        assert_eq!(ctrl.selected, Some(b1));
        ctrl.handle_key(KeyCommand::SelectNext, &mut store);
        assert_eq!(ctrl.selected, Some(b0));
        ctrl.handle_key(KeyCommand::SelectNext, &mut store);
        assert_eq!(ctrl.selected, Some(b2));
        ctrl.handle_key(KeyCommand::SelectNext, &mut store);
        assert_eq!(ctrl.selected, Some(b1)); // wrapped
        ctrl.handle_key(KeyCommand::SelectPrev, &mut store);
        assert_eq!(ctrl.selected, Some(b2)); // wrapped back
    }

    #[test]
    fn drop_zone_is_found_near_gap_midpoint() {
        let (mut store, mut ctrl) = fixture();
        let moving = store.add_block_at_day(20, 1, "moving", 0);
        store.add_block_at_day(0, 2, "a", 0);
        store.add_block_at_day(6, 2, "b", 0);
        let axis = store.axis();

        let grab = Pos2::new(axis.day_to_pixel(20) + 2.0, 20.0);
        down(&mut ctrl, &mut store, grab, PointerTarget::Block(moving));
        // Midpoint between a's right edge (day 2) and b's left edge (day 6).
        let gap_mid = (axis.day_to_pixel(2) + axis.day_to_pixel(6)) / 2.0;
        mv(&mut ctrl, &mut store, Pos2::new(gap_mid, 20.0));
        match ctrl.preview(&store) {
            Some(GesturePreview::Move { drop, .. }) => {
                assert!(drop.is_some());
            }
            other => panic!("expected move preview, got {:?}", other),
        }
    }

    #[test]
    fn span_helper_tie_breaks_right_and_floors_width() {
        let axis = DateAxis::new(day(1), 1.0);
        // Degenerate drag within one column still yields one day.
        let x = axis.day_to_pixel(2) + 1.0;
        assert_eq!(create_span(&axis, x, x + 1.0), (2, 1));
    }
}

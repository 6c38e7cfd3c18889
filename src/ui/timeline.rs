use crate::model::{
    Block, DateAxis, GesturePreview, GridIndex, GridIntersection, InputEvent,
    InteractionController, ItemStore, Milestone, PointerTarget, RowLayout,
};
use crate::ui::theme;
use chrono::Datelike;
use egui::{Color32, Pos2, Rect, Rounding, Sense, Stroke, Ui, Vec2};

const HEADER_HEIGHT: f32 = theme::HEADER_HEIGHT;
const HANDLE_WIDTH: f32 = theme::HANDLE_WIDTH;

/// Render the timeline track and feed pointer input to the controller.
///
/// All geometry below is in track-local coordinates (origin at the left
/// edge of day 0, just under the header); `origin` converts to screen
/// space for painting.
pub fn show_timeline(
    store: &mut ItemStore,
    ctrl: &mut InteractionController,
    restore_scroll: Option<f32>,
    ui: &mut Ui,
) {
    let available = ui.available_size();

    // Ctrl+scroll zooms around the persisted zoom factor.
    let scroll_delta = ui.input(|i| i.smooth_scroll_delta);
    if ui.rect_contains_pointer(ui.max_rect()) && ui.input(|i| i.modifiers.ctrl) {
        if scroll_delta.y > 0.0 {
            store.set_zoom(store.zoom() * 1.2);
        } else if scroll_delta.y < 0.0 {
            store.set_zoom(store.zoom() / 1.2);
        }
    }

    let axis = store.axis();
    let rows = ctrl.rows;

    // Extents: keep a generous runway past the last item.
    let last_day = store
        .blocks()
        .iter()
        .map(|b| axis.relative_day_from_date(b.start_date) + b.duration)
        .chain(
            store
                .milestones()
                .iter()
                .map(|m| axis.relative_day_from_date(m.date)),
        )
        .max()
        .unwrap_or(0);
    let horizon = (last_day + 30).max(90);
    let row_count = store
        .blocks()
        .iter()
        .map(|b| b.row)
        .chain(store.milestones().iter().map(|m| m.row))
        .max()
        .map_or(6, |r| (r + 3).max(6));
    let track_size = Vec2::new(
        axis.day_to_pixel(horizon).max(available.x),
        rows.row_top(row_count).max(available.y - HEADER_HEIGHT),
    );

    let mut scroll_area = egui::ScrollArea::both().auto_shrink([false, false]);
    if let Some(offset) = restore_scroll {
        scroll_area = scroll_area.scroll_offset(Vec2::new(offset, 0.0));
    }
    let output = scroll_area.show(ui, |ui| {
        let (response, painter) = ui.allocate_painter(
            track_size + Vec2::new(0.0, HEADER_HEIGHT),
            Sense::click_and_drag(),
        );
        // Track-local origin: under the header.
        let origin = response.rect.min + Vec2::new(0.0, HEADER_HEIGHT);
        let track = Rect::from_min_size(Pos2::ZERO, track_size);
        ctrl.set_track_bounds(track);

        painter.rect_filled(response.rect, 0.0, theme::BG_DARK);

        // The hover affordance for annotation creation, resolved before the
        // hit test so clicks inside its radius target it.
        let pointer_local = ui
            .ctx()
            .pointer_latest_pos()
            .map(|p| Pos2::new(p.x - origin.x, p.y - origin.y));
        let grid = GridIndex::new(&axis, &rows);
        let affordance = pointer_local.and_then(|p| {
            if !ctrl.is_idle() || ctrl.editing.is_some() || !track.contains(p) {
                return None;
            }
            let at = grid.intersection_at(p.x, p.y);
            let date = axis.date_from_relative_day(at.day);
            if store.annotation_at(date, at.row).is_none() {
                Some(at)
            } else {
                None
            }
        });

        // Translate raw pointer state into state-machine events. While a
        // text edit is open the TextEdit widget owns the pointer.
        if ctrl.editing.is_none() {
            let (pressed, down, released) = ui.input(|i| {
                (
                    i.pointer.primary_pressed(),
                    i.pointer.primary_down(),
                    i.pointer.primary_released(),
                )
            });
            if let Some(p) = pointer_local {
                if pressed && response.rect.contains(origin + p.to_vec2()) && p.y >= 0.0 {
                    let target = hit_test(store, &axis, &rows, &grid, affordance, p);
                    ctrl.handle_event(InputEvent::PointerDown { pos: p, target }, store);
                } else if down && !pressed {
                    ctrl.handle_event(InputEvent::PointerMove { pos: p }, store);
                }
                if released {
                    ctrl.handle_event(InputEvent::PointerUp { pos: p }, store);
                }
            }
        }

        let preview = ctrl.preview(store);

        draw_rows(&painter, origin, &rows, row_count, track_size.x);
        draw_header(&painter, response.rect.min, &axis, horizon, track_size);
        draw_today_line(&painter, origin, &axis, track_size.y);

        // Block bars, with the current gesture's visual echo applied.
        for block in store.blocks() {
            let mut rect = block_rect(&axis, &rows, block);
            let mut tint = None;
            match &preview {
                Some(GesturePreview::Move {
                    id,
                    day,
                    row,
                    outside,
                    ..
                }) if *id == block.id => {
                    let x = axis.day_to_pixel(*day);
                    rect = Rect::from_min_size(
                        Pos2::new(x, rows.row_top(*row) + theme::BAR_INSET),
                        rect.size(),
                    );
                    tint = outside.then_some(theme::DELETE_TINT);
                }
                Some(GesturePreview::Resize {
                    id,
                    width_px,
                    shift_px,
                    affected,
                }) => {
                    if *id == block.id {
                        rect.set_width(*width_px);
                    } else if affected.contains(&block.id) {
                        rect = rect.translate(Vec2::new(*shift_px, 0.0));
                    }
                }
                _ => {}
            }
            let selected = ctrl.selected == Some(block.id);
            let hovered = pointer_local.is_some_and(|p| rect.contains(p));
            draw_block(&painter, origin, block, rect, selected, hovered, tint);
            if hovered && matches!(hit_region(&rect, pointer_local.unwrap_or(Pos2::ZERO)), BarRegion::Handle) {
                ui.ctx().set_cursor_icon(egui::CursorIcon::ResizeHorizontal);
            }
        }

        // Milestone diamonds on the annotation gridlines.
        for m in store.milestones() {
            let mut center = milestone_center(&axis, &rows, m);
            if let Some(GesturePreview::Move { id, day, row, .. }) = &preview {
                if *id == m.id {
                    center = Pos2::new(axis.day_to_pixel(*day), rows.annotation_center_y(*row));
                }
            }
            draw_milestone(&painter, origin, m, center, ctrl.selected == Some(m.id));
        }

        // Gesture overlays.
        match &preview {
            Some(GesturePreview::Create {
                row,
                start_day,
                duration,
            }) => {
                let x = axis.day_to_pixel(*start_day);
                let w = axis.day_span_width(*start_day, *duration);
                let rect = Rect::from_min_size(
                    origin + Vec2::new(x, rows.row_top(*row) + theme::BAR_INSET),
                    Vec2::new(w, rows.row_height - theme::BAR_INSET * 2.0),
                );
                painter.rect_filled(rect, Rounding::same(theme::BAR_ROUNDING), theme::PREVIEW_FILL);
                painter.rect_stroke(
                    rect,
                    Rounding::same(theme::BAR_ROUNDING),
                    Stroke::new(1.0, theme::BORDER_ACCENT),
                );
            }
            Some(GesturePreview::Move { drop: Some(zone), .. }) => {
                if let Some(caret_x) = splice_caret_x(store, &axis, zone.index) {
                    let target_row = store
                        .blocks()
                        .get(zone.index.min(store.blocks().len().saturating_sub(1)))
                        .map_or(0, |b| b.row);
                    let top = origin + Vec2::new(caret_x, rows.row_top(target_row));
                    painter.line_segment(
                        [top, top + Vec2::new(0.0, rows.row_height)],
                        Stroke::new(2.0, theme::DROP_CARET),
                    );
                }
                ui.ctx().set_cursor_icon(egui::CursorIcon::Grab);
            }
            Some(GesturePreview::Move { .. }) => {
                ui.ctx().set_cursor_icon(egui::CursorIcon::Grab);
            }
            _ => {}
        }

        // Hover affordance for annotation creation.
        if let Some(at) = affordance {
            let (cx, cy) = grid.intersection_center(at);
            let center = origin + Vec2::new(cx, cy);
            painter.circle_filled(center, 7.0, theme::AFFORDANCE);
            painter.text(
                center,
                egui::Align2::CENTER_CENTER,
                "+",
                theme::font_bar(),
                Color32::WHITE,
            );
        }

        // Inline label/text editor for the active session.
        show_editor(store, ctrl, origin, &axis, &rows, ui);
    });

    store.set_scroll_position(output.state.offset.x);
}

enum BarRegion {
    Handle,
    Badge,
    Body,
}

fn hit_region(rect: &Rect, p: Pos2) -> BarRegion {
    let handle = Rect::from_min_max(
        Pos2::new(rect.right() - HANDLE_WIDTH * 0.5, rect.top()),
        Pos2::new(rect.right() + HANDLE_WIDTH * 0.5, rect.bottom()),
    )
    .expand(4.0);
    if handle.contains(p) {
        return BarRegion::Handle;
    }
    let badge_center = Pos2::new(rect.left() + 4.0 + theme::BADGE_RADIUS, rect.center().y);
    if badge_center.distance(p) <= theme::BADGE_RADIUS + 2.0 {
        return BarRegion::Badge;
    }
    BarRegion::Body
}

/// Resolve what a press at `p` (track-local) lands on.
fn hit_test(
    store: &ItemStore,
    axis: &DateAxis,
    rows: &RowLayout,
    grid: &GridIndex<'_>,
    affordance: Option<GridIntersection>,
    p: Pos2,
) -> PointerTarget {
    if let Some(at) = affordance {
        if grid.within_affordance(at, p.x, p.y) {
            return PointerTarget::Affordance(at);
        }
    }
    for m in store.milestones() {
        let center = milestone_center(axis, rows, m);
        if Rect::from_center_size(center, Vec2::splat(16.0)).contains(p) {
            return PointerTarget::Milestone(m.id);
        }
    }
    for b in store.blocks() {
        let rect = block_rect(axis, rows, b);
        if rect.expand(4.0).contains(p) {
            return match hit_region(&rect, p) {
                BarRegion::Handle => PointerTarget::ResizeHandle(b.id),
                BarRegion::Badge => PointerTarget::BadgeControl(b.id),
                BarRegion::Body => PointerTarget::Block(b.id),
            };
        }
    }
    PointerTarget::Background
}

fn block_rect(axis: &DateAxis, rows: &RowLayout, b: &Block) -> Rect {
    let day = axis.relative_day_from_date(b.start_date);
    Rect::from_min_size(
        Pos2::new(axis.day_to_pixel(day), rows.row_top(b.row) + theme::BAR_INSET),
        Vec2::new(
            axis.day_span_width(day, b.duration),
            rows.row_height - theme::BAR_INSET * 2.0,
        ),
    )
}

fn milestone_center(axis: &DateAxis, rows: &RowLayout, m: &Milestone) -> Pos2 {
    Pos2::new(
        axis.day_to_pixel(axis.relative_day_from_date(m.date)),
        rows.annotation_center_y(m.row),
    )
}

fn draw_header(
    painter: &egui::Painter,
    origin: Pos2,
    axis: &DateAxis,
    horizon: i64,
    track_size: Vec2,
) {
    painter.rect_filled(
        Rect::from_min_size(origin, Vec2::new(track_size.x, HEADER_HEIGHT)),
        0.0,
        theme::BG_HEADER,
    );
    painter.line_segment(
        [
            Pos2::new(origin.x, origin.y + HEADER_HEIGHT),
            Pos2::new(origin.x + track_size.x, origin.y + HEADER_HEIGHT),
        ],
        Stroke::new(1.0, theme::BORDER_SUBTLE),
    );

    for day in 0..horizon {
        let x = origin.x + axis.day_to_pixel(day);
        let date = axis.date_from_relative_day(day);
        let is_weekend = date.weekday().num_days_from_monday() >= 5;

        if is_weekend {
            painter.rect_filled(
                Rect::from_min_size(
                    Pos2::new(x, origin.y + HEADER_HEIGHT),
                    Vec2::new(axis.day_width(day), track_size.y),
                ),
                0.0,
                theme::BG_WEEKEND,
            );
        }
        painter.line_segment(
            [
                Pos2::new(x, origin.y + HEADER_HEIGHT),
                Pos2::new(x, origin.y + HEADER_HEIGHT + track_size.y),
            ],
            Stroke::new(0.5, theme::GRID_LINE),
        );

        if axis.day_width(day) >= 18.0 {
            let day_color = if is_weekend {
                theme::TEXT_DIM
            } else {
                theme::TEXT_SECONDARY
            };
            painter.text(
                Pos2::new(x + 3.0, origin.y + 28.0),
                egui::Align2::LEFT_CENTER,
                date.format("%d").to_string(),
                theme::font_sub(),
                day_color,
            );
        }
        if date.day() == 1 || day == 0 {
            painter.text(
                Pos2::new(x + 3.0, origin.y + 12.0),
                egui::Align2::LEFT_CENTER,
                date.format("%b %Y").to_string(),
                theme::font_header(),
                theme::TEXT_PRIMARY,
            );
        }
    }
}

fn draw_rows(
    painter: &egui::Painter,
    origin: Pos2,
    rows: &RowLayout,
    row_count: usize,
    width: f32,
) {
    for row in 0..row_count {
        let top = origin.y + rows.row_top(row);
        if row % 2 == 0 {
            painter.rect_filled(
                Rect::from_min_size(
                    Pos2::new(origin.x, top),
                    Vec2::new(width, rows.row_height),
                ),
                0.0,
                theme::BG_ROW_EVEN,
            );
        }
        // Annotation gridline under the lane.
        let line_y = origin.y + rows.annotation_center_y(row);
        painter.line_segment(
            [Pos2::new(origin.x, line_y), Pos2::new(origin.x + width, line_y)],
            Stroke::new(0.5, theme::BORDER_SUBTLE),
        );
    }
}

fn draw_today_line(painter: &egui::Painter, origin: Pos2, axis: &DateAxis, height: f32) {
    let today = chrono::Local::now().date_naive();
    if today < axis.start_date {
        return;
    }
    let x = origin.x + axis.date_to_pixel(today);
    painter.line_segment(
        [Pos2::new(x, origin.y), Pos2::new(x, origin.y + height)],
        Stroke::new(1.5, theme::TODAY_LINE),
    );
}

fn draw_block(
    painter: &egui::Painter,
    origin: Pos2,
    block: &Block,
    rect: Rect,
    is_selected: bool,
    is_hovered: bool,
    tint: Option<Color32>,
) {
    let rect = rect.translate(origin.to_vec2());
    let rounding = Rounding::same(theme::BAR_ROUNDING);

    // Soft shadow under the bar.
    painter.rect_filled(
        rect.translate(Vec2::new(1.0, 2.0)),
        rounding,
        Color32::from_black_alpha(35),
    );
    painter.rect_filled(rect, rounding, theme::badge_color(block.badge));
    let highlight = Rect::from_min_size(
        rect.min,
        Vec2::new(rect.width(), (rect.height() * 0.45).max(4.0)),
    );
    painter.rect_filled(
        highlight,
        Rounding {
            nw: theme::BAR_ROUNDING,
            ne: theme::BAR_ROUNDING,
            sw: 0.0,
            se: 0.0,
        },
        Color32::from_white_alpha(25),
    );
    if let Some(tint) = tint {
        painter.rect_filled(rect, rounding, tint);
    }

    if is_selected {
        painter.rect_stroke(
            rect.expand(1.5),
            Rounding::same(theme::BAR_ROUNDING + 1.5),
            Stroke::new(2.0, theme::BORDER_ACCENT),
        );
    }

    // Badge control at the bar's left end.
    let badge_center = Pos2::new(rect.left() + 4.0 + theme::BADGE_RADIUS, rect.center().y);
    painter.circle_filled(badge_center, theme::BADGE_RADIUS, Color32::from_black_alpha(70));
    painter.text(
        badge_center,
        egui::Align2::CENTER_CENTER,
        block.badge.letter(),
        theme::font_small(),
        theme::TEXT_ON_BAR,
    );

    // Label, clipped to the bar.
    if rect.width() > 40.0 && !block.label.is_empty() {
        let galley = painter.layout_no_wrap(
            block.label.clone(),
            theme::font_bar(),
            theme::TEXT_ON_BAR,
        );
        let clipped = painter.with_clip_rect(rect);
        let text_y = rect.top() + (rect.height() - galley.size().y) / 2.0;
        clipped.galley(
            Pos2::new(rect.left() + theme::BADGE_RADIUS * 2.0 + 10.0, text_y),
            galley,
            Color32::TRANSPARENT,
        );
    }

    // Trailing resize handle pill.
    if is_selected || is_hovered {
        let handle_h = rect.height() * 0.55;
        let handle = Rect::from_min_size(
            Pos2::new(rect.right() - 2.5, rect.center().y - handle_h / 2.0),
            Vec2::new(4.0, handle_h),
        );
        painter.rect_filled(handle, Rounding::same(2.0), theme::HANDLE_COLOR);
    }
}

fn draw_milestone(
    painter: &egui::Painter,
    origin: Pos2,
    m: &Milestone,
    center: Pos2,
    is_selected: bool,
) {
    let center = center + origin.to_vec2();
    let size = 6.0;
    let points = vec![
        Pos2::new(center.x, center.y - size),
        Pos2::new(center.x + size, center.y),
        Pos2::new(center.x, center.y + size),
        Pos2::new(center.x - size, center.y),
    ];
    painter.add(egui::Shape::convex_polygon(
        points.clone(),
        theme::MILESTONE_FILL,
        Stroke::NONE,
    ));
    if is_selected {
        painter.add(egui::Shape::convex_polygon(
            points,
            Color32::TRANSPARENT,
            Stroke::new(2.0, theme::BORDER_ACCENT),
        ));
    }
    if !m.text.is_empty() {
        painter.text(
            Pos2::new(center.x + size + 6.0, center.y),
            egui::Align2::LEFT_CENTER,
            &m.text,
            theme::font_small(),
            theme::TEXT_SECONDARY,
        );
    }
}

fn splice_caret_x(store: &ItemStore, axis: &DateAxis, index: usize) -> Option<f32> {
    if let Some(b) = store.blocks().get(index) {
        let day = axis.relative_day_from_date(b.start_date);
        return Some(axis.day_to_pixel(day));
    }
    store.blocks().last().map(|b| {
        let day = axis.relative_day_from_date(b.start_date);
        axis.day_to_pixel(day) + axis.day_span_width(day, b.duration)
    })
}

/// Host the inline TextEdit for the controller's editing session.
fn show_editor(
    store: &mut ItemStore,
    ctrl: &mut InteractionController,
    origin: Pos2,
    axis: &DateAxis,
    rows: &RowLayout,
    ui: &mut Ui,
) {
    let Some(editing_id) = ctrl.editing.as_ref().map(|s| s.id) else {
        return;
    };
    let rect = if let Some(b) = store.block(editing_id) {
        block_rect(axis, rows, b).translate(origin.to_vec2()).shrink(2.0)
    } else if let Some(m) = store.milestone(editing_id) {
        let center = milestone_center(axis, rows, m) + origin.to_vec2();
        Rect::from_min_size(
            Pos2::new(center.x + 10.0, center.y - 10.0),
            Vec2::new(140.0, 20.0),
        )
    } else {
        // Target vanished mid-edit (e.g. deleted via keyboard).
        ctrl.editing = None;
        return;
    };

    let mut finished: Option<bool> = None; // Some(true) = commit
    if let Some(session) = ctrl.editing.as_mut() {
        let response = ui.put(
            rect,
            egui::TextEdit::singleline(&mut session.buffer)
                .font(theme::font_bar())
                .hint_text("label..."),
        );
        if !response.has_focus() && !response.lost_focus() {
            response.request_focus();
        }
        if ui.input(|i| i.key_pressed(egui::Key::Escape)) {
            finished = Some(false);
        } else if response.lost_focus() {
            finished = Some(true);
        }
    }
    match finished {
        Some(true) => ctrl.commit_edit(store),
        Some(false) => ctrl.cancel_edit(store),
        None => {}
    }
}

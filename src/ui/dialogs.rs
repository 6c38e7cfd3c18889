use crate::app::PlannerApp;
use crate::ui::theme;
use egui::{Color32, Context, RichText, Window};

/// Render the "Timeline Settings" dialog.
pub fn show_settings_dialog(app: &mut PlannerApp, ctx: &Context) {
    let mut should_close = false;
    Window::new(RichText::new("Timeline Settings").strong().size(14.0))
        .resizable(false)
        .collapsible(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .fixed_size([300.0, 0.0])
        .show(ctx, |ui| {
            ui.add_space(4.0);

            egui::Grid::new("settings_grid")
                .num_columns(2)
                .striped(false)
                .spacing([12.0, 8.0])
                .show(ui, |ui| {
                    ui.label(RichText::new("Start date").color(theme::TEXT_SECONDARY));
                    ui.add(
                        egui_extras::DatePickerButton::new(&mut app.settings_start_date)
                            .id_salt("settings_dp_start"),
                    );
                    ui.end_row();

                    ui.label(RichText::new("Zoom").color(theme::TEXT_SECONDARY));
                    let mut zoom = app.store.zoom();
                    if ui
                        .add(egui::Slider::new(&mut zoom, 0.25..=4.0).fixed_decimals(2))
                        .changed()
                    {
                        app.store.set_zoom(zoom);
                    }
                    ui.end_row();
                });

            ui.add_space(4.0);
            ui.label(
                RichText::new("The start date is clamped so no item falls before it.")
                    .small()
                    .color(theme::TEXT_DIM),
            );

            ui.add_space(6.0);
            ui.separator();
            ui.add_space(4.0);

            ui.horizontal(|ui| {
                let apply_btn = egui::Button::new(RichText::new("Apply").color(Color32::WHITE))
                    .fill(theme::ACCENT)
                    .rounding(egui::Rounding::same(4.0));
                if ui.add_sized([80.0, 28.0], apply_btn).clicked() {
                    app.store.set_start_date(app.settings_start_date);
                    // Reflect any clamping back into the picker.
                    app.settings_start_date = app.store.start_date();
                    should_close = true;
                }
                if ui
                    .add_sized([80.0, 28.0], egui::Button::new("Cancel"))
                    .clicked()
                {
                    should_close = true;
                }
            });
            ui.add_space(2.0);
        });

    if should_close || ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
        app.show_settings = false;
    }
}

/// Render the "About" dialog.
pub fn show_about_dialog(app: &mut PlannerApp, ctx: &Context) {
    let mut should_close = false;
    Window::new("About")
        .resizable(false)
        .collapsible(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .fixed_size([280.0, 160.0])
        .show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(12.0);
                ui.heading(RichText::new("Blockline").strong());
                ui.add_space(2.0);
                ui.label(
                    RichText::new(format!("Version {}", env!("CARGO_PKG_VERSION")))
                        .color(theme::TEXT_SECONDARY),
                );
                ui.add_space(10.0);
                ui.label("A timeline planner");
                ui.label("built with Rust and egui.");
                ui.add_space(14.0);
                if ui
                    .add_sized([100.0, 28.0], egui::Button::new("Close"))
                    .clicked()
                {
                    should_close = true;
                }
            });
        });
    if should_close || ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
        app.show_about = false;
    }
}

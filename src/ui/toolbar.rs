use crate::app::PlannerApp;
use crate::ui::theme;
use egui::{menu, RichText, Ui};

/// Render the top toolbar / menu bar.
pub fn show_toolbar(app: &mut PlannerApp, ui: &mut Ui) {
    menu::bar(ui, |ui| {
        ui.menu_button(RichText::new("  File  ").font(theme::font_menu()), |ui| {
            if ui.button("  New Timeline").clicked() {
                app.new_document();
                ui.close_menu();
            }
            if ui.button("  Open...").clicked() {
                app.open_document();
                ui.close_menu();
            }
            ui.separator();
            if ui.button("  Save          Ctrl+S").clicked() {
                app.save_document();
                ui.close_menu();
            }
            if ui.button("  Save As...").clicked() {
                app.save_document_as();
                ui.close_menu();
            }
        });

        ui.menu_button(RichText::new("  View  ").font(theme::font_menu()), |ui| {
            if ui.button("  Zoom In        Ctrl+Scroll ↑").clicked() {
                let zoom = app.store.zoom();
                app.store.set_zoom(zoom * 1.2);
                ui.close_menu();
            }
            if ui.button("  Zoom Out      Ctrl+Scroll ↓").clicked() {
                let zoom = app.store.zoom();
                app.store.set_zoom(zoom / 1.2);
                ui.close_menu();
            }
            if ui.button("  Reset Zoom").clicked() {
                app.store.set_zoom(1.0);
                ui.close_menu();
            }
            ui.separator();
            if ui.button("  Timeline Settings...").clicked() {
                app.settings_start_date = app.store.start_date();
                app.show_settings = true;
                ui.close_menu();
            }
        });

        ui.menu_button(RichText::new("  Help  ").font(theme::font_menu()), |ui| {
            if ui.button("  Open Data Folder").clicked() {
                if let Some(dir) = crate::io::file::data_dir() {
                    let _ = open::that(&dir);
                }
                ui.close_menu();
            }
            ui.separator();
            if ui.button("  About").clicked() {
                app.show_about = true;
                ui.close_menu();
            }
        });

        // Right-aligned document name
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            let name = app
                .file_path
                .as_ref()
                .and_then(|p| p.file_name())
                .and_then(|n| n.to_str())
                .unwrap_or("Untitled (session)");
            ui.label(RichText::new(name).size(11.0).weak());
        });
    });
}

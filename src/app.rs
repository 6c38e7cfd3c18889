use chrono::NaiveDate;
use std::path::PathBuf;

use crate::io::{self, Document};
use crate::model::{InteractionController, ItemStore, KeyCommand, RowLayout};
use crate::ui;

/// Main application state.
pub struct PlannerApp {
    pub store: ItemStore,
    pub ctrl: InteractionController,
    pub file_path: Option<PathBuf>,

    // Dialog state
    pub show_about: bool,
    pub show_settings: bool,
    pub settings_start_date: NaiveDate,

    // Status message
    pub status_message: String,

    /// Scroll offset to restore on the next frame, set after loading.
    restore_scroll: Option<f32>,
    /// Store revision at the last session autosave.
    autosaved_revision: u64,
}

impl PlannerApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        // Register Phosphor icon font as a fallback so icons render inline with text
        let mut fonts = egui::FontDefinitions::default();
        egui_phosphor::add_to_fonts(&mut fonts, egui_phosphor::Variant::Regular);
        cc.egui_ctx.set_fonts(fonts);

        let store = Self::restore_session().unwrap_or_else(Self::sample_store);
        let scroll = store.scroll_position();
        let revision = store.revision();
        Self {
            settings_start_date: store.start_date(),
            store,
            ctrl: InteractionController::new(RowLayout::default()),
            file_path: None,
            show_about: false,
            show_settings: false,
            status_message: "Ready".to_string(),
            restore_scroll: Some(scroll),
            autosaved_revision: revision,
        }
    }

    fn restore_session() -> Option<ItemStore> {
        let path = io::file::session_path()?;
        if !path.exists() {
            return None;
        }
        io::load_document(&path).ok()?.into_store().ok()
    }

    /// Seed shown on first launch, when no autosaved session exists.
    fn sample_store() -> ItemStore {
        let today = chrono::Local::now().date_naive();
        let mut store = ItemStore::new(today);
        store.add_block(today, 5, "Design", 0);
        store.add_block(today + chrono::Duration::days(5), 8, "Build", 0);
        store.add_block(today + chrono::Duration::days(3), 4, "Research", 1);
        store.add_milestone(today + chrono::Duration::days(13), 0, "Review");
        store
    }

    // --- File operations ---

    pub fn new_document(&mut self) {
        self.store = ItemStore::new(chrono::Local::now().date_naive());
        self.ctrl = InteractionController::new(self.ctrl.rows);
        self.file_path = None;
        self.restore_scroll = Some(0.0);
        self.status_message = "New timeline".to_string();
    }

    pub fn open_document(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Timeline", &["json"])
            .pick_file()
        {
            match io::load_document(&path).and_then(Document::into_store) {
                Ok(store) => {
                    self.restore_scroll = Some(store.scroll_position());
                    self.store = store;
                    self.ctrl = InteractionController::new(self.ctrl.rows);
                    self.file_path = Some(path);
                    self.status_message = "Timeline loaded".to_string();
                }
                Err(e) => {
                    self.status_message = format!("Error loading: {}", e);
                }
            }
        }
    }

    pub fn save_document(&mut self) {
        if let Some(path) = self.file_path.clone() {
            match io::save_document(&Document::from_store(&self.store), &path) {
                Ok(()) => self.status_message = "Timeline saved".to_string(),
                Err(e) => self.status_message = format!("Error saving: {}", e),
            }
        } else {
            self.save_document_as();
        }
    }

    pub fn save_document_as(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Timeline", &["json"])
            .set_file_name("timeline.json")
            .save_file()
        {
            match io::save_document(&Document::from_store(&self.store), &path) {
                Ok(()) => {
                    self.file_path = Some(path);
                    self.status_message = "Timeline saved".to_string();
                }
                Err(e) => self.status_message = format!("Error saving: {}", e),
            }
        }
    }

    /// Silent autosave of the working document between runs.
    fn autosave_session(&mut self) {
        if let Some(path) = io::file::session_path() {
            let _ = io::save_document(&Document::from_store(&self.store), &path);
        }
        self.autosaved_revision = self.store.revision();
    }

    // --- Keyboard ---

    fn handle_keyboard(&mut self, ctx: &egui::Context) {
        if self.ctrl.editing.is_some() || self.show_about || self.show_settings {
            return;
        }
        if ctx.input(|i| i.modifiers.ctrl && i.key_pressed(egui::Key::S)) {
            self.save_document();
            return;
        }

        let mut commands = Vec::new();
        ctx.input_mut(|i| {
            // Tab is claimed before egui's focus traversal sees it.
            while i.consume_key(egui::Modifiers::NONE, egui::Key::Tab) {
                commands.push(KeyCommand::SelectNext);
            }
            while i.consume_key(egui::Modifiers::SHIFT, egui::Key::Tab) {
                commands.push(KeyCommand::SelectPrev);
            }
            for (key, cmd) in [
                (egui::Key::ArrowLeft, KeyCommand::NudgeLeft),
                (egui::Key::ArrowRight, KeyCommand::NudgeRight),
                (egui::Key::ArrowUp, KeyCommand::NudgeUp),
                (egui::Key::ArrowDown, KeyCommand::NudgeDown),
                (egui::Key::Plus, KeyCommand::GrowBlock),
                (egui::Key::Equals, KeyCommand::GrowBlock),
                (egui::Key::Minus, KeyCommand::ShrinkBlock),
                (egui::Key::Delete, KeyCommand::Delete),
                (egui::Key::Backspace, KeyCommand::Delete),
                (egui::Key::Enter, KeyCommand::BeginEdit),
                (egui::Key::F2, KeyCommand::BeginEdit),
            ] {
                if i.key_pressed(key) {
                    commands.push(cmd);
                }
            }
        });
        for cmd in commands {
            self.ctrl.handle_key(cmd, &mut self.store);
        }
    }
}

impl eframe::App for PlannerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ui::theme::apply_theme(ctx);
        self.handle_keyboard(ctx);

        // Top panel: toolbar
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui::toolbar::show_toolbar(self, ui);
        });

        // Bottom panel: status bar
        egui::TopBottomPanel::bottom("status_bar")
            .exact_height(24.0)
            .frame(
                egui::Frame::default()
                    .fill(ui::theme::BG_HEADER)
                    .inner_margin(egui::Margin::symmetric(10.0, 0.0)),
            )
            .show(ctx, |ui| {
                ui.horizontal_centered(|ui| {
                    ui.label(
                        egui::RichText::new(&self.status_message)
                            .font(ui::theme::font_status())
                            .color(ui::theme::TEXT_SECONDARY),
                    );
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        let dim = |s: String| {
                            egui::RichText::new(s).size(10.5).color(ui::theme::TEXT_DIM)
                        };
                        ui.label(dim(format!("Zoom: {:.0}%", self.store.zoom() * 100.0)));
                        ui.label(dim(" · ".to_string()));
                        ui.label(dim(format!(
                            "Milestones: {}",
                            self.store.milestones().len()
                        )));
                        ui.label(dim(" · ".to_string()));
                        ui.label(dim(format!("Blocks: {}", self.store.blocks().len())));
                        if !self.store.off_timeline_blocks().is_empty() {
                            ui.label(dim(" · ".to_string()));
                            ui.label(dim(format!(
                                "Shelved: {}",
                                self.store.off_timeline_blocks().len()
                            )));
                        }
                    });
                });
            });

        // Central panel: the timeline track
        let frame = egui::Frame::default()
            .fill(ui::theme::BG_DARK)
            .inner_margin(egui::Margin::ZERO);
        egui::CentralPanel::default().frame(frame).show(ctx, |ui| {
            let restore = self.restore_scroll.take();
            ui::timeline::show_timeline(&mut self.store, &mut self.ctrl, restore, ui);
        });

        // Dialogs
        if self.show_settings {
            ui::dialogs::show_settings_dialog(self, ctx);
        }
        if self.show_about {
            ui::dialogs::show_about_dialog(self, ctx);
        }

        // Autosave whenever the store changed since the last one. The
        // scroll-only dirty flag does not bump the revision, so it is
        // checked separately.
        let scrolled = self.store.take_dirty();
        if scrolled || self.store.revision() != self.autosaved_revision {
            self.autosave_session();
        }
    }
}

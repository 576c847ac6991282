use std::{path::PathBuf, sync::Arc, time::Duration};

use crossbeam_channel::Receiver;
use eframe::egui;
use serde::{Deserialize, Serialize};

use crate::controller::{
    events::{UiError, UiEvent},
    menu_screen::MenuScreen,
    orchestration::BackendDispatcher,
};
use crate::ui::panels;

pub const SETTINGS_STORAGE_KEY: &str = "menu_admin.settings";

const DEFAULT_TREE_PANEL_WIDTH: f32 = 220.0;
const MIN_TREE_PANEL_WIDTH: f32 = 160.0;
const MAX_TREE_PANEL_WIDTH: f32 = 480.0;

/// Fonts tried in order for Japanese glyphs when none is configured.
const CJK_FONT_CANDIDATES: [&str; 5] = [
    "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/noto-cjk/NotoSansCJK-Regular.ttc",
    "/System/Library/Fonts/ヒラギノ角ゴシック W3.ttc",
    "C:\\Windows\\Fonts\\meiryo.ttc",
    "C:\\Windows\\Fonts\\msgothic.ttc",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusBannerSeverity {
    Error,
}

#[derive(Debug, Clone)]
pub struct StatusBanner {
    pub severity: StatusBannerSeverity,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedViewSettings {
    pub tree_panel_width: f32,
    pub dark_mode: bool,
}

impl Default for PersistedViewSettings {
    fn default() -> Self {
        Self {
            tree_panel_width: DEFAULT_TREE_PANEL_WIDTH,
            dark_mode: true,
        }
    }
}

impl PersistedViewSettings {
    pub fn sanitized(self) -> Self {
        Self {
            tree_panel_width: if self.tree_panel_width.is_finite() {
                self.tree_panel_width
                    .clamp(MIN_TREE_PANEL_WIDTH, MAX_TREE_PANEL_WIDTH)
            } else {
                DEFAULT_TREE_PANEL_WIDTH
            },
            dark_mode: self.dark_mode,
        }
    }
}

pub struct MenuAdminApp {
    screen: MenuScreen<BackendDispatcher>,
    ui_rx: Receiver<UiEvent>,
    status: String,
    status_banner: Option<StatusBanner>,
    view: PersistedViewSettings,
    applied_dark_mode: Option<bool>,
    font_path: Option<PathBuf>,
    fonts_installed: bool,
}

impl MenuAdminApp {
    pub fn new(
        dispatcher: BackendDispatcher,
        ui_rx: Receiver<UiEvent>,
        persisted: Option<PersistedViewSettings>,
        font_path: Option<PathBuf>,
    ) -> Self {
        let mut screen = MenuScreen::new(dispatcher);
        screen.mount();
        Self {
            screen,
            ui_rx,
            status: "Starting...".to_string(),
            status_banner: None,
            view: persisted.unwrap_or_default().sanitized(),
            applied_dark_mode: None,
            font_path,
            fonts_installed: false,
        }
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn status_banner(&self) -> Option<&StatusBanner> {
        self.status_banner.as_ref()
    }

    pub fn screen(&self) -> &MenuScreen<BackendDispatcher> {
        &self.screen
    }

    pub fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            match event {
                UiEvent::Info(message) => {
                    self.status = message;
                }
                UiEvent::StoreUpdated(state) => {
                    self.screen.apply_store_state(*state);
                }
                UiEvent::Error(err) => self.show_error(&err),
            }
        }
        if let Some(status) = self.screen.sink_mut().take_status() {
            self.status = status;
        }
    }

    fn show_error(&mut self, err: &UiError) {
        tracing::warn!(
            context = ?err.context(),
            category = ?err.category(),
            "{}",
            err.message()
        );
        self.status = err.status_text();
        if err.wants_banner() {
            self.status_banner = Some(StatusBanner {
                severity: StatusBannerSeverity::Error,
                message: self.status.clone(),
            });
        }
    }

    fn apply_theme_if_needed(&mut self, ctx: &egui::Context) {
        if !self.fonts_installed {
            install_cjk_font(ctx, self.font_path.as_deref());
            self.fonts_installed = true;
        }
        if self.applied_dark_mode != Some(self.view.dark_mode) {
            ctx.set_visuals(if self.view.dark_mode {
                egui::Visuals::dark()
            } else {
                egui::Visuals::light()
            });
            self.applied_dark_mode = Some(self.view.dark_mode);
        }
    }

    fn show_status_banner(&mut self, ui: &mut egui::Ui) {
        if let Some(banner) = self.status_banner.clone() {
            let (fill, stroke) = match banner.severity {
                StatusBannerSeverity::Error => (
                    egui::Color32::from_rgb(111, 53, 53),
                    egui::Stroke::new(1.0, egui::Color32::from_rgb(175, 96, 96)),
                ),
            };

            egui::Frame::new()
                .fill(fill)
                .stroke(stroke)
                .corner_radius(egui::CornerRadius::same(8))
                .inner_margin(egui::Margin::symmetric(10, 8))
                .show(ui, |ui| {
                    ui.horizontal_wrapped(|ui| {
                        ui.label(egui::RichText::new(&banner.message).color(egui::Color32::WHITE));
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            if ui.button("Dismiss").clicked() {
                                self.status_banner = None;
                            }
                        });
                    });
                });
        }
    }

    fn show_workspace(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("メニュー管理");
                ui.weak("システム管理 / メニュー管理");
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let label = if self.view.dark_mode { "Light" } else { "Dark" };
                    if ui.button(label).clicked() {
                        self.view.dark_mode = !self.view.dark_mode;
                    }
                    if ui.button("更新").clicked() {
                        self.screen.refresh();
                    }
                });
            });
            self.show_status_banner(ui);
        });

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.small(&self.status);
        });

        let tree_panel = egui::SidePanel::left("menu_tree_panel")
            .resizable(true)
            .default_width(self.view.tree_panel_width)
            .width_range(MIN_TREE_PANEL_WIDTH..=MAX_TREE_PANEL_WIDTH)
            .show(ctx, |ui| {
                panels::show_tree_panel(ui, &mut self.screen);
            });
        self.view.tree_panel_width = tree_panel.response.rect.width();

        egui::CentralPanel::default().show(ctx, |ui| {
            panels::show_search_form(ui, &mut self.screen);
            ui.separator();
            panels::show_toolbar(ui, &mut self.screen);
            ui.add_space(4.0);
            panels::show_pagination(ui, &mut self.screen);
            ui.separator();
            panels::show_table(ui, &mut self.screen);
        });

        panels::show_form_window(ctx, &mut self.screen);
        panels::show_delete_confirm(ctx, &mut self.screen);
    }
}

impl eframe::App for MenuAdminApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();
        self.apply_theme_if_needed(ctx);
        self.show_workspace(ctx);
        // Backend events arrive off-thread; poll for them.
        ctx.request_repaint_after(Duration::from_millis(100));
    }

    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        if let Ok(serialized) = serde_json::to_string(&self.view) {
            storage.set_string(SETTINGS_STORAGE_KEY, serialized);
        }
    }
}

fn install_cjk_font(ctx: &egui::Context, configured: Option<&std::path::Path>) {
    let candidates = configured
        .map(|path| vec![path.to_path_buf()])
        .unwrap_or_else(|| CJK_FONT_CANDIDATES.iter().map(PathBuf::from).collect());

    let Some((path, bytes)) = candidates
        .into_iter()
        .find_map(|path| std::fs::read(&path).ok().map(|bytes| (path, bytes)))
    else {
        tracing::warn!("no CJK font found; Japanese labels may not render");
        return;
    };

    let mut fonts = egui::FontDefinitions::default();
    fonts
        .font_data
        .insert("cjk".to_owned(), Arc::new(egui::FontData::from_owned(bytes)));
    for family in [egui::FontFamily::Proportional, egui::FontFamily::Monospace] {
        fonts.families.entry(family).or_default().push("cjk".to_owned());
    }
    ctx.set_fonts(fonts);
    tracing::info!(path = %path.display(), "installed CJK font");
}

#[cfg(test)]
#[path = "tests/app_tests.rs"]
mod tests;

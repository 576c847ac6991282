//! Panels of the menu screen: tree, search form, toolbar, table, pagination,
//! detail form window and delete confirmation.

use eframe::egui;
use shared::{
    domain::{ActionPatch, MenuId, Visibility},
    protocol::HiddenFilter,
};

use crate::controller::{
    menu_form::parent_options, menu_screen::MenuScreen, orchestration::IntentSink,
};

pub const PAGE_SIZE_CHOICES: [u32; 4] = [10, 20, 50, 100];

const TREE_INDENT: f32 = 14.0;

pub fn show_tree_panel<S: IntentSink>(ui: &mut egui::Ui, screen: &mut MenuScreen<S>) {
    let rows = screen.tree_rows();
    egui::ScrollArea::vertical()
        .id_salt("menu_tree_scroll")
        .show(ui, |ui| {
            for row in &rows {
                ui.horizontal(|ui| {
                    ui.add_space(row.depth as f32 * TREE_INDENT);
                    match (&row.record_id, row.has_children) {
                        (Some(id), true) => {
                            let marker = if row.expanded { "▾" } else { "▸" };
                            if ui.small_button(marker).clicked() {
                                screen.toggle_tree_node(id);
                            }
                        }
                        _ => ui.add_space(18.0),
                    }
                    if ui.selectable_label(row.selected, &row.name).clicked() {
                        screen.click_tree_node(row.record_id.clone());
                    }
                });
            }
        });
}

pub fn show_search_form<S: IntentSink>(ui: &mut egui::Ui, screen: &mut MenuScreen<S>) {
    let mut submit = false;
    let mut reset = false;
    ui.horizontal_wrapped(|ui| {
        ui.label("メニュー名");
        let response = ui.add(
            egui::TextEdit::singleline(&mut screen.search_form.name)
                .hint_text("入力してください")
                .desired_width(160.0),
        );
        if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
            submit = true;
        }

        ui.separator();
        ui.label("表示");
        let hidden = &mut screen.search_form.hidden;
        ui.radio_value(hidden, HiddenFilter::All, "全て");
        ui.radio_value(hidden, HiddenFilter::Only(Visibility::Shown), Visibility::Shown.label());
        ui.radio_value(hidden, HiddenFilter::Only(Visibility::Hidden), Visibility::Hidden.label());

        ui.separator();
        if ui.button("検索").clicked() {
            submit = true;
        }
        if ui.button("リセット").clicked() {
            reset = true;
        }
    });
    if let Some(err) = screen.search_error() {
        ui.colored_label(egui::Color32::from_rgb(220, 90, 90), err.to_string());
    }

    if submit {
        screen.submit_search();
    } else if reset {
        screen.reset_search();
    }
}

pub fn show_toolbar<S: IntentSink>(ui: &mut egui::Ui, screen: &mut MenuScreen<S>) {
    ui.horizontal(|ui| {
        if ui.button("新規作成").clicked() {
            screen.click_add();
        }
        // Edit and delete only make sense with exactly one selected row.
        if screen.selection().is_some() {
            if ui.button("編集").clicked() {
                screen.click_edit();
            }
            let delete = egui::Button::new(
                egui::RichText::new("削除").color(egui::Color32::from_rgb(230, 110, 110)),
            );
            if ui.add(delete).clicked() {
                screen.click_delete();
            }
        }
    });
}

pub fn show_table<S: IntentSink>(ui: &mut egui::Ui, screen: &mut MenuScreen<S>) {
    let rows = screen.table_rows();
    let mut clicked: Option<MenuId> = None;

    egui::ScrollArea::vertical()
        .id_salt("menu_table_scroll")
        .auto_shrink([false, true])
        .show(ui, |ui| {
            egui::Grid::new("menu_table")
                .striped(true)
                .num_columns(5)
                .min_col_width(80.0)
                .show(ui, |ui| {
                    for title in ["メニュー名", "表示順", "表示", "アイコン", "ルーター"] {
                        ui.label(egui::RichText::new(title).strong());
                    }
                    ui.end_row();

                    for row in &rows {
                        if ui.selectable_label(row.selected, &row.name).clicked() {
                            clicked = Some(row.record_id.clone());
                        }
                        ui.label(row.sequence.to_string());
                        ui.label(row.hidden);
                        ui.label(&row.icon);
                        ui.label(&row.router);
                        ui.end_row();
                    }
                });
            if rows.is_empty() {
                ui.weak("データがありません");
            }
        });

    if let Some(record) = clicked.and_then(|id| screen.record(&id).cloned()) {
        screen.toggle_row(&record);
    }
}

pub fn show_pagination<S: IntentSink>(ui: &mut egui::Ui, screen: &mut MenuScreen<S>) {
    let pagination = screen.pagination();
    let page_count = screen.page_count();
    let mut target: Option<(u32, u32)> = None;

    ui.horizontal(|ui| {
        ui.label(format!("共{}条", pagination.total));
        ui.separator();
        if ui
            .add_enabled(pagination.current > 1, egui::Button::new("‹"))
            .clicked()
        {
            target = Some((pagination.current - 1, pagination.page_size));
        }
        ui.label(format!("{} / {}", pagination.current, page_count));
        if ui
            .add_enabled(pagination.current < page_count, egui::Button::new("›"))
            .clicked()
        {
            target = Some((pagination.current + 1, pagination.page_size));
        }

        let mut page_size = pagination.page_size;
        egui::ComboBox::from_id_salt("menu_page_size")
            .selected_text(format!("{page_size} 件/ページ"))
            .show_ui(ui, |ui| {
                for choice in PAGE_SIZE_CHOICES {
                    ui.selectable_value(&mut page_size, choice, format!("{choice} 件/ページ"));
                }
            });
        if page_size != pagination.page_size {
            target = Some((1, page_size));
        }
    });

    if let Some((current, page_size)) = target {
        screen.change_page(current, page_size);
    }
}

pub fn show_form_window<S: IntentSink>(ctx: &egui::Context, screen: &mut MenuScreen<S>) {
    let form_state = screen.form_state().clone();
    if !form_state.visible {
        return;
    }
    let parents = parent_options(&screen.state().tree_data, screen.form.record_id.as_ref());

    let mut open = true;
    let mut submit = false;
    let mut cancel = false;
    egui::Window::new(form_state.title.as_str())
        .id(egui::Id::new("menu_form_window"))
        .open(&mut open)
        .collapsible(false)
        .resizable(true)
        .default_width(560.0)
        .show(ctx, |ui| {
            let form = &mut screen.form;
            egui::Grid::new("menu_form_fields")
                .num_columns(2)
                .spacing([12.0, 8.0])
                .show(ui, |ui| {
                    ui.label("メニュー名");
                    ui.text_edit_singleline(&mut form.name);
                    ui.end_row();

                    ui.label("表示順");
                    ui.add(egui::DragValue::new(&mut form.sequence));
                    ui.end_row();

                    ui.label("表示");
                    ui.horizontal(|ui| {
                        ui.radio_value(&mut form.hidden, Visibility::Shown, Visibility::Shown.label());
                        ui.radio_value(&mut form.hidden, Visibility::Hidden, Visibility::Hidden.label());
                    });
                    ui.end_row();

                    ui.label("アイコン");
                    ui.text_edit_singleline(&mut form.icon);
                    ui.end_row();

                    ui.label("ルーター");
                    ui.text_edit_singleline(&mut form.router);
                    ui.end_row();

                    ui.label("上位メニュー");
                    let selected_text = form
                        .parent_id
                        .as_ref()
                        .and_then(|id| parents.iter().find(|(pid, _, _)| pid == id))
                        .map(|(_, name, _)| name.clone())
                        .unwrap_or_else(|| "（なし）".to_string());
                    egui::ComboBox::from_id_salt("menu_form_parent")
                        .selected_text(selected_text)
                        .show_ui(ui, |ui| {
                            ui.selectable_value(&mut form.parent_id, None, "（なし）");
                            for (id, name, depth) in &parents {
                                let label = format!("{}{}", "　".repeat(*depth), name);
                                ui.selectable_value(&mut form.parent_id, Some(id.clone()), label);
                            }
                        });
                    ui.end_row();
                });

            ui.separator();
            show_action_editor(ui, screen);

            if let Some(err) = screen.form_error() {
                ui.colored_label(egui::Color32::from_rgb(220, 90, 90), err.to_string());
            }
            ui.separator();
            ui.horizontal(|ui| {
                let label = if form_state.submitting { "保存中..." } else { "保存" };
                if ui
                    .add_enabled(!form_state.submitting, egui::Button::new(label))
                    .clicked()
                {
                    submit = true;
                }
                if ui.button("取消").clicked() {
                    cancel = true;
                }
            });
        });

    if submit {
        screen.submit_current_form();
    } else if cancel || !open {
        screen.cancel_form();
    }
}

fn show_action_editor<S: IntentSink>(ui: &mut egui::Ui, screen: &mut MenuScreen<S>) {
    let form = &mut screen.form;
    ui.horizontal(|ui| {
        ui.label(egui::RichText::new("アクション").strong());
        if ui.button("新規追加").clicked() {
            form.editor_mut().add_blank_row();
        }
        if ui.button("テンプレート追加").clicked() {
            form.editor_mut().add_template_rows();
        }
    });

    let rows = form.editor().rows().to_vec();
    let can_delete = form.editor().can_delete();
    egui::Grid::new("menu_form_actions")
        .striped(true)
        .num_columns(3)
        .show(ui, |ui| {
            ui.label(egui::RichText::new("コード").strong());
            ui.label(egui::RichText::new("名称").strong());
            ui.label("");
            ui.end_row();

            for row in &rows {
                let mut code = row.code.clone();
                if ui
                    .add(egui::TextEdit::singleline(&mut code).desired_width(140.0))
                    .changed()
                {
                    form.editor_mut().update_row(&row.key, &ActionPatch::code(code));
                }
                let mut name = row.name.clone();
                if ui
                    .add(egui::TextEdit::singleline(&mut name).desired_width(180.0))
                    .changed()
                {
                    form.editor_mut().update_row(&row.key, &ActionPatch::name(name));
                }
                if ui.add_enabled(can_delete, egui::Button::new("削除")).clicked() {
                    form.editor_mut().delete_row(&row.key);
                }
                ui.end_row();
            }
        });

    form.pump_action_changes();
}

pub fn show_delete_confirm<S: IntentSink>(ctx: &egui::Context, screen: &mut MenuScreen<S>) {
    let Some(pending) = screen.pending_delete().cloned() else {
        return;
    };
    let mut confirm = false;
    let mut cancel = false;
    egui::Window::new("削除確認")
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            ui.label(pending.prompt());
            ui.add_space(8.0);
            ui.horizontal(|ui| {
                let ok = egui::Button::new(
                    egui::RichText::new("確認").color(egui::Color32::from_rgb(230, 110, 110)),
                );
                if ui.add(ok).clicked() {
                    confirm = true;
                }
                if ui.button("取消").clicked() {
                    cancel = true;
                }
            });
        });

    if confirm {
        screen.confirm_delete();
    } else if cancel {
        screen.cancel_delete();
    }
}

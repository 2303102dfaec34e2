use eframe::egui::{self, DragValue, Frame, RichText, Stroke, TextEdit, Ui};
use serde_json::Value;
use std::collections::HashMap;

use super::common::UiColors;
use crate::panel::settings::{FieldInput, SettingsField, SettingsNode};
use crate::panel::{SettingsAction, SettingsTree};

/// Builds the update action for `node.field`.
pub fn update_action(node: &str, field: &str, value: Value) -> SettingsAction {
    SettingsAction::Update {
        path: vec![node.to_string(), field.to_string()],
        value,
    }
}

/// Renders a [`SettingsTree`] and collects the edits made this frame
#[derive(Default)]
pub struct SettingsMenu {
    // Text being typed into free-form fields, committed on Enter or focus loss
    drafts: HashMap<String, String>,
}

impl SettingsMenu {
    pub fn render(&mut self, ui: &mut Ui, tree: &SettingsTree) -> Vec<SettingsAction> {
        let mut actions = Vec::new();
        ui.vertical(|ui| {
            for node in &tree.nodes {
                self.render_node(ui, node, &mut actions);
                ui.add_space(5.0);
            }
        });
        actions
    }

    fn render_node(&mut self, ui: &mut Ui, node: &SettingsNode, actions: &mut Vec<SettingsAction>) {
        Frame::new()
            .stroke(Stroke::new(1.0, UiColors::BORDER))
            .inner_margin(8.0)
            .outer_margin(2.0)
            .show(ui, |ui| {
                ui.heading(node.label);
                egui::Grid::new(node.key)
                    .num_columns(2)
                    .spacing([8.0, 6.0])
                    .show(ui, |ui| {
                        for field in &node.fields {
                            ui.label(field.label);
                            ui.vertical(|ui| {
                                if let Some(value) = self.render_field(ui, node.key, field) {
                                    actions.push(update_action(node.key, field.key, value));
                                }
                                if let Some(error) = field.error {
                                    ui.label(RichText::new(error).color(UiColors::INACTIVE).small());
                                }
                            });
                            ui.end_row();
                        }
                    });
            });
    }

    fn render_field(&mut self, ui: &mut Ui, node: &str, field: &SettingsField) -> Option<Value> {
        let id = format!("{}.{}", node, field.key);
        match &field.input {
            FieldInput::Number(current) => {
                let mut value = *current;
                let response = ui.add_enabled(
                    !field.readonly,
                    DragValue::new(&mut value).speed(0.1).max_decimals(3),
                );
                (response.changed() && value != *current).then(|| Value::from(value))
            }
            FieldInput::Text(current) => {
                if field.readonly {
                    let mut shown = current.clone();
                    ui.add_enabled(false, TextEdit::singleline(&mut shown));
                    return None;
                }
                self.draft_edit(ui, &id, current)
            }
            FieldInput::Autocomplete { value, items } => {
                let mut picked = None;
                ui.horizontal(|ui| {
                    picked = self.draft_edit(ui, &id, value);
                    egui::ComboBox::from_id_salt(&id)
                        .selected_text("▼")
                        .width(24.0)
                        .show_ui(ui, |ui| {
                            for item in items {
                                if ui.selectable_label(item == value, item).clicked() {
                                    self.drafts.remove(&id);
                                    picked = Some(Value::from(item.clone()));
                                }
                            }
                        });
                });
                picked
            }
        }
    }

    fn draft_edit(&mut self, ui: &mut Ui, id: &str, current: &str) -> Option<Value> {
        let draft = self
            .drafts
            .entry(id.to_string())
            .or_insert_with(|| current.to_string());
        let response = ui.add(TextEdit::singleline(draft).desired_width(160.0));

        if response.lost_focus() {
            let committed = self.drafts.remove(id).unwrap_or_default();
            return (committed != current).then(|| Value::from(committed));
        }
        if !response.has_focus() {
            // Follow the stored value while not being edited
            self.drafts.insert(id.to_string(), current.to_string());
        }
        None
    }
}

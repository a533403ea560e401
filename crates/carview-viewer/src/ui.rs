//! UI overlays using bevy_egui

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts, EguiPrimaryContextPass};
use carview_core::{format_price, ColorPreset, MaterialLogEntry, ModelPhase};
use carview_scene::{ActiveVariant, CarSession, PaintCommand, SwitchVariant, ToggleLight, ViewerSettings};

/// Grouped system parameters for the main UI system
#[derive(SystemParam)]
pub struct UiParams<'w, 's> {
    pub contexts: EguiContexts<'w, 's>,
    pub settings: Res<'w, ViewerSettings>,
    pub active: Res<'w, ActiveVariant>,
    pub session: Res<'w, CarSession>,
    pub paint: MessageWriter<'w, PaintCommand>,
    pub toggle_light: MessageWriter<'w, ToggleLight>,
    pub switch_variant: MessageWriter<'w, SwitchVariant>,
}

pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        // Main UI system runs in EguiPrimaryContextPass for proper input handling (bevy_egui 0.38+)
        app.add_systems(EguiPrimaryContextPass, ui_system);
    }
}

/// Swatch color for a preset button, `None` for the original paint
fn swatch(preset: ColorPreset) -> Option<egui::Color32> {
    let hex = preset.hex()?;
    Some(egui::Color32::from_rgb((hex >> 16) as u8, (hex >> 8) as u8, hex as u8))
}

fn ui_system(mut params: UiParams) {
    // Get the egui context - early return if not available
    let Ok(ctx) = params.contexts.ctx_mut() else { return };

    let active_name = params.active.0.name.clone();
    egui::TopBottomPanel::top("header").show(ctx, |ui| {
        ui.horizontal(|ui| {
            ui.heading(params.active.0.display_title());
            ui.separator();
            for variant in &params.settings.0.variants {
                let selected = variant.name == active_name;
                if ui.selectable_label(selected, variant.display_title()).clicked() && !selected {
                    params.switch_variant.write(SwitchVariant(variant.name.clone()));
                }
            }
        });
    });

    let session = &params.session.0;
    egui::Window::new("Paint")
        .title_bar(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_BOTTOM, [0.0, -16.0])
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                for preset in ColorPreset::ALL {
                    let mut button = egui::Button::new(preset.label());
                    if let Some(fill) = swatch(preset) {
                        button = button.fill(fill);
                    }
                    let response = ui.add(button.selected(session.selection() == preset));
                    if response.clicked() {
                        params.paint.write(PaintCommand(preset));
                    }
                }

                ui.separator();
                if ui.button(session.light().button_label()).clicked() {
                    params.toggle_light.write(ToggleLight);
                }

                if let Some(price) = session.displayed_price() {
                    ui.separator();
                    ui.label(egui::RichText::new(format!("Price: {}", format_price(price))).strong());
                }
            });

            match session.phase() {
                ModelPhase::Loading => {
                    ui.horizontal(|ui| {
                        ui.spinner();
                        ui.label("Loading model...");
                    });
                }
                ModelPhase::Failed => {
                    ui.colored_label(egui::Color32::from_rgb(200, 60, 60), "Model failed to load");
                }
                ModelPhase::Ready | ModelPhase::Empty => {}
            }
        });

    if let Some(state) = session.paint_state() {
        egui::Window::new("Materials")
            .default_open(false)
            .anchor(egui::Align2::RIGHT_TOP, [-10.0, 40.0])
            .show(ctx, |ui| {
                ui.label(format!(
                    "{} paintable slots ({:?} pass)",
                    state.paintable_count(),
                    state.pass()
                ));
                ui.separator();
                render_material_log(ui, state.material_log());
            });
    }
}

fn render_material_log(ui: &mut egui::Ui, entries: &[MaterialLogEntry]) {
    if entries.is_empty() {
        ui.label(egui::RichText::new("No meshes").small().color(egui::Color32::GRAY));
        return;
    }

    egui::ScrollArea::vertical().max_height(300.0).show(ui, |ui| {
        egui::Grid::new("material_log").striped(true).show(ui, |ui| {
            ui.strong("Mesh");
            ui.strong("Material");
            ui.strong("Color");
            ui.strong("Map");
            ui.end_row();

            for entry in entries {
                ui.label(&entry.mesh);
                ui.label(&entry.material);
                ui.label(if entry.has_color { "yes" } else { "-" });
                ui.label(if entry.has_map { "yes" } else { "-" });
                ui.end_row();
            }
        });
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swatch_colors() {
        assert_eq!(swatch(ColorPreset::Original), None);
        assert_eq!(swatch(ColorPreset::Red), Some(egui::Color32::from_rgb(0x7f, 0, 0)));
        assert_eq!(swatch(ColorPreset::Gray), Some(egui::Color32::from_rgb(0x66, 0x66, 0x66)));
    }
}

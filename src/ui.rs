/*
 * UI Module
 *
 * This module contains functions for creating and updating the user interface
 * using nannou_egui. The panel edits a copy of the world's SimulationParams;
 * the app applies it to the world when it changes. App-only toggles live in
 * AppSettings and use its snapshot-based change detection.
 */

use nannou_egui::{egui, Egui};

use crate::debug::DebugInfo;
use crate::params::{AppSettings, SimulationParams};
use crate::scenes::Scene;
use crate::spatial_grid::PartitionMode;

// What the user asked for during this frame
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UiActions {
    pub reset_scene: bool,
    pub scene_changed: bool,
    pub params_changed: bool,
    pub step_once: bool,
    pub ui_changed: bool,
}

pub fn update_ui(
    egui: &mut Egui,
    params: &mut SimulationParams,
    settings: &mut AppSettings,
    debug_info: &DebugInfo,
) -> UiActions {
    let mut actions = UiActions::default();
    let params_before = params.clone();

    // Take a snapshot of current setting values for change detection
    settings.take_snapshot();

    let ctx = egui.begin_frame();

    egui::Window::new("Simulation Controls")
        .default_pos([10.0, 10.0])
        .show(&ctx, |ui| {
            ui.horizontal(|ui| {
                let label = if settings.pause_simulation { "Resume" } else { "Pause" };
                if ui.button(label).clicked() {
                    settings.pause_simulation = !settings.pause_simulation;
                }
                if ui.add_enabled(settings.pause_simulation, egui::Button::new("Step")).clicked() {
                    actions.step_once = true;
                }
                if ui.button("Reset").clicked() {
                    actions.reset_scene = true;
                }
            });

            egui::ComboBox::from_label("Scene")
                .selected_text(Scene::from_index(settings.scene_index).name())
                .show_ui(ui, |ui| {
                    for (i, scene) in Scene::ALL.iter().enumerate() {
                        ui.selectable_value(&mut settings.scene_index, i, scene.name());
                    }
                });

            ui.collapsing("Fluid", |ui| {
                ui.add(egui::Slider::new(&mut params.rest_density, SimulationParams::get_rest_density_range()).text("Rest density"));
                ui.add(egui::Slider::new(&mut params.pressure_stiffness, SimulationParams::get_pressure_stiffness_range()).text("Pressure stiffness k"));
                ui.add(egui::Slider::new(&mut params.viscosity, SimulationParams::get_viscosity_range()).text("Viscosity μ"));
                ui.add(egui::Slider::new(&mut params.smoothing_length, SimulationParams::get_smoothing_length_range()).text("Smoothing length h"));
                ui.checkbox(&mut params.density_includes_self, "Density includes self");
            });

            ui.collapsing("World", |ui| {
                ui.add(egui::Slider::new(&mut params.gravity.y, SimulationParams::get_gravity_range()).text("Gravity"));
                ui.add(egui::Slider::new(&mut params.solver_iterations, SimulationParams::get_solver_iterations_range()).text("Solver iterations"));
                ui.add(egui::Slider::new(&mut params.default_restitution, SimulationParams::get_restitution_range()).text("Restitution (new particles)"));
                ui.checkbox(&mut params.particle_collisions, "Particle collisions");
                ui.checkbox(&mut params.boundary_collisions, "Boundary collisions");
            });

            ui.collapsing("Neighbour Search", |ui| {
                for mode in PartitionMode::ALL {
                    ui.radio_value(&mut params.partition_mode, mode, mode.to_string());
                }
                ui.checkbox(&mut settings.show_partition, "Show partition");

                ui.separator();

                // Performance metrics
                ui.label(format!("FPS: {:.1}", debug_info.fps));
                ui.label(format!("Frame time: {:.2} ms", debug_info.frame_time.as_secs_f64() * 1000.0));
                ui.label(format!("Steps this frame: {}", debug_info.physics_updates_per_frame));
                ui.label(format!("Particles: {}", debug_info.stats.particles));
            });

            ui.checkbox(&mut settings.show_debug, "Show Debug Info");
        });

    let (scene_changed, ui_changed) = settings.detect_changes();
    actions.scene_changed = scene_changed;
    actions.params_changed = *params != params_before;
    actions.ui_changed = ui_changed || actions.params_changed;
    actions
}

// Draw debug information on the screen
pub fn draw_debug_info(draw: &nannou::Draw, debug_info: &DebugInfo, window_rect: nannou::geom::Rect, timestep: f32) {
    let stats = &debug_info.stats;
    let margin = 20.0;
    let line_height = 20.0;
    let panel_width = 260.0;

    let debug_texts = [
        format!("FPS: {:.1}", debug_info.fps),
        format!("Steps: {}, time: {:.3} s, dt: {:.3} s", stats.step_count, stats.time, timestep),
        format!("Particles: {} ({} fluid)", stats.particles, stats.fluid_particles),
        format!("Constraints: {} ({} contacts)", stats.constraints, stats.contacts),
        format!("Density: mean {:.0}, max {:.0}", stats.mean_density, stats.max_density),
    ];

    // Background panel in the top-right corner, clear of the egui window
    let panel_height = line_height * debug_texts.len() as f32 + margin;
    draw.rect()
        .x_y(window_rect.right() - panel_width / 2.0, window_rect.top() - panel_height / 2.0)
        .w_h(panel_width, panel_height)
        .color(nannou::color::rgba(0.0, 0.0, 0.0, 0.7));

    let text_x = window_rect.right() - panel_width / 2.0;
    let text_y = window_rect.top() - margin;

    for (i, text) in debug_texts.iter().enumerate() {
        draw.text(text)
            .x_y(text_x, text_y - i as f32 * line_height)
            .w(panel_width - margin)
            .left_justify()
            .color(nannou::color::WHITE)
            .font_size(14);
    }
}

/*
 * Application Module
 *
 * This module defines the application model for the fluid demo and the
 * per-frame update. The world advances in fixed timesteps: wall-clock time
 * accumulates every frame and world.update() runs once per whole timestep
 * collected, so simulated time tracks real time regardless of frame rate.
 */

use std::time::{Duration, Instant};

use log::{error, warn};
use nannou::prelude::*;
use nannou_egui::Egui;

use crate::camera::Camera;
use crate::debug::{DebugInfo, StepStats};
use crate::input::{mouse_moved, mouse_pressed, mouse_released, mouse_wheel, raw_window_event, PointerDrag};
use crate::params::{AppSettings, SimulationParams};
use crate::renderer::view;
use crate::scenes::Scene;
use crate::ui;
use crate::world::World;

// Upper bound on physics steps per frame so a slow frame cannot snowball
const MAX_STEPS_PER_FRAME: usize = 8;

// Main model for the application
pub struct Model {
    pub world: World,
    // Edited by the UI, applied to the world when it changes
    pub params: SimulationParams,
    pub settings: AppSettings,
    pub egui: Egui,
    pub debug_info: DebugInfo,
    pub camera: Camera,
    pub mouse_position: Vec2,
    pub pointer: PointerDrag,
    // Fixed timestep physics variables
    pub physics_accumulator: Duration,
    pub last_update_time: Instant,
}

// Initialize the model
pub fn model(app: &App) -> Model {
    // Get the primary monitor's dimensions
    let monitor = app.primary_monitor().expect("Failed to get primary monitor");
    let monitor_size = monitor.size();

    // Calculate window size based on monitor size (80% of the shorter side, square)
    let window_size = monitor_size.width.min(monitor_size.height) as f32 * 0.8;

    // Create the main window
    let window_id = app
        .new_window()
        .title("SPH Fluid Simulation")
        .size(window_size as u32, window_size as u32)
        .view(view)
        .mouse_moved(mouse_moved)
        .mouse_pressed(mouse_pressed)
        .mouse_released(mouse_released)
        .mouse_wheel(mouse_wheel)
        .raw_event(raw_window_event)
        .build()
        .unwrap();

    // Get the window
    let window = app.window(window_id).unwrap();

    // Create the UI
    let egui = Egui::from_window(&window);

    let settings = AppSettings::default();
    let world = match Scene::from_index(settings.scene_index).load() {
        Ok(world) => world,
        Err(err) => {
            error!("Failed to load the initial scene: {}", err);
            std::process::exit(1);
        }
    };
    let camera = Camera::new(world.width(), world.height());

    Model {
        params: world.params().clone(),
        world,
        settings,
        egui,
        debug_info: DebugInfo::default(),
        camera,
        mouse_position: Vec2::ZERO,
        pointer: PointerDrag::default(),
        physics_accumulator: Duration::ZERO,
        last_update_time: Instant::now(),
    }
}

// Update the model
pub fn update(app: &App, model: &mut Model, update: Update) {
    // Update debug info
    model.debug_info.fps = app.fps();
    model.debug_info.frame_time = update.since_last;

    let actions = ui::update_ui(&mut model.egui, &mut model.params, &mut model.settings, &model.debug_info);

    if actions.scene_changed || actions.reset_scene {
        load_scene(model);
    } else if actions.params_changed {
        if let Err(err) = model.world.set_params(model.params.clone()) {
            warn!("Rejected parameter change: {}", err);
            model.params = model.world.params().clone();
        }
    }

    // Refresh the stats so the panel reflects edits made while paused
    if actions.ui_changed {
        model.debug_info.stats = StepStats::from_world(&model.world);
    }

    // Get current time
    let current_time = Instant::now();
    let frame_time = current_time.duration_since(model.last_update_time);
    model.last_update_time = current_time;

    let mut physics_updates_this_frame = 0;

    if model.settings.pause_simulation {
        // Time does not pile up while paused
        model.physics_accumulator = Duration::ZERO;
        if actions.step_once {
            model.world.update();
            physics_updates_this_frame = 1;
        }
    } else {
        model.physics_accumulator += frame_time;
        let step_size = Duration::from_secs_f32(model.world.timestep());

        // Run fixed timestep updates
        while model.physics_accumulator >= step_size {
            if physics_updates_this_frame == MAX_STEPS_PER_FRAME {
                model.physics_accumulator = Duration::ZERO;
                break;
            }
            model.world.update();
            model.physics_accumulator -= step_size;
            physics_updates_this_frame += 1;
        }
    }

    model.debug_info.physics_updates_per_frame = physics_updates_this_frame;
    if physics_updates_this_frame > 0 {
        model.debug_info.stats = StepStats::from_world(&model.world);
    }
}

// Rebuild the world for the selected scene, keeping the fluid and collision settings
fn load_scene(model: &mut Model) {
    let scene = Scene::from_index(model.settings.scene_index);
    match scene.load_with(&model.params) {
        Ok(world) => {
            model.pointer = PointerDrag::default();
            model.camera.frame_world(world.width(), world.height());
            model.params = world.params().clone();
            model.debug_info.stats = StepStats::from_world(&world);
            model.world = world;
            model.physics_accumulator = Duration::ZERO;
        }
        Err(err) => error!("Failed to load scene '{}': {}", scene, err),
    }
}

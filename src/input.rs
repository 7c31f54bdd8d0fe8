/*
 * Input Module
 *
 * This module handles user input events for the fluid demo.
 *
 * Features:
 * - Pointer drag: pressing near a particle attaches it to the pointer with a
 *   point constraint whose anchor follows the cursor
 * - Releasing the button or leaving the domain detaches it
 * - Camera zooming with mouse wheel
 * - Passing raw events to egui
 */

use log::debug;
use nannou::prelude::*;
use nannou::winit::event::{MouseButton, MouseScrollDelta, TouchPhase};

use crate::app::Model;
use crate::constraint::ConstraintHandle;
use crate::world::World;

// Grab radius as a fraction of the domain width
const INTERACTION_RADIUS_FRACTION: f32 = 0.1;
const DRAG_STIFFNESS: f32 = 0.6;

// The point constraint currently attached to the pointer, if any
#[derive(Default)]
pub struct PointerDrag {
    pub constraint: Option<ConstraintHandle>,
}

impl PointerDrag {
    pub fn is_active(&self) -> bool {
        self.constraint.is_some()
    }

    // Attach the particle nearest to `at` (world space), if one is within reach
    pub fn grab(&mut self, world: &mut World, at: Vec2) {
        self.release(world);

        let radius = INTERACTION_RADIUS_FRACTION * world.width();
        if let Some(particle) = world.nearest_particle(at.x, at.y, radius) {
            match world.create_point_constraint(particle, Some(at.x), Some(at.y), Some(DRAG_STIFFNESS)) {
                Ok(handle) => self.constraint = Some(handle),
                Err(err) => debug!("Could not attach pointer: {}", err),
            }
        }
    }

    // Move the anchor, detaching when the pointer leaves the domain
    pub fn drag_to(&mut self, world: &mut World, at: Vec2) {
        let Some(handle) = self.constraint else {
            return;
        };
        let inside = at.x >= 0.0 && at.x <= world.width() && at.y >= 0.0 && at.y <= world.height();
        if !inside || world.set_anchor(handle, at.x, at.y).is_err() {
            self.release(world);
        }
    }

    pub fn release(&mut self, world: &mut World) {
        if let Some(handle) = self.constraint.take() {
            // The constraint may already be gone with its particle
            let _ = world.delete_constraint(handle);
        }
    }
}

// Mouse moved event handler
pub fn mouse_moved(app: &App, model: &mut Model, pos: Point2) {
    model.mouse_position = Vec2::new(pos.x, pos.y);

    if model.pointer.is_active() {
        let world_pos = model.camera.screen_to_world(model.mouse_position, app.window_rect());
        model.pointer.drag_to(&mut model.world, world_pos);
    }
}

// Mouse pressed event handler
pub fn mouse_pressed(app: &App, model: &mut Model, button: MouseButton) {
    if button == MouseButton::Left {
        // Check if the click is on the UI before handling it
        if !model.egui.ctx().is_pointer_over_area() {
            let world_pos = model.camera.screen_to_world(model.mouse_position, app.window_rect());
            model.pointer.grab(&mut model.world, world_pos);
        }
    }
}

// Mouse released event handler
pub fn mouse_released(_app: &App, model: &mut Model, button: MouseButton) {
    if button == MouseButton::Left {
        model.pointer.release(&mut model.world);
    }
}

// Mouse wheel event handler for zooming
pub fn mouse_wheel(app: &App, model: &mut Model, delta: MouseScrollDelta, _phase: TouchPhase) {
    let window_rect = app.window_rect();
    match delta {
        MouseScrollDelta::LineDelta(x, y) => {
            model.camera.zoom(vec2(x, y), model.mouse_position, window_rect);
        }
        MouseScrollDelta::PixelDelta(pos) => {
            model.camera.zoom(vec2(pos.x as f32, pos.y as f32) * 0.01, model.mouse_position, window_rect);
        }
    }
}

// Handle raw window events for egui
pub fn raw_window_event(_app: &App, model: &mut Model, event: &nannou::winit::event::WindowEvent) {
    model.egui.handle_raw_event(event);
}

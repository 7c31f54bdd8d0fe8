/*
 * Camera Module
 *
 * This module defines the Camera struct that maps the simulation domain
 * [0,width]x[0,height] (metres, y up) onto the window (pixels, origin at the
 * window centre). At zoom 1 the whole domain fits the window with a small
 * margin; the mouse wheel zooms about the cursor.
 */

use nannou::prelude::*;

// Fraction of the window the domain occupies at zoom 1
const FIT_MARGIN: f32 = 0.9;

pub struct Camera {
    pub position: Vec2,
    pub zoom: f32,
    pub min_zoom: f32,
    pub max_zoom: f32,
    world_size: Vec2,
}

impl Camera {
    pub fn new(world_width: f32, world_height: f32) -> Self {
        let mut camera = Self {
            position: Vec2::ZERO,
            zoom: 1.0,
            min_zoom: 0.5,
            max_zoom: 8.0,
            world_size: vec2(world_width, world_height),
        };
        camera.frame_world(world_width, world_height);
        camera
    }

    // Centre the camera on the domain and reset the zoom
    pub fn frame_world(&mut self, world_width: f32, world_height: f32) {
        self.world_size = vec2(world_width, world_height);
        self.position = self.world_size / 2.0;
        self.zoom = 1.0;
    }

    // Pixels per world unit for the current window and zoom
    pub fn pixels_per_unit(&self, window_rect: Rect) -> f32 {
        let fit = (window_rect.w() / self.world_size.x).min(window_rect.h() / self.world_size.y);
        fit * FIT_MARGIN * self.zoom
    }

    // Convert a point from world space to screen space
    pub fn world_to_screen(&self, point: Vec2, window_rect: Rect) -> Vec2 {
        (point - self.position) * self.pixels_per_unit(window_rect) + window_rect.xy()
    }

    // Convert a point from screen space to world space
    pub fn screen_to_world(&self, point: Vec2, window_rect: Rect) -> Vec2 {
        (point - window_rect.xy()) / self.pixels_per_unit(window_rect) + self.position
    }

    // Convert a world length (e.g. a radius) to pixels
    pub fn scale(&self, length: f32, window_rect: Rect) -> f32 {
        length * self.pixels_per_unit(window_rect)
    }

    // Handle mouse wheel events for zooming
    pub fn zoom(&mut self, scroll_delta: Vec2, cursor_position: Vec2, window_rect: Rect) {
        let zoom_factor = 1.0 + scroll_delta.y * 0.1;

        // Keep the world point under the cursor fixed while zooming
        let cursor_world_before = self.screen_to_world(cursor_position, window_rect);
        self.zoom = (self.zoom * zoom_factor).clamp(self.min_zoom, self.max_zoom);
        let cursor_world_after = self.screen_to_world(cursor_position, window_rect);

        self.position += cursor_world_before - cursor_world_after;
    }
}

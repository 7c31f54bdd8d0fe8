/*
 * Renderer Module
 *
 * This module handles the rendering of the fluid simulation.
 * It draws the domain boundary, the particles and, in debug mode, contact
 * constraints, smoothing radii, the pointer constraint and the layout of
 * the neighbour search structure.
 *
 * Fluid particles are drawn as a soft translucent disc the size of the
 * smoothing length with a denser core at the contact radius, so overlapping
 * particles blend into a continuous body of water.
 */

use nannou::prelude::*;

use crate::app::Model;
use crate::constraint::ConstraintKind;
use crate::spatial_grid::SpatialIndex;
use crate::ui;
use crate::vector::Vector2;

// Render the model
pub fn view(app: &App, model: &Model, frame: Frame) {
    let draw = app.draw();
    draw.background().color(BLACK);

    let window_rect = app.window_rect();
    let world = &model.world;
    let camera = &model.camera;
    let to_screen = |p: Vector2| camera.world_to_screen(p.into(), window_rect);

    // Draw world boundary to show the simulation limits
    let corner_min = camera.world_to_screen(vec2(0.0, 0.0), window_rect);
    let corner_max = camera.world_to_screen(vec2(world.width(), world.height()), window_rect);
    let world_rect = Rect::from_corners(corner_min, corner_max);
    draw.rect()
        .xy(world_rect.xy())
        .wh(world_rect.wh())
        .no_fill()
        .stroke_weight(1.0)
        .stroke(rgba(0.5, 0.5, 0.5, 1.0));

    if model.settings.show_partition {
        draw_partition(&draw, model, window_rect);
    }

    let smoothing_px = camera.scale(world.kernel().smoothing_length, window_rect);
    for particle in world.particles() {
        let screen_pos = to_screen(particle.pos);
        let radius_px = camera.scale(particle.radius, window_rect).max(1.0);

        if particle.is_fluid {
            draw.ellipse()
                .xy(screen_pos)
                .radius(smoothing_px * 0.5)
                .color(rgba(0.08, 0.08, 0.6, 0.2));
            draw.ellipse()
                .xy(screen_pos)
                .radius(radius_px)
                .color(rgba(0.08, 0.08, 0.6, 0.5));
        } else {
            let fill = if particle.fixed {
                rgba(0.78, 0.16, 0.25, 1.0)
            } else {
                rgba(0.13, 0.86, 0.13, 1.0)
            };
            draw.ellipse()
                .xy(screen_pos)
                .radius(radius_px)
                .color(fill)
                .stroke(rgba(0.2, 0.2, 0.2, 1.0))
                .stroke_weight(1.0);
        }

        if model.settings.show_debug && particle.is_fluid {
            draw.ellipse()
                .xy(screen_pos)
                .radius(smoothing_px)
                .no_fill()
                .stroke(rgba(0.3, 0.3, 0.3, 1.0))
                .stroke_weight(1.0);
        }
    }

    // Constraints: contacts only in debug mode; distance and point constraints always
    for constraint in world.constraints() {
        let (p1, p2) = constraint.particles();
        let Some(a) = world.particle(p1) else {
            continue;
        };
        match &constraint.kind {
            ConstraintKind::Contact(_) if !model.settings.show_debug => {}
            ConstraintKind::Contact(_) | ConstraintKind::Distance(_) => {
                if let Some(b) = p2.and_then(|h| world.particle(h)) {
                    let color = if constraint.is_contact() { rgba(0.13, 0.13, 0.86, 1.0) } else { rgba(0.8, 0.8, 0.8, 1.0) };
                    draw.line()
                        .start(to_screen(a.pos))
                        .end(to_screen(b.pos))
                        .color(color)
                        .stroke_weight(1.0);
                }
            }
            ConstraintKind::Point(point) => {
                let anchor = to_screen(point.anchor);
                draw.line()
                    .start(to_screen(a.pos))
                    .end(anchor)
                    .color(YELLOW)
                    .stroke_weight(2.0);
                draw.ellipse().xy(anchor).radius(3.0).color(YELLOW);
            }
        }
    }

    if model.settings.show_debug {
        ui::draw_debug_info(&draw, &model.debug_info, window_rect, world.timestep());
    }

    // Finish drawing
    draw.to_frame(app, &frame).unwrap();

    // Draw the egui UI
    model.egui.draw_to_frame(&frame).unwrap();
}

// Grid cells (empty ones shaded) or occupied hash buckets
fn draw_partition(draw: &Draw, model: &Model, window_rect: Rect) {
    let Some(index) = model.world.spatial_index() else {
        return;
    };
    let camera = &model.camera;
    let cell_size = index.cell_size();
    let cell_px = camera.scale(cell_size, window_rect);
    let shade_empty = matches!(index, SpatialIndex::Grid(_));

    for cell in index.layout() {
        let centre = vec2((cell.x as f32 + 0.5) * cell_size, (cell.y as f32 + 0.5) * cell_size);
        let screen_pos = camera.world_to_screen(centre, window_rect);
        let fill = if cell.count == 0 && shade_empty {
            rgba(0.2, 0.2, 0.2, 0.2)
        } else {
            rgba(0.0, 0.0, 0.0, 0.0)
        };
        draw.rect()
            .xy(screen_pos)
            .w_h(cell_px, cell_px)
            .color(fill)
            .stroke_weight(1.0)
            .stroke(rgba(0.3, 0.3, 0.3, 1.0));
    }
}

/*
 * Debug Information Module
 *
 * This module defines the DebugInfo struct that contains frame metrics and a
 * StepStats snapshot of the world, displayed by the UI and the debug overlay.
 *
 * Includes metrics for:
 * - FPS (frames per second) and frame time
 * - Physics steps run in the last frame
 * - Entity counts and the SPH density range
 */

use std::time::Duration;

use crate::world::World;

// Summary of the world after the most recent step
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StepStats {
    pub step_count: u64,
    pub time: f64,
    pub particles: usize,
    pub fluid_particles: usize,
    pub constraints: usize,
    pub contacts: usize,
    pub mean_density: f32,
    pub max_density: f32,
}

impl StepStats {
    pub fn from_world(world: &World) -> Self {
        let mut fluid_particles = 0;
        let mut density_sum = 0.0;
        let mut max_density: f32 = 0.0;

        for particle in world.particles().iter().filter(|p| p.is_fluid) {
            fluid_particles += 1;
            density_sum += particle.fluid_density;
            max_density = max_density.max(particle.fluid_density);
        }

        Self {
            step_count: world.step_count(),
            time: world.time(),
            particles: world.particle_count(),
            fluid_particles,
            constraints: world.constraint_count(),
            contacts: world.contact_count(),
            mean_density: if fluid_particles > 0 { density_sum / fluid_particles as f32 } else { 0.0 },
            max_density,
        }
    }
}

// Debug information to display
#[derive(Default)]
pub struct DebugInfo {
    pub fps: f32,
    pub frame_time: Duration,
    pub physics_updates_per_frame: usize,
    pub stats: StepStats,
}

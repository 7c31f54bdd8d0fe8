/*
 * Simulation Parameters Module
 *
 * This module defines the SimulationParams struct that holds every constant
 * the world reads while stepping: domain bounds, timestep, solver iterations,
 * SPH material constants and the collision and partitioning switches.
 * It also defines AppSettings, the purely visual state of the demo front-end,
 * with the snapshot-based change detection the UI relies on.
 */

use std::ops::RangeInclusive;

use crate::error::{require_positive, require_unit_interval, SimError, SimResult};
use crate::fluid::FluidProperties;
use crate::particle::DEFAULT_RESTITUTION;
use crate::spatial_grid::PartitionMode;
use crate::vector::Vector2;

// Constants the world reads while stepping; settable between steps through World::set_params
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationParams {
    // Domain [0,width]x[0,height] and stepping
    pub width: f32,
    pub height: f32,
    pub timestep: f32,
    pub solver_iterations: u32,
    // SPH
    pub gravity: Vector2,
    pub rest_density: f32,
    pub pressure_stiffness: f32,
    pub viscosity: f32,
    pub smoothing_length: f32,
    pub density_includes_self: bool,
    // Collisions and partitioning
    pub particle_collisions: bool,
    pub boundary_collisions: bool,
    pub default_restitution: f32,
    pub contact_radius: f32,
    pub partition_mode: PartitionMode,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            width: 10.0,
            height: 10.0,
            timestep: 0.01,
            solver_iterations: 10,
            gravity: Vector2::new(0.0, -9.81),
            rest_density: 1000.0,
            pressure_stiffness: 16.0,
            viscosity: 35.0,
            smoothing_length: 1.0,
            density_includes_self: true,
            particle_collisions: true,
            boundary_collisions: true,
            default_restitution: DEFAULT_RESTITUTION,
            contact_radius: 0.1,
            partition_mode: PartitionMode::Grid,
        }
    }
}

impl SimulationParams {
    pub fn with_domain(width: f32, height: f32, timestep: f32, solver_iterations: u32) -> Self {
        Self {
            width,
            height,
            timestep,
            solver_iterations,
            ..Self::default()
        }
    }

    // Reject values the integrator or the kernels cannot work with
    pub fn validate(&self) -> SimResult<()> {
        require_positive("width", self.width)?;
        require_positive("height", self.height)?;
        require_positive("timestep", self.timestep)?;
        require_positive("smoothing_length", self.smoothing_length)?;
        require_positive("rest_density", self.rest_density)?;
        require_positive("contact_radius", self.contact_radius)?;
        require_unit_interval("default_restitution", self.default_restitution)?;

        if self.solver_iterations == 0 {
            return Err(SimError::InvalidParameter { name: "solver_iterations", value: 0.0 });
        }
        if !(self.pressure_stiffness.is_finite() && self.pressure_stiffness >= 0.0) {
            return Err(SimError::InvalidParameter { name: "pressure_stiffness", value: self.pressure_stiffness });
        }
        if !(self.viscosity.is_finite() && self.viscosity >= 0.0) {
            return Err(SimError::InvalidParameter { name: "viscosity", value: self.viscosity });
        }
        if !self.gravity.is_finite() {
            return Err(SimError::InvalidParameter { name: "gravity", value: f32::NAN });
        }
        Ok(())
    }

    pub fn fluid_properties(&self) -> FluidProperties {
        FluidProperties {
            rest_density: self.rest_density,
            pressure_stiffness: self.pressure_stiffness,
            viscosity: self.viscosity,
            density_includes_self: self.density_includes_self,
        }
    }

    // True when the spatial index has to be rebuilt to apply `other`
    pub fn index_layout_differs(&self, other: &SimulationParams) -> bool {
        self.smoothing_length != other.smoothing_length
            || self.width != other.width
            || self.height != other.height
            || self.partition_mode != other.partition_mode
    }

    // Get parameter ranges for UI sliders
    pub fn get_gravity_range() -> RangeInclusive<f32> {
        -20.0..=20.0
    }

    pub fn get_rest_density_range() -> RangeInclusive<f32> {
        100.0..=3000.0
    }

    pub fn get_pressure_stiffness_range() -> RangeInclusive<f32> {
        0.0..=100.0
    }

    pub fn get_viscosity_range() -> RangeInclusive<f32> {
        0.0..=100.0
    }

    pub fn get_smoothing_length_range() -> RangeInclusive<f32> {
        0.25..=2.0
    }

    pub fn get_solver_iterations_range() -> RangeInclusive<u32> {
        1..=30
    }

    pub fn get_restitution_range() -> RangeInclusive<f32> {
        0.0..=1.0
    }
}

// Front-end state that never reaches the world
pub struct AppSettings {
    pub show_debug: bool,
    pub show_partition: bool,
    pub pause_simulation: bool,
    pub scene_index: usize,

    // Internal state for tracking changes
    previous_values: Option<SettingsSnapshot>,
}

// A snapshot of setting values used for change detection
struct SettingsSnapshot {
    show_debug: bool,
    show_partition: bool,
    pause_simulation: bool,
    scene_index: usize,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            show_debug: false,
            show_partition: false,
            pause_simulation: false,
            scene_index: 0,
            previous_values: None,
        }
    }
}

impl AppSettings {
    // Take a snapshot of current setting values for change detection
    pub fn take_snapshot(&mut self) {
        self.previous_values = Some(SettingsSnapshot {
            show_debug: self.show_debug,
            show_partition: self.show_partition,
            pause_simulation: self.pause_simulation,
            scene_index: self.scene_index,
        });
    }

    // Returns (scene_changed, any_ui_changed) since the last snapshot
    pub fn detect_changes(&self) -> (bool, bool) {
        let mut scene_changed = false;
        let mut ui_changed = false;

        // If we don't have previous values, nothing has changed
        if let Some(prev) = &self.previous_values {
            if self.scene_index != prev.scene_index {
                scene_changed = true;
                ui_changed = true;
            }

            if self.show_debug != prev.show_debug
                || self.show_partition != prev.show_partition
                || self.pause_simulation != prev.pause_simulation
            {
                ui_changed = true;
            }
        }

        (scene_changed, ui_changed)
    }
}

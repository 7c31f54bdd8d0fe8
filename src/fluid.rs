/*
 * Fluid Module
 *
 * This module implements the SPH (smoothed-particle hydrodynamics) force model
 * after Müller, Charypar and Gross, "Particle-Based Fluid Simulation for
 * Interactive Applications":
 * - Density: poly6 kernel, W = σd (h² - r²)³
 * - Pressure: gradient of the spiky kernel, ∇W = σp (h - r)²
 * - Viscosity: laplacian of the viscosity kernel, ∇²W = σv (h - r)
 *
 * One step runs three passes over the fluid particles: neighbour search,
 * density and pressure, then pressure and viscosity forces. Each pass reads
 * the values written by the previous one, so the passes cannot be fused.
 */

use std::f32::consts::PI;

use log::trace;

use crate::error::{require_positive, SimError, SimResult};
use crate::particle::Particle;
use crate::spatial_grid::{brute_force_neighbors, SpatialIndex};
use crate::vector::Vector2;

// Kernel normalisation constants, derived from the smoothing length
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SphKernel {
    pub smoothing_length: f32,
    pub smoothing_length_sq: f32,
    pub sigma_density: f32,
    pub sigma_pressure: f32,
    pub sigma_viscosity: f32,
}

impl SphKernel {
    pub fn new(smoothing_length: f32) -> SimResult<Self> {
        let h = require_positive("smoothing_length", smoothing_length)?;
        let kernel = Self {
            smoothing_length: h,
            smoothing_length_sq: h * h,
            sigma_density: 315.0 / (64.0 * PI * h.powi(9)),
            sigma_pressure: -45.0 / (PI * h.powi(6)),
            sigma_viscosity: 45.0 / (PI * h.powi(6)),
        };
        // h^9 underflows for very small h
        if !kernel.sigma_density.is_finite() || !kernel.sigma_pressure.is_finite() {
            return Err(SimError::InvalidParameter { name: "smoothing_length", value: h });
        }
        Ok(kernel)
    }

    #[inline]
    pub fn density_weight(&self, distance_sq: f32) -> f32 {
        let diff = self.smoothing_length_sq - distance_sq;
        self.sigma_density * diff * diff * diff
    }

    #[inline]
    pub fn pressure_gradient(&self, distance: f32) -> f32 {
        let diff = self.smoothing_length - distance;
        self.sigma_pressure * diff * diff
    }

    #[inline]
    pub fn viscosity_laplacian(&self, distance: f32) -> f32 {
        self.sigma_viscosity * (self.smoothing_length - distance)
    }
}

// Material constants of the fluid
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FluidProperties {
    pub rest_density: f32,
    pub pressure_stiffness: f32,
    pub viscosity: f32,
    pub density_includes_self: bool,
}

// Run all three SPH passes; the spatial index must already be cleared
pub fn compute_fluid_forces(
    particles: &mut [Particle],
    index: Option<&mut SpatialIndex>,
    kernel: &SphKernel,
    fluid: &FluidProperties,
) {
    find_neighbors(particles, index, kernel.smoothing_length, fluid.density_includes_self);
    compute_density_pressure(particles, kernel, fluid);
    accumulate_forces(particles, kernel, fluid);
}

// Fill every fluid particle's neighbour list with dense indices within `radius`
pub fn find_neighbors(particles: &mut [Particle], index: Option<&mut SpatialIndex>, radius: f32, include_self: bool) {
    let index: Option<&SpatialIndex> = match index {
        Some(index) => {
            for (i, particle) in particles.iter().enumerate() {
                if particle.is_fluid {
                    index.insert(i, particle.pos);
                }
            }
            Some(index)
        }
        None => None,
    };

    for i in 0..particles.len() {
        if !particles[i].is_fluid {
            continue;
        }

        // Take the list out so the query can borrow every particle immutably
        let mut neighbors = std::mem::take(&mut particles[i].fluid_neighbors);
        neighbors.clear();
        let position = particles[i].pos;

        match index {
            Some(index) => index.query_neighbors(position, radius, particles, &mut neighbors),
            None => brute_force_neighbors(position, radius, particles, &mut neighbors),
        }
        if !include_self {
            neighbors.retain(|&j| j != i);
        }

        particles[i].fluid_neighbors = neighbors;
    }
}

pub fn compute_density_pressure(particles: &mut [Particle], kernel: &SphKernel, fluid: &FluidProperties) {
    for i in 0..particles.len() {
        if !particles[i].is_fluid {
            continue;
        }

        let position = particles[i].pos;
        let density: f32 = particles[i]
            .fluid_neighbors
            .iter()
            .map(|&j| {
                let other = &particles[j];
                other.mass * kernel.density_weight(position.distance_squared_to(other.pos))
            })
            .sum();

        // Clamp to rest density so pressure never turns tensile
        let particle = &mut particles[i];
        particle.fluid_density = (particle.fluid_density + density).max(fluid.rest_density);
        particle.fluid_pressure = fluid.pressure_stiffness * (particle.fluid_density - fluid.rest_density);
    }
}

pub fn accumulate_forces(particles: &mut [Particle], kernel: &SphKernel, fluid: &FluidProperties) {
    let mut skipped = 0usize;

    for i in 0..particles.len() {
        if !particles[i].is_fluid {
            continue;
        }

        let current = &particles[i];
        let mut force = Vector2::ZERO;

        for &j in &current.fluid_neighbors {
            if j == i {
                continue;
            }
            let other = &particles[j];
            let offset = other.pos - current.pos;
            let distance = offset.magnitude();

            // Co-located pairs have no direction; only the pressure term needs one
            match offset.unit_vector() {
                Some(direction) => {
                    let magnitude = other.mass * (current.fluid_pressure + other.fluid_pressure)
                        / (2.0 * other.fluid_density)
                        * kernel.pressure_gradient(distance);
                    force += direction * magnitude;
                }
                None => skipped += 1,
            }

            let relative_velocity = other.vel - current.vel;
            force += relative_velocity
                * (other.mass / other.fluid_density * kernel.viscosity_laplacian(distance) * fluid.viscosity);
        }

        particles[i].force += force;
    }

    if skipped > 0 {
        trace!("Skipped pressure term for {} co-located fluid pairs", skipped);
    }
}

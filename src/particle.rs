/*
 * Particle Module
 *
 * This module defines the Particle struct, a point mass advanced with
 * Störmer-Verlet integration. Velocity is implicit in the difference between
 * the current and previous positions; the explicit `vel` field is recomputed
 * once per step after constraint resolution and feeds boundary restitution
 * and the SPH viscosity term.
 *
 * Fluid particles additionally carry their SPH neighbour list (dense indices
 * into the world's particle list, valid for the current step only), the
 * interpolated density and the derived pressure.
 */

use crate::element::{Lifecycle, WorldElement};
use crate::error::{require_positive, SimError, SimResult};
use crate::vector::Vector2;

pub const DEFAULT_RESTITUTION: f32 = 0.3;

/// Stable identity of a particle. Handles are never reused, so a handle to a
/// deleted particle stays invalid forever.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ParticleHandle(pub(crate) u64);

impl ParticleHandle {
    pub fn id(&self) -> u64 {
        self.0
    }
}

#[derive(Clone, Debug)]
pub struct Particle {
    pub(crate) handle: ParticleHandle,
    pub(crate) life: Lifecycle,
    pub(crate) mass: f32,
    pub(crate) inv_mass: f32,
    pub radius: f32,
    pub fixed: bool,
    pub pos: Vector2,
    pub pos_previous: Vector2,
    pub vel: Vector2,
    pub acc: Vector2,
    pub force: Vector2,
    pub collides: bool,
    pub restitution: f32,
    pub is_fluid: bool,
    pub fluid_neighbors: Vec<usize>,
    pub fluid_density: f32,
    pub fluid_pressure: f32,
}

impl Particle {
    // Create a particle at rest history (pos_previous == pos); mass and radius must be positive
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        handle: ParticleHandle,
        pos: Vector2,
        vel: Vector2,
        acc: Vector2,
        force: Vector2,
        mass: f32,
        radius: f32,
        fixed: bool,
    ) -> SimResult<Self> {
        let mass = require_positive("mass", mass)?;
        let radius = require_positive("radius", radius)?;
        if !pos.is_finite() {
            return Err(SimError::InvalidParameter { name: "position", value: f32::NAN });
        }
        if !vel.is_finite() {
            return Err(SimError::InvalidParameter { name: "velocity", value: f32::NAN });
        }
        if !acc.is_finite() || !force.is_finite() {
            return Err(SimError::InvalidParameter { name: "acceleration", value: f32::NAN });
        }

        Ok(Self {
            handle,
            life: Lifecycle::immortal(),
            mass,
            inv_mass: 1.0 / mass,
            radius,
            fixed,
            pos,
            pos_previous: pos,
            vel,
            acc,
            force,
            collides: true,
            restitution: DEFAULT_RESTITUTION,
            is_fluid: false,
            fluid_neighbors: Vec::new(),
            fluid_density: 0.0,
            fluid_pressure: 0.0,
        })
    }

    #[inline]
    pub fn handle(&self) -> ParticleHandle {
        self.handle
    }

    #[inline]
    pub fn mass(&self) -> f32 {
        self.mass
    }

    #[inline]
    pub fn inv_mass(&self) -> f32 {
        self.inv_mass
    }

    // Mass and inverse mass change together; mass must stay positive
    pub fn set_mass(&mut self, mass: f32) -> SimResult<()> {
        self.mass = require_positive("mass", mass)?;
        self.inv_mass = 1.0 / self.mass;
        Ok(())
    }

    // Zero the per-step accumulators; neighbour storage is kept for reuse
    #[inline]
    pub fn reset_for_step(&mut self) {
        self.force.set_zero();
        self.acc.set_zero();
        self.fluid_density = 0.0;
        self.fluid_neighbors.clear();
    }

    // Störmer-Verlet: x' = 2x - x_prev + a*dt^2, with a = acc + force / m
    pub fn integrate(&mut self, dt: f32) {
        if self.fixed {
            self.pos_previous.set_to(self.pos);
            return;
        }

        let mut acceleration = self.acc;
        acceleration += self.force * self.inv_mass;
        self.acc.set_to(acceleration);

        let scratch = self.pos;
        let mut next = self.pos * 2.0;
        next -= self.pos_previous;
        next += acceleration * (dt * dt);

        self.pos.set_to(next);
        self.pos_previous.set_to(scratch);
    }

    #[inline]
    pub fn calculate_velocity(&mut self, dt: f32) {
        self.vel = (self.pos - self.pos_previous) / dt;
    }

    // Reflect and clamp against the four walls of [0,width]x[0,height], then
    // rebuild pos_previous from the corrected velocity to keep Verlet state consistent
    pub fn resolve_boundary(&mut self, width: f32, height: f32, dt: f32) {
        if self.fixed {
            return;
        }

        if self.pos.y + self.radius > height {
            self.vel.y = -self.restitution * self.vel.y;
            self.pos.y = height - self.radius;
        } else if self.pos.y - self.radius < 0.0 {
            self.vel.y = -self.restitution * self.vel.y;
            self.pos.y = self.radius;
        }

        if self.pos.x + self.radius > width {
            self.vel.x = -self.restitution * self.vel.x;
            self.pos.x = width - self.radius;
        } else if self.pos.x - self.radius < 0.0 {
            self.vel.x = -self.restitution * self.vel.x;
            self.pos.x = self.radius;
        }

        self.pos_previous = self.pos - self.vel * dt;
    }
}

impl WorldElement for Particle {
    fn lifecycle(&self) -> &Lifecycle {
        &self.life
    }

    fn lifecycle_mut(&mut self) -> &mut Lifecycle {
        &mut self.life
    }
}

/*
 * World Module
 *
 * This module defines the World, which owns every particle and constraint
 * together with the spatial index, and advances the simulation one fixed
 * timestep per update() call. Each step runs five phases in order:
 * 1. Clean up: clear the index, age and prune expired elements, reset accumulators
 * 2. Accumulate forces: gravity, then SPH pressure and viscosity
 * 3. Detect collisions: overlapping pairs get a one-step contact constraint
 * 4. Resolve constraints: Gauss-Seidel sweeps, boundary restitution, break pruning
 * 5. Integrate: Verlet positions from the accumulated acceleration
 *
 * Particles are kept densely in creation order, so handles (which only ever
 * increase) stay sorted and can be found by binary search. Constraints hold
 * particle handles; they are resolved to dense indices once per solve.
 */

use log::{debug, info, trace, warn};

use crate::constraint::{Constraint, ConstraintHandle, ConstraintKind, Link, DEFAULT_STIFFNESS};
use crate::element::WorldElement;
use crate::error::{require_positive, require_unit_interval, HandleKind, SimError, SimResult};
use crate::fluid::{compute_fluid_forces, SphKernel};
use crate::params::SimulationParams;
use crate::particle::{Particle, ParticleHandle};
use crate::spatial_grid::{CellInfo, SpatialIndex};
use crate::vector::Vector2;

pub struct World {
    params: SimulationParams,
    kernel: SphKernel,
    particles: Vec<Particle>,
    constraints: Vec<Constraint>,
    index: Option<SpatialIndex>,
    // Pairs found overlapping during the current step
    collisions: Vec<(ParticleHandle, ParticleHandle)>,
    // Dense indices for each constraint, rebuilt once per solve
    links: Vec<Link>,
    next_particle_id: u64,
    next_constraint_id: u64,
    time: f64,
    step_count: u64,
}

#[inline]
fn next_id(counter: &mut u64) -> u64 {
    let id = *counter;
    *counter += 1;
    id
}

#[inline]
fn find(particles: &[Particle], handle: ParticleHandle) -> Option<usize> {
    particles.binary_search_by_key(&handle, |p| p.handle).ok()
}

fn link_for(particles: &[Particle], constraint: &Constraint) -> Option<Link> {
    match constraint.particles() {
        (p1, Some(p2)) => Some(Link::Pair(find(particles, p1)?, find(particles, p2)?)),
        (p1, None) => Some(Link::Single(find(particles, p1)?)),
    }
}

impl World {
    // Create an empty world over [0,width]x[0,height] with default SPH constants
    pub fn new(width: f32, height: f32, timestep: f32, solver_iterations: u32) -> SimResult<Self> {
        Self::with_params(SimulationParams::with_domain(width, height, timestep, solver_iterations))
    }

    pub fn with_params(params: SimulationParams) -> SimResult<Self> {
        params.validate()?;
        let kernel = SphKernel::new(params.smoothing_length)?;
        let index = SpatialIndex::for_mode(params.partition_mode, params.smoothing_length, params.width, params.height)?;

        info!(
            "Created {}x{} world: dt = {}, {} solver iterations, {} neighbour search",
            params.width, params.height, params.timestep, params.solver_iterations, params.partition_mode
        );

        Ok(Self {
            params,
            kernel,
            particles: Vec::new(),
            constraints: Vec::new(),
            index,
            collisions: Vec::new(),
            links: Vec::new(),
            next_particle_id: 0,
            next_constraint_id: 0,
            time: 0.0,
            step_count: 0,
        })
    }

    // Replace the configuration between steps, rebuilding derived state only when needed.
    // On error the world is left unchanged.
    pub fn set_params(&mut self, params: SimulationParams) -> SimResult<()> {
        params.validate()?;

        let kernel = if params.smoothing_length != self.params.smoothing_length {
            Some(SphKernel::new(params.smoothing_length)?)
        } else {
            None
        };
        let index = if params.index_layout_differs(&self.params) {
            Some(SpatialIndex::for_mode(params.partition_mode, params.smoothing_length, params.width, params.height)?)
        } else {
            None
        };

        if let Some(kernel) = kernel {
            self.kernel = kernel;
            info!("Recomputed SPH kernel for smoothing length {}", params.smoothing_length);
        }
        if let Some(index) = index {
            self.index = index;
            if params.partition_mode != self.params.partition_mode {
                info!("Neighbour search switched to {}", params.partition_mode);
            }
        }

        self.params = params;
        Ok(())
    }

    /*
     * Entity creation
     */

    // Create a free or fixed particle; the initial velocity is encoded into the Verlet history
    #[allow(clippy::too_many_arguments)]
    pub fn create_particle(
        &mut self,
        x: f32,
        y: f32,
        vx: f32,
        vy: f32,
        ax: f32,
        ay: f32,
        fx: f32,
        fy: f32,
        mass: f32,
        radius: f32,
        fixed: bool,
    ) -> SimResult<ParticleHandle> {
        let handle = ParticleHandle(self.next_particle_id);
        let velocity = Vector2::new(vx, vy);
        let mut particle = Particle::new(
            handle,
            Vector2::new(x, y),
            velocity,
            Vector2::new(ax, ay),
            Vector2::new(fx, fy),
            mass,
            radius,
            fixed,
        )?;
        if !fixed {
            particle.pos_previous = particle.pos - velocity * self.params.timestep;
        }
        particle.restitution = self.params.default_restitution;

        self.next_particle_id += 1;
        self.particles.push(particle);
        debug!("Created particle {} at ({}, {})", handle.id(), x, y);
        Ok(handle)
    }

    // Target distance defaults to the current separation, stiffness to 0.9
    pub fn create_distance_constraint(
        &mut self,
        p1: ParticleHandle,
        p2: ParticleHandle,
        distance: Option<f32>,
        stiffness: Option<f32>,
    ) -> SimResult<ConstraintHandle> {
        let a = self.particle(p1).ok_or(SimError::InvalidHandle(HandleKind::Particle))?;
        let b = self.particle(p2).ok_or(SimError::InvalidHandle(HandleKind::Particle))?;
        let current_distance = a.pos.distance_to(b.pos);

        let handle = ConstraintHandle(self.next_constraint_id);
        let constraint = Constraint::distance(
            handle,
            p1,
            p2,
            current_distance,
            distance.unwrap_or(current_distance),
            stiffness.unwrap_or(DEFAULT_STIFFNESS),
        )?;
        Ok(self.push_constraint(constraint))
    }

    // Anchor defaults to the particle's current position, stiffness to 0.9
    pub fn create_point_constraint(
        &mut self,
        p1: ParticleHandle,
        x: Option<f32>,
        y: Option<f32>,
        stiffness: Option<f32>,
    ) -> SimResult<ConstraintHandle> {
        let particle = self.particle(p1).ok_or(SimError::InvalidHandle(HandleKind::Particle))?;
        let anchor = Vector2::new(x.unwrap_or(particle.pos.x), y.unwrap_or(particle.pos.y));

        let handle = ConstraintHandle(self.next_constraint_id);
        let constraint = Constraint::point(handle, p1, anchor, stiffness.unwrap_or(DEFAULT_STIFFNESS))?;
        Ok(self.push_constraint(constraint))
    }

    // One-step contact between two particles, as collision detection creates them
    pub fn create_particle_contact_constraint(&mut self, p1: ParticleHandle, p2: ParticleHandle) -> SimResult<ConstraintHandle> {
        if p1 == p2 {
            return Err(SimError::DegenerateGeometry);
        }
        let a = self.particle(p1).ok_or(SimError::InvalidHandle(HandleKind::Particle))?;
        let b = self.particle(p2).ok_or(SimError::InvalidHandle(HandleKind::Particle))?;

        let constraint = Constraint::contact(ConstraintHandle(self.next_constraint_id), a, b);
        Ok(self.push_constraint(constraint))
    }

    fn push_constraint(&mut self, constraint: Constraint) -> ConstraintHandle {
        let handle = constraint.handle();
        self.next_constraint_id += 1;
        if !constraint.is_contact() {
            debug!("Created constraint {}", handle.id());
        }
        self.constraints.push(constraint);
        handle
    }

    /*
     * Entity deletion
     */

    pub fn delete_particle(&mut self, handle: ParticleHandle) -> SimResult<()> {
        let index = self.index_of(handle).ok_or(SimError::InvalidHandle(HandleKind::Particle))?;
        self.remove_particle_at(index);
        Ok(())
    }

    pub fn delete_particle_by_index(&mut self, index: usize) -> SimResult<()> {
        if index >= self.particles.len() {
            return Err(SimError::InvalidHandle(HandleKind::Particle));
        }
        self.remove_particle_at(index);
        Ok(())
    }

    // Remove a particle, every constraint that refers to it, and its entries in neighbour lists
    fn remove_particle_at(&mut self, index: usize) {
        let removed = self.particles.remove(index);
        let handle = removed.handle;

        let before = self.constraints.len();
        self.constraints.retain(|c| !c.involves(handle));
        let cascaded = before - self.constraints.len();

        for particle in &mut self.particles {
            particle.fluid_neighbors.retain(|&j| j != index);
            for j in &mut particle.fluid_neighbors {
                if *j > index {
                    *j -= 1;
                }
            }
        }
        self.collisions.retain(|&(a, b)| a != handle && b != handle);

        debug!("Deleted particle {} and {} dependent constraints", handle.id(), cascaded);
    }

    pub fn delete_constraint(&mut self, handle: ConstraintHandle) -> SimResult<()> {
        let index = self
            .constraints
            .iter()
            .position(|c| c.handle == handle)
            .ok_or(SimError::InvalidHandle(HandleKind::Constraint))?;
        self.constraints.remove(index);
        debug!("Deleted constraint {}", handle.id());
        Ok(())
    }

    /*
     * Mutation by handle
     */

    fn particle_or_err(&mut self, handle: ParticleHandle) -> SimResult<&mut Particle> {
        self.particle_mut(handle).ok_or(SimError::InvalidHandle(HandleKind::Particle))
    }

    fn constraint_or_err(&mut self, handle: ConstraintHandle) -> SimResult<&mut Constraint> {
        self.constraint_mut(handle).ok_or(SimError::InvalidHandle(HandleKind::Constraint))
    }

    pub fn set_fluid(&mut self, handle: ParticleHandle, is_fluid: bool) -> SimResult<()> {
        self.particle_or_err(handle)?.is_fluid = is_fluid;
        Ok(())
    }

    pub fn set_collides(&mut self, handle: ParticleHandle, collides: bool) -> SimResult<()> {
        self.particle_or_err(handle)?.collides = collides;
        Ok(())
    }

    pub fn set_mass(&mut self, handle: ParticleHandle, mass: f32) -> SimResult<()> {
        self.particle_or_err(handle)?.set_mass(mass)
    }

    pub fn set_restitution(&mut self, handle: ParticleHandle, restitution: f32) -> SimResult<()> {
        let restitution = require_unit_interval("restitution", restitution)?;
        self.particle_or_err(handle)?.restitution = restitution;
        Ok(())
    }

    pub fn set_particle_lifetime(&mut self, handle: ParticleHandle, lifetime: Option<u32>) -> SimResult<()> {
        self.particle_or_err(handle)?.set_lifetime(lifetime);
        Ok(())
    }

    pub fn set_constraint_lifetime(&mut self, handle: ConstraintHandle, lifetime: Option<u32>) -> SimResult<()> {
        self.constraint_or_err(handle)?.set_lifetime(lifetime);
        Ok(())
    }

    // Make a constraint breakable at the given strain (raw distance for point constraints)
    pub fn set_breakable(&mut self, handle: ConstraintHandle, breaking_strain: f32) -> SimResult<()> {
        let breaking_strain = require_positive("breaking_strain", breaking_strain)?;
        let constraint = self.constraint_or_err(handle)?;
        constraint.breakable = true;
        constraint.breaking_strain = breaking_strain;
        Ok(())
    }

    // Move the anchor of a point constraint, e.g. to follow the pointer
    pub fn set_anchor(&mut self, handle: ConstraintHandle, x: f32, y: f32) -> SimResult<()> {
        let anchor = Vector2::new(x, y);
        if !anchor.is_finite() {
            return Err(SimError::InvalidParameter { name: "anchor", value: f32::NAN });
        }
        match &mut self.constraint_or_err(handle)?.kind {
            ConstraintKind::Point(point) => {
                point.anchor = anchor;
                Ok(())
            }
            _ => Err(SimError::InvalidHandle(HandleKind::Constraint)),
        }
    }

    /*
     * Stepping
     */

    // Advance the simulation by exactly one timestep
    pub fn update(&mut self) {
        self.clean_up();
        self.accumulate_forces();
        self.detect_collisions();
        self.resolve_constraints();
        self.integrate();

        self.time += self.params.timestep as f64;
        self.step_count += 1;

        trace!(
            "Step {}: {} particles, {} constraints, {} contacts",
            self.step_count,
            self.particles.len(),
            self.constraints.len(),
            self.collisions.len()
        );
    }

    fn clean_up(&mut self) {
        if let Some(index) = self.index.as_mut() {
            index.clear();
        }
        self.collisions.clear();

        self.constraints.retain_mut(|c| !c.lifecycle_mut().advance());

        let mut expired = Vec::new();
        for particle in &mut self.particles {
            if particle.life.advance() {
                expired.push(particle.handle);
            } else {
                particle.reset_for_step();
            }
        }

        if !expired.is_empty() {
            // Survivors' neighbour lists are already empty, so no index fix-up is needed
            self.particles.retain(|p| !p.has_expired());
            self.constraints.retain(|c| !expired.iter().any(|&h| c.involves(h)));
            debug!("{} particles reached the end of their lifetime", expired.len());
        }
    }

    fn accumulate_forces(&mut self) {
        let gravity = self.params.gravity;
        for particle in &mut self.particles {
            particle.acc += gravity;
        }

        let fluid = self.params.fluid_properties();
        compute_fluid_forces(&mut self.particles, self.index.as_mut(), &self.kernel, &fluid);
    }

    fn detect_collisions(&mut self) {
        if !self.params.particle_collisions {
            return;
        }

        let particles = &self.particles;
        for i in 0..particles.len() {
            let a = &particles[i];
            if !a.collides {
                continue;
            }
            for b in &particles[i + 1..] {
                if !b.collides {
                    continue;
                }
                let reach = a.radius + b.radius;
                if a.pos.distance_squared_to(b.pos) < reach * reach {
                    let handle = ConstraintHandle(next_id(&mut self.next_constraint_id));
                    self.constraints.push(Constraint::contact(handle, a, b));
                    self.collisions.push((a.handle, b.handle));
                }
            }
        }
    }

    fn resolve_constraints(&mut self) {
        let iterations = self.params.solver_iterations;
        self.resolve_links();

        // Gauss-Seidel: every sweep sees the corrections of the previous constraints
        for _ in 0..iterations {
            for (constraint, &link) in self.constraints.iter_mut().zip(&self.links) {
                constraint.enforce(&mut self.particles, link, iterations);
            }
        }

        let dt = self.params.timestep;
        let (width, height) = (self.params.width, self.params.height);
        for particle in &mut self.particles {
            particle.calculate_velocity(dt);
            if self.params.boundary_collisions {
                particle.resolve_boundary(width, height, dt);
            }
        }

        let particles = &self.particles;
        let mut links = self.links.iter();
        self.constraints.retain_mut(|c| {
            let broken = links.next().is_some_and(|&link| c.has_broken(particles, link));
            if broken {
                debug!("Constraint {} broke", c.handle.id());
            }
            !broken
        });
    }

    // Resolve handles to dense indices, dropping any constraint whose particle is gone
    fn resolve_links(&mut self) {
        let particles = &self.particles;
        let links = &mut self.links;
        links.clear();
        self.constraints.retain(|c| match link_for(particles, c) {
            Some(link) => {
                links.push(link);
                true
            }
            None => {
                warn!("Dropping constraint {} that refers to a deleted particle", c.handle.id());
                false
            }
        });
    }

    fn integrate(&mut self) {
        let dt = self.params.timestep;
        for particle in &mut self.particles {
            particle.integrate(dt);
        }
    }

    /*
     * Introspection
     */

    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    pub fn kernel(&self) -> &SphKernel {
        &self.kernel
    }

    pub fn width(&self) -> f32 {
        self.params.width
    }

    pub fn height(&self) -> f32 {
        self.params.height
    }

    pub fn timestep(&self) -> f32 {
        self.params.timestep
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn collisions(&self) -> &[(ParticleHandle, ParticleHandle)] {
        &self.collisions
    }

    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    pub fn contact_count(&self) -> usize {
        self.constraints.iter().filter(|c| c.is_contact()).count()
    }

    pub fn index_of(&self, handle: ParticleHandle) -> Option<usize> {
        find(&self.particles, handle)
    }

    pub fn particle(&self, handle: ParticleHandle) -> Option<&Particle> {
        self.index_of(handle).map(|i| &self.particles[i])
    }

    pub fn particle_mut(&mut self, handle: ParticleHandle) -> Option<&mut Particle> {
        let index = self.index_of(handle)?;
        Some(&mut self.particles[index])
    }

    pub fn constraint(&self, handle: ConstraintHandle) -> Option<&Constraint> {
        self.constraints.iter().find(|c| c.handle == handle)
    }

    pub fn constraint_mut(&mut self, handle: ConstraintHandle) -> Option<&mut Constraint> {
        self.constraints.iter_mut().find(|c| c.handle == handle)
    }

    pub fn spatial_index(&self) -> Option<&SpatialIndex> {
        self.index.as_ref()
    }

    // Bucket layout of the neighbour search as of the last step, for visualisation
    pub fn spatial_layout(&self) -> Option<Vec<CellInfo>> {
        self.index.as_ref().map(SpatialIndex::layout)
    }

    // Closest particle strictly within `max_radius` of (x, y)
    pub fn nearest_particle(&self, x: f32, y: f32, max_radius: f32) -> Option<ParticleHandle> {
        let point = Vector2::new(x, y);
        let max_sq = max_radius * max_radius;
        self.particles
            .iter()
            .map(|p| (p.handle, p.pos.distance_squared_to(point)))
            .filter(|&(_, d)| d < max_sq)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(handle, _)| handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial_grid::PartitionMode;
    use approx::assert_abs_diff_eq;

    fn world() -> World {
        World::new(10.0, 10.0, 0.01, 10).unwrap()
    }

    fn particle(world: &mut World, x: f32, y: f32) -> ParticleHandle {
        world.create_particle(x, y, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.1, false).unwrap()
    }

    #[test]
    fn construction_rejects_bad_domain() {
        assert_eq!(
            World::new(10.0, 10.0, 0.0, 10).err(),
            Some(SimError::InvalidParameter { name: "timestep", value: 0.0 })
        );
        assert!(World::new(-1.0, 10.0, 0.01, 10).is_err());
        assert!(World::new(10.0, 10.0, 0.01, 0).is_err());
    }

    #[test]
    fn construction_rejects_unpartitionable_domain() {
        let too_fine = |result: SimResult<World>| {
            matches!(result, Err(SimError::InvalidParameter { name: "smoothing_length", .. }))
        };
        assert!(too_fine(World::new(1.0e20, 1.0e20, 0.01, 10)));
        assert!(too_fine(World::with_params(SimulationParams {
            smoothing_length: 1.0e-12,
            ..SimulationParams::default()
        })));
        assert!(too_fine(World::with_params(SimulationParams {
            smoothing_length: 1.0e-4,
            ..SimulationParams::default()
        })));
    }

    #[test]
    fn rejected_params_leave_the_world_unchanged() {
        let mut world = world();
        let before = world.params().clone();
        let huge = SimulationParams { width: 1.0e20, height: 1.0e20, smoothing_length: 0.5, ..before.clone() };
        assert!(world.set_params(huge).is_err());
        assert_eq!(world.params(), &before);
        assert_eq!(world.kernel().smoothing_length, 1.0);
        assert_eq!(world.spatial_index().map(|i| i.cell_size()), Some(1.0));
        world.update();
    }

    #[test]
    fn non_finite_velocity_is_rejected() {
        let mut world = world();
        assert!(matches!(
            world.create_particle(1.0, 1.0, f32::NAN, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.1, false),
            Err(SimError::InvalidParameter { name: "velocity", .. })
        ));
        assert!(world.create_particle(1.0, 1.0, 0.0, f32::INFINITY, 0.0, 0.0, 0.0, 0.0, 1.0, 0.1, false).is_err());
        assert_eq!(world.particle_count(), 0);
    }

    #[test]
    fn mass_is_changed_through_a_validated_setter() {
        let mut world = world();
        let a = particle(&mut world, 1.0, 1.0);
        world.set_mass(a, 4.0).unwrap();
        assert_eq!(world.particle(a).unwrap().inv_mass(), 0.25);
        assert!(world.set_mass(a, -1.0).is_err());
        assert_eq!(world.particle(a).unwrap().mass(), 4.0);
    }

    #[test]
    fn breakable_point_constraint_breaks_on_raw_distance() {
        let mut world = world();
        world.set_params(SimulationParams { gravity: Vector2::ZERO, ..world.params().clone() }).unwrap();
        let a = particle(&mut world, 5.0, 5.0);
        let c = world.create_point_constraint(a, None, None, Some(0.1)).unwrap();
        world.set_breakable(c, 0.5).unwrap();

        // A weak constraint leaves 90% of the gap after one step
        world.set_anchor(c, 5.3, 5.0).unwrap();
        world.update();
        let gap = world.particle(a).unwrap().pos_previous.distance_to(Vector2::new(5.3, 5.0));
        assert!(gap <= 0.5);
        assert!(world.constraint(c).is_some());

        world.set_anchor(c, 8.0, 5.0).unwrap();
        world.update();
        let gap = world.particle(a).unwrap().pos_previous.distance_to(Vector2::new(8.0, 5.0));
        assert!(gap > 0.5);
        assert!(world.constraint(c).is_none());
    }

    #[test]
    fn handles_are_never_reused() {
        let mut world = world();
        let a = particle(&mut world, 1.0, 1.0);
        world.delete_particle(a).unwrap();
        let b = particle(&mut world, 1.0, 1.0);
        assert_ne!(a, b);
        assert!(world.particle(a).is_none());
        assert_eq!(world.delete_particle(a), Err(SimError::InvalidHandle(HandleKind::Particle)));
    }

    #[test]
    fn initial_velocity_is_honoured() {
        let mut world = world();
        world.set_params(SimulationParams { gravity: Vector2::ZERO, ..world.params().clone() }).unwrap();
        let p = world.create_particle(5.0, 5.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.1, false).unwrap();
        world.update();
        assert_abs_diff_eq!(world.particle(p).unwrap().pos.x, 5.01, epsilon = 1e-5);
    }

    #[test]
    fn defaults_for_distance_constraint() {
        let mut world = world();
        let a = particle(&mut world, 1.0, 1.0);
        let b = particle(&mut world, 4.0, 5.0);
        let c = world.create_distance_constraint(a, b, None, None).unwrap();
        match &world.constraint(c).unwrap().kind {
            ConstraintKind::Distance(d) => {
                assert_abs_diff_eq!(d.distance, 5.0);
                assert_eq!(d.stiffness, DEFAULT_STIFFNESS);
            }
            other => panic!("unexpected constraint {:?}", other),
        }
    }

    #[test]
    fn defaults_for_point_constraint() {
        let mut world = world();
        let a = particle(&mut world, 2.0, 3.0);
        let c = world.create_point_constraint(a, None, Some(7.0), None).unwrap();
        assert_eq!(world.constraint(c).unwrap().anchor(), Some(Vector2::new(2.0, 7.0)));
        world.set_anchor(c, 4.0, 4.0).unwrap();
        assert_eq!(world.constraint(c).unwrap().anchor(), Some(Vector2::new(4.0, 4.0)));
    }

    #[test]
    fn anchor_cannot_be_set_on_distance_constraint() {
        let mut world = world();
        let a = particle(&mut world, 1.0, 1.0);
        let b = particle(&mut world, 2.0, 1.0);
        let c = world.create_distance_constraint(a, b, None, None).unwrap();
        assert!(world.set_anchor(c, 0.0, 0.0).is_err());
    }

    #[test]
    fn zero_length_distance_constraint_is_rejected() {
        let mut world = world();
        let a = particle(&mut world, 1.0, 1.0);
        let b = particle(&mut world, 1.0, 1.0);
        assert!(matches!(
            world.create_distance_constraint(a, b, None, None),
            Err(SimError::InvalidParameter { name: "distance", .. })
        ));
        assert_eq!(world.create_distance_constraint(a, a, Some(1.0), None), Err(SimError::DegenerateGeometry));
    }

    #[test]
    fn deleting_a_particle_cascades_to_its_constraints() {
        let mut world = world();
        let a = particle(&mut world, 1.0, 1.0);
        let b = particle(&mut world, 2.0, 1.0);
        let c = particle(&mut world, 3.0, 1.0);
        world.create_distance_constraint(a, b, None, None).unwrap();
        let kept = world.create_distance_constraint(b, c, None, None).unwrap();
        world.create_point_constraint(a, None, None, None).unwrap();

        world.delete_particle(a).unwrap();
        assert_eq!(world.constraint_count(), 1);
        assert!(world.constraint(kept).is_some());
        assert_eq!(world.index_of(c), Some(1));
    }

    #[test]
    fn deleting_by_index_fixes_neighbour_lists() {
        let mut world = world();
        let handles: Vec<_> = (0..3).map(|i| particle(&mut world, 1.0 + 0.2 * i as f32, 1.0)).collect();
        for h in &handles {
            world.set_fluid(*h, true).unwrap();
        }
        world.update();
        world.delete_particle_by_index(1).unwrap();

        for p in world.particles() {
            assert!(p.fluid_neighbors.iter().all(|&j| j < world.particle_count()));
        }
        let last = world.particle(handles[2]).unwrap();
        assert!(last.fluid_neighbors.contains(&1));
        assert!(world.delete_particle_by_index(5).is_err());
    }

    #[test]
    fn contacts_live_for_one_step() {
        let mut world = world();
        let a = particle(&mut world, 5.0, 5.0);
        let b = particle(&mut world, 5.15, 5.0);
        world.set_params(SimulationParams { gravity: Vector2::ZERO, ..world.params().clone() }).unwrap();
        world.update();
        assert_eq!(world.collisions(), &[(a, b)]);
        assert_eq!(world.contact_count(), 1);

        // The old contact is pruned and, with `a` no longer colliding, none replaces it
        world.set_collides(a, false).unwrap();
        world.update();
        assert_eq!(world.contact_count(), 0);
        assert!(world.collisions().is_empty());
    }

    #[test]
    fn particle_collisions_can_be_disabled() {
        let mut world = world();
        particle(&mut world, 5.0, 5.0);
        particle(&mut world, 5.05, 5.0);
        world.set_params(SimulationParams { particle_collisions: false, ..world.params().clone() }).unwrap();
        world.update();
        assert_eq!(world.contact_count(), 0);
    }

    #[test]
    fn expired_particles_take_their_constraints() {
        let mut world = world();
        let a = particle(&mut world, 1.0, 1.0);
        let b = particle(&mut world, 3.0, 1.0);
        world.create_distance_constraint(a, b, None, None).unwrap();
        world.set_particle_lifetime(a, Some(2)).unwrap();

        world.update();
        assert_eq!(world.particle_count(), 2);
        world.update();
        assert_eq!(world.particle_count(), 1);
        assert_eq!(world.constraint_count(), 0);
    }

    #[test]
    fn expired_constraints_are_pruned() {
        let mut world = world();
        let a = particle(&mut world, 1.0, 1.0);
        let c = world.create_point_constraint(a, None, None, None).unwrap();
        world.set_constraint_lifetime(c, Some(3)).unwrap();
        for _ in 0..2 {
            world.update();
        }
        assert!(world.constraint(c).is_some());
        world.update();
        assert!(world.constraint(c).is_none());
    }

    #[test]
    fn time_and_step_count_advance() {
        let mut world = world();
        for _ in 0..100 {
            world.update();
        }
        assert_eq!(world.step_count(), 100);
        assert_abs_diff_eq!(world.time(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn set_params_rebuilds_the_index() {
        let mut world = world();
        assert_eq!(world.spatial_index().map(|i| i.mode()), Some(PartitionMode::Grid));

        let params = SimulationParams { partition_mode: PartitionMode::Hash, smoothing_length: 0.5, ..world.params().clone() };
        world.set_params(params).unwrap();
        assert_eq!(world.spatial_index().map(|i| i.mode()), Some(PartitionMode::Hash));
        assert_eq!(world.kernel().smoothing_length, 0.5);

        let params = SimulationParams { partition_mode: PartitionMode::None, ..world.params().clone() };
        world.set_params(params).unwrap();
        assert!(world.spatial_index().is_none());
        assert!(world.spatial_layout().is_none());

        let invalid = SimulationParams { smoothing_length: -1.0, ..world.params().clone() };
        assert!(world.set_params(invalid).is_err());
        assert_eq!(world.kernel().smoothing_length, 0.5);
    }

    #[test]
    fn nearest_particle_within_radius() {
        let mut world = world();
        let a = particle(&mut world, 1.0, 1.0);
        let b = particle(&mut world, 1.5, 1.0);
        assert_eq!(world.nearest_particle(1.4, 1.0, 1.0), Some(b));
        assert_eq!(world.nearest_particle(0.9, 1.0, 1.0), Some(a));
        assert_eq!(world.nearest_particle(8.0, 8.0, 1.0), None);
    }

    #[test]
    fn breakable_requires_positive_strain() {
        let mut world = world();
        let a = particle(&mut world, 1.0, 1.0);
        let c = world.create_point_constraint(a, None, None, None).unwrap();
        assert!(world.set_breakable(c, 0.0).is_err());
        world.set_breakable(c, 0.5).unwrap();
        assert!(world.constraint(c).unwrap().breakable);
    }
}

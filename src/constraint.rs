/*
 * Constraint Module
 *
 * This module defines the constraint variants enforced by the iterative solver:
 * - Distance: keeps two particles at a target separation
 * - Contact: a one-sided distance constraint created for a single step when two
 *   particles overlap, resolving penetration only
 * - Point: pulls one particle toward a free-floating anchor (e.g. a pointer drag)
 *
 * Constraints refer to particles by handle. The world resolves handles to dense
 * indices once per solve (see `Link`), so enforcement works directly on the
 * particle slice without any lookups in the inner loop.
 */

use log::warn;

use crate::element::{Lifecycle, WorldElement};
use crate::error::{require_positive, SimError, SimResult};
use crate::particle::{Particle, ParticleHandle};
use crate::vector::Vector2;

pub const DEFAULT_STIFFNESS: f32 = 0.9;
pub const CONTACT_STIFFNESS: f32 = 0.9;
pub const DEFAULT_BREAKING_STRAIN: f32 = 2.0;

// Separation axis used when both ends of a distance constraint coincide
const COINCIDENT_AXIS: Vector2 = Vector2::new(1.0, 0.0);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConstraintHandle(pub(crate) u64);

impl ConstraintHandle {
    pub fn id(&self) -> u64 {
        self.0
    }
}

#[derive(Clone, Debug)]
pub struct DistanceConstraint {
    pub p1: ParticleHandle,
    pub p2: ParticleHandle,
    pub distance: f32,
    pub stiffness: f32,
    pub current_distance: f32,
}

#[derive(Clone, Debug)]
pub struct PointConstraint {
    pub p1: ParticleHandle,
    pub anchor: Vector2,
    pub stiffness: f32,
}

#[derive(Clone, Debug)]
pub enum ConstraintKind {
    Distance(DistanceConstraint),
    Contact(DistanceConstraint),
    Point(PointConstraint),
}

// Dense particle indices a constraint acts on during one solve
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Link {
    Pair(usize, usize),
    Single(usize),
}

#[derive(Clone, Debug)]
pub struct Constraint {
    pub(crate) handle: ConstraintHandle,
    pub(crate) life: Lifecycle,
    pub breakable: bool,
    pub breaking_strain: f32,
    pub kind: ConstraintKind,
}

// Per-iteration stiffness such that `iterations` sweeps compound to `stiffness`
#[inline]
pub fn adjusted_stiffness(stiffness: f32, iterations: u32) -> f32 {
    1.0 - (1.0 - stiffness).powf(1.0 / iterations.max(1) as f32)
}

fn validate_stiffness(stiffness: f32) -> SimResult<f32> {
    if stiffness > 0.0 && stiffness <= 1.0 {
        Ok(stiffness)
    } else {
        Err(SimError::InvalidParameter { name: "stiffness", value: stiffness })
    }
}

// Two distinct mutable particles out of one slice
fn pair_mut(particles: &mut [Particle], i: usize, j: usize) -> (&mut Particle, &mut Particle) {
    debug_assert_ne!(i, j);
    if i < j {
        let (left, right) = particles.split_at_mut(j);
        (&mut left[i], &mut right[0])
    } else {
        let (left, right) = particles.split_at_mut(i);
        (&mut right[0], &mut left[j])
    }
}

impl DistanceConstraint {
    // Move both ends along their axis by `deltad`, split by mass unless one end is fixed
    fn displace(&mut self, a: &mut Particle, b: &mut Particle, stiffness: f32) {
        let delta = b.pos - a.pos;
        let direction = match delta.unit_vector() {
            Some(direction) => direction,
            None => {
                warn!("coincident particles in distance constraint, separating along x");
                COINCIDENT_AXIS
            }
        };
        let deltad = (self.current_distance - self.distance) * stiffness;

        match (a.fixed, b.fixed) {
            (false, true) => a.pos += direction * deltad,
            (true, false) => b.pos -= direction * deltad,
            (false, false) => {
                let total_mass = a.mass + b.mass;
                a.pos += direction * (deltad * b.mass / total_mass);
                b.pos -= direction * (deltad * a.mass / total_mass);
            }
            (true, true) => {}
        }
    }

    fn strain(&self) -> f32 {
        (self.current_distance - self.distance).abs() / self.distance
    }
}

impl Constraint {
    pub(crate) fn distance(
        handle: ConstraintHandle,
        p1: ParticleHandle,
        p2: ParticleHandle,
        current_distance: f32,
        distance: f32,
        stiffness: f32,
    ) -> SimResult<Self> {
        if p1 == p2 {
            return Err(SimError::DegenerateGeometry);
        }
        let distance = require_positive("distance", distance)?;
        let stiffness = validate_stiffness(stiffness)?;

        Ok(Self {
            handle,
            life: Lifecycle::immortal(),
            breakable: false,
            breaking_strain: DEFAULT_BREAKING_STRAIN,
            kind: ConstraintKind::Distance(DistanceConstraint {
                p1,
                p2,
                distance,
                stiffness,
                current_distance,
            }),
        })
    }

    // A contact lives for the step that created it: lifetime equals its age (zero)
    pub(crate) fn contact(handle: ConstraintHandle, a: &Particle, b: &Particle) -> Self {
        let life = Lifecycle::with_lifetime(0);
        Self {
            handle,
            life,
            breakable: false,
            breaking_strain: DEFAULT_BREAKING_STRAIN,
            kind: ConstraintKind::Contact(DistanceConstraint {
                p1: a.handle(),
                p2: b.handle(),
                distance: a.radius + b.radius,
                stiffness: CONTACT_STIFFNESS,
                current_distance: a.pos.distance_to(b.pos),
            }),
        }
    }

    pub(crate) fn point(handle: ConstraintHandle, p1: ParticleHandle, anchor: Vector2, stiffness: f32) -> SimResult<Self> {
        if !anchor.is_finite() {
            return Err(SimError::InvalidParameter { name: "anchor", value: f32::NAN });
        }
        let stiffness = validate_stiffness(stiffness)?;

        Ok(Self {
            handle,
            life: Lifecycle::immortal(),
            breakable: false,
            breaking_strain: DEFAULT_BREAKING_STRAIN,
            kind: ConstraintKind::Point(PointConstraint { p1, anchor, stiffness }),
        })
    }

    #[inline]
    pub fn handle(&self) -> ConstraintHandle {
        self.handle
    }

    pub fn is_contact(&self) -> bool {
        matches!(self.kind, ConstraintKind::Contact(_))
    }

    // Particles this constraint refers to
    pub fn particles(&self) -> (ParticleHandle, Option<ParticleHandle>) {
        match &self.kind {
            ConstraintKind::Distance(c) | ConstraintKind::Contact(c) => (c.p1, Some(c.p2)),
            ConstraintKind::Point(c) => (c.p1, None),
        }
    }

    pub fn involves(&self, particle: ParticleHandle) -> bool {
        let (p1, p2) = self.particles();
        p1 == particle || p2 == Some(particle)
    }

    pub fn anchor(&self) -> Option<Vector2> {
        match &self.kind {
            ConstraintKind::Point(c) => Some(c.anchor),
            _ => None,
        }
    }

    pub fn enforce(&mut self, particles: &mut [Particle], link: Link, solver_iterations: u32) {
        match (&mut self.kind, link) {
            (ConstraintKind::Distance(c), Link::Pair(i, j)) => {
                let (a, b) = pair_mut(particles, i, j);
                c.current_distance = a.pos.distance_to(b.pos);
                if c.current_distance != c.distance {
                    c.displace(a, b, adjusted_stiffness(c.stiffness, solver_iterations));
                }
            }
            (ConstraintKind::Contact(c), Link::Pair(i, j)) => {
                let (a, b) = pair_mut(particles, i, j);
                c.current_distance = a.pos.distance_to(b.pos);
                // Inequality: resolve penetration only, never pull separated particles together
                if c.current_distance <= c.distance {
                    c.displace(a, b, adjusted_stiffness(c.stiffness, solver_iterations));
                }
            }
            (ConstraintKind::Point(c), Link::Single(i)) => {
                let particle = &mut particles[i];
                if particle.fixed {
                    return;
                }
                let offset = particle.pos - c.anchor;
                if let Some(direction) = offset.unit_vector() {
                    let deltad = offset.magnitude() * adjusted_stiffness(c.stiffness, solver_iterations);
                    particle.pos -= direction * deltad;
                }
            }
            _ => {}
        }
    }

    // Refresh the cached distance from final positions and test the breaking strain
    pub fn has_broken(&mut self, particles: &[Particle], link: Link) -> bool {
        if !self.breakable {
            return false;
        }
        match (&mut self.kind, link) {
            (ConstraintKind::Distance(c) | ConstraintKind::Contact(c), Link::Pair(i, j)) => {
                c.current_distance = particles[i].pos.distance_to(particles[j].pos);
                c.strain() > self.breaking_strain
            }
            (ConstraintKind::Point(c), Link::Single(i)) => {
                particles[i].pos.distance_to(c.anchor) > self.breaking_strain
            }
            _ => false,
        }
    }
}

impl WorldElement for Constraint {
    fn lifecycle(&self) -> &Lifecycle {
        &self.life
    }

    fn lifecycle_mut(&mut self) -> &mut Lifecycle {
        &mut self.life
    }
}

/*
 * SPH Fluid Simulation - Module Definitions
 *
 * This file defines the module structure of the crate. The simulation core
 * (vector through world) has no dependency on the front-end; the nannou demo
 * (app, camera, input, renderer, ui, debug) drives it through the World API.
 */

// Re-export key components for easier access
pub use constraint::{Constraint, ConstraintHandle, ConstraintKind};
pub use error::{HandleKind, SimError, SimResult};
pub use params::{AppSettings, SimulationParams};
pub use particle::{Particle, ParticleHandle};
pub use scenes::{create_fluid_cluster, FluidCluster, Scene};
pub use spatial_grid::{PartitionMode, SpatialIndex};
pub use vector::Vector2;
pub use world::World;

// Simulation core
pub mod constraint;
pub mod element;
pub mod error;
pub mod fluid;
pub mod params;
pub mod particle;
pub mod scenes;
pub mod spatial_grid;
pub mod vector;
pub mod world;

// Demo front-end
pub mod app;
pub mod camera;
pub mod debug;
pub mod input;
pub mod renderer;
pub mod ui;

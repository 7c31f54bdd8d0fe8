/*
 * Scenes Module
 *
 * Builders for the demo scenes. Every scene runs at 100 Hz with 10 solver
 * iterations inside a 10x10 world; they differ in how fluid clusters and
 * solid particles are placed.
 */

use std::fmt;

use log::info;

use crate::error::{require_positive, SimError, SimResult};
use crate::params::SimulationParams;
use crate::particle::ParticleHandle;
use crate::vector::Vector2;
use crate::world::World;

const PHYSICS_FREQUENCY: f32 = 100.0;
const SOLVER_ITERATIONS: u32 = 10;
const WORLD_SIZE: f32 = 10.0;

// A rectangular block of fluid particles on a regular lattice
#[derive(Clone, Debug)]
pub struct FluidCluster {
    pub centre: Vector2,
    pub angle: f32,
    pub width: f32,
    pub height: f32,
    pub divisions_width: u32,
    pub divisions_height: u32,
    pub contact_radius: f32,
    // Areal density (kg / m^2); the block's mass is spread evenly over its particles
    pub density: f32,
    pub collides: bool,
}

impl FluidCluster {
    pub fn particle_count(&self) -> usize {
        (self.divisions_width as usize + 1) * (self.divisions_height as usize + 1)
    }

    pub fn particle_mass(&self) -> f32 {
        self.density * self.width * self.height / self.particle_count() as f32
    }
}

// Lay out (divisions+1)^2 fluid particles from the top-left corner, rotated about the centre
pub fn create_fluid_cluster(world: &mut World, cluster: &FluidCluster) -> SimResult<Vec<ParticleHandle>> {
    require_positive("width", cluster.width)?;
    require_positive("height", cluster.height)?;
    require_positive("density", cluster.density)?;
    if cluster.divisions_width == 0 || cluster.divisions_height == 0 {
        return Err(SimError::InvalidParameter { name: "divisions", value: 0.0 });
    }

    let mass = cluster.particle_mass();
    let spacing_width = cluster.width / cluster.divisions_width as f32;
    let spacing_height = cluster.height / cluster.divisions_height as f32;
    let corner = Vector2::new(cluster.centre.x - cluster.width / 2.0, cluster.centre.y + cluster.height / 2.0);

    let mut handles = Vec::with_capacity(cluster.particle_count());
    for row in 0..=cluster.divisions_height {
        for column in 0..=cluster.divisions_width {
            let lattice = Vector2::new(
                corner.x + column as f32 * spacing_width,
                corner.y - row as f32 * spacing_height,
            );
            let pos = lattice.rotate_about(cluster.centre, cluster.angle);

            let handle = world.create_particle(pos.x, pos.y, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, mass, cluster.contact_radius, false)?;
            world.set_fluid(handle, true)?;
            world.set_collides(handle, cluster.collides)?;
            handles.push(handle);
        }
    }
    Ok(handles)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scene {
    ColumnWall,
    DoubleColumns,
    Particles1024,
    Particles1600,
    Waves,
    Buoyancy,
}

impl Scene {
    pub const ALL: [Scene; 6] = [
        Scene::ColumnWall,
        Scene::DoubleColumns,
        Scene::Particles1024,
        Scene::Particles1600,
        Scene::Waves,
        Scene::Buoyancy,
    ];

    pub fn from_index(index: usize) -> Scene {
        Scene::ALL[index % Scene::ALL.len()]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Scene::ColumnWall => "Fluid column and wall",
            Scene::DoubleColumns => "Double columns",
            Scene::Particles1024 => "1024 particles",
            Scene::Particles1600 => "1600 particles",
            Scene::Waves => "Waves",
            Scene::Buoyancy => "Buoyancy",
        }
    }

    fn params(&self) -> SimulationParams {
        let mut params = SimulationParams::with_domain(WORLD_SIZE, WORLD_SIZE, 1.0 / PHYSICS_FREQUENCY, SOLVER_ITERATIONS);
        if *self == Scene::Waves {
            params.gravity = Vector2::ZERO;
        }
        params
    }

    // Build a fresh world for this scene on top of the given SPH and collision settings
    pub fn load_with(&self, base: &SimulationParams) -> SimResult<World> {
        let domain = self.params();
        let params = SimulationParams {
            width: domain.width,
            height: domain.height,
            timestep: domain.timestep,
            solver_iterations: domain.solver_iterations,
            gravity: domain.gravity,
            ..base.clone()
        };
        let mut world = World::with_params(params)?;
        self.populate(&mut world)?;
        info!("Loaded scene '{}' with {} particles", self.name(), world.particle_count());
        Ok(world)
    }

    pub fn load(&self) -> SimResult<World> {
        self.load_with(&SimulationParams::default())
    }

    fn populate(&self, world: &mut World) -> SimResult<()> {
        let contact_radius = world.params().contact_radius;
        let cluster = |x: f32, y: f32, angle: f32, w: f32, h: f32, dw: u32, dh: u32, density: f32, collides: bool| FluidCluster {
            centre: Vector2::new(x, y),
            angle,
            width: w,
            height: h,
            divisions_width: dw,
            divisions_height: dh,
            contact_radius,
            density,
            collides,
        };

        match self {
            Scene::ColumnWall => {
                create_fluid_cluster(world, &cluster(3.0, 5.0, 0.0, 5.0, 7.0, 15, 25, 1000.0, true))?;
                for y in [0.5, 1.5, 2.5, 3.5] {
                    world.create_particle(6.5, y, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1500.0, 0.5, true)?;
                }
            }
            Scene::DoubleColumns => {
                create_fluid_cluster(world, &cluster(1.5, 6.0, 0.0, 3.0, 6.0, 9, 18, 800.0, false))?;
                create_fluid_cluster(world, &cluster(7.0, 6.0, 0.0, 3.0, 6.0, 9, 18, 800.0, false))?;
            }
            Scene::Particles1024 => {
                create_fluid_cluster(world, &cluster(5.0, 5.0, 0.1, 8.0, 8.0, 32, 32, 1000.0, false))?;
            }
            Scene::Particles1600 => {
                create_fluid_cluster(world, &cluster(5.0, 5.0, 0.1, 8.0, 8.0, 40, 40, 1000.0, false))?;
            }
            Scene::Waves => {
                create_fluid_cluster(world, &cluster(5.0, 5.0, 0.0, 9.0, 9.0, 27, 27, 1000.0, false))?;
                create_fluid_cluster(world, &cluster(2.3, 5.0, 0.0, 2.0, 2.0, 6, 6, 1000.0, false))?;
            }
            Scene::Buoyancy => {
                create_fluid_cluster(world, &cluster(5.0, 2.7, 0.0, 9.0, 5.0, 25, 18, 1000.0, true))?;
                for (x, mass) in [(8.0, 200.0), (5.0, 1500.0), (2.0, 5000.0)] {
                    world.create_particle(x, 8.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, mass, 0.5, false)?;
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

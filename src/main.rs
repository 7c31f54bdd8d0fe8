/*
 * SPH Fluid Simulation
 *
 * An interactive 2D particle physics demo: fluid is modelled with smoothed
 * particle hydrodynamics, solids with point masses held by distance and
 * contact constraints. Drag particles with the left mouse button, zoom with
 * the wheel, and adjust the fluid from the control panel.
 *
 * Logging is configured through RUST_LOG (default: info).
 */

use sph_fluid::app::{model, update};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    nannou::app(model).update(update).run();
}

/*
 * Spatial Grid Module
 *
 * This module defines the spatial partitioning structures used for SPH
 * neighbour search. Space is divided into square cells whose size equals the
 * smoothing length, so every particle within the smoothing radius of a query
 * point lies in the query cell or one of its eight neighbours.
 *
 * Two interchangeable structures are provided:
 * - UniformGrid: a dense, bounded array of buckets over [0,width]x[0,height];
 *   positions outside the bounds fold into the nearest boundary cell
 * - SpatialHash: a sparse map from integer cell coordinates to buckets, for
 *   unbounded or sparsely populated domains
 *
 * Both hold dense particle indices only and are rebuilt every step.
 *
 * Optimized for performance by:
 * - Reusing bucket storage across steps (clearing keeps the allocation)
 * - Comparing squared distances so the hot loop never takes a square root
 */

use std::collections::HashMap;
use std::fmt;

use crate::error::{SimError, SimResult};
use crate::particle::Particle;
use crate::vector::Vector2;

// Largest number of buckets a grid may allocate
pub const MAX_GRID_CELLS: usize = 1 << 22;

// Which neighbour search the world runs for fluid particles
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PartitionMode {
    None,
    #[default]
    Grid,
    Hash,
}

impl PartitionMode {
    pub const ALL: [PartitionMode; 3] = [PartitionMode::None, PartitionMode::Grid, PartitionMode::Hash];
}

impl fmt::Display for PartitionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PartitionMode::None => "None",
            PartitionMode::Grid => "Grid",
            PartitionMode::Hash => "Spatial hash",
        };
        f.write_str(label)
    }
}

// One occupied or empty cell of the current layout, for visualisation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellInfo {
    pub x: i32,
    pub y: i32,
    pub count: usize,
}

// Cells needed to cover `extent`, or None when the count is not representable
fn cells_along(extent: f32, cell_size: f32) -> Option<usize> {
    let cells = (extent / cell_size).ceil();
    if cells.is_finite() && cells <= MAX_GRID_CELLS as f32 {
        Some((cells as usize).max(1))
    } else {
        None
    }
}

#[inline]
fn cell_coordinate(value: f32, cell_size: f32) -> i32 {
    (value / cell_size).floor() as i32
}

// Append every candidate within `radius` of `position` to `out`
#[inline]
fn admit(candidates: &[usize], position: Vector2, radius_sq: f32, particles: &[Particle], out: &mut Vec<usize>) {
    for &j in candidates {
        if position.distance_squared_to(particles[j].pos) < radius_sq {
            out.push(j);
        }
    }
}

pub struct UniformGrid {
    pub cell_size: f32,
    cell_count_x: usize,
    cell_count_y: usize,
    buckets: Vec<Vec<usize>>,
}

impl UniformGrid {
    // Fails when the domain holds more than MAX_GRID_CELLS cells of this size
    pub fn new(cell_size: f32, width: f32, height: f32) -> SimResult<Self> {
        let too_fine = SimError::InvalidParameter { name: "smoothing_length", value: cell_size };
        let cell_count_x = cells_along(width, cell_size).ok_or_else(|| too_fine.clone())?;
        let cell_count_y = cells_along(height, cell_size).ok_or_else(|| too_fine.clone())?;
        let total = cell_count_x
            .checked_mul(cell_count_y)
            .filter(|&total| total <= MAX_GRID_CELLS)
            .ok_or(too_fine)?;

        let mut buckets = Vec::with_capacity(total);

        // Initialize an empty grid
        for _ in 0..total {
            buckets.push(Vec::new());
        }

        Ok(Self {
            cell_size,
            cell_count_x,
            cell_count_y,
            buckets,
        })
    }

    pub fn cell_counts(&self) -> (usize, usize) {
        (self.cell_count_x, self.cell_count_y)
    }

    // Cell coordinates for a position, clamped into the grid
    #[inline]
    pub fn cell_of(&self, position: Vector2) -> (usize, usize) {
        let x = cell_coordinate(position.x, self.cell_size).clamp(0, self.cell_count_x as i32 - 1);
        let y = cell_coordinate(position.y, self.cell_size).clamp(0, self.cell_count_y as i32 - 1);
        (x as usize, y as usize)
    }

    #[inline]
    fn bucket_index(&self, x: usize, y: usize) -> usize {
        y * self.cell_count_x + x
    }

    pub fn bucket(&self, x: usize, y: usize) -> &[usize] {
        &self.buckets[self.bucket_index(x, y)]
    }

    pub fn clear(&mut self) {
        for bucket in &mut self.buckets {
            bucket.clear();
        }
    }

    #[inline]
    pub fn insert(&mut self, index: usize, position: Vector2) {
        let (x, y) = self.cell_of(position);
        let bucket = self.bucket_index(x, y);
        self.buckets[bucket].push(index);
    }

    // Scan the Moore neighbourhood of the query cell (fewer cells at the edges)
    pub fn query_neighbors(&self, position: Vector2, radius: f32, particles: &[Particle], out: &mut Vec<usize>) {
        debug_assert!(radius <= self.cell_size);
        let radius_sq = radius * radius;
        let (cell_x, cell_y) = self.cell_of(position);

        let min_x = cell_x.saturating_sub(1);
        let max_x = (cell_x + 1).min(self.cell_count_x - 1);
        let min_y = cell_y.saturating_sub(1);
        let max_y = (cell_y + 1).min(self.cell_count_y - 1);

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                admit(self.bucket(x, y), position, radius_sq, particles, out);
            }
        }
    }

    pub fn layout(&self) -> Vec<CellInfo> {
        let mut cells = Vec::with_capacity(self.buckets.len());
        for y in 0..self.cell_count_y {
            for x in 0..self.cell_count_x {
                cells.push(CellInfo {
                    x: x as i32,
                    y: y as i32,
                    count: self.bucket(x, y).len(),
                });
            }
        }
        cells
    }
}

pub struct SpatialHash {
    pub bin_size: f32,
    buckets: HashMap<(i32, i32), Vec<usize>>,
}

impl SpatialHash {
    pub fn new(bin_size: f32) -> Self {
        Self {
            bin_size,
            buckets: HashMap::new(),
        }
    }

    #[inline]
    pub fn key_of(&self, position: Vector2) -> (i32, i32) {
        (cell_coordinate(position.x, self.bin_size), cell_coordinate(position.y, self.bin_size))
    }

    pub fn clear(&mut self) {
        self.buckets.clear();
    }

    #[inline]
    pub fn insert(&mut self, index: usize, position: Vector2) {
        let key = self.key_of(position);
        self.buckets.entry(key).or_default().push(index);
    }

    pub fn query_neighbors(&self, position: Vector2, radius: f32, particles: &[Particle], out: &mut Vec<usize>) {
        debug_assert!(radius <= self.bin_size);
        let radius_sq = radius * radius;
        let (key_x, key_y) = self.key_of(position);

        for dy in -1..=1 {
            for dx in -1..=1 {
                let key = (key_x.saturating_add(dx), key_y.saturating_add(dy));
                if let Some(bucket) = self.buckets.get(&key) {
                    admit(bucket, position, radius_sq, particles, out);
                }
            }
        }
    }

    pub fn layout(&self) -> Vec<CellInfo> {
        let mut cells: Vec<CellInfo> = self
            .buckets
            .iter()
            .map(|(&(x, y), bucket)| CellInfo { x, y, count: bucket.len() })
            .collect();
        // HashMap iteration order is arbitrary; keep the layout stable for callers
        cells.sort_by_key(|cell| (cell.y, cell.x));
        cells
    }
}

pub enum SpatialIndex {
    Grid(UniformGrid),
    Hash(SpatialHash),
}

impl SpatialIndex {
    // Build the structure for a partition mode; None means brute-force search
    pub fn for_mode(mode: PartitionMode, cell_size: f32, width: f32, height: f32) -> SimResult<Option<Self>> {
        Ok(match mode {
            PartitionMode::None => None,
            PartitionMode::Grid => Some(SpatialIndex::Grid(UniformGrid::new(cell_size, width, height)?)),
            PartitionMode::Hash => Some(SpatialIndex::Hash(SpatialHash::new(cell_size))),
        })
    }

    pub fn mode(&self) -> PartitionMode {
        match self {
            SpatialIndex::Grid(_) => PartitionMode::Grid,
            SpatialIndex::Hash(_) => PartitionMode::Hash,
        }
    }

    pub fn cell_size(&self) -> f32 {
        match self {
            SpatialIndex::Grid(grid) => grid.cell_size,
            SpatialIndex::Hash(hash) => hash.bin_size,
        }
    }

    pub fn clear(&mut self) {
        match self {
            SpatialIndex::Grid(grid) => grid.clear(),
            SpatialIndex::Hash(hash) => hash.clear(),
        }
    }

    #[inline]
    pub fn insert(&mut self, index: usize, position: Vector2) {
        match self {
            SpatialIndex::Grid(grid) => grid.insert(index, position),
            SpatialIndex::Hash(hash) => hash.insert(index, position),
        }
    }

    #[inline]
    pub fn query_neighbors(&self, position: Vector2, radius: f32, particles: &[Particle], out: &mut Vec<usize>) {
        match self {
            SpatialIndex::Grid(grid) => grid.query_neighbors(position, radius, particles, out),
            SpatialIndex::Hash(hash) => hash.query_neighbors(position, radius, particles, out),
        }
    }

    pub fn layout(&self) -> Vec<CellInfo> {
        match self {
            SpatialIndex::Grid(grid) => grid.layout(),
            SpatialIndex::Hash(hash) => hash.layout(),
        }
    }
}

// Reference O(n^2) search over fluid particles, self included
pub fn brute_force_neighbors(position: Vector2, radius: f32, particles: &[Particle], out: &mut Vec<usize>) {
    let radius_sq = radius * radius;
    for (j, other) in particles.iter().enumerate() {
        if other.is_fluid && position.distance_squared_to(other.pos) < radius_sq {
            out.push(j);
        }
    }
}

//! Fixed-size tile grid and the reduced-resolution overlay maps.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::tiles::{self, Tile};

// ---------------------------------------------------------------------------
// World dimensions
// ---------------------------------------------------------------------------

/// Grid width in tiles.
pub const WORLD_W: usize = 120;
/// Grid height in tiles.
pub const WORLD_H: usize = 100;

/// Half-resolution overlay dimensions (2x2 tile blocks).
pub const HALF_W: usize = WORLD_W / 2;
pub const HALF_H: usize = WORLD_H / 2;

/// Quarter-resolution overlay dimensions (4x4 tile blocks).
pub const QUARTER_W: usize = WORLD_W / 4;
pub const QUARTER_H: usize = WORLD_H / 4;

/// Eighth-resolution overlay dimensions (8x8 tile blocks, rounded up).
pub const EIGHTH_W: usize = WORLD_W.div_ceil(8);
pub const EIGHTH_H: usize = WORLD_H.div_ceil(8);

// ---------------------------------------------------------------------------
// TileGrid
// ---------------------------------------------------------------------------

/// The city map: a row-major `WORLD_W` x `WORLD_H` array of packed tiles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileGrid {
    tiles: Vec<Tile>,
}

impl Default for TileGrid {
    fn default() -> Self {
        Self::new()
    }
}

impl TileGrid {
    /// All-dirt grid.
    pub fn new() -> Self {
        Self {
            tiles: vec![Tile::DIRT; WORLD_W * WORLD_H],
        }
    }

    /// Build a grid from raw packed words. Rejects wrong sizes and unknown
    /// tile ids so a corrupt save cannot enter the engine.
    pub fn from_raw(raw: &[u16]) -> Result<Self> {
        if raw.len() != WORLD_W * WORLD_H {
            return Err(SimError::Format(format!(
                "expected {} tiles, got {}",
                WORLD_W * WORLD_H,
                raw.len()
            )));
        }
        let mut tiles = Vec::with_capacity(raw.len());
        for (i, &word) in raw.iter().enumerate() {
            let tile = Tile::from_raw(word);
            if tile.id() > tiles::MAX_TILE_ID {
                return Err(SimError::Format(format!(
                    "unknown tile id {} at index {i}",
                    tile.id()
                )));
            }
            tiles.push(tile);
        }
        Ok(Self { tiles })
    }

    /// Raw packed words, for the save hand-off.
    pub fn to_raw(&self) -> Vec<u16> {
        self.tiles.iter().map(|t| t.raw()).collect()
    }

    #[inline]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < WORLD_W && (y as usize) < WORLD_H
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> Result<usize> {
        if self.in_bounds(x, y) {
            Ok(y as usize * WORLD_W + x as usize)
        } else {
            Err(SimError::Bounds {
                x,
                y,
                width: WORLD_W,
                height: WORLD_H,
            })
        }
    }

    pub fn get(&self, x: i32, y: i32) -> Result<Tile> {
        Ok(self.tiles[self.index(x, y)?])
    }

    /// Like `get` but yields dirt outside the map, for neighborhood scans
    /// that should not special-case the border.
    #[inline]
    pub fn get_or_dirt(&self, x: i32, y: i32) -> Tile {
        if self.in_bounds(x, y) {
            self.tiles[y as usize * WORLD_W + x as usize]
        } else {
            Tile::DIRT
        }
    }

    pub fn set(&mut self, x: i32, y: i32, tile: Tile) -> Result<()> {
        let idx = self.index(x, y)?;
        self.tiles[idx] = tile;
        Ok(())
    }

    /// Place a tile with the canonical flags for its id.
    pub fn place(&mut self, x: i32, y: i32, id: u16) -> Result<()> {
        self.set(x, y, tiles::blueprint(id))
    }

    /// Stamp a 3x3 zone footprint with `base` at the top-left slot. The
    /// center lands at `(cx, cy)`; edges outside the map are skipped.
    pub fn place_zone(&mut self, cx: i32, cy: i32, base: u16) -> Result<()> {
        // Validate the center first so a bad call leaves the grid untouched.
        self.index(cx, cy)?;
        let mut id = base;
        for dy in -1..=1 {
            for dx in -1..=1 {
                let (x, y) = (cx + dx, cy + dy);
                if self.in_bounds(x, y) {
                    self.place(x, y, id)?;
                }
                id += 1;
            }
        }
        Ok(())
    }

    /// Iterate all cells as `(x, y, tile)` in raster order.
    pub fn iter(&self) -> impl Iterator<Item = (i32, i32, Tile)> + '_ {
        self.tiles.iter().enumerate().map(|(i, &t)| {
            ((i % WORLD_W) as i32, (i / WORLD_W) as i32, t)
        })
    }

    /// Apply `f` to every cell in place.
    pub fn for_each_mut(&mut self, mut f: impl FnMut(i32, i32, &mut Tile)) {
        for (i, tile) in self.tiles.iter_mut().enumerate() {
            f((i % WORLD_W) as i32, (i / WORLD_W) as i32, tile);
        }
    }
}

// ---------------------------------------------------------------------------
// Overlay
// ---------------------------------------------------------------------------

/// Reduced-resolution scalar field covering the map.
///
/// Coordinates are overlay-local; helpers on [`Overlays`] translate from
/// world tiles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Overlay<T> {
    width: usize,
    height: usize,
    cells: Vec<T>,
}

impl<T: Copy + Default> Overlay<T> {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![T::default(); width * height],
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    /// Value at overlay coordinates; default outside the field.
    #[inline]
    pub fn get(&self, x: i32, y: i32) -> T {
        if self.in_bounds(x, y) {
            self.cells[y as usize * self.width + x as usize]
        } else {
            T::default()
        }
    }

    #[inline]
    pub fn set(&mut self, x: i32, y: i32, value: T) {
        if self.in_bounds(x, y) {
            self.cells[y as usize * self.width + x as usize] = value;
        }
    }

    pub fn fill(&mut self, value: T) {
        self.cells.fill(value);
    }

    pub fn cells(&self) -> &[T] {
        &self.cells
    }

    pub fn cells_mut(&mut self) -> &mut [T] {
        &mut self.cells
    }
}

impl<T: Copy + Default + Into<i64>> Overlay<T> {
    /// Mean of all cells, truncated toward zero.
    pub fn average(&self) -> i64 {
        if self.cells.is_empty() {
            return 0;
        }
        let sum: i64 = self.cells.iter().map(|&v| v.into()).sum();
        sum / self.cells.len() as i64
    }
}

/// One pass of 4-neighbor box smoothing: each cell becomes the mean of
/// itself and its orthogonal neighbors (edges divide by the cells present).
pub fn smooth_u8(field: &Overlay<u8>) -> Overlay<u8> {
    let mut out = Overlay::new(field.width(), field.height());
    for y in 0..field.height() as i32 {
        for x in 0..field.width() as i32 {
            let mut sum = field.get(x, y) as u32;
            let mut n = 1u32;
            for (dx, dy) in [(-1, 0), (1, 0), (0, -1), (0, 1)] {
                if field.in_bounds(x + dx, y + dy) {
                    sum += field.get(x + dx, y + dy) as u32;
                    n += 1;
                }
            }
            out.set(x, y, (sum / n) as u8);
        }
    }
    out
}

/// Same smoothing pass over a u16 field (station effect maps).
pub fn smooth_u16(field: &Overlay<u16>) -> Overlay<u16> {
    let mut out = Overlay::new(field.width(), field.height());
    for y in 0..field.height() as i32 {
        for x in 0..field.width() as i32 {
            let mut sum = field.get(x, y) as u32;
            let mut n = 1u32;
            for (dx, dy) in [(-1, 0), (1, 0), (0, -1), (0, 1)] {
                if field.in_bounds(x + dx, y + dy) {
                    sum += field.get(x + dx, y + dy) as u32;
                    n += 1;
                }
            }
            out.set(x, y, (sum / n) as u16);
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Overlays
// ---------------------------------------------------------------------------

/// The full set of derived fields plus the city-wide aggregates computed
/// from them. All of it is recomputed by the scanners; it is state (it
/// persists between scans and feeds the growth engine) but never an input
/// a caller edits directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Overlays {
    // Half resolution (2x2 blocks).
    pub population_density: Overlay<u8>,
    pub traffic_density: Overlay<u8>,
    pub pollution: Overlay<u8>,
    pub land_value: Overlay<u8>,
    pub crime: Overlay<u8>,

    // Quarter resolution (4x4 blocks). Sampled once at map creation.
    pub terrain: Overlay<u8>,

    // Eighth resolution (8x8 blocks).
    pub fire_effect: Overlay<u16>,
    pub police_effect: Overlay<u16>,
    pub commercial_rate: Overlay<i16>,
    pub rate_of_growth: Overlay<i16>,

    // City-wide aggregates.
    pub land_value_average: i32,
    pub pollution_average: i32,
    pub crime_average: i32,
    /// Population centroid in half-resolution coordinates.
    pub city_center: (i32, i32),
    /// Location of the worst pollution cell, for the monster's pathing.
    pub pollution_max: (i32, i32),
}

impl Default for Overlays {
    fn default() -> Self {
        Self::new()
    }
}

impl Overlays {
    pub fn new() -> Self {
        Self {
            population_density: Overlay::new(HALF_W, HALF_H),
            traffic_density: Overlay::new(HALF_W, HALF_H),
            pollution: Overlay::new(HALF_W, HALF_H),
            land_value: Overlay::new(HALF_W, HALF_H),
            crime: Overlay::new(HALF_W, HALF_H),
            terrain: Overlay::new(QUARTER_W, QUARTER_H),
            fire_effect: Overlay::new(EIGHTH_W, EIGHTH_H),
            police_effect: Overlay::new(EIGHTH_W, EIGHTH_H),
            commercial_rate: Overlay::new(EIGHTH_W, EIGHTH_H),
            rate_of_growth: Overlay::new(EIGHTH_W, EIGHTH_H),
            land_value_average: 0,
            pollution_average: 0,
            crime_average: 0,
            city_center: ((HALF_W / 2) as i32, (HALF_H / 2) as i32),
            pollution_max: (0, 0),
        }
    }

    // World-tile accessors; each divides down to the field's resolution.

    #[inline]
    pub fn traffic_at(&self, x: i32, y: i32) -> u8 {
        self.traffic_density.get(x / 2, y / 2)
    }

    #[inline]
    pub fn land_value_at(&self, x: i32, y: i32) -> u8 {
        self.land_value.get(x / 2, y / 2)
    }

    #[inline]
    pub fn pollution_at(&self, x: i32, y: i32) -> u8 {
        self.pollution.get(x / 2, y / 2)
    }

    #[inline]
    pub fn crime_at(&self, x: i32, y: i32) -> u8 {
        self.crime.get(x / 2, y / 2)
    }

    #[inline]
    pub fn fire_effect_at(&self, x: i32, y: i32) -> u16 {
        self.fire_effect.get(x / 8, y / 8)
    }

    #[inline]
    pub fn police_effect_at(&self, x: i32, y: i32) -> u16 {
        self.police_effect.get(x / 8, y / 8)
    }

    #[inline]
    pub fn commercial_rate_at(&self, x: i32, y: i32) -> i16 {
        self.commercial_rate.get(x / 8, y / 8)
    }

    #[inline]
    pub fn rate_of_growth_at(&self, x: i32, y: i32) -> i16 {
        self.rate_of_growth.get(x / 8, y / 8)
    }

    /// Bump the growth map around a zone that grew (+) or decayed (-).
    pub fn adjust_rate_of_growth(&mut self, x: i32, y: i32, amount: i16) {
        let (gx, gy) = (x / 8, y / 8);
        let v = (self.rate_of_growth.get(gx, gy) + amount).clamp(-200, 200);
        self.rate_of_growth.set(gx, gy, v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiles::{RES_BASE, WOODS};

    #[test]
    fn test_grid_starts_as_dirt() {
        let grid = TileGrid::new();
        assert_eq!(grid.get(0, 0).unwrap(), Tile::DIRT);
        assert_eq!(
            grid.get(WORLD_W as i32 - 1, WORLD_H as i32 - 1).unwrap(),
            Tile::DIRT
        );
    }

    #[test]
    fn test_out_of_bounds_is_an_error() {
        let mut grid = TileGrid::new();
        assert!(matches!(grid.get(-1, 0), Err(SimError::Bounds { .. })));
        assert!(matches!(
            grid.get(WORLD_W as i32, 0),
            Err(SimError::Bounds { .. })
        ));
        assert!(grid.set(0, WORLD_H as i32, Tile::DIRT).is_err());
        // Failed set left the grid untouched.
        assert_eq!(grid.get(0, 0).unwrap(), Tile::DIRT);
    }

    #[test]
    fn test_get_or_dirt_outside_map() {
        let grid = TileGrid::new();
        assert_eq!(grid.get_or_dirt(-5, -5), Tile::DIRT);
        assert_eq!(grid.get_or_dirt(1000, 0), Tile::DIRT);
    }

    #[test]
    fn test_place_applies_blueprint_flags() {
        let mut grid = TileGrid::new();
        grid.place(10, 10, WOODS).unwrap();
        let t = grid.get(10, 10).unwrap();
        assert_eq!(t.id(), WOODS);
        assert!(t.is_combustible());
        assert!(t.is_bulldozable());
    }

    #[test]
    fn test_place_zone_footprint() {
        let mut grid = TileGrid::new();
        grid.place_zone(20, 20, RES_BASE).unwrap();
        assert!(grid.get(20, 20).unwrap().is_zone_center());
        assert_eq!(grid.get(19, 19).unwrap().id(), RES_BASE);
        assert_eq!(grid.get(21, 21).unwrap().id(), RES_BASE + 8);
        assert!(!grid.get(19, 19).unwrap().is_zone_center());
    }

    #[test]
    fn test_place_zone_clips_at_border() {
        let mut grid = TileGrid::new();
        grid.place_zone(0, 0, RES_BASE).unwrap();
        assert!(grid.get(0, 0).unwrap().is_zone_center());
        assert_eq!(grid.get(1, 1).unwrap().id(), RES_BASE + 8);
    }

    #[test]
    fn test_from_raw_rejects_bad_sizes_and_ids() {
        assert!(matches!(
            TileGrid::from_raw(&[0u16; 10]),
            Err(SimError::Format(_))
        ));
        let mut raw = vec![0u16; WORLD_W * WORLD_H];
        raw[5] = 0x3FF; // above MAX_TILE_ID
        assert!(matches!(TileGrid::from_raw(&raw), Err(SimError::Format(_))));
    }

    #[test]
    fn test_raw_roundtrip() {
        let mut grid = TileGrid::new();
        grid.place(3, 4, WOODS).unwrap();
        grid.place_zone(30, 40, RES_BASE).unwrap();
        let restored = TileGrid::from_raw(&grid.to_raw()).unwrap();
        assert_eq!(grid, restored);
    }

    #[test]
    fn test_overlay_default_outside_bounds() {
        let field: Overlay<u8> = Overlay::new(4, 4);
        assert_eq!(field.get(-1, 0), 0);
        assert_eq!(field.get(4, 0), 0);
    }

    #[test]
    fn test_smooth_spreads_a_spike() {
        let mut field: Overlay<u8> = Overlay::new(5, 5);
        field.set(2, 2, 100);
        let smoothed = smooth_u8(&field);
        assert!(smoothed.get(2, 2) < 100);
        assert!(smoothed.get(1, 2) > 0);
        assert!(smoothed.get(2, 1) > 0);
        assert_eq!(smoothed.get(0, 0), 0);
    }

    #[test]
    fn test_overlay_average() {
        let mut field: Overlay<u8> = Overlay::new(2, 2);
        field.set(0, 0, 10);
        field.set(1, 0, 20);
        field.set(0, 1, 30);
        field.set(1, 1, 40);
        assert_eq!(field.average(), 25);
    }

    #[test]
    fn test_rate_of_growth_clamps() {
        let mut overlays = Overlays::new();
        for _ in 0..100 {
            overlays.adjust_rate_of_growth(8, 8, 8);
        }
        assert_eq!(overlays.rate_of_growth_at(8, 8), 200);
        for _ in 0..200 {
            overlays.adjust_rate_of_growth(8, 8, -8);
        }
        assert_eq!(overlays.rate_of_growth_at(8, 8), -200);
    }

    #[test]
    fn test_eighth_resolution_rounds_up() {
        assert_eq!(EIGHTH_W, 15);
        assert_eq!(EIGHTH_H, 13);
    }
}

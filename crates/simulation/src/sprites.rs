//! Mobile agents: disaster monsters, tornadoes, vehicles and explosions.
//!
//! Sprites live off-grid with sub-tile positions (1/16 tile units) and are
//! advanced once per tick in spawn order. The pool hands out stable indices
//! and recycles free slots, so an index held across ticks keeps meaning the
//! same sprite until it despawns.

use serde::{Deserialize, Serialize};

use crate::grid::{Overlays, TileGrid, WORLD_H, WORLD_W};
use crate::rng::SimRng;
use crate::tiles::{self, RUBBLE_FIRST};

/// Sub-tile units per tile.
pub const UNIT: i32 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpriteKind {
    Monster,
    Tornado,
    Plane,
    Helicopter,
    Ship,
    Explosion,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sprite {
    pub kind: SpriteKind,
    /// Position in 1/16-tile units.
    pub x: i32,
    pub y: i32,
    /// Target in 1/16-tile units; meaning depends on the kind.
    pub dest_x: i32,
    pub dest_y: i32,
    /// Remaining ticks before the sprite retires on its own.
    pub lifetime: u32,
}

impl Sprite {
    pub fn tile_x(&self) -> i32 {
        self.x / UNIT
    }

    pub fn tile_y(&self) -> i32 {
        self.y / UNIT
    }

    fn out_of_bounds(&self) -> bool {
        self.tile_x() < 0
            || self.tile_y() < 0
            || self.tile_x() >= WORLD_W as i32
            || self.tile_y() >= WORLD_H as i32
    }
}

/// Default lifetimes, in ticks.
fn lifetime_for(kind: SpriteKind) -> u32 {
    match kind {
        SpriteKind::Monster => 500,
        SpriteKind::Tornado => 200,
        SpriteKind::Plane => 300,
        SpriteKind::Helicopter => 300,
        SpriteKind::Ship => 1000,
        SpriteKind::Explosion => 4,
    }
}

/// Arena of active sprites with a free list.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SpritePool {
    slots: Vec<Option<Sprite>>,
    free: Vec<usize>,
}

impl SpritePool {
    /// Spawn at tile coordinates; returns the stable slot index.
    pub fn spawn(&mut self, kind: SpriteKind, tx: i32, ty: i32) -> usize {
        let sprite = Sprite {
            kind,
            x: tx * UNIT,
            y: ty * UNIT,
            dest_x: tx * UNIT,
            dest_y: ty * UNIT,
            lifetime: lifetime_for(kind),
        };
        if let Some(idx) = self.free.pop() {
            self.slots[idx] = Some(sprite);
            idx
        } else {
            self.slots.push(Some(sprite));
            self.slots.len() - 1
        }
    }

    pub fn get(&self, idx: usize) -> Option<&Sprite> {
        self.slots.get(idx).and_then(|s| s.as_ref())
    }

    pub fn get_mut(&mut self, idx: usize) -> Option<&mut Sprite> {
        self.slots.get_mut(idx).and_then(|s| s.as_mut())
    }

    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn any_of_kind(&self, kind: SpriteKind) -> bool {
        self.slots
            .iter()
            .any(|s| s.as_ref().is_some_and(|s| s.kind == kind))
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &Sprite)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|s| (i, s)))
    }

    /// Advance every active sprite one tick, in slot order.
    pub fn advance_all(&mut self, grid: &mut TileGrid, overlays: &Overlays, rng: &mut SimRng) {
        for idx in 0..self.slots.len() {
            let Some(mut sprite) = self.slots[idx].take() else {
                continue;
            };
            let retire = advance(&mut sprite, grid, overlays, rng);
            if retire || sprite.out_of_bounds() || sprite.lifetime == 0 {
                self.free.push(idx);
            } else {
                self.slots[idx] = Some(sprite);
            }
        }
    }
}

/// One tick of movement and damage for a single sprite. Returns true when
/// the sprite is done.
fn advance(sprite: &mut Sprite, grid: &mut TileGrid, overlays: &Overlays, rng: &mut SimRng) -> bool {
    sprite.lifetime = sprite.lifetime.saturating_sub(1);
    match sprite.kind {
        SpriteKind::Monster => {
            // Seek the worst pollution, wobbling as it goes.
            let (px, py) = overlays.pollution_max;
            sprite.dest_x = px * 2 * UNIT;
            sprite.dest_y = py * 2 * UNIT;
            step_toward(sprite, rng, UNIT / 2, 3);
            crush(grid, sprite.tile_x(), sprite.tile_y());
            false
        }
        SpriteKind::Tornado => {
            // A drifting random walk.
            sprite.x += rng.rand16_signed() % (UNIT / 2) + UNIT / 4;
            sprite.y += rng.rand16_signed() % (UNIT / 2);
            crush(grid, sprite.tile_x(), sprite.tile_y());
            // Tornadoes can dissipate early.
            rng.one_in(50)
        }
        SpriteKind::Plane | SpriteKind::Helicopter => {
            step_toward(sprite, rng, UNIT, 2);
            at_destination(sprite) && pick_patrol_point(sprite, rng)
        }
        SpriteKind::Ship => {
            // Creep along water; stall (and eventually retire) on land.
            let next = random_water_neighbor(grid, sprite.tile_x(), sprite.tile_y(), rng);
            if let Some((nx, ny)) = next {
                sprite.x = nx * UNIT;
                sprite.y = ny * UNIT;
            }
            false
        }
        // A timed visual marker for the host. It touches no tiles; the
        // residue on the grid is the igniter's job.
        SpriteKind::Explosion => false,
    }
}

/// Move toward the destination at `speed` units with a random wobble.
fn step_toward(sprite: &mut Sprite, rng: &mut SimRng, speed: i32, wobble: u16) {
    let dx = (sprite.dest_x - sprite.x).signum();
    let dy = (sprite.dest_y - sprite.y).signum();
    sprite.x += dx * speed + rng.next_int(wobble * 2) as i32 - wobble as i32;
    sprite.y += dy * speed + rng.next_int(wobble * 2) as i32 - wobble as i32;
}

fn at_destination(sprite: &Sprite) -> bool {
    (sprite.dest_x - sprite.x).abs() < UNIT && (sprite.dest_y - sprite.y).abs() < UNIT
}

/// Choose a new patrol destination; never retires the sprite.
fn pick_patrol_point(sprite: &mut Sprite, rng: &mut SimRng) -> bool {
    sprite.dest_x = rng.next_int(WORLD_W as u16 - 1) as i32 * UNIT;
    sprite.dest_y = rng.next_int(WORLD_H as u16 - 1) as i32 * UNIT;
    false
}

fn random_water_neighbor(
    grid: &TileGrid,
    x: i32,
    y: i32,
    rng: &mut SimRng,
) -> Option<(i32, i32)> {
    let start = rng.rand16() & 3;
    for turn in 0..4u16 {
        let dir = ((start + turn) & 3) as usize;
        let (dx, dy) = [(0, -1), (1, 0), (0, 1), (-1, 0)][dir];
        let (nx, ny) = (x + dx, y + dy);
        if grid.in_bounds(nx, ny) && grid.get_or_dirt(nx, ny).is_water() {
            return Some((nx, ny));
        }
    }
    None
}

/// Flatten the tile under a rampaging sprite.
fn crush(grid: &mut TileGrid, x: i32, y: i32) {
    if !grid.in_bounds(x, y) {
        return;
    }
    let tile = grid.get_or_dirt(x, y);
    if tile.is_vulnerable() || tile.is_tree() {
        let _ = grid.place(x, y, RUBBLE_FIRST);
    } else if tile.is_zone_center() {
        let _ = grid.place(x, y, tiles::RUBBLE_FIRST + 1);
    }
}

//! Plain-text map rendering for the sandbox binary and test diagnostics.

use crate::grid::{TileGrid, WORLD_H, WORLD_W};
use crate::tiles::Tile;

/// One character per tile class.
fn glyph(tile: Tile) -> char {
    let id = tile.id();
    if tile.is_dirt() {
        '.'
    } else if tile.is_water() {
        '~'
    } else if tile.is_tree() {
        '*'
    } else if tile.is_rubble() {
        ':'
    } else if tile.is_flooded() {
        'f'
    } else if tile.is_radioactive() {
        '!'
    } else if tile.is_fire() {
        'F'
    } else if tile.is_road() {
        '#'
    } else if tile.is_wire() {
        '-'
    } else if tile.is_rail() {
        '='
    } else if tile.is_house() {
        'h'
    } else if tile.is_zone_center() {
        match tile.zone_family() {
            Some(crate::tiles::ZoneFamily::Residential) => 'R',
            Some(crate::tiles::ZoneFamily::Commercial) => 'C',
            Some(crate::tiles::ZoneFamily::Industrial) => 'I',
            None => 'Z',
        }
    } else if tile.is_zone_tile() {
        'z'
    } else if id >= crate::tiles::TINY_EXPLOSION_FIRST {
        'x'
    } else {
        '?'
    }
}

/// Full-resolution render, one line per row.
pub fn detail(grid: &TileGrid) -> String {
    let mut out = String::with_capacity((WORLD_W + 1) * WORLD_H);
    for y in 0..WORLD_H as i32 {
        for x in 0..WORLD_W as i32 {
            out.push(glyph(grid.get_or_dirt(x, y)));
        }
        out.push('\n');
    }
    out
}

/// Block-sampled render: each output cell shows the dominant glyph of a
/// `step`-by-`step` tile block, keeping a large map terminal-sized.
pub fn overview(grid: &TileGrid, step: usize) -> String {
    let step = step.max(1);
    let mut out = String::new();
    for y in (0..WORLD_H as i32).step_by(step) {
        for x in (0..WORLD_W as i32).step_by(step) {
            out.push(block_glyph(grid, x, y, step as i32));
        }
        out.push('\n');
    }
    out
}

fn block_glyph(grid: &TileGrid, x: i32, y: i32, step: i32) -> char {
    let mut best = '.';
    let mut best_rank = 0;
    for dy in 0..step {
        for dx in 0..step {
            let c = glyph(grid.get_or_dirt(x + dx, y + dy));
            let rank = match c {
                'F' | '!' => 6,
                'R' | 'C' | 'I' | 'Z' => 5,
                'z' | 'h' => 4,
                '#' | '=' | '-' => 3,
                '~' | 'f' => 2,
                '*' | ':' => 1,
                _ => 0,
            };
            if rank > best_rank {
                best = c;
                best_rank = rank;
            }
        }
    }
    best
}

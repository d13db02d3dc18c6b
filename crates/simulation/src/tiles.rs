//! Packed tile representation and the tile id vocabulary.
//!
//! Every grid cell is a single `u16`: the low 10 bits identify the tile
//! (terrain, infrastructure, or a slot inside a zone footprint) and the high
//! 6 bits carry status flags. The bit layout is an internal contract; callers
//! only ever see a [`Tile`] value with named accessors, and raw words cross
//! the API boundary solely through the load/save hand-off.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Status flags
// ---------------------------------------------------------------------------

/// Recomputed every power scan; never stale across a tick boundary.
pub const POWERED: u16 = 0x8000;
/// Power flood-fill may traverse this tile.
pub const CONDUCTIVE: u16 = 0x4000;
/// Fire may spread to this tile.
pub const COMBUSTIBLE: u16 = 0x2000;
/// The bulldozer (and floods) may clear this tile.
pub const BULLDOZABLE: u16 = 0x1000;
/// Presentation hint for animated tiles (fire, flood water).
pub const ANIMATED: u16 = 0x0800;
/// Center of a 3x3 zone footprint; the growth scan keys off this bit.
pub const ZONE_CENTER: u16 = 0x0400;

const FLAG_MASK: u16 = 0xFC00;
const ID_MASK: u16 = 0x03FF;

// ---------------------------------------------------------------------------
// Tile ids: terrain
// ---------------------------------------------------------------------------

pub const DIRT: u16 = 0;
pub const RIVER: u16 = 2;
/// Raw river-edge marker laid down by the map generator; the smoothing pass
/// replaces it with one of the directional edge tiles below.
pub const REDGE: u16 = 3;
pub const CHANNEL: u16 = 4;
pub const RIVER_EDGE_FIRST: u16 = 5;
pub const RIVER_EDGE_LAST: u16 = 20;
pub const WOODS_FIRST: u16 = 21;
pub const WOODS: u16 = 37;
pub const WOODS_LAST: u16 = 39;
pub const RUBBLE_FIRST: u16 = 44;
pub const RUBBLE_LAST: u16 = 47;
pub const FLOOD_FIRST: u16 = 48;
pub const FLOOD_LAST: u16 = 51;
pub const RADIOACTIVE: u16 = 52;
pub const FIRE_FIRST: u16 = 56;
pub const FIRE_LAST: u16 = 63;

// ---------------------------------------------------------------------------
// Tile ids: infrastructure
//
// Road ids occupy three aligned 16-slot banks (plain / light traffic / heavy
// traffic) so the upkeep scan can retile by density while preserving the
// variant in the low 4 bits.
// ---------------------------------------------------------------------------

pub const ROAD_FIRST: u16 = 64;
pub const HBRIDGE: u16 = 64;
pub const VBRIDGE: u16 = 65;
/// Road/wire crossings sit in the road bank; they stay traversable for
/// traffic and carry the conductive flag.
pub const HROADPOWER: u16 = 78;
pub const VROADPOWER: u16 = 79;
pub const LIGHT_TRAFFIC_FIRST: u16 = 80;
pub const HEAVY_TRAFFIC_FIRST: u16 = 96;
pub const ROAD_LAST: u16 = 111;

pub const WIRE_FIRST: u16 = 112;
pub const WIRE_LAST: u16 = 127;

pub const RAIL_FIRST: u16 = 128;
pub const HRAILPOWER: u16 = 142;
pub const VRAILPOWER: u16 = 143;
pub const RAIL_LAST: u16 = 143;

// ---------------------------------------------------------------------------
// Tile ids: housing and growth zones
//
// A zone stage occupies a block of nine consecutive ids (one per footprint
// slot, center at +4), so `stage = (center - family_center_base) / 9`.
// ---------------------------------------------------------------------------

pub const HOUSE_FIRST: u16 = 224;
pub const HOUSE_LAST: u16 = 235;

pub const RES_BASE: u16 = 240;
pub const RES_STAGES: u16 = 5; // stages 0..=4
pub const RES_LAST: u16 = RES_BASE + RES_STAGES * 9 - 1;

pub const COM_BASE: u16 = 300;
pub const COM_STAGES: u16 = 6; // stages 0..=5
pub const COM_LAST: u16 = COM_BASE + COM_STAGES * 9 - 1;

pub const IND_BASE: u16 = 360;
pub const IND_STAGES: u16 = 5; // stages 0..=4
pub const IND_LAST: u16 = IND_BASE + IND_STAGES * 9 - 1;

// ---------------------------------------------------------------------------
// Tile ids: special zones (3x3 blocks, center at base + 4)
// ---------------------------------------------------------------------------

pub const FIRE_STATION_BASE: u16 = 410;
pub const FIRE_STATION: u16 = FIRE_STATION_BASE + 4;
pub const POLICE_STATION_BASE: u16 = 419;
pub const POLICE_STATION: u16 = POLICE_STATION_BASE + 4;
pub const COAL_BASE: u16 = 428;
pub const COAL_PLANT: u16 = COAL_BASE + 4;
pub const NUCLEAR_BASE: u16 = 437;
pub const NUCLEAR_PLANT: u16 = NUCLEAR_BASE + 4;
pub const STADIUM_BASE: u16 = 446;
pub const STADIUM: u16 = STADIUM_BASE + 4;
pub const SEAPORT_BASE: u16 = 455;
pub const SEAPORT: u16 = SEAPORT_BASE + 4;
pub const AIRPORT_BASE: u16 = 464;
pub const AIRPORT: u16 = AIRPORT_BASE + 4;
pub const HOSPITAL_BASE: u16 = 473;
pub const HOSPITAL: u16 = HOSPITAL_BASE + 4;
pub const CHURCH_BASE: u16 = 482;
pub const CHURCH: u16 = CHURCH_BASE + 4;

pub const LAST_ZONE: u16 = CHURCH_BASE + 8;

/// Short-lived explosion residue; the upkeep scan converts it to rubble.
pub const TINY_EXPLOSION_FIRST: u16 = 492;
pub const TINY_EXPLOSION_LAST: u16 = 495;

/// Highest id the loader accepts.
pub const MAX_TILE_ID: u16 = TINY_EXPLOSION_LAST;

// ---------------------------------------------------------------------------
// Zone families
// ---------------------------------------------------------------------------

/// Growth zone family, derived from a center tile's base id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ZoneFamily {
    Residential,
    Commercial,
    Industrial,
}

impl ZoneFamily {
    pub fn base(self) -> u16 {
        match self {
            ZoneFamily::Residential => RES_BASE,
            ZoneFamily::Commercial => COM_BASE,
            ZoneFamily::Industrial => IND_BASE,
        }
    }

    pub fn max_stage(self) -> u8 {
        match self {
            ZoneFamily::Residential => (RES_STAGES - 1) as u8,
            ZoneFamily::Commercial => (COM_STAGES - 1) as u8,
            ZoneFamily::Industrial => (IND_STAGES - 1) as u8,
        }
    }

    /// Center tile id for a development stage of this family.
    pub fn center_id(self, stage: u8) -> u16 {
        self.base() + stage as u16 * 9 + 4
    }

    /// Base-id range a route from this family counts as a destination.
    /// Residential trips seek workplaces; workplaces seek housing.
    pub fn destination_range(self) -> (u16, u16) {
        match self {
            ZoneFamily::Residential => (COM_BASE, IND_LAST),
            ZoneFamily::Commercial | ZoneFamily::Industrial => (HOUSE_FIRST, RES_LAST),
        }
    }
}

/// Fixed-behavior zones scanned alongside the growth families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpecialZone {
    FireStation,
    PoliceStation,
    CoalPlant,
    NuclearPlant,
    Stadium,
    Seaport,
    Airport,
    Hospital,
    Church,
}

// ---------------------------------------------------------------------------
// Tile
// ---------------------------------------------------------------------------

/// One packed grid cell: base id plus status flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Tile(u16);

impl Tile {
    pub const DIRT: Tile = Tile(DIRT);

    pub fn new(id: u16, flags: u16) -> Self {
        Tile((id & ID_MASK) | (flags & FLAG_MASK))
    }

    /// Raw packed word; only the load/save hand-off should need this.
    pub fn raw(self) -> u16 {
        self.0
    }

    pub fn from_raw(raw: u16) -> Self {
        Tile(raw)
    }

    pub fn id(self) -> u16 {
        self.0 & ID_MASK
    }

    pub fn flags(self) -> u16 {
        self.0 & FLAG_MASK
    }

    pub fn with_id(self, id: u16) -> Self {
        Tile((self.0 & FLAG_MASK) | (id & ID_MASK))
    }

    pub fn with_flags(self, flags: u16) -> Self {
        Tile((self.0 & !(flags & FLAG_MASK)) | (flags & FLAG_MASK))
    }

    pub fn set(self, flag: u16) -> Self {
        Tile(self.0 | (flag & FLAG_MASK))
    }

    pub fn clear(self, flag: u16) -> Self {
        Tile(self.0 & !(flag & FLAG_MASK))
    }

    // -- flag predicates ----------------------------------------------------

    pub fn is_powered(self) -> bool {
        self.0 & POWERED != 0
    }

    pub fn is_conductive(self) -> bool {
        self.0 & CONDUCTIVE != 0
    }

    pub fn is_combustible(self) -> bool {
        self.0 & COMBUSTIBLE != 0
    }

    pub fn is_bulldozable(self) -> bool {
        self.0 & BULLDOZABLE != 0
    }

    pub fn is_animated(self) -> bool {
        self.0 & ANIMATED != 0
    }

    pub fn is_zone_center(self) -> bool {
        self.0 & ZONE_CENTER != 0
    }

    // -- id predicates ------------------------------------------------------

    pub fn is_dirt(self) -> bool {
        self.id() == DIRT
    }

    pub fn is_water(self) -> bool {
        matches!(self.id(), RIVER | REDGE | CHANNEL) || self.is_river_edge()
    }

    pub fn is_river_edge(self) -> bool {
        (RIVER_EDGE_FIRST..=RIVER_EDGE_LAST).contains(&self.id())
    }

    pub fn is_tree(self) -> bool {
        (WOODS_FIRST..=WOODS_LAST).contains(&self.id())
    }

    pub fn is_rubble(self) -> bool {
        (RUBBLE_FIRST..=RUBBLE_LAST).contains(&self.id())
    }

    pub fn is_flooded(self) -> bool {
        (FLOOD_FIRST..=FLOOD_LAST).contains(&self.id())
    }

    pub fn is_radioactive(self) -> bool {
        self.id() == RADIOACTIVE
    }

    pub fn is_fire(self) -> bool {
        (FIRE_FIRST..=FIRE_LAST).contains(&self.id())
    }

    pub fn is_road(self) -> bool {
        (ROAD_FIRST..=ROAD_LAST).contains(&self.id())
    }

    pub fn is_bridge(self) -> bool {
        let v = self.road_variant();
        self.is_road() && (v == Some(0) || v == Some(1))
    }

    pub fn is_wire(self) -> bool {
        (WIRE_FIRST..=WIRE_LAST).contains(&self.id())
    }

    pub fn is_rail(self) -> bool {
        (RAIL_FIRST..=RAIL_LAST).contains(&self.id())
    }

    /// Traffic may drive over roads and rail (crossings included); bare
    /// power lines are not traversable.
    pub fn is_traversable(self) -> bool {
        self.is_road() || self.is_rail()
    }

    pub fn is_house(self) -> bool {
        (HOUSE_FIRST..=HOUSE_LAST).contains(&self.id())
    }

    pub fn is_explosion_residue(self) -> bool {
        (TINY_EXPLOSION_FIRST..=TINY_EXPLOSION_LAST).contains(&self.id())
    }

    /// Any tile inside a growth-zone footprint (center or edge).
    pub fn is_zone_tile(self) -> bool {
        let id = self.id();
        (RES_BASE..=RES_LAST).contains(&id)
            || (COM_BASE..=COM_LAST).contains(&id)
            || (IND_BASE..=IND_LAST).contains(&id)
    }

    /// A random fire may start here: developed, flammable, and not a zone
    /// center (centers raze through the fire-zone path instead).
    pub fn is_arsonable(self) -> bool {
        !self.is_zone_center()
            && self.is_combustible()
            && (HOUSE_FIRST..=LAST_ZONE).contains(&self.id())
    }

    /// Earthquakes and rampaging sprites can reduce this to rubble.
    pub fn is_vulnerable(self) -> bool {
        !self.is_zone_center() && (HOUSE_FIRST..=LAST_ZONE).contains(&self.id())
    }

    /// Flood water may claim this tile.
    pub fn is_floodable(self) -> bool {
        self.is_dirt() || self.is_rubble() || (self.is_bulldozable() && self.is_combustible())
    }

    /// Growth zone family if this is a zone-center tile of one.
    pub fn zone_family(self) -> Option<ZoneFamily> {
        if !self.is_zone_center() {
            return None;
        }
        let id = self.id();
        if (RES_BASE..=RES_LAST).contains(&id) {
            Some(ZoneFamily::Residential)
        } else if (COM_BASE..=COM_LAST).contains(&id) {
            Some(ZoneFamily::Commercial)
        } else if (IND_BASE..=IND_LAST).contains(&id) {
            Some(ZoneFamily::Industrial)
        } else {
            None
        }
    }

    /// Development stage for a growth-zone center tile.
    pub fn zone_stage(self) -> Option<u8> {
        let family = self.zone_family()?;
        let offset = self.id() - family.base();
        Some((offset / 9) as u8)
    }

    /// Special zone kind if this is the center of one.
    pub fn special_zone(self) -> Option<SpecialZone> {
        if !self.is_zone_center() {
            return None;
        }
        match self.id() {
            FIRE_STATION => Some(SpecialZone::FireStation),
            POLICE_STATION => Some(SpecialZone::PoliceStation),
            COAL_PLANT => Some(SpecialZone::CoalPlant),
            NUCLEAR_PLANT => Some(SpecialZone::NuclearPlant),
            STADIUM => Some(SpecialZone::Stadium),
            SEAPORT => Some(SpecialZone::Seaport),
            AIRPORT => Some(SpecialZone::Airport),
            HOSPITAL => Some(SpecialZone::Hospital),
            CHURCH => Some(SpecialZone::Church),
            _ => None,
        }
    }

    /// Variant slot (0..16) within the road banks, if this is a road.
    pub fn road_variant(self) -> Option<u16> {
        if self.is_road() {
            Some((self.id() - ROAD_FIRST) & 15)
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Canonical flag assignment
// ---------------------------------------------------------------------------

/// Build a tile with the canonical status flags for its id. Subsystems and
/// the editor path both place tiles through this, so flag invariants hold no
/// matter who mutates the grid.
pub fn blueprint(id: u16) -> Tile {
    let mut flags = 0;
    match id {
        WOODS_FIRST..=WOODS_LAST => flags = COMBUSTIBLE | BULLDOZABLE,
        RUBBLE_FIRST..=RUBBLE_LAST => flags = BULLDOZABLE,
        FLOOD_FIRST..=FLOOD_LAST => flags = ANIMATED,
        FIRE_FIRST..=FIRE_LAST => flags = ANIMATED,
        ROAD_FIRST..=ROAD_LAST => {
            flags = BULLDOZABLE;
            let variant = (id - ROAD_FIRST) & 15;
            if variant == (HROADPOWER - ROAD_FIRST) || variant == (VROADPOWER - ROAD_FIRST) {
                flags |= CONDUCTIVE;
            }
        }
        WIRE_FIRST..=WIRE_LAST => flags = BULLDOZABLE | CONDUCTIVE,
        RAIL_FIRST..=RAIL_LAST => {
            flags = BULLDOZABLE;
            if id == HRAILPOWER || id == VRAILPOWER {
                flags |= CONDUCTIVE;
            }
        }
        HOUSE_FIRST..=HOUSE_LAST => flags = COMBUSTIBLE | BULLDOZABLE,
        RES_BASE..=LAST_ZONE => {
            // Zone footprint tile; the center slot of each 9-id block also
            // gets the zone-center and bulldozable bits.
            flags = COMBUSTIBLE | CONDUCTIVE;
            if is_zone_center_id(id) {
                flags |= ZONE_CENTER | BULLDOZABLE;
            }
        }
        TINY_EXPLOSION_FIRST..=TINY_EXPLOSION_LAST => flags = ANIMATED,
        RIVER_EDGE_FIRST..=RIVER_EDGE_LAST => flags = BULLDOZABLE,
        _ => {}
    }
    Tile::new(id, flags)
}

/// Whether an id is the center slot of any 3x3 footprint block.
fn is_zone_center_id(id: u16) -> bool {
    for base in [RES_BASE, COM_BASE, IND_BASE] {
        let stages = match base {
            RES_BASE => RES_STAGES,
            COM_BASE => COM_STAGES,
            _ => IND_STAGES,
        };
        if (base..base + stages * 9).contains(&id) {
            return (id - base) % 9 == 4;
        }
    }
    for base in [
        FIRE_STATION_BASE,
        POLICE_STATION_BASE,
        COAL_BASE,
        NUCLEAR_BASE,
        STADIUM_BASE,
        SEAPORT_BASE,
        AIRPORT_BASE,
        HOSPITAL_BASE,
        CHURCH_BASE,
    ] {
        if (base..base + 9).contains(&id) {
            return id - base == 4;
        }
    }
    false
}

/// Census population of a residential stage: 16 at stage 1, +8 per stage.
pub fn residential_population(stage: u8) -> u32 {
    if stage == 0 {
        0
    } else {
        8 * (stage as u32 - 1) + 16
    }
}

use serde::{Deserialize, Serialize};
use slotmap::new_key_type;
use tsify_next::Tsify;

// ============================================================================
// IDs - Using slotmap for generational indices
// ============================================================================

new_key_type! {
    pub struct BuildingId;
}

/// Trait for converting SlotMap keys to u64 for WASM boundary
pub trait KeyToU64 {
    fn to_u64(self) -> u64;
}

impl KeyToU64 for BuildingId {
    fn to_u64(self) -> u64 {
        self.0.as_ffi()
    }
}

/// Inverse of [`KeyToU64`] for ids coming back from JS.
pub fn building_id_from_u64(raw: u64) -> BuildingId {
    BuildingId::from(slotmap::KeyData::from_ffi(raw))
}

pub type RoadNetworkId = u32;

// === WAREHOUSE GEOMETRY ===

/// Storage bays per warehouse
pub const BAYS_PER_WAREHOUSE: usize = 8;
/// Loads a single bay can hold
pub const BAY_CAPACITY: u32 = 4;
/// Loads a whole warehouse can hold
pub const WAREHOUSE_CAPACITY: u32 = BAYS_PER_WAREHOUSE as u32 * BAY_CAPACITY;

// ============================================================================
// Map coordinates
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct TilePoint {
    pub x: i32,
    pub y: i32,
}

impl TilePoint {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Chebyshev (max-axis) tile distance, saturating at `i32::MAX`
    pub fn max_tile_distance(self, other: TilePoint) -> i32 {
        let dx = self.x.abs_diff(other.x);
        let dy = self.y.abs_diff(other.y);
        saturate_i32(dx.max(dy))
    }
}

/// Tile distance plus the difference in distance-from-entry between the two
/// buildings. The penalty only applies when the requester knows its own entry
/// distance.
pub fn distance_with_penalty(
    from: TilePoint,
    to: TilePoint,
    from_entry: Option<i32>,
    to_entry: i32,
) -> i32 {
    let penalty = from_entry.map_or(0, |entry| saturate_i32(entry.abs_diff(to_entry)));
    from.max_tile_distance(to).saturating_add(penalty)
}

fn saturate_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

/// Integer percentage, 0 when nothing is required. Saturates at `u32::MAX`.
pub fn calc_percentage(value: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    let pct = u64::from(value) * 100 / u64::from(total);
    u32::try_from(pct).unwrap_or(u32::MAX)
}

// ============================================================================
// Resources
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub enum Resource {
    // Farm produce
    Wheat,
    Vegetables,
    Fruit,
    Olives,
    Vines,
    Meat,
    // Goods
    Wine,
    Oil,
    Iron,
    Timber,
    Clay,
    Marble,
    Weapons,
    Furniture,
    Pottery,
    // Never stored in a bay
    Denarii,
    Troops,
}

/// Workshops that consume a raw material
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub enum Workshop {
    Wine,
    Oil,
    Weapons,
    Furniture,
    Pottery,
}

impl Resource {
    pub const COUNT: usize = 17;

    pub const ALL: [Resource; Resource::COUNT] = [
        Resource::Wheat,
        Resource::Vegetables,
        Resource::Fruit,
        Resource::Olives,
        Resource::Vines,
        Resource::Meat,
        Resource::Wine,
        Resource::Oil,
        Resource::Iron,
        Resource::Timber,
        Resource::Clay,
        Resource::Marble,
        Resource::Weapons,
        Resource::Furniture,
        Resource::Pottery,
        Resource::Denarii,
        Resource::Troops,
    ];

    /// Canonical enum order
    pub fn all() -> impl Iterator<Item = Resource> {
        Self::ALL.into_iter()
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Resource::Wheat => "wheat",
            Resource::Vegetables => "vegetables",
            Resource::Fruit => "fruit",
            Resource::Olives => "olives",
            Resource::Vines => "vines",
            Resource::Meat => "meat",
            Resource::Wine => "wine",
            Resource::Oil => "oil",
            Resource::Iron => "iron",
            Resource::Timber => "timber",
            Resource::Clay => "clay",
            Resource::Marble => "marble",
            Resource::Weapons => "weapons",
            Resource::Furniture => "furniture",
            Resource::Pottery => "pottery",
            Resource::Denarii => "denarii",
            Resource::Troops => "troops",
        }
    }

    pub fn is_food(self) -> bool {
        matches!(
            self,
            Resource::Wheat | Resource::Vegetables | Resource::Fruit | Resource::Meat
        )
    }

    pub fn is_storable(self) -> bool {
        !matches!(self, Resource::Denarii | Resource::Troops)
    }

    /// The workshop this raw material feeds, if any
    pub fn workshop(self) -> Option<Workshop> {
        match self {
            Resource::Vines => Some(Workshop::Wine),
            Resource::Olives => Some(Workshop::Oil),
            Resource::Iron => Some(Workshop::Weapons),
            Resource::Timber => Some(Workshop::Furniture),
            Resource::Clay => Some(Workshop::Pottery),
            _ => None,
        }
    }

    pub fn is_raw_material(self) -> bool {
        self.workshop().is_some()
    }
}

// ============================================================================
// Building lifecycle
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub enum BuildingState {
    Created,
    InUse,
    Rubble,
    DeletedByGame,
    DeletedByPlayer,
}

// ============================================================================
// Traders
// ============================================================================

/// Which kind of trader is asking a warehouse for goods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub enum TraderKind {
    Sea,
    Land,
    Native,
}

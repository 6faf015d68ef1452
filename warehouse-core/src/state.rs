use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

use crate::city::City;
use crate::types::{BuildingState, KeyToU64, Resource, TilePoint};
use crate::warehouse::{BayImage, SpaceInfo, Warehouse, space_info};

// ============================================================================
// Serializable State Snapshot for JS
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct CitySnapshot {
    pub warehouses: Vec<WarehouseSnapshot>,
    /// City-wide warehouse stock, non-zero entries only
    pub stored: Vec<(Resource, u32)>,
    pub last_used_warehouse: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct WarehouseSnapshot {
    pub id: u64,
    pub state: BuildingState,
    pub position: TilePoint,
    pub has_road_access: bool,
    pub road_network_id: u32,
    pub workers: u32,
    pub staffing_pct: u32,
    pub has_plague: bool,
    pub space: SpaceInfo,
    pub free: u32,
    pub stocks: Vec<(Resource, u32)>,
    pub bays: Vec<BaySnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct BaySnapshot {
    pub tile: TilePoint,
    pub resource: Option<Resource>,
    pub loads: u32,
    /// Storage strip frame, `None` for the empty-bay image
    pub frame: Option<u32>,
}

impl WarehouseSnapshot {
    fn capture(wh: &Warehouse, required_laborers: u32) -> Self {
        Self {
            id: wh.id.to_u64(),
            state: wh.state,
            position: wh.position,
            has_road_access: wh.has_road_access(),
            road_network_id: wh.road_network_id,
            workers: wh.num_workers,
            staffing_pct: wh.staffing_pct(required_laborers),
            has_plague: wh.has_plague,
            space: space_info(wh),
            free: wh.tally.free,
            stocks: wh.tally.stocked(),
            bays: wh
                .bays
                .iter()
                .map(|bay| BaySnapshot {
                    tile: bay.tile,
                    resource: bay.resource,
                    loads: bay.loads,
                    frame: match bay.image {
                        BayImage::Empty => None,
                        BayImage::Filled { frame } => Some(frame),
                    },
                })
                .collect(),
        }
    }
}

impl City {
    /// Rendering snapshot of every warehouse and the city totals
    pub fn snapshot(&self) -> CitySnapshot {
        CitySnapshot {
            warehouses: self
                .registry
                .iter()
                .map(|wh| WarehouseSnapshot::capture(wh, self.config.required_laborers))
                .collect(),
            stored: Resource::all()
                .map(|r| (r, self.resources.stored(r)))
                .filter(|(_, loads)| *loads > 0)
                .collect(),
            last_used_warehouse: self.logistics.last_used_warehouse().map(|id| id.to_u64()),
        }
    }
}

// Warehouse logistics: bays, capacity, searches, bulk scans and worker tasks
//
// A warehouse is a 3x3 building: the main tile at its origin plus eight
// storage bays. Each bay holds up to four loads of a single resource.

pub mod bay;
pub mod bulk;
pub mod capacity;
pub mod selector;
pub mod task;

pub use bay::*;
pub use bulk::*;
pub use capacity::*;
pub use selector::*;
pub use task::*;

use serde::{Deserialize, Serialize};

use crate::error::{LogisticsError, LogisticsResult};
use crate::types::{
    BAYS_PER_WAREHOUSE, BuildingId, BuildingState, RoadNetworkId, TilePoint, calc_percentage,
};

/// Footprint offsets of the eight bays, in scan order
const BAY_OFFSETS: [(i32, i32); BAYS_PER_WAREHOUSE] = [
    (1, 0),
    (2, 0),
    (0, 1),
    (1, 1),
    (2, 1),
    (0, 2),
    (1, 2),
    (2, 2),
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Warehouse {
    pub id: BuildingId,
    pub state: BuildingState,
    pub position: TilePoint,
    /// Road tile carts leave from; `None` when cut off from the road grid
    pub road_access: Option<TilePoint>,
    pub road_network_id: RoadNetworkId,
    pub distance_from_entry: i32,
    pub num_workers: u32,
    pub has_plague: bool,
    /// Always eight entries for a well-formed warehouse
    pub bays: Vec<Bay>,
    /// Cached per-resource loads, refreshed by [`recount`]
    pub tally: ResourceTally,
}

impl Warehouse {
    pub fn new(id: BuildingId, position: TilePoint) -> Self {
        let bays = BAY_OFFSETS
            .iter()
            .map(|(dx, dy)| {
                Bay::empty(TilePoint::new(
                    position.x.saturating_add(*dx),
                    position.y.saturating_add(*dy),
                ))
            })
            .collect();
        Self {
            id,
            state: BuildingState::Created,
            position,
            road_access: None,
            road_network_id: 0,
            distance_from_entry: 0,
            num_workers: 0,
            has_plague: false,
            bays,
            tally: ResourceTally::empty(),
        }
    }

    pub fn is_in_use(&self) -> bool {
        self.state == BuildingState::InUse
    }

    pub fn has_road_access(&self) -> bool {
        self.road_access.is_some()
    }

    /// Where carts start and stop: the road access tile, or the building itself
    pub fn access_point(&self) -> TilePoint {
        self.road_access.unwrap_or(self.position)
    }

    pub fn staffing_pct(&self, required_laborers: u32) -> u32 {
        calc_percentage(self.num_workers, required_laborers)
    }

    /// The full bay set, or an error when the record is truncated
    pub fn checked_bays(&self) -> LogisticsResult<&[Bay; BAYS_PER_WAREHOUSE]> {
        <&[Bay; BAYS_PER_WAREHOUSE]>::try_from(self.bays.as_slice())
            .map_err(|_| LogisticsError::MalformedBays(self.id))
    }

    pub fn checked_bays_mut(&mut self) -> LogisticsResult<&mut [Bay; BAYS_PER_WAREHOUSE]> {
        let id = self.id;
        <&mut [Bay; BAYS_PER_WAREHOUSE]>::try_from(self.bays.as_mut_slice())
            .map_err(|_| LogisticsError::MalformedBays(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    #[test]
    fn test_bays_cover_footprint_except_origin() {
        let mut ids: SlotMap<BuildingId, ()> = SlotMap::with_key();
        let wh = Warehouse::new(ids.insert(()), TilePoint::new(10, 20));
        let bays = wh.checked_bays().unwrap();
        assert!(bays.iter().all(|b| b.tile != wh.position));
        assert_eq!(bays[0].tile, TilePoint::new(11, 20));
        assert_eq!(bays[7].tile, TilePoint::new(12, 22));
    }

    #[test]
    fn test_truncated_bays_are_malformed() {
        let mut ids: SlotMap<BuildingId, ()> = SlotMap::with_key();
        let id = ids.insert(());
        let mut wh = Warehouse::new(id, TilePoint::new(0, 0));
        wh.bays.truncate(5);
        assert_eq!(
            wh.checked_bays().unwrap_err(),
            LogisticsError::MalformedBays(id)
        );
    }
}

// Capacity queries: tallies, receptible amounts and space info

use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

use crate::error::{LogisticsError, LogisticsResult};
use crate::storage::{StoragePolicyTable, StorageState};
use crate::types::{Resource, WAREHOUSE_CAPACITY};

use super::Warehouse;
use super::bay::max_space_for_resource;

/// Loads per resource plus the free room left over.
///
/// For a well-formed warehouse `free + loads.sum() == WAREHOUSE_CAPACITY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceTally {
    pub free: u32,
    loads: [u32; Resource::COUNT],
}

impl ResourceTally {
    /// A tally with no loads and no room
    pub fn empty() -> Self {
        Self {
            free: 0,
            loads: [0; Resource::COUNT],
        }
    }

    /// Count the bays. A broken bay set counts as holding nothing with no room.
    pub fn scan(warehouse: &Warehouse) -> Self {
        let mut tally = Self::empty();
        let Ok(bays) = warehouse.checked_bays() else {
            return tally;
        };
        let mut total = 0;
        for bay in bays {
            if let Some(resource) = bay.resource {
                tally.loads[resource.index()] += bay.loads;
                total += bay.loads;
            }
        }
        tally.free = WAREHOUSE_CAPACITY.saturating_sub(total);
        tally
    }

    pub fn get(&self, resource: Resource) -> u32 {
        self.loads[resource.index()]
    }

    pub fn total_loads(&self) -> u32 {
        self.loads.iter().sum()
    }

    /// Stored loads plus free room
    pub fn total(&self) -> u32 {
        self.total_loads() + self.free
    }

    /// Resource with the most loads; ties go to the earlier resource
    pub fn highest(&self) -> Option<Resource> {
        let mut best: Option<(Resource, u32)> = None;
        for resource in Resource::all() {
            let loads = self.get(resource);
            if loads > best.map_or(0, |(_, l)| l) {
                best = Some((resource, loads));
            }
        }
        best.map(|(r, _)| r)
    }

    /// Non-empty resources in enum order
    pub fn stocked(&self) -> Vec<(Resource, u32)> {
        Resource::all()
            .map(|r| (r, self.get(r)))
            .filter(|(_, loads)| *loads > 0)
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub enum SpaceInfo {
    /// At least one bay is empty
    Room,
    /// No empty bay but some bay has space
    SomeRoom,
    Full,
}

/// Loads of a resource stored, from a fresh bay scan
pub fn amount(warehouse: &Warehouse, resource: Resource) -> u32 {
    ResourceTally::scan(warehouse).get(resource)
}

/// Loads a figure may take away: nothing from a quarantined or idle building.
pub fn available_amount(warehouse: &Warehouse, resource: Resource) -> u32 {
    if !warehouse.is_in_use() || warehouse.has_plague {
        return 0;
    }
    amount(warehouse, resource)
}

pub fn space_info(warehouse: &Warehouse) -> SpaceInfo {
    let Ok(bays) = warehouse.checked_bays() else {
        return SpaceInfo::Full;
    };
    if bays.iter().any(|b| b.is_empty()) {
        return SpaceInfo::Room;
    }
    let total: u32 = bays.iter().map(|b| b.loads).sum();
    if total < WAREHOUSE_CAPACITY {
        SpaceInfo::SomeRoom
    } else {
        SpaceInfo::Full
    }
}

/// How many loads of `resource` this warehouse will take right now, or why
/// it takes none.
///
/// Three independent ceilings apply: what policy still allows, what bays
/// holding or free for the resource can fit, and the total free room.
pub fn receptible_amount(
    warehouse: &Warehouse,
    policies: &StoragePolicyTable,
    resource: Resource,
) -> LogisticsResult<u32> {
    warehouse.checked_bays()?;
    let tally = ResourceTally::scan(warehouse);
    let id = warehouse.id;

    if warehouse.has_plague {
        return Err(LogisticsError::Quarantined(id));
    }
    if policies.get_empty_all(id) {
        return Err(LogisticsError::EmptyingAll(id));
    }
    if !warehouse.is_in_use() {
        return Err(LogisticsError::NotInUse(id));
    }
    if tally.free == 0 {
        return Err(LogisticsError::NoCapacity {
            warehouse: id,
            resource,
        });
    }
    if policies.get_state(id, resource, true) == StorageState::NotAccepting {
        return Err(LogisticsError::NotAccepting {
            warehouse: id,
            resource,
        });
    }

    let remaining_allowed = policies
        .quantity_target(id, resource)
        .saturating_sub(tally.get(resource));
    let tile_limit = max_space_for_resource(warehouse, resource);
    let receptible = remaining_allowed.min(tally.free.min(tile_limit));
    if receptible == 0 {
        return Err(LogisticsError::NoCapacity {
            warehouse: id,
            resource,
        });
    }
    Ok(receptible)
}

/// [`receptible_amount`] with every refusal reading as zero
pub fn maximum_receptible_amount(
    warehouse: &Warehouse,
    policies: &StoragePolicyTable,
    resource: Resource,
) -> u32 {
    receptible_amount(warehouse, policies, resource).unwrap_or(0)
}

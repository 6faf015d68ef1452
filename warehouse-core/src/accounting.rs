use serde::{Deserialize, Serialize};

use crate::types::{BuildingId, Resource};

/// City-wide resource counters mirrored from warehouse bays.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CityResources {
    stored_in_warehouses: [u32; Resource::COUNT],
    stockpiled: [bool; Resource::COUNT],
    first_delivery_done: bool,
}

impl CityResources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_to_warehouse(&mut self, resource: Resource, amount: u32) {
        self.stored_in_warehouses[resource.index()] += amount;
    }

    pub fn remove_from_warehouse(&mut self, resource: Resource, amount: u32) {
        let stored = &mut self.stored_in_warehouses[resource.index()];
        *stored = stored.saturating_sub(amount);
    }

    /// Loads of a resource held across all warehouses
    pub fn stored(&self, resource: Resource) -> u32 {
        self.stored_in_warehouses[resource.index()]
    }

    /// Stockpiled resources are held back from workshops, granaries and fetching
    pub fn is_stockpiled(&self, resource: Resource) -> bool {
        self.stockpiled[resource.index()]
    }

    pub fn set_stockpiled(&mut self, resource: Resource, stockpiled: bool) {
        self.stockpiled[resource.index()] = stockpiled;
    }

    pub fn first_delivery_done(&self) -> bool {
        self.first_delivery_done
    }

    /// Latch the first delivery. Returns true only the first time.
    pub fn record_delivery(&mut self) -> bool {
        !std::mem::replace(&mut self.first_delivery_done, true)
    }
}

/// Cross-tick state of the logistics engine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogisticsState {
    /// Warehouse last serviced by a round-robin bulk operation
    last_used_warehouse: Option<BuildingId>,
}

impl LogisticsState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_used_warehouse(&self) -> Option<BuildingId> {
        self.last_used_warehouse
    }

    pub fn set_last_used_warehouse(&mut self, id: BuildingId) {
        self.last_used_warehouse = Some(id);
    }

    pub fn reset(&mut self) {
        self.last_used_warehouse = None;
    }
}

/// Notifications for layers outside the engine (tutorial, messages)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogisticsEvent {
    FirstWarehouseDelivery { warehouse: BuildingId },
    CurseStruck { warehouse: BuildingId, loads: u32 },
}

use wasm_bindgen::prelude::*;

mod accounting;
mod city;
mod config;
mod curse;
mod demand;
mod error;
mod registry;
mod state;
mod storage;
mod types;
pub mod warehouse;

pub use accounting::*;
pub use city::*;
pub use config::*;
pub use curse::*;
pub use demand::*;
pub use error::*;
pub use registry::*;
pub use state::*;
pub use storage::*;
pub use types::*;
pub use warehouse::{
    Bay, BayImage, CartDispatch, DeliveryTarget, ResourceTally, RomeShipment, SpaceInfo,
    StorageRequest, StorageSearch, TaskKind, TradeRequest, Warehouse, WorkerTask,
    count_available_resource, determine_worker_task, for_getting, for_import, for_storing,
    remove_from_warehouses, send_to_rome, with_resource,
};

#[cfg(feature = "instrument")]
pub use instrument;

// ============================================================================
// WASM API - Logistics simulation
// ============================================================================

#[wasm_bindgen]
pub struct LogisticsSim {
    city: City,
    demand: StaticDemand, // Workshop/granary demand pushed in by the host each tick
}

impl Default for LogisticsSim {
    fn default() -> Self {
        Self::new()
    }
}

/// Collapse a rejected operation to zero for the JS side
fn or_zero(result: LogisticsResult<u32>) -> u32 {
    match result {
        Ok(moved) => moved,
        Err(_err) => {
            #[cfg(feature = "instrument")]
            tracing::info!(target: "rejected", reason = %_err);
            0
        }
    }
}

#[wasm_bindgen]
impl LogisticsSim {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        // Better panic messages in browser console
        console_error_panic_hook::set_once();

        Self {
            city: City::new(),
            demand: StaticDemand::new(),
        }
    }

    /// Create a simulation from a JSON `LogisticsConfig`
    #[wasm_bindgen(js_name = withConfig)]
    pub fn with_config(json: &str) -> Result<LogisticsSim, JsError> {
        let config = LogisticsConfig::from_json(json).map_err(|e| JsError::new(&e.to_string()))?;
        let mut sim = Self::new();
        sim.city = City::new().with_config(config);
        Ok(sim)
    }

    // === Buildings ===

    #[wasm_bindgen]
    pub fn build_warehouse(&mut self, x: i32, y: i32) -> u64 {
        self.city.build_warehouse(TilePoint::new(x, y)).to_u64()
    }

    #[wasm_bindgen]
    pub fn activate(&mut self, id: u64) -> bool {
        self.city.activate(building_id_from_u64(id)).is_ok()
    }

    #[wasm_bindgen]
    pub fn connect_road(
        &mut self,
        id: u64,
        x: i32,
        y: i32,
        road_network_id: u32,
        distance_from_entry: i32,
    ) -> bool {
        self.city
            .connect_road(
                building_id_from_u64(id),
                TilePoint::new(x, y),
                road_network_id,
                distance_from_entry,
            )
            .is_ok()
    }

    #[wasm_bindgen]
    pub fn set_workers(&mut self, id: u64, workers: u32) -> bool {
        self.city.set_workers(building_id_from_u64(id), workers).is_ok()
    }

    #[wasm_bindgen]
    pub fn set_plague(&mut self, id: u64, has_plague: bool) -> bool {
        self.city
            .set_plague(building_id_from_u64(id), has_plague)
            .is_ok()
    }

    #[wasm_bindgen]
    pub fn demolish(&mut self, id: u64) -> bool {
        self.city.demolish(building_id_from_u64(id)).is_ok()
    }

    // === Storage Orders ===

    /// Replace a warehouse's whole policy with a serialized `StoragePolicy`
    #[wasm_bindgen]
    pub fn set_policy(&mut self, id: u64, policy: JsValue) -> Result<(), JsError> {
        let policy: StoragePolicy = serde_wasm_bindgen::from_value(policy)?;
        let slot = self
            .city
            .policy_mut(building_id_from_u64(id))
            .map_err(|e| JsError::new(&e.to_string()))?;
        *slot = policy;
        Ok(())
    }

    #[wasm_bindgen]
    pub fn set_storage_state(&mut self, id: u64, resource: Resource, state: StorageState) -> bool {
        match self.city.policy_mut(building_id_from_u64(id)) {
            Ok(policy) => {
                policy.set_state(resource, state);
                true
            }
            Err(_) => false,
        }
    }

    #[wasm_bindgen]
    pub fn set_stockpiled(&mut self, resource: Resource, stockpiled: bool) {
        self.city.resources.set_stockpiled(resource, stockpiled);
    }

    // === Goods ===

    #[wasm_bindgen]
    pub fn add_resource(&mut self, id: u64, resource: Resource, quantity: u32) -> u32 {
        or_zero(
            self.city
                .add_resource(building_id_from_u64(id), resource, quantity),
        )
    }

    #[wasm_bindgen]
    pub fn remove_resource(&mut self, id: u64, resource: Resource, quantity: u32) -> u32 {
        or_zero(
            self.city
                .remove_resource(building_id_from_u64(id), resource, quantity),
        )
    }

    #[wasm_bindgen]
    pub fn maximum_receptible_amount(&self, id: u64, resource: Resource) -> u32 {
        self.city
            .maximum_receptible_amount(building_id_from_u64(id), resource)
    }

    #[wasm_bindgen]
    pub fn send_to_rome(&mut self, resource: Resource, quantity: u32) -> RomeShipment {
        send_to_rome(&mut self.city, resource, quantity)
    }

    #[wasm_bindgen]
    pub fn remove_from_warehouses(&mut self, resource: Resource, quantity: u32) -> u32 {
        remove_from_warehouses(&mut self.city, resource, quantity)
    }

    /// Curse the richest warehouse; returns its id, if one was struck
    #[wasm_bindgen]
    pub fn curse(&mut self) -> Option<u64> {
        strike_richest_warehouse(&mut self.city).map(KeyToU64::to_u64)
    }

    // === Workers ===

    #[wasm_bindgen]
    pub fn set_workshop_room(&mut self, workshop: Workshop, road_network_id: u32, has_room: bool) {
        self.demand
            .set_workshop_room(workshop, road_network_id, has_room);
    }

    #[wasm_bindgen]
    pub fn set_granary_need(&mut self, food: Resource, road_network_id: u32, need: GranaryNeed) {
        self.demand.set_granary_need(food, road_network_id, need);
    }

    #[wasm_bindgen]
    pub fn worker_task(&self, id: u64) -> WorkerTask {
        determine_worker_task(&self.city, building_id_from_u64(id), &self.demand)
    }

    /// Just the kind of the next task, for hosts that only drive animations
    #[wasm_bindgen]
    pub fn worker_task_kind(&self, id: u64) -> TaskKind {
        self.worker_task(id).kind()
    }

    /// Get a snapshot of the current state for rendering
    #[wasm_bindgen]
    pub fn get_snapshot(&self) -> CitySnapshot {
        self.city.snapshot()
    }
}

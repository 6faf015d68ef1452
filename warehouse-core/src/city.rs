// City-level logistics context

use crate::accounting::{CityResources, LogisticsEvent, LogisticsState};
use crate::config::LogisticsConfig;
use crate::error::{LogisticsError, LogisticsResult};
use crate::registry::BuildingRegistry;
use crate::storage::{StoragePolicy, StoragePolicyTable};
#[cfg(feature = "instrument")]
use crate::types::KeyToU64;
use crate::types::{BuildingId, BuildingState, Resource, RoadNetworkId, TilePoint};
use crate::warehouse::{self, Warehouse};

/// Everything the warehouse subsystem reads and writes during a tick
#[derive(Debug, Clone, Default)]
pub struct City {
    pub registry: BuildingRegistry,
    pub policies: StoragePolicyTable,
    pub resources: CityResources,
    pub logistics: LogisticsState,
    pub config: LogisticsConfig,
    events: Vec<LogisticsEvent>,
}

impl City {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: LogisticsConfig) -> Self {
        self.config = config;
        self
    }

    // === Warehouse Lifecycle ===

    /// Place a new warehouse with an accept-everything policy
    pub fn build_warehouse(&mut self, position: TilePoint) -> BuildingId {
        let id = self.registry.insert_warehouse(position);
        self.policies.insert(
            id,
            StoragePolicy::accepting_all(self.config.default_quantity_target),
        );
        if let Some(wh) = self.registry.get_mut(id) {
            warehouse::recount(wh);
        }

        #[cfg(feature = "instrument")]
        tracing::info!(
            target: "warehouse_lifecycle",
            warehouse_id = id.to_u64(),
            event = "built",
            x = position.x as i64,
            y = position.y as i64,
        );

        id
    }

    /// Mark a warehouse as finished and operating
    pub fn activate(&mut self, id: BuildingId) -> LogisticsResult<()> {
        self.warehouse_mut(id)?.state = BuildingState::InUse;
        Ok(())
    }

    pub fn connect_road(
        &mut self,
        id: BuildingId,
        access: TilePoint,
        road_network_id: RoadNetworkId,
        distance_from_entry: i32,
    ) -> LogisticsResult<()> {
        let wh = self.warehouse_mut(id)?;
        wh.road_access = Some(access);
        wh.road_network_id = road_network_id;
        wh.distance_from_entry = distance_from_entry;
        Ok(())
    }

    pub fn disconnect_road(&mut self, id: BuildingId) -> LogisticsResult<()> {
        self.warehouse_mut(id)?.road_access = None;
        Ok(())
    }

    pub fn set_workers(&mut self, id: BuildingId, num_workers: u32) -> LogisticsResult<()> {
        self.warehouse_mut(id)?.num_workers = num_workers;
        Ok(())
    }

    pub fn set_plague(&mut self, id: BuildingId, has_plague: bool) -> LogisticsResult<()> {
        self.warehouse_mut(id)?.has_plague = has_plague;
        Ok(())
    }

    /// Reduce a warehouse to rubble. Its goods leave the city's books.
    pub fn demolish(&mut self, id: BuildingId) -> LogisticsResult<()> {
        let City {
            registry,
            resources,
            logistics,
            ..
        } = self;
        let wh = registry
            .get_mut(id)
            .ok_or(LogisticsError::UnknownWarehouse(id))?;

        let mut lost = 0;
        for bay in wh.bays.iter_mut() {
            if let Some(resource) = bay.resource {
                let taken = bay.take(bay.loads);
                resources.remove_from_warehouse(resource, taken);
                lost += taken;
            }
        }
        wh.state = BuildingState::Rubble;
        warehouse::recount(wh);
        if logistics.last_used_warehouse() == Some(id) {
            logistics.reset();
        }

        #[cfg(feature = "instrument")]
        tracing::info!(
            target: "warehouse_lifecycle",
            warehouse_id = id.to_u64(),
            event = "demolished",
            lost = lost as u64,
        );
        let _ = lost;

        Ok(())
    }

    // === Lookup ===

    pub fn warehouse(&self, id: BuildingId) -> LogisticsResult<&Warehouse> {
        self.registry
            .get(id)
            .ok_or(LogisticsError::UnknownWarehouse(id))
    }

    pub fn warehouse_mut(&mut self, id: BuildingId) -> LogisticsResult<&mut Warehouse> {
        self.registry
            .get_mut(id)
            .ok_or(LogisticsError::UnknownWarehouse(id))
    }

    pub fn policy_mut(&mut self, id: BuildingId) -> LogisticsResult<&mut StoragePolicy> {
        self.policies
            .get_mut(id)
            .ok_or(LogisticsError::UnknownWarehouse(id))
    }

    // === Per-Warehouse Operations ===

    pub fn add_resource(
        &mut self,
        id: BuildingId,
        resource: Resource,
        quantity: u32,
    ) -> LogisticsResult<u32> {
        self.with_delivery_hook(id, |wh, policies, resources| {
            warehouse::add_resource(wh, policies, resources, resource, quantity)
        })
    }

    pub fn try_add_resource(
        &mut self,
        id: BuildingId,
        resource: Resource,
        quantity: u32,
    ) -> LogisticsResult<u32> {
        self.with_delivery_hook(id, |wh, policies, resources| {
            warehouse::try_add_resource(wh, policies, resources, resource, quantity)
        })
    }

    pub fn remove_resource(
        &mut self,
        id: BuildingId,
        resource: Resource,
        quantity: u32,
    ) -> LogisticsResult<u32> {
        let City {
            registry,
            resources,
            ..
        } = self;
        let wh = registry
            .get_mut(id)
            .ok_or(LogisticsError::UnknownWarehouse(id))?;
        warehouse::remove_resource(wh, resources, resource, quantity)
    }

    pub fn try_remove_resource(
        &mut self,
        id: BuildingId,
        resource: Resource,
        quantity: u32,
    ) -> LogisticsResult<u32> {
        let City {
            registry,
            resources,
            ..
        } = self;
        let wh = registry
            .get_mut(id)
            .ok_or(LogisticsError::UnknownWarehouse(id))?;
        warehouse::try_remove_resource(wh, resources, resource, quantity)
    }

    pub fn recount(&mut self, id: BuildingId) -> LogisticsResult<()> {
        warehouse::recount(self.warehouse_mut(id)?);
        Ok(())
    }

    /// Zero for unknown warehouses
    pub fn maximum_receptible_amount(&self, id: BuildingId, resource: Resource) -> u32 {
        self.registry.get(id).map_or(0, |wh| {
            warehouse::maximum_receptible_amount(wh, &self.policies, resource)
        })
    }

    /// Zero for unknown warehouses
    pub fn available_amount(&self, id: BuildingId, resource: Resource) -> u32 {
        self.registry
            .get(id)
            .map_or(0, |wh| warehouse::available_amount(wh, resource))
    }

    // === Events ===

    pub(crate) fn push_event(&mut self, event: LogisticsEvent) {
        self.events.push(event);
    }

    /// Take all notifications queued since the last drain
    pub fn drain_events(&mut self) -> Vec<LogisticsEvent> {
        std::mem::take(&mut self.events)
    }

    fn with_delivery_hook<F>(&mut self, id: BuildingId, op: F) -> LogisticsResult<u32>
    where
        F: FnOnce(&mut Warehouse, &StoragePolicyTable, &mut CityResources) -> LogisticsResult<u32>,
    {
        let City {
            registry,
            policies,
            resources,
            events,
            ..
        } = self;
        let wh = registry
            .get_mut(id)
            .ok_or(LogisticsError::UnknownWarehouse(id))?;
        let delivered_before = resources.first_delivery_done();
        let added = op(wh, policies, resources)?;
        if !delivered_before && resources.first_delivery_done() {
            events.push(LogisticsEvent::FirstWarehouseDelivery { warehouse: id });
        }
        Ok(added)
    }
}

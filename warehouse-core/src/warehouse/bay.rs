// Bay allocator: placing loads into and taking loads out of the eight bays

use serde::{Deserialize, Serialize};

use crate::accounting::CityResources;
use crate::error::{LogisticsError, LogisticsResult};
use crate::storage::StoragePolicyTable;
#[cfg(feature = "instrument")]
use crate::types::KeyToU64;
use crate::types::{BAY_CAPACITY, Resource, TilePoint, WAREHOUSE_CAPACITY};

use super::Warehouse;
use super::capacity::{ResourceTally, receptible_amount};

/// Sprite shown on a bay tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BayImage {
    Empty,
    /// Frame within the storage strip: four fill levels per resource
    Filled { frame: u32 },
}

impl BayImage {
    fn for_contents(resource: Option<Resource>, loads: u32) -> Self {
        match resource {
            Some(r) if loads > 0 => BayImage::Filled {
                frame: r.index() as u32 * BAY_CAPACITY + loads - 1,
            },
            _ => BayImage::Empty,
        }
    }
}

/// One storage slot. `resource` is `None` exactly when `loads` is zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bay {
    pub resource: Option<Resource>,
    pub loads: u32,
    pub tile: TilePoint,
    pub image: BayImage,
}

impl Bay {
    pub fn empty(tile: TilePoint) -> Self {
        Self {
            resource: None,
            loads: 0,
            tile,
            image: BayImage::Empty,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.loads == 0
    }

    pub fn space(&self) -> u32 {
        BAY_CAPACITY.saturating_sub(self.loads)
    }

    pub fn holds(&self, resource: Resource) -> bool {
        self.resource == Some(resource)
    }

    /// Room this bay offers to `resource`: its free space if it already holds
    /// the resource, a full bay if empty, nothing otherwise.
    pub fn space_for(&self, resource: Resource) -> u32 {
        if self.is_empty() {
            BAY_CAPACITY
        } else if self.holds(resource) {
            self.space()
        } else {
            0
        }
    }

    pub fn refresh_image(&mut self) {
        self.image = BayImage::for_contents(self.resource, self.loads);
    }

    fn put(&mut self, resource: Resource, amount: u32) -> u32 {
        let placed = amount.min(self.space_for(resource));
        if placed > 0 {
            self.resource = Some(resource);
            self.loads += placed;
        }
        self.refresh_image();
        placed
    }

    /// Take up to `amount` loads; clears the resource once drained
    pub(crate) fn take(&mut self, amount: u32) -> u32 {
        let taken = amount.min(self.loads);
        self.loads -= taken;
        if self.loads == 0 {
            self.resource = None;
        }
        self.refresh_image();
        taken
    }
}

/// Find a bay for `resource`.
///
/// Adding prefers a partially filled bay of the same resource, then falls
/// back to any bay with room for it. Removing picks the first bay holding the
/// resource. Scan order is bay index order.
pub fn find_bay(warehouse: &Warehouse, resource: Resource, for_adding: bool) -> Option<usize> {
    let bays = warehouse.checked_bays().ok()?;
    if !for_adding {
        return bays.iter().position(|b| b.holds(resource) && b.loads > 0);
    }
    bays.iter()
        .position(|b| b.holds(resource) && b.space() > 0)
        .or_else(|| bays.iter().position(|b| b.space_for(resource) > 0))
}

/// Rebuild the cached tally and every bay image from the bays themselves.
///
/// A warehouse with a broken bay set gets an all-zero tally (no free room).
pub fn recount(warehouse: &mut Warehouse) {
    warehouse.tally = ResourceTally::scan(warehouse);
    if let Ok(bays) = warehouse.checked_bays_mut() {
        for bay in bays.iter_mut() {
            bay.refresh_image();
        }
    }
}

/// Bay-geometry ceiling for a resource: free space in bays already holding
/// it plus every empty bay. Zero for a broken bay set.
pub fn max_space_for_resource(warehouse: &Warehouse, resource: Resource) -> u32 {
    match warehouse.checked_bays() {
        Ok(bays) => bays.iter().map(|b| b.space_for(resource)).sum(),
        Err(_) => 0,
    }
}

fn check_request(resource: Resource, quantity: u32) -> LogisticsResult<()> {
    if quantity == 0 {
        return Err(LogisticsError::InvalidQuantity);
    }
    if !resource.is_storable() {
        return Err(LogisticsError::UnstorableResource(resource));
    }
    Ok(())
}

/// Put loads into bays regardless of policy, up to what the bays can hold.
pub(crate) fn place_loads(
    warehouse: &mut Warehouse,
    resources: &mut CityResources,
    resource: Resource,
    quantity: u32,
) -> LogisticsResult<u32> {
    check_request(resource, quantity)?;
    warehouse.checked_bays()?;

    let mut remaining = quantity;
    while remaining > 0 {
        let Some(index) = find_bay(warehouse, resource, true) else {
            break;
        };
        let placed = warehouse.bays[index].put(resource, remaining);
        if placed == 0 {
            break;
        }
        resources.add_to_warehouse(resource, placed);
        remaining -= placed;
    }

    let added = quantity - remaining;
    recount(warehouse);
    if added > 0 {
        resources.record_delivery();
    }

    #[cfg(feature = "instrument")]
    tracing::info!(
        target: "warehouse_add",
        warehouse_id = warehouse.id.to_u64(),
        resource = resource.name(),
        requested = quantity as u64,
        added = added as u64,
    );

    Ok(added)
}

/// Store up to `quantity` loads, clamped to what policy and bays allow.
/// Returns the amount actually stored.
pub fn add_resource(
    warehouse: &mut Warehouse,
    policies: &StoragePolicyTable,
    resources: &mut CityResources,
    resource: Resource,
    quantity: u32,
) -> LogisticsResult<u32> {
    check_request(resource, quantity)?;
    let receptible = receptible_amount(warehouse, policies, resource)?;
    place_loads(warehouse, resources, resource, quantity.min(receptible))
}

/// Store exactly `quantity` loads or nothing at all.
pub fn try_add_resource(
    warehouse: &mut Warehouse,
    policies: &StoragePolicyTable,
    resources: &mut CityResources,
    resource: Resource,
    quantity: u32,
) -> LogisticsResult<u32> {
    check_request(resource, quantity)?;
    let receptible = receptible_amount(warehouse, policies, resource)?;
    if receptible < quantity {
        return Err(LogisticsError::NoCapacity {
            warehouse: warehouse.id,
            resource,
        });
    }
    place_loads(warehouse, resources, resource, quantity)
}

/// Drain loads of a resource in bay order without any gate.
pub(crate) fn drain_loads(
    warehouse: &mut Warehouse,
    resources: &mut CityResources,
    resource: Resource,
    quantity: u32,
) -> LogisticsResult<u32> {
    check_request(resource, quantity)?;
    let bays = warehouse.checked_bays_mut()?;

    let mut remaining = quantity;
    for bay in bays.iter_mut() {
        if remaining == 0 {
            break;
        }
        if !bay.holds(resource) {
            continue;
        }
        let taken = bay.take(remaining);
        resources.remove_from_warehouse(resource, taken);
        remaining -= taken;
    }

    let removed = quantity - remaining;
    recount(warehouse);

    #[cfg(feature = "instrument")]
    tracing::info!(
        target: "warehouse_remove",
        warehouse_id = warehouse.id.to_u64(),
        resource = resource.name(),
        requested = quantity as u64,
        removed = removed as u64,
    );

    Ok(removed)
}

/// Take up to `quantity` loads. Quarantined warehouses give nothing.
pub fn remove_resource(
    warehouse: &mut Warehouse,
    resources: &mut CityResources,
    resource: Resource,
    quantity: u32,
) -> LogisticsResult<u32> {
    if warehouse.has_plague {
        return Err(LogisticsError::Quarantined(warehouse.id));
    }
    drain_loads(warehouse, resources, resource, quantity)
}

/// Take exactly `quantity` loads from a usable warehouse, or nothing.
pub fn try_remove_resource(
    warehouse: &mut Warehouse,
    resources: &mut CityResources,
    resource: Resource,
    quantity: u32,
) -> LogisticsResult<u32> {
    check_request(resource, quantity)?;
    if warehouse.has_plague {
        return Err(LogisticsError::Quarantined(warehouse.id));
    }
    if !warehouse.is_in_use() {
        return Err(LogisticsError::NotInUse(warehouse.id));
    }
    let stored = ResourceTally::scan(warehouse).get(resource);
    if stored < quantity {
        return Err(LogisticsError::InsufficientStock {
            warehouse: warehouse.id,
            resource,
            stored,
        });
    }
    drain_loads(warehouse, resources, resource, quantity)
}

/// Free loads left in the whole warehouse
pub fn free_loads(warehouse: &Warehouse) -> u32 {
    match warehouse.checked_bays() {
        Ok(bays) => WAREHOUSE_CAPACITY - bays.iter().map(|b| b.loads).sum::<u32>(),
        Err(_) => 0,
    }
}

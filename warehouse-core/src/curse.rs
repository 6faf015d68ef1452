// Divine curses: goods destroyed regardless of orders or quarantine

use crate::accounting::{CityResources, LogisticsEvent};
use crate::city::City;
#[cfg(feature = "instrument")]
use crate::types::KeyToU64;
use crate::types::BuildingId;
use crate::warehouse::{ResourceTally, Warehouse, recount};

/// Destroy up to `quantity` loads, bay by bay, whatever they hold.
/// Returns the loads destroyed.
pub fn remove_resource_curse(
    warehouse: &mut Warehouse,
    resources: &mut CityResources,
    quantity: u32,
) -> u32 {
    let Ok(bays) = warehouse.checked_bays_mut() else {
        return 0;
    };
    let mut remaining = quantity;
    for bay in bays.iter_mut() {
        if remaining == 0 {
            break;
        }
        let Some(resource) = bay.resource else {
            continue;
        };
        let taken = bay.take(remaining);
        resources.remove_from_warehouse(resource, taken);
        remaining -= taken;
    }
    recount(warehouse);
    quantity - remaining
}

/// Curse the in-use warehouse holding the most goods. Ties go to the
/// earlier warehouse. Returns the warehouse struck, if any held goods.
pub fn strike_richest_warehouse(city: &mut City) -> Option<BuildingId> {
    let mut richest: Option<(BuildingId, u32)> = None;
    for wh in city.registry.iter().filter(|wh| wh.is_in_use()) {
        let stored = ResourceTally::scan(wh).total_loads();
        if stored > richest.map_or(0, |(_, most)| most) {
            richest = Some((wh.id, stored));
        }
    }
    let (id, _) = richest?;

    let loads = city.config.curse_loads;
    let City {
        registry,
        resources,
        ..
    } = &mut *city;
    let wh = registry.get_mut(id)?;
    let destroyed = remove_resource_curse(wh, resources, loads);

    #[cfg(feature = "instrument")]
    tracing::info!(
        target: "warehouse_curse",
        warehouse_id = id.to_u64(),
        destroyed = destroyed as u64,
    );

    city.push_event(LogisticsEvent::CurseStruck {
        warehouse: id,
        loads: destroyed,
    });
    Some(id)
}

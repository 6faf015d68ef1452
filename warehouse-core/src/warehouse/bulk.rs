// City-wide bulk operations that rotate fairly across warehouses

use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

use crate::city::City;
use crate::storage::StorageState;
#[cfg(feature = "instrument")]
use crate::types::KeyToU64;
use crate::types::{BuildingId, Resource, TilePoint};

use super::Warehouse;
use super::bay::drain_loads;
use super::capacity::{amount, available_amount};

/// A cart leaving a warehouse for the capital
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartDispatch {
    pub warehouse: BuildingId,
    pub origin: TilePoint,
    pub resource: Resource,
    pub loads: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct RomeShipment {
    pub sent: u32,
    #[tsify(type = "unknown[]")]
    pub carts: Vec<CartDispatch>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BulkPass {
    /// Only warehouses willing to give the resource away
    Voluntary,
    /// Any warehouse in use, whatever its orders
    Forced,
}

impl BulkPass {
    #[cfg(feature = "instrument")]
    fn name(self) -> &'static str {
        match self {
            BulkPass::Voluntary => "voluntary",
            BulkPass::Forced => "forced",
        }
    }
}

/// Take `quantity` loads from warehouses in ring order starting after the
/// fairness cursor. The cursor moves to each warehouse as it gives goods up.
fn round_robin_drain<F>(city: &mut City, resource: Resource, quantity: u32, mut on_drained: F) -> u32
where
    F: FnMut(&Warehouse, u32),
{
    let mut remaining = quantity;

    for pass in [BulkPass::Voluntary, BulkPass::Forced] {
        if remaining == 0 {
            break;
        }
        let ring = city.registry.ring_after(city.logistics.last_used_warehouse());
        let City {
            registry,
            policies,
            resources,
            logistics,
            ..
        } = &mut *city;

        for id in ring {
            if remaining == 0 {
                break;
            }
            let Some(wh) = registry.get_mut(id) else {
                continue;
            };
            if !wh.is_in_use() || wh.has_plague {
                continue;
            }
            if pass == BulkPass::Voluntary
                && !policies.get_state(id, resource, true).permits_getting()
            {
                continue;
            }
            if amount(wh, resource) == 0 {
                continue;
            }
            let Ok(taken) = drain_loads(wh, resources, resource, remaining) else {
                continue;
            };
            logistics.set_last_used_warehouse(id);
            remaining -= taken;

            #[cfg(feature = "instrument")]
            tracing::info!(
                target: "bulk_remove",
                warehouse_id = id.to_u64(),
                resource = resource.name(),
                loads = taken as u64,
                pass = pass.name(),
            );

            on_drained(wh, taken);
        }
    }

    quantity - remaining
}

/// Withdraw goods from the city's stock (construction, requests, famine
/// relief). Returns the loads actually removed.
pub fn remove_from_warehouses(city: &mut City, resource: Resource, quantity: u32) -> u32 {
    if quantity == 0 || !resource.is_storable() {
        return 0;
    }
    round_robin_drain(city, resource, quantity, |_, _| {})
}

/// Ship goods to the capital, one cart per warehouse drained.
pub fn send_to_rome(city: &mut City, resource: Resource, quantity: u32) -> RomeShipment {
    if quantity == 0 || !resource.is_storable() {
        return RomeShipment::default();
    }
    let mut carts = Vec::new();
    let sent = round_robin_drain(city, resource, quantity, |wh, loads| {
        carts.push(CartDispatch {
            warehouse: wh.id,
            origin: wh.access_point(),
            resource,
            loads,
        });
    });

    #[cfg(feature = "instrument")]
    tracing::info!(
        target: "rome_shipment",
        resource = resource.name(),
        requested = quantity as u64,
        sent = sent as u64,
        carts = carts.len() as u64,
    );

    RomeShipment { sent, carts }
}

/// Loads of a resource figures could take from all warehouses. With
/// `respect_maintaining`, maintaining warehouses are left out.
pub fn count_available_resource(city: &City, resource: Resource, respect_maintaining: bool) -> u32 {
    city.registry
        .iter()
        .filter(|wh| {
            !respect_maintaining
                || city.policies.get_state(wh.id, resource, true) != StorageState::Maintaining
        })
        .map(|wh| available_amount(wh, resource))
        .sum()
}

// Warehouse searches: where to store, where to fetch, where traders go
//
// Every search walks warehouses in traversal order, keeps a running minimum
// of its metric and only replaces it on a strictly smaller value, so ties go
// to the first warehouse found.

use serde::{Deserialize, Serialize};

use crate::city::City;
use crate::storage::{StoragePermission, StorageState};
#[cfg(feature = "instrument")]
use crate::types::KeyToU64;
use crate::types::{BuildingId, Resource, RoadNetworkId, TilePoint, TraderKind, distance_with_penalty};

use super::Warehouse;
use super::bay::max_space_for_resource;
use super::capacity::{amount, maximum_receptible_amount};

/// A cart looking for somewhere to unload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageRequest {
    /// Building the goods come from; never chosen as destination
    pub source: Option<BuildingId>,
    pub at: TilePoint,
    pub resource: Resource,
    pub distance_from_entry: Option<i32>,
    pub road_network_id: RoadNetworkId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StorageSearch {
    pub warehouse: Option<BuildingId>,
    /// Otherwise suitable warehouses skipped for lack of workers
    pub understaffed: u32,
}

/// A trader buying from (export) or selling to (import) the city
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeRequest {
    pub source: Option<BuildingId>,
    pub at: TilePoint,
    pub resource: Resource,
    pub distance_from_entry: Option<i32>,
    pub road_network_id: RoadNetworkId,
    pub trader: TraderKind,
}

/// Running minimum with first-seen tie-break
struct Nearest {
    best: Option<(BuildingId, i32)>,
}

impl Nearest {
    fn new() -> Self {
        Self { best: None }
    }

    fn offer(&mut self, id: BuildingId, metric: i32) {
        if self.best.is_none_or(|(_, min)| metric < min) {
            self.best = Some((id, metric));
        }
    }

    fn id(&self) -> Option<BuildingId> {
        self.best.map(|(id, _)| id)
    }
}

/// Distance less a per-load bonus; bigger stocks look closer
fn discounted(dist: i32, weight: i32, loads: u32) -> i32 {
    let loads = i32::try_from(loads).unwrap_or(i32::MAX);
    dist.saturating_sub(weight.saturating_mul(loads))
}

fn reachable_from(wh: &Warehouse, road_network_id: RoadNetworkId) -> bool {
    wh.has_road_access() && wh.road_network_id == road_network_id
}

fn fully_staffed(city: &City, wh: &Warehouse) -> bool {
    wh.staffing_pct(city.config.required_laborers) >= city.config.full_staffing_pct
}

/// Nearest warehouse that will take at least one load of the request's resource.
pub fn for_storing(city: &City, request: &StorageRequest) -> StorageSearch {
    let mut nearest = Nearest::new();
    let mut understaffed = 0;
    let resource = request.resource;

    for wh in city.registry.iter() {
        if Some(wh.id) == request.source || !wh.is_in_use() {
            continue;
        }
        if !reachable_from(wh, request.road_network_id) {
            continue;
        }
        if city.policies.get_state(wh.id, resource, true) == StorageState::NotAccepting
            || city.policies.get_empty_all(wh.id)
        {
            continue;
        }
        if !fully_staffed(city, wh) {
            understaffed += 1;
            continue;
        }
        if max_space_for_resource(wh, resource) == 0
            || maximum_receptible_amount(wh, &city.policies, resource) == 0
        {
            continue;
        }
        let dist = distance_with_penalty(
            request.at,
            wh.position,
            request.distance_from_entry,
            wh.distance_from_entry,
        );
        nearest.offer(wh.id, dist);
    }

    #[cfg(feature = "instrument")]
    tracing::info!(
        target: "storage_search",
        search = "for_storing",
        resource = resource.name(),
        found = nearest.id().map_or(0, |id| id.to_u64()),
        understaffed = understaffed as u64,
    );

    StorageSearch {
        warehouse: nearest.id(),
        understaffed,
    }
}

/// Best warehouse for `requester` to fetch `resource` from: close, and
/// holding a lot of it.
pub fn for_getting(city: &City, requester: BuildingId, resource: Resource) -> Option<BuildingId> {
    let src = city.registry.get(requester)?;
    let weight = city.config.getting_load_weight;
    let mut nearest = Nearest::new();

    for wh in city.registry.iter() {
        if wh.id == requester || !wh.is_in_use() || wh.has_plague {
            continue;
        }
        if !city
            .policies
            .get_state(wh.id, resource, true)
            .permits_getting()
        {
            continue;
        }
        let loads = amount(wh, resource);
        if loads == 0 {
            continue;
        }
        let dist = distance_with_penalty(
            src.position,
            wh.position,
            Some(src.distance_from_entry),
            wh.distance_from_entry,
        );
        nearest.offer(wh.id, discounted(dist, weight, loads));
    }

    nearest.id()
}

/// Warehouse a trader should buy `resource` from
pub fn with_resource(city: &City, request: &TradeRequest) -> Option<BuildingId> {
    let weight = city.config.trade_load_weight;
    let permission = StoragePermission::from(request.trader);
    let mut nearest = Nearest::new();

    for wh in city.registry.iter() {
        if Some(wh.id) == request.source || !wh.is_in_use() || wh.has_plague {
            continue;
        }
        if !reachable_from(wh, request.road_network_id)
            || !city.policies.get_permission(permission, wh.id)
            || !fully_staffed(city, wh)
        {
            continue;
        }
        let loads = amount(wh, request.resource);
        if loads == 0 {
            continue;
        }
        let dist = distance_with_penalty(
            request.at,
            wh.position,
            request.distance_from_entry,
            wh.distance_from_entry,
        );
        nearest.offer(wh.id, discounted(dist, weight, loads));
    }

    nearest.id()
}

/// Warehouse a trader should sell `resource` into
pub fn for_import(city: &City, request: &TradeRequest) -> Option<BuildingId> {
    let permission = StoragePermission::from(request.trader);
    let mut nearest = Nearest::new();

    for wh in city.registry.iter() {
        if Some(wh.id) == request.source || !wh.is_in_use() || wh.has_plague {
            continue;
        }
        if !reachable_from(wh, request.road_network_id)
            || !city.policies.get_permission(permission, wh.id)
            || !fully_staffed(city, wh)
        {
            continue;
        }
        if maximum_receptible_amount(wh, &city.policies, request.resource) == 0 {
            continue;
        }
        let dist = distance_with_penalty(
            request.at,
            wh.position,
            request.distance_from_entry,
            wh.distance_from_entry,
        );
        nearest.offer(wh.id, dist);
    }

    nearest.id()
}

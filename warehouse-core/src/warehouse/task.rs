// Worker task selection for an idle warehouse worker

use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

use crate::city::City;
use crate::demand::{GranaryNeed, SupplyDemand};
use crate::storage::{StoragePermission, StorageState};
#[cfg(feature = "instrument")]
use crate::types::KeyToU64;
use crate::types::{BuildingId, Resource, Workshop};

use super::Warehouse;
use super::bay::find_bay;
use super::capacity::{ResourceTally, maximum_receptible_amount};
use super::selector::for_getting;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub enum TaskKind {
    None,
    Getting,
    Delivering,
}

/// Where a delivering worker is headed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub enum DeliveryTarget {
    /// Liquidating the warehouse; the destination is found by the cart
    EmptyAll,
    Workshop(Workshop),
    Granary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub enum WorkerTask {
    Idle,
    Getting {
        resource: Resource,
    },
    Delivering {
        resource: Resource,
        target: DeliveryTarget,
    },
}

impl WorkerTask {
    pub fn kind(&self) -> TaskKind {
        match self {
            WorkerTask::Idle => TaskKind::None,
            WorkerTask::Getting { .. } => TaskKind::Getting,
            WorkerTask::Delivering { .. } => TaskKind::Delivering,
        }
    }

    pub fn resource(&self) -> Option<Resource> {
        match self {
            WorkerTask::Idle => None,
            WorkerTask::Getting { resource } | WorkerTask::Delivering { resource, .. } => {
                Some(*resource)
            }
        }
    }
}

/// Pick the next job for a warehouse's worker. First match wins:
/// empty-all liquidation, fetching a resource the warehouse is getting,
/// raw materials to workshops, food to granaries.
pub fn determine_worker_task<D: SupplyDemand + ?Sized>(
    city: &City,
    warehouse: BuildingId,
    demand: &D,
) -> WorkerTask {
    let Some(wh) = city.registry.get(warehouse) else {
        return WorkerTask::Idle;
    };
    let task = select_task(city, wh, demand);

    #[cfg(feature = "instrument")]
    tracing::info!(
        target: "worker_task",
        warehouse_id = warehouse.to_u64(),
        task = ?task.kind(),
        resource = task.resource().map_or("none", Resource::name),
    );

    task
}

fn select_task<D: SupplyDemand + ?Sized>(city: &City, wh: &Warehouse, demand: &D) -> WorkerTask {
    if !wh.is_in_use() || wh.has_plague {
        return WorkerTask::Idle;
    }
    if wh.staffing_pct(city.config.required_laborers) < city.config.min_task_staffing_pct {
        return WorkerTask::Idle;
    }
    let tally = ResourceTally::scan(wh);

    if let Some(task) = empty_all_task(city, wh, &tally) {
        return task;
    }
    if let Some(task) = getting_task(city, wh) {
        return task;
    }
    if let Some(task) = workshop_task(city, wh, &tally, demand) {
        return task;
    }
    if let Some(task) = granary_task(city, wh, &tally, demand) {
        return task;
    }
    WorkerTask::Idle
}

fn empty_all_task(city: &City, wh: &Warehouse, tally: &ResourceTally) -> Option<WorkerTask> {
    if !city.policies.get_empty_all(wh.id) {
        return None;
    }
    let resource = tally.highest()?;
    find_bay(wh, resource, false)?;
    Some(WorkerTask::Delivering {
        resource,
        target: DeliveryTarget::EmptyAll,
    })
}

fn getting_task(city: &City, wh: &Warehouse) -> Option<WorkerTask> {
    Resource::all()
        .filter(|r| city.policies.get_state(wh.id, *r, false) == StorageState::Getting)
        .filter(|r| r.is_storable() && !city.resources.is_stockpiled(*r))
        .find(|r| {
            maximum_receptible_amount(wh, &city.policies, *r) >= city.config.getting_threshold
                && for_getting(city, wh.id, *r).is_some()
        })
        .map(|resource| WorkerTask::Getting { resource })
}

/// Stored loads of a resource the worker may hand out
fn deliverable(city: &City, wh: &Warehouse, tally: &ResourceTally, resource: Resource) -> bool {
    tally.get(resource) > 0
        && !city.resources.is_stockpiled(resource)
        && city.policies.get_state(wh.id, resource, true) != StorageState::Maintaining
}

fn workshop_task<D: SupplyDemand + ?Sized>(
    city: &City,
    wh: &Warehouse,
    tally: &ResourceTally,
    demand: &D,
) -> Option<WorkerTask> {
    if !city
        .policies
        .get_permission(StoragePermission::Workers, wh.id)
    {
        return None;
    }
    Resource::all()
        .filter(|r| !r.is_food() && deliverable(city, wh, tally, *r))
        .find_map(|resource| {
            let workshop = resource.workshop()?;
            demand
                .workshop_has_room(workshop, wh.road_network_id)
                .then_some(WorkerTask::Delivering {
                    resource,
                    target: DeliveryTarget::Workshop(workshop),
                })
        })
}

fn granary_task<D: SupplyDemand + ?Sized>(
    city: &City,
    wh: &Warehouse,
    tally: &ResourceTally,
    demand: &D,
) -> Option<WorkerTask> {
    let mut fallback = None;
    for resource in Resource::all().filter(|r| r.is_food()) {
        if resource == Resource::Wheat && city.config.rome_supplies_wheat {
            continue;
        }
        if !deliverable(city, wh, tally, resource) {
            continue;
        }
        match demand.granary_need(resource, wh.road_network_id) {
            GranaryNeed::Getting => {
                fallback = Some(resource);
                break;
            }
            GranaryNeed::Accepting if fallback.is_none() => fallback = Some(resource),
            _ => {}
        }
    }
    fallback.map(|resource| WorkerTask::Delivering {
        resource,
        target: DeliveryTarget::Granary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demand::StaticDemand;
    use crate::types::TilePoint;

    const NET: u32 = 1;

    fn warehouse(city: &mut City, x: i32) -> BuildingId {
        let id = city.build_warehouse(TilePoint::new(x, 0));
        city.activate(id).unwrap();
        city.connect_road(id, TilePoint::new(x, -1), NET, 0).unwrap();
        city.set_workers(id, 6).unwrap();
        id
    }

    #[test]
    fn test_half_staffing_required() {
        let mut city = City::new();
        let id = warehouse(&mut city, 0);
        city.add_resource(id, Resource::Oil, 4).unwrap();
        city.policy_mut(id).unwrap().empty_all = true;
        city.set_workers(id, 2).unwrap();
        assert_eq!(
            determine_worker_task(&city, id, &StaticDemand::new()),
            WorkerTask::Idle
        );
        city.set_workers(id, 3).unwrap();
        assert_eq!(
            determine_worker_task(&city, id, &StaticDemand::new()).kind(),
            TaskKind::Delivering
        );
    }

    #[test]
    fn test_oversized_workforce_counts_as_staffed() {
        let mut city = City::new();
        let id = warehouse(&mut city, 0);
        city.add_resource(id, Resource::Iron, 4).unwrap();
        city.set_workers(id, 50_000_000).unwrap();
        let demand = StaticDemand::new().with_workshop(Workshop::Weapons, NET);
        assert_eq!(
            determine_worker_task(&city, id, &demand),
            WorkerTask::Delivering {
                resource: Resource::Iron,
                target: DeliveryTarget::Workshop(Workshop::Weapons)
            }
        );
        assert!(city.snapshot().warehouses[0].staffing_pct > 100);
    }

    #[test]
    fn test_empty_all_takes_biggest_stock() {
        let mut city = City::new();
        let id = warehouse(&mut city, 0);
        city.add_resource(id, Resource::Oil, 3).unwrap();
        city.add_resource(id, Resource::Pottery, 9).unwrap();
        city.policy_mut(id).unwrap().empty_all = true;
        assert_eq!(
            determine_worker_task(&city, id, &StaticDemand::new()),
            WorkerTask::Delivering {
                resource: Resource::Pottery,
                target: DeliveryTarget::EmptyAll
            }
        );
    }

    #[test]
    fn test_empty_all_on_empty_warehouse_falls_through() {
        let mut city = City::new();
        let id = warehouse(&mut city, 0);
        city.policy_mut(id).unwrap().empty_all = true;
        assert_eq!(
            determine_worker_task(&city, id, &StaticDemand::new()),
            WorkerTask::Idle
        );
    }

    #[test]
    fn test_getting_needs_room_and_source() {
        let mut city = City::new();
        let me = warehouse(&mut city, 0);
        city.policy_mut(me)
            .unwrap()
            .set_state(Resource::Timber, StorageState::Getting);
        let demand = StaticDemand::new();
        assert_eq!(determine_worker_task(&city, me, &demand), WorkerTask::Idle);

        let other = warehouse(&mut city, 10);
        city.add_resource(other, Resource::Timber, 4).unwrap();
        assert_eq!(
            determine_worker_task(&city, me, &demand),
            WorkerTask::Getting {
                resource: Resource::Timber
            }
        );

        city.resources.set_stockpiled(Resource::Timber, true);
        assert_eq!(determine_worker_task(&city, me, &demand), WorkerTask::Idle);
    }

    #[test]
    fn test_maintaining_also_fetches() {
        let mut city = City::new();
        let me = warehouse(&mut city, 0);
        let other = warehouse(&mut city, 5);
        city.add_resource(other, Resource::Wine, 6).unwrap();
        city.policy_mut(me)
            .unwrap()
            .set_state(Resource::Wine, StorageState::Maintaining);
        assert_eq!(
            determine_worker_task(&city, me, &StaticDemand::new()),
            WorkerTask::Getting {
                resource: Resource::Wine
            }
        );
    }

    #[test]
    fn test_getting_below_one_bay_of_room_idles() {
        let mut city = City::new();
        let me = warehouse(&mut city, 0);
        let other = warehouse(&mut city, 5);
        city.add_resource(other, Resource::Iron, 4).unwrap();
        let policy = city.policy_mut(me).unwrap();
        policy.set_state(Resource::Iron, StorageState::Getting);
        policy.set_quantity_target(Resource::Iron, 3);
        assert_eq!(
            determine_worker_task(&city, me, &StaticDemand::new()),
            WorkerTask::Idle
        );
    }

    #[test]
    fn test_raw_material_to_workshop() {
        let mut city = City::new();
        let id = warehouse(&mut city, 0);
        city.add_resource(id, Resource::Marble, 4).unwrap();
        city.add_resource(id, Resource::Clay, 4).unwrap();
        city.add_resource(id, Resource::Iron, 4).unwrap();
        let demand = StaticDemand::new()
            .with_workshop(Workshop::Pottery, NET)
            .with_workshop(Workshop::Weapons, NET);
        assert_eq!(
            determine_worker_task(&city, id, &demand),
            WorkerTask::Delivering {
                resource: Resource::Iron,
                target: DeliveryTarget::Workshop(Workshop::Weapons)
            }
        );

        city.policy_mut(id)
            .unwrap()
            .permissions
            .set(StoragePermission::Workers, false);
        assert_eq!(determine_worker_task(&city, id, &demand), WorkerTask::Idle);
    }

    #[test]
    fn test_workshop_skips_maintained_material() {
        let mut city = City::new();
        let id = warehouse(&mut city, 0);
        city.add_resource(id, Resource::Olives, 4).unwrap();
        city.policy_mut(id)
            .unwrap()
            .set_state(Resource::Olives, StorageState::Maintaining);
        let demand = StaticDemand::new().with_workshop(Workshop::Oil, NET);
        assert_eq!(determine_worker_task(&city, id, &demand), WorkerTask::Idle);
    }

    #[test]
    fn test_granary_prefers_getting_need() {
        let mut city = City::new();
        let id = warehouse(&mut city, 0);
        city.add_resource(id, Resource::Wheat, 4).unwrap();
        city.add_resource(id, Resource::Meat, 4).unwrap();
        let demand = StaticDemand::new()
            .with_granary(Resource::Wheat, NET, GranaryNeed::Accepting)
            .with_granary(Resource::Meat, NET, GranaryNeed::Getting);
        assert_eq!(
            determine_worker_task(&city, id, &demand),
            WorkerTask::Delivering {
                resource: Resource::Meat,
                target: DeliveryTarget::Granary
            }
        );

        let demand = StaticDemand::new()
            .with_granary(Resource::Wheat, NET, GranaryNeed::Accepting)
            .with_granary(Resource::Meat, NET, GranaryNeed::Accepting);
        assert_eq!(
            determine_worker_task(&city, id, &demand).resource(),
            Some(Resource::Wheat)
        );
    }

    #[test]
    fn test_rome_wheat_skips_wheat() {
        let mut city = City::new();
        city.config.rome_supplies_wheat = true;
        let id = warehouse(&mut city, 0);
        city.add_resource(id, Resource::Wheat, 4).unwrap();
        let demand = StaticDemand::new().with_granary(Resource::Wheat, NET, GranaryNeed::Getting);
        assert_eq!(determine_worker_task(&city, id, &demand), WorkerTask::Idle);
    }
}

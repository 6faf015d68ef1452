use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use warehouse_core::{
    BuildingId, City, LogisticsError, Resource, StorageRequest, StorageState, TilePoint, distance_with_penalty,
    for_getting, for_storing, remove_from_warehouses,
};

const NET: u32 = 3;

const GOODS: [Resource; 4] = [Resource::Oil, Resource::Wine, Resource::Clay, Resource::Fruit];

fn random_state(rng: &mut StdRng) -> StorageState {
    match rng.random_range(0..4) {
        0 => StorageState::NotAccepting,
        1 => StorageState::Accepting,
        2 => StorageState::Getting,
        _ => StorageState::Maintaining,
    }
}

/// A road-connected, fully staffed city with random stock and orders.
fn random_city(rng: &mut StdRng, n: usize) -> (City, Vec<BuildingId>) {
    let mut city = City::new();
    let mut ids = Vec::new();
    for _ in 0..n {
        let at = TilePoint::new(rng.random_range(0..40), rng.random_range(0..40));
        let id = city.build_warehouse(at);
        city.activate(id).unwrap();
        city.connect_road(id, at, NET, rng.random_range(0..30))
            .unwrap();
        city.set_workers(id, city.config.required_laborers).unwrap();
        for _ in 0..rng.random_range(0..6) {
            let r = GOODS[rng.random_range(0..GOODS.len())];
            let _ = city.add_resource(id, r, rng.random_range(1..=8));
        }
        for r in GOODS {
            let state = random_state(rng);
            let policy = city.policy_mut(id).unwrap();
            policy.set_state(r, state);
            policy.set_quantity_target(r, rng.random_range(4..=32));
        }
        ids.push(id);
    }
    (city, ids)
}

#[test]
fn property_add_stores_exactly_the_receptible_clamp() {
    for seed in 0..20u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let (mut city, ids) = random_city(&mut rng, 3);

        for _ in 0..60 {
            let id = ids[rng.random_range(0..ids.len())];
            let r = GOODS[rng.random_range(0..GOODS.len())];
            let q = rng.random_range(1..=12);
            let room = city.maximum_receptible_amount(id, r);
            let before = city.resources.stored(r);

            match city.add_resource(id, r, q) {
                Ok(added) => {
                    assert_eq!(added, q.min(room), "seed {seed}");
                    assert_eq!(city.resources.stored(r), before + added);
                }
                Err(_) => assert_eq!(room, 0, "seed {seed}: refused with room {room}"),
            }
        }
    }
}

#[test]
fn property_try_add_is_all_or_nothing() {
    for seed in 0..20u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let (mut city, ids) = random_city(&mut rng, 2);

        for _ in 0..40 {
            let id = ids[rng.random_range(0..ids.len())];
            let r = GOODS[rng.random_range(0..GOODS.len())];
            let q = rng.random_range(1..=16);
            let room = city.maximum_receptible_amount(id, r);
            let before = city.resources.stored(r);

            match city.try_add_resource(id, r, q) {
                Ok(added) => {
                    assert_eq!(added, q);
                    assert!(q <= room);
                }
                Err(_) => {
                    assert!(q > room);
                    assert_eq!(city.resources.stored(r), before);
                }
            }
        }
    }
}

#[test]
fn property_bulk_drain_takes_min_of_request_and_reachable_stock() {
    for seed in 0..20u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let (mut city, ids) = random_city(&mut rng, 5);
        if rng.random_bool(0.5) {
            city.set_plague(ids[0], true).unwrap();
        }

        for r in GOODS {
            let reachable: u32 = city
                .registry
                .iter()
                .filter(|wh| !wh.has_plague)
                .map(|wh| wh.tally.get(r))
                .sum();
            let before = city.resources.stored(r);
            let q = rng.random_range(1..=40);

            let taken = remove_from_warehouses(&mut city, r, q);
            assert_eq!(taken, q.min(reachable), "seed {seed} {}", r.name());
            assert_eq!(city.resources.stored(r), before - taken);
        }
    }
}

#[test]
fn property_repeated_removal_drains_monotonically() {
    for seed in 0..20u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let (mut city, ids) = random_city(&mut rng, 3);
        let id = ids[rng.random_range(0..ids.len())];
        let r = GOODS[rng.random_range(0..GOODS.len())];
        city.policy_mut(id).unwrap().set_state(r, StorageState::Accepting);
        let _ = city.add_resource(id, r, rng.random_range(1..=12));

        let mut stored = city.available_amount(id, r);
        let mut total = city.resources.stored(r);
        while stored > 0 {
            assert_eq!(city.try_remove_resource(id, r, 1), Ok(1), "seed {seed}");
            let now = city.available_amount(id, r);
            assert_eq!(now, stored - 1, "seed {seed}: warehouse stock must drop by one");
            assert_eq!(city.resources.stored(r), total - 1, "seed {seed}: city books");
            stored = now;
            total -= 1;
        }

        assert_eq!(
            city.try_remove_resource(id, r, 1),
            Err(LogisticsError::InsufficientStock {
                warehouse: id,
                resource: r,
                stored: 0
            })
        );
        assert_eq!(city.resources.stored(r), total, "seed {seed}: empty drain moved goods");
    }
}

#[test]
fn property_single_load_drains_spread_evenly() {
    for n in 2..6 {
        let mut city = City::new();
        let ids: Vec<_> = (0..n)
            .map(|i| {
                let id = city.build_warehouse(TilePoint::new(i * 4, 0));
                city.activate(id).unwrap();
                city.add_resource(id, Resource::Iron, 12).unwrap();
                id
            })
            .collect();

        let mut taken = vec![0u32; ids.len()];
        for _ in 0..(3 * n + 1) {
            remove_from_warehouses(&mut city, Resource::Iron, 1);
            let last = city.logistics.last_used_warehouse().unwrap();
            let slot = ids.iter().position(|id| *id == last).unwrap();
            taken[slot] += 1;
        }

        let max = *taken.iter().max().unwrap();
        let min = *taken.iter().min().unwrap();
        assert!(max - min <= 1, "{n} warehouses: uneven drain {taken:?}");
    }
}

#[test]
fn property_storage_search_picks_nearest_with_room() {
    for seed in 0..30u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let (city, _) = random_city(&mut rng, 6);
        let request = StorageRequest {
            source: None,
            at: TilePoint::new(rng.random_range(0..40), rng.random_range(0..40)),
            resource: GOODS[rng.random_range(0..GOODS.len())],
            distance_from_entry: Some(rng.random_range(0..30)),
            road_network_id: NET,
        };
        let distance = |id: BuildingId| {
            let wh = city.warehouse(id).unwrap();
            distance_with_penalty(
                request.at,
                wh.position,
                request.distance_from_entry,
                wh.distance_from_entry,
            )
        };
        let with_room: Vec<_> = city
            .registry
            .iter()
            .filter(|wh| city.maximum_receptible_amount(wh.id, request.resource) > 0)
            .map(|wh| wh.id)
            .collect();

        let found = for_storing(&city, &request).warehouse;
        match found {
            None => assert!(with_room.is_empty(), "seed {seed}"),
            Some(id) => {
                assert!(with_room.contains(&id), "seed {seed}");
                let best = with_room.iter().map(|w| distance(*w)).min().unwrap();
                assert_eq!(distance(id), best, "seed {seed}");
            }
        }
    }
}

#[test]
fn property_getting_source_is_willing_and_stocked() {
    for seed in 0..30u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let (city, ids) = random_city(&mut rng, 5);
        let requester = ids[0];

        for r in GOODS {
            if let Some(src) = for_getting(&city, requester, r) {
                assert_ne!(src, requester);
                assert!(city.available_amount(src, r) > 0);
                assert!(
                    city.policies.get_state(src, r, true).permits_getting(),
                    "seed {seed}: fetched from a warehouse that keeps {}",
                    r.name()
                );
            }
        }
    }
}

#![cfg(feature = "instrument")]

use polars::prelude::*;

use warehouse_core::instrument::{self, LedgerSubscriber, Recorder};
use warehouse_core::{
    BuildingId, City, KeyToU64, Resource, StaticDemand, StorageState, TilePoint,
    determine_worker_task, remove_from_warehouses, send_to_rome,
};

fn recorded<F: FnOnce()>(f: F) -> Recorder {
    tracing::subscriber::with_default(LedgerSubscriber, || {
        instrument::clear();
        f();
        instrument::drain()
    })
}

fn stocked_city(n: i32, resource: Resource, loads: u32) -> (City, Vec<BuildingId>) {
    let mut city = City::new();
    let ids = (0..n)
        .map(|i| {
            let id = city.build_warehouse(TilePoint::new(i * 4, 0));
            city.activate(id).unwrap();
            city.add_resource(id, resource, loads).unwrap();
            id
        })
        .collect();
    (city, ids)
}

#[test]
fn instrumented_bulk_drains_visit_every_warehouse_equally() {
    let (mut city, ids) = stocked_city(5, Resource::Wheat, 16);

    let recorder = recorded(|| {
        for _ in 0..20 {
            remove_from_warehouses(&mut city, Resource::Wheat, 2);
        }
    });

    let drains = recorder.table("bulk_remove").unwrap();
    assert_eq!(drains.row_count, 20);
    assert!(drains.str_column("pass").unwrap().iter().all(|p| p == "voluntary"));

    let per_warehouse = drains
        .to_dataframe()
        .unwrap()
        .lazy()
        .group_by([col("warehouse_id")])
        .agg([
            col("loads").sum().alias("loads"),
            col("loads").count().alias("visits"),
        ])
        .sort(["warehouse_id"], Default::default())
        .collect()
        .unwrap();

    assert_eq!(per_warehouse.height(), ids.len());
    let loads = per_warehouse
        .column("loads")
        .unwrap()
        .as_materialized_series()
        .u64()
        .unwrap();
    assert!(loads.into_iter().all(|l| l == Some(8)));

    let mut expected: Vec<u64> = ids.iter().map(|id| id.to_u64()).collect();
    expected.sort();
    let seen: Vec<u64> = per_warehouse
        .column("warehouse_id")
        .unwrap()
        .as_materialized_series()
        .u64()
        .unwrap()
        .into_no_null_iter()
        .collect();
    assert_eq!(seen, expected);
}

#[test]
fn instrumented_rome_shipment_logs_forced_pass() {
    let (mut city, ids) = stocked_city(2, Resource::Furniture, 6);
    city.policy_mut(ids[1])
        .unwrap()
        .set_state(Resource::Furniture, StorageState::Maintaining);

    let recorder = recorded(|| {
        let shipment = send_to_rome(&mut city, Resource::Furniture, 10);
        assert_eq!(shipment.sent, 10);
    });

    let drains = recorder.table("bulk_remove").unwrap();
    assert_eq!(drains.str_column("pass").unwrap(), ["voluntary", "forced"]);
    assert_eq!(
        drains.u64_column("warehouse_id").unwrap(),
        [ids[0].to_u64(), ids[1].to_u64()]
    );

    let shipments = recorder.table("rome_shipment").unwrap();
    assert_eq!(shipments.u64_column("sent"), Some(&[10][..]));
    assert_eq!(shipments.u64_column("carts"), Some(&[2][..]));
    assert_eq!(recorder.rows("warehouse_remove"), 2);
}

#[test]
fn instrumented_rejections_and_tasks_are_logged() {
    let (mut city, ids) = stocked_city(1, Resource::Clay, 4);
    let id = ids[0];

    let recorder = recorded(|| {
        city.set_plague(id, true).unwrap();
        let _ = city.add_resource(id, Resource::Clay, 1);
        determine_worker_task(&city, id, &StaticDemand::new());
        city.demolish(id).unwrap();
    });

    // Refused adds never reach the bays
    assert_eq!(recorder.rows("warehouse_add"), 0);
    let tasks = recorder.table("worker_task").unwrap();
    assert_eq!(tasks.str_column("resource").unwrap(), ["none"]);

    let lifecycle = recorder.table("warehouse_lifecycle").unwrap();
    assert_eq!(lifecycle.str_column("event").unwrap(), ["demolished"]);
    assert_eq!(lifecycle.u64_column("lost"), Some(&[4][..]));
}

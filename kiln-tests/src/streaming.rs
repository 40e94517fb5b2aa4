use crate::{
    Address, AddressMeta, DepartmentMeta, EmployeeMeta, addresses, departments, employees,
    reset_stream,
};
use futures::{StreamExt, TryStreamExt};
use kiln::{DatabaseConfig, EntityDsl, IntoQuery, QueryError, SqlDsl, StreamTransport, count};

pub async fn simple(transport: &mut dyn StreamTransport, config: &DatabaseConfig) {
    let a = AddressMeta::new();
    reset_stream(transport, config, [a.table_metamodel()]).await;

    let inserted = EntityDsl::insert(&a)
        .batch(&addresses())
        .run_stream(transport, config)
        .await
        .expect("Failed to insert the addresses");
    assert_eq!(inserted.len(), 15);

    let address = EntityDsl::from(&a)
        .filter(|w| {
            w.eq(&a.address_id, 3);
        })
        .first()
        .run_stream(transport, config)
        .await
        .expect("Failed to select address 3");
    assert_eq!(address, Address::new(3, "STREET 3", 1));

    let updated = EntityDsl::update(&a)
        .single(&Address {
            street: "STREET 3 UPDATED".into(),
            ..address.clone()
        })
        .run_stream(transport, config)
        .await
        .expect("Failed to update address 3");
    assert_eq!(updated.version, 2);

    let stale = EntityDsl::update(&a)
        .single(&address)
        .run_stream(transport, config)
        .await;
    let error = stale.expect_err("The stale update must fail");
    assert!(matches!(
        QueryError::find(&error),
        Some(QueryError::OptimisticLock { index: 0, count: 0, .. })
    ));

    EntityDsl::delete(&a)
        .single(&updated)
        .run_stream(transport, config)
        .await
        .expect("Failed to delete address 3");
    let deleted = SqlDsl::delete(&a)
        .filter(|w| {
            w.gt(&a.address_id, 10);
        })
        .run_stream(transport, config)
        .await
        .expect("Failed to delete the last addresses");
    assert_eq!(deleted, 5);
    let total = EntityDsl::from(&a)
        .select_not_null(count())
        .first()
        .run_stream(transport, config)
        .await
        .expect("Failed to count the addresses");
    assert_eq!(total, 9);
}

pub async fn rows(transport: &mut dyn StreamTransport, config: &DatabaseConfig) {
    let a = AddressMeta::new();
    reset_stream(transport, config, [a.table_metamodel()]).await;
    EntityDsl::insert(&a)
        .multiple(&addresses())
        .run_stream(transport, config)
        .await
        .expect("Failed to insert the addresses");

    let query = EntityDsl::from(&a).order_by(&a.address_id);
    let streets = query
        .stream(transport, config)
        .map_ok(|v| v.street)
        .try_collect::<Vec<_>>()
        .await
        .expect("Failed to stream the addresses");
    assert_eq!(streets.len(), 15);
    assert_eq!(streets[0], "STREET 1");
    assert_eq!(streets[14], "STREET 15");

    // A partially consumed sequence releases the transport
    let first = query
        .stream(transport, config)
        .take(4)
        .map_ok(|v| v.address_id)
        .try_collect::<Vec<_>>()
        .await
        .expect("Failed to stream the first addresses");
    assert_eq!(first, [1, 2, 3, 4]);

    let mut ids = EntityDsl::from(&a)
        .filter(|w| {
            w.gt(&a.address_id, 100);
        })
        .stream(transport, config);
    assert!(ids.next().await.is_none());
    drop(ids);

    let total = EntityDsl::from(&a)
        .select_not_null(count())
        .first()
        .run_stream(transport, config)
        .await
        .expect("Failed to count after streaming");
    assert_eq!(total, 15);
}

pub async fn relations(transport: &mut dyn StreamTransport, config: &DatabaseConfig) {
    let (d, e) = (DepartmentMeta::new(), EmployeeMeta::new());
    reset_stream(transport, config, [d.table_metamodel(), e.table_metamodel()]).await;
    EntityDsl::insert(&d)
        .multiple(&departments())
        .and_then(EntityDsl::insert(&e).multiple(&employees()))
        .run_stream(transport, config)
        .await
        .expect("Failed to insert the departments and the employees");

    let store = EntityDsl::from(&d)
        .left_join(&e, |w| {
            w.eq(&d.department_id, &e.department_id);
        })
        .order_by(&d.department_id)
        .order_by(&e.employee_id)
        .include_all()
        .run_stream(transport, config)
        .await
        .expect("Failed to select the departments with their employees");
    let map = store
        .one_to_many(&d, &e)
        .expect("Failed to group the employees");
    let sizes = map.values().map(|v| v.len()).collect::<Vec<_>>();
    assert_eq!(sizes, [2, 2, 3, 0]);
}

pub async fn composition(transport: &mut dyn StreamTransport, config: &DatabaseConfig) {
    let a = AddressMeta::new();
    reset_stream(transport, config, [a.table_metamodel()]).await;

    let total = EntityDsl::from(&a).select_not_null(count()).first();
    let (inserted, counted) = EntityDsl::insert(&a)
        .multiple(&addresses())
        .map(|v| v.len())
        .zip(total.clone())
        .run_stream(transport, config)
        .await
        .expect("Failed to insert and count");
    assert_eq!((inserted, counted), (15, 15));

    let street = {
        let a = AddressMeta::new();
        move |id: &i64| {
            let id = *id as i32;
            EntityDsl::from(&a)
                .filter(|w| {
                    w.eq(&a.address_id, id);
                })
                .map(|v| v.into_iter().map(|v| v.street).collect::<Vec<_>>())
        }
    };
    let (counted, streets) = total
        .clone()
        .flat_zip(street)
        .run_stream(transport, config)
        .await
        .expect("Failed to select the street of the last address");
    assert_eq!((counted, streets), (15, vec!["STREET 15".to_string()]));

    let remaining = SqlDsl::delete(&a)
        .filter(|w| {
            w.le(&a.address_id, 5);
        })
        .into_query()
        .and_then(total)
        .run_stream(transport, config)
        .await
        .expect("Failed to delete and count");
    assert_eq!(remaining, 10);
}

#[cfg(not(feature = "disable-identity"))]
pub async fn identity(transport: &mut dyn StreamTransport, config: &DatabaseConfig) {
    use crate::{IdentityStrategy, IdentityStrategyMeta};
    let m = IdentityStrategyMeta::new();
    reset_stream(transport, config, [m.table_metamodel()]).await;
    let inserted = EntityDsl::insert(&m)
        .batch(&["x", "y"].map(IdentityStrategy::new))
        .run_stream(transport, config)
        .await
        .expect("Failed to insert a batch");
    assert_eq!(inserted.iter().map(|v| v.id).collect::<Vec<_>>(), [1, 2]);
    let single = EntityDsl::insert(&m)
        .single(&IdentityStrategy::new("z"))
        .run_stream(transport, config)
        .await
        .expect("Failed to insert a single row");
    assert_eq!(single.id, 3);
}

use crate::{Address, AddressMeta, addresses, reset};
use kiln::{
    DatabaseConfig, DeleteOptions, EntityDsl, IntoQuery, QueryError, Transport, UpdateOptions,
    count,
};

pub fn simple(transport: &mut dyn Transport, config: &DatabaseConfig) {
    let a = AddressMeta::new();
    reset(transport, config, [a.table_metamodel()]);

    // Insert
    let inserted = EntityDsl::insert(&a)
        .batch(&addresses())
        .run(transport, config)
        .expect("Failed to insert the addresses");
    assert_eq!(inserted, addresses());
    let address = EntityDsl::insert(&a)
        .single(&Address::new(16, "STREET 16", 0))
        .run(transport, config)
        .expect("Failed to insert address 16");
    assert_eq!(address, Address::new(16, "STREET 16", 0));

    // Select
    let found = EntityDsl::from(&a)
        .filter(|w| {
            w.eq(&a.address_id, 16);
        })
        .first()
        .run(transport, config)
        .expect("Failed to find address 16");
    assert_eq!(found, Address::new(16, "STREET 16", 0));
    let missing = EntityDsl::from(&a)
        .filter(|w| {
            w.eq(&a.address_id, 99);
        })
        .first_or_none()
        .run(transport, config)
        .expect("Failed to look for address 99");
    assert_eq!(missing, None);

    let all = EntityDsl::from(&a)
        .order_by(&a.address_id)
        .run(transport, config)
        .expect("Failed to select the addresses");
    assert_eq!(all.len(), 16);
    assert_eq!(all[0], Address::new(1, "STREET 1", 1));

    let page = EntityDsl::from(&a)
        .order_by(&a.address_id.desc())
        .limit(3)
        .offset(2)
        .run(transport, config)
        .expect("Failed to select a page");
    assert_eq!(
        page.iter().map(|v| v.address_id).collect::<Vec<_>>(),
        [14, 13, 12]
    );
    let tail = EntityDsl::from(&a)
        .order_by(&a.address_id)
        .offset(14)
        .run(transport, config)
        .expect("Failed to select with an offset only");
    assert_eq!(
        tail.iter().map(|v| v.address_id).collect::<Vec<_>>(),
        [15, 16]
    );

    let streets = EntityDsl::from(&a)
        .filter(|w| {
            w.starts_with(&a.street, "STREET 1")
                .le(&a.address_id, 12);
        })
        .order_by(&a.address_id)
        .run(transport, config)
        .expect("Failed to select by prefix");
    assert_eq!(
        streets.iter().map(|v| v.address_id).collect::<Vec<_>>(),
        [1, 10, 11, 12]
    );

    let either = EntityDsl::from(&a)
        .filter(|w| {
            w.or(|w| {
                w.eq(&a.address_id, 3);
            })
            .or(|w| {
                w.in_list(&a.address_id, [5, 7]);
            });
        })
        .order_by(&a.address_id)
        .run(transport, config)
        .expect("Failed to select with alternatives");
    assert_eq!(
        either.iter().map(|v| v.address_id).collect::<Vec<_>>(),
        [3, 5, 7]
    );

    // Update
    let mut changed = found.clone();
    changed.street = "NEW STREET 16".into();
    let updated = EntityDsl::update(&a)
        .single(&changed)
        .run(transport, config)
        .expect("Failed to update address 16");
    assert_eq!(updated, Address::new(16, "NEW STREET 16", 1));
    let found = EntityDsl::from(&a)
        .filter(|w| {
            w.eq(&a.address_id, 16);
        })
        .first()
        .run(transport, config)
        .expect("Failed to find the updated address");
    assert_eq!(found, updated);

    // Delete
    EntityDsl::delete(&a)
        .single(&updated)
        .run(transport, config)
        .expect("Failed to delete address 16");
    let total = EntityDsl::from(&a)
        .select_not_null(count())
        .first()
        .run(transport, config)
        .expect("Failed to count the addresses");
    assert_eq!(total, 15);
}

pub fn optimistic_lock(transport: &mut dyn Transport, config: &DatabaseConfig) {
    let a = AddressMeta::new();
    reset(transport, config, [a.table_metamodel()]);
    EntityDsl::insert(&a)
        .batch(&addresses())
        .run(transport, config)
        .expect("Failed to insert the addresses");

    let stale = Address::new(1, "STREET 1", 1);
    let current = EntityDsl::update(&a)
        .single(&Address::new(1, "STREET ONE", 1))
        .run(transport, config)
        .expect("Failed to update address 1");
    assert_eq!(current.version, 2);

    let error = EntityDsl::update(&a)
        .single(&stale)
        .run(transport, config)
        .expect_err("The stale update must fail");
    assert!(QueryError::is_optimistic_lock(&error), "{:#}", error);

    let unchanged = EntityDsl::update(&a)
        .options(|v| UpdateOptions {
            suppress_optimistic_lock_exception: true,
            ..v
        })
        .single(&stale)
        .run(transport, config);
    assert!(unchanged.is_ok());

    let forced = EntityDsl::update(&a)
        .options(|v| UpdateOptions {
            ignore_version: true,
            ..v
        })
        .single(&stale)
        .run(transport, config)
        .expect("Failed to update ignoring the version");
    assert_eq!(forced.version, 1);

    let error = EntityDsl::delete(&a)
        .single(&Address::new(2, "STREET 2", 7))
        .run(transport, config)
        .expect_err("The stale delete must fail");
    match QueryError::find(&error) {
        Some(QueryError::OptimisticLock { index, count, .. }) => {
            assert_eq!((*index, *count), (0, 0));
        }
        other => panic!("Unexpected error {:?}", other),
    }

    // The second entity of the batch is stale
    let error = EntityDsl::update(&a)
        .batch(&[
            Address::new(3, "STREET THREE", 1),
            Address::new(4, "STREET FOUR", 9),
        ])
        .run(transport, config)
        .expect_err("The stale batch must fail");
    match QueryError::find(&error) {
        Some(QueryError::OptimisticLock { index, .. }) => assert_eq!(*index, 1),
        other => panic!("Unexpected error {:?}", other),
    }

    EntityDsl::delete(&a)
        .options(|v| DeleteOptions {
            ignore_version: true,
            ..v
        })
        .single(&Address::new(2, "STREET 2", 7))
        .run(transport, config)
        .expect("Failed to delete ignoring the version");
}

pub fn unique_constraint(transport: &mut dyn Transport, config: &DatabaseConfig) {
    let a = AddressMeta::new();
    reset(transport, config, [a.table_metamodel()]);
    EntityDsl::insert(&a)
        .single(&Address::new(1, "STREET 1", 0))
        .run(transport, config)
        .expect("Failed to insert address 1");
    let error = EntityDsl::insert(&a)
        .single(&Address::new(2, "STREET 1", 0))
        .run(transport, config)
        .expect_err("A duplicated street must fail");
    assert!(QueryError::is_unique_constraint(&error), "{:#}", error);
    let error = EntityDsl::insert(&a)
        .single(&Address::new(1, "STREET 9", 0))
        .run(transport, config)
        .expect_err("A duplicated identifier must fail");
    assert!(QueryError::is_unique_constraint(&error), "{:#}", error);
}

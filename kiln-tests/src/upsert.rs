use crate::{Address, AddressMeta, addresses, reset};
use kiln::{DatabaseConfig, EntityDsl, IntoQuery, Transport, concat};

pub fn upsert(transport: &mut dyn Transport, config: &DatabaseConfig) {
    let a = AddressMeta::new();
    reset(transport, config, [a.table_metamodel()]);
    EntityDsl::insert(&a)
        .batch(&addresses())
        .run(transport, config)
        .expect("Failed to insert the addresses");

    let by_id = |id: i32| {
        EntityDsl::from(&a)
            .filter(|w| {
                w.eq(&a.address_id, id);
            })
            .first_or_none()
    };

    // Update on conflict
    let update = EntityDsl::insert(&a).on_duplicate_key_update([a.address_id.erase()]);
    let count = update
        .single(&Address::new(1, "STREET 1 UPDATED", 5))
        .run(transport, config)
        .expect("Failed to upsert an existing address");
    assert_eq!(count, 1);
    let address = by_id(1)
        .run(transport, config)
        .expect("Failed to select address 1");
    assert_eq!(address, Some(Address::new(1, "STREET 1 UPDATED", 5)));
    let count = update
        .single(&Address::new(16, "STREET 16", 1))
        .run(transport, config)
        .expect("Failed to upsert a new address");
    assert_eq!(count, 1);
    assert!(
        by_id(16)
            .run(transport, config)
            .expect("Failed to select address 16")
            .is_some()
    );

    // Ignore on conflict, the identifier is the default key
    let ignore = EntityDsl::insert(&a).on_duplicate_key_ignore(Vec::new());
    let count = ignore
        .single(&Address::new(2, "IGNORED", 1))
        .run(transport, config)
        .expect("Failed to ignore an existing address");
    assert_eq!(count, 0);
    let address = by_id(2)
        .run(transport, config)
        .expect("Failed to select address 2");
    assert_eq!(address, Some(Address::new(2, "STREET 2", 1)));
    let count = ignore
        .multiple(&[Address::new(3, "IGNORED", 1), Address::new(17, "STREET 17", 1)])
        .run(transport, config)
        .expect("Failed to ignore multiple addresses");
    assert_eq!(count, 1);

    // Several rows at once
    let counts = update
        .batch(&[Address::new(4, "STREET 4 BATCH", 2), Address::new(18, "STREET 18", 1)])
        .run(transport, config)
        .expect("Failed to upsert a batch");
    assert_eq!(counts, vec![1, 1]);
    let count = update
        .multiple(&[Address::new(5, "STREET 5 MULTI", 2), Address::new(19, "STREET 19", 1)])
        .run(transport, config)
        .expect("Failed to upsert multiple addresses");
    assert_eq!(count, 2);

    // Explicit assignments reading the proposed row
    let excluded = a.excluded();
    let proposed_street = excluded.property::<String>("STREET");
    let count = EntityDsl::insert(&a)
        .on_duplicate_key_update([a.address_id.erase()])
        .set(|s| {
            s.set(&a.street, concat(&proposed_street, " (MOVED)"));
        })
        .single(&Address::new(6, "STREET 6", 9))
        .run(transport, config)
        .expect("Failed to upsert with explicit assignments");
    assert_eq!(count, 1);
    let address = by_id(6)
        .run(transport, config)
        .expect("Failed to select address 6");
    assert_eq!(address, Some(Address::new(6, "STREET 6 (MOVED)", 1)));
}

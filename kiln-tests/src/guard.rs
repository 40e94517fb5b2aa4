use crate::{AddressMeta, addresses, reset};
use kiln::{
    DatabaseConfig, DeleteOptions, EntityDsl, IntoQuery, QueryError, SqlDsl, Transport,
    UpdateOptions,
};

pub fn empty_where(transport: &mut dyn Transport, config: &DatabaseConfig) {
    let a = AddressMeta::new();
    reset(transport, config, [a.table_metamodel()]);
    EntityDsl::insert(&a)
        .batch(&addresses())
        .run(transport, config)
        .expect("Failed to insert the addresses");

    let delete_all = SqlDsl::delete(&a);
    let error = delete_all
        .run(transport, config)
        .expect_err("A delete without criteria must be refused");
    assert!(QueryError::is_build(&error), "{:#}", error);
    let dry_run = delete_all.dry_run(config);
    assert!(!dry_run.is_error(), "{}", dry_run.sql);
    assert!(dry_run.sql.starts_with("DELETE FROM"));

    let rename_all = SqlDsl::update(&a).set(|s| {
        s.set(&a.street, "SAME STREET");
    });
    let error = rename_all
        .run(transport, config)
        .expect_err("An update without criteria must be refused");
    assert!(QueryError::is_build(&error), "{:#}", error);
    assert!(!rename_all.dry_run(config).is_error());

    let renamed = SqlDsl::update(&a)
        .set(|s| {
            s.set(&a.street, "RENAMED");
        })
        .filter(|w| {
            w.eq(&a.address_id, 5);
        })
        .run(transport, config)
        .expect("Failed to update address 5");
    assert_eq!(renamed, 1);

    let shifted = SqlDsl::update(&a)
        .set(|s| {
            s.set(&a.version, &a.version + 10);
        })
        .options(|v| UpdateOptions {
            allow_empty_where: true,
            ..v
        })
        .run(transport, config)
        .expect("Failed to update every address");
    assert_eq!(shifted, 15);

    let (count, _) = SqlDsl::insert(&a)
        .values(|s| {
            s.set(&a.address_id, 50)
                .set(&a.street, "STREET 50")
                .set(&a.version, 0);
        })
        .run(transport, config)
        .expect("Failed to insert address 50");
    assert_eq!(count, 1);

    let deleted = SqlDsl::delete(&a)
        .filter(|w| {
            w.ge(&a.address_id, 10);
        })
        .run(transport, config)
        .expect("Failed to delete some addresses");
    assert_eq!(deleted, 7);

    let deleted = SqlDsl::delete(&a)
        .options(|v| DeleteOptions {
            allow_empty_where: true,
            ..v
        })
        .run(transport, config)
        .expect("Failed to delete every address");
    assert_eq!(deleted, 9);
}

use crate::{Address, AddressMeta, addresses, reset};
use kiln::{DatabaseConfig, EntityDsl, IntoQuery, Query, SqlDsl, Transport, count};

pub fn composition(transport: &mut dyn Transport, config: &DatabaseConfig) {
    let a = AddressMeta::new();
    reset(transport, config, [a.table_metamodel()]);

    let insert = EntityDsl::insert(&a).multiple(&addresses());
    let total = EntityDsl::from(&a).select_not_null(count()).first();
    let (inserted, counted) = insert
        .map(|v| v.len())
        .zip(total.clone())
        .run(transport, config)
        .expect("Failed to insert and count");
    assert_eq!((inserted, counted), (15, 15));

    // The second query is derived from the result of the first one
    let by_id = |id: i32| {
        EntityDsl::from(&a).filter(|w| {
            w.eq(&a.address_id, id);
        })
    };
    let next = {
        let a = AddressMeta::new();
        move |address: Address| {
            let id = address.address_id + 1;
            EntityDsl::from(&a)
                .filter(|w| {
                    w.eq(&a.address_id, id);
                })
                .first()
        }
    };
    let found = by_id(3)
        .first()
        .flat_map(next)
        .run(transport, config)
        .expect("Failed to find the address after 3");
    assert_eq!(found.address_id, 4);

    let (source, streets) = by_id(7)
        .first()
        .flat_zip({
            let a = AddressMeta::new();
            move |address: &Address| {
                let street = address.street.clone();
                EntityDsl::from(&a)
                    .select_not_null(a.street.clone())
                    .filter(|w| {
                        w.eq(&a.street, &street);
                    })
                    .into_query()
            }
        })
        .run(transport, config)
        .expect("Failed to find the street of address 7");
    assert_eq!(source.address_id, 7);
    assert_eq!(streets, ["STREET 7"]);

    let both: Query<Vec<Address>> = by_id(1).into_query() + by_id(2).into_query();
    let both = both
        .run(transport, config)
        .expect("Failed to concatenate the selects");
    assert_eq!(
        both.iter().map(|v| v.address_id).collect::<Vec<_>>(),
        [1, 2]
    );

    let remaining = SqlDsl::delete(&a)
        .filter(|w| {
            w.gt(&a.address_id, 10);
        })
        .and_then(total.clone())
        .run(transport, config)
        .expect("Failed to delete and count");
    assert_eq!(remaining, 10);

    let dry_run = SqlDsl::delete(&a)
        .filter(|w| {
            w.gt(&a.address_id, 10);
        })
        .and_then(total.clone())
        .dry_run(config);
    assert!(!dry_run.is_error());
    assert_eq!(dry_run.sql.lines().count(), 4, "{}", dry_run.sql);
    assert_eq!(dry_run.args.len(), 1);
    assert!(dry_run.description.contains("delete"));

    let failing = EntityDsl::from(&a)
        .filter(|w| {
            w.eq(&a.address_id, 100);
        })
        .first()
        .run(transport, config)
        .expect_err("There is no address 100");
    assert!(format!("{:#}", failing).contains("no rows"));
}

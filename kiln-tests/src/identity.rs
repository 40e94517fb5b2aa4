use crate::{IdentityStrategy, IdentityStrategyMeta, reset};
use kiln::{DatabaseConfig, EntityDsl, IntoQuery, Transport};

pub fn identity(transport: &mut dyn Transport, config: &DatabaseConfig) {
    let m = IdentityStrategyMeta::new();
    reset(transport, config, [m.table_metamodel()]);

    let first = EntityDsl::insert(&m)
        .single(&IdentityStrategy::new("first"))
        .run(transport, config)
        .expect("Failed to insert a single row");
    assert_eq!(first.id, 1);
    assert_eq!(first.value, "first");

    let values = ["a", "b", "c"].map(IdentityStrategy::new);
    let inserted = EntityDsl::insert(&m)
        .multiple(&values)
        .run(transport, config)
        .expect("Failed to insert multiple rows");
    assert_eq!(inserted.iter().map(|v| v.id).collect::<Vec<_>>(), [2, 3, 4]);

    let inserted = EntityDsl::insert(&m)
        .batch(&values)
        .run(transport, config)
        .expect("Failed to insert a batch");
    assert_eq!(inserted.iter().map(|v| v.id).collect::<Vec<_>>(), [5, 6, 7]);
    assert_eq!(
        inserted.iter().map(|v| v.value.as_str()).collect::<Vec<_>>(),
        ["a", "b", "c"]
    );

    // The caller values are left untouched
    assert!(values.iter().all(|v| v.id == 0));

    let stored = EntityDsl::from(&m)
        .order_by(&m.id)
        .run(transport, config)
        .expect("Failed to select the rows");
    assert_eq!(stored.len(), 7);
    assert_eq!(stored[0], first);
}

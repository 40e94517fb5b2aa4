use crate::{Memo, MemoMeta, reset};
use kiln::{DatabaseConfig, EntityDsl, FixedClock, IntoQuery, SqlDsl, Transport};
use time::macros::datetime;

pub fn timestamps(transport: &mut dyn Transport, config: &DatabaseConfig) {
    let m = MemoMeta::new();
    reset(transport, config, [m.table_metamodel()]);
    let created = datetime!(2024-03-01 09:00:00 UTC);
    let updated = datetime!(2024-03-02 18:30:15.5 UTC);
    let later = datetime!(2024-03-03 07:00:00 UTC);

    let memo = EntityDsl::insert(&m)
        .single(&Memo {
            memo_id: 1,
            body: "first draft".into(),
            ..Default::default()
        })
        .run(transport, &config.clone().with_clock(FixedClock(created)))
        .expect("Failed to insert the memo");
    assert_eq!(memo.created_at, Some(created));
    assert_eq!(memo.updated_at, Some(created));

    let memo = EntityDsl::update(&m)
        .single(&Memo {
            body: "second draft".into(),
            ..memo
        })
        .run(transport, &config.clone().with_clock(FixedClock(updated)))
        .expect("Failed to update the memo");
    assert_eq!(memo.created_at, Some(created));
    assert_eq!(memo.updated_at, Some(updated));

    let stored = EntityDsl::from(&m)
        .first()
        .run(transport, config)
        .expect("Failed to select the memo");
    assert_eq!(stored, memo);

    SqlDsl::update(&m)
        .set(|s| {
            s.set(&m.body, "final");
        })
        .filter(|w| {
            w.eq(&m.memo_id, 1);
        })
        .run(transport, &config.clone().with_clock(FixedClock(later)))
        .expect("Failed to update the body");
    let stored = EntityDsl::from(&m)
        .first()
        .run(transport, config)
        .expect("Failed to select the final memo");
    assert_eq!(stored.body, "final");
    assert_eq!(stored.created_at, Some(created));
    assert_eq!(stored.updated_at, Some(later));
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use kiln::{
        DatabaseConfig, EntityDsl, GenericDialect, IntoQuery, SqlDsl, UpdateOptions, Value,
    };
    use kiln_tests::{Address, AddressMeta};

    fn config() -> DatabaseConfig {
        DatabaseConfig::new(GenericDialect)
    }

    #[test]
    fn select_by_id() {
        let a = AddressMeta::new();
        let query = EntityDsl::from(&a).filter(|w| {
            w.eq(&a.address_id, 1);
        });
        let result = query.dry_run(&config());
        assert!(result.error.is_none());
        assert_eq!(
            result.sql,
            indoc! {r#"
                SELECT "ADDRESS_ID", "STREET", "VERSION"
                FROM "ADDRESS"
                WHERE "ADDRESS_ID" = ?;
            "#}
            .trim()
        );
        assert_eq!(result.args, [Value::Int32(Some(1))]);
        assert_eq!(
            result.sql_with_args,
            indoc! {r#"
                SELECT "ADDRESS_ID", "STREET", "VERSION"
                FROM "ADDRESS"
                WHERE "ADDRESS_ID" = 1;
            "#}
            .trim()
        );
    }

    #[test]
    fn compiling_twice_gives_the_same_statement() {
        let a = AddressMeta::new();
        let query = EntityDsl::from(&a)
            .filter(|w| {
                w.starts_with(&a.street, "STREET 1").or(|w| {
                    w.in_list(&a.address_id, [3, 5, 7]);
                });
            })
            .order_by(&a.address_id.desc())
            .limit(3)
            .offset(2);
        let (first, second) = (query.dry_run(&config()), query.dry_run(&config()));
        assert_eq!(first.sql, second.sql);
        assert_eq!(first.args, second.args);
        assert_eq!(
            first.sql,
            indoc! {r#"
                SELECT "ADDRESS_ID", "STREET", "VERSION"
                FROM "ADDRESS"
                WHERE "STREET" LIKE ? ESCAPE '\' OR ("ADDRESS_ID" IN (?, ?, ?))
                ORDER BY "ADDRESS_ID" DESC
                LIMIT 3
                OFFSET 2;
            "#}
            .trim()
        );
        assert_eq!(first.args[0], Value::Varchar(Some("STREET 1%".into())));
    }

    #[test]
    fn derived_queries_leave_the_source_untouched() {
        let a = AddressMeta::new();
        let base = EntityDsl::from(&a);
        let filtered = base.filter(|w| {
            w.gt(&a.address_id, 10);
        });
        assert!(!base.dry_run(&config()).sql.contains("WHERE"));
        assert!(filtered.dry_run(&config()).sql.contains("WHERE \"ADDRESS_ID\" > ?"));
    }

    #[test]
    fn entity_writes() {
        let a = AddressMeta::new();
        let address = Address::new(16, "STREET 16", 0);
        let result = EntityDsl::insert(&a).single(&address).dry_run(&config());
        assert_eq!(
            result.sql,
            indoc! {r#"
                INSERT INTO "ADDRESS" ("ADDRESS_ID", "STREET", "VERSION") VALUES
                (?, ?, ?);
            "#}
            .trim()
        );
        assert_eq!(
            result.args,
            [
                Value::Int32(Some(16)),
                Value::Varchar(Some("STREET 16".into())),
                Value::Int32(Some(0)),
            ]
        );

        let result = EntityDsl::update(&a).single(&address).dry_run(&config());
        assert_eq!(
            result.sql,
            indoc! {r#"
                UPDATE "ADDRESS"
                SET "STREET" = ?, "VERSION" = "VERSION" + ?
                WHERE "ADDRESS_ID" = ? AND "VERSION" = ?;
            "#}
            .trim()
        );
        assert_eq!(
            result.args,
            [
                Value::Varchar(Some("STREET 16".into())),
                Value::Int32(Some(1)),
                Value::Int32(Some(16)),
                Value::Int32(Some(0)),
            ]
        );

        let result = EntityDsl::update(&a)
            .options(|v| UpdateOptions {
                ignore_version: true,
                ..v
            })
            .single(&address)
            .dry_run(&config());
        assert_eq!(
            result.sql,
            indoc! {r#"
                UPDATE "ADDRESS"
                SET "STREET" = ?, "VERSION" = ?
                WHERE "ADDRESS_ID" = ?;
            "#}
            .trim()
        );

        let result = EntityDsl::delete(&a).single(&address).dry_run(&config());
        assert_eq!(
            result.sql,
            indoc! {r#"
                DELETE FROM "ADDRESS"
                WHERE "ADDRESS_ID" = ? AND "VERSION" = ?;
            "#}
            .trim()
        );
    }

    #[test]
    fn upserts() {
        let a = AddressMeta::new();
        let address = Address::new(1, "STREET 1", 1);
        let result = EntityDsl::insert(&a)
            .on_duplicate_key_update([a.address_id.erase()])
            .single(&address)
            .dry_run(&config());
        assert_eq!(
            result.sql,
            indoc! {r#"
                INSERT INTO "ADDRESS" ("ADDRESS_ID", "STREET", "VERSION") VALUES
                (?, ?, ?)
                ON CONFLICT ("ADDRESS_ID") DO UPDATE SET
                "STREET" = EXCLUDED."STREET",
                "VERSION" = EXCLUDED."VERSION";
            "#}
            .trim()
        );
        let result = EntityDsl::insert(&a)
            .on_duplicate_key_ignore(Vec::new())
            .multiple(&[address.clone(), Address::new(2, "STREET 2", 1)])
            .dry_run(&config());
        assert_eq!(
            result.sql,
            indoc! {r#"
                INSERT INTO "ADDRESS" ("ADDRESS_ID", "STREET", "VERSION") VALUES
                (?, ?, ?),
                (?, ?, ?)
                ON CONFLICT ("ADDRESS_ID") DO NOTHING;
            "#}
            .trim()
        );
        assert_eq!(result.args.len(), 6);
    }

    #[test]
    fn set_based_statements() {
        let a = AddressMeta::new();
        let result = SqlDsl::update(&a)
            .set(|s| {
                s.set(&a.version, &a.version * 2 + 1);
            })
            .filter(|w| {
                w.not(|w| {
                    w.is_null(&a.street);
                });
            })
            .dry_run(&config());
        assert_eq!(
            result.sql,
            indoc! {r#"
                UPDATE "ADDRESS"
                SET "VERSION" = "VERSION" * ? + ?
                WHERE NOT ("STREET" IS NULL);
            "#}
            .trim()
        );
        let result = SqlDsl::delete(&a)
            .filter(|w| {
                w.between(&a.address_id, 5, 10);
            })
            .dry_run(&config());
        assert_eq!(
            result.sql_with_args,
            indoc! {r#"
                DELETE FROM "ADDRESS"
                WHERE "ADDRESS_ID" BETWEEN 5 AND 10;
            "#}
            .trim()
        );
    }

    #[test]
    fn negated_operators() {
        let a = AddressMeta::new();
        let result = EntityDsl::from(&a)
            .filter(|w| {
                w.ne(&a.address_id, 1)
                    .lt(&a.version, 3)
                    .not_like(&a.street, "%X%")
                    .not_in_list(&a.address_id, [4, 5])
                    .is_not_null(&a.street);
            })
            .dry_run(&config());
        assert_eq!(
            result.sql,
            indoc! {r#"
                SELECT "ADDRESS_ID", "STREET", "VERSION"
                FROM "ADDRESS"
                WHERE "ADDRESS_ID" <> ? AND "VERSION" < ? AND "STREET" NOT LIKE ? AND "ADDRESS_ID" NOT IN (?, ?) AND "STREET" IS NOT NULL;
            "#}
            .trim()
        );
        assert_eq!(result.args.len(), 5);

        let result = SqlDsl::update(&a)
            .set(|s| {
                s.set_null(&a.street);
            })
            .filter(|w| {
                w.lt(&a.version, 3);
            })
            .dry_run(&config());
        assert_eq!(
            result.sql,
            indoc! {r#"
                UPDATE "ADDRESS"
                SET "STREET" = ?
                WHERE "VERSION" < ?;
            "#}
            .trim()
        );
        assert_eq!(
            result.args,
            [Value::Varchar(None), Value::Int32(Some(3))]
        );
    }

    #[test]
    fn dry_run_reports_instead_of_failing() {
        let a = AddressMeta::new();
        let result = SqlDsl::update(&a)
            .filter(|w| {
                w.eq(&a.address_id, 1);
            })
            .dry_run(&config());
        assert!(result.error.is_some());
        assert!(result.sql.contains("has no assignment"), "{}", result.sql);
        assert!(result.args.is_empty());

        let result = SqlDsl::delete(&a).dry_run(&config());
        assert!(result.error.is_none());
        assert_eq!(result.sql, "DELETE FROM \"ADDRESS\";");

        let result = EntityDsl::from(&a).dry_run_default();
        assert!(result.description.contains("generic"), "{}", result.description);
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use kiln::{
        DatabaseConfig, EntityDsl, IntoQuery, MySqlDialect, PostgresDialect, SqlDsl, concat,
    };
    use kiln_tests::{Address, AddressMeta};

    #[test]
    fn postgres_numbers_the_placeholders() {
        let a = AddressMeta::new();
        let config = DatabaseConfig::new(PostgresDialect);
        let result = EntityDsl::update(&a)
            .single(&Address::new(1, "STREET 1", 1))
            .dry_run(&config);
        assert_eq!(
            result.sql,
            indoc! {r#"
                UPDATE "ADDRESS"
                SET "STREET" = $1, "VERSION" = "VERSION" + $2
                WHERE "ADDRESS_ID" = $3 AND "VERSION" = $4;
            "#}
            .trim()
        );
        assert_eq!(
            result.sql_with_args,
            indoc! {r#"
                UPDATE "ADDRESS"
                SET "STREET" = 'STREET 1', "VERSION" = "VERSION" + 1
                WHERE "ADDRESS_ID" = 1 AND "VERSION" = 1;
            "#}
            .trim()
        );
    }

    #[test]
    fn mysql_duplicate_keys() {
        let a = AddressMeta::new();
        let config = DatabaseConfig::new(MySqlDialect);
        let address = Address::new(1, "STREET 1", 1);
        let result = EntityDsl::insert(&a)
            .on_duplicate_key_update([a.address_id.erase()])
            .single(&address)
            .dry_run(&config);
        assert_eq!(
            result.sql,
            indoc! {"
                INSERT INTO `ADDRESS` (`ADDRESS_ID`, `STREET`, `VERSION`) VALUES
                (?, ?, ?)
                ON DUPLICATE KEY UPDATE
                `STREET` = VALUES(`STREET`),
                `VERSION` = VALUES(`VERSION`);
            "}
            .trim()
        );
        let result = EntityDsl::insert(&a)
            .on_duplicate_key_ignore(Vec::new())
            .single(&address)
            .dry_run(&config);
        assert_eq!(
            result.sql,
            indoc! {"
                INSERT IGNORE INTO `ADDRESS` (`ADDRESS_ID`, `STREET`, `VERSION`) VALUES
                (?, ?, ?);
            "}
            .trim()
        );
    }

    #[test]
    fn mysql_strings() {
        let a = AddressMeta::new();
        let config = DatabaseConfig::new(MySqlDialect);
        let result = EntityDsl::from(&a)
            .filter(|w| {
                w.eq(&a.street, r"C:\STREET");
            })
            .select(concat(&a.street, "'s"))
            .dry_run(&config);
        assert_eq!(
            result.sql_with_args,
            indoc! {r"
                SELECT CONCAT(`STREET`, '''s')
                FROM `ADDRESS`
                WHERE `STREET` = 'C:\\STREET';
            "}
            .trim()
        );
        let result = SqlDsl::delete(&a)
            .filter(|w| {
                w.ends_with(&a.street, "1");
            })
            .dry_run(&config);
        assert_eq!(
            result.sql,
            "DELETE FROM `ADDRESS`\nWHERE `STREET` LIKE ? ESCAPE '\\\\';"
        );
    }
}

use crate::{AddressMeta, DepartmentMeta, EmployeeMeta};
use kiln::{DatabaseConfig, EntityDsl, IntoQuery, SchemaDsl, Transport};

pub fn schema(transport: &mut dyn Transport, config: &DatabaseConfig) {
    let (a, d, e) = (AddressMeta::new(), DepartmentMeta::new(), EmployeeMeta::new());
    let tables = [a.table_metamodel(), d.table_metamodel(), e.table_metamodel()];

    SchemaDsl::drop(tables.clone())
        .run(transport, config)
        .expect("Failed to drop the tables");
    // Dropping what is not there is fine
    SchemaDsl::drop(tables.clone())
        .run(transport, config)
        .expect("Failed to drop the tables a second time");

    let create = SchemaDsl::create(tables.clone());
    let dry_run = create.dry_run(config);
    assert!(!dry_run.is_error(), "{}", dry_run.sql);
    assert_eq!(dry_run.sql.matches("CREATE TABLE").count(), 3);
    create.run(transport, config).expect("Failed to create the tables");
    // Existing tables are skipped
    create
        .run(transport, config)
        .expect("Failed to create the tables a second time");

    let rows = EntityDsl::from(&a)
        .run(transport, config)
        .expect("Failed to select from an empty table");
    assert!(rows.is_empty());

    SchemaDsl::drop(tables)
        .run(transport, config)
        .expect("Failed to drop the tables at the end");
    let error = EntityDsl::from(&d)
        .run(transport, config)
        .expect_err("A dropped table cannot be queried");
    assert!(format!("{:#}", error).contains("DEPARTMENT"));
}

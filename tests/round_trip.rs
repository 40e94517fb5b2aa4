#[cfg(test)]
mod tests {
    use kiln::{DatabaseConfig, EntityDsl, IntoQuery, SchemaDsl};
    use kiln_sqlite::{SqliteConnection, SqliteDialect};
    use kiln_tests::{
        Address, AddressMeta, Department, DepartmentMeta, EmployeeMeta, init_logs,
    };

    #[test]
    fn inserted_values_are_read_back() {
        init_logs();
        let mut connection = SqliteConnection::open_in_memory().expect("Could not open the database");
        let config = DatabaseConfig::new(SqliteDialect);
        let a = AddressMeta::new();
        SchemaDsl::create([a.table_metamodel()])
            .run(&mut connection, &config)
            .expect("Failed to create the table");
        EntityDsl::insert(&a)
            .single(&Address::new(16, "STREET 16", 0))
            .run(&mut connection, &config)
            .expect("Failed to insert");
        let row = EntityDsl::from(&a)
            .filter(|w| {
                w.eq(&a.address_id, 16);
            })
            .select_not_null((a.address_id.clone(), a.street.clone()))
            .first()
            .run(&mut connection, &config)
            .expect("Failed to select");
        assert_eq!(row, (16, "STREET 16".to_string()));
    }

    #[test]
    fn a_parent_without_children_maps_to_an_empty_set() {
        init_logs();
        let mut connection = SqliteConnection::open_in_memory().expect("Could not open the database");
        let config = DatabaseConfig::new(SqliteDialect);
        let (d, e) = (DepartmentMeta::new(), EmployeeMeta::new());
        SchemaDsl::create([d.table_metamodel(), e.table_metamodel()])
            .run(&mut connection, &config)
            .expect("Failed to create the tables");
        let department = Department {
            department_id: 1,
            department_no: 10,
            department_name: "ACCOUNTING".into(),
            location: "NEW YORK".into(),
            version: 1,
        };
        EntityDsl::insert(&d)
            .single(&department)
            .run(&mut connection, &config)
            .expect("Failed to insert");
        let store = EntityDsl::from(&d)
            .left_join(&e, |w| {
                w.eq(&d.department_id, &e.department_id);
            })
            .include_all()
            .run(&mut connection, &config)
            .expect("Failed to select");
        let map = store.one_to_many(&d, &e).expect("Failed to group");
        assert_eq!(map.len(), 1);
        assert!(map[&department].is_empty());
        assert!(store.list(&e).expect("Failed to list").is_empty());
    }
}

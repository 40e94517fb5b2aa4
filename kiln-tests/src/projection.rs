use crate::relations::setup;
use kiln::{
    DatabaseConfig, EntityDsl, IntoQuery, ProjectionType, QueryError, SelectOptions, Transport,
    avg, concat, count, count_of, max, min, sum,
};
use rust_decimal::Decimal;

pub fn projections(transport: &mut dyn Transport, config: &DatabaseConfig) {
    let (_, e) = setup(transport, config);

    let rows = EntityDsl::from(&e)
        .select((e.employee_name.clone(), e.manager_id.clone()))
        .order_by(&e.employee_id)
        .run(transport, config)
        .expect("Failed to select the names and the managers");
    assert_eq!(rows.len(), 7);
    assert_eq!(rows[0], (Some("SMITH".to_string()), Some(5)));
    assert_eq!(rows[5], (Some("KING".to_string()), None));

    let error = EntityDsl::from(&e)
        .select_not_null((e.employee_name.clone(), e.manager_id.clone()))
        .run(transport, config)
        .expect_err("A null manager cannot be mapped to a required column");
    assert!(QueryError::is_mapping(&error), "{:#}", error);

    let by_name = EntityDsl::from(&e)
        .select_not_null((e.employee_no.clone(), e.employee_name.clone()))
        .filter(|w| {
            w.is_null(&e.manager_id);
        })
        .options(|v| SelectOptions {
            projection_type: ProjectionType::Name,
            ..v
        })
        .first()
        .run(transport, config)
        .expect("Failed to select the employee without manager");
    assert_eq!(by_name, (7839, "KING".to_string()));

    let headcount = EntityDsl::from(&e)
        .select_not_null((e.department_id.clone(), count()))
        .group_by(&e.department_id)
        .having(|w| {
            w.ge(&count(), 2);
        })
        .order_by(&e.department_id.desc())
        .run(transport, config)
        .expect("Failed to count the employees per department");
    assert_eq!(headcount, [(3, 3), (2, 2), (1, 2)]);

    let (total, average) = EntityDsl::from(&e)
        .select_not_null((sum(&e.salary), avg(&e.salary)))
        .filter(|w| {
            w.eq(&e.department_id, 1);
        })
        .first()
        .run(transport, config)
        .expect("Failed to sum the salaries");
    assert_eq!(total, Decimal::new(7450, 0));
    assert_eq!(average, 3725.0);

    let bounds = EntityDsl::from(&e)
        .select_not_null((min(&e.employee_no), max(&e.employee_no), count_of(&e.manager_id)))
        .first()
        .run(transport, config)
        .expect("Failed to select the bounds");
    assert_eq!(bounds, (7369, 7839, 6));

    let departments = EntityDsl::from(&e)
        .select_not_null(e.department_id.clone())
        .distinct()
        .order_by(&e.department_id)
        .run(transport, config)
        .expect("Failed to select the distinct departments");
    assert_eq!(departments, [1, 2, 3]);

    let labels = EntityDsl::from(&e)
        .select_not_null((concat(&e.employee_name, "#"), &e.employee_no + 1))
        .filter(|w| {
            w.between(&e.employee_no, 7500, 7700);
        })
        .order_by(&e.employee_no)
        .run(transport, config)
        .expect("Failed to select the computed columns");
    assert_eq!(
        labels,
        [
            ("WARD#".to_string(), 7522),
            ("JONES#".to_string(), 7567),
            ("BLAKE#".to_string(), 7699),
        ]
    );

    let nobody = EntityDsl::from(&e)
        .select(e.employee_name.clone())
        .filter(|w| {
            w.eq(&e.employee_name, "NOBODY");
        })
        .first_or_none()
        .run(transport, config)
        .expect("Failed to look for a missing employee");
    assert_eq!(nobody, None);
}

pub fn records(transport: &mut dyn Transport, config: &DatabaseConfig) {
    let (_, e) = setup(transport, config);
    let rows = EntityDsl::from(&e)
        .select_columns([
            e.employee_name.erase(),
            e.salary.erase(),
            e.manager_id.erase(),
        ])
        .filter(|w| {
            w.eq(&e.employee_id, 6);
        })
        .run(transport, config)
        .expect("Failed to select the record of KING");
    assert_eq!(rows.len(), 1);
    let record = &rows[0];
    assert_eq!(
        record.get(&e.employee_name).expect("Failed to read the name"),
        Some("KING".to_string())
    );
    assert_eq!(
        record
            .get_not_null(&e.salary)
            .expect("Failed to read the salary"),
        Decimal::new(5000, 0)
    );
    assert_eq!(
        record
            .get(&e.manager_id)
            .expect("Failed to read the manager"),
        None
    );
    let error = record
        .get(&e.hiredate)
        .expect_err("The hire date was not selected");
    assert!(QueryError::is_mapping(&error));
}

use crate::{DepartmentMeta, EmployeeMeta, departments, employees, reset};
use kiln::{DatabaseConfig, EntityDsl, IntoQuery, Transport};

pub(crate) fn setup(transport: &mut dyn Transport, config: &DatabaseConfig) -> (DepartmentMeta, EmployeeMeta) {
    let (d, e) = (DepartmentMeta::new(), EmployeeMeta::new());
    reset(transport, config, [d.table_metamodel(), e.table_metamodel()]);
    EntityDsl::insert(&d)
        .multiple(&departments())
        .and_then(EntityDsl::insert(&e).multiple(&employees()))
        .run(transport, config)
        .expect("Failed to insert the departments and the employees");
    (d, e)
}

pub fn one_to_many(transport: &mut dyn Transport, config: &DatabaseConfig) {
    let (d, e) = setup(transport, config);

    let store = EntityDsl::from(&d)
        .left_join(&e, |w| {
            w.eq(&d.department_id, &e.department_id);
        })
        .order_by(&d.department_id)
        .order_by(&e.employee_id)
        .include_all()
        .run(transport, config)
        .expect("Failed to select the departments with their employees");
    assert!(store.contains(&d));
    assert!(store.contains(&e));
    assert_eq!(store.list(&d).expect("Failed to list the departments").len(), 4);
    assert_eq!(store.list(&e).expect("Failed to list the employees").len(), 7);

    let map = store
        .one_to_many(&d, &e)
        .expect("Failed to group the employees");
    let names = map
        .iter()
        .map(|(department, employees)| {
            (
                department.department_name.as_str(),
                employees
                    .iter()
                    .map(|v| v.employee_name.as_str())
                    .collect::<Vec<_>>(),
            )
        })
        .collect::<Vec<_>>();
    assert_eq!(
        names,
        [
            ("ACCOUNTING", vec!["KING", "CLARK"]),
            ("RESEARCH", vec!["SMITH", "JONES"]),
            ("SALES", vec!["ALLEN", "WARD", "BLAKE"]),
            ("OPERATIONS", vec![]),
        ]
    );

    let by_id = store
        .one_to_many_by_id(&d, &e)
        .expect("Failed to group the employees by department id");
    assert!(by_id[&4].is_empty());
    assert_eq!(by_id[&3].len(), 3);

    let store = EntityDsl::from(&e)
        .inner_join(&d, |w| {
            w.eq(&e.department_id, &d.department_id);
        })
        .filter(|w| {
            w.eq(&d.location, "DALLAS");
        })
        .order_by(&e.employee_id)
        .include(&d)
        .run(transport, config)
        .expect("Failed to select the employees of Dallas");
    let departments = store
        .list(&d)
        .expect("Failed to list the departments of Dallas");
    assert_eq!(departments.len(), 1);
    assert_eq!(departments[0].department_name, "RESEARCH");
    let names = store
        .list(&e)
        .expect("Failed to list the employees of Dallas")
        .into_iter()
        .map(|v| v.employee_name)
        .collect::<Vec<_>>();
    assert_eq!(names, ["SMITH", "JONES"]);
}

pub fn aliased_self_join(transport: &mut dyn Transport, config: &DatabaseConfig) {
    let (_, employee) = setup(transport, config);
    let (e, m) = (employee.alias("e"), employee.alias("m"));

    let store = EntityDsl::from(&e)
        .left_join(&m, |w| {
            w.eq(&e.manager_id, &m.employee_id);
        })
        .order_by(&e.employee_id)
        .include_all()
        .run(transport, config)
        .expect("Failed to select the employees with their managers");
    let managers = store
        .one_to_one(&e, &m)
        .expect("Failed to pair the employees with their managers");
    let pairs = managers
        .iter()
        .map(|(employee, manager)| {
            (
                employee.employee_name.as_str(),
                manager.as_ref().map(|v| v.employee_name.as_str()),
            )
        })
        .collect::<Vec<_>>();
    assert_eq!(
        pairs,
        [
            ("SMITH", Some("JONES")),
            ("ALLEN", Some("BLAKE")),
            ("WARD", Some("BLAKE")),
            ("BLAKE", Some("KING")),
            ("JONES", Some("KING")),
            ("KING", None),
            ("CLARK", Some("KING")),
        ]
    );
}

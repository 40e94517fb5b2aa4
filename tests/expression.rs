#[cfg(test)]
mod tests {
    use indoc::indoc;
    use kiln::{
        AggregateFunction, ColumnExpression, DatabaseConfig, EntityDsl, GenericDialect,
        IntoQuery, concat, count, count_of,
    };
    use kiln_tests::{AddressMeta, DepartmentMeta, EmployeeMeta};

    #[test]
    fn ascending_twice_is_ascending_once() {
        let a = AddressMeta::new();
        let asc = a.street.asc();
        assert!(asc.asc().ptr_eq(&asc));
        assert!(!asc.desc().ptr_eq(&asc));
        assert!(asc.desc().asc().expression() == asc.expression());
    }

    #[test]
    fn counting_rows_is_not_counting_a_column() {
        let a = AddressMeta::new();
        assert!(matches!(
            count().expression().as_ref(),
            ColumnExpression::Aggregate(AggregateFunction::CountAsterisk)
        ));
        assert!(matches!(
            count_of(&a.street).expression().as_ref(),
            ColumnExpression::Aggregate(AggregateFunction::Count(..))
        ));
    }

    #[test]
    fn joins_qualify_the_columns() {
        let (d, e) = (DepartmentMeta::new(), EmployeeMeta::new());
        let query = EntityDsl::from(&d)
            .inner_join(&e, |w| {
                w.eq(&d.department_id, &e.department_id);
            })
            .group_by(&d.department_name)
            .having(|w| {
                w.ge(&count(), 2);
            })
            .order_by(&d.department_name.asc())
            .select((d.department_name.clone(), count_of(&e.employee_id)));
        let result = query.dry_run(&DatabaseConfig::new(GenericDialect));
        assert_eq!(
            result.sql,
            indoc! {r#"
                SELECT "DEPARTMENT"."DEPARTMENT_NAME", COUNT("EMPLOYEE"."EMPLOYEE_ID")
                FROM "DEPARTMENT"
                INNER JOIN "EMPLOYEE" ON "DEPARTMENT"."DEPARTMENT_ID" = "EMPLOYEE"."DEPARTMENT_ID"
                GROUP BY "DEPARTMENT"."DEPARTMENT_NAME"
                HAVING COUNT(*) >= ?
                ORDER BY "DEPARTMENT"."DEPARTMENT_NAME" ASC;
            "#}
            .trim()
        );
    }

    #[test]
    fn aliases_are_declared_once() {
        let (e, m) = (EmployeeMeta::new().alias("e"), EmployeeMeta::new().alias("m"));
        let query = EntityDsl::from(&e)
            .left_join(&m, |w| {
                w.eq(&e.manager_id, &m.employee_id);
            })
            .select((e.employee_name.clone(), concat(&m.employee_name, "!")));
        let result = query.dry_run(&DatabaseConfig::new(GenericDialect));
        assert_eq!(
            result.sql,
            indoc! {r#"
                SELECT e."EMPLOYEE_NAME", (m."EMPLOYEE_NAME" || ?)
                FROM "EMPLOYEE" e
                LEFT JOIN "EMPLOYEE" m ON e."MANAGER_ID" = m."EMPLOYEE_ID";
            "#}
            .trim()
        );
    }
}

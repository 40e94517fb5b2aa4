use kiln::{
    Entity, EntityMetamodel, IdGenerator, Property, PropertyExpression, TableMetamodel,
    table_metamodel,
};
use rust_decimal::Decimal;
use std::{ops::Deref, sync::Arc};
use time::{Date, Month, OffsetDateTime};

/// Implements `Deref` to the metamodel, so that a meta can be passed wherever the dsl expects
/// one.
macro_rules! deref_metamodel {
    ($meta:ident, $entity:ty) => {
        impl Deref for $meta {
            type Target = EntityMetamodel<$entity>;
            fn deref(&self) -> &Self::Target {
                &self.metamodel
            }
        }
        impl $meta {
            /// The table erased of its entity type, as schema statements take it.
            pub fn table_metamodel(&self) -> Arc<dyn TableMetamodel> {
                table_metamodel(&self.metamodel)
            }
        }
    };
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address {
    pub address_id: i32,
    pub street: String,
    pub version: i32,
}

impl Address {
    pub fn new(address_id: i32, street: impl Into<String>, version: i32) -> Self {
        Self {
            address_id,
            street: street.into(),
            version,
        }
    }
}

impl Entity for Address {
    type Id = i32;
    fn id(&self) -> i32 {
        self.address_id
    }
}

pub struct AddressMeta {
    metamodel: EntityMetamodel<Address>,
    pub address_id: PropertyExpression<i32>,
    pub street: PropertyExpression<String>,
    pub version: PropertyExpression<i32>,
}

impl AddressMeta {
    pub fn new() -> Self {
        Self::from_metamodel(
            EntityMetamodel::builder("ADDRESS", Address::default)
                .id(Property::new(
                    "ADDRESS_ID",
                    |v: &Address| &v.address_id,
                    |v| &mut v.address_id,
                ))
                .property(
                    Property::new("STREET", |v: &Address| &v.street, |v| &mut v.street).unique(),
                )
                .version(Property::new(
                    "VERSION",
                    |v: &Address| &v.version,
                    |v| &mut v.version,
                ))
                .build(),
        )
    }
    pub fn alias(&self, alias: &'static str) -> Self {
        Self::from_metamodel(self.metamodel.with_alias(alias))
    }
    fn from_metamodel(metamodel: EntityMetamodel<Address>) -> Self {
        Self {
            address_id: metamodel.property("ADDRESS_ID"),
            street: metamodel.property("STREET"),
            version: metamodel.property("VERSION"),
            metamodel,
        }
    }
}
deref_metamodel!(AddressMeta, Address);

#[derive(Default, Debug, Clone, PartialEq, Eq, Hash)]
pub struct Department {
    pub department_id: i32,
    pub department_no: i32,
    pub department_name: String,
    pub location: String,
    pub version: i32,
}

impl Entity for Department {
    type Id = i32;
    fn id(&self) -> i32 {
        self.department_id
    }
}

pub struct DepartmentMeta {
    metamodel: EntityMetamodel<Department>,
    pub department_id: PropertyExpression<i32>,
    pub department_no: PropertyExpression<i32>,
    pub department_name: PropertyExpression<String>,
    pub location: PropertyExpression<String>,
    pub version: PropertyExpression<i32>,
}

impl DepartmentMeta {
    pub fn new() -> Self {
        Self::from_metamodel(
            EntityMetamodel::builder("DEPARTMENT", Department::default)
                .id(Property::new(
                    "DEPARTMENT_ID",
                    |v: &Department| &v.department_id,
                    |v| &mut v.department_id,
                ))
                .property(
                    Property::new(
                        "DEPARTMENT_NO",
                        |v: &Department| &v.department_no,
                        |v| &mut v.department_no,
                    )
                    .unique(),
                )
                .property(Property::new(
                    "DEPARTMENT_NAME",
                    |v: &Department| &v.department_name,
                    |v| &mut v.department_name,
                ))
                .property(Property::new(
                    "LOCATION",
                    |v: &Department| &v.location,
                    |v| &mut v.location,
                ))
                .version(Property::new(
                    "VERSION",
                    |v: &Department| &v.version,
                    |v| &mut v.version,
                ))
                .build(),
        )
    }
    fn from_metamodel(metamodel: EntityMetamodel<Department>) -> Self {
        Self {
            department_id: metamodel.property("DEPARTMENT_ID"),
            department_no: metamodel.property("DEPARTMENT_NO"),
            department_name: metamodel.property("DEPARTMENT_NAME"),
            location: metamodel.property("LOCATION"),
            version: metamodel.property("VERSION"),
            metamodel,
        }
    }
}
deref_metamodel!(DepartmentMeta, Department);

#[derive(Default, Debug, Clone, PartialEq, Eq, Hash)]
pub struct Employee {
    pub employee_id: i32,
    pub employee_no: i32,
    pub employee_name: String,
    pub manager_id: Option<i32>,
    pub hiredate: Option<Date>,
    pub salary: Decimal,
    pub department_id: i32,
    pub address_id: i32,
    pub version: i32,
}

impl Entity for Employee {
    type Id = i32;
    fn id(&self) -> i32 {
        self.employee_id
    }
}

pub struct EmployeeMeta {
    metamodel: EntityMetamodel<Employee>,
    pub employee_id: PropertyExpression<i32>,
    pub employee_no: PropertyExpression<i32>,
    pub employee_name: PropertyExpression<String>,
    pub manager_id: PropertyExpression<i32>,
    pub hiredate: PropertyExpression<Date>,
    pub salary: PropertyExpression<Decimal>,
    pub department_id: PropertyExpression<i32>,
    pub address_id: PropertyExpression<i32>,
    pub version: PropertyExpression<i32>,
}

impl EmployeeMeta {
    pub fn new() -> Self {
        Self::from_metamodel(
            EntityMetamodel::builder("EMPLOYEE", Employee::default)
                .id(Property::new(
                    "EMPLOYEE_ID",
                    |v: &Employee| &v.employee_id,
                    |v| &mut v.employee_id,
                ))
                .property(Property::new(
                    "EMPLOYEE_NO",
                    |v: &Employee| &v.employee_no,
                    |v| &mut v.employee_no,
                ))
                .property(Property::new(
                    "EMPLOYEE_NAME",
                    |v: &Employee| &v.employee_name,
                    |v| &mut v.employee_name,
                ))
                .property(Property::new(
                    "MANAGER_ID",
                    |v: &Employee| &v.manager_id,
                    |v| &mut v.manager_id,
                ))
                .property(Property::new(
                    "HIREDATE",
                    |v: &Employee| &v.hiredate,
                    |v| &mut v.hiredate,
                ))
                .property(Property::new(
                    "SALARY",
                    |v: &Employee| &v.salary,
                    |v| &mut v.salary,
                ))
                .property(Property::new(
                    "DEPARTMENT_ID",
                    |v: &Employee| &v.department_id,
                    |v| &mut v.department_id,
                ))
                .property(Property::new(
                    "ADDRESS_ID",
                    |v: &Employee| &v.address_id,
                    |v| &mut v.address_id,
                ))
                .version(Property::new(
                    "VERSION",
                    |v: &Employee| &v.version,
                    |v| &mut v.version,
                ))
                .build(),
        )
    }
    pub fn alias(&self, alias: &'static str) -> Self {
        Self::from_metamodel(self.metamodel.with_alias(alias))
    }
    fn from_metamodel(metamodel: EntityMetamodel<Employee>) -> Self {
        Self {
            employee_id: metamodel.property("EMPLOYEE_ID"),
            employee_no: metamodel.property("EMPLOYEE_NO"),
            employee_name: metamodel.property("EMPLOYEE_NAME"),
            manager_id: metamodel.property("MANAGER_ID"),
            hiredate: metamodel.property("HIREDATE"),
            salary: metamodel.property("SALARY"),
            department_id: metamodel.property("DEPARTMENT_ID"),
            address_id: metamodel.property("ADDRESS_ID"),
            version: metamodel.property("VERSION"),
            metamodel,
        }
    }
}
deref_metamodel!(EmployeeMeta, Employee);

/// Its identifier is generated by the database.
#[derive(Default, Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityStrategy {
    pub id: i32,
    pub value: String,
}

impl IdentityStrategy {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            id: 0,
            value: value.into(),
        }
    }
}

impl Entity for IdentityStrategy {
    type Id = i32;
    fn id(&self) -> i32 {
        self.id
    }
}

pub struct IdentityStrategyMeta {
    metamodel: EntityMetamodel<IdentityStrategy>,
    pub id: PropertyExpression<i32>,
    pub value: PropertyExpression<String>,
}

impl IdentityStrategyMeta {
    pub fn new() -> Self {
        let metamodel = EntityMetamodel::builder("IDENTITY_STRATEGY", IdentityStrategy::default)
            .id(Property::new(
                "ID",
                |v: &IdentityStrategy| &v.id,
                |v| &mut v.id,
            ))
            .property(Property::new(
                "VALUE",
                |v: &IdentityStrategy| &v.value,
                |v| &mut v.value,
            ))
            .id_generator(IdGenerator::Identity)
            .build();
        Self {
            id: metamodel.property("ID"),
            value: metamodel.property("VALUE"),
            metamodel,
        }
    }
}
deref_metamodel!(IdentityStrategyMeta, IdentityStrategy);

/// Carries the timestamps of its creation and last update.
#[derive(Default, Debug, Clone, PartialEq, Eq, Hash)]
pub struct Memo {
    pub memo_id: i32,
    pub body: String,
    pub created_at: Option<OffsetDateTime>,
    pub updated_at: Option<OffsetDateTime>,
}

impl Entity for Memo {
    type Id = i32;
    fn id(&self) -> i32 {
        self.memo_id
    }
}

pub struct MemoMeta {
    metamodel: EntityMetamodel<Memo>,
    pub memo_id: PropertyExpression<i32>,
    pub body: PropertyExpression<String>,
    pub created_at: PropertyExpression<OffsetDateTime>,
    pub updated_at: PropertyExpression<OffsetDateTime>,
}

impl MemoMeta {
    pub fn new() -> Self {
        let metamodel = EntityMetamodel::builder("MEMO", Memo::default)
            .id(Property::new("MEMO_ID", |v: &Memo| &v.memo_id, |v| &mut v.memo_id))
            .property(Property::new("BODY", |v: &Memo| &v.body, |v| &mut v.body))
            .created_at(Property::new(
                "CREATED_AT",
                |v: &Memo| &v.created_at,
                |v| &mut v.created_at,
            ))
            .updated_at(Property::new(
                "UPDATED_AT",
                |v: &Memo| &v.updated_at,
                |v| &mut v.updated_at,
            ))
            .build();
        Self {
            memo_id: metamodel.property("MEMO_ID"),
            body: metamodel.property("BODY"),
            created_at: metamodel.property("CREATED_AT"),
            updated_at: metamodel.property("UPDATED_AT"),
            metamodel,
        }
    }
}
deref_metamodel!(MemoMeta, Memo);

/// `ADDRESS` rows 1 to 15, all at version 1.
pub fn addresses() -> Vec<Address> {
    (1..=15)
        .map(|i| Address::new(i, format!("STREET {}", i), 1))
        .collect()
}

/// Four departments, the last one has no employee.
pub fn departments() -> Vec<Department> {
    [
        (1, 10, "ACCOUNTING", "NEW YORK"),
        (2, 20, "RESEARCH", "DALLAS"),
        (3, 30, "SALES", "CHICAGO"),
        (4, 40, "OPERATIONS", "BOSTON"),
    ]
    .into_iter()
    .map(|(id, no, name, location)| Department {
        department_id: id,
        department_no: no,
        department_name: name.into(),
        location: location.into(),
        version: 1,
    })
    .collect()
}

pub fn employees() -> Vec<Employee> {
    [
        (1, 7369, "SMITH", Some(5), (1980, Month::December, 17), 800, 2, 1),
        (2, 7499, "ALLEN", Some(4), (1981, Month::February, 20), 1600, 3, 2),
        (3, 7521, "WARD", Some(4), (1981, Month::February, 22), 1250, 3, 3),
        (4, 7698, "BLAKE", Some(6), (1981, Month::May, 1), 2850, 3, 4),
        (5, 7566, "JONES", Some(6), (1981, Month::April, 2), 2975, 2, 5),
        (6, 7839, "KING", None, (1981, Month::November, 17), 5000, 1, 6),
        (7, 7782, "CLARK", Some(6), (1981, Month::June, 9), 2450, 1, 7),
    ]
    .into_iter()
    .map(
        |(id, no, name, manager, (year, month, day), salary, department, address)| Employee {
            employee_id: id,
            employee_no: no,
            employee_name: name.into(),
            manager_id: manager,
            hiredate: Date::from_calendar_date(year, month, day).ok(),
            salary: Decimal::new(salary * 100, 2),
            department_id: department,
            address_id: address,
            version: 1,
        },
    )
    .collect()
}

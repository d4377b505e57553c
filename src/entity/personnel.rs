//! Personnel: employees and the lookup tables they reference.

use super::{lookup_entity, EntityDef, FieldDef, OnDelete, ResourceModel};
use crate::db::DbError;
use chrono::{NaiveDate, NaiveDateTime};
use may_postgres::Row;
use rust_decimal::Decimal;
use serde::Serialize;

lookup_entity!(Gender, GENDERS, table: "genders", path: "genders",
    seeds: ["female", "male", "diverse"]);

lookup_entity!(Department, DEPARTMENTS, table: "departments", path: "departments",
    seeds: ["Management", "Sales", "Marketing", "Field Staff", "Accounting"]);

lookup_entity!(Occupation, OCCUPATIONS, table: "occupations", path: "occupations",
    seeds: ["Project Manager", "Promoter", "Merchandiser", "Team Lead", "Accountant"]);

lookup_entity!(Skill, SKILLS, table: "skills", path: "skills",
    seeds: ["Sales Talk", "Sampling", "Moderation", "Barista", "Driving"]);

lookup_entity!(ServiceArea, SERVICE_AREAS, table: "service_areas", path: "service-areas",
    seeds: ["North", "South", "East", "West", "Central"]);

pub static EMPLOYEES: EntityDef = EntityDef {
    table: "employees",
    path: "employees",
    fields: &[
        FieldDef::text("first_name").required(),
        FieldDef::text("last_name").required(),
        FieldDef::email("email").required().unique(),
        FieldDef::text("phone").max(50),
        FieldDef::date("birthday"),
        FieldDef::text("address"),
        FieldDef::text("zip").max(20),
        FieldDef::text("city"),
        FieldDef::belongs_to("country_id", "countries", OnDelete::SetNull),
        FieldDef::belongs_to("gender_id", "genders", OnDelete::SetNull),
        FieldDef::belongs_to("department_id", "departments", OnDelete::SetNull),
        FieldDef::belongs_to("occupation_id", "occupations", OnDelete::SetNull),
        FieldDef::integer("weekly_hours"),
        FieldDef::decimal("salary"),
        FieldDef::date("hired_on"),
        FieldDef::boolean("active").default_sql("TRUE"),
    ],
    composite_unique: &[],
    children: &[],
    seeds: &[],
};

#[derive(Debug, Serialize)]
pub struct Employee {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub address: Option<String>,
    pub zip: Option<String>,
    pub city: Option<String>,
    pub country_id: Option<i64>,
    pub gender_id: Option<i64>,
    pub department_id: Option<i64>,
    pub occupation_id: Option<i64>,
    pub weekly_hours: Option<i64>,
    pub salary: Option<Decimal>,
    pub hired_on: Option<NaiveDate>,
    pub active: bool,
    #[serde(with = "crate::resource::wire::datetime")]
    pub created_at: NaiveDateTime,
    #[serde(with = "crate::resource::wire::datetime")]
    pub updated_at: NaiveDateTime,
}

impl ResourceModel for Employee {
    const DEF: &'static EntityDef = &EMPLOYEES;

    fn from_row(row: &Row) -> Result<Self, DbError> {
        Ok(Self {
            id: row.try_get::<&str, i64>("id")?,
            first_name: row.try_get::<&str, String>("first_name")?,
            last_name: row.try_get::<&str, String>("last_name")?,
            email: row.try_get::<&str, String>("email")?,
            phone: row.try_get::<&str, Option<String>>("phone")?,
            birthday: row.try_get::<&str, Option<NaiveDate>>("birthday")?,
            address: row.try_get::<&str, Option<String>>("address")?,
            zip: row.try_get::<&str, Option<String>>("zip")?,
            city: row.try_get::<&str, Option<String>>("city")?,
            country_id: row.try_get::<&str, Option<i64>>("country_id")?,
            gender_id: row.try_get::<&str, Option<i64>>("gender_id")?,
            department_id: row.try_get::<&str, Option<i64>>("department_id")?,
            occupation_id: row.try_get::<&str, Option<i64>>("occupation_id")?,
            weekly_hours: row.try_get::<&str, Option<i64>>("weekly_hours")?,
            salary: row.try_get::<&str, Option<Decimal>>("salary")?,
            hired_on: row.try_get::<&str, Option<NaiveDate>>("hired_on")?,
            active: row.try_get::<&str, bool>("active")?,
            created_at: row.try_get::<&str, NaiveDateTime>("created_at")?,
            updated_at: row.try_get::<&str, NaiveDateTime>("updated_at")?,
        })
    }
}

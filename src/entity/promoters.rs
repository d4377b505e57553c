//! Promoters and their grouping.

use super::{ChildDef, EntityDef, FieldDef, OnDelete, ResourceModel};
use crate::db::DbError;
use chrono::{NaiveDate, NaiveDateTime};
use may_postgres::Row;
use rust_decimal::Decimal;
use serde::Serialize;

pub static PROMOTER_GROUPS: EntityDef = EntityDef {
    table: "promoter_groups",
    path: "promoter-groups",
    fields: &[
        FieldDef::text("name").required().unique(),
        FieldDef::long_text("description"),
    ],
    composite_unique: &[],
    children: &[ChildDef {
        segment: "members",
        child_table: "promoters",
        fk: "promoter_group_id",
        via: None,
    }],
    seeds: &[],
};

#[derive(Debug, Serialize)]
pub struct PromoterGroup {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    #[serde(with = "crate::resource::wire::datetime")]
    pub created_at: NaiveDateTime,
    #[serde(with = "crate::resource::wire::datetime")]
    pub updated_at: NaiveDateTime,
}

impl ResourceModel for PromoterGroup {
    const DEF: &'static EntityDef = &PROMOTER_GROUPS;

    fn from_row(row: &Row) -> Result<Self, DbError> {
        Ok(Self {
            id: row.try_get::<&str, i64>("id")?,
            name: row.try_get::<&str, String>("name")?,
            description: row.try_get::<&str, Option<String>>("description")?,
            created_at: row.try_get::<&str, NaiveDateTime>("created_at")?,
            updated_at: row.try_get::<&str, NaiveDateTime>("updated_at")?,
        })
    }
}

pub static PROMOTERS: EntityDef = EntityDef {
    table: "promoters",
    path: "promoters",
    fields: &[
        FieldDef::text("first_name").required(),
        FieldDef::text("last_name").required(),
        FieldDef::email("email").required().unique(),
        FieldDef::text("phone").max(50),
        FieldDef::date("birthday"),
        FieldDef::integer("height_cm"),
        FieldDef::text("shirt_size").max(10),
        FieldDef::boolean("driving_license").default_sql("FALSE"),
        FieldDef::belongs_to("gender_id", "genders", OnDelete::SetNull),
        FieldDef::belongs_to("service_area_id", "service_areas", OnDelete::SetNull),
        FieldDef::belongs_to("promoter_group_id", "promoter_groups", OnDelete::SetNull),
        FieldDef::decimal("hourly_rate"),
        FieldDef::long_text("notes"),
        FieldDef::boolean("active").default_sql("TRUE"),
    ],
    composite_unique: &[],
    children: &[],
    seeds: &[],
};

#[derive(Debug, Serialize)]
pub struct Promoter {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub height_cm: Option<i64>,
    pub shirt_size: Option<String>,
    pub driving_license: bool,
    pub gender_id: Option<i64>,
    pub service_area_id: Option<i64>,
    pub promoter_group_id: Option<i64>,
    pub hourly_rate: Option<Decimal>,
    pub notes: Option<String>,
    pub active: bool,
    #[serde(with = "crate::resource::wire::datetime")]
    pub created_at: NaiveDateTime,
    #[serde(with = "crate::resource::wire::datetime")]
    pub updated_at: NaiveDateTime,
}

impl ResourceModel for Promoter {
    const DEF: &'static EntityDef = &PROMOTERS;

    fn from_row(row: &Row) -> Result<Self, DbError> {
        Ok(Self {
            id: row.try_get::<&str, i64>("id")?,
            first_name: row.try_get::<&str, String>("first_name")?,
            last_name: row.try_get::<&str, String>("last_name")?,
            email: row.try_get::<&str, String>("email")?,
            phone: row.try_get::<&str, Option<String>>("phone")?,
            birthday: row.try_get::<&str, Option<NaiveDate>>("birthday")?,
            height_cm: row.try_get::<&str, Option<i64>>("height_cm")?,
            shirt_size: row.try_get::<&str, Option<String>>("shirt_size")?,
            driving_license: row.try_get::<&str, bool>("driving_license")?,
            gender_id: row.try_get::<&str, Option<i64>>("gender_id")?,
            service_area_id: row.try_get::<&str, Option<i64>>("service_area_id")?,
            promoter_group_id: row.try_get::<&str, Option<i64>>("promoter_group_id")?,
            hourly_rate: row.try_get::<&str, Option<Decimal>>("hourly_rate")?,
            notes: row.try_get::<&str, Option<String>>("notes")?,
            active: row.try_get::<&str, bool>("active")?,
            created_at: row.try_get::<&str, NaiveDateTime>("created_at")?,
            updated_at: row.try_get::<&str, NaiveDateTime>("updated_at")?,
        })
    }
}

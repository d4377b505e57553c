//! Events, venues and promoter commitments.

use super::{lookup_entity, EntityDef, FieldDef, OnDelete, ResourceModel};
use crate::db::DbError;
use chrono::NaiveDateTime;
use may_postgres::Row;
use rust_decimal::Decimal;
use serde::Serialize;

lookup_entity!(EventState, EVENT_STATES, table: "event_states", path: "event-states",
    seeds: ["planned", "confirmed", "running", "completed", "cancelled"]);

lookup_entity!(CommitmentState, COMMITMENT_STATES,
    table: "commitment_states", path: "commitment-states",
    seeds: ["requested", "accepted", "declined", "cancelled"]);

pub static LOCATIONS: EntityDef = EntityDef {
    table: "locations",
    path: "locations",
    fields: &[
        FieldDef::text("name").required(),
        FieldDef::text("address"),
        FieldDef::text("zip").max(20),
        FieldDef::text("city"),
        FieldDef::belongs_to("country_id", "countries", OnDelete::SetNull),
        FieldDef::integer("capacity"),
        FieldDef::long_text("notes"),
    ],
    composite_unique: &[],
    children: &[],
    seeds: &[],
};

#[derive(Debug, Serialize)]
pub struct Location {
    pub id: i64,
    pub name: String,
    pub address: Option<String>,
    pub zip: Option<String>,
    pub city: Option<String>,
    pub country_id: Option<i64>,
    pub capacity: Option<i64>,
    pub notes: Option<String>,
    #[serde(with = "crate::resource::wire::datetime")]
    pub created_at: NaiveDateTime,
    #[serde(with = "crate::resource::wire::datetime")]
    pub updated_at: NaiveDateTime,
}

impl ResourceModel for Location {
    const DEF: &'static EntityDef = &LOCATIONS;

    fn from_row(row: &Row) -> Result<Self, DbError> {
        Ok(Self {
            id: row.try_get::<&str, i64>("id")?,
            name: row.try_get::<&str, String>("name")?,
            address: row.try_get::<&str, Option<String>>("address")?,
            zip: row.try_get::<&str, Option<String>>("zip")?,
            city: row.try_get::<&str, Option<String>>("city")?,
            country_id: row.try_get::<&str, Option<i64>>("country_id")?,
            capacity: row.try_get::<&str, Option<i64>>("capacity")?,
            notes: row.try_get::<&str, Option<String>>("notes")?,
            created_at: row.try_get::<&str, NaiveDateTime>("created_at")?,
            updated_at: row.try_get::<&str, NaiveDateTime>("updated_at")?,
        })
    }
}

pub static EVENTS: EntityDef = EntityDef {
    table: "events",
    path: "events",
    fields: &[
        FieldDef::text("title").required(),
        FieldDef::belongs_to("customer_id", "customers", OnDelete::Restrict),
        FieldDef::belongs_to("location_id", "locations", OnDelete::SetNull),
        FieldDef::datetime("starts_at").required(),
        FieldDef::datetime("ends_at").required(),
        FieldDef::decimal("budget"),
        FieldDef::integer("staff_required"),
        FieldDef::long_text("description"),
        FieldDef::belongs_to("state_id", "event_states", OnDelete::SetNull).embedded(),
    ],
    composite_unique: &[],
    children: &[],
    seeds: &[],
};

#[derive(Debug, Serialize)]
pub struct Event {
    pub id: i64,
    pub title: String,
    pub customer_id: Option<i64>,
    pub location_id: Option<i64>,
    #[serde(with = "crate::resource::wire::datetime")]
    pub starts_at: NaiveDateTime,
    #[serde(with = "crate::resource::wire::datetime")]
    pub ends_at: NaiveDateTime,
    pub budget: Option<Decimal>,
    pub staff_required: Option<i64>,
    pub description: Option<String>,
    pub state_id: Option<i64>,
    #[serde(with = "crate::resource::wire::datetime")]
    pub created_at: NaiveDateTime,
    #[serde(with = "crate::resource::wire::datetime")]
    pub updated_at: NaiveDateTime,
}

impl ResourceModel for Event {
    const DEF: &'static EntityDef = &EVENTS;

    fn from_row(row: &Row) -> Result<Self, DbError> {
        Ok(Self {
            id: row.try_get::<&str, i64>("id")?,
            title: row.try_get::<&str, String>("title")?,
            customer_id: row.try_get::<&str, Option<i64>>("customer_id")?,
            location_id: row.try_get::<&str, Option<i64>>("location_id")?,
            starts_at: row.try_get::<&str, NaiveDateTime>("starts_at")?,
            ends_at: row.try_get::<&str, NaiveDateTime>("ends_at")?,
            budget: row.try_get::<&str, Option<Decimal>>("budget")?,
            staff_required: row.try_get::<&str, Option<i64>>("staff_required")?,
            description: row.try_get::<&str, Option<String>>("description")?,
            state_id: row.try_get::<&str, Option<i64>>("state_id")?,
            created_at: row.try_get::<&str, NaiveDateTime>("created_at")?,
            updated_at: row.try_get::<&str, NaiveDateTime>("updated_at")?,
        })
    }
}

pub static COMMITMENTS: EntityDef = EntityDef {
    table: "commitments",
    path: "commitments",
    fields: &[
        FieldDef::belongs_to("promoter_id", "promoters", OnDelete::Restrict).required(),
        FieldDef::belongs_to("event_id", "events", OnDelete::Cascade).required(),
        FieldDef::text("role").required(),
        FieldDef::datetime("start_time").required(),
        FieldDef::datetime("end_time").required(),
        FieldDef::belongs_to("state_id", "commitment_states", OnDelete::SetNull).embedded(),
    ],
    composite_unique: &[],
    children: &[],
    seeds: &[],
};

#[derive(Debug, Serialize)]
pub struct Commitment {
    pub id: i64,
    pub promoter_id: i64,
    pub event_id: i64,
    pub role: String,
    #[serde(with = "crate::resource::wire::datetime")]
    pub start_time: NaiveDateTime,
    #[serde(with = "crate::resource::wire::datetime")]
    pub end_time: NaiveDateTime,
    pub state_id: Option<i64>,
    #[serde(with = "crate::resource::wire::datetime")]
    pub created_at: NaiveDateTime,
    #[serde(with = "crate::resource::wire::datetime")]
    pub updated_at: NaiveDateTime,
}

impl ResourceModel for Commitment {
    const DEF: &'static EntityDef = &COMMITMENTS;

    fn from_row(row: &Row) -> Result<Self, DbError> {
        Ok(Self {
            id: row.try_get::<&str, i64>("id")?,
            promoter_id: row.try_get::<&str, i64>("promoter_id")?,
            event_id: row.try_get::<&str, i64>("event_id")?,
            role: row.try_get::<&str, String>("role")?,
            start_time: row.try_get::<&str, NaiveDateTime>("start_time")?,
            end_time: row.try_get::<&str, NaiveDateTime>("end_time")?,
            state_id: row.try_get::<&str, Option<i64>>("state_id")?,
            created_at: row.try_get::<&str, NaiveDateTime>("created_at")?,
            updated_at: row.try_get::<&str, NaiveDateTime>("updated_at")?,
        })
    }
}

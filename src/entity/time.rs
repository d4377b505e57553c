//! Working-time records.

use super::{lookup_entity, EntityDef, FieldDef, OnDelete, ResourceModel};
use crate::db::DbError;
use chrono::NaiveDateTime;
use may_postgres::Row;
use serde::Serialize;

lookup_entity!(TimeTrackingState, TIME_TRACKING_STATES,
    table: "time_tracking_states", path: "time-tracking-states",
    seeds: ["running", "stopped", "approved"]);

lookup_entity!(TimeTrackingChannel, TIME_TRACKING_CHANNELS,
    table: "time_tracking_channels", path: "time-tracking-channels",
    seeds: ["web", "mobile", "terminal"]);

pub static TIME_TRACKINGS: EntityDef = EntityDef {
    table: "time_trackings",
    path: "time-trackings",
    fields: &[
        FieldDef::belongs_to("employee_id", "employees", OnDelete::Cascade).required(),
        FieldDef::belongs_to("commitment_id", "commitments", OnDelete::SetNull),
        FieldDef::belongs_to("channel_id", "time_tracking_channels", OnDelete::SetNull),
        FieldDef::datetime("started_at").required(),
        FieldDef::datetime("ended_at"),
        FieldDef::belongs_to("state_id", "time_tracking_states", OnDelete::SetNull).embedded(),
        FieldDef::long_text("note"),
    ],
    composite_unique: &[],
    children: &[],
    seeds: &[],
};

#[derive(Debug, Serialize)]
pub struct TimeTracking {
    pub id: i64,
    pub employee_id: i64,
    pub commitment_id: Option<i64>,
    pub channel_id: Option<i64>,
    #[serde(with = "crate::resource::wire::datetime")]
    pub started_at: NaiveDateTime,
    #[serde(with = "crate::resource::wire::datetime_opt")]
    pub ended_at: Option<NaiveDateTime>,
    pub state_id: Option<i64>,
    pub note: Option<String>,
    #[serde(with = "crate::resource::wire::datetime")]
    pub created_at: NaiveDateTime,
    #[serde(with = "crate::resource::wire::datetime")]
    pub updated_at: NaiveDateTime,
}

impl ResourceModel for TimeTracking {
    const DEF: &'static EntityDef = &TIME_TRACKINGS;

    fn from_row(row: &Row) -> Result<Self, DbError> {
        Ok(Self {
            id: row.try_get::<&str, i64>("id")?,
            employee_id: row.try_get::<&str, i64>("employee_id")?,
            commitment_id: row.try_get::<&str, Option<i64>>("commitment_id")?,
            channel_id: row.try_get::<&str, Option<i64>>("channel_id")?,
            started_at: row.try_get::<&str, NaiveDateTime>("started_at")?,
            ended_at: row.try_get::<&str, Option<NaiveDateTime>>("ended_at")?,
            state_id: row.try_get::<&str, Option<i64>>("state_id")?,
            note: row.try_get::<&str, Option<String>>("note")?,
            created_at: row.try_get::<&str, NaiveDateTime>("created_at")?,
            updated_at: row.try_get::<&str, NaiveDateTime>("updated_at")?,
        })
    }
}

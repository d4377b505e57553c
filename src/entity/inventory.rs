//! Equipment inventory.

use super::{lookup_entity, EntityDef, FieldDef, OnDelete, ResourceModel};
use crate::db::DbError;
use chrono::NaiveDateTime;
use may_postgres::Row;
use rust_decimal::Decimal;
use serde::Serialize;

lookup_entity!(InventoryCondition, INVENTORY_CONDITIONS,
    table: "inventory_conditions", path: "inventory-conditions",
    seeds: ["new", "good", "used", "defective"]);

pub static INVENTORIES: EntityDef = EntityDef {
    table: "inventories",
    path: "inventories",
    fields: &[
        FieldDef::text("name").required(),
        FieldDef::text("serial_number").unique().max(64),
        FieldDef::integer("quantity").default_sql("1"),
        FieldDef::decimal("purchase_price"),
        FieldDef::belongs_to("condition_id", "inventory_conditions", OnDelete::SetNull),
        FieldDef::belongs_to("location_id", "locations", OnDelete::SetNull),
        FieldDef::long_text("notes"),
    ],
    composite_unique: &[],
    children: &[],
    seeds: &[],
};

#[derive(Debug, Serialize)]
pub struct Inventory {
    pub id: i64,
    pub name: String,
    pub serial_number: Option<String>,
    pub quantity: i64,
    pub purchase_price: Option<Decimal>,
    pub condition_id: Option<i64>,
    pub location_id: Option<i64>,
    pub notes: Option<String>,
    #[serde(with = "crate::resource::wire::datetime")]
    pub created_at: NaiveDateTime,
    #[serde(with = "crate::resource::wire::datetime")]
    pub updated_at: NaiveDateTime,
}

impl ResourceModel for Inventory {
    const DEF: &'static EntityDef = &INVENTORIES;

    fn from_row(row: &Row) -> Result<Self, DbError> {
        Ok(Self {
            id: row.try_get::<&str, i64>("id")?,
            name: row.try_get::<&str, String>("name")?,
            serial_number: row.try_get::<&str, Option<String>>("serial_number")?,
            quantity: row.try_get::<&str, i64>("quantity")?,
            purchase_price: row.try_get::<&str, Option<Decimal>>("purchase_price")?,
            condition_id: row.try_get::<&str, Option<i64>>("condition_id")?,
            location_id: row.try_get::<&str, Option<i64>>("location_id")?,
            notes: row.try_get::<&str, Option<String>>("notes")?,
            created_at: row.try_get::<&str, NaiveDateTime>("created_at")?,
            updated_at: row.try_get::<&str, NaiveDateTime>("updated_at")?,
        })
    }
}

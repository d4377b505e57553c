//! Customers, offers, invoicing and their lookups.

use super::{lookup_entity, ChildDef, EntityDef, FieldDef, OnDelete, ResourceModel};
use crate::db::DbError;
use chrono::{NaiveDate, NaiveDateTime};
use may_postgres::Row;
use rust_decimal::Decimal;
use serde::Serialize;

pub static COUNTRIES: EntityDef = EntityDef {
    table: "countries",
    path: "countries",
    fields: &[
        FieldDef::text("code").required().unique().max(2),
        FieldDef::text("name").required().unique(),
    ],
    composite_unique: &[],
    children: &[],
    seeds: &[
        &[("code", "DE"), ("name", "Germany")],
        &[("code", "AT"), ("name", "Austria")],
        &[("code", "CH"), ("name", "Switzerland")],
        &[("code", "FR"), ("name", "France")],
        &[("code", "NL"), ("name", "Netherlands")],
    ],
};

#[derive(Debug, Serialize)]
pub struct Country {
    pub id: i64,
    pub code: String,
    pub name: String,
    #[serde(with = "crate::resource::wire::datetime")]
    pub created_at: NaiveDateTime,
    #[serde(with = "crate::resource::wire::datetime")]
    pub updated_at: NaiveDateTime,
}

impl ResourceModel for Country {
    const DEF: &'static EntityDef = &COUNTRIES;

    fn from_row(row: &Row) -> Result<Self, DbError> {
        Ok(Self {
            id: row.try_get::<&str, i64>("id")?,
            code: row.try_get::<&str, String>("code")?,
            name: row.try_get::<&str, String>("name")?,
            created_at: row.try_get::<&str, NaiveDateTime>("created_at")?,
            updated_at: row.try_get::<&str, NaiveDateTime>("updated_at")?,
        })
    }
}

pub static PRICE_GROUPS: EntityDef = EntityDef {
    table: "price_groups",
    path: "price-groups",
    fields: &[
        FieldDef::text("name").required().unique(),
        FieldDef::decimal("hourly_rate").required(),
        FieldDef::decimal("daily_rate"),
        FieldDef::long_text("description"),
    ],
    composite_unique: &[],
    children: &[],
    seeds: &[],
};

#[derive(Debug, Serialize)]
pub struct PriceGroup {
    pub id: i64,
    pub name: String,
    pub hourly_rate: Decimal,
    pub daily_rate: Option<Decimal>,
    pub description: Option<String>,
    #[serde(with = "crate::resource::wire::datetime")]
    pub created_at: NaiveDateTime,
    #[serde(with = "crate::resource::wire::datetime")]
    pub updated_at: NaiveDateTime,
}

impl ResourceModel for PriceGroup {
    const DEF: &'static EntityDef = &PRICE_GROUPS;

    fn from_row(row: &Row) -> Result<Self, DbError> {
        Ok(Self {
            id: row.try_get::<&str, i64>("id")?,
            name: row.try_get::<&str, String>("name")?,
            hourly_rate: row.try_get::<&str, Decimal>("hourly_rate")?,
            daily_rate: row.try_get::<&str, Option<Decimal>>("daily_rate")?,
            description: row.try_get::<&str, Option<String>>("description")?,
            created_at: row.try_get::<&str, NaiveDateTime>("created_at")?,
            updated_at: row.try_get::<&str, NaiveDateTime>("updated_at")?,
        })
    }
}

pub static CUSTOMERS: EntityDef = EntityDef {
    table: "customers",
    path: "customers",
    fields: &[
        FieldDef::text("company_name").required().unique(),
        FieldDef::email("email"),
        FieldDef::text("phone").max(50),
        FieldDef::text("address"),
        FieldDef::text("zip").max(20),
        FieldDef::text("city"),
        FieldDef::belongs_to("country_id", "countries", OnDelete::SetNull),
        FieldDef::belongs_to("price_group_id", "price_groups", OnDelete::SetNull),
        FieldDef::text("vat_id").max(32),
        FieldDef::boolean("active").default_sql("TRUE"),
    ],
    composite_unique: &[],
    children: &[ChildDef {
        segment: "contact-persons",
        child_table: "contact_persons",
        fk: "customer_id",
        via: None,
    }],
    seeds: &[],
};

#[derive(Debug, Serialize)]
pub struct Customer {
    pub id: i64,
    pub company_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub zip: Option<String>,
    pub city: Option<String>,
    pub country_id: Option<i64>,
    pub price_group_id: Option<i64>,
    pub vat_id: Option<String>,
    pub active: bool,
    #[serde(with = "crate::resource::wire::datetime")]
    pub created_at: NaiveDateTime,
    #[serde(with = "crate::resource::wire::datetime")]
    pub updated_at: NaiveDateTime,
}

impl ResourceModel for Customer {
    const DEF: &'static EntityDef = &CUSTOMERS;

    fn from_row(row: &Row) -> Result<Self, DbError> {
        Ok(Self {
            id: row.try_get::<&str, i64>("id")?,
            company_name: row.try_get::<&str, String>("company_name")?,
            email: row.try_get::<&str, Option<String>>("email")?,
            phone: row.try_get::<&str, Option<String>>("phone")?,
            address: row.try_get::<&str, Option<String>>("address")?,
            zip: row.try_get::<&str, Option<String>>("zip")?,
            city: row.try_get::<&str, Option<String>>("city")?,
            country_id: row.try_get::<&str, Option<i64>>("country_id")?,
            price_group_id: row.try_get::<&str, Option<i64>>("price_group_id")?,
            vat_id: row.try_get::<&str, Option<String>>("vat_id")?,
            active: row.try_get::<&str, bool>("active")?,
            created_at: row.try_get::<&str, NaiveDateTime>("created_at")?,
            updated_at: row.try_get::<&str, NaiveDateTime>("updated_at")?,
        })
    }
}

pub static CONTACT_PERSONS: EntityDef = EntityDef {
    table: "contact_persons",
    path: "contact-persons",
    fields: &[
        FieldDef::belongs_to("customer_id", "customers", OnDelete::Cascade).required(),
        FieldDef::text("first_name").required(),
        FieldDef::text("last_name").required(),
        FieldDef::email("email"),
        FieldDef::text("phone").max(50),
        FieldDef::text("position"),
    ],
    composite_unique: &[],
    children: &[],
    seeds: &[],
};

#[derive(Debug, Serialize)]
pub struct ContactPerson {
    pub id: i64,
    pub customer_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub position: Option<String>,
    #[serde(with = "crate::resource::wire::datetime")]
    pub created_at: NaiveDateTime,
    #[serde(with = "crate::resource::wire::datetime")]
    pub updated_at: NaiveDateTime,
}

impl ResourceModel for ContactPerson {
    const DEF: &'static EntityDef = &CONTACT_PERSONS;

    fn from_row(row: &Row) -> Result<Self, DbError> {
        Ok(Self {
            id: row.try_get::<&str, i64>("id")?,
            customer_id: row.try_get::<&str, i64>("customer_id")?,
            first_name: row.try_get::<&str, String>("first_name")?,
            last_name: row.try_get::<&str, String>("last_name")?,
            email: row.try_get::<&str, Option<String>>("email")?,
            phone: row.try_get::<&str, Option<String>>("phone")?,
            position: row.try_get::<&str, Option<String>>("position")?,
            created_at: row.try_get::<&str, NaiveDateTime>("created_at")?,
            updated_at: row.try_get::<&str, NaiveDateTime>("updated_at")?,
        })
    }
}

lookup_entity!(OfferState, OFFER_STATES, table: "offer_states", path: "offer-states",
    seeds: ["draft", "sent", "accepted", "rejected", "expired"],
    children: [ChildDef {
        segment: "offers",
        child_table: "offers",
        fk: "state_id",
        via: None,
    }]);

lookup_entity!(PaymentState, PAYMENT_STATES, table: "payment_states", path: "payment-states",
    seeds: ["open", "paid", "overdue", "cancelled"]);

pub static OFFERS: EntityDef = EntityDef {
    table: "offers",
    path: "offers",
    fields: &[
        FieldDef::belongs_to("customer_id", "customers", OnDelete::Restrict).required(),
        FieldDef::belongs_to("event_id", "events", OnDelete::SetNull),
        FieldDef::text("title").required(),
        FieldDef::decimal("amount").required(),
        FieldDef::text("currency").max(3).default_sql("'EUR'"),
        FieldDef::date("valid_until"),
        FieldDef::belongs_to("state_id", "offer_states", OnDelete::SetNull).embedded(),
    ],
    composite_unique: &[],
    children: &[],
    seeds: &[],
};

#[derive(Debug, Serialize)]
pub struct Offer {
    pub id: i64,
    pub customer_id: i64,
    pub event_id: Option<i64>,
    pub title: String,
    pub amount: Decimal,
    pub currency: String,
    pub valid_until: Option<NaiveDate>,
    pub state_id: Option<i64>,
    #[serde(with = "crate::resource::wire::datetime")]
    pub created_at: NaiveDateTime,
    #[serde(with = "crate::resource::wire::datetime")]
    pub updated_at: NaiveDateTime,
}

impl ResourceModel for Offer {
    const DEF: &'static EntityDef = &OFFERS;

    fn from_row(row: &Row) -> Result<Self, DbError> {
        Ok(Self {
            id: row.try_get::<&str, i64>("id")?,
            customer_id: row.try_get::<&str, i64>("customer_id")?,
            event_id: row.try_get::<&str, Option<i64>>("event_id")?,
            title: row.try_get::<&str, String>("title")?,
            amount: row.try_get::<&str, Decimal>("amount")?,
            currency: row.try_get::<&str, String>("currency")?,
            valid_until: row.try_get::<&str, Option<NaiveDate>>("valid_until")?,
            state_id: row.try_get::<&str, Option<i64>>("state_id")?,
            created_at: row.try_get::<&str, NaiveDateTime>("created_at")?,
            updated_at: row.try_get::<&str, NaiveDateTime>("updated_at")?,
        })
    }
}

pub static INVOICES: EntityDef = EntityDef {
    table: "invoices",
    path: "invoices",
    fields: &[
        FieldDef::belongs_to("customer_id", "customers", OnDelete::Restrict).required(),
        FieldDef::belongs_to("offer_id", "offers", OnDelete::SetNull),
        FieldDef::text("number").required().unique().max(64),
        FieldDef::decimal("amount").required(),
        FieldDef::date("issued_on").required(),
        FieldDef::date("due_on"),
        FieldDef::belongs_to("payment_state_id", "payment_states", OnDelete::SetNull).embedded(),
    ],
    composite_unique: &[],
    children: &[],
    seeds: &[],
};

#[derive(Debug, Serialize)]
pub struct Invoice {
    pub id: i64,
    pub customer_id: i64,
    pub offer_id: Option<i64>,
    pub number: String,
    pub amount: Decimal,
    pub issued_on: NaiveDate,
    pub due_on: Option<NaiveDate>,
    pub payment_state_id: Option<i64>,
    #[serde(with = "crate::resource::wire::datetime")]
    pub created_at: NaiveDateTime,
    #[serde(with = "crate::resource::wire::datetime")]
    pub updated_at: NaiveDateTime,
}

impl ResourceModel for Invoice {
    const DEF: &'static EntityDef = &INVOICES;

    fn from_row(row: &Row) -> Result<Self, DbError> {
        Ok(Self {
            id: row.try_get::<&str, i64>("id")?,
            customer_id: row.try_get::<&str, i64>("customer_id")?,
            offer_id: row.try_get::<&str, Option<i64>>("offer_id")?,
            number: row.try_get::<&str, String>("number")?,
            amount: row.try_get::<&str, Decimal>("amount")?,
            issued_on: row.try_get::<&str, NaiveDate>("issued_on")?,
            due_on: row.try_get::<&str, Option<NaiveDate>>("due_on")?,
            payment_state_id: row.try_get::<&str, Option<i64>>("payment_state_id")?,
            created_at: row.try_get::<&str, NaiveDateTime>("created_at")?,
            updated_at: row.try_get::<&str, NaiveDateTime>("updated_at")?,
        })
    }
}

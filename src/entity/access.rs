//! Access control: users, groups and permission assignments.

use super::{lookup_entity, ChildDef, EntityDef, FieldDef, OnDelete, ResourceModel, Via};
use crate::db::DbError;
use chrono::NaiveDateTime;
use may_postgres::Row;
use serde::Serialize;

lookup_entity!(Permission, PERMISSIONS, table: "permissions", path: "permissions",
    seeds: ["read", "write", "delete", "admin"]);

pub static USERS: EntityDef = EntityDef {
    table: "users",
    path: "users",
    fields: &[
        FieldDef::text("name").required(),
        FieldDef::email("email").required().unique(),
        FieldDef::password("password").required(),
        FieldDef::boolean("active").default_sql("TRUE"),
    ],
    composite_unique: &[],
    children: &[],
    seeds: &[],
};

/// The password digest is deliberately absent: it is never decoded and never
/// serialized.
#[derive(Debug, Serialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub active: bool,
    #[serde(with = "crate::resource::wire::datetime")]
    pub created_at: NaiveDateTime,
    #[serde(with = "crate::resource::wire::datetime")]
    pub updated_at: NaiveDateTime,
}

impl ResourceModel for User {
    const DEF: &'static EntityDef = &USERS;

    fn from_row(row: &Row) -> Result<Self, DbError> {
        Ok(Self {
            id: row.try_get::<&str, i64>("id")?,
            name: row.try_get::<&str, String>("name")?,
            email: row.try_get::<&str, String>("email")?,
            active: row.try_get::<&str, bool>("active")?,
            created_at: row.try_get::<&str, NaiveDateTime>("created_at")?,
            updated_at: row.try_get::<&str, NaiveDateTime>("updated_at")?,
        })
    }
}

pub static GROUPS: EntityDef = EntityDef {
    table: "groups",
    path: "groups",
    fields: &[
        FieldDef::text("name").required().unique(),
        FieldDef::long_text("description"),
    ],
    composite_unique: &[],
    children: &[ChildDef {
        segment: "users",
        child_table: "users",
        fk: "group_id",
        via: Some(Via {
            table: "group_users",
            parent_fk: "group_id",
            child_fk: "user_id",
        }),
    }],
    seeds: &[],
};

#[derive(Debug, Serialize)]
pub struct Group {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    #[serde(with = "crate::resource::wire::datetime")]
    pub created_at: NaiveDateTime,
    #[serde(with = "crate::resource::wire::datetime")]
    pub updated_at: NaiveDateTime,
}

impl ResourceModel for Group {
    const DEF: &'static EntityDef = &GROUPS;

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

pub static GROUP_USERS: EntityDef = EntityDef {
    table: "group_users",
    path: "group-users",
    fields: &[
        FieldDef::belongs_to("group_id", "groups", OnDelete::Cascade).required(),
        FieldDef::belongs_to("user_id", "users", OnDelete::Cascade).required(),
    ],
    composite_unique: &["group_id", "user_id"],
    children: &[],
    seeds: &[],
};

#[derive(Debug, Serialize)]
pub struct GroupUser {
    pub id: i64,
    pub group_id: i64,
    pub user_id: i64,
    #[serde(with = "crate::resource::wire::datetime")]
    pub created_at: NaiveDateTime,
    #[serde(with = "crate::resource::wire::datetime")]
    pub updated_at: NaiveDateTime,
}

impl ResourceModel for GroupUser {
    const DEF: &'static EntityDef = &GROUP_USERS;

    fn from_row(row: &Row) -> Result<Self, DbError> {
        Ok(Self {
            id: row.try_get::<&str, i64>("id")?,
            group_id: row.try_get::<&str, i64>("group_id")?,
            user_id: row.try_get::<&str, i64>("user_id")?,
            created_at: row.try_get::<&str, NaiveDateTime>("created_at")?,
            updated_at: row.try_get::<&str, NaiveDateTime>("updated_at")?,
        })
    }
}

pub static GROUP_PERMISSIONS: EntityDef = EntityDef {
    table: "group_permissions",
    path: "group-permissions",
    fields: &[
        FieldDef::belongs_to("group_id", "groups", OnDelete::Cascade).required(),
        FieldDef::belongs_to("permission_id", "permissions", OnDelete::Cascade).required(),
    ],
    composite_unique: &["group_id", "permission_id"],
    children: &[],
    seeds: &[],
};

#[derive(Debug, Serialize)]
pub struct GroupPermission {
    pub id: i64,
    pub group_id: i64,
    pub permission_id: i64,
    #[serde(with = "crate::resource::wire::datetime")]
    pub created_at: NaiveDateTime,
    #[serde(with = "crate::resource::wire::datetime")]
    pub updated_at: NaiveDateTime,
}

impl ResourceModel for GroupPermission {
    const DEF: &'static EntityDef = &GROUP_PERMISSIONS;

    fn from_row(row: &Row) -> Result<Self, DbError> {
        Ok(Self {
            id: row.try_get::<&str, i64>("id")?,
            group_id: row.try_get::<&str, i64>("group_id")?,
            permission_id: row.try_get::<&str, i64>("permission_id")?,
            created_at: row.try_get::<&str, NaiveDateTime>("created_at")?,
            updated_at: row.try_get::<&str, NaiveDateTime>("updated_at")?,
        })
    }
}

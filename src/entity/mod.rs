//! Entity metadata and typed models.
//!
//! Every resource is described twice, on purpose:
//!
//! * an [`EntityDef`]: declarative metadata (table, URL segment, fields,
//!   referential policies, nested routes, seed rows) that drives schema
//!   generation, validation and the generic CRUD controller;
//! * a typed model struct implementing [`ResourceModel`]: the row shape
//!   with named, typed fields, decoded explicitly from a database row and
//!   serialized with the wire formats from [`crate::resource`].
//!
//! The metadata is `static` and assembled with `const` builder methods so an
//! entity module reads as a table of facts.

use crate::db::DbError;
use may_postgres::Row;
use once_cell::sync::Lazy;

pub mod access;
pub mod events;
pub mod inventory;
pub mod personnel;
pub mod promoters;
pub mod sales;
pub mod time;

/// Column kind: drives validation, DDL and row decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Email,
    Integer,
    Boolean,
    Date,
    DateTime,
    Decimal,
}

/// Action taken on rows referencing a deleted parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnDelete {
    Cascade,
    SetNull,
    Restrict,
}

impl OnDelete {
    pub fn sql(self) -> &'static str {
        match self {
            OnDelete::Cascade => "CASCADE",
            OnDelete::SetNull => "SET NULL",
            OnDelete::Restrict => "RESTRICT",
        }
    }
}

/// Foreign key declaration.
#[derive(Debug, Clone, Copy)]
pub struct Reference {
    pub table: &'static str,
    pub on_delete: OnDelete,
}

/// One column of an entity, beyond `id`/`created_at`/`updated_at`.
#[derive(Debug, Clone, Copy)]
pub struct FieldDef {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub unique: bool,
    pub max_len: Option<u32>,
    /// SQL default fragment, e.g. `TRUE` or `'EUR'`.
    pub sql_default: Option<&'static str>,
    pub references: Option<Reference>,
    /// Serialize as the referenced row (key without the `_id` suffix).
    pub embed: bool,
    /// Accepted on writes, never serialized (password digests).
    pub write_only: bool,
    /// Value is digested with SHA-256 before binding.
    pub hashed: bool,
}

impl FieldDef {
    const fn new(name: &'static str, kind: FieldKind) -> Self {
        FieldDef {
            name,
            kind,
            required: false,
            unique: false,
            max_len: None,
            sql_default: None,
            references: None,
            embed: false,
            write_only: false,
            hashed: false,
        }
    }

    pub const fn text(name: &'static str) -> Self {
        let mut f = Self::new(name, FieldKind::Text);
        f.max_len = Some(255);
        f
    }

    /// Unbounded text column (notes, descriptions).
    pub const fn long_text(name: &'static str) -> Self {
        Self::new(name, FieldKind::Text)
    }

    pub const fn email(name: &'static str) -> Self {
        let mut f = Self::new(name, FieldKind::Email);
        f.max_len = Some(255);
        f
    }

    pub const fn integer(name: &'static str) -> Self {
        Self::new(name, FieldKind::Integer)
    }

    pub const fn boolean(name: &'static str) -> Self {
        Self::new(name, FieldKind::Boolean)
    }

    pub const fn date(name: &'static str) -> Self {
        Self::new(name, FieldKind::Date)
    }

    pub const fn datetime(name: &'static str) -> Self {
        Self::new(name, FieldKind::DateTime)
    }

    pub const fn decimal(name: &'static str) -> Self {
        Self::new(name, FieldKind::Decimal)
    }

    /// Write-only credential column, stored as a SHA-256 digest.
    pub const fn password(name: &'static str) -> Self {
        let mut f = Self::new(name, FieldKind::Text);
        f.max_len = Some(255);
        f.write_only = true;
        f.hashed = true;
        f
    }

    /// Integer FK column.
    pub const fn belongs_to(name: &'static str, table: &'static str, on_delete: OnDelete) -> Self {
        let mut f = Self::new(name, FieldKind::Integer);
        f.references = Some(Reference { table, on_delete });
        f
    }

    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub const fn max(mut self, n: u32) -> Self {
        self.max_len = Some(n);
        self
    }

    pub const fn default_sql(mut self, fragment: &'static str) -> Self {
        self.sql_default = Some(fragment);
        self
    }

    pub const fn embedded(mut self) -> Self {
        self.embed = true;
        self
    }

    pub const fn write_only(mut self) -> Self {
        self.write_only = true;
        self
    }
}

/// Indirect membership: list `child` rows joined through `table`.
#[derive(Debug, Clone, Copy)]
pub struct Via {
    pub table: &'static str,
    pub parent_fk: &'static str,
    pub child_fk: &'static str,
}

/// Nested collection route `/{parent}/{id}/{segment}`.
#[derive(Debug, Clone, Copy)]
pub struct ChildDef {
    pub segment: &'static str,
    /// Table of the resource being listed.
    pub child_table: &'static str,
    /// FK column filtering the child table (ignored when `via` is set).
    pub fk: &'static str,
    pub via: Option<Via>,
}

/// Seed row: column/value pairs, text columns only.
pub type SeedRow = &'static [(&'static str, &'static str)];

/// Declarative description of one resource.
#[derive(Debug)]
pub struct EntityDef {
    pub table: &'static str,
    /// URL segment under `/api/`, e.g. `promoter-groups`.
    pub path: &'static str,
    pub fields: &'static [FieldDef],
    /// Column pair with a combined unique constraint (join tables).
    pub composite_unique: &'static [&'static str],
    pub children: &'static [ChildDef],
    pub seeds: &'static [SeedRow],
}

impl EntityDef {
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Fields holding FK values that serialize as embedded objects.
    pub fn embedded_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter().filter(|f| f.embed)
    }
}

/// A typed row model backed by an [`EntityDef`].
pub trait ResourceModel: serde::Serialize + Sized {
    const DEF: &'static EntityDef;

    /// Decode a database row.
    ///
    /// # Errors
    ///
    /// Returns `DbError` when a column is missing or has an unexpected type.
    fn from_row(row: &Row) -> Result<Self, DbError>;
}

/// Lookup entity: a seeded `{name}` table with the standard columns.
macro_rules! lookup_entity {
    ($model:ident, $def:ident, table: $table:literal, path: $path:literal,
     seeds: [$($seed:literal),* $(,)?] $(, children: [$($child:expr),* $(,)?])?) => {
        pub static $def: $crate::entity::EntityDef = $crate::entity::EntityDef {
            table: $table,
            path: $path,
            fields: &[$crate::entity::FieldDef::text("name").required().unique()],
            composite_unique: &[],
            children: &[$($($child),*)?],
            seeds: &[$(&[("name", $seed)]),*],
        };

        #[derive(Debug, serde::Serialize)]
        pub struct $model {
            pub id: i64,
            pub name: String,
            #[serde(with = "crate::resource::wire::datetime")]
            pub created_at: chrono::NaiveDateTime,
            #[serde(with = "crate::resource::wire::datetime")]
            pub updated_at: chrono::NaiveDateTime,
        }

        impl $crate::entity::ResourceModel for $model {
            const DEF: &'static $crate::entity::EntityDef = &$def;

            fn from_row(row: &may_postgres::Row) -> Result<Self, $crate::db::DbError> {
                Ok(Self {
                    id: row.try_get::<&str, i64>("id")?,
                    name: row.try_get::<&str, String>("name")?,
                    created_at: row.try_get::<&str, chrono::NaiveDateTime>("created_at")?,
                    updated_at: row.try_get::<&str, chrono::NaiveDateTime>("updated_at")?,
                })
            }
        }
    };
}
pub(crate) use lookup_entity;

/// Every entity definition, in route-listing order.
pub fn registry() -> &'static [&'static EntityDef] {
    static REGISTRY: Lazy<Vec<&'static EntityDef>> = Lazy::new(|| {
        vec![
            // personnel
            &personnel::GENDERS,
            &personnel::DEPARTMENTS,
            &personnel::OCCUPATIONS,
            &personnel::SKILLS,
            &personnel::SERVICE_AREAS,
            &personnel::EMPLOYEES,
            // promoters
            &promoters::PROMOTER_GROUPS,
            &promoters::PROMOTERS,
            // events
            &events::EVENT_STATES,
            &events::LOCATIONS,
            &events::EVENTS,
            &events::COMMITMENT_STATES,
            &events::COMMITMENTS,
            // sales
            &sales::COUNTRIES,
            &sales::PRICE_GROUPS,
            &sales::CUSTOMERS,
            &sales::CONTACT_PERSONS,
            &sales::OFFER_STATES,
            &sales::OFFERS,
            &sales::PAYMENT_STATES,
            &sales::INVOICES,
            // inventory
            &inventory::INVENTORY_CONDITIONS,
            &inventory::INVENTORIES,
            // access control
            &access::PERMISSIONS,
            &access::USERS,
            &access::GROUPS,
            &access::GROUP_USERS,
            &access::GROUP_PERMISSIONS,
            // time tracking
            &time::TIME_TRACKING_STATES,
            &time::TIME_TRACKING_CHANNELS,
            &time::TIME_TRACKINGS,
        ]
    });
    &REGISTRY
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn registry_has_all_resources() {
        assert_eq!(registry().len(), 31);
    }

    #[test]
    fn tables_and_paths_are_unique() {
        let defs = registry();
        let tables: HashSet<_> = defs.iter().map(|d| d.table).collect();
        let paths: HashSet<_> = defs.iter().map(|d| d.path).collect();
        assert_eq!(tables.len(), defs.len());
        assert_eq!(paths.len(), defs.len());
    }

    #[test]
    fn every_reference_target_is_registered() {
        let tables: HashSet<_> = registry().iter().map(|d| d.table).collect();
        for def in registry() {
            for field in def.fields {
                if let Some(r) = &field.references {
                    assert!(
                        tables.contains(r.table),
                        "{}.{} references unknown table {}",
                        def.table,
                        field.name,
                        r.table
                    );
                }
            }
        }
    }

    #[test]
    fn embeds_are_only_on_fk_fields() {
        for def in registry() {
            for field in def.embedded_fields() {
                assert!(
                    field.references.is_some(),
                    "{}.{} is marked embed without a reference",
                    def.table,
                    field.name
                );
                assert!(field.name.ends_with("_id"));
            }
        }
    }

    #[test]
    fn child_routes_point_at_registered_tables() {
        let tables: HashSet<_> = registry().iter().map(|d| d.table).collect();
        for def in registry() {
            for child in def.children {
                assert!(tables.contains(child.child_table));
                if let Some(via) = &child.via {
                    assert!(tables.contains(via.table));
                }
            }
        }
    }

    #[test]
    fn composite_uniques_name_existing_columns() {
        for def in registry() {
            for col in def.composite_unique {
                assert!(def.field(col).is_some(), "{}.{col} missing", def.table);
            }
        }
    }
}

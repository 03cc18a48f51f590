//! Entity Catalog
//!
//! A dynamic-schema record store: users define entity types (a name plus a
//! list of attribute names) and then create, list, edit, and delete entities
//! carrying an arbitrary string-keyed payload tagged with one of those types.
//!
//! ## Features
//!
//! - **Schema Registry**: Upsert and list named entity types
//! - **Entity Store**: CRUD over free-form records with merge updates
//! - **Single Storage Handle**: One SQLite connection injected into both components
//! - **CSV Export**: Timestamped dumps of types and entities
//!
//! ## Architecture
//!
//! ```text
//! catalog.db
//! ├── entity_types       name (unique) -> attributes (JSON array)
//! └── dynamic_entities   id -> type, data (JSON object), created_at
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use entity_catalog::{entity_data, Database, EntityStore, SchemaRegistry};
//!
//! # fn main() -> entity_catalog::Result<()> {
//! let db = Database::open("catalog.db")?;
//! let registry = SchemaRegistry::new(db.clone());
//! let store = EntityStore::new(db);
//!
//! registry.register_type("Contact", ["name", "email"])?;
//! let id = store.create_entity("Contact", &entity_data([("name", "Ada")]))?;
//! store.update_entity(id, &entity_data([("phone", "555")]))?;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod registry;
pub mod schema;
pub mod store;

pub use auth::{Credentials, Role, Session};
pub use config::CatalogConfig;
pub use db::Database;
pub use error::{CatalogError, Result};
pub use export::Exporter;
pub use registry::{SchemaRegistry, TypeMatch};
pub use schema::{entity_data, Entity, EntityData, EntityId, EntityType};
pub use store::EntityStore;

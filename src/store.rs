//! Entity Store
//!
//! Stores entity records against the types held by the
//! [`SchemaRegistry`](crate::SchemaRegistry). Type existence is checked on
//! create only; payloads are never validated against declared attributes.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, info, warn};

use crate::db::Database;
use crate::error::{CatalogError, Result};
use crate::registry::lookup_type;
use crate::schema::{Entity, EntityData, EntityId};

/// Raw row as stored: payload still JSON-encoded
struct EntityRow {
    id: EntityId,
    type_name: String,
    data: String,
    created_at: DateTime<Utc>,
}

impl EntityRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            type_name: row.get(1)?,
            data: row.get(2)?,
            created_at: row.get(3)?,
        })
    }

    fn decode(self) -> Result<Entity> {
        Ok(Entity {
            id: self.id,
            type_name: self.type_name,
            data: serde_json::from_str(&self.data)?,
            created_at: self.created_at,
        })
    }
}

/// Store of entity records
#[derive(Debug, Clone)]
pub struct EntityStore {
    db: Database,
}

impl EntityStore {
    /// Create a store over an injected storage handle
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Create an entity of a registered type and return its id.
    ///
    /// Fails with [`CatalogError::TypeNotFound`] if the type is unknown; in that
    /// case nothing is written and no id is consumed.
    pub fn create_entity(&self, type_name: &str, data: &EntityData) -> Result<EntityId> {
        let encoded = serde_json::to_string(data)?;
        let created_at = Utc::now();

        let id = self.db.transaction(|tx| {
            if lookup_type(tx, type_name)?.is_none() {
                return Err(CatalogError::TypeNotFound {
                    name: type_name.to_string(),
                });
            }

            tx.execute(
                "INSERT INTO dynamic_entities (type, data, created_at) VALUES (?1, ?2, ?3)",
                params![type_name, encoded, created_at],
            )?;
            Ok(tx.last_insert_rowid())
        })?;

        info!(id, type_name, keys = data.len(), "created entity");
        Ok(id)
    }

    /// List entities by id ascending, optionally only those of one type
    /// (exact, case-sensitive match). An empty type name lists everything.
    pub fn list_entities(&self, type_name: Option<&str>) -> Result<Vec<Entity>> {
        let type_name = type_name.filter(|name| !name.is_empty());
        let rows = self.db.read(|conn| {
            let rows = match type_name {
                Some(name) => {
                    let mut stmt = conn.prepare(
                        "SELECT id, type, data, created_at FROM dynamic_entities
                         WHERE type = ?1 ORDER BY id",
                    )?;
                    let rows = stmt
                        .query_map(params![name], EntityRow::from_row)?
                        .collect::<rusqlite::Result<Vec<_>>>()?;
                    rows
                }
                None => {
                    let mut stmt = conn.prepare(
                        "SELECT id, type, data, created_at FROM dynamic_entities ORDER BY id",
                    )?;
                    let rows = stmt
                        .query_map([], EntityRow::from_row)?
                        .collect::<rusqlite::Result<Vec<_>>>()?;
                    rows
                }
            };
            Ok(rows)
        })?;

        let entities = rows
            .into_iter()
            .map(EntityRow::decode)
            .collect::<Result<Vec<_>>>()?;
        debug!(count = entities.len(), type_name, "listed entities");
        Ok(entities)
    }

    /// Fetch one entity, `None` if no entity has that id
    pub fn get_entity(&self, id: EntityId) -> Result<Option<Entity>> {
        self.db.read(|conn| fetch_entity(conn, id))
    }

    /// Merge `data` into an entity's payload.
    ///
    /// New keys are added and existing keys overwritten; no key is ever
    /// removed. Type and creation time are untouched.
    pub fn update_entity(&self, id: EntityId, data: &EntityData) -> Result<()> {
        self.db.transaction(|tx| {
            let mut entity =
                fetch_entity(tx, id)?.ok_or(CatalogError::EntityNotFound { id })?;

            entity
                .data
                .extend(data.iter().map(|(k, v)| (k.clone(), v.clone())));
            let encoded = serde_json::to_string(&entity.data)?;

            tx.execute(
                "UPDATE dynamic_entities SET data = ?1 WHERE id = ?2",
                params![encoded, id],
            )?;
            Ok(())
        })?;

        info!(id, keys = data.len(), "updated entity");
        Ok(())
    }

    /// Delete an entity. Deleting an unknown id succeeds and changes nothing.
    ///
    /// Returns whether a row was actually removed.
    pub fn delete_entity(&self, id: EntityId) -> Result<bool> {
        let removed = self.db.transaction(|tx| {
            Ok(tx.execute("DELETE FROM dynamic_entities WHERE id = ?1", params![id])?)
        })?;

        if removed == 0 {
            warn!(id, "delete of missing entity ignored");
        } else {
            info!(id, "deleted entity");
        }
        Ok(removed > 0)
    }

    /// Count entities, optionally only those of one type
    pub fn count_entities(&self, type_name: Option<&str>) -> Result<u64> {
        let type_name = type_name.filter(|name| !name.is_empty());
        self.db.read(|conn| {
            let count: i64 = match type_name {
                Some(name) => conn.query_row(
                    "SELECT COUNT(*) FROM dynamic_entities WHERE type = ?1",
                    params![name],
                    |row| row.get(0),
                )?,
                None => conn.query_row("SELECT COUNT(*) FROM dynamic_entities", [], |row| {
                    row.get(0)
                })?,
            };
            Ok(count.max(0) as u64)
        })
    }
}

fn fetch_entity(conn: &Connection, id: EntityId) -> Result<Option<Entity>> {
    conn.query_row(
        "SELECT id, type, data, created_at FROM dynamic_entities WHERE id = ?1",
        params![id],
        EntityRow::from_row,
    )
    .optional()?
    .map(EntityRow::decode)
    .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::SchemaRegistry;
    use crate::schema::entity_data;

    fn setup() -> (SchemaRegistry, EntityStore) {
        let db = Database::in_memory().unwrap();
        let registry = SchemaRegistry::new(db.clone());
        registry.register_type("Contact", ["name", "email"]).unwrap();
        (registry, EntityStore::new(db))
    }

    #[test]
    fn test_create_and_get() {
        let (_, store) = setup();
        let data = entity_data([("name", "Ada"), ("email", "ada@x.com")]);
        let id = store.create_entity("Contact", &data).unwrap();
        assert_eq!(id, 1);

        let entity = store.get_entity(id).unwrap().unwrap();
        assert_eq!(entity.type_name, "Contact");
        assert_eq!(entity.data, data);
    }

    #[test]
    fn test_create_unknown_type_consumes_no_id() {
        let (_, store) = setup();
        let err = store
            .create_entity("Ghost", &entity_data([("name", "Boo")]))
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(store.count_entities(None).unwrap(), 0);

        let id = store.create_entity("Contact", &EntityData::new()).unwrap();
        assert_eq!(id, 1);
    }

    #[test]
    fn test_ids_strictly_increase_across_deletes() {
        let (_, store) = setup();
        let first = store.create_entity("Contact", &EntityData::new()).unwrap();
        let second = store.create_entity("Contact", &EntityData::new()).unwrap();
        assert!(second > first);

        store.delete_entity(second).unwrap();
        let third = store.create_entity("Contact", &EntityData::new()).unwrap();
        assert!(third > second);
    }

    #[test]
    fn test_undeclared_keys_are_accepted() {
        let (_, store) = setup();
        let id = store
            .create_entity("Contact", &entity_data([("favourite_colour", "teal")]))
            .unwrap();
        let entity = store.get_entity(id).unwrap().unwrap();
        assert_eq!(entity.get("favourite_colour"), Some("teal"));
    }

    #[test]
    fn test_update_merges() {
        let (_, store) = setup();
        let id = store
            .create_entity("Contact", &entity_data([("a", "1"), ("b", "2")]))
            .unwrap();
        let before = store.get_entity(id).unwrap().unwrap();

        store
            .update_entity(id, &entity_data([("b", "3"), ("c", "4")]))
            .unwrap();

        let after = store.get_entity(id).unwrap().unwrap();
        assert_eq!(after.data, entity_data([("a", "1"), ("b", "3"), ("c", "4")]));
        assert_eq!(after.created_at, before.created_at);
        assert_eq!(after.type_name, before.type_name);
    }

    #[test]
    fn test_update_missing_entity() {
        let (_, store) = setup();
        let err = store
            .update_entity(99, &entity_data([("a", "1")]))
            .unwrap_err();
        assert!(matches!(err, CatalogError::EntityNotFound { id: 99 }));
    }

    #[test]
    fn test_delete_missing_is_noop() {
        let (_, store) = setup();
        let id = store.create_entity("Contact", &EntityData::new()).unwrap();

        assert!(!store.delete_entity(id + 100).unwrap());
        assert_eq!(store.count_entities(None).unwrap(), 1);

        assert!(store.delete_entity(id).unwrap());
        assert!(store.get_entity(id).unwrap().is_none());
    }

    #[test]
    fn test_list_filters_by_type() {
        let (registry, store) = setup();
        registry.register_type("Company", ["name"]).unwrap();

        let ada = entity_data([("name", "Ada")]);
        let acme = entity_data([("name", "Acme")]);
        store.create_entity("Contact", &ada).unwrap();
        store.create_entity("Company", &acme).unwrap();
        store.create_entity("Contact", &EntityData::new()).unwrap();

        let all = store.list_entities(None).unwrap();
        assert_eq!(all.iter().map(|e| e.id).collect::<Vec<_>>(), vec![1, 2, 3]);

        let contacts = store.list_entities(Some("Contact")).unwrap();
        assert_eq!(contacts.len(), 2);
        assert!(contacts.iter().all(|e| e.type_name == "Contact"));
        assert_eq!(contacts[0].data, ada);

        assert!(store.list_entities(Some("contact")).unwrap().is_empty());
        assert_eq!(store.count_entities(Some("Company")).unwrap(), 1);
    }

    #[test]
    fn test_empty_type_filter_lists_all() {
        let (registry, store) = setup();
        registry.register_type("Company", ["name"]).unwrap();
        store.create_entity("Contact", &EntityData::new()).unwrap();
        store.create_entity("Company", &EntityData::new()).unwrap();

        let all = store.list_entities(Some("")).unwrap();
        assert_eq!(all, store.list_entities(None).unwrap());
        assert_eq!(all.len(), 2);
        assert_eq!(store.count_entities(Some("")).unwrap(), 2);
    }

    #[test]
    fn test_undecodable_payload_is_an_error() {
        let db = Database::in_memory().unwrap();
        SchemaRegistry::new(db.clone())
            .register_type("Contact", ["name"])
            .unwrap();
        let store = EntityStore::new(db.clone());
        let id = store
            .create_entity("Contact", &entity_data([("name", "Ada")]))
            .unwrap();
        store.create_entity("Contact", &EntityData::new()).unwrap();

        db.transaction(|tx| {
            tx.execute(
                "UPDATE dynamic_entities SET data = ?1 WHERE id = ?2",
                params![r#"{"b":1}"#, id],
            )?;
            Ok(())
        })
        .unwrap();

        assert!(matches!(
            store.list_entities(None),
            Err(CatalogError::Serialization(_))
        ));
        assert!(matches!(
            store.get_entity(id),
            Err(CatalogError::Serialization(_))
        ));
        assert!(matches!(
            store.update_entity(id, &entity_data([("c", "2")])),
            Err(CatalogError::Serialization(_))
        ));
    }

    #[test]
    fn test_retyping_does_not_cascade() {
        let (registry, store) = setup();
        let id = store
            .create_entity("Contact", &entity_data([("name", "Ada")]))
            .unwrap();

        registry.register_type("Contact", ["phone"]).unwrap();
        let entity = store.get_entity(id).unwrap().unwrap();
        assert_eq!(entity.get("name"), Some("Ada"));
    }
}

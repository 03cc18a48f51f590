//! Schema Registry
//!
//! Stores named entity-type definitions. Registering a name that already
//! exists replaces its attribute list.

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use tracing::{debug, info};

use crate::db::Database;
use crate::error::{CatalogError, Result};
use crate::schema::EntityType;

/// A fuzzy search hit on a type name
#[derive(Debug, Clone, Serialize)]
pub struct TypeMatch {
    pub name: String,
    pub score: i64,
}

/// Registry of entity types
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    db: Database,
}

impl SchemaRegistry {
    /// Create a registry over an injected storage handle
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Register a type, replacing the attributes of any type with the same name.
    ///
    /// The attribute list is stored exactly as given, order included.
    pub fn register_type<I, S>(&self, name: &str, attributes: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if name.trim().is_empty() {
            return Err(CatalogError::Validation(
                "entity type name must not be empty".to_string(),
            ));
        }

        let attributes: Vec<String> = attributes.into_iter().map(Into::into).collect();
        let encoded = serde_json::to_string(&attributes)?;

        self.db.transaction(|tx| {
            tx.execute(
                "INSERT INTO entity_types (name, attributes) VALUES (?1, ?2)
                 ON CONFLICT(name) DO UPDATE SET attributes = excluded.attributes",
                params![name, encoded],
            )?;
            Ok(())
        })?;

        info!(name, attributes = attributes.len(), "registered entity type");
        Ok(())
    }

    /// All registered types, sorted by name
    pub fn list_types(&self) -> Result<Vec<EntityType>> {
        let rows = self.db.read(|conn| {
            let mut stmt = conn.prepare("SELECT name, attributes FROM entity_types ORDER BY name")?;
            let rows = stmt
                .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })?;

        let types = rows
            .into_iter()
            .map(|(name, attributes)| decode_type(name, &attributes))
            .collect::<Result<Vec<_>>>()?;
        debug!(count = types.len(), "listed entity types");
        Ok(types)
    }

    /// Look up a single type by exact name
    pub fn get_type(&self, name: &str) -> Result<Option<EntityType>> {
        self.db.read(|conn| lookup_type(conn, name))
    }

    /// Search type names by fuzzy match, best matches first
    pub fn search_types(&self, query: &str, limit: usize) -> Result<Vec<TypeMatch>> {
        let matcher = SkimMatcherV2::default();
        let mut results: Vec<TypeMatch> = self
            .list_types()?
            .into_iter()
            .filter_map(|t| {
                matcher
                    .fuzzy_match(&t.name, query)
                    .map(|score| TypeMatch { name: t.name, score })
            })
            .collect();

        // Sort by score descending, then name for stable ties
        results.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.name.cmp(&b.name)));
        results.truncate(limit);
        Ok(results)
    }
}

/// Fetch a type within an existing connection or transaction
pub(crate) fn lookup_type(conn: &Connection, name: &str) -> Result<Option<EntityType>> {
    let row = conn
        .query_row(
            "SELECT name, attributes FROM entity_types WHERE name = ?1",
            params![name],
            |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
        )
        .optional()?;

    row.map(|(name, attributes)| decode_type(name, &attributes))
        .transpose()
}

fn decode_type(name: String, attributes: &str) -> Result<EntityType> {
    Ok(EntityType {
        name,
        attributes: serde_json::from_str(attributes)?,
    })
}

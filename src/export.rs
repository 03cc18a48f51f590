//! CSV export of entity types and entities
//!
//! Each export writes a new file named after the export kind and the local
//! time of the export, e.g. `entities_20261019_142501.csv`. A second export
//! within the same second gets a numeric suffix (`entities_20261019_142501_1.csv`)
//! instead of replacing the first file.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::info;

use crate::error::Result;
use crate::schema::{Entity, EntityType};

/// Writes CSV exports into a directory
#[derive(Debug, Clone)]
pub struct Exporter {
    dir: PathBuf,
}

impl Exporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write one `Name,Attributes` row per type; attributes are joined with `", "`
    pub fn export_entity_types(&self, types: &[EntityType]) -> Result<PathBuf> {
        let mut output = csv_line(["Name", "Attributes"]);
        for entity_type in types {
            let attributes = entity_type.attributes.join(", ");
            output.push_str(&csv_line([entity_type.name.as_str(), attributes.as_str()]));
        }

        let path = self.write("entity_types", &output)?;
        info!(path = %path.display(), rows = types.len(), "exported entity types");
        Ok(path)
    }

    /// Write entities with columns `ID,Type` plus the first entity's payload keys.
    ///
    /// Keys that the first entity lacks are not exported. An empty slice
    /// produces an empty file.
    pub fn export_entities(&self, entities: &[Entity]) -> Result<PathBuf> {
        let output = entities_csv(entities);
        let path = self.write("entities", &output)?;
        info!(path = %path.display(), rows = entities.len(), "exported entities");
        Ok(path)
    }

    fn write(&self, prefix: &str, content: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let stem = format!("{}_{}", prefix, Local::now().format("%Y%m%d_%H%M%S"));

        let mut attempt = 0u32;
        loop {
            let file_name = match attempt {
                0 => format!("{}.csv", stem),
                n => format!("{}_{}.csv", stem, n),
            };
            let path = self.dir.join(file_name);

            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    file.write_all(content.as_bytes())?;
                    return Ok(path);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => attempt += 1,
                Err(e) => return Err(e.into()),
            }
        }
    }
}

fn entities_csv(entities: &[Entity]) -> String {
    let Some(first) = entities.first() else {
        return String::new();
    };

    let keys: Vec<&str> = first.data.keys().map(String::as_str).collect();
    let mut output = csv_line(["ID", "Type"].into_iter().chain(keys.iter().copied()));

    for entity in entities {
        let id = entity.id.to_string();
        let row = [id.as_str(), entity.type_name.as_str()]
            .into_iter()
            .chain(keys.iter().map(|k| entity.get(k).unwrap_or("")));
        output.push_str(&csv_line(row));
    }
    output
}

fn csv_line<'a>(fields: impl IntoIterator<Item = &'a str>) -> String {
    let mut line = fields
        .into_iter()
        .map(escape_field)
        .collect::<Vec<_>>()
        .join(",");
    line.push_str("\r\n");
    line
}

/// Quote a field if it contains a separator, quote, or line break
fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::entity_data;
    use chrono::Utc;
    use tempfile::tempdir;

    fn entity(id: i64, type_name: &str, pairs: &[(&str, &str)]) -> Entity {
        Entity {
            id,
            type_name: type_name.to_string(),
            data: entity_data(pairs.iter().copied()),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_escape_field() {
        assert_eq!(escape_field("plain"), "plain");
        assert_eq!(escape_field("hello, world"), "\"hello, world\"");
        assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape_field("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn test_export_entity_types() {
        let dir = tempdir().unwrap();
        let exporter = Exporter::new(dir.path().join("exports"));
        let types = vec![
            EntityType::new("Company", ["name"]),
            EntityType::new("Contact", ["name", "email"]),
        ];

        let path = exporter.export_entity_types(&types).unwrap();
        let file_name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(file_name.starts_with("entity_types_"));
        assert!(file_name.ends_with(".csv"));

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "Name,Attributes\r\nCompany,name\r\nContact,\"name, email\"\r\n"
        );
    }

    #[test]
    fn test_entities_headers_follow_first_entity() {
        let entities = vec![
            entity(1, "Contact", &[("email", "ada@x.com"), ("name", "Ada")]),
            entity(2, "Contact", &[("name", "Grace"), ("phone", "555")]),
        ];

        let csv = entities_csv(&entities);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "ID,Type,email,name");
        assert_eq!(lines[1], "1,Contact,ada@x.com,Ada");
        assert_eq!(lines[2], "2,Contact,,Grace");
    }

    #[test]
    fn test_repeated_exports_keep_every_file() {
        let dir = tempdir().unwrap();
        let exporter = Exporter::new(dir.path());
        let types = vec![EntityType::new("Contact", ["name"])];

        let paths: Vec<PathBuf> = (0..3)
            .map(|_| exporter.export_entity_types(&types).unwrap())
            .collect();

        assert_ne!(paths[0], paths[1]);
        assert_ne!(paths[1], paths[2]);
        assert_ne!(paths[0], paths[2]);
        for path in &paths {
            assert!(path.starts_with(exporter.dir()));
            assert_eq!(
                fs::read_to_string(path).unwrap(),
                "Name,Attributes\r\nContact,name\r\n"
            );
        }
        assert_eq!(fs::read_dir(exporter.dir()).unwrap().count(), 3);
    }

    #[test]
    fn test_export_no_entities_writes_empty_file() {
        let dir = tempdir().unwrap();
        let exporter = Exporter::new(dir.path());
        let path = exporter.export_entities(&[]).unwrap();
        assert!(path.exists());
        assert!(fs::read_to_string(&path).unwrap().is_empty());
    }
}

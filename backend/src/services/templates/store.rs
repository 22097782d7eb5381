//! # Template Store
//!
//! SQLite-backed collection of message templates and their saved mappings,
//! keyed by template name.
//!
//! The store keeps a snapshot of the last `load_all`. Reads are served from
//! it until `invalidate` is called; every write invalidates it.

use crate::error::DispatchError;
use common::model::mapping::MappingSpec;
use common::model::template::Template;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS templates (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    template_name TEXT NOT NULL UNIQUE,
    template_id TEXT NOT NULL,
    message TEXT NOT NULL,
    mappings TEXT NOT NULL DEFAULT '{}'
)";

pub struct TemplateStore {
    path: PathBuf,
    snapshot: Mutex<Option<Vec<Template>>>,
}

impl TemplateStore {
    /// Opens (creating if needed) the store at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DispatchError> {
        let store = TemplateStore {
            path: path.as_ref().to_path_buf(),
            snapshot: Mutex::new(None),
        };
        store.connect()?.execute(SCHEMA, [])?;
        Ok(store)
    }

    fn connect(&self) -> Result<Connection, DispatchError> {
        Ok(Connection::open(&self.path)?)
    }

    /// Drops the cached snapshot; the next read goes to the database.
    pub fn invalidate(&self) {
        if let Ok(mut snapshot) = self.snapshot.lock() {
            *snapshot = None;
        }
    }

    /// All templates in insertion order.
    pub fn load_all(&self) -> Result<Vec<Template>, DispatchError> {
        if let Ok(snapshot) = self.snapshot.lock() {
            if let Some(templates) = snapshot.as_ref() {
                return Ok(templates.clone());
            }
        }

        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT template_name, template_id, message, mappings FROM templates ORDER BY seq",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut templates = Vec::new();
        for row in rows {
            let (template_name, template_id, message, mappings) = row?;
            templates.push(Template {
                template_name,
                template_id,
                message,
                mappings: serde_json::from_str(&mappings)?,
            });
        }

        if let Ok(mut snapshot) = self.snapshot.lock() {
            *snapshot = Some(templates.clone());
        }
        Ok(templates)
    }

    pub fn get(&self, template_name: &str) -> Result<Template, DispatchError> {
        self.load_all()?
            .into_iter()
            .find(|t| t.template_name == template_name)
            .ok_or_else(|| DispatchError::TemplateNotFound(template_name.to_string()))
    }

    pub fn append(&self, template: &Template) -> Result<(), DispatchError> {
        check_fields(template)?;
        let conn = self.connect()?;
        let exists: Option<i64> = conn
            .query_row(
                "SELECT seq FROM templates WHERE template_name = ?1",
                params![template.template_name],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_some() {
            return Err(DispatchError::InvalidTemplate(format!(
                "a template named '{}' already exists",
                template.template_name
            )));
        }

        conn.execute(
            "INSERT INTO templates (template_name, template_id, message, mappings) VALUES (?1, ?2, ?3, ?4)",
            params![
                template.template_name,
                template.template_id,
                template.message,
                serde_json::to_string(&template.mappings)?
            ],
        )?;
        self.invalidate();
        Ok(())
    }

    /// Replaces the template called `template_name`, keeping its position
    /// and its saved mappings.
    pub fn update(&self, template_name: &str, template: &Template) -> Result<(), DispatchError> {
        check_fields(template)?;
        let conn = self.connect()?;
        let changed = conn
            .execute(
                "UPDATE templates SET template_name = ?1, template_id = ?2, message = ?3 WHERE template_name = ?4",
                params![
                    template.template_name,
                    template.template_id,
                    template.message,
                    template_name
                ],
            )
            .map_err(|e| match e {
                rusqlite::Error::SqliteFailure(f, _)
                    if f.code == rusqlite::ErrorCode::ConstraintViolation =>
                {
                    DispatchError::InvalidTemplate(format!(
                        "a template named '{}' already exists",
                        template.template_name
                    ))
                }
                other => DispatchError::Store(other),
            })?;
        self.invalidate();
        if changed == 0 {
            return Err(DispatchError::TemplateNotFound(template_name.to_string()));
        }
        Ok(())
    }

    pub fn delete(&self, template_name: &str) -> Result<(), DispatchError> {
        let conn = self.connect()?;
        let changed = conn.execute(
            "DELETE FROM templates WHERE template_name = ?1",
            params![template_name],
        )?;
        self.invalidate();
        if changed == 0 {
            return Err(DispatchError::TemplateNotFound(template_name.to_string()));
        }
        Ok(())
    }

    /// Saves `mapping` for `template_name` if it differs from the stored one.
    /// Returns whether anything was written.
    pub fn update_mapping(
        &self,
        template_name: &str,
        mapping: &MappingSpec,
    ) -> Result<bool, DispatchError> {
        let conn = self.connect()?;
        let stored: Option<String> = conn
            .query_row(
                "SELECT mappings FROM templates WHERE template_name = ?1",
                params![template_name],
                |row| row.get(0),
            )
            .optional()?;
        let stored = stored.ok_or_else(|| DispatchError::TemplateNotFound(template_name.to_string()))?;

        let current: MappingSpec = serde_json::from_str(&stored)?;
        if &current == mapping {
            return Ok(false);
        }

        conn.execute(
            "UPDATE templates SET mappings = ?1 WHERE template_name = ?2",
            params![serde_json::to_string(mapping)?, template_name],
        )?;
        self.invalidate();
        Ok(true)
    }
}

fn check_fields(template: &Template) -> Result<(), DispatchError> {
    let missing: Vec<&str> = [
        ("template_name", &template.template_name),
        ("template_id", &template.template_id),
        ("message", &template.message),
    ]
    .into_iter()
    .filter(|(_, value)| value.trim().is_empty())
    .map(|(name, _)| name)
    .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(DispatchError::InvalidTemplate(format!(
            "empty fields: {}",
            missing.join(", ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::model::mapping::{FieldMapping, MOBILE_NO};
    use tempfile::TempDir;

    fn store() -> (TempDir, TemplateStore) {
        let dir = TempDir::new().unwrap();
        let store = TemplateStore::open(dir.path().join("templates.sqlite")).unwrap();
        (dir, store)
    }

    #[test]
    fn append_and_load_in_order() {
        let (_dir, store) = store();
        store.append(&Template::new("b", "tpl_b", "Hi {{name}}")).unwrap();
        store.append(&Template::new("a", "tpl_a", "Yo")).unwrap();

        let names: Vec<String> = store
            .load_all()
            .unwrap()
            .into_iter()
            .map(|t| t.template_name)
            .collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    fn append_rejects_duplicates_and_blank_fields() {
        let (_dir, store) = store();
        store.append(&Template::new("a", "tpl_a", "Yo")).unwrap();

        assert!(matches!(
            store.append(&Template::new("a", "tpl_x", "Other")),
            Err(DispatchError::InvalidTemplate(_))
        ));
        assert!(matches!(
            store.append(&Template::new("b", " ", "Yo")),
            Err(DispatchError::InvalidTemplate(_))
        ));
    }

    #[test]
    fn update_keeps_saved_mapping() {
        let (_dir, store) = store();
        store.append(&Template::new("a", "tpl_a", "Hi {{name}}")).unwrap();
        let mapping = MappingSpec::new().with(MOBILE_NO, FieldMapping::column("Phone"));
        store.update_mapping("a", &mapping).unwrap();

        store
            .update("a", &Template::new("renamed", "tpl_a2", "Hello {{name}}"))
            .unwrap();

        let template = store.get("renamed").unwrap();
        assert_eq!(template.template_id, "tpl_a2");
        assert_eq!(template.mappings, mapping);
        assert!(matches!(store.get("a"), Err(DispatchError::TemplateNotFound(_))));
    }

    #[test]
    fn delete_removes_and_reports_unknown() {
        let (_dir, store) = store();
        store.append(&Template::new("a", "tpl_a", "Yo")).unwrap();
        store.load_all().unwrap();

        store.delete("a").unwrap();
        assert!(store.load_all().unwrap().is_empty());
        assert!(matches!(store.delete("a"), Err(DispatchError::TemplateNotFound(_))));
    }

    #[test]
    fn update_mapping_only_writes_changes() {
        let (_dir, store) = store();
        store.append(&Template::new("a", "tpl_a", "Hi {{name}}")).unwrap();
        let mapping = MappingSpec::new()
            .with(MOBILE_NO, FieldMapping::column("Phone"))
            .with("name", FieldMapping::literal("friend"));

        assert!(store.update_mapping("a", &mapping).unwrap());
        assert!(!store.update_mapping("a", &mapping).unwrap());
        assert_eq!(store.get("a").unwrap().mappings, mapping);
        assert!(matches!(
            store.update_mapping("missing", &mapping),
            Err(DispatchError::TemplateNotFound(_))
        ));
    }

    #[test]
    fn snapshot_is_refreshed_after_invalidate() {
        let (dir, store) = store();
        store.append(&Template::new("a", "tpl_a", "Yo")).unwrap();
        assert_eq!(store.load_all().unwrap().len(), 1);

        // A write through another handle is invisible until invalidated.
        let other = TemplateStore::open(dir.path().join("templates.sqlite")).unwrap();
        other.append(&Template::new("b", "tpl_b", "Yo")).unwrap();
        assert_eq!(store.load_all().unwrap().len(), 1);

        store.invalidate();
        assert_eq!(store.load_all().unwrap().len(), 2);
    }

    #[test]
    fn legacy_mapping_json_is_readable() {
        let (dir, store) = store();
        store.append(&Template::new("a", "tpl_a", "Hi {{name}}")).unwrap();
        let conn = Connection::open(dir.path().join("templates.sqlite")).unwrap();
        conn.execute(
            "UPDATE templates SET mappings = ?1 WHERE template_name = 'a'",
            params![r#"{"mobile_no": {"type": "column", "value": "Phone"}, "image_column": "Banner"}"#],
        )
        .unwrap();
        store.invalidate();

        let mapping = store.get("a").unwrap().mappings;
        assert_eq!(mapping.image_column(), Some(&FieldMapping::column("Banner")));
    }
}

//! Collection export loader
//!
//! Reads a directory of `<collection>.json` files, each a JSON array of
//! documents. Database-qualified stems (`examdex.0610_s20_qp_32_sq.json`)
//! lose everything up to the last dot. The `syllabus` collection also feeds
//! the syllabus tree.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use super::errors::{LoadError, LoadResult};
use super::memory::MemoryStore;
use crate::observability::{log_event_with_fields, Event};
use crate::syllabus::{SyllabusTopic, SyllabusTree};

/// Collection whose documents are syllabus topics
pub const SYLLABUS_COLLECTION: &str = "syllabus";

/// A loaded export directory
#[derive(Debug)]
pub struct LoadedData {
    pub store: MemoryStore,
    pub syllabus: SyllabusTree,
    /// Collection names in load order
    pub collections: Vec<String>,
}

/// Loads every `*.json` file directly under `dir`.
pub fn load_dir(dir: &Path) -> LoadResult<LoadedData> {
    let entries = fs::read_dir(dir).map_err(|source| LoadError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| LoadError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    files.sort();

    let store = MemoryStore::new();
    let mut syllabus = SyllabusTree::default();
    let mut collections = Vec::with_capacity(files.len());

    for path in files {
        let Some(name) = collection_name(&path) else {
            continue;
        };
        let documents = read_documents(&path)?;

        if name == SYLLABUS_COLLECTION {
            let topics: Vec<SyllabusTopic> = serde_json::from_value(Value::Array(documents.clone()))
                .map_err(|e| LoadError::Malformed {
                    path: path.clone(),
                    reason: e.to_string(),
                })?;
            syllabus = SyllabusTree::build(topics);
        }

        store.insert_collection(name.clone(), documents)?;
        collections.push(name);
    }

    let count = collections.len().to_string();
    let topics = syllabus.len().to_string();
    log_event_with_fields(
        Event::DataLoaded,
        &[
            ("collections", &count),
            ("dir", &dir.display().to_string()),
            ("syllabus_topics", &topics),
        ],
    );

    Ok(LoadedData {
        store,
        syllabus,
        collections,
    })
}

fn collection_name(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;
    let name = stem.rsplit('.').next().unwrap_or(stem).trim();
    (!name.is_empty()).then(|| name.to_string())
}

fn read_documents(path: &Path) -> LoadResult<Vec<Value>> {
    let content = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let value: Value = serde_json::from_str(&content).map_err(|e| LoadError::Malformed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    match value {
        Value::Array(documents) => Ok(documents),
        _ => Err(LoadError::Malformed {
            path: path.to_path_buf(),
            reason: "expected a JSON array of documents".into(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, file: &str, content: &str) {
        fs::write(dir.path().join(file), content).unwrap();
    }

    #[test]
    fn test_load_dir() {
        let dir = TempDir::new().unwrap();
        write(&dir, "examdex.0610_s20_qp_32_sq.json", r#"[{"_id": "q1", "number": 1}]"#);
        write(&dir, "0610_s20_qp_12_mcq.json", r#"[{"number": 1}, {"number": 2}]"#);
        write(
            &dir,
            "syllabus.json",
            r#"[{"number": "2", "title": "Organisation"}, {"number": "2.1", "title": "Cells"}]"#,
        );
        write(&dir, "notes.txt", "ignored");

        let loaded = load_dir(dir.path()).unwrap();
        assert_eq!(
            loaded.collections,
            vec!["0610_s20_qp_12_mcq", "0610_s20_qp_32_sq", "syllabus"]
        );
        assert_eq!(loaded.syllabus.len(), 2);
        assert_eq!(loaded.store.document_count().unwrap(), 5);
    }

    #[test]
    fn test_non_array_rejected() {
        let dir = TempDir::new().unwrap();
        write(&dir, "bad_sq.json", r#"{"number": 1}"#);
        let err = load_dir(dir.path()).unwrap_err();
        assert!(matches!(err, LoadError::Malformed { .. }));
    }

    #[test]
    fn test_missing_dir() {
        let err = load_dir(Path::new("/nonexistent/examdex-data")).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }

    #[test]
    fn test_collection_name() {
        assert_eq!(
            collection_name(Path::new("/d/db.0610_s20_qp_32_ssq.json")).as_deref(),
            Some("0610_s20_qp_32_ssq")
        );
        assert_eq!(collection_name(Path::new("/d/syllabus.json")).as_deref(), Some("syllabus"));
    }
}

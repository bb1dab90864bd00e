use super::{format_timestamp, now, parse_timestamp, Store};
use crate::error::{ServiceError, ServiceResult};
use crate::workbook::ParsedSheet;
use common::model::file_record::{FileRecord, FileSummary, Row};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::collections::{BTreeMap, HashSet};
use uuid::Uuid;

/// Everything the upload path knows about a file before it is stored.
#[derive(Debug, Clone)]
pub struct NewRecord {
    pub owner_id: String,
    pub original_file_name: String,
    pub content_md5: String,
    pub sheets: Vec<ParsedSheet>,
}

impl Store {
    /// Persists a freshly parsed upload in a single transaction.
    ///
    /// Rejects uploads without sheets and uploads with two sheets of the same name, so
    /// every stored record starts out with a non-empty, duplicate-free sheet list.
    pub fn create_record(&self, new: NewRecord) -> ServiceResult<FileRecord> {
        if new.sheets.is_empty() {
            return Err(ServiceError::Validation(
                "The workbook does not contain any sheets".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = new.sheets.iter().find(|s| !seen.insert(s.name.as_str())) {
            return Err(ServiceError::Validation(format!(
                "Duplicate sheet name '{}'",
                dup.name
            )));
        }

        let id = Uuid::new_v4().to_string();
        let created_at = now();

        self.with_conn(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            tx.execute(
                "INSERT INTO files (id, owner_id, original_file_name, content_md5, version, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, 1, ?5, ?5)",
                params![
                    id,
                    new.owner_id,
                    new.original_file_name,
                    new.content_md5,
                    format_timestamp(&created_at)
                ],
            )?;
            {
                let mut stmt = tx.prepare(
                    "INSERT INTO sheets (file_id, position, name, column_headers, rows_json)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                )?;
                for (position, sheet) in new.sheets.iter().enumerate() {
                    stmt.execute(params![
                        id,
                        position as i64,
                        sheet.name,
                        serde_json::to_string(&sheet.column_headers)?,
                        serde_json::to_string(&sheet.rows)?
                    ])?;
                }
            }
            tx.commit()?;
            Ok(())
        })?;

        let mut sheet_names = Vec::with_capacity(new.sheets.len());
        let mut parsed_data = BTreeMap::new();
        let mut column_headers = BTreeMap::new();
        for sheet in new.sheets {
            sheet_names.push(sheet.name.clone());
            column_headers.insert(sheet.name.clone(), sheet.column_headers);
            parsed_data.insert(sheet.name, sheet.rows);
        }

        Ok(FileRecord {
            id,
            owner_id: new.owner_id,
            original_file_name: new.original_file_name,
            sheet_names,
            parsed_data,
            column_headers,
            content_md5: new.content_md5,
            version: 1,
            created_at,
            updated_at: created_at,
        })
    }
}

/// Owner of a file, or `None` when no such file exists.
pub(crate) fn load_owner(conn: &Connection, file_id: &str) -> ServiceResult<Option<String>> {
    let owner = conn
        .query_row(
            "SELECT owner_id FROM files WHERE id = ?1",
            params![file_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(owner)
}

pub(crate) fn load_sheet_names(conn: &Connection, file_id: &str) -> ServiceResult<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM sheets WHERE file_id = ?1 ORDER BY position")?;
    let names = stmt
        .query_map(params![file_id], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(names)
}

pub(crate) fn load_record(conn: &Connection, file_id: &str) -> ServiceResult<Option<FileRecord>> {
    let record = conn
        .query_row(
            "SELECT id, owner_id, original_file_name, content_md5, version, created_at, updated_at
             FROM files WHERE id = ?1",
            params![file_id],
            |row| {
                Ok(FileRecord {
                    id: row.get(0)?,
                    owner_id: row.get(1)?,
                    original_file_name: row.get(2)?,
                    sheet_names: Vec::new(),
                    parsed_data: BTreeMap::new(),
                    column_headers: BTreeMap::new(),
                    content_md5: row.get(3)?,
                    version: row.get(4)?,
                    created_at: parse_timestamp(5, &row.get::<_, String>(5)?)?,
                    updated_at: parse_timestamp(6, &row.get::<_, String>(6)?)?,
                })
            },
        )
        .optional()?;

    let Some(mut record) = record else {
        return Ok(None);
    };

    let mut stmt = conn.prepare(
        "SELECT name, column_headers, rows_json FROM sheets WHERE file_id = ?1 ORDER BY position",
    )?;
    let sheets = stmt.query_map(params![file_id], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
        ))
    })?;
    for sheet in sheets {
        let (name, headers, rows) = sheet?;
        let headers: Vec<String> = serde_json::from_str(&headers)?;
        let rows: Vec<Row> = serde_json::from_str(&rows)?;
        record.column_headers.insert(name.clone(), headers);
        record.parsed_data.insert(name.clone(), rows);
        record.sheet_names.push(name);
    }

    Ok(Some(record))
}

/// Header row and data rows of one sheet, or `None` when the file has no such sheet.
pub(crate) fn load_sheet(
    conn: &Connection,
    file_id: &str,
    sheet_name: &str,
) -> ServiceResult<Option<(Vec<String>, Vec<Row>)>> {
    let raw = conn
        .query_row(
            "SELECT column_headers, rows_json FROM sheets WHERE file_id = ?1 AND name = ?2",
            params![file_id, sheet_name],
            |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
        )
        .optional()?;

    match raw {
        Some((headers, rows)) => Ok(Some((
            serde_json::from_str(&headers)?,
            serde_json::from_str(&rows)?,
        ))),
        None => Ok(None),
    }
}

/// History of one owner, newest first. Files created in the same microsecond are
/// ordered by id.
pub(crate) fn list_summaries(conn: &Connection, owner_id: &str) -> ServiceResult<Vec<FileSummary>> {
    let mut stmt = conn.prepare(
        "SELECT f.id, f.original_file_name, f.created_at, f.updated_at, s.name
         FROM files f JOIN sheets s ON s.file_id = f.id
         WHERE f.owner_id = ?1
         ORDER BY f.created_at DESC, f.id ASC, s.position ASC",
    )?;
    let rows = stmt.query_map(params![owner_id], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            parse_timestamp(2, &row.get::<_, String>(2)?)?,
            parse_timestamp(3, &row.get::<_, String>(3)?)?,
            row.get::<_, String>(4)?,
        ))
    })?;

    let mut summaries: Vec<FileSummary> = Vec::new();
    for row in rows {
        let (id, original_file_name, created_at, updated_at, sheet_name) = row?;
        match summaries.last_mut() {
            Some(last) if last.id == id => last.sheet_names.push(sheet_name),
            _ => summaries.push(FileSummary {
                id,
                original_file_name,
                sheet_names: vec![sheet_name],
                created_at,
                updated_at,
            }),
        }
    }
    Ok(summaries)
}

/// Deletes a file and, through the cascade, all of its sheets. Returns whether a row
/// was removed.
pub(crate) fn delete_record(conn: &Connection, file_id: &str) -> ServiceResult<bool> {
    let removed = conn.execute("DELETE FROM files WHERE id = ?1", params![file_id])?;
    Ok(removed > 0)
}

/// Removes one sheet and stamps the owning file as modified.
pub(crate) fn remove_sheet(conn: &Connection, file_id: &str, sheet_name: &str) -> ServiceResult<()> {
    let removed = conn.execute(
        "DELETE FROM sheets WHERE file_id = ?1 AND name = ?2",
        params![file_id, sheet_name],
    )?;
    if removed == 0 {
        return Err(ServiceError::sheet_not_found(sheet_name));
    }
    conn.execute(
        "UPDATE files SET updated_at = ?1, version = version + 1 WHERE id = ?2",
        params![format_timestamp(&now()), file_id],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn sheet(name: &str, headers: &[&str], rows: Vec<serde_json::Value>) -> ParsedSheet {
        ParsedSheet {
            name: name.to_string(),
            column_headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .into_iter()
                .map(|r| r.as_object().cloned().unwrap_or_default())
                .collect(),
        }
    }

    fn new_record(owner: &str, sheets: Vec<ParsedSheet>) -> NewRecord {
        NewRecord {
            owner_id: owner.to_string(),
            original_file_name: "budget.xlsx".to_string(),
            content_md5: "d41d8cd98f00b204e9800998ecf8427e".to_string(),
            sheets,
        }
    }

    #[test]
    fn created_record_reads_back_identically() {
        let store = Store::open_in_memory().unwrap();
        let created = store
            .create_record(new_record(
                "alice",
                vec![
                    sheet("Q1", &["Region", "Total"], vec![json!({"Region": "North", "Total": 12})]),
                    sheet("Q2", &["Region"], vec![]),
                ],
            ))
            .unwrap();

        let loaded = store
            .with_conn(|conn| load_record(conn, &created.id))
            .unwrap()
            .unwrap();
        assert_eq!(loaded, created);
        assert_eq!(loaded.sheet_names, vec!["Q1", "Q2"]);
        assert_eq!(loaded.parsed_data["Q1"][0]["Total"], json!(12));
    }

    #[test]
    fn empty_and_duplicate_sheet_lists_are_rejected() {
        let store = Store::open_in_memory().unwrap();
        assert!(matches!(
            store.create_record(new_record("alice", vec![])),
            Err(ServiceError::Validation(_))
        ));
        assert!(matches!(
            store.create_record(new_record(
                "alice",
                vec![sheet("A", &[], vec![]), sheet("A", &[], vec![])]
            )),
            Err(ServiceError::Validation(_))
        ));
        let count: i64 = store
            .with_conn(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM files", [], |r| r.get(0))?))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn deleting_a_file_cascades_to_its_sheets() {
        let store = Store::open_in_memory().unwrap();
        let created = store
            .create_record(new_record("alice", vec![sheet("A", &[], vec![]), sheet("B", &[], vec![])]))
            .unwrap();

        let (removed, sheets_left) = store
            .with_conn(|conn| {
                let removed = delete_record(conn, &created.id)?;
                let left: i64 =
                    conn.query_row("SELECT COUNT(*) FROM sheets", [], |r| r.get(0))?;
                Ok((removed, left))
            })
            .unwrap();
        assert!(removed);
        assert_eq!(sheets_left, 0);
        assert!(!store.with_conn(|conn| delete_record(conn, &created.id)).unwrap());
    }

    #[test]
    fn removing_a_sheet_bumps_version_and_keeps_order() {
        let store = Store::open_in_memory().unwrap();
        let created = store
            .create_record(new_record(
                "alice",
                vec![sheet("A", &[], vec![]), sheet("B", &[], vec![]), sheet("C", &[], vec![])],
            ))
            .unwrap();

        let record = store
            .with_conn(|conn| {
                remove_sheet(conn, &created.id, "B")?;
                load_record(conn, &created.id)
            })
            .unwrap()
            .unwrap();
        assert_eq!(record.sheet_names, vec!["A", "C"]);
        assert_eq!(record.version, 2);
        assert!(record.updated_at >= record.created_at);
        assert!(!record.parsed_data.contains_key("B"));
        assert!(!record.column_headers.contains_key("B"));

        assert!(matches!(
            store.with_conn(|conn| remove_sheet(conn, &created.id, "B")),
            Err(ServiceError::NotFound(_))
        ));
    }

    #[test]
    fn summaries_are_per_owner_and_newest_first() {
        let store = Store::open_in_memory().unwrap();
        let first = store
            .create_record(new_record("alice", vec![sheet("A", &[], vec![])]))
            .unwrap();
        let second = store
            .create_record(new_record("alice", vec![sheet("X", &[], vec![]), sheet("Y", &[], vec![])]))
            .unwrap();
        store
            .create_record(new_record("bob", vec![sheet("Z", &[], vec![])]))
            .unwrap();

        let history = store.with_conn(|conn| list_summaries(conn, "alice")).unwrap();
        let mut expected = vec![second.summary(), first.summary()];
        if first.created_at == second.created_at {
            expected.sort_by(|a, b| a.id.cmp(&b.id));
        }
        assert_eq!(history, expected);
        assert!(store.with_conn(|conn| list_summaries(conn, "carol")).unwrap().is_empty());
    }
}
